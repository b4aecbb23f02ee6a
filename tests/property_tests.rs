//! Property-based tests for matching and formatting.
//!
//! Uses proptest to verify invariants across random inputs:
//! - A guide is only ever attached to a known schema
//! - Table descriptions never list more than `max_columns` columns
//! - Samples only appear for untruncated tables
//! - The cache document reproduces the index exactly

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use schemadex::catalog::SchemaMap;
use schemadex::guides::{GuideDocument, KnownSchemas, assign_guides, match_guide};
use schemadex::index::format_table_description;
use schemadex::{ColumnInfo, SchemaIndex, TableInfo};
use std::collections::BTreeMap;

fn table_strategy() -> impl Strategy<Value = TableInfo> {
    (0usize..60, 0usize..4, any::<bool>()).prop_map(|(columns, rows, nullable)| {
        TableInfo::new(
            (0..columns)
                .map(|i| ColumnInfo::new(format!("c{i}"), "TEXT", nullable))
                .collect(),
            (0..rows)
                .map(|r| (0..columns).map(|i| format!("r{r}v{i}")).collect())
                .collect(),
        )
    })
}

proptest! {
    /// Property: a matched schema is always one of the known names.
    #[test]
    fn prop_match_only_known_schemas(
        known in prop::collection::vec("[A-Za-z]{1,8}", 0..6),
        title in "[A-Za-z ()/,#]{0,40}",
        stem in "[A-Za-z_ -]{1,20}",
    ) {
        let lookup = KnownSchemas::new(known.clone());
        let doc = GuideDocument::new(format!("{stem}.md"), title);

        if let Some(matched) = match_guide(&doc, &lookup) {
            prop_assert!(known.contains(&matched.schema));
        }
    }

    /// Property: every assigned guide key is a known schema, and at most one
    /// guide is kept per schema.
    #[test]
    fn prop_assigned_guides_subset_of_known(
        known in prop::collection::vec("[a-z]{1,6}", 1..5),
        stems in prop::collection::vec("[a-z_]{1,12}", 0..8),
    ) {
        let lookup = KnownSchemas::new(known.clone());
        let docs: Vec<_> = stems
            .iter()
            .map(|s| GuideDocument::new(format!("{s}.md"), "Notes"))
            .collect();

        let guides = assign_guides(docs, &lookup);

        prop_assert!(guides.len() <= known.len());
        for schema in guides.keys() {
            prop_assert!(known.contains(schema));
        }
    }

    /// Property: descriptions list at most `max_columns` columns and show
    /// samples only when nothing was cut.
    #[test]
    fn prop_describe_respects_max_columns(table in table_strategy(), max_columns in 0usize..50) {
        let text = format_table_description("s", "t", &table, max_columns);

        let listed = text
            .lines()
            .filter(|l| l.starts_with("  c") && l.ends_with(')'))
            .count();
        let total = table.column_count();
        prop_assert_eq!(listed, total.min(max_columns));

        let first_line = format!("Table: s.t ({total} columns)");
        prop_assert!(text.starts_with(&first_line));

        let truncated = total > max_columns;
        prop_assert_eq!(text.contains("more columns"), truncated);
        prop_assert_eq!(
            text.contains("Sample rows"),
            !truncated && !table.sample_rows.is_empty()
        );
    }

    /// Property: the separator under the sample header is as wide as the header.
    #[test]
    fn prop_separator_matches_header(table in table_strategy()) {
        let text = format_table_description("s", "t", &table, usize::MAX);
        let lines: Vec<_> = text.lines().collect();

        if let Some(pos) = lines.iter().position(|l| l.starts_with("Sample rows")) {
            let header = lines[pos + 1].trim_start();
            let separator = lines[pos + 2].trim_start();
            prop_assert_eq!(separator.chars().count(), header.chars().count());
            prop_assert!(separator.chars().all(|c| c == '-'));
        }
    }

    /// Property: serializing and re-parsing the cache yields the same index.
    #[test]
    fn prop_cache_document_reproduces_index(
        tables in prop::collection::btree_map("[a-z]{1,6}", table_strategy(), 0..4),
        content in ".{0,80}",
    ) {
        let mut schemas = SchemaMap::new();
        schemas.insert("financial".to_string(), tables.into_iter().collect());
        let mut guides = BTreeMap::new();
        guides.insert(
            "financial".to_string(),
            schemadex::GuideInfo::new("financial.md", content),
        );
        let index = SchemaIndex::from_parts(schemas, guides).unwrap();

        let restored = SchemaIndex::from_cache_json(&index.to_cache_json().unwrap()).unwrap();

        prop_assert_eq!(restored, index);
    }
}

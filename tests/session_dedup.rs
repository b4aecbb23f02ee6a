//! Session dedup tests.
//!
//! Exercises repeat suppression through the public session API:
//! - First delivery vs. repeated request
//! - Misses never locking a caller out
//! - Isolation between sessions, including across threads

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use schemadex::catalog::{SchemaMap, TableMap};
use schemadex::session::Reply;
use schemadex::{ColumnInfo, GuideInfo, SchemaIndex, SessionFactory, TableInfo};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

// ============================================================================
// Test Helpers
// ============================================================================

fn factory() -> SessionFactory {
    let mut financial = TableMap::new();
    financial.insert(
        "loan".to_string(),
        TableInfo::new(
            vec![
                ColumnInfo::new("loan_id", "INTEGER", false),
                ColumnInfo::new("amount", "REAL", true),
            ],
            vec![vec!["1".to_string(), "100.0".to_string()]],
        ),
    );
    financial.insert(
        "account".to_string(),
        TableInfo::new(vec![ColumnInfo::new("account_id", "INTEGER", false)], Vec::new()),
    );

    let mut credit = TableMap::new();
    credit.insert(
        "card".to_string(),
        TableInfo::new(vec![ColumnInfo::new("card_id", "INTEGER", false)], Vec::new()),
    );

    let mut schemas = SchemaMap::new();
    schemas.insert("financial".to_string(), financial);
    schemas.insert("Credit".to_string(), credit);

    let mut guides = BTreeMap::new();
    guides.insert(
        "financial".to_string(),
        GuideInfo::new("financial_rules.md", "# Loan Rules (Financial Database)"),
    );

    SessionFactory::new(SchemaIndex::from_parts(schemas, guides).unwrap())
}

// ============================================================================
// describe_table
// ============================================================================

#[test]
fn test_describe_then_refuse_then_other_table() {
    let mut session = factory().session();

    let first = session.describe_table("financial", "loan");
    assert!(first.is_delivered());
    assert!(first.text().starts_with("Table: financial.loan (2 columns)"));
    assert!(first.text().contains("Sample rows (1):"));

    let second = session.describe_table("financial", "loan");
    assert!(second.is_repeated());
    assert_eq!(
        second.text(),
        "You already described financial.loan above. Do NOT call describe_table on the same \
         table again; use the information you already have and write your query."
    );

    assert!(session.describe_table("financial", "account").is_delivered());
}

#[test]
fn test_missing_table_never_locks_out() {
    let mut session = factory().session();

    let first = session.describe_table("financial", "missing_table");
    let second = session.describe_table("financial", "missing_table");

    assert_eq!(first, second);
    assert!(matches!(first, Reply::NotFound(_)));
    assert!(first.text().contains("Available tables in financial: account, loan"));
}

#[test]
fn test_keys_are_case_sensitive() {
    let mut session = factory().session();

    assert!(session.describe_table("financial", "loan").is_delivered());
    // A differently-cased name is a different key, and a miss
    assert!(matches!(
        session.describe_table("Financial", "loan"),
        Reply::NotFound(_)
    ));
}

// ============================================================================
// list_schemas / get_business_rules
// ============================================================================

#[test]
fn test_list_schemas_guided_first() {
    let mut session = factory().session();

    let listing = session.list_schemas();
    let text = listing.text();
    let guided = text.find("  - financial: account, loan").unwrap();
    let other = text.find("  - Credit: card").unwrap();
    assert!(guided < other);

    assert!(session.list_schemas().is_repeated());
}

#[test]
fn test_business_rules_for_unguided_schema_stays_answerable() {
    let mut session = factory().session();

    for _ in 0..3 {
        let reply = session.get_business_rules("Credit");
        assert!(reply.text().starts_with("No business rules guide found for schema 'Credit'."));
    }

    assert!(session.get_business_rules("financial").is_delivered());
    assert!(session.get_business_rules("financial").is_repeated());
}

#[test]
fn test_gates_are_independent() {
    let mut session = factory().session();

    assert!(session.list_schemas().is_delivered());
    assert!(session.get_business_rules("financial").is_delivered());
    assert!(session.describe_table("financial", "loan").is_delivered());
    assert!(session.describe_table("Credit", "card").is_delivered());
}

// ============================================================================
// Isolation
// ============================================================================

#[test]
fn test_fresh_session_resets_state() {
    let factory = factory();
    let mut first = factory.session();
    assert!(first.list_schemas().is_delivered());
    assert!(first.list_schemas().is_repeated());

    let mut second = factory.session();
    assert!(second.list_schemas().is_delivered());
}

#[test]
fn test_sessions_on_threads_do_not_share_state() {
    let factory = factory();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let mut session = factory.session();
            thread::spawn(move || {
                let first = session.describe_table("financial", "loan");
                let second = session.describe_table("financial", "loan");
                let rules = session.get_business_rules("financial");
                (first.is_delivered(), second.is_repeated(), rules.is_delivered())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), (true, true, true));
    }

    // Every session has released its handle on the index
    assert_eq!(Arc::strong_count(factory.index()), 1);
}

#[test]
fn test_shared_index_reads_concurrently() {
    let index = Arc::new(factory().index().as_ref().clone());
    let factory = SessionFactory::from_shared(Arc::clone(&index));

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let session = factory.session();
                assert_eq!(session.index().list_tables("Credit"), vec!["card"]);
                assert_eq!(index.list_schemas(), vec!["Credit", "financial"]);
            });
        }
    });
}

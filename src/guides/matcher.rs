//! Guide-to-schema matching.
//!
//! Each guide is tried against an ordered chain of [`MatchRule`]s; the first
//! rule that names a known schema wins. Guides no rule can place are dropped.
//!
//! | Order | Rule | Looks at |
//! |-------|------|----------|
//! | 1 | [`MatchRule::TitleParenthetical`] | `Title (Financial Database)`, `Rules (Credit / CreditCard)` |
//! | 2 | [`MatchRule::TitleSuffix`] | `Financial Database Business Rules` |
//! | 3 | [`MatchRule::FilenameTokens`] | `financial_rules.md` |
//!
//! When two guides land on the same schema the later one (in file-name
//! order) replaces the earlier one.

use super::GuideDocument;
use crate::models::GuideInfo;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// First parenthesized group in a title.
#[allow(clippy::expect_used)]
static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]+)\)").expect("static regex"));

/// Separators between alternatives inside the parentheses.
#[allow(clippy::expect_used)]
static CANDIDATE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[/,]").expect("static regex"));

/// Trailing "Database"/"Databases" on a candidate.
#[allow(clippy::expect_used)]
static DATABASE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+databases?\s*$").expect("static regex"));

/// A word directly followed by the literal word "Database".
#[allow(clippy::expect_used)]
static WORD_BEFORE_DATABASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\s+Database").expect("static regex"));

/// Separators between file-name tokens.
#[allow(clippy::expect_used)]
static FILENAME_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_\-\s]+").expect("static regex"));

/// Case-insensitive lookup from a schema name to its canonical catalog spelling.
#[derive(Debug, Clone, Default)]
pub struct KnownSchemas {
    by_lower: HashMap<String, String>,
}

impl KnownSchemas {
    /// Builds the lookup from canonical schema names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let by_lower = names
            .into_iter()
            .map(Into::into)
            .map(|name: String| (name.to_lowercase(), name))
            .collect();
        Self { by_lower }
    }

    /// Returns the canonical name for `candidate`, ignoring case.
    #[must_use]
    pub fn resolve(&self, candidate: &str) -> Option<&str> {
        self.by_lower
            .get(&candidate.to_lowercase())
            .map(String::as_str)
    }

    /// Number of known schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_lower.len()
    }

    /// Returns true if no schemas are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_lower.is_empty()
    }
}

/// One matching strategy in the guide rule chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchRule {
    /// Schema named inside the title's first parenthesized group.
    TitleParenthetical,
    /// Schema named by the word before "Database" in the title.
    TitleSuffix,
    /// Schema named by a token of the file name.
    FilenameTokens,
}

impl MatchRule {
    /// Rules in the order they are tried.
    pub const CHAIN: [Self; 3] = [
        Self::TitleParenthetical,
        Self::TitleSuffix,
        Self::FilenameTokens,
    ];

    /// Returns the rule label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TitleParenthetical => "title_parenthetical",
            Self::TitleSuffix => "title_suffix",
            Self::FilenameTokens => "filename_tokens",
        }
    }

    /// Applies this rule alone to a guide's title and file stem.
    #[must_use]
    pub fn apply<'a>(self, title: &str, stem: &str, known: &'a KnownSchemas) -> Option<&'a str> {
        match self {
            Self::TitleParenthetical => {
                let inner = PARENTHETICAL.captures(title)?.get(1)?.as_str();
                CANDIDATE_SEPARATOR.split(inner).find_map(|candidate| {
                    let candidate = DATABASE_SUFFIX.replace(candidate.trim(), "");
                    known.resolve(candidate.trim())
                })
            },
            Self::TitleSuffix => {
                let word = WORD_BEFORE_DATABASE.captures(title)?.get(1)?.as_str();
                known.resolve(word)
            },
            Self::FilenameTokens => {
                let lowered = stem.to_lowercase();
                FILENAME_SEPARATOR
                    .split(&lowered)
                    .find_map(|token| known.resolve(token))
            },
        }
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The schema a guide was assigned to, and the rule that decided it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideMatch {
    /// Canonical schema name.
    pub schema: String,
    /// Rule that produced the match.
    pub rule: MatchRule,
}

/// Extracts a guide's title: its first line without heading markers.
#[must_use]
pub fn guide_title(content: &str) -> &str {
    content
        .lines()
        .next()
        .unwrap_or("")
        .trim()
        .trim_start_matches(['#', ' '])
        .trim()
}

/// Runs the rule chain for one guide.
#[must_use]
pub fn match_guide(document: &GuideDocument, known: &KnownSchemas) -> Option<GuideMatch> {
    let title = guide_title(&document.content);
    MatchRule::CHAIN.iter().find_map(|&rule| {
        rule.apply(title, &document.stem, known)
            .map(|schema| GuideMatch {
                schema: schema.to_string(),
                rule,
            })
    })
}

/// Assigns guides to schemas, in the order given.
///
/// Unmatched guides are dropped. A later guide for the same schema replaces
/// the earlier one.
pub fn assign_guides(
    documents: Vec<GuideDocument>,
    known: &KnownSchemas,
) -> BTreeMap<String, GuideInfo> {
    let mut guides = BTreeMap::new();

    for document in documents {
        let Some(matched) = match_guide(&document, known) else {
            debug!(file = %document.file_name, "Guide matches no known schema, dropping");
            metrics::counter!("guides_dropped_total").increment(1);
            continue;
        };

        debug!(
            file = %document.file_name,
            schema = %matched.schema,
            rule = %matched.rule,
            "Matched guide"
        );
        metrics::counter!("guides_matched_total", "rule" => matched.rule.as_str()).increment(1);

        let guide = GuideInfo::new(document.file_name, document.content);
        if let Some(previous) = guides.insert(matched.schema.clone(), guide) {
            warn!(
                schema = %matched.schema,
                replaced = %previous.file,
                "Multiple guides matched one schema, keeping the later file"
            );
        }
    }

    guides
}

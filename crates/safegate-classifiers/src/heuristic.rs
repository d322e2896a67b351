//! Keyword heuristic classifier
//!
//! Case-insensitive substring rules checked in a fixed order; the first rule
//! with any matching token wins. A payload carrying both `<script` and `../`
//! is therefore XSS, never PATH_TRAVERSAL.

use crate::classifier::{Classifier, ModelTarget};
use aho_corasick::AhoCorasick;
use safegate_core::{Category, ClassificationResult, Error, Result};

const XSS_TOKENS: &[&str] = &["<script", "javascript:"];
const SQLI_TOKENS: &[&str] = &["union select", " or 1=1", "' or '1'='1", "-- ", " drop "];
const TRAVERSAL_TOKENS: &[&str] = &["../"];

struct Rule {
    category: Category,
    matcher: AhoCorasick,
    summary: &'static str,
}

/// Deterministic keyword matcher used standalone and as the last-resort fallback
pub struct HeuristicClassifier {
    rules: Vec<Rule>,
}

impl HeuristicClassifier {
    /// Create a new heuristic classifier
    pub fn new() -> Result<Self> {
        let rules = vec![
            Self::rule(Category::Xss, XSS_TOKENS, "XSS tokens present")?,
            Self::rule(Category::SqlInjection, SQLI_TOKENS, "SQLi tokens present")?,
            Self::rule(Category::PathTraversal, TRAVERSAL_TOKENS, "path traversal")?,
        ];
        Ok(Self { rules })
    }

    fn rule(category: Category, tokens: &[&str], summary: &'static str) -> Result<Rule> {
        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(tokens)
            .map_err(|e| Error::internal(format!("Failed to build {} matcher: {}", category, e)))?;

        Ok(Rule {
            category,
            matcher,
            summary,
        })
    }

    fn first_match(&self, payload: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matcher.is_match(payload))
    }

    /// Category of the first matching rule, or `None` when the payload looks safe
    pub fn detect(&self, payload: &str) -> Option<Category> {
        self.first_match(payload).map(|rule| rule.category)
    }

    /// Fallback verdict used when a backend answer could not be interpreted.
    ///
    /// Returns `None` when no rule matches so the caller can word its own
    /// SAFE reason.
    pub fn fallback(&self, payload: &str) -> Option<ClassificationResult> {
        self.first_match(payload).map(|rule| {
            ClassificationResult::new(rule.category, format!("Heuristic: {}", rule.summary))
        })
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new().expect("Failed to create heuristic classifier")
    }
}

#[async_trait::async_trait]
impl Classifier for HeuristicClassifier {
    async fn classify(&self, payload: &str, _target: &ModelTarget) -> ClassificationResult {
        match self.first_match(payload) {
            Some(rule) => ClassificationResult::new(
                rule.category,
                format!("Mock heuristic: {}", rule.summary),
            ),
            None => ClassificationResult::safe("Mock: appears safe"),
        }
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

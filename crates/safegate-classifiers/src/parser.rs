//! Interpretation of backend free text
//!
//! The backend is asked for a strict two-line answer but small models drift,
//! so interpretation runs in stages:
//! 1. strict `VERDICT:` / `CATEGORY:` lines among the first two non-empty lines
//! 2. verdict inferred from the whole text if the strict line was missing
//! 3. category inferred from the whole text, SQL_INJECTION → XSS → PATH_TRAVERSAL → OTHER
//! 4. a malicious category decides the result on its own; otherwise the verdict does
//! 5. with neither, the heuristic classifier looks at the original payload
//!
//! Step 4 means `VERDICT:SAFE` with `CATEGORY:XSS` is reported as XSS. This
//! mirrors the analyzer's historical behaviour and is pending product review.

use crate::heuristic::HeuristicClassifier;
use safegate_core::{Category, ClassificationResult};

const UNCLEAR_EXCERPT_CHARS: usize = 40;

/// Binary verdict stated by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Safe,
    Malicious,
}

impl Verdict {
    fn from_label(label: &str) -> Option<Self> {
        match label {
            "SAFE" => Some(Self::Safe),
            "MALICIOUS" => Some(Self::Malicious),
            _ => None,
        }
    }
}

/// What could be read out of a backend answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParsedAnswer {
    pub verdict: Option<Verdict>,
    pub category: Option<Category>,
}

impl ParsedAnswer {
    /// Read the strict two-line format, then fill gaps by scanning the whole text
    pub fn from_text(text: &str) -> Self {
        let mut answer = Self::strict(text);
        let upper = text.to_uppercase();

        if answer.verdict.is_none() {
            answer.verdict = infer_verdict(&upper);
        }
        if answer.category.is_none() {
            answer.category = infer_category(&upper);
        }
        answer
    }

    /// Only the `VERDICT:` / `CATEGORY:` prefixes of the first two non-empty lines
    pub fn strict(text: &str) -> Self {
        let mut answer = Self::default();

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()).take(2) {
            let upper = line.to_uppercase();
            if let Some(value) = upper.strip_prefix("VERDICT:") {
                if let Some(verdict) = Verdict::from_label(value.trim()) {
                    answer.verdict = Some(verdict);
                }
            }
            if let Some(value) = upper.strip_prefix("CATEGORY:") {
                if let Some(category) = Category::from_label(value) {
                    answer.category = Some(category);
                }
            }
        }
        answer
    }
}

fn infer_verdict(upper: &str) -> Option<Verdict> {
    let says_malicious = upper.contains("MALICIOUS");
    let says_safe = upper.contains("SAFE");

    if says_malicious && !says_safe {
        Some(Verdict::Malicious)
    } else if says_safe {
        Some(Verdict::Safe)
    } else {
        None
    }
}

fn infer_category(upper: &str) -> Option<Category> {
    Category::MALICIOUS
        .into_iter()
        .find(|category| upper.contains(category.as_str()))
}

/// Turn backend text into a result, falling back to the heuristic on `payload`
pub fn interpret(
    text: &str,
    payload: &str,
    heuristic: &HeuristicClassifier,
) -> ClassificationResult {
    let answer = ParsedAnswer::from_text(text);

    match (answer.category, answer.verdict) {
        (Some(category), _) if category.is_malicious() => {
            ClassificationResult::new(category, format!("LLM classified as {}", category))
        }
        (_, Some(Verdict::Malicious)) => {
            ClassificationResult::new(Category::Other, "LLM classified as MALICIOUS")
        }
        (_, Some(Verdict::Safe)) => ClassificationResult::safe("LLM classified as SAFE"),
        _ => {
            metrics::counter!("safegate_backend_failures_total", "kind" => "unclear").increment(1);
            heuristic.fallback(payload).unwrap_or_else(|| {
                let excerpt: String = text.chars().take(UNCLEAR_EXCERPT_CHARS).collect();
                ClassificationResult::safe(format!(
                    "Unclear model response '{}', defaulting SAFE",
                    excerpt
                ))
            })
        }
    }
}

use proptest::prelude::*;
use safegate_classifiers::{interpret, HeuristicClassifier};
use safegate_core::{BatchStats, Category, ClassificationResult};

// ---------------------------------------------------------------------------
// Proptest strategies
// ---------------------------------------------------------------------------

fn category_strategy() -> impl Strategy<Value = Category> {
    prop::sample::select(Category::ALL.to_vec())
}

fn malicious_category_strategy() -> impl Strategy<Value = Category> {
    prop::sample::select(Category::MALICIOUS.to_vec())
}

/// Text that cannot contain any heuristic token: no spaces, quotes, `<` or `:`
fn inert_text_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9/._=&?-]{0,40}"
}

// ---------------------------------------------------------------------------
// Property: the heuristic never panics and keeps the result invariant
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn heuristic_result_is_consistent(payload in any::<String>()) {
        let heuristic = HeuristicClassifier::default();
        match heuristic.fallback(&payload) {
            Some(result) => {
                prop_assert!(result.is_malicious());
                prop_assert_eq!(Some(result.category()), heuristic.detect(&payload));
                prop_assert!(result.reason().starts_with("Heuristic: "));
            }
            None => prop_assert_eq!(heuristic.detect(&payload), None),
        }
    }
}

// ---------------------------------------------------------------------------
// Property: XSS beats SQLi beats traversal, regardless of case or position
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn xss_token_always_wins(
        prefix in inert_text_strategy(),
        suffix in inert_text_strategy(),
        upper in any::<bool>(),
    ) {
        let token = if upper { "<SCRIPT" } else { "<script" };
        let payload = format!("{}{} union select ../{}", prefix, token, suffix);
        prop_assert_eq!(HeuristicClassifier::default().detect(&payload), Some(Category::Xss));
    }

    #[test]
    fn sqli_beats_traversal(prefix in inert_text_strategy(), suffix in inert_text_strategy()) {
        let payload = format!("{}../ UNION SELECT {}", prefix, suffix);
        prop_assert_eq!(
            HeuristicClassifier::default().detect(&payload),
            Some(Category::SqlInjection)
        );
    }

    #[test]
    fn traversal_alone(prefix in inert_text_strategy(), suffix in inert_text_strategy()) {
        let heuristic = HeuristicClassifier::default();
        let payload = format!("{}../{}", prefix, suffix);
        prop_assert_eq!(heuristic.detect(&payload), Some(Category::PathTraversal));
    }

    #[test]
    fn inert_text_is_safe(text in "[a-z0-9=&?_-]{0,60}") {
        prop_assert_eq!(HeuristicClassifier::default().detect(&text), None);
    }
}

// ---------------------------------------------------------------------------
// Property: interpretation is total and never contradicts itself
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn interpret_is_total(text in any::<String>(), payload in any::<String>()) {
        let heuristic = HeuristicClassifier::default();
        let result = interpret(&text, &payload, &heuristic);

        prop_assert_eq!(result.is_malicious(), result.category() != Category::Safe);
        if let Some(rest) = result.reason().strip_prefix("Unclear model response '") {
            let excerpt = rest.trim_end_matches("', defaulting SAFE");
            prop_assert!(excerpt.chars().count() <= 40);
        }
    }

    #[test]
    fn strict_malicious_answer_is_trusted(
        category in malicious_category_strategy(),
        payload in any::<String>(),
        lowercase in any::<bool>(),
    ) {
        let mut text = format!("VERDICT:MALICIOUS\nCATEGORY:{}", category);
        if lowercase {
            text = text.to_lowercase();
        }
        let result = interpret(&text, &payload, &HeuristicClassifier::default());

        prop_assert_eq!(result.category(), category);
        prop_assert_eq!(result.reason(), format!("LLM classified as {}", category));
    }

    #[test]
    fn strict_safe_answer_ignores_payload(payload in any::<String>()) {
        let heuristic = HeuristicClassifier::default();
        let result = interpret("VERDICT:SAFE\nCATEGORY:", &payload, &heuristic);
        prop_assert!(!result.is_malicious());
        prop_assert_eq!(result.reason(), "LLM classified as SAFE");
    }
}

// ---------------------------------------------------------------------------
// Property: batch counters always agree
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn batch_stats_balance(categories in prop::collection::vec(category_strategy(), 0..64)) {
        let mut stats = BatchStats::new();
        for category in &categories {
            stats.record(&ClassificationResult::new(*category, "recorded"));
        }

        prop_assert_eq!(stats.total, categories.len());
        prop_assert_eq!(stats.total, stats.malicious + stats.safe);
        prop_assert_eq!(stats.by_category.len(), Category::ALL.len());
        prop_assert_eq!(stats.by_category.values().sum::<usize>(), stats.total);
        prop_assert_eq!(
            stats.count(Category::Safe),
            categories.iter().filter(|c| **c == Category::Safe).count()
        );
    }
}

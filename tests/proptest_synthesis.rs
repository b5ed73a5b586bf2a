//! Property tests for the synthesizers and the coordinator
//!
//! Everything a synthesizer returns is verified against its examples, and
//! identical inputs always produce identical output.

use docscope::example::ExampleError;
use docscope::synthesis::extractor_synth::{self, reproduces};
use docscope::synthesis::regex_synth::{self, verify};
use docscope::synthesis::{
    Coordinator, KnowledgeBase, SynthesisConfig, SynthesisError, SynthesisKind, SynthesisRequest,
};
use docscope::Example;
use proptest::collection::{hash_set, vec};
use proptest::prelude::*;

fn config() -> SynthesisConfig {
    SynthesisConfig::default()
}

/// Price strings with their numeric values, e.g. `$12,345` and 12345
fn arb_prices() -> impl Strategy<Value = Vec<Example>> {
    hash_set(1u32..10_000_000, 2..6).prop_map(|amounts| {
        let mut amounts: Vec<u32> = amounts.into_iter().collect();
        amounts.sort_unstable();
        amounts
            .into_iter()
            .map(|n| Example::number(format!("${}", group_thousands(n)), n as f64))
            .collect()
    })
}

fn group_thousands(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Key/value lines whose output is the value field
fn arb_fields() -> impl Strategy<Value = Vec<Example>> {
    vec(("[a-z]{2,6}", "[a-z0-9]{1,6}"), 2..5).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(key, value)| Example::text(format!("{}={}", key, value), value))
            .collect()
    })
}

// ============================================================================
// Fixed Test Cases
// ============================================================================

#[test]
fn test_currency_regex_generalizes() {
    let result = regex_synth::synthesize(&["$100", "$2,500"], &[], &config()).unwrap();
    assert!(verify(&result.pattern, &["$999", "$1,234,567"], &[]));
}

#[test]
fn test_price_extractor_generalizes() {
    let examples = vec![Example::number("$1,234", 1234.0), Example::number("$500", 500.0)];
    let extractors = extractor_synth::synthesize(&examples, &config()).unwrap();
    assert_eq!(extractors[0].eval("$9,999").as_number(), Some(9999.0));
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn regex_accepts_positives_and_rejects_negatives(
        positives in hash_set("[a-z]{1,6}", 1..6),
        negatives in hash_set("[0-9]{1,4}", 0..4),
    ) {
        let positives: Vec<&str> = positives.iter().map(String::as_str).collect();
        let negatives: Vec<&str> = negatives.iter().map(String::as_str).collect();
        let result = regex_synth::synthesize(&positives, &negatives, &config());
        prop_assert!(result.is_ok(), "no regex for {:?} / {:?}", positives, negatives);
        let pattern = result.unwrap().pattern;
        prop_assert!(verify(&pattern, &positives, &negatives), "pattern {}", pattern);
    }

    #[test]
    fn regex_rejects_shared_polarity(word in "[a-z]{1,6}", others in vec("[a-z]{1,6}", 0..3)) {
        let mut positives: Vec<&str> = others.iter().map(String::as_str).collect();
        positives.push(&word);
        let result = regex_synth::synthesize(&positives, &[word.as_str()], &config());
        prop_assert!(matches!(result, Err(SynthesisError::PolarityConflict(_))));
    }

    #[test]
    fn extractors_reproduce_prices(examples in arb_prices()) {
        let extractors = extractor_synth::synthesize(&examples, &config())
            .map_err(|e| TestCaseError::fail(format!("{} for {:?}", e, examples)))?;
        prop_assert!(!extractors.is_empty());
        for extractor in &extractors {
            prop_assert!(reproduces(extractor, &examples, config().epsilon), "{} fails", extractor);
        }
    }

    #[test]
    fn extractors_reproduce_whatever_they_return(examples in arb_fields()) {
        if let Ok(extractors) = extractor_synth::synthesize(&examples, &config()) {
            for extractor in &extractors {
                prop_assert!(reproduces(extractor, &examples, config().epsilon), "{} fails", extractor);
            }
        }
    }

    #[test]
    fn conflicting_examples_are_rejected(mut examples in arb_prices()) {
        let first = examples[0].clone();
        let other = first.output.as_number().unwrap_or(0.0) + 1.0;
        examples.push(Example::number(first.input, other));
        let result = extractor_synth::synthesize(&examples, &config());
        prop_assert!(matches!(
            result,
            Err(SynthesisError::Examples(ExampleError::Conflict { .. }))
        ), "expected ExampleError::Conflict, got {:?}", result);
    }

    #[test]
    fn synthesis_is_deterministic(examples in arb_prices()) {
        let a = extractor_synth::synthesize(&examples, &config());
        let b = extractor_synth::synthesize(&examples, &config());
        prop_assert_eq!(a, b);

        let request = SynthesisRequest::new(SynthesisKind::Extractor, examples);
        let mut kb1 = KnowledgeBase::new();
        let mut kb2 = KnowledgeBase::new();
        let first = Coordinator::new(&mut kb1, &config()).synthesize(&request);
        let second = Coordinator::new(&mut kb2, &config()).synthesize(&request);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn memoized_requests_reuse_the_entry(examples in arb_prices()) {
        let request = SynthesisRequest::new(SynthesisKind::Extractor, examples);
        let mut kb = KnowledgeBase::new();
        let mut coordinator = Coordinator::new(&mut kb, &config());
        let fresh = coordinator.synthesize(&request);
        let again = coordinator.synthesize(&request);
        prop_assert!(fresh.success);
        prop_assert!(!fresh.reused);
        prop_assert!(again.reused);
        prop_assert_eq!(fresh.entry_id, again.entry_id);
        prop_assert_eq!(coordinator.knowledge().len(), 1);
    }
}

//! Property tests for the printer/parser round trip and the resolver
//!
//! `parse(print(t)) == t` for every constructible term, and resolving is
//! idempotent and removes every constraint wrapper.

mod generators;

use docscope::term::{Marker, Term};
use docscope::{parse, print, resolve};
use generators::arb_term;
use proptest::prelude::*;

// ============================================================================
// Fixed Test Cases
// ============================================================================

#[test]
fn test_roundtrip_documented_query() {
    let source = r#"(sum (map (grep "SALES") (lambda x (parseFloat (match x "[0-9,]+" 0)))))"#;
    let term = parse(source).unwrap();
    assert_eq!(print(&term), source);
}

#[test]
fn test_resolve_records_outermost_marker() {
    let term = parse(r#"[∞/0] ⊗ (count [Σ⚡μ] ⊗ (grep "x"))"#).unwrap();
    let resolved = resolve(&term);
    assert_eq!(resolved.marker(), Some(Marker::InfinityZero));
    assert_eq!(print(resolved.term()), r#"(count (grep "x"))"#);
}

#[test]
fn test_keyword_constraints_resolve_like_prefix() {
    let keyword = parse(r#"(count (grep "x") :constraints [eps-phi])"#).unwrap();
    let prefix = parse(r#"[ε⚡φ] ⊗ (count (grep "x"))"#).unwrap();
    assert_eq!(resolve(&keyword), resolve(&prefix));
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn parse_inverts_print(term in arb_term()) {
        let printed = print(&term);
        let reparsed = parse(&printed)
            .map_err(|e| TestCaseError::fail(format!("reparse failed: {}\nprinted: {}", e, printed)))?;
        prop_assert_eq!(reparsed, term, "printed: {}", printed);
    }

    #[test]
    fn printing_is_stable(term in arb_term()) {
        let printed = print(&term);
        let reparsed = parse(&printed).unwrap();
        prop_assert_eq!(print(&reparsed), printed);
    }

    #[test]
    fn resolve_is_idempotent(term in arb_term()) {
        let once = resolve(&term);
        let twice = resolve(once.term());
        prop_assert_eq!(twice.term(), once.term());
        prop_assert!(twice.marker().is_none());
    }

    #[test]
    fn resolved_terms_carry_no_constraints(term in arb_term()) {
        let resolved = resolve(&term);
        prop_assert!(!print(resolved.term()).contains('⊗'));
        if !matches!(term, Term::Constrained { .. }) && !print(&term).contains('⊗') {
            prop_assert_eq!(resolved.term(), &term);
            prop_assert!(resolved.marker().is_none());
        }
    }
}

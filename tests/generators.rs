//! Proptest generators for docscope terms and example sets

#![allow(dead_code)]

use docscope::term::{Literal, Marker, Term};
use docscope::Example;
use proptest::collection::vec;
use proptest::prelude::*;

// ============================================================================
// Names and literals
// ============================================================================

/// A variable name that the parser reads back as a variable
pub fn arb_identifier() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_]{0,15}"
        .prop_filter("reserved word", |s| !matches!(s.as_str(), "true" | "false" | "null"))
}

/// Any variable name, including ones that only survive printing quoted
pub fn arb_name() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => arb_identifier(),
        1 => arb_text(),
        1 => prop::sample::select(vec!["true", "null", "12", "-3", "f(x)", ":k"]).prop_map(String::from),
    ]
}

/// Strings exercising every escape the printer emits
pub fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ,.$:\"\\\\\n\t-]{0,12}"
}

/// Finite numbers that print without an exponent
pub fn arb_number() -> impl Strategy<Value = f64> {
    (-100_000i64..100_000).prop_map(|n| n as f64 / 4.0)
}

pub fn arb_literal() -> impl Strategy<Value = Literal> {
    prop_oneof![
        Just(Literal::Null),
        any::<bool>().prop_map(Literal::Bool),
        arb_number().prop_map(Literal::Number),
        arb_text().prop_map(Literal::Str),
    ]
}

pub fn arb_marker() -> impl Strategy<Value = Marker> {
    prop::sample::select(Marker::all())
}

pub fn arb_example() -> impl Strategy<Value = Example> {
    prop_oneof![
        (arb_text(), arb_number()).prop_map(|(i, n)| Example::number(i, n)),
        (arb_text(), any::<bool>()).prop_map(|(i, b)| Example::flag(i, b)),
        (arb_text(), arb_text()).prop_map(|(i, o)| Example::text(i, o)),
    ]
}

pub fn arb_examples() -> impl Strategy<Value = Vec<Example>> {
    vec(arb_example(), 1..=3)
}

// ============================================================================
// Terms
// ============================================================================

fn arb_leaf() -> impl Strategy<Value = Term> {
    prop_oneof![
        Just(Term::Input),
        Just(Term::CorpusStats),
        arb_literal().prop_map(Term::Lit),
        arb_text().prop_map(|pattern| Term::Grep { pattern }),
        (arb_text(), prop::option::of(1usize..50))
            .prop_map(|(query, limit)| Term::FuzzySearch { query, limit }),
        prop::option::of("[a-z]{1,8}").prop_map(|kind| Term::ListSymbols { kind }),
        arb_text().prop_map(|name| Term::FindReferences { name }),
        arb_name().prop_map(Term::Var),
        arb_examples().prop_map(|examples| Term::Predicate { examples }),
    ]
}

/// Arbitrary well-formed terms up to a small depth
pub fn arb_term() -> impl Strategy<Value = Term> {
    arb_leaf().prop_recursive(4, 48, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(|t| Term::Count(Box::new(t))),
            inner.clone().prop_map(|t| Term::Sum(Box::new(t))),
            inner.clone().prop_map(|t| Term::ParseFloat(Box::new(t))),
            inner.clone().prop_map(|t| Term::ParseInt(Box::new(t))),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Term::Add(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone()).prop_map(|(c, p)| Term::Filter {
                collection: Box::new(c),
                predicate: Box::new(p),
            }),
            (inner.clone(), inner.clone()).prop_map(|(c, t)| Term::Map {
                collection: Box::new(c),
                transform: Box::new(t),
            }),
            (inner.clone(), inner.clone(), inner.clone()).prop_map(|(c, i, r)| Term::Reduce {
                collection: Box::new(c),
                init: Box::new(i),
                reducer: Box::new(r),
            }),
            (inner.clone(), inner.clone(), inner.clone()).prop_map(|(c, t, o)| Term::If {
                cond: Box::new(c),
                then: Box::new(t),
                otherwise: Box::new(o),
            }),
            (inner.clone(), arb_text(), 0usize..4).prop_map(|(text, pattern, group)| Term::Match {
                text: Box::new(text),
                pattern,
                group,
            }),
            (inner.clone(), arb_text(), arb_text()).prop_map(|(text, pattern, replacement)| {
                Term::Replace {
                    text: Box::new(text),
                    pattern,
                    replacement,
                }
            }),
            (inner.clone(), arb_text(), prop::option::of(0usize..8)).prop_map(
                |(text, delimiter, index)| Term::Split {
                    text: Box::new(text),
                    delimiter,
                    index,
                }
            ),
            (inner.clone(), prop::option::of(arb_examples())).prop_map(|(value, examples)| {
                Term::ParseCurrency {
                    value: Box::new(value),
                    examples,
                }
            }),
            (
                inner.clone(),
                prop::option::of(prop::sample::select(vec!["US", "EU", "ISO"])),
                prop::option::of(arb_examples())
            )
                .prop_map(|(value, format, examples)| Term::ParseDate {
                    value: Box::new(value),
                    format: format.map(String::from),
                    examples,
                }),
            (inner.clone(), arb_examples()).prop_map(|(value, examples)| Term::Classify {
                value: Box::new(value),
                examples,
            }),
            (arb_text(), inner.clone()).prop_map(|(name, arg)| Term::ApplyFn {
                name,
                arg: Box::new(arg),
            }),
            (inner.clone(), inner.clone()).prop_map(|(f, a)| Term::App {
                func: Box::new(f),
                arg: Box::new(a),
            }),
            (arb_name(), inner.clone()).prop_map(|(param, body)| Term::Lambda {
                param,
                body: Box::new(body),
            }),
            (arb_marker(), inner).prop_map(|(marker, term)| Term::Constrained {
                marker,
                term: Box::new(term),
            }),
        ]
    })
}

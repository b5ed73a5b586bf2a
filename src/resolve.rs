//! Constraint Resolver
//!
//! Strips every `[Marker] ⊗ term` wrapper, recording (not acting on) the
//! outermost marker. The result is the only term shape the solver and the
//! compiler accept.

use crate::term::{Marker, Term};
use serde::Serialize;

/// Internal invariant violation: a constraint wrapper reached a stage that
/// only accepts resolved terms.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("resolution invariant violated: {0}")]
pub struct ResolutionError(pub String);

/// A term with all constraint wrappers removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolved {
    #[serde(serialize_with = "serialize_term")]
    term: Term,
    marker: Option<Marker>,
}

fn serialize_term<S>(term: &Term, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&crate::syntax::print(term))
}

impl Resolved {
    pub fn term(&self) -> &Term {
        &self.term
    }

    /// The outermost constraint marker the agent attached, if any
    pub fn marker(&self) -> Option<Marker> {
        self.marker
    }

    pub fn into_term(self) -> Term {
        self.term
    }
}

/// Resolve a term: unwrap every constrained node and record the outermost
/// marker (shallowest; ties go to the left-most in evaluation order).
///
/// Idempotent: `resolve(resolve(t).term()).term() == resolve(t).term()`.
pub fn resolve(term: &Term) -> Resolved {
    let mut outermost: Option<(usize, Marker)> = None;
    let term = strip(term, 0, &mut outermost);
    if let Some((depth, marker)) = outermost {
        tracing::debug!("Resolved constraint {} ({}) at depth {}", marker, marker.description(), depth);
    }
    Resolved {
        term,
        marker: outermost.map(|(_, marker)| marker),
    }
}

fn strip(term: &Term, depth: usize, outermost: &mut Option<(usize, Marker)>) -> Term {
    let s = |t: &Term, outermost: &mut Option<(usize, Marker)>| Box::new(strip(t, depth + 1, outermost));

    match term {
        Term::Constrained { marker, term } => {
            if outermost.is_none_or(|(d, _)| depth < d) {
                *outermost = Some((depth, *marker));
            }
            // The wrapper vanishes, so its child sits at the wrapper's depth.
            strip(term, depth, outermost)
        }
        Term::Input
        | Term::Lit(_)
        | Term::Grep { .. }
        | Term::FuzzySearch { .. }
        | Term::CorpusStats
        | Term::Synthesize { .. }
        | Term::Predicate { .. }
        | Term::DefineFn { .. }
        | Term::ListSymbols { .. }
        | Term::FindReferences { .. }
        | Term::Var(_) => term.clone(),
        Term::Filter { collection, predicate } => Term::Filter {
            collection: s(collection, outermost),
            predicate: s(predicate, outermost),
        },
        Term::Map { collection, transform } => Term::Map {
            collection: s(collection, outermost),
            transform: s(transform, outermost),
        },
        Term::Reduce { collection, init, reducer } => Term::Reduce {
            collection: s(collection, outermost),
            init: s(init, outermost),
            reducer: s(reducer, outermost),
        },
        Term::Sum(inner) => Term::Sum(s(inner, outermost)),
        Term::Count(inner) => Term::Count(s(inner, outermost)),
        Term::Match { text, pattern, group } => Term::Match {
            text: s(text, outermost),
            pattern: pattern.clone(),
            group: *group,
        },
        Term::Replace { text, pattern, replacement } => Term::Replace {
            text: s(text, outermost),
            pattern: pattern.clone(),
            replacement: replacement.clone(),
        },
        Term::Split { text, delimiter, index } => Term::Split {
            text: s(text, outermost),
            delimiter: delimiter.clone(),
            index: *index,
        },
        Term::ParseInt(inner) => Term::ParseInt(s(inner, outermost)),
        Term::ParseFloat(inner) => Term::ParseFloat(s(inner, outermost)),
        Term::ParseNumber { value, examples } => Term::ParseNumber {
            value: s(value, outermost),
            examples: examples.clone(),
        },
        Term::ParseDate { value, format, examples } => Term::ParseDate {
            value: s(value, outermost),
            format: format.clone(),
            examples: examples.clone(),
        },
        Term::ParseCurrency { value, examples } => Term::ParseCurrency {
            value: s(value, outermost),
            examples: examples.clone(),
        },
        Term::Add(a, b) => Term::Add(s(a, outermost), s(b, outermost)),
        Term::If { cond, then, otherwise } => Term::If {
            cond: s(cond, outermost),
            then: s(then, outermost),
            otherwise: s(otherwise, outermost),
        },
        Term::Classify { value, examples } => Term::Classify {
            value: s(value, outermost),
            examples: examples.clone(),
        },
        Term::ApplyFn { name, arg } => Term::ApplyFn {
            name: name.clone(),
            arg: s(arg, outermost),
        },
        Term::GetSymbolBody { name } => Term::GetSymbolBody {
            name: s(name, outermost),
        },
        Term::App { func, arg } => Term::App {
            func: s(func, outermost),
            arg: s(arg, outermost),
        },
        Term::Lambda { param, body } => Term::Lambda {
            param: param.clone(),
            body: s(body, outermost),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    #[test]
    fn test_resolve_strips_and_records_outermost() {
        let term = parse(r#"[Σ⚡μ] ⊗ (count [∞/0] ⊗ (grep "ERROR"))"#).unwrap();
        let resolved = resolve(&term);
        assert_eq!(resolved.marker(), Some(Marker::SigmaMu));
        assert_eq!(resolved.term(), &parse(r#"(count (grep "ERROR"))"#).unwrap());
        assert!(!resolved.term().has_constraints());
    }

    #[test]
    fn test_resolve_prefers_shallowest_marker() {
        let term = parse(r#"(add (count [ε⚡φ] ⊗ (grep "a")) [∞/0] ⊗ 1)"#).unwrap();
        assert_eq!(resolve(&term).marker(), Some(Marker::InfinityZero));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let term = parse(r#"(map [Σ⚡μ] ⊗ (grep "x") (lambda y [∞/0] ⊗ y))"#).unwrap();
        let once = resolve(&term);
        let twice = resolve(once.term());
        assert_eq!(once.term(), twice.term());
        assert_eq!(twice.marker(), None);
    }

    #[test]
    fn test_resolve_plain_term_unchanged() {
        let term = parse("(text_stats)").unwrap();
        let resolved = resolve(&term);
        assert_eq!(resolved.term(), &term);
        assert_eq!(resolved.marker(), None);
    }
}

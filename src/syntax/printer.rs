//! Printer - renders a Term back to canonical S-expression text

use crate::example::{Example, escape_string};
use crate::syntax::lexer::is_identifier;
use crate::term::{Literal, SynthesisTarget, Term};

/// Render a term in canonical concrete syntax.
pub fn print(term: &Term) -> String {
    let mut out = String::new();
    write_term(&mut out, term);
    out
}

fn write_literal(out: &mut String, literal: &Literal) {
    match literal {
        Literal::Null => out.push_str("null"),
        Literal::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Literal::Number(n) => out.push_str(&n.to_string()),
        Literal::Str(s) => write_string(out, s),
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    out.push_str(&escape_string(s));
    out.push('"');
}

fn write_examples(out: &mut String, examples: &[Example]) {
    out.push_str(" :examples [");
    for (i, example) in examples.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push('(');
        write_string(out, &example.input);
        out.push(' ');
        out.push_str(&example.output.to_string());
        out.push(')');
    }
    out.push(']');
}

/// `(op arg arg ...)` where every argument is a sub-term
fn write_form(out: &mut String, op: &str, args: &[&Term]) {
    out.push('(');
    out.push_str(op);
    for arg in args {
        out.push(' ');
        write_term(out, arg);
    }
    out.push(')');
}

fn write_term(out: &mut String, term: &Term) {
    match term {
        Term::Input => out.push_str("(input)"),
        Term::Lit(literal) => write_literal(out, literal),
        Term::Grep { pattern } => {
            out.push_str("(grep ");
            write_string(out, pattern);
            out.push(')');
        }
        Term::FuzzySearch { query, limit } => {
            out.push_str("(fuzzy_search ");
            write_string(out, query);
            if let Some(limit) = limit {
                out.push_str(&format!(" {}", limit));
            }
            out.push(')');
        }
        Term::CorpusStats => out.push_str("(text_stats)"),
        Term::Filter { collection, predicate } => write_form(out, "filter", &[&**collection, &**predicate]),
        Term::Map { collection, transform } => write_form(out, "map", &[&**collection, &**transform]),
        Term::Reduce { collection, init, reducer } => {
            write_form(out, "reduce", &[&**collection, &**init, &**reducer])
        }
        Term::Sum(inner) => write_form(out, "sum", &[&**inner]),
        Term::Count(inner) => write_form(out, "count", &[&**inner]),
        Term::Match { text, pattern, group } => {
            out.push_str("(match ");
            write_term(out, text);
            out.push(' ');
            write_string(out, pattern);
            out.push_str(&format!(" {})", group));
        }
        Term::Replace { text, pattern, replacement } => {
            out.push_str("(replace ");
            write_term(out, text);
            out.push(' ');
            write_string(out, pattern);
            out.push(' ');
            write_string(out, replacement);
            out.push(')');
        }
        Term::Split { text, delimiter, index } => {
            out.push_str("(split ");
            write_term(out, text);
            out.push(' ');
            write_string(out, delimiter);
            if let Some(index) = index {
                out.push_str(&format!(" {}", index));
            }
            out.push(')');
        }
        Term::ParseInt(inner) => write_form(out, "parseInt", &[&**inner]),
        Term::ParseFloat(inner) => write_form(out, "parseFloat", &[&**inner]),
        Term::ParseNumber { value, examples } | Term::ParseCurrency { value, examples } => {
            out.push('(');
            out.push_str(term.operator());
            out.push(' ');
            write_term(out, value);
            if let Some(examples) = examples {
                write_examples(out, examples);
            }
            out.push(')');
        }
        Term::ParseDate { value, format, examples } => {
            out.push_str("(parseDate ");
            write_term(out, value);
            if let Some(format) = format {
                out.push_str(" :format ");
                write_string(out, format);
            }
            if let Some(examples) = examples {
                write_examples(out, examples);
            }
            out.push(')');
        }
        Term::Add(a, b) => write_form(out, "add", &[&**a, &**b]),
        Term::If { cond, then, otherwise } => write_form(out, "if", &[&**cond, &**then, &**otherwise]),
        Term::Classify { value, examples } => {
            out.push_str("(classify ");
            write_term(out, value);
            write_examples(out, examples);
            out.push(')');
        }
        Term::Synthesize { target, examples } => {
            out.push_str("(synthesize");
            if *target != SynthesisTarget::Extractor {
                out.push_str(" :type ");
                write_string(out, target.as_str());
            }
            write_examples(out, examples);
            out.push(')');
        }
        Term::Predicate { examples } => {
            out.push_str("(predicate");
            write_examples(out, examples);
            out.push(')');
        }
        Term::DefineFn { name, examples } => {
            out.push_str("(define-fn ");
            write_string(out, name);
            write_examples(out, examples);
            out.push(')');
        }
        Term::ApplyFn { name, arg } => {
            out.push_str("(apply-fn ");
            write_string(out, name);
            out.push(' ');
            write_term(out, arg);
            out.push(')');
        }
        Term::ListSymbols { kind } => {
            out.push_str("(list_symbols");
            if let Some(kind) = kind {
                out.push(' ');
                write_string(out, kind);
            }
            out.push(')');
        }
        Term::GetSymbolBody { name } => write_form(out, "get_symbol_body", &[&**name]),
        Term::FindReferences { name } => {
            out.push_str("(find_references ");
            write_string(out, name);
            out.push(')');
        }
        Term::Var(name) if is_identifier(name) => out.push_str(name),
        Term::Var(name) => {
            out.push_str("(var ");
            write_string(out, name);
            out.push(')');
        }
        Term::App { func, arg } => write_form(out, "app", &[&**func, &**arg]),
        Term::Lambda { param, body } => {
            out.push_str("(lambda ");
            if is_identifier(param) {
                out.push_str(param);
            } else {
                write_string(out, param);
            }
            out.push(' ');
            write_term(out, body);
            out.push(')');
        }
        Term::Constrained { marker, term } => {
            out.push('[');
            out.push_str(marker.as_str());
            out.push_str("] ⊗ ");
            write_term(out, term);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn roundtrip(source: &str) {
        let term = parse(source).unwrap();
        let printed = print(&term);
        let reparsed = parse(&printed).unwrap_or_else(|e| panic!("reparse failed: {}\nprinted: {}", e, printed));
        assert_eq!(term, reparsed, "printed: {}", printed);
    }

    #[test]
    fn test_print_simple() {
        assert_eq!(print(&parse("(count (grep \"ERROR\"))").unwrap()), "(count (grep \"ERROR\"))");
    }

    #[test]
    fn test_print_escapes_strings() {
        let term = Term::string("a\"b\\c\nd");
        assert_eq!(print(&term), r#""a\"b\\c\nd""#);
    }

    #[test]
    fn test_roundtrip_forms() {
        roundtrip(r#"(sum (map (grep "SALES") (lambda x (parseFloat (match x "[0-9,]+" 0)))))"#);
        roundtrip(r#"(filter RESULTS (predicate :examples [("ERROR x" true) ("INFO y" false)]))"#);
        roundtrip(r#"(parseDate _1 :format "EU" :examples [("15.01.2024" "2024-01-15")])"#);
        roundtrip(r#"(synthesize :type "regex" :examples [("$100" true)])"#);
        roundtrip(r#"[ε⚡φ] ⊗ (reduce (grep "x") 0 (lambda acc (lambda y (add acc 1))))"#);
        roundtrip(r#"(fuzzy_search "disk full" 3)"#);
        roundtrip(r#"(split (input) "," 2)"#);
        roundtrip(r#"(define-fn "price" (("$5" 5) ("$7.50" 7.5)))"#);
        roundtrip(r#"(classify x :examples [("a" ["x" 1 null]) ("b" false)])"#);
        roundtrip(r#"(if (match x "a" 0) (list_symbols "function") (find_references "main"))"#);
    }

    #[test]
    fn test_awkward_names_survive_reparse() {
        for name in ["true", "12", "a b", "f(x)", ""] {
            let term = Term::lambda(name, Term::var(name));
            let printed = print(&term);
            assert_eq!(parse(&printed).unwrap(), term, "printed: {}", printed);
        }
        assert_eq!(print(&Term::var("null")), r#"(var "null")"#);
        assert_eq!(print(&Term::var("x")), "x");
    }

    #[test]
    fn test_print_app_is_canonical() {
        assert_eq!(print(&parse("((lambda x x) 1)").unwrap()), "(app (lambda x x) 1)");
    }
}

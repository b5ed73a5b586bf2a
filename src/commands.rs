use anyhow::Context;
use docscope::config::write_config;
use docscope::output::{OutputMode, emit_json};
use docscope::solver::Value;
use docscope::synthesis::{SynthesisKind, SynthesisRequest, SynthesisResult};
use docscope::tools::DocumentTools;
use docscope::ui::{
    Icons, error, header, info, knowledge_table, matches_table, section, stats_table, status,
    success, summary_row, symbols_table, trace, warn,
};
use docscope::{DocscopeConfig, Example, Session};
use std::path::Path;

fn read_document(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

pub fn run_query(
    file: &Path,
    queries: &[String],
    show_knowledge: bool,
    config: DocscopeConfig,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let text = read_document(file)?;
    let mut session = Session::new(text, config);
    tracing::debug!("Opened {} ({} lines)", file.display(), session.document().line_count());

    let mut failures = 0;
    let mut turns = Vec::new();
    if output_mode == OutputMode::Human {
        header(&format!("Querying {}", file.display()));
    }

    for query in queries {
        let result = session.execute(query);
        if !result.success {
            failures += 1;
        }
        match output_mode {
            OutputMode::Json => turns.push(serde_json::json!({
                "query": query,
                "result": result,
            })),
            OutputMode::Human => {
                section(&format!(" {} ", query));
                for line in &result.logs {
                    trace(line);
                }
                match &result.error {
                    Some(message) => error(message),
                    None => print_value(&result.value),
                }
            }
        }
    }

    match output_mode {
        OutputMode::Json => {
            let knowledge = show_knowledge.then(|| session.knowledge().entries());
            emit_json(&serde_json::json!({
                "turns": turns,
                "knowledge": knowledge,
            }))?;
        }
        OutputMode::Human if show_knowledge => {
            section(&format!(" {} Knowledge base ", Icons::BRAIN));
            let table = knowledge_table(session.knowledge().entries());
            if table.is_empty() {
                info("entries", "0");
            } else {
                println!("{}", table);
            }
        }
        OutputMode::Human => {}
    }

    if failures > 0 {
        anyhow::bail!("{} of {} queries failed", failures, queries.len());
    }
    Ok(())
}

fn print_value(value: &Value) {
    if let Value::Array(items) = value {
        let matches: Option<Vec<_>> = items
            .iter()
            .map(|v| match v {
                Value::Match(m) => Some(m.clone()),
                _ => None,
            })
            .collect();
        if let Some(matches) = matches.filter(|m| !m.is_empty()) {
            println!("{}", matches_table(&matches));
            summary_row("hits", &matches.len().to_string());
            return;
        }

        let symbols: Option<Vec<_>> = items
            .iter()
            .map(|v| match v {
                Value::Symbol(s) => Some(s.clone()),
                _ => None,
            })
            .collect();
        if let Some(symbols) = symbols.filter(|s| !s.is_empty()) {
            println!("{}", symbols_table(&symbols));
            return;
        }
    }

    match value {
        Value::Stats(stats) => println!("{}", stats_table(stats)),
        other => summary_row(
            &format!("{} {}", Icons::for_value(other), other.kind_name()),
            &other.to_string(),
        ),
    }
}

pub fn run_check(
    query: &str,
    file: Option<&Path>,
    config: DocscopeConfig,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let text = match file {
        Some(path) => read_document(path)?,
        None => String::new(),
    };
    let session = Session::new(text, config);
    let ty = session.check(query)?;

    match output_mode {
        OutputMode::Json => emit_json(&serde_json::json!({ "query": query, "type": ty }))?,
        OutputMode::Human => {
            if let Some(marker) = session.prepare(query)?.marker() {
                status(Icons::GEAR, "constraint", &marker.to_string());
            }
            summary_row("type", &ty.to_string());
        }
    }
    Ok(())
}

pub fn run_compile(query: &str, config: DocscopeConfig, output_mode: OutputMode) -> anyhow::Result<()> {
    let mut session = Session::new(String::new(), config);
    let program = session.compile(query)?;

    match output_mode {
        OutputMode::Json => emit_json(&serde_json::json!({
            "query": query,
            "program": program,
        }))?,
        OutputMode::Human => {
            println!("{}", program);
            if !session.knowledge().is_empty() {
                info("synthesized", &session.knowledge().len().to_string());
            }
        }
    }
    Ok(())
}

pub fn run_regex(
    positives: Vec<String>,
    negatives: Vec<String>,
    config: DocscopeConfig,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let examples = positives.into_iter().map(|p| Example::flag(p, true)).collect();
    let request = SynthesisRequest::new(SynthesisKind::Regex, examples).with_negatives(negatives);
    let mut session = Session::new(String::new(), config);
    let result = session.synthesize(&request);
    report_synthesis(&result, output_mode)
}

pub fn run_extract(
    pairs: &[String],
    inputs: &[String],
    config: DocscopeConfig,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let examples = pairs
        .iter()
        .map(|p| p.parse::<Example>())
        .collect::<Result<Vec<_>, _>>()?;
    let request = SynthesisRequest::new(SynthesisKind::Extractor, examples);
    let mut session = Session::new(String::new(), config);
    let result = session.synthesize(&request);

    let Some(extractor) = result.extractor() else {
        return report_synthesis(&result, output_mode);
    };
    let applied: Vec<_> = inputs
        .iter()
        .map(|input| (input.as_str(), extractor.eval(input)))
        .collect();

    match output_mode {
        OutputMode::Json => emit_json(&serde_json::json!({
            "synthesis": result,
            "applied": applied
                .iter()
                .map(|(input, output)| serde_json::json!({ "input": input, "output": output }))
                .collect::<Vec<_>>(),
            "javascript": extractor.to_js_function(),
        }))?,
        OutputMode::Human => {
            report_synthesis(&result, output_mode)?;
            if !applied.is_empty() {
                section(" Applied ");
                for (input, output) in &applied {
                    summary_row(input, &output.to_string());
                }
            }
        }
    }
    Ok(())
}

fn report_synthesis(result: &SynthesisResult, output_mode: OutputMode) -> anyhow::Result<()> {
    if output_mode == OutputMode::Json {
        emit_json(result)?;
    } else {
        for line in &result.logs {
            trace(line);
        }
        if result.success {
            success(&format!("{} Synthesized {}", Icons::for_synthesis(result.kind), result.kind));
            if let Some(pattern) = &result.pattern {
                summary_row("regex", pattern);
            }
            for extractor in &result.extractors {
                summary_row("extractor", &extractor.to_string());
            }
            if result.reused {
                status(Icons::SPARKLE, "reused", "knowledge base entry");
            }
        }
    }

    match &result.error {
        Some(message) if !result.success => {
            if output_mode == OutputMode::Human {
                warn(message);
            }
            anyhow::bail!("synthesis failed: {}", message)
        }
        _ => Ok(()),
    }
}

pub fn run_stats(file: &Path, show_symbols: bool, output_mode: OutputMode) -> anyhow::Result<()> {
    let text = read_document(file)?;
    let session = Session::new(text, DocscopeConfig::default());
    let document = session.document();
    let stats = document.corpus_stats();
    let symbols = if show_symbols {
        document.list_symbols(None)?
    } else {
        Vec::new()
    };

    match output_mode {
        OutputMode::Json => emit_json(&serde_json::json!({
            "stats": stats,
            "symbols": symbols,
        }))?,
        OutputMode::Human => {
            header(&format!("{} Docscope Statistics ({})", Icons::STATS, file.display()));
            println!("{}", stats_table(&stats));
            if show_symbols {
                section(&format!(" {} Outline ", Icons::FILE));
                if symbols.is_empty() {
                    info("symbols", "0");
                } else {
                    println!("{}", symbols_table(&symbols));
                }
            }
        }
    }
    Ok(())
}

pub fn run_init(path: &Path, force: bool, output_mode: OutputMode) -> anyhow::Result<()> {
    write_config(path, &DocscopeConfig::default(), force)?;
    match output_mode {
        OutputMode::Json => emit_json(&serde_json::json!({ "written": path }))?,
        OutputMode::Human => success(&format!("Wrote {}", path.display())),
    }
    Ok(())
}

use crate::synthesis::KnowledgeEntry;
use crate::tools::{CorpusStats, GrepMatch, SymbolInfo};
use tabled::{Table, Tabled, settings::Style};

/// Longest cell text before truncation
const CELL_WIDTH: usize = 72;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
struct MatchRow {
    #[tabled(rename = "Line")]
    line_num: usize,
    #[tabled(rename = "Match")]
    matched: String,
    #[tabled(rename = "Text")]
    line: String,
}

#[derive(Tabled)]
struct SymbolRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Lines")]
    lines: String,
    #[tabled(rename = "Signature")]
    signature: String,
}

#[derive(Tabled)]
struct KnowledgeRow {
    #[tabled(rename = "Id")]
    id: usize,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Program")]
    program: String,
    #[tabled(rename = "Examples")]
    examples: usize,
    #[tabled(rename = "Uses")]
    uses: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: clip(value),
        });
    }

    pub fn build(&self) -> String {
        render(&self.rows)
    }
}

fn render<T: Tabled>(rows: &[T]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

fn clip(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= CELL_WIDTH {
        return text.to_string();
    }
    let head: String = text.chars().take(CELL_WIDTH - 1).collect();
    format!("{}…", head)
}

pub fn stats_table(stats: &CorpusStats) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("Length", &stats.length.to_string());
    builder.add_row("Lines", &stats.line_count.to_string());
    builder.add_row("Start", &stats.sample.start);
    builder.add_row("Middle", &stats.sample.middle);
    builder.add_row("End", &stats.sample.end);
    builder.build()
}

pub fn matches_table(matches: &[GrepMatch]) -> String {
    let rows: Vec<MatchRow> = matches
        .iter()
        .map(|m| MatchRow {
            line_num: m.line_num,
            matched: clip(&m.matched),
            line: clip(&m.line),
        })
        .collect();
    render(&rows)
}

pub fn symbols_table(symbols: &[SymbolInfo]) -> String {
    let rows: Vec<SymbolRow> = symbols
        .iter()
        .map(|s| SymbolRow {
            name: s.name.clone(),
            kind: s.kind.to_string(),
            lines: format!("{}-{}", s.line_num, s.line_end),
            signature: clip(&s.signature),
        })
        .collect();
    render(&rows)
}

pub fn knowledge_table(entries: &[KnowledgeEntry]) -> String {
    let rows: Vec<KnowledgeRow> = entries
        .iter()
        .map(|e| KnowledgeRow {
            id: e.id,
            kind: e.kind.to_string(),
            program: clip(&e.source.describe()),
            examples: e.examples.len(),
            uses: format!("{}/{}", e.success_count, e.usage_count),
        })
        .collect();
    render(&rows)
}

//! Docscope CLI - run constrained queries and synthesis against a document

mod commands;

use clap::{Parser, Subcommand};
use docscope::DocscopeConfig;
use docscope::config::load_config;
use docscope::output::{OutputMode, set_mode};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "docscope")]
#[command(version = "0.1.0")]
#[command(about = "Constrained S-expression queries over documents too large to read")]
#[command(long_about = r#"
Docscope runs small S-expression programs against a document, enabling:
  • grep, fuzzy search and outline queries without reading the whole file
  • Number, currency and date coercion of matched text
  • Example-driven synthesis of regexes and extractors
  • Compilation of queries to standalone JavaScript

Example usage:
  docscope query server.log '(count (grep "ERROR"))'
  docscope regex 2024-01-15 2023-12-31 --negative hello
  docscope extract -e '$1,234=>1234' -e '$500=>500' -i '$9,999'
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file (defaults to ./docscope.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one or more queries against a document, sharing bindings across turns
    Query {
        /// Document to query
        file: PathBuf,

        /// Queries, executed in order
        #[arg(required = true)]
        queries: Vec<String>,

        /// List the knowledge base after the last query
        #[arg(short, long)]
        knowledge: bool,
    },

    /// Infer the static type of a query
    Check {
        /// Query to check
        query: String,

        /// Document whose bindings are in scope
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Compile a query to a JavaScript program
    Compile {
        /// Query to compile
        query: String,
    },

    /// Synthesize a regex accepting every positive and no negative
    Regex {
        /// Strings the regex must match
        #[arg(required = true)]
        positives: Vec<String>,

        /// Strings the regex must reject
        #[arg(short, long)]
        negative: Vec<String>,
    },

    /// Synthesize an extractor from input=>output examples
    Extract {
        /// Example in the form `input=>output`
        #[arg(short, long = "example", required = true)]
        examples: Vec<String>,

        /// Inputs to run the synthesized extractor on
        #[arg(short, long)]
        input: Vec<String>,
    },

    /// Show size, samples and outline of a document
    Stats {
        /// Document to inspect
        file: PathBuf,

        /// Also list the document's symbols
        #[arg(short, long)]
        symbols: bool,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },
}

/// An explicit `--config` must exist; the default path is optional.
fn read_config(path: Option<&Path>) -> anyhow::Result<DocscopeConfig> {
    match load_config(path)? {
        Some(config) => Ok(config),
        None => {
            if let Some(path) = path {
                anyhow::bail!("config file not found: {}", path.display());
            }
            Ok(DocscopeConfig::default())
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = set_mode(OutputMode::from_flag(cli.json));

    let config = if matches!(cli.command, Commands::Init { .. }) {
        DocscopeConfig::default()
    } else {
        read_config(cli.config.as_deref())?
    };

    match cli.command {
        Commands::Query {
            file,
            queries,
            knowledge,
        } => commands::run_query(&file, &queries, knowledge, config, output_mode),
        Commands::Check { query, file } => {
            commands::run_check(&query, file.as_deref(), config, output_mode)
        }
        Commands::Compile { query } => commands::run_compile(&query, config, output_mode),
        Commands::Regex {
            positives,
            negative,
        } => commands::run_regex(positives, negative, config, output_mode),
        Commands::Extract { examples, input } => {
            commands::run_extract(&examples, &input, config, output_mode)
        }
        Commands::Stats { file, symbols } => commands::run_stats(&file, symbols, output_mode),
        Commands::Init { force } => {
            let path = cli
                .config
                .unwrap_or_else(docscope::config::default_config_path);
            commands::run_init(&path, force, output_mode)
        }
    }
}

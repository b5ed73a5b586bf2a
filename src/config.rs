use crate::solver::{DEFAULT_FUZZY_LIMIT, DateConvention, SolverConfig};
use crate::synthesis::{DEFAULT_ALTERNATION_LIMIT, DEFAULT_MAX_EXTRACTORS, SynthesisConfig};
use crate::example::NUMERIC_EPSILON;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocscopeConfig {
    /// Hits returned by `fuzzy_search` without an explicit limit
    pub fuzzy_limit: usize,
    /// Extractors kept per synthesis
    pub max_extractors: usize,
    /// Most positives a literal-alternation regex may list
    pub alternation_limit: usize,
    /// Relative tolerance when comparing numeric outputs
    pub numeric_epsilon: f64,
    /// Reject queries the type inferencer flags instead of only warning
    pub strict_inference: bool,
    /// Reading of ambiguous `NN/NN/YYYY` dates
    pub date_convention: DateConvention,
}

impl Default for DocscopeConfig {
    fn default() -> Self {
        Self {
            fuzzy_limit: DEFAULT_FUZZY_LIMIT,
            max_extractors: DEFAULT_MAX_EXTRACTORS,
            alternation_limit: DEFAULT_ALTERNATION_LIMIT,
            numeric_epsilon: NUMERIC_EPSILON,
            strict_inference: false,
            date_convention: DateConvention::default(),
        }
    }
}

impl DocscopeConfig {
    pub fn synthesis(&self) -> SynthesisConfig {
        SynthesisConfig {
            max_extractors: self.max_extractors,
            alternation_limit: self.alternation_limit,
            epsilon: self.numeric_epsilon,
        }
    }

    pub fn solver(&self) -> SolverConfig {
        SolverConfig {
            fuzzy_limit: self.fuzzy_limit,
            date_convention: self.date_convention,
            synthesis: self.synthesis(),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("docscope.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<DocscopeConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: DocscopeConfig = toml::from_str(&contents)?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &DocscopeConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

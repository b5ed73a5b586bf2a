//! Process-wide output settings shared by the CLI and the `ui` printers.
//!
//! The binary fixes the mode once at startup. In JSON mode stdout carries
//! only the JSON document, so every decoration in `ui` is dropped.

use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Human,
    Json,
}

impl OutputMode {
    pub fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Human }
    }

    pub fn is_json(self) -> bool {
        self == Self::Json
    }
}

static MODE: OnceLock<OutputMode> = OnceLock::new();
static QUIET: OnceLock<bool> = OnceLock::new();

/// Fix the mode for the rest of the process and return the one in effect.
/// Only the first call wins.
pub fn set_mode(mode: OutputMode) -> OutputMode {
    *MODE.get_or_init(|| mode)
}

pub fn mode() -> OutputMode {
    MODE.get().copied().unwrap_or_default()
}

fn quiet_flag(value: Option<&str>) -> bool {
    value.map(str::trim).is_some_and(|v| {
        v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes")
    })
}

/// Whether decorations are suppressed: JSON mode, or `DOCSCOPE_QUIET=1`
pub fn is_quiet() -> bool {
    mode().is_json()
        || *QUIET.get_or_init(|| quiet_flag(std::env::var("DOCSCOPE_QUIET").ok().as_deref()))
}

pub fn render_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Print `value` as the command's JSON document on stdout.
pub fn emit_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", render_json(value)?);
    Ok(())
}

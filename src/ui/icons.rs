use crate::solver::Value;
use crate::synthesis::SynthesisKind;

pub struct Icons;

impl Icons {
    pub const ROCKET: &str = "🚀";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const BRAIN: &str = "🧠";
    pub const FILE: &str = "📄";
    pub const GEAR: &str = "⚙️";
    pub const SPARKLE: &str = "✨";
    pub const RIGHT: &str = "➡️";
    pub const HIT: &str = "🎯";
    pub const NUMBER: &str = "🔢";
    pub const TEXT: &str = "🔤";
    pub const LIST: &str = "📋";
    pub const LAMBDA: &str = "λ";
    pub const PATTERN: &str = "🧩";
    pub const EXTRACT: &str = "🪝";

    /// Marker printed beside a query result
    pub fn for_value(value: &Value) -> &'static str {
        match value {
            Value::Null => Self::RIGHT,
            Value::Bool(true) => Self::CHECK,
            Value::Bool(false) => Self::CROSS,
            Value::Number(_) => Self::NUMBER,
            Value::Str(_) => Self::TEXT,
            Value::Array(_) => Self::LIST,
            Value::Match(_) | Value::Fuzzy(_) => Self::HIT,
            Value::Stats(_) => Self::STATS,
            Value::Symbol(_) => Self::FILE,
            Value::Function(_) => Self::LAMBDA,
        }
    }

    pub fn for_synthesis(kind: SynthesisKind) -> &'static str {
        match kind {
            SynthesisKind::Regex => Self::PATTERN,
            SynthesisKind::Extractor => Self::EXTRACT,
            SynthesisKind::Transformer => Self::GEAR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_icons_follow_kind() {
        assert_eq!(Icons::for_value(&Value::Number(3.0)), Icons::NUMBER);
        assert_eq!(Icons::for_value(&Value::Bool(false)), Icons::CROSS);
        assert_eq!(Icons::for_value(&Value::Array(Vec::new())), Icons::LIST);
        assert_eq!(Icons::for_synthesis(SynthesisKind::Regex), Icons::PATTERN);
    }
}

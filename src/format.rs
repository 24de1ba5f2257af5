//! Output formatting for values printed by the CLI.

use clap::ValueEnum;
use serde_json::Value;

/// Output format for printed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    /// Strings unquoted, everything else as compact JSON
    Raw,
}

/// Render `value` for terminal output, without a trailing newline.
pub fn render(value: &Value, format: OutputFormat) -> anyhow::Result<String> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?.trim_end().to_string(),
        OutputFormat::Raw => match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    };
    Ok(text)
}

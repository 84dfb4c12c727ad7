//! Output formatting for resolved properties and candidate layers.

use crate::config::{Layer, Properties};
use anyhow::Result;
use serde_json::{Value, json};

/// Output format for `show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `key = value` lines, readable back as a properties file
    #[default]
    Text,
    Json,
    Yaml,
}

/// Render a store in the requested format.
pub fn format_properties(props: &Properties, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => {
            let mut buf = Vec::new();
            props.write_to(&mut buf)?;
            String::from_utf8(buf)?
        }
        OutputFormat::Json => serde_json::to_string_pretty(props)?,
        OutputFormat::Yaml => serde_yaml::to_string(props)?,
    })
}

/// Describe candidate layers as JSON, marking which exist on disk.
pub fn layers_to_json(layers: &[Layer]) -> Value {
    Value::Array(
        layers
            .iter()
            .map(|layer| {
                json!({
                    "path": layer.path.to_string_lossy(),
                    "root": layer.root.to_string(),
                    "role": layer.role.to_string(),
                    "exists": layer.path.is_file(),
                })
            })
            .collect(),
    )
}

/// Describe candidate layers as aligned text lines.
pub fn format_layers_text(layers: &[Layer]) -> String {
    let mut out = String::new();
    for layer in layers {
        let marker = if layer.path.is_file() { "+" } else { "-" };
        out.push_str(&format!(
            "{} {:<11} {:<11} {}\n",
            marker,
            layer.root.to_string(),
            layer.role.to_string(),
            layer.path.display()
        ));
    }
    out
}

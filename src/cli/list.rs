use clap::ValueEnum;

use super::utils::{open_registry, write_output};
use super::CommonArgs;
use crate::error::Result;

/// Listing format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Run the list subcommand
pub fn list(args: &CommonArgs, format: OutputFormat) -> Result<()> {
    let registry = open_registry(args)?;

    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(registry.records())?,
        OutputFormat::Text => {
            if registry.is_empty() {
                "no superfluous variables".to_string()
            } else {
                registry
                    .records()
                    .iter()
                    .map(|r| r.to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
    };

    write_output(&content, None)
}

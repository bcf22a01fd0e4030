//! Click scripts and interactive command lines.
//!
//! ```toml
//! [[click]]
//! square = "5-2"
//!
//! [[click]]
//! square = "4-3"
//! ```

use anyhow::{Context, Result};
use bus::HostCommand;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default)]
    click: Vec<Click>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Click {
    square: String,
    /// Event type to fire instead of `click`.
    #[serde(default)]
    event: Option<String>,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid script {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn len(&self) -> usize {
        self.click.len()
    }

    pub fn is_empty(&self) -> bool {
        self.click.is_empty()
    }

    pub fn commands(&self) -> impl Iterator<Item = HostCommand> + '_ {
        self.click.iter().map(|click| match &click.event {
            Some(event_type) => HostCommand::Fire {
                target: click.square.clone(),
                event_type: event_type.clone(),
            },
            None => HostCommand::click(click.square.as_str()),
        })
    }
}

/// One stdin line: `ROW-COL`, `fire ID TYPE`, `print` or `quit`. Blank lines
/// and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<HostCommand>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let command = match (words.next(), words.next(), words.next(), words.next()) {
        (Some("print"), None, None, None) => HostCommand::Snapshot,
        (Some("quit"), None, None, None) => HostCommand::Shutdown,
        (Some("fire"), Some(target), Some(event_type), None) => HostCommand::Fire {
            target: target.to_string(),
            event_type: event_type.to_string(),
        },
        (Some(target), None, None, None) => HostCommand::click(target),
        _ => return Err(format!("unrecognized command: {line}")),
    };
    Ok(Some(command))
}

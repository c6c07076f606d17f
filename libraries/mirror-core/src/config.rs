//! Configuration values threaded through every sync operation, plus the two
//! small parsers the orchestrator needs: memory-limit strings and remote
//! folder share URLs.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for one sync target, resolved once per run and passed
/// explicitly (no ambient globals).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Sync target name, e.g. an environment like `prod`. Keys the persisted
    /// fingerprint history.
    pub target: String,
    /// Project identifier handed to the publish collaborator.
    pub project_id: String,
    /// Default remote folder share URL, used when the config store has no
    /// entry for the target.
    pub folder_url: String,
    /// Working-memory limit as a human string, e.g. `1GiB` or `512MiB`.
    /// The budget guard applies a 90% safety margin on top of this.
    pub memory_limit: String,
    /// Maximum number of in-flight remote operations across the whole
    /// recursive walk.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

fn default_max_in_flight() -> usize {
    16
}

impl SyncConfig {
    /// Memory limit in bytes, or an error if the string is unparseable.
    pub fn memory_limit_bytes(&self) -> Result<u64, ConfigError> {
        parse_memory_to_bytes(&self.memory_limit)
            .ok_or_else(|| ConfigError::InvalidMemoryLimit(self.memory_limit.clone()))
    }
}

/// Configuration errors surfaced before a run starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid memory limit: {0:?} (expected e.g. \"1GiB\" or \"512MiB\")")]
    InvalidMemoryLimit(String),

    #[error("could not extract a folder id from URL: {0:?}")]
    InvalidFolderUrl(String),
}

/// Parse a memory size string (`1GiB`, `512MiB`, `256KB`, `1024`) into bytes.
///
/// Binary units (GiB/MiB/KiB) are powers of 1024, decimal units (GB/MB/KB)
/// powers of 1000. A bare number is taken as bytes.
pub fn parse_memory_to_bytes(memory: &str) -> Option<u64> {
    let trimmed = memory.trim();
    let numeric: String = trimmed
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let value: f64 = numeric.parse().ok()?;

    let unit = trimmed[numeric.len()..].trim().to_ascii_uppercase();
    let multiplier: f64 = match unit.as_str() {
        "GIB" => 1024.0 * 1024.0 * 1024.0,
        "MIB" => 1024.0 * 1024.0,
        "KIB" => 1024.0,
        "GB" => 1000.0 * 1000.0 * 1000.0,
        "MB" => 1000.0 * 1000.0,
        "KB" => 1000.0,
        "" | "B" => 1.0,
        _ => return None,
    };

    Some((value * multiplier) as u64)
}

/// Format a byte count as MiB with two decimals, e.g. `921.60MiB`.
///
/// Used in the budget-guard error message so both figures are readable.
pub fn format_mib(bytes: &u64) -> String {
    format!("{:.2}MiB", *bytes as f64 / 1024.0 / 1024.0)
}

static FOLDER_URL_RE: Lazy<Regex> = Lazy::new(|| {
    // Two share-link forms:
    //   https://drive.google.com/drive/folders/<id>?usp=drive_link
    //   https://drive.google.com/open?id=<id>
    Regex::new(r"folders/([a-zA-Z0-9_-]+)|[?&]id=([a-zA-Z0-9_-]+)")
        .expect("folder URL regex is valid")
});

/// Extract the folder id from a remote folder share URL.
///
/// A bare folder id is also accepted, so persisted config can store either
/// form.
pub fn parse_folder_id_from_url(url: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }
    if let Some(caps) = FOLDER_URL_RE.captures(url) {
        return caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string());
    }
    // Not a URL at all: treat a plain id-shaped string as the id itself.
    if !url.contains('/') && url.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Some(url.to_string());
    }
    None
}

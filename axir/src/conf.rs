//! Per-block weight configuration, one `name = weight` entry per line.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfError {
    #[error("line {line}: incomplete entry, missing `=`")]
    MissingEquals { line: usize },
    #[error("line {line}: invalid weight `{text}`")]
    BadWeight { line: usize, text: String },
}

/// Parses block weights in declaration order. Blank lines are skipped.
/// The caller is responsible for matching the entry count against the
/// number of blocks in the paired program.
pub fn parse_conf(text: &str) -> Result<Vec<(String, u64)>, ConfError> {
    let mut entries = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            return Err(ConfError::MissingEquals { line });
        };
        let value = value.trim();
        let weight = value.parse::<u64>().map_err(|_| ConfError::BadWeight {
            line,
            text: value.to_string(),
        })?;
        entries.push((key.trim().to_string(), weight));
    }
    Ok(entries)
}

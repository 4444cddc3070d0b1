//! Channel list parsing.
//!
//! The list is a plain text file of `# Name` lines, each followed by the
//! feed identifier on the next line:
//!
//! ```text
//! # Alpha Channel
//! UCaaaaaaaaaaaaaaaaaaaaaa
//! # Beta Channel
//! UCbbbbbbbbbbbbbbbbbbbbbb
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::FeedSource;

#[derive(Error, Debug)]
pub enum SeedListError {
    #[error("Failed to read channel list at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Channel list line {line}: \"{name}\" is not followed by an id line")]
    MissingId { line: usize, name: String },
}

pub fn load(path: &Path) -> Result<Vec<FeedSource>, SeedListError> {
    let content = std::fs::read_to_string(path).map_err(|e| SeedListError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<Vec<FeedSource>, SeedListError> {
    let mut sources = Vec::new();
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    while let Some((line_no, name_line)) = lines.next() {
        let name = name_line.trim_start_matches('#').trim().to_string();
        match lines.next() {
            Some((_, id)) if !id.starts_with('#') => sources.push(FeedSource::new(id, name)),
            _ => {
                return Err(SeedListError::MissingId {
                    line: line_no,
                    name,
                })
            }
        }
    }

    Ok(sources)
}

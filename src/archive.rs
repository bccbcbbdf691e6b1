//! Per-turn transcript archival
//!
//! Each completed turn writes its speakable text to a uniquely named file
//! under the output directory, named from the first few words of the user's
//! request plus a timestamp.

use std::path::{Path, PathBuf};

use crate::Result;

/// Number of leading words of user text used in the filename
const NAME_WORDS: usize = 3;

/// Characters invalid in filenames across platforms
const INVALID_FILENAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Writes spoken responses to disk
pub struct ResponseArchive {
    output_dir: PathBuf,
}

impl ResponseArchive {
    /// Create a new archive rooted at `output_dir`. The directory is
    /// created on demand at save time.
    #[must_use]
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Save the spoken response for a turn, returning the path written.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or the file cannot
    /// be written
    pub fn save(&self, response: &str, user_text: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let file_name = archive_file_name(user_text, &timestamp);
        let path = self.output_dir.join(file_name);

        std::fs::write(&path, response)?;
        tracing::info!(path = %path.display(), "response archived");

        Ok(path)
    }

    /// The archive's output directory
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Build the archive filename from user text and a timestamp
fn archive_file_name(user_text: &str, timestamp: &str) -> String {
    let prefix = user_text
        .split_whitespace()
        .take(NAME_WORDS)
        .collect::<Vec<_>>()
        .join("_");

    let name = if prefix.is_empty() {
        format!("response_{timestamp}.txt")
    } else {
        format!("{prefix}_{timestamp}.txt")
    };

    sanitize_filename(&name)
}

/// Strip characters that are invalid in filenames on common platforms
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !INVALID_FILENAME_CHARS.contains(c))
        .collect()
}

//! Filesystem storage for submitted point images.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::Rng;

#[derive(Clone, Debug)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Writes the image body under a collision-resistant name built from a
    /// random hex prefix and the sanitized client filename, and returns the
    /// stored filename.
    pub fn save(&self, original_name: &str, bytes: &[u8]) -> io::Result<String> {
        let prefix: [u8; 6] = rand::thread_rng().gen();
        let prefix: String = prefix.iter().map(|b| format!("{b:02x}")).collect();
        let filename = format!("{}-{}", prefix, sanitize_filename(original_name));

        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(&filename), bytes)?;
        Ok(filename)
    }
}

/// Strips any path components the client smuggled in and replaces characters
/// outside `[A-Za-z0-9._-]`.
fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("upload");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.chars().all(|c| c == '.') {
        "upload".to_string()
    } else {
        cleaned
    }
}

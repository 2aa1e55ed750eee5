//! Document loader for the knowledge base directory

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use ragchat_core::{RawDocument, Result};

/// Reads every readable text file under a directory
pub struct DocumentLoader {
    dir: PathBuf,
    recursive: bool,
}

impl DocumentLoader {
    pub fn new(dir: impl Into<PathBuf>, recursive: bool) -> Self {
        Self {
            dir: dir.into(),
            recursive,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the document directory if it does not exist yet
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Load all documents, sorted by path
    ///
    /// Fails only when the directory itself cannot be read. Hidden entries are
    /// ignored, and files that cannot be read or are not UTF-8 text are skipped.
    pub fn load(&self) -> Result<Vec<RawDocument>> {
        let mut files = Vec::new();
        self.collect_files(&self.dir, &mut files)?;
        files.sort();

        let mut documents = Vec::with_capacity(files.len());
        for path in files {
            match fs::read(&path) {
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(content) => documents.push(RawDocument::new(path, content)),
                    Err(_) => warn!(path = %path.display(), "skipping file that is not UTF-8 text"),
                },
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable file"),
            }
        }

        debug!(dir = %self.dir.display(), documents = documents.len(), "loaded documents");
        Ok(documents)
    }

    fn collect_files(&self, dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if is_hidden(&entry.file_name()) {
                continue;
            }

            let path = entry.path();
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                if self.recursive {
                    if let Err(e) = self.collect_files(&path, files) {
                        warn!(path = %path.display(), error = %e, "skipping unreadable directory");
                    }
                }
            } else if file_type.is_file() {
                files.push(path);
            } else if file_type.is_symlink() {
                // Linked files are read, linked directories are never followed.
                if path.is_file() {
                    files.push(path);
                } else {
                    debug!(path = %path.display(), "skipping symlink that is not a file");
                }
            }
        }
        Ok(())
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use pipeline_logging::pipeline_warn;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::ItemRecord;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Remove a directory's prior contents and recreate it empty. Used for
/// bundle directories, which are rebuilt from scratch on every run.
pub fn reset_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    ensure_output_dir(dir)
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file
/// then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        self.write_bytes(filename, content.as_bytes())
    }

    pub fn write_bytes(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // Replace existing file if present to keep determinism.
        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// Append-only writer for line-delimited record files.
///
/// Each record is serialized, written with its newline and flushed before
/// `append` returns, so an interrupted run leaves only whole lines behind.
pub struct JsonlWriter {
    file: File,
    path: PathBuf,
}

impl JsonlWriter {
    /// Create (or truncate) the file, ensuring its parent directory exists.
    pub fn create(path: PathBuf) -> Result<Self, PersistError> {
        if let Some(parent) = path.parent() {
            ensure_output_dir(parent)?;
        }
        let file = File::create(&path)?;
        Ok(Self { file, path })
    }

    pub fn append(&mut self, record: &ItemRecord) -> Result<(), PersistError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read every record from a line-delimited file. Unparseable lines are
/// logged and skipped rather than failing the whole read.
pub fn read_records(path: &Path) -> Result<Vec<ItemRecord>, PersistError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ItemRecord>(&line) {
            Ok(record) => records.push(record),
            Err(err) => {
                pipeline_warn!(
                    "skipping malformed record at {}:{}: {err}",
                    path.display(),
                    line_no + 1
                );
            }
        }
    }
    Ok(records)
}

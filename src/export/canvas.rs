//! Timestamped canvas snapshots on disk.
//!
//! Files are named `<prefix>_<YYYYMMDD_HHMMSS>.<ext>`. Every file is created
//! with create-new semantics; when a name is taken (another export in the
//! same second) a numeric suffix is appended, so exports never overwrite
//! each other.

use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, instrument};

use super::report::{analysis_text, combined_report};
use crate::canvas::CanvasInput;
use crate::chain::SessionContext;
use crate::error::ExportError;

/// Default file name prefix.
pub const DEFAULT_PREFIX: &str = "business_plan";

/// Timestamp format embedded in file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Paths written by a combined export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub json: PathBuf,
    pub report: PathBuf,
}

/// Writes canvas JSON files and combined reports into a directory.
#[derive(Debug, Clone)]
pub struct CanvasExporter {
    output_dir: PathBuf,
    prefix: String,
}

impl CanvasExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Saves the canvas as pretty-printed JSON.
    pub async fn save_json(&self, canvas: &CanvasInput) -> Result<PathBuf, ExportError> {
        let json = canvas.to_json_pretty()?;
        self.write_json(&json).await
    }

    /// Saves user-edited JSON after checking it describes a canvas.
    pub async fn save_json_text(&self, json: &str) -> Result<PathBuf, ExportError> {
        check_json(json)?;
        self.write_json(json).await
    }

    /// Saves the canvas JSON and a combined report sharing one file stem.
    pub async fn save_combined(
        &self,
        canvas: &CanvasInput,
        session: &SessionContext,
    ) -> Result<ExportPaths, ExportError> {
        let json = canvas.to_json_pretty()?;
        self.write_combined(&json, session).await
    }

    /// Like [`CanvasExporter::save_combined`] with user-edited JSON.
    pub async fn save_combined_text(
        &self,
        json: &str,
        session: &SessionContext,
    ) -> Result<ExportPaths, ExportError> {
        check_json(json)?;
        self.write_combined(json, session).await
    }

    /// Reads a canvas back from an exported JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<CanvasInput, ExportError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ExportError::fs(path, e))?;
        Ok(CanvasInput::from_json_str(&content)?)
    }

    #[instrument(skip(self, json), fields(dir = %self.output_dir.display()))]
    async fn write_json(&self, json: &str) -> Result<PathBuf, ExportError> {
        let files = self.create_unique(&["json"]).await.inspect_err(log_failure)?;
        let mut paths = write_files(files, &[json]).await.inspect_err(log_failure)?;
        let path = paths.remove(0);

        info!("Saved business model data to {}", path.display());
        Ok(path)
    }

    #[instrument(skip(self, json, session), fields(dir = %self.output_dir.display()))]
    async fn write_combined(
        &self,
        json: &str,
        session: &SessionContext,
    ) -> Result<ExportPaths, ExportError> {
        let report = combined_report(json, &analysis_text(session));

        let files = self
            .create_unique(&["json", "txt"])
            .await
            .inspect_err(log_failure)?;
        let mut paths = write_files(files, &[json, &report])
            .await
            .inspect_err(log_failure)?;
        let report_path = paths.remove(1);
        let json_path = paths.remove(0);

        info!(
            "Saved JSON to {} and combined output to {}",
            json_path.display(),
            report_path.display()
        );
        Ok(ExportPaths {
            json: json_path,
            report: report_path,
        })
    }

    /// Creates one new file per extension, all sharing a fresh stem.
    async fn create_unique(&self, extensions: &[&str]) -> Result<Vec<(PathBuf, File)>, ExportError> {
        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| ExportError::fs(&self.output_dir, e))?;

        let stamp = Local::now().format(TIMESTAMP_FORMAT).to_string();

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let stem = if attempt == 0 {
                format!("{}_{}", self.prefix, stamp)
            } else {
                format!("{}_{}_{}", self.prefix, stamp, attempt)
            };

            let mut created: Vec<(PathBuf, File)> = Vec::with_capacity(extensions.len());
            let mut collided = false;

            for ext in extensions {
                let path = self.output_dir.join(format!("{}.{}", stem, ext));
                match OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&path)
                    .await
                {
                    Ok(file) => created.push((path, file)),
                    Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                        collided = true;
                        break;
                    }
                    Err(e) => {
                        remove_all(created).await;
                        return Err(ExportError::fs(path, e));
                    }
                }
            }

            if !collided {
                return Ok(created);
            }

            debug!(stem = %stem, "Export name taken, trying next suffix");
            remove_all(created).await;
        }

        Err(ExportError::NameExhausted(format!(
            "{}_{}",
            self.prefix, stamp
        )))
    }
}

fn check_json(json: &str) -> Result<(), ExportError> {
    CanvasInput::from_json_str(json).map_err(|e| {
        error!("Invalid JSON format: {}", e);
        ExportError::InvalidJson(e)
    })?;
    Ok(())
}

fn log_failure(e: &ExportError) {
    error!("Error saving file: {}", e);
}

/// Writes each content into the file at the same position. If any write
/// fails, every file is removed so no partial export is left behind.
async fn write_files(
    files: Vec<(PathBuf, File)>,
    contents: &[&str],
) -> Result<Vec<PathBuf>, ExportError> {
    let mut opened = Vec::with_capacity(files.len());
    let mut failure = None;

    for ((path, mut file), content) in files.into_iter().zip(contents) {
        if failure.is_none() {
            failure = write_all(&path, &mut file, content).await.err();
        }
        opened.push((path, file));
    }

    match failure {
        None => Ok(opened.into_iter().map(|(path, _)| path).collect()),
        Some(e) => {
            remove_all(opened).await;
            Err(e)
        }
    }
}

async fn write_all(path: &Path, file: &mut File, content: &str) -> Result<(), ExportError> {
    file.write_all(content.as_bytes())
        .await
        .map_err(|e| ExportError::fs(path, e))?;
    file.flush().await.map_err(|e| ExportError::fs(path, e))
}

async fn remove_all(created: Vec<(PathBuf, File)>) {
    for (path, file) in created {
        drop(file);
        let _ = fs::remove_file(&path).await;
    }
}

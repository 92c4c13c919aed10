//! Persist image outputs to `temp-<unix-seconds>.png` files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use base64::Engine;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{EdaError, Result};

/// Writes decoded PNG payloads into one directory.
///
/// Names are taken with `create_new`, so two images saved in the same second
/// get `temp-<secs>.png` and `temp-<secs>-1.png` rather than overwriting.
#[derive(Debug, Clone)]
pub struct TempImageWriter {
    dir: PathBuf,
}

impl TempImageWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Decode one base64 PNG and write it, returning the file path.
    pub async fn save(&self, b64_png: &str) -> Result<PathBuf> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(b64_png.trim())
            .map_err(|e| EdaError::InvalidImage(e.to_string()))?;
        let secs = chrono::Utc::now().timestamp();

        let mut suffix = 0u32;
        loop {
            let name = if suffix == 0 {
                format!("temp-{secs}.png")
            } else {
                format!("temp-{secs}-{suffix}.png")
            };
            let path = self.dir.join(name);
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    file.write_all(&bytes).await?;
                    file.flush().await?;
                    debug!(path = %path.display(), bytes = bytes.len(), "image saved");
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

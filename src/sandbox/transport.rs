//! Upload local files into the sandbox.

use std::path::Path;

use tracing::debug;

use super::{resolve_path, Sandbox};
use crate::error::{EdaError, Result};

/// Upload each local file to the sandbox home under the name at the same
/// position in `remote_names`.
///
/// Both slices must have the same length; a mismatch is rejected before
/// anything is written. The first file that cannot be read or written
/// aborts the upload.
pub async fn upload_files<P, N>(
    sandbox: &dyn Sandbox,
    local_paths: &[P],
    remote_names: &[N],
) -> Result<()>
where
    P: AsRef<Path>,
    N: AsRef<str>,
{
    if local_paths.len() != remote_names.len() {
        return Err(EdaError::UploadMismatch {
            paths: local_paths.len(),
            names: remote_names.len(),
        });
    }

    for (local, remote) in local_paths.iter().zip(remote_names) {
        let local = local.as_ref();
        let target = resolve_path(remote.as_ref());
        let bytes = tokio::fs::read(local)
            .await
            .map_err(|e| EdaError::upload(local, EdaError::Io(e)))?;
        debug!(from = %local.display(), to = %target, bytes = bytes.len(), "uploading file");
        sandbox
            .write_file(&target, bytes)
            .await
            .map_err(|e| EdaError::upload(local, e))?;
    }
    Ok(())
}

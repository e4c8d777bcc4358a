//! JSON file helpers shared by the file-backed stores.

use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// Read a JSON document, or `None` if the file does not exist yet.
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    if !fs::try_exists(path).await? {
        info!("{:?} not found, starting empty", path);
        return Ok(None);
    }

    let data = fs::read(path).await?;
    Ok(Some(serde_json::from_slice(&data)?))
}

/// Write a JSON document atomically using temp file + rename.
pub(crate) async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let data = serde_json::to_vec_pretty(value)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, &data).await?;
    fs::rename(&temp_path, path).await?;

    debug!("Wrote {} bytes to {:?}", data.len(), path);
    Ok(())
}

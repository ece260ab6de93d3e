use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::{StoreError, StoreResult};

/// Serialize `value` as pretty JSON and move it into place atomically.
///
/// The write goes to a sibling `.tmp` file which is fsynced and renamed
/// over the target, so readers observe either the old or the new content.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let data = serde_json::to_vec_pretty(value)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent).map_err(|err| StoreError::io(parent, err))?;
        }
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| StoreError::InvalidPath(path.display().to_string()))?;
    let tmp_path = path.with_file_name(format!("{}.tmp", file_name.to_string_lossy()));

    let mut file = File::create(&tmp_path).map_err(|err| StoreError::io(&tmp_path, err))?;
    file.write_all(&data)
        .map_err(|err| StoreError::io(&tmp_path, err))?;
    file.sync_all()
        .map_err(|err| StoreError::io(&tmp_path, err))?;
    drop(file);

    std::fs::rename(&tmp_path, path).map_err(|err| StoreError::io(path, err))?;
    Ok(())
}

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::errors::CoreError;

/// Current on-disk format version.
pub const CURRENT_VERSION: u16 = 1;

/// Field holding the format version in every store file.
const VERSION_FIELD: &str = "version";

/// Field holding the store payload.
const DATA_FIELD: &str = "data";

/// Serialize `data` into a versioned JSON envelope.
///
/// Layout:
/// ```text
/// { "version": 1, "data": <payload> }
/// ```
pub fn write_envelope<T: Serialize>(data: &T) -> Result<Vec<u8>, CoreError> {
    let payload = serde_json::to_value(data)
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize store: {e}")))?;
    let mut envelope = serde_json::Map::new();
    envelope.insert(VERSION_FIELD.to_string(), CURRENT_VERSION.into());
    envelope.insert(DATA_FIELD.to_string(), payload);
    serde_json::to_vec_pretty(&envelope)
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize store: {e}")))
}

/// Parse a versioned JSON envelope, rejecting versions this build does not understand.
pub fn read_envelope<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CoreError> {
    let mut value: serde_json::Value = serde_json::from_slice(bytes)?;

    let version = value
        .get(VERSION_FIELD)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| CoreError::Deserialization("store file has no version field".into()))?;
    let version = u16::try_from(version).map_err(|_| CoreError::UnsupportedVersion(u16::MAX))?;
    if version == 0 || version > CURRENT_VERSION {
        return Err(CoreError::UnsupportedVersion(version));
    }

    let data = value
        .get_mut(DATA_FIELD)
        .map(serde_json::Value::take)
        .ok_or_else(|| CoreError::Deserialization("store file has no data field".into()))?;
    serde_json::from_value(data)
        .map_err(|e| CoreError::Deserialization(format!("Failed to deserialize store: {e}")))
}

/// Load an envelope from disk. A missing file yields `T::default()`.
pub fn load_file<T: DeserializeOwned + Default>(path: &Path) -> Result<T, CoreError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let bytes = std::fs::read(path)?;
    read_envelope(&bytes)
}

/// Write an envelope to disk via a temp file + rename, so a crash never leaves a torn file.
pub fn save_file<T: Serialize>(path: &Path, data: &T) -> Result<(), CoreError> {
    let bytes = write_envelope(data)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

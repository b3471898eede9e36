//! # File I/O Module
//!
//! Reading input documents and saving results:
//! - **Atomic saves**: write to `.tmp`, sync, rename, so a crash never leaves
//!   a half-written record or report behind
//! - **Typed loads**: JSON records and estimates back into their types
//!
//! ## Example
//!
//! ```rust,no_run
//! use takeoff_core::file_io::{load_json, save_json};
//! use takeoff_core::measurements::{MeasurementBuilder, MeasurementRecord};
//! use takeoff_core::units::SqFt;
//! use std::path::Path;
//!
//! let mut builder = MeasurementBuilder::new();
//! builder.total_area(SqFt(2450.0));
//! let record = builder.build()?;
//!
//! save_json(&record, Path::new("record.json"))?;
//! let loaded: MeasurementRecord = load_json(Path::new("record.json"))?;
//! assert_eq!(loaded, record);
//! # Ok::<(), takeoff_core::errors::TakeoffError>(())
//! ```

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{TakeoffError, TakeoffResult};

/// Serialize `value` as pretty JSON and write it atomically.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> TakeoffResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| TakeoffError::SerializationError {
        reason: e.to_string(),
    })?;
    write_atomic(path, json.as_bytes())
}

/// Load a JSON file into `T`.
///
/// # Errors
///
/// * `FileError` - the file could not be opened or read
/// * `SerializationError` - the contents are not valid JSON for `T`
pub fn load_json<T: DeserializeOwned>(path: &Path) -> TakeoffResult<T> {
    let contents = read_text(path)?;
    serde_json::from_str(&contents).map_err(|e| TakeoffError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })
}

/// Read a whole file as bytes (PDF input).
pub fn read_bytes(path: &Path) -> TakeoffResult<Vec<u8>> {
    let mut file =
        File::open(path).map_err(|e| TakeoffError::file_error("open", path.display().to_string(), e.to_string()))?;

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| TakeoffError::file_error("read", path.display().to_string(), e.to_string()))?;

    log::debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

/// Read a whole file as UTF-8 text.
pub fn read_text(path: &Path) -> TakeoffResult<String> {
    fs::read_to_string(path).map_err(|e| TakeoffError::file_error("read", path.display().to_string(), e.to_string()))
}

/// Write bytes through a temp file and rename into place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> TakeoffResult<()> {
    let tmp_path = tmp_path_for(path);

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        TakeoffError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(bytes).map_err(|e| {
        TakeoffError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        TakeoffError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        TakeoffError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    log::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// `report.pdf` -> `report.pdf.tmp`
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurements::{MeasurementBuilder, MeasurementRecord};
    use crate::units::SqFt;
    use std::env::temp_dir;

    fn temp_path(name: &str) -> PathBuf {
        temp_dir().join(format!("takeoff_test_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_tmp_path_generation() {
        assert_eq!(tmp_path_for(Path::new("/out/report.pdf")), Path::new("/out/report.pdf.tmp"));
    }

    #[test]
    fn test_save_and_load_record() {
        let path = temp_path("record.json");
        let mut builder = MeasurementBuilder::new();
        builder.total_area(SqFt(2450.0)).predominant_pitch("6/12");
        let record = builder.build().unwrap();

        save_json(&record, &path).unwrap();
        let loaded: MeasurementRecord = load_json(&path).unwrap();
        assert_eq!(loaded, record);
        assert!(!tmp_path_for(&path).exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file() {
        let result: TakeoffResult<MeasurementRecord> = load_json(&temp_path("does_not_exist.json"));
        assert_eq!(result.unwrap_err().error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_load_invalid_json() {
        let path = temp_path("invalid.json");
        fs::write(&path, "{ not json").unwrap();

        let result: TakeoffResult<MeasurementRecord> = load_json(&path);
        assert_eq!(result.unwrap_err().error_code(), "SERIALIZATION_ERROR");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_bytes_roundtrip() {
        let path = temp_path("bytes.bin");
        write_atomic(&path, b"%PDF-1.7").unwrap();
        assert_eq!(read_bytes(&path).unwrap(), b"%PDF-1.7");
        let _ = fs::remove_file(&path);
    }
}

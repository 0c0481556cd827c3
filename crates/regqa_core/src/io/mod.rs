//! File helpers shared by the build and query phases.
//!
//! Every artifact write goes through a sibling `.tmp` file followed by a rename,
//! so readers observe either the old file or the new one.

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{codes, AppError};

pub fn ensure_dir(path: &Path) -> Result<(), AppError> {
    fs::create_dir_all(path).map_err(|e| {
        AppError::new(codes::IO_FAILED, "Failed to create directory")
            .with_details(format!("path={}; err={}", path.display(), e))
    })
}

pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).map_err(|e| {
        AppError::new(codes::IO_FAILED, "Failed to write file")
            .with_details(format!("path={}; err={}", tmp.display(), e))
    })?;
    fs::rename(&tmp, path).map_err(|e| {
        AppError::new(codes::IO_FAILED, "Failed to finalize file write")
            .with_details(format!("tmp={}; dest={}; err={}", tmp.display(), path.display(), e))
    })
}

pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), AppError> {
    let json = serde_json::to_vec(value).map_err(|e| {
        AppError::new(codes::DATA_ENCODE_FAILED, "Failed to encode JSON")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    write_atomic(path, &json)
}

/// Read a required JSON artifact. A missing file is a configuration error.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    if !path.exists() {
        return Err(missing_artifact(path));
    }
    let bytes = fs::read(path).map_err(|e| {
        AppError::new(codes::IO_FAILED, "Failed to read file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        AppError::new(codes::DATA_DECODE_FAILED, "Failed to decode JSON")
            .with_details(format!("path={}; err={}", path.display(), e))
    })
}

/// Write one JSON document per line, atomically.
pub fn write_jsonl_atomic<T: Serialize>(path: &Path, records: &[T]) -> Result<(), AppError> {
    let mut buf: Vec<u8> = Vec::new();
    for rec in records {
        serde_json::to_writer(&mut buf, rec).map_err(|e| {
            AppError::new(codes::DATA_ENCODE_FAILED, "Failed to encode JSONL record")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        buf.write_all(b"\n").map_err(|e| {
            AppError::new(codes::IO_FAILED, "Failed to buffer JSONL record")
                .with_details(e.to_string())
        })?;
    }
    write_atomic(path, &buf)
}

/// Read a line-delimited JSON file. Blank lines are skipped; decode errors carry the line number.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, AppError> {
    if !path.exists() {
        return Err(missing_artifact(path));
    }
    let file = fs::File::open(path).map_err(|e| {
        AppError::new(codes::IO_FAILED, "Failed to open file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    let mut out = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| {
            AppError::new(codes::IO_FAILED, "Failed to read line")
                .with_details(format!("path={}; line={}; err={}", path.display(), i + 1, e))
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let rec = serde_json::from_str(&line).map_err(|e| {
            AppError::new(codes::DATA_DECODE_FAILED, "Failed to decode JSONL record")
                .with_details(format!("path={}; line={}; err={}", path.display(), i + 1, e))
        })?;
        out.push(rec);
    }
    Ok(out)
}

pub fn missing_artifact(path: &Path) -> AppError {
    AppError::new(codes::CONFIG_MISSING_ARTIFACT, "Required artifact is missing")
        .with_details(format!("path={}", path.display()))
}

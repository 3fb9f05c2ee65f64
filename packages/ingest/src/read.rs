//! Raw record readers.
//!
//! Both formats produce `serde_json::Value` objects so that field
//! extraction has a single code path. CSV cells become JSON strings.

use std::path::Path;

use pet_map_ingest_models::SourceFormat;

use crate::IngestError;

/// Reads every record in `path`.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be read or parsed.
pub fn read_records(path: &Path, format: SourceFormat) -> Result<Vec<serde_json::Value>, IngestError> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match format {
        SourceFormat::Csv => parse_csv(path, &bytes),
        SourceFormat::Json => parse_json(path, &bytes),
    }
}

/// Parses CSV bytes with a header row. Headers and cells are trimmed, and a
/// leading UTF-8 byte order mark is dropped.
///
/// # Errors
///
/// Returns [`IngestError::Csv`] on malformed input and
/// [`IngestError::NoHeader`] if the header row is empty.
pub fn parse_csv(path: &Path, bytes: &[u8]) -> Result<Vec<serde_json::Value>, IngestError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let csv_error = |source| IngestError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(IngestError::NoHeader {
            path: path.to_path_buf(),
        });
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_error)?;

        let mut map = serde_json::Map::new();
        for (i, header) in headers.iter().enumerate() {
            let value = record.get(i).unwrap_or("").trim().to_owned();
            map.insert(header.clone(), serde_json::Value::String(value));
        }
        records.push(serde_json::Value::Object(map));
    }

    log::debug!("Parsed {} CSV records from {}", records.len(), path.display());
    Ok(records)
}

/// Parses a JSON array of objects, or an object whose `documents` field is
/// such an array.
///
/// # Errors
///
/// Returns [`IngestError::Json`] on malformed input and
/// [`IngestError::NotRecordList`] for any other shape.
pub fn parse_json(path: &Path, bytes: &[u8]) -> Result<Vec<serde_json::Value>, IngestError> {
    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(|source| IngestError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let records = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("documents") {
            Some(serde_json::Value::Array(items)) => items,
            _ => {
                return Err(IngestError::NotRecordList {
                    path: path.to_path_buf(),
                });
            }
        },
        _ => {
            return Err(IngestError::NotRecordList {
                path: path.to_path_buf(),
            });
        }
    };

    log::debug!("Parsed {} JSON records from {}", records.len(), path.display());
    Ok(records)
}

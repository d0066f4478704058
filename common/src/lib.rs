use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

pub mod float_ext;
pub mod log_setup;
pub mod parallel;

pub const EPSILON: f64 = 1e-6;

/// Smallest magnitude allowed as a divisor by [`non_null`].
pub const NON_NULL_FLOOR: f64 = 1e-30;

/// Replace a vanishing divisor with a tiny value of the same sign.
#[inline]
pub fn non_null(value: f64) -> f64 {
    if value.abs() < NON_NULL_FLOOR {
        if value.is_sign_negative() {
            -NON_NULL_FLOOR
        } else {
            NON_NULL_FLOOR
        }
    } else {
        value
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FileExtensionError {
    #[error("Failed to get file extension")]
    MissingFileExtension,
    #[error("Unsupported file extension for file: {0}")]
    UnsupportedFileExtension(String),
}

pub type FileFormatResult<T> = Result<T, FileExtensionError>;

#[derive(Debug, thiserror::Error)]
pub enum SerdeFormatError {
    #[error("YAML serialization failed")]
    Yaml(#[from] serde_yml::Error),
    #[error("JSON serialization failed")]
    Json(#[from] serde_json::Error),
}

pub type SerdeFormatResult<T> = Result<T, SerdeFormatError>;

pub fn get_file_extension(filename: &str) -> Option<&str> {
    Path::new(filename)
        .extension()
        .and_then(|os_str| os_str.to_str())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    pub fn from_file_name(file_name: &str) -> FileFormatResult<Self> {
        let extension = get_file_extension(file_name)
            .map(|ext| ext.to_ascii_lowercase())
            .ok_or(FileExtensionError::MissingFileExtension)?;

        match extension.as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(FileExtensionError::UnsupportedFileExtension(
                file_name.to_string(),
            )),
        }
    }
}

pub fn is_debug() -> bool {
    cfg!(debug_assertions)
}

pub fn serialize<T: Serialize>(value: &T, format: FileFormat) -> SerdeFormatResult<String> {
    match format {
        FileFormat::Yaml => Ok(serde_yml::to_string(value)?),
        FileFormat::Json => Ok(serde_json::to_string_pretty(value)?),
    }
}

pub fn deserialize<T: DeserializeOwned>(
    serialized: &str,
    format: FileFormat,
) -> SerdeFormatResult<T> {
    match format {
        FileFormat::Yaml => Ok(serde_yml::from_str(serialized)?),
        FileFormat::Json => Ok(serde_json::from_str(serialized)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_format_from_extension() {
        assert_eq!(
            FileFormat::from_file_name("table.YML").unwrap(),
            FileFormat::Yaml
        );
        assert_eq!(
            FileFormat::from_file_name("table.json").unwrap(),
            FileFormat::Json
        );
        assert!(matches!(
            FileFormat::from_file_name("table"),
            Err(FileExtensionError::MissingFileExtension)
        ));
        assert!(matches!(
            FileFormat::from_file_name("table.ris"),
            Err(FileExtensionError::UnsupportedFileExtension(_))
        ));
    }

    #[test]
    fn non_null_keeps_sign() {
        assert_eq!(non_null(2.0), 2.0);
        assert_eq!(non_null(0.0), NON_NULL_FLOOR);
        assert_eq!(non_null(-0.0), -NON_NULL_FLOOR);
        assert_eq!(non_null(-1e-40), -NON_NULL_FLOOR);
    }

    #[test]
    fn json_roundtrip_preserves_values() {
        let values = vec![1.5f32, -2.0, 0.25];
        let text = serialize(&values, FileFormat::Json).unwrap();
        let back: Vec<f32> = deserialize(&text, FileFormat::Json).unwrap();
        assert_eq!(values, back);
    }
}

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum FileFormatError {
    #[error("Failed to get file extension")]
    MissingFileExtension,
    #[error("Unsupported file extension for file: {0}")]
    UnsupportedFileExtension(String),
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML serialization failed")]
    Yaml(#[from] serde_yml::Error),
    #[error("JSON serialization failed")]
    Json(#[from] serde_json::Error),
}

pub type FileFormatResult<T> = Result<T, FileFormatError>;

pub fn get_file_extension(filename: &str) -> Option<&str> {
    Path::new(filename)
        .extension()
        .and_then(|os_str| os_str.to_str())
}

/// Text formats accepted for configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SerdeFormat {
    Yaml,
    Json,
}

impl SerdeFormat {
    pub fn from_file_name(file_name: &str) -> FileFormatResult<Self> {
        let ext = get_file_extension(file_name).ok_or(FileFormatError::MissingFileExtension)?;

        if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") {
            Ok(Self::Yaml)
        } else if ext.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else {
            Err(FileFormatError::UnsupportedFileExtension(
                file_name.to_string(),
            ))
        }
    }

    pub fn serialize<T: Serialize>(self, value: &T) -> FileFormatResult<String> {
        match self {
            Self::Yaml => Ok(serde_yml::to_string(value)?),
            Self::Json => Ok(serde_json::to_string_pretty(value)?),
        }
    }

    pub fn deserialize<T: DeserializeOwned + 'static>(
        self,
        serialized: &str,
    ) -> FileFormatResult<T> {
        match self {
            Self::Yaml => Ok(serde_yml::from_str(serialized)?),
            Self::Json => Ok(serde_json::from_str(serialized)?),
        }
    }
}

/// Reads and deserializes a file, picking the format from its extension.
pub fn load_file<T: DeserializeOwned + 'static>(path: &Path) -> FileFormatResult<T> {
    let file_name = path.to_string_lossy();
    let format = SerdeFormat::from_file_name(&file_name)?;
    let text = std::fs::read_to_string(path).map_err(|source| FileFormatError::Read {
        path: file_name.to_string(),
        source,
    })?;

    format.deserialize(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        size: u32,
    }

    #[test]
    fn test_format_from_file_name() {
        assert_eq!(
            SerdeFormat::from_file_name("a.yaml").unwrap(),
            SerdeFormat::Yaml
        );
        assert_eq!(
            SerdeFormat::from_file_name("a.YML").unwrap(),
            SerdeFormat::Yaml
        );
        assert_eq!(
            SerdeFormat::from_file_name("a.json").unwrap(),
            SerdeFormat::Json
        );
        assert!(matches!(
            SerdeFormat::from_file_name("a.toml"),
            Err(FileFormatError::UnsupportedFileExtension(_))
        ));
        assert!(matches!(
            SerdeFormat::from_file_name("noext"),
            Err(FileFormatError::MissingFileExtension)
        ));
    }

    #[test]
    fn test_roundtrip_through_both_formats() {
        let value = Sample {
            name: "window".to_string(),
            size: 7,
        };
        for format in [SerdeFormat::Yaml, SerdeFormat::Json] {
            let text = format.serialize(&value).unwrap();
            let back: Sample = format.deserialize(&text).unwrap();
            assert_eq!(back, value, "{format:?}");
        }
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.yaml");
        std::fs::write(&path, "name: abc\nsize: 3\n").unwrap();

        let loaded: Sample = load_file(&path).unwrap();
        assert_eq!(
            loaded,
            Sample {
                name: "abc".to_string(),
                size: 3
            }
        );
    }

    #[test]
    fn test_load_missing_file() {
        let result: FileFormatResult<Sample> = load_file(Path::new("/nonexistent/cfg.json"));
        assert!(matches!(result, Err(FileFormatError::Read { .. })));
    }
}

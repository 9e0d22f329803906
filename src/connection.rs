//! Connection-string parsing and database path resolution.

use crate::error::InitError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Parsed connection string: `key=value` pairs separated by `;`.
///
/// Keys are matched case- and whitespace-insensitively, so `Data Source`,
/// `data source` and `DataSource` are equivalent. Unknown keys are retained
/// but otherwise ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    data_source: String,
    extra: HashMap<String, String>,
}

impl ConnectionOptions {
    pub fn parse(connection_string: &str) -> Result<Self, InitError> {
        let mut data_source: Option<String> = None;
        let mut extra = HashMap::new();

        for pair in connection_string.split(';') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                InitError::ConnectionString(format!("expected key=value, got '{}'", pair))
            })?;
            let key = normalize_key(key);
            let value = value.trim().to_string();
            match key.as_str() {
                "datasource" | "filename" => data_source = Some(value),
                _ => {
                    extra.insert(key, value);
                }
            }
        }

        match data_source {
            Some(ds) if !ds.is_empty() => Ok(ConnectionOptions {
                data_source: ds,
                extra,
            }),
            _ => Err(InitError::ConnectionString(
                "missing Data Source".to_string(),
            )),
        }
    }

    pub fn data_source(&self) -> &str {
        &self.data_source
    }

    /// Look up an extra option by (normalized) key.
    pub fn option(&self, key: &str) -> Option<&str> {
        self.extra.get(&normalize_key(key)).map(|s| s.as_str())
    }
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Resolve the database file path from a connection string.
///
/// Pure function: no filesystem access.
pub fn database_path(connection_string: &str) -> Result<PathBuf, InitError> {
    Ok(PathBuf::from(
        ConnectionOptions::parse(connection_string)?.data_source,
    ))
}

/// Create the parent directory of a database path if missing.
///
/// Idempotent: an already-existing directory is not an error.
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), InitError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| InitError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data_source() {
        let options = ConnectionOptions::parse("Data Source=./data/app.db").expect("parse failed");
        assert_eq!(options.data_source(), "./data/app.db");
    }

    #[test]
    fn test_parse_key_case_and_whitespace_insensitive() {
        for cs in ["data source=a.db", "DataSource=a.db", " DATA SOURCE = a.db ; "] {
            let options = ConnectionOptions::parse(cs).expect("parse failed");
            assert_eq!(options.data_source(), "a.db");
        }
    }

    #[test]
    fn test_parse_retains_extra_options() {
        let options = ConnectionOptions::parse("Data Source=a.db;Foreign Keys=True")
            .expect("parse failed");
        assert_eq!(options.option("foreignkeys"), Some("True"));
        assert_eq!(options.option("missing"), None);
    }

    #[test]
    fn test_parse_missing_data_source() {
        let result = ConnectionOptions::parse("Cache=Shared");
        assert!(matches!(result, Err(InitError::ConnectionString(_))));
    }

    #[test]
    fn test_parse_empty_data_source() {
        let result = ConnectionOptions::parse("Data Source=");
        assert!(matches!(result, Err(InitError::ConnectionString(_))));
    }

    #[test]
    fn test_parse_malformed_pair() {
        let result = ConnectionOptions::parse("Data Source=a.db;garbage");
        assert!(matches!(result, Err(InitError::ConnectionString(_))));
    }

    #[test]
    fn test_database_path() {
        let path = database_path("Data Source=./data/app.db").expect("parse failed");
        assert_eq!(path, PathBuf::from("./data/app.db"));
    }

    #[test]
    fn test_ensure_parent_dir_idempotent() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("app.db");

        ensure_parent_dir(&db_path).expect("first create failed");
        ensure_parent_dir(&db_path).expect("second create failed");
        assert!(db_path.parent().unwrap().exists());
    }

    #[test]
    fn test_ensure_parent_dir_bare_filename() {
        ensure_parent_dir(Path::new("app.db")).expect("bare filename should be a no-op");
    }
}

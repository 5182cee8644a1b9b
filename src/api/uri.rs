use crate::engine::EngineOptions;
use crate::errors::DbError;
use std::path::PathBuf;

/// Snapshot file extension for `file://` stores.
pub const SNAPSHOT_EXTENSION: &str = "ktk";

/// A parsed connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionUri {
    /// `mem://`: private to the connection, gone after disconnect.
    Memory,
    /// `file:///some/dir`: one snapshot file per database inside `dir`.
    File(PathBuf),
}

impl ConnectionUri {
    /// # Errors
    /// Returns `UnsupportedUri` for unknown schemes or a `file://` URI without a path.
    pub fn parse(uri: &str) -> Result<Self, DbError> {
        let trimmed = uri.trim();
        let Some((scheme, rest)) = trimmed.split_once("://") else {
            return Err(DbError::UnsupportedUri(trimmed.to_string()));
        };
        match scheme.to_ascii_lowercase().as_str() {
            "mem" | "memory" => Ok(Self::Memory),
            "file" if !rest.is_empty() => Ok(Self::File(PathBuf::from(rest))),
            _ => Err(DbError::UnsupportedUri(trimmed.to_string())),
        }
    }

    /// Engine options for `database` under this URI.
    #[must_use]
    pub fn engine_options(&self, database: &str) -> EngineOptions {
        match self {
            Self::Memory => EngineOptions::in_memory(),
            Self::File(dir) => {
                EngineOptions::persistent(dir.join(format!("{database}.{SNAPSHOT_EXTENSION}")))
            }
        }
    }
}

impl std::fmt::Display for ConnectionUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "mem://"),
            Self::File(dir) => write!(f, "file://{}", dir.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schemes() {
        assert_eq!(ConnectionUri::parse("mem://").unwrap(), ConnectionUri::Memory);
        assert_eq!(ConnectionUri::parse("MEMORY://x").unwrap(), ConnectionUri::Memory);
        assert_eq!(
            ConnectionUri::parse("file:///tmp/data").unwrap(),
            ConnectionUri::File(PathBuf::from("/tmp/data"))
        );
        assert!(ConnectionUri::parse("mongodb://localhost:27017/").is_err());
        assert!(ConnectionUri::parse("file://").is_err());
        assert!(ConnectionUri::parse("localhost").is_err());
    }

    #[test]
    fn file_uri_maps_database_to_snapshot() {
        let uri = ConnectionUri::parse("file:///srv/k").unwrap();
        assert_eq!(
            uri.engine_options("NoName").snapshot_path,
            Some(PathBuf::from("/srv/k/NoName.ktk"))
        );
    }
}

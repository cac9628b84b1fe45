//! Errors raised while loading `quire.toml`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid TOML")]
    Toml(#[from] toml::de::Error),

    /// TOML error in a file on disk.
    #[error("invalid TOML in `{0}`")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("invalid config: {0}")]
    Validation(String),
}

impl ConfigError {
    /// Attach the file a parse error came from.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Self::Toml(err) => Self::Parse(path.into(), err),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_error_names_file() {
        let err = ConfigError::Io(
            PathBuf::from("site/quire.toml"),
            Error::new(ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "cannot read config `site/quire.toml`");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_in_file_wraps_toml_only() {
        let toml_err = toml::from_str::<toml::Table>("a = ").unwrap_err();
        let err = ConfigError::from(toml_err).in_file("quire.toml");
        assert!(err.to_string().contains("quire.toml"));
        match err {
            ConfigError::Parse(path, _) => assert_eq!(path, PathBuf::from("quire.toml")),
            other => panic!("unexpected error: {other}"),
        }

        let err = ConfigError::Validation("no root".into()).in_file("quire.toml");
        assert_eq!(err.to_string(), "invalid config: no root");
    }
}

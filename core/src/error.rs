//! Error types shared across the core crate.
//!
//! Store read paths never surface these to callers (an unreadable key is
//! treated as absent); write paths, the watcher, bindings and config loading
//! return them.

use std::io;
use std::path::PathBuf;

use thiserror::Error;


/// Failure of a parameter store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The parameter directory could not be created.
    #[error("cannot open parameter directory {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The key is empty, contains a path separator, or names a temp file.
    #[error("invalid parameter key '{0}'")]
    InvalidKey(String),
    /// Filesystem failure while writing or removing a parameter.
    #[error("parameter '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(key: &str, source: io::Error) -> Self {
        StoreError::Io {
            key: key.to_string(),
            source,
        }
    }
}


/// Failure to start or reconfigure the change watcher.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("cannot watch {}: {source}", path.display())]
    Notify {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
    #[error(transparent)]
    Key(#[from] StoreError),
}


/// A user interaction on a control could not be applied.
#[derive(Debug, Error)]
pub enum BindingError {
    /// The write to the store failed; the control was rolled back.
    #[error("could not save {title}: {source}")]
    WriteFailed {
        title: String,
        #[source]
        source: StoreError,
    },
    /// The interaction does not apply to this kind of control.
    #[error("{interaction} is not supported by {kind} control '{key}'")]
    Unsupported {
        key: String,
        kind: &'static str,
        interaction: &'static str,
    },
}


/// A device command was refused or could not be issued.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("disengage to {0}")]
    Engaged(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}


/// Failure to load the application config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_message_names_the_key() {
        let err = StoreError::io("IsMetric", io::Error::new(io::ErrorKind::Other, "disk full"));
        assert_eq!(err.to_string(), "parameter 'IsMetric': disk full");
    }

    #[test]
    fn write_failed_is_one_line() {
        let err = BindingError::WriteFailed {
            title: "Use Metric System".into(),
            source: StoreError::InvalidKey("a/b".into()),
        };
        let msg = err.to_string();
        assert!(!msg.contains('\n'));
        assert!(msg.starts_with("could not save Use Metric System"));
    }
}

//! Error types shared across the report pipeline.

use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Reasons a single inventory category could not be collected.
///
/// These never abort a run: the collector logs them and substitutes an empty
/// result for the affected category.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to start `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed while waiting for `{program}`")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("timed out after {}s", .timeout.as_secs())]
    Timeout { timeout: Duration },

    #[error("exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    #[error("produced no output")]
    EmptyOutput,

    #[error("returned malformed JSON")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("returned {0} instead of a non-empty list")]
    NotAList(&'static str),
}

/// Fatal failures that stop report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("PDF rendering failed")]
    Pdf {
        #[from]
        source: genpdf::error::Error,
    },

    #[error("chart rendering failed")]
    Image {
        #[from]
        source: image::ImageError,
    },

    #[error("no usable font family found; checked {checked}")]
    FontsNotFound { checked: String },

    #[error("font file {} is not a usable TrueType font", .path.display())]
    InvalidFont { path: PathBuf },

    #[error("chart image {} could not be found", .path.display())]
    MissingChart { path: PathBuf },
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = ReportError> = std::result::Result<T, E>;

/// Joins an error with each of its sources, separated by `: `.
pub fn describe_chain(error: &(dyn StdError + 'static)) -> String {
    let mut message = error.to_string();
    let mut current = error.source();
    while let Some(source) = current {
        message.push_str(": ");
        message.push_str(&source.to_string());
        current = source.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_leave_causes_to_the_source_chain() {
        let err = ReportError::io("/tmp/reports", io::Error::new(io::ErrorKind::Other, "disk full"));
        assert_eq!(err.to_string(), "IO error on /tmp/reports");
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("disk full")
        );
    }

    #[test]
    fn chain_names_each_cause_once() {
        let err = CollectError::Spawn {
            program: "linode-cli".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        let described = describe_chain(&err);
        assert_eq!(described, "failed to start `linode-cli`: no such file");
        assert_eq!(described.matches("no such file").count(), 1);
    }
}

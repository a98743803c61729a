//! Error types shared by the browser core, the focus engine and the stores.

use std::io;

/// Contract violations raised by the focus engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FocusError {
    #[error("node {0} does not allow focus")]
    NotFocusable(u64),

    #[error("unknown focus node {0}")]
    Unknown(u64),

    #[error("parent node {0} does not exist")]
    NoParent(u64),
}

#[derive(Debug, thiserror::Error)]
pub enum TenfootError {
    #[error("focus error: {0}")]
    Focus(#[from] FocusError),

    #[error("store error: {0}")]
    Store(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, TenfootError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_error_display() {
        let e = FocusError::NotFocusable(7);
        assert_eq!(format!("{e}"), "node 7 does not allow focus");
        let wrapped: TenfootError = e.into();
        assert_eq!(format!("{wrapped}"), "focus error: node 7 does not allow focus");
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let e: TenfootError = io_err.into();
        let msg = format!("{e}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn json_error_from_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let e: TenfootError = json_err.into();
        assert!(format!("{e}").contains("JSON error"));
    }
}

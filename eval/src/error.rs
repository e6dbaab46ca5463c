// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Error type shared by the evaluation library

use std::path::PathBuf;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, EvalError>;

/// Failures surfaced to callers of the evaluation pipeline.
///
/// Numeric edge cases (zero denominators) never show up here: they are
/// resolved to `0.0` where they occur.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("unknown quality measure '{0}'")]
    UnknownMeasure(String),

    #[error("cannot select {requested} rules from a collection of {available}")]
    SelectionTooLarge { requested: usize, available: usize },

    #[error("{what}: expected length {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("class index {class} is out of range for {num_classes} class values")]
    ClassOutOfRange { class: usize, num_classes: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EvalError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EvalError::Io {
            path: path.into(),
            source,
        }
    }
}

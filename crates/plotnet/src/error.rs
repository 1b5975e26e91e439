//! Error types for PlotNet operations.
//!
//! This module provides the main error type [`PlotnetError`] which wraps
//! the failures that can occur while loading an architecture, composing its
//! layers, and compiling the resulting document.

use std::{io, process::ExitStatus};

use thiserror::Error;

/// The main error type for PlotNet operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the architecture source next to the TOML error,
/// so the error's span can be rendered against it.
#[derive(Debug, Error)]
pub enum PlotnetError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Compose(#[from] plotnet_core::Error),

    #[error("{err}")]
    Parse { err: toml::de::Error, src: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("`{program}` failed with {status}")]
    Tool {
        program: String,
        status: ExitStatus,
        output: String,
    },
}

impl PlotnetError {
    /// Create a new `Parse` error with the associated source text.
    pub fn new_parse_error(err: toml::de::Error, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}

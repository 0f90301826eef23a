//! Error types for code generation

use thiserror::Error;

/// Result type for codegen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during code generation
#[derive(Error, Debug)]
pub enum Error {
    /// The graph failed its consistency check
    #[error("graph error: {0}")]
    Graph(#[from] chanweave_core::Error),

    /// A Go template failed to render
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// gofmt rejected the generated source
    #[error("gofmt failed on {file}: {message}")]
    Format {
        /// Generated file name
        file: String,
        /// gofmt diagnostics
        message: String,
    },

    /// `go build` or `go run` failed
    #[error("go {command} failed: {message}")]
    Build {
        /// go subcommand
        command: String,
        /// Error message
        message: String,
        /// Toolchain stderr output
        stderr: Option<String>,
    },

    /// The Go toolchain could not be started
    #[error("Go toolchain error: {message}. Ensure Go is installed and on PATH.")]
    Toolchain {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//! Chanweave Code Generation
//!
//! This crate lowers pipeline graphs into runnable Go programs.
//!
//! # Pipeline Overview
//!
//! ```text
//! ┌─────────┐     ┌─────────┐     ┌─────────┐     ┌─────────┐
//! │  Graph  │────▶│ Wiring  │────▶│   Go    │────▶│ go build│
//! │ (store) │     │ (plan)  │     │(render) │     │  / run  │
//! └─────────┘     └─────────┘     └─────────┘     └─────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use chanweave_codegen::{Generator, GeneratorOptions, Toolchain};
//!
//! let generator = Generator::new(GeneratorOptions::default());
//! let package = generator.generate_stored(&store, "pipeline.json").await?;
//! Toolchain::default().write_package("gen/pipeline", &package).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod format;
pub mod generator;
pub mod ident;
pub mod toolchain;
pub mod wiring;

pub use error::{Error, Result};
pub use generator::{GeneratedPackage, Generator, GeneratorOptions};
pub use toolchain::Toolchain;

//! Core library for hlsx
//!
//! This crate implements the **Functional Core** of the hlsx harness,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`hlsx_core`** (this crate): Pure text transformations with zero I/O
//! - **`hlsx`**: File access, model calls, compiler invocation and the run loops
//!
//! The model and the C compiler are external capabilities. Everything that
//! can be decided from text alone lives here and is tested with fixture
//! strings, no network and no toolchain required.
//!
//! # Module Organization
//!
//! - [`transform`]: Prompt templates, Merlin report tables, and extraction of
//!   the fenced C block from a model response
//! - [`model`]: Completion request and chat-completions wire types
//! - [`verify`]: Function renaming, test-unit assembly, manifests and result lines
//! - [`config`]: Schema of the `hlsx.toml` settings file
//!
//! # Example Usage
//!
//! ```rust
//! use hlsx_core::transform::parse_response;
//!
//! let output = parse_response("k.c", "Explanation.\n```c\nint x = 1;\n```\n").unwrap();
//! assert_eq!(output.as_str(), "// Explanation.\nint x = 1;");
//! ```

pub mod config;
pub mod model;
pub mod transform;
pub mod verify;

//! # remold_parser
//!
//! Parser abstraction layer for remold.
//!
//! This crate provides:
//! - [`FormatPreservingReader`], the offset-tracking reader every parser
//!   reads its input through to recover prefixes and token text
//! - A [`Parser`] trait for plugging in grammars
//! - [`SettingsParser`], a small block-structured settings format
//!
//! ## Architecture
//!
//! Parsers turn source text into a lossless [`Document`](remold_tree::Document).
//! Token events carry absolute offsets; the reader maps those offsets onto its
//! retained text window, so whitespace and comments end up verbatim in node
//! prefixes.
//!
//! ## Example
//!
//! ```rust
//! use remold_parser::{Parser, SettingsParser};
//! use remold_tree::print_document;
//!
//! let parser = SettingsParser::new();
//! let source = "# demo\nrootProject: demo\n";
//!
//! let doc = parser.parse(source).unwrap();
//! assert_eq!(print_document(&doc), source);
//! ```

mod error;
pub mod reader;
mod settings;
mod traits;

pub use error::{OffsetError, ParseError};
pub use reader::{FormatPreservingReader, OffsetUnit, TokenEvent};
pub use settings::SettingsParser;
pub use traits::Parser;

//! Parser trait definition.

use remold_tree::Document;

use crate::ParseError;

/// Trait for parsing source text into a lossless [`Document`].
///
/// Implementations must keep every character of the input: printing the
/// returned document without edits has to reproduce `source` exactly.
///
/// # Example
///
/// ```rust
/// use remold_parser::{ParseError, Parser};
/// use remold_tree::{Document, Node};
///
/// /// Treats the whole input as one literal.
/// struct WholeText;
///
/// impl Parser for WholeText {
///     fn name(&self) -> &str {
///         "whole-text"
///     }
///
///     fn extensions(&self) -> &[&str] {
///         &["txt"]
///     }
///
///     fn parse(&self, source: &str) -> Result<Document, ParseError> {
///         let children = if source.is_empty() { vec![] } else { vec![Node::literal(source)] };
///         Ok(Document::new(Node::block(None, children, None), ""))
///     }
/// }
///
/// let doc = WholeText.parse("hello").unwrap();
/// assert_eq!(doc.to_string(), "hello");
/// assert!(WholeText.can_parse("TXT"));
/// ```
pub trait Parser {
    /// Returns the name of this parser.
    fn name(&self) -> &str;

    /// Returns the file extensions this parser handles.
    ///
    /// Extensions should not include the leading dot (e.g., `["conf"]`).
    fn extensions(&self) -> &[&str];

    /// Parses the source text into a document.
    fn parse(&self, source: &str) -> Result<Document, ParseError>;

    /// Returns true if this parser can handle the given file extension.
    fn can_parse(&self, extension: &str) -> bool {
        self.extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}

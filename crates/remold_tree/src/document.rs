//! Document: the root value of a lossless tree.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{Marker, Markers, Node, NodeId, NodeKind};

/// A parsed source file.
///
/// The root is a [`Block`](crate::Block) without delimiters. Text after the
/// last token lives in `eof`. Like nodes, documents are immutable values;
/// every `with_*` call returns a new document sharing unchanged subtrees.
#[derive(Clone, Serialize)]
pub struct Document {
    #[serde(skip)]
    id: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Markers::is_empty")]
    markers: Markers,
    root: Node,
    eof: String,
    #[serde(skip)]
    source_len: usize,
}

impl Document {
    /// Creates a document around `root`.
    pub fn new(root: Node, eof: impl Into<String>) -> Self {
        Self {
            id: NodeId::next(),
            source_path: None,
            markers: Markers::new(),
            root,
            eof: eof.into(),
            source_len: 0,
        }
    }

    /// Creates a document with an empty root block and no text.
    pub fn empty() -> Self {
        Self::new(Node::block(None, Vec::new(), None), String::new())
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    #[inline]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Trailing text after the last token.
    #[inline]
    pub fn eof(&self) -> &str {
        &self.eof
    }

    #[inline]
    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    /// Length of the text this document was parsed from.
    #[inline]
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    /// Top-level nodes of the root block.
    pub fn items(&self) -> &[Node] {
        match self.root.kind() {
            NodeKind::Block(block) => &block.children,
            _ => std::slice::from_ref(&self.root),
        }
    }

    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    pub fn with_source_len(mut self, len: usize) -> Self {
        self.source_len = len;
        self
    }

    /// Returns a copy with a different root node.
    pub fn with_root(&self, root: Node) -> Self {
        Self {
            root,
            ..self.clone()
        }
    }

    /// Returns a copy with different trailing text.
    pub fn with_eof(&self, eof: impl Into<String>) -> Self {
        Self {
            eof: eof.into(),
            ..self.clone()
        }
    }

    pub fn with_markers(&self, markers: Markers) -> Self {
        Self {
            markers,
            ..self.clone()
        }
    }

    /// Returns a copy with `marker` attached per its policy.
    pub fn with_marker<M: Marker>(&self, marker: M) -> Self {
        self.with_markers(self.markers.with_marker(marker))
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.source_path == other.source_path
            && self.root == other.root
            && self.eof == other.eof
            && self.markers == other.markers
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("source_path", &self.source_path)
            .field("markers", &self.markers)
            .field("root", &self.root)
            .field("eof", &self.eof)
            .finish()
    }
}

//! Typed marker side-channel.
//!
//! Markers carry cross-cutting facts (file role, resolved configuration,
//! search hits) on a node or a document without widening any node type.
//! They are keyed by Rust type, so two crates can never collide on a name.
//!
//! # Example
//!
//! ```rust
//! use remold_tree::{Marker, MarkerPolicy, Markers};
//!
//! #[derive(Debug, PartialEq)]
//! struct Role(&'static str);
//! impl Marker for Role {}
//!
//! #[derive(Debug, PartialEq)]
//! struct Note(&'static str);
//! impl Marker for Note {
//!     fn policy(&self) -> MarkerPolicy {
//!         MarkerPolicy::Append
//!     }
//! }
//!
//! let markers = Markers::new()
//!     .with_marker(Role("build"))
//!     .with_marker(Role("settings"))
//!     .with_marker(Note("a"))
//!     .with_marker(Note("b"));
//!
//! assert_eq!(markers.find_first::<Role>(), Some(&Role("settings")));
//! assert_eq!(markers.find_all::<Note>().count(), 2);
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// How a marker combines with an existing marker of the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerPolicy {
    /// Configuration-like: at most one per container, the later one wins.
    Replace,
    /// Annotation-like: every attached instance is kept in order.
    Append,
}

/// Object-safe access to the concrete marker value.
///
/// Implemented automatically for every `'static` type with `PartialEq`.
pub trait MarkerAny: Any + Send + Sync {
    /// Returns the marker as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Compares against another marker value of any type.
    fn eq_marker(&self, other: &dyn Any) -> bool;
}

impl<T> MarkerAny for T
where
    T: Any + PartialEq + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_marker(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<T>().is_some_and(|other| self == other)
    }
}

/// A typed record attached to a node or document.
///
/// Only [`policy`](Marker::policy) is meaningful to the tree; payloads are
/// opaque and interpreted by whoever defined the marker type.
pub trait Marker: MarkerAny + fmt::Debug {
    /// Replace-vs-append policy of this marker type.
    fn policy(&self) -> MarkerPolicy {
        MarkerPolicy::Replace
    }

    /// Human readable name, used in tree dumps.
    fn name(&self) -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

/// Ordered, immutable set of markers.
///
/// Cloning is cheap; every `with_*` call returns a new set.
#[derive(Clone)]
pub struct Markers {
    entries: Arc<[Arc<dyn Marker>]>,
}

impl Markers {
    /// Creates an empty marker set.
    pub fn new() -> Self {
        Self {
            entries: Arc::from(Vec::<Arc<dyn Marker>>::new()),
        }
    }

    /// Returns the number of markers.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no markers.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the markers in attachment order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Marker> {
        self.entries.iter().map(|entry| entry.as_ref())
    }

    /// Returns the first marker of type `M`, if any.
    pub fn find_first<M: Marker>(&self) -> Option<&M> {
        self.entries
            .iter()
            .find_map(|entry| entry.as_ref().as_any().downcast_ref::<M>())
    }

    /// Returns every marker of type `M` in attachment order.
    pub fn find_all<M: Marker>(&self) -> impl Iterator<Item = &M> {
        self.entries
            .iter()
            .filter_map(|entry| entry.as_ref().as_any().downcast_ref::<M>())
    }

    /// Returns true if a marker of type `M` is present.
    pub fn contains<M: Marker>(&self) -> bool {
        self.find_first::<M>().is_some()
    }

    /// Returns a new set with `marker` attached according to its policy.
    pub fn with_marker<M: Marker>(&self, marker: M) -> Self {
        self.with_shared(Arc::new(marker))
    }

    /// Like [`with_marker`](Self::with_marker) for an already shared marker.
    pub fn with_shared(&self, marker: Arc<dyn Marker>) -> Self {
        let type_id = Any::type_id(marker.as_ref().as_any());
        let mut entries: Vec<Arc<dyn Marker>> = Vec::with_capacity(self.entries.len() + 1);

        match marker.policy() {
            MarkerPolicy::Append => {
                entries.extend(self.entries.iter().cloned());
                entries.push(marker);
            }
            MarkerPolicy::Replace => {
                let mut pending = Some(marker);
                for entry in self.entries.iter() {
                    if entry_type_id(entry) == type_id {
                        // The replacement takes the slot of the first match.
                        if let Some(replacement) = pending.take() {
                            entries.push(replacement);
                        }
                    } else {
                        entries.push(Arc::clone(entry));
                    }
                }
                if let Some(replacement) = pending {
                    entries.push(replacement);
                }
            }
        }

        Self {
            entries: Arc::from(entries),
        }
    }

    /// Returns a new set without any marker of type `M`.
    pub fn remove<M: Marker>(&self) -> Self {
        let type_id = TypeId::of::<M>();
        let entries: Vec<Arc<dyn Marker>> = self
            .entries
            .iter()
            .filter(|entry| entry_type_id(entry) != type_id)
            .cloned()
            .collect();
        Self {
            entries: Arc::from(entries),
        }
    }
}

fn entry_type_id(entry: &Arc<dyn Marker>) -> TypeId {
    Any::type_id(entry.as_ref().as_any())
}

impl Default for Markers {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Markers {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.entries, &other.entries) {
            return true;
        }
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|(a, b)| a.eq_marker(b.as_ref().as_any()))
    }
}

impl fmt::Debug for Markers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl Serialize for Markers {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter().map(|marker| marker.name()))
    }
}

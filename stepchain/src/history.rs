//! Persistent step history.
//!
//! Every chaining operation records a label for the step it applied. The
//! history is append-only and structurally shared: pushing a label returns a
//! new history that points at its parent, so instances branched from the same
//! pipeline never see each other's later steps and cloning is O(1).

use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
struct Node {
    label: Arc<str>,
    prev: Option<Arc<Node>>,
}

/// Ordered, append-only sequence of step labels.
#[derive(Clone, Default)]
pub struct StepHistory {
    head: Option<Arc<Node>>,
    len: usize,
}

impl StepHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new history with `label` appended.
    ///
    /// `self` is left untouched.
    #[must_use]
    pub fn push(&self, label: impl Into<Arc<str>>) -> Self {
        Self {
            head: Some(Arc::new(Node {
                label: label.into(),
                prev: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Returns the number of recorded steps.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no step has been recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the most recently recorded label.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.head.as_deref().map(|node| &*node.label)
    }

    /// Copies the labels out, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        let mut labels = Vec::with_capacity(self.len);
        let mut cursor = self.head.as_deref();
        while let Some(node) = cursor {
            labels.push(node.label.to_string());
            cursor = node.prev.as_deref();
        }
        labels.reverse();
        labels
    }
}

// Unlink iteratively so that dropping a very long history can't overflow the stack.
impl Drop for StepHistory {
    fn drop(&mut self) {
        let mut cursor = self.head.take();
        while let Some(node) = cursor {
            match Arc::try_unwrap(node) {
                Ok(mut node) => cursor = node.prev.take(),
                Err(_) => break,
            }
        }
    }
}

impl fmt::Debug for StepHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.to_vec()).finish()
    }
}

impl PartialEq for StepHistory {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.to_vec() == other.to_vec()
    }
}

impl Eq for StepHistory {}

impl<S: Into<Arc<str>>> FromIterator<S> for StepHistory {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |history, label| history.push(label))
    }
}

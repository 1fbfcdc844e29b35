//! Append-only branching store for partial flight chains.
//!
//! Nodes live in an arena indexed by their identity, so shared prefixes are stored once
//! and any full path is rebuilt by walking parent indices back to the root.

use std::fmt;

use thiserror::Error;

/// Identity of a node in a [`PathTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathId(pub u64);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("unknown path identity {0}")]
    InvalidPath(u64),
}

struct Entry<T> {
    payload: T,
    parent: Option<usize>,
    level: usize,
}

type OnAdded<T> = Box<dyn FnMut(&mut T, &mut T)>;

pub struct PathTree<T> {
    entries: Vec<Entry<T>>,
    on_added: Option<OnAdded<T>>,
}

impl<T: Default> PathTree<T> {
    /// Identity of the synthetic root; always valid.
    pub const ROOT: PathId = PathId(1);

    pub fn new() -> Self {
        Self {
            entries: vec![Entry {
                payload: T::default(),
                parent: None,
                level: 0,
            }],
            on_added: None,
        }
    }
}

impl<T: Default> Default for PathTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PathTree<T> {
    /// Install a callback run once per append below a non-root parent, with the parent
    /// and the new child payloads.
    pub fn set_on_added<F>(&mut self, callback: F)
    where
        F: FnMut(&mut T, &mut T) + 'static,
    {
        self.on_added = Some(Box::new(callback));
    }

    /// Append `payload` below `parent` and return the new identity.
    pub fn append(&mut self, payload: T, parent: PathId) -> Result<PathId, TreeError> {
        let parent_index = self.index(parent)?;
        let index = self.entries.len();
        let level = self.entries[parent_index].level + 1;
        self.entries.push(Entry {
            payload,
            parent: Some(parent_index),
            level,
        });

        if parent_index != 0 {
            if let Some(callback) = self.on_added.as_mut() {
                let (head, tail) = self.entries.split_at_mut(index);
                callback(&mut head[parent_index].payload, &mut tail[0].payload);
            }
        }
        Ok(PathId(index as u64 + 1))
    }

    pub fn get(&self, id: PathId) -> Result<&T, TreeError> {
        Ok(&self.entries[self.index(id)?].payload)
    }

    /// Number of appended payloads.
    pub fn len(&self) -> usize {
        self.entries.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn index(&self, id: PathId) -> Result<usize, TreeError> {
        id.0.checked_sub(1)
            .and_then(|i| usize::try_from(i).ok())
            .filter(|&i| i < self.entries.len())
            .ok_or(TreeError::InvalidPath(id.0))
    }
}

impl<T: Clone> PathTree<T> {
    /// Payloads from the first appended ancestor down to `id`.
    ///
    /// With `skip_first` the payload directly below the root is left out.
    pub fn full_path(&self, id: PathId, skip_first: bool) -> Result<Vec<T>, TreeError> {
        let mut index = self.index(id)?;
        let offset = usize::from(skip_first);
        let len = self.entries[index].level.saturating_sub(offset);
        let mut path = Vec::with_capacity(len);
        while path.len() < len {
            let entry = &self.entries[index];
            path.push(entry.payload.clone());
            match entry.parent {
                Some(parent) => index = parent,
                None => break,
            }
        }
        path.reverse();
        Ok(path)
    }

    pub fn full_paths(&self, ids: &[PathId], skip_first: bool) -> Result<Vec<Vec<T>>, TreeError> {
        ids.iter().map(|&id| self.full_path(id, skip_first)).collect()
    }
}

impl<T: fmt::Debug> fmt::Debug for PathTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathTree")
            .field("len", &self.len())
            .field("has_callback", &self.on_added.is_some())
            .finish()
    }
}

//! Undo/redo history.
//!
//! Every mutation records a snapshot of the document taken before it runs.
//! Undo swaps the current document with the newest snapshot on the past
//! stack; redo swaps it back. Snapshots are restored verbatim, so ids and
//! order come back exactly as they were.
//!
//! Renderer gestures (drag, resize, rotate) report many snapshots in a row.
//! Wrapping them in `begin_batch`/`end_batch` records one step for the
//! whole gesture.

use crate::config::HistoryLimit;
use lb_core::{Document, DocumentStore, ItemId};
use std::collections::VecDeque;

/// A document snapshot plus the label of the step it reverts.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub document: Document,
    pub description: String,
}

/// Linear undo/redo stacks. A new step after an undo discards the redo
/// stack; there are no branches.
pub struct History {
    past: VecDeque<HistoryEntry>,
    future: Vec<HistoryEntry>,
    limit: HistoryLimit,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Document captured when the outermost batch opened.
    batch_snapshot: Option<Document>,
    /// Whether any step was recorded during the current batch.
    batch_dirty: bool,
}

impl History {
    pub fn new(limit: HistoryLimit) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            limit,
            batch_depth: 0,
            batch_snapshot: None,
            batch_dirty: false,
        }
    }

    /// Record the document as it was before a mutation.
    ///
    /// Inside a batch only the batch's opening snapshot counts; `before` is
    /// dropped and the batch is marked dirty.
    pub fn record(&mut self, before: Document, description: &str) {
        if self.batch_depth > 0 {
            self.batch_dirty = true;
            return;
        }
        self.push_past(HistoryEntry {
            document: before,
            description: description.to_string(),
        });
        self.future.clear();
    }

    /// Open a batch. Nested batches fold into the outermost one.
    pub fn begin_batch(&mut self, current: &Document) {
        if self.batch_depth == 0 {
            self.batch_snapshot = Some(current.clone());
            self.batch_dirty = false;
        }
        self.batch_depth += 1;
    }

    /// Close a batch. When the outermost batch closes and the document
    /// actually changed, one step is recorded.
    pub fn end_batch(&mut self, current: &Document, description: &str) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return;
        }

        let before = self.batch_snapshot.take();
        if self.batch_dirty
            && let Some(before) = before
            && before != *current
        {
            self.push_past(HistoryEntry {
                document: before,
                description: description.to_string(),
            });
            self.future.clear();
        }
        self.batch_dirty = false;
    }

    pub fn in_batch(&self) -> bool {
        self.batch_depth > 0
    }

    /// Restore the newest past snapshot. Returns the label of the undone
    /// step, or `None` when there is nothing to undo.
    pub fn undo(&mut self, store: &mut DocumentStore) -> Option<String> {
        let entry = self.past.pop_back()?;
        let current = store.replace(entry.document);
        self.future.push(HistoryEntry {
            document: current,
            description: entry.description.clone(),
        });
        Some(entry.description)
    }

    /// Restore the newest future snapshot. Returns the label of the redone
    /// step, or `None` when there is nothing to redo.
    pub fn redo(&mut self, store: &mut DocumentStore) -> Option<String> {
        let entry = self.future.pop()?;
        let current = store.replace(entry.document);
        self.push_past(HistoryEntry {
            document: current,
            description: entry.description.clone(),
        });
        Some(entry.description)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    /// Label of the step `undo` would revert.
    pub fn next_undo(&self) -> Option<&str> {
        self.past.back().map(|e| e.description.as_str())
    }

    /// Label of the step `redo` would re-apply.
    pub fn next_redo(&self) -> Option<&str> {
        self.future.last().map(|e| e.description.as_str())
    }

    /// Whether any snapshot undo or redo could restore contains `id`.
    pub fn references(&self, id: ItemId) -> bool {
        self.snapshots().any(|document| document.contains(id))
    }

    /// Rewrite item `id` from `from` to `to` in every snapshot, so a
    /// restored document never points at a released reference.
    pub fn rebind_value(&mut self, id: ItemId, from: &str, to: &str) {
        let past = self.past.iter_mut().map(|e| &mut e.document);
        let future = self.future.iter_mut().map(|e| &mut e.document);
        for document in past.chain(future).chain(self.batch_snapshot.as_mut()) {
            document.rebind_value(id, from, to);
        }
    }

    fn snapshots(&self) -> impl Iterator<Item = &Document> {
        self.past
            .iter()
            .chain(&self.future)
            .map(|e| &e.document)
            .chain(self.batch_snapshot.as_ref())
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
        self.batch_depth = 0;
        self.batch_snapshot = None;
        self.batch_dirty = false;
    }

    fn push_past(&mut self, entry: HistoryEntry) {
        self.past.push_back(entry);
        while !self.limit.allows(self.past.len()) {
            self.past.pop_front();
        }
    }
}

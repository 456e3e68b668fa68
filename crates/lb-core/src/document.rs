//! The document: an ordered list of items.
//!
//! Order is z-order. Index 0 is the bottom layer, the last item is drawn on
//! top. IDs are unique at all times; every constructor and insertion path
//! checks it.

use crate::error::EditError;
use crate::id::{IdAllocator, ItemId};
use crate::model::{Item, ItemPatch};
use crate::request::CreateRequest;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An ordered, id-unique sequence of items.
///
/// Equality is structural: same items, same order, same fields. Comparing
/// two documents is a single linear pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Document {
    items: Vec<Item>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from items, rejecting duplicate ids and non-finite transforms.
    pub fn from_items(items: Vec<Item>) -> Result<Self, EditError> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            item.validate()?;
            if !seen.insert(item.id) {
                return Err(EditError::DuplicateId(item.id));
            }
        }
        Ok(Self { items })
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.iter().map(|item| item.id)
    }

    /// The topmost item, if any.
    pub fn top(&self) -> Option<&Item> {
        self.items.last()
    }

    /// Point item `id` at `to` if it currently holds `from`. Used when an
    /// asset is captured after the item was created. Returns whether the
    /// item was rewritten.
    pub fn rebind_value(&mut self, id: ItemId, from: &str, to: &str) -> bool {
        match self.get_mut(id) {
            Some(item) if item.value == from => {
                item.value = to.to_string();
                true
            }
            _ => false,
        }
    }

    fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// Append on top.
    fn push(&mut self, item: Item) -> Result<(), EditError> {
        if self.contains(item.id) {
            return Err(EditError::DuplicateId(item.id));
        }
        self.items.push(item);
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<Item>::deserialize(deserializer)?;
        Document::from_items(items).map_err(serde::de::Error::custom)
    }
}

// ─── Store ───────────────────────────────────────────────────────────────

/// Owns the document and the id allocator for one editor instance.
///
/// Every method either succeeds or returns an error with the document left
/// exactly as it was.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    document: Document,
    ids: IdAllocator,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Validate `request` and build the item it describes under a fresh id.
    /// The item is not inserted; see [`DocumentStore::insert`].
    pub fn prepare(&mut self, request: &CreateRequest) -> Result<Item, EditError> {
        request.validate()?;
        let document = &self.document;
        let id = self.ids.allocate(|id| document.contains(id))?;
        Ok(Item::new(id, request.kind, request.value.as_str()))
    }

    /// Append a prepared item on top.
    pub fn insert(&mut self, item: Item) -> Result<(), EditError> {
        item.validate()?;
        self.ids.observe(item.id);
        self.document.push(item)
    }

    /// Allocate, build and append in one step. The new item is topmost.
    pub fn add_item(&mut self, request: &CreateRequest) -> Result<Item, EditError> {
        let item = self.prepare(request)?;
        self.insert(item.clone())?;
        log::debug!("add {} {}", item.kind, item.id);
        Ok(item)
    }

    /// Merge `patch` into the item with `id`. Returns whether it changed.
    pub fn update_item(&mut self, id: ItemId, patch: &ItemPatch) -> Result<bool, EditError> {
        patch.validate()?;
        let item = self.document.get_mut(id).ok_or(EditError::NotFound(id))?;
        Ok(patch.apply_to(item))
    }

    /// Remove the item with `id`, returning it.
    pub fn delete_item(&mut self, id: ItemId) -> Result<Item, EditError> {
        let index = self.document.index_of(id).ok_or(EditError::NotFound(id))?;
        Ok(self.document.items.remove(index))
    }

    /// Swap with the neighbour above. `Ok(false)` when already on top.
    pub fn move_up(&mut self, id: ItemId) -> Result<bool, EditError> {
        let index = self.document.index_of(id).ok_or(EditError::NotFound(id))?;
        if index + 1 >= self.document.len() {
            return Ok(false);
        }
        self.document.items.swap(index, index + 1);
        Ok(true)
    }

    /// Swap with the neighbour below. `Ok(false)` when already at the bottom.
    pub fn move_down(&mut self, id: ItemId) -> Result<bool, EditError> {
        let index = self.document.index_of(id).ok_or(EditError::NotFound(id))?;
        if index == 0 {
            return Ok(false);
        }
        self.document.items.swap(index, index - 1);
        Ok(true)
    }

    /// Replace the whole document (undo/redo, renderer snapshots). The
    /// allocator moves past any numeric id in `document`.
    pub fn replace(&mut self, document: Document) -> Document {
        for id in document.ids() {
            self.ids.observe(id);
        }
        std::mem::replace(&mut self.document, document)
    }

    /// See [`Document::rebind_value`].
    pub fn rebind_value(&mut self, id: ItemId, from: &str, to: &str) -> bool {
        self.document.rebind_value(id, from, to)
    }

    /// Empty the document. The allocator keeps counting.
    pub fn clear(&mut self) {
        self.document = Document::new();
    }
}

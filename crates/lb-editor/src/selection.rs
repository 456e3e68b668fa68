//! The current selection: at most one item, by id.

use lb_core::{Document, EditError, Item, ItemId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    current: Option<ItemId>,
}

impl Selection {
    pub fn get(&self) -> Option<ItemId> {
        self.current
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Select `id` (or nothing). An id that is not in `document` is
    /// rejected and the selection is left as it was. Returns whether the
    /// selection changed.
    pub fn select(&mut self, id: Option<ItemId>, document: &Document) -> Result<bool, EditError> {
        if let Some(id) = id
            && !document.contains(id)
        {
            return Err(EditError::NotFound(id));
        }
        let changed = self.current != id;
        self.current = id;
        Ok(changed)
    }

    /// Drop the selection if its item is no longer in `document`.
    /// Returns whether it was dropped.
    pub fn reconcile(&mut self, document: &Document) -> bool {
        match self.current {
            Some(id) if !document.contains(id) => {
                log::debug!("selection {id} no longer in document, cleared");
                self.current = None;
                true
            }
            _ => false,
        }
    }

    /// The selected item as it is in `document` right now. A stale id
    /// resolves to nothing.
    pub fn resolve<'d>(&self, document: &'d Document) -> Option<&'d Item> {
        self.current.and_then(|id| document.get(id))
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

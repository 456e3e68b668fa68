//! Staged commands: what to create, what to change.
//!
//! Both are one-shot values. A creation request may own a transient
//! resource (an image handle whose lifetime belongs to the UI); that
//! resource is released when the request is dropped.

use crate::error::EditError;
use crate::id::ItemId;
use crate::model::{ItemKind, ItemPatch};
use std::fmt;

/// A reference to an asset that is only valid until released, such as an
/// object URL minted for a picked file.
pub struct TransientHandle {
    reference: String,
    release: Option<Box<dyn FnOnce(&str)>>,
}

impl TransientHandle {
    /// A handle with nothing to release.
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            release: None,
        }
    }

    /// A handle that calls `release` exactly once when dropped.
    pub fn with_release(reference: impl Into<String>, release: impl FnOnce(&str) + 'static) -> Self {
        Self {
            reference: reference.into(),
            release: Some(Box::new(release)),
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }
}

impl Drop for TransientHandle {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            log::trace!("release transient handle {}", self.reference);
            release(&self.reference);
        }
    }
}

impl fmt::Debug for TransientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransientHandle")
            .field("reference", &self.reference)
            .field("releases", &self.release.is_some())
            .finish()
    }
}

/// The `value` of a creation request.
#[derive(Debug)]
pub enum CreationValue {
    Literal(String),
    Transient(TransientHandle),
}

impl CreationValue {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(s) => s,
            Self::Transient(h) => h.reference(),
        }
    }
}

/// "Add an item of this kind with this value."
#[derive(Debug)]
pub struct CreateRequest {
    pub kind: ItemKind,
    pub value: CreationValue,
}

impl CreateRequest {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Text,
            value: CreationValue::Literal(content.into()),
        }
    }

    pub fn shape(name: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Shape,
            value: CreationValue::Literal(name.into()),
        }
    }

    pub fn image(handle: TransientHandle) -> Self {
        Self {
            kind: ItemKind::Image,
            value: CreationValue::Transient(handle),
        }
    }

    /// Build from an untyped kind name and a literal value.
    pub fn parse(kind: &str, value: impl Into<String>) -> Result<Self, EditError> {
        Ok(Self {
            kind: kind.parse()?,
            value: CreationValue::Literal(value.into()),
        })
    }

    pub fn validate(&self) -> Result<(), EditError> {
        match (self.kind, &self.value) {
            (ItemKind::Image | ItemKind::Shape, v) if v.as_str().trim().is_empty() => Err(
                EditError::invalid(format!("{} request needs a non-empty value", self.kind)),
            ),
            (ItemKind::Text | ItemKind::Shape, CreationValue::Transient(_)) => Err(
                EditError::invalid(format!("{} request cannot carry a transient handle", self.kind)),
            ),
            _ => Ok(()),
        }
    }
}

/// "Apply this patch to that item."
#[derive(Debug, Clone, PartialEq)]
pub struct PatchRequest {
    pub id: ItemId,
    pub patch: ItemPatch,
}

impl PatchRequest {
    pub fn new(id: ItemId, patch: ItemPatch) -> Self {
        Self { id, patch }
    }
}

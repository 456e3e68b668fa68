pub mod color;
pub mod document;
pub mod error;
pub mod id;
pub mod model;
pub mod request;

pub use color::Color;
pub use document::{Document, DocumentStore};
pub use error::EditError;
pub use id::{IdAllocator, ItemId};
pub use model::*;
pub use request::{CreateRequest, CreationValue, PatchRequest, TransientHandle};

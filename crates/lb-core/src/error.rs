use crate::id::ItemId;

/// Everything that can make an editing operation refuse to run.
///
/// An operation that returns one of these has not changed the document,
/// the selection, or the history.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("item {0} is not in the document")]
    NotFound(ItemId),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("unknown item type `{0}`")]
    UnknownKind(String),
    #[error("item id must not be empty")]
    EmptyId,
    #[error("item id {0} appears more than once")]
    DuplicateId(ItemId),
    #[error("renderer rejected the command: {0}")]
    Renderer(String),
}

impl EditError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }
}

/// Errors returned by the reference store.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// The keyset cursor does not reference a stored row.
    #[error("cursor row not found: {0}")]
    CursorNotFound(String),

    /// A row with the same ID already exists.
    #[error("duplicate row id: {0}")]
    DuplicateId(String),
}

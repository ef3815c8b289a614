use thiserror::Error;

/// Errors that can arise while persisting or restoring progression state.
///
/// Content errors (unknown item or puzzle ids) and calls made before a record exists are
/// not represented here: those are logged and reported as no-ops.
#[derive(Debug, Error)]
pub enum ProgressError {
    /// Wrapper around IO errors (directory creation, slot writes, deletes).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around JSON serialization errors.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Returned when loading or deleting a slot that has no file.
    #[error("save slot {0} not found")]
    SlotNotFound(u32),

    /// Returned when a slot file exists but its payload cannot be decoded.
    #[error("save slot {slot} is corrupt: {source}")]
    CorruptSave {
        slot: u32,
        #[source]
        source: serde_json::Error,
    },

    /// Returned by `save` when no record has been created or loaded yet.
    #[error("no active save record")]
    NoActiveRecord,

    /// Returned when a caller tries to delete the autosave slot.
    #[error("the autosave slot cannot be deleted")]
    AutosaveProtected,

    /// Item content could not be loaded.
    #[error("item catalog error: {0}")]
    Catalog(String),
}

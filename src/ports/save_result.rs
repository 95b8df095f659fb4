//! Outcome of an idempotent write.

/// Result of a uniqueness-guarded insert or upsert.
///
/// `AlreadyExists` is not an error: it means an earlier call already
/// performed this exact write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// This call wrote the row.
    Inserted,
    /// A row with the same key was already present; nothing changed.
    AlreadyExists,
}

impl SaveResult {
    pub fn was_inserted(&self) -> bool {
        matches!(self, SaveResult::Inserted)
    }
}

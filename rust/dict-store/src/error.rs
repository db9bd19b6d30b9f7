use dict_values::CodecError;
use thiserror::Error;

/// Errors surfaced by the dictionary's public API.
///
/// Mirrors the surface taxonomy of IOFailure / Corruption / InvalidArgument
/// / Interrupted. `UnknownValue` has no variant here -- absence is the
/// normal `None` return of the lookup methods, not an error.
#[derive(Error, Debug)]
pub enum DictError {
    /// The backing engine or filesystem returned an error. The transaction
    /// that triggered it is no longer usable.
    #[error("storage engine error: {0}")]
    Io(#[from] redb::StorageError),

    /// Opening or creating the backing database file failed.
    #[error("failed to open database: {0}")]
    DatabaseOpen(#[from] redb::DatabaseError),

    /// Beginning a transaction failed.
    #[error("failed to begin transaction: {0}")]
    Transaction(#[from] redb::TransactionError),

    /// Opening or reading a table failed.
    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    /// Committing a write transaction failed.
    #[error("commit failed: {0}")]
    Commit(#[from] redb::CommitError),

    /// A value or namespace byte string failed to encode or decode.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// `checkConsistency` found a byte string that does not decode, or
    /// whose round-trip through `getID` does not return the ID it was read
    /// under.
    #[error("dictionary corruption detected for id {id}: {detail}")]
    Corruption {
        /// The ID whose entry failed the consistency check.
        id: u64,
        /// Human-readable detail of what failed.
        detail: String,
    },

    /// An operation that requires an active write transaction was called
    /// without one (or vice versa).
    #[error("invalid transaction state: {0}")]
    InvalidArgument(String),

    /// Acquiring a lock was interrupted.
    #[error("interrupted while acquiring a lock")]
    Interrupted,
}

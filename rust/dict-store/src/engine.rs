//! The one module allowed to know that the backing ordered key-value
//! engine is `redb`. Everything above this module talks in terms of
//! `&[u8]` keys/values and plain `Result<_, DictError>`.

use std::fs;
use std::path::Path;

use redb::{Durability, ReadableDatabase, TableDefinition};

use crate::error::DictError;

/// The single table hosting every entry kind -- forward `ID_KEY` entries,
/// reverse direct entries, and `HASH_KEY` overflow bucket entries,
/// discriminated by their key's first byte.
pub(crate) const TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("dict");

/// Owns the `redb::Database` handle and the durability policy derived
/// from `force_sync`. Confines all `redb` types to this module and
/// `store.rs`'s transaction bracketing.
pub(crate) struct Engine {
    pub(crate) db: redb::Database,
    pub(crate) durability: Durability,
}

impl Engine {
    /// Open (creating if absent) the database file under `data_dir/values/`.
    pub(crate) fn open(data_dir: &Path, force_sync: bool) -> Result<Self, DictError> {
        let dir = data_dir.join("values");
        fs::create_dir_all(&dir).map_err(|e| DictError::Io(redb::StorageError::Io(e)))?;
        let db = redb::Database::create(dir.join("dict.redb"))?;
        // Touch the table once so an empty store still has a committed root.
        let txn = db.begin_write()?;
        {
            let _ = txn.open_table(TABLE)?;
        }
        txn.commit()?;
        Ok(Self {
            db,
            durability: if force_sync {
                Durability::Immediate
            } else {
                Durability::None
            },
        })
    }

    /// Recreate the database from scratch, discarding all entries.
    pub(crate) fn recreate(data_dir: &Path, force_sync: bool) -> Result<Self, DictError> {
        let dir = data_dir.join("values");
        let path = dir.join("dict.redb");
        if path.exists() {
            fs::remove_file(&path).map_err(|e| DictError::Io(redb::StorageError::Io(e)))?;
        }
        Self::open(data_dir, force_sync)
    }

    pub(crate) fn begin_write(&self) -> Result<redb::WriteTransaction, DictError> {
        let mut txn = self.db.begin_write()?;
        txn.set_durability(self.durability)
            .map_err(|_| DictError::InvalidArgument("unsupported durability level".into()))?;
        Ok(txn)
    }

    pub(crate) fn begin_read(&self) -> Result<redb::ReadTransaction, DictError> {
        Ok(self.db.begin_read()?)
    }
}

/// A read view of the table, either through a fresh read transaction or
/// through an explicitly bracketed write transaction (so readers inside a
/// `start_transaction()`/`commit()` bracket observe that transaction's own
/// uncommitted writes).
///
/// `ReadableTable`'s `range` method is generic, which makes the trait
/// object-unsafe; this enum gives `index.rs` a single concrete type to
/// depend on instead of a `dyn` trait object.
pub(crate) enum ReadTable<'a> {
    Write(redb::Table<'a, &'static [u8], &'static [u8]>),
    Read(redb::ReadOnlyTable<&'static [u8], &'static [u8]>),
}

/// A materialized `(key, value)` pair copied out of the table.
pub(crate) type KvPair = (Vec<u8>, Vec<u8>);

impl ReadTable<'_> {
    pub(crate) fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, DictError> {
        use redb::ReadableTable;
        let guard = match self {
            ReadTable::Write(t) => t.get(key)?,
            ReadTable::Read(t) => t.get(key)?,
        };
        Ok(guard.map(|g| g.value().to_vec()))
    }

    /// Collect every `(key, value)` pair whose key falls in `lo..=hi`, in
    /// key order. Overflow bucket chains are expected to be short, so
    /// materializing them is simpler than threading two distinct iterator
    /// types back out.
    pub(crate) fn range_inclusive(&self, lo: &[u8], hi: &[u8]) -> Result<Vec<KvPair>, DictError> {
        use redb::ReadableTable;
        let mut out = Vec::new();
        match self {
            ReadTable::Write(t) => {
                for entry in t.range(lo..=hi)? {
                    let (k, v) = entry?;
                    out.push((k.value().to_vec(), v.value().to_vec()));
                }
            }
            ReadTable::Read(t) => {
                for entry in t.range(lo..=hi)? {
                    let (k, v) = entry?;
                    out.push((k.value().to_vec(), v.value().to_vec()));
                }
            }
        }
        Ok(out)
    }
}

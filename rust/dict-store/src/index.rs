//! The dual forward/reverse index and its overflow bucket scheme.
//!
//! Writes always go through an open `redb::Table` from a write
//! transaction (`store_bidirectional`). Reads go through [`ReadTable`],
//! which unifies a fresh read transaction's table and an explicitly
//! bracketed write transaction's table behind one concrete type (see
//! `engine.rs` for why: `ReadableTable::range` is generic, which makes
//! the trait object-unsafe).

use dict_values::ValueId;
use redb::{ReadableTable, Table};

use crate::engine::ReadTable;
use crate::error::DictError;

/// First byte of a forward `ID_KEY ‖ id` entry.
pub(crate) const TAG_ID: u8 = 0x00;
/// First byte of a `HASH_KEY` overflow bucket entry.
pub(crate) const TAG_HASH: u8 = 0x01;

/// Encode `ID_KEY ‖ id`: `0x00 ++ id (u64 BE)`.
pub(crate) fn id_key(id: ValueId) -> Vec<u8> {
    let mut key = Vec::with_capacity(9);
    key.push(TAG_ID);
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// Encode `HASH_KEY ‖ hash ‖ bucket`: `0x01 ++ hash (u64 BE) ++ bucket (u64 BE)`.
fn hash_key(hash: u32, bucket: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(17);
    key.push(TAG_HASH);
    key.extend_from_slice(&u64::from(hash).to_be_bytes());
    key.extend_from_slice(&bucket.to_be_bytes());
    key
}

fn hash_bucket_range(hash: u32) -> (Vec<u8>, Vec<u8>) {
    (hash_key(hash, 0), hash_key(hash, u64::MAX))
}

fn decode_id_key(bytes: &[u8]) -> Result<ValueId, DictError> {
    if bytes.len() != 9 || bytes[0] != TAG_ID {
        return Err(DictError::Corruption {
            id: 0,
            detail: "entry value is not a well-formed ID_KEY".to_string(),
        });
    }
    Ok(u64::from_be_bytes(bytes[1..9].try_into().unwrap()))
}

/// Write both directions of an entry: `payload -> id` and `id -> payload`,
/// routing oversized payloads through the overflow bucket scheme instead
/// of using them directly as a table key.
pub(crate) fn store_bidirectional(
    table: &mut Table<'_, &[u8], &[u8]>,
    id: ValueId,
    payload: &[u8],
    max_key_size: usize,
) -> Result<(), DictError> {
    let fwd = id_key(id);
    if payload.len() < max_key_size {
        table.insert(payload, fwd.as_slice())?;
        table.insert(fwd.as_slice(), payload)?;
        return Ok(());
    }

    let hash = crc32fast::hash(payload);
    let (lo, hi) = hash_bucket_range(hash);
    let bucket = {
        let mut count: u64 = 0;
        for entry in table.range(lo.as_slice()..=hi.as_slice())? {
            entry?;
            count += 1;
        }
        count
    };
    table.insert(hash_key(hash, bucket).as_slice(), fwd.as_slice())?;
    table.insert(fwd.as_slice(), payload)?;
    Ok(())
}

/// Resolve a payload back to the id it was stored under, if any.
pub(crate) fn find_id(
    table: &ReadTable<'_>,
    payload: &[u8],
    max_key_size: usize,
) -> Result<Option<ValueId>, DictError> {
    if payload.len() < max_key_size {
        return match table.get(payload)? {
            Some(bytes) => Ok(Some(decode_id_key(&bytes)?)),
            None => Ok(None),
        };
    }

    let hash = crc32fast::hash(payload);
    let (lo, hi) = hash_bucket_range(hash);
    for (_, value) in table.range_inclusive(&lo, &hi)? {
        let id = decode_id_key(&value)?;
        if let Some(candidate) = table.get(&id_key(id))?
            && candidate == payload
        {
            return Ok(Some(id));
        }
    }
    Ok(None)
}

/// Resolve an id to its raw forward payload, or `None` if no such ID has
/// ever been assigned.
pub(crate) fn get(table: &ReadTable<'_>, id: ValueId) -> Result<Option<Vec<u8>>, DictError> {
    table.get(&id_key(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TABLE;
    use redb::ReadableDatabase;

    fn open_tmp() -> (tempfile::TempDir, redb::Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = redb::Database::create(dir.path().join("t.redb")).unwrap();
        (dir, db)
    }

    #[test]
    fn small_payload_round_trips() {
        let (_dir, db) = open_tmp();
        let txn = db.begin_write().unwrap();
        {
            let mut table = txn.open_table(TABLE).unwrap();
            store_bidirectional(&mut table, 1, b"hello", 511).unwrap();
        }
        txn.commit().unwrap();

        let read = db.begin_read().unwrap();
        let table = ReadTable::Read(read.open_table(TABLE).unwrap());
        assert_eq!(find_id(&table, b"hello", 511).unwrap(), Some(1));
        assert_eq!(get(&table, 1).unwrap().as_deref(), Some(&b"hello"[..]));
        assert_eq!(find_id(&table, b"other", 511).unwrap(), None);
    }

    #[test]
    fn overflow_payloads_land_in_successive_buckets() {
        let (_dir, db) = open_tmp();
        let big_a = vec![b'a'; 600];
        let big_b = vec![b'b'; 600];
        let txn = db.begin_write().unwrap();
        {
            let mut table = txn.open_table(TABLE).unwrap();
            store_bidirectional(&mut table, 1, &big_a, 511).unwrap();
            store_bidirectional(&mut table, 2, &big_b, 511).unwrap();
        }
        txn.commit().unwrap();

        let read = db.begin_read().unwrap();
        let table = ReadTable::Read(read.open_table(TABLE).unwrap());
        assert_eq!(find_id(&table, &big_a, 511).unwrap(), Some(1));
        assert_eq!(find_id(&table, &big_b, 511).unwrap(), Some(2));
        assert_eq!(find_id(&table, b"never stored", 511).unwrap(), None);
    }

    #[test]
    fn same_hash_prefix_bucket_indices_increase() {
        let (_dir, db) = open_tmp();
        let payload = vec![b'x'; 600];
        let hash = crc32fast::hash(&payload);
        let txn = db.begin_write().unwrap();
        {
            let mut table = txn.open_table(TABLE).unwrap();
            // Manually insert a colliding bucket entry at index 0 so the
            // real store_bidirectional call is forced into bucket 1.
            table
                .insert(hash_key(hash, 0).as_slice(), id_key(999).as_slice())
                .unwrap();
            table
                .insert(id_key(999).as_slice(), b"placeholder".as_slice())
                .unwrap();
            store_bidirectional(&mut table, 1, &payload, 511).unwrap();
        }
        txn.commit().unwrap();

        let read = db.begin_read().unwrap();
        let table = read.open_table(TABLE).unwrap();
        let entry = redb::ReadableTable::get(&table, hash_key(hash, 1).as_slice())
            .unwrap()
            .unwrap();
        assert_eq!(decode_id_key(entry.value()).unwrap(), 1);
    }
}

//! The public `Dictionary` API, composing the encoder, index, allocator,
//! cache, and revision/locking layers.

use std::path::PathBuf;

use dict_values::{
    encode_bnode, encode_iri, encode_literal, encode_literal_legacy, encode_namespace,
    data2value, Decoded, Iri, Revision, Value, ValueId, ValueKind,
};
use parking_lot::RwLock;

use crate::cache::ValueCache;
use crate::config::DictionaryConfig;
use crate::engine::{Engine, ReadTable, TABLE};
use crate::error::DictError;
use crate::id::{recover_next_id, IdAllocator};
use crate::index;

/// Everything guarded by the catalog lock: the engine handle, the
/// allocator, the current revision, and the (at most one) active
/// user-bracketed write transaction.
struct Catalog {
    engine: Engine,
    ids: IdAllocator,
    revision: Revision,
    active_txn: std::sync::Mutex<Option<ActiveTxn>>,
}

/// An explicitly bracketed write transaction plus the allocator snapshot
/// taken when it was opened, so `rollback()` can restore the allocator to
/// its pre-transaction state.
struct ActiveTxn {
    txn: redb::WriteTransaction,
    ids_snapshot: ValueId,
}

/// Whether `namespace + "part"` parses as a syntactically absolute URI:
/// an RFC 3986 `scheme ":"` prefix, where `scheme` starts with a letter
/// and otherwise holds only letters, digits, `+`, `-`, or `.`. Appending a
/// throwaway local name is how a bare namespace string (which need not
/// itself contain a `:`, e.g. a relative base) is checked for the
/// absolute-URI shape its IRIs are expected to have once a local name is
/// joined to it.
fn is_syntactically_absolute_uri(namespace: &str) -> bool {
    let candidate = format!("{namespace}part");
    let Some(colon) = candidate.find(':') else {
        return false;
    };
    let scheme = &candidate[..colon];
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// The RDF value dictionary.
///
/// `clear()` takes the catalog's write lock; every other operation
/// (including concurrent ID creation) takes its read lock -- the only
/// destructive operation is `clear()`, so concurrent additions under a
/// shared read lock are safe by construction.
pub struct Dictionary {
    config: DictionaryConfig,
    catalog: RwLock<Catalog>,
    cache: ValueCache,
}

impl Dictionary {
    /// Open (creating if absent) a dictionary rooted at `config.data_dir`.
    pub fn open(config: DictionaryConfig) -> Result<Self, DictError> {
        let engine = Engine::open(&config.data_dir, config.force_sync)?;
        let next_id = {
            let txn = engine.begin_read()?;
            let table = txn.open_table(TABLE)?;
            recover_next_id(&table)?
        };
        let cache = ValueCache::new(&config);
        let catalog = Catalog {
            engine,
            ids: IdAllocator::from_next(next_id),
            revision: Revision::new(),
            active_txn: std::sync::Mutex::new(None),
        };
        Ok(Self {
            config,
            catalog: RwLock::new(catalog),
            cache,
        })
    }

    /// The directory this dictionary was opened against.
    pub fn data_dir(&self) -> &PathBuf {
        &self.config.data_dir
    }

    /// Run `f` against a write-mode table, using the currently bracketed
    /// transaction if one is open via [`Self::start_transaction`],
    /// otherwise opening and committing a short-lived one of its own.
    fn with_write_table<T>(
        &self,
        catalog: &Catalog,
        f: impl FnOnce(&mut redb::Table<'_, &[u8], &[u8]>) -> Result<T, DictError>,
    ) -> Result<T, DictError> {
        let guard = catalog
            .active_txn
            .lock()
            .map_err(|_| DictError::Interrupted)?;
        if let Some(active) = guard.as_ref() {
            let mut table = active.txn.open_table(TABLE)?;
            f(&mut table)
        } else {
            drop(guard);
            let txn = catalog.engine.begin_write()?;
            let result = {
                let mut table = txn.open_table(TABLE)?;
                f(&mut table)?
            };
            txn.commit()?;
            Ok(result)
        }
    }

    /// Run `f` against a read view of the table: the bracketed write
    /// transaction if one is active (so reads observe its own uncommitted
    /// writes), otherwise a fresh read transaction.
    fn with_read_table<T>(
        &self,
        catalog: &Catalog,
        f: impl FnOnce(&ReadTable<'_>) -> Result<T, DictError>,
    ) -> Result<T, DictError> {
        let guard = catalog
            .active_txn
            .lock()
            .map_err(|_| DictError::Interrupted)?;
        if let Some(active) = guard.as_ref() {
            let table = ReadTable::Write(active.txn.open_table(TABLE)?);
            f(&table)
        } else {
            drop(guard);
            let txn = catalog.engine.begin_read()?;
            let table = ReadTable::Read(txn.open_table(TABLE)?);
            f(&table)
        }
    }

    /// Allocate a fresh id and write `payload` under it, restoring the
    /// allocator to its pre-allocation value if the write doesn't commit.
    /// When no explicit transaction is bracketing this call, the only
    /// failure mode is the implicit short transaction `with_write_table`
    /// opens on the caller's behalf -- this gives that path the same
    /// snapshot/restore discipline `start_transaction`/`rollback` already
    /// apply to an explicit bracket, so a failed commit never leaves
    /// `nextId` advanced past an id nothing was ever written for.
    fn allocate_and_write(
        &self,
        catalog: &Catalog,
        payload: &[u8],
    ) -> Result<ValueId, DictError> {
        let snapshot = catalog.ids.snapshot();
        let id = catalog.ids.allocate();
        if let Err(err) = self.with_write_table(catalog, |table| {
            index::store_bidirectional(table, id, payload, self.config.max_key_size)
        }) {
            catalog.ids.restore(snapshot);
            return Err(err);
        }
        Ok(id)
    }

    /// Open an explicit write transaction bracketing subsequent mutations
    /// until [`Self::commit`] or [`Self::rollback`].
    pub fn start_transaction(&self) -> Result<(), DictError> {
        let catalog = self.catalog.read();
        let mut guard = catalog
            .active_txn
            .lock()
            .map_err(|_| DictError::Interrupted)?;
        if guard.is_some() {
            return Err(DictError::InvalidArgument(
                "a transaction is already active".into(),
            ));
        }
        *guard = Some(ActiveTxn {
            txn: catalog.engine.begin_write()?,
            ids_snapshot: catalog.ids.snapshot(),
        });
        Ok(())
    }

    /// Commit the active explicit transaction.
    pub fn commit(&self) -> Result<(), DictError> {
        let catalog = self.catalog.read();
        let active = catalog
            .active_txn
            .lock()
            .map_err(|_| DictError::Interrupted)?
            .take()
            .ok_or_else(|| DictError::InvalidArgument("no active transaction".into()))?;
        active.txn.commit()?;
        Ok(())
    }

    /// Abort the active explicit transaction, restoring the allocator's
    /// pre-transaction snapshot.
    pub fn rollback(&self) -> Result<(), DictError> {
        let catalog = self.catalog.read();
        let active = catalog
            .active_txn
            .lock()
            .map_err(|_| DictError::Interrupted)?
            .take()
            .ok_or_else(|| DictError::InvalidArgument("no active transaction".into()))?;
        active.txn.abort().map_err(DictError::Io)?;
        catalog.ids.restore(active.ids_snapshot);
        Ok(())
    }

    /// Resolve a value to its assigned ID, if any: consults the in-value
    /// stamp, then the `valueToID` cache, then the index under the
    /// canonical encoding, then (for plain/language-tagged string
    /// literals) the legacy encoding.
    pub fn get_id(&self, value: &Value) -> Result<Option<ValueId>, DictError> {
        let catalog = self.catalog.read();
        self.get_id_locked(&catalog, value)
    }

    /// Resolve a value to its ID, assigning a fresh one on first use:
    /// `get_id`; on miss, allocate a fresh ID, encode in create mode
    /// (recursively storing datatypes and namespaces), write both
    /// directions, cache, and stamp.
    pub fn store_value(&self, value: &Value) -> Result<ValueId, DictError> {
        let catalog = self.catalog.read();
        self.store_value_locked(&catalog, value)
    }

    /// Resolve an ID back to its value, if it has ever been assigned.
    pub fn get_value(&self, id: ValueId) -> Result<Option<Value>, DictError> {
        let catalog = self.catalog.read();
        self.get_value_locked(&catalog, id)
    }

    /// Resolve an ID back to the namespace string it was assigned to, if
    /// it names a namespace rather than a value.
    pub fn get_namespace(&self, id: ValueId) -> Result<Option<String>, DictError> {
        let catalog = self.catalog.read();
        self.get_namespace_locked(&catalog, id)
    }

    /// Resolve a namespace string to its ID, optionally assigning one.
    pub fn get_namespace_id(
        &self,
        namespace: &str,
        create: bool,
    ) -> Result<Option<ValueId>, DictError> {
        let catalog = self.catalog.read();
        self.get_namespace_id_locked(&catalog, namespace, create)
    }

    /// Discard every stored value and namespace: under the catalog's write
    /// lock, close, delete the backing files, re-open, and issue a new
    /// Revision -- invalidating every previously stamped ID.
    pub fn clear(&self) -> Result<(), DictError> {
        self.cache.clear();
        let mut catalog = self.catalog.write();
        if catalog.active_txn.get_mut().unwrap().is_some() {
            return Err(DictError::InvalidArgument(
                "cannot clear with an active transaction".into(),
            ));
        }
        catalog.engine = Engine::recreate(&self.config.data_dir, self.config.force_sync)?;
        catalog.ids = IdAllocator::from_next(1);
        catalog.revision = Revision::new();
        Ok(())
    }

    /// Walk every id in `[1, nextId)` and verify its entry is sound: a
    /// namespace entry must be a syntactically absolute URI and must
    /// round-trip through `get_namespace_id`; any other entry must
    /// round-trip, once materialized back into a `Value`, through
    /// `get_id`. A healthy store has a forward entry for every id in that
    /// range, so a missing one is itself the corruption being looked for.
    /// Returns the id of the first entry that fails any of these checks.
    pub fn check_consistency(&self) -> Result<Option<ValueId>, DictError> {
        let catalog = self.catalog.read();
        let next = catalog.ids.peek_next();
        for id in 1..next {
            let Some(bytes) = self.with_read_table(&catalog, |table| index::get(table, id))?
            else {
                return Ok(Some(id));
            };
            let decoded = match data2value(&bytes) {
                Ok(d) => d,
                Err(_) => return Ok(Some(id)),
            };
            let round_trip = match decoded {
                Decoded::Namespace(ref ns) => {
                    if !is_syntactically_absolute_uri(ns) {
                        return Ok(Some(id));
                    }
                    self.get_namespace_id_locked(&catalog, ns, false)?
                }
                other => match self.materialize(&catalog, id, other)? {
                    Some(value) => self.get_id_locked(&catalog, &value)?,
                    None => return Ok(Some(id)),
                },
            };
            if round_trip != Some(id) {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    /// Stream every `(id, raw bytes)` entry in ID order, for the
    /// export/reimport corruption-recovery path `check_consistency`
    /// documents but does not itself implement.
    pub fn export_entries(&self) -> Result<Vec<(ValueId, Vec<u8>)>, DictError> {
        let catalog = self.catalog.read();
        let next = catalog.ids.peek_next();
        let mut out = Vec::new();
        for id in 1..next {
            if let Some(bytes) = self.with_read_table(&catalog, |table| index::get(table, id))? {
                out.push((id, bytes));
            }
        }
        Ok(out)
    }

    /// Reimport entries previously produced by [`Self::export_entries`]
    /// into a freshly cleared dictionary, preserving their original IDs.
    /// Callers are expected to `clear()` first; this does not itself
    /// clear.
    pub fn import_entries(&self, entries: &[(ValueId, Vec<u8>)]) -> Result<(), DictError> {
        let catalog = self.catalog.read();
        let mut max_id = 0;
        for (id, bytes) in entries {
            self.with_write_table(&catalog, |table| {
                index::store_bidirectional(table, *id, bytes, self.config.max_key_size)
            })?;
            max_id = max_id.max(*id);
        }
        catalog.ids.restore(max_id + 1);
        Ok(())
    }

    fn get_value_locked(&self, catalog: &Catalog, id: ValueId) -> Result<Option<Value>, DictError> {
        if let Some(v) = self.cache.get_value(id) {
            return Ok(Some(v));
        }
        let txn_active = self.has_active_txn(catalog);
        let Some(bytes) = self.with_read_table(catalog, |table| index::get(table, id))? else {
            return Ok(None);
        };
        let decoded = data2value(&bytes)?;
        let value = self.materialize(catalog, id, decoded)?;
        if let Some(value) = &value
            && !txn_active
        {
            self.cache.put_value(id, value.clone());
            value.stamp(id, catalog.revision.clone());
        }
        Ok(value)
    }

    fn get_namespace_locked(
        &self,
        catalog: &Catalog,
        id: ValueId,
    ) -> Result<Option<String>, DictError> {
        if let Some(ns) = self.cache.get_namespace(id) {
            return Ok(Some(ns));
        }
        let txn_active = self.has_active_txn(catalog);
        let Some(bytes) = self.with_read_table(catalog, |table| index::get(table, id))? else {
            return Ok(None);
        };
        let ns = match data2value(&bytes)? {
            Decoded::Namespace(ns) => ns,
            other => {
                return Err(DictError::Corruption {
                    id,
                    detail: format!("entry is not a namespace: {other:?}"),
                })
            }
        };
        if !txn_active {
            self.cache.put_namespace(id, ns.clone());
        }
        Ok(Some(ns))
    }

    /// Resolve a [`Decoded`] entry into a [`Value`], recursively resolving
    /// its namespace or datatype id against the same already-held catalog
    /// reference (never re-enters the lock: `parking_lot::RwLock` read
    /// guards are not guaranteed reentrant against a waiting writer).
    fn materialize(
        &self,
        catalog: &Catalog,
        id: ValueId,
        decoded: Decoded,
    ) -> Result<Option<Value>, DictError> {
        Ok(match decoded {
            Decoded::Namespace(_) => None,
            Decoded::Iri {
                namespace_id,
                local_name,
            } => {
                let Some(namespace) = self.get_namespace_locked(catalog, u64::from(namespace_id))?
                else {
                    return Err(DictError::Corruption {
                        id,
                        detail: format!("IRI references unknown namespace id {namespace_id}"),
                    });
                };
                Some(Value::iri(namespace, local_name))
            }
            Decoded::BlankNode(bnode_id) => Some(Value::blank_node(bnode_id)),
            Decoded::Literal {
                datatype_id,
                lang,
                label,
            } => {
                if let Some(lang) = lang {
                    Some(Value::literal_with_lang(label, lang))
                } else if datatype_id == 0 {
                    Some(Value::literal(label))
                } else {
                    let Some(datatype_value) =
                        self.get_value_locked(catalog, u64::from(datatype_id))?
                    else {
                        return Err(DictError::Corruption {
                            id,
                            detail: format!(
                                "literal references unknown datatype id {datatype_id}"
                            ),
                        });
                    };
                    let ValueKind::Iri(iri) = datatype_value.into_kind() else {
                        return Err(DictError::Corruption {
                            id,
                            detail: "literal datatype id does not resolve to an IRI".to_string(),
                        });
                    };
                    Some(Value::typed_literal(label, iri))
                }
            }
        })
    }

    /// Encode `kind` for a lookup (non-creating): an IRI or literal whose
    /// namespace/datatype has never been stored resolves to `None`,
    /// signalling "this value cannot exist in the store".
    fn encode_lookup(
        &self,
        catalog: &Catalog,
        kind: &ValueKind,
    ) -> Result<Option<Vec<u8>>, DictError> {
        match kind {
            ValueKind::Iri(Iri {
                namespace,
                local_name,
            }) => {
                let Some(ns_id) = self.get_namespace_id_locked(catalog, namespace, false)? else {
                    return Ok(None);
                };
                Ok(Some(encode_iri(ns_id, local_name)?))
            }
            ValueKind::BlankNode(id) => Ok(Some(encode_bnode(id))),
            ValueKind::Literal {
                label,
                lang,
                datatype,
            } => {
                let dt_id = match datatype {
                    None => 0,
                    Some(iri) => {
                        let dt_value = Value::iri(iri.namespace.as_str(), iri.local_name.as_str());
                        match self.get_id_locked(catalog, &dt_value)? {
                            Some(id) => id,
                            None => return Ok(None),
                        }
                    }
                };
                Ok(Some(encode_literal(dt_id, lang.as_deref(), label)?))
            }
        }
    }

    /// Encode `kind` for a store (creating): recursively stores any
    /// namespace/datatype IRI that isn't already present.
    fn encode_create(&self, catalog: &Catalog, kind: &ValueKind) -> Result<Vec<u8>, DictError> {
        match kind {
            ValueKind::Iri(Iri {
                namespace,
                local_name,
            }) => {
                let ns_id = self
                    .get_namespace_id_locked(catalog, namespace, true)?
                    .expect("create=true always returns an id");
                Ok(encode_iri(ns_id, local_name)?)
            }
            ValueKind::BlankNode(id) => Ok(encode_bnode(id)),
            ValueKind::Literal {
                label,
                lang,
                datatype,
            } => {
                let dt_id = match datatype {
                    None => 0,
                    Some(iri) => {
                        let dt_value = Value::iri(iri.namespace.as_str(), iri.local_name.as_str());
                        self.store_value_locked(catalog, &dt_value)?
                    }
                };
                Ok(encode_literal(dt_id, lang.as_deref(), label)?)
            }
        }
    }

    fn legacy_lookup(
        &self,
        catalog: &Catalog,
        kind: &ValueKind,
    ) -> Result<Option<ValueId>, DictError> {
        let ValueKind::Literal {
            label,
            lang,
            datatype: None,
        } = kind
        else {
            return Ok(None);
        };
        let legacy = encode_literal_legacy(lang.as_deref(), label)?;
        self.with_read_table(catalog, |table| {
            index::find_id(table, &legacy, self.config.max_key_size)
        })
    }

    /// Whether an explicit transaction is currently bracketing writes.
    /// While one is open, a "found" result from `with_read_table` may be
    /// observing that very transaction's own uncommitted writes, so it must
    /// not be promoted into the shared caches or a value's stamp -- a
    /// subsequent `rollback()` would otherwise leave stale, never-committed
    /// identity cached behind.
    fn has_active_txn(&self, catalog: &Catalog) -> bool {
        catalog
            .active_txn
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    fn get_namespace_id_locked(
        &self,
        catalog: &Catalog,
        namespace: &str,
        create: bool,
    ) -> Result<Option<ValueId>, DictError> {
        if let Some(id) = self.cache.get_namespace_id(namespace) {
            return Ok(Some(id));
        }
        let txn_active = self.has_active_txn(catalog);
        let payload = encode_namespace(namespace);
        let found = self.with_read_table(catalog, |table| {
            index::find_id(table, &payload, self.config.max_key_size)
        })?;
        if let Some(id) = found {
            if !txn_active {
                self.cache.put_namespace_id(namespace.to_string(), id);
                self.cache.put_namespace(id, namespace.to_string());
            }
            return Ok(Some(id));
        }
        if !create {
            return Ok(None);
        }
        let id = self.allocate_and_write(catalog, &payload)?;
        if !txn_active {
            self.cache.put_namespace_id(namespace.to_string(), id);
            self.cache.put_namespace(id, namespace.to_string());
        }
        Ok(Some(id))
    }

    fn get_id_locked(&self, catalog: &Catalog, value: &Value) -> Result<Option<ValueId>, DictError> {
        if let Some(id) = value.cached_id(&catalog.revision) {
            return Ok(Some(id));
        }
        if let Some(id) = self.cache.get_id(value) {
            value.stamp(id, catalog.revision.clone());
            return Ok(Some(id));
        }

        let txn_active = self.has_active_txn(catalog);
        let found = match self.encode_lookup(catalog, value.kind())? {
            Some(payload) => {
                let direct = self.with_read_table(catalog, |table| {
                    index::find_id(table, &payload, self.config.max_key_size)
                })?;
                match direct {
                    Some(id) => Some(id),
                    None => self.legacy_lookup(catalog, value.kind())?,
                }
            }
            None => None,
        };

        if let Some(id) = found
            && !txn_active
        {
            self.cache.put_id(value.clone(), id);
            value.stamp(id, catalog.revision.clone());
        }
        Ok(found)
    }

    fn store_value_locked(&self, catalog: &Catalog, value: &Value) -> Result<ValueId, DictError> {
        if let Some(id) = self.get_id_locked(catalog, value)? {
            return Ok(id);
        }
        let txn_active = self.has_active_txn(catalog);
        let payload = self.encode_create(catalog, value.kind())?;
        let id = self.allocate_and_write(catalog, &payload)?;
        if !txn_active {
            self.cache.put_value(id, value.clone());
            self.cache.put_id(value.clone(), id);
            value.stamp(id, catalog.revision.clone());
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::id_key;

    fn open_tmp() -> (tempfile::TempDir, Dictionary) {
        let dir = tempfile::tempdir().unwrap();
        let dict = Dictionary::open(DictionaryConfig::new(dir.path())).unwrap();
        (dir, dict)
    }

    #[test]
    fn absolute_uri_check_accepts_and_rejects() {
        assert!(is_syntactically_absolute_uri("http://example.org/"));
        assert!(is_syntactically_absolute_uri("urn:isbn:"));
        assert!(!is_syntactically_absolute_uri("not-a-uri"));
        assert!(!is_syntactically_absolute_uri(""));
        assert!(!is_syntactically_absolute_uri("3ttp://bad-scheme/"));
    }

    #[test]
    fn check_consistency_reports_an_id_with_no_forward_entry() {
        let (_dir, dict) = open_tmp();
        let id = dict.store_value(&Value::literal("x")).unwrap();
        let catalog = dict.catalog.read();
        dict.with_write_table(&catalog, |table| {
            table.remove(id_key(id).as_slice())?;
            Ok(())
        })
        .unwrap();
        drop(catalog);
        assert_eq!(dict.check_consistency().unwrap(), Some(id));
    }

    #[test]
    fn check_consistency_rejects_a_namespace_entry_that_is_not_an_absolute_uri() {
        let (_dir, dict) = open_tmp();
        dict.store_value(&Value::iri("http://example.org/", "a")).unwrap();
        let ns_id = dict
            .get_namespace_id("http://example.org/", false)
            .unwrap()
            .unwrap();
        let catalog = dict.catalog.read();
        dict.with_write_table(&catalog, |table| {
            table.insert(id_key(ns_id).as_slice(), b"not-a-uri".as_slice())?;
            Ok(())
        })
        .unwrap();
        drop(catalog);
        assert_eq!(dict.check_consistency().unwrap(), Some(ns_id));
    }
}

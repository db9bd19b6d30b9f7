use std::path::PathBuf;

/// Default capacity of the `idToValue` cache.
pub const DEFAULT_ID_TO_VALUE_CAPACITY: usize = 512;
/// Default capacity of the `valueToID` cache.
pub const DEFAULT_VALUE_TO_ID_CAPACITY: usize = 128;
/// Default capacity of the `namespaceToID` cache.
pub const DEFAULT_NAMESPACE_TO_ID_CAPACITY: usize = 32;
/// Default capacity of the `idToNamespace` cache.
pub const DEFAULT_ID_TO_NAMESPACE_CAPACITY: usize = 64;

/// Entries whose encoded byte length reaches this size are routed through
/// the overflow bucket scheme instead of being used directly as a table
/// key.
pub const DEFAULT_MAX_KEY_SIZE: usize = 511;

/// Configuration for opening a [`crate::Dictionary`].
///
/// Passed directly to `Dictionary::open` as plain constructor arguments --
/// this crate has no environment-variable or file-based configuration
/// layer.
#[derive(Debug, Clone)]
pub struct DictionaryConfig {
    /// Directory holding the `values/` subdirectory the engine writes to.
    pub data_dir: PathBuf,
    /// Capacity of the `idToValue` cache.
    pub id_to_value_capacity: usize,
    /// Capacity of the `valueToID` cache.
    pub value_to_id_capacity: usize,
    /// Capacity of the `namespaceToID` cache.
    pub namespace_to_id_capacity: usize,
    /// Capacity of the `idToNamespace` cache.
    pub id_to_namespace_capacity: usize,
    /// Byte length at or above which an entry is stored via the overflow
    /// bucket scheme rather than as a direct table key.
    pub max_key_size: usize,
    /// Request the backing engine to fsync on every commit. Mapped to
    /// `redb::Durability::Immediate` when `true`, `Durability::None` when
    /// `false`.
    pub force_sync: bool,
}

impl DictionaryConfig {
    /// Build a config rooted at `data_dir` with every other field at its
    /// default.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            id_to_value_capacity: DEFAULT_ID_TO_VALUE_CAPACITY,
            value_to_id_capacity: DEFAULT_VALUE_TO_ID_CAPACITY,
            namespace_to_id_capacity: DEFAULT_NAMESPACE_TO_ID_CAPACITY,
            id_to_namespace_capacity: DEFAULT_ID_TO_NAMESPACE_CAPACITY,
            max_key_size: DEFAULT_MAX_KEY_SIZE,
            force_sync: true,
        }
    }
}

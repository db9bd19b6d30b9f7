//! Persistent RDF value dictionary: an ordered-engine adapter, monotonic
//! ID allocation, bounded caching, revision-stamped identity, and the
//! public `Dictionary` API over the codecs in `dict-values`.

mod cache;
mod config;
mod engine;
mod error;
mod id;
mod index;
mod store;

pub use config::{
    DictionaryConfig, DEFAULT_ID_TO_NAMESPACE_CAPACITY, DEFAULT_ID_TO_VALUE_CAPACITY,
    DEFAULT_MAX_KEY_SIZE, DEFAULT_NAMESPACE_TO_ID_CAPACITY, DEFAULT_VALUE_TO_ID_CAPACITY,
};
pub use error::DictError;
pub use store::Dictionary;

pub use dict_values::{Iri, Revision, Value, ValueId, ValueKind, UNKNOWN_ID};

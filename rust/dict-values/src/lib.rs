//! RDF value data model and deterministic byte codec.
//!
//! This crate has no persistence knowledge: it defines what an RDF value
//! or namespace *is*, and how it is serialized to and from bytes. Storage,
//! ID allocation, caching, and locking live in `dict-store`, one layer up.

mod codec;
mod error;
mod value;

pub use codec::{
    data2value, data2value_legacy_literal, encode_bnode, encode_iri, encode_literal,
    encode_literal_legacy, encode_namespace, is_value_tag, Decoded, TAG_BNODE, TAG_IRI,
    TAG_LITERAL,
};
pub use error::CodecError;
pub use value::{Iri, Revision, Value, ValueId, ValueKind, UNKNOWN_ID};

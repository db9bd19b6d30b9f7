use thiserror::Error;

/// Errors raised while encoding or decoding RDF values and namespaces.
///
/// `CodecError` never represents "value not found" — an absent value is the
/// normal `UNKNOWN_ID` sentinel, and is surfaced as `None`, not an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A byte string was neither a recognized value encoding nor a
    /// namespace encoding (see `data2value`'s first-byte discriminant).
    #[error("unrecognized value discriminant byte {0:#04x}")]
    UnrecognizedDiscriminant(u8),

    /// The byte string was truncated partway through a field.
    #[error("truncated {field} while decoding {kind}")]
    Truncated {
        /// The value kind being decoded (`"iri"`, `"bnode"`, `"literal"`).
        kind: &'static str,
        /// The field that ran out of bytes.
        field: &'static str,
    },

    /// A label, local name, or language tag was not valid UTF-8.
    #[error("invalid UTF-8 in {field} of {kind}")]
    InvalidUtf8 {
        /// The value kind being decoded.
        kind: &'static str,
        /// The field that failed UTF-8 validation.
        field: &'static str,
    },

    /// A namespace or datatype ID referenced by an encoded value exceeded
    /// the 4-byte wire field that carries it.
    #[error("{what} id {id} exceeds the 32-bit wire field")]
    IdOverflow {
        /// What kind of ID overflowed (`"namespace"` or `"datatype"`).
        what: &'static str,
        /// The ID that would have been truncated.
        id: u64,
    },

    /// A literal's language tag was longer than the single byte length
    /// prefix can represent.
    #[error("language tag of {len} bytes exceeds the 255-byte limit")]
    LangTooLong {
        /// The actual length of the offending language tag, in bytes.
        len: usize,
    },
}

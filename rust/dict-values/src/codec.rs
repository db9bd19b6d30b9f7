//! Deterministic byte encoding for RDF values and namespaces.
//!
//! Every encoded value begins with a one-byte discriminant tag. Namespace
//! strings are encoded with no tag at all -- `data2value` recognizes them
//! by the *absence* of a recognized value tag in the first byte.

use crate::error::CodecError;

/// Discriminant byte for an IRI encoding.
pub const TAG_IRI: u8 = 0x01;
/// Discriminant byte for a blank node encoding.
pub const TAG_BNODE: u8 = 0x02;
/// Discriminant byte for a literal encoding.
pub const TAG_LITERAL: u8 = 0x03;

/// True for the reserved first bytes that mark a value (as opposed to a
/// bare namespace string) encoding.
pub fn is_value_tag(b: u8) -> bool {
    matches!(b, TAG_IRI | TAG_BNODE | TAG_LITERAL)
}

fn u32_id(what: &'static str, id: u64) -> Result<u32, CodecError> {
    u32::try_from(id).map_err(|_| CodecError::IdOverflow { what, id })
}

/// Encode an IRI as `0x01 ++ namespace_id(u32 BE) ++ local_name(UTF-8)`.
pub fn encode_iri(namespace_id: u64, local_name: &str) -> Result<Vec<u8>, CodecError> {
    let ns = u32_id("namespace", namespace_id)?;
    let mut out = Vec::with_capacity(1 + 4 + local_name.len());
    out.push(TAG_IRI);
    out.extend_from_slice(&ns.to_be_bytes());
    out.extend_from_slice(local_name.as_bytes());
    Ok(out)
}

/// Encode a blank node as `0x02 ++ id(UTF-8)`.
pub fn encode_bnode(id: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + id.len());
    out.push(TAG_BNODE);
    out.extend_from_slice(id.as_bytes());
    out
}

/// Encode a literal as
/// `0x03 ++ datatype_id(u32 BE) ++ lang_len(u8) ++ lang(UTF-8) ++ label(UTF-8)`.
///
/// `lang` must be at most 255 bytes; `datatype_id` must fit in 32 bits.
pub fn encode_literal(
    datatype_id: u64,
    lang: Option<&str>,
    label: &str,
) -> Result<Vec<u8>, CodecError> {
    let dt = u32_id("datatype", datatype_id)?;
    let lang = lang.unwrap_or("");
    let lang_len =
        u8::try_from(lang.len()).map_err(|_| CodecError::LangTooLong { len: lang.len() })?;
    let mut out = Vec::with_capacity(1 + 4 + 1 + lang.len() + label.len());
    out.push(TAG_LITERAL);
    out.extend_from_slice(&dt.to_be_bytes());
    out.push(lang_len);
    out.extend_from_slice(lang.as_bytes());
    out.extend_from_slice(label.as_bytes());
    Ok(out)
}

/// Encode a literal using the legacy (pre-datatype-field) layout:
/// `0x03 ++ lang_len(u8) ++ lang(UTF-8) ++ label(UTF-8)`.
///
/// This layout is never written for new entries; it exists only so that
/// `xsd:string`/`rdf:langString` literals -- which predate the datatype
/// field -- can still be found by reverse lookup under their original key
/// (see [`crate::Decoded::Literal`] and the index's dual-key insert for
/// those two datatypes).
pub fn encode_literal_legacy(lang: Option<&str>, label: &str) -> Result<Vec<u8>, CodecError> {
    let lang = lang.unwrap_or("");
    let lang_len =
        u8::try_from(lang.len()).map_err(|_| CodecError::LangTooLong { len: lang.len() })?;
    let mut out = Vec::with_capacity(1 + 1 + lang.len() + label.len());
    out.push(TAG_LITERAL);
    out.push(lang_len);
    out.extend_from_slice(lang.as_bytes());
    out.extend_from_slice(label.as_bytes());
    Ok(out)
}

/// Encode a namespace string verbatim (no tag, no framing).
pub fn encode_namespace(namespace: &str) -> Vec<u8> {
    namespace.as_bytes().to_vec()
}

/// The decoded form of an entry's value bytes, before namespace/datatype
/// IDs have been resolved back to strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A bare namespace string (no recognized value tag byte).
    Namespace(String),
    /// An IRI, with its namespace left as an ID for the caller to resolve.
    Iri { namespace_id: u32, local_name: String },
    /// A blank node.
    BlankNode(String),
    /// A literal, with its datatype left as an ID for the caller to
    /// resolve.
    Literal {
        datatype_id: u32,
        lang: Option<String>,
        label: String,
    },
}

fn utf8(kind: &'static str, field: &'static str, bytes: &[u8]) -> Result<String, CodecError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| CodecError::InvalidUtf8 { kind, field })
}

fn decode_iri(rest: &[u8]) -> Result<Decoded, CodecError> {
    if rest.len() < 4 {
        return Err(CodecError::Truncated {
            kind: "iri",
            field: "namespace_id",
        });
    }
    let (ns_bytes, local_bytes) = rest.split_at(4);
    let namespace_id = u32::from_be_bytes(ns_bytes.try_into().unwrap());
    let local_name = utf8("iri", "local_name", local_bytes)?;
    Ok(Decoded::Iri {
        namespace_id,
        local_name,
    })
}

fn decode_bnode(rest: &[u8]) -> Result<Decoded, CodecError> {
    Ok(Decoded::BlankNode(utf8("bnode", "id", rest)?))
}

/// Decode the legacy (no datatype field) literal layout, as produced by
/// [`encode_literal_legacy`].
fn decode_literal_legacy(rest: &[u8]) -> Result<Decoded, CodecError> {
    if rest.is_empty() {
        return Err(CodecError::Truncated {
            kind: "literal",
            field: "lang_len",
        });
    }
    let (len_byte, after_len) = rest.split_at(1);
    let lang_len = len_byte[0] as usize;
    if after_len.len() < lang_len {
        return Err(CodecError::Truncated {
            kind: "literal",
            field: "lang",
        });
    }
    let (lang_bytes, label_bytes) = after_len.split_at(lang_len);
    let lang = if lang_len == 0 {
        None
    } else {
        Some(utf8("literal", "lang", lang_bytes)?)
    };
    let label = utf8("literal", "label", label_bytes)?;
    Ok(Decoded::Literal {
        datatype_id: 0,
        lang,
        label,
    })
}

fn decode_literal(rest: &[u8]) -> Result<Decoded, CodecError> {
    if rest.len() < 5 {
        return Err(CodecError::Truncated {
            kind: "literal",
            field: "datatype_id",
        });
    }
    let (dt_bytes, after_dt) = rest.split_at(4);
    let datatype_id = u32::from_be_bytes(dt_bytes.try_into().unwrap());
    let (len_byte, after_len) = after_dt.split_at(1);
    let lang_len = len_byte[0] as usize;
    if after_len.len() < lang_len {
        return Err(CodecError::Truncated {
            kind: "literal",
            field: "lang",
        });
    }
    let (lang_bytes, label_bytes) = after_len.split_at(lang_len);
    let lang = if lang_len == 0 {
        None
    } else {
        Some(utf8("literal", "lang", lang_bytes)?)
    };
    let label = utf8("literal", "label", label_bytes)?;
    Ok(Decoded::Literal {
        datatype_id,
        lang,
        label,
    })
}

/// Decode an entry's raw bytes back into its [`Decoded`] form.
///
/// Dispatches on the first byte: `0x01`/`0x02`/`0x03` decode as a value,
/// anything else is treated as a bare namespace string.
pub fn data2value(bytes: &[u8]) -> Result<Decoded, CodecError> {
    match bytes.first() {
        Some(&TAG_IRI) => decode_iri(&bytes[1..]),
        Some(&TAG_BNODE) => decode_bnode(&bytes[1..]),
        Some(&TAG_LITERAL) => decode_literal(&bytes[1..]),
        _ => Ok(Decoded::Namespace(utf8("namespace", "bytes", bytes)?)),
    }
}

/// Decode bytes known to hold the legacy literal encoding (no datatype
/// field), used only for the alternate reverse-lookup key of
/// `xsd:string`/`rdf:langString` literals.
pub fn data2value_legacy_literal(bytes: &[u8]) -> Result<Decoded, CodecError> {
    match bytes.first() {
        Some(&TAG_LITERAL) => decode_literal_legacy(&bytes[1..]),
        Some(&b) => Err(CodecError::UnrecognizedDiscriminant(b)),
        None => Err(CodecError::Truncated {
            kind: "literal",
            field: "tag",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iri_round_trips() {
        let encoded = encode_iri(7, "name").unwrap();
        assert_eq!(encoded[0], TAG_IRI);
        match data2value(&encoded).unwrap() {
            Decoded::Iri {
                namespace_id,
                local_name,
            } => {
                assert_eq!(namespace_id, 7);
                assert_eq!(local_name, "name");
            }
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn bnode_round_trips() {
        let encoded = encode_bnode("b0");
        assert_eq!(data2value(&encoded).unwrap(), Decoded::BlankNode("b0".into()));
    }

    #[test]
    fn literal_round_trips_with_lang() {
        let encoded = encode_literal(3, Some("en"), "hello").unwrap();
        match data2value(&encoded).unwrap() {
            Decoded::Literal {
                datatype_id,
                lang,
                label,
            } => {
                assert_eq!(datatype_id, 3);
                assert_eq!(lang.as_deref(), Some("en"));
                assert_eq!(label, "hello");
            }
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn literal_round_trips_without_lang() {
        let encoded = encode_literal(3, None, "hello").unwrap();
        match data2value(&encoded).unwrap() {
            Decoded::Literal { lang, label, .. } => {
                assert_eq!(lang, None);
                assert_eq!(label, "hello");
            }
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn legacy_literal_round_trips() {
        let encoded = encode_literal_legacy(Some("en"), "hello").unwrap();
        match data2value_legacy_literal(&encoded).unwrap() {
            Decoded::Literal {
                datatype_id,
                lang,
                label,
            } => {
                assert_eq!(datatype_id, 0);
                assert_eq!(lang.as_deref(), Some("en"));
                assert_eq!(label, "hello");
            }
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn namespace_bytes_have_no_tag() {
        let encoded = encode_namespace("http://example.org/");
        assert_eq!(
            data2value(&encoded).unwrap(),
            Decoded::Namespace("http://example.org/".into())
        );
    }

    #[test]
    fn lang_too_long_is_rejected() {
        let lang = "x".repeat(256);
        let err = encode_literal(1, Some(&lang), "l").unwrap_err();
        assert!(matches!(err, CodecError::LangTooLong { len: 256 }));
    }

    #[test]
    fn namespace_id_overflow_is_rejected() {
        let err = encode_iri(u64::from(u32::MAX) + 1, "x").unwrap_err();
        assert!(matches!(err, CodecError::IdOverflow { what: "namespace", .. }));
    }

    #[test]
    fn truncated_iri_is_rejected() {
        let err = data2value(&[TAG_IRI, 0, 0]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Truncated {
                kind: "iri",
                field: "namespace_id"
            }
        ));
    }

    #[test]
    fn unrecognized_legacy_tag_is_rejected() {
        let err = data2value_legacy_literal(&[TAG_IRI, 0]).unwrap_err();
        assert!(matches!(err, CodecError::UnrecognizedDiscriminant(TAG_IRI)));
    }
}

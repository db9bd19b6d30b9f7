use std::sync::{Arc, Mutex};

/// A 64-bit identifier assigned to a stored value or namespace.
///
/// IDs are allocated monotonically and never reused; `0` is reserved to
/// mean "unknown" (see [`UNKNOWN_ID`]).
pub type ValueId = u64;

/// Sentinel returned in place of a [`ValueId`] when a value or namespace
/// has never been stored. Lookups return `Option<ValueId>`, not this
/// constant directly, but it is exposed for callers that persist IDs
/// verbatim (e.g. as a foreign-key placeholder).
pub const UNKNOWN_ID: ValueId = 0;

/// An opaque generation token. Every [`Value`] that has been resolved to an
/// ID carries a `Revision` alongside it; the cached ID may be trusted only
/// while that `Revision` still matches the dictionary's current one.
///
/// `Revision`s are compared by identity (pointer equality of the shared
/// allocation), never by any notion of deep equality -- there is nothing to
/// compare structurally, by design. A dictionary mints a fresh `Revision`
/// each time it truncates its backing store, which invalidates every
/// previously stamped ID in one atomic swap.
#[derive(Clone)]
pub struct Revision(Arc<()>);

impl Revision {
    /// Mint a new revision, distinct from every revision minted before it.
    pub fn new() -> Self {
        Revision(Arc::new(()))
    }
}

impl Default for Revision {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Revision {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Revision {}

#[derive(Clone)]
struct Stamp {
    id: ValueId,
    revision: Revision,
}

/// An IRI, split into its namespace and local name for compression -- the
/// namespace is interned separately and referenced by ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Iri {
    /// The leading portion of the IRI, e.g. `"http://example.org/"`.
    pub namespace: String,
    /// The remainder of the IRI after the namespace.
    pub local_name: String,
}

impl Iri {
    /// Construct an IRI from its namespace and local name parts.
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
        }
    }
}

/// The content of an RDF value: one of the three term kinds this
/// dictionary stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// An IRI reference.
    Iri(Iri),
    /// A blank node, identified by an opaque string.
    BlankNode(String),
    /// A literal: a lexical label with an optional language tag and an
    /// optional datatype IRI. `lang` and `datatype` are never both `Some`
    /// for a well-formed RDF literal, but this type does not enforce that
    /// -- it is a storage concern, not an RDF well-formedness concern.
    Literal {
        /// The lexical form of the literal.
        label: String,
        /// The BCP-47 language tag, if this is a language-tagged string.
        lang: Option<String>,
        /// The datatype IRI, if this literal has an explicit datatype
        /// other than the plain/language-tagged-string defaults.
        datatype: Option<Iri>,
    },
}

/// An RDF value or, once stored, its cached identity.
///
/// `Value`s constructed via [`Value::iri`], [`Value::blank_node`], or the
/// `Value::literal*` constructors are immutable data plus one empty,
/// privately-owned cache cell. That cell is what the owning dictionary
/// stamps with `(id, revision)` on the first successful `store_value` or
/// `get_id` -- cloning a `Value` clones the handle to that same cell, so
/// every clone observes later stamps, but two `Value`s built independently
/// from equal content never share a cell until the dictionary's
/// `valueToID` cache hands back its own canonical instance.
#[derive(Clone)]
pub struct Value {
    kind: ValueKind,
    stamp: Arc<Mutex<Option<Stamp>>>,
}

impl Value {
    fn from_kind(kind: ValueKind) -> Self {
        Value {
            kind,
            stamp: Arc::new(Mutex::new(None)),
        }
    }

    /// Construct an IRI value.
    pub fn iri(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self::from_kind(ValueKind::Iri(Iri::new(namespace, local_name)))
    }

    /// Construct a blank node value.
    pub fn blank_node(id: impl Into<String>) -> Self {
        Self::from_kind(ValueKind::BlankNode(id.into()))
    }

    /// Construct a plain (untyped, no language) literal.
    pub fn literal(label: impl Into<String>) -> Self {
        Self::from_kind(ValueKind::Literal {
            label: label.into(),
            lang: None,
            datatype: None,
        })
    }

    /// Construct a language-tagged literal.
    pub fn literal_with_lang(label: impl Into<String>, lang: impl Into<String>) -> Self {
        Self::from_kind(ValueKind::Literal {
            label: label.into(),
            lang: Some(lang.into()),
            datatype: None,
        })
    }

    /// Construct an explicitly-typed literal.
    pub fn typed_literal(label: impl Into<String>, datatype: Iri) -> Self {
        Self::from_kind(ValueKind::Literal {
            label: label.into(),
            lang: None,
            datatype: Some(datatype),
        })
    }

    /// Borrow the content of this value.
    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    /// Unwrap this value back into its bare content, discarding the cache
    /// cell.
    pub fn into_kind(self) -> ValueKind {
        self.kind
    }

    /// Return the cached ID if, and only if, it was stamped under
    /// `current`. Never consults any cache or index -- a `None` here does
    /// not mean "unknown", only "ask the dictionary".
    pub fn cached_id(&self, current: &Revision) -> Option<ValueId> {
        let guard = self.stamp.lock().unwrap();
        guard
            .as_ref()
            .filter(|stamp| &stamp.revision == current)
            .map(|stamp| stamp.id)
    }

    /// Stamp this value (and every existing clone of it) with `id` under
    /// `revision`. Takes `&self`, not `&mut self`: the stamp cell is the
    /// one piece of interior mutability this type has, deliberately, so
    /// that lookup methods can cache into a caller's value without
    /// requiring a mutable borrow of it.
    pub fn stamp(&self, id: ValueId, revision: Revision) {
        *self.stamp.lock().unwrap() = Some(Stamp { id, revision });
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for Value {}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Value").field(&self.kind).finish()
    }
}

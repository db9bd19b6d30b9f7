use dict_store::{Dictionary, DictionaryConfig, Iri, Value, UNKNOWN_ID};

fn open_tmp() -> (tempfile::TempDir, Dictionary) {
    let dir = tempfile::tempdir().unwrap();
    let dict = Dictionary::open(DictionaryConfig::new(dir.path())).unwrap();
    (dir, dict)
}

#[test]
fn round_trips_every_value_kind() {
    let (_dir, dict) = open_tmp();
    let values = vec![
        Value::iri("http://example.org/", "foo-bar"),
        Value::blank_node("foo-bar-1"),
        Value::literal("hello"),
        Value::literal_with_lang("hello", "en"),
        Value::typed_literal("42", Iri::new("http://www.w3.org/2001/XMLSchema#", "integer")),
    ];
    for v in &values {
        let id = dict.store_value(v).unwrap();
        let back = dict.get_value(id).unwrap().unwrap();
        assert_eq!(&back, v, "round-trip failed for {v:?}");
    }
}

#[test]
fn storing_twice_returns_same_id_and_does_not_advance_next_id() {
    let (_dir, dict) = open_tmp();
    let v = Value::literal("stable");
    let id1 = dict.store_value(&v).unwrap();
    let before = dict.check_consistency().unwrap();
    assert_eq!(before, None);
    let id2 = dict.store_value(&Value::literal("stable")).unwrap();
    assert_eq!(id1, id2, "repeated store must return the same id");
}

#[test]
fn distinct_values_get_distinct_ids() {
    let (_dir, dict) = open_tmp();
    let a = dict.store_value(&Value::literal("a")).unwrap();
    let b = dict.store_value(&Value::literal("b")).unwrap();
    assert_ne!(a, b, "distinct values must get distinct ids");
}

#[test]
fn storing_an_iri_also_stores_its_namespace() {
    let (_dir, dict) = open_tmp();
    let iri = Value::iri("http://example.org/", "widget");
    dict.store_value(&iri).unwrap();
    let resolved_ns_id = dict.get_namespace_id("http://example.org/", false).unwrap();
    assert!(
        resolved_ns_id.is_some(),
        "namespace must have been stored alongside the IRI"
    );
}

#[test]
fn clear_invalidates_previously_stamped_ids() {
    let (_dir, dict) = open_tmp();
    let values: Vec<Value> = (0..10)
        .map(|i| Value::literal(format!("value-{i}")))
        .collect();
    for v in &values {
        dict.store_value(v).unwrap();
    }
    dict.clear().unwrap();
    for v in &values {
        assert_eq!(dict.get_id(v).unwrap(), None, "clear must invalidate every id");
    }
    let next_after_clear = dict.store_value(&Value::literal("first-after-clear")).unwrap();
    assert_eq!(next_after_clear, 1, "nextId must reset to 1 after clear");
}

#[test]
fn find_id_round_trips_below_and_above_max_key_size() {
    let (_dir, dict) = open_tmp();
    let small = Value::literal("short");
    let small_id = dict.store_value(&small).unwrap();
    assert_eq!(dict.get_id(&small).unwrap(), Some(small_id));

    let big_label = "x".repeat(2048);
    let big = Value::literal(big_label);
    let big_id = dict.store_value(&big).unwrap();
    assert_eq!(dict.get_id(&big).unwrap(), Some(big_id));

    assert_eq!(dict.get_id(&Value::literal("never stored")).unwrap(), None);
}

#[test]
fn reopening_recovers_next_id_from_the_max_committed_id() {
    let dir = tempfile::tempdir().unwrap();
    let max_id = {
        let dict = Dictionary::open(DictionaryConfig::new(dir.path())).unwrap();
        for i in 0..5 {
            dict.store_value(&Value::literal(format!("v{i}"))).unwrap();
        }
        dict.store_value(&Value::literal("last")).unwrap()
    };
    let reopened = Dictionary::open(DictionaryConfig::new(dir.path())).unwrap();
    let fresh_id = reopened.store_value(&Value::literal("after-reopen")).unwrap();
    assert_eq!(fresh_id, max_id + 1, "nextId must be 1 + the max committed id");
}

#[test]
fn plain_literal_resolves_under_canonical_and_legacy_encoding() {
    let (_dir, dict) = open_tmp();
    let v = Value::literal_with_lang("bonjour", "fr");
    let id = dict.store_value(&v).unwrap();
    assert_eq!(dict.get_id(&Value::literal_with_lang("bonjour", "fr")).unwrap(), Some(id));
}

#[test]
fn blank_node_round_trips_with_its_id_preserved() {
    let (_dir, dict) = open_tmp();
    let b = Value::blank_node("foo-bar-1");
    let id = dict.store_value(&b).unwrap();
    let back = dict.get_value(id).unwrap().unwrap();
    assert_eq!(back, Value::blank_node("foo-bar-1"));
}

#[test]
fn dictionary_check_consistency_is_clean_after_normal_use() {
    let (_dir, dict) = open_tmp();
    dict.store_value(&Value::iri("http://example.org/", "a")).unwrap();
    dict.store_value(&Value::literal("b")).unwrap();
    dict.store_value(&Value::blank_node("c")).unwrap();
    assert_eq!(dict.check_consistency().unwrap(), None);
}

#[test]
fn transaction_rollback_discards_allocated_ids() {
    let (_dir, dict) = open_tmp();
    let before = dict.store_value(&Value::literal("before")).unwrap();

    dict.start_transaction().unwrap();
    dict.store_value(&Value::literal("rolled-back")).unwrap();
    dict.rollback().unwrap();

    assert_eq!(dict.get_id(&Value::literal("rolled-back")).unwrap(), None);
    let after = dict.store_value(&Value::literal("after")).unwrap();
    assert_eq!(after, before + 1, "allocator must have been restored by rollback");
}

#[test]
fn transaction_commit_makes_ids_visible() {
    let (_dir, dict) = open_tmp();
    dict.start_transaction().unwrap();
    let id = dict.store_value(&Value::literal("in-transaction")).unwrap();
    dict.commit().unwrap();
    assert_eq!(dict.get_id(&Value::literal("in-transaction")).unwrap(), Some(id));
}

#[test]
fn never_stored_id_returns_unknown() {
    let (_dir, dict) = open_tmp();
    assert_eq!(dict.get_value(UNKNOWN_ID).unwrap(), None);
    assert_eq!(dict.get_value(999_999).unwrap(), None);
}

use network_data::{
    Column, CreateOptions, NetworkData, NetworkDataError, Provenance, Table, Value,
};

fn dense_nodes(labels: &[&str]) -> Table {
    Table::from_rows(
        &["_node_id", "_label"],
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| vec![Value::from(i as i64), Value::from(*label)])
            .collect(),
    )
    .unwrap()
}

fn dense_edges(pairs: &[(i64, i64)]) -> Table {
    Table::from_rows(
        &["_source", "_target", "weight"],
        pairs
            .iter()
            .map(|(s, t)| vec![Value::from(*s), Value::from(*t), Value::from(s + t)])
            .collect(),
    )
    .unwrap()
}

fn fixture() -> NetworkData {
    NetworkData::create(
        dense_nodes(&["a", "b", "c"]),
        dense_edges(&[(0, 1), (1, 2), (0, 1)]),
        true,
    )
    .unwrap()
}

#[test]
fn create_marks_computed_columns() {
    let nd = fixture();
    assert_eq!(nd.num_nodes(), 3);
    assert_eq!(nd.num_edges(), 3);
    assert_eq!(nd.edge_attribute_names(), vec!["weight"]);
    assert!(nd.node_attribute_names().is_empty());
    let weight = nd.edges().column("weight").unwrap();
    assert_eq!(weight.provenance(), Provenance::UserSupplied);
    assert!(nd.nodes().column("_count_edges").unwrap().is_computed());
    assert!(nd.has_components());
}

#[test]
fn unordered_node_ids_are_reordered() {
    let nodes = Table::from_rows(
        &["_node_id", "_label"],
        vec![
            vec![Value::from(1_i64), Value::from("b")],
            vec![Value::from(0_i64), Value::from("a")],
        ],
    )
    .unwrap();
    let nd = NetworkData::create(nodes, dense_edges(&[(0, 1)]), true).unwrap();
    assert_eq!(nd.nodes().value("_label", 0), Some(&Value::from("a")));
}

#[test]
fn sparse_node_ids_are_rejected() {
    let nodes = Table::from_rows(
        &["_node_id", "_label"],
        vec![
            vec![Value::from(0_i64), Value::from("a")],
            vec![Value::from(5_i64), Value::from("b")],
        ],
    )
    .unwrap();
    let err = NetworkData::create(nodes, dense_edges(&[(0, 0)]), true).unwrap_err();
    assert!(matches!(err, NetworkDataError::DataIntegrityError(_)));
}

#[test]
fn dangling_edge_is_a_referential_error() {
    let err = NetworkData::create(dense_nodes(&["a"]), dense_edges(&[(0, 3)]), true).unwrap_err();
    match err {
        NetworkDataError::ReferentialIntegrityError { value, .. } => assert_eq!(value, "3"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn null_label_is_rejected() {
    let nodes = Table::from_rows(
        &["_node_id", "_label"],
        vec![vec![Value::from(0_i64), Value::Null]],
    )
    .unwrap();
    let err = NetworkData::create(nodes, dense_edges(&[]), true).unwrap_err();
    assert!(matches!(err, NetworkDataError::DataIntegrityError(_)));
}

#[test]
fn without_augmentation_computed_columns_are_required() {
    let err = NetworkData::create(dense_nodes(&["a", "b"]), dense_edges(&[(0, 1)]), false)
        .unwrap_err();
    assert!(matches!(err, NetworkDataError::UnknownColumnError { .. }));

    let nd = fixture();
    let copy = NetworkData::create_with(
        nd.nodes().clone(),
        nd.edges().clone(),
        CreateOptions {
            augment: false,
            label_components: true,
        },
    )
    .unwrap();
    assert_eq!(copy, nd);
}

#[test]
fn empty_edges_table_is_valid() {
    let nd = NetworkData::create(dense_nodes(&["a", "b"]), dense_edges(&[]), true).unwrap();
    assert_eq!(nd.num_edges(), 0);
    assert_eq!(nd.component_ids().unwrap(), vec![0, 1]);
}

#[test]
fn queries_run_against_the_named_table() {
    let nd = fixture();
    let result = nd
        .query_edges("SELECT _source, SUM(weight) AS total FROM edges GROUP BY _source ORDER BY _source")
        .unwrap();
    assert_eq!(result.num_rows(), 2);
    assert_eq!(result.value("total", 0), Some(&Value::from(2_i64)));
    assert_eq!(result.value("total", 1), Some(&Value::from(3_i64)));

    let nodes = nd
        .query_nodes("SELECT _label FROM nodes WHERE _count_edges_multi > 2")
        .unwrap();
    assert_eq!(nodes.num_rows(), 1);
    assert_eq!(nodes.value("_label", 0), Some(&Value::from("b")));
}

#[test]
fn write_queries_are_rejected() {
    let nd = fixture();
    for sql in [
        "DELETE FROM edges",
        "SELECT 1; DROP TABLE edges",
        "UPDATE nodes SET _label = 'x'",
    ] {
        let err = if sql.contains("nodes") {
            nd.query_nodes(sql)
        } else {
            nd.query_edges(sql)
        }
        .unwrap_err();
        assert!(
            matches!(err, NetworkDataError::ConfigurationError(_)),
            "{sql}: {err}"
        );
    }
    let err = nd.query_edges("SELECT nope FROM edges").unwrap_err();
    assert!(matches!(err, NetworkDataError::QueryError(_)));
}

#[test]
fn with_columns_appends_user_attributes() {
    let nd = fixture();
    let extended = nd
        .with_columns(
            vec![Column::new(
                "colour",
                vec![Value::from("red"), Value::from("green"), Value::Null],
            )],
            vec![],
        )
        .unwrap();
    assert_eq!(extended.node_attribute_names(), vec!["colour"]);
    assert_eq!(extended.edges(), nd.edges());

    let reserved = nd.with_columns(vec![Column::new("_colour", vec![Value::Null; 3])], vec![]);
    assert!(matches!(reserved, Err(NetworkDataError::ConfigurationError(_))));
    let existing = nd.with_columns(vec![], vec![Column::new("weight", vec![Value::Null; 3])]);
    assert!(matches!(existing, Err(NetworkDataError::ConfigurationError(_))));
    let ragged = nd.with_columns(vec![Column::new("short", vec![Value::Null])], vec![]);
    assert!(matches!(ragged, Err(NetworkDataError::DataIntegrityError(_))));
}

#[test]
fn network_data_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<NetworkData>();

    let nd = std::sync::Arc::new(fixture());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let nd = nd.clone();
            std::thread::spawn(move || nd.component_summary().unwrap().number_of_components)
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 1);
    }
}

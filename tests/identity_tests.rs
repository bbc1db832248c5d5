use network_data::{
    NetworkDataError, NodeIdMapBuilder, NodeKey, Table, Value,
    identity::{NodeColumns, map_identities},
};

fn edges(rows: Vec<(Value, Value)>) -> Table {
    Table::from_rows(
        &["source", "target", "weight"],
        rows.into_iter()
            .enumerate()
            .map(|(i, (s, t))| vec![s, t, Value::from(i as i64)])
            .collect(),
    )
    .unwrap()
}

fn column(table: &Table, name: &str) -> Vec<Value> {
    table.column(name).unwrap().values().to_vec()
}

#[test]
fn implicit_nodes_are_sorted_integers_first() {
    let edges = edges(vec![
        (Value::from(3_i64), Value::from(1_i64)),
        (Value::from(2_i64), Value::from("x")),
    ]);
    let mapped = map_identities(&edges, "source", "target", None).unwrap();

    assert_eq!(
        column(&mapped.nodes, "id"),
        vec![
            Value::from(1_i64),
            Value::from(2_i64),
            Value::from(3_i64),
            Value::from("x")
        ]
    );
    assert_eq!(
        column(&mapped.nodes, "_label"),
        vec![
            Value::from("1"),
            Value::from("2"),
            Value::from("3"),
            Value::from("x")
        ]
    );
    assert_eq!(
        column(&mapped.edges, "_source"),
        vec![Value::from(2_i64), Value::from(1_i64)]
    );
    assert_eq!(
        column(&mapped.edges, "_target"),
        vec![Value::from(0_i64), Value::from(3_i64)]
    );
    assert_eq!(mapped.edges.column_names(), vec!["_source", "_target", "weight"]);
    assert_eq!(mapped.id_map.original(3), Some(&NodeKey::from("x")));
}

#[test]
fn explicit_nodes_keep_row_order_and_fall_back_to_id_labels() {
    let nodes = Table::from_rows(
        &["id", "label", "group"],
        vec![
            vec![Value::from(10_i64), Value::from("a"), Value::from("g1")],
            vec![Value::from(20_i64), Value::Null, Value::from("g2")],
            vec![Value::from(30_i64), Value::from("c"), Value::from("g1")],
        ],
    )
    .unwrap();
    let edges = edges(vec![(Value::from(20_i64), Value::from(10_i64))]);
    let mapped = map_identities(
        &edges,
        "source",
        "target",
        Some(NodeColumns {
            table: &nodes,
            id: "id",
            label: Some("label"),
        }),
    )
    .unwrap();

    assert_eq!(
        column(&mapped.nodes, "_label"),
        vec![Value::from("a"), Value::from("20"), Value::from("c")]
    );
    assert_eq!(column(&mapped.edges, "_source"), vec![Value::from(1_i64)]);
    assert_eq!(column(&mapped.edges, "_target"), vec![Value::from(0_i64)]);
    assert!(mapped.nodes.has_column("group"));
}

#[test]
fn missing_node_reference_reports_the_value() {
    let nodes = Table::from_rows(&["id"], vec![vec![Value::from(10_i64)]]).unwrap();
    let edges = edges(vec![(Value::from(10_i64), Value::from(99_i64))]);
    let err = map_identities(
        &edges,
        "source",
        "target",
        Some(NodeColumns {
            table: &nodes,
            id: "id",
            label: None,
        }),
    )
    .unwrap_err();
    match err {
        NetworkDataError::ReferentialIntegrityError { value, .. } => assert_eq!(value, "99"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicate_node_ids_are_rejected() {
    let nodes = Table::from_rows(
        &["id"],
        vec![vec![Value::from("a")], vec![Value::from("a")]],
    )
    .unwrap();
    let edges = edges(vec![(Value::from("a"), Value::from("a"))]);
    let err = map_identities(
        &edges,
        "source",
        "target",
        Some(NodeColumns {
            table: &nodes,
            id: "id",
            label: None,
        }),
    )
    .unwrap_err();
    assert!(matches!(err, NetworkDataError::DataIntegrityError(_)));
}

#[test]
fn null_endpoints_are_rejected() {
    let edges = edges(vec![(Value::from("a"), Value::Null)]);
    let err = map_identities(&edges, "source", "target", None).unwrap_err();
    assert!(matches!(err, NetworkDataError::DataIntegrityError(_)));
}

#[test]
fn whole_reals_map_to_the_same_node_as_integers() {
    assert_eq!(NodeKey::from_value(&Value::Real(2.0)), Some(NodeKey::Integer(2)));
    assert_eq!(NodeKey::from_value(&Value::Null), None);

    let mut builder = NodeIdMapBuilder::new();
    builder.get_or_assign(NodeKey::from(2_i64));
    let map = builder.finish();
    assert_eq!(map.resolve(&Value::Real(2.0)).unwrap(), 0);
}

#[test]
fn boolean_ids_do_not_collide_with_integers() {
    let edges = edges(vec![(Value::Boolean(true), Value::from(1_i64))]);
    let mapped = map_identities(&edges, "source", "target", None).unwrap();
    assert_eq!(mapped.id_map.len(), 2);
    assert_eq!(
        column(&mapped.nodes, "_label"),
        vec![Value::from("true"), Value::from("1")]
    );
    assert_eq!(
        column(&mapped.edges, "_source"),
        vec![Value::from(0_i64)]
    );
    assert_eq!(
        column(&mapped.edges, "_target"),
        vec![Value::from(1_i64)]
    );
}

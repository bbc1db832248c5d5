use network_data::{
    AttributeSelection, Attributes, ExportOptions, ExportedGraph, GraphNode, GraphType,
    ImportOptions, NetworkData, NetworkDataConfig, NetworkDataError, Table, Value, assemble,
};
use petgraph::{Directed, Graph, Undirected, graph::NodeIndex};

fn weighted_network() -> NetworkData {
    let edges = Table::from_rows(
        &["source", "target", "weight"],
        vec![
            vec![Value::from("a"), Value::from("b"), Value::from(1_i64)],
            vec![Value::from("b"), Value::from("a"), Value::from(2_i64)],
            vec![Value::from("a"), Value::from("b"), Value::from(3_i64)],
            vec![Value::from("c"), Value::from("c"), Value::from(4_i64)],
        ],
    )
    .unwrap();
    assemble(&edges, None, &NetworkDataConfig::default()).unwrap()
}

#[test]
fn edge_counts_per_graph_type() {
    let nd = weighted_network();
    let expected = [
        (GraphType::Directed, 3),
        (GraphType::DirectedMulti, 4),
        (GraphType::Undirected, 2),
        (GraphType::UndirectedMulti, 4),
    ];
    for (graph_type, edges) in expected {
        let graph = nd.as_graph(&ExportOptions::new(graph_type)).unwrap();
        assert_eq!(graph.node_count(), 3, "{graph_type}");
        assert_eq!(graph.edge_count(), edges, "{graph_type}");
    }
    let directed = nd.as_graph(&ExportOptions::new(GraphType::Directed)).unwrap();
    assert!(matches!(directed, ExportedGraph::Directed(_)));
}

#[test]
fn omit_self_loops_drops_loop_rows() {
    let nd = weighted_network();
    let graph = nd
        .as_graph(&ExportOptions::new(GraphType::DirectedMulti).omit_self_loops(true))
        .unwrap();
    assert_eq!(graph.edge_count(), 3);
}

#[test]
fn simple_export_merges_attributes_of_parallel_rows() {
    let nd = weighted_network();
    let exported = nd
        .as_graph_type::<Directed>(
            &ExportOptions::new(GraphType::Directed)
                .node_attributes(AttributeSelection::All)
                .edge_attributes(AttributeSelection::named(["weight"])),
        )
        .unwrap();
    let a = exported.node_map.node_index(0).unwrap();
    let b = exported.node_map.node_index(1).unwrap();
    let edge = exported.graph.find_edge(a, b).unwrap();
    assert_eq!(exported.graph[edge].get("weight"), Some(&Value::from(3_i64)));
    assert_eq!(exported.graph[a].label.as_deref(), Some("a"));
    assert_eq!(exported.graph[a].attributes.get("id"), Some(&Value::from("a")));
}

#[test]
fn unknown_attribute_name_is_rejected() {
    let nd = weighted_network();
    let err = nd
        .as_graph(
            &ExportOptions::new(GraphType::Directed)
                .edge_attributes(AttributeSelection::named(["height"])),
        )
        .unwrap_err();
    assert!(matches!(err, NetworkDataError::UnknownColumnError { .. }));
}

#[test]
fn computed_attributes_are_exported_on_request() {
    let nd = weighted_network();
    let exported = nd
        .as_graph_type::<Undirected>(
            &ExportOptions::new(GraphType::UndirectedMulti)
                .node_attributes(AttributeSelection::AllWithComputed),
        )
        .unwrap();
    let c = exported.node_map.node_index(2).unwrap();
    assert_eq!(
        exported.graph[c].attributes.get("_count_edges_multi"),
        Some(&Value::from(2_i64))
    );
    assert!(!exported.graph[c].attributes.contains_key("_node_id"));
}

#[test]
fn compact_graph_keeps_first_row_of_each_pair() {
    let nd = weighted_network();
    let simple = nd.as_compact_graph::<Directed>(false, false).unwrap();
    let mut weights: Vec<u64> = simple.graph.edge_weights().copied().collect();
    weights.sort_unstable();
    assert_eq!(weights, vec![0, 1, 3]);

    let undirected = nd.as_compact_graph::<Undirected>(false, true).unwrap();
    assert_eq!(undirected.graph.edge_count(), 1);
    assert_eq!(undirected.node_map.node_id(NodeIndex::new(2)), Some(2));

    let multi = nd.as_compact_graph::<Directed>(true, false).unwrap();
    assert_eq!(multi.graph.edge_count(), 4);
}

#[test]
fn compact_graph_cut_points() {
    let edges = Table::from_rows(
        &["source", "target"],
        vec![
            vec![Value::from(1_i64), Value::from(2_i64)],
            vec![Value::from(2_i64), Value::from(3_i64)],
        ],
    )
    .unwrap();
    let nd = assemble(&edges, None, &NetworkDataConfig::default()).unwrap();
    let graph = nd.as_compact_graph::<Undirected>(false, true).unwrap();
    assert_eq!(graph.cut_points(), vec![1]);
}

#[test]
fn attribute_graph_round_trip_keeps_counts_and_values() {
    let nd = weighted_network();
    let exported = nd
        .as_graph_type::<Directed>(
            &ExportOptions::new(GraphType::DirectedMulti)
                .node_attributes(AttributeSelection::All)
                .edge_attributes(AttributeSelection::All),
        )
        .unwrap();
    let imported = NetworkData::from_graph(&exported.graph, &ImportOptions::default()).unwrap();

    assert_eq!(imported.num_nodes(), nd.num_nodes());
    assert_eq!(imported.num_edges(), nd.num_edges());
    for name in nd.edge_attribute_names() {
        assert_eq!(
            imported.edges().column(&name).unwrap().values(),
            nd.edges().column(&name).unwrap().values()
        );
    }
    for name in nd.node_attribute_names() {
        assert_eq!(
            imported.nodes().column(&name).unwrap().values(),
            nd.nodes().column(&name).unwrap().values()
        );
    }
    assert_eq!(
        imported.nodes().column("_label").unwrap().values(),
        nd.nodes().column("_label").unwrap().values()
    );
}

#[test]
fn mixed_type_columns_keep_their_values() {
    let edges = Table::from_rows(
        &["source", "target", "tag"],
        vec![
            vec![Value::from(1_i64), Value::from("b"), Value::from(1_i64)],
            vec![Value::from("b"), Value::from("c"), Value::from("x")],
        ],
    )
    .unwrap();
    let nd = assemble(&edges, None, &NetworkDataConfig::default()).unwrap();
    let tags = vec![Value::Integer(1), Value::from("x")];
    let ids = vec![Value::Integer(1), Value::from("b"), Value::from("c")];
    assert_eq!(nd.edges().column("tag").unwrap().values(), tags.as_slice());
    assert_eq!(nd.nodes().column("id").unwrap().values(), ids.as_slice());

    let exported = nd
        .as_graph_type::<Directed>(
            &ExportOptions::new(GraphType::DirectedMulti)
                .node_attributes(AttributeSelection::All)
                .edge_attributes(AttributeSelection::All),
        )
        .unwrap();
    let imported = NetworkData::from_graph(&exported.graph, &ImportOptions::default()).unwrap();
    assert_eq!(imported.edges().column("tag").unwrap().values(), tags.as_slice());
    assert_eq!(imported.nodes().column("id").unwrap().values(), ids.as_slice());
}

#[test]
fn import_uses_label_fallback_chain() {
    let mut graph: Graph<GraphNode, Attributes, Undirected> = Graph::new_undirected();
    let a = graph.add_node(GraphNode::new("n1").with_attribute("name", "Alpha"));
    let b = graph.add_node(GraphNode::new("n2").with_label("Beta"));
    let c = graph.add_node(GraphNode::new(7_i64).with_attribute("secret", 1_i64));
    graph.add_edge(a, b, Attributes::new());
    graph.add_edge(b, c, Attributes::from([("w".to_string(), Value::from(0.5))]));

    let options = ImportOptions::default()
        .label_attribute("name")
        .ignore_node_attribute("secret");
    let nd = NetworkData::from_graph(&graph, &options).unwrap();
    let labels: Vec<String> = nd
        .nodes()
        .column("_label")
        .unwrap()
        .values()
        .iter()
        .map(|v| v.to_string())
        .collect();
    assert_eq!(labels, vec!["Alpha", "Beta", "7"]);
    assert_eq!(nd.node_attribute_names(), vec!["name"]);
    assert_eq!(nd.edges().value("w", 0), Some(&Value::Null));
    assert_eq!(nd.edges().value("w", 1), Some(&Value::from(0.5)));
}

#[test]
fn import_rejects_duplicate_ids_and_reserved_attributes() {
    let mut graph: Graph<GraphNode, Attributes, Directed> = Graph::new();
    graph.add_node(GraphNode::new("x"));
    graph.add_node(GraphNode::new("x"));
    let err = NetworkData::from_graph(&graph, &ImportOptions::default()).unwrap_err();
    assert!(matches!(err, NetworkDataError::DataIntegrityError(_)));

    let mut graph: Graph<GraphNode, Attributes, Directed> = Graph::new();
    graph.add_node(GraphNode::new("x").with_attribute("_hidden", true));
    let err = NetworkData::from_graph(&graph, &ImportOptions::default()).unwrap_err();
    assert!(matches!(err, NetworkDataError::DataIntegrityError(_)));
}

#[test]
fn graph_type_names_parse_and_display() {
    for graph_type in GraphType::ALL {
        assert_eq!(graph_type.to_string().parse::<GraphType>().unwrap(), graph_type);
    }
    assert_eq!(GraphType::default(), GraphType::DirectedMulti);
    let err = "hypergraph".parse::<GraphType>().unwrap_err();
    assert!(matches!(err, NetworkDataError::ConfigurationError(_)));
}

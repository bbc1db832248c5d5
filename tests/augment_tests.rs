use std::collections::HashMap;

use network_data::{
    NetworkData, NetworkDataConfig, Table, Value,
    augment::{NodeAugmentation, augment_nodes_with},
    assemble,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

fn network(pairs: &[(&str, &str)]) -> NetworkData {
    let edges = Table::from_rows(
        &["source", "target"],
        pairs
            .iter()
            .map(|(s, t)| vec![Value::from(*s), Value::from(*t)])
            .collect(),
    )
    .unwrap();
    assemble(&edges, None, &NetworkDataConfig::default()).unwrap()
}

fn ints(table: &Table, name: &str) -> Vec<i64> {
    table
        .column(name)
        .unwrap()
        .values()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect()
}

fn reals(table: &Table, name: &str) -> Vec<f64> {
    table
        .column(name)
        .unwrap()
        .values()
        .iter()
        .map(|v| v.as_f64().unwrap())
        .collect()
}

#[test]
fn duplicate_counters_for_reciprocal_and_parallel_edges() {
    let nd = network(&[("A", "B"), ("B", "A"), ("A", "B")]);
    let edges = nd.edges();
    assert_eq!(ints(edges, "_edge_id"), vec![0, 1, 2]);
    assert_eq!(ints(edges, "_count_dup_directed"), vec![2, 1, 2]);
    assert_eq!(ints(edges, "_idx_dup_directed"), vec![1, 1, 2]);
    assert_eq!(ints(edges, "_count_dup_undirected"), vec![3, 3, 3]);
    assert_eq!(ints(edges, "_idx_dup_undirected"), vec![1, 2, 3]);
}

#[test]
fn node_degrees_for_reciprocal_and_parallel_edges() {
    let nd = network(&[("A", "B"), ("B", "A"), ("A", "B")]);
    let nodes = nd.nodes();
    assert_eq!(ints(nodes, "_in_edges"), vec![1, 1]);
    assert_eq!(ints(nodes, "_out_edges"), vec![1, 1]);
    assert_eq!(ints(nodes, "_in_edges_multi"), vec![1, 2]);
    assert_eq!(ints(nodes, "_out_edges_multi"), vec![2, 1]);
    assert_eq!(ints(nodes, "_count_edges"), vec![2, 2]);
    assert_eq!(ints(nodes, "_count_edges_multi"), vec![3, 3]);
    assert_eq!(
        nodes.column("_is_source").unwrap().values(),
        &[Value::Boolean(true), Value::Boolean(true)]
    );
}

#[test]
fn self_loop_counts_as_one_in_and_one_out() {
    let nd = network(&[("X", "X")]);
    let nodes = nd.nodes();
    assert_eq!(ints(nodes, "_count_edges"), vec![2]);
    assert_eq!(ints(nodes, "_count_edges_multi"), vec![2]);
    assert_eq!(ints(nodes, "_in_edges"), vec![1]);
    assert_eq!(ints(nodes, "_out_edges"), vec![1]);

    let omitted = augment_nodes_with(
        nd.nodes(),
        nd.edges(),
        NodeAugmentation {
            omit_self_loops: true,
        },
    )
    .unwrap();
    assert_eq!(ints(&omitted, "_count_edges"), vec![0]);
    assert_eq!(ints(&omitted, "_count_edges_multi"), vec![0]);
}

#[test]
fn isolated_nodes_get_zero_counts() {
    let nodes = Table::from_rows(
        &["id"],
        vec![
            vec![Value::from("a")],
            vec![Value::from("b")],
            vec![Value::from("lonely")],
        ],
    )
    .unwrap();
    let edges = Table::from_rows(
        &["source", "target"],
        vec![vec![Value::from("a"), Value::from("b")]],
    )
    .unwrap();
    let nd = assemble(&edges, Some(&nodes), &NetworkDataConfig::default()).unwrap();
    assert_eq!(ints(nd.nodes(), "_count_edges"), vec![1, 1, 0]);
    assert_eq!(
        nd.nodes().value("_is_target", 2),
        Some(&Value::Boolean(false))
    );
    assert_eq!(reals(nd.nodes(), "_degree_centrality")[2], 0.0);
}

#[test]
fn centrality_columns_use_node_and_side_counts() {
    // two sources pointing at one target
    let nd = network(&[("s1", "t"), ("s2", "t"), ("s2", "t")]);
    let nodes = nd.nodes();
    let labels: Vec<&str> = nodes
        .column("_label")
        .unwrap()
        .values()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["s1", "s2", "t"]);
    assert_eq!(
        reals(nodes, "_degree_centrality"),
        vec![1.0 / 3.0, 1.0 / 3.0, 2.0 / 3.0]
    );
    assert_eq!(
        reals(nodes, "_degree_centrality_multi"),
        vec![1.0 / 3.0, 2.0 / 3.0, 1.0]
    );
    assert_eq!(reals(nodes, "_bipartite_degree_centrality"), vec![0.5, 0.5, 2.0]);
    assert_eq!(
        reals(nodes, "_bipartite_degree_centrality_multi"),
        vec![0.5, 1.0, 3.0]
    );
}

#[test]
fn duplicate_indices_partition_random_edge_sets() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let names: Vec<String> = (0..12).map(|i| format!("n{i}")).collect();
    let pairs: Vec<(&str, &str)> = (0..200)
        .map(|_| {
            (
                names[rng.gen_range(0..names.len())].as_str(),
                names[rng.gen_range(0..names.len())].as_str(),
            )
        })
        .collect();
    let nd = network(&pairs);
    let edges = nd.edges();
    let sources = ints(edges, "_source");
    let targets = ints(edges, "_target");
    let counts = ints(edges, "_count_dup_directed");
    let idx = ints(edges, "_idx_dup_directed");
    let undirected_counts = ints(edges, "_count_dup_undirected");
    let undirected_idx = ints(edges, "_idx_dup_undirected");

    let mut directed: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    let mut undirected: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for row in 0..edges.num_rows() {
        let (s, t) = (sources[row], targets[row]);
        directed.entry((s, t)).or_default().push(row);
        undirected.entry((s.min(t), s.max(t))).or_default().push(row);
    }
    for rows in directed.values() {
        assert_eq!(rows.iter().filter(|r| idx[**r] == 1).count(), 1);
        for (position, row) in rows.iter().enumerate() {
            assert_eq!(counts[*row], rows.len() as i64);
            assert_eq!(idx[*row], position as i64 + 1);
        }
    }
    for rows in undirected.values() {
        assert_eq!(rows.iter().filter(|r| undirected_idx[**r] == 1).count(), 1);
        for row in rows {
            assert_eq!(undirected_counts[*row], rows.len() as i64);
        }
    }

    let mut node_ids = ints(nd.nodes(), "_node_id");
    node_ids.sort_unstable();
    assert_eq!(node_ids, (0..nd.num_nodes() as i64).collect::<Vec<_>>());
}

#[test]
fn augmentation_is_recomputed_on_augmented_input() {
    let nd = network(&[("a", "b"), ("a", "b")]);
    let again = NetworkData::create(nd.nodes().clone(), nd.edges().clone(), true).unwrap();
    assert_eq!(again, nd);
}

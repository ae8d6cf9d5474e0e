//! Store-level integration tests: pools, adjacency, recycling, and serde

use rand::seq::SliceRandom;
use rand::Rng;
use trellis::{
    Config, Direction, EdgeId, EdgeKinds, GraphStore, Interval, Node, NodeId, DEFAULT_EDGE_TYPE,
};

fn node(id: u64) -> NodeId {
    NodeId::new(id)
}

fn edge(id: u64) -> EdgeId {
    EdgeId::new(id)
}

#[test]
fn scenario_basic_degrees() {
    let mut store = GraphStore::new();
    for id in 1..=3 {
        store.add_node(Node::new(id)).unwrap();
    }
    store
        .add_edge(edge(1), node(1), node(2), DEFAULT_EDGE_TYPE, true)
        .unwrap();

    assert_eq!(store.degree(node(1)).unwrap(), 1);
    assert_eq!(store.degree(node(2)).unwrap(), 1);
    assert_eq!(store.degree(node(3)).unwrap(), 0);
}

#[test]
fn scenario_mutual_pair() {
    let mut store = GraphStore::new();
    store.add_node(Node::new(1)).unwrap();
    store.add_node(Node::new(2)).unwrap();
    store
        .add_edge(edge(1), node(1), node(2), DEFAULT_EDGE_TYPE, true)
        .unwrap();
    store
        .add_edge(edge(2), node(2), node(1), DEFAULT_EDGE_TYPE, true)
        .unwrap();

    assert!(store.edge(edge(1)).unwrap().is_mutual());
    assert!(store.edge(edge(2)).unwrap().is_mutual());
    assert_eq!(store.undirected_edge_count(), 1);
}

#[test]
fn recycling_reuses_exactly_the_freed_slots() {
    let mut store = GraphStore::new();
    for id in 1..=100 {
        store.add_node(Node::new(id)).unwrap();
    }
    let mut freed: Vec<_> = (20..=40)
        .map(|id| {
            let slot = store.node(node(id)).unwrap().store_id().unwrap();
            store.remove_node(node(id)).unwrap();
            slot
        })
        .collect();

    let mut reused: Vec<_> = (200..=220)
        .map(|id| store.add_node(Node::new(id)).unwrap())
        .collect();
    freed.sort_unstable();
    reused.sort_unstable();
    assert_eq!(freed, reused);
    assert_eq!(store.node_count(), 100);
}

#[test]
fn randomized_slot_uniqueness() {
    let mut rng = rand::thread_rng();
    let mut store = GraphStore::new();
    let mut live: Vec<u64> = Vec::new();
    let mut next_id = 1u64;

    for _ in 0..2000 {
        if live.is_empty() || rng.gen_bool(0.6) {
            store.add_node(Node::new(next_id)).unwrap();
            live.push(next_id);
            next_id += 1;
        } else {
            let index = rng.gen_range(0..live.len());
            let id = live.swap_remove(index);
            store.remove_node(node(id)).unwrap();
        }
    }

    assert_eq!(store.node_count(), live.len());
    let mut slots: Vec<_> = store.nodes().filter_map(|n| n.store_id()).collect();
    let total = slots.len();
    slots.sort_unstable();
    slots.dedup();
    assert_eq!(slots.len(), total);
}

#[test]
fn adjacency_symmetry_under_churn() {
    let mut rng = rand::thread_rng();
    let mut store = GraphStore::new();
    for id in 1..=30 {
        store.add_node(Node::new(id)).unwrap();
    }

    let mut edges: Vec<(u64, u64, u64)> = Vec::new();
    let mut next_edge = 1u64;
    for _ in 0..300 {
        if edges.is_empty() || rng.gen_bool(0.65) {
            let source = rng.gen_range(1..=30u64);
            let target = rng.gen_range(1..=30u64);
            if store
                .add_edge(edge(next_edge), node(source), node(target), DEFAULT_EDGE_TYPE, true)
                .is_ok()
            {
                edges.push((next_edge, source, target));
                next_edge += 1;
            }
        } else {
            let index = rng.gen_range(0..edges.len());
            let (id, _, _) = edges.swap_remove(index);
            store.remove_edge(edge(id)).unwrap();
        }
    }

    // Every live edge appears exactly once in its source's out-list and
    // once in its target's in-list.
    for &(id, source, target) in &edges {
        let out_hits = store
            .out_edges(node(source), None)
            .unwrap()
            .filter(|e| e.id() == edge(id))
            .count();
        assert_eq!(out_hits, 1);
        let in_hits = store
            .in_edges(node(target), None)
            .unwrap()
            .filter(|e| e.id() == edge(id))
            .count();
        assert_eq!(in_hits, 1);
    }

    // Mutual invariant: marked mutual iff the reverse is live.
    let live: Vec<(EdgeId, NodeId, NodeId)> = store
        .edges()
        .map(|e| (e.id(), e.source(), e.target()))
        .collect();
    for (id, source, target) in live {
        let reverse_live = store
            .edge_between(target, source, DEFAULT_EDGE_TYPE)
            .is_some_and(|e| e.source() == target && e.target() == source);
        let expect_mutual = source != target && reverse_live;
        assert_eq!(store.edge(id).unwrap().is_mutual(), expect_mutual);
    }
}

#[test]
fn mutual_counts_match_rescan_after_churn() {
    let mut rng = rand::thread_rng();
    let mut store = GraphStore::new();
    for id in 1..=10 {
        store.add_node(Node::new(id)).unwrap();
    }
    let mut pairs: Vec<(u64, u64)> = (1..=10u64)
        .flat_map(|a| (1..=10u64).map(move |b| (a, b)))
        .filter(|(a, b)| a != b)
        .collect();
    pairs.shuffle(&mut rng);

    let mut next_edge = 1u64;
    for &(a, b) in pairs.iter().take(60) {
        store
            .add_edge(edge(next_edge), node(a), node(b), DEFAULT_EDGE_TYPE, true)
            .unwrap();
        next_edge += 1;
    }

    let rescan = store
        .edges()
        .filter(|e| {
            e.is_mutual() && {
                // Count each pair once, at its lexicographically first edge.
                (e.source(), e.target()) < (e.target(), e.source())
            }
        })
        .count();
    assert_eq!(store.mutual_pair_count(), rescan);
    assert_eq!(
        store.undirected_edge_count(),
        store.edge_count() - store.mutual_pair_count()
    );
}

#[test]
fn self_loops_count_twice_in_undirected_degree() {
    let mut store = GraphStore::new();
    store.add_node(Node::new(1)).unwrap();
    store
        .add_edge(edge(1), node(1), node(1), DEFAULT_EDGE_TYPE, true)
        .unwrap();

    assert_eq!(store.out_degree(node(1)).unwrap(), 1);
    assert_eq!(store.in_degree(node(1)).unwrap(), 1);
    assert_eq!(store.degree(node(1)).unwrap(), 2);
    assert_eq!(store.undirected_degree(node(1)).unwrap(), 2);
    // Iterating both directions yields the loop once.
    assert_eq!(store.edges_of(node(1), None).unwrap().count(), 1);
}

#[test]
fn parallel_edges_when_configured() {
    let config = Config::new().with_parallel_edges(true);
    let mut store = GraphStore::with_config(config);
    store.add_node(Node::new(1)).unwrap();
    store.add_node(Node::new(2)).unwrap();

    store
        .add_edge(edge(1), node(1), node(2), DEFAULT_EDGE_TYPE, true)
        .unwrap();
    store
        .add_edge(edge(2), node(1), node(2), DEFAULT_EDGE_TYPE, true)
        .unwrap();
    assert_eq!(store.edge_count(), 2);
    assert_eq!(store.degree(node(1)).unwrap(), 2);

    // The canonical lookup stays live across removal of the resident.
    assert_eq!(
        store
            .edge_between(node(1), node(2), DEFAULT_EDGE_TYPE)
            .map(|e| e.id()),
        Some(edge(1))
    );
    store.remove_edge(edge(1)).unwrap();
    assert_eq!(
        store
            .edge_between(node(1), node(2), DEFAULT_EDGE_TYPE)
            .map(|e| e.id()),
        Some(edge(2))
    );
}

#[test]
fn direction_parameterized_iteration() {
    let mut store = GraphStore::new();
    for id in 1..=3 {
        store.add_node(Node::new(id)).unwrap();
    }
    let knows = store.register_edge_type("KNOWS").unwrap();
    store.add_edge(edge(1), node(1), node(2), knows, true).unwrap();
    store
        .add_edge(edge(2), node(3), node(1), DEFAULT_EDGE_TYPE, true)
        .unwrap();

    assert_eq!(store.out_edges(node(1), None).unwrap().count(), 1);
    assert_eq!(store.in_edges(node(1), None).unwrap().count(), 1);
    assert_eq!(store.edges_of(node(1), None).unwrap().count(), 2);
    assert_eq!(store.out_edges(node(1), Some(knows)).unwrap().count(), 1);
    assert_eq!(
        store
            .out_edges(node(1), Some(DEFAULT_EDGE_TYPE))
            .unwrap()
            .count(),
        0
    );

    // Direction is a plain value usable by callers for dispatch.
    let direction = Direction::Both;
    assert_eq!(direction, Direction::Both);
}

#[test]
fn block_boundary_growth_and_shrink() {
    let config = Config::new().with_block_size(64);
    let mut store = GraphStore::with_config(config);
    for id in 1..=1000 {
        store.add_node(Node::new(id)).unwrap();
    }
    assert_eq!(store.node_count(), 1000);

    for id in 101..=1000 {
        store.remove_node(node(id)).unwrap();
    }
    assert_eq!(store.node_count(), 100);
    // Slots above the shrunk range are recycled fresh.
    let slot = store.add_node(Node::new(5000)).unwrap();
    assert!(slot.index() <= 1000);
}

#[test]
fn serde_round_trips() {
    let config = Config::new()
        .with_parallel_edges(true)
        .with_edge_kinds(EdgeKinds::Directed);
    let json = serde_json::to_string(&config).unwrap();
    let back: Config = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);

    let id = node(42);
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(serde_json::from_str::<NodeId>(&json).unwrap(), id);

    let interval = Interval::new(0.5, 2.5);
    let json = serde_json::to_string(&interval).unwrap();
    assert_eq!(serde_json::from_str::<Interval>(&json).unwrap(), interval);
}

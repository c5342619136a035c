//! Network construction tests
//!
//! Generators, distances and the edge list file format, checked through the
//! public API.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tempfile::tempdir;

use variant_core::net::{
    make_parochial_small_world, make_regular_torus, make_small_world_torus, read_edge_list_file,
    write_edge_list_file, AdjacencyMatrix, Network, NetworkKind, Resident, Topology,
    NO_CONNECTION,
};

#[derive(Debug, Clone)]
struct Node {
    age: u32,
}

impl Resident for Node {
    fn age(&self) -> u32 {
        self.age
    }

    fn status(&self) -> f64 {
        0.1
    }

    fn grow_older(&mut self) -> u32 {
        self.age += 1;
        self.age
    }
}

fn assert_symmetric_and_connected(m: &AdjacencyMatrix) {
    for i in 0..m.size() {
        assert!(!m.is_connected(i, i), "self loop at {}", i);
        assert_eq!(m.distance(i, i), NO_CONNECTION, "diagonal distance at {}", i);
        for j in 0..m.size() {
            assert_eq!(m.is_connected(i, j), m.is_connected(j, i), "asymmetric {}-{}", i, j);
            assert_eq!(m.distance(i, j), m.distance(j, i), "asymmetric distance {}-{}", i, j);
        }
    }
    assert!(m.is_fully_connected(), "unreachable pair {:?}", m.first_unreachable_pair());
}

#[test]
fn test_four_by_three_torus() {
    let m = make_regular_torus(4, 3).unwrap();
    assert_eq!(m.size(), 12);
    assert_eq!(m.neighbors(0), vec![1, 3, 4, 8]);
    assert_eq!(m.distance(0, 2), 2);
    assert_eq!(m.distance(0, 6), 3);
    assert_eq!(m.max_distance(), 3);
    assert_symmetric_and_connected(&m);
}

#[test]
fn test_generators_are_symmetric_and_connected() {
    let mut rng = SmallRng::seed_from_u64(42);
    let regular = make_regular_torus(5, 5).unwrap();
    let small = make_small_world_torus(5, 5, 0.2, 3, &mut rng).unwrap();
    let parochial = make_parochial_small_world(4, 4, 0.1, 3, 3, &mut rng).unwrap();

    assert_symmetric_and_connected(&regular);
    assert_symmetric_and_connected(&small);
    assert_symmetric_and_connected(&parochial);
    assert_eq!(parochial.size(), 48);
}

#[test]
fn test_zero_probability_keeps_torus() {
    let mut rng = SmallRng::seed_from_u64(7);
    let regular = make_regular_torus(6, 6).unwrap();
    let small = make_small_world_torus(6, 6, 0.0, 3, &mut rng).unwrap();
    assert_eq!(small, regular);
}

#[test]
fn test_same_seed_same_network() {
    let a = make_small_world_torus(6, 5, 0.25, 3, &mut SmallRng::seed_from_u64(99)).unwrap();
    let b = make_small_world_torus(6, 5, 0.25, 3, &mut SmallRng::seed_from_u64(99)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_edge_list_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("network.csv");
    let mut rng = SmallRng::seed_from_u64(3);
    let original = make_small_world_torus(5, 4, 0.2, 3, &mut rng).unwrap();

    write_edge_list_file(&original, &path).unwrap();
    let loaded = read_edge_list_file(&path).unwrap();

    let a: Network<Node> = Network::new(Topology::new(original, NetworkKind::SmallWorld));
    let b: Network<Node> = Network::new(Topology::new(loaded, NetworkKind::Undefined));
    assert!(a.is_equal_topology(&b));
    assert_eq!(a.mean_distance(), b.mean_distance());
}

#[test]
fn test_closeness_follows_distance() {
    let m = make_regular_torus(4, 3).unwrap();
    let net: Network<Node> = Network::new(Topology::new(m, NetworkKind::Regular));
    assert_eq!(net.closeness(0, 0), 1.0);
    assert!((net.closeness(0, 1) - (1.0 - 1.0 / 3.0)).abs() < 1e-12);
    assert_eq!(net.closeness(0, 6), 0.0);
    assert!(net.closeness(0, 1) > net.closeness(0, 2));
}

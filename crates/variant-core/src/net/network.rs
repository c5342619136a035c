//! Network
//!
//! A fixed topology with one agent slot per node. The topology part is
//! immutable once built; the slots change once per epoch when agents age and
//! are replaced.

use super::adjacency::{AdjacencyMatrix, NO_CONNECTION};
use super::factory::NetworkKind;
use super::selection::SpeakerSet;
use super::NetworkError;

/// What the network needs to know about the agents it holds.
pub trait Resident: Send + Sync {
    /// Epochs lived; 0 marks a newborn that may not speak yet.
    fn age(&self) -> u32;

    /// Social status, used as acceptance weight by status-based selection.
    fn status(&self) -> f64;

    /// Advances the age by one epoch and returns the new age.
    fn grow_older(&mut self) -> u32;
}

/// Adjacency plus everything derived from it once.
#[derive(Debug, Clone)]
pub struct Topology {
    matrix: AdjacencyMatrix,
    kind: NetworkKind,
    closeness: Vec<f64>,
    ranking: Vec<Vec<usize>>,
}

impl Topology {
    pub fn new(matrix: AdjacencyMatrix, kind: NetworkKind) -> Self {
        let n = matrix.size();
        let max = matrix.max_distance();

        let mut closeness = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                let d = matrix.distance(i, j);
                closeness[i * n + j] = if i == j {
                    1.0
                } else if d == NO_CONNECTION || max == 0 {
                    0.0
                } else {
                    1.0 - d as f64 / max as f64
                };
            }
        }

        // Stable sort: equally close nodes stay in id order.
        let ranking = (0..n)
            .map(|i| {
                let row = &closeness[i * n..(i + 1) * n];
                let mut others: Vec<usize> = (0..n).filter(|&j| j != i).collect();
                others.sort_by(|&a, &b| row[b].total_cmp(&row[a]));
                others
            })
            .collect();

        Self {
            matrix,
            kind,
            closeness,
            ranking,
        }
    }

    pub fn matrix(&self) -> &AdjacencyMatrix {
        &self.matrix
    }

    pub fn kind(&self) -> NetworkKind {
        self.kind
    }

    pub fn size(&self) -> usize {
        self.matrix.size()
    }

    /// `1 - distance / max_distance`; 0 for unreachable pairs.
    pub fn closeness(&self, i: usize, j: usize) -> f64 {
        let n = self.size();
        if i >= n || j >= n {
            return 0.0;
        }
        self.closeness[i * n + j]
    }

    /// All other nodes by descending closeness to `node`.
    pub fn ranking(&self, node: usize) -> &[usize] {
        self.ranking.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn distance(&self, i: usize, j: usize) -> usize {
        self.matrix.distance(i, j)
    }

    pub fn neighbors(&self, node: usize) -> Vec<usize> {
        self.matrix.neighbors(node)
    }

    pub fn is_connected(&self, i: usize, j: usize) -> bool {
        self.matrix.is_connected(i, j)
    }

    pub fn max_distance(&self) -> usize {
        self.matrix.max_distance()
    }

    pub fn mean_distance(&self) -> f64 {
        self.matrix.mean_distance()
    }
}

/// Topology plus one agent slot per node.
#[derive(Debug, Clone)]
pub struct Network<A> {
    topology: Topology,
    slots: Vec<Option<A>>,
    modifications: u64,
}

impl<A: Resident> Network<A> {
    /// A network with every slot empty.
    pub fn new(topology: Topology) -> Self {
        let slots = (0..topology.size()).map(|_| None).collect();
        Self {
            topology,
            slots,
            modifications: 0,
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn kind(&self) -> NetworkKind {
        self.topology.kind()
    }

    pub fn size(&self) -> usize {
        self.topology.size()
    }

    /// Bumped whenever the set of resident agents changes.
    pub fn modifications(&self) -> u64 {
        self.modifications
    }

    pub fn closeness(&self, i: usize, j: usize) -> f64 {
        self.topology.closeness(i, j)
    }

    pub fn distance(&self, i: usize, j: usize) -> usize {
        self.topology.distance(i, j)
    }

    pub fn neighbors(&self, node: usize) -> Vec<usize> {
        self.topology.neighbors(node)
    }

    pub fn is_connected(&self, i: usize, j: usize) -> bool {
        self.topology.is_connected(i, j)
    }

    pub fn mean_distance(&self) -> f64 {
        self.topology.mean_distance()
    }

    pub fn max_distance(&self) -> usize {
        self.topology.max_distance()
    }

    /// Same adjacency, regardless of residents and generator.
    pub fn is_equal_topology<B: Resident>(&self, other: &Network<B>) -> bool {
        self.topology.matrix() == other.topology.matrix()
    }

    /// Places one agent per node, in node order.
    pub fn set_agents(&mut self, agents: Vec<A>) -> Result<(), NetworkError> {
        if agents.len() != self.size() {
            return Err(NetworkError::AgentCountMismatch {
                expected: self.size(),
                actual: agents.len(),
            });
        }
        self.slots = agents.into_iter().map(Some).collect();
        self.modifications += 1;
        Ok(())
    }

    /// Places an agent at `node`, returning the previous resident.
    pub fn place(&mut self, node: usize, agent: A) -> Result<Option<A>, NetworkError> {
        let size = self.size();
        let slot = self
            .slots
            .get_mut(node)
            .ok_or(NetworkError::NodeOutOfRange { node, size })?;
        self.modifications += 1;
        Ok(slot.replace(agent))
    }

    pub fn agent(&self, node: usize) -> Option<&A> {
        self.slots.get(node).and_then(Option::as_ref)
    }

    pub fn agent_mut(&mut self, node: usize) -> Option<&mut A> {
        self.slots.get_mut(node).and_then(Option::as_mut)
    }

    /// Residents with their node ids, in node order.
    pub fn agents(&self) -> impl Iterator<Item = (usize, &A)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(node, slot)| slot.as_ref().map(|a| (node, a)))
    }

    pub fn slots(&self) -> &[Option<A>] {
        &self.slots
    }

    /// Read-only topology next to mutable slots, for per-listener updates
    /// that need closeness while holding their own agent exclusively.
    pub fn split_mut(&mut self) -> (&Topology, &mut [Option<A>]) {
        (&self.topology, &mut self.slots)
    }

    /// Whether `node` may be chosen as a speaker for `listener`.
    pub fn is_eligible_speaker(&self, listener: usize, node: usize) -> bool {
        node != listener && self.agent(node).is_some_and(|a| a.age() > 0)
    }

    /// Agents for a previously drawn speaker set.
    pub fn resolve(&self, set: &SpeakerSet) -> Result<Vec<&A>, NetworkError> {
        if set.stamp() != self.modifications {
            return Err(NetworkError::StaleSpeakerSet {
                stamp: set.stamp(),
                current: self.modifications,
            });
        }
        set.nodes()
            .iter()
            .map(|&node| self.agent(node).ok_or(NetworkError::EmptySlot(node)))
            .collect()
    }

    /// Ages every resident; those reaching `max_lifespan` are replaced by
    /// whatever `newborn` returns for their node. Returns the replacements.
    pub fn increment_epoch<F>(&mut self, max_lifespan: u32, mut newborn: F) -> usize
    where
        F: FnMut(usize, &A) -> A,
    {
        let mut replaced = 0;
        for (node, slot) in self.slots.iter_mut().enumerate() {
            let Some(agent) = slot.as_mut() else {
                continue;
            };
            if agent.grow_older() >= max_lifespan {
                let child = newborn(node, &*agent);
                *agent = child;
                self.modifications += 1;
                replaced += 1;
            }
        }
        if replaced > 0 {
            tracing::debug!(replaced, modifications = self.modifications, "agents replaced");
        }
        replaced
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::net::factory::make_regular_torus;

    /// Minimal resident for topology-only tests.
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) struct Dummy {
        pub id: u64,
        pub age: u32,
        pub status: f64,
    }

    impl Resident for Dummy {
        fn age(&self) -> u32 {
            self.age
        }

        fn status(&self) -> f64 {
            self.status
        }

        fn grow_older(&mut self) -> u32 {
            self.age += 1;
            self.age
        }
    }

    pub(crate) fn torus_network(cols: usize, rows: usize) -> Network<Dummy> {
        let matrix = make_regular_torus(cols, rows).unwrap();
        let mut net = Network::new(Topology::new(matrix, NetworkKind::Regular));
        let agents = (0..cols * rows)
            .map(|i| Dummy {
                id: i as u64,
                age: 1,
                status: 0.5,
            })
            .collect();
        net.set_agents(agents).unwrap();
        net
    }

    #[test]
    fn test_closeness_range() {
        let net = torus_network(4, 3);
        let max = net.max_distance();
        assert_eq!(max, 3);
        assert_eq!(net.closeness(0, 0), 1.0);
        assert!((net.closeness(0, 1) - (1.0 - 1.0 / 3.0)).abs() < 1e-12);
        assert_eq!(net.closeness(0, 6), 0.0);
    }

    #[test]
    fn test_ranking_is_descending_and_stable() {
        let net = torus_network(4, 3);
        let ranking = net.topology().ranking(0);
        assert_eq!(ranking.len(), 11);
        assert!(!ranking.contains(&0));
        assert_eq!(&ranking[..4], &[1, 3, 4, 8]);
        for pair in ranking.windows(2) {
            assert!(net.closeness(0, pair[0]) >= net.closeness(0, pair[1]));
        }
    }

    #[test]
    fn test_set_agents_count_mismatch() {
        let matrix = make_regular_torus(3, 3).unwrap();
        let mut net: Network<Dummy> = Network::new(Topology::new(matrix, NetworkKind::Regular));
        let result = net.set_agents(vec![Dummy {
            id: 0,
            age: 1,
            status: 0.0,
        }]);
        assert!(matches!(
            result,
            Err(NetworkError::AgentCountMismatch {
                expected: 9,
                actual: 1
            })
        ));
        assert_eq!(net.modifications(), 0);
    }

    #[test]
    fn test_place_out_of_range() {
        let mut net = torus_network(2, 2);
        let result = net.place(
            9,
            Dummy {
                id: 9,
                age: 0,
                status: 0.0,
            },
        );
        assert!(matches!(result, Err(NetworkError::NodeOutOfRange { node: 9, size: 4 })));
    }

    #[test]
    fn test_increment_epoch_replaces_old_agents() {
        let mut net = torus_network(2, 2);
        net.agent_mut(2).unwrap().age = 4;
        let before = net.modifications();

        let replaced = net.increment_epoch(5, |node, old| Dummy {
            id: 100 + node as u64,
            age: 0,
            status: old.status,
        });

        assert_eq!(replaced, 1);
        assert_eq!(net.modifications(), before + 1);
        assert_eq!(net.agent(2).unwrap().id, 102);
        assert_eq!(net.agent(2).unwrap().age, 0);
        assert_eq!(net.agent(0).unwrap().age, 2);
    }
}

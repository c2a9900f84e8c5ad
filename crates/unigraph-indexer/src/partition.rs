//! Hierarchical Leiden-style community detection
//!
//! ## Algorithm
//!
//! One level is partitioned by repeating three phases until no community
//! can be aggregated further:
//!
//! 1. **Local moving**: visit nodes in a seeded random order and move each to
//!    the neighbouring community with the largest modularity gain
//! 2. **Refinement**: split every community into its connected components,
//!    so no community is internally disconnected
//! 3. **Aggregation**: collapse each community into one weighted node
//!
//! Modularity of a partition is
//!
//! Q = (1/2m) * Σij[Aij - (ki*kj)/(2m)] * δ(ci, cj)
//!
//! The hierarchy is built top-down: level 0 partitions the whole graph, and
//! every community larger than the size bound is partitioned again on its
//! induced subgraph to produce its children one level deeper. Children are
//! subsets of exactly one parent by construction.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::warn;

const MAX_LOCAL_PASSES: usize = 50;
const MAX_AGGREGATIONS: usize = 32;
const MIN_GAIN: f64 = 1e-12;

/// Undirected weighted graph over dense node indices
///
/// Each adjacency map holds neighbour to weight; a self entry carries the
/// internal weight of an aggregated node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightedGraph {
    adjacency: Vec<BTreeMap<usize, f64>>,
}

impl WeightedGraph {
    /// Graph with `nodes` isolated nodes
    pub fn new(nodes: usize) -> Self {
        Self {
            adjacency: vec![BTreeMap::new(); nodes],
        }
    }

    /// Add `weight` to the undirected edge `a`-`b`; parallel edges accumulate
    /// and self-loops are ignored
    pub fn add_edge(&mut self, a: usize, b: usize, weight: f64) {
        if a == b || a >= self.adjacency.len() || b >= self.adjacency.len() {
            return;
        }
        *self.adjacency[a].entry(b).or_insert(0.0) += weight;
        *self.adjacency[b].entry(a).or_insert(0.0) += weight;
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// True when the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Weight of the edge `a`-`b`
    pub fn weight(&self, a: usize, b: usize) -> f64 {
        self.adjacency
            .get(a)
            .and_then(|n| n.get(&b))
            .copied()
            .unwrap_or(0.0)
    }

    fn degree(&self, node: usize) -> f64 {
        self.adjacency[node].values().sum()
    }

    fn total_degree(&self) -> f64 {
        (0..self.len()).map(|n| self.degree(n)).sum()
    }

    /// Subgraph induced by `members`; node `i` of the result is `members[i]`
    pub fn induced(&self, members: &[usize]) -> WeightedGraph {
        let position: HashMap<usize, usize> =
            members.iter().enumerate().map(|(i, &m)| (m, i)).collect();
        let mut sub = WeightedGraph::new(members.len());
        for (i, &member) in members.iter().enumerate() {
            for (neighbour, &weight) in &self.adjacency[member] {
                if let Some(&j) = position.get(neighbour) {
                    if i != j {
                        sub.adjacency[i].insert(j, weight);
                    }
                }
            }
        }
        sub
    }

    /// Modularity of `membership` (one community label per node)
    pub fn modularity(&self, membership: &[usize]) -> f64 {
        let two_m = self.total_degree();
        if two_m == 0.0 {
            return 0.0;
        }
        let mut internal: HashMap<usize, f64> = HashMap::new();
        let mut totals: HashMap<usize, f64> = HashMap::new();
        for node in 0..self.len() {
            let community = membership[node];
            *totals.entry(community).or_insert(0.0) += self.degree(node);
            for (&neighbour, &weight) in &self.adjacency[node] {
                if membership[neighbour] == community {
                    *internal.entry(community).or_insert(0.0) += weight;
                }
            }
        }
        totals
            .iter()
            .map(|(c, tot)| internal.get(c).copied().unwrap_or(0.0) / two_m - (tot / two_m).powi(2))
            .sum()
    }

    fn aggregate(&self, membership: &[usize], communities: usize) -> WeightedGraph {
        let mut aggregated = WeightedGraph::new(communities);
        for node in 0..self.len() {
            let from = membership[node];
            for (&neighbour, &weight) in &self.adjacency[node] {
                *aggregated.adjacency[from]
                    .entry(membership[neighbour])
                    .or_insert(0.0) += weight;
            }
        }
        aggregated
    }
}

/// Partition one level; returns a community label per node
///
/// Labels are contiguous and numbered in order of each community's lowest
/// node index, so equal inputs and seeds give equal outputs.
pub fn leiden(graph: &WeightedGraph, rng: &mut StdRng) -> Vec<usize> {
    let mut membership: Vec<usize> = (0..graph.len()).collect();
    if graph.total_degree() == 0.0 {
        return membership;
    }

    let mut current = graph.clone();
    for _ in 0..MAX_AGGREGATIONS {
        let moved = local_moving(&current, rng);
        let (refined, count) = split_disconnected(&current, &moved);
        if count == current.len() {
            break;
        }
        for label in membership.iter_mut() {
            *label = refined[*label];
        }
        current = current.aggregate(&refined, count);
    }

    renumber(&membership)
}

fn local_moving(graph: &WeightedGraph, rng: &mut StdRng) -> Vec<usize> {
    let n = graph.len();
    let two_m = graph.total_degree();
    let degrees: Vec<f64> = (0..n).map(|i| graph.degree(i)).collect();
    let mut community: Vec<usize> = (0..n).collect();
    let mut totals = degrees.clone();

    let mut order: Vec<usize> = (0..n).collect();
    for _ in 0..MAX_LOCAL_PASSES {
        order.shuffle(rng);
        let mut moved = false;

        for &node in &order {
            let current = community[node];
            let k = degrees[node];

            let mut links: BTreeMap<usize, f64> = BTreeMap::new();
            for (&neighbour, &weight) in &graph.adjacency[node] {
                if neighbour != node {
                    *links.entry(community[neighbour]).or_insert(0.0) += weight;
                }
            }

            totals[current] -= k;
            let gain = |c: usize, w: f64| w - totals[c] * k / two_m;
            let mut best = current;
            let mut best_gain = gain(current, links.get(&current).copied().unwrap_or(0.0));
            for (&candidate, &weight) in &links {
                let g = gain(candidate, weight);
                if g > best_gain + MIN_GAIN {
                    best = candidate;
                    best_gain = g;
                }
            }
            totals[best] += k;

            if best != current {
                community[node] = best;
                moved = true;
            }
        }

        if !moved {
            break;
        }
    }
    community
}

/// Split each community into connected components; returns contiguous
/// labels and their count
fn split_disconnected(graph: &WeightedGraph, community: &[usize]) -> (Vec<usize>, usize) {
    let n = graph.len();
    let mut label = vec![usize::MAX; n];
    let mut next = 0;

    for start in 0..n {
        if label[start] != usize::MAX {
            continue;
        }
        label[start] = next;
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            for &neighbour in graph.adjacency[node].keys() {
                if label[neighbour] == usize::MAX && community[neighbour] == community[start] {
                    label[neighbour] = next;
                    stack.push(neighbour);
                }
            }
        }
        next += 1;
    }
    (label, next)
}

fn renumber(labels: &[usize]) -> Vec<usize> {
    let mut mapping: HashMap<usize, usize> = HashMap::new();
    labels
        .iter()
        .map(|&l| {
            let next = mapping.len();
            *mapping.entry(l).or_insert(next)
        })
        .collect()
}

/// One community of the hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Hierarchy level, 0 for the top
    pub level: u32,
    /// Index of the parent in the cluster list
    pub parent: Option<usize>,
    /// Member node indices, ascending
    pub members: Vec<usize>,
}

/// Bounds of the hierarchical partition
#[derive(Debug, Clone, Copy)]
pub struct HierarchyBounds {
    /// Communities larger than this are split further
    pub max_cluster_size: usize,
    /// Number of levels to build at most
    pub max_levels: usize,
    /// Seed of the node visiting order
    pub seed: u64,
}

/// Build the community hierarchy of `graph`
///
/// Clusters are listed level by level; within a level, children follow
/// their parents' order and are sorted by lowest member.
pub fn hierarchical_partition(graph: &WeightedGraph, bounds: HierarchyBounds) -> Vec<Cluster> {
    let mut rng = StdRng::seed_from_u64(bounds.seed);
    let mut clusters = Vec::new();
    if graph.is_empty() || bounds.max_levels == 0 {
        return clusters;
    }

    let all: Vec<usize> = (0..graph.len()).collect();
    let top = group(&all, &leiden(graph, &mut rng));
    clusters.extend(top.into_iter().map(|members| Cluster {
        level: 0,
        parent: None,
        members,
    }));

    let mut level_start = 0;
    for level in 1..bounds.max_levels {
        let level_end = clusters.len();
        for parent in level_start..level_end {
            let members = clusters[parent].members.clone();
            if members.len() <= bounds.max_cluster_size {
                continue;
            }
            let sub = graph.induced(&members);
            let children = group(&members, &leiden(&sub, &mut rng));
            if children.len() < 2 {
                warn!(
                    "Community of {} entities at level {} exceeds max_cluster_size {} but cannot be split",
                    members.len(),
                    level - 1,
                    bounds.max_cluster_size
                );
                continue;
            }
            clusters.extend(children.into_iter().map(|members| Cluster {
                level: level as u32,
                parent: Some(parent),
                members,
            }));
        }
        if clusters.len() == level_end {
            break;
        }
        level_start = level_end;
    }
    clusters
}

/// Group `nodes` by `labels`, each group ascending, groups by lowest member
fn group(nodes: &[usize], labels: &[usize]) -> Vec<Vec<usize>> {
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        groups.entry(label).or_default().push(nodes[i]);
    }
    let mut groups: Vec<Vec<usize>> = groups
        .into_values()
        .map(|mut g| {
            g.sort_unstable();
            g
        })
        .collect();
    groups.sort_by_key(|g| g.first().copied());
    groups
}

/// Check that every level-(L+1) cluster is a subset of exactly one level-L
/// cluster, namely its parent
pub fn check_refinement(clusters: &[Cluster]) -> Result<(), String> {
    for (index, cluster) in clusters.iter().enumerate() {
        if cluster.level == 0 {
            if cluster.parent.is_some() {
                return Err(format!("top-level cluster {} has a parent", index));
            }
            continue;
        }
        let members: BTreeSet<usize> = cluster.members.iter().copied().collect();
        let containing: Vec<usize> = clusters
            .iter()
            .enumerate()
            .filter(|(_, c)| c.level + 1 == cluster.level)
            .filter(|(_, c)| {
                let parent: BTreeSet<usize> = c.members.iter().copied().collect();
                members.is_subset(&parent)
            })
            .map(|(i, _)| i)
            .collect();
        if containing.len() != 1 || cluster.parent != containing.first().copied() {
            return Err(format!(
                "cluster {} at level {} is contained in {:?}, parent {:?}",
                index, cluster.level, containing, cluster.parent
            ));
        }
    }
    Ok(())
}

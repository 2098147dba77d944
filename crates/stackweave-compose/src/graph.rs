//! Dependency graph management using `petgraph`.
//!
//! The [`GraphBuilder`] accumulates resource nodes and ordering edges during
//! a composition pass. [`GraphBuilder::finalize`] validates the result and
//! produces a [`Graph`] carrying a deterministic topological creation order.
//!
//! Edges point from producer to consumer: an edge `(a, b)` means `a` must be
//! fully materialized before creation of `b` begins.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use stackweave_common::error::{Result, StackweaveError};
use stackweave_common::types::Address;

/// A single ordering constraint between two resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// Producer, created first.
    pub from: Address,
    /// Consumer, created after `from`.
    pub to: Address,
}

/// Accumulates nodes and edges while constructs are composed.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Address>,
    index: HashMap<Address, usize>,
    edges: Vec<DependencyEdge>,
    seen_edges: HashSet<DependencyEdge>,
    constructs: BTreeMap<Address, Vec<Address>>,
    construct_log: Vec<Address>,
}

/// Builder size at a point in the pass, used to discard a failed construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    nodes: usize,
    edges: usize,
    constructs: usize,
}

impl GraphBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource node.
    ///
    /// # Errors
    ///
    /// Returns [`StackweaveError::DuplicateIdentifier`] if the address is
    /// already registered.
    pub fn add_resource(&mut self, address: &Address) -> Result<()> {
        if self.index.contains_key(address) {
            return Err(StackweaveError::DuplicateIdentifier {
                scope: address.parent().unwrap_or_else(|| address.clone()),
                id: address.logical_id().to_string(),
            });
        }
        tracing::debug!(%address, "graph node");
        let _ = self.index.insert(address.clone(), self.nodes.len());
        self.nodes.push(address.clone());
        Ok(())
    }

    /// Records that `from` must exist before `to` is created.
    ///
    /// Either endpoint may be a resource or a construct address, and may be
    /// declared later in the pass. Duplicate edges are ignored.
    pub fn add_edge(&mut self, from: Address, to: Address) {
        let edge = DependencyEdge { from, to };
        if self.seen_edges.insert(edge.clone()) {
            tracing::debug!(from = %edge.from, to = %edge.to, "graph edge");
            self.edges.push(edge);
        }
    }

    /// Records the resources contained in a construct's subtree, so the
    /// construct's address can be used as an edge endpoint.
    pub fn add_construct(&mut self, path: Address, members: Vec<Address>) {
        if self.constructs.insert(path.clone(), members).is_none() {
            self.construct_log.push(path);
        }
    }

    /// Marks the current state so later additions can be undone.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            constructs: self.construct_log.len(),
        }
    }

    /// Drops every node, edge and construct added since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        for address in self.nodes.drain(checkpoint.nodes.min(self.nodes.len())..) {
            let _ = self.index.remove(&address);
        }
        for edge in self.edges.drain(checkpoint.edges.min(self.edges.len())..) {
            let _ = self.seen_edges.remove(&edge);
        }
        let start = checkpoint.constructs.min(self.construct_log.len());
        for path in self.construct_log.drain(start..) {
            let _ = self.constructs.remove(&path);
        }
        tracing::debug!(nodes = self.nodes.len(), "graph rolled back");
    }

    /// Returns `true` if a resource is registered at `address`.
    #[must_use]
    pub fn contains(&self, address: &Address) -> bool {
        self.index.contains_key(address)
    }

    /// Number of registered resource nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Validates the accumulated graph and computes the creation order.
    ///
    /// # Errors
    ///
    /// - [`StackweaveError::DanglingReference`] if an edge names an address
    ///   that is neither a declared resource nor a composed construct.
    /// - [`StackweaveError::CyclicDependency`] if the edges form a cycle.
    pub fn finalize(self) -> Result<Graph> {
        let mut graph: DiGraph<Address, ()> =
            DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        for address in &self.nodes {
            let _ = graph.add_node(address.clone());
        }

        let mut linked = HashSet::new();
        for edge in &self.edges {
            let producers = self.expand(&edge.from, edge)?;
            let consumers = self.expand(&edge.to, edge)?;
            for &from in &producers {
                for &to in &consumers {
                    if linked.insert((from, to)) {
                        let _ = graph.add_edge(NodeIndex::new(from), NodeIndex::new(to), ());
                    }
                }
            }
        }

        if let Some(cycle) = find_cycle(&graph) {
            tracing::warn!(len = cycle.len(), "dependency cycle detected");
            return Err(StackweaveError::CyclicDependency { cycle });
        }

        let (order, stages) = layered_order(&graph);
        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            stages = stages.len(),
            "dependency graph finalized"
        );
        Ok(Graph {
            graph,
            order,
            stages,
        })
    }

    fn expand(&self, endpoint: &Address, edge: &DependencyEdge) -> Result<Vec<usize>> {
        if let Some(&idx) = self.index.get(endpoint) {
            return Ok(vec![idx]);
        }
        if let Some(members) = self.constructs.get(endpoint) {
            return Ok(members
                .iter()
                .filter_map(|m| self.index.get(m).copied())
                .collect());
        }
        Err(StackweaveError::DanglingReference {
            missing: endpoint.clone(),
            from: edge.from.clone(),
            to: edge.to.clone(),
        })
    }
}

/// Depth-first search with an explicit recursion stack.
///
/// Nodes are visited in declaration order and successors in index order, so
/// the reported cycle is stable across runs.
fn find_cycle(graph: &DiGraph<Address, ()>) -> Option<Vec<Address>> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Unvisited,
        OnStack,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; graph.node_count()];
    for start in graph.node_indices() {
        if marks[start.index()] != Mark::Unvisited {
            continue;
        }
        // Each frame holds a node and its not-yet-explored successors.
        let mut stack: Vec<(NodeIndex, Vec<NodeIndex>)> = vec![(start, successors(graph, start))];
        marks[start.index()] = Mark::OnStack;

        while let Some((node, pending)) = stack.last_mut() {
            let node = *node;
            let Some(next) = pending.pop() else {
                marks[node.index()] = Mark::Done;
                let _ = stack.pop();
                continue;
            };
            match marks[next.index()] {
                Mark::Unvisited => {
                    marks[next.index()] = Mark::OnStack;
                    stack.push((next, successors(graph, next)));
                }
                Mark::OnStack => {
                    let from = stack.iter().position(|(n, _)| *n == next).unwrap_or(0);
                    return Some(stack[from..].iter().map(|(n, _)| graph[*n].clone()).collect());
                }
                Mark::Done => {}
            }
        }
    }
    None
}

/// Successors in reverse index order, so popping visits them ascending.
fn successors(graph: &DiGraph<Address, ()>, node: NodeIndex) -> Vec<NodeIndex> {
    let mut next: Vec<NodeIndex> = graph.neighbors_directed(node, Direction::Outgoing).collect();
    next.sort_unstable_by(|a, b| b.cmp(a));
    next
}

/// Kahn's algorithm with declaration order as tie-breaker.
///
/// Also assigns each node the length of its longest incoming path, which
/// groups nodes into stages that can be created in parallel.
fn layered_order(graph: &DiGraph<Address, ()>) -> (Vec<Address>, Vec<Vec<Address>>) {
    let mut in_degree: Vec<usize> = graph
        .node_indices()
        .map(|n| graph.neighbors_directed(n, Direction::Incoming).count())
        .collect();
    let mut depth = vec![0usize; graph.node_count()];
    let mut ready: BinaryHeap<Reverse<NodeIndex>> = graph
        .node_indices()
        .filter(|n| in_degree[n.index()] == 0)
        .map(Reverse)
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());
    let mut stages: Vec<Vec<Address>> = Vec::new();
    while let Some(Reverse(node)) = ready.pop() {
        let level = depth[node.index()];
        if stages.len() <= level {
            stages.resize_with(level + 1, Vec::new);
        }
        stages[level].push(graph[node].clone());
        order.push(graph[node].clone());

        for next in graph.neighbors_directed(node, Direction::Outgoing) {
            depth[next.index()] = depth[next.index()].max(level + 1);
            in_degree[next.index()] -= 1;
            if in_degree[next.index()] == 0 {
                ready.push(Reverse(next));
            }
        }
    }
    for stage in &mut stages {
        stage.sort_by_key(|address| graph.node_indices().position(|n| graph[n] == *address));
    }
    (order, stages)
}

/// A validated, acyclic dependency graph with its creation order.
#[derive(Debug, Clone)]
pub struct Graph {
    graph: DiGraph<Address, ()>,
    order: Vec<Address>,
    stages: Vec<Vec<Address>>,
}

impl Graph {
    /// Resources in a valid creation order. Producers precede consumers;
    /// unrelated resources keep their declaration order.
    #[must_use]
    pub fn order(&self) -> &[Address] {
        &self.order
    }

    /// Groups of resources whose dependencies all lie in earlier groups.
    #[must_use]
    pub fn stages(&self) -> &[Vec<Address>] {
        &self.stages
    }

    /// All producer-to-consumer edges between resources.
    #[must_use]
    pub fn edges(&self) -> Vec<DependencyEdge> {
        let mut edges: Vec<(NodeIndex, NodeIndex)> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .collect();
        edges.sort_unstable();
        edges
            .into_iter()
            .map(|(from, to)| DependencyEdge {
                from: self.graph[from].clone(),
                to: self.graph[to].clone(),
            })
            .collect()
    }

    /// Returns `true` if an edge `from -> to` exists.
    #[must_use]
    pub fn has_edge(&self, from: &Address, to: &Address) -> bool {
        match (self.node(from), self.node(to)) {
            (Some(a), Some(b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    /// Direct producers of `address`.
    #[must_use]
    pub fn dependencies_of(&self, address: &Address) -> Vec<&Address> {
        self.neighbors(address, Direction::Incoming)
    }

    /// Direct consumers of `address`.
    #[must_use]
    pub fn dependents_of(&self, address: &Address) -> Vec<&Address> {
        self.neighbors(address, Direction::Outgoing)
    }

    /// Position of `address` in [`Graph::order`].
    #[must_use]
    pub fn position(&self, address: &Address) -> Option<usize> {
        self.order.iter().position(|a| a == address)
    }

    /// Number of resource nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns `true` if the graph holds no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Renders the graph in Graphviz DOT format.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let labelled = self.graph.map(|_, address| address.to_string(), |_, _| "");
        format!(
            "{}",
            petgraph::dot::Dot::with_config(&labelled, &[petgraph::dot::Config::EdgeNoLabel])
        )
    }

    fn node(&self, address: &Address) -> Option<NodeIndex> {
        self.graph.node_indices().find(|&n| self.graph[n] == *address)
    }

    fn neighbors(&self, address: &Address, direction: Direction) -> Vec<&Address> {
        let Some(node) = self.node(address) else {
            return Vec::new();
        };
        let mut found: Vec<NodeIndex> = self.graph.neighbors_directed(node, direction).collect();
        found.sort_unstable();
        found.into_iter().map(|n| &self.graph[n]).collect()
    }
}

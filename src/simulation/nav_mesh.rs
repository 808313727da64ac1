//! Walkable graph used by the kinematic navigator
//!
//! Standalone implementation that doesn't depend on Bevy. Nodes are anchor
//! positions (road waypoints, lot aisle points, bay entries); edges are the
//! drivable connections between them.

use ordered_float::OrderedFloat;
use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use super::types::Position;

/// Edge data for the navigation graph
#[derive(Debug, Clone, Copy)]
pub struct NavEdge {
    pub length: f32,
    pub weight: u32, // Length scaled for integer weights
}

impl NavEdge {
    fn between(start: &Position, end: &Position) -> Self {
        let length = start.distance(end);
        // Scaled by 100 to preserve precision
        let weight = (length * 100.0) as u32;
        Self {
            length,
            weight: weight.max(1),
        }
    }
}

/// Directed navigation graph
#[derive(Debug, Clone, Default)]
pub struct NavMesh {
    graph: DiGraph<Position, NavEdge>,
}

impl NavMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, reusing an existing one at the same position
    pub fn add_node(&mut self, position: Position) -> NodeIndex {
        if let Some(existing) = self
            .graph
            .node_indices()
            .find(|&n| self.graph[n].distance(&position) < 1e-3)
        {
            return existing;
        }
        self.graph.add_node(position)
    }

    /// Add a one-way connection
    pub fn add_link(&mut self, from: NodeIndex, to: NodeIndex) {
        if from == to || self.graph.find_edge(from, to).is_some() {
            return;
        }
        let edge = NavEdge::between(&self.graph[from], &self.graph[to]);
        self.graph.add_edge(from, to, edge);
    }

    /// Add a two-way connection
    pub fn connect(&mut self, a: NodeIndex, b: NodeIndex) {
        self.add_link(a, b);
        self.add_link(b, a);
    }

    /// Connect consecutive positions two-way, adding nodes as needed
    pub fn connect_chain(&mut self, positions: &[Position]) -> Vec<NodeIndex> {
        let nodes: Vec<NodeIndex> = positions.iter().map(|p| self.add_node(*p)).collect();
        for pair in nodes.windows(2) {
            self.connect(pair[0], pair[1]);
        }
        nodes
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn position(&self, node: NodeIndex) -> Option<Position> {
        self.graph.node_weight(node).copied()
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.graph.node_weights()
    }

    /// All edges as (start, end) position pairs
    pub fn segments(&self) -> impl Iterator<Item = (Position, Position)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (self.graph[e.source()], self.graph[e.target()]))
    }

    /// Find the node closest to a given position
    pub fn nearest_node(&self, position: &Position) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .min_by_key(|&n| OrderedFloat(self.graph[n].distance(position)))
    }

    /// Corner points leading from `from` to `to`, ending exactly at `to`
    ///
    /// Both ends are snapped to their nearest graph node. When the mesh is
    /// empty or the nodes are disconnected the result is a straight line.
    pub fn find_path(&self, from: &Position, to: &Position) -> Vec<Position> {
        let (Some(start), Some(goal)) = (self.nearest_node(from), self.nearest_node(to)) else {
            return vec![*to];
        };

        let result = astar(
            &self.graph,
            start,
            |node| node == goal,
            |edge| edge.weight().weight,
            |_| 0, // Null heuristic = Dijkstra
        );

        let mut corners: Vec<Position> = match result {
            Some((_, node_path)) => node_path.iter().map(|&n| self.graph[n]).collect(),
            None => {
                log::debug!("No mesh path from {:?} to {:?}; driving straight", from, to);
                Vec::new()
            }
        };
        corners.push(*to);

        // Drop corners we are already standing on and consecutive duplicates
        let mut path: Vec<Position> = Vec::with_capacity(corners.len());
        let mut last = *from;
        for corner in corners {
            if corner.distance(&last) > 1e-3 {
                path.push(corner);
                last = corner;
            }
        }
        if path.is_empty() {
            path.push(*to);
        }
        path
    }
}

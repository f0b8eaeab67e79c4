// Copyright (c) ONNX Project Contributors
// SPDX-License-Identifier: Apache-2.0

//! Symbol table: the name-to-entity index of the analyzer.
//!
//! Node and tensor symbols live in two arena vectors and refer to each
//! other through [`NodeId`]/[`TensorId`] handles, so the producer/user
//! links may form reference cycles without any ownership cycle. One
//! shared name index covers both kinds: a name can never refer to both
//! a node and a tensor.
//!
//! The table also owns the computed data-flow structure: forward and
//! reverse adjacency over nodes, the topological order, and the cycle
//! flag.

use crate::enums::ElemType;
use crate::token::Pos;
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::collections::HashMap;
use tracing::debug;

/// Handle of a node symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

/// Handle of a tensor symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TensorId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TensorId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolId {
    Node(NodeId),
    Tensor(TensorId),
}

/// An operator instance.
#[derive(Debug)]
pub struct NodeSymbol {
    pub name: String,
    pub op_type: String,
    pub inputs: SmallVec<[TensorId; 4]>,
    pub outputs: SmallVec<[TensorId; 2]>,
    /// Preformatted `name=value, ...` text for emission; `None` when
    /// the node has no attributes.
    pub attr_sig: Option<String>,
    pub pos: Pos,
    /// All inputs are initializers; set by the graph analyzer.
    pub fold_candidate: bool,
    /// Unreachable from every model output; set by the graph analyzer.
    pub dead: bool,
    /// Shares an operation signature with another node; set by the
    /// graph analyzer.
    pub cse_candidate: bool,
}

/// A tensor. Created either fully defined (inputs, outputs,
/// initializers) or as an `Undefined` placeholder that a later step
/// fills in.
#[derive(Debug)]
pub struct TensorSymbol {
    pub name: String,
    pub elem_type: ElemType,
    pub producer: Option<NodeId>,
    pub users: SmallVec<[NodeId; 4]>,
    pub is_initializer: bool,
    pub is_model_input: bool,
    pub is_model_output: bool,
    /// Preformatted dimension list, e.g. `[1, "batch"]`.
    pub shape: Option<String>,
    /// Lowercase hex of the constant payload (initializers only).
    pub raw_data: Option<String>,
    pub dead: bool,
    pub pos: Pos,
}

/// The table proper.
#[derive(Debug, Default)]
pub struct SymbolTable {
    nodes: Vec<NodeSymbol>,
    tensors: Vec<TensorSymbol>,
    index: IndexMap<String, SymbolId>,
    edges: HashMap<NodeId, Vec<NodeId>>,
    reverse_edges: HashMap<NodeId, Vec<NodeId>>,
    order: Vec<NodeId>,
    has_cycle: bool,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node symbol. Returns `None` when the name is already
    /// taken (by either kind).
    pub fn insert_node(&mut self, name: &str, op_type: &str, pos: Pos) -> Option<NodeId> {
        if self.index.contains_key(name) {
            return None;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeSymbol {
            name: name.to_string(),
            op_type: op_type.to_string(),
            inputs: SmallVec::new(),
            outputs: SmallVec::new(),
            attr_sig: None,
            pos,
            fold_candidate: false,
            dead: false,
            cse_candidate: false,
        });
        self.index.insert(name.to_string(), SymbolId::Node(id));
        Some(id)
    }

    /// Inserts a tensor symbol. Returns `None` when the name is already
    /// taken (by either kind).
    pub fn insert_tensor(&mut self, name: &str, elem_type: ElemType, pos: Pos) -> Option<TensorId> {
        if self.index.contains_key(name) {
            return None;
        }
        let id = TensorId(self.tensors.len() as u32);
        self.tensors.push(TensorSymbol {
            name: name.to_string(),
            elem_type,
            producer: None,
            users: SmallVec::new(),
            is_initializer: false,
            is_model_input: false,
            is_model_output: false,
            shape: None,
            raw_data: None,
            dead: false,
            pos,
        });
        self.index.insert(name.to_string(), SymbolId::Tensor(id));
        Some(id)
    }

    /// Looks a name up regardless of kind.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.index.get(name).copied()
    }

    pub fn get_node(&self, name: &str) -> Option<NodeId> {
        match self.lookup(name)? {
            SymbolId::Node(id) => Some(id),
            SymbolId::Tensor(_) => None,
        }
    }

    pub fn get_tensor(&self, name: &str) -> Option<TensorId> {
        match self.lookup(name)? {
            SymbolId::Tensor(id) => Some(id),
            SymbolId::Node(_) => None,
        }
    }

    pub fn node(&self, id: NodeId) -> &NodeSymbol {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut NodeSymbol {
        &mut self.nodes[id.index()]
    }

    pub fn tensor(&self, id: TensorId) -> &TensorSymbol {
        &self.tensors[id.index()]
    }

    pub fn tensor_mut(&mut self, id: TensorId) -> &mut TensorSymbol {
        &mut self.tensors[id.index()]
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_tensors(&self) -> usize {
        self.tensors.len()
    }

    /// Node handles in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Tensor handles in insertion order.
    pub fn tensor_ids(&self) -> impl Iterator<Item = TensorId> {
        (0..self.tensors.len() as u32).map(TensorId)
    }

    /// Links a tensor as the next input of a node and the node as a
    /// user of the tensor. Both handles must be valid.
    pub fn add_input(&mut self, node: NodeId, tensor: TensorId) {
        self.nodes[node.index()].inputs.push(tensor);
        self.tensors[tensor.index()].users.push(node);
    }

    /// Links a tensor as the next output of a node and the node as the
    /// tensor's producer. The caller has verified the tensor has no
    /// producer yet.
    pub fn add_output(&mut self, node: NodeId, tensor: TensorId) {
        self.nodes[node.index()].outputs.push(tensor);
        self.tensors[tensor.index()].producer = Some(node);
    }

    /// Builds the producer→consumer adjacency (and its reverse) from
    /// the linked symbols. Source tensors (inputs, initializers)
    /// contribute no edge.
    pub fn build_dag(&mut self) {
        self.edges.clear();
        self.reverse_edges.clear();
        for consumer in self.node_ids() {
            for input in self.nodes[consumer.index()].inputs.clone() {
                if let Some(producer) = self.tensors[input.index()].producer {
                    self.edges.entry(producer).or_default().push(consumer);
                    self.reverse_edges
                        .entry(consumer)
                        .or_default()
                        .push(producer);
                }
            }
        }
        debug!(
            nodes = self.nodes.len(),
            edges = self.edges.values().map(Vec::len).sum::<usize>(),
            "data-flow graph built"
        );
    }

    /// Successors (consumers) of a node in the forward adjacency.
    pub fn successors(&self, id: NodeId) -> &[NodeId] {
        self.edges.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Predecessors (producers) of a node in the reverse adjacency.
    pub fn predecessors(&self, id: NodeId) -> &[NodeId] {
        self.reverse_edges.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Depth-first topological sort with cycle detection. On success
    /// `order()` holds every node, producers before consumers; on a
    /// cycle the order is cleared and `has_cycle()` reports true.
    pub fn topo_sort(&mut self) {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            White,
            Gray,
            Black,
        }

        self.order.clear();
        self.has_cycle = false;
        let mut marks = vec![Mark::White; self.nodes.len()];
        let mut postorder: Vec<NodeId> = Vec::with_capacity(self.nodes.len());

        for start in self.node_ids() {
            if marks[start.index()] != Mark::White {
                continue;
            }
            marks[start.index()] = Mark::Gray;
            let mut stack: Vec<(NodeId, usize)> = vec![(start, 0)];
            while let Some((node, next_child)) = stack.last_mut() {
                let node = *node;
                let succs = self.edges.get(&node).map(Vec::as_slice).unwrap_or(&[]);
                if *next_child < succs.len() {
                    let child = succs[*next_child];
                    *next_child += 1;
                    match marks[child.index()] {
                        // A gray successor means we re-entered the
                        // active path: back-edge.
                        Mark::Gray => {
                            debug!(node = %self.nodes[child.index()].name, "cycle detected");
                            self.has_cycle = true;
                            self.order.clear();
                            return;
                        }
                        Mark::White => {
                            marks[child.index()] = Mark::Gray;
                            stack.push((child, 0));
                        }
                        Mark::Black => {}
                    }
                } else {
                    marks[node.index()] = Mark::Black;
                    postorder.push(node);
                    stack.pop();
                }
            }
        }

        postorder.reverse();
        self.order = postorder;
        debug!(order = self.order.len(), "topological sort complete");
    }

    /// The topological order; empty when a cycle was found (or before
    /// `topo_sort` ran).
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn has_cycle(&self) -> bool {
        self.has_cycle
    }
}

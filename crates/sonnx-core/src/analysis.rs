// Copyright (c) ONNX Project Contributors
// SPDX-License-Identifier: Apache-2.0

//! Graph-level analyses over the populated symbol table.
//!
//! Runs after a clean semantic pass: builds the producer→consumer
//! adjacency, orders the nodes topologically (cycles abort with a
//! diagnostic), then marks three kinds of optimization candidates.
//! The detectors set flags on the symbols and never change the graph;
//! acting on the marks is a downstream concern.

use crate::error::SemanticError;
use crate::symtab::{NodeId, SymbolTable, TensorId};
use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Drives edge construction, the topological sort, and the candidate
/// detectors. A cycle clears the order and surfaces as the single
/// graph diagnostic.
pub fn run(table: &mut SymbolTable) -> Result<(), SemanticError> {
    table.build_dag();
    table.topo_sort();
    if table.has_cycle() {
        return Err(SemanticError::Cycle);
    }
    mark_folding_candidates(table);
    mark_dead_code(table);
    mark_cse_candidates(table);
    Ok(())
}

/// A node whose inputs are all initializers could be evaluated at
/// compile time. Nodes without inputs do not qualify.
fn mark_folding_candidates(table: &mut SymbolTable) {
    let mut marked = 0usize;
    for node_id in table.order().to_vec() {
        let inputs = table.node(node_id).inputs.clone();
        let foldable =
            !inputs.is_empty() && inputs.iter().all(|t| table.tensor(*t).is_initializer);
        if foldable {
            table.node_mut(node_id).fold_candidate = true;
            marked += 1;
        }
    }
    debug!(marked, "constant-folding candidates");
}

/// Reverse reachability from the model outputs. Anything the walk
/// never touches is dead.
fn mark_dead_code(table: &mut SymbolTable) {
    let mut live_tensors: HashSet<TensorId> = HashSet::new();
    let mut live_nodes: HashSet<NodeId> = HashSet::new();
    let mut queue: VecDeque<TensorId> = VecDeque::new();

    for tensor_id in table.tensor_ids() {
        if table.tensor(tensor_id).is_model_output {
            live_tensors.insert(tensor_id);
            queue.push_back(tensor_id);
        }
    }

    while let Some(tensor_id) = queue.pop_front() {
        let Some(producer) = table.tensor(tensor_id).producer else {
            continue;
        };
        if live_nodes.insert(producer) {
            for input in table.node(producer).inputs.clone() {
                if live_tensors.insert(input) {
                    queue.push_back(input);
                }
            }
        }
    }

    let mut dead = 0usize;
    for node_id in table.node_ids().collect::<Vec<_>>() {
        if !live_nodes.contains(&node_id) {
            table.node_mut(node_id).dead = true;
            dead += 1;
        }
    }
    for tensor_id in table.tensor_ids().collect::<Vec<_>>() {
        if !live_tensors.contains(&tensor_id) {
            table.tensor_mut(tensor_id).dead = true;
        }
    }
    debug!(dead, "dead nodes");
}

/// Groups nodes by `<op_type>:<input>,<input>,...,` signatures; every
/// group with more than one member is a common-subexpression
/// candidate.
fn mark_cse_candidates(table: &mut SymbolTable) {
    let mut groups: IndexMap<String, Vec<NodeId>> = IndexMap::new();
    for node_id in table.order().to_vec() {
        let node = table.node(node_id);
        let mut signature = format!("{}:", node.op_type);
        for input in &node.inputs {
            signature.push_str(&table.tensor(*input).name);
            signature.push(',');
        }
        groups.entry(signature).or_default().push(node_id);
    }

    for (signature, members) in groups {
        if members.len() > 1 {
            debug!(%signature, count = members.len(), "CSE candidate group");
            for node_id in members {
                table.node_mut(node_id).cse_candidate = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze;
    use crate::lexer::lex;
    use crate::parser::parse;

    fn analyzed_table(graph_body: &str) -> SymbolTable {
        let source = format!(
            r#"MODEL {{
                 IR_VERSION: 7
                 PRODUCER_NAME: "test"
                 PRODUCER_VERSION: "0.1"
                 DOMAIN: "ai.test"
                 MODEL_VERSION: 1
                 DOC_STRING: ""
                 GRAPH {{ {graph_body} }}
                 OPSET {{ DOMAIN: "" VERSION: 13 }}
               }}"#
        );
        let model = parse(lex(&source).expect("lexes")).expect("parses");
        let analysis = analyze(&model);
        assert_eq!(analysis.errors, vec![], "semantic phase must be clean");
        analysis.table
    }

    #[test]
    fn test_folding_candidates() {
        let mut table = analyzed_table(
            r#"NAME: "g"
               NODE_LIST {
                 NODE { OP_TYPE: "Add" NAME: "const_add" INPUT: ["w1", "w2"] OUTPUT: ["s"] }
                 NODE { OP_TYPE: "Mul" NAME: "live_mul" INPUT: ["x", "s"] OUTPUT: ["y"] }
               }
               INPUT_LIST { INPUT { NAME: "x" TYPE: FLOAT SHAPE: [1] } }
               OUTPUT_LIST { OUTPUT { NAME: "y" TYPE: FLOAT SHAPE: [1] } }
               INITIALIZER_LIST {
                 INITIALIZER { NAME: "w1" TYPE: FLOAT DIMS: [1] RAW_DATA: 00000000# }
                 INITIALIZER { NAME: "w2" TYPE: FLOAT DIMS: [1] RAW_DATA: 3F800000# }
               }"#,
        );
        run(&mut table).unwrap();

        let const_add = table.get_node("const_add").unwrap();
        let live_mul = table.get_node("live_mul").unwrap();
        assert!(table.node(const_add).fold_candidate);
        assert!(!table.node(live_mul).fold_candidate);
    }

    #[test]
    fn test_dead_code_marking() {
        let mut table = analyzed_table(
            r#"NAME: "g"
               NODE_LIST {
                 NODE { OP_TYPE: "Relu" NAME: "live" INPUT: ["x"] OUTPUT: ["y"] }
                 NODE { OP_TYPE: "Relu" NAME: "orphan" INPUT: ["x"] OUTPUT: ["unused"] }
               }
               INPUT_LIST { INPUT { NAME: "x" TYPE: FLOAT SHAPE: [1] } }
               OUTPUT_LIST { OUTPUT { NAME: "y" TYPE: FLOAT SHAPE: [1] } }"#,
        );
        run(&mut table).unwrap();

        assert!(!table.node(table.get_node("live").unwrap()).dead);
        assert!(table.node(table.get_node("orphan").unwrap()).dead);
        assert!(table.tensor(table.get_tensor("unused").unwrap()).dead);
        assert!(!table.tensor(table.get_tensor("x").unwrap()).dead);
        assert!(!table.tensor(table.get_tensor("y").unwrap()).dead);
    }

    #[test]
    fn test_cse_candidates() {
        let mut table = analyzed_table(
            r#"NAME: "g"
               NODE_LIST {
                 NODE { OP_TYPE: "Add" NAME: "a1" INPUT: ["x", "x"] OUTPUT: ["s1"] }
                 NODE { OP_TYPE: "Add" NAME: "a2" INPUT: ["x", "x"] OUTPUT: ["s2"] }
                 NODE { OP_TYPE: "Mul" NAME: "m" INPUT: ["s1", "s2"] OUTPUT: ["y"] }
               }
               INPUT_LIST { INPUT { NAME: "x" TYPE: FLOAT SHAPE: [1] } }
               OUTPUT_LIST { OUTPUT { NAME: "y" TYPE: FLOAT SHAPE: [1] } }"#,
        );
        run(&mut table).unwrap();

        assert!(table.node(table.get_node("a1").unwrap()).cse_candidate);
        assert!(table.node(table.get_node("a2").unwrap()).cse_candidate);
        assert!(!table.node(table.get_node("m").unwrap()).cse_candidate);
    }

    #[test]
    fn test_cycle_surfaces_single_diagnostic() {
        let mut table = analyzed_table(
            r#"NAME: "g"
               NODE_LIST {
                 NODE { OP_TYPE: "F" NAME: "a" INPUT: ["tb"] OUTPUT: ["ta"] }
                 NODE { OP_TYPE: "G" NAME: "b" INPUT: ["ta"] OUTPUT: ["tb"] }
               }
               INPUT_LIST { }
               OUTPUT_LIST { OUTPUT { NAME: "ta" TYPE: FLOAT SHAPE: [1] } }"#,
        );
        assert_eq!(run(&mut table), Err(SemanticError::Cycle));
        assert!(table.has_cycle());
        assert!(table.order().is_empty());
    }

    #[test]
    fn test_topological_order_length_matches_node_count() {
        let mut table = analyzed_table(
            r#"NAME: "g"
               NODE_LIST {
                 NODE { OP_TYPE: "Relu" NAME: "n1" INPUT: ["x"] OUTPUT: ["a"] }
                 NODE { OP_TYPE: "Relu" NAME: "n2" INPUT: ["a"] OUTPUT: ["y"] }
               }
               INPUT_LIST { INPUT { NAME: "x" TYPE: FLOAT SHAPE: [1] } }
               OUTPUT_LIST { OUTPUT { NAME: "y" TYPE: FLOAT SHAPE: [1] } }"#,
        );
        run(&mut table).unwrap();
        assert_eq!(table.order().len(), table.num_nodes());
    }
}

// Copyright (c) ONNX Project Contributors
// SPDX-License-Identifier: Apache-2.0

//! Two-pass semantic analysis: name binding, edge linking, and the
//! consistency checks behind the symbol-table invariants.
//!
//! Pass 1 registers every operator node and gathers its referenced
//! input/output names as pending work. Pass 2 defines tensors in a
//! fixed order (initializers, model inputs, model outputs, then node
//! linking), runs the per-node type-consistency check, and finishes
//! with the completeness check over placeholders.
//!
//! Diagnostics are collected, not thrown: analysis continues past
//! every recoverable error so a single run reports as much as it can.
//! An input name that resolves to nothing becomes an `Undefined`,
//! producer-less placeholder; if no later node output claims it, the
//! completeness check reports the reference as undefined.

use crate::ast::{Attribute, InitTensor, IoSpec, Literal, Model, NodeDecl};
use crate::enums::ElemType;
use crate::error::{SemanticError, TensorRole};
use crate::literal::encode_hex;
use crate::symtab::{NodeId, SymbolId, SymbolTable, TensorId};
use tracing::debug;

/// Result of semantic analysis. The table is fully linked even when
/// diagnostics were raised (best effort); callers must treat a
/// non-empty error list as fatal for emission.
#[derive(Debug)]
pub struct Analysis {
    pub table: SymbolTable,
    pub errors: Vec<SemanticError>,
}

/// Runs both passes over a model AST.
pub fn analyze(model: &Model) -> Analysis {
    let mut analyzer = SemanticAnalyzer::new(model);
    analyzer.declare_nodes();
    analyzer.define_and_link();
    debug!(
        nodes = analyzer.table.num_nodes(),
        tensors = analyzer.table.num_tensors(),
        errors = analyzer.errors.len(),
        "semantic analysis finished"
    );
    Analysis {
        table: analyzer.table,
        errors: analyzer.errors,
    }
}

/// An output reference gathered in pass 1. Rich (typed) specifiers
/// carry their declared type and shape into the tensor they create.
struct PendingOutput {
    name: String,
    declared_type: Option<ElemType>,
    shape: Option<String>,
}

/// One node's unresolved references between the passes.
struct PendingNode {
    id: NodeId,
    inputs: Vec<String>,
    outputs: Vec<PendingOutput>,
}

struct SemanticAnalyzer<'a> {
    model: &'a Model,
    table: SymbolTable,
    errors: Vec<SemanticError>,
    pending: Vec<PendingNode>,
    /// Input references that had to create a placeholder; re-checked
    /// by the completeness step.
    unresolved: Vec<(NodeId, String)>,
}

impl<'a> SemanticAnalyzer<'a> {
    fn new(model: &'a Model) -> Self {
        Self {
            model,
            table: SymbolTable::new(),
            errors: Vec::new(),
            pending: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    fn report(&mut self, error: SemanticError) {
        self.errors.push(error);
    }

    // ---- Pass 1: declarations ------------------------------------

    fn declare_nodes(&mut self) {
        let model = self.model;
        for decl in &model.graph.nodes {
            self.declare_node(decl);
        }
        debug!(declared = self.pending.len(), "declaration pass done");
    }

    fn declare_node(&mut self, decl: &NodeDecl) {
        // Error literals in place of the name or operator leave
        // nothing to bind; skip the node silently.
        let (Some(name), Some(op_type)) = (decl.name.as_str(), decl.op_type.as_str()) else {
            return;
        };
        let Some(id) = self.table.insert_node(name, op_type, decl.pos) else {
            self.report(SemanticError::DuplicateNode(name.to_string()));
            return;
        };
        self.table.node_mut(id).attr_sig = attribute_signature(decl.attributes.as_deref());

        let inputs = referenced_input_names(&decl.inputs);
        let outputs = referenced_outputs(&decl.outputs);
        self.pending.push(PendingNode {
            id,
            inputs,
            outputs,
        });
    }

    // ---- Pass 2: definitions and linking -------------------------

    fn define_and_link(&mut self) {
        self.define_initializers();
        self.define_model_inputs();
        self.define_model_outputs();
        let pending = std::mem::take(&mut self.pending);
        for node in &pending {
            self.link_node(node);
        }
        self.check_type_consistency();
        self.check_completeness();
    }

    fn define_initializers(&mut self) {
        let model = self.model;
        let Some(initializers) = &model.graph.initializers else {
            return;
        };
        for init in initializers {
            self.define_initializer(init);
        }
    }

    fn define_initializer(&mut self, init: &InitTensor) {
        let Some(name) = init.name.as_str() else {
            return;
        };
        let elem_type = init.elem_type.as_type().unwrap_or(ElemType::Undefined);
        match self.table.lookup(name) {
            None => {
                let id = self
                    .table
                    .insert_tensor(name, elem_type, init.pos)
                    .expect("name was free");
                let tensor = self.table.tensor_mut(id);
                tensor.is_initializer = true;
                tensor.shape = Some(format_shape(&init.dims));
                tensor.raw_data = Some(encode_hex(init.raw_data.as_bytes().unwrap_or(&[])));
            }
            Some(SymbolId::Tensor(_)) => {
                self.report(SemanticError::DuplicateInitializer(name.to_string()));
            }
            Some(SymbolId::Node(_)) => {
                self.report(SemanticError::TensorNameClash(name.to_string()));
            }
        }
    }

    fn define_model_inputs(&mut self) {
        let model = self.model;
        for io in &model.graph.inputs {
            let Some(name) = io.name.as_str() else {
                continue;
            };
            match self.table.lookup(name) {
                None => {
                    let elem_type = io.elem_type.as_type().unwrap_or(ElemType::Undefined);
                    let id = self
                        .table
                        .insert_tensor(name, elem_type, io.pos)
                        .expect("name was free");
                    let tensor = self.table.tensor_mut(id);
                    tensor.is_model_input = true;
                    tensor.shape = Some(format_shape(&io.shape));
                }
                Some(SymbolId::Tensor(id)) => {
                    if self.table.tensor(id).is_model_input {
                        self.report(SemanticError::DuplicateInput(name.to_string()));
                    } else {
                        // An initializer that shadows a model input:
                        // the only legal dual role. Only the role flag
                        // is updated.
                        self.table.tensor_mut(id).is_model_input = true;
                    }
                }
                Some(SymbolId::Node(_)) => {
                    self.report(SemanticError::TensorNameClash(name.to_string()));
                }
            }
        }
    }

    fn define_model_outputs(&mut self) {
        let model = self.model;
        for io in &model.graph.outputs {
            let Some(name) = io.name.as_str() else {
                continue;
            };
            match self.table.lookup(name) {
                None => {
                    let elem_type = io.elem_type.as_type().unwrap_or(ElemType::Undefined);
                    let id = self
                        .table
                        .insert_tensor(name, elem_type, io.pos)
                        .expect("name was free");
                    let tensor = self.table.tensor_mut(id);
                    tensor.is_model_output = true;
                    tensor.shape = Some(format_shape(&io.shape));
                }
                Some(SymbolId::Tensor(id)) => {
                    let tensor = self.table.tensor(id);
                    if tensor.is_model_output {
                        self.report(SemanticError::DuplicateOutput(name.to_string()));
                    } else if tensor.is_model_input {
                        self.report(SemanticError::OutputAliasesInput(name.to_string()));
                    } else if tensor.is_initializer {
                        self.report(SemanticError::OutputAliasesInitializer(name.to_string()));
                    } else {
                        self.table.tensor_mut(id).is_model_output = true;
                    }
                }
                Some(SymbolId::Node(_)) => {
                    self.report(SemanticError::TensorNameClash(name.to_string()));
                }
            }
        }
    }

    fn link_node(&mut self, node: &PendingNode) {
        let node_name = self.table.node(node.id).name.clone();

        // A name on both sides of one node would be a self-loop.
        let output_names: Vec<&str> = node
            .outputs
            .iter()
            .map(|o| o.name.as_str())
            .filter(|n| !n.is_empty())
            .collect();

        for input_name in &node.inputs {
            if output_names.contains(&input_name.as_str()) {
                self.report(SemanticError::SelfLoop {
                    node: node_name.clone(),
                    tensor: input_name.clone(),
                });
                continue;
            }
            match self.table.lookup(input_name) {
                Some(SymbolId::Tensor(id)) => self.table.add_input(node.id, id),
                None => {
                    // Possibly produced by a node we have not linked
                    // yet; the completeness check settles it.
                    let pos = self.table.node(node.id).pos;
                    let id = self
                        .table
                        .insert_tensor(input_name, ElemType::Undefined, pos)
                        .expect("name was free");
                    self.table.add_input(node.id, id);
                    self.unresolved.push((node.id, input_name.clone()));
                }
                Some(SymbolId::Node(_)) => {
                    self.report(SemanticError::UndefinedInput {
                        node: node_name.clone(),
                        tensor: input_name.clone(),
                    });
                }
            }
        }

        for output in &node.outputs {
            if output.name.is_empty() {
                self.report(SemanticError::EmptyOutputName(node_name.clone()));
                continue;
            }
            match self.table.lookup(&output.name) {
                Some(SymbolId::Tensor(id)) => {
                    let tensor = self.table.tensor(id);
                    if let Some(producer) = tensor.producer {
                        let producer = self.table.node(producer).name.clone();
                        self.report(SemanticError::ProducerConflict {
                            tensor: output.name.clone(),
                            producer,
                        });
                        continue;
                    }
                    if tensor.is_model_input {
                        self.report(SemanticError::OutputIsModelInput {
                            node: node_name.clone(),
                            tensor: output.name.clone(),
                        });
                        continue;
                    }
                    if tensor.is_initializer {
                        self.report(SemanticError::OutputIsInitializer {
                            node: node_name.clone(),
                            tensor: output.name.clone(),
                        });
                        continue;
                    }
                    let tensor = self.table.tensor_mut(id);
                    if tensor.elem_type == ElemType::Undefined {
                        if let Some(declared) = output.declared_type {
                            tensor.elem_type = declared;
                        }
                    }
                    if tensor.shape.is_none() {
                        tensor.shape = output.shape.clone();
                    }
                    self.table.add_output(node.id, id);
                }
                None => {
                    let elem_type = output.declared_type.unwrap_or(ElemType::Undefined);
                    let pos = self.table.node(node.id).pos;
                    let id = self
                        .table
                        .insert_tensor(&output.name, elem_type, pos)
                        .expect("name was free");
                    self.table.tensor_mut(id).shape = output.shape.clone();
                    self.table.add_output(node.id, id);
                }
                Some(SymbolId::Node(_)) => {
                    self.report(SemanticError::TensorNameClash(output.name.clone()));
                }
            }
        }
    }

    /// All defined element types across a node's inputs and outputs
    /// must agree; placeholders then inherit the agreed type.
    fn check_type_consistency(&mut self) {
        for node_id in self.table.node_ids().collect::<Vec<_>>() {
            let members: Vec<(TensorRole, TensorId)> = {
                let node = self.table.node(node_id);
                node.inputs
                    .iter()
                    .map(|t| (TensorRole::Input, *t))
                    .chain(node.outputs.iter().map(|t| (TensorRole::Output, *t)))
                    .collect()
            };

            let mut expected: Option<ElemType> = None;
            for (role, tensor_id) in &members {
                let ty = self.table.tensor(*tensor_id).elem_type;
                if !ty.is_defined() {
                    continue;
                }
                match expected {
                    None => expected = Some(ty),
                    Some(agreed) if agreed != ty => {
                        let (node_name, op_type) = {
                            let node = self.table.node(node_id);
                            (node.name.clone(), node.op_type.clone())
                        };
                        let tensor_name = self.table.tensor(*tensor_id).name.clone();
                        self.report(SemanticError::TypeMismatch {
                            node: node_name,
                            op_type,
                            role: *role,
                            tensor: tensor_name,
                            found: ty,
                            expected: agreed,
                        });
                        break;
                    }
                    Some(_) => {}
                }
            }

            if let Some(agreed) = expected {
                for (_, tensor_id) in &members {
                    let tensor = self.table.tensor_mut(*tensor_id);
                    if tensor.elem_type == ElemType::Undefined {
                        tensor.elem_type = agreed;
                    }
                }
            }
        }
    }

    /// Every placeholder created for an input reference must have
    /// found a producer or a source role; every model output must be
    /// produced or come from a source.
    fn check_completeness(&mut self) {
        let unresolved = std::mem::take(&mut self.unresolved);
        for (node_id, tensor_name) in unresolved {
            let Some(tensor_id) = self.table.get_tensor(&tensor_name) else {
                continue;
            };
            let tensor = self.table.tensor(tensor_id);
            if tensor.producer.is_none() && !tensor.is_model_input && !tensor.is_initializer {
                self.report(SemanticError::UndefinedInput {
                    node: self.table.node(node_id).name.clone(),
                    tensor: tensor_name,
                });
            }
        }

        for tensor_id in self.table.tensor_ids().collect::<Vec<_>>() {
            let tensor = self.table.tensor(tensor_id);
            if tensor.is_model_output
                && tensor.producer.is_none()
                && !tensor.is_model_input
                && !tensor.is_initializer
            {
                self.report(SemanticError::UnproducedOutput(tensor.name.clone()));
            }
        }
    }
}

/// Input references of a node, in order. Empty names denote an absent
/// optional input and are skipped silently; `Error` literals are
/// skipped as well.
fn referenced_input_names(spec: &IoSpec) -> Vec<String> {
    match spec {
        IoSpec::Names(names) => names
            .iter()
            .filter_map(|n| n.as_str())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect(),
        IoSpec::Typed(tensors) => tensors
            .iter()
            .filter_map(|t| t.name.as_str())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

/// Output references of a node. Empty names are kept: an empty output
/// name is a diagnostic, not an absence.
fn referenced_outputs(spec: &IoSpec) -> Vec<PendingOutput> {
    match spec {
        IoSpec::Names(names) => names
            .iter()
            .filter_map(|n| n.as_str())
            .map(|name| PendingOutput {
                name: name.to_string(),
                declared_type: None,
                shape: None,
            })
            .collect(),
        IoSpec::Typed(tensors) => tensors
            .iter()
            .filter(|t| !t.name.is_error())
            .map(|t| PendingOutput {
                name: t.name.as_str().unwrap_or_default().to_string(),
                declared_type: t.elem_type.as_type(),
                shape: Some(format_shape(&t.shape)),
            })
            .collect(),
    }
}

/// Renders a dimension list the way the IR prints shapes:
/// `[1, 3]`, symbolic entries quoted (`[1, "batch"]`).
fn format_shape(dims: &[Literal]) -> String {
    let mut parts = Vec::with_capacity(dims.len());
    for dim in dims {
        match dim {
            Literal::U32(v) => parts.push(v.to_string()),
            Literal::U64(v) => parts.push(v.to_string()),
            Literal::Str(s) => parts.push(format!("\"{s}\"")),
            _ => {}
        }
    }
    format!("[{}]", parts.join(", "))
}

/// Renders the attribute list as the emitter's trailing operand text.
/// `None` when there is no list or nothing in it survives.
fn attribute_signature(attributes: Option<&[Attribute]>) -> Option<String> {
    let attributes = attributes?;
    let mut parts = Vec::with_capacity(attributes.len());
    for attr in attributes {
        let Some(name) = attr.name.as_str() else {
            continue;
        };
        let value = match &attr.value {
            Literal::U32(v) => v.to_string(),
            Literal::U64(v) => v.to_string(),
            Literal::Str(s) => format!("\"{s}\""),
            Literal::Bytes(b) => format!("0x{}", encode_hex(b)),
            Literal::Type(t) => t.name().to_string(),
            Literal::Error => continue,
        };
        parts.push(format!("{name}={value}"));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

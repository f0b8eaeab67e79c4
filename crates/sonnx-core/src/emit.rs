// Copyright (c) ONNX Project Contributors
// SPDX-License-Identifier: Apache-2.0

//! Three-address IR emission.
//!
//! Walks the topologically ordered graph and prints one statement per
//! line. Every tensor receives a synthetic `T{n}` name on first
//! emission from a monotonic counter; the original→synthetic mapping
//! is kept for the lifetime of one emission, so re-running the emitter
//! on the same table reproduces the text exactly.
//!
//! Emission order: model inputs, initializers (dual-role tensors
//! appear here only), one operation line per node output in
//! topological order, then the model outputs.

use crate::symtab::SymbolTable;
use indexmap::IndexMap;

struct TacEmitter<'a> {
    table: &'a SymbolTable,
    counter: usize,
    synthetic: IndexMap<String, String>,
    lines: Vec<String>,
}

impl<'a> TacEmitter<'a> {
    fn new(table: &'a SymbolTable) -> Self {
        Self {
            table,
            counter: 0,
            synthetic: IndexMap::new(),
            lines: Vec::new(),
        }
    }

    /// The synthetic name of a tensor, assigned on first request.
    fn tvar(&mut self, original: &str) -> String {
        if let Some(name) = self.synthetic.get(original) {
            return name.clone();
        }
        self.counter += 1;
        let name = format!("T{}", self.counter);
        self.synthetic.insert(original.to_string(), name.clone());
        name
    }

    fn emit_inputs(&mut self) {
        for tensor_id in self.table.tensor_ids() {
            let tensor = self.table.tensor(tensor_id);
            // Dual-role tensors are printed as initializers below.
            if !tensor.is_model_input || tensor.is_initializer {
                continue;
            }
            let tvar = self.tvar(&tensor.name);
            let shape = tensor.shape.as_deref().unwrap_or("[]");
            self.lines.push(format!(
                "{tvar} = Input(\"{}\", {}, {shape})",
                tensor.name, tensor.elem_type
            ));
        }
    }

    fn emit_initializers(&mut self) {
        for tensor_id in self.table.tensor_ids() {
            let tensor = self.table.tensor(tensor_id);
            if !tensor.is_initializer {
                continue;
            }
            let tvar = self.tvar(&tensor.name);
            let shape = tensor.shape.as_deref().unwrap_or("[]");
            let raw = tensor.raw_data.as_deref().unwrap_or("");
            self.lines.push(format!(
                "{tvar} = Initializer(\"{}\", {}, {shape}, raw_data=0x{raw})",
                tensor.name, tensor.elem_type
            ));
        }
    }

    fn emit_operations(&mut self) {
        for node_id in self.table.order().to_vec() {
            let node = self.table.node(node_id);
            let op_type = node.op_type.clone();
            let attr_sig = node.attr_sig.clone();
            let input_ids = node.inputs.clone();
            let output_ids = node.outputs.clone();

            let operands: Vec<String> = input_ids
                .iter()
                .map(|t| {
                    let name = self.table.tensor(*t).name.clone();
                    self.tvar(&name)
                })
                .collect();

            for output_id in output_ids {
                let output_name = self.table.tensor(output_id).name.clone();
                let result = self.tvar(&output_name);
                let mut line = format!("{result} = {op_type}({}", operands.join(", "));
                if let Some(attrs) = &attr_sig {
                    if !operands.is_empty() {
                        line.push_str(", ");
                    }
                    line.push_str(attrs);
                }
                line.push(')');
                self.lines.push(line);
            }
        }
    }

    fn emit_outputs(&mut self) {
        for tensor_id in self.table.tensor_ids() {
            let tensor = self.table.tensor(tensor_id);
            if !tensor.is_model_output {
                continue;
            }
            let tvar = self.tvar(&tensor.name);
            self.lines.push(format!("Output(\"{}\", {tvar})", tensor.name));
        }
    }

    fn finish(mut self) -> String {
        self.emit_inputs();
        self.emit_initializers();
        self.emit_operations();
        self.emit_outputs();
        let mut text = self.lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        text
    }
}

/// Emits the three-address text for a validated, ordered table.
pub fn emit(table: &SymbolTable) -> String {
    TacEmitter::new(table).finish()
}

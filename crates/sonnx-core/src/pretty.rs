// Copyright (c) ONNX Project Contributors
// SPDX-License-Identifier: Apache-2.0

//! S-expression dump of the AST, one node per line, two-space indent.
//! Diagnostic aid only; nothing downstream consumes this text.

use crate::ast::{Attribute, Graph, InitTensor, IoSpec, IoTensor, Literal, Model, NodeDecl};

struct AstPrinter {
    out: String,
    indent: usize,
}

impl AstPrinter {
    fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn open(&mut self, tag: &str) {
        self.line(&format!("({tag}"));
        self.indent += 1;
    }

    fn close(&mut self) {
        self.indent -= 1;
        self.line(")");
    }

    fn model(&mut self, model: &Model) {
        self.open("MODEL");
        self.literal(&model.ir_version);
        self.literal(&model.producer_name);
        self.literal(&model.producer_version);
        self.literal(&model.domain);
        self.literal(&model.model_version);
        self.literal(&model.doc_string);
        self.graph(&model.graph);
        self.open("OPSET_IMPORT");
        self.literal(&model.opset.domain);
        self.literal(&model.opset.version);
        self.close();
        self.close();
    }

    fn graph(&mut self, graph: &Graph) {
        self.open("GRAPH");
        self.literal(&graph.name);
        self.open("NODE_LIST");
        for node in &graph.nodes {
            self.node(node);
        }
        self.close();
        self.open("INPUT_LIST");
        for io in &graph.inputs {
            self.io_tensor(io);
        }
        self.close();
        self.open("OUTPUT_LIST");
        for io in &graph.outputs {
            self.io_tensor(io);
        }
        self.close();
        if let Some(initializers) = &graph.initializers {
            self.open("INITIALIZER_LIST");
            for init in initializers {
                self.init_tensor(init);
            }
            self.close();
        }
        self.close();
    }

    fn node(&mut self, node: &NodeDecl) {
        self.open("NODE");
        self.literal(&node.op_type);
        self.literal(&node.name);
        self.io_spec(&node.inputs, "INPUT_ARR", "INPUT_LIST");
        self.io_spec(&node.outputs, "OUTPUT_ARR", "OUTPUT_LIST");
        if let Some(attributes) = &node.attributes {
            self.open("ATTRIBUTE_LIST");
            for attr in attributes {
                self.attribute(attr);
            }
            self.close();
        }
        self.close();
    }

    fn io_spec(&mut self, spec: &IoSpec, arr_tag: &str, list_tag: &str) {
        match spec {
            IoSpec::Names(names) => {
                self.open(arr_tag);
                for name in names {
                    self.literal(name);
                }
                self.close();
            }
            IoSpec::Typed(tensors) => {
                self.open(list_tag);
                for io in tensors {
                    self.io_tensor(io);
                }
                self.close();
            }
        }
    }

    fn io_tensor(&mut self, io: &IoTensor) {
        self.open("IO_TENSOR");
        self.literal(&io.name);
        self.literal(&io.elem_type);
        self.open("IO_SHAPE");
        for dim in &io.shape {
            self.open("IO_DIM");
            self.literal(dim);
            self.close();
        }
        self.close();
        self.close();
    }

    fn init_tensor(&mut self, init: &InitTensor) {
        self.open("INIT_TENSOR");
        self.literal(&init.name);
        self.literal(&init.elem_type);
        self.open("INIT_SHAPE");
        for dim in &init.dims {
            self.literal(dim);
        }
        self.close();
        self.literal(&init.raw_data);
        self.close();
    }

    fn attribute(&mut self, attr: &Attribute) {
        self.open("ATTRIBUTE");
        self.literal(&attr.name);
        self.literal(&attr.value);
        self.close();
    }

    fn literal(&mut self, literal: &Literal) {
        match literal {
            Literal::U32(v) => self.line(&format!("(U32_LITERAL {v})")),
            Literal::U64(v) => self.line(&format!("(U64_LITERAL {v})")),
            Literal::Str(s) => self.line(&format!("(STR_LITERAL \"{s}\")")),
            Literal::Bytes(bytes) => {
                let decimals: Vec<String> = bytes.iter().map(|b| b.to_string()).collect();
                self.line(&format!("(BYTES_LITERAL [{}])", decimals.join(", ")));
            }
            Literal::Type(ty) => self.line(&format!("(TYPE_ENUM {ty})")),
            Literal::Error => self.line("(ERROR)"),
        }
    }
}

/// Renders the whole tree.
pub fn dump(model: &Model) -> String {
    let mut printer = AstPrinter::new();
    printer.model(model);
    printer.out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse;

    #[test]
    fn test_dump_minimal_model() {
        let source = r#"MODEL {
            IR_VERSION: 7
            PRODUCER_NAME: "p"
            PRODUCER_VERSION: "1"
            DOMAIN: ""
            MODEL_VERSION: 1
            DOC_STRING: ""
            GRAPH {
              NAME: "g"
              NODE_LIST {
                NODE { OP_TYPE: "Relu" NAME: "r" INPUT: ["x"] OUTPUT: ["y"] }
              }
              INPUT_LIST { INPUT { NAME: "x" TYPE: FLOAT SHAPE: [1] } }
              OUTPUT_LIST { OUTPUT { NAME: "y" TYPE: FLOAT SHAPE: [1] } }
            }
            OPSET { DOMAIN: "" VERSION: 13 }
          }"#;
        let model = parse(lex(source).unwrap()).unwrap();
        let text = dump(&model);

        assert!(text.starts_with("(MODEL\n  (U32_LITERAL 7)\n"));
        assert!(text.contains("(GRAPH\n"));
        assert!(text.contains("(STR_LITERAL \"Relu\")\n"));
        assert!(text.contains("(INPUT_ARR\n"));
        assert!(text.contains("(TYPE_ENUM FLOAT)\n"));
        assert!(text.contains("(OPSET_IMPORT\n"));
        assert!(text.ends_with(")\n"));
    }

    #[test]
    fn test_dump_bytes_and_errors() {
        let model_text = dump(&Model {
            ir_version: Literal::Error,
            producer_name: Literal::Str("p".into()),
            producer_version: Literal::Str("1".into()),
            domain: Literal::Str("".into()),
            model_version: Literal::U64(5_000_000_000),
            doc_string: Literal::Str("".into()),
            graph: Graph {
                name: Literal::Str("g".into()),
                nodes: vec![],
                inputs: vec![],
                outputs: vec![],
                initializers: Some(vec![InitTensor {
                    name: Literal::Str("w".into()),
                    elem_type: Literal::Type(crate::enums::ElemType::Int),
                    dims: vec![Literal::U32(2)],
                    raw_data: Literal::Bytes(vec![0xDE, 0xAD]),
                    pos: crate::token::Pos::new(1, 1),
                }]),
            },
            opset: crate::ast::OpsetImport {
                domain: Literal::Str("".into()),
                version: Literal::U32(13),
            },
        });

        assert!(model_text.contains("(ERROR)\n"));
        assert!(model_text.contains("(U64_LITERAL 5000000000)\n"));
        assert!(model_text.contains("(BYTES_LITERAL [222, 173])\n"));
        assert!(model_text.contains("(INIT_TENSOR\n"));
    }
}

// Copyright (c) ONNX Project Contributors
// SPDX-License-Identifier: Apache-2.0

//! Recursive-descent parser producing the AST bottom-up.
//!
//! Section order inside every block is fixed, which keeps each rule a
//! straight-line sequence of expectations. The parser aborts on the
//! first violation; recovery is not attempted. Integer-literal
//! narrowing happens here, so range errors surface as parser
//! diagnostics with the literal's position.
//!
//! ```text
//! model  := MODEL "{" ir_version producer_name producer_version domain
//!                     model_version doc_string graph opset "}"
//! graph  := GRAPH "{" name node_list input_list output_list
//!                     [initializer_list] "}"
//! node   := NODE "{" op_type name input_spec output_spec
//!                    [attribute_list] "}"
//! ```

use crate::ast::{
    Attribute, Graph, InitTensor, IoSpec, IoTensor, Literal, Model, NodeDecl, OpsetImport,
};
use crate::enums::ElemType;
use crate::error::ParseError;
use crate::literal::{self, IntValue};
use crate::token::{Keyword, Token, TokenKind};

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        // The lexer terminates every stream with Eof.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        self.peek().kind == TokenKind::Keyword(kw)
    }

    fn unexpected(&self, wanted: &str) -> ParseError {
        let token = self.peek();
        ParseError::new(token.pos, format!("expected {wanted}, found {}", token.kind))
    }

    fn expect_kind(&mut self, kind: TokenKind, wanted: &str) -> Result<Token, ParseError> {
        if self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(wanted))
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<Token, ParseError> {
        self.expect_kind(TokenKind::Keyword(kw), &format!("'{}'", kw.as_str()))
    }

    fn expect_colon(&mut self) -> Result<(), ParseError> {
        self.expect_kind(TokenKind::Colon, "':'")?;
        Ok(())
    }

    fn expect_lbrace(&mut self) -> Result<(), ParseError> {
        self.expect_kind(TokenKind::LBrace, "'{'")?;
        Ok(())
    }

    fn expect_rbrace(&mut self) -> Result<(), ParseError> {
        self.expect_kind(TokenKind::RBrace, "'}'")?;
        Ok(())
    }

    fn expect_string(&mut self) -> Result<Literal, ParseError> {
        match &self.peek().kind {
            TokenKind::Str(_) => {
                let token = self.advance();
                match token.kind {
                    TokenKind::Str(body) => Ok(Literal::Str(body)),
                    _ => unreachable!(),
                }
            }
            _ => Err(self.unexpected("string literal")),
        }
    }

    fn expect_integer(&mut self) -> Result<Literal, ParseError> {
        match &self.peek().kind {
            TokenKind::Integer(_) => {
                let token = self.advance();
                let TokenKind::Integer(text) = token.kind else {
                    unreachable!()
                };
                match literal::parse_integer(&text) {
                    Ok(IntValue::U32(v)) => Ok(Literal::U32(v)),
                    Ok(IntValue::U64(v)) => Ok(Literal::U64(v)),
                    Err(e) => Err(ParseError::new(token.pos, e.to_string())),
                }
            }
            _ => Err(self.unexpected("integer literal")),
        }
    }

    fn expect_bytes(&mut self) -> Result<Literal, ParseError> {
        match &self.peek().kind {
            TokenKind::Bytes(_) => {
                let token = self.advance();
                match token.kind {
                    TokenKind::Bytes(payload) => Ok(Literal::Bytes(payload)),
                    _ => unreachable!(),
                }
            }
            _ => Err(self.unexpected("bytes literal")),
        }
    }

    /// `KW : STRING`
    fn key_string(&mut self, kw: Keyword) -> Result<Literal, ParseError> {
        self.expect_keyword(kw)?;
        self.expect_colon()?;
        self.expect_string()
    }

    /// `KW : INTEGER`
    fn key_integer(&mut self, kw: Keyword) -> Result<Literal, ParseError> {
        self.expect_keyword(kw)?;
        self.expect_colon()?;
        self.expect_integer()
    }

    fn model(&mut self) -> Result<Model, ParseError> {
        self.expect_keyword(Keyword::Model)?;
        self.expect_lbrace()?;
        let ir_version = self.key_integer(Keyword::IrVersion)?;
        let producer_name = self.key_string(Keyword::ProducerName)?;
        let producer_version = self.key_string(Keyword::ProducerVersion)?;
        let domain = self.key_string(Keyword::Domain)?;
        let model_version = self.key_integer(Keyword::ModelVersion)?;
        let doc_string = self.key_string(Keyword::DocString)?;
        let graph = self.graph()?;
        let opset = self.opset()?;
        self.expect_rbrace()?;
        self.expect_kind(TokenKind::Eof, "end of input")?;
        Ok(Model {
            ir_version,
            producer_name,
            producer_version,
            domain,
            model_version,
            doc_string,
            graph,
            opset,
        })
    }

    fn graph(&mut self) -> Result<Graph, ParseError> {
        self.expect_keyword(Keyword::Graph)?;
        self.expect_lbrace()?;
        let name = self.key_string(Keyword::Name)?;
        let nodes = self.node_list()?;
        let inputs = self.io_list(Keyword::InputList, Keyword::Input)?;
        let outputs = self.io_list(Keyword::OutputList, Keyword::Output)?;
        let initializers = if self.at_keyword(Keyword::InitializerList) {
            Some(self.initializer_list()?)
        } else {
            None
        };
        self.expect_rbrace()?;
        Ok(Graph {
            name,
            nodes,
            inputs,
            outputs,
            initializers,
        })
    }

    fn node_list(&mut self) -> Result<Vec<NodeDecl>, ParseError> {
        self.expect_keyword(Keyword::NodeList)?;
        self.expect_lbrace()?;
        let mut nodes = Vec::new();
        while self.at_keyword(Keyword::Node) {
            nodes.push(self.node()?);
        }
        self.expect_rbrace()?;
        Ok(nodes)
    }

    fn node(&mut self) -> Result<NodeDecl, ParseError> {
        let pos = self.peek().pos;
        self.expect_keyword(Keyword::Node)?;
        self.expect_lbrace()?;
        let op_type = self.key_string(Keyword::OpType)?;
        let name = self.key_string(Keyword::Name)?;
        let inputs = self.io_spec(Keyword::Input, Keyword::InputList)?;
        let outputs = self.io_spec(Keyword::Output, Keyword::OutputList)?;
        let attributes = if self.at_keyword(Keyword::AttributeList) {
            Some(self.attribute_list()?)
        } else {
            None
        };
        self.expect_rbrace()?;
        Ok(NodeDecl {
            op_type,
            name,
            inputs,
            outputs,
            attributes,
            pos,
        })
    }

    /// Either the plain reference form (`INPUT: ["a", "b"]`) or the
    /// typed declaration form (`INPUT_LIST { INPUT { ... } }`).
    fn io_spec(&mut self, arr_kw: Keyword, list_kw: Keyword) -> Result<IoSpec, ParseError> {
        if self.at_keyword(arr_kw) {
            self.advance();
            self.expect_colon()?;
            Ok(IoSpec::Names(self.str_array()?))
        } else if self.at_keyword(list_kw) {
            Ok(IoSpec::Typed(self.io_list(list_kw, arr_kw)?))
        } else {
            Err(self.unexpected(&format!(
                "'{}' or '{}'",
                arr_kw.as_str(),
                list_kw.as_str()
            )))
        }
    }

    fn str_array(&mut self) -> Result<Vec<Literal>, ParseError> {
        self.expect_kind(TokenKind::LBracket, "'['")?;
        let mut names = Vec::new();
        if self.peek().kind != TokenKind::RBracket {
            loop {
                names.push(self.expect_string()?);
                if self.peek().kind == TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect_kind(TokenKind::RBracket, "']'")?;
        Ok(names)
    }

    fn io_list(&mut self, list_kw: Keyword, entry_kw: Keyword) -> Result<Vec<IoTensor>, ParseError> {
        self.expect_keyword(list_kw)?;
        self.expect_lbrace()?;
        let mut tensors = Vec::new();
        while self.at_keyword(entry_kw) {
            tensors.push(self.io_tensor(entry_kw)?);
        }
        self.expect_rbrace()?;
        Ok(tensors)
    }

    fn io_tensor(&mut self, entry_kw: Keyword) -> Result<IoTensor, ParseError> {
        let pos = self.peek().pos;
        self.expect_keyword(entry_kw)?;
        self.expect_lbrace()?;
        let name = self.key_string(Keyword::Name)?;
        self.expect_keyword(Keyword::Type)?;
        self.expect_colon()?;
        let elem_type = self.elem_type()?;
        self.expect_keyword(Keyword::Shape)?;
        self.expect_colon()?;
        let shape = self.dim_array()?;
        self.expect_rbrace()?;
        Ok(IoTensor {
            name,
            elem_type,
            shape,
            pos,
        })
    }

    fn elem_type(&mut self) -> Result<Literal, ParseError> {
        let ty = match self.peek().kind {
            TokenKind::Keyword(Keyword::Int) => ElemType::Int,
            TokenKind::Keyword(Keyword::Float) => ElemType::Float,
            TokenKind::Keyword(Keyword::String) => ElemType::String,
            TokenKind::Keyword(Keyword::Bool) => ElemType::Bool,
            _ => return Err(self.unexpected("element type")),
        };
        self.advance();
        Ok(Literal::Type(ty))
    }

    /// Dimensions: integer literals for concrete entries, string
    /// literals for symbolic parameters.
    fn dim_array(&mut self) -> Result<Vec<Literal>, ParseError> {
        self.expect_kind(TokenKind::LBracket, "'['")?;
        let mut dims = Vec::new();
        if self.peek().kind != TokenKind::RBracket {
            loop {
                let dim = match &self.peek().kind {
                    TokenKind::Integer(_) => self.expect_integer()?,
                    TokenKind::Str(_) => self.expect_string()?,
                    _ => return Err(self.unexpected("dimension")),
                };
                dims.push(dim);
                if self.peek().kind == TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect_kind(TokenKind::RBracket, "']'")?;
        Ok(dims)
    }

    fn initializer_list(&mut self) -> Result<Vec<InitTensor>, ParseError> {
        self.expect_keyword(Keyword::InitializerList)?;
        self.expect_lbrace()?;
        let mut tensors = Vec::new();
        while self.at_keyword(Keyword::Initializer) {
            tensors.push(self.init_tensor()?);
        }
        self.expect_rbrace()?;
        Ok(tensors)
    }

    fn init_tensor(&mut self) -> Result<InitTensor, ParseError> {
        let pos = self.peek().pos;
        self.expect_keyword(Keyword::Initializer)?;
        self.expect_lbrace()?;
        let name = self.key_string(Keyword::Name)?;
        self.expect_keyword(Keyword::Type)?;
        self.expect_colon()?;
        let elem_type = self.elem_type()?;
        self.expect_keyword(Keyword::Dims)?;
        self.expect_colon()?;
        let dims = self.int_array()?;
        self.expect_keyword(Keyword::RawData)?;
        self.expect_colon()?;
        let raw_data = self.expect_bytes()?;
        self.expect_rbrace()?;
        Ok(InitTensor {
            name,
            elem_type,
            dims,
            raw_data,
            pos,
        })
    }

    /// Integer-only dimension array (initializer shapes).
    fn int_array(&mut self) -> Result<Vec<Literal>, ParseError> {
        self.expect_kind(TokenKind::LBracket, "'['")?;
        let mut dims = Vec::new();
        if self.peek().kind != TokenKind::RBracket {
            loop {
                dims.push(self.expect_integer()?);
                if self.peek().kind == TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect_kind(TokenKind::RBracket, "']'")?;
        Ok(dims)
    }

    fn attribute_list(&mut self) -> Result<Vec<Attribute>, ParseError> {
        self.expect_keyword(Keyword::AttributeList)?;
        self.expect_lbrace()?;
        let mut attributes = Vec::new();
        while self.at_keyword(Keyword::Attribute) {
            attributes.push(self.attribute()?);
        }
        self.expect_rbrace()?;
        Ok(attributes)
    }

    fn attribute(&mut self) -> Result<Attribute, ParseError> {
        self.expect_keyword(Keyword::Attribute)?;
        self.expect_lbrace()?;
        let name = self.key_string(Keyword::Name)?;
        self.expect_keyword(Keyword::Value)?;
        self.expect_colon()?;
        let value = self.literal_value()?;
        self.expect_rbrace()?;
        Ok(Attribute { name, value })
    }

    /// Attribute values are literals only.
    fn literal_value(&mut self) -> Result<Literal, ParseError> {
        match &self.peek().kind {
            TokenKind::Integer(_) => self.expect_integer(),
            TokenKind::Str(_) => self.expect_string(),
            TokenKind::Bytes(_) => self.expect_bytes(),
            TokenKind::Keyword(
                Keyword::Int | Keyword::Float | Keyword::String | Keyword::Bool,
            ) => self.elem_type(),
            _ => Err(self.unexpected("literal value")),
        }
    }

    fn opset(&mut self) -> Result<OpsetImport, ParseError> {
        self.expect_keyword(Keyword::Opset)?;
        self.expect_lbrace()?;
        let domain = self.key_string(Keyword::Domain)?;
        let version = self.key_integer(Keyword::Version)?;
        self.expect_rbrace()?;
        Ok(OpsetImport { domain, version })
    }
}

/// Parses a token stream into a model AST. Consumes the whole stream;
/// trailing tokens are an error.
pub fn parse(tokens: Vec<Token>) -> Result<Model, ParseError> {
    Parser::new(tokens).model()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::token::Pos;

    fn parse_text(source: &str) -> Result<Model, ParseError> {
        parse(lex(source).expect("lexes"))
    }

    fn wrap_graph(graph_body: &str) -> String {
        format!(
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
        )
    }

    const EMPTY_GRAPH: &str = r#"NAME: "g"
                                 NODE_LIST { }
                                 INPUT_LIST { }
                                 OUTPUT_LIST { }"#;

    #[test]
    fn test_parse_minimal_model() {
        let model = parse_text(&wrap_graph(EMPTY_GRAPH)).unwrap();
        assert_eq!(model.ir_version, Literal::U32(7));
        assert_eq!(model.producer_name.as_str(), Some("test"));
        assert_eq!(model.graph.name.as_str(), Some("g"));
        assert!(model.graph.nodes.is_empty());
        assert!(model.graph.initializers.is_none());
        assert_eq!(model.opset.version, Literal::U32(13));
    }

    #[test]
    fn test_parse_node_with_name_arrays() {
        let graph = r#"NAME: "g"
                       NODE_LIST {
                         NODE {
                           OP_TYPE: "Relu"
                           NAME: "relu0"
                           INPUT: ["x"]
                           OUTPUT: ["y"]
                         }
                       }
                       INPUT_LIST {
                         INPUT { NAME: "x" TYPE: FLOAT SHAPE: [1, 3] }
                       }
                       OUTPUT_LIST {
                         OUTPUT { NAME: "y" TYPE: FLOAT SHAPE: [1, 3] }
                       }"#;
        let model = parse_text(&wrap_graph(graph)).unwrap();
        let node = &model.graph.nodes[0];
        assert_eq!(node.op_type.as_str(), Some("Relu"));
        assert_eq!(
            node.inputs,
            IoSpec::Names(vec![Literal::Str("x".into())])
        );
        assert_eq!(model.graph.inputs[0].shape, vec![Literal::U32(1), Literal::U32(3)]);
    }

    #[test]
    fn test_parse_typed_node_outputs_and_symbolic_dims() {
        let graph = r#"NAME: "g"
                       NODE_LIST {
                         NODE {
                           OP_TYPE: "Cast"
                           NAME: "cast0"
                           INPUT: ["x"]
                           OUTPUT_LIST {
                             OUTPUT { NAME: "y" TYPE: INT SHAPE: ["batch", 3] }
                           }
                         }
                       }
                       INPUT_LIST { INPUT { NAME: "x" TYPE: FLOAT SHAPE: ["batch", 3] } }
                       OUTPUT_LIST { OUTPUT { NAME: "y" TYPE: INT SHAPE: ["batch", 3] } }"#;
        let model = parse_text(&wrap_graph(graph)).unwrap();
        let IoSpec::Typed(outputs) = &model.graph.nodes[0].outputs else {
            panic!("expected typed output spec");
        };
        assert_eq!(outputs[0].elem_type.as_type(), Some(ElemType::Int));
        assert_eq!(
            outputs[0].shape,
            vec![Literal::Str("batch".into()), Literal::U32(3)]
        );
    }

    #[test]
    fn test_parse_initializer_and_attributes() {
        let graph = r#"NAME: "g"
                       NODE_LIST {
                         NODE {
                           OP_TYPE: "Gemm"
                           NAME: "gemm0"
                           INPUT: ["x", "w"]
                           OUTPUT: ["y"]
                           ATTRIBUTE_LIST {
                             ATTRIBUTE { NAME: "transB" VALUE: 1 }
                             ATTRIBUTE { NAME: "mode" VALUE: "strict" }
                             ATTRIBUTE { NAME: "to" VALUE: FLOAT }
                           }
                         }
                       }
                       INPUT_LIST { INPUT { NAME: "x" TYPE: FLOAT SHAPE: [2] } }
                       OUTPUT_LIST { OUTPUT { NAME: "y" TYPE: FLOAT SHAPE: [2] } }
                       INITIALIZER_LIST {
                         INITIALIZER {
                           NAME: "w"
                           TYPE: FLOAT
                           DIMS: [2, 2]
                           RAW_DATA: DEADBEEF#
                         }
                       }"#;
        let model = parse_text(&wrap_graph(graph)).unwrap();
        let attrs = model.graph.nodes[0].attributes.as_ref().unwrap();
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs[0].value, Literal::U32(1));
        assert_eq!(attrs[1].value.as_str(), Some("strict"));
        assert_eq!(attrs[2].value.as_type(), Some(ElemType::Float));
        let inits = model.graph.initializers.as_ref().unwrap();
        assert_eq!(inits[0].raw_data.as_bytes(), Some(&[0xDE, 0xAD, 0xBE, 0xEF][..]));
    }

    #[test]
    fn test_parse_wide_integers() {
        let graph_src = wrap_graph(EMPTY_GRAPH).replace("MODEL_VERSION: 1", "MODEL_VERSION: 4294967296");
        let model = parse_text(&graph_src).unwrap();
        assert_eq!(model.model_version, Literal::U64(4_294_967_296));

        let suffixed = wrap_graph(EMPTY_GRAPH).replace("MODEL_VERSION: 1", "MODEL_VERSION: 42L");
        let model = parse_text(&suffixed).unwrap();
        assert_eq!(model.model_version, Literal::U64(42));
    }

    #[test]
    fn test_parse_integer_out_of_range() {
        let src = wrap_graph(EMPTY_GRAPH).replace("IR_VERSION: 7", "IR_VERSION: 18446744073709551616");
        let err = parse_text(&src).unwrap_err();
        assert!(err.message.contains("integer literal out of range"));
        assert!(err
            .to_string()
            .starts_with("FATAL Parser error at line 2"));
    }

    #[test]
    fn test_parse_missing_section() {
        let src = r#"MODEL { IR_VERSION: 7 PRODUCER_VERSION: "x" }"#;
        let err = parse_text(src).unwrap_err();
        assert!(err.message.contains("expected 'PRODUCER_NAME'"));
    }

    #[test]
    fn test_parse_rejects_symbolic_initializer_dims() {
        let graph = r#"NAME: "g"
                       NODE_LIST { }
                       INPUT_LIST { }
                       OUTPUT_LIST { }
                       INITIALIZER_LIST {
                         INITIALIZER { NAME: "w" TYPE: INT DIMS: ["n"] RAW_DATA: 00# }
                       }"#;
        let err = parse_text(&wrap_graph(graph)).unwrap_err();
        assert!(err.message.contains("expected integer literal"));
    }

    #[test]
    fn test_parse_trailing_tokens_rejected() {
        let src = format!("{} MODEL", wrap_graph(EMPTY_GRAPH));
        let err = parse_text(&src).unwrap_err();
        assert!(err.message.contains("expected end of input"));
    }

    #[test]
    fn test_parse_node_spec_error_position() {
        let graph = r#"NAME: "g"
                       NODE_LIST {
                         NODE { OP_TYPE: "Relu" NAME: "r" OUTPUT: ["y"] }
                       }
                       INPUT_LIST { }
                       OUTPUT_LIST { }"#;
        let err = parse_text(&wrap_graph(graph)).unwrap_err();
        assert!(err.message.contains("expected 'INPUT' or 'INPUT_LIST'"));
        assert_ne!(err.pos, Pos::new(0, 0));
    }
}

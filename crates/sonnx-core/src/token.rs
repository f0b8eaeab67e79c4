// Copyright (c) ONNX Project Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tokens of the S-ONNX surface syntax.
//!
//! The lexer resolves string escapes and byte payloads itself; integer
//! literals keep their raw text because the 32-vs-64-bit narrowing (and
//! its range error) belongs to the parser.

use std::fmt;

/// A 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

impl Pos {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Section and type keywords. All are bare upper-case words in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Model,
    IrVersion,
    ProducerName,
    ProducerVersion,
    Domain,
    ModelVersion,
    DocString,
    Graph,
    Name,
    NodeList,
    Node,
    OpType,
    Input,
    Output,
    InputList,
    OutputList,
    InitializerList,
    Initializer,
    AttributeList,
    Attribute,
    Value,
    Type,
    Shape,
    Dims,
    RawData,
    Opset,
    Version,
    Int,
    Float,
    String,
    Bool,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Keyword> {
        Some(match word {
            "MODEL" => Keyword::Model,
            "IR_VERSION" => Keyword::IrVersion,
            "PRODUCER_NAME" => Keyword::ProducerName,
            "PRODUCER_VERSION" => Keyword::ProducerVersion,
            "DOMAIN" => Keyword::Domain,
            "MODEL_VERSION" => Keyword::ModelVersion,
            "DOC_STRING" => Keyword::DocString,
            "GRAPH" => Keyword::Graph,
            "NAME" => Keyword::Name,
            "NODE_LIST" => Keyword::NodeList,
            "NODE" => Keyword::Node,
            "OP_TYPE" => Keyword::OpType,
            "INPUT" => Keyword::Input,
            "OUTPUT" => Keyword::Output,
            "INPUT_LIST" => Keyword::InputList,
            "OUTPUT_LIST" => Keyword::OutputList,
            "INITIALIZER_LIST" => Keyword::InitializerList,
            "INITIALIZER" => Keyword::Initializer,
            "ATTRIBUTE_LIST" => Keyword::AttributeList,
            "ATTRIBUTE" => Keyword::Attribute,
            "VALUE" => Keyword::Value,
            "TYPE" => Keyword::Type,
            "SHAPE" => Keyword::Shape,
            "DIMS" => Keyword::Dims,
            "RAW_DATA" => Keyword::RawData,
            "OPSET" => Keyword::Opset,
            "VERSION" => Keyword::Version,
            "INT" => Keyword::Int,
            "FLOAT" => Keyword::Float,
            "STRING" => Keyword::String,
            "BOOL" => Keyword::Bool,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Model => "MODEL",
            Keyword::IrVersion => "IR_VERSION",
            Keyword::ProducerName => "PRODUCER_NAME",
            Keyword::ProducerVersion => "PRODUCER_VERSION",
            Keyword::Domain => "DOMAIN",
            Keyword::ModelVersion => "MODEL_VERSION",
            Keyword::DocString => "DOC_STRING",
            Keyword::Graph => "GRAPH",
            Keyword::Name => "NAME",
            Keyword::NodeList => "NODE_LIST",
            Keyword::Node => "NODE",
            Keyword::OpType => "OP_TYPE",
            Keyword::Input => "INPUT",
            Keyword::Output => "OUTPUT",
            Keyword::InputList => "INPUT_LIST",
            Keyword::OutputList => "OUTPUT_LIST",
            Keyword::InitializerList => "INITIALIZER_LIST",
            Keyword::Initializer => "INITIALIZER",
            Keyword::AttributeList => "ATTRIBUTE_LIST",
            Keyword::Attribute => "ATTRIBUTE",
            Keyword::Value => "VALUE",
            Keyword::Type => "TYPE",
            Keyword::Shape => "SHAPE",
            Keyword::Dims => "DIMS",
            Keyword::RawData => "RAW_DATA",
            Keyword::Opset => "OPSET",
            Keyword::Version => "VERSION",
            Keyword::Int => "INT",
            Keyword::Float => "FLOAT",
            Keyword::String => "STRING",
            Keyword::Bool => "BOOL",
        }
    }
}

/// One lexed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,
    /// Raw text, suffix included.
    Integer(String),
    /// Escape-resolved body.
    Str(String),
    /// Decoded payload, marker stripped.
    Bytes(Vec<u8>),
    Keyword(Keyword),
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LBrace => f.write_str("'{'"),
            TokenKind::RBrace => f.write_str("'}'"),
            TokenKind::LBracket => f.write_str("'['"),
            TokenKind::RBracket => f.write_str("']'"),
            TokenKind::Colon => f.write_str("':'"),
            TokenKind::Comma => f.write_str("','"),
            TokenKind::Integer(text) => write!(f, "integer '{text}'"),
            TokenKind::Str(body) => write!(f, "string \"{body}\""),
            TokenKind::Bytes(payload) => write!(f, "bytes literal ({} bytes)", payload.len()),
            TokenKind::Keyword(kw) => write!(f, "'{}'", kw.as_str()),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Pos,
}

impl Token {
    pub fn new(kind: TokenKind, pos: Pos) -> Self {
        Self { kind, pos }
    }
}

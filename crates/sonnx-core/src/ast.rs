// Copyright (c) ONNX Project Contributors
// SPDX-License-Identifier: Apache-2.0

//! Abstract syntax tree for the S-ONNX surface language.
//!
//! The tree is built bottom-up by the parser and never mutated
//! afterwards; every later pass borrows it read-only. Variants are
//! closed sum types, so passes dispatch with `match` instead of a
//! visitor protocol.
//!
//! A [`Literal::Error`] may stand in for any literal child when a
//! producer of the tree recovered past a malformed value. Passes must
//! tolerate it: they either skip the construct silently or surface a
//! diagnostic, but never panic.

use crate::enums::ElemType;
use crate::token::Pos;

/// A literal leaf. Integer literals keep the width the narrowing put
/// them in (32-bit first, `L`/`l` suffix forces 64-bit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    U32(u32),
    U64(u64),
    Str(String),
    Bytes(Vec<u8>),
    Type(ElemType),
    Error,
}

impl Literal {
    /// The string payload, if this is a string literal.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integer payload widened to `u64`, if this is an integer.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Literal::U32(v) => Some(u64::from(*v)),
            Literal::U64(v) => Some(*v),
            _ => None,
        }
    }

    /// The element type, if this is a type-enum literal.
    pub fn as_type(&self) -> Option<ElemType> {
        match self {
            Literal::Type(t) => Some(*t),
            _ => None,
        }
    }

    /// The byte payload, if this is a bytes literal.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Literal::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Literal::Error)
    }
}

/// Root of the tree: model metadata plus the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub ir_version: Literal,
    pub producer_name: Literal,
    pub producer_version: Literal,
    pub domain: Literal,
    pub model_version: Literal,
    pub doc_string: Literal,
    pub graph: Graph,
    pub opset: OpsetImport,
}

/// The computation graph block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    pub name: Literal,
    pub nodes: Vec<NodeDecl>,
    pub inputs: Vec<IoTensor>,
    pub outputs: Vec<IoTensor>,
    pub initializers: Option<Vec<InitTensor>>,
}

/// A single operator node declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDecl {
    pub op_type: Literal,
    pub name: Literal,
    pub inputs: IoSpec,
    pub outputs: IoSpec,
    pub attributes: Option<Vec<Attribute>>,
    pub pos: Pos,
}

/// Input or output specifier of a node.
///
/// The two forms carry different meaning: a plain name array is a
/// use-site reference, a typed list is a declaration with element type
/// and shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoSpec {
    Names(Vec<Literal>),
    Typed(Vec<IoTensor>),
}

/// A typed tensor declaration (graph inputs/outputs and the rich node
/// specifier form). Shape entries are integer literals for concrete
/// dimensions or string literals for symbolic parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoTensor {
    pub name: Literal,
    pub elem_type: Literal,
    pub shape: Vec<Literal>,
    pub pos: Pos,
}

/// A constant tensor definition with its raw byte payload. Dimensions
/// are integer-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitTensor {
    pub name: Literal,
    pub elem_type: Literal,
    pub dims: Vec<Literal>,
    pub raw_data: Literal,
    pub pos: Pos,
}

/// A name/value pair attached to a node. Values are literals only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: Literal,
    pub value: Literal,
}

/// The model's single opset import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpsetImport {
    pub domain: Literal,
    pub version: Literal,
}

impl IoSpec {
    /// Number of entries, regardless of form.
    pub fn len(&self) -> usize {
        match self {
            IoSpec::Names(names) => names.len(),
            IoSpec::Typed(tensors) => tensors.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_accessors() {
        assert_eq!(Literal::Str("x".into()).as_str(), Some("x"));
        assert_eq!(Literal::U32(7).as_u64(), Some(7));
        assert_eq!(Literal::U64(1 << 40).as_u64(), Some(1 << 40));
        assert_eq!(Literal::Type(ElemType::Bool).as_type(), Some(ElemType::Bool));
        assert_eq!(Literal::Bytes(vec![1, 2]).as_bytes(), Some(&[1u8, 2][..]));
        assert!(Literal::Error.is_error());
        assert_eq!(Literal::Error.as_str(), None);
        assert_eq!(Literal::Str("x".into()).as_u64(), None);
    }

    #[test]
    fn test_io_spec_len() {
        let names = IoSpec::Names(vec![Literal::Str("a".into()), Literal::Str("b".into())]);
        assert_eq!(names.len(), 2);
        assert!(!names.is_empty());
        assert!(IoSpec::Typed(vec![]).is_empty());
    }
}

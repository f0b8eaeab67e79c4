// Copyright (c) ONNX Project Contributors
// SPDX-License-Identifier: Apache-2.0

//! Diagnostics for every stage of the pipeline.
//!
//! Lexical and parser failures are fatal and carry a source position.
//! Semantic diagnostics are collected and reported together; any
//! non-empty collection suppresses IR emission.

use crate::enums::ElemType;
use crate::token::Pos;
use thiserror::Error;

/// Fatal scanner failure. Rendering matches the diagnostic contract:
/// the message starts with `FATAL Lexical error` and names the
/// position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("FATAL Lexical error at {pos}: {message}")]
pub struct LexError {
    pub pos: Pos,
    pub message: String,
}

impl LexError {
    pub fn new(pos: Pos, message: impl Into<String>) -> Self {
        Self {
            pos,
            message: message.into(),
        }
    }
}

/// Fatal parser failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("FATAL Parser error at {pos}: {message}")]
pub struct ParseError {
    pub pos: Pos,
    pub message: String,
}

impl ParseError {
    pub fn new(pos: Pos, message: impl Into<String>) -> Self {
        Self {
            pos,
            message: message.into(),
        }
    }
}

/// Side of a node a tensor sits on; used in type-mismatch reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TensorRole {
    Input,
    Output,
}

impl std::fmt::Display for TensorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TensorRole::Input => f.write_str("input"),
            TensorRole::Output => f.write_str("output"),
        }
    }
}

/// A collected (non-fatal) semantic or graph diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    #[error("Node name conflict: '{0}'")]
    DuplicateNode(String),

    #[error("Tensor name conflict: '{0}'")]
    TensorNameClash(String),

    #[error("Duplicate initializer: '{0}'")]
    DuplicateInitializer(String),

    #[error("Duplicate model input: '{0}'")]
    DuplicateInput(String),

    #[error("Duplicate model output: '{0}'")]
    DuplicateOutput(String),

    #[error("Node '{node}' references undefined input: {tensor}")]
    UndefinedInput { node: String, tensor: String },

    #[error("Output tensor '{tensor}' conflict: already produced by node '{producer}'")]
    ProducerConflict { tensor: String, producer: String },

    #[error("Node '{node}' output '{tensor}' is already declared as a model input")]
    OutputIsModelInput { node: String, tensor: String },

    #[error("Node '{node}' output '{tensor}' is already declared as an initializer")]
    OutputIsInitializer { node: String, tensor: String },

    #[error("Empty output name in node '{0}'")]
    EmptyOutputName(String),

    #[error("Node '{node}' uses '{tensor}' as both input and output")]
    SelfLoop { node: String, tensor: String },

    #[error(
        "Type mismatch in node '{node}' (op_type: '{op_type}'): \
         {role} tensor '{tensor}' has type {found}, expected {expected}"
    )]
    TypeMismatch {
        node: String,
        op_type: String,
        role: TensorRole,
        tensor: String,
        found: ElemType,
        expected: ElemType,
    },

    #[error("Model output '{0}' is also declared as a model input")]
    OutputAliasesInput(String),

    #[error("Model output '{0}' is also declared as an initializer")]
    OutputAliasesInitializer(String),

    #[error("Model output '{0}' is never produced")]
    UnproducedOutput(String),

    #[error("Cycle detected in computation graph")]
    Cycle,
}

/// Renders collected diagnostics one per line, dash-bulleted.
pub fn render_diagnostics(errors: &[SemanticError]) -> String {
    let lines: Vec<String> = errors.iter().map(|e| format!("- {e}")).collect();
    lines.join("\n")
}

/// Umbrella error for the whole pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{}", render_diagnostics(.0))]
    Semantic(Vec<SemanticError>),
}

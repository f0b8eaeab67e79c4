// Copyright (c) ONNX Project Contributors
// SPDX-License-Identifier: Apache-2.0

//! The front-end pipeline: lex → parse → analyze → graph passes →
//! emit.
//!
//! Lexical and parser failures abort immediately. Semantic and graph
//! diagnostics are collected; any of them suppresses emission. The
//! caller owns all I/O: source text in, IR text (or diagnostics) out.

use crate::analysis;
use crate::analyzer;
use crate::ast::Model;
use crate::emit;
use crate::error::CompileError;
use crate::lexer;
use crate::parser;
use tracing::debug;

/// Lexes and parses a source text into its AST.
pub fn parse_source(source: &str) -> Result<Model, CompileError> {
    let tokens = lexer::lex(source)?;
    let model = parser::parse(tokens)?;
    Ok(model)
}

/// Compiles a source text all the way to the three-address IR.
pub fn compile_source(source: &str) -> Result<String, CompileError> {
    let model = parse_source(source)?;
    let analysis_result = analyzer::analyze(&model);
    let mut table = analysis_result.table;
    let mut errors = analysis_result.errors;

    // The graph analyzer only runs over a semantically clean table.
    if errors.is_empty() {
        if let Err(cycle) = analysis::run(&mut table) {
            errors.push(cycle);
        }
    }

    if !errors.is_empty() {
        debug!(count = errors.len(), "emission suppressed");
        return Err(CompileError::Semantic(errors));
    }
    Ok(emit::emit(&table))
}

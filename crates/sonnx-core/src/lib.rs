// Copyright (c) ONNX Project Contributors
// SPDX-License-Identifier: Apache-2.0

//! # S-ONNX Compiler Front-End
//!
//! A compiler front-end for the S-ONNX textual model description
//! language: a human-readable surface syntax for an operator graph
//! with typed boundary tensors and constant initializers.
//!
//! The pipeline lexes and parses the source into an immutable AST,
//! resolves every tensor and node name into a symbol table, links
//! producer/consumer edges, validates the graph (name binding, dual
//! roles, per-node type uniformity, acyclicity), runs three
//! candidate-marking analyses (constant folding, dead code, common
//! subexpressions), and linearizes the result into a three-address
//! text IR.
//!
//! ## Architecture
//!
//! - **AST**: closed sum types built bottom-up by the parser; borrowed
//!   read-only by every pass.
//! - **Symbol table**: arena stores addressed by `NodeId`/`TensorId`
//!   handles, so the cyclic producer/user references never form an
//!   ownership cycle.
//! - **Semantic analyzer**: two passes (declarations, then
//!   definitions and linking) collecting diagnostics instead of
//!   aborting, so one run reports as much as possible.
//! - **Graph analyzer**: DFS topological sort with cycle detection
//!   plus the three candidate detectors; marks flags, never rewrites.
//! - **Emitter**: walks the topological order and assigns `T{n}`
//!   synthetic names on first use.
//!
//! The core is single-threaded and does no I/O; callers hand in
//! source text and receive IR text or diagnostics. Parallelism across
//! files means one independent pipeline per file.
//!
//! ## Module Organization
//!
//! - [`token`]: token kinds and source positions
//! - [`lexer`]: hand-written scanner
//! - [`literal`]: literal-to-value conversions
//! - [`ast`]: the tree the parser builds
//! - [`parser`]: recursive-descent parser
//! - [`pretty`]: s-expression AST dump
//! - [`enums`]: the element-type enum
//! - [`symtab`]: symbol arenas, name index, DAG, topological order
//! - [`analyzer`]: the two-pass semantic analysis
//! - [`analysis`]: graph-level candidate detectors
//! - [`emit`]: three-address IR emission
//! - [`error`]: the diagnostic taxonomy
//! - [`compile`]: the assembled pipeline

pub mod analysis;
pub mod analyzer;
pub mod ast;
pub mod compile;
pub mod emit;
pub mod enums;
pub mod error;
pub mod lexer;
pub mod literal;
pub mod parser;
pub mod pretty;
pub mod symtab;
pub mod token;

// Re-export commonly used types
pub use analyzer::{analyze, Analysis};
pub use compile::{compile_source, parse_source};
pub use enums::ElemType;
pub use error::{CompileError, LexError, ParseError, SemanticError};
pub use symtab::{NodeId, NodeSymbol, SymbolTable, TensorId, TensorSymbol};

/// Version of the front-end implementation
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

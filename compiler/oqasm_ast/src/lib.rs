// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The abstract syntax tree for the OpenQASM 3 frontend. Nodes live in an
//! arena and refer to each other by [`ast::NodeId`]; identifiers live in a
//! registry and are referred to by [`ident::IdentId`]. The closed set of node
//! classifications is [`ast_type::AstType`].

pub mod ast;
pub mod ast_type;
pub mod ident;
pub mod op;
pub mod string_utils;
pub mod visit;

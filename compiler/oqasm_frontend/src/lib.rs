// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The semantic middle of the OpenQASM 3 frontend: declaration contexts, the
//! symbol table, the expression validator, the cast machinery, and the
//! builder façade, all threaded through a [`session::FrontendSession`].

mod builder;
pub mod context;
pub mod convert;
pub mod diagnostic;
pub mod eval;
pub mod session;
pub mod symbol;
pub mod validate;

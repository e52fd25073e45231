// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The declaration-context tracker. Contexts form a tree; the tracker keeps a
//! stack of the contexts currently open. Popping marks a context dead but
//! keeps it addressable so shadowing diagnostics can still name symbols
//! declared within it.

use oqasm_ast::ast::ContextId;
use oqasm_ast::ident::IdentId;
use oqasm_data_structures::index_map::IndexMap;
use std::fmt::{self, Display, Formatter};

/// The syntactic construct a context belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContextKind {
    Global,
    Function,
    Gate,
    Defcal,
    Kernel,
    If,
    Else,
    For,
    While,
    DoWhile,
    Switch,
    Case,
    Box,
    Cal,
    Block,
}

impl Display for ContextKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let name = match self {
            ContextKind::Global => "global",
            ContextKind::Function => "function",
            ContextKind::Gate => "gate",
            ContextKind::Defcal => "defcal",
            ContextKind::Kernel => "kernel",
            ContextKind::If => "if",
            ContextKind::Else => "else",
            ContextKind::For => "for",
            ContextKind::While => "while",
            ContextKind::DoWhile => "do-while",
            ContextKind::Switch => "switch",
            ContextKind::Case => "case",
            ContextKind::Box => "box",
            ContextKind::Cal => "cal",
            ContextKind::Block => "block",
        };
        f.write_str(name)
    }
}

/// The lifecycle state of a context.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ContextState {
    #[default]
    Alive,
    Dead,
}

/// A declaration context.
#[derive(Clone, Debug)]
pub struct Context {
    /// The unique index, assigned in creation order.
    pub id: ContextId,
    /// The enclosing context. `None` only for the global context.
    pub parent: Option<ContextId>,
    pub kind: ContextKind,
    pub state: ContextState,
    /// The identifiers registered in this context.
    symbols: Vec<IdentId>,
}

impl Context {
    /// True if the context has not been exited.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.state == ContextState::Alive
    }

    /// The identifiers registered in this context, in registration order.
    #[must_use]
    pub fn symbols(&self) -> &[IdentId] {
        &self.symbols
    }
}

/// The error returned when popping an empty context stack.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ContextUnderflow;

/// The tracker. Created with the global context open.
#[derive(Debug)]
pub struct ContextTracker {
    contexts: IndexMap<ContextId, Context>,
    stack: Vec<ContextId>,
    next: ContextId,
}

impl ContextTracker {
    /// Creates the tracker and opens the global context at index 0.
    #[must_use]
    pub fn new() -> Self {
        let mut contexts = IndexMap::new();
        contexts.insert(
            ContextId::GLOBAL,
            Context {
                id: ContextId::GLOBAL,
                parent: None,
                kind: ContextKind::Global,
                state: ContextState::Alive,
                symbols: Vec::new(),
            },
        );
        Self {
            contexts,
            stack: vec![ContextId::GLOBAL],
            next: ContextId::GLOBAL.successor(),
        }
    }

    /// Opens a new child of the current context.
    pub fn push(&mut self, kind: ContextKind) -> ContextId {
        let id = self.next;
        self.next = self.next.successor();
        self.contexts.insert(
            id,
            Context {
                id,
                parent: Some(self.current()),
                kind,
                state: ContextState::Alive,
                symbols: Vec::new(),
            },
        );
        self.stack.push(id);
        id
    }

    /// Marks the current context dead and closes it.
    pub fn pop(&mut self) -> Result<(), ContextUnderflow> {
        let id = self.stack.pop().ok_or(ContextUnderflow)?;
        if let Some(context) = self.contexts.get_mut(id) {
            context.state = ContextState::Dead;
        }
        Ok(())
    }

    /// The innermost open context, or the global context if everything has
    /// been popped.
    #[must_use]
    pub fn current(&self) -> ContextId {
        self.stack.last().copied().unwrap_or(ContextId::GLOBAL)
    }

    /// The global context.
    #[must_use]
    pub fn global(&self) -> ContextId {
        ContextId::GLOBAL
    }

    #[must_use]
    pub fn get(&self, id: ContextId) -> &Context {
        self.contexts.get(id).expect("context ids are never removed")
    }

    /// True if any open context is a calibration context.
    #[must_use]
    pub fn in_calibration_context(&self) -> bool {
        self.stack_has(ContextKind::Cal) || self.stack_has(ContextKind::Defcal)
    }

    /// True if any open context is a gate body.
    #[must_use]
    pub fn in_gate_context(&self) -> bool {
        self.stack_has(ContextKind::Gate)
    }

    /// True if any open context is a defcal body.
    #[must_use]
    pub fn in_defcal_context(&self) -> bool {
        self.stack_has(ContextKind::Defcal)
    }

    /// True if any open context is a loop body.
    #[must_use]
    pub fn in_loop_context(&self) -> bool {
        self.stack_has(ContextKind::For)
            || self.stack_has(ContextKind::While)
            || self.stack_has(ContextKind::DoWhile)
    }

    fn stack_has(&self, kind: ContextKind) -> bool {
        self.stack.iter().any(|&id| self.get(id).kind == kind)
    }

    /// True if `ancestor` dominates `context`: it appears on the parent chain
    /// from `context` up to and including the global context.
    #[must_use]
    pub fn dominates(&self, ancestor: ContextId, context: ContextId) -> bool {
        let mut cursor = Some(context);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.get(id).parent;
        }
        false
    }

    /// Records an identifier in its declaration context. Registration is
    /// symmetric with [`ContextTracker::unregister`].
    pub fn register(&mut self, context: ContextId, ident: IdentId) {
        if let Some(ctx) = self.contexts.get_mut(context) {
            if !ctx.symbols.contains(&ident) {
                ctx.symbols.push(ident);
            }
        }
    }

    /// Removes an identifier from a context it was previously registered in,
    /// for when a definition moves to a nested context.
    pub fn unregister(&mut self, context: ContextId, ident: IdentId) {
        if let Some(ctx) = self.contexts.get_mut(context) {
            ctx.symbols.retain(|&id| id != ident);
        }
    }

    /// The contexts on the stack from innermost to outermost.
    pub fn stack(&self) -> impl Iterator<Item = ContextId> + '_ {
        self.stack.iter().rev().copied()
    }
}

impl Default for ContextTracker {
    fn default() -> Self {
        Self::new()
    }
}

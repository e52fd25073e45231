// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Traversal over the node arena. Implementors override the hooks they care
//! about; `walk_node` recurses through child nodes in source order and
//! reports every embedded identifier use.

use crate::ast::{children_of, Arena, NodeId, NodeKind};
use crate::ident::{IdentId, RefId};

pub trait Visitor<'a>: Sized {
    /// The arena being traversed.
    fn arena(&self) -> &'a Arena;

    /// Called for every node, before its children.
    fn visit_node(&mut self, id: NodeId) {
        walk_node(self, id);
    }

    /// Called for every identifier embedded in a node payload.
    fn visit_ident(&mut self, _: IdentId) {}

    /// Called for every identifier reference embedded in a node payload.
    fn visit_ref(&mut self, _: RefId) {}
}

/// Recurses into a node: reports its identifiers, then visits its children.
pub fn walk_node<'a, V: Visitor<'a>>(visitor: &mut V, id: NodeId) {
    let node = visitor.arena().get(id);
    for ident in idents_of(&node.kind) {
        visitor.visit_ident(ident);
    }
    if let NodeKind::IdentRef(reference) = &node.kind {
        visitor.visit_ref(*reference);
    }
    for child in children_of(&node.kind) {
        visitor.visit_node(child);
    }
}

/// The identifiers embedded directly in a payload, in source order. Child
/// nodes are not descended into; `walk_node` handles recursion.
#[must_use]
pub fn idents_of(kind: &NodeKind) -> Vec<IdentId> {
    match kind {
        NodeKind::Ident(id) => vec![*id],
        NodeKind::Call(call) => {
            let mut idents = vec![call.callee];
            idents.extend(call.qubits.iter().copied());
            idents
        }
        NodeKind::GateDecl(decl) => {
            let mut idents = vec![decl.ident];
            idents.extend(decl.params.iter().copied());
            idents.extend(decl.qubits.iter().copied());
            idents
        }
        NodeKind::DefcalDecl(decl) => {
            let mut idents = vec![decl.ident];
            idents.extend(decl.qubits.iter().copied());
            idents
        }
        NodeKind::CallableDecl(decl) => {
            let mut idents = vec![decl.ident];
            idents.extend(decl.params.iter().copied());
            idents
        }
        NodeKind::Qubit { ident, .. }
        | NodeKind::QubitContainer { ident, .. }
        | NodeKind::Stretch { ident }
        | NodeKind::Declaration { ident, .. } => vec![*ident],
        NodeKind::QubitContainerAlias { ident, source, kind } => {
            let mut idents = vec![*ident, *source];
            if let crate::ast::AliasKind::Concat(sources) = kind {
                idents.extend(sources.iter().copied());
            }
            idents
        }
        NodeKind::Measure { target, .. } | NodeKind::Reset { target } => vec![*target],
        NodeKind::Delay { targets, .. } | NodeKind::Barrier { targets } => targets.clone(),
        NodeKind::For { induction, .. } => vec![*induction],
        NodeKind::BoxStmt { label, .. } => label.iter().copied().collect(),
        NodeKind::Frame { ident, port, .. } => {
            let mut idents = vec![*ident];
            idents.extend(*port);
            idents
        }
        NodeKind::Port { ident, .. } | NodeKind::Waveform { ident, .. } => vec![*ident],
        NodeKind::ExpressionError { ident, .. }
        | NodeKind::StatementError { ident, .. }
        | NodeKind::IdentifierError { ident, .. } => ident.iter().copied().collect(),
        _ => Vec::new(),
    }
}

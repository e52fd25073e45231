// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The frontend session: the single owner of the arena, the identifier
//! registry, the context tracker, the symbol table, and the diagnostics.
//! Construction seeds the reserved names (π, τ, euler, the gate-angle
//! parameter names) and the built-in gates; the builder façade in
//! `builder.rs` is implemented as methods on this type.

use crate::context::{ContextKind, ContextTracker};
use crate::diagnostic::{DiagLevel, Diagnostic, DiagnosticBag, DiagnosticEmitter, ErrorKind};
use crate::symbol::SymbolTable;
use oqasm_ast::ast::{
    Arena, GateDecl, NodeId, NodeKind, ANGLE_BITS, GATE_BITS,
};
use oqasm_ast::ast_type::AstType;
use oqasm_ast::ident::{IdentId, IdentRegistry, SymbolScope};
use oqasm_data_structures::location::Location;
use oqasm_mangle::{Demangler, Mangler};

/// The reserved angle names and their fixed values.
const RESERVED_ANGLES: [(&str, f64); 6] = [
    ("pi", std::f64::consts::PI),
    ("π", std::f64::consts::PI),
    ("tau", std::f64::consts::TAU),
    ("τ", std::f64::consts::TAU),
    ("euler", std::f64::consts::E),
    ("ε", std::f64::consts::E),
];

/// The gate-angle parameter names recognized at init, ASCII and UTF-8.
const GATE_ANGLE_PARAMS: [&str; 6] = ["theta", "θ", "phi", "φ", "lambda", "λ"];

/// The OpenQASM 2 compatibility gate names and the built-ins they resolve to.
const OQ2_GATE_ALIASES: [(&str, AstType); 6] = [
    ("h", AstType::HadamardGate),
    ("hadamard", AstType::HadamardGate),
    ("cx", AstType::CXGate),
    ("cnot", AstType::CNotGate),
    ("ccx", AstType::CCXGate),
    ("u", AstType::UGate),
];

/// The frontend session. One per translation unit.
pub struct FrontendSession {
    pub arena: Arena,
    pub idents: IdentRegistry,
    pub contexts: ContextTracker,
    pub symbols: SymbolTable,
    pub diagnostics: DiagnosticBag,
    location: Location,
    statements: Vec<NodeId>,
}

impl FrontendSession {
    /// Creates a session and seeds the reserved names and built-in gates.
    #[must_use]
    pub fn new() -> Self {
        let mut session = Self {
            arena: Arena::new(),
            idents: IdentRegistry::new(),
            contexts: ContextTracker::new(),
            symbols: SymbolTable::new(),
            diagnostics: DiagnosticBag::new(),
            location: Location::default(),
            statements: Vec::new(),
        };
        session.seed();
        session
    }

    fn seed(&mut self) {
        for (name, value) in RESERVED_ANGLES {
            self.seed_angle(name, value);
        }
        for name in GATE_ANGLE_PARAMS {
            self.seed_angle(name, 0.0);
        }

        let u_params: Vec<IdentId> = ["theta", "phi", "lambda"]
            .iter()
            .filter_map(|name| self.idents.find_interned(name, ANGLE_BITS, AstType::Angle))
            .collect();
        let u = self.seed_gate("U", AstType::UGate, u_params, 1);
        let cx = self.seed_gate("CX", AstType::CXGate, Vec::new(), 2);
        let ccx = self.seed_gate("CCX", AstType::CCXGate, Vec::new(), 3);

        for (alias, ty) in OQ2_GATE_ALIASES {
            let target = match ty {
                AstType::UGate | AstType::HadamardGate => u,
                AstType::CCXGate => ccx,
                _ => cx,
            };
            self.seed_gate_alias(alias, ty, target);
        }
    }

    fn seed_angle(&mut self, name: &str, value: f64) {
        let ident = self
            .idents
            .intern(name, ANGLE_BITS, AstType::Angle, self.contexts.global());
        self.idents.get_mut(ident).polymorphic_name = Some(name.to_string());

        let node = self.arena.alloc(
            Location::default(),
            self.contexts.global(),
            NodeKind::MpDecimalLiteral {
                value,
                bits: ANGLE_BITS,
            },
        );

        if let Ok(entry) =
            self.symbols
                .register(&mut self.idents, &mut self.contexts, ident, AstType::Angle)
        {
            self.symbols.set_value(entry, node, AstType::Angle);
            // Parameter names carry no reserved value but still survive the
            // whole parse, so both kinds pin their entries.
            self.symbols.get_mut(entry).do_not_delete = true;
        }

        let mut mangler = Mangler::new(false);
        mangler.type_size_identifier(AstType::Angle, ANGLE_BITS, name);
        self.idents.get_mut(ident).mangled_name = Some(mangler.finish());
    }

    fn seed_gate(
        &mut self,
        name: &str,
        ty: AstType,
        params: Vec<IdentId>,
        qubit_count: u32,
    ) -> NodeId {
        let ident = self
            .idents
            .intern(name, GATE_BITS, ty, self.contexts.global());
        self.idents.get_mut(ident).polymorphic_name = Some(name.to_string());

        let qubits: Vec<IdentId> = (0..qubit_count)
            .map(|i| {
                self.idents.create(
                    &format!("{}:{i}", name.to_lowercase()),
                    1,
                    AstType::GateQubitParam,
                    self.contexts.global(),
                )
            })
            .collect();

        let mut mangler = Mangler::new(false);
        mangler.type_size_identifier(ty, GATE_BITS, name);
        for (i, &param) in params.iter().enumerate() {
            let param_name = self.idents.get(param).name.clone();
            mangler.gate_param(i, AstType::Angle, ANGLE_BITS, &param_name);
        }
        for (i, &qubit) in qubits.iter().enumerate() {
            let qubit_name = self.idents.get(qubit).name.clone();
            mangler.qubit_target(i, &qubit_name);
        }
        self.idents.get_mut(ident).mangled_name = Some(mangler.finish());

        let node = self.arena.alloc(
            Location::default(),
            self.contexts.global(),
            NodeKind::GateDecl(GateDecl {
                kind: ty,
                ident,
                params,
                qubits,
                body: Vec::new(),
            }),
        );

        if let Ok(entry) = self
            .symbols
            .register(&mut self.idents, &mut self.contexts, ident, ty)
        {
            self.symbols.set_value(entry, node, ty);
            self.symbols.get_mut(entry).do_not_delete = true;
        }
        node
    }

    fn seed_gate_alias(&mut self, alias: &str, ty: AstType, target: NodeId) {
        let ident = self
            .idents
            .intern(alias, GATE_BITS, ty, self.contexts.global());
        let canonical = match &self.arena.get(target).kind {
            NodeKind::GateDecl(decl) => self.idents.get(decl.ident).name.clone(),
            _ => alias.to_string(),
        };
        self.idents.get_mut(ident).polymorphic_name = Some(canonical);

        let mut mangler = Mangler::new(false);
        mangler.type_size_identifier(ty, GATE_BITS, alias);
        self.idents.get_mut(ident).mangled_name = Some(mangler.finish());

        if let Ok(entry) = self
            .symbols
            .register(&mut self.idents, &mut self.contexts, ident, ty)
        {
            self.symbols.set_value(entry, target, ty);
            self.symbols.get_mut(entry).do_not_delete = true;
        }
    }

    /// Updates the source position stamped on subsequently built nodes.
    pub fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    /// The position nodes are currently stamped with.
    #[must_use]
    pub fn location(&self) -> Location {
        self.location
    }

    /// Opens a nested declaration context.
    pub fn push_context(&mut self, kind: ContextKind) -> oqasm_ast::ast::ContextId {
        self.contexts.push(kind)
    }

    /// Closes the current declaration context. Underflow is an ICE.
    pub fn pop_context(&mut self) {
        if self.contexts.pop().is_err() {
            self.report(ErrorKind::ContextUnderflow);
        }
    }

    /// Appends a top-level statement to the translation unit.
    pub fn add_statement(&mut self, node: NodeId) {
        self.statements.push(node);
    }

    /// The translation unit: top-level declarations in source order.
    #[must_use]
    pub fn translation_unit(&self) -> &[NodeId] {
        &self.statements
    }

    /// The symbol table, for downstream queries.
    #[must_use]
    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbols
    }

    /// A demangler for signature inspection.
    #[must_use]
    pub fn demangler(&self) -> Demangler {
        Demangler::new()
    }

    /// Verifies that an identifier is still usable from the current position:
    /// its declaration context must be alive, unless the symbol is global or
    /// interned. Reports `OutOfScope` and returns false otherwise.
    pub fn check_identifier(&mut self, id: IdentId) -> bool {
        let (scope, context, name) = {
            let identifier = self.idents.get(id);
            (
                identifier.symbol_scope,
                identifier.declaration_context,
                identifier.name.clone(),
            )
        };
        if scope == SymbolScope::Global || self.idents.is_interned(id) {
            return true;
        }
        if !self.contexts.get(context).is_alive() {
            self.report(ErrorKind::OutOfScope(name));
            return false;
        }
        true
    }

    /// Reports an [`ErrorKind`] at the current location.
    pub fn report(&mut self, kind: ErrorKind) {
        let diagnostic = Diagnostic::new(self.location, kind);
        self.diagnostics.report(diagnostic);
    }

    /// Reports a warning at the current location.
    pub fn warn(&mut self, message: &str) {
        self.diagnostics
            .emit(self.location, message, DiagLevel::Warning);
    }

    /// True once an ICE has been reported; the caller must stop feeding the
    /// session.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.diagnostics.is_fatal()
    }
}

impl Default for FrontendSession {
    fn default() -> Self {
        Self::new()
    }
}

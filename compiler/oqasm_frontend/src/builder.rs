// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The builder façade: one `create_*` entry point per node kind, implemented
//! as methods on [`FrontendSession`]. Every constructor (a) allocates the
//! node, (b) stamps it with the current context and location, (c) registers
//! its identifier if it has one, (d) mangles it, and (e) inserts it into the
//! symbol table. Failures produce error-tagged nodes and exactly one
//! diagnostic; nothing here panics on bad input.

use crate::convert::is_legal_conversion;
use crate::diagnostic::ErrorKind;
use crate::session::FrontendSession;
use crate::symbol::RegisterError;
use crate::validate::{
    self, can_be_assigned_to, effective_bits, effective_type, ValidationError,
};
use num_bigint::BigInt;
use num_complex::Complex64;
use oqasm_ast::ast::{
    AliasKind, CallExpr, CallableDecl, DefcalDecl, GateDecl, LengthUnit, ModifierTarget, NodeId,
    NodeKind, DOUBLE_BITS, FLOAT_BITS, GATE_BITS, INT_BITS, LONG_DOUBLE_BITS,
};
use oqasm_ast::ast_type::AstType;
use oqasm_ast::ident::{AngleKind, IdentFlags, IdentId, RefId, reference_bits_of, reference_type_of};
use oqasm_ast::op::OpType;
use oqasm_ast::string_utils::{self, ParsedIndex};
use oqasm_mangle::mangler::array_element_type;
use oqasm_mangle::Mangler;

impl FrontendSession {
    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let location = self.location();
        let context = self.contexts.current();
        self.arena.alloc(location, context, kind)
    }

    /// Allocates an `ExpressionError` node and reports its diagnostic.
    pub fn expression_error(&mut self, kind: ErrorKind, ident: Option<IdentId>) -> NodeId {
        let message = kind.to_string();
        self.report(kind);
        self.alloc(NodeKind::ExpressionError { message, ident })
    }

    /// Allocates a `StatementError` node and reports its diagnostic.
    pub fn statement_error(&mut self, kind: ErrorKind, ident: Option<IdentId>) -> NodeId {
        let message = kind.to_string();
        self.report(kind);
        self.alloc(NodeKind::StatementError { message, ident })
    }

    /// Threads a parser-reported syntax error into the tree.
    pub fn create_syntax_error(&mut self, message: &str) -> NodeId {
        self.report(ErrorKind::SyntaxError(message.to_string()));
        self.alloc(NodeKind::SyntaxError {
            message: message.to_string(),
        })
    }

    fn register_error_kind(err: &RegisterError) -> ErrorKind {
        match err {
            RegisterError::Duplicate(name) => ErrorKind::DuplicateDefinition(name.clone()),
            RegisterError::Redeclaration(name) => ErrorKind::Redeclaration(name.clone()),
            RegisterError::ShadowsGlobal(name) => ErrorKind::ShadowsGlobal(name.clone()),
        }
    }

    fn validation_error_kind(err: &ValidationError) -> ErrorKind {
        match err {
            ValidationError::TypeMismatch { op, left, right } => ErrorKind::TypeMismatch {
                op: op.name().to_string(),
                left: left.name().to_string(),
                right: right.name().to_string(),
            },
            ValidationError::NotAnLvalue(name) => ErrorKind::NotAnLvalue(name.clone()),
            ValidationError::OutOfBoundsIndex { name, index, size } => {
                ErrorKind::OutOfBoundsIndex {
                    name: name.clone(),
                    index: *index,
                    size: *size,
                }
            }
            ValidationError::AssignmentToReserved(name) => {
                ErrorKind::AssignmentToReserved(name.clone())
            }
        }
    }

    // ------------------------------------------------------------------
    // Identifiers.
    // ------------------------------------------------------------------

    /// Finds or creates an identifier for a name reference. An interned
    /// identifier or a visible declaration with the same `(name, bits,
    /// type)` signature is reused; otherwise a new identifier is created and
    /// registered in the current context.
    pub fn create_identifier(&mut self, name: &str, bits: u32, ty: AstType) -> IdentId {
        if let Some(id) = self.idents.find_interned(name, bits, ty) {
            return id;
        }
        if let Some(entry) = self.symbols.lookup_name(&self.contexts, name) {
            let candidate = entry.ident;
            let existing = self.idents.get(candidate);
            if existing.bits == bits && existing.symbol_type == ty {
                return candidate;
            }
        }
        self.declare_ident(name, bits, ty)
    }

    /// Always creates a fresh identifier and registers it; used by the
    /// declaration constructors so that shadowing produces a new symbol
    /// rather than reusing the outer one.
    fn declare_ident(&mut self, name: &str, bits: u32, ty: AstType) -> IdentId {
        let context = self.contexts.current();
        let id = self.idents.create(name, bits, ty, context);
        match self
            .symbols
            .register(&mut self.idents, &mut self.contexts, id, ty)
        {
            Ok(_) => self.mangle_identifier(id, false),
            Err(err) => self.report(Self::register_error_kind(&err)),
        }
        id
    }

    /// Builds the subscripted reference for an indexed name like `q[3]` or
    /// `%q:3`, resolving the reference type from the container.
    pub fn find_or_create_indexed_identifier(&mut self, name: &str) -> Option<RefId> {
        let parsed = string_utils::parse_name(name);
        let base_entry = self.symbols.lookup_name(&self.contexts, &parsed.base);
        let base = match base_entry {
            Some(entry) => entry.ident,
            None => {
                self.report(ErrorKind::UnknownIdentifier(parsed.base.clone()));
                return None;
            }
        };
        let (container_ty, element_bits) = {
            let identifier = self.idents.get(base);
            (identifier.symbol_type, identifier.bits)
        };
        let index = match parsed.index {
            Some(ParsedIndex::Numeric(i)) => i,
            // Named subscripts resolve at evaluation; record index zero.
            Some(ParsedIndex::Named(_)) | None => 0,
        };
        let reference_type = reference_type_of(container_ty);
        let bits = reference_bits_of(container_ty, element_bits);
        Some(self.idents.create_ref(base, index, reference_type, bits))
    }

    /// Records that an identifier names a computed value, remembering the
    /// operation node so later passes can re-evaluate it.
    pub fn record_evaluation(&mut self, id: IdentId, node: NodeId) {
        let kind = self.arena.get(node).ast_type();
        if matches!(kind, AstType::BinaryOp | AstType::UnaryOp) {
            self.idents.get_mut(id).evaluation =
                Some(oqasm_ast::ident::Evaluation { kind, node });
        } else {
            self.report(ErrorKind::Ice(format!(
                "evaluation target must be a binary or unary op, got {kind}"
            )));
        }
    }

    /// Clones an identifier. Only the init-time interned singletons may be
    /// cloned; anything else reports `IllegalClone`.
    pub fn clone_identifier(&mut self, id: IdentId) -> Option<IdentId> {
        match self.idents.clone_ident(id) {
            Ok(clone) => Some(clone),
            Err(_) => {
                let name = self.idents.get(id).name.clone();
                self.report(ErrorKind::IllegalClone(name));
                None
            }
        }
    }

    /// Assigns the mangled name of a declared identifier. A no-op when the
    /// name is already set, unless `force` is passed.
    pub fn mangle_identifier(&mut self, id: IdentId, force: bool) {
        {
            let identifier = self.idents.get(id);
            if identifier.mangled_name.is_some() && !force {
                return;
            }
        }
        let (name, bits, ty) = {
            let identifier = self.idents.get(id);
            (
                identifier.name.clone(),
                identifier.bits,
                identifier.symbol_type,
            )
        };
        let mut mangler = Mangler::new(self.contexts.in_calibration_context());
        if ty.is_array_type() {
            let element = array_element_type(ty);
            mangler.array(element, bits, bits, &name);
        } else if ty == AstType::MpComplex {
            mangler.complex(bits, AstType::MpDecimal, bits / 2, &name);
        } else {
            mangler.type_size_identifier(ty, bits, &name);
        }
        self.idents.get_mut(id).mangled_name = Some(mangler.finish());
    }

    /// The mangling of a literal-valued identifier, stored separately from
    /// the declaration mangling.
    pub fn mangle_literal_identifier(&mut self, id: IdentId, value: NodeId) {
        let (name, bits, ty) = {
            let identifier = self.idents.get(id);
            (
                identifier.name.clone(),
                identifier.bits,
                identifier.symbol_type,
            )
        };
        let mut mangler = Mangler::new(self.contexts.in_calibration_context());
        mangler.type_size_identifier(ty, bits, &name);
        Self::mangle_value(&mut mangler, &self.arena.get(value).kind);
        self.idents.get_mut(id).mangled_literal_name = Some(mangler.finish());
    }

    fn mangle_value(mangler: &mut Mangler, kind: &NodeKind) {
        match kind {
            NodeKind::BoolLiteral(value) => mangler.uint_literal(u64::from(*value)),
            NodeKind::IntLiteral { value, .. } => mangler.int_literal(*value),
            NodeKind::FloatLiteral { value, .. }
            | NodeKind::MpDecimalLiteral { value, .. }
            | NodeKind::AngleLiteral { value, .. } => mangler.double_literal(*value),
            NodeKind::CBitLiteral { value, .. } => mangler.uint_literal(*value),
            NodeKind::StringLiteral(value) => mangler.string_literal(value),
            _ => {}
        }
    }

    /// The deterministic mangling of a cast or implicit-conversion node.
    /// Conversions are not named declarations, so this is computed on
    /// demand rather than stored.
    #[must_use]
    pub fn mangle_conversion(&self, node: NodeId) -> Option<String> {
        let (operand, from, to, bits, implicit) = match &self.arena.get(node).kind {
            NodeKind::Cast {
                operand,
                from,
                to,
                bits,
            } => (*operand, *from, *to, *bits, false),
            NodeKind::ImplicitConversion {
                operand,
                from,
                to,
                bits,
            } => (*operand, *from, *to, *bits, true),
            _ => return None,
        };
        let from_bits = effective_bits(&self.arena, &self.idents, operand);
        let mut mangler = Mangler::new(self.contexts.in_calibration_context());
        if implicit {
            mangler.implicit_conversion(to, bits, from, from_bits);
        } else {
            mangler.cast(to, bits, from, from_bits);
        }
        match &self.arena.get(operand).kind {
            NodeKind::Ident(id) => mangler.identifier(&self.idents.get(*id).name),
            kind => Self::mangle_value(&mut mangler, kind),
        }
        Some(mangler.finish())
    }

    // ------------------------------------------------------------------
    // Literals.
    // ------------------------------------------------------------------

    pub fn create_bool_literal(&mut self, value: bool) -> NodeId {
        self.alloc(NodeKind::BoolLiteral(value))
    }

    pub fn create_int_literal(&mut self, value: i64) -> NodeId {
        self.alloc(NodeKind::IntLiteral {
            value,
            bits: INT_BITS,
            unsigned: false,
        })
    }

    pub fn create_uint_literal(&mut self, value: i64) -> NodeId {
        self.alloc(NodeKind::IntLiteral {
            value,
            bits: INT_BITS,
            unsigned: true,
        })
    }

    pub fn create_float_literal(&mut self, value: f64) -> NodeId {
        self.alloc(NodeKind::FloatLiteral {
            ty: AstType::Float,
            value,
            bits: FLOAT_BITS,
        })
    }

    pub fn create_double_literal(&mut self, value: f64) -> NodeId {
        self.alloc(NodeKind::FloatLiteral {
            ty: AstType::Double,
            value,
            bits: DOUBLE_BITS,
        })
    }

    pub fn create_long_double_literal(&mut self, value: f64) -> NodeId {
        self.alloc(NodeKind::FloatLiteral {
            ty: AstType::LongDouble,
            value,
            bits: LONG_DOUBLE_BITS,
        })
    }

    pub fn create_mp_integer_literal(&mut self, value: BigInt, bits: u32, unsigned: bool) -> NodeId {
        self.alloc(NodeKind::MpIntegerLiteral {
            value,
            bits,
            unsigned,
        })
    }

    pub fn create_mp_decimal_literal(&mut self, value: f64, bits: u32) -> NodeId {
        self.alloc(NodeKind::MpDecimalLiteral { value, bits })
    }

    pub fn create_mp_complex_literal(&mut self, value: Complex64, bits: u32) -> NodeId {
        self.alloc(NodeKind::MpComplexLiteral { value, bits })
    }

    pub fn create_string_literal(&mut self, value: &str) -> NodeId {
        self.alloc(NodeKind::StringLiteral(value.to_string()))
    }

    /// An angle literal; the subtype is recognized from the name (`theta`,
    /// `θ`, ...) when one applies.
    pub fn create_angle_literal(&mut self, value: f64, bits: u32, name: &str) -> NodeId {
        self.alloc(NodeKind::AngleLiteral {
            value,
            bits,
            kind: AngleKind::from_name(name),
        })
    }

    pub fn create_cbit_literal(&mut self, width: u32, value: u64) -> NodeId {
        self.alloc(NodeKind::CBitLiteral { width, value })
    }

    pub fn create_duration_literal(&mut self, value: f64, unit: LengthUnit) -> NodeId {
        self.alloc(NodeKind::DurationLiteral { value, unit })
    }

    /// An identifier expression node.
    pub fn create_ident_expr(&mut self, ident: IdentId) -> NodeId {
        self.alloc(NodeKind::Ident(ident))
    }

    /// An indexed-identifier expression node.
    pub fn create_ident_ref_expr(&mut self, reference: RefId) -> NodeId {
        self.alloc(NodeKind::IdentRef(reference))
    }

    // ------------------------------------------------------------------
    // Expressions.
    // ------------------------------------------------------------------

    /// Builds `left op right` after validation. Assignments check the left
    /// side for assignability and coerce the right side when the conversion
    /// matrix allows it.
    pub fn create_binary_op(
        &mut self,
        left: NodeId,
        op: OpType,
        right: NodeId,
        has_parens: bool,
    ) -> NodeId {
        let mut right = right;
        if op.is_assignment() {
            if let Err(err) = can_be_assigned_to(
                &self.arena,
                &self.idents,
                &self.symbols,
                &self.contexts,
                left,
            ) {
                return self.expression_error(Self::validation_error_kind(&err), None);
            }

            let lty = effective_type(&self.arena, &self.idents, left);
            let rty = effective_type(&self.arena, &self.idents, right);
            if lty != rty && !rty.is_error_type() && is_legal_conversion(rty, lty) {
                let bits = effective_bits(&self.arena, &self.idents, left);
                right = self.create_implicit_conversion(right, lty, bits);
            }
        }

        let mut soft_warning = None;
        match validate::validate_binary(
            &self.arena,
            &self.idents,
            op,
            left,
            right,
            &mut soft_warning,
        ) {
            Ok(result_type) => {
                if let Some(warning) = soft_warning {
                    self.warn(&warning);
                }
                self.alloc(NodeKind::Binary {
                    op,
                    left,
                    right,
                    has_parens,
                    result_type,
                })
            }
            Err(err) => self.expression_error(Self::validation_error_kind(&err), None),
        }
    }

    /// Builds `op expr` after validation.
    pub fn create_unary_op(
        &mut self,
        op: OpType,
        operand: NodeId,
        has_parens: bool,
        is_lvalue: bool,
    ) -> NodeId {
        match validate::validate_unary(&self.arena, &self.idents, op, operand) {
            Ok(result_type) => self.alloc(NodeKind::Unary {
                op,
                operand,
                has_parens,
                is_lvalue,
                result_type,
            }),
            Err(err) => self.expression_error(Self::validation_error_kind(&err), None),
        }
    }

    /// Wraps a target as an operator application, for mangling.
    pub fn create_operator(&mut self, op: OpType, target: NodeId) -> NodeId {
        self.alloc(NodeKind::Operator { op, target })
    }

    /// Wraps a target as the operand of an enclosing operator, for mangling.
    pub fn create_operand(&mut self, target: NodeId) -> NodeId {
        self.alloc(NodeKind::Operand { target })
    }

    /// An explicit cast. Illegal source/target pairs become `BadCast` nodes.
    pub fn create_cast(&mut self, operand: NodeId, to: AstType, bits: u32) -> NodeId {
        let from = effective_type(&self.arena, &self.idents, operand);
        if from.is_error_type() {
            return operand;
        }
        if is_legal_conversion(from, to) {
            self.alloc(NodeKind::Cast {
                operand,
                from,
                to,
                bits,
            })
        } else {
            let kind = ErrorKind::BadCast {
                from: from.name().to_string(),
                to: to.name().to_string(),
            };
            let message = kind.to_string();
            self.report(kind);
            self.alloc(NodeKind::BadCast {
                operand,
                from,
                to,
                message,
            })
        }
    }

    /// A conversion synthesized by the validator. Illegal pairs become
    /// `BadImplicitConversion` nodes.
    pub fn create_implicit_conversion(
        &mut self,
        operand: NodeId,
        to: AstType,
        bits: u32,
    ) -> NodeId {
        let from = effective_type(&self.arena, &self.idents, operand);
        if from.is_error_type() {
            return operand;
        }
        if is_legal_conversion(from, to) {
            self.alloc(NodeKind::ImplicitConversion {
                operand,
                from,
                to,
                bits,
            })
        } else {
            let kind = ErrorKind::BadImplicitConversion {
                from: from.name().to_string(),
                to: to.name().to_string(),
            };
            let message = kind.to_string();
            self.report(kind);
            self.alloc(NodeKind::BadImplicitConversion {
                operand,
                from,
                to,
                message,
            })
        }
    }

    pub fn create_complex_expression(&mut self, real: NodeId, imag: NodeId, bits: u32) -> NodeId {
        self.alloc(NodeKind::Complex { real, imag, bits })
    }

    pub fn create_initializer_list(&mut self, elements: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::InitializerList { elements })
    }

    // ------------------------------------------------------------------
    // Declarations.
    // ------------------------------------------------------------------

    /// A classical declaration. The initializer is coerced to the declared
    /// type through the conversion matrix when needed.
    pub fn create_declaration(
        &mut self,
        name: &str,
        ty: AstType,
        bits: u32,
        initializer: Option<NodeId>,
        is_const: bool,
    ) -> NodeId {
        let ident = self.declare_ident(name, bits, ty);

        let initializer = initializer.map(|init| {
            let init_ty = effective_type(&self.arena, &self.idents, init);
            if init_ty != ty && !init_ty.is_error_type() {
                self.create_implicit_conversion(init, ty, bits)
            } else {
                init
            }
        });

        let node = self.alloc(NodeKind::Declaration {
            ident,
            ty,
            bits,
            initializer,
            is_const,
        });
        if let Some(entry) = self.idents.get(ident).symbol_table_entry {
            self.symbols.set_value(entry, node, ty);
        }
        node
    }

    /// A gate definition. The name is mangled with the full signature before
    /// registration; a second definition of the same gate name reports
    /// `ShadowsGlobal` and yields an error statement.
    pub fn create_gate_declaration(
        &mut self,
        name: &str,
        params: Vec<IdentId>,
        qubits: Vec<IdentId>,
        body: Vec<NodeId>,
        body_context: oqasm_ast::ast::ContextId,
    ) -> NodeId {
        let mut mangler = Mangler::new(self.contexts.in_calibration_context());
        mangler.type_size_identifier(AstType::Gate, GATE_BITS, name);
        for (i, &param) in params.iter().enumerate() {
            let (param_name, bits) = {
                let identifier = self.idents.get(param);
                (identifier.name.clone(), identifier.bits)
            };
            mangler.gate_param(i, AstType::Angle, bits, &param_name);
        }
        for (i, &qubit) in qubits.iter().enumerate() {
            let qubit_name = self.idents.get(qubit).name.clone();
            mangler.qubit_target(i, &qubit_name);
        }
        let mangled = mangler.finish();

        let ident = self
            .idents
            .create(name, GATE_BITS, AstType::Gate, self.contexts.current());
        self.idents.get_mut(ident).mangled_name = Some(mangled);

        let entry = match self.symbols.register(
            &mut self.idents,
            &mut self.contexts,
            ident,
            AstType::Gate,
        ) {
            Ok(entry) => entry,
            Err(err) => {
                return self.statement_error(Self::register_error_kind(&err), Some(ident));
            }
        };

        for &param in &params {
            let identifier = self.idents.get_mut(param);
            identifier.flags |= IdentFlags::GATE_LOCAL;
        }
        if qubits.is_empty() {
            self.idents.get_mut(ident).flags |= IdentFlags::NO_QUBIT;
        }

        let node = self.alloc(NodeKind::GateDecl(GateDecl {
            kind: AstType::Gate,
            ident,
            params: params.clone(),
            qubits: qubits.clone(),
            body,
        }));
        self.symbols.set_value(entry, node, AstType::Gate);

        let mut transferable: Vec<IdentId> = params;
        transferable.extend(qubits);
        transferable.extend(self.contexts.get(body_context).symbols().iter().copied());
        self.symbols
            .transfer_parameters(&mut self.idents, name, &transferable);
        node
    }

    /// A calibration definition. Specializations are keyed by mangled name
    /// within the defcal group; an identical respecialization reports
    /// `ShadowsGlobal`.
    pub fn create_defcal_declaration(
        &mut self,
        name: &str,
        kind: AstType,
        params: Vec<NodeId>,
        qubits: Vec<IdentId>,
        body: Vec<NodeId>,
        body_context: oqasm_ast::ast::ContextId,
    ) -> NodeId {
        debug_assert!(kind.is_defcal_type());

        let mut mangler = Mangler::new(true);
        mangler.type_size_identifier(kind, GATE_BITS, name);
        for (i, &param) in params.iter().enumerate() {
            let ty = effective_type(&self.arena, &self.idents, param);
            let bits = effective_bits(&self.arena, &self.idents, param);
            let param_name = match &self.arena.get(param).kind {
                NodeKind::Ident(id) => self.idents.get(*id).name.clone(),
                _ => format!("arg{i}"),
            };
            mangler.defcal_param(i, ty, bits, &param_name);
        }
        for (i, &qubit) in qubits.iter().enumerate() {
            let qubit_name = self.idents.get(qubit).name.clone();
            mangler.qubit_target(i, &qubit_name);
        }
        let mangled = mangler.finish();

        let ident = self
            .idents
            .create(name, GATE_BITS, kind, self.contexts.current());
        self.idents.get_mut(ident).mangled_name = Some(mangled);

        let entry = match self
            .symbols
            .register(&mut self.idents, &mut self.contexts, ident, kind)
        {
            Ok(entry) => entry,
            Err(err) => {
                return self.statement_error(Self::register_error_kind(&err), Some(ident));
            }
        };

        let node = self.alloc(NodeKind::DefcalDecl(DefcalDecl {
            kind,
            ident,
            params,
            qubits: qubits.clone(),
            body,
        }));
        self.symbols.set_value(entry, node, kind);

        let mut transferable = qubits;
        transferable.extend(self.contexts.get(body_context).symbols().iter().copied());
        self.symbols
            .transfer_parameters(&mut self.idents, name, &transferable);
        node
    }

    /// A classical function definition.
    pub fn create_function_declaration(
        &mut self,
        name: &str,
        params: Vec<IdentId>,
        result_type: AstType,
        result_bits: u32,
        body: Vec<NodeId>,
        body_context: oqasm_ast::ast::ContextId,
    ) -> NodeId {
        let mut mangler = Mangler::new(self.contexts.in_calibration_context());
        mangler.type_size_identifier(AstType::Function, GATE_BITS, name);
        for (i, &param) in params.iter().enumerate() {
            let (param_name, bits, ty) = {
                let identifier = self.idents.get(param);
                (
                    identifier.name.clone(),
                    identifier.bits,
                    identifier.symbol_type,
                )
            };
            mangler.func_param(i, ty, bits, &param_name);
        }
        if result_type != AstType::Undefined {
            mangler.func_return(result_type, result_bits);
        }
        let mangled = mangler.finish();

        let ident =
            self.idents
                .create(name, GATE_BITS, AstType::Function, self.contexts.current());
        self.idents.get_mut(ident).mangled_name = Some(mangled);

        let entry = match self.symbols.register(
            &mut self.idents,
            &mut self.contexts,
            ident,
            AstType::Function,
        ) {
            Ok(entry) => entry,
            Err(err) => {
                return self.statement_error(Self::register_error_kind(&err), Some(ident));
            }
        };

        let result = (result_type != AstType::Undefined).then(|| {
            self.alloc(NodeKind::Result {
                ty: result_type,
                bits: result_bits,
            })
        });

        let node = self.alloc(NodeKind::CallableDecl(CallableDecl {
            kind: AstType::Function,
            ident,
            params: params.clone(),
            body,
            result,
        }));
        self.symbols.set_value(entry, node, AstType::Function);

        let mut transferable: Vec<IdentId> = params;
        transferable.extend(self.contexts.get(body_context).symbols().iter().copied());
        self.symbols
            .transfer_parameters(&mut self.idents, name, &transferable);
        node
    }

    /// An `extern` kernel declaration. Kernels have no body; their symbols
    /// carry extern scope.
    pub fn create_kernel_declaration(
        &mut self,
        name: &str,
        params: Vec<IdentId>,
        result_type: AstType,
        result_bits: u32,
    ) -> NodeId {
        let mut mangler = Mangler::new(self.contexts.in_calibration_context());
        mangler.type_size_identifier(AstType::Kernel, GATE_BITS, name);
        for (i, &param) in params.iter().enumerate() {
            let (param_name, bits, ty) = {
                let identifier = self.idents.get(param);
                (
                    identifier.name.clone(),
                    identifier.bits,
                    identifier.symbol_type,
                )
            };
            mangler.kernel_param(i, ty, bits, &param_name);
        }
        if result_type != AstType::Undefined {
            mangler.func_return(result_type, result_bits);
        }
        let mangled = mangler.finish();

        let ident =
            self.idents
                .create(name, GATE_BITS, AstType::Kernel, self.contexts.current());
        self.idents.get_mut(ident).mangled_name = Some(mangled);

        let entry = match self.symbols.register(
            &mut self.idents,
            &mut self.contexts,
            ident,
            AstType::Kernel,
        ) {
            Ok(entry) => entry,
            Err(err) => {
                return self.statement_error(Self::register_error_kind(&err), Some(ident));
            }
        };
        self.idents.get_mut(ident).symbol_scope = oqasm_ast::ident::SymbolScope::Extern;

        let result = (result_type != AstType::Undefined).then(|| {
            self.alloc(NodeKind::Result {
                ty: result_type,
                bits: result_bits,
            })
        });

        let node = self.alloc(NodeKind::CallableDecl(CallableDecl {
            kind: AstType::Kernel,
            ident,
            params,
            body: Vec::new(),
            result,
        }));
        self.symbols.set_value(entry, node, AstType::Kernel);
        node
    }

    // ------------------------------------------------------------------
    // Calls.
    // ------------------------------------------------------------------

    fn declared_result(&mut self, callee_value: Option<NodeId>) -> Option<NodeId> {
        let decl = callee_value?;
        let (ty, bits) = match &self.arena.get(decl).kind {
            NodeKind::CallableDecl(decl) => {
                let result = decl.result?;
                match &self.arena.get(result).kind {
                    NodeKind::Result { ty, bits } => (*ty, *bits),
                    _ => return None,
                }
            }
            _ => return None,
        };
        Some(self.alloc(NodeKind::Result { ty, bits }))
    }

    pub fn create_function_call(&mut self, name: &str, args: Vec<NodeId>) -> NodeId {
        let Some(entry) = self.symbols.lookup_global(name) else {
            return self.expression_error(ErrorKind::UnknownIdentifier(name.to_string()), None);
        };
        if entry.value_type != AstType::Function {
            return self.expression_error(ErrorKind::UnknownIdentifier(name.to_string()), None);
        }
        let callee = entry.ident;
        let value = entry.value;
        let result = self.declared_result(value);
        self.alloc(NodeKind::Call(CallExpr {
            kind: AstType::FunctionCall,
            callee,
            args,
            qubits: Vec::new(),
            result,
            modifier: None,
            modifier_type: AstType::Undefined,
        }))
    }

    pub fn create_kernel_call(&mut self, name: &str, args: Vec<NodeId>) -> NodeId {
        let Some(entry) = self.symbols.lookup_global(name) else {
            return self.expression_error(ErrorKind::UnknownIdentifier(name.to_string()), None);
        };
        if entry.value_type != AstType::Kernel {
            return self.expression_error(ErrorKind::UnknownIdentifier(name.to_string()), None);
        }
        let callee = entry.ident;
        let value = entry.value;
        let result = self.declared_result(value);
        self.alloc(NodeKind::Call(CallExpr {
            kind: AstType::KernelCall,
            callee,
            args,
            qubits: Vec::new(),
            result,
            modifier: None,
            modifier_type: AstType::Undefined,
        }))
    }

    /// A gate call binding angle arguments and qubit operands.
    pub fn create_gate_call(
        &mut self,
        name: &str,
        args: Vec<NodeId>,
        qubits: Vec<IdentId>,
    ) -> NodeId {
        let Some(entry) = self.symbols.find_gate(name) else {
            return self.expression_error(ErrorKind::UnknownIdentifier(name.to_string()), None);
        };
        let callee = entry.ident;
        self.alloc(NodeKind::Call(CallExpr {
            kind: AstType::GateCall,
            callee,
            args,
            qubits,
            result: None,
            modifier: None,
            modifier_type: AstType::Undefined,
        }))
    }

    /// A defcal call; the callee group must have at least one registered
    /// specialization.
    pub fn create_defcal_call(
        &mut self,
        name: &str,
        args: Vec<NodeId>,
        qubits: Vec<IdentId>,
    ) -> NodeId {
        let callee = match self.symbols.defcal_group(name) {
            Some(specs) => specs
                .values()
                .next()
                .map(|&id| self.symbols.get(id).ident),
            None => None,
        };
        let Some(callee) = callee else {
            return self.expression_error(ErrorKind::UnknownIdentifier(name.to_string()), None);
        };
        self.alloc(NodeKind::Call(CallExpr {
            kind: AstType::DefcalCall,
            callee,
            args,
            qubits,
            result: None,
            modifier: None,
            modifier_type: AstType::Undefined,
        }))
    }

    // ------------------------------------------------------------------
    // Gate modifiers.
    // ------------------------------------------------------------------

    /// A gate modifier wrapping a gate, another modifier, or a gphase
    /// expression. `argument` carries the `pow` exponent or `gphase` angle.
    pub fn create_gate_modifier(
        &mut self,
        kind: AstType,
        argument: Option<NodeId>,
        target: NodeId,
    ) -> NodeId {
        debug_assert!(kind.is_gate_modifier_type());

        let target_kind = match self.modifier_target(target) {
            Some(target_kind) => target_kind,
            None => {
                let name = self.arena.get(target).ast_type().name().to_string();
                return self.expression_error(ErrorKind::InvalidModifierTarget(name), None);
            }
        };

        if kind == AstType::GatePower {
            if let Some(argument) = argument {
                let ty = effective_type(&self.arena, &self.idents, argument);
                if !ty.is_integer_type() && !ty.is_float_type() {
                    return self.expression_error(
                        ErrorKind::TypeMismatch {
                            op: "pow".to_string(),
                            left: ty.name().to_string(),
                            right: AstType::Int.name().to_string(),
                        },
                        None,
                    );
                }
            }
        }

        self.alloc(NodeKind::GateModifier {
            kind,
            argument,
            target: target_kind,
        })
    }

    fn modifier_target(&self, target: NodeId) -> Option<ModifierTarget> {
        let ty = self.arena.get(target).ast_type();
        if ty.is_gate_type() {
            return Some(ModifierTarget::Gate(target));
        }
        match ty {
            AstType::GateCall | AstType::GateQOp => Some(ModifierTarget::GateQOp(target)),
            AstType::GateControl => Some(ModifierTarget::Control(target)),
            AstType::GateNegControl => Some(ModifierTarget::NegControl(target)),
            AstType::GateInverse => Some(ModifierTarget::Inverse(target)),
            AstType::GatePower => Some(ModifierTarget::Power(target)),
            AstType::GPhaseExpression => Some(ModifierTarget::GPhase(target)),
            AstType::GateGPhaseExpression => Some(ModifierTarget::GateGPhase(target)),
            _ => None,
        }
    }

    /// Records a modifier on a gate call, updating the call's modifier slot
    /// and recorded modifier type.
    pub fn apply_modifier(&mut self, call: NodeId, modifier: NodeId) {
        let modifier_type = self.arena.get(modifier).ast_type();
        let is_gate_call = matches!(
            &self.arena.get(call).kind,
            NodeKind::Call(expr) if expr.kind == AstType::GateCall
        );
        if !is_gate_call {
            let name = self.arena.get(call).ast_type().name().to_string();
            self.report(ErrorKind::InvalidModifierTarget(name));
            return;
        }
        if let NodeKind::Call(expr) = &mut self.arena.get_mut(call).kind {
            expr.modifier = Some(modifier);
            expr.modifier_type = modifier_type;
        }
    }

    /// A standalone global-phase expression.
    pub fn create_gphase(&mut self, theta: NodeId) -> NodeId {
        let ty = effective_type(&self.arena, &self.idents, theta);
        if !ty.is_angle_type() && !ty.is_float_type() && !ty.is_integer_type() {
            return self.expression_error(
                ErrorKind::TypeMismatch {
                    op: "gphase".to_string(),
                    left: ty.name().to_string(),
                    right: AstType::Angle.name().to_string(),
                },
                None,
            );
        }
        self.alloc(NodeKind::GPhase { theta })
    }

    // ------------------------------------------------------------------
    // Quantum entities.
    // ------------------------------------------------------------------

    /// A single qubit declaration; `$k` names bind hardware qubits.
    pub fn create_qubit(&mut self, name: &str) -> NodeId {
        let hardware = string_utils::is_hardware_qubit(name);
        let ident = self
            .idents
            .create(name, 1, AstType::Qubit, self.contexts.current());
        let entry = match self.symbols.register(
            &mut self.idents,
            &mut self.contexts,
            ident,
            AstType::Qubit,
        ) {
            Ok(entry) => entry,
            Err(err) => {
                return self.statement_error(Self::register_error_kind(&err), Some(ident));
            }
        };
        self.mangle_identifier(ident, false);
        let node = self.alloc(NodeKind::Qubit { ident, hardware });
        self.symbols.set_value(entry, node, AstType::Qubit);
        node
    }

    /// A qubit register of `size` individually addressable qubits.
    pub fn create_qubit_container(&mut self, name: &str, size: u32) -> NodeId {
        let ident =
            self.idents
                .create(name, size, AstType::QubitContainer, self.contexts.current());
        let entry = match self.symbols.register(
            &mut self.idents,
            &mut self.contexts,
            ident,
            AstType::QubitContainer,
        ) {
            Ok(entry) => entry,
            Err(err) => {
                return self.statement_error(Self::register_error_kind(&err), Some(ident));
            }
        };
        self.mangle_identifier(ident, false);

        let qubits: Vec<NodeId> = (0..size)
            .map(|i| {
                let element = self.idents.create(
                    &string_utils::indexed_of(name, i as usize),
                    1,
                    AstType::Qubit,
                    self.contexts.current(),
                );
                self.alloc(NodeKind::Qubit {
                    ident: element,
                    hardware: false,
                })
            })
            .collect();

        let node = self.alloc(NodeKind::QubitContainer {
            ident,
            size,
            qubits,
        });
        self.symbols.set_value(entry, node, AstType::QubitContainer);
        node
    }

    /// An alias (`let` binding) over an existing qubit container.
    pub fn create_qubit_container_alias(
        &mut self,
        name: &str,
        source: &str,
        kind: AliasKind,
    ) -> NodeId {
        let Some(source_entry) = self.symbols.find_qubit(source) else {
            return self.statement_error(ErrorKind::UnknownIdentifier(source.to_string()), None);
        };
        let source_ident = source_entry.ident;
        let source_bits = self.idents.get(source_ident).bits;

        let bits = match &kind {
            AliasKind::Rebind | AliasKind::Concat(_) => source_bits,
            AliasKind::Range { start, end } => end.saturating_sub(*start),
        };

        let ident = self.idents.create(
            name,
            bits,
            AstType::QubitContainerAlias,
            self.contexts.current(),
        );
        let entry = match self.symbols.register(
            &mut self.idents,
            &mut self.contexts,
            ident,
            AstType::QubitContainerAlias,
        ) {
            Ok(entry) => entry,
            Err(err) => {
                return self.statement_error(Self::register_error_kind(&err), Some(ident));
            }
        };
        self.mangle_identifier(ident, false);

        let node = self.alloc(NodeKind::QubitContainerAlias {
            ident,
            source: source_ident,
            kind,
        });
        self.symbols
            .set_value(entry, node, AstType::QubitContainerAlias);
        node
    }

    /// A measurement; the result node, when given, receives the outcome.
    pub fn create_measure(&mut self, target: IdentId, result: Option<NodeId>) -> NodeId {
        let ty = self.idents.get(target).symbol_type;
        if !ty.is_qubit_type() {
            return self.statement_error(
                ErrorKind::TypeMismatch {
                    op: "measure".to_string(),
                    left: ty.name().to_string(),
                    right: AstType::Qubit.name().to_string(),
                },
                Some(target),
            );
        }
        self.alloc(NodeKind::Measure { target, result })
    }

    /// A reset of a qubit or register.
    pub fn create_reset(&mut self, target: IdentId) -> NodeId {
        let ty = self.idents.get(target).symbol_type;
        if !ty.is_qubit_type() {
            return self.statement_error(
                ErrorKind::TypeMismatch {
                    op: "reset".to_string(),
                    left: ty.name().to_string(),
                    right: AstType::Qubit.name().to_string(),
                },
                Some(target),
            );
        }
        self.alloc(NodeKind::Reset { target })
    }

    // ------------------------------------------------------------------
    // Statements.
    // ------------------------------------------------------------------

    pub fn create_block(&mut self, statements: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::Block { statements })
    }

    pub fn create_if(
        &mut self,
        condition: NodeId,
        then_block: NodeId,
        else_ifs: Vec<NodeId>,
        else_block: Option<NodeId>,
    ) -> NodeId {
        self.alloc(NodeKind::If {
            condition,
            then_block,
            else_ifs,
            else_block,
        })
    }

    pub fn create_else_if(&mut self, condition: NodeId, block: NodeId) -> NodeId {
        self.alloc(NodeKind::ElseIf { condition, block })
    }

    pub fn create_else(&mut self, block: NodeId) -> NodeId {
        self.alloc(NodeKind::Else { block })
    }

    /// A switch over an integer quantity. Duplicate case labels are rejected
    /// at construction.
    pub fn create_switch(
        &mut self,
        quantity: NodeId,
        cases: Vec<NodeId>,
        default: Option<NodeId>,
    ) -> NodeId {
        let ty = effective_type(&self.arena, &self.idents, quantity);
        if !ty.is_integer_type() {
            return self.statement_error(
                ErrorKind::TypeMismatch {
                    op: "switch".to_string(),
                    left: ty.name().to_string(),
                    right: AstType::Int.name().to_string(),
                },
                None,
            );
        }

        let mut seen = Vec::new();
        for &case in &cases {
            if let NodeKind::Case { label, .. } = &self.arena.get(case).kind {
                if seen.contains(label) {
                    let label = *label;
                    return self.statement_error(
                        ErrorKind::DuplicateDefinition(format!("case {label}")),
                        None,
                    );
                }
                seen.push(*label);
            }
        }

        self.alloc(NodeKind::Switch {
            quantity,
            cases,
            default,
        })
    }

    pub fn create_case(&mut self, label: i64, block: NodeId) -> NodeId {
        self.alloc(NodeKind::Case { label, block })
    }

    pub fn create_default(&mut self, block: NodeId) -> NodeId {
        self.alloc(NodeKind::Default { block })
    }

    /// A `for` loop. The induction variable is flagged, and declarations in
    /// the loop body that shadow it are reported as warnings.
    pub fn create_for(
        &mut self,
        induction: IdentId,
        start: NodeId,
        end: NodeId,
        step: Option<NodeId>,
        block: NodeId,
        body_context: oqasm_ast::ast::ContextId,
    ) -> NodeId {
        self.idents.get_mut(induction).flags |= IdentFlags::INDUCTION_VARIABLE;

        let induction_name = self.idents.get(induction).name.clone();
        let shadowers: Vec<String> = self
            .contexts
            .get(body_context)
            .symbols()
            .iter()
            .filter(|&&id| id != induction)
            .map(|&id| self.idents.get(id).name.clone())
            .filter(|name| *name == induction_name)
            .collect();
        for name in shadowers {
            self.warn(&format!(
                "declaration of `{name}` shadows the loop induction variable"
            ));
        }

        self.alloc(NodeKind::For {
            induction,
            start,
            end,
            step,
            block,
        })
    }

    pub fn create_while(&mut self, condition: NodeId, block: NodeId) -> NodeId {
        self.alloc(NodeKind::While { condition, block })
    }

    pub fn create_do_while(&mut self, block: NodeId, condition: NodeId) -> NodeId {
        self.alloc(NodeKind::DoWhile { block, condition })
    }

    pub fn create_break(&mut self) -> NodeId {
        self.alloc(NodeKind::Break)
    }

    pub fn create_continue(&mut self) -> NodeId {
        self.alloc(NodeKind::Continue)
    }

    pub fn create_return(&mut self, value: Option<NodeId>) -> NodeId {
        self.alloc(NodeKind::Return { value })
    }

    /// A `delay` instruction; the duration must be a time or integer
    /// expression.
    pub fn create_delay(&mut self, duration: NodeId, targets: Vec<IdentId>) -> NodeId {
        let ty = effective_type(&self.arena, &self.idents, duration);
        if !ty.is_time_type() && !ty.is_integer_type() {
            return self.statement_error(
                ErrorKind::TypeMismatch {
                    op: "delay".to_string(),
                    left: ty.name().to_string(),
                    right: AstType::Duration.name().to_string(),
                },
                None,
            );
        }
        self.alloc(NodeKind::Delay { duration, targets })
    }

    pub fn create_barrier(&mut self, targets: Vec<IdentId>) -> NodeId {
        self.alloc(NodeKind::Barrier { targets })
    }

    pub fn create_box(
        &mut self,
        kind: AstType,
        label: Option<IdentId>,
        duration: Option<NodeId>,
        block: NodeId,
    ) -> NodeId {
        debug_assert!(matches!(
            kind,
            AstType::BoxStatement | AstType::BoxAsStatement | AstType::BoxToStatement
        ));
        self.alloc(NodeKind::BoxStmt {
            kind,
            label,
            duration,
            block,
        })
    }

    pub fn create_pragma(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Pragma {
            text: text.to_string(),
        })
    }

    pub fn create_annotation(&mut self, name: &str, arguments: Vec<String>) -> NodeId {
        self.alloc(NodeKind::Annotation {
            name: name.to_string(),
            arguments,
        })
    }

    pub fn create_calibration_block(&mut self, statements: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::CalibrationBlock { statements })
    }

    /// A `stretch` declaration.
    pub fn create_stretch(&mut self, name: &str) -> NodeId {
        let ident = self.declare_ident(name, DOUBLE_BITS, AstType::Stretch);
        let node = self.alloc(NodeKind::Stretch { ident });
        if let Some(entry) = self.idents.get(ident).symbol_table_entry {
            self.symbols.set_value(entry, node, AstType::Stretch);
        }
        node
    }

    /// A calibration frame declaration.
    pub fn create_frame(
        &mut self,
        name: &str,
        port: Option<IdentId>,
        frequency: Option<NodeId>,
        phase: Option<NodeId>,
    ) -> NodeId {
        let ident = self.declare_ident(name, DOUBLE_BITS, AstType::Frame);
        let node = self.alloc(NodeKind::Frame {
            ident,
            port,
            frequency,
            phase,
        });
        if let Some(entry) = self.idents.get(ident).symbol_table_entry {
            self.symbols.set_value(entry, node, AstType::Frame);
        }
        node
    }

    /// A hardware port declaration.
    pub fn create_port(&mut self, name: &str, index: Option<u32>) -> NodeId {
        let ident = self.declare_ident(name, DOUBLE_BITS, AstType::Port);
        let node = self.alloc(NodeKind::Port { ident, index });
        if let Some(entry) = self.idents.get(ident).symbol_table_entry {
            self.symbols.set_value(entry, node, AstType::Port);
        }
        node
    }

    /// A waveform declaration.
    pub fn create_waveform(&mut self, name: &str, samples: Vec<NodeId>) -> NodeId {
        let ident = self.declare_ident(name, DOUBLE_BITS, AstType::Waveform);
        let node = self.alloc(NodeKind::Waveform { ident, samples });
        if let Some(entry) = self.idents.get(ident).symbol_table_entry {
            self.symbols.set_value(entry, node, AstType::Waveform);
        }
        node
    }

    /// An array declaration of a specific element classification.
    pub fn create_array(
        &mut self,
        name: &str,
        ty: AstType,
        length: u32,
        element_bits: u32,
        elements: Vec<NodeId>,
        is_const: bool,
    ) -> NodeId {
        debug_assert!(ty.is_array_type());
        let context = self.contexts.current();
        let ident = self.idents.create(name, element_bits, ty, context);
        match self
            .symbols
            .register(&mut self.idents, &mut self.contexts, ident, ty)
        {
            Ok(entry) => {
                let mut mangler = Mangler::new(self.contexts.in_calibration_context());
                mangler.array(array_element_type(ty), length, element_bits, name);
                self.idents.get_mut(ident).mangled_name = Some(mangler.finish());

                let node = self.alloc(NodeKind::Array {
                    ty,
                    length,
                    element_bits,
                    elements,
                    is_const,
                });
                self.symbols.set_value(entry, node, ty);
                node
            }
            Err(err) => self.statement_error(Self::register_error_kind(&err), Some(ident)),
        }
    }

    /// A `duration` declaration with a literal value.
    pub fn create_duration(&mut self, name: &str, value: f64, unit: LengthUnit) -> NodeId {
        let ident = self.declare_ident(name, DOUBLE_BITS, AstType::Duration);
        let node = self.alloc(NodeKind::Duration { value, unit });
        if let Some(entry) = self.idents.get(ident).symbol_table_entry {
            self.symbols.set_value(entry, node, AstType::Duration);
        }
        node
    }

    /// A `durationof(...)` expression.
    pub fn create_duration_of(&mut self, target: NodeId) -> NodeId {
        self.alloc(NodeKind::DurationOf { target })
    }
}

#[cfg(test)]
mod tests;

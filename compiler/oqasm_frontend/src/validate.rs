// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The expression validator: static type inference through operator
//! applications, the per-operator legality tables, and the lvalue check.
//! This module decides; the builder reports. Every function here is pure
//! over the arena and registries.

use crate::context::ContextTracker;
use crate::convert::is_legal_conversion;
use crate::symbol::SymbolTable;
use oqasm_ast::ast::{Arena, NodeId, NodeKind};
use oqasm_ast::ast_type::AstType;
use oqasm_ast::ident::{is_reserved_angle_name, IdentFlags, IdentRegistry};
use oqasm_ast::op::OpType;

/// Why an expression failed validation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ValidationError {
    TypeMismatch {
        op: OpType,
        left: AstType,
        right: AstType,
    },
    NotAnLvalue(String),
    OutOfBoundsIndex {
        name: String,
        index: usize,
        size: usize,
    },
    AssignmentToReserved(String),
}

/// The effective type of an expression node: identifiers resolve to their
/// symbol type, operator/operand wrappers unwrap, casts and conversions
/// report their target type, operations report their inferred result.
#[must_use]
pub fn effective_type(arena: &Arena, idents: &IdentRegistry, node: NodeId) -> AstType {
    match &arena.get(node).kind {
        NodeKind::Ident(id) => {
            let identifier = idents.get(*id);
            if identifier.flags.contains(IdentFlags::COMPLEX_PART) {
                // complex.creal / complex.cimag read as mp-decimal.
                AstType::MpDecimal
            } else {
                identifier.symbol_type
            }
        }
        NodeKind::IdentRef(id) => idents.get_ref(*id).reference_type,
        NodeKind::Operator { target, .. } | NodeKind::Operand { target } => {
            effective_type(arena, idents, *target)
        }
        NodeKind::Cast { to, .. } | NodeKind::ImplicitConversion { to, .. } => *to,
        NodeKind::Binary { result_type, .. } | NodeKind::Unary { result_type, .. } => *result_type,
        NodeKind::Call(call) => call
            .result
            .map_or(AstType::Undefined, |result| {
                effective_type(arena, idents, result)
            }),
        NodeKind::Result { ty, .. } => *ty,
        NodeKind::Measure { result, .. } => result
            .map_or(AstType::Bitset, |r| effective_type(arena, idents, r)),
        other => other.ast_type(),
    }
}

/// The width an expression evaluates at, where one is recorded.
#[must_use]
pub fn effective_bits(arena: &Arena, idents: &IdentRegistry, node: NodeId) -> u32 {
    match &arena.get(node).kind {
        NodeKind::Ident(id) => idents.get(*id).bits,
        NodeKind::IdentRef(id) => idents.get_ref(*id).bits,
        NodeKind::Operator { target, .. } | NodeKind::Operand { target } => {
            effective_bits(arena, idents, *target)
        }
        NodeKind::Cast { bits, .. } | NodeKind::ImplicitConversion { bits, .. } => *bits,
        NodeKind::IntLiteral { bits, .. }
        | NodeKind::FloatLiteral { bits, .. }
        | NodeKind::MpIntegerLiteral { bits, .. }
        | NodeKind::MpDecimalLiteral { bits, .. }
        | NodeKind::MpComplexLiteral { bits, .. }
        | NodeKind::AngleLiteral { bits, .. } => *bits,
        NodeKind::CBitLiteral { width, .. } => *width,
        NodeKind::Binary { left, .. } => effective_bits(arena, idents, *left),
        NodeKind::Unary { operand, .. } => effective_bits(arena, idents, *operand),
        _ => 0,
    }
}

/// The promotion rank used to pick the wider of two operand types.
fn rank(ty: AstType) -> u8 {
    match ty {
        AstType::Bool => 1,
        AstType::Char => 2,
        AstType::Bitset => 3,
        AstType::Int => 4,
        AstType::UInt => 5,
        AstType::MpInteger => 6,
        AstType::MpUinteger => 7,
        AstType::Float => 8,
        AstType::Double => 9,
        AstType::LongDouble => 10,
        AstType::MpDecimal => 11,
        AstType::Angle => 12,
        AstType::MpComplex | AstType::ComplexExpression => 13,
        AstType::Duration | AstType::DurationOf | AstType::Stretch | AstType::Length => 14,
        _ => 0,
    }
}

/// The inferred type of a legal `left op right`. Comparisons and logical
/// operators produce bool, assignments produce the left type, everything
/// else the wider of the two operands.
#[must_use]
pub fn binary_result_type(op: OpType, left: AstType, right: AstType) -> AstType {
    if op.is_comparison() || matches!(op, OpType::LogicalAnd | OpType::LogicalOr) {
        return AstType::Bool;
    }
    if op.is_assignment() {
        return left;
    }
    if matches!(op, OpType::LeftShift | OpType::RightShift) {
        return left;
    }
    if rank(left) >= rank(right) {
        left
    } else {
        right
    }
}

/// The per-operator legality table for binary operations. A pure function of
/// the operator and the two effective operand types.
#[must_use]
#[allow(clippy::match_same_arms)]
pub fn binary_op_is_legal(op: OpType, l: AstType, r: AstType) -> bool {
    match op {
        OpType::CompEq | OpType::CompNeq => {
            (l.is_integer_type() && r.is_integer_type())
                || (l.is_integer_type() && r.is_float_type())
                || (l.is_float_type() && r.is_integer_type())
                || (l.is_float_type() && r.is_float_type())
                || (l.is_complex_type() && r.is_complex_type())
                || (l.is_angle_type() && r.is_angle_type())
                || (l.is_angle_type() && r.is_scalar_type())
                || (l.is_scalar_type() && r.is_angle_type())
                || (l.is_quantum_arithmetic_type() && r.is_quantum_arithmetic_type())
        }
        OpType::Add | OpType::AddAssign | OpType::Sub | OpType::SubAssign => {
            (l.is_scalar_type() && r.is_scalar_type())
                || (l.is_complex_type() && r.is_complex_type())
                || (l.is_angle_type() && r.is_angle_type())
                || (l.is_angle_type() && r.is_scalar_type())
                || (l.is_scalar_type() && r.is_angle_type())
                || (l.is_quantum_arithmetic_type() && r.is_numeric_type())
                || (l.is_numeric_type() && r.is_quantum_arithmetic_type())
                || (l.is_quantum_arithmetic_type() && r.is_quantum_arithmetic_type())
        }
        OpType::Mul | OpType::MulAssign | OpType::Div | OpType::DivAssign => {
            (l.is_scalar_type() && r.is_scalar_type())
                || (l.is_complex_type() && r.is_complex_type())
                || (l.is_scalar_type() && r.is_complex_type())
                || (l.is_complex_type() && r.is_scalar_type())
                || (l.is_angle_type() && r.is_scalar_type())
                || (l.is_scalar_type() && r.is_angle_type())
                || (l.is_quantum_arithmetic_type() && r.is_numeric_type())
                || (l.is_numeric_type() && r.is_quantum_arithmetic_type())
                || (l.is_quantum_arithmetic_type() && r.is_quantum_arithmetic_type())
        }
        OpType::Mod | OpType::ModAssign => l.is_integer_type() && r.is_integer_type(),
        OpType::BitAnd
        | OpType::BitAndAssign
        | OpType::BitOr
        | OpType::BitOrAssign
        | OpType::Xor
        | OpType::XorAssign
        | OpType::LeftShift
        | OpType::LeftShiftAssign
        | OpType::RightShift
        | OpType::RightShiftAssign => {
            (l.is_integer_type() && r.is_integer_type())
                || (l.is_angle_type() && r.is_integer_type())
        }
        OpType::PreInc | OpType::PreDec | OpType::PostInc | OpType::PostDec => {
            l.is_integer_type() && r.is_integer_type()
        }
        OpType::Lt | OpType::Gt | OpType::Le | OpType::Ge => {
            (l.is_integer_type() && r.is_integer_type())
                || (l.is_integer_type() && r.is_float_type())
                || (l.is_float_type() && r.is_integer_type())
                || (l.is_float_type() && r.is_float_type())
                || (l.is_complex_type() && r.is_complex_type())
                || (l.is_angle_type() && r.is_angle_type())
        }
        OpType::LogicalAnd | OpType::LogicalOr => {
            (l.is_numeric_type() || l.is_complex_type())
                && (r.is_numeric_type() || r.is_complex_type())
        }
        OpType::Pow => {
            (l.is_unpromoted_integer_type() && r.is_unpromoted_integer_type())
                || (l.is_float_type() && r.is_float_type())
                || (l.is_unpromoted_integer_type() && r.is_float_type())
                || (l.is_float_type() && r.is_unpromoted_integer_type())
                || (l.is_complex_type() && r.is_complex_type())
        }
        OpType::Assign => {
            if l.is_qubit_type() {
                return false;
            }
            if r.is_returning_type() {
                return l.is_assignable_type();
            }
            if l == AstType::Frame {
                return r.is_integer_type()
                    || r.is_float_type()
                    || r.is_angle_type()
                    || r.is_time_type()
                    || r == AstType::StringLiteral
                    || r == AstType::String;
            }
            if l.is_quantum_arithmetic_type() {
                return r.is_quantum_arithmetic_type() || r.is_integer_type();
            }
            // Everything else defers to the conversion matrix, the same
            // table the builder consults when it inserts the implicit
            // conversion for the right side.
            l.is_assignable_type() && (l == r || is_legal_conversion(r, l))
        }
        _ => false,
    }
}

/// Validates `left op right` and infers the result type. Shift, bitwise,
/// and angle-on-integer combinations that the table admits with reservations
/// are reported through `soft_warning`.
pub fn validate_binary(
    arena: &Arena,
    idents: &IdentRegistry,
    op: OpType,
    left: NodeId,
    right: NodeId,
    soft_warning: &mut Option<String>,
) -> Result<AstType, ValidationError> {
    let lty = effective_type(arena, idents, left);
    let rty = effective_type(arena, idents, right);

    // `!x` on the left of an assignment can never designate storage.
    if op.is_assignment() {
        if let NodeKind::Unary {
            op: OpType::LogicalNot,
            ..
        } = &arena.get(left).kind
        {
            return Err(ValidationError::NotAnLvalue("!".to_string()));
        }
    }

    if matches!(
        op,
        OpType::BitAnd
            | OpType::BitAndAssign
            | OpType::BitOr
            | OpType::BitOrAssign
            | OpType::Xor
            | OpType::XorAssign
            | OpType::LeftShift
            | OpType::LeftShiftAssign
            | OpType::RightShift
            | OpType::RightShiftAssign
    ) && lty.is_angle_type()
        && rty.is_integer_type()
    {
        *soft_warning = Some(
            "bitwise operations on angles are provisionally accepted pending \
             clarification of the language specification"
                .to_string(),
        );
    }

    let base = if op.is_assignment() && op != OpType::Assign {
        // Compound assignments validate under their base operator.
        op.base_of_assignment()
    } else {
        op
    };

    if binary_op_is_legal(base, lty, rty)
        || (op.is_assignment() && binary_op_is_legal(OpType::Assign, lty, rty))
    {
        Ok(binary_result_type(op, lty, rty))
    } else {
        Err(ValidationError::TypeMismatch {
            op,
            left: lty,
            right: rty,
        })
    }
}

/// Validates `op expr` and infers the result type.
pub fn validate_unary(
    arena: &Arena,
    idents: &IdentRegistry,
    op: OpType,
    operand: NodeId,
) -> Result<AstType, ValidationError> {
    let ty = effective_type(arena, idents, operand);

    match op {
        OpType::LogicalNot => {
            // `!` of a parenthesis-free compound arithmetic or comparison
            // expression silently becomes an integer constant expression on
            // the left; require parentheses.
            if let NodeKind::Binary {
                op: inner,
                has_parens,
                ..
            } = &arena.get(operand).kind
            {
                if !has_parens && (inner.is_arithmetic() || inner.is_comparison()) {
                    return Err(ValidationError::TypeMismatch {
                        op,
                        left: ty,
                        right: AstType::Undefined,
                    });
                }
            }
            if ty.is_integer_type() || ty.is_float_type() || ty.is_complex_type() {
                Ok(AstType::Bool)
            } else {
                Err(ValidationError::TypeMismatch {
                    op,
                    left: ty,
                    right: AstType::Undefined,
                })
            }
        }
        OpType::BitNot => {
            if ty.is_integer_type() || ty.is_angle_type() {
                Ok(ty)
            } else {
                Err(ValidationError::TypeMismatch {
                    op,
                    left: ty,
                    right: AstType::Undefined,
                })
            }
        }
        OpType::Rotl | OpType::Rotr | OpType::Popcount => {
            if ty.is_integer_type() {
                Ok(if op == OpType::Popcount {
                    AstType::Int
                } else {
                    ty
                })
            } else {
                Err(ValidationError::TypeMismatch {
                    op,
                    left: ty,
                    right: AstType::Undefined,
                })
            }
        }
        OpType::Sin
        | OpType::Cos
        | OpType::Tan
        | OpType::ArcSin
        | OpType::ArcCos
        | OpType::ArcTan
        | OpType::Exp
        | OpType::Ln
        | OpType::Sqrt => {
            if ty.is_unpromoted_integer_type() || ty.is_float_type() || ty.is_complex_type() {
                Ok(match ty {
                    AstType::MpDecimal | AstType::MpComplex => ty,
                    _ => AstType::Double,
                })
            } else {
                Err(ValidationError::TypeMismatch {
                    op,
                    left: ty,
                    right: AstType::Undefined,
                })
            }
        }
        OpType::Negative | OpType::Positive | OpType::Negate => {
            let legal = (ty.is_numeric_type() && ty != AstType::Bool)
                || ty.is_angle_type()
                || ty.is_complex_type()
                || ty.is_quantum_arithmetic_type();
            if legal {
                Ok(ty)
            } else {
                Err(ValidationError::TypeMismatch {
                    op,
                    left: ty,
                    right: AstType::Undefined,
                })
            }
        }
        OpType::PreInc | OpType::PreDec | OpType::PostInc | OpType::PostDec => {
            if ty.is_integer_type() {
                Ok(ty)
            } else {
                Err(ValidationError::TypeMismatch {
                    op,
                    left: ty,
                    right: AstType::Undefined,
                })
            }
        }
        _ => Err(ValidationError::TypeMismatch {
            op,
            left: ty,
            right: AstType::Undefined,
        }),
    }
}

/// The lvalue check: unwraps the target to a named identifier or an indexed
/// reference, rejects qubits, reserved angles, const declarations, and
/// out-of-bounds indices.
pub fn can_be_assigned_to(
    arena: &Arena,
    idents: &IdentRegistry,
    symbols: &SymbolTable,
    contexts: &ContextTracker,
    target: NodeId,
) -> Result<(), ValidationError> {
    match &arena.get(target).kind {
        NodeKind::Ident(id) => {
            let identifier = idents.get(*id);
            let name = identifier.name.clone();
            if is_reserved_angle_name(&name) {
                return Err(ValidationError::AssignmentToReserved(name));
            }
            if identifier.symbol_type.is_qubit_type() {
                return Err(ValidationError::NotAnLvalue(name));
            }
            if !identifier.symbol_type.is_assignable_type() {
                return Err(ValidationError::NotAnLvalue(name));
            }
            if let Some(entry) = symbols.lookup(idents, contexts, *id) {
                if let Some(value) = entry.value {
                    if is_const_value(arena, value) {
                        return Err(ValidationError::NotAnLvalue(name));
                    }
                }
            }
            Ok(())
        }
        NodeKind::IdentRef(id) => {
            let reference = idents.get_ref(*id);
            let base = idents.get(reference.ident);
            let name = base.name.clone();
            if is_reserved_angle_name(&name) {
                return Err(ValidationError::AssignmentToReserved(name));
            }

            let size = container_size(arena, idents, symbols, reference.ident);
            if let Some(size) = size {
                if reference.index >= size {
                    return Err(ValidationError::OutOfBoundsIndex {
                        name,
                        index: reference.index,
                        size,
                    });
                }
            }

            if base.symbol_type.is_qubit_type() {
                return Err(ValidationError::NotAnLvalue(name));
            }
            if let Some(entry) = base.symbol_table_entry {
                if let Some(value) = symbols.get(entry).value {
                    if is_const_value(arena, value) {
                        return Err(ValidationError::NotAnLvalue(name));
                    }
                }
            }
            Ok(())
        }
        NodeKind::Operator { target, .. } | NodeKind::Operand { target } => {
            can_be_assigned_to(arena, idents, symbols, contexts, *target)
        }
        _ => Err(ValidationError::NotAnLvalue(
            arena.get(target).ast_type().name().to_string(),
        )),
    }
}

/// The declared element count of an indexable symbol, when one is known.
fn container_size(
    arena: &Arena,
    idents: &IdentRegistry,
    symbols: &SymbolTable,
    ident: oqasm_ast::ident::IdentId,
) -> Option<usize> {
    let identifier = idents.get(ident);
    match identifier.symbol_type {
        // Bitsets and qubit containers record their width on the identifier.
        AstType::Bitset | AstType::QubitContainer | AstType::QubitContainerAlias => {
            Some(identifier.bits as usize)
        }
        ty if ty.is_array_type() => {
            let entry = identifier.symbol_table_entry?;
            let value = symbols.get(entry).value?;
            match &arena.get(value).kind {
                NodeKind::Array { length, .. } => Some(*length as usize),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Const-ness lives on the declaration or array node a symbol wraps.
fn is_const_value(arena: &Arena, value: NodeId) -> bool {
    match &arena.get(value).kind {
        NodeKind::Declaration { is_const, .. } | NodeKind::Array { is_const, .. } => *is_const,
        _ => false,
    }
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Constant-expression evaluation. Folds literal-rooted expression trees to
//! a value, following casts, implicit conversions, const declarations, and
//! the reserved constants. Non-constant inputs fold to `None`; the caller
//! decides whether that is an error.

use crate::context::ContextTracker;
use crate::symbol::SymbolTable;
use oqasm_ast::ast::{Arena, NodeId, NodeKind};
use oqasm_ast::ast_type::AstType;
use oqasm_ast::ident::{is_reserved_angle_name, IdentRegistry};
use oqasm_ast::op::OpType;

/// A folded constant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConstValue {
    Bool(bool),
    Int(i64),
    Double(f64),
}

impl ConstValue {
    /// The value as a double, for mixed-type arithmetic.
    #[must_use]
    pub fn as_double(self) -> f64 {
        match self {
            ConstValue::Bool(b) => f64::from(u8::from(b)),
            #[allow(clippy::cast_precision_loss)]
            ConstValue::Int(i) => i as f64,
            ConstValue::Double(d) => d,
        }
    }

    /// The value as an integer, when it has one exactly.
    #[must_use]
    pub fn as_int(self) -> Option<i64> {
        match self {
            ConstValue::Bool(b) => Some(i64::from(b)),
            ConstValue::Int(i) => Some(i),
            #[allow(clippy::cast_possible_truncation)]
            ConstValue::Double(d) => {
                if d.fract() == 0.0 {
                    Some(d as i64)
                } else {
                    None
                }
            }
        }
    }

    /// True unless the value is zero.
    #[must_use]
    pub fn as_bool(self) -> bool {
        match self {
            ConstValue::Bool(b) => b,
            ConstValue::Int(i) => i != 0,
            ConstValue::Double(d) => d != 0.0,
        }
    }

    fn is_double(self) -> bool {
        matches!(self, ConstValue::Double(_))
    }
}

/// Folds a node to a constant, when it is one.
#[must_use]
pub fn evaluate(
    arena: &Arena,
    idents: &IdentRegistry,
    symbols: &SymbolTable,
    contexts: &ContextTracker,
    node: NodeId,
) -> Option<ConstValue> {
    match &arena.get(node).kind {
        NodeKind::BoolLiteral(value) => Some(ConstValue::Bool(*value)),
        NodeKind::IntLiteral { value, .. } => Some(ConstValue::Int(*value)),
        NodeKind::FloatLiteral { value, .. }
        | NodeKind::MpDecimalLiteral { value, .. }
        | NodeKind::AngleLiteral { value, .. }
        | NodeKind::DurationLiteral { value, .. } => Some(ConstValue::Double(*value)),
        #[allow(clippy::cast_possible_wrap)]
        NodeKind::CBitLiteral { value, .. } => Some(ConstValue::Int(*value as i64)),
        NodeKind::Cast { operand, to, .. } | NodeKind::ImplicitConversion { operand, to, .. } => {
            let inner = evaluate(arena, idents, symbols, contexts, *operand)?;
            Some(convert(inner, *to))
        }
        NodeKind::Operator { target, .. } | NodeKind::Operand { target } => {
            evaluate(arena, idents, symbols, contexts, *target)
        }
        NodeKind::Ident(id) => {
            let identifier = idents.get(*id);
            // The reserved constants fold to their seeded values.
            if is_reserved_angle_name(&identifier.name) {
                let entry = symbols.find_angle(&identifier.name, identifier.bits)?;
                let value = entry.value?;
                return evaluate(arena, idents, symbols, contexts, value);
            }
            let entry = symbols.lookup(idents, contexts, *id)?;
            let value = entry.value?;
            match &arena.get(value).kind {
                NodeKind::Declaration {
                    is_const: true,
                    initializer: Some(init),
                    ..
                } => evaluate(arena, idents, symbols, contexts, *init),
                _ => None,
            }
        }
        NodeKind::Binary {
            op, left, right, ..
        } => {
            let lhs = evaluate(arena, idents, symbols, contexts, *left)?;
            let rhs = evaluate(arena, idents, symbols, contexts, *right)?;
            evaluate_binary(*op, lhs, rhs)
        }
        NodeKind::Unary { op, operand, .. } => {
            let value = evaluate(arena, idents, symbols, contexts, *operand)?;
            evaluate_unary(*op, value)
        }
        _ => None,
    }
}

/// Converts a folded value to the representation a target type implies.
fn convert(value: ConstValue, to: AstType) -> ConstValue {
    if to == AstType::Bool {
        return ConstValue::Bool(value.as_bool());
    }
    if to.is_integer_type() {
        if let Some(int) = value.as_int() {
            return ConstValue::Int(int);
        }
        #[allow(clippy::cast_possible_truncation)]
        return ConstValue::Int(value.as_double() as i64);
    }
    if to.is_float_type() || to.is_angle_type() {
        return ConstValue::Double(value.as_double());
    }
    value
}

fn evaluate_binary(op: OpType, lhs: ConstValue, rhs: ConstValue) -> Option<ConstValue> {
    let floating = lhs.is_double() || rhs.is_double();
    match op {
        OpType::Add | OpType::Sub | OpType::Mul | OpType::Div | OpType::Pow if floating => {
            let l = lhs.as_double();
            let r = rhs.as_double();
            let value = match op {
                OpType::Add => l + r,
                OpType::Sub => l - r,
                OpType::Mul => l * r,
                OpType::Div => {
                    if r == 0.0 {
                        return None;
                    }
                    l / r
                }
                _ => l.powf(r),
            };
            Some(ConstValue::Double(value))
        }
        OpType::Add | OpType::Sub | OpType::Mul | OpType::Div | OpType::Mod | OpType::Pow => {
            let l = lhs.as_int()?;
            let r = rhs.as_int()?;
            let value = match op {
                OpType::Add => l.checked_add(r)?,
                OpType::Sub => l.checked_sub(r)?,
                OpType::Mul => l.checked_mul(r)?,
                OpType::Div => l.checked_div(r)?,
                OpType::Mod => l.checked_rem(r)?,
                _ => l.checked_pow(u32::try_from(r).ok()?)?,
            };
            Some(ConstValue::Int(value))
        }
        OpType::BitAnd | OpType::BitOr | OpType::Xor | OpType::LeftShift | OpType::RightShift => {
            let l = lhs.as_int()?;
            let r = rhs.as_int()?;
            let value = match op {
                OpType::BitAnd => l & r,
                OpType::BitOr => l | r,
                OpType::Xor => l ^ r,
                OpType::LeftShift => l.checked_shl(u32::try_from(r).ok()?)?,
                _ => l.checked_shr(u32::try_from(r).ok()?)?,
            };
            Some(ConstValue::Int(value))
        }
        OpType::CompEq | OpType::CompNeq | OpType::Lt | OpType::Gt | OpType::Le | OpType::Ge => {
            let l = lhs.as_double();
            let r = rhs.as_double();
            let value = match op {
                OpType::CompEq => (l - r).abs() < f64::EPSILON,
                OpType::CompNeq => (l - r).abs() >= f64::EPSILON,
                OpType::Lt => l < r,
                OpType::Gt => l > r,
                OpType::Le => l <= r,
                _ => l >= r,
            };
            Some(ConstValue::Bool(value))
        }
        OpType::LogicalAnd => Some(ConstValue::Bool(lhs.as_bool() && rhs.as_bool())),
        OpType::LogicalOr => Some(ConstValue::Bool(lhs.as_bool() || rhs.as_bool())),
        _ => None,
    }
}

fn evaluate_unary(op: OpType, value: ConstValue) -> Option<ConstValue> {
    match op {
        OpType::Negative | OpType::Negate => match value {
            ConstValue::Int(i) => Some(ConstValue::Int(i.checked_neg()?)),
            ConstValue::Double(d) => Some(ConstValue::Double(-d)),
            ConstValue::Bool(_) => None,
        },
        OpType::Positive => Some(value),
        OpType::LogicalNot => Some(ConstValue::Bool(!value.as_bool())),
        OpType::BitNot => Some(ConstValue::Int(!value.as_int()?)),
        OpType::Popcount => {
            let bits = value.as_int()?;
            Some(ConstValue::Int(i64::from(bits.count_ones())))
        }
        OpType::Sin => Some(ConstValue::Double(value.as_double().sin())),
        OpType::Cos => Some(ConstValue::Double(value.as_double().cos())),
        OpType::Tan => Some(ConstValue::Double(value.as_double().tan())),
        OpType::ArcSin => Some(ConstValue::Double(value.as_double().asin())),
        OpType::ArcCos => Some(ConstValue::Double(value.as_double().acos())),
        OpType::ArcTan => Some(ConstValue::Double(value.as_double().atan())),
        OpType::Exp => Some(ConstValue::Double(value.as_double().exp())),
        OpType::Ln => {
            let operand = value.as_double();
            if operand <= 0.0 {
                return None;
            }
            Some(ConstValue::Double(operand.ln()))
        }
        OpType::Sqrt => {
            let operand = value.as_double();
            if operand < 0.0 {
                return None;
            }
            Some(ConstValue::Double(operand.sqrt()))
        }
        _ => None,
    }
}

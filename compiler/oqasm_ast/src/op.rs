// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Binary and unary operators, including the built-in math operators that the
//! language surfaces as function syntax (`sin(x)`, `popcount(b)`, ...).

use enum_iterator::Sequence;
use std::fmt::{self, Display, Formatter};

/// An operator kind. One enum covers binary, unary, and built-in operators;
/// the validator decides arity from the node kind.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Sequence)]
pub enum OpType {
    /// No operator.
    #[default]
    None,

    // Arithmetic.
    /// `+`
    Add,
    /// `+=`
    AddAssign,
    /// `-`
    Sub,
    /// `-=`
    SubAssign,
    /// `*`
    Mul,
    /// `*=`
    MulAssign,
    /// `/`
    Div,
    /// `/=`
    DivAssign,
    /// `%`
    Mod,
    /// `%=`
    ModAssign,
    /// `**`
    Pow,

    // Comparison.
    /// `==`
    CompEq,
    /// `!=`
    CompNeq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,

    // Bitwise.
    /// `&`
    BitAnd,
    /// `&=`
    BitAndAssign,
    /// `|`
    BitOr,
    /// `|=`
    BitOrAssign,
    /// `^`
    Xor,
    /// `^=`
    XorAssign,
    /// `~`
    BitNot,
    /// `<<`
    LeftShift,
    /// `<<=`
    LeftShiftAssign,
    /// `>>`
    RightShift,
    /// `>>=`
    RightShiftAssign,

    // Logical.
    /// `&&`
    LogicalAnd,
    /// `||`
    LogicalOr,
    /// `!`
    LogicalNot,

    // Assignment and sign.
    /// `=`
    Assign,
    /// Unary `-`
    Negative,
    /// Unary `+`
    Positive,
    /// Arithmetic negation of a subexpression.
    Negate,

    // Increment and decrement.
    /// Prefix `++`
    PreInc,
    /// Prefix `--`
    PreDec,
    /// Postfix `++`
    PostInc,
    /// Postfix `--`
    PostDec,

    // Built-in integer operators.
    /// `rotl(x, n)`
    Rotl,
    /// `rotr(x, n)`
    Rotr,
    /// `popcount(x)`
    Popcount,

    // Built-in math operators.
    /// `sin(x)`
    Sin,
    /// `cos(x)`
    Cos,
    /// `tan(x)`
    Tan,
    /// `arcsin(x)`
    ArcSin,
    /// `arccos(x)`
    ArcCos,
    /// `arctan(x)`
    ArcTan,
    /// `exp(x)`
    Exp,
    /// `ln(x)`
    Ln,
    /// `sqrt(x)`
    Sqrt,
}

impl OpType {
    /// The surface spelling used in diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            OpType::None => "<none>",
            OpType::Add => "+",
            OpType::AddAssign => "+=",
            OpType::Sub => "-",
            OpType::SubAssign => "-=",
            OpType::Mul => "*",
            OpType::MulAssign => "*=",
            OpType::Div => "/",
            OpType::DivAssign => "/=",
            OpType::Mod => "%",
            OpType::ModAssign => "%=",
            OpType::Pow => "**",
            OpType::CompEq => "==",
            OpType::CompNeq => "!=",
            OpType::Lt => "<",
            OpType::Gt => ">",
            OpType::Le => "<=",
            OpType::Ge => ">=",
            OpType::BitAnd => "&",
            OpType::BitAndAssign => "&=",
            OpType::BitOr => "|",
            OpType::BitOrAssign => "|=",
            OpType::Xor => "^",
            OpType::XorAssign => "^=",
            OpType::BitNot => "~",
            OpType::LeftShift => "<<",
            OpType::LeftShiftAssign => "<<=",
            OpType::RightShift => ">>",
            OpType::RightShiftAssign => ">>=",
            OpType::LogicalAnd => "&&",
            OpType::LogicalOr => "||",
            OpType::LogicalNot => "!",
            OpType::Assign => "=",
            OpType::Negative => "-",
            OpType::Positive => "+",
            OpType::Negate => "neg",
            OpType::PreInc => "++",
            OpType::PreDec => "--",
            OpType::PostInc => "++",
            OpType::PostDec => "--",
            OpType::Rotl => "rotl",
            OpType::Rotr => "rotr",
            OpType::Popcount => "popcount",
            OpType::Sin => "sin",
            OpType::Cos => "cos",
            OpType::Tan => "tan",
            OpType::ArcSin => "arcsin",
            OpType::ArcCos => "arccos",
            OpType::ArcTan => "arctan",
            OpType::Exp => "exp",
            OpType::Ln => "ln",
            OpType::Sqrt => "sqrt",
        }
    }

    /// True for `=` and every compound assignment.
    #[must_use]
    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            OpType::Assign
                | OpType::AddAssign
                | OpType::SubAssign
                | OpType::MulAssign
                | OpType::DivAssign
                | OpType::ModAssign
                | OpType::BitAndAssign
                | OpType::BitOrAssign
                | OpType::XorAssign
                | OpType::LeftShiftAssign
                | OpType::RightShiftAssign
        )
    }

    /// The base operator of a compound assignment (`+=` gives `+`); identity
    /// for everything else.
    #[must_use]
    pub fn base_of_assignment(self) -> Self {
        match self {
            OpType::AddAssign => OpType::Add,
            OpType::SubAssign => OpType::Sub,
            OpType::MulAssign => OpType::Mul,
            OpType::DivAssign => OpType::Div,
            OpType::ModAssign => OpType::Mod,
            OpType::BitAndAssign => OpType::BitAnd,
            OpType::BitOrAssign => OpType::BitOr,
            OpType::XorAssign => OpType::Xor,
            OpType::LeftShiftAssign => OpType::LeftShift,
            OpType::RightShiftAssign => OpType::RightShift,
            other => other,
        }
    }

    /// True for the comparison operators.
    #[must_use]
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            OpType::CompEq | OpType::CompNeq | OpType::Lt | OpType::Gt | OpType::Le | OpType::Ge
        )
    }

    /// True for the arithmetic operators, compound assignments included.
    #[must_use]
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            OpType::Add
                | OpType::AddAssign
                | OpType::Sub
                | OpType::SubAssign
                | OpType::Mul
                | OpType::MulAssign
                | OpType::Div
                | OpType::DivAssign
                | OpType::Mod
                | OpType::ModAssign
                | OpType::Pow
        )
    }

    /// True for the built-in operators spelled as calls.
    #[must_use]
    pub fn is_builtin_call(self) -> bool {
        matches!(
            self,
            OpType::Rotl
                | OpType::Rotr
                | OpType::Popcount
                | OpType::Sin
                | OpType::Cos
                | OpType::Tan
                | OpType::ArcSin
                | OpType::ArcCos
                | OpType::ArcTan
                | OpType::Exp
                | OpType::Ln
                | OpType::Sqrt
        )
    }
}

impl Display for OpType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::OpType;
    use enum_iterator::all;

    #[test]
    fn compound_assignments_reduce_to_their_base() {
        assert_eq!(OpType::AddAssign.base_of_assignment(), OpType::Add);
        assert_eq!(OpType::RightShiftAssign.base_of_assignment(), OpType::RightShift);
        assert_eq!(OpType::Pow.base_of_assignment(), OpType::Pow);
    }

    #[test]
    fn every_assignment_has_a_non_assignment_base() {
        for op in all::<OpType>() {
            if op.is_assignment() && op != OpType::Assign {
                assert!(!op.base_of_assignment().is_assignment(), "{op}");
            }
        }
    }
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The mangler. Builds a mangled name token by token; the grammar is shared
//! with the demangler through the token tables at the bottom of this file.
//!
//! A mangling starts with `_Q` (plus `:C:` inside a calibration context),
//! then the modifier chain in application order, then the declaration
//! encoding, then parameter/argument/return frames, and ends with `E_`.

use oqasm_ast::ast_type::AstType;
use oqasm_ast::op::OpType;
use std::fmt::Write;

/// A mangled-name builder. `finish` yields the string; all other methods
/// append tokens.
#[derive(Clone, Debug)]
pub struct Mangler {
    out: String,
}

impl Mangler {
    /// Starts a mangling. `in_calibration` inserts the `:C:` infix.
    #[must_use]
    pub fn new(in_calibration: bool) -> Self {
        let mut out = String::from("_Q");
        if in_calibration {
            out.push_str(":C:");
        }
        Self { out }
    }

    /// Terminates the mangling and returns it.
    #[must_use]
    pub fn finish(mut self) -> String {
        self.out.push_str("E_");
        self.out
    }

    /// The mangling built so far, unterminated.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.out
    }

    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    /// Appends an expression terminator.
    pub fn end_expression(&mut self) {
        self.out.push('E');
    }

    pub fn underscore(&mut self) {
        self.out.push('_');
    }

    /// A bare type token.
    pub fn type_(&mut self, ty: AstType) {
        self.push(type_token(ty));
    }

    /// A sized type: `<tok><bits>`.
    pub fn type_size(&mut self, ty: AstType, bits: u32) {
        let tok = type_token(ty);
        write!(self.out, "{tok}{bits}").expect("writing to a string cannot fail");
    }

    /// The `const` qualifier prefix.
    pub fn const_(&mut self) {
        self.push(type_token(AstType::Const));
    }

    /// A length-prefixed identifier: `<byte-len><name>`.
    pub fn identifier(&mut self, name: &str) {
        write!(self.out, "{}{name}", name.len()).expect("writing to a string cannot fail");
    }

    /// A plain typed identifier: `<tok>_<len><name>`.
    pub fn type_identifier(&mut self, ty: AstType, name: &str) {
        self.type_(ty);
        self.underscore();
        self.identifier(name);
    }

    /// A sized typed identifier: `<tok><bits>_<len><name>`.
    pub fn type_size_identifier(&mut self, ty: AstType, bits: u32, name: &str) {
        self.type_size(ty, bits);
        self.underscore();
        self.identifier(name);
    }

    /// An array: `A<len>_<elem-tok><elem-bits>_<id-len><id>`.
    pub fn array(&mut self, element: AstType, length: u32, element_bits: u32, name: &str) {
        write!(self.out, "A{length}").expect("writing to a string cannot fail");
        self.underscore();
        self.type_size(element, element_bits);
        self.underscore();
        self.identifier(name);
    }

    /// A complex value: `C<total-bits>_<component-tok><component-bits>_<id>`.
    pub fn complex(&mut self, total_bits: u32, component: AstType, component_bits: u32, name: &str) {
        write!(self.out, "C{total_bits}").expect("writing to a string cannot fail");
        self.underscore();
        self.type_size(component, component_bits);
        self.underscore();
        self.identifier(name);
    }

    /// An operator token.
    pub fn op(&mut self, op: OpType) {
        self.push(op_token(op));
    }

    /// A binary operation: `Bo<op>_<lhs>E<rhs>E`.
    pub fn binary_start(&mut self, op: OpType) {
        self.push("Bo");
        self.op(op);
        self.underscore();
    }

    /// A unary operation: `Uo<op>_<operand>E`.
    pub fn unary_start(&mut self, op: OpType) {
        self.push("Uo");
        self.op(op);
        self.underscore();
    }

    /// An operator application wrapper: `O<op>_<target>E`.
    pub fn operator_start(&mut self, op: OpType) {
        self.out.push('O');
        self.op(op);
        self.underscore();
    }

    /// An operand wrapper: `Od<ix>_<target>E`.
    pub fn operand_start(&mut self, index: usize) {
        write!(self.out, "Od{index}_").expect("writing to a string cannot fail");
    }

    /// Opens a call encoding: `cl<callee>...E`.
    pub fn call_start(&mut self) {
        self.push("cl");
    }

    pub fn call_end(&mut self) {
        self.end_expression();
    }

    /// The i-th function parameter: `Fp<ix>_<tok><bits>_<len><name>E`.
    pub fn func_param(&mut self, index: usize, ty: AstType, bits: u32, name: &str) {
        self.frame_param("Fp", index, ty, bits, name);
    }

    /// The i-th function argument: `Fa<ix>_<bits><tok><len><name>E`.
    pub fn func_arg(&mut self, index: usize, ty: AstType, bits: u32, name: &str) {
        self.frame_arg("Fa", index, ty, bits, name);
    }

    /// The i-th gate parameter: `Gp<ix>_<tok><bits>_<len><name>E`.
    pub fn gate_param(&mut self, index: usize, ty: AstType, bits: u32, name: &str) {
        self.frame_param("Gp", index, ty, bits, name);
    }

    /// The i-th gate argument: `Ga<ix>_<bits><tok><len><name>E`.
    pub fn gate_arg(&mut self, index: usize, ty: AstType, bits: u32, name: &str) {
        self.frame_arg("Ga", index, ty, bits, name);
    }

    /// The i-th kernel parameter: `Kp<ix>_<tok><bits>_<len><name>E`.
    pub fn kernel_param(&mut self, index: usize, ty: AstType, bits: u32, name: &str) {
        self.frame_param("Kp", index, ty, bits, name);
    }

    /// The i-th kernel argument: `Ka<ix>_<bits><tok><len><name>E`.
    pub fn kernel_arg(&mut self, index: usize, ty: AstType, bits: u32, name: &str) {
        self.frame_arg("Ka", index, ty, bits, name);
    }

    /// The i-th defcal parameter: `Dp<ix>_<tok><bits>_<len><name>E`.
    pub fn defcal_param(&mut self, index: usize, ty: AstType, bits: u32, name: &str) {
        self.frame_param("Dp", index, ty, bits, name);
    }

    /// The i-th defcal argument: `Da<ix>_<bits><tok><len><name>E`.
    pub fn defcal_arg(&mut self, index: usize, ty: AstType, bits: u32, name: &str) {
        self.frame_arg("Da", index, ty, bits, name);
    }

    /// The i-th qubit target: `Qt<ix>_<len><name>E`.
    pub fn qubit_target(&mut self, index: usize, name: &str) {
        write!(self.out, "Qt{index}_").expect("writing to a string cannot fail");
        self.identifier(name);
        self.end_expression();
    }

    /// The return frame: `Fr<tok><bits>E`.
    pub fn func_return(&mut self, ty: AstType, bits: u32) {
        self.push("Fr");
        self.type_size(ty, bits);
        self.end_expression();
    }

    // Parameters carry the type token first; arguments put the width first.
    fn frame_param(&mut self, frame: &str, index: usize, ty: AstType, bits: u32, name: &str) {
        write!(self.out, "{frame}{index}_").expect("writing to a string cannot fail");
        self.type_size(ty, bits);
        self.underscore();
        self.identifier(name);
        self.end_expression();
    }

    fn frame_arg(&mut self, frame: &str, index: usize, ty: AstType, bits: u32, name: &str) {
        write!(self.out, "{frame}{index}_{bits}").expect("writing to a string cannot fail");
        self.type_(ty);
        self.identifier(name);
        self.end_expression();
    }

    /// A `ctrl @` link in the modifier chain.
    pub fn control(&mut self) {
        self.push(type_token(AstType::GateControl));
    }

    /// A `negctrl @` link in the modifier chain.
    pub fn neg_control(&mut self) {
        self.push(type_token(AstType::GateNegControl));
    }

    /// An `inv @` link in the modifier chain.
    pub fn inverse(&mut self) {
        self.push(type_token(AstType::GateInverse));
    }

    /// A `pow(k) @` link in the modifier chain: `Pw<k>_`.
    pub fn power(&mut self, exponent: i64) {
        write!(self.out, "Pw{exponent}_").expect("writing to a string cannot fail");
    }

    /// A `gphase(θ)` link: `Gp<angle-encoding>E`. Callers append the angle
    /// encoding between this and [`Mangler::end_expression`].
    pub fn gphase_start(&mut self) {
        self.push(type_token(AstType::GPhaseExpression));
    }

    /// A signed integer literal: `Li<16 hex digits>`.
    #[allow(clippy::cast_sign_loss)]
    pub fn int_literal(&mut self, value: i64) {
        write!(self.out, "Li{:016x}", value as u64).expect("writing to a string cannot fail");
    }

    /// An unsigned integer literal: `Lu<16 hex digits>`.
    pub fn uint_literal(&mut self, value: u64) {
        write!(self.out, "Lu{value:016x}").expect("writing to a string cannot fail");
    }

    /// A floating-point literal: `Ld<16 hex digits of the IEEE bits>`.
    pub fn double_literal(&mut self, value: f64) {
        write!(self.out, "Ld{:016x}", value.to_bits())
            .expect("writing to a string cannot fail");
    }

    /// A string literal: `Ls<byte-len><bytes>`.
    pub fn string_literal(&mut self, value: &str) {
        write!(self.out, "Ls{}{value}", value.len()).expect("writing to a string cannot fail");
    }

    /// The explicit-cast marker.
    pub fn cast(&mut self, to: AstType, to_bits: u32, from: AstType, from_bits: u32) {
        self.push("cast");
        self.conversion_types(to, to_bits, from, from_bits);
    }

    /// The implicit-conversion marker.
    pub fn implicit_conversion(&mut self, to: AstType, to_bits: u32, from: AstType, from_bits: u32) {
        self.push("implconv");
        self.conversion_types(to, to_bits, from, from_bits);
    }

    fn conversion_types(&mut self, to: AstType, to_bits: u32, from: AstType, from_bits: u32) {
        self.type_size(to, to_bits);
        self.underscore();
        self.type_size(from, from_bits);
        self.underscore();
    }
}

/// The type-token alphabet. The demangler matches these longest-first, so
/// every token must stay prefix-distinguishable in its grammar position.
#[must_use]
pub fn type_token(ty: AstType) -> &'static str {
    match ty {
        AstType::Bool => "B",
        AstType::Char => "Cr",
        AstType::Int => "i",
        AstType::UInt => "u",
        AstType::Float => "F",
        AstType::Double => "D",
        AstType::LongDouble => "DL",
        AstType::MpInteger => "Mi",
        AstType::MpUinteger => "Mu",
        AstType::MpDecimal => "Md",
        AstType::MpComplex => "Mc",
        AstType::Bitset => "Cb",
        AstType::Angle => "An",
        AstType::String | AstType::StringLiteral => "St",
        AstType::Const => "Co",
        AstType::Qubit => "Q",
        AstType::QubitContainer => "Qc",
        AstType::QubitContainerAlias => "Qa",
        AstType::GateQubitParam => "Qg",
        AstType::Duration => "Dr",
        AstType::DurationOf => "Do",
        AstType::Stretch => "Sr",
        AstType::Length => "Le",
        AstType::TimeUnit => "Tu",
        AstType::Frame => "Fm",
        AstType::Port => "Pt",
        AstType::Waveform => "Wf",
        AstType::Gate => "G",
        // The built-in gates carry their own tokens so their identifiers
        // demangle back to the specific kind.
        AstType::UGate => "Gu",
        AstType::CXGate => "Gx",
        AstType::CCXGate => "Gc",
        AstType::CNotGate => "Gn",
        AstType::HadamardGate => "Gh",
        AstType::Function => "Fn",
        AstType::Kernel => "K",
        AstType::Defcal
        | AstType::DefcalGroup
        | AstType::DefcalMeasure
        | AstType::DefcalReset
        | AstType::DefcalDelay => "D",
        AstType::GPhaseExpression | AstType::GateGPhaseExpression => "Gp",
        AstType::GateControl => "Ct",
        AstType::GateNegControl => "Nc",
        AstType::GateInverse => "In",
        AstType::GatePower => "Pw",
        AstType::Array
        | AstType::CBitArray
        | AstType::QubitArray
        | AstType::BoolArray
        | AstType::IntArray
        | AstType::MpIntegerArray
        | AstType::FloatArray
        | AstType::MpDecimalArray
        | AstType::MpComplexArray
        | AstType::AngleArray
        | AstType::DurationArray
        | AstType::FrameArray
        | AstType::PortArray
        | AstType::WaveformArray => "A",
        _ => "Z",
    }
}

/// The element type a specific array classification mangles with.
#[must_use]
pub fn array_element_type(ty: AstType) -> AstType {
    match ty {
        AstType::CBitArray => AstType::Bitset,
        AstType::QubitArray => AstType::Qubit,
        AstType::BoolArray => AstType::Bool,
        AstType::IntArray => AstType::Int,
        AstType::MpIntegerArray => AstType::MpInteger,
        AstType::FloatArray => AstType::Float,
        AstType::MpDecimalArray => AstType::MpDecimal,
        AstType::MpComplexArray => AstType::MpComplex,
        AstType::AngleArray => AstType::Angle,
        AstType::DurationArray => AstType::Duration,
        AstType::FrameArray => AstType::Frame,
        AstType::PortArray => AstType::Port,
        AstType::WaveformArray => AstType::Waveform,
        _ => AstType::Undefined,
    }
}

/// The operator-token alphabet. Two letters, case-significant, except the
/// three-letter arc tokens; unique across the table.
#[must_use]
pub fn op_token(op: OpType) -> &'static str {
    match op {
        OpType::None => "nO",
        OpType::Add => "aD",
        OpType::AddAssign => "aA",
        OpType::Sub => "sB",
        OpType::SubAssign => "sS",
        OpType::Mul => "mU",
        OpType::MulAssign => "mM",
        OpType::Div => "dV",
        OpType::DivAssign => "dD",
        OpType::Mod => "mD",
        OpType::ModAssign => "mO",
        OpType::Pow => "pW",
        OpType::CompEq => "eQ",
        OpType::CompNeq => "nQ",
        OpType::Lt => "lT",
        OpType::Gt => "gT",
        OpType::Le => "lE",
        OpType::Ge => "gE",
        OpType::BitAnd => "nD",
        OpType::BitAndAssign => "nA",
        OpType::BitOr => "oR",
        OpType::BitOrAssign => "oA",
        OpType::Xor => "xR",
        OpType::XorAssign => "xA",
        OpType::BitNot => "bN",
        OpType::LeftShift => "lS",
        OpType::LeftShiftAssign => "lL",
        OpType::RightShift => "rS",
        OpType::RightShiftAssign => "rT",
        OpType::LogicalAnd => "lA",
        OpType::LogicalOr => "lO",
        OpType::LogicalNot => "lN",
        OpType::Assign => "aS",
        OpType::Negative => "mI",
        OpType::Positive => "pL",
        OpType::Negate => "nG",
        OpType::PreInc => "pI",
        OpType::PreDec => "pD",
        OpType::PostInc => "tI",
        OpType::PostDec => "tD",
        OpType::Rotl => "rL",
        OpType::Rotr => "rR",
        OpType::Popcount => "pC",
        OpType::Sin => "sN",
        OpType::Cos => "cN",
        OpType::Tan => "tN",
        OpType::ArcSin => "asN",
        OpType::ArcCos => "acN",
        OpType::ArcTan => "atN",
        OpType::Exp => "eX",
        OpType::Ln => "lG",
        OpType::Sqrt => "sQ",
    }
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The demangler: a recursive-descent parser over the mangled alphabet. It
//! is the inverse of the mangler on every construction the mangler produces,
//! and yields a decorated description suitable for signature-based lookup
//! and human-readable reporting.

use crate::mangler::{op_token, type_token};
use enum_iterator::all;
use oqasm_ast::ast_type::AstType;
use oqasm_ast::op::OpType;
use thiserror::Error;

/// A demangling failure.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum DemangleError {
    #[error("mangled name does not start with `_Q`")]
    MissingStart,
    #[error("unexpected end of mangled name")]
    UnexpectedEnd,
    #[error("unrecognized token at byte {0}")]
    BadToken(usize),
    #[error("malformed length prefix at byte {0}")]
    BadLength(usize),
    #[error("identifier bytes are not valid UTF-8")]
    BadUtf8,
    #[error("trailing bytes after the `E_` terminator")]
    Trailing,
}

/// A literal embedded in a mangled name.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Int(i64),
    UInt(u64),
    Double(f64),
    Str(String),
}

/// A demangled operand: a literal, an identifier, or an operator tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Literal(Literal),
    Ident(String),
    Typed {
        ty: AstType,
        bits: u32,
        name: String,
    },
    Binary {
        op: OpType,
        left: Box<Value>,
        right: Box<Value>,
    },
    Unary {
        op: OpType,
        operand: Box<Value>,
    },
    Operator {
        op: OpType,
        target: Box<Value>,
    },
    Operand {
        index: usize,
        target: Box<Value>,
    },
}

/// One link of a demangled modifier chain, in application order.
#[derive(Clone, Debug, PartialEq)]
pub struct Modifier {
    /// [`AstType::GateControl`], [`AstType::GateNegControl`],
    /// [`AstType::GateInverse`], [`AstType::GatePower`], or
    /// [`AstType::GPhaseExpression`].
    pub kind: AstType,
    /// The exponent of a `pow` link.
    pub exponent: Option<i64>,
    /// The angle of a `gphase` link.
    pub angle: Option<Value>,
}

/// A demangled parameter, argument, qubit target, or return description.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Piece {
    pub index: usize,
    pub ty: AstType,
    pub bits: u32,
    pub name: String,
}

/// The element description of a demangled array or complex declaration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ElementInfo {
    pub ty: AstType,
    pub bits: u32,
    pub length: u32,
}

/// The from/to description of a demangled cast or implicit conversion.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Conversion {
    pub to: AstType,
    pub to_bits: u32,
    pub from: AstType,
    pub from_bits: u32,
}

/// The decorated description of a mangled name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Demangled {
    pub name: String,
    pub ty: AstType,
    pub bits: u32,
    pub is_const: bool,
    pub in_calibration: bool,
    pub is_call: bool,
    pub modifiers: Vec<Modifier>,
    pub params: Vec<Piece>,
    pub args: Vec<Piece>,
    pub qubits: Vec<Piece>,
    pub ret: Option<Piece>,
    pub conversion: Option<Conversion>,
    pub element: Option<ElementInfo>,
    pub literal: Option<Literal>,
    pub value: Option<Value>,
}

impl std::fmt::Display for Demangled {
    /// A human-readable rendering of the signature, for diagnostics.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.in_calibration {
            f.write_str("[cal] ")?;
        }
        for modifier in &self.modifiers {
            match modifier.kind {
                AstType::GateControl => f.write_str("ctrl @ ")?,
                AstType::GateNegControl => f.write_str("negctrl @ ")?,
                AstType::GateInverse => f.write_str("inv @ ")?,
                AstType::GatePower => {
                    write!(f, "pow({}) @ ", modifier.exponent.unwrap_or(1))?;
                }
                _ => f.write_str("gphase @ ")?,
            }
        }
        if self.is_const {
            f.write_str("const ")?;
        }

        if let Some(conversion) = &self.conversion {
            let verb = if self.ty == AstType::Cast {
                "cast"
            } else {
                "implicit conversion"
            };
            return write!(
                f,
                "{verb} {}[{}] -> {}[{}]",
                conversion.from, conversion.from_bits, conversion.to, conversion.to_bits
            );
        }

        match self.ty {
            ty if ty.is_gate_type()
                || matches!(ty, AstType::Defcal | AstType::Function | AstType::Kernel) =>
            {
                let keyword = match ty {
                    ty if ty.is_gate_type() => "gate",
                    AstType::Defcal => "defcal",
                    AstType::Function => "def",
                    _ => "extern",
                };
                write!(f, "{keyword} {}", self.name)?;
                if !self.params.is_empty() {
                    f.write_str("(")?;
                    for (i, param) in self.params.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}[{}] {}", param.ty, param.bits, param.name)?;
                    }
                    f.write_str(")")?;
                }
                for qubit in &self.qubits {
                    write!(f, " {}", qubit.name)?;
                }
                if let Some(ret) = &self.ret {
                    write!(f, " -> {}[{}]", ret.ty, ret.bits)?;
                }
                Ok(())
            }
            AstType::Array => {
                let element = self.element.as_ref().expect("arrays carry element info");
                write!(
                    f,
                    "array[{}] of {}[{}] {}",
                    element.length, element.ty, element.bits, self.name
                )
            }
            _ => write!(f, "{}[{}] {}", self.ty, self.bits, self.name),
        }
    }
}

/// A gate signature recovered from a mangled name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DemangledGate {
    pub name: String,
    pub params: Vec<(AstType, u32, String)>,
    pub qubits: Vec<(AstType, u32, String)>,
}

/// A defcal signature recovered from a mangled name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DemangledDefcal {
    pub name: String,
    pub params: Vec<(AstType, u32, String)>,
    pub qubits: Vec<(AstType, u32, String)>,
}

/// The demangler.
#[derive(Clone, Copy, Debug, Default)]
pub struct Demangler;

impl Demangler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parses a mangled name.
    pub fn demangle(&self, mangled: &str) -> Result<Demangled, DemangleError> {
        let mut parser = Parser::new(mangled);
        let result = parser.parse()?;
        Ok(result)
    }

    /// Recovers a gate signature; the mangled name must describe a gate.
    pub fn gate(&self, mangled: &str) -> Result<DemangledGate, DemangleError> {
        let demangled = self.demangle(mangled)?;
        Ok(DemangledGate {
            name: demangled.name,
            params: demangled
                .params
                .into_iter()
                .map(|p| (p.ty, p.bits, p.name))
                .collect(),
            qubits: demangled
                .qubits
                .into_iter()
                .map(|q| (q.ty, q.bits, q.name))
                .collect(),
        })
    }

    /// Recovers a defcal signature; the mangled name must describe a defcal.
    pub fn defcal(&self, mangled: &str) -> Result<DemangledDefcal, DemangleError> {
        let demangled = self.demangle(mangled)?;
        Ok(DemangledDefcal {
            name: demangled.name,
            params: demangled
                .params
                .into_iter()
                .map(|p| (p.ty, p.bits, p.name))
                .collect(),
            qubits: demangled
                .qubits
                .into_iter()
                .map(|q| (q.ty, q.bits, q.name))
                .collect(),
        })
    }
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(mangled: &'a str) -> Self {
        Self {
            bytes: mangled.as_bytes(),
            pos: 0,
        }
    }

    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos.min(self.bytes.len())..]
    }

    fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s.as_bytes())
    }

    fn eat(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<u8> {
        self.rest().first().copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.rest().get(offset).copied()
    }

    fn at_terminator(&self) -> bool {
        self.rest() == b"E_"
    }

    fn parse_uint(&mut self) -> Result<u64, DemangleError> {
        let start = self.pos;
        let mut value: u64 = 0;
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() {
                value = value
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(u64::from(b - b'0')))
                    .ok_or(DemangleError::BadLength(start))?;
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(DemangleError::BadLength(start));
        }
        Ok(value)
    }

    fn parse_signed(&mut self) -> Result<i64, DemangleError> {
        let negative = self.eat("-");
        let magnitude = self.parse_uint()?;
        #[allow(clippy::cast_possible_wrap)]
        let value = magnitude as i64;
        Ok(if negative { -value } else { value })
    }

    fn parse_hex16(&mut self) -> Result<u64, DemangleError> {
        let rest = self.rest();
        if rest.len() < 16 {
            return Err(DemangleError::UnexpectedEnd);
        }
        let hex = std::str::from_utf8(&rest[..16]).map_err(|_| DemangleError::BadUtf8)?;
        let value =
            u64::from_str_radix(hex, 16).map_err(|_| DemangleError::BadToken(self.pos))?;
        self.pos += 16;
        Ok(value)
    }

    fn parse_ident(&mut self) -> Result<String, DemangleError> {
        let len = self.parse_uint()? as usize;
        let rest = self.rest();
        if rest.len() < len {
            return Err(DemangleError::UnexpectedEnd);
        }
        let name = std::str::from_utf8(&rest[..len])
            .map_err(|_| DemangleError::BadUtf8)?
            .to_string();
        self.pos += len;
        Ok(name)
    }

    /// Longest-first match against the type alphabet.
    fn parse_type_token(&mut self) -> Result<AstType, DemangleError> {
        let mut best: Option<(usize, AstType)> = None;
        for ty in all::<AstType>() {
            if ty == AstType::Undefined || ty.is_error_type() {
                continue;
            }
            let token = type_token(ty);
            if token == "Z" || token == "A" {
                continue;
            }
            if self.starts_with(token) {
                match best {
                    Some((len, _)) if len >= token.len() => {}
                    _ => best = Some((token.len(), ty)),
                }
            }
        }
        let (len, ty) = best.ok_or(DemangleError::BadToken(self.pos))?;
        self.pos += len;
        Ok(ty)
    }

    fn parse_op_token(&mut self) -> Result<OpType, DemangleError> {
        let mut best: Option<(usize, OpType)> = None;
        for op in all::<OpType>() {
            let token = op_token(op);
            if self.starts_with(token) {
                match best {
                    Some((len, _)) if len >= token.len() => {}
                    _ => best = Some((token.len(), op)),
                }
            }
        }
        let (len, op) = best.ok_or(DemangleError::BadToken(self.pos))?;
        self.pos += len;
        Ok(op)
    }

    fn parse_type_size(&mut self) -> Result<(AstType, u32), DemangleError> {
        let ty = self.parse_type_token()?;
        let bits = if self.peek().is_some_and(|b| b.is_ascii_digit()) {
            u32::try_from(self.parse_uint()?).map_err(|_| DemangleError::BadLength(self.pos))?
        } else {
            0
        };
        Ok((ty, bits))
    }

    fn parse_literal(&mut self) -> Result<Literal, DemangleError> {
        if self.eat("Li") {
            #[allow(clippy::cast_possible_wrap)]
            return Ok(Literal::Int(self.parse_hex16()? as i64));
        }
        if self.eat("Lu") {
            return Ok(Literal::UInt(self.parse_hex16()?));
        }
        if self.eat("Ld") {
            return Ok(Literal::Double(f64::from_bits(self.parse_hex16()?)));
        }
        if self.eat("Ls") {
            return Ok(Literal::Str(self.parse_ident()?));
        }
        Err(DemangleError::BadToken(self.pos))
    }

    fn at_literal(&self) -> bool {
        self.starts_with("Li")
            || self.starts_with("Lu")
            || self.starts_with("Ld")
            || self.starts_with("Ls")
    }

    fn parse_value(&mut self) -> Result<Value, DemangleError> {
        if self.at_literal() {
            return Ok(Value::Literal(self.parse_literal()?));
        }
        if self.starts_with("Bo") {
            self.pos += 2;
            let op = self.parse_op_token()?;
            if !self.eat("_") {
                return Err(DemangleError::BadToken(self.pos));
            }
            let left = self.parse_value()?;
            if !self.eat("E") {
                return Err(DemangleError::BadToken(self.pos));
            }
            let right = self.parse_value()?;
            if !self.eat("E") {
                return Err(DemangleError::BadToken(self.pos));
            }
            return Ok(Value::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        if self.starts_with("Uo") {
            self.pos += 2;
            let op = self.parse_op_token()?;
            if !self.eat("_") {
                return Err(DemangleError::BadToken(self.pos));
            }
            let operand = self.parse_value()?;
            if !self.eat("E") {
                return Err(DemangleError::BadToken(self.pos));
            }
            return Ok(Value::Unary {
                op,
                operand: Box::new(operand),
            });
        }
        if self.starts_with("Od") && self.peek_at(2).is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 2;
            let index = self.parse_uint()? as usize;
            if !self.eat("_") {
                return Err(DemangleError::BadToken(self.pos));
            }
            let target = self.parse_value()?;
            if !self.eat("E") {
                return Err(DemangleError::BadToken(self.pos));
            }
            return Ok(Value::Operand {
                index,
                target: Box::new(target),
            });
        }
        if self.peek() == Some(b'O') {
            self.pos += 1;
            let op = self.parse_op_token()?;
            if !self.eat("_") {
                return Err(DemangleError::BadToken(self.pos));
            }
            let target = self.parse_value()?;
            if !self.eat("E") {
                return Err(DemangleError::BadToken(self.pos));
            }
            return Ok(Value::Operator {
                op,
                target: Box::new(target),
            });
        }
        if self.peek().is_some_and(|b| b.is_ascii_digit()) {
            return Ok(Value::Ident(self.parse_ident()?));
        }

        let (ty, bits) = self.parse_type_size()?;
        if !self.eat("_") {
            return Err(DemangleError::BadToken(self.pos));
        }
        let name = self.parse_ident()?;
        Ok(Value::Typed { ty, bits, name })
    }

    fn parse_modifiers(&mut self) -> Result<Vec<Modifier>, DemangleError> {
        let mut modifiers = Vec::new();
        loop {
            if self.eat("Ct") {
                modifiers.push(Modifier {
                    kind: AstType::GateControl,
                    exponent: None,
                    angle: None,
                });
            } else if self.eat("Nc") {
                modifiers.push(Modifier {
                    kind: AstType::GateNegControl,
                    exponent: None,
                    angle: None,
                });
            } else if self.eat("In") {
                modifiers.push(Modifier {
                    kind: AstType::GateInverse,
                    exponent: None,
                    angle: None,
                });
            } else if self.starts_with("Pw") {
                self.pos += 2;
                let exponent = self.parse_signed()?;
                if !self.eat("_") {
                    return Err(DemangleError::BadToken(self.pos));
                }
                modifiers.push(Modifier {
                    kind: AstType::GatePower,
                    exponent: Some(exponent),
                    angle: None,
                });
            } else if self.starts_with("Gp") {
                self.pos += 2;
                let angle = if self.starts_with("E") {
                    None
                } else {
                    Some(self.parse_value()?)
                };
                if !self.eat("E") {
                    return Err(DemangleError::BadToken(self.pos));
                }
                modifiers.push(Modifier {
                    kind: AstType::GPhaseExpression,
                    exponent: None,
                    angle,
                });
            } else {
                break;
            }
        }
        Ok(modifiers)
    }

    fn parse_frames(&mut self, out: &mut Demangled) -> Result<(), DemangleError> {
        loop {
            if self.at_terminator() {
                return Ok(());
            }
            if self.peek() == Some(b'E') {
                // A call's closing `E`.
                self.pos += 1;
                continue;
            }
            if self.at_literal() {
                out.literal = Some(self.parse_literal()?);
                continue;
            }
            let frame = match self.rest().get(..2) {
                Some(two) => std::str::from_utf8(two).map_err(|_| DemangleError::BadUtf8)?,
                None => return Err(DemangleError::UnexpectedEnd),
            };
            match frame {
                "Fp" | "Gp" | "Kp" | "Dp" => {
                    self.pos += 2;
                    let index = self.parse_uint()? as usize;
                    if !self.eat("_") {
                        return Err(DemangleError::BadToken(self.pos));
                    }
                    let (ty, bits) = self.parse_type_size()?;
                    let name = if self.eat("_") {
                        self.parse_ident()?
                    } else {
                        String::new()
                    };
                    if !self.eat("E") {
                        return Err(DemangleError::BadToken(self.pos));
                    }
                    out.params.push(Piece {
                        index,
                        ty,
                        bits,
                        name,
                    });
                }
                "Fa" | "Ga" | "Ka" | "Da" => {
                    self.pos += 2;
                    let index = self.parse_uint()? as usize;
                    if !self.eat("_") {
                        return Err(DemangleError::BadToken(self.pos));
                    }
                    let bits = u32::try_from(self.parse_uint()?)
                        .map_err(|_| DemangleError::BadLength(self.pos))?;
                    let ty = self.parse_type_token()?;
                    let name = self.parse_ident()?;
                    if !self.eat("E") {
                        return Err(DemangleError::BadToken(self.pos));
                    }
                    out.args.push(Piece {
                        index,
                        ty,
                        bits,
                        name,
                    });
                }
                "Qt" => {
                    self.pos += 2;
                    let index = self.parse_uint()? as usize;
                    if !self.eat("_") {
                        return Err(DemangleError::BadToken(self.pos));
                    }
                    let name = self.parse_ident()?;
                    if !self.eat("E") {
                        return Err(DemangleError::BadToken(self.pos));
                    }
                    out.qubits.push(Piece {
                        index,
                        ty: AstType::Qubit,
                        bits: 1,
                        name,
                    });
                }
                "Fr" => {
                    self.pos += 2;
                    let (ty, bits) = self.parse_type_size()?;
                    if !self.eat("E") {
                        return Err(DemangleError::BadToken(self.pos));
                    }
                    out.ret = Some(Piece {
                        index: 0,
                        ty,
                        bits,
                        name: String::new(),
                    });
                }
                _ => return Err(DemangleError::BadToken(self.pos)),
            }
        }
    }

    fn parse_declaration(&mut self, out: &mut Demangled) -> Result<(), DemangleError> {
        if self.eat("Co") {
            out.is_const = true;
        }

        // `A<len>_` opens an array, `C<total>_` a complex declaration.
        if self.peek() == Some(b'A') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
            let length = u32::try_from(self.parse_uint()?)
                .map_err(|_| DemangleError::BadLength(self.pos))?;
            if !self.eat("_") {
                return Err(DemangleError::BadToken(self.pos));
            }
            let (ty, bits) = self.parse_type_size()?;
            if !self.eat("_") {
                return Err(DemangleError::BadToken(self.pos));
            }
            out.name = self.parse_ident()?;
            out.ty = AstType::Array;
            out.bits = length;
            out.element = Some(ElementInfo { ty, bits, length });
            return self.parse_frames(out);
        }
        if self.peek() == Some(b'C') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
            let total = u32::try_from(self.parse_uint()?)
                .map_err(|_| DemangleError::BadLength(self.pos))?;
            if !self.eat("_") {
                return Err(DemangleError::BadToken(self.pos));
            }
            let (ty, bits) = self.parse_type_size()?;
            if !self.eat("_") {
                return Err(DemangleError::BadToken(self.pos));
            }
            out.name = self.parse_ident()?;
            out.ty = AstType::MpComplex;
            out.bits = total;
            out.element = Some(ElementInfo {
                ty,
                bits,
                length: 0,
            });
            return self.parse_frames(out);
        }

        let (ty, bits) = self.parse_type_size()?;
        out.ty = ty;
        out.bits = bits;
        if self.eat("_") {
            out.name = self.parse_ident()?;
        }
        self.parse_frames(out)
    }

    fn parse(&mut self) -> Result<Demangled, DemangleError> {
        if !self.eat("_Q") {
            return Err(DemangleError::MissingStart);
        }

        let mut out = Demangled::default();
        if self.eat(":C:") {
            out.in_calibration = true;
        }

        out.modifiers = self.parse_modifiers()?;

        if self.eat("cast") {
            out.ty = AstType::Cast;
            self.parse_conversion(&mut out)?;
        } else if self.eat("implconv") {
            out.ty = AstType::ImplicitConversion;
            self.parse_conversion(&mut out)?;
        } else {
            if self.eat("cl") {
                out.is_call = true;
            }
            self.parse_declaration(&mut out)?;
        }

        if !self.eat("E_") {
            return Err(DemangleError::BadToken(self.pos));
        }
        if !self.rest().is_empty() {
            return Err(DemangleError::Trailing);
        }

        // `D` encodes both double and defcal; qubit targets disambiguate.
        if out.ty == AstType::Double && !out.qubits.is_empty() {
            out.ty = AstType::Defcal;
        }
        Ok(out)
    }

    fn parse_conversion(&mut self, out: &mut Demangled) -> Result<(), DemangleError> {
        let (to, to_bits) = self.parse_type_size()?;
        if !self.eat("_") {
            return Err(DemangleError::BadToken(self.pos));
        }
        let (from, from_bits) = self.parse_type_size()?;
        if !self.eat("_") {
            return Err(DemangleError::BadToken(self.pos));
        }
        out.conversion = Some(Conversion {
            to,
            to_bits,
            from,
            from_bits,
        });
        out.bits = to_bits;
        if !self.at_terminator() {
            out.value = Some(self.parse_value()?);
        }
        Ok(())
    }
}

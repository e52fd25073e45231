// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The node arena. Every AST node lives in an [`Arena`] and is referred to by
//! [`NodeId`]; payloads are the variants of [`NodeKind`]. Cross-references
//! (identifier to symbol entry, modifier chains) are ids, so the tree has no
//! cycles and nodes copy cheaply.

use crate::ast_type::AstType;
use crate::ident::{AngleKind, IdentId, RefId};
use crate::op::OpType;
use indenter::{indented, Format};
use num_bigint::BigInt;
use num_complex::Complex64;
use oqasm_data_structures::location::Location;
use std::fmt::{self, Display, Formatter, Write};

/// The default width of a machine integer.
pub const INT_BITS: u32 = 32;
/// The default width of a single-precision float.
pub const FLOAT_BITS: u32 = 32;
/// The default width of a double.
pub const DOUBLE_BITS: u32 = 64;
/// The width of an extended-precision float.
pub const LONG_DOUBLE_BITS: u32 = 128;
/// The default width of an angle.
pub const ANGLE_BITS: u32 = 64;
/// The default precision of the arbitrary-precision types.
pub const MP_DEFAULT_BITS: u32 = 128;
/// The width recorded for gate identifiers.
pub const GATE_BITS: u32 = 64;

/// The unique identifier for an arena node.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(u32);

impl NodeId {
    #[must_use]
    pub fn successor(self) -> Self {
        Self(self.0 + 1)
    }
}

impl From<NodeId> for usize {
    fn from(value: NodeId) -> Self {
        value.0 as usize
    }
}

impl From<usize> for NodeId {
    #[allow(clippy::cast_possible_truncation)]
    fn from(value: usize) -> Self {
        Self(value as u32)
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The unique identifier for a declaration context. Contexts are numbered in
/// creation order; the global context is always [`ContextId::GLOBAL`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ContextId(u32);

impl ContextId {
    /// The global context.
    pub const GLOBAL: Self = Self(0);

    #[must_use]
    pub fn successor(self) -> Self {
        Self(self.0 + 1)
    }

    /// True if this is the global context.
    #[must_use]
    pub fn is_global(self) -> bool {
        self == Self::GLOBAL
    }
}

impl From<ContextId> for usize {
    fn from(value: ContextId) -> Self {
        value.0 as usize
    }
}

impl From<usize> for ContextId {
    #[allow(clippy::cast_possible_truncation)]
    fn from(value: usize) -> Self {
        Self(value as u32)
    }
}

impl Display for ContextId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The unique identifier for a symbol-table entry.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SymbolId(u32);

impl From<SymbolId> for usize {
    fn from(value: SymbolId) -> Self {
        value.0 as usize
    }
}

impl From<usize> for SymbolId {
    #[allow(clippy::cast_possible_truncation)]
    fn from(value: usize) -> Self {
        Self(value as u32)
    }
}

impl Display for SymbolId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// A unit attached to a duration literal.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LengthUnit {
    #[default]
    Unspecified,
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    /// Backend sample time.
    Dt,
}

impl Display for LengthUnit {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            LengthUnit::Unspecified => f.write_str("?"),
            LengthUnit::Nanoseconds => f.write_str("ns"),
            LengthUnit::Microseconds => f.write_str("us"),
            LengthUnit::Milliseconds => f.write_str("ms"),
            LengthUnit::Seconds => f.write_str("s"),
            LengthUnit::Dt => f.write_str("dt"),
        }
    }
}

/// The target of a gate modifier: a gate, an already-modified gate, or a
/// global-phase expression.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ModifierTarget {
    /// A gate declaration or built-in gate node.
    Gate(NodeId),
    /// A gate applied to qubit operands.
    GateQOp(NodeId),
    /// A `ctrl @` modifier node.
    Control(NodeId),
    /// A `negctrl @` modifier node.
    NegControl(NodeId),
    /// An `inv @` modifier node.
    Inverse(NodeId),
    /// A `pow(k) @` modifier node.
    Power(NodeId),
    /// A standalone `gphase` expression node.
    GPhase(NodeId),
    /// A `gphase` expression attached to a gate.
    GateGPhase(NodeId),
}

impl ModifierTarget {
    /// The node wrapped by this target.
    #[must_use]
    pub fn node(self) -> NodeId {
        match self {
            ModifierTarget::Gate(id)
            | ModifierTarget::GateQOp(id)
            | ModifierTarget::Control(id)
            | ModifierTarget::NegControl(id)
            | ModifierTarget::Inverse(id)
            | ModifierTarget::Power(id)
            | ModifierTarget::GPhase(id)
            | ModifierTarget::GateGPhase(id) => id,
        }
    }

    /// The classification recorded for this target.
    #[must_use]
    pub fn target_type(self) -> AstType {
        match self {
            ModifierTarget::Gate(_) => AstType::Gate,
            ModifierTarget::GateQOp(_) => AstType::GateQOp,
            ModifierTarget::Control(_) => AstType::GateControl,
            ModifierTarget::NegControl(_) => AstType::GateNegControl,
            ModifierTarget::Inverse(_) => AstType::GateInverse,
            ModifierTarget::Power(_) => AstType::GatePower,
            ModifierTarget::GPhase(_) => AstType::GPhaseExpression,
            ModifierTarget::GateGPhase(_) => AstType::GateGPhaseExpression,
        }
    }
}

/// How a qubit-container alias rebinds its source.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AliasKind {
    /// The whole container under a new name.
    Rebind,
    /// A half-open index range of the source container.
    Range { start: u32, end: u32 },
    /// A concatenation of containers.
    Concat(Vec<IdentId>),
}

/// A call of a function, gate, kernel, or defcal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CallExpr {
    /// [`AstType::FunctionCall`], [`AstType::GateCall`],
    /// [`AstType::KernelCall`], or [`AstType::DefcalCall`].
    pub kind: AstType,
    /// The callee.
    pub callee: IdentId,
    /// The classical arguments, in source order.
    pub args: Vec<NodeId>,
    /// The qubit operands, in source order.
    pub qubits: Vec<IdentId>,
    /// The declared result node, when the callee returns a value.
    pub result: Option<NodeId>,
    /// The innermost modifier applied to a gate call.
    pub modifier: Option<NodeId>,
    /// The classification of the applied modifier.
    pub modifier_type: AstType,
}

/// A gate definition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GateDecl {
    /// The gate kind: [`AstType::Gate`] or one of the built-ins.
    pub kind: AstType,
    /// The gate name.
    pub ident: IdentId,
    /// The angle parameters.
    pub params: Vec<IdentId>,
    /// The qubit parameters.
    pub qubits: Vec<IdentId>,
    /// The body statements.
    pub body: Vec<NodeId>,
}

/// A calibration definition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DefcalDecl {
    /// The defcal kind: [`AstType::Defcal`], [`AstType::DefcalMeasure`],
    /// [`AstType::DefcalReset`], or [`AstType::DefcalDelay`].
    pub kind: AstType,
    /// The base name of the specialized operation.
    pub ident: IdentId,
    /// The classical parameters.
    pub params: Vec<NodeId>,
    /// The qubit targets, hardware-bound or named.
    pub qubits: Vec<IdentId>,
    /// The body statements.
    pub body: Vec<NodeId>,
}

/// A classical function or extern kernel definition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CallableDecl {
    /// [`AstType::Function`] or [`AstType::Kernel`].
    pub kind: AstType,
    /// The callable name.
    pub ident: IdentId,
    /// The parameters.
    pub params: Vec<IdentId>,
    /// The body statements. Empty for kernels.
    pub body: Vec<NodeId>,
    /// The declared result node.
    pub result: Option<NodeId>,
}

/// The payload of an arena node.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    // Literals.
    BoolLiteral(bool),
    IntLiteral {
        value: i64,
        bits: u32,
        unsigned: bool,
    },
    FloatLiteral {
        /// [`AstType::Float`], [`AstType::Double`], or
        /// [`AstType::LongDouble`].
        ty: AstType,
        value: f64,
        bits: u32,
    },
    MpIntegerLiteral {
        value: BigInt,
        bits: u32,
        unsigned: bool,
    },
    MpDecimalLiteral {
        value: f64,
        bits: u32,
    },
    MpComplexLiteral {
        value: Complex64,
        bits: u32,
    },
    StringLiteral(String),
    AngleLiteral {
        value: f64,
        bits: u32,
        kind: AngleKind,
    },
    CBitLiteral {
        width: u32,
        value: u64,
    },
    DurationLiteral {
        value: f64,
        unit: LengthUnit,
    },

    // Expressions.
    Ident(IdentId),
    IdentRef(RefId),
    Binary {
        op: OpType,
        left: NodeId,
        right: NodeId,
        has_parens: bool,
        /// The inferred type of the whole operation.
        result_type: AstType,
    },
    Unary {
        op: OpType,
        operand: NodeId,
        has_parens: bool,
        is_lvalue: bool,
        result_type: AstType,
    },
    Cast {
        operand: NodeId,
        from: AstType,
        to: AstType,
        bits: u32,
    },
    ImplicitConversion {
        operand: NodeId,
        from: AstType,
        to: AstType,
        bits: u32,
    },
    /// A unary operator applied to a target, kept distinct from the target
    /// itself so the mangler can encode operator applications.
    Operator {
        op: OpType,
        target: NodeId,
    },
    /// A nullary wrapper marking its target as the operand of an enclosing
    /// operator.
    Operand {
        target: NodeId,
    },
    Complex {
        real: NodeId,
        imag: NodeId,
        bits: u32,
    },
    InitializerList {
        elements: Vec<NodeId>,
    },
    Ellipsis,
    Call(CallExpr),
    Result {
        ty: AstType,
        bits: u32,
    },

    // Gates and modifiers.
    GateDecl(GateDecl),
    GateModifier {
        /// [`AstType::GateControl`], [`AstType::GateNegControl`],
        /// [`AstType::GateInverse`], [`AstType::GatePower`], or
        /// [`AstType::GateGPhaseExpression`].
        kind: AstType,
        /// The power exponent or gphase angle, when the modifier takes one.
        argument: Option<NodeId>,
        target: ModifierTarget,
    },
    GPhase {
        theta: NodeId,
    },

    // Quantum entities.
    Qubit {
        ident: IdentId,
        hardware: bool,
    },
    QubitContainer {
        ident: IdentId,
        size: u32,
        qubits: Vec<NodeId>,
    },
    QubitContainerAlias {
        ident: IdentId,
        source: IdentId,
        kind: AliasKind,
    },
    Measure {
        target: IdentId,
        result: Option<NodeId>,
    },
    Reset {
        target: IdentId,
    },

    // Callables.
    DefcalDecl(DefcalDecl),
    CallableDecl(CallableDecl),

    // Timing and OpenPulse.
    Duration {
        value: f64,
        unit: LengthUnit,
    },
    DurationOf {
        target: NodeId,
    },
    Stretch {
        ident: IdentId,
    },
    Frame {
        ident: IdentId,
        port: Option<IdentId>,
        frequency: Option<NodeId>,
        phase: Option<NodeId>,
    },
    Port {
        ident: IdentId,
        index: Option<u32>,
    },
    Waveform {
        ident: IdentId,
        samples: Vec<NodeId>,
    },

    // Statements.
    Block {
        statements: Vec<NodeId>,
    },
    If {
        condition: NodeId,
        then_block: NodeId,
        else_ifs: Vec<NodeId>,
        else_block: Option<NodeId>,
    },
    ElseIf {
        condition: NodeId,
        block: NodeId,
    },
    Else {
        block: NodeId,
    },
    Switch {
        quantity: NodeId,
        cases: Vec<NodeId>,
        default: Option<NodeId>,
    },
    Case {
        label: i64,
        block: NodeId,
    },
    Default {
        block: NodeId,
    },
    For {
        induction: IdentId,
        start: NodeId,
        end: NodeId,
        step: Option<NodeId>,
        block: NodeId,
    },
    While {
        condition: NodeId,
        block: NodeId,
    },
    DoWhile {
        block: NodeId,
        condition: NodeId,
    },
    Break,
    Continue,
    Return {
        value: Option<NodeId>,
    },
    Delay {
        duration: NodeId,
        targets: Vec<IdentId>,
    },
    Barrier {
        targets: Vec<IdentId>,
    },
    BoxStmt {
        /// [`AstType::BoxStatement`], [`AstType::BoxAsStatement`], or
        /// [`AstType::BoxToStatement`].
        kind: AstType,
        label: Option<IdentId>,
        duration: Option<NodeId>,
        block: NodeId,
    },
    Pragma {
        text: String,
    },
    Annotation {
        name: String,
        arguments: Vec<String>,
    },
    Declaration {
        ident: IdentId,
        ty: AstType,
        bits: u32,
        initializer: Option<NodeId>,
        is_const: bool,
    },
    CalibrationBlock {
        statements: Vec<NodeId>,
    },

    // Arrays.
    Array {
        /// The specific array classification, e.g. [`AstType::CBitArray`].
        ty: AstType,
        length: u32,
        element_bits: u32,
        elements: Vec<NodeId>,
        is_const: bool,
    },

    // Error markers.
    ExpressionError {
        message: String,
        ident: Option<IdentId>,
    },
    StatementError {
        message: String,
        ident: Option<IdentId>,
    },
    IdentifierError {
        message: String,
        ident: Option<IdentId>,
    },
    SyntaxError {
        message: String,
    },
    BadCast {
        operand: NodeId,
        from: AstType,
        to: AstType,
        message: String,
    },
    BadImplicitConversion {
        operand: NodeId,
        from: AstType,
        to: AstType,
        message: String,
    },
}

impl NodeKind {
    /// The classification of this payload.
    #[must_use]
    pub fn ast_type(&self) -> AstType {
        match self {
            NodeKind::BoolLiteral(_) => AstType::Bool,
            NodeKind::IntLiteral { unsigned, .. } => {
                if *unsigned {
                    AstType::UInt
                } else {
                    AstType::Int
                }
            }
            NodeKind::FloatLiteral { ty, .. } => *ty,
            NodeKind::MpIntegerLiteral { unsigned, .. } => {
                if *unsigned {
                    AstType::MpUinteger
                } else {
                    AstType::MpInteger
                }
            }
            NodeKind::MpDecimalLiteral { .. } => AstType::MpDecimal,
            NodeKind::MpComplexLiteral { .. } => AstType::MpComplex,
            NodeKind::StringLiteral(_) => AstType::StringLiteral,
            NodeKind::AngleLiteral { .. } => AstType::Angle,
            NodeKind::CBitLiteral { .. } => AstType::Bitset,
            NodeKind::DurationLiteral { .. } => AstType::Duration,
            NodeKind::Ident(_) => AstType::Identifier,
            NodeKind::IdentRef(_) => AstType::IdentifierRef,
            NodeKind::Binary { .. } => AstType::BinaryOp,
            NodeKind::Unary { .. } => AstType::UnaryOp,
            NodeKind::Cast { .. } => AstType::Cast,
            NodeKind::ImplicitConversion { .. } => AstType::ImplicitConversion,
            NodeKind::Operator { .. } => AstType::Operator,
            NodeKind::Operand { .. } => AstType::Operand,
            NodeKind::Complex { .. } => AstType::ComplexExpression,
            NodeKind::InitializerList { .. } => AstType::InitializerList,
            NodeKind::Ellipsis => AstType::Ellipsis,
            NodeKind::Call(call) => call.kind,
            NodeKind::Result { .. } => AstType::Result,
            NodeKind::GateDecl(decl) => decl.kind,
            NodeKind::GateModifier { kind, .. } => *kind,
            NodeKind::GPhase { .. } => AstType::GPhaseExpression,
            NodeKind::Qubit { .. } => AstType::Qubit,
            NodeKind::QubitContainer { .. } => AstType::QubitContainer,
            NodeKind::QubitContainerAlias { .. } => AstType::QubitContainerAlias,
            NodeKind::Measure { .. } => AstType::Measure,
            NodeKind::Reset { .. } => AstType::Reset,
            NodeKind::DefcalDecl(decl) => decl.kind,
            NodeKind::CallableDecl(decl) => decl.kind,
            NodeKind::Duration { .. } => AstType::Duration,
            NodeKind::DurationOf { .. } => AstType::DurationOf,
            NodeKind::Stretch { .. } => AstType::Stretch,
            NodeKind::Frame { .. } => AstType::Frame,
            NodeKind::Port { .. } => AstType::Port,
            NodeKind::Waveform { .. } => AstType::Waveform,
            NodeKind::Block { .. } => AstType::CompoundStatement,
            NodeKind::If { .. } => AstType::IfStatement,
            NodeKind::ElseIf { .. } => AstType::ElseIfStatement,
            NodeKind::Else { .. } => AstType::ElseStatement,
            NodeKind::Switch { .. } => AstType::SwitchStatement,
            NodeKind::Case { .. } => AstType::CaseStatement,
            NodeKind::Default { .. } => AstType::DefaultStatement,
            NodeKind::For { .. } => AstType::ForStatement,
            NodeKind::While { .. } => AstType::WhileStatement,
            NodeKind::DoWhile { .. } => AstType::DoWhileStatement,
            NodeKind::Break => AstType::BreakStatement,
            NodeKind::Continue => AstType::ContinueStatement,
            NodeKind::Return { .. } => AstType::ReturnStatement,
            NodeKind::Delay { .. } => AstType::DelayStatement,
            NodeKind::Barrier { .. } => AstType::BarrierStatement,
            NodeKind::BoxStmt { kind, .. } => *kind,
            NodeKind::Pragma { .. } => AstType::Pragma,
            NodeKind::Annotation { .. } => AstType::Annotation,
            NodeKind::Declaration { .. } => AstType::Declaration,
            NodeKind::CalibrationBlock { .. } => AstType::CalibrationBlock,
            NodeKind::Array { ty, .. } => *ty,
            NodeKind::ExpressionError { .. } => AstType::ExpressionError,
            NodeKind::StatementError { .. } => AstType::StatementError,
            NodeKind::IdentifierError { .. } => AstType::IdentifierError,
            NodeKind::SyntaxError { .. } => AstType::SyntaxError,
            NodeKind::BadCast { .. } => AstType::BadCast,
            NodeKind::BadImplicitConversion { .. } => AstType::BadImplicitConversion,
        }
    }
}

/// An arena node.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// The node ID.
    pub id: NodeId,
    /// The source position recorded at construction.
    pub location: Location,
    /// The declaration context the node was built in.
    pub context: ContextId,
    /// The payload.
    pub kind: NodeKind,
}

impl Node {
    /// The classification of this node.
    #[must_use]
    pub fn ast_type(&self) -> AstType {
        self.kind.ast_type()
    }

    /// True if this node is one of the error markers.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.ast_type().is_error_type()
    }
}

/// The node arena.
#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a node and returns its id.
    pub fn alloc(&mut self, location: Location, context: ContextId, kind: NodeKind) -> NodeId {
        let id = NodeId::from(self.nodes.len());
        self.nodes.push(Node {
            id,
            location,
            context,
            kind,
        });
        id
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[usize::from(id)]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[usize::from(id)]
    }

    /// The number of nodes allocated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// A displayable view of the subtree rooted at `id`.
    #[must_use]
    pub fn display(&self, id: NodeId) -> DisplayNode {
        DisplayNode { arena: self, id }
    }
}

/// Renders a subtree with one node per line, indented by depth.
pub struct DisplayNode<'a> {
    arena: &'a Arena,
    id: NodeId,
}

impl DisplayNode<'_> {
    fn write(&self, f: &mut Formatter, id: NodeId, level: usize) -> fmt::Result {
        let node = self.arena.get(id);
        write!(
            indented(f).with_format(Format::Custom {
                inserter: &mut move |_, f: &mut dyn fmt::Write| {
                    for _ in 0..level {
                        write!(f, "    ")?;
                    }
                    Ok(())
                },
            }),
            "\n{} {} ({})",
            node.ast_type(),
            node.id,
            node.location
        )?;
        for child in children_of(&node.kind) {
            self.write(f, child, level + 1)?;
        }
        Ok(())
    }
}

impl Display for DisplayNode<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let node = self.arena.get(self.id);
        write!(f, "{} {} ({})", node.ast_type(), node.id, node.location)?;
        for child in children_of(&node.kind) {
            self.write(f, child, 1)?;
        }
        Ok(())
    }
}

/// The direct child nodes of a payload, in source order.
#[must_use]
pub fn children_of(kind: &NodeKind) -> Vec<NodeId> {
    match kind {
        NodeKind::Binary { left, right, .. } => vec![*left, *right],
        NodeKind::Unary { operand, .. } => vec![*operand],
        NodeKind::Cast { operand, .. }
        | NodeKind::ImplicitConversion { operand, .. }
        | NodeKind::BadCast { operand, .. }
        | NodeKind::BadImplicitConversion { operand, .. } => vec![*operand],
        NodeKind::Operator { target, .. } | NodeKind::Operand { target } => vec![*target],
        NodeKind::Complex { real, imag, .. } => vec![*real, *imag],
        NodeKind::InitializerList { elements } => elements.clone(),
        NodeKind::Call(call) => {
            let mut children = call.args.clone();
            children.extend(call.modifier);
            children.extend(call.result);
            children
        }
        NodeKind::GateDecl(decl) => decl.body.clone(),
        NodeKind::GateModifier {
            argument, target, ..
        } => {
            let mut children = Vec::new();
            children.extend(*argument);
            children.push(target.node());
            children
        }
        NodeKind::GPhase { theta } => vec![*theta],
        NodeKind::QubitContainer { qubits, .. } => qubits.clone(),
        NodeKind::Measure { result, .. } => result.iter().copied().collect(),
        NodeKind::DefcalDecl(decl) => {
            let mut children = decl.params.clone();
            children.extend(decl.body.iter().copied());
            children
        }
        NodeKind::CallableDecl(decl) => {
            let mut children = decl.body.clone();
            children.extend(decl.result);
            children
        }
        NodeKind::DurationOf { target } => vec![*target],
        NodeKind::Frame {
            frequency, phase, ..
        } => {
            let mut children = Vec::new();
            children.extend(*frequency);
            children.extend(*phase);
            children
        }
        NodeKind::Waveform { samples, .. } => samples.clone(),
        NodeKind::Block { statements } | NodeKind::CalibrationBlock { statements } => {
            statements.clone()
        }
        NodeKind::If {
            condition,
            then_block,
            else_ifs,
            else_block,
        } => {
            let mut children = vec![*condition, *then_block];
            children.extend(else_ifs.iter().copied());
            children.extend(*else_block);
            children
        }
        NodeKind::ElseIf { condition, block } => vec![*condition, *block],
        NodeKind::Else { block } | NodeKind::Default { block } | NodeKind::Case { block, .. } => {
            vec![*block]
        }
        NodeKind::Switch {
            quantity,
            cases,
            default,
        } => {
            let mut children = vec![*quantity];
            children.extend(cases.iter().copied());
            children.extend(*default);
            children
        }
        NodeKind::For {
            start,
            end,
            step,
            block,
            ..
        } => {
            let mut children = vec![*start, *end];
            children.extend(*step);
            children.push(*block);
            children
        }
        NodeKind::While { condition, block } => vec![*condition, *block],
        NodeKind::DoWhile { block, condition } => vec![*block, *condition],
        NodeKind::Return { value } => value.iter().copied().collect(),
        NodeKind::Delay { duration, .. } => vec![*duration],
        NodeKind::BoxStmt {
            duration, block, ..
        } => {
            let mut children = Vec::new();
            children.extend(*duration);
            children.push(*block);
            children
        }
        NodeKind::Declaration { initializer, .. } => initializer.iter().copied().collect(),
        NodeKind::Array { elements, .. } => elements.clone(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{Arena, ContextId, NodeKind};
    use crate::ast_type::AstType;
    use crate::op::OpType;
    use expect_test::expect;
    use oqasm_data_structures::location::Location;

    #[test]
    fn node_ids_are_dense_and_ordered() {
        let mut arena = Arena::new();
        let a = arena.alloc(
            Location::default(),
            ContextId::GLOBAL,
            NodeKind::BoolLiteral(true),
        );
        let b = arena.alloc(
            Location::default(),
            ContextId::GLOBAL,
            NodeKind::BoolLiteral(false),
        );
        assert_eq!(a.successor(), b);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn kinds_map_to_their_type_tags() {
        let mut arena = Arena::new();
        let one = arena.alloc(
            Location::default(),
            ContextId::GLOBAL,
            NodeKind::IntLiteral {
                value: 1,
                bits: 32,
                unsigned: false,
            },
        );
        assert_eq!(arena.get(one).ast_type(), AstType::Int);

        let unsigned = arena.alloc(
            Location::default(),
            ContextId::GLOBAL,
            NodeKind::IntLiteral {
                value: 1,
                bits: 32,
                unsigned: true,
            },
        );
        assert_eq!(arena.get(unsigned).ast_type(), AstType::UInt);
    }

    #[test]
    fn error_nodes_are_errors() {
        let mut arena = Arena::new();
        let err = arena.alloc(
            Location::default(),
            ContextId::GLOBAL,
            NodeKind::SyntaxError {
                message: "unexpected token".to_string(),
            },
        );
        assert!(arena.get(err).is_error());
    }

    #[test]
    fn display_renders_the_subtree() {
        let mut arena = Arena::new();
        let lhs = arena.alloc(
            Location::new(1, 5),
            ContextId::GLOBAL,
            NodeKind::IntLiteral {
                value: 2,
                bits: 32,
                unsigned: false,
            },
        );
        let rhs = arena.alloc(
            Location::new(1, 9),
            ContextId::GLOBAL,
            NodeKind::IntLiteral {
                value: 3,
                bits: 32,
                unsigned: false,
            },
        );
        let sum = arena.alloc(
            Location::new(1, 7),
            ContextId::GLOBAL,
            NodeKind::Binary {
                op: OpType::Add,
                left: lhs,
                right: rhs,
                has_parens: false,
                result_type: AstType::Int,
            },
        );
        expect![[r#"
            binary op 2 (1:7)
                int 0 (1:5)
                int 1 (1:9)"#]]
        .assert_eq(&arena.display(sum).to_string());
    }
}

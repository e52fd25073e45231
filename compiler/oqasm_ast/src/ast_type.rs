// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The closed classification of AST nodes. Every node carries an [`AstType`]
//! tag; the type predicates used throughout the validator and the symbol
//! table are table lookups keyed by this enum.

use enum_iterator::Sequence;
use std::fmt::{self, Display, Formatter};

/// The kind of an AST node.
///
/// The set is closed: the validator, the conversion matrix, and the mangler
/// all match exhaustively over it.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Sequence)]
pub enum AstType {
    /// A node whose classification is not yet known.
    #[default]
    Undefined,

    // Classical scalar types.
    /// The boolean type.
    Bool,
    /// The character type.
    Char,
    /// The signed machine integer type.
    Int,
    /// The unsigned machine integer type.
    UInt,
    /// The 32-bit floating-point type.
    Float,
    /// The 64-bit floating-point type.
    Double,
    /// The extended floating-point type.
    LongDouble,
    /// The arbitrary-precision signed integer type.
    MpInteger,
    /// The arbitrary-precision unsigned integer type.
    MpUinteger,
    /// The arbitrary-precision decimal type.
    MpDecimal,
    /// The arbitrary-precision complex type.
    MpComplex,
    /// A register of classical bits.
    Bitset,
    /// The angle type.
    Angle,
    /// The string type.
    String,
    /// A string literal.
    StringLiteral,
    /// The `const` qualifier tag. Only used by the mangler.
    Const,

    // Quantum types.
    /// A single qubit.
    Qubit,
    /// A register of qubits addressable as `r[i]`.
    QubitContainer,
    /// A rebinding, slice, or concatenation of qubit containers.
    QubitContainerAlias,
    /// A qubit parameter of a gate definition.
    GateQubitParam,

    // Timing types.
    /// A duration with a length unit.
    Duration,
    /// The duration of a boxed sequence (`durationof`).
    DurationOf,
    /// A stretchable duration.
    Stretch,
    /// A length expression.
    Length,
    /// A bare time unit.
    TimeUnit,

    // OpenPulse surface types.
    /// A calibration frame (phase, frequency, time).
    Frame,
    /// A hardware port.
    Port,
    /// A pulse waveform.
    Waveform,

    // Gates.
    /// A user gate definition.
    Gate,
    /// The built-in single-qubit `U` gate.
    UGate,
    /// The built-in two-qubit `CX` gate.
    CXGate,
    /// The built-in three-qubit `CCX` gate.
    CCXGate,
    /// The OpenQASM 2 `CNOT` compatibility gate.
    CNotGate,
    /// The OpenQASM 2 Hadamard compatibility gate.
    HadamardGate,
    /// A gate applied to qubit operands.
    GateQOp,
    /// A call of a gate with bound parameters and qubits.
    GateCall,
    /// A standalone global-phase expression.
    GPhaseExpression,
    /// A global-phase expression attached to a gate.
    GateGPhaseExpression,
    /// The `ctrl @` modifier.
    GateControl,
    /// The `negctrl @` modifier.
    GateNegControl,
    /// The `inv @` modifier.
    GateInverse,
    /// The `pow(k) @` modifier.
    GatePower,

    // Defcals.
    /// A calibration definition.
    Defcal,
    /// The group of all defcal specializations sharing a base name.
    DefcalGroup,
    /// A calibration definition for `measure`.
    DefcalMeasure,
    /// A calibration definition for `reset`.
    DefcalReset,
    /// A calibration definition for `delay`.
    DefcalDelay,
    /// A call of a defcal specialization.
    DefcalCall,

    // Callables.
    /// A classical function definition.
    Function,
    /// A call of a classical function.
    FunctionCall,
    /// An `extern` kernel declaration.
    Kernel,
    /// A call of an extern kernel.
    KernelCall,
    /// The declared result of a callable.
    Result,

    // Expressions.
    /// An uninterpreted expression wrapper.
    Expression,
    /// A named identifier.
    Identifier,
    /// An identifier with a subscript.
    IdentifierRef,
    /// A binary operation.
    BinaryOp,
    /// A unary operation.
    UnaryOp,
    /// An explicit cast.
    Cast,
    /// A conversion inserted by the validator.
    ImplicitConversion,
    /// A unary operator applied to a target expression, kept distinct so the
    /// mangler can encode operator applications.
    Operator,
    /// A nullary operand wrapper, kept distinct so the mangler can encode the
    /// n-th operand of an operator.
    Operand,
    /// A complex-number construction `a + b im`.
    ComplexExpression,
    /// A brace-enclosed initializer list.
    InitializerList,
    /// The `...` ellipsis.
    Ellipsis,

    // Statements.
    /// An uninterpreted statement wrapper.
    Statement,
    /// A brace-enclosed block.
    CompoundStatement,
    /// An `if` statement.
    IfStatement,
    /// An `else if` branch.
    ElseIfStatement,
    /// An `else` branch.
    ElseStatement,
    /// A `switch` statement.
    SwitchStatement,
    /// A labeled `case` inside a switch.
    CaseStatement,
    /// The `default` case inside a switch.
    DefaultStatement,
    /// A `for` loop.
    ForStatement,
    /// A `while` loop.
    WhileStatement,
    /// A `do ... while` loop.
    DoWhileStatement,
    /// A `break` statement.
    BreakStatement,
    /// A `continue` statement.
    ContinueStatement,
    /// A `return` statement.
    ReturnStatement,
    /// A `delay` instruction.
    DelayStatement,
    /// A `stretch` declaration.
    StretchStatement,
    /// A `barrier` instruction.
    BarrierStatement,
    /// A `box` statement.
    BoxStatement,
    /// A `boxas` statement.
    BoxAsStatement,
    /// A `boxto` statement.
    BoxToStatement,
    /// A `measure` operation.
    Measure,
    /// A `reset` operation.
    Reset,
    /// A `pragma` line.
    Pragma,
    /// An `@annotation` line.
    Annotation,
    /// A classical declaration statement.
    Declaration,
    /// A gate definition statement.
    GateDeclaration,
    /// A qubit declaration statement.
    QubitDeclaration,
    /// A `cal` / `defcalgrammar` block.
    CalibrationBlock,

    // Arrays.
    /// An array whose element type is not further distinguished.
    Array,
    /// An array of classical bits.
    CBitArray,
    /// An array of qubits.
    QubitArray,
    /// An array of booleans.
    BoolArray,
    /// An array of machine integers.
    IntArray,
    /// An array of arbitrary-precision integers.
    MpIntegerArray,
    /// An array of floats.
    FloatArray,
    /// An array of arbitrary-precision decimals.
    MpDecimalArray,
    /// An array of arbitrary-precision complex numbers.
    MpComplexArray,
    /// An array of angles.
    AngleArray,
    /// An array of durations.
    DurationArray,
    /// An array of frames.
    FrameArray,
    /// An array of ports.
    PortArray,
    /// An array of waveforms.
    WaveformArray,

    // Error markers. These keep the tree linked after a diagnostic.
    /// An expression that failed validation.
    ExpressionError,
    /// A statement that failed validation.
    StatementError,
    /// An identifier that failed name resolution.
    IdentifierError,
    /// A syntax error threaded into the tree by the parser.
    SyntaxError,
    /// An illegal explicit cast.
    BadCast,
    /// An illegal implicit conversion.
    BadImplicitConversion,
}

impl AstType {
    /// The surface-syntax name used in diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            AstType::Undefined => "undefined",
            AstType::Bool => "bool",
            AstType::Char => "char",
            AstType::Int => "int",
            AstType::UInt => "uint",
            AstType::Float => "float",
            AstType::Double => "double",
            AstType::LongDouble => "long double",
            AstType::MpInteger => "mp-integer",
            AstType::MpUinteger => "mp-uinteger",
            AstType::MpDecimal => "mp-decimal",
            AstType::MpComplex => "mp-complex",
            AstType::Bitset => "bit",
            AstType::Angle => "angle",
            AstType::String => "string",
            AstType::StringLiteral => "string literal",
            AstType::Const => "const",
            AstType::Qubit => "qubit",
            AstType::QubitContainer => "qubit register",
            AstType::QubitContainerAlias => "qubit alias",
            AstType::GateQubitParam => "gate qubit parameter",
            AstType::Duration => "duration",
            AstType::DurationOf => "durationof",
            AstType::Stretch => "stretch",
            AstType::Length => "length",
            AstType::TimeUnit => "time unit",
            AstType::Frame => "frame",
            AstType::Port => "port",
            AstType::Waveform => "waveform",
            AstType::Gate => "gate",
            AstType::UGate => "U",
            AstType::CXGate => "CX",
            AstType::CCXGate => "CCX",
            AstType::CNotGate => "CNOT",
            AstType::HadamardGate => "hadamard",
            AstType::GateQOp => "gate operation",
            AstType::GateCall => "gate call",
            AstType::GPhaseExpression => "gphase",
            AstType::GateGPhaseExpression => "gate gphase",
            AstType::GateControl => "ctrl",
            AstType::GateNegControl => "negctrl",
            AstType::GateInverse => "inv",
            AstType::GatePower => "pow",
            AstType::Defcal => "defcal",
            AstType::DefcalGroup => "defcal group",
            AstType::DefcalMeasure => "defcal measure",
            AstType::DefcalReset => "defcal reset",
            AstType::DefcalDelay => "defcal delay",
            AstType::DefcalCall => "defcal call",
            AstType::Function => "def",
            AstType::FunctionCall => "function call",
            AstType::Kernel => "extern",
            AstType::KernelCall => "extern call",
            AstType::Result => "result",
            AstType::Expression => "expression",
            AstType::Identifier => "identifier",
            AstType::IdentifierRef => "indexed identifier",
            AstType::BinaryOp => "binary op",
            AstType::UnaryOp => "unary op",
            AstType::Cast => "cast",
            AstType::ImplicitConversion => "implicit conversion",
            AstType::Operator => "operator",
            AstType::Operand => "operand",
            AstType::ComplexExpression => "complex expression",
            AstType::InitializerList => "initializer list",
            AstType::Ellipsis => "ellipsis",
            AstType::Statement => "statement",
            AstType::CompoundStatement => "block",
            AstType::IfStatement => "if",
            AstType::ElseIfStatement => "else if",
            AstType::ElseStatement => "else",
            AstType::SwitchStatement => "switch",
            AstType::CaseStatement => "case",
            AstType::DefaultStatement => "default",
            AstType::ForStatement => "for",
            AstType::WhileStatement => "while",
            AstType::DoWhileStatement => "do while",
            AstType::BreakStatement => "break",
            AstType::ContinueStatement => "continue",
            AstType::ReturnStatement => "return",
            AstType::DelayStatement => "delay",
            AstType::StretchStatement => "stretch statement",
            AstType::BarrierStatement => "barrier",
            AstType::BoxStatement => "box",
            AstType::BoxAsStatement => "boxas",
            AstType::BoxToStatement => "boxto",
            AstType::Measure => "measure",
            AstType::Reset => "reset",
            AstType::Pragma => "pragma",
            AstType::Annotation => "annotation",
            AstType::Declaration => "declaration",
            AstType::GateDeclaration => "gate declaration",
            AstType::QubitDeclaration => "qubit declaration",
            AstType::CalibrationBlock => "cal",
            AstType::Array => "array",
            AstType::CBitArray => "bit array",
            AstType::QubitArray => "qubit array",
            AstType::BoolArray => "bool array",
            AstType::IntArray => "int array",
            AstType::MpIntegerArray => "mp-integer array",
            AstType::FloatArray => "float array",
            AstType::MpDecimalArray => "mp-decimal array",
            AstType::MpComplexArray => "mp-complex array",
            AstType::AngleArray => "angle array",
            AstType::DurationArray => "duration array",
            AstType::FrameArray => "frame array",
            AstType::PortArray => "port array",
            AstType::WaveformArray => "waveform array",
            AstType::ExpressionError => "expression error",
            AstType::StatementError => "statement error",
            AstType::IdentifierError => "identifier error",
            AstType::SyntaxError => "syntax error",
            AstType::BadCast => "bad cast",
            AstType::BadImplicitConversion => "bad implicit conversion",
        }
    }

    /// True for the machine and arbitrary-precision integer types.
    #[must_use]
    pub fn is_integer_type(self) -> bool {
        matches!(
            self,
            AstType::Int
                | AstType::UInt
                | AstType::MpInteger
                | AstType::MpUinteger
                | AstType::Bitset
        )
    }

    /// True for the machine integer types only, excluding the
    /// arbitrary-precision promotions and bitsets.
    #[must_use]
    pub fn is_unpromoted_integer_type(self) -> bool {
        matches!(self, AstType::Int | AstType::UInt)
    }

    /// True for the floating-point types.
    #[must_use]
    pub fn is_float_type(self) -> bool {
        matches!(
            self,
            AstType::Float | AstType::Double | AstType::LongDouble | AstType::MpDecimal
        )
    }

    /// True for every classical scalar type.
    #[must_use]
    pub fn is_scalar_type(self) -> bool {
        matches!(
            self,
            AstType::Bool | AstType::Char | AstType::Bitset
        ) || self.is_integer_type()
            || self.is_float_type()
    }

    /// True for the scalar types that do not involve an arbitrary-precision
    /// representation.
    #[must_use]
    pub fn is_unpromoted_scalar_type(self) -> bool {
        matches!(
            self,
            AstType::Bool
                | AstType::Char
                | AstType::Int
                | AstType::UInt
                | AstType::Float
                | AstType::Double
                | AstType::LongDouble
                | AstType::Bitset
        )
    }

    /// True for every type with a numeric value, including bool.
    #[must_use]
    pub fn is_numeric_type(self) -> bool {
        matches!(self, AstType::Bool) || self.is_integer_type() || self.is_float_type()
    }

    /// True for the complex types.
    #[must_use]
    pub fn is_complex_type(self) -> bool {
        matches!(self, AstType::MpComplex | AstType::ComplexExpression)
    }

    /// True for the angle type.
    #[must_use]
    pub fn is_angle_type(self) -> bool {
        matches!(self, AstType::Angle)
    }

    /// True for qubits, qubit registers, and their aliases.
    #[must_use]
    pub fn is_qubit_type(self) -> bool {
        matches!(
            self,
            AstType::Qubit
                | AstType::QubitContainer
                | AstType::QubitContainerAlias
                | AstType::GateQubitParam
        )
    }

    /// True for the timing types that participate in arithmetic with scalars
    /// (duration algebra).
    #[must_use]
    pub fn is_quantum_arithmetic_type(self) -> bool {
        matches!(
            self,
            AstType::Duration | AstType::DurationOf | AstType::Stretch | AstType::Length
        )
    }

    /// True for every timing type.
    #[must_use]
    pub fn is_time_type(self) -> bool {
        self.is_quantum_arithmetic_type() || matches!(self, AstType::TimeUnit)
    }

    /// True for the call kinds whose value is the callee's declared result.
    #[must_use]
    pub fn is_returning_type(self) -> bool {
        matches!(
            self,
            AstType::FunctionCall
                | AstType::KernelCall
                | AstType::DefcalCall
                | AstType::Measure
                | AstType::Result
        )
    }

    /// True for every array type.
    #[must_use]
    pub fn is_array_type(self) -> bool {
        matches!(
            self,
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
                | AstType::WaveformArray
        )
    }

    /// True for the types a declaration of which can appear on the left of an
    /// assignment. Qubits are excluded; the lvalue check rejects them before
    /// consulting const-ness.
    #[must_use]
    pub fn is_assignable_type(self) -> bool {
        self.is_scalar_type()
            || self.is_angle_type()
            || self.is_complex_type()
            || matches!(
                self,
                AstType::Duration | AstType::Stretch | AstType::Frame | AstType::Port
                    | AstType::Waveform
            )
            || self.is_array_type()
    }

    /// True for the types whose symbols transfer into an enclosing
    /// function/gate/defcal definition when the definition is finalized.
    #[must_use]
    pub fn is_local_scope_type(self) -> bool {
        self.is_scalar_type()
            || self.is_angle_type()
            || self.is_complex_type()
            || self.is_qubit_type()
            || self.is_quantum_arithmetic_type()
            || self.is_array_type()
            || matches!(
                self,
                AstType::Frame
                    | AstType::Port
                    | AstType::Waveform
                    | AstType::BinaryOp
                    | AstType::UnaryOp
                    | AstType::Result
            )
    }

    /// True if a later declaration with the same name at a nested scope may
    /// shadow a declaration of this type. Gates, functions, defcals, kernels,
    /// and qubits never admit redeclaration.
    #[must_use]
    pub fn admits_redeclaration(self) -> bool {
        !matches!(
            self,
            AstType::Gate
                | AstType::UGate
                | AstType::CXGate
                | AstType::CCXGate
                | AstType::CNotGate
                | AstType::HadamardGate
                | AstType::Defcal
                | AstType::DefcalGroup
                | AstType::DefcalMeasure
                | AstType::DefcalReset
                | AstType::DefcalDelay
                | AstType::Function
                | AstType::Kernel
                | AstType::Qubit
                | AstType::QubitContainer
                | AstType::QubitContainerAlias
        )
    }

    /// True for the gate kinds, built-ins included.
    #[must_use]
    pub fn is_gate_type(self) -> bool {
        matches!(
            self,
            AstType::Gate
                | AstType::UGate
                | AstType::CXGate
                | AstType::CCXGate
                | AstType::CNotGate
                | AstType::HadamardGate
        )
    }

    /// True for the defcal kinds.
    #[must_use]
    pub fn is_defcal_type(self) -> bool {
        matches!(
            self,
            AstType::Defcal
                | AstType::DefcalGroup
                | AstType::DefcalMeasure
                | AstType::DefcalReset
                | AstType::DefcalDelay
        )
    }

    /// True for the gate modifier kinds.
    #[must_use]
    pub fn is_gate_modifier_type(self) -> bool {
        matches!(
            self,
            AstType::GateControl
                | AstType::GateNegControl
                | AstType::GateInverse
                | AstType::GatePower
                | AstType::GPhaseExpression
                | AstType::GateGPhaseExpression
        )
    }

    /// True for the error markers.
    #[must_use]
    pub fn is_error_type(self) -> bool {
        matches!(
            self,
            AstType::ExpressionError
                | AstType::StatementError
                | AstType::IdentifierError
                | AstType::SyntaxError
                | AstType::BadCast
                | AstType::BadImplicitConversion
        )
    }
}

impl Display for AstType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::AstType;
    use enum_iterator::all;

    #[test]
    fn every_type_has_a_name() {
        for ty in all::<AstType>() {
            assert!(!ty.name().is_empty());
        }
    }

    #[test]
    fn scalar_covers_integers_and_floats() {
        for ty in all::<AstType>() {
            if ty.is_integer_type() || ty.is_float_type() {
                assert!(ty.is_scalar_type(), "{ty} should be scalar");
            }
        }
    }

    #[test]
    fn unpromoted_integers_are_integers() {
        for ty in all::<AstType>() {
            if ty.is_unpromoted_integer_type() {
                assert!(ty.is_integer_type());
            }
        }
    }

    #[test]
    fn qubits_are_not_assignable() {
        for ty in all::<AstType>() {
            if ty.is_qubit_type() {
                assert!(!ty.is_assignable_type(), "{ty} should not be assignable");
            }
        }
    }

    #[test]
    fn gates_functions_defcals_qubits_never_redeclare() {
        for ty in all::<AstType>() {
            if ty.is_gate_type() || ty.is_defcal_type() || ty.is_qubit_type() {
                if ty == AstType::GateQubitParam {
                    continue;
                }
                assert!(!ty.admits_redeclaration(), "{ty} must not redeclare");
            }
        }
        assert!(!AstType::Function.admits_redeclaration());
        assert!(!AstType::Kernel.admits_redeclaration());
        assert!(AstType::Int.admits_redeclaration());
        assert!(AstType::Angle.admits_redeclaration());
    }

    #[test]
    fn error_markers_are_disjoint_from_value_types() {
        for ty in all::<AstType>() {
            if ty.is_error_type() {
                assert!(!ty.is_scalar_type());
                assert!(!ty.is_qubit_type());
                assert!(!ty.is_array_type());
            }
        }
    }
}

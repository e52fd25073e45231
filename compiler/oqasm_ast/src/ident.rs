// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Identifiers and indexed identifier references. Identifiers are owned by a
//! registry and referred to by [`IdentId`]; a small set of reserved
//! identifiers (π, τ, euler, the built-in gates, the type names) is interned
//! at init time and shared, everything else is registry-allocated per
//! declaration.

use crate::ast::{ContextId, NodeId, SymbolId};
use crate::ast_type::AstType;
use crate::string_utils::{self, ParsedIndex};
use bitflags::bitflags;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// The unique identifier of an [`Identifier`] in its registry.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct IdentId(u32);

impl IdentId {
    #[must_use]
    pub fn successor(self) -> Self {
        Self(self.0 + 1)
    }
}

impl From<IdentId> for usize {
    fn from(value: IdentId) -> Self {
        value.0 as usize
    }
}

impl From<usize> for IdentId {
    #[allow(clippy::cast_possible_truncation)]
    fn from(value: usize) -> Self {
        Self(value as u32)
    }
}

impl Display for IdentId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The unique identifier of an [`IdentifierRef`] in its registry.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RefId(u32);

impl From<RefId> for usize {
    fn from(value: RefId) -> Self {
        value.0 as usize
    }
}

impl From<usize> for RefId {
    #[allow(clippy::cast_possible_truncation)]
    fn from(value: usize) -> Self {
        Self(value as u32)
    }
}

impl Display for RefId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Where a symbol is visible from.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SymbolScope {
    /// Visible everywhere.
    Global,
    /// Visible within its declaration context.
    #[default]
    Local,
    /// Declared `extern`.
    Extern,
}

impl Display for SymbolScope {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            SymbolScope::Global => f.write_str("global"),
            SymbolScope::Local => f.write_str("local"),
            SymbolScope::Extern => f.write_str("extern"),
        }
    }
}

bitflags! {
    /// Identifier state flags.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct IdentFlags: u8 {
        /// Shadows a prior declaration at a dominating scope.
        const REDECLARATION = 1;
        /// A loop induction variable.
        const INDUCTION_VARIABLE = 1 << 1;
        /// Declared inside a gate body.
        const GATE_LOCAL = 1 << 2;
        /// A gate declared without qubit operands.
        const NO_QUBIT = 1 << 3;
        /// The real or imaginary component of a complex value.
        const COMPLEX_PART = 1 << 4;
    }
}

/// The remembered evaluation of an identifier that names a computed value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Evaluation {
    /// [`AstType::BinaryOp`] or [`AstType::UnaryOp`].
    pub kind: AstType,
    /// The operation node the identifier evaluates.
    pub node: NodeId,
}

/// A named AST entity. See the module docs for the ownership story.
#[derive(Clone, Debug)]
pub struct Identifier {
    /// The surface name. May embed `[index]` syntax; if so the index fields
    /// below are populated at construction.
    pub name: String,
    /// The mangled signature, set by the mangler.
    pub mangled_name: Option<String>,
    /// The mangled literal form, set by the mangler for literal-bearing
    /// identifiers.
    pub mangled_literal_name: Option<String>,
    /// The alternate name used while a gate parameter is temporarily retyped.
    pub polymorphic_name: Option<String>,
    /// The intrinsic width in bits.
    pub bits: u32,
    /// The current classification.
    pub symbol_type: AstType,
    /// The remembered classification for restoration after temporary
    /// retyping.
    pub polymorphic_type: Option<AstType>,
    /// The visibility of the symbol.
    pub symbol_scope: SymbolScope,
    /// The context this identifier was registered in.
    pub declaration_context: ContextId,
    /// Back-pointer to the owning symbol-table entry.
    pub symbol_table_entry: Option<SymbolId>,
    /// True if the surface name carried a subscript.
    pub is_indexed: bool,
    /// The numeric subscript, when `is_indexed` and the subscript was a
    /// literal.
    pub numeric_index: Option<usize>,
    /// The subscript identifier, when `is_indexed` and the subscript was a
    /// name.
    pub index_identifier: Option<String>,
    /// The evaluation of a computed-value identifier.
    pub evaluation: Option<Evaluation>,
    /// The prior same-named declaration this identifier shadows.
    pub predecessor: Option<IdentId>,
    /// State flags.
    pub flags: IdentFlags,
    /// Subscripted references to this identifier, keyed by reference index.
    pub references: BTreeMap<usize, RefId>,
}

impl Identifier {
    /// Builds an identifier from a surface name, parsing any embedded
    /// subscript or alias form.
    #[must_use]
    pub fn new(name: &str, bits: u32, symbol_type: AstType, context: ContextId) -> Self {
        assert!(!name.is_empty(), "identifier names are never empty");
        let parsed = string_utils::parse_name(name);
        let (is_indexed, numeric_index, index_identifier) = match parsed.index {
            Some(ParsedIndex::Numeric(n)) => (true, Some(n), None),
            Some(ParsedIndex::Named(id)) => (true, None, Some(id)),
            None => (false, None, None),
        };
        let display_name = if is_indexed {
            string_utils::normalize_alias(name)
        } else {
            parsed.base.clone()
        };

        Self {
            name: display_name,
            mangled_name: None,
            mangled_literal_name: None,
            polymorphic_name: None,
            bits,
            symbol_type,
            polymorphic_type: None,
            symbol_scope: SymbolScope::Local,
            declaration_context: context,
            symbol_table_entry: None,
            is_indexed,
            numeric_index,
            index_identifier,
            evaluation: None,
            predecessor: None,
            flags: IdentFlags::empty(),
            references: BTreeMap::new(),
        }
    }

    /// The name without any subscript.
    #[must_use]
    pub fn base_name(&self) -> String {
        string_utils::parse_name(&self.name).base
    }

    /// True if this identifier shadows a prior declaration.
    #[must_use]
    pub fn is_redeclaration(&self) -> bool {
        self.flags.contains(IdentFlags::REDECLARATION)
    }

    /// True if this identifier names a hardware-bound qubit.
    #[must_use]
    pub fn is_hardware_qubit(&self) -> bool {
        string_utils::is_hardware_qubit(&self.name)
    }

    /// True if a mangled name has been assigned.
    #[must_use]
    pub fn is_mangled(&self) -> bool {
        self.mangled_name.is_some()
    }

    /// Retypes a gate parameter, remembering the previous classification so
    /// [`Identifier::restore_type`] can undo it.
    pub fn retype(&mut self, ty: AstType) {
        if self.polymorphic_type.is_none() {
            self.polymorphic_type = Some(self.symbol_type);
        }
        self.symbol_type = ty;
    }

    /// Restores the classification remembered by [`Identifier::retype`].
    pub fn restore_type(&mut self) {
        if let Some(ty) = self.polymorphic_type.take() {
            self.symbol_type = ty;
        }
    }
}

/// A subscripted use of an identifier. The reference type is resolved once
/// from the container type and the subscript.
#[derive(Clone, Debug)]
pub struct IdentifierRef {
    /// The identifier being subscripted.
    pub ident: IdentId,
    /// The full indexed surface name, e.g. `q[3]`.
    pub name: String,
    /// The subscript.
    pub index: usize,
    /// The resolved type of the referenced element.
    pub reference_type: AstType,
    /// The width of the referenced element.
    pub bits: u32,
}

/// The element type obtained by subscripting a container of the given type.
#[must_use]
pub fn reference_type_of(container: AstType) -> AstType {
    match container {
        AstType::Bitset | AstType::CBitArray => AstType::Bitset,
        AstType::QubitContainer | AstType::QubitContainerAlias | AstType::QubitArray => {
            AstType::Qubit
        }
        AstType::BoolArray => AstType::Bool,
        AstType::IntArray => AstType::Int,
        AstType::MpIntegerArray => AstType::MpInteger,
        AstType::FloatArray => AstType::Float,
        AstType::MpDecimalArray => AstType::MpDecimal,
        AstType::MpComplexArray => AstType::MpComplex,
        AstType::AngleArray | AstType::Angle => AstType::Angle,
        AstType::DurationArray => AstType::Duration,
        AstType::FrameArray => AstType::Frame,
        AstType::PortArray => AstType::Port,
        AstType::WaveformArray => AstType::Waveform,
        _ => AstType::Undefined,
    }
}

/// The width of an element obtained by subscripting a container declared with
/// the given element width.
#[must_use]
pub fn reference_bits_of(container: AstType, element_bits: u32) -> u32 {
    match container {
        // A bit out of a bitset or bit array is a single bit; so is a qubit
        // out of a register.
        AstType::Bitset
        | AstType::CBitArray
        | AstType::QubitContainer
        | AstType::QubitContainerAlias
        | AstType::QubitArray => 1,
        _ => element_bits,
    }
}

/// The identifier registry. Owns every identifier and reference; interned
/// identifiers additionally appear in the reserved map and are the only ones
/// that may be "cloned" (cloning returns the interned id itself).
#[derive(Debug, Default)]
pub struct IdentRegistry {
    idents: Vec<Identifier>,
    refs: Vec<IdentifierRef>,
    reserved: BTreeMap<(String, u32, AstType), IdentId>,
}

/// The error returned when cloning a non-interned identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IllegalClone(pub IdentId);

impl IdentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a registry identifier.
    pub fn create(
        &mut self,
        name: &str,
        bits: u32,
        symbol_type: AstType,
        context: ContextId,
    ) -> IdentId {
        let id = IdentId::from(self.idents.len());
        self.idents
            .push(Identifier::new(name, bits, symbol_type, context));
        id
    }

    /// Allocates and interns a reserved identifier. Idempotent: a matching
    /// `(name, bits, type)` that is already interned is returned as-is.
    pub fn intern(
        &mut self,
        name: &str,
        bits: u32,
        symbol_type: AstType,
        context: ContextId,
    ) -> IdentId {
        let key = (name.to_string(), bits, symbol_type);
        if let Some(&id) = self.reserved.get(&key) {
            return id;
        }
        let id = self.create(name, bits, symbol_type, context);
        self.idents[usize::from(id)].symbol_scope = SymbolScope::Global;
        self.reserved.insert(key, id);
        id
    }

    /// Looks up an interned identifier by its `(name, bits, type)` key.
    #[must_use]
    pub fn find_interned(&self, name: &str, bits: u32, symbol_type: AstType) -> Option<IdentId> {
        self.reserved
            .get(&(name.to_string(), bits, symbol_type))
            .copied()
    }

    /// True if the identifier resides in the interned set.
    #[must_use]
    pub fn is_interned(&self, id: IdentId) -> bool {
        self.reserved.values().any(|&v| v == id)
    }

    /// Clones an identifier. Only interned identifiers may be cloned, and the
    /// clone is the interned identifier itself.
    pub fn clone_ident(&self, id: IdentId) -> Result<IdentId, IllegalClone> {
        if self.is_interned(id) {
            Ok(id)
        } else {
            Err(IllegalClone(id))
        }
    }

    /// Allocates an identifier reference and records it on the base
    /// identifier under the next free reference index.
    pub fn create_ref(
        &mut self,
        ident: IdentId,
        index: usize,
        reference_type: AstType,
        bits: u32,
    ) -> RefId {
        let name = string_utils::indexed_of(&self.idents[usize::from(ident)].base_name(), index);
        let ref_id = RefId::from(self.refs.len());
        self.refs.push(IdentifierRef {
            ident,
            name,
            index,
            reference_type,
            bits,
        });
        let base = &mut self.idents[usize::from(ident)];
        let next = base.references.len();
        base.references.insert(next, ref_id);
        ref_id
    }

    #[must_use]
    pub fn get(&self, id: IdentId) -> &Identifier {
        &self.idents[usize::from(id)]
    }

    pub fn get_mut(&mut self, id: IdentId) -> &mut Identifier {
        &mut self.idents[usize::from(id)]
    }

    #[must_use]
    pub fn get_ref(&self, id: RefId) -> &IdentifierRef {
        &self.refs[usize::from(id)]
    }

    pub fn get_ref_mut(&mut self, id: RefId) -> &mut IdentifierRef {
        &mut self.refs[usize::from(id)]
    }

    /// The number of identifiers allocated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.idents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.idents.is_empty()
    }
}

/// The recognized angle subtypes. The reserved Greek-letter names map onto
/// these; ASCII spellings and both cases of the UTF-8 letters normalize to
/// the same subtype.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AngleKind {
    /// An ordinary angle.
    #[default]
    General,
    Alpha,
    Beta,
    Gamma,
    Delta,
    Epsilon,
    Zeta,
    Eta,
    Theta,
    Iota,
    Kappa,
    Lambda,
    Mu,
    Nu,
    Xi,
    Omicron,
    Pi,
    Rho,
    Sigma,
    Tau,
    Upsilon,
    Phi,
    Chi,
    Psi,
    Omega,
}

impl AngleKind {
    /// Resolves an angle-subtype name. Accepts the ASCII spelling and the
    /// lowercase and uppercase UTF-8 Greek letters.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "alpha" | "α" | "Α" => AngleKind::Alpha,
            "beta" | "β" | "Β" => AngleKind::Beta,
            "gamma" | "γ" | "Γ" => AngleKind::Gamma,
            "delta" | "δ" | "Δ" => AngleKind::Delta,
            "epsilon" | "ε" | "Ε" => AngleKind::Epsilon,
            "zeta" | "ζ" | "Ζ" => AngleKind::Zeta,
            "eta" | "η" | "Η" => AngleKind::Eta,
            "theta" | "θ" | "Θ" => AngleKind::Theta,
            "iota" | "ι" | "Ι" => AngleKind::Iota,
            "kappa" | "κ" | "Κ" => AngleKind::Kappa,
            "lambda" | "λ" | "Λ" => AngleKind::Lambda,
            "mu" | "μ" | "Μ" => AngleKind::Mu,
            "nu" | "ν" | "Ν" => AngleKind::Nu,
            "xi" | "ξ" | "Ξ" => AngleKind::Xi,
            "omicron" | "ο" | "Ο" => AngleKind::Omicron,
            "pi" | "π" | "Π" => AngleKind::Pi,
            "rho" | "ρ" | "Ρ" => AngleKind::Rho,
            "sigma" | "σ" | "Σ" => AngleKind::Sigma,
            "tau" | "τ" | "Τ" => AngleKind::Tau,
            "upsilon" | "υ" | "Υ" => AngleKind::Upsilon,
            "phi" | "φ" | "Φ" => AngleKind::Phi,
            "chi" | "χ" | "Χ" => AngleKind::Chi,
            "psi" | "ψ" | "Ψ" => AngleKind::Psi,
            "omega" | "ω" | "Ω" => AngleKind::Omega,
            _ => AngleKind::General,
        }
    }

    /// True for the subtypes whose value is fixed at init (π, τ, euler).
    #[must_use]
    pub fn is_value_reserved(self) -> bool {
        matches!(self, AngleKind::Pi | AngleKind::Tau | AngleKind::Epsilon)
    }
}

/// True if the name is one of the reserved constant angles (π, τ, euler and
/// their synonyms). Assignment to these is rejected.
#[must_use]
pub fn is_reserved_angle_name(name: &str) -> bool {
    matches!(name, "pi" | "π" | "tau" | "τ" | "euler" | "ε")
}

#[cfg(test)]
mod tests {
    use super::{
        is_reserved_angle_name, reference_type_of, AngleKind, IdentFlags, IdentRegistry,
    };
    use crate::ast::ContextId;
    use crate::ast_type::AstType;

    fn registry() -> IdentRegistry {
        IdentRegistry::new()
    }

    #[test]
    fn indexed_name_parses_at_construction() {
        let mut reg = registry();
        let id = reg.create("q[3]", 1, AstType::Qubit, ContextId::GLOBAL);
        let ident = reg.get(id);
        assert!(ident.is_indexed);
        assert_eq!(ident.numeric_index, Some(3));
        assert_eq!(ident.base_name(), "q");
    }

    #[test]
    fn alias_form_normalizes_to_indexed_form() {
        let mut reg = registry();
        let id = reg.create("%q:2", 1, AstType::Qubit, ContextId::GLOBAL);
        assert_eq!(reg.get(id).name, "q[2]");
        assert_eq!(reg.get(id).numeric_index, Some(2));
    }

    #[test]
    fn clone_is_restricted_to_interned_identifiers() {
        let mut reg = registry();
        let pi = reg.intern("pi", 64, AstType::Angle, ContextId::GLOBAL);
        let x = reg.create("x", 32, AstType::Int, ContextId::GLOBAL);
        assert_eq!(reg.clone_ident(pi), Ok(pi));
        assert!(reg.clone_ident(x).is_err());
    }

    #[test]
    fn intern_is_idempotent() {
        let mut reg = registry();
        let a = reg.intern("tau", 64, AstType::Angle, ContextId::GLOBAL);
        let b = reg.intern("tau", 64, AstType::Angle, ContextId::GLOBAL);
        assert_eq!(a, b);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn retype_round_trips() {
        let mut reg = registry();
        let id = reg.create("theta", 64, AstType::Angle, ContextId::GLOBAL);
        reg.get_mut(id).retype(AstType::MpDecimal);
        assert_eq!(reg.get(id).symbol_type, AstType::MpDecimal);
        reg.get_mut(id).restore_type();
        assert_eq!(reg.get(id).symbol_type, AstType::Angle);
    }

    #[test]
    fn references_are_recorded_in_order() {
        let mut reg = registry();
        let q = reg.create("q", 4, AstType::QubitContainer, ContextId::GLOBAL);
        let r0 = reg.create_ref(q, 0, AstType::Qubit, 1);
        let r1 = reg.create_ref(q, 1, AstType::Qubit, 1);
        let refs: Vec<_> = reg.get(q).references.values().copied().collect();
        assert_eq!(refs, vec![r0, r1]);
        assert_eq!(reg.get_ref(r1).name, "q[1]");
    }

    #[test]
    fn greek_names_normalize_across_encodings() {
        assert_eq!(AngleKind::from_name("theta"), AngleKind::Theta);
        assert_eq!(AngleKind::from_name("θ"), AngleKind::Theta);
        assert_eq!(AngleKind::from_name("Θ"), AngleKind::Theta);
        assert_eq!(AngleKind::from_name("lambda"), AngleKind::from_name("λ"));
        assert_eq!(AngleKind::from_name("x"), AngleKind::General);
    }

    #[test]
    fn reserved_angles_cover_synonyms() {
        for name in ["pi", "π", "tau", "τ", "euler", "ε"] {
            assert!(is_reserved_angle_name(name), "{name}");
        }
        assert!(!is_reserved_angle_name("theta"));
    }

    #[test]
    fn subscripting_resolves_element_types() {
        assert_eq!(reference_type_of(AstType::Bitset), AstType::Bitset);
        assert_eq!(reference_type_of(AstType::QubitContainer), AstType::Qubit);
        assert_eq!(reference_type_of(AstType::MpDecimalArray), AstType::MpDecimal);
        assert_eq!(reference_type_of(AstType::Int), AstType::Undefined);
    }

    #[test]
    fn flags_default_empty() {
        let mut reg = registry();
        let id = reg.create("x", 32, AstType::Int, ContextId::GLOBAL);
        assert_eq!(reg.get(id).flags, IdentFlags::empty());
        assert!(!reg.get(id).is_redeclaration());
    }
}

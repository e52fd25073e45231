// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Diagnostics. Errors are values: every failed construction yields an
//! error-tagged node and exactly one [`Diagnostic`] reported through the
//! emitter. An ICE marks the session fatal; the caller must stop translating.

use miette::Diagnostic as MietteDiagnostic;
use oqasm_data_structures::location::Location;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// The severity of a diagnostic.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum DiagLevel {
    Warning,
    Error,
    /// An internal compiler error. Translation stops.
    Ice,
}

impl Display for DiagLevel {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            DiagLevel::Warning => f.write_str("warning"),
            DiagLevel::Error => f.write_str("error"),
            DiagLevel::Ice => f.write_str("internal compiler error"),
        }
    }
}

/// The closed taxonomy of frontend errors.
#[derive(Clone, Debug, MietteDiagnostic, Error, Eq, PartialEq)]
pub enum ErrorKind {
    #[error("syntax error: {0}")]
    #[diagnostic(code(oqasm::syntax))]
    SyntaxError(String),

    #[error("`{0}` was not declared in this scope")]
    #[diagnostic(code(oqasm::unknown_identifier))]
    UnknownIdentifier(String),

    #[error("`{0}` is not visible from this scope")]
    #[diagnostic(code(oqasm::out_of_scope))]
    OutOfScope(String),

    #[error("duplicate definition of `{0}`")]
    #[diagnostic(code(oqasm::duplicate_definition))]
    DuplicateDefinition(String),

    #[error("redeclaration of `{0}`")]
    #[diagnostic(code(oqasm::redeclaration))]
    Redeclaration(String),

    #[error("declaration of `{0}` shadows a global definition")]
    #[diagnostic(code(oqasm::shadows_global))]
    ShadowsGlobal(String),

    #[error("cannot assign to the reserved constant `{0}`")]
    #[diagnostic(code(oqasm::assignment_to_reserved))]
    AssignmentToReserved(String),

    #[error("type mismatch: `{op}` cannot be applied to {left} and {right}")]
    #[diagnostic(code(oqasm::type_mismatch))]
    TypeMismatch {
        op: String,
        left: String,
        right: String,
    },

    #[error("illegal cast from {from} to {to}")]
    #[diagnostic(code(oqasm::bad_cast))]
    BadCast { from: String, to: String },

    #[error("no implicit conversion from {from} to {to}")]
    #[diagnostic(code(oqasm::bad_implicit_conversion))]
    BadImplicitConversion { from: String, to: String },

    #[error("`{0}` is not an lvalue")]
    #[diagnostic(code(oqasm::not_an_lvalue))]
    NotAnLvalue(String),

    #[error("index {index} is out of bounds for `{name}` of size {size}")]
    #[diagnostic(code(oqasm::out_of_bounds_index))]
    OutOfBoundsIndex {
        name: String,
        index: usize,
        size: usize,
    },

    #[error("symbol `{0}` has no symbol-table entry")]
    #[diagnostic(code(oqasm::missing_symbol_table_entry))]
    MissingSymbolTableEntry(String),

    #[error("invalid gate modifier target: {0}")]
    #[diagnostic(code(oqasm::invalid_modifier_target))]
    InvalidModifierTarget(String),

    #[error("declaration context stack underflow")]
    #[diagnostic(code(oqasm::context_underflow))]
    ContextUnderflow,

    #[error("cannot clone non-interned identifier `{0}`")]
    #[diagnostic(code(oqasm::illegal_clone))]
    IllegalClone(String),

    #[error("internal compiler error: {0}")]
    #[diagnostic(code(oqasm::ice))]
    Ice(String),
}

impl ErrorKind {
    /// The severity this kind reports at.
    #[must_use]
    pub fn level(&self) -> DiagLevel {
        match self {
            ErrorKind::Ice(_) | ErrorKind::ContextUnderflow => DiagLevel::Ice,
            _ => DiagLevel::Error,
        }
    }
}

/// A reported diagnostic.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    pub location: Location,
    pub message: String,
    pub level: DiagLevel,
    pub kind: Option<ErrorKind>,
}

impl Diagnostic {
    /// A diagnostic for an [`ErrorKind`] at its default severity.
    #[must_use]
    pub fn new(location: Location, kind: ErrorKind) -> Self {
        Self {
            location,
            message: kind.to_string(),
            level: kind.level(),
            kind: Some(kind),
        }
    }

    /// A free-form diagnostic, the shape the narrow `emit` interface takes.
    #[must_use]
    pub fn message(location: Location, message: &str, level: DiagLevel) -> Self {
        Self {
            location,
            message: message.to_string(),
            level,
            kind: None,
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: {}: {}", self.location, self.level, self.message)
    }
}

/// The narrow interface the frontend reports through.
pub trait DiagnosticEmitter {
    /// Reports a structured diagnostic.
    fn report(&mut self, diagnostic: Diagnostic);

    /// Reports a free-form message, the interface external collaborators use.
    fn emit(&mut self, location: Location, message: &str, level: DiagLevel) {
        self.report(Diagnostic::message(location, message, level));
    }
}

/// The default emitter: collects diagnostics for inspection after the parse.
#[derive(Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
    fatal: bool,
}

impl DiagnosticBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All diagnostics in report order.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// True if any error or ICE was reported.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.level >= DiagLevel::Error)
    }

    /// The number of error-or-worse diagnostics.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.level >= DiagLevel::Error)
            .count()
    }

    /// True if an ICE was reported; the session must stop.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    /// Drains the collected diagnostics.
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

impl DiagnosticEmitter for DiagnosticBag {
    fn report(&mut self, diagnostic: Diagnostic) {
        if diagnostic.level == DiagLevel::Ice {
            self.fatal = true;
        }
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::{DiagLevel, Diagnostic, DiagnosticBag, DiagnosticEmitter, ErrorKind};
    use oqasm_data_structures::location::Location;

    #[test]
    fn kinds_render_their_subjects() {
        let kind = ErrorKind::ShadowsGlobal("foo".to_string());
        assert_eq!(
            kind.to_string(),
            "declaration of `foo` shadows a global definition"
        );
    }

    #[test]
    fn bag_counts_errors_not_warnings() {
        let mut bag = DiagnosticBag::new();
        bag.emit(Location::new(1, 1), "suspicious", DiagLevel::Warning);
        assert!(!bag.has_errors());
        bag.report(Diagnostic::new(
            Location::new(2, 1),
            ErrorKind::UnknownIdentifier("x".to_string()),
        ));
        assert!(bag.has_errors());
        assert_eq!(bag.error_count(), 1);
        assert!(!bag.is_fatal());
    }

    #[test]
    fn ice_is_fatal() {
        let mut bag = DiagnosticBag::new();
        bag.report(Diagnostic::new(
            Location::default(),
            ErrorKind::Ice("invariant violated".to_string()),
        ));
        assert!(bag.is_fatal());
        assert!(bag.has_errors());
    }

    #[test]
    fn display_includes_location_and_level() {
        let diagnostic = Diagnostic::new(
            Location::new(3, 14),
            ErrorKind::NotAnLvalue("pi".to_string()),
        );
        assert_eq!(diagnostic.to_string(), "3:14: error: `pi` is not an lvalue");
    }
}

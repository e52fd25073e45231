// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Deterministic name mangling for the OpenQASM 3 frontend, and the inverse
//! demangler. A mangled name embeds type, width, operators, the gate
//! modifier chain, calibration context, and literal values, so overloads are
//! distinguishable by symbol alone.

pub mod demangle;
pub mod mangler;

pub use demangle::{DemangleError, Demangled, DemangledDefcal, DemangledGate, Demangler};
pub use mangler::Mangler;

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The cast and implicit-conversion machinery. The legal-conversion matrix
//! is a constant function of the `(from, to)` pair; the converting value
//! never participates. Illegal combinations become `BadCast` or
//! `BadImplicitConversion` nodes at the builder so the tree stays linked.

use oqasm_ast::ast_type::AstType;

/// True if a value of type `from` may be converted, explicitly or
/// implicitly, to type `to`.
#[must_use]
pub fn is_legal_conversion(from: AstType, to: AstType) -> bool {
    if from == AstType::Undefined || to == AstType::Undefined {
        return false;
    }

    match to {
        AstType::Bool
        | AstType::Int
        | AstType::UInt
        | AstType::MpInteger
        | AstType::MpUinteger => matches!(
            from,
            AstType::Bool
                | AstType::Int
                | AstType::UInt
                | AstType::MpInteger
                | AstType::MpUinteger
                | AstType::Float
                | AstType::Double
                | AstType::LongDouble
                | AstType::MpDecimal
                | AstType::Bitset
        ) || (from.is_angle_type() && matches!(to, AstType::Int | AstType::UInt)),
        AstType::Float | AstType::Double | AstType::LongDouble => matches!(
            from,
            AstType::Bool
                | AstType::Int
                | AstType::UInt
                | AstType::MpInteger
                | AstType::MpUinteger
                | AstType::Float
                | AstType::Double
                | AstType::LongDouble
                | AstType::MpDecimal
                | AstType::Bitset
                | AstType::Angle
        ),
        AstType::MpDecimal => matches!(
            from,
            AstType::Bool
                | AstType::Int
                | AstType::UInt
                | AstType::MpInteger
                | AstType::MpUinteger
                | AstType::Float
                | AstType::Double
                | AstType::LongDouble
                | AstType::MpDecimal
                | AstType::Bitset
        ),
        AstType::MpComplex => matches!(
            from,
            AstType::Float
                | AstType::Double
                | AstType::LongDouble
                | AstType::MpDecimal
                | AstType::MpComplex
        ),
        AstType::Bitset => matches!(
            from,
            AstType::Bool
                | AstType::Int
                | AstType::UInt
                | AstType::MpInteger
                | AstType::MpUinteger
                | AstType::Float
                | AstType::Double
                | AstType::LongDouble
                | AstType::MpDecimal
                | AstType::Bitset
                | AstType::Angle
        ),
        AstType::Angle => matches!(
            from,
            AstType::Bool
                | AstType::Int
                | AstType::UInt
                | AstType::MpInteger
                | AstType::MpUinteger
                | AstType::Float
                | AstType::Double
                | AstType::LongDouble
                | AstType::MpDecimal
                | AstType::Bitset
                | AstType::Angle
        ),
        _ => false,
    }
}

/// The type a frame member reads as: `frame.phase` is an angle,
/// `frame.freq` and `frame.time` are mp-decimal.
#[must_use]
pub fn frame_member_type(member: &str) -> AstType {
    match member {
        "phase" => AstType::Angle,
        "freq" | "frequency" | "time" => AstType::MpDecimal,
        _ => AstType::Undefined,
    }
}

#[cfg(test)]
mod tests {
    use super::{frame_member_type, is_legal_conversion};
    use enum_iterator::all;
    use oqasm_ast::ast_type::AstType;

    const SCALARS: [AstType; 10] = [
        AstType::Bool,
        AstType::Int,
        AstType::UInt,
        AstType::MpInteger,
        AstType::MpUinteger,
        AstType::Float,
        AstType::Double,
        AstType::LongDouble,
        AstType::MpDecimal,
        AstType::Bitset,
    ];

    #[test]
    fn scalars_convert_among_themselves() {
        for from in SCALARS {
            for to in SCALARS {
                assert!(is_legal_conversion(from, to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn complex_only_converts_to_complex() {
        for to in all::<AstType>() {
            let legal = is_legal_conversion(AstType::MpComplex, to);
            assert_eq!(legal, to == AstType::MpComplex, "mp-complex -> {to}");
        }
    }

    #[test]
    fn only_floating_sources_reach_complex() {
        assert!(is_legal_conversion(AstType::Float, AstType::MpComplex));
        assert!(is_legal_conversion(AstType::Double, AstType::MpComplex));
        assert!(is_legal_conversion(AstType::MpDecimal, AstType::MpComplex));
        assert!(!is_legal_conversion(AstType::Int, AstType::MpComplex));
        assert!(!is_legal_conversion(AstType::Bool, AstType::MpComplex));
        assert!(!is_legal_conversion(AstType::Bitset, AstType::MpComplex));
    }

    #[test]
    fn angle_narrows_to_numeric_only() {
        assert!(is_legal_conversion(AstType::Angle, AstType::Int));
        assert!(is_legal_conversion(AstType::Angle, AstType::UInt));
        assert!(is_legal_conversion(AstType::Angle, AstType::Double));
        assert!(is_legal_conversion(AstType::Angle, AstType::Bitset));
        assert!(is_legal_conversion(AstType::Angle, AstType::Angle));
        assert!(!is_legal_conversion(AstType::Angle, AstType::Bool));
        assert!(!is_legal_conversion(AstType::Angle, AstType::MpInteger));
        assert!(!is_legal_conversion(AstType::Angle, AstType::MpDecimal));
        assert!(!is_legal_conversion(AstType::Angle, AstType::MpComplex));
    }

    #[test]
    fn everything_widens_to_angle_except_complex() {
        for from in SCALARS {
            assert!(is_legal_conversion(from, AstType::Angle), "{from} -> angle");
        }
        assert!(!is_legal_conversion(AstType::MpComplex, AstType::Angle));
    }

    #[test]
    fn undefined_never_converts() {
        for ty in all::<AstType>() {
            assert!(!is_legal_conversion(AstType::Undefined, ty));
            assert!(!is_legal_conversion(ty, AstType::Undefined));
        }
    }

    #[test]
    fn qubits_never_convert() {
        for ty in all::<AstType>() {
            assert!(!is_legal_conversion(AstType::Qubit, ty), "qubit -> {ty}");
            assert!(
                !is_legal_conversion(ty, AstType::Qubit),
                "{ty} -> qubit"
            );
        }
    }

    #[test]
    fn matrix_is_a_constant_function_of_the_pair() {
        // Calling twice with the same pair always agrees; the matrix takes
        // no other inputs by construction, so spot-check stability.
        for from in all::<AstType>() {
            for to in all::<AstType>() {
                assert_eq!(
                    is_legal_conversion(from, to),
                    is_legal_conversion(from, to)
                );
            }
        }
    }

    #[test]
    fn frame_members_read_as_their_component_types() {
        assert_eq!(frame_member_type("phase"), AstType::Angle);
        assert_eq!(frame_member_type("freq"), AstType::MpDecimal);
        assert_eq!(frame_member_type("time"), AstType::MpDecimal);
        assert_eq!(frame_member_type("amplitude"), AstType::Undefined);
    }
}

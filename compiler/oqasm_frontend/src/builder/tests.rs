// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::context::ContextKind;
use crate::diagnostic::{DiagLevel, ErrorKind};
use crate::session::FrontendSession;
use expect_test::expect;
use oqasm_ast::ast::{NodeKind, ANGLE_BITS, MP_DEFAULT_BITS};
use oqasm_ast::ast_type::AstType;
use oqasm_ast::op::OpType;
use oqasm_data_structures::location::Location;

fn session() -> FrontendSession {
    FrontendSession::new()
}

fn error_kinds(session: &FrontendSession) -> Vec<ErrorKind> {
    session
        .diagnostics
        .diagnostics()
        .iter()
        .filter_map(|d| d.kind.clone())
        .collect()
}

#[test]
fn reserved_pi_is_seeded_with_its_value() {
    let s = session();
    let entry = s
        .symbols
        .find_angle("pi", ANGLE_BITS)
        .expect("pi is registered at init");
    assert_eq!(entry.value_type, AstType::Angle);
    assert!(entry.do_not_delete);

    let value = entry.value.expect("pi has a value");
    match &s.arena.get(value).kind {
        NodeKind::MpDecimalLiteral { value, .. } => {
            assert!((value - std::f64::consts::PI).abs() < f64::EPSILON);
        }
        other => panic!("expected an mp-decimal value, got {other:?}"),
    }

    let ident = s.idents.get(entry.ident);
    assert_eq!(ident.bits, ANGLE_BITS);
}

#[test]
fn gate_redeclaration_is_rejected_with_shadows_global() {
    let mut s = session();

    let theta = s.create_identifier("theta", ANGLE_BITS, AstType::Angle);
    let q = s.idents.create("q", 1, AstType::GateQubitParam, s.contexts.current());

    let body_context = s.push_context(ContextKind::Gate);
    let theta_expr = s.create_ident_expr(theta);
    let call = s.create_gate_call("U", vec![theta_expr], vec![q]);
    s.pop_context();
    let first = s.create_gate_declaration("foo", vec![theta], vec![q], vec![call], body_context);
    assert!(!s.arena.get(first).is_error());
    assert!(s.symbols.find_gate("foo").is_some());

    let body_context = s.push_context(ContextKind::Gate);
    s.pop_context();
    let second =
        s.create_gate_declaration("foo", vec![theta], vec![q], Vec::new(), body_context);
    assert!(s.arena.get(second).is_error());
    assert_eq!(
        error_kinds(&s),
        vec![ErrorKind::ShadowsGlobal("foo".to_string())]
    );
}

#[test]
fn float_initializer_converts_implicitly_to_angle() {
    let mut s = session();
    let half = s.create_float_literal(0.5);
    let decl = s.create_declaration("a", AstType::Angle, 32, Some(half), false);

    let initializer = match &s.arena.get(decl).kind {
        NodeKind::Declaration { initializer, .. } => initializer.expect("has initializer"),
        other => panic!("expected a declaration, got {other:?}"),
    };
    match &s.arena.get(initializer).kind {
        NodeKind::ImplicitConversion { from, to, bits, .. } => {
            assert_eq!(*from, AstType::Float);
            assert_eq!(*to, AstType::Angle);
            assert_eq!(*bits, 32);
        }
        other => panic!("expected an implicit conversion, got {other:?}"),
    }
    assert!(!s.diagnostics.has_errors());

    let mangled = s
        .mangle_conversion(initializer)
        .expect("conversions mangle");
    assert!(
        mangled.starts_with("_QimplconvAn32_F32_"),
        "unexpected mangling: {mangled}"
    );
}

#[test]
fn casting_complex_to_int_is_a_bad_cast() {
    let mut s = session();
    s.create_declaration("z", AstType::MpComplex, MP_DEFAULT_BITS, None, false);
    let z = s.create_identifier("z", MP_DEFAULT_BITS, AstType::MpComplex);
    let z_expr = s.create_ident_expr(z);

    let cast = s.create_cast(z_expr, AstType::Int, 32);
    match &s.arena.get(cast).kind {
        NodeKind::BadCast { from, to, .. } => {
            assert_eq!(*from, AstType::MpComplex);
            assert_eq!(*to, AstType::Int);
        }
        other => panic!("expected a bad cast, got {other:?}"),
    }
    assert_eq!(s.diagnostics.error_count(), 1);

    // The declaration still links the error node as its initializer.
    let decl = s.create_declaration("x", AstType::Int, 32, Some(cast), false);
    match &s.arena.get(decl).kind {
        NodeKind::Declaration { initializer, .. } => {
            assert_eq!(*initializer, Some(cast));
        }
        other => panic!("expected a declaration, got {other:?}"),
    }
    assert_eq!(s.diagnostics.error_count(), 1, "no second diagnostic");
}

#[test]
fn bitset_element_assignment_validates_in_bounds() {
    let mut s = session();
    s.create_declaration("b", AstType::Bitset, 8, None, false);

    let reference = s
        .find_or_create_indexed_identifier("b[3]")
        .expect("b is declared");
    let lhs = s.create_ident_ref_expr(reference);
    let rhs = s.create_int_literal(1);
    let assign = s.create_binary_op(lhs, OpType::Assign, rhs, false);
    assert!(!s.arena.get(assign).is_error());
    assert!(!s.diagnostics.has_errors());
}

#[test]
fn bitset_element_assignment_out_of_bounds_is_rejected() {
    let mut s = session();
    s.create_declaration("b", AstType::Bitset, 8, None, false);

    let reference = s
        .find_or_create_indexed_identifier("b[9]")
        .expect("b is declared");
    let lhs = s.create_ident_ref_expr(reference);
    let rhs = s.create_int_literal(1);
    let assign = s.create_binary_op(lhs, OpType::Assign, rhs, false);
    assert!(s.arena.get(assign).is_error());
    assert!(matches!(
        error_kinds(&s).as_slice(),
        [ErrorKind::OutOfBoundsIndex { index: 9, size: 8, .. }]
    ));
}

#[test]
fn inner_scope_declaration_shadows_the_outer() {
    let mut s = session();
    let one = s.create_int_literal(1);
    s.create_declaration("x", AstType::Int, 32, Some(one), false);
    let outer_entry = s
        .symbols
        .lookup_name(&s.contexts, "x")
        .expect("outer x is visible");
    let outer = outer_entry.ident;

    s.push_context(ContextKind::For);
    let two = s.create_int_literal(2);
    s.create_declaration("x", AstType::Int, 32, Some(two), false);

    let inner_entry = s
        .symbols
        .lookup_name(&s.contexts, "x")
        .expect("inner x is visible");
    let inner = inner_entry.ident;
    assert_ne!(inner, outer);

    let identifier = s.idents.get(inner);
    assert!(identifier.is_redeclaration());
    assert_eq!(identifier.predecessor, Some(outer));
    assert!(!s.diagnostics.has_errors(), "shadowing is silent");

    s.pop_context();
    let visible = s
        .symbols
        .lookup_name(&s.contexts, "x")
        .expect("outer x is visible again");
    assert_eq!(visible.ident, outer);
}

#[test]
fn assignment_to_pi_is_rejected() {
    let mut s = session();
    let pi = s.create_identifier("pi", ANGLE_BITS, AstType::Angle);
    let lhs = s.create_ident_expr(pi);
    let rhs = s.create_double_literal(3.0);
    let assign = s.create_binary_op(lhs, OpType::Assign, rhs, false);
    assert!(s.arena.get(assign).is_error());
    assert_eq!(
        error_kinds(&s),
        vec![ErrorKind::AssignmentToReserved("pi".to_string())]
    );
}

#[test]
fn modifier_chain_preserves_application_order() {
    let mut s = session();
    let u_entry = s.symbols.find_gate("U").expect("U is seeded");
    let u_node = u_entry.value.expect("U has a node");

    let inv = s.create_gate_modifier(AstType::GateInverse, None, u_node);
    let ctrl = s.create_gate_modifier(AstType::GateControl, None, inv);

    match &s.arena.get(ctrl).kind {
        NodeKind::GateModifier { kind, target, .. } => {
            assert_eq!(*kind, AstType::GateControl);
            assert_eq!(target.target_type(), AstType::GateInverse);
            match &s.arena.get(target.node()).kind {
                NodeKind::GateModifier { kind, target, .. } => {
                    assert_eq!(*kind, AstType::GateInverse);
                    assert_eq!(target.target_type(), AstType::Gate);
                }
                other => panic!("expected the inverse link, got {other:?}"),
            }
        }
        other => panic!("expected a modifier, got {other:?}"),
    }
}

#[test]
fn modifiers_reject_non_gate_targets() {
    let mut s = session();
    let one = s.create_int_literal(1);
    let modifier = s.create_gate_modifier(AstType::GateControl, None, one);
    assert!(s.arena.get(modifier).is_error());
    assert!(matches!(
        error_kinds(&s).as_slice(),
        [ErrorKind::InvalidModifierTarget(_)]
    ));
}

#[test]
fn applying_a_modifier_updates_the_gate_call() {
    let mut s = session();
    let q = s
        .idents
        .create("q", 1, AstType::GateQubitParam, s.contexts.current());
    let call = s.create_gate_call("CX", Vec::new(), vec![q]);
    let u_entry = s.symbols.find_gate("U").expect("U is seeded");
    let u_node = u_entry.value.expect("U has a node");
    let inv = s.create_gate_modifier(AstType::GateInverse, None, u_node);

    s.apply_modifier(call, inv);
    match &s.arena.get(call).kind {
        NodeKind::Call(expr) => {
            assert_eq!(expr.modifier, Some(inv));
            assert_eq!(expr.modifier_type, AstType::GateInverse);
        }
        other => panic!("expected a call, got {other:?}"),
    }
}

#[test]
fn unknown_gate_calls_are_expression_errors() {
    let mut s = session();
    let call = s.create_gate_call("nope", Vec::new(), Vec::new());
    assert!(s.arena.get(call).is_error());
    assert_eq!(
        error_kinds(&s),
        vec![ErrorKind::UnknownIdentifier("nope".to_string())]
    );
}

#[test]
fn mangling_is_idempotent_unless_forced() {
    let mut s = session();
    s.create_declaration("x", AstType::Int, 32, None, false);
    let x = s.create_identifier("x", 32, AstType::Int);

    let first = s.idents.get(x).mangled_name.clone().expect("mangled");
    s.mangle_identifier(x, false);
    assert_eq!(s.idents.get(x).mangled_name.as_deref(), Some(first.as_str()));

    // Force rebuilds; the content is identical for an unchanged symbol.
    s.mangle_identifier(x, true);
    assert_eq!(s.idents.get(x).mangled_name.as_deref(), Some(first.as_str()));
}

#[test]
fn cloning_a_heap_identifier_is_illegal() {
    let mut s = session();
    s.create_declaration("x", AstType::Int, 32, None, false);
    let x = s.create_identifier("x", 32, AstType::Int);
    assert!(s.clone_identifier(x).is_none());
    assert!(matches!(
        error_kinds(&s).as_slice(),
        [ErrorKind::IllegalClone(_)]
    ));

    let pi = s.create_identifier("pi", ANGLE_BITS, AstType::Angle);
    assert_eq!(s.clone_identifier(pi), Some(pi));
}

#[test]
fn switch_rejects_duplicate_case_labels() {
    let mut s = session();
    let quantity = s.create_int_literal(1);
    let block_a = s.create_block(Vec::new());
    let block_b = s.create_block(Vec::new());
    let case_a = s.create_case(2, block_a);
    let case_b = s.create_case(2, block_b);
    let switch = s.create_switch(quantity, vec![case_a, case_b], None);
    assert!(s.arena.get(switch).is_error());
    assert!(matches!(
        error_kinds(&s).as_slice(),
        [ErrorKind::DuplicateDefinition(_)]
    ));
}

#[test]
fn switch_quantity_must_be_an_integer() {
    let mut s = session();
    let quantity = s.create_double_literal(1.5);
    let switch = s.create_switch(quantity, Vec::new(), None);
    assert!(s.arena.get(switch).is_error());
}

#[test]
fn induction_variable_shadowing_warns() {
    let mut s = session();
    let body_context = s.push_context(ContextKind::For);
    let zero = s.create_int_literal(0);
    let four = s.create_int_literal(4);
    let decl = s.create_declaration("i", AstType::Int, 32, Some(zero), false);
    let induction = match &s.arena.get(decl).kind {
        NodeKind::Declaration { ident, .. } => *ident,
        other => panic!("expected a declaration, got {other:?}"),
    };
    // A second `i` declared in the body shadows the induction variable.
    let body_decl = s.idents.create("i", 32, AstType::Int, body_context);
    s.contexts.register(body_context, body_decl);
    let block = s.create_block(Vec::new());
    s.pop_context();
    s.create_for(induction, zero, four, None, block, body_context);

    let warnings: Vec<_> = s
        .diagnostics
        .diagnostics()
        .iter()
        .filter(|d| d.level == DiagLevel::Warning)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("induction"));
}

#[test]
fn qubit_container_declares_and_transfers_via_gate() {
    let mut s = session();
    let body_context = s.push_context(ContextKind::Gate);
    let container = s.create_qubit_container("qs", 2);
    assert!(!s.arena.get(container).is_error());
    s.pop_context();

    s.create_gate_declaration("g", Vec::new(), Vec::new(), Vec::new(), body_context);

    let map = s
        .symbols
        .private_symbols("g")
        .expect("gate has a private map");
    for name in ["qs", "qs[0]", "qs[1]", "%qs:0", "%qs:1"] {
        assert!(map.contains_key(name), "{name} missing");
    }
}

#[test]
fn statements_are_appended_in_source_order() {
    let mut s = session();
    s.set_location(Location::new(1, 1));
    let a = s.create_qubit("q0");
    s.set_location(Location::new(2, 1));
    let b = s.create_qubit("q1");
    s.add_statement(a);
    s.add_statement(b);
    assert_eq!(s.translation_unit(), &[a, b]);
    assert_eq!(s.arena.get(b).location, Location::new(2, 1));
}

#[test]
fn hardware_qubits_are_recognized() {
    let mut s = session();
    let node = s.create_qubit("$2");
    match &s.arena.get(node).kind {
        NodeKind::Qubit { hardware, .. } => assert!(*hardware),
        other => panic!("expected a qubit, got {other:?}"),
    }
    assert!(s.symbols.find_qubit("$2").is_some());
}

#[test]
fn alias_ranges_narrow_the_width() {
    let mut s = session();
    s.create_qubit_container("qs", 4);
    let alias = s.create_qubit_container_alias(
        "%front",
        "qs",
        oqasm_ast::ast::AliasKind::Range { start: 0, end: 2 },
    );
    assert!(!s.arena.get(alias).is_error());
    let entry = s.symbols.find_qubit("%front").expect("alias is registered");
    assert_eq!(s.idents.get(entry.ident).bits, 2);
}

#[test]
fn declarations_render_with_their_conversions() {
    let mut s = session();
    s.set_location(Location::new(4, 1));
    let half = s.create_float_literal(0.5);
    let decl = s.create_declaration("a", AstType::Angle, 32, Some(half), false);
    expect![[r#"
        declaration 17 (4:1)
            implicit conversion 16 (4:1)
                float 15 (4:1)"#]]
    .assert_eq(&s.arena.display(decl).to_string());
}

#[test]
fn computed_identifiers_remember_their_evaluation() {
    let mut s = session();
    s.create_declaration("acc", AstType::Int, 32, None, false);
    let acc = s.create_identifier("acc", 32, AstType::Int);
    let one = s.create_int_literal(1);
    let two = s.create_int_literal(2);
    let sum = s.create_binary_op(one, OpType::Add, two, false);

    s.record_evaluation(acc, sum);
    let evaluation = s.idents.get(acc).evaluation.expect("recorded");
    assert_eq!(evaluation.kind, AstType::BinaryOp);
    assert_eq!(evaluation.node, sum);
}

#[test]
fn compound_assignment_coerces_like_plain_assignment() {
    let mut s = session();
    s.create_declaration("total", AstType::Int, 32, None, false);
    let total = s.create_identifier("total", 32, AstType::Int);
    let lhs = s.create_ident_expr(total);
    let rhs = s.create_int_literal(3);
    let node = s.create_binary_op(lhs, OpType::AddAssign, rhs, false);
    assert!(!s.arena.get(node).is_error());
    match &s.arena.get(node).kind {
        NodeKind::Binary { result_type, .. } => assert_eq!(*result_type, AstType::Int),
        other => panic!("expected a binary op, got {other:?}"),
    }
}

#[test]
fn if_chains_assemble() {
    let mut s = session();
    let flag = s.create_bool_literal(true);
    let then_block = s.create_block(Vec::new());
    let other = s.create_bool_literal(false);
    let elif_block = s.create_block(Vec::new());
    let elif = s.create_else_if(other, elif_block);
    let else_block_body = s.create_block(Vec::new());
    let else_block = s.create_else(else_block_body);
    let node = s.create_if(flag, then_block, vec![elif], Some(else_block));

    match &s.arena.get(node).kind {
        NodeKind::If {
            else_ifs,
            else_block,
            ..
        } => {
            assert_eq!(else_ifs.len(), 1);
            assert!(else_block.is_some());
        }
        other => panic!("expected an if, got {other:?}"),
    }
    assert!(!s.diagnostics.has_errors());
}

#[test]
fn loops_assemble() {
    let mut s = session();
    let cond = s.create_bool_literal(true);
    let block = s.create_block(Vec::new());
    let while_loop = s.create_while(cond, block);
    assert_eq!(s.arena.get(while_loop).ast_type(), AstType::WhileStatement);

    let block = s.create_block(Vec::new());
    let cond = s.create_bool_literal(false);
    let do_while = s.create_do_while(block, cond);
    assert_eq!(s.arena.get(do_while).ast_type(), AstType::DoWhileStatement);

    let brk = s.create_break();
    let cont = s.create_continue();
    assert_eq!(s.arena.get(brk).ast_type(), AstType::BreakStatement);
    assert_eq!(s.arena.get(cont).ast_type(), AstType::ContinueStatement);
}

#[test]
fn delay_requires_a_time_or_integer_duration() {
    let mut s = session();
    let good = s.create_duration_literal(
        30.0,
        oqasm_ast::ast::LengthUnit::Nanoseconds,
    );
    let delay = s.create_delay(good, Vec::new());
    assert!(!s.arena.get(delay).is_error());

    let bad = s.create_double_literal(1.5);
    let delay = s.create_delay(bad, Vec::new());
    assert!(s.arena.get(delay).is_error());
}

#[test]
fn box_statements_carry_their_variant() {
    let mut s = session();
    let block = s.create_block(Vec::new());
    let duration = s.create_duration_literal(100.0, oqasm_ast::ast::LengthUnit::Dt);
    let boxed = s.create_box(AstType::BoxToStatement, None, Some(duration), block);
    assert_eq!(s.arena.get(boxed).ast_type(), AstType::BoxToStatement);
}

#[test]
fn pragmas_and_annotations_are_uninterpreted() {
    let mut s = session();
    let pragma = s.create_pragma("user settings");
    let annotation = s.create_annotation("reversible", vec!["true".to_string()]);
    assert_eq!(s.arena.get(pragma).ast_type(), AstType::Pragma);
    assert_eq!(s.arena.get(annotation).ast_type(), AstType::Annotation);
    assert!(!s.diagnostics.has_errors());
}

#[test]
fn stretch_and_duration_declarations_register() {
    let mut s = session();
    let stretch = s.create_stretch("s0");
    assert!(!s.arena.get(stretch).is_error());
    let duration =
        s.create_duration("gap", 80.0, oqasm_ast::ast::LengthUnit::Nanoseconds);
    assert!(!s.arena.get(duration).is_error());
    assert!(s.symbols.lookup_name(&s.contexts, "s0").is_some());
    assert!(s.symbols.lookup_name(&s.contexts, "gap").is_some());
}

#[test]
fn frames_ports_and_waveforms_register_in_cal_context() {
    let mut s = session();
    s.push_context(ContextKind::Cal);
    let port = s.create_port("d0", Some(0));
    let port_ident = match &s.arena.get(port).kind {
        NodeKind::Port { ident, .. } => *ident,
        other => panic!("expected a port, got {other:?}"),
    };
    let freq = s.create_mp_decimal_literal(5.1e9, 64);
    let frame = s.create_frame("f0", Some(port_ident), Some(freq), None);
    assert!(!s.arena.get(frame).is_error());

    let sample = s.create_mp_complex_literal(num_complex::Complex64::new(0.1, 0.0), 128);
    let waveform = s.create_waveform("w0", vec![sample]);
    assert!(!s.arena.get(waveform).is_error());

    let f0 = s.symbols.lookup_name(&s.contexts, "f0").expect("registered");
    let mangled = s
        .idents
        .get(f0.ident)
        .mangled_name
        .clone()
        .expect("frames mangle");
    assert!(mangled.starts_with("_Q:C:"), "frames mangle in cal context");
    s.pop_context();
}

#[test]
fn arrays_register_with_their_element_encoding() {
    let mut s = session();
    let array = s.create_array("samples", AstType::MpDecimalArray, 8, 64, Vec::new(), false);
    assert!(!s.arena.get(array).is_error());

    let entry = s
        .symbols
        .lookup_name(&s.contexts, "samples")
        .expect("registered");
    let mangled = s
        .idents
        .get(entry.ident)
        .mangled_name
        .clone()
        .expect("arrays mangle");
    assert_eq!(mangled, "_QA8_Md64_7samplesE_");

    let demangled = s.demangler().demangle(&mangled).expect("demangles");
    assert_eq!(demangled.name, "samples");
    assert_eq!(demangled.ty, AstType::Array);
}

#[test]
fn functions_declare_call_and_return() {
    let mut s = session();
    let a = s.create_identifier("n", 32, AstType::Int);
    let body_context = s.push_context(ContextKind::Function);
    s.pop_context();
    let decl = s.create_function_declaration(
        "parity",
        vec![a],
        AstType::Bool,
        8,
        Vec::new(),
        body_context,
    );
    assert!(!s.arena.get(decl).is_error());

    let arg = s.create_int_literal(5);
    let call = s.create_function_call("parity", vec![arg]);
    assert!(!s.arena.get(call).is_error());

    // The call's value is the declared result.
    s.create_declaration("ok", AstType::Bool, 8, None, false);
    let ok = s.create_identifier("ok", 8, AstType::Bool);
    let lhs = s.create_ident_expr(ok);
    let assign = s.create_binary_op(lhs, OpType::Assign, call, false);
    assert!(!s.arena.get(assign).is_error());
    assert!(!s.diagnostics.has_errors());
}

#[test]
fn unknown_functions_do_not_call() {
    let mut s = session();
    let call = s.create_function_call("missing", Vec::new());
    assert!(s.arena.get(call).is_error());
}

#[test]
fn kernels_declare_with_extern_scope() {
    let mut s = session();
    let p = s.create_identifier("x", 64, AstType::Double);
    let decl = s.create_kernel_declaration("host_rng", vec![p], AstType::Double, 64);
    assert!(!s.arena.get(decl).is_error());

    let entry = s
        .symbols
        .lookup_name(&s.contexts, "host_rng")
        .expect("registered");
    assert_eq!(
        s.idents.get(entry.ident).symbol_scope,
        oqasm_ast::ident::SymbolScope::Extern
    );

    let call = s.create_kernel_call("host_rng", Vec::new());
    assert!(!s.arena.get(call).is_error());
}

#[test]
fn defcals_group_by_name_and_specialize_by_mangling() {
    let mut s = session();
    s.create_qubit("$0");
    s.create_qubit("$1");
    let q0 = s.symbols.find_qubit("$0").expect("registered").ident;
    let q1 = s.symbols.find_qubit("$1").expect("registered").ident;

    let body_context = s.push_context(ContextKind::Defcal);
    s.pop_context();
    let first = s.create_defcal_declaration(
        "rz",
        AstType::Defcal,
        Vec::new(),
        vec![q0],
        Vec::new(),
        body_context,
    );
    assert!(!s.arena.get(first).is_error());

    let body_context = s.push_context(ContextKind::Defcal);
    s.pop_context();
    let second = s.create_defcal_declaration(
        "rz",
        AstType::Defcal,
        Vec::new(),
        vec![q1],
        Vec::new(),
        body_context,
    );
    assert!(
        !s.arena.get(second).is_error(),
        "a different qubit is a distinct specialization"
    );

    let group = s.symbols.defcal_group("rz").expect("group exists");
    assert_eq!(group.len(), 2);

    // Re-specializing the same signature is rejected.
    let body_context = s.push_context(ContextKind::Defcal);
    s.pop_context();
    let duplicate = s.create_defcal_declaration(
        "rz",
        AstType::Defcal,
        Vec::new(),
        vec![q0],
        Vec::new(),
        body_context,
    );
    assert!(s.arena.get(duplicate).is_error());

    let call = s.create_defcal_call("rz", Vec::new(), vec![q0]);
    assert!(!s.arena.get(call).is_error());
}

#[test]
fn operator_and_operand_wrappers_preserve_the_target_type() {
    let mut s = session();
    let x = s.create_int_literal(3);
    let operand = s.create_operand(x);
    let operator = s.create_operator(OpType::Negative, operand);
    assert_eq!(s.arena.get(operand).ast_type(), AstType::Operand);
    assert_eq!(s.arena.get(operator).ast_type(), AstType::Operator);
}

#[test]
fn complex_expressions_and_initializer_lists_assemble() {
    let mut s = session();
    let re = s.create_double_literal(1.0);
    let im = s.create_double_literal(-2.0);
    let z = s.create_complex_expression(re, im, 128);
    assert_eq!(s.arena.get(z).ast_type(), AstType::ComplexExpression);

    let one = s.create_int_literal(1);
    let two = s.create_int_literal(2);
    let list = s.create_initializer_list(vec![one, two]);
    assert_eq!(s.arena.get(list).ast_type(), AstType::InitializerList);
}

#[test]
fn syntax_errors_thread_into_the_tree() {
    let mut s = session();
    let node = s.create_syntax_error("unexpected token `@`");
    assert!(s.arena.get(node).is_error());
    assert_eq!(s.diagnostics.error_count(), 1);
}

#[test]
fn cast_manglings_carry_the_cast_marker() {
    let mut s = session();
    let value = s.create_mp_decimal_literal(2.5, 128);
    let cast = s.create_cast(value, AstType::Int, 32);
    let mangled = s.mangle_conversion(cast).expect("casts mangle");
    assert!(mangled.starts_with("_Qcasti32_Md128_"), "got {mangled}");
}

#[test]
fn gphase_accepts_angles_and_rejects_strings() {
    let mut s = session();
    let theta = s.create_angle_literal(0.25, 64, "theta");
    let ok = s.create_gphase(theta);
    assert!(!s.arena.get(ok).is_error());

    let text = s.create_string_literal("not an angle");
    let bad = s.create_gphase(text);
    assert!(s.arena.get(bad).is_error());
}

#[test]
fn assignments_coerce_through_the_conversion_matrix() {
    let mut s = session();
    s.create_declaration("n", AstType::Int, 32, None, false);
    let n = s.create_identifier("n", 32, AstType::Int);
    let lhs = s.create_ident_expr(n);
    let rhs = s.create_double_literal(2.5);
    let assign = s.create_binary_op(lhs, OpType::Assign, rhs, false);
    assert!(!s.arena.get(assign).is_error());
    assert!(!s.diagnostics.has_errors());

    // The right side is wrapped, not silently reinterpreted.
    match &s.arena.get(assign).kind {
        NodeKind::Binary { right, .. } => match &s.arena.get(*right).kind {
            NodeKind::ImplicitConversion { from, to, .. } => {
                assert_eq!(*from, AstType::Double);
                assert_eq!(*to, AstType::Int);
            }
            other => panic!("expected an implicit conversion, got {other:?}"),
        },
        other => panic!("expected a binary op, got {other:?}"),
    }
}

#[test]
fn assignments_outside_the_conversion_matrix_are_rejected() {
    let mut s = session();

    // complex <- int: only floating sources reach complex.
    s.create_declaration("z", AstType::MpComplex, MP_DEFAULT_BITS, None, false);
    let z = s.create_identifier("z", MP_DEFAULT_BITS, AstType::MpComplex);
    let lhs = s.create_ident_expr(z);
    let rhs = s.create_int_literal(1);
    let assign = s.create_binary_op(lhs, OpType::Assign, rhs, false);
    assert!(s.arena.get(assign).is_error());
    assert!(matches!(
        error_kinds(&s).as_slice(),
        [ErrorKind::TypeMismatch { .. }]
    ));

    // mp-decimal <- angle: angles narrow to machine numerics only.
    let mut s = session();
    s.create_declaration("precise", AstType::MpDecimal, 128, None, false);
    s.create_declaration("turn", AstType::Angle, ANGLE_BITS, None, false);
    let precise = s.create_identifier("precise", 128, AstType::MpDecimal);
    let turn = s.create_identifier("turn", ANGLE_BITS, AstType::Angle);
    let lhs = s.create_ident_expr(precise);
    let rhs = s.create_ident_expr(turn);
    let assign = s.create_binary_op(lhs, OpType::Assign, rhs, false);
    assert!(s.arena.get(assign).is_error());
    assert!(matches!(
        error_kinds(&s).as_slice(),
        [ErrorKind::TypeMismatch { .. }]
    ));
}

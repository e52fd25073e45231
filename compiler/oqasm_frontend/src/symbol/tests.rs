// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{RegisterError, SymbolTable};
use crate::context::{ContextKind, ContextTracker};
use oqasm_ast::ast::{ContextId, ANGLE_BITS, INT_BITS};
use oqasm_ast::ast_type::AstType;
use oqasm_ast::ident::{IdentId, IdentRegistry};

struct Fixture {
    idents: IdentRegistry,
    contexts: ContextTracker,
    symbols: SymbolTable,
}

impl Fixture {
    fn new() -> Self {
        Self {
            idents: IdentRegistry::new(),
            contexts: ContextTracker::new(),
            symbols: SymbolTable::new(),
        }
    }

    fn declare(&mut self, name: &str, bits: u32, ty: AstType) -> Result<IdentId, RegisterError> {
        let ident = self
            .idents
            .create(name, bits, ty, self.contexts.current());
        self.symbols
            .register(&mut self.idents, &mut self.contexts, ident, ty)
            .map(|_| ident)
    }
}

#[test]
fn global_declaration_is_found_by_name() {
    let mut f = Fixture::new();
    f.declare("x", INT_BITS, AstType::Int).expect("registers");
    let entry = f
        .symbols
        .lookup_name(&f.contexts, "x")
        .expect("x is visible");
    assert_eq!(entry.value_type, AstType::Int);
    assert_eq!(entry.context, ContextId::GLOBAL);
}

#[test]
fn entry_back_pointer_round_trips() {
    let mut f = Fixture::new();
    let ident = f.declare("x", INT_BITS, AstType::Int).expect("registers");
    let entry = f.idents.get(ident).symbol_table_entry.expect("is set");
    assert_eq!(f.symbols.get(entry).ident, ident);
}

#[test]
fn same_context_duplicate_is_a_redeclaration() {
    let mut f = Fixture::new();
    f.declare("x", INT_BITS, AstType::Int).expect("registers");
    assert_eq!(
        f.declare("x", INT_BITS, AstType::Int),
        Err(RegisterError::Redeclaration("x".to_string()))
    );
}

#[test]
fn nested_declaration_shadows_with_predecessor() {
    let mut f = Fixture::new();
    let outer = f.declare("x", INT_BITS, AstType::Int).expect("registers");
    f.contexts.push(ContextKind::For);
    let inner = f.declare("x", INT_BITS, AstType::Int).expect("shadows");

    let identifier = f.idents.get(inner);
    assert!(identifier.is_redeclaration());
    assert_eq!(identifier.predecessor, Some(outer));

    // Inside the loop the inner declaration wins.
    let seen = f.symbols.lookup_name(&f.contexts, "x").expect("visible");
    assert_eq!(seen.ident, inner);

    // Outside, the outer one is back.
    f.contexts.pop().expect("stack is not empty");
    let seen = f.symbols.lookup_name(&f.contexts, "x").expect("visible");
    assert_eq!(seen.ident, outer);
}

#[test]
fn gates_admit_a_single_definition() {
    let mut f = Fixture::new();
    f.declare("foo", 64, AstType::Gate).expect("registers");
    assert_eq!(
        f.declare("foo", 64, AstType::Gate),
        Err(RegisterError::ShadowsGlobal("foo".to_string()))
    );
}

#[test]
fn functions_admit_a_single_definition() {
    let mut f = Fixture::new();
    f.declare("work", 64, AstType::Function).expect("registers");
    assert_eq!(
        f.declare("work", 64, AstType::Function),
        Err(RegisterError::ShadowsGlobal("work".to_string()))
    );
}

#[test]
fn qubits_admit_a_single_definition() {
    let mut f = Fixture::new();
    f.declare("q", 2, AstType::QubitContainer).expect("registers");
    assert_eq!(
        f.declare("q", 2, AstType::QubitContainer),
        Err(RegisterError::ShadowsGlobal("q".to_string()))
    );
    assert!(f.symbols.find_qubit("q").is_some());
}

#[test]
fn angles_with_different_widths_coexist() {
    let mut f = Fixture::new();
    f.declare("alpha", 32, AstType::Angle).expect("registers");
    f.declare("alpha", ANGLE_BITS, AstType::Angle)
        .expect("a different width is a distinct symbol");
    assert_eq!(
        f.declare("alpha", 32, AstType::Angle),
        Err(RegisterError::Duplicate("alpha".to_string()))
    );
    assert!(f.symbols.find_angle("alpha", 32).is_some());
    assert!(f.symbols.find_angle("alpha", ANGLE_BITS).is_some());
    assert!(f.symbols.find_angle("alpha", 16).is_none());
}

#[test]
fn erase_local_removes_only_the_local_entry() {
    let mut f = Fixture::new();
    let block = f.contexts.push(ContextKind::Block);
    f.declare("tmp", INT_BITS, AstType::Int).expect("registers");
    assert!(f.symbols.lookup_local(block, "tmp").is_some());
    f.symbols.erase_local(block, "tmp");
    assert!(f.symbols.lookup_local(block, "tmp").is_none());
}

#[test]
fn qubit_container_transfer_expands_to_2n_plus_1_symbols() {
    let mut f = Fixture::new();
    f.contexts.push(ContextKind::Defcal);
    let n = 3;
    let q = f.declare("q", n, AstType::QubitContainer).expect("registers");

    let count = f
        .symbols
        .transfer_parameters(&mut f.idents, "play_defcal", &[q]);
    assert_eq!(count, 2 * n as usize + 1);

    let map = f
        .symbols
        .private_symbols("play_defcal")
        .expect("owner has a map");
    assert!(map.contains_key("q"));
    for i in 0..n as usize {
        assert!(map.contains_key(&format!("q[{i}]")), "q[{i}]");
        assert!(map.contains_key(&format!("%q:{i}")), "%q:{i}");
    }
}

#[test]
fn angle_transfer_adds_three_components() {
    let mut f = Fixture::new();
    f.contexts.push(ContextKind::Gate);
    let a = f.declare("theta", ANGLE_BITS, AstType::Angle).expect("registers");

    let count = f.symbols.transfer_parameters(&mut f.idents, "rz", &[a]);
    assert_eq!(count, 4);

    let map = f.symbols.private_symbols("rz").expect("owner has a map");
    for name in ["theta", "theta[0]", "theta[1]", "theta[2]"] {
        assert!(map.contains_key(name), "{name}");
    }
}

#[test]
fn bitset_transfer_adds_one_symbol_per_bit() {
    let mut f = Fixture::new();
    f.contexts.push(ContextKind::Function);
    let b = f.declare("flags", 4, AstType::Bitset).expect("registers");

    let count = f.symbols.transfer_parameters(&mut f.idents, "check", &[b]);
    assert_eq!(count, 5);
}

#[test]
fn transfer_is_idempotent() {
    let mut f = Fixture::new();
    f.contexts.push(ContextKind::Gate);
    let q = f.declare("q", 2, AstType::QubitContainer).expect("registers");
    let a = f.declare("phi", ANGLE_BITS, AstType::Angle).expect("registers");

    let first = f
        .symbols
        .transfer_parameters(&mut f.idents, "g", &[q, a]);
    let again = f
        .symbols
        .transfer_parameters(&mut f.idents, "g", &[q, a]);
    assert_eq!(first, again);

    let map = f.symbols.private_symbols("g").expect("owner has a map");
    assert_eq!(map.len(), first);
}

#[test]
fn gates_do_not_transfer() {
    let mut f = Fixture::new();
    let g = f.declare("foo", 64, AstType::Gate).expect("registers");
    let count = f.symbols.transfer_parameters(&mut f.idents, "outer", &[g]);
    assert_eq!(count, 0);
    assert!(f.symbols.find_gate("foo").is_some(), "gate entry survives");
}

#[test]
fn value_can_be_reset_for_forward_declarations() {
    let mut f = Fixture::new();
    let g = f.declare("foo", 64, AstType::Gate).expect("registers");
    let entry = f.idents.get(g).symbol_table_entry.expect("is set");
    assert!(f.symbols.get(entry).value.is_none());

    let node = oqasm_ast::ast::NodeId::from(7usize);
    f.symbols.set_value(entry, node, AstType::Gate);
    assert_eq!(f.symbols.get(entry).value, Some(node));
}

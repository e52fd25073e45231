// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The symbol table: one global map, one local map per declaration context,
//! and dedicated sub-tables for gates, defcals, qubits, and angles. The
//! redeclaration rules live in [`SymbolTable::register`]; the
//! parameter-transfer machinery that finalizes function/gate/defcal
//! definitions lives in [`SymbolTable::transfer_parameters`].

use crate::context::ContextTracker;
use oqasm_ast::ast::{ContextId, NodeId, SymbolId, INT_BITS};
use oqasm_ast::ast_type::AstType;
use oqasm_ast::ident::{IdentFlags, IdentId, IdentRegistry, SymbolScope};
use oqasm_ast::string_utils;
use oqasm_data_structures::index_map::IndexMap;
use rustc_hash::FxHashMap;

/// A symbol-table entry. The wrapped value node may be reset and replaced,
/// e.g. when a forward-declared gate is later defined.
#[derive(Clone, Debug)]
pub struct SymbolTableEntry {
    pub id: SymbolId,
    pub ident: IdentId,
    pub value_type: AstType,
    pub value: Option<NodeId>,
    pub scope: SymbolScope,
    pub context: ContextId,
    /// Reserved entries (π, τ, euler, the built-in gates) are never removed.
    pub do_not_delete: bool,
}

/// Why a registration was rejected.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RegisterError {
    /// An identical entry already exists at this context.
    Duplicate(String),
    /// A prior entry with this name exists in the same context.
    Redeclaration(String),
    /// Gates, functions, defcals, and qubits admit a single definition.
    ShadowsGlobal(String),
}

impl RegisterError {
    /// The rejected name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            RegisterError::Duplicate(name)
            | RegisterError::Redeclaration(name)
            | RegisterError::ShadowsGlobal(name) => name,
        }
    }
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: Vec<SymbolTableEntry>,
    globals: FxHashMap<String, SymbolId>,
    locals: IndexMap<ContextId, FxHashMap<String, SymbolId>>,
    gates: FxHashMap<String, SymbolId>,
    defcals: FxHashMap<String, FxHashMap<String, SymbolId>>,
    qubits: FxHashMap<String, SymbolId>,
    angles: FxHashMap<(String, u32), SymbolId>,
    private: FxHashMap<String, FxHashMap<String, SymbolId>>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: SymbolId) -> &SymbolTableEntry {
        &self.entries[usize::from(id)]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut SymbolTableEntry {
        &mut self.entries[usize::from(id)]
    }

    /// Replaces the value a symbol wraps, e.g. when a forward declaration is
    /// completed by a definition.
    pub fn set_value(&mut self, id: SymbolId, value: NodeId, value_type: AstType) {
        let entry = self.get_mut(id);
        entry.value = Some(value);
        entry.value_type = value_type;
    }

    /// Registers an identifier under the redeclaration rules. On success the
    /// identifier's back-pointer is set and the identifier is recorded in its
    /// declaration context.
    pub fn register(
        &mut self,
        idents: &mut IdentRegistry,
        contexts: &mut ContextTracker,
        ident: IdentId,
        ty: AstType,
    ) -> Result<SymbolId, RegisterError> {
        let (name, bits, context) = {
            let identifier = idents.get(ident);
            (
                identifier.name.clone(),
                identifier.bits,
                identifier.declaration_context,
            )
        };

        if ty.is_gate_type() || matches!(ty, AstType::Function | AstType::Kernel) {
            if self.gates.contains_key(&name) || self.globals.contains_key(&name) {
                return Err(RegisterError::ShadowsGlobal(name));
            }
            let id = self.alloc_entry(ident, ty, ContextId::GLOBAL, SymbolScope::Global);
            if ty.is_gate_type() {
                self.gates.insert(name.clone(), id);
            }
            self.globals.insert(name, id);
            self.finish_registration(idents, contexts, ident, id, context);
            return Ok(id);
        }

        if ty.is_defcal_type() {
            let mangled = idents
                .get(ident)
                .mangled_name
                .clone()
                .unwrap_or_else(|| name.clone());
            let group = self.defcals.entry(name.clone()).or_default();
            if group.contains_key(&mangled) {
                return Err(RegisterError::ShadowsGlobal(name));
            }
            let id = self.alloc_entry(ident, ty, ContextId::GLOBAL, SymbolScope::Global);
            self.defcals
                .entry(name)
                .or_default()
                .insert(mangled, id);
            self.finish_registration(idents, contexts, ident, id, context);
            return Ok(id);
        }

        if ty.is_qubit_type() && ty != AstType::GateQubitParam {
            if self.qubits.contains_key(&name) {
                return Err(RegisterError::ShadowsGlobal(name));
            }
            let scope = if context.is_global() {
                SymbolScope::Global
            } else {
                SymbolScope::Local
            };
            let id = self.alloc_entry(ident, ty, context, scope);
            self.qubits.insert(name, id);
            self.finish_registration(idents, contexts, ident, id, context);
            return Ok(id);
        }

        if ty.is_angle_type() {
            // Angles with identical names but different widths coexist.
            let key = (name.clone(), bits);
            if self.angles.contains_key(&key) {
                return Err(RegisterError::Duplicate(name));
            }
            let scope = if context.is_global() {
                SymbolScope::Global
            } else {
                SymbolScope::Local
            };
            let id = self.alloc_entry(ident, ty, context, scope);
            self.angles.insert(key, id);
            self.finish_registration(idents, contexts, ident, id, context);
            return Ok(id);
        }

        if context.is_global() {
            if self.globals.contains_key(&name) {
                return Err(RegisterError::Redeclaration(name));
            }
            let id = self.alloc_entry(ident, ty, context, SymbolScope::Global);
            self.globals.insert(name, id);
            self.finish_registration(idents, contexts, ident, id, context);
            return Ok(id);
        }

        if self
            .locals
            .get(context)
            .map_or(false, |map| map.contains_key(&name))
        {
            return Err(RegisterError::Redeclaration(name));
        }

        // A prior entry at a dominating context is shadowed, not rejected.
        if let Some(prior) = self.find_dominating(contexts, context, &name) {
            if ty.admits_redeclaration() {
                let predecessor = self.get(prior).ident;
                let identifier = idents.get_mut(ident);
                identifier.predecessor = Some(predecessor);
                identifier.flags |= IdentFlags::REDECLARATION;
            } else {
                return Err(RegisterError::ShadowsGlobal(name));
            }
        }

        let id = self.alloc_entry(ident, ty, context, SymbolScope::Local);
        if let Some(map) = self.locals.get_mut(context) {
            map.insert(name, id);
        } else {
            let mut map = FxHashMap::default();
            map.insert(name, id);
            self.locals.insert(context, map);
        }
        self.finish_registration(idents, contexts, ident, id, context);
        Ok(id)
    }

    fn alloc_entry(
        &mut self,
        ident: IdentId,
        value_type: AstType,
        context: ContextId,
        scope: SymbolScope,
    ) -> SymbolId {
        let id = SymbolId::from(self.entries.len());
        self.entries.push(SymbolTableEntry {
            id,
            ident,
            value_type,
            value: None,
            scope,
            context,
            do_not_delete: false,
        });
        id
    }

    fn finish_registration(
        &mut self,
        idents: &mut IdentRegistry,
        contexts: &mut ContextTracker,
        ident: IdentId,
        entry: SymbolId,
        context: ContextId,
    ) {
        let scope = self.get(entry).scope;
        let identifier = idents.get_mut(ident);
        identifier.symbol_table_entry = Some(entry);
        identifier.symbol_scope = scope;
        contexts.register(context, ident);
    }

    /// The prior entry with this name at an ancestor of `context`, global
    /// included, if any.
    fn find_dominating(
        &self,
        contexts: &ContextTracker,
        context: ContextId,
        name: &str,
    ) -> Option<SymbolId> {
        let mut cursor = contexts.get(context).parent;
        while let Some(id) = cursor {
            if let Some(&entry) = self.locals.get(id).and_then(|map| map.get(name)) {
                return Some(entry);
            }
            cursor = contexts.get(id).parent;
        }
        self.globals.get(name).copied()
    }

    /// Searches from the innermost open context up to global, consulting the
    /// general or specialized sub-table by the identifier's type.
    #[must_use]
    pub fn lookup(
        &self,
        idents: &IdentRegistry,
        contexts: &ContextTracker,
        ident: IdentId,
    ) -> Option<&SymbolTableEntry> {
        let identifier = idents.get(ident);
        let ty = identifier.symbol_type;
        if ty.is_gate_type() {
            return self.find_gate(&identifier.name);
        }
        if ty.is_defcal_type() {
            let mangled = identifier.mangled_name.as_deref()?;
            return self.find_defcal(&identifier.name, mangled);
        }
        if ty.is_qubit_type() && ty != AstType::GateQubitParam {
            return self.find_qubit(&identifier.name);
        }
        if ty.is_angle_type() {
            return self.find_angle(&identifier.name, identifier.bits);
        }
        self.lookup_name(contexts, &identifier.name)
    }

    /// Searches the open-context stack, then the global map, by name alone.
    /// Angles are found at any width; width-exact lookups go through
    /// [`SymbolTable::find_angle`].
    #[must_use]
    pub fn lookup_name(
        &self,
        contexts: &ContextTracker,
        name: &str,
    ) -> Option<&SymbolTableEntry> {
        for context in contexts.stack() {
            if let Some(&entry) = self.locals.get(context).and_then(|map| map.get(name)) {
                return Some(self.get(entry));
            }
        }
        self.lookup_global(name)
    }

    /// The global entry with this name, if any.
    #[must_use]
    pub fn lookup_global(&self, name: &str) -> Option<&SymbolTableEntry> {
        self.globals
            .get(name)
            .or_else(|| self.qubits.get(name))
            .or_else(|| self.gates.get(name))
            .copied()
            .or_else(|| self.find_angle_any_width(name))
            .map(|id| self.get(id))
    }

    fn find_angle_any_width(&self, name: &str) -> Option<SymbolId> {
        self.angles
            .iter()
            .filter(|((angle, _), _)| angle == name)
            .min_by_key(|((_, bits), _)| *bits)
            .map(|(_, &id)| id)
    }

    /// The entry with this name in exactly the given context, if any.
    #[must_use]
    pub fn lookup_local(&self, context: ContextId, name: &str) -> Option<&SymbolTableEntry> {
        self.locals
            .get(context)
            .and_then(|map| map.get(name))
            .map(|&id| self.get(id))
    }

    /// The qubit entry with this name, hardware-bound qubits included.
    #[must_use]
    pub fn find_qubit(&self, name: &str) -> Option<&SymbolTableEntry> {
        self.qubits.get(name).map(|&id| self.get(id))
    }

    /// The angle entry with this name and width.
    #[must_use]
    pub fn find_angle(&self, name: &str, bits: u32) -> Option<&SymbolTableEntry> {
        self.angles
            .get(&(name.to_string(), bits))
            .map(|&id| self.get(id))
    }

    /// The gate entry with this name.
    #[must_use]
    pub fn find_gate(&self, name: &str) -> Option<&SymbolTableEntry> {
        self.gates.get(name).map(|&id| self.get(id))
    }

    /// The defcal specialization with this group name and mangled name.
    #[must_use]
    pub fn find_defcal(&self, group: &str, mangled: &str) -> Option<&SymbolTableEntry> {
        self.defcals
            .get(group)
            .and_then(|specs| specs.get(mangled))
            .map(|&id| self.get(id))
    }

    /// All specializations registered under a defcal group name.
    #[must_use]
    pub fn defcal_group(&self, group: &str) -> Option<&FxHashMap<String, SymbolId>> {
        self.defcals.get(group)
    }

    /// Removes a name from the local map of the given context.
    pub fn erase_local(&mut self, context: ContextId, name: &str) {
        if let Some(map) = self.locals.get_mut(context) {
            map.remove(name);
        }
    }

    /// Removes a name from the global map unless the entry is reserved.
    pub fn erase_global(&mut self, name: &str) {
        if let Some(&id) = self.globals.get(name) {
            if self.get(id).do_not_delete {
                return;
            }
            self.globals.remove(name);
        }
    }

    /// The private symbol map of a finalized function/gate/defcal, keyed by
    /// surface name.
    #[must_use]
    pub fn private_symbols(&self, owner: &str) -> Option<&FxHashMap<String, SymbolId>> {
        self.private.get(owner)
    }

    /// Transfers the body-local symbols of a finished definition into the
    /// owner's private symbol map. Angles expand to their three components,
    /// qubit containers to both index forms per element, bitsets to their
    /// bits. Transferring twice produces the same map as once.
    pub fn transfer_parameters(
        &mut self,
        idents: &mut IdentRegistry,
        owner: &str,
        symbols: &[IdentId],
    ) -> usize {
        for &ident in symbols {
            let (name, bits, ty, context, entry) = {
                let identifier = idents.get(ident);
                (
                    identifier.name.clone(),
                    identifier.bits,
                    identifier.symbol_type,
                    identifier.declaration_context,
                    identifier.symbol_table_entry,
                )
            };
            if !ty.is_local_scope_type() {
                continue;
            }
            // Parameters reach the transfer without an entry of their own
            // (gate qubit parameters are never globally registered); give
            // them one so the private map can reference them.
            let entry = match entry {
                Some(entry) => entry,
                None => {
                    let id = self.alloc_entry(ident, ty, context, SymbolScope::Local);
                    idents.get_mut(ident).symbol_table_entry = Some(id);
                    id
                }
            };

            // Reserved entries (π, the seeded parameter angles) are shared
            // across every definition; record them in the private map but
            // leave their global registration untouched.
            let reserved = self.get(entry).do_not_delete;
            if !reserved {
                idents.get_mut(ident).symbol_scope = SymbolScope::Local;
                self.get_mut(entry).scope = SymbolScope::Local;
            }

            let private = self.private.entry(owner.to_string()).or_default();
            private.entry(name.clone()).or_insert(entry);
            if reserved {
                continue;
            }

            match ty {
                AstType::Angle => {
                    for i in 0..3 {
                        let component = string_utils::indexed_of(&name, i);
                        if !self
                            .private
                            .get(owner)
                            .map_or(false, |map| map.contains_key(&component))
                        {
                            let id = self.synthesize(idents, &component, INT_BITS, ty, context);
                            self.private
                                .entry(owner.to_string())
                                .or_default()
                                .insert(component, id);
                        }
                    }
                    self.angles.remove(&(name.clone(), bits));
                }
                AstType::QubitContainer | AstType::QubitContainerAlias => {
                    for i in 0..bits as usize {
                        for form in [
                            string_utils::alias_of(&name, i),
                            string_utils::indexed_of(&name, i),
                        ] {
                            self.private
                                .entry(owner.to_string())
                                .or_default()
                                .entry(form)
                                .or_insert(entry);
                        }
                    }
                    self.erase_local(context, &name);
                }
                AstType::Bitset => {
                    for i in 0..bits as usize {
                        let bit = string_utils::indexed_of(&name, i);
                        if !self
                            .private
                            .get(owner)
                            .map_or(false, |map| map.contains_key(&bit))
                        {
                            let existing = self
                                .locals
                                .get(context)
                                .and_then(|map| map.get(&bit))
                                .copied();
                            let id = match existing {
                                Some(id) => id,
                                None => self.synthesize(idents, &bit, 1, ty, context),
                            };
                            self.private
                                .entry(owner.to_string())
                                .or_default()
                                .insert(bit, id);
                        }
                    }
                    self.erase_local(context, &name);
                }
                _ => {
                    self.erase_local(context, &name);
                    self.erase_global(&name);
                }
            }
        }

        self.private.get(owner).map_or(0, FxHashMap::len)
    }

    /// Creates a synthetic identifier and entry for a transfer expansion.
    fn synthesize(
        &mut self,
        idents: &mut IdentRegistry,
        name: &str,
        bits: u32,
        ty: AstType,
        context: ContextId,
    ) -> SymbolId {
        let ident = idents.create(name, bits, ty, context);
        let id = self.alloc_entry(ident, ty, context, SymbolScope::Local);
        idents.get_mut(ident).symbol_table_entry = Some(id);
        id
    }

    /// The number of entries allocated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests;

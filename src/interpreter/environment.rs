//! Lexical environments. An environment is a persistent symbol table plus a
//! handle on the enclosing scope; names are resolved by walking outwards.
//! `Option<Value>` is stored rather than `Value` so a declaration without an
//! initializer still owns a slot.

use std::cell::RefCell;
use std::rc::Rc;

use crate::lexer::Token;

use super::persistent_map::PersistentMap;
use super::value::Value;
use super::RuntimeError;

pub type SharedEnv = Rc<RefCell<Environment>>;
pub type SymbolTable = PersistentMap<Option<Value>>;

#[derive(Debug)]
pub struct Environment {
    outer: Option<SharedEnv>,
    table: SymbolTable,
    allow_assign_on_define: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            outer: None,
            table: SymbolTable::new(),
            allow_assign_on_define: true,
        }
    }
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedEnv {
        Rc::new(RefCell::new(Self::new()))
    }

    /// A child scope of `outer`.
    pub fn nested(outer: &SharedEnv) -> SharedEnv {
        Rc::new(RefCell::new(Self {
            outer: Some(Rc::clone(outer)),
            ..Self::new()
        }))
    }

    /// The snapshot flavor used when capturing an environment into a closure
    /// or prototype: the new environment starts from a copy of `outer`'s
    /// table and is chained to the grandparent instead. Names that already
    /// exist keep their shared entries, so assignments flow both ways, while
    /// definitions added to `outer` afterwards stay invisible here.
    pub fn persisted(outer: &SharedEnv) -> SharedEnv {
        let outer = outer.borrow();
        Rc::new(RefCell::new(Self {
            outer: outer.outer.clone(),
            table: outer.table.clone(),
            allow_assign_on_define: true,
        }))
    }

    /// Property environment of a prototype. Declarations always create
    /// fresh slots here, shadowing anything copied over from a parent.
    pub fn members() -> SharedEnv {
        Rc::new(RefCell::new(Self {
            allow_assign_on_define: false,
            ..Self::new()
        }))
    }

    /// Binds `name` in this scope. An existing mutable local binding is
    /// written through (shared entries included, which is what lets a
    /// redefinition reach old captures); anything else gets a fresh entry
    /// shadowing at the closest scope. Never touches the outer chain and
    /// never fails.
    pub fn define(&mut self, name: &Token, value: Option<Value>) {
        if self.allow_assign_on_define {
            if let Some(entry) = self.table.get_entry(name) {
                if !entry.key().constant {
                    entry.set_value(value);
                    return;
                }
            }
        }
        self.table = self.table.insert(name.clone(), value);
    }

    /// Updates the nearest enclosing binding of `name`. Fails on constants
    /// and on names that are nowhere in scope.
    pub fn assign(&mut self, name: &Token, value: Option<Value>) -> Result<(), RuntimeError> {
        if let Some(entry) = self.table.get_entry(name) {
            if entry.key().constant {
                return Err(RuntimeError::new(
                    format!("Can not assign to the constant {}!", name.lexeme),
                    Some(name.clone()),
                ));
            }
            if let Some(table) = self.table.assign(name, value) {
                self.table = table;
            }
            return Ok(());
        }
        if let Some(outer) = &self.outer {
            return outer.borrow_mut().assign(name, value);
        }
        Err(RuntimeError::new(
            format!("Undefined variable \"{}\"!", name.lexeme),
            Some(name.clone()),
        ))
    }

    pub fn get(&self, name: &Token) -> Result<Option<Value>, RuntimeError> {
        if let Some(value) = self.table.get(name) {
            return Ok(value);
        }
        if let Some(outer) = &self.outer {
            return outer.borrow().get(name);
        }
        Err(RuntimeError::new(
            format!("Undefined variable \"{}\"!", name.lexeme),
            Some(name.clone()),
        ))
    }

    pub fn copy_over(&mut self, other: &Environment) {
        self.table = self.table.copy_over(&other.table);
    }

    /// A fresh environment whose table is the bucket-wise union of the
    /// inputs' tables; used to build a prototype's method environment.
    pub fn unionize(envs: &[&SharedEnv]) -> SharedEnv {
        let tables: Vec<SymbolTable> = envs.iter().map(|env| env.borrow().table.clone()).collect();
        Rc::new(RefCell::new(Self {
            outer: None,
            table: SymbolTable::unionize(&tables),
            allow_assign_on_define: true,
        }))
    }
}

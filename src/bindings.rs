//! Conversion-bindings registry.
//!
//! A consumer of the element model: scans classes for annotated one-argument
//! conversion methods and registers each discovered (from, to) type pair.
//! The already-inspected set uses a mutex around check-and-insert so a class
//! is annotation-scanned at most once even under concurrent callers.
//! Duplicate registrations are ignorable for this consumer: they are skipped
//! and counted, and processing continues with the remaining inputs.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::model::Type;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    pub from: String,
    pub to: String,
    pub owner: String,
    pub method: String,
}

#[derive(Debug, Default, Serialize)]
pub struct RegistrationOutcome {
    pub inspected: bool,
    pub registered: usize,
    pub duplicates: usize,
}

#[derive(Debug)]
pub struct BindingRegistry {
    annotation: String,
    inspected: Mutex<HashSet<String>>,
    bindings: Mutex<HashMap<(String, String), Binding>>,
}

impl BindingRegistry {
    /// `annotation` is the dotted type name marking conversion methods.
    pub fn new(annotation: impl Into<String>) -> Self {
        Self {
            annotation: annotation.into(),
            inspected: Mutex::new(HashSet::new()),
            bindings: Mutex::new(HashMap::new()),
        }
    }

    /// Scan one type for conversion methods. Check-and-insert on the
    /// inspected set happens first; a second caller racing on the same class
    /// returns immediately with `inspected: false`.
    pub fn register_from(&self, ty: &Type) -> RegistrationOutcome {
        {
            let mut inspected = self.inspected.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            if !inspected.insert(ty.name.clone()) {
                return RegistrationOutcome::default();
            }
        }

        let mut outcome = RegistrationOutcome {
            inspected: true,
            ..Default::default()
        };

        for operation in ty.methods() {
            if operation.annotation(&self.annotation).is_none() {
                continue;
            }
            let parameters = operation.parameters();
            if parameters.len() != 1 {
                continue;
            }
            let from = parameters[0].type_name.display();
            let to = operation.return_type().display();
            if to == "void" {
                continue;
            }

            let binding = Binding {
                from: from.clone(),
                to: to.clone(),
                owner: ty.name.clone(),
                method: operation.name.clone(),
            };

            let mut bindings = self.bindings.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            if bindings.contains_key(&(from.clone(), to.clone())) {
                outcome.duplicates += 1;
                continue;
            }
            bindings.insert((from, to), binding);
            outcome.registered += 1;
        }

        outcome
    }

    pub fn lookup(&self, from: &str, to: &str) -> Option<Binding> {
        self.bindings
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&(from.to_string(), to.to_string()))
            .cloned()
    }

    /// All registered bindings, sorted by (from, to) for stable output.
    pub fn bindings(&self) -> Vec<Binding> {
        let mut all: Vec<Binding> = self
            .bindings
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.from.cmp(&b.from).then_with(|| a.to.cmp(&b.to)));
        all
    }

    pub fn inspected_count(&self) -> usize {
        self.inspected.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }
}

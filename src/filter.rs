//! Composable predicates over parsed types.
//!
//! Filters decouple "which subset of the model to examine" from "what to do
//! with each node". They are evaluated post-parse by the projector, never as
//! a directory-name heuristic, so a filter always sees the full structural
//! descriptor.

use crate::model::{Type, TypeKind};

pub trait TypeFilter {
    fn matches(&self, ty: &Type) -> bool;
}

/// Elements of one kind.
pub struct KindIs(pub TypeKind);

impl TypeFilter for KindIs {
    fn matches(&self, ty: &Type) -> bool {
        ty.kind == self.0
    }
}

/// Dotted-name prefix, package-boundary aware: `org.example` matches
/// `org.example.Foo` but not `org.examples.Foo`.
pub struct NamePrefix(pub String);

impl TypeFilter for NamePrefix {
    fn matches(&self, ty: &Type) -> bool {
        ty.name == self.0
            || ty
                .name
                .strip_prefix(&self.0)
                .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('$'))
    }
}

/// Types carrying a declared annotation of the given dotted type name.
pub struct AnnotatedWith(pub String);

impl TypeFilter for AnnotatedWith {
    fn matches(&self, ty: &Type) -> bool {
        ty.annotation(&self.0).is_some()
    }
}

/// Types declaring the given interface among their implemented interfaces.
pub struct Implements(pub String);

impl TypeFilter for Implements {
    fn matches(&self, ty: &Type) -> bool {
        ty.implements(&self.0)
    }
}

/// Conjunction; an empty set matches everything.
pub struct AllOf {
    filters: Vec<Box<dyn TypeFilter + Send + Sync>>,
}

impl AllOf {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    pub fn push(mut self, filter: impl TypeFilter + Send + Sync + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Default for AllOf {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeFilter for AllOf {
    fn matches(&self, ty: &Type) -> bool {
        self.filters.iter().all(|f| f.matches(ty))
    }
}

//! Visitor-based deep traversal.
//!
//! The walk is depth-first, pre-order, and the child sequence of a type is
//! part of the contract: implemented interfaces, nested classes, fields,
//! constructors, methods, static initializers, annotations. Consumers that
//! depend on output ordering therefore see the same sequence on every run
//! over the same classpath. Superclasses are deliberately not walked; only
//! implemented interfaces and declared members are, which keeps the walk
//! bounded without chasing the hierarchy up to `java.lang.Object`. A visited
//! set keeps diamond-shaped interface graphs at one visit per type.

use std::collections::HashSet;

use crate::classpath::ClasspathResolver;
use crate::error::ScanResult;
use crate::model::{Annotation, Field, Operation, Package, Parameter, Type};

/// One callback per visited element.
pub trait Visitor {
    fn visit(&mut self, node: Node<'_>) -> ScanResult<()>;
}

#[derive(Debug)]
pub enum Node<'a> {
    Package(&'a Package),
    Type(&'a Type),
    Field(&'a Field),
    Operation(&'a Operation),
    Parameter(&'a Parameter),
    Annotation(&'a Annotation),
}

impl Node<'_> {
    /// Stable one-line rendering, `kind name`, used by ordering-dependent
    /// consumers.
    pub fn describe(&self) -> String {
        match self {
            Node::Package(p) => format!("package {}", p.name),
            Node::Type(t) => format!("{} {}", t.kind.label(), t.name),
            Node::Field(f) => format!("field {}#{}", f.declaring_type(), f.name()),
            Node::Operation(o) => {
                format!("{} {}#{}", o.kind.label(), o.declaring_type(), o.name)
            }
            Node::Parameter(p) => format!(
                "parameter {}[{}]: {}",
                p.declaring_type(),
                p.index,
                p.type_name.display()
            ),
            Node::Annotation(a) => {
                format!("annotation @{} on {}", a.type_name, a.enclosing.describe())
            }
        }
    }
}

pub struct Walker<'a> {
    resolver: &'a ClasspathResolver,
    visited: HashSet<String>,
}

impl<'a> Walker<'a> {
    pub fn new(resolver: &'a ClasspathResolver) -> Self {
        Self {
            resolver,
            visited: HashSet::new(),
        }
    }

    /// Walk a package: the package node itself, then each member class in
    /// listing order.
    pub fn walk_package(&mut self, package: &Package, visitor: &mut dyn Visitor) -> ScanResult<()> {
        visitor.visit(Node::Package(package))?;
        for class_name in package.classes(self.resolver)? {
            let ty = Type::of(self.resolver, &class_name)?;
            self.walk_type(&ty, visitor)?;
        }
        Ok(())
    }

    pub fn walk_type(&mut self, ty: &Type, visitor: &mut dyn Visitor) -> ScanResult<()> {
        if !self.visited.insert(ty.name.clone()) {
            return Ok(());
        }

        visitor.visit(Node::Type(ty))?;

        for interface_name in ty.interface_names() {
            let interface = Type::of(self.resolver, interface_name)?;
            self.walk_type(&interface, visitor)?;
        }

        for nested in ty.nested_classes(self.resolver)? {
            self.walk_type(&nested, visitor)?;
        }

        for field in ty.fields() {
            visitor.visit(Node::Field(&field))?;
            for annotation in field.annotations() {
                visitor.visit(Node::Annotation(&annotation))?;
            }
        }

        for constructor in ty.constructors() {
            self.walk_operation(&constructor, visitor)?;
        }

        for method in ty.methods() {
            self.walk_operation(&method, visitor)?;
        }

        for initializer in ty.static_initializers() {
            self.walk_operation(&initializer, visitor)?;
        }

        for annotation in ty.annotations() {
            visitor.visit(Node::Annotation(&annotation))?;
        }

        Ok(())
    }

    fn walk_operation(
        &mut self,
        operation: &Operation,
        visitor: &mut dyn Visitor,
    ) -> ScanResult<()> {
        visitor.visit(Node::Operation(operation))?;
        for parameter in operation.parameters() {
            visitor.visit(Node::Parameter(&parameter))?;
            for annotation in parameter.annotations() {
                visitor.visit(Node::Annotation(&annotation))?;
            }
        }
        for annotation in operation.annotations() {
            visitor.visit(Node::Annotation(&annotation))?;
        }
        Ok(())
    }
}

/// Collects the `describe()` line of every visited node, in visit order.
#[derive(Debug, Default)]
pub struct CollectingVisitor {
    pub lines: Vec<String>,
}

impl Visitor for CollectingVisitor {
    fn visit(&mut self, node: Node<'_>) -> ScanResult<()> {
        self.lines.push(node.describe());
        Ok(())
    }
}

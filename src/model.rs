//! The element model: a read-only graph over parsed class descriptors.
//!
//! Every node is constructed on demand from a [`ClassDescriptor`] and is
//! immutable afterwards; traversing the model has no side effects and there
//! is no cross-scan caching. Resolution happens in two explicit phases: the
//! structural descriptor is phase one, and [`Type::resolve`] /
//! [`Annotation::actual`] re-consult the resolver's current view of the
//! classpath for phase two.

use serde::Serialize;

use crate::classfile::{
    ACC_ANNOTATION, ACC_ENUM, ACC_INTERFACE, AnnotationInfo, AnnotationValue,
    CONSTRUCTOR_NAME, ClassDescriptor, FieldInfo, MethodInfo, STATIC_INITIALIZER_NAME,
};
use crate::classpath::ClasspathResolver;
use crate::descriptor::{MethodSignature, Primitive, TypeName};
use crate::error::{ScanError, ScanResult};

/// JVM-internal fields whose reflective access is unreliable across JVM
/// versions; excluded from field enumeration.
const JVM_INTERNAL_FIELDS: &[(&str, &str)] = &[
    ("java.lang.Throwable", "backtrace"),
    ("java.lang.System", "security"),
];

/// Closed variant set over the introspected type forms.
///
/// `Inner` is reported for a nested plain class (an InnerClasses self-entry
/// with an inner name); nested interfaces, enums and annotation types keep
/// their structural kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Array,
    Primitive,
    Inner,
}

impl TypeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Enum => "enum",
            Self::Annotation => "annotation-type",
            Self::Array => "array",
            Self::Primitive => "primitive",
            Self::Inner => "inner-class",
        }
    }

    pub fn of_descriptor(descriptor: &ClassDescriptor) -> Self {
        let flags = descriptor.access_flags;
        if flags & ACC_ANNOTATION != 0 {
            Self::Annotation
        } else if flags & ACC_INTERFACE != 0 {
            Self::Interface
        } else if flags & ACC_ENUM != 0 {
            Self::Enum
        } else if has_named_self_entry(descriptor) {
            Self::Inner
        } else {
            Self::Class
        }
    }
}

fn has_named_self_entry(descriptor: &ClassDescriptor) -> bool {
    descriptor
        .inner_classes
        .iter()
        .any(|entry| entry.inner == descriptor.name && entry.inner_name.is_some())
}

/// Identity of the element an annotation is attached to. The back-reference
/// decides which live annotation list phase-two resolution searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "element", rename_all = "lowercase")]
pub enum ElementPath {
    Type { name: String },
    Field { type_name: String, field: String },
    Operation {
        type_name: String,
        name: String,
        descriptor: String,
    },
    Parameter {
        type_name: String,
        name: String,
        descriptor: String,
        index: usize,
    },
    Package { name: String },
}

impl ElementPath {
    pub fn describe(&self) -> String {
        match self {
            Self::Type { name } => name.clone(),
            Self::Field { type_name, field } => format!("{type_name}#{field}"),
            Self::Operation {
                type_name, name, ..
            } => format!("{type_name}#{name}"),
            Self::Parameter {
                type_name,
                name,
                index,
                ..
            } => format!("{type_name}#{name}[{index}]"),
            Self::Package { name } => format!("package {name}"),
        }
    }
}

/// A class, interface, enum, annotation type, array stand-in or primitive
/// stand-in, backed by its parsed binary descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct Type {
    pub name: String,
    pub kind: TypeKind,
    descriptor: ClassDescriptor,
}

/// Value equality on identity, not on structural payload.
impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind
    }
}

impl Eq for Type {}

impl Type {
    pub fn from_descriptor(descriptor: ClassDescriptor) -> Self {
        let kind = TypeKind::of_descriptor(&descriptor);
        Self {
            name: descriptor.name.clone(),
            kind,
            descriptor,
        }
    }

    /// Phase-one lookup through the resolver. Primitive and array names get
    /// their synthesized stand-in kinds.
    pub fn of(resolver: &ClasspathResolver, name: &str) -> ScanResult<Self> {
        let resolved = resolver.resolve_descriptor(name)?;
        let mut ty = Self::from_descriptor(resolved.descriptor);
        if Primitive::from_name(name).is_some() {
            ty.kind = TypeKind::Primitive;
        } else if name.ends_with("[]") {
            ty.kind = TypeKind::Array;
        }
        Ok(ty)
    }

    pub fn descriptor(&self) -> &ClassDescriptor {
        &self.descriptor
    }

    pub fn package_name(&self) -> &str {
        self.descriptor.package_name()
    }

    pub fn package(&self) -> Package {
        Package::new(self.package_name())
    }

    pub fn superclass_name(&self) -> Option<&str> {
        self.descriptor.superclass.as_deref()
    }

    /// Resolve the superclass to a full type. `None` only above
    /// `java.lang.Object`; an unresolvable name is a hard failure.
    pub fn superclass(&self, resolver: &ClasspathResolver) -> ScanResult<Option<Type>> {
        match self.superclass_name() {
            None => Ok(None),
            Some(name) => Type::of(resolver, name).map(Some),
        }
    }

    pub fn interface_names(&self) -> &[String] {
        &self.descriptor.interfaces
    }

    pub fn implements(&self, interface_name: &str) -> bool {
        self.descriptor
            .interfaces
            .iter()
            .any(|i| i == interface_name)
    }

    /// Declaration-order fields, minus the documented JVM-internal
    /// exclusions.
    pub fn fields(&self) -> Vec<Field> {
        self.descriptor
            .fields
            .iter()
            .filter(|f| {
                !JVM_INTERNAL_FIELDS
                    .iter()
                    .any(|(owner, name)| *owner == self.name && *name == f.name)
            })
            .map(|f| Field {
                declaring: self.name.clone(),
                info: f.clone(),
            })
            .collect()
    }

    /// Declared constructors; a concrete class with none declared reports
    /// exactly one synthesized zero-argument constructor.
    pub fn constructors(&self) -> Vec<Operation> {
        let declared: Vec<Operation> = self
            .descriptor
            .methods
            .iter()
            .filter(|m| m.name == CONSTRUCTOR_NAME)
            .map(|m| Operation::from_method(&self.name, OperationKind::Constructor, m))
            .collect();

        if declared.is_empty() && self.is_concrete_class() {
            return vec![Operation::default_constructor(&self.name)];
        }
        declared
    }

    pub fn methods(&self) -> Vec<Operation> {
        self.descriptor
            .methods
            .iter()
            .filter(|m| m.name != CONSTRUCTOR_NAME && m.name != STATIC_INITIALIZER_NAME)
            .map(|m| Operation::from_method(&self.name, OperationKind::Method, m))
            .collect()
    }

    pub fn static_initializers(&self) -> Vec<Operation> {
        self.descriptor
            .methods
            .iter()
            .filter(|m| m.name == STATIC_INITIALIZER_NAME)
            .map(|m| Operation::from_method(&self.name, OperationKind::StaticInitializer, m))
            .collect()
    }

    pub fn nested_classes(&self, resolver: &ClasspathResolver) -> ScanResult<Vec<Type>> {
        let mut nested = Vec::new();
        for entry in &self.descriptor.inner_classes {
            // Anonymous entries carry no inner name and are excluded; they
            // only surface through operation-body introspection.
            if entry.inner_name.is_none() {
                continue;
            }
            if entry.outer.as_deref() != Some(self.name.as_str()) {
                continue;
            }
            nested.push(Type::of(resolver, &entry.inner)?);
        }
        Ok(nested)
    }

    pub fn annotations(&self) -> Vec<Annotation> {
        self.descriptor
            .annotations
            .iter()
            .map(|info| {
                Annotation::new(
                    info,
                    ElementPath::Type {
                        name: self.name.clone(),
                    },
                )
            })
            .collect()
    }

    /// Lookup by annotation type name; absent means `None`, not an error.
    pub fn annotation(&self, type_name: &str) -> Option<Annotation> {
        self.annotations()
            .into_iter()
            .find(|a| a.type_name == type_name)
    }

    /// Phase two: re-locate the backing resource through the resolver and
    /// verify the round-trip name. A name mismatch means the classpath no
    /// longer agrees with the structural view.
    pub fn resolve(&self, resolver: &ClasspathResolver) -> ScanResult<ResolvedType> {
        let resolved = resolver.resolve_descriptor(&self.name)?;
        if resolved.descriptor.name != self.name {
            return Err(ScanError::mismatch(
                &self.name,
                format!(
                    "backing resource declares {} instead",
                    resolved.descriptor.name
                ),
            ));
        }
        Ok(ResolvedType {
            ty: Type::from_descriptor(resolved.descriptor),
            origin: resolved.origin,
        })
    }

    fn is_concrete_class(&self) -> bool {
        matches!(self.kind, TypeKind::Class | TypeKind::Inner) && !self.descriptor.is_abstract()
    }
}

/// Phase-two result: the structural view plus the origin it was re-read from.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedType {
    pub ty: Type,
    pub origin: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    declaring: String,
    info: FieldInfo,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring
    }

    pub fn type_name(&self) -> &TypeName {
        &self.info.type_name
    }

    /// Resolve the field's type through the resolver (lazy, phase two).
    pub fn resolved_type(&self, resolver: &ClasspathResolver) -> ScanResult<Type> {
        resolve_type_name(resolver, &self.info.type_name)
    }

    pub fn annotations(&self) -> Vec<Annotation> {
        self.info
            .annotations
            .iter()
            .map(|a| {
                Annotation::new(
                    a,
                    ElementPath::Field {
                        type_name: self.declaring.clone(),
                        field: self.info.name.clone(),
                    },
                )
            })
            .collect()
    }

    pub fn annotation(&self, type_name: &str) -> Option<Annotation> {
        self.annotations()
            .into_iter()
            .find(|a| a.type_name == type_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Constructor,
    Method,
    StaticInitializer,
}

impl OperationKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Constructor => "constructor",
            Self::Method => "method",
            Self::StaticInitializer => "static-initializer",
        }
    }
}

/// A constructor, method or static initializer with its binary descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct Operation {
    declaring: String,
    pub kind: OperationKind,
    pub name: String,
    pub descriptor: String,
    pub signature: MethodSignature,
    annotations: Vec<AnnotationInfo>,
    parameter_annotations: Vec<Vec<AnnotationInfo>>,
    pub synthesized: bool,
}

impl Operation {
    fn from_method(declaring: &str, kind: OperationKind, method: &MethodInfo) -> Self {
        Self {
            declaring: declaring.to_string(),
            kind,
            name: method.name.clone(),
            descriptor: method.descriptor.clone(),
            signature: method.signature.clone(),
            annotations: method.annotations.clone(),
            parameter_annotations: method.parameter_annotations.clone(),
            synthesized: false,
        }
    }

    fn default_constructor(declaring: &str) -> Self {
        Self {
            declaring: declaring.to_string(),
            kind: OperationKind::Constructor,
            name: CONSTRUCTOR_NAME.to_string(),
            descriptor: "()V".to_string(),
            signature: MethodSignature {
                parameters: Vec::new(),
                return_type: TypeName::Void,
            },
            annotations: Vec::new(),
            parameter_annotations: Vec::new(),
            synthesized: true,
        }
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring
    }

    pub fn is_static(&self) -> bool {
        matches!(self.kind, OperationKind::StaticInitializer)
    }

    pub fn return_type(&self) -> &TypeName {
        &self.signature.return_type
    }

    /// Positionally indexed parameters with their annotation lists.
    pub fn parameters(&self) -> Vec<Parameter> {
        self.signature
            .parameters
            .iter()
            .enumerate()
            .map(|(index, type_name)| Parameter {
                declaring: self.declaring.clone(),
                operation: self.name.clone(),
                operation_descriptor: self.descriptor.clone(),
                index,
                type_name: type_name.clone(),
                annotations: self
                    .parameter_annotations
                    .get(index)
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect()
    }

    pub fn annotations(&self) -> Vec<Annotation> {
        self.annotations
            .iter()
            .map(|a| {
                Annotation::new(
                    a,
                    ElementPath::Operation {
                        type_name: self.declaring.clone(),
                        name: self.name.clone(),
                        descriptor: self.descriptor.clone(),
                    },
                )
            })
            .collect()
    }

    pub fn annotation(&self, type_name: &str) -> Option<Annotation> {
        self.annotations()
            .into_iter()
            .find(|a| a.type_name == type_name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Parameter {
    declaring: String,
    operation: String,
    operation_descriptor: String,
    pub index: usize,
    pub type_name: TypeName,
    annotations: Vec<AnnotationInfo>,
}

impl Parameter {
    pub fn declaring_type(&self) -> &str {
        &self.declaring
    }

    pub fn resolved_type(&self, resolver: &ClasspathResolver) -> ScanResult<Type> {
        resolve_type_name(resolver, &self.type_name)
    }

    pub fn annotations(&self) -> Vec<Annotation> {
        self.annotations
            .iter()
            .map(|a| {
                Annotation::new(
                    a,
                    ElementPath::Parameter {
                        type_name: self.declaring.clone(),
                        name: self.operation.clone(),
                        descriptor: self.operation_descriptor.clone(),
                        index: self.index,
                    },
                )
            })
            .collect()
    }

    pub fn annotation(&self, type_name: &str) -> Option<Annotation> {
        self.annotations()
            .into_iter()
            .find(|a| a.type_name == type_name)
    }
}

/// A structurally declared annotation. Values are the parsed element-value
/// pairs; [`Annotation::actual`] re-reads them from the resolver's current
/// view of the enclosing element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub type_name: String,
    pub values: Vec<(String, AnnotationValue)>,
    pub enclosing: ElementPath,
}

impl Annotation {
    fn new(info: &AnnotationInfo, enclosing: ElementPath) -> Self {
        Self {
            type_name: info.type_name.clone(),
            values: info.values.clone(),
            enclosing,
        }
    }

    pub fn value(&self, element_name: &str) -> Option<&AnnotationValue> {
        self.values
            .iter()
            .find(|(name, _)| name == element_name)
            .map(|(_, value)| value)
    }

    /// Phase two: dispatch on the enclosing element's kind, fetch its live
    /// annotation list from a fresh resolution, and match by type name. A
    /// declared annotation missing from the live view is a structural
    /// mismatch, never a silent miss.
    pub fn actual(&self, resolver: &ClasspathResolver) -> ScanResult<AnnotationInfo> {
        let live = match &self.enclosing {
            ElementPath::Type { name } => {
                resolver.resolve_descriptor(name)?.descriptor.annotations
            }
            ElementPath::Field { type_name, field } => {
                let descriptor = resolver.resolve_descriptor(type_name)?.descriptor;
                descriptor
                    .fields
                    .iter()
                    .find(|f| &f.name == field)
                    .map(|f| f.annotations.clone())
                    .ok_or_else(|| {
                        ScanError::mismatch(
                            self.enclosing.describe(),
                            "field absent from the live view",
                        )
                    })?
            }
            ElementPath::Operation {
                type_name,
                name,
                descriptor,
            } => find_live_method(resolver, type_name, name, descriptor)?.annotations,
            ElementPath::Parameter {
                type_name,
                name,
                descriptor,
                index,
            } => {
                let method = find_live_method(resolver, type_name, name, descriptor)?;
                method
                    .parameter_annotations
                    .get(*index)
                    .cloned()
                    .unwrap_or_default()
            }
            ElementPath::Package { name } => {
                // Packages only have live annotations where a package-info
                // marker exists.
                resolver
                    .resolve_descriptor(&format!("{name}.package-info"))?
                    .descriptor
                    .annotations
            }
        };

        live.into_iter()
            .find(|a| a.type_name == self.type_name)
            .ok_or_else(|| {
                ScanError::mismatch(
                    self.enclosing.describe(),
                    format!(
                        "annotation {} declared structurally but absent from the live view",
                        self.type_name
                    ),
                )
            })
    }
}

fn find_live_method(
    resolver: &ClasspathResolver,
    type_name: &str,
    name: &str,
    descriptor: &str,
) -> ScanResult<MethodInfo> {
    let parsed = resolver.resolve_descriptor(type_name)?.descriptor;
    parsed
        .methods
        .iter()
        .find(|m| m.name == name && m.descriptor == descriptor)
        .cloned()
        .ok_or_else(|| {
            ScanError::mismatch(
                format!("{type_name}#{name}"),
                "operation absent from the live view",
            )
        })
}

fn resolve_type_name(resolver: &ClasspathResolver, type_name: &TypeName) -> ScanResult<Type> {
    match type_name {
        TypeName::Primitive { primitive } => Type::of(resolver, primitive.name()),
        TypeName::Reference { name } => Type::of(resolver, name),
        TypeName::Array { .. } => Type::of(resolver, &type_name.display()),
        TypeName::Void => Err(ScanError::resolution("void", "void is not a resolvable type")),
    }
}

/// Packages group types by naming prefix; they are synthesized from the
/// classpath layout and have no binary form of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    pub name: String,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Immediate member classes, derived from the classpath listing.
    pub fn classes(&self, resolver: &ClasspathResolver) -> ScanResult<Vec<String>> {
        let prefix = if self.name.is_empty() {
            String::new()
        } else {
            format!("{}.", self.name)
        };
        Ok(resolver
            .list_classes()?
            .into_iter()
            .map(|entry| entry.name)
            .filter(|name| {
                name.strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.is_empty() && !rest.contains('.'))
            })
            .collect())
    }

    /// Package annotations live on the package-info marker when one exists.
    pub fn annotations(&self, resolver: &ClasspathResolver) -> ScanResult<Vec<Annotation>> {
        let marker = format!("{}.package-info", self.name);
        match resolver.resolve_descriptor(&marker) {
            Ok(resolved) => Ok(resolved
                .descriptor
                .annotations
                .iter()
                .map(|info| {
                    Annotation::new(
                        info,
                        ElementPath::Package {
                            name: self.name.clone(),
                        },
                    )
                })
                .collect()),
            Err(ScanError::Resolution { .. }) => Ok(Vec::new()),
            Err(other) => Err(other),
        }
    }
}

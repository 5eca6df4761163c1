//! Structural class file parsing.
//!
//! Parses the compiled binary form into a [`ClassDescriptor`] without ever
//! touching a class loader: superclass and interface names, field and method
//! descriptors, access flags, runtime-visible annotation blocks (with full
//! element-value decoding) and the InnerClasses attribute table. The parse is
//! one pass over a byte slice; the returned descriptor owns everything and
//! holds no handle on the backing resource.

use serde::Serialize;
use thiserror::Error;

use crate::descriptor::{
    self, DescriptorError, MethodSignature, TypeName, annotation_type_name, binary_to_dotted,
};
use crate::reader::{ClassReader, ConstantPool};

pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_ANNOTATION: u16 = 0x2000;
pub const ACC_ENUM: u16 = 0x4000;

pub const CONSTRUCTOR_NAME: &str = "<init>";
pub const STATIC_INITIALIZER_NAME: &str = "<clinit>";

#[derive(Debug, Error)]
pub enum ClassParseError {
    #[error("unexpected end of class file")]
    UnexpectedEof,
    #[error("invalid class file magic header")]
    InvalidMagic,
    #[error("unsupported constant pool tag {tag}")]
    UnsupportedConstant { tag: u8 },
    #[error("invalid constant pool index {index}")]
    InvalidConstantIndex { index: u16 },
    #[error("invalid UTF-8 string in constant pool: {0}")]
    Utf8Decode(#[from] std::string::FromUtf8Error),
    #[error("unsupported annotation value tag '{tag}'")]
    UnsupportedAnnotationTag { tag: char },
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

/// Parsed structural view of one compiled class. Names are dotted.
#[derive(Debug, Clone, Serialize)]
pub struct ClassDescriptor {
    pub name: String,
    pub access_flags: u16,
    /// `None` only for `java.lang.Object` and module descriptors.
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub annotations: Vec<AnnotationInfo>,
    pub inner_classes: Vec<InnerClassInfo>,
}

impl ClassDescriptor {
    pub fn package_name(&self) -> &str {
        self.name.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or("")
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags & ACC_INTERFACE != 0
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags & ACC_ABSTRACT != 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldInfo {
    pub name: String,
    pub access_flags: u16,
    pub descriptor: String,
    pub type_name: TypeName,
    pub annotations: Vec<AnnotationInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodInfo {
    pub name: String,
    pub access_flags: u16,
    pub descriptor: String,
    pub signature: MethodSignature,
    pub annotations: Vec<AnnotationInfo>,
    /// One annotation list per declared parameter; empty when the class file
    /// carries no RuntimeVisibleParameterAnnotations attribute.
    pub parameter_annotations: Vec<Vec<AnnotationInfo>>,
}

impl MethodInfo {
    pub fn is_static(&self) -> bool {
        self.access_flags & ACC_STATIC != 0
    }
}

/// One entry of the InnerClasses attribute table. Anonymous classes carry no
/// inner name and are intentionally skipped by nested-class discovery.
#[derive(Debug, Clone, Serialize)]
pub struct InnerClassInfo {
    pub inner: String,
    pub outer: Option<String>,
    pub inner_name: Option<String>,
    pub access_flags: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationInfo {
    pub type_name: String,
    pub values: Vec<(String, AnnotationValue)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnnotationValue {
    Int(i64),
    Float(f64),
    Boolean(bool),
    Char(char),
    Str(String),
    Enum { type_name: String, constant: String },
    Class(String),
    Nested(AnnotationInfo),
    Array(Vec<AnnotationValue>),
}

pub fn parse_class(bytes: &[u8]) -> Result<ClassDescriptor, ClassParseError> {
    let mut reader = ClassReader::new(bytes);
    reader.expect_magic()?;
    let _minor_version = reader.read_u2()?;
    let _major_version = reader.read_u2()?;
    let pool = ConstantPool::parse(&mut reader)?;

    let access_flags = reader.read_u2()?;
    let this_class = reader.read_u2()?;
    let super_class = reader.read_u2()?;

    let interfaces_count = reader.read_u2()?;
    let mut interfaces = Vec::with_capacity(interfaces_count as usize);
    for _ in 0..interfaces_count {
        let index = reader.read_u2()?;
        interfaces.push(binary_to_dotted(pool.class_name(index)?));
    }

    let fields_count = reader.read_u2()?;
    let mut fields = Vec::with_capacity(fields_count as usize);
    for _ in 0..fields_count {
        fields.push(parse_field(&mut reader, &pool)?);
    }

    let methods_count = reader.read_u2()?;
    let mut methods = Vec::with_capacity(methods_count as usize);
    for _ in 0..methods_count {
        methods.push(parse_method(&mut reader, &pool)?);
    }

    let mut annotations = Vec::new();
    let mut inner_classes = Vec::new();
    let attributes_count = reader.read_u2()?;
    for _ in 0..attributes_count {
        let name_index = reader.read_u2()?;
        let length = reader.read_u4()? as usize;
        match pool.utf8(name_index)? {
            "RuntimeVisibleAnnotations" => {
                let slice = reader.read_slice(length)?;
                annotations = parse_annotations(&mut ClassReader::new(slice), &pool)?;
            }
            "InnerClasses" => {
                let slice = reader.read_slice(length)?;
                inner_classes = parse_inner_classes(&mut ClassReader::new(slice), &pool)?;
            }
            _ => reader.skip(length)?,
        }
    }

    let name = binary_to_dotted(pool.class_name(this_class)?);
    let superclass = if super_class == 0 {
        None
    } else {
        Some(binary_to_dotted(pool.class_name(super_class)?))
    };

    Ok(ClassDescriptor {
        name,
        access_flags,
        superclass,
        interfaces,
        fields,
        methods,
        annotations,
        inner_classes,
    })
}

fn parse_field(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
) -> Result<FieldInfo, ClassParseError> {
    let access_flags = reader.read_u2()?;
    let name = pool.utf8(reader.read_u2()?)?.to_string();
    let descriptor = pool.utf8(reader.read_u2()?)?.to_string();
    let type_name = descriptor::parse_field_descriptor(&descriptor)?;

    let mut annotations = Vec::new();
    let attributes_count = reader.read_u2()?;
    for _ in 0..attributes_count {
        let name_index = reader.read_u2()?;
        let length = reader.read_u4()? as usize;
        if pool.utf8(name_index)? == "RuntimeVisibleAnnotations" {
            let slice = reader.read_slice(length)?;
            annotations = parse_annotations(&mut ClassReader::new(slice), pool)?;
        } else {
            reader.skip(length)?;
        }
    }

    Ok(FieldInfo {
        name,
        access_flags,
        descriptor,
        type_name,
        annotations,
    })
}

fn parse_method(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
) -> Result<MethodInfo, ClassParseError> {
    let access_flags = reader.read_u2()?;
    let name = pool.utf8(reader.read_u2()?)?.to_string();
    let descriptor = pool.utf8(reader.read_u2()?)?.to_string();
    let signature = descriptor::parse_method_descriptor(&descriptor)?;

    let mut annotations = Vec::new();
    let mut parameter_annotations = Vec::new();
    let attributes_count = reader.read_u2()?;
    for _ in 0..attributes_count {
        let name_index = reader.read_u2()?;
        let length = reader.read_u4()? as usize;
        match pool.utf8(name_index)? {
            "RuntimeVisibleAnnotations" => {
                let slice = reader.read_slice(length)?;
                annotations = parse_annotations(&mut ClassReader::new(slice), pool)?;
            }
            "RuntimeVisibleParameterAnnotations" => {
                let slice = reader.read_slice(length)?;
                let mut sub = ClassReader::new(slice);
                let num_parameters = sub.read_u1()?;
                for _ in 0..num_parameters {
                    parameter_annotations.push(parse_annotations(&mut sub, pool)?);
                }
            }
            _ => reader.skip(length)?,
        }
    }

    Ok(MethodInfo {
        name,
        access_flags,
        descriptor,
        signature,
        annotations,
        parameter_annotations,
    })
}

fn parse_inner_classes(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
) -> Result<Vec<InnerClassInfo>, ClassParseError> {
    let count = reader.read_u2()?;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let inner_index = reader.read_u2()?;
        let outer_index = reader.read_u2()?;
        let name_index = reader.read_u2()?;
        let access_flags = reader.read_u2()?;

        let inner = binary_to_dotted(pool.class_name(inner_index)?);
        let outer = if outer_index == 0 {
            None
        } else {
            Some(binary_to_dotted(pool.class_name(outer_index)?))
        };
        let inner_name = if name_index == 0 {
            None
        } else {
            Some(pool.utf8(name_index)?.to_string())
        };

        entries.push(InnerClassInfo {
            inner,
            outer,
            inner_name,
            access_flags,
        });
    }
    Ok(entries)
}

fn parse_annotations(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
) -> Result<Vec<AnnotationInfo>, ClassParseError> {
    let count = reader.read_u2()?;
    let mut annotations = Vec::with_capacity(count as usize);
    for _ in 0..count {
        annotations.push(parse_annotation(reader, pool)?);
    }
    Ok(annotations)
}

fn parse_annotation(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
) -> Result<AnnotationInfo, ClassParseError> {
    let type_descriptor = pool.utf8(reader.read_u2()?)?;
    let type_name = annotation_type_name(type_descriptor)?;

    let pair_count = reader.read_u2()?;
    let mut values = Vec::with_capacity(pair_count as usize);
    for _ in 0..pair_count {
        let element_name = pool.utf8(reader.read_u2()?)?.to_string();
        let value = parse_element_value(reader, pool)?;
        values.push((element_name, value));
    }

    Ok(AnnotationInfo { type_name, values })
}

fn parse_element_value(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
) -> Result<AnnotationValue, ClassParseError> {
    let tag = reader.read_u1()?;
    let value = match tag {
        b'B' | b'S' | b'I' => AnnotationValue::Int(pool.integer(reader.read_u2()?)? as i64),
        b'J' => AnnotationValue::Int(pool.long(reader.read_u2()?)?),
        b'F' => AnnotationValue::Float(pool.float(reader.read_u2()?)? as f64),
        b'D' => AnnotationValue::Float(pool.double(reader.read_u2()?)?),
        b'Z' => AnnotationValue::Boolean(pool.integer(reader.read_u2()?)? != 0),
        b'C' => {
            let code = pool.integer(reader.read_u2()?)? as u32;
            AnnotationValue::Char(char::from_u32(code).unwrap_or('\u{fffd}'))
        }
        b's' => AnnotationValue::Str(pool.utf8(reader.read_u2()?)?.to_string()),
        b'e' => {
            let type_descriptor = pool.utf8(reader.read_u2()?)?;
            let constant = pool.utf8(reader.read_u2()?)?.to_string();
            AnnotationValue::Enum {
                type_name: annotation_type_name(type_descriptor)?,
                constant,
            }
        }
        b'c' => {
            let class_descriptor = pool.utf8(reader.read_u2()?)?;
            let display = if class_descriptor == "V" {
                "void".to_string()
            } else {
                descriptor::parse_field_descriptor(class_descriptor)?.display()
            };
            AnnotationValue::Class(display)
        }
        b'@' => AnnotationValue::Nested(parse_annotation(reader, pool)?),
        b'[' => {
            let count = reader.read_u2()?;
            let mut values = Vec::with_capacity(count as usize);
            for _ in 0..count {
                values.push(parse_element_value(reader, pool)?);
            }
            AnnotationValue::Array(values)
        }
        other => {
            return Err(ClassParseError::UnsupportedAnnotationTag { tag: other as char });
        }
    };
    Ok(value)
}

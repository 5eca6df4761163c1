//! JVM type descriptors.
//!
//! Class files name types in two forms: internal binary names
//! (`java/lang/Object`) and single-character primitive codes inside field and
//! method descriptors (`I`, `Ljava/lang/String;`, `[J`). The model speaks
//! dotted names at its boundary; this module owns the translation.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("empty descriptor")]
    Empty,
    #[error("unexpected descriptor tag '{0}'")]
    UnexpectedTag(char),
    #[error("unterminated reference descriptor: {0}")]
    Unterminated(String),
    #[error("trailing bytes in descriptor: {0}")]
    Trailing(String),
    #[error("expected '{expected}' in descriptor {descriptor}")]
    Expected { expected: char, descriptor: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl Primitive {
    /// Fixed table: descriptor code to primitive. Used throughout field and
    /// parameter type resolution.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            b'B' => Some(Self::Byte),
            b'C' => Some(Self::Char),
            b'D' => Some(Self::Double),
            b'F' => Some(Self::Float),
            b'I' => Some(Self::Int),
            b'J' => Some(Self::Long),
            b'S' => Some(Self::Short),
            b'Z' => Some(Self::Boolean),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "byte" => Some(Self::Byte),
            "char" => Some(Self::Char),
            "double" => Some(Self::Double),
            "float" => Some(Self::Float),
            "int" => Some(Self::Int),
            "long" => Some(Self::Long),
            "short" => Some(Self::Short),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            Self::Byte => 'B',
            Self::Char => 'C',
            Self::Double => 'D',
            Self::Float => 'F',
            Self::Int => 'I',
            Self::Long => 'J',
            Self::Short => 'S',
            Self::Boolean => 'Z',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Double => "double",
            Self::Float => "float",
            Self::Int => "int",
            Self::Long => "long",
            Self::Short => "short",
            Self::Boolean => "boolean",
        }
    }

    /// Primitives stand in for their boxed JDK wrapper types.
    pub fn boxed(self) -> &'static str {
        match self {
            Self::Byte => "java.lang.Byte",
            Self::Char => "java.lang.Character",
            Self::Double => "java.lang.Double",
            Self::Float => "java.lang.Float",
            Self::Int => "java.lang.Integer",
            Self::Long => "java.lang.Long",
            Self::Short => "java.lang.Short",
            Self::Boolean => "java.lang.Boolean",
        }
    }
}

/// A parsed type position inside a field or method descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "form", rename_all = "lowercase")]
pub enum TypeName {
    Primitive { primitive: Primitive },
    Reference { name: String },
    Array { element: Box<TypeName>, dimensions: usize },
    Void,
}

impl TypeName {
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Reference { name: name.into() }
    }

    /// Dotted display form, `int`, `java.lang.String`, `long[][]`.
    pub fn display(&self) -> String {
        match self {
            Self::Primitive { primitive } => primitive.name().to_string(),
            Self::Reference { name } => name.clone(),
            Self::Array {
                element,
                dimensions,
            } => {
                let mut out = element.display();
                for _ in 0..*dimensions {
                    out.push_str("[]");
                }
                out
            }
            Self::Void => "void".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodSignature {
    pub parameters: Vec<TypeName>,
    pub return_type: TypeName,
}

pub fn binary_to_dotted(binary: &str) -> String {
    binary.replace('/', ".")
}

pub fn dotted_to_binary(dotted: &str) -> String {
    dotted.replace('.', "/")
}

/// Dotted class name to the classpath resource path that backs it.
pub fn class_resource_path(dotted: &str) -> String {
    format!("{}.class", dotted_to_binary(dotted))
}

pub fn parse_field_descriptor(descriptor: &str) -> Result<TypeName, DescriptorError> {
    let mut parser = DescriptorParser::new(descriptor);
    let ty = parser.parse_type()?;
    if parser.remaining() != 0 {
        return Err(DescriptorError::Trailing(descriptor.to_string()));
    }
    Ok(ty)
}

pub fn parse_method_descriptor(descriptor: &str) -> Result<MethodSignature, DescriptorError> {
    let mut parser = DescriptorParser::new(descriptor);
    parser.expect('(')?;
    let mut parameters = Vec::new();
    while !parser.peek_char(')')? {
        parameters.push(parser.parse_type()?);
    }
    parser.expect(')')?;
    let return_type = if parser.peek_char('V')? {
        parser.advance(1);
        TypeName::Void
    } else {
        parser.parse_type()?
    };

    if parser.remaining() != 0 {
        return Err(DescriptorError::Trailing(descriptor.to_string()));
    }

    Ok(MethodSignature {
        parameters,
        return_type,
    })
}

/// Annotation type descriptors are plain field descriptors (`Lcom/x/Foo;`);
/// resolve one to its dotted name.
pub fn annotation_type_name(descriptor: &str) -> Result<String, DescriptorError> {
    match parse_field_descriptor(descriptor)? {
        TypeName::Reference { name } => Ok(name),
        other => Err(DescriptorError::UnexpectedTag(
            other.display().chars().next().unwrap_or('?'),
        )),
    }
}

struct DescriptorParser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> DescriptorParser<'a> {
    fn new(descriptor: &'a str) -> Self {
        Self {
            bytes: descriptor.as_bytes(),
            pos: 0,
        }
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    fn expect(&mut self, ch: char) -> Result<(), DescriptorError> {
        if self.remaining() < 1 || self.bytes[self.pos] != ch as u8 {
            return Err(DescriptorError::Expected {
                expected: ch,
                descriptor: String::from_utf8_lossy(self.bytes).to_string(),
            });
        }
        self.pos += 1;
        Ok(())
    }

    fn advance(&mut self, count: usize) {
        self.pos += count;
    }

    fn peek_char(&self, ch: char) -> Result<bool, DescriptorError> {
        if self.remaining() < 1 {
            return Err(DescriptorError::Empty);
        }
        Ok(self.bytes[self.pos] == ch as u8)
    }

    fn parse_type(&mut self) -> Result<TypeName, DescriptorError> {
        if self.remaining() == 0 {
            return Err(DescriptorError::Empty);
        }

        let start = self.bytes[self.pos];
        if let Some(primitive) = Primitive::from_code(start) {
            self.pos += 1;
            return Ok(TypeName::Primitive { primitive });
        }

        match start {
            b'L' => self.parse_reference_type(),
            b'[' => self.parse_array_type(),
            other => Err(DescriptorError::UnexpectedTag(other as char)),
        }
    }

    fn parse_reference_type(&mut self) -> Result<TypeName, DescriptorError> {
        self.expect('L')?;
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b';' {
            self.pos += 1;
        }
        if self.pos >= self.bytes.len() {
            return Err(DescriptorError::Unterminated(
                String::from_utf8_lossy(self.bytes).to_string(),
            ));
        }
        let name = String::from_utf8_lossy(&self.bytes[start..self.pos]).to_string();
        self.pos += 1;
        Ok(TypeName::Reference {
            name: binary_to_dotted(&name),
        })
    }

    fn parse_array_type(&mut self) -> Result<TypeName, DescriptorError> {
        let mut dimensions = 0;
        while self.remaining() > 0 && self.bytes[self.pos] == b'[' {
            dimensions += 1;
            self.pos += 1;
        }
        let element = self.parse_type()?;
        Ok(TypeName::Array {
            element: Box::new(element),
            dimensions,
        })
    }
}

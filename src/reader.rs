//! Low-level class file reading: a big-endian byte cursor and the constant
//! pool. Constant values (integers, floats, strings) are retained because the
//! annotation attributes reference them; everything else structural stays as
//! indices resolved on demand.

use crate::classfile::ClassParseError;

pub const MAGIC: u32 = 0xCAFEBABE;

#[derive(Debug, Clone)]
pub enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String { utf8_index: u16 },
    Other,
    /// Index 0 and the upper halves of 8-byte constants.
    Unusable,
}

pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    pub fn parse(reader: &mut ClassReader<'_>) -> Result<Self, ClassParseError> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable);

        let mut index = 1;
        while index < count {
            let tag = reader.read_u1()?;
            let entry = match tag {
                1 => {
                    let length = reader.read_u2()? as usize;
                    let bytes = reader.read_slice(length)?;
                    Constant::Utf8(String::from_utf8(bytes.to_vec())?)
                }
                3 => Constant::Integer(reader.read_u4()? as i32),
                4 => Constant::Float(f32::from_bits(reader.read_u4()?)),
                5 => {
                    let value = Constant::Long(reader.read_u8()? as i64);
                    entries.push(value);
                    entries.push(Constant::Unusable);
                    index += 2;
                    continue;
                }
                6 => {
                    let value = Constant::Double(f64::from_bits(reader.read_u8()?));
                    entries.push(value);
                    entries.push(Constant::Unusable);
                    index += 2;
                    continue;
                }
                7 => Constant::Class {
                    name_index: reader.read_u2()?,
                },
                8 => Constant::String {
                    utf8_index: reader.read_u2()?,
                },
                9 | 10 | 11 | 12 | 17 | 18 => {
                    reader.skip(4)?;
                    Constant::Other
                }
                15 => {
                    reader.skip(3)?;
                    Constant::Other
                }
                16 | 19 | 20 => {
                    reader.skip(2)?;
                    Constant::Other
                }
                other => return Err(ClassParseError::UnsupportedConstant { tag: other }),
            };

            entries.push(entry);
            index += 1;
        }

        Ok(Self { entries })
    }

    fn get(&self, index: u16) -> Result<&Constant, ClassParseError> {
        self.entries
            .get(index as usize)
            .ok_or(ClassParseError::InvalidConstantIndex { index })
    }

    pub fn utf8(&self, index: u16) -> Result<&str, ClassParseError> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value.as_str()),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    /// Internal (slash-form) name behind a CONSTANT_Class entry.
    pub fn class_name(&self, index: u16) -> Result<&str, ClassParseError> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    pub fn integer(&self, index: u16) -> Result<i32, ClassParseError> {
        match self.get(index)? {
            Constant::Integer(v) => Ok(*v),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    pub fn long(&self, index: u16) -> Result<i64, ClassParseError> {
        match self.get(index)? {
            Constant::Long(v) => Ok(*v),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    pub fn float(&self, index: u16) -> Result<f32, ClassParseError> {
        match self.get(index)? {
            Constant::Float(v) => Ok(*v),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    pub fn double(&self, index: u16) -> Result<f64, ClassParseError> {
        match self.get(index)? {
            Constant::Double(v) => Ok(*v),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }
}

pub struct ClassReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ClassReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn expect_magic(&mut self) -> Result<(), ClassParseError> {
        if self.read_u4()? != MAGIC {
            return Err(ClassParseError::InvalidMagic);
        }
        Ok(())
    }

    pub fn read_u1(&mut self) -> Result<u8, ClassParseError> {
        if self.pos >= self.data.len() {
            return Err(ClassParseError::UnexpectedEof);
        }
        let value = self.data[self.pos];
        self.pos += 1;
        Ok(value)
    }

    pub fn read_u2(&mut self) -> Result<u16, ClassParseError> {
        let bytes = self.read_slice(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u4(&mut self) -> Result<u32, ClassParseError> {
        let bytes = self.read_slice(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_u8(&mut self) -> Result<u64, ClassParseError> {
        let high = self.read_u4()? as u64;
        let low = self.read_u4()? as u64;
        Ok((high << 32) | low)
    }

    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], ClassParseError> {
        if self.pos + len > self.data.len() {
            return Err(ClassParseError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), ClassParseError> {
        if self.pos + len > self.data.len() {
            return Err(ClassParseError::UnexpectedEof);
        }
        self.pos += len;
        Ok(())
    }
}

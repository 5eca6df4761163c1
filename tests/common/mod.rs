#![allow(dead_code)]

//! Test support: a minimal class file emitter and jar/temp-dir helpers.
//!
//! The emitter writes just enough of the binary format for the scanner to
//! parse: constant pool (Utf8 and Class entries), members, runtime-visible
//! annotations with string element values, and the InnerClasses table.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::CompressionMethod;
use zip::write::FileOptions;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_SUPER: u16 = 0x0020;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_ANNOTATION: u16 = 0x2000;

pub fn temp_dir(prefix: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!(
        "{prefix}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).unwrap();
    p
}

/// Write class bytes under a directory root at the resource path derived
/// from the binary (slash-form) name.
pub fn write_class(root: &Path, binary_name: &str, bytes: &[u8]) -> PathBuf {
    let path = root.join(format!("{binary_name}.class"));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, bytes).unwrap();
    path
}

pub fn write_jar(path: &Path, entries: &[(&str, Vec<u8>)]) {
    let file = File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, bytes) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap();
}

pub struct ClassFileBuilder {
    constants: Vec<Vec<u8>>,
    utf8_cache: HashMap<String, u16>,
    class_cache: HashMap<String, u16>,
    access_flags: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<Vec<u8>>,
    methods: Vec<Vec<u8>>,
    class_annotations: Vec<Vec<u8>>,
    inner_classes: Vec<[u16; 4]>,
}

impl ClassFileBuilder {
    pub fn new(binary_name: &str) -> Self {
        let mut builder = Self {
            constants: Vec::new(),
            utf8_cache: HashMap::new(),
            class_cache: HashMap::new(),
            access_flags: ACC_PUBLIC | ACC_SUPER,
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            class_annotations: Vec::new(),
            inner_classes: Vec::new(),
        };
        builder.this_class = builder.class(binary_name);
        builder.super_class = builder.class("java/lang/Object");
        builder
    }

    pub fn flags(mut self, access_flags: u16) -> Self {
        self.access_flags = access_flags;
        self
    }

    pub fn implements(mut self, binary_name: &str) -> Self {
        let index = self.class(binary_name);
        self.interfaces.push(index);
        self
    }

    /// Class-level marker annotation, e.g. `Lorg/example/Marked;`.
    pub fn annotate(self, type_descriptor: &str) -> Self {
        self.annotate_values(type_descriptor, &[])
    }

    /// Class-level annotation with string element values.
    pub fn annotate_values(mut self, type_descriptor: &str, values: &[(&str, &str)]) -> Self {
        let annotation = self.annotation(type_descriptor, values);
        self.class_annotations.push(annotation);
        self
    }

    pub fn field(self, name: &str, descriptor: &str) -> Self {
        self.field_annotated(name, descriptor, None)
    }

    pub fn field_annotated(
        mut self,
        name: &str,
        descriptor: &str,
        annotation_descriptor: Option<&str>,
    ) -> Self {
        let attrs = match annotation_descriptor {
            Some(desc) => {
                let annotation = self.annotation(desc, &[]);
                vec![self.annotations_attribute(&[annotation])]
            }
            None => Vec::new(),
        };
        let member = self.member(0, name, descriptor, attrs);
        self.fields.push(member);
        self
    }

    pub fn method(self, name: &str, descriptor: &str) -> Self {
        self.method_flags(name, descriptor, ACC_PUBLIC)
    }

    pub fn method_flags(mut self, name: &str, descriptor: &str, access_flags: u16) -> Self {
        let member = self.member(access_flags, name, descriptor, Vec::new());
        self.methods.push(member);
        self
    }

    pub fn method_annotated(
        mut self,
        name: &str,
        descriptor: &str,
        annotation_descriptor: &str,
    ) -> Self {
        let annotation = self.annotation(annotation_descriptor, &[]);
        let attr = self.annotations_attribute(&[annotation]);
        let member = self.member(ACC_PUBLIC, name, descriptor, vec![attr]);
        self.methods.push(member);
        self
    }

    /// A method whose first parameter carries one annotation; the remaining
    /// parameters get empty annotation lists.
    pub fn method_param_annotated(
        mut self,
        name: &str,
        descriptor: &str,
        num_params: u8,
        annotation_descriptor: &str,
    ) -> Self {
        let annotation = self.annotation(annotation_descriptor, &[]);
        let mut payload = vec![num_params];
        payload.extend_from_slice(&1u16.to_be_bytes());
        payload.extend_from_slice(&annotation);
        for _ in 1..num_params {
            payload.extend_from_slice(&0u16.to_be_bytes());
        }
        let attr = self.attribute("RuntimeVisibleParameterAnnotations", &payload);
        let member = self.member(ACC_PUBLIC, name, descriptor, vec![attr]);
        self.methods.push(member);
        self
    }

    /// One entry of the InnerClasses table. `outer` and `inner_name` absent
    /// models an anonymous class entry.
    pub fn inner_class(
        mut self,
        inner_binary: &str,
        outer_binary: Option<&str>,
        inner_name: Option<&str>,
        access_flags: u16,
    ) -> Self {
        let inner = self.class(inner_binary);
        let outer = outer_binary.map(|o| self.class(o)).unwrap_or(0);
        let name = inner_name.map(|n| self.utf8(n)).unwrap_or(0);
        self.inner_classes.push([inner, outer, name, access_flags]);
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        let mut tail = Vec::new();
        if !self.class_annotations.is_empty() {
            let annotations = std::mem::take(&mut self.class_annotations);
            tail.push(self.annotations_attribute(&annotations));
        }
        if !self.inner_classes.is_empty() {
            let entries = std::mem::take(&mut self.inner_classes);
            let mut payload = (entries.len() as u16).to_be_bytes().to_vec();
            for entry in entries {
                for word in entry {
                    payload.extend_from_slice(&word.to_be_bytes());
                }
            }
            tail.push(self.attribute("InnerClasses", &payload));
        }

        let mut out = 0xCAFEBABEu32.to_be_bytes().to_vec();
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&52u16.to_be_bytes());
        out.extend_from_slice(&((self.constants.len() as u16) + 1).to_be_bytes());
        for entry in &self.constants {
            out.extend_from_slice(entry);
        }
        out.extend_from_slice(&self.access_flags.to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        out.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for index in &self.interfaces {
            out.extend_from_slice(&index.to_be_bytes());
        }
        out.extend_from_slice(&(self.fields.len() as u16).to_be_bytes());
        for field in &self.fields {
            out.extend_from_slice(field);
        }
        out.extend_from_slice(&(self.methods.len() as u16).to_be_bytes());
        for method in &self.methods {
            out.extend_from_slice(method);
        }
        out.extend_from_slice(&(tail.len() as u16).to_be_bytes());
        for attr in &tail {
            out.extend_from_slice(attr);
        }
        out
    }

    fn utf8(&mut self, value: &str) -> u16 {
        if let Some(&index) = self.utf8_cache.get(value) {
            return index;
        }
        let mut entry = vec![1u8];
        entry.extend_from_slice(&(value.len() as u16).to_be_bytes());
        entry.extend_from_slice(value.as_bytes());
        self.constants.push(entry);
        let index = self.constants.len() as u16;
        self.utf8_cache.insert(value.to_string(), index);
        index
    }

    fn class(&mut self, binary_name: &str) -> u16 {
        if let Some(&index) = self.class_cache.get(binary_name) {
            return index;
        }
        let name_index = self.utf8(binary_name);
        let mut entry = vec![7u8];
        entry.extend_from_slice(&name_index.to_be_bytes());
        self.constants.push(entry);
        let index = self.constants.len() as u16;
        self.class_cache.insert(binary_name.to_string(), index);
        index
    }

    fn annotation(&mut self, type_descriptor: &str, values: &[(&str, &str)]) -> Vec<u8> {
        let type_index = self.utf8(type_descriptor);
        let mut out = type_index.to_be_bytes().to_vec();
        out.extend_from_slice(&(values.len() as u16).to_be_bytes());
        for (name, value) in values {
            let name_index = self.utf8(name);
            let value_index = self.utf8(value);
            out.extend_from_slice(&name_index.to_be_bytes());
            out.push(b's');
            out.extend_from_slice(&value_index.to_be_bytes());
        }
        out
    }

    fn annotations_attribute(&mut self, annotations: &[Vec<u8>]) -> Vec<u8> {
        let mut payload = (annotations.len() as u16).to_be_bytes().to_vec();
        for annotation in annotations {
            payload.extend_from_slice(annotation);
        }
        self.attribute("RuntimeVisibleAnnotations", &payload)
    }

    fn attribute(&mut self, name: &str, payload: &[u8]) -> Vec<u8> {
        let name_index = self.utf8(name);
        let mut out = name_index.to_be_bytes().to_vec();
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn member(&mut self, access_flags: u16, name: &str, descriptor: &str, attrs: Vec<Vec<u8>>) -> Vec<u8> {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        let mut out = access_flags.to_be_bytes().to_vec();
        out.extend_from_slice(&name_index.to_be_bytes());
        out.extend_from_slice(&descriptor_index.to_be_bytes());
        out.extend_from_slice(&(attrs.len() as u16).to_be_bytes());
        for attr in attrs {
            out.extend_from_slice(&attr);
        }
        out
    }
}

//! # class-scanner
//!
//! Bytecode-level Java classpath scanning: parse compiled class files without
//! loading them into a JVM, build a navigable element model, and traverse it
//! with filters and visitors.
//!
//! ## Architecture
//!
//! - **classpath**: ordered roots (directories and jars), first-match-wins
//!   class lookup, resource listing, jar discovery
//! - **reader**: big-endian class file cursor and constant pool
//! - **classfile**: structural parse into a class descriptor, including
//!   annotations and the InnerClasses table
//! - **descriptor**: JVM type descriptors, primitive code table and
//!   slash/dot name translation
//! - **model**: immutable element model (packages, types, operations,
//!   fields, parameters, annotations) with explicit two-phase resolution
//! - **filter**: composable predicates over parsed types
//! - **visit**: deterministic deep pre-order traversal with visitors
//! - **project**: root expansion, parallel parse, post-parse filtering
//! - **bindings**: annotation-driven conversion-method discovery over
//!   the model
//! - **error**: resolution / access / structural-mismatch failure taxonomy

pub mod bindings;
pub mod classfile;
pub mod classpath;
pub mod cli;
pub mod descriptor;
pub mod error;
pub mod filter;
pub mod model;
pub mod project;
pub mod reader;
pub mod visit;

//! The projector: expands classpath roots into candidate binary resources,
//! parses every candidate, and only then evaluates filters, so that a filter
//! decision is always made on the parsed descriptor rather than on file
//! names. Parsing fans out across a rayon pool; results are collected and
//! sorted before filters and visitors run on the caller's thread, which keeps
//! the observable order deterministic.

use rayon::prelude::*;

use crate::classfile;
use crate::classpath::ClasspathResolver;
use crate::error::{ScanError, ScanResult};
use crate::filter::TypeFilter;
use crate::model::Type;
use crate::visit::{Visitor, Walker};

pub struct Projector<'a> {
    resolver: &'a ClasspathResolver,
}

/// A matched type together with where its bytes came from.
#[derive(Debug, Clone)]
pub struct Projection {
    pub ty: Type,
    pub origin: String,
    pub content_hash: String,
}

impl<'a> Projector<'a> {
    pub fn new(resolver: &'a ClasspathResolver) -> Self {
        Self { resolver }
    }

    /// Parse every discoverable class and keep the ones the filter accepts,
    /// sorted by name. A malformed candidate aborts the projection; a class
    /// file that cannot be parsed is a classpath problem, not a skippable
    /// entry.
    pub fn collect(&self, filter: &dyn TypeFilter) -> ScanResult<Vec<Projection>> {
        let entries = self.resolver.list_classes()?;

        let mut parsed: Vec<Projection> = entries
            .par_iter()
            .map(|entry| {
                let resource = self.resolver.find_class(&entry.name)?;
                let descriptor = classfile::parse_class(&resource.bytes).map_err(|source| {
                    ScanError::Malformed {
                        origin: resource.origin.clone(),
                        source,
                    }
                })?;
                Ok(Projection {
                    ty: Type::from_descriptor(descriptor),
                    content_hash: resource.content_hash(),
                    origin: resource.origin,
                })
            })
            .collect::<ScanResult<Vec<_>>>()?;

        parsed.sort_by(|a, b| a.ty.name.cmp(&b.ty.name));
        parsed.retain(|p| filter.matches(&p.ty));
        Ok(parsed)
    }

    /// Filtered deep traversal: every match is walked in the contract order,
    /// with one shared visited set so a type reachable from several matches
    /// is visited once.
    pub fn project(&self, filter: &dyn TypeFilter, visitor: &mut dyn Visitor) -> ScanResult<usize> {
        let matches = self.collect(filter)?;
        let mut walker = Walker::new(self.resolver);
        for projection in &matches {
            walker.walk_type(&projection.ty, visitor)?;
        }
        Ok(matches.len())
    }
}

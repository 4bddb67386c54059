use log::debug;

use crate::error::Result;
use crate::multipolygon::{MultipolygonResolver, Resolution};
use crate::element::Relation;
use crate::utils::parallel;

/// Relations are expensive enough to hand even small batches to the thread pool.
const PARALLEL_THRESHOLD: usize = 4;

/// Resolves many relations of one tile, in parallel with the `parallel` feature.
///
/// Every relation owns its coordinates, so the resolutions share nothing but the
/// read-only resolver.
pub struct BatchResolver {
    resolver: MultipolygonResolver,
    relations: Vec<Relation>,
}

impl BatchResolver {
    pub fn new(resolver: MultipolygonResolver) -> Self {
        Self { resolver, relations: Vec::new() }
    }

    pub fn add_relation(&mut self, relation: Relation) {
        self.relations.push(relation);
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// One result per relation, in the order they were added.
    pub fn resolve_all(&self) -> Vec<Result<Resolution>> {
        debug!("resolving {} relations", self.relations.len());
        parallel::map(&self.relations, PARALLEL_THRESHOLD, |relation| {
            self.resolver.resolve(relation)
        })
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;

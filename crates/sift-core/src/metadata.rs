use crate::path::{Cardinality, EntityType};

///
/// EntityMetadata
///
/// Capability boundary to the external entity-metadata dictionary.
/// Path construction and to-many detection consume only this one
/// lookup; the dictionary's structure stays out of this core.
///

pub trait EntityMetadata {
    /// Relationship multiplicity of `field` on `entity`.
    /// Plain attribute fields resolve to `Cardinality::None`.
    fn cardinality(&self, entity: EntityType, field: &str) -> Cardinality;
}

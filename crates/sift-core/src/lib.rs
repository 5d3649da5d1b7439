//! Leaf predicates for a boolean filter-expression engine: traversal
//! paths across relationship boundaries, the closed operator taxonomy
//! (contextualization and negation), and the collision-free alias and
//! parameter naming a query generator consumes.
//!
//! Predicates are plain value objects: every derived accessor is pure,
//! `negate` is the only mutator, and a clone is structurally
//! independent of its original. Composite AND/OR/NOT trees, runtime
//! object-graph resolution, and query-text generation live outside
//! this crate and plug in through the visitor, `RuntimeContext`, and
//! `EntityMetadata` seams.

pub mod expr;
pub mod metadata;
pub mod operator;
pub mod path;
pub mod predicate;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        expr::{FilterExpression, FilterVisitor},
        metadata::EntityMetadata,
        operator::{FieldLookup, FieldSource, Operator, RuntimeContext},
        path::{Cardinality, EntityType, PathStep, TraversalPath},
        predicate::FilterPredicate,
        value::Value,
    };
}

//! Shared fixtures for unit and property tests.

use crate::{
    metadata::EntityMetadata,
    operator::{FieldLookup, FieldSource, RuntimeContext},
    path::{Cardinality, EntityType},
    value::Value,
};
use std::collections::BTreeMap;

///
/// TestRow
///
/// In-memory entity exposing fields by name.
///

pub(crate) struct TestRow {
    fields: BTreeMap<String, Value>,
}

impl TestRow {
    pub(crate) fn new(entries: impl IntoIterator<Item = (&'static str, Value)>) -> Self {
        Self {
            fields: entries
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }
}

impl FieldSource for TestRow {
    fn field(&self, name: &str) -> FieldLookup {
        match self.fields.get(name) {
            Some(value) => FieldLookup::Present(value.clone()),
            None => FieldLookup::Missing,
        }
    }
}

///
/// DirectContext
///
/// Runtime context that reads the full dotted path as a single row
/// field, which is all the flattened test rows need.
///

pub(crate) struct DirectContext;

impl RuntimeContext for DirectContext {
    fn resolve(&self, entity: &dyn FieldSource, field_path: &str) -> FieldLookup {
        entity.field(field_path)
    }
}

///
/// MapMetadata
///
/// Entity-metadata source backed by a plain map. Unlisted fields
/// resolve as plain attributes.
///

pub(crate) struct MapMetadata {
    cardinalities: BTreeMap<(String, String), Cardinality>,
}

impl MapMetadata {
    pub(crate) fn new(
        entries: impl IntoIterator<Item = (EntityType, &'static str, Cardinality)>,
    ) -> Self {
        Self {
            cardinalities: entries
                .into_iter()
                .map(|(entity, field, cardinality)| {
                    ((entity.name().to_string(), field.to_string()), cardinality)
                })
                .collect(),
        }
    }
}

impl EntityMetadata for MapMetadata {
    fn cardinality(&self, entity: EntityType, field: &str) -> Cardinality {
        self.cardinalities
            .get(&(entity.name().to_string(), field.to_string()))
            .copied()
            .unwrap_or(Cardinality::None)
    }
}

use crate::metadata::EntityMetadata;
use serde::Serialize;
use thiserror::Error as ThisError;

///
/// EntityType
///
/// Static identifier for an entity type, carrying its qualified name
/// (e.g. `"store::Book"`). The qualified form keeps generated aliases
/// distinct across same-named types in different modules.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct EntityType {
    name: &'static str,
}

impl EntityType {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }

    /// Last segment of the qualified name, for presentation output.
    #[must_use]
    pub fn short_name(self) -> &'static str {
        let tail = self.name.rsplit("::").next().unwrap_or(self.name);
        tail.rsplit('.').next().unwrap_or(tail)
    }

    ///
    /// Normalized name for use in generated query text.
    ///
    /// Path separators collapse to underscores, so the alias will not
    /// collide with other types or with reserved keywords.
    ///
    #[must_use]
    pub fn alias(self) -> String {
        self.name.replace("::", "_").replace('.', "_")
    }
}

///
/// Cardinality
///
/// Relationship multiplicity of a path step. `None` marks a plain
/// attribute field that crosses no relationship.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Cardinality {
    None,
    ToOne,
    ToMany,
}

impl Cardinality {
    #[must_use]
    pub const fn is_to_many(self) -> bool {
        matches!(self, Self::ToMany)
    }

    /// Stable tag byte used by the structural fingerprint stream.
    pub(crate) const fn tag(self) -> u8 {
        match self {
            Self::None => 0x01,
            Self::ToOne => 0x02,
            Self::ToMany => 0x03,
        }
    }
}

///
/// PathStep
///
/// One hop of a traversal path: a field or relationship name anchored
/// on its source type. Cardinality is resolved externally (entity
/// metadata) and cached at construction; it is read-only thereafter.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PathStep {
    source: EntityType,
    field: String,
    cardinality: Cardinality,
}

impl PathStep {
    #[must_use]
    pub fn new(source: EntityType, field: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            source,
            field: field.into(),
            cardinality,
        }
    }

    /// Attribute step that crosses no relationship.
    #[must_use]
    pub fn scalar(source: EntityType, field: impl Into<String>) -> Self {
        Self::new(source, field, Cardinality::None)
    }

    /// Construct a step with its cardinality resolved from metadata.
    #[must_use]
    pub fn resolved(
        metadata: &dyn EntityMetadata,
        source: EntityType,
        field: impl Into<String>,
    ) -> Self {
        let field = field.into();
        let cardinality = metadata.cardinality(source, &field);

        Self {
            source,
            field,
            cardinality,
        }
    }

    #[must_use]
    pub const fn source(&self) -> EntityType {
        self.source
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub const fn cardinality(&self) -> Cardinality {
        self.cardinality
    }
}

///
/// InvalidPathError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("traversal path must contain at least one step")]
pub struct InvalidPathError;

///
/// TraversalPath
///
/// Ordered, non-empty sequence of path steps. Each relationship step's
/// field targets the type the following step is anchored on; the last
/// step names the terminal field being filtered. Cloning deep-copies
/// the step sequence, so a cloned predicate never shares path state
/// with its original.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TraversalPath {
    steps: Vec<PathStep>,
}

impl TraversalPath {
    pub fn new(steps: Vec<PathStep>) -> Result<Self, InvalidPathError> {
        if steps.is_empty() {
            return Err(InvalidPathError);
        }

        Ok(Self { steps })
    }

    /// Wrap a single step as a one-hop path.
    #[must_use]
    pub fn single(step: PathStep) -> Self {
        Self { steps: vec![step] }
    }

    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Field name of the last step.
    #[must_use]
    pub fn terminal_field(&self) -> &str {
        // Non-empty by construction.
        self.steps[self.steps.len() - 1].field()
    }

    /// Step field names joined by `.` (e.g. `author.address.city`).
    #[must_use]
    pub fn dotted_field_path(&self) -> String {
        let mut out = String::new();
        for step in &self.steps {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(step.field());
        }

        out
    }

    /// Source type of the first step.
    #[must_use]
    pub fn root_type(&self) -> EntityType {
        // Non-empty by construction.
        self.steps[0].source()
    }

    /// True if any step crosses a to-many relationship.
    #[must_use]
    pub fn crosses_to_many(&self) -> bool {
        self.steps
            .iter()
            .any(|step| step.cardinality().is_to_many())
    }
}

///
/// TESTS
///

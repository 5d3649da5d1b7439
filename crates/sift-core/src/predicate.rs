use crate::{
    expr::FilterVisitor,
    metadata::EntityMetadata,
    operator::{BooleanTest, Operator, OperatorArityError, RuntimeContext, UnsupportedNegationError},
    path::{EntityType, PathStep, TraversalPath},
    value::Value,
};
use convert_case::{Case, Casing};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fmt::Write as _;

const UNDERSCORE: char = '_';
const PERIOD: char = '.';

/// Bytes of the structural digest kept for the parameter-name
/// disambiguator. 64 bits is comfortably collision-free within one
/// compiled query.
const FINGERPRINT_BYTES: usize = 8;

///
/// FilterPredicate
///
/// Leaf node of a filter-expression tree: one traversal path bound to
/// one operator and a value list. Derived accessors are pure and
/// recomputed on demand; `negate` is the only mutator. Cloning yields
/// a structurally independent copy (own step sequence, own value
/// list), so negating a clone never touches the original.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FilterPredicate {
    path: TraversalPath,
    operator: Operator,
    values: Vec<Value>,
}

impl FilterPredicate {
    #[must_use]
    pub const fn new(path: TraversalPath, operator: Operator, values: Vec<Value>) -> Self {
        Self {
            path,
            operator,
            values,
        }
    }

    /// Convenience form wrapping a single step as a one-hop path.
    #[must_use]
    pub fn from_step(step: PathStep, operator: Operator, values: Vec<Value>) -> Self {
        Self::new(TraversalPath::single(step), operator, values)
    }

    #[must_use]
    pub const fn path(&self) -> &TraversalPath {
        &self.path
    }

    #[must_use]
    pub const fn operator(&self) -> Operator {
        self.operator
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Terminal field name being filtered.
    #[must_use]
    pub fn field(&self) -> &str {
        self.path.terminal_field()
    }

    /// Dotted terminal field path (e.g. `author.address.city`).
    #[must_use]
    pub fn field_path(&self) -> String {
        self.path.dotted_field_path()
    }

    /// Root type the path is anchored on.
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        self.path.root_type()
    }

    ///
    /// Collision-free base name for positional query parameters.
    ///
    /// Derived from the field path plus a disambiguator hashed from
    /// the predicate's structural identity, so two predicates over the
    /// same field path in the same query never collide. No central
    /// name registry is involved; the name is deterministic for a
    /// given structure.
    ///
    #[must_use]
    pub fn parameter_name_prefix(&self) -> String {
        let mut name = self.field_path().replace(PERIOD, "_");
        name.push(UNDERSCORE);
        name.push_str(&self.fingerprint_hex());

        name
    }

    /// Positional `(name, value)` parameter pairs, preserving the
    /// input value order.
    #[must_use]
    pub fn named_parameters(&self) -> Vec<(String, Value)> {
        let base = self.parameter_name_prefix();

        self.values
            .iter()
            .enumerate()
            .map(|(idx, value)| (format!("{base}_{idx}"), value.clone()))
            .collect()
    }

    ///
    /// Alias naming the source collection the terminal field belongs
    /// to in generated query text.
    ///
    /// A one-step path aliases the root type. A longer path aliases
    /// the second-to-last step's type plus that step's field: the
    /// alias names the edge into the terminal field, not the terminal
    /// type, so sibling predicates walking the same relationship agree
    /// on one alias for the joined collection.
    ///
    #[must_use]
    pub fn alias(&self) -> String {
        let steps = self.path.steps();

        if steps.len() == 1 {
            return steps[0].source().alias();
        }

        let previous = &steps[steps.len() - 2];

        format!("{}_{}", previous.source().alias(), previous.field())
    }

    /// True iff the operator is one of the six string-matching tags.
    #[must_use]
    pub const fn is_matching_operator(&self) -> bool {
        self.operator.is_matching()
    }

    ///
    /// First value in string form with every occurrence of `special`
    /// prefixed by `escape`.
    ///
    /// Only meaningful for matching operators with exactly one text
    /// value; returns `None` when there is no value or the first value
    /// is not text.
    ///
    #[must_use]
    pub fn escaped_string_value(&self, special: &str, escape: &str) -> Option<String> {
        let text = self.values.first()?.text()?;

        Some(text.replace(special, &format!("{escape}{special}")))
    }

    ///
    /// Replace the operator with its logical inverse, in place.
    ///
    /// On an unsupported negation the error propagates unchanged and
    /// the predicate is left exactly as it was.
    ///
    pub fn negate(&mut self) -> Result<(), UnsupportedNegationError> {
        self.operator = self.operator.negated()?;

        Ok(())
    }

    /// Contextualize the operator over this predicate's field path and
    /// values into an executable boolean test.
    pub fn contextualize<'a>(
        &self,
        context: &'a dyn RuntimeContext,
    ) -> Result<BooleanTest<'a>, OperatorArityError> {
        self.operator
            .contextualize(self.field_path(), self.values.clone(), context)
    }

    /// Dispatch to the visitor's leaf-predicate handler. This is the
    /// only way a composite expression tree observes the predicate.
    pub fn accept<V: FilterVisitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_predicate(self)
    }

    /// True if any step of `path` is, per the external metadata
    /// source, a to-many relationship.
    #[must_use]
    pub fn crosses_to_many(metadata: &dyn EntityMetadata, path: &TraversalPath) -> bool {
        path.steps()
            .iter()
            .any(|step| metadata.cardinality(step.source(), step.field()).is_to_many())
    }

    // Hex rendering of the truncated structural digest.
    fn fingerprint_hex(&self) -> String {
        let mut hasher = Sha256::new();
        hash_predicate(&mut hasher, self);

        let digest = hasher.finalize();
        let mut out = String::with_capacity(FINGERPRINT_BYTES * 2);
        for byte in &digest[..FINGERPRINT_BYTES] {
            // Writing to a String cannot fail.
            let _ = write!(out, "{byte:02x}");
        }

        out
    }
}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = self.entity_type().short_name().to_case(Case::Camel);
        f.write_str(&root)?;

        for step in self.path.steps() {
            write!(f, "{PERIOD}{}", step.field())?;
        }

        write!(f, " {} [", self.operator)?;
        for (idx, value) in self.values.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }

        write!(f, "]")
    }
}

///
/// Structural fingerprint stream.
///
/// Tag/length-prefixed canonical encoding of the predicate's identity
/// (path steps, operator tag, values). Deterministic across calls and
/// processes; structurally distinct predicates diverge even when they
/// share a textual field path.
///

fn hash_predicate(hasher: &mut Sha256, predicate: &FilterPredicate) {
    write_len_u32(hasher, predicate.path.steps().len());
    for step in predicate.path.steps() {
        write_str(hasher, step.source().name());
        write_str(hasher, step.field());
        write_tag(hasher, step.cardinality().tag());
    }

    write_tag(hasher, predicate.operator.tag());

    write_len_u32(hasher, predicate.values.len());
    for value in &predicate.values {
        write_value(hasher, value);
    }
}

fn write_value(hasher: &mut Sha256, value: &Value) {
    write_tag(hasher, value.tag());

    match value {
        Value::Null => {}
        Value::Bool(v) => hasher.update([u8::from(*v)]),
        Value::Int(v) => hasher.update(v.to_be_bytes()),
        Value::Uint(v) => hasher.update(v.to_be_bytes()),
        Value::Float(v) => hasher.update(v.to_bits().to_be_bytes()),
        Value::Text(v) => write_str(hasher, v),
        Value::List(items) => {
            write_len_u32(hasher, items.len());
            for item in items {
                write_value(hasher, item);
            }
        }
    }
}

/// Encode one string with length prefix into the fingerprint stream.
fn write_str(hasher: &mut Sha256, value: &str) {
    write_len_u32(hasher, value.len());
    hasher.update(value.as_bytes());
}

/// Encode a platform-sized length as u32 with deterministic saturation.
fn write_len_u32(hasher: &mut Sha256, len: usize) {
    let len = u32::try_from(len).unwrap_or(u32::MAX);
    hasher.update(len.to_be_bytes());
}

/// Encode one tag byte into the fingerprint stream.
fn write_tag(hasher: &mut Sha256, tag: u8) {
    hasher.update([tag]);
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Cardinality;
    use crate::test_support::{DirectContext, MapMetadata, TestRow};
    use proptest::prelude::*;

    const BOOK: EntityType = EntityType::new("store::Book");
    const AUTHOR: EntityType = EntityType::new("store::Author");
    const USER: EntityType = EntityType::new("store::User");
    const POST: EntityType = EntityType::new("store::Post");

    fn author_name_path() -> TraversalPath {
        TraversalPath::new(vec![
            PathStep::new(BOOK, "author", Cardinality::ToOne),
            PathStep::new(AUTHOR, "name", Cardinality::None),
        ])
        .unwrap()
    }

    fn author_name_predicate(operator: Operator, values: Vec<Value>) -> FilterPredicate {
        FilterPredicate::new(author_name_path(), operator, values)
    }

    #[test]
    fn parameter_prefix_distinguishes_predicates_sharing_a_field_path() {
        let by_name = author_name_predicate(
            Operator::In,
            vec![Value::Text("Orwell".to_string())],
        );
        let by_substring = author_name_predicate(
            Operator::Infix,
            vec![Value::Text("Or".to_string())],
        );

        let left = by_name.parameter_name_prefix();
        let right = by_substring.parameter_name_prefix();

        assert!(left.starts_with("author_name_"));
        assert!(right.starts_with("author_name_"));
        assert_ne!(left, right);
    }

    #[test]
    fn parameter_prefix_is_deterministic_per_structure() {
        let a = author_name_predicate(Operator::In, vec![Value::Text("Orwell".to_string())]);
        let b = a.clone();

        assert_eq!(a.parameter_name_prefix(), b.parameter_name_prefix());
        assert_eq!(a.parameter_name_prefix(), a.parameter_name_prefix());
    }

    #[test]
    fn named_parameters_preserve_value_order() {
        let predicate = author_name_predicate(
            Operator::In,
            vec![
                Value::Text("a".to_string()),
                Value::Text("b".to_string()),
                Value::Text("c".to_string()),
            ],
        );

        let params = predicate.named_parameters();
        let base = predicate.parameter_name_prefix();

        assert_eq!(params.len(), 3);
        for (idx, (name, value)) in params.iter().enumerate() {
            assert_eq!(name, &format!("{base}_{idx}"));
            assert_eq!(value, &predicate.values()[idx]);
        }
    }

    #[test]
    fn single_step_alias_names_the_root_type() {
        let predicate = FilterPredicate::from_step(
            PathStep::scalar(BOOK, "title"),
            Operator::In,
            vec![Value::Text("1984".to_string())],
        );

        assert_eq!(predicate.alias(), "store_Book");
    }

    #[test]
    fn multi_step_alias_names_the_edge_into_the_terminal_field() {
        let predicate = author_name_predicate(
            Operator::In,
            vec![Value::Text("Orwell".to_string())],
        );

        // The joined collection reached via `author`, not the terminal
        // type.
        assert_eq!(predicate.alias(), "store_Book_author");
    }

    #[test]
    fn negation_replaces_the_operator_in_place() {
        let mut predicate = FilterPredicate::from_step(
            PathStep::scalar(USER, "age"),
            Operator::Ge,
            vec![Value::Int(18)],
        );

        predicate.negate().unwrap();

        assert_eq!(predicate.operator(), Operator::Lt);
        assert_eq!(predicate.values(), &[Value::Int(18)]);
    }

    #[test]
    fn failed_negation_leaves_the_predicate_untouched() {
        let mut predicate = author_name_predicate(
            Operator::Infix,
            vec![Value::Text("Or".to_string())],
        );
        let before = predicate.clone();

        let err = predicate.negate().unwrap_err();

        assert_eq!(err.operator, Operator::Infix);
        assert_eq!(predicate, before);
    }

    #[test]
    fn cloned_predicates_negate_independently() {
        let original = FilterPredicate::from_step(
            PathStep::scalar(USER, "age"),
            Operator::Ge,
            vec![Value::Int(18)],
        );

        let mut copy = original.clone();
        copy.negate().unwrap();

        assert_eq!(original.operator(), Operator::Ge);
        assert_eq!(copy.operator(), Operator::Lt);
        assert_eq!(original.values(), copy.values());
    }

    #[test]
    fn to_many_matching_scenario() {
        let path = TraversalPath::new(vec![
            PathStep::new(USER, "posts", Cardinality::ToMany),
            PathStep::new(POST, "title", Cardinality::None),
        ])
        .unwrap();
        let mut predicate = FilterPredicate::new(
            path,
            Operator::Infix,
            vec![Value::Text("hello".to_string())],
        );

        assert!(predicate.is_matching_operator());
        assert_eq!(predicate.field_path(), "posts.title");
        assert!(predicate.path().crosses_to_many());
        assert!(predicate.negate().is_err());
    }

    #[test]
    fn crosses_to_many_consults_the_metadata_source() {
        let metadata = MapMetadata::new(vec![
            (USER, "posts", Cardinality::ToMany),
            (USER, "address", Cardinality::ToOne),
        ]);

        let to_many = TraversalPath::new(vec![
            PathStep::resolved(&metadata, USER, "posts"),
            PathStep::resolved(&metadata, POST, "title"),
        ])
        .unwrap();
        let to_one = TraversalPath::new(vec![
            PathStep::resolved(&metadata, USER, "address"),
            PathStep::resolved(&metadata, AUTHOR, "city"),
        ])
        .unwrap();

        assert!(FilterPredicate::crosses_to_many(&metadata, &to_many));
        assert!(!FilterPredicate::crosses_to_many(&metadata, &to_one));
    }

    #[test]
    fn contextualize_applies_the_operator_to_the_field_path() {
        let predicate = FilterPredicate::from_step(
            PathStep::scalar(USER, "age"),
            Operator::Ge,
            vec![Value::Int(18)],
        );

        let test = predicate.contextualize(&DirectContext).unwrap();

        assert!(test(&TestRow::new(vec![("age", Value::Int(30))])));
        assert!(!test(&TestRow::new(vec![("age", Value::Int(12))])));
    }

    #[test]
    fn contextualize_surfaces_arity_violations() {
        let predicate = FilterPredicate::from_step(
            PathStep::scalar(USER, "nickname"),
            Operator::IsNull,
            vec![Value::Text("ted".to_string())],
        );

        let err = predicate.contextualize(&DirectContext).err().unwrap();

        assert_eq!(err.operator, Operator::IsNull);
        assert_eq!(err.actual, 1);
    }

    #[test]
    fn escaped_string_value_prefixes_special_characters() {
        let predicate = author_name_predicate(
            Operator::Infix,
            vec![Value::Text("50%_off".to_string())],
        );

        assert_eq!(
            predicate.escaped_string_value("%", "\\"),
            Some("50\\%_off".to_string())
        );
        assert_eq!(
            predicate.escaped_string_value("_", "\\"),
            Some("50%\\_off".to_string())
        );
    }

    #[test]
    fn escaped_string_value_without_a_text_value() {
        let no_values = FilterPredicate::new(author_name_path(), Operator::IsNull, Vec::new());
        assert_eq!(no_values.escaped_string_value("%", "\\"), None);

        let non_text = FilterPredicate::from_step(
            PathStep::scalar(USER, "age"),
            Operator::Ge,
            vec![Value::Int(18)],
        );
        assert_eq!(non_text.escaped_string_value("%", "\\"), None);
    }

    #[test]
    fn presentation_renders_root_path_operator_and_values() {
        let predicate = author_name_predicate(
            Operator::In,
            vec![Value::Text("Orwell".to_string())],
        );

        assert_eq!(predicate.to_string(), "book.author.name in ['Orwell']");
    }

    #[test]
    fn serializes_for_diagnostics() {
        let predicate = author_name_predicate(
            Operator::In,
            vec![Value::Text("Orwell".to_string())],
        );

        let json = serde_json::to_value(&predicate).unwrap();

        assert_eq!(json["operator"], "In");
        assert_eq!(json["path"]["steps"][0]["field"], "author");
        assert_eq!(json["path"]["steps"][1]["field"], "name");
        assert_eq!(json["values"][0]["Text"], "Orwell");
    }

    fn arb_values() -> impl Strategy<Value = Vec<Value>> {
        prop::collection::vec(
            prop_oneof![
                any::<i64>().prop_map(Value::Int),
                any::<u64>().prop_map(Value::Uint),
                any::<bool>().prop_map(Value::Bool),
                "[a-zA-Z0-9_]{0,8}".prop_map(Value::Text),
            ],
            1..4,
        )
    }

    proptest! {
        #[test]
        fn structurally_distinct_values_never_share_a_prefix(
            left in arb_values(),
            right in arb_values(),
        ) {
            let a = author_name_predicate(Operator::In, left.clone());
            let b = author_name_predicate(Operator::In, right.clone());

            if left == right {
                prop_assert_eq!(a.parameter_name_prefix(), b.parameter_name_prefix());
            } else {
                prop_assert_ne!(a.parameter_name_prefix(), b.parameter_name_prefix());
            }
        }

        #[test]
        fn named_parameter_indices_are_sequential(values in arb_values()) {
            let predicate = author_name_predicate(Operator::In, values.clone());
            let params = predicate.named_parameters();

            prop_assert_eq!(params.len(), values.len());
            for (idx, (name, value)) in params.iter().enumerate() {
                let suffix = format!("_{idx}");
                prop_assert!(name.ends_with(&suffix));
                prop_assert_eq!(value, &values[idx]);
            }
        }
    }
}

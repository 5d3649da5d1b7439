use crate::value::{TextMode, TextOp, Value};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error as ThisError;

///
/// FieldLookup
///
/// Result of resolving a field path against a candidate entity. This
/// distinguishes a broken/absent path from a present field whose value
/// is `Value::Null`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldLookup {
    /// Field resolved to a value (including `Value::Null`).
    Present(Value),

    /// Field path did not resolve on this entity.
    Missing,
}

///
/// FieldSource
///
/// Abstraction over a candidate entity instance that can expose field
/// values by name. This decouples contextualized tests from concrete
/// entity types.
///

pub trait FieldSource {
    fn field(&self, name: &str) -> FieldLookup;
}

///
/// RuntimeContext
///
/// Opaque capability supplied by the runtime: resolve a dotted field
/// path against one entity from its in-memory object graph. The
/// operator layer makes no structural assumption beyond this lookup.
///

pub trait RuntimeContext {
    fn resolve(&self, entity: &dyn FieldSource, field_path: &str) -> FieldLookup;
}

/// Executable boolean test produced by contextualization. Pure and
/// synchronous; evaluated against one already-materialized entity.
pub type BooleanTest<'a> = Box<dyn Fn(&dyn FieldSource) -> bool + 'a>;

///
/// ValueArity
///
/// Constraint on the length of an operator's value list.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueArity {
    Exactly(usize),
    AtLeast(usize),
}

impl ValueArity {
    #[must_use]
    pub const fn allows(self, len: usize) -> bool {
        match self {
            Self::Exactly(n) => len == n,
            Self::AtLeast(n) => len >= n,
        }
    }
}

impl fmt::Display for ValueArity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "exactly {n}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

///
/// OperatorArityError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("operator `{operator}` takes {expected} value(s), got {actual}")]
pub struct OperatorArityError {
    pub operator: Operator,
    pub expected: ValueArity,
    pub actual: usize,
}

///
/// UnsupportedNegationError
///
/// Raised when an operator with no clean single-operator inverse is
/// negated. Failing loudly beats a semantically wrong approximation.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("operator `{operator}` has no logical inverse")]
pub struct UnsupportedNegationError {
    pub operator: Operator,
}

///
/// Operator
///
/// Closed comparison/matching operator taxonomy. Operators are
/// stateless value objects: two references with the same tag are
/// interchangeable. Adding a tag forces every exhaustive match below
/// to be revisited, so negation and arity gaps cannot appear silently.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[repr(u8)]
pub enum Operator {
    Eq = 0x01,
    In = 0x02,
    NotIn = 0x03,
    Prefix = 0x04,
    PrefixCi = 0x05,
    Infix = 0x06,
    InfixCi = 0x07,
    Postfix = 0x08,
    PostfixCi = 0x09,
    IsNull = 0x0a,
    NotNull = 0x0b,
    Lt = 0x0c,
    Le = 0x0d,
    Gt = 0x0e,
    Ge = 0x0f,
    IsTrue = 0x10,
    IsFalse = 0x11,
}

impl Operator {
    /// Every operator tag, in declaration order.
    pub const ALL: [Self; 17] = [
        Self::Eq,
        Self::In,
        Self::NotIn,
        Self::Prefix,
        Self::PrefixCi,
        Self::Infix,
        Self::InfixCi,
        Self::Postfix,
        Self::PostfixCi,
        Self::IsNull,
        Self::NotNull,
        Self::Lt,
        Self::Le,
        Self::Gt,
        Self::Ge,
        Self::IsTrue,
        Self::IsFalse,
    ];

    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Filter-grammar notation for this tag.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::In => "in",
            Self::NotIn => "notin",
            Self::Prefix => "prefix",
            Self::PrefixCi => "prefixi",
            Self::Infix => "infix",
            Self::InfixCi => "infixi",
            Self::Postfix => "postfix",
            Self::PostfixCi => "postfixi",
            Self::IsNull => "isnull",
            Self::NotNull => "notnull",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::IsTrue => "true",
            Self::IsFalse => "false",
        }
    }

    ///
    /// Value-list length constraint for this tag, validated at
    /// contextualization time.
    ///
    #[must_use]
    pub const fn arity(self) -> ValueArity {
        match self {
            Self::IsNull | Self::NotNull | Self::IsTrue | Self::IsFalse => ValueArity::Exactly(0),
            Self::Eq
            | Self::Prefix
            | Self::PrefixCi
            | Self::Infix
            | Self::InfixCi
            | Self::Postfix
            | Self::PostfixCi
            | Self::Lt
            | Self::Le
            | Self::Gt
            | Self::Ge => ValueArity::Exactly(1),
            Self::In | Self::NotIn => ValueArity::AtLeast(1),
        }
    }

    ///
    /// Logical inverse of this tag, where one exists.
    ///
    /// The mapping is a fixed partial function; tags without a clean
    /// single-operator inverse (equality, the matching family) refuse
    /// negation rather than guessing.
    ///
    pub const fn negated(self) -> Result<Self, UnsupportedNegationError> {
        match self {
            Self::Ge => Ok(Self::Lt),
            Self::Gt => Ok(Self::Le),
            Self::Le => Ok(Self::Gt),
            Self::Lt => Ok(Self::Ge),
            Self::In => Ok(Self::NotIn),
            Self::NotIn => Ok(Self::In),
            Self::IsTrue => Ok(Self::IsFalse),
            Self::IsFalse => Ok(Self::IsTrue),
            Self::IsNull => Ok(Self::NotNull),
            Self::NotNull => Ok(Self::IsNull),
            Self::Eq
            | Self::Prefix
            | Self::PrefixCi
            | Self::Infix
            | Self::InfixCi
            | Self::Postfix
            | Self::PostfixCi => Err(UnsupportedNegationError { operator: self }),
        }
    }

    /// True for the six string-matching tags. Callers use this to
    /// decide whether a literal needs escaping before it is embedded
    /// in generated query text.
    #[must_use]
    pub const fn is_matching(self) -> bool {
        matches!(
            self,
            Self::Prefix
                | Self::PrefixCi
                | Self::Infix
                | Self::InfixCi
                | Self::Postfix
                | Self::PostfixCi
        )
    }

    ///
    /// Contextualize this operator into an executable boolean test.
    ///
    /// Validates the arity constraint against `values`, then returns a
    /// closure that resolves `field_path` through `context` for each
    /// candidate entity. A field path that fails to resolve evaluates
    /// false, except under `NotIn`, which is the exact complement of
    /// `In` so that the In/NotIn negation entry preserves semantics.
    ///
    pub fn contextualize<'a>(
        self,
        field_path: impl Into<String>,
        values: Vec<Value>,
        context: &'a dyn RuntimeContext,
    ) -> Result<BooleanTest<'a>, OperatorArityError> {
        let expected = self.arity();
        if !expected.allows(values.len()) {
            return Err(OperatorArityError {
                operator: self,
                expected,
                actual: values.len(),
            });
        }

        let field_path = field_path.into();

        // Single-value arities are checked above; `values[0]` below
        // cannot fail.
        let test: BooleanTest<'a> = match self {
            Self::IsTrue => Box::new(|_| true),
            Self::IsFalse => Box::new(|_| false),

            Self::Eq => Box::new(move |entity| {
                on_present(context.resolve(entity, &field_path), |actual| {
                    actual.compare_eq(&values[0]).unwrap_or(false)
                })
            }),

            Self::In => Box::new(move |entity| {
                in_listed(context.resolve(entity, &field_path), &values)
            }),
            Self::NotIn => Box::new(move |entity| {
                !in_listed(context.resolve(entity, &field_path), &values)
            }),

            Self::Lt => ordered(context, field_path, values, Ordering::is_lt),
            Self::Le => ordered(context, field_path, values, Ordering::is_le),
            Self::Gt => ordered(context, field_path, values, Ordering::is_gt),
            Self::Ge => ordered(context, field_path, values, Ordering::is_ge),

            Self::Prefix => matching(context, field_path, values, TextOp::StartsWith, TextMode::Cs),
            Self::PrefixCi => {
                matching(context, field_path, values, TextOp::StartsWith, TextMode::Ci)
            }
            Self::Infix => matching(context, field_path, values, TextOp::Contains, TextMode::Cs),
            Self::InfixCi => matching(context, field_path, values, TextOp::Contains, TextMode::Ci),
            Self::Postfix => matching(context, field_path, values, TextOp::EndsWith, TextMode::Cs),
            Self::PostfixCi => {
                matching(context, field_path, values, TextOp::EndsWith, TextMode::Ci)
            }

            Self::IsNull => Box::new(move |entity| {
                matches!(
                    context.resolve(entity, &field_path),
                    FieldLookup::Present(Value::Null)
                )
            }),
            Self::NotNull => Box::new(move |entity| {
                on_present(context.resolve(entity, &field_path), |actual| {
                    !actual.is_null()
                })
            }),
        };

        Ok(test)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

// Evaluate a test only when the field path resolved.
fn on_present(lookup: FieldLookup, test: impl FnOnce(&Value) -> bool) -> bool {
    match lookup {
        FieldLookup::Present(value) => test(&value),
        FieldLookup::Missing => false,
    }
}

// Membership test shared by In/NotIn. Invalid comparisons are treated
// as non-matches.
fn in_listed(lookup: FieldLookup, values: &[Value]) -> bool {
    let FieldLookup::Present(actual) = lookup else {
        return false;
    };

    values
        .iter()
        .any(|candidate| actual.compare_eq(candidate).unwrap_or(false))
}

fn ordered<'a>(
    context: &'a dyn RuntimeContext,
    field_path: String,
    values: Vec<Value>,
    accept: fn(Ordering) -> bool,
) -> BooleanTest<'a> {
    Box::new(move |entity| {
        on_present(context.resolve(entity, &field_path), |actual| {
            actual.compare_order(&values[0]).is_some_and(accept)
        })
    })
}

fn matching<'a>(
    context: &'a dyn RuntimeContext,
    field_path: String,
    values: Vec<Value>,
    op: TextOp,
    mode: TextMode,
) -> BooleanTest<'a> {
    Box::new(move |entity| {
        on_present(context.resolve(entity, &field_path), |actual| {
            actual.compare_text(&values[0], op, mode).unwrap_or(false)
        })
    })
}

///
/// TESTS
///

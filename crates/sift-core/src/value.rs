use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

///
/// TextMode
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TextMode {
    Cs, // case-sensitive
    Ci, // case-insensitive
}

///
/// TextOp
///
/// Text-matching family applied by the matching operators.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum TextOp {
    Contains,
    StartsWith,
    EndsWith,
}

///
/// Value
///
/// Opaque literal supplied by the predicate builder. Values carry no
/// schema information; comparison helpers return `None` when a
/// comparison is not defined for the operand types, and callers decide
/// how an undefined comparison evaluates.
///
/// Null → the field's value is absent (i.e. SQL NULL).
///

#[derive(Clone, Debug, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Stable tag byte used by the structural fingerprint stream.
    pub(crate) const fn tag(&self) -> u8 {
        match self {
            Self::Null => 0x01,
            Self::Bool(_) => 0x02,
            Self::Int(_) => 0x03,
            Self::Uint(_) => 0x04,
            Self::Float(_) => 0x05,
            Self::Text(_) => 0x06,
            Self::List(_) => 0x07,
        }
    }

    ///
    /// Semantic equality with numeric widening.
    ///
    /// Returns `None` when the comparison is not defined (mixed
    /// non-numeric types, or either side is `Null`).
    ///
    pub(crate) fn compare_eq(&self, other: &Self) -> Option<bool> {
        match (self, other) {
            (Self::Null, _) | (_, Self::Null) => None,
            (Self::Bool(a), Self::Bool(b)) => Some(a == b),
            (Self::Text(a), Self::Text(b)) => Some(a == b),
            (Self::List(a), Self::List(b)) => Some(a == b),
            _ => self.compare_order(other).map(Ordering::is_eq),
        }
    }

    ///
    /// Ordered comparison with numeric widening.
    ///
    /// Int/Uint/Float operands compare numerically across widths; text
    /// compares lexicographically; `false < true`. Everything else is
    /// undefined and returns `None`.
    ///
    #[expect(clippy::cast_precision_loss)]
    pub(crate) fn compare_order(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Uint(a), Self::Uint(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Uint(b)) => Some(cmp_int_uint(*a, *b)),
            (Self::Uint(a), Self::Int(b)) => Some(cmp_int_uint(*b, *a).reverse()),
            (Self::Float(a), Self::Float(b)) => Some(a.total_cmp(b)),
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Uint(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Uint(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    ///
    /// Text matching under a case mode.
    ///
    /// Returns `None` unless both sides are text. The case-insensitive
    /// mode casefolds both sides before matching.
    ///
    pub(crate) fn compare_text(&self, needle: &Self, op: TextOp, mode: TextMode) -> Option<bool> {
        let (Self::Text(actual), Self::Text(needle)) = (self, needle) else {
            return None;
        };

        let matched = match mode {
            TextMode::Cs => apply_text_op(actual, needle, op),
            TextMode::Ci => apply_text_op(&actual.to_lowercase(), &needle.to_lowercase(), op),
        };

        Some(matched)
    }
}

fn apply_text_op(actual: &str, needle: &str, op: TextOp) -> bool {
    match op {
        TextOp::Contains => actual.contains(needle),
        TextOp::StartsWith => actual.starts_with(needle),
        TextOp::EndsWith => actual.ends_with(needle),
    }
}

// Structural equality. Floats compare by total order so that equality
// stays reflexive and usable inside predicate identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Uint(a), Self::Uint(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b) == Ordering::Equal,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "'{v}'"),
            Self::List(items) => {
                write!(f, "[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

// Compare a signed operand against an unsigned one without widening
// through floats.
#[expect(clippy::cast_sign_loss)]
const fn cmp_int_uint(a: i64, b: u64) -> Ordering {
    if a < 0 {
        return Ordering::Less;
    }
    let a = a as u64;

    if a < b {
        Ordering::Less
    } else if a > b {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

///
/// TESTS
///

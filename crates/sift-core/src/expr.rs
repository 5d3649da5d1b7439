use crate::predicate::FilterPredicate;
use std::ops::{BitAnd, BitOr};

///
/// FilterVisitor
///
/// Visitor contract consumed by query generators. One handler per
/// expression variant; the predicate leaf dispatches here through
/// `FilterPredicate::accept`.
///

pub trait FilterVisitor {
    type Output;

    fn visit_predicate(&mut self, predicate: &FilterPredicate) -> Self::Output;
    fn visit_and(&mut self, children: &[FilterExpression]) -> Self::Output;
    fn visit_or(&mut self, children: &[FilterExpression]) -> Self::Output;
    fn visit_not(&mut self, inner: &FilterExpression) -> Self::Output;
}

///
/// FilterExpression
///
/// Composite boolean tree over predicate leaves. This is the
/// integration seam for the externally-owned expression layer; no
/// normalization or planning happens here.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FilterExpression {
    Predicate(FilterPredicate),
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
}

impl FilterExpression {
    #[expect(clippy::should_implement_trait)]
    #[must_use]
    pub fn not(expr: Self) -> Self {
        Self::Not(Box::new(expr))
    }

    pub fn accept<V: FilterVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Self::Predicate(predicate) => predicate.accept(visitor),
            Self::And(children) => visitor.visit_and(children),
            Self::Or(children) => visitor.visit_or(children),
            Self::Not(inner) => visitor.visit_not(inner),
        }
    }
}

impl From<FilterPredicate> for FilterExpression {
    fn from(predicate: FilterPredicate) -> Self {
        Self::Predicate(predicate)
    }
}

impl BitAnd for FilterExpression {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::And(vec![self, rhs])
    }
}

impl BitOr for FilterExpression {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::Or(vec![self, rhs])
    }
}

///
/// TESTS
///

//! Single-field comparison predicates used by `Filter` and nested-loops
//! `Join`.

use crate::field::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Equals,
    GreaterThan,
    GreaterThanOrEq,
    LessThan,
    LessThanOrEq,
    NotEquals,
}

impl Op {
    pub fn apply(&self, lhs: &Field, rhs: &Field) -> bool {
        let cmp = lhs.partial_cmp(rhs);
        match (self, cmp) {
            (Op::Equals, _) => lhs == rhs,
            (Op::NotEquals, _) => lhs != rhs,
            (Op::GreaterThan, Some(o)) => o == std::cmp::Ordering::Greater,
            (Op::GreaterThanOrEq, Some(o)) => o != std::cmp::Ordering::Less,
            (Op::LessThan, Some(o)) => o == std::cmp::Ordering::Less,
            (Op::LessThanOrEq, Some(o)) => o != std::cmp::Ordering::Greater,
            (_, None) => false,
        }
    }
}

/// A predicate comparing the field at `field_index` against a fixed
/// constant.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub field_index: usize,
    pub op: Op,
    pub operand: Field,
}

impl Predicate {
    pub fn new(field_index: usize, op: Op, operand: Field) -> Predicate {
        Predicate {
            field_index,
            op,
            operand,
        }
    }

    pub fn filter(&self, tuple: &crate::tuple::Tuple) -> bool {
        self.op.apply(tuple.field(self.field_index), &self.operand)
    }
}

/// A predicate comparing a field from the left child tuple against a
/// field from the right child tuple, used by `Join`.
#[derive(Debug, Clone)]
pub struct JoinPredicate {
    pub left_field_index: usize,
    pub op: Op,
    pub right_field_index: usize,
}

impl JoinPredicate {
    pub fn new(left_field_index: usize, op: Op, right_field_index: usize) -> JoinPredicate {
        JoinPredicate {
            left_field_index,
            op,
            right_field_index,
        }
    }

    pub fn filter(&self, left: &crate::tuple::Tuple, right: &crate::tuple::Tuple) -> bool {
        self.op
            .apply(left.field(self.left_field_index), right.field(self.right_field_index))
    }
}

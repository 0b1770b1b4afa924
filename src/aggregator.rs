//! Grouped streaming aggregation over the iterator pipeline. Both
//! aggregators share the same contract: `merge` folds a tuple into the
//! per-group state, `iterator` drains it into a restartable in-memory
//! result stream.

use crate::error::{DbError, DbResult};
use crate::field::{Field, FieldType};
use crate::tuple::{Tuple, TupleDesc};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggOp {
    Sum,
    Count,
    Min,
    Max,
    Avg,
}

/// Grouping key: either a concrete field value or the single sentinel
/// used when there is no GROUP BY.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Field(FieldKey),
    NoGrouping,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum FieldKey {
    Int(i32),
    Varchar(String),
}

impl FieldKey {
    fn from_field(f: &Field) -> FieldKey {
        match f {
            Field::Int(v) => FieldKey::Int(*v),
            Field::Varchar(s) => FieldKey::Varchar(s.clone()),
        }
    }

    fn into_field(self) -> Field {
        match self {
            FieldKey::Int(v) => Field::Int(v),
            FieldKey::Varchar(s) => Field::Varchar(s),
        }
    }
}

struct IntState {
    sum: i64,
    count: i64,
    min: i32,
    max: i32,
    mean: f64,
}

impl IntState {
    fn new() -> IntState {
        IntState {
            sum: 0,
            count: 0,
            min: i32::MAX,
            max: i32::MIN,
            mean: 0.0,
        }
    }

    fn update(&mut self, v: i32) {
        self.sum += v as i64;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
        // mean' = (mean*count + v) / (count + 1)
        self.mean = (self.mean * self.count as f64 + v as f64) / (self.count as f64 + 1.0);
        self.count += 1;
    }

    fn result(&self, op: AggOp) -> i32 {
        match op {
            AggOp::Sum => self.sum as i32,
            AggOp::Count => self.count as i32,
            AggOp::Min => self.min,
            AggOp::Max => self.max,
            AggOp::Avg => self.mean as i32,
        }
    }
}

/// Aggregates an integer field, optionally grouped by another field.
pub struct IntegerAggregator {
    group_field: Option<usize>,
    group_field_type: Option<FieldType>,
    agg_field: usize,
    op: AggOp,
    groups: HashMap<GroupKey, IntState>,
    order: Vec<GroupKey>,
}

impl IntegerAggregator {
    pub fn new(
        group_field: Option<usize>,
        group_field_type: Option<FieldType>,
        agg_field: usize,
        op: AggOp,
    ) -> IntegerAggregator {
        IntegerAggregator {
            group_field,
            group_field_type,
            agg_field,
            op,
            groups: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn key_of(&self, tuple: &Tuple) -> GroupKey {
        match self.group_field {
            Some(i) => GroupKey::Field(FieldKey::from_field(tuple.field(i))),
            None => GroupKey::NoGrouping,
        }
    }

    pub fn merge(&mut self, tuple: &Tuple) -> DbResult<()> {
        let v = match tuple.field(self.agg_field) {
            Field::Int(v) => *v,
            Field::Varchar(_) => return Err(DbError::invalid_argument("aggregate field is not an integer")),
        };
        let key = self.key_of(tuple);
        if !self.groups.contains_key(&key) {
            self.order.push(key.clone());
            self.groups.insert(key.clone(), IntState::new());
        }
        self.groups.get_mut(&key).unwrap().update(v);
        Ok(())
    }

    pub fn tuple_desc(&self) -> TupleDesc {
        match self.group_field_type {
            Some(gt) => TupleDesc::from_types(&[gt, FieldType::Int]),
            None => TupleDesc::from_types(&[FieldType::Int]),
        }
    }

    /// Drains the accumulated groups into one result tuple each, in
    /// first-seen order.
    pub fn iterator(&self) -> DbResult<Vec<Tuple>> {
        let desc = self.tuple_desc();
        let mut out = Vec::with_capacity(self.order.len());
        for key in &self.order {
            let state = &self.groups[key];
            let value = Field::Int(state.result(self.op));
            let fields = match key {
                GroupKey::Field(fk) => vec![fk.clone().into_field(), value],
                GroupKey::NoGrouping => vec![value],
            };
            out.push(Tuple::new(desc.clone(), fields)?);
        }
        Ok(out)
    }
}

/// Aggregates a string field. Only COUNT is meaningful over strings.
pub struct StringAggregator {
    group_field: Option<usize>,
    group_field_type: Option<FieldType>,
    agg_field: usize,
    counts: HashMap<GroupKey, i64>,
    order: Vec<GroupKey>,
}

impl StringAggregator {
    pub fn new(
        group_field: Option<usize>,
        group_field_type: Option<FieldType>,
        agg_field: usize,
        op: AggOp,
    ) -> DbResult<StringAggregator> {
        if op != AggOp::Count {
            return Err(DbError::invalid_argument("string aggregator only supports COUNT"));
        }
        Ok(StringAggregator {
            group_field,
            group_field_type,
            agg_field,
            counts: HashMap::new(),
            order: Vec::new(),
        })
    }

    fn key_of(&self, tuple: &Tuple) -> GroupKey {
        match self.group_field {
            Some(i) => GroupKey::Field(FieldKey::from_field(tuple.field(i))),
            None => GroupKey::NoGrouping,
        }
    }

    pub fn merge(&mut self, tuple: &Tuple) -> DbResult<()> {
        if !matches!(tuple.field(self.agg_field), Field::Varchar(_)) {
            return Err(DbError::invalid_argument("aggregate field is not a string"));
        }
        let key = self.key_of(tuple);
        if !self.counts.contains_key(&key) {
            self.order.push(key.clone());
        }
        *self.counts.entry(key).or_insert(0) += 1;
        Ok(())
    }

    pub fn tuple_desc(&self) -> TupleDesc {
        match self.group_field_type {
            Some(gt) => TupleDesc::from_types(&[gt, FieldType::Int]),
            None => TupleDesc::from_types(&[FieldType::Int]),
        }
    }

    pub fn iterator(&self) -> DbResult<Vec<Tuple>> {
        let desc = self.tuple_desc();
        let mut out = Vec::with_capacity(self.order.len());
        for key in &self.order {
            let count = self.counts[key];
            let value = Field::Int(count as i32);
            let fields = match key {
                GroupKey::Field(fk) => vec![fk.clone().into_field(), value],
                GroupKey::NoGrouping => vec![value],
            };
            out.push(Tuple::new(desc.clone(), fields)?);
        }
        Ok(out)
    }
}

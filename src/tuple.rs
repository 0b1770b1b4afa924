//! Tuple descriptor (schema) and tuple, generalized from the teacher's
//! `TupleScheme`/`Tuple` (int-only) into the closed field-type enumeration.

use crate::error::{DbError, DbResult};
use crate::field::{Field, FieldType};
use crate::types::RecordId;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub field_type: FieldType,
    pub name: Option<String>,
}

/// Ordered sequence of (field type, optional name). Two descriptors are
/// equal iff their ordered type sequences match; names are ignored.
#[derive(Debug, Clone)]
pub struct TupleDesc {
    fields: Vec<FieldSpec>,
}

impl TupleDesc {
    pub fn new(fields: Vec<FieldSpec>) -> TupleDesc {
        TupleDesc { fields }
    }

    pub fn from_types(types: &[FieldType]) -> TupleDesc {
        TupleDesc {
            fields: types
                .iter()
                .map(|t| FieldSpec {
                    field_type: *t,
                    name: None,
                })
                .collect(),
        }
    }

    pub fn simple_ints(width: usize, name_prefix: &str) -> TupleDesc {
        let fields = (0..width)
            .map(|i| FieldSpec {
                field_type: FieldType::Int,
                name: Some(format!("{}{}", name_prefix, i)),
            })
            .collect();
        TupleDesc { fields }
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn field_type(&self, i: usize) -> FieldType {
        self.fields[i].field_type
    }

    pub fn field_name(&self, i: usize) -> Option<&str> {
        self.fields[i].name.as_deref()
    }

    /// Sum of the widths of all fields; the on-disk size of one tuple.
    pub fn size(&self) -> usize {
        self.fields.iter().map(|f| f.field_type.width()).sum()
    }

    pub fn merge(a: &TupleDesc, b: &TupleDesc) -> TupleDesc {
        let mut fields = a.fields.clone();
        fields.extend(b.fields.clone());
        TupleDesc { fields }
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name.as_deref() == Some(name))
    }
}

impl PartialEq for TupleDesc {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(other.fields.iter())
                .all(|(a, b)| a.field_type == b.field_type)
    }
}
impl Eq for TupleDesc {}

/// A schema-conforming row, optionally located on disk.
#[derive(Debug, Clone)]
pub struct Tuple {
    desc: TupleDesc,
    fields: Vec<Field>,
    record_id: Option<RecordId>,
}

impl Tuple {
    pub fn new(desc: TupleDesc, fields: Vec<Field>) -> DbResult<Tuple> {
        if fields.len() != desc.num_fields() {
            return Err(DbError::db("tuple field count does not match descriptor"));
        }
        Ok(Tuple {
            desc,
            fields,
            record_id: None,
        })
    }

    pub fn desc(&self) -> &TupleDesc {
        &self.desc
    }

    pub fn field(&self, i: usize) -> &Field {
        &self.fields[i]
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, rid: RecordId) {
        self.record_id = Some(rid);
    }

    pub fn encode(&self) -> DbResult<Vec<u8>> {
        let mut out = Vec::with_capacity(self.desc.size());
        for (i, field) in self.fields.iter().enumerate() {
            field.encode(self.desc.field_type(i).width(), &mut out)?;
        }
        Ok(out)
    }

    pub fn decode(desc: TupleDesc, bytes: &[u8]) -> DbResult<Tuple> {
        let mut fields = Vec::with_capacity(desc.num_fields());
        let mut start = 0usize;
        for i in 0..desc.num_fields() {
            let field_type = desc.field_type(i);
            let width = field_type.width();
            fields.push(Field::decode(field_type, &bytes[start..start + width])?);
            start += width;
        }
        Ok(Tuple {
            desc,
            fields,
            record_id: None,
        })
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts: Vec<String> = self.fields.iter().map(|v| v.to_string()).collect();
        write!(f, "({})", parts.join(", "))
    }
}

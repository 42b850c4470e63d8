//! Runtime conformance: does a value inhabit a type?

use crate::context::TypeContext;
use crate::error::{TypeError, TypeResult};
use crate::nominal::AncestorSet;
use crate::ty::{LeafKind, ObjectType, SingletonKind, Type, TypeId};
use crate::value::{Record, Value};

/// Checks runtime values against type descriptors
#[derive(Debug, Clone, Copy)]
pub struct ConformanceChecker<'a> {
    type_ctx: &'a TypeContext,
}

impl<'a> ConformanceChecker<'a> {
    /// Create a checker over a type context
    pub fn new(type_ctx: &'a TypeContext) -> Self {
        ConformanceChecker { type_ctx }
    }

    /// Check whether `value` conforms to `ty`
    ///
    /// Fails if the type reaches an unresolved placeholder, or if a record's
    /// tag is unknown to the registry when its ancestry is needed.
    pub fn conforms(&self, ty: TypeId, value: &Value) -> TypeResult<bool> {
        match (self.type_ctx.resolve(ty)?, value) {
            (Type::Any, _) => Ok(true),
            (Type::Nothing, _) => Ok(false),

            (Type::Singleton(SingletonKind::Boolean), Value::Boolean(_)) => Ok(true),
            (Type::Singleton(SingletonKind::Null), Value::Null) => Ok(true),

            // A number passes any kind at or above its own rank
            (Type::Numeric(kind), Value::Number(n)) => Ok(n.kind().rank() <= kind.rank()),

            (Type::Leaf(LeafKind::String), Value::String(_)) => Ok(true),
            (Type::Leaf(LeafKind::DateTime), Value::DateTime(_)) => Ok(true),

            (Type::Tuple(tuple), Value::Sequence(items)) => {
                if tuple.elements.len() != items.len() {
                    return Ok(false);
                }
                for (&elem, item) in tuple.elements.iter().zip(items) {
                    if !self.conforms(elem, item)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }

            (Type::Sequence(seq), Value::Sequence(items)) => {
                for item in items {
                    if !self.conforms(seq.element, item)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }

            (Type::Object(obj), Value::Record(record)) => {
                let ancestors = self.record_ancestors(record)?;
                self.conforms_object(obj, record, &ancestors)
            }

            (Type::Union(union), Value::Record(record)) => {
                // Tag-directed: only object clauses on the record's lineage can match.
                // The lineage is probed at the first object clause, not before.
                let mut ancestors: Option<AncestorSet> = None;
                let mut rest = Vec::new();
                for &member in &union.members {
                    match self.type_ctx.resolve(member)? {
                        Type::Object(obj) => {
                            let lineage = match ancestors.take() {
                                Some(lineage) => lineage,
                                None => self.record_ancestors(record)?,
                            };
                            if self.conforms_object(obj, record, &lineage)? {
                                return Ok(true);
                            }
                            ancestors = Some(lineage);
                        }
                        _ => rest.push(member),
                    }
                }
                for member in rest {
                    if self.conforms(member, value)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }

            (Type::Union(union), _) => {
                for &member in &union.members {
                    if matches!(self.type_ctx.resolve(member)?, Type::Object(_)) {
                        continue;
                    }
                    if self.conforms(member, value)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }

            _ => Ok(false),
        }
    }

    fn conforms_object(
        &self,
        obj: &ObjectType,
        record: &Record,
        ancestors: &AncestorSet,
    ) -> TypeResult<bool> {
        if !ancestors.contains(&obj.tag) {
            return Ok(false);
        }
        for field in &obj.fields {
            match record.field(&field.name) {
                Some(value) => {
                    if !self.conforms(field.ty, value)? {
                        return Ok(false);
                    }
                }
                None => return Ok(false),
            }
        }
        Ok(true)
    }

    fn record_ancestors(&self, record: &Record) -> TypeResult<AncestorSet> {
        let graph = self.type_ctx.graph();
        let tag = graph
            .lookup(&record.tag)
            .ok_or_else(|| TypeError::UnprobeableValue {
                reason: format!("record tag {} is not registered", record.tag),
            })?;
        Ok(graph.ancestors(tag))
    }
}

impl TypeContext {
    /// Check whether `value` conforms to `ty`
    pub fn conforms(&self, ty: TypeId, value: &Value) -> TypeResult<bool> {
        ConformanceChecker::new(self).conforms(ty, value)
    }
}

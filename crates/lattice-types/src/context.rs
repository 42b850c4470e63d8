//! Type context for managing types and type interning

use crate::config::Options;
use crate::error::{TypeError, TypeResult};
use crate::nominal::NominalGraph;
use crate::subtyping::SubtypingContext;
use crate::ty::{
    Field, LeafKind, NumericKind, ObjectType, SequenceType, SingletonKind, TagId, TupleType,
    Type, TypeId,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// Arena slot: either an interned type or a write-once placeholder
#[derive(Debug, Clone)]
enum Slot {
    Type(Arc<Type>),
    Placeholder {
        name: String,
        target: Option<TypeId>,
    },
}

/// Type context that owns all types and the nominal registry
///
/// Structurally identical types are interned to the same [`TypeId`]. Queries
/// take `&self`; construction and registration take `&mut self`, so a
/// context shared between threads is read-only.
#[derive(Debug, Clone)]
pub struct TypeContext {
    /// Storage for all types and placeholders, indexed by TypeId
    slots: Vec<Slot>,

    /// Reverse mapping from Type to TypeId for interning
    type_to_id: FxHashMap<Type, TypeId>,

    /// Object tags and their supertag edges
    graph: NominalGraph,

    options: Options,
}

impl Default for TypeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeContext {
    /// Well-known id of the top type
    pub const ANY: TypeId = TypeId(0);
    /// Well-known id of the bottom type
    pub const NOTHING: TypeId = TypeId(1);
    /// Well-known id of Boolean
    pub const BOOLEAN: TypeId = TypeId(2);
    /// Well-known id of Null
    pub const NULL: TypeId = TypeId(3);
    /// Well-known id of Integer
    pub const INTEGER: TypeId = TypeId(4);
    /// Well-known id of Rational
    pub const RATIONAL: TypeId = TypeId(5);
    /// Well-known id of Real
    pub const REAL: TypeId = TypeId(6);
    /// Well-known id of Complex
    pub const COMPLEX: TypeId = TypeId(7);
    /// Well-known id of String
    pub const STRING: TypeId = TypeId(8);
    /// Well-known id of DateTime
    pub const DATETIME: TypeId = TypeId(9);
    /// Well-known id of the root object type (no fields)
    pub const ROOT_OBJECT: TypeId = TypeId(10);

    /// Create a context with default options
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    /// Create a context with the given options
    pub fn with_options(options: Options) -> Self {
        let mut ctx = TypeContext {
            slots: Vec::new(),
            type_to_id: FxHashMap::default(),
            graph: NominalGraph::new(&options.root_tag),
            options,
        };

        // Pre-intern the leaves in the order of the well-known ids
        ctx.intern(Type::Any);
        ctx.intern(Type::Nothing);
        ctx.intern(Type::Singleton(SingletonKind::Boolean));
        ctx.intern(Type::Singleton(SingletonKind::Null));
        ctx.intern(Type::Numeric(NumericKind::Integer));
        ctx.intern(Type::Numeric(NumericKind::Rational));
        ctx.intern(Type::Numeric(NumericKind::Real));
        ctx.intern(Type::Numeric(NumericKind::Complex));
        ctx.intern(Type::Leaf(LeafKind::String));
        ctx.intern(Type::Leaf(LeafKind::DateTime));
        let root = ctx.intern(Type::Object(ObjectType {
            tag: TagId::ROOT,
            fields: Vec::new(),
        }));
        ctx.graph.set_root_descriptor(root);

        ctx
    }

    /// Intern a type, returning its TypeId
    ///
    /// If the type already exists, returns the existing TypeId.
    pub(crate) fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.type_to_id.get(&ty) {
            return id;
        }

        let id = TypeId(self.slots.len() as u32);
        self.slots.push(Slot::Type(Arc::new(ty.clone())));
        self.type_to_id.insert(ty, id);
        id
    }

    /// Follow placeholders to the id of the underlying type
    pub fn canonical(&self, mut id: TypeId) -> TypeResult<TypeId> {
        loop {
            match self.slots.get(id.0 as usize) {
                Some(Slot::Type(_)) => return Ok(id),
                None => return Err(TypeError::InvalidTypeId { id: id.0 }),
                Some(Slot::Placeholder {
                    target: Some(target),
                    ..
                }) => id = *target,
                Some(Slot::Placeholder { name, target: None }) => {
                    return Err(TypeError::UnresolvedPlaceholder { name: name.clone() })
                }
            }
        }
    }

    /// Resolve a TypeId to its type, dereferencing placeholders
    pub fn resolve(&self, id: TypeId) -> TypeResult<&Type> {
        let id = self.canonical(id)?;
        match self.slots.get(id.0 as usize) {
            Some(Slot::Type(ty)) => Ok(ty.as_ref()),
            _ => Err(TypeError::InvalidTypeId { id: id.0 }),
        }
    }

    /// Get a type by its TypeId, or None if the id is invalid or unresolved
    pub fn get(&self, id: TypeId) -> Option<&Type> {
        self.resolve(id).ok()
    }

    /// Look up a type's ID without interning
    pub fn lookup(&self, ty: &Type) -> Option<TypeId> {
        self.type_to_id.get(ty).copied()
    }

    /// Options this context was created with
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The nominal registry
    pub fn graph(&self) -> &NominalGraph {
        &self.graph
    }

    // Convenience methods for the well-known types

    /// Get the top type
    pub fn any_type(&self) -> TypeId {
        Self::ANY
    }

    /// Get the bottom type
    pub fn nothing_type(&self) -> TypeId {
        Self::NOTHING
    }

    /// Get the Boolean type
    pub fn boolean_type(&self) -> TypeId {
        Self::BOOLEAN
    }

    /// Get the Null type
    pub fn null_type(&self) -> TypeId {
        Self::NULL
    }

    /// Get a numeric type
    pub fn numeric_type(&self, kind: NumericKind) -> TypeId {
        match kind {
            NumericKind::Integer => Self::INTEGER,
            NumericKind::Rational => Self::RATIONAL,
            NumericKind::Real => Self::REAL,
            NumericKind::Complex => Self::COMPLEX,
        }
    }

    /// Get the Integer type
    pub fn integer_type(&self) -> TypeId {
        Self::INTEGER
    }

    /// Get the Rational type
    pub fn rational_type(&self) -> TypeId {
        Self::RATIONAL
    }

    /// Get the Real type
    pub fn real_type(&self) -> TypeId {
        Self::REAL
    }

    /// Get the Complex type
    pub fn complex_type(&self) -> TypeId {
        Self::COMPLEX
    }

    /// Get the String type
    pub fn string_type(&self) -> TypeId {
        Self::STRING
    }

    /// Get the DateTime type
    pub fn datetime_type(&self) -> TypeId {
        Self::DATETIME
    }

    /// Get the root object type with no fields
    pub fn root_object_type(&self) -> TypeId {
        Self::ROOT_OBJECT
    }

    /// Create a tuple type
    pub fn tuple_type(&mut self, elements: Vec<TypeId>) -> TypeId {
        self.intern(Type::Tuple(TupleType { elements }))
    }

    /// Create a sequence type
    pub fn sequence_type(&mut self, element: TypeId) -> TypeId {
        self.intern(Type::Sequence(SequenceType { element }))
    }

    /// Create an object view over a known tag with the given fields
    ///
    /// The tag must be registered or forward-declared. A later field with the
    /// same name replaces an earlier one.
    pub fn object_type(&mut self, tag: &str, fields: Vec<Field>) -> TypeResult<TypeId> {
        let tag_id = self
            .graph
            .lookup(tag)
            .ok_or_else(|| TypeError::UnknownTag {
                tag: tag.to_string(),
            })?;
        Ok(self.object_type_for(tag_id, fields))
    }

    pub(crate) fn object_type_for(&mut self, tag: TagId, fields: Vec<Field>) -> TypeId {
        self.intern(Type::Object(ObjectType {
            tag,
            fields: canonical_fields(fields),
        }))
    }

    // Nominal registry

    /// Register a nominal tag with its own fields and direct supertags
    ///
    /// The returned descriptor carries the tag's own fields plus every field
    /// inherited from its supertags. Fails without changing anything if the
    /// tag is already registered, a supertag is unknown, the edge would close
    /// a cycle, or the registry is frozen. It also fails with
    /// [`TypeError::FieldConflict`] when an own field does not refine the
    /// inherited one, or when a forward-declared tag gains a field that a
    /// tag already registered below it does not provide.
    pub fn register_object_tag(
        &mut self,
        tag: &str,
        fields: Vec<Field>,
        supertags: &[&str],
    ) -> TypeResult<TypeId> {
        let resolved = self.graph.check_registration(tag, supertags)?;

        let mut all_fields: Vec<Field> = Vec::new();
        for &sup in &resolved {
            for inherited in self.graph.fields(sup) {
                if !all_fields.iter().any(|f| f.name == inherited.name) {
                    all_fields.push(inherited.clone());
                }
            }
        }
        all_fields.extend(fields);
        let all_fields = canonical_fields(all_fields);
        self.check_field_refinement(tag, &resolved, &all_fields)?;

        let tag_id = self.graph.next_tag(tag);
        let descriptor = self.intern(Type::Object(ObjectType {
            tag: tag_id,
            fields: all_fields.clone(),
        }));
        self.graph.define(tag, resolved, all_fields, descriptor);

        tracing::debug!(
            tag,
            supertags = ?supertags,
            descriptor = %descriptor,
            "registered object tag"
        );
        Ok(descriptor)
    }

    /// Every registered descriptor must stay a subtype of its supertags' descriptors
    fn check_field_refinement(
        &self,
        tag: &str,
        supertags: &[TagId],
        fields: &[Field],
    ) -> TypeResult<()> {
        let mut sub_ctx = SubtypingContext::new(self);

        for &sup in supertags {
            for inherited in self.graph.fields(sup) {
                let refined = match fields.iter().find(|f| f.name == inherited.name) {
                    Some(field) => {
                        field.ty == inherited.ty || sub_ctx.is_subtype(field.ty, inherited.ty)?
                    }
                    None => false,
                };
                if !refined {
                    return Err(TypeError::FieldConflict {
                        tag: tag.to_string(),
                        supertag: self.graph.label(sup),
                        field: inherited.name.clone(),
                    });
                }
            }
        }

        // Tags registered below a forward declaration must already carry its fields
        let declared = match self.graph.lookup(tag) {
            Some(declared) => declared,
            None => return Ok(()),
        };
        for below in self.graph.descendants(declared) {
            let below_fields = self.graph.fields(below);
            for field in fields {
                let refined = match below_fields.iter().find(|f| f.name == field.name) {
                    Some(existing) => {
                        existing.ty == field.ty || sub_ctx.is_subtype(existing.ty, field.ty)?
                    }
                    None => false,
                };
                if !refined {
                    return Err(TypeError::FieldConflict {
                        tag: self.graph.label(below),
                        supertag: tag.to_string(),
                        field: field.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Forward-declare a tag so it can be named as a supertag before its definition
    pub fn declare_tag(&mut self, tag: &str) -> TypeResult<TagId> {
        self.graph.declare(tag)
    }

    /// Registered descriptor of a tag
    pub fn tag_descriptor(&self, tag: &str) -> Option<TypeId> {
        self.graph.lookup(tag).and_then(|t| self.graph.descriptor(t))
    }

    /// Look up a tag id by name
    pub fn lookup_tag(&self, tag: &str) -> Option<TagId> {
        self.graph.lookup(tag)
    }

    /// Close the registry; ancestor sets are cached from here on
    pub fn freeze(&mut self) {
        self.graph.freeze();
    }

    // Placeholders

    /// Create an unresolved placeholder for a recursive definition
    pub fn placeholder(&mut self, name: impl Into<String>) -> TypeId {
        let id = TypeId(self.slots.len() as u32);
        self.slots.push(Slot::Placeholder {
            name: name.into(),
            target: None,
        });
        id
    }

    /// Fix a placeholder to its target, exactly once
    pub fn resolve_placeholder(&mut self, placeholder: TypeId, target: TypeId) -> TypeResult<()> {
        let name = match self.slots.get(placeholder.0 as usize) {
            Some(Slot::Placeholder { name, target: None }) => name.clone(),
            Some(Slot::Placeholder {
                name,
                target: Some(_),
            }) => {
                return Err(TypeError::PlaceholderAlreadyResolved { name: name.clone() })
            }
            _ => return Err(TypeError::NotAPlaceholder { id: placeholder.0 }),
        };

        if self.slots.get(target.0 as usize).is_none() {
            return Err(TypeError::InvalidTypeId { id: target.0 });
        }

        // Reject chains of placeholders that lead back to this one
        let mut current = target;
        let mut seen = FxHashSet::default();
        while let Some(Slot::Placeholder {
            target: Some(next), ..
        }) = self.slots.get(current.0 as usize)
        {
            if !seen.insert(current) {
                break;
            }
            current = *next;
        }
        if current == placeholder {
            return Err(TypeError::CyclicPlaceholder { name });
        }

        self.slots[placeholder.0 as usize] = Slot::Placeholder {
            name: name.clone(),
            target: Some(target),
        };
        tracing::trace!(placeholder = %name, target = %target, "resolved placeholder");
        Ok(())
    }

    /// Name of a placeholder, if `id` is one
    pub fn placeholder_name(&self, id: TypeId) -> Option<&str> {
        match self.slots.get(id.0 as usize) {
            Some(Slot::Placeholder { name, .. }) => Some(name),
            _ => None,
        }
    }

    // Queries

    /// Check if `sub` is a subtype of `sup`
    pub fn is_subtype(&self, sub: TypeId, sup: TypeId) -> TypeResult<bool> {
        SubtypingContext::new(self).is_subtype(sub, sup)
    }

    /// Type equality: mutual subtyping
    pub fn equal(&self, a: TypeId, b: TypeId) -> TypeResult<bool> {
        let mut sub_ctx = SubtypingContext::new(self);
        Ok(sub_ctx.is_subtype(a, b)? && sub_ctx.is_subtype(b, a)?)
    }

    /// Get a display string for a type
    ///
    /// Placeholders print by name, which keeps recursive types finite.
    pub fn display(&self, id: TypeId) -> String {
        if let Some(name) = self.placeholder_name(id) {
            return name.to_string();
        }
        let ty = match self.slots.get(id.0 as usize) {
            Some(Slot::Type(ty)) => ty,
            _ => return format!("InvalidType({})", id.0),
        };
        match ty.as_ref() {
            Type::Tuple(t) => {
                let parts: Vec<String> = t.elements.iter().map(|&e| self.display(e)).collect();
                format!("({})", parts.join(", "))
            }
            Type::Sequence(s) => format!("Sequence<{}>", self.display(s.element)),
            Type::Object(o) => {
                let name = self.graph.label(o.tag);
                if o.fields.is_empty() {
                    name
                } else {
                    let parts: Vec<String> = o
                        .fields
                        .iter()
                        .map(|f| format!("{}: {}", f.name, self.display(f.ty)))
                        .collect();
                    format!("{} {{ {} }}", name, parts.join(", "))
                }
            }
            Type::Union(u) => {
                let parts: Vec<String> = u.members.iter().map(|&m| self.display(m)).collect();
                parts.join(" | ")
            }
            other => format!("{}", other),
        }
    }

    /// Get the number of arena slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the context is empty
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Sort fields by name, letting a later duplicate replace an earlier one
fn canonical_fields(fields: Vec<Field>) -> Vec<Field> {
    let mut out: Vec<Field> = Vec::with_capacity(fields.len());
    for field in fields {
        match out.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => existing.ty = field.ty,
            None => out.push(field),
        }
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_interning() {
        let mut ctx = TypeContext::new();
        let int = ctx.integer_type();

        let seq1 = ctx.sequence_type(int);
        let seq2 = ctx.sequence_type(int);
        assert_eq!(seq1, seq2);
        assert_eq!(ctx.lookup(&Type::Numeric(NumericKind::Integer)), Some(int));
    }

    #[test]
    fn test_well_known_ids() {
        let ctx = TypeContext::new();
        assert_eq!(ctx.get(TypeContext::ANY), Some(&Type::Any));
        assert_eq!(ctx.get(TypeContext::NOTHING), Some(&Type::Nothing));
        assert_eq!(
            ctx.get(ctx.real_type()),
            Some(&Type::Numeric(NumericKind::Real))
        );
        assert_eq!(
            ctx.get(ctx.datetime_type()),
            Some(&Type::Leaf(LeafKind::DateTime))
        );
        assert_eq!(ctx.tag_descriptor("Object"), Some(TypeContext::ROOT_OBJECT));
    }

    #[test]
    fn test_object_fields_are_canonical() {
        let mut ctx = TypeContext::new();
        let int = ctx.integer_type();
        let string = ctx.string_type();

        let a = ctx
            .object_type("Object", vec![Field::new("b", string), Field::new("a", int)])
            .unwrap();
        let b = ctx
            .object_type("Object", vec![Field::new("a", int), Field::new("b", string)])
            .unwrap();
        assert_eq!(a, b);

        assert_eq!(
            ctx.object_type("Nope", vec![]),
            Err(TypeError::UnknownTag { tag: "Nope".into() })
        );
    }

    #[test]
    fn test_registration_inherits_fields() {
        let mut ctx = TypeContext::new();
        let int = ctx.integer_type();
        let string = ctx.string_type();

        ctx.register_object_tag("Base", vec![Field::new("id", int)], &[])
            .unwrap();
        let derived = ctx
            .register_object_tag("Derived", vec![Field::new("name", string)], &["Base"])
            .unwrap();

        let obj = ctx.get(derived).and_then(Type::as_object).unwrap();
        assert_eq!(obj.fields.len(), 2);
        assert_eq!(obj.field("id").map(|f| f.ty), Some(int));
        assert_eq!(obj.field("name").map(|f| f.ty), Some(string));
        assert_eq!(ctx.display(derived), "Derived { id: Integer, name: String }");
    }

    #[test]
    fn test_field_override_must_refine() {
        let mut ctx = TypeContext::new();
        let int = ctx.integer_type();
        let real = ctx.real_type();
        let string = ctx.string_type();
        ctx.register_object_tag("Measure", vec![Field::new("value", real)], &[])
            .unwrap();

        ctx.register_object_tag("Count", vec![Field::new("value", int)], &["Measure"])
            .unwrap();
        assert_eq!(
            ctx.register_object_tag("Label", vec![Field::new("value", string)], &["Measure"]),
            Err(TypeError::FieldConflict {
                tag: "Label".into(),
                supertag: "Measure".into(),
                field: "value".into(),
            })
        );
        assert!(ctx.lookup_tag("Label").is_none());
    }

    #[test]
    fn test_failed_registration_changes_nothing() {
        let mut ctx = TypeContext::new();
        let before_slots = ctx.len();
        let before_tags = ctx.graph().len();

        let err = ctx
            .register_object_tag("Orphan", vec![], &["Missing"])
            .unwrap_err();
        assert!(matches!(err, TypeError::UnknownSupertag { .. }));
        assert_eq!(ctx.len(), before_slots);
        assert_eq!(ctx.graph().len(), before_tags);
        assert!(ctx.lookup_tag("Orphan").is_none());
    }

    #[test]
    fn test_placeholder_lifecycle() {
        let mut ctx = TypeContext::new();
        let int = ctx.integer_type();
        let p = ctx.placeholder("List");

        assert_eq!(
            ctx.resolve(p),
            Err(TypeError::UnresolvedPlaceholder {
                name: "List".into()
            })
        );
        assert!(ctx.get(p).is_none());

        let seq = ctx.sequence_type(int);
        ctx.resolve_placeholder(p, seq).unwrap();
        assert_eq!(ctx.canonical(p), Ok(seq));
        assert_eq!(ctx.display(p), "List");

        assert_eq!(
            ctx.resolve_placeholder(p, int),
            Err(TypeError::PlaceholderAlreadyResolved {
                name: "List".into()
            })
        );
        assert_eq!(
            ctx.resolve_placeholder(int, seq),
            Err(TypeError::NotAPlaceholder { id: int.index() })
        );
    }

    #[test]
    fn test_placeholder_cannot_point_at_itself() {
        let mut ctx = TypeContext::new();
        let a = ctx.placeholder("A");
        let b = ctx.placeholder("B");
        ctx.resolve_placeholder(b, a).unwrap();

        assert_eq!(
            ctx.resolve_placeholder(a, b),
            Err(TypeError::CyclicPlaceholder { name: "A".into() })
        );
        assert_eq!(
            ctx.resolve_placeholder(a, a),
            Err(TypeError::CyclicPlaceholder { name: "A".into() })
        );
    }

    #[test]
    fn test_display() {
        let mut ctx = TypeContext::new();
        let int = ctx.integer_type();
        let null = ctx.null_type();
        let tuple = ctx.tuple_type(vec![int, null]);
        let seq = ctx.sequence_type(tuple);
        assert_eq!(ctx.display(seq), "Sequence<(Integer, Null)>");
        assert_eq!(ctx.display(TypeId(9999)), "InvalidType(9999)");
    }

    #[test]
    fn test_foreign_ids_are_rejected() {
        let mut ctx = TypeContext::new();
        let foreign = TypeId(9999);
        let int = ctx.integer_type();
        let p = ctx.placeholder("P");

        assert_eq!(ctx.canonical(foreign), Err(TypeError::InvalidTypeId { id: 9999 }));
        assert_eq!(ctx.get(foreign), None);
        assert_eq!(
            ctx.is_subtype(int, foreign),
            Err(TypeError::InvalidTypeId { id: 9999 })
        );
        assert_eq!(
            ctx.resolve_placeholder(p, foreign),
            Err(TypeError::InvalidTypeId { id: 9999 })
        );

        // Tags from a larger registry are labelled by id, never looked up
        let stray = TagId(42);
        assert_eq!(ctx.graph().name(stray), None);
        assert_eq!(ctx.graph().label(stray), "TagId(42)");
        assert!(ctx.graph().supertags(stray).is_empty());
        assert!(ctx.graph().fields(stray).is_empty());
        assert!(!ctx.graph().is_defined(stray));
    }
}

//! Core type definitions for the Lattice type algebra

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a type in the type context
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    /// Raw index into the owning context's arena
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Identifier of a nominal tag in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagId(pub(crate) u32);

impl TagId {
    /// The implicit root tag every other tag reaches
    pub const ROOT: TagId = TagId(0);

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TagId({})", self.0)
    }
}

/// Parameterless constructors that denote exactly one type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SingletonKind {
    /// `true` and `false`
    Boolean,
    /// The `null` value
    Null,
}

impl fmt::Display for SingletonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SingletonKind::Boolean => write!(f, "Boolean"),
            SingletonKind::Null => write!(f, "Null"),
        }
    }
}

/// The numeric tower, ordered from least to most general
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NumericKind {
    /// Whole numbers
    Integer,
    /// Ratios of integers
    Rational,
    /// Real numbers
    Real,
    /// Complex numbers
    Complex,
}

impl NumericKind {
    /// Position in the numeric tower; a lower rank is a subtype of a higher one
    pub fn rank(self) -> u8 {
        match self {
            NumericKind::Integer => 0,
            NumericKind::Rational => 1,
            NumericKind::Real => 2,
            NumericKind::Complex => 3,
        }
    }
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericKind::Integer => write!(f, "Integer"),
            NumericKind::Rational => write!(f, "Rational"),
            NumericKind::Real => write!(f, "Real"),
            NumericKind::Complex => write!(f, "Complex"),
        }
    }
}

/// Opaque leaf types with no internal structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeafKind {
    /// Text
    String,
    /// A point in time
    DateTime,
}

impl fmt::Display for LeafKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeafKind::String => write!(f, "String"),
            LeafKind::DateTime => write!(f, "DateTime"),
        }
    }
}

/// Named field of an object type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Field type
    pub ty: TypeId,
}

impl Field {
    /// Create a field
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Field {
            name: name.into(),
            ty,
        }
    }
}

/// Object type: a record view over a nominal tag
///
/// Fields are kept sorted by name so that equal views intern to the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectType {
    /// Nominal tag
    pub tag: TagId,
    /// Fields, sorted by name
    pub fields: Vec<Field>,
}

impl ObjectType {
    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .binary_search_by(|f| f.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.fields[i])
    }
}

/// Tuple type: (T1, T2, ..., Tn)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TupleType {
    /// Slot types
    pub elements: Vec<TypeId>,
}

/// Sequence type: T*
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequenceType {
    /// Element type
    pub element: TypeId,
}

/// Union type: T1 | T2 | ... | Tn
///
/// Only built by the normalizer. Members are flat, free of subsumed
/// clauses and sorted by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnionType {
    /// Clauses of the union
    pub members: Vec<TypeId>,
}

/// A type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Top type: every type is a subtype of it
    Any,

    /// Bottom type: a subtype of every type
    Nothing,

    /// One-type constructor (Boolean, Null)
    Singleton(SingletonKind),

    /// Numeric tower member
    Numeric(NumericKind),

    /// String or DateTime
    Leaf(LeafKind),

    /// Fixed-arity positional product
    Tuple(TupleType),

    /// Nominal record
    Object(ObjectType),

    /// Homogeneous list
    Sequence(SequenceType),

    /// Normalized union
    Union(UnionType),
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => write!(f, "Any"),
            Type::Nothing => write!(f, "Nothing"),
            Type::Singleton(s) => write!(f, "{}", s),
            Type::Numeric(n) => write!(f, "{}", n),
            Type::Leaf(l) => write!(f, "{}", l),
            Type::Tuple(t) => {
                write!(f, "(")?;
                for (i, elem) in t.elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", elem)?;
                }
                write!(f, ")")
            }
            Type::Object(o) => {
                write!(f, "object#{} {{ ", o.tag.0)?;
                for (i, field) in o.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.ty)?;
                }
                write!(f, " }}")
            }
            Type::Sequence(s) => write!(f, "{}*", s.element),
            Type::Union(u) => {
                for (i, member) in u.members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", member)?;
                }
                Ok(())
            }
        }
    }
}

impl Type {
    /// Check if this type is the top type
    pub fn is_any(&self) -> bool {
        matches!(self, Type::Any)
    }

    /// Check if this type is the bottom type
    pub fn is_nothing(&self) -> bool {
        matches!(self, Type::Nothing)
    }

    /// Check if this type is a union type
    pub fn is_union(&self) -> bool {
        matches!(self, Type::Union(_))
    }

    /// Get the object type if this is an object
    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            Type::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Get the union type if this is a union
    pub fn as_union(&self) -> Option<&UnionType> {
        match self {
            Type::Union(u) => Some(u),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_rank_order() {
        assert!(NumericKind::Integer.rank() < NumericKind::Rational.rank());
        assert!(NumericKind::Rational.rank() < NumericKind::Real.rank());
        assert!(NumericKind::Real.rank() < NumericKind::Complex.rank());
        assert!(NumericKind::Integer < NumericKind::Complex);
    }

    #[test]
    fn test_leaf_display() {
        assert_eq!(format!("{}", Type::Leaf(LeafKind::String)), "String");
        assert_eq!(format!("{}", Type::Leaf(LeafKind::DateTime)), "DateTime");
        assert_eq!(format!("{}", Type::Singleton(SingletonKind::Null)), "Null");
    }

    #[test]
    fn test_type_is_methods() {
        assert!(Type::Any.is_any());
        assert!(!Type::Any.is_nothing());
        assert!(Type::Nothing.is_nothing());

        let union = Type::Union(UnionType {
            members: vec![TypeId(1), TypeId(2)],
        });
        assert!(union.is_union());
        assert_eq!(union.as_union().map(|u| u.members.len()), Some(2));
        assert!(union.as_object().is_none());
        assert_eq!(format!("{}", union), "TypeId(1) | TypeId(2)");
    }

    #[test]
    fn test_object_field_lookup() {
        let obj = ObjectType {
            tag: TagId(3),
            fields: vec![Field::new("a", TypeId(1)), Field::new("b", TypeId(2))],
        };
        assert_eq!(obj.field("b").map(|f| f.ty), Some(TypeId(2)));
        assert!(obj.field("c").is_none());
    }
}

//! Subtyping rules for the Lattice type algebra
//!
//! Implements the subtyping relation T <: U (T is a subtype of U).

use crate::context::TypeContext;
use crate::error::TypeResult;
use crate::ty::{Type, TypeId};
use rustc_hash::FxHashSet;

/// Context for checking subtyping relationships
///
/// Keeps the set of pairs currently under examination. A pair that is met
/// again while it is still being checked is assumed to hold, which makes
/// checks over recursive (placeholder-built) types terminate.
#[derive(Debug, Clone)]
pub struct SubtypingContext<'a> {
    /// Type context for resolving types
    type_ctx: &'a TypeContext,

    /// Pairs assumed to hold while their check is in progress
    assumptions: FxHashSet<(TypeId, TypeId)>,
}

impl<'a> SubtypingContext<'a> {
    /// Create a new subtyping context
    pub fn new(type_ctx: &'a TypeContext) -> Self {
        SubtypingContext {
            type_ctx,
            assumptions: FxHashSet::default(),
        }
    }

    /// Check if `sub` is a subtype of `sup` (sub <: sup)
    ///
    /// Returns true if a value of type `sub` can be used where `sup` is expected.
    /// Fails only when an unresolved placeholder is reached.
    pub fn is_subtype(&mut self, sub: TypeId, sup: TypeId) -> TypeResult<bool> {
        let sub = self.type_ctx.canonical(sub)?;
        let sup = self.type_ctx.canonical(sup)?;

        // Reflexivity: T <: T
        if sub == sup {
            return Ok(true);
        }

        if !self.assumptions.insert((sub, sup)) {
            return Ok(true);
        }
        let result = self.check(sub, sup);
        self.assumptions.remove(&(sub, sup));
        result
    }

    fn check(&mut self, sub: TypeId, sup: TypeId) -> TypeResult<bool> {
        let ctx = self.type_ctx;
        let sub_ty = ctx.resolve(sub)?;
        let sup_ty = ctx.resolve(sup)?;

        match (sub_ty, sup_ty) {
            // Any is the top, Nothing the bottom
            (_, Type::Any) | (Type::Nothing, _) => Ok(true),

            (Type::Singleton(s1), Type::Singleton(s2)) => Ok(s1 == s2),

            // Integer <: Rational <: Real <: Complex
            (Type::Numeric(n1), Type::Numeric(n2)) => Ok(n1.rank() <= n2.rank()),

            (Type::Leaf(l1), Type::Leaf(l2)) => Ok(l1 == l2),

            // (T1, ..., Tn) <: (U1, ..., Um) if n = m and Ti <: Ui for all i
            (Type::Tuple(t1), Type::Tuple(t2)) => {
                if t1.elements.len() != t2.elements.len() {
                    return Ok(false);
                }
                for (&e1, &e2) in t1.elements.iter().zip(&t2.elements) {
                    if !self.is_subtype(e1, e2)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }

            // Nominal tag check, then width and depth over the supertype's fields
            (Type::Object(o1), Type::Object(o2)) => {
                if !ctx.graph().is_subtag(o1.tag, o2.tag) {
                    return Ok(false);
                }
                for f2 in &o2.fields {
                    match o1.field(&f2.name) {
                        Some(f1) => {
                            if !self.is_subtype(f1.ty, f2.ty)? {
                                return Ok(false);
                            }
                        }
                        None => return Ok(false),
                    }
                }
                Ok(true)
            }

            // T* <: U* if T <: U
            (Type::Sequence(s1), Type::Sequence(s2)) => self.is_subtype(s1.element, s2.element),

            // T1 | T2 | ... | Tn <: U if Ti <: U for all i
            (Type::Union(union), _) => {
                for &member in &union.members {
                    if !self.is_subtype(member, sup)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }

            // T <: U1 | U2 | ... | Un if T <: Ui for some i
            (_, Type::Union(union)) => {
                for &member in &union.members {
                    if self.is_subtype(sub, member)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }

            // No other subtyping relationships
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TypeError;
    use crate::ty::Field;

    #[test]
    fn test_reflexivity() {
        let mut ctx = TypeContext::new();
        let int = ctx.integer_type();
        let seq = ctx.sequence_type(int);
        let mut sub_ctx = SubtypingContext::new(&ctx);

        assert!(sub_ctx.is_subtype(int, int).unwrap());
        assert!(sub_ctx.is_subtype(seq, seq).unwrap());
    }

    #[test]
    fn test_nothing_is_bottom() {
        let ctx = TypeContext::new();
        let nothing = ctx.nothing_type();
        let int = ctx.integer_type();
        let mut sub_ctx = SubtypingContext::new(&ctx);

        assert!(sub_ctx.is_subtype(nothing, int).unwrap());
        assert!(sub_ctx.is_subtype(nothing, nothing).unwrap());
        assert!(!sub_ctx.is_subtype(int, nothing).unwrap());
    }

    #[test]
    fn test_any_is_top() {
        let ctx = TypeContext::new();
        let any = ctx.any_type();
        let string = ctx.string_type();
        let mut sub_ctx = SubtypingContext::new(&ctx);

        assert!(sub_ctx.is_subtype(string, any).unwrap());
        assert!(!sub_ctx.is_subtype(any, string).unwrap());
        assert!(!sub_ctx.is_subtype(any, ctx.nothing_type()).unwrap());
    }

    #[test]
    fn test_numeric_tower() {
        let ctx = TypeContext::new();
        let mut sub_ctx = SubtypingContext::new(&ctx);

        assert!(sub_ctx.is_subtype(ctx.integer_type(), ctx.real_type()).unwrap());
        assert!(sub_ctx.is_subtype(ctx.rational_type(), ctx.complex_type()).unwrap());
        assert!(!sub_ctx.is_subtype(ctx.complex_type(), ctx.integer_type()).unwrap());
    }

    #[test]
    fn test_leaves_and_singletons() {
        let ctx = TypeContext::new();
        let mut sub_ctx = SubtypingContext::new(&ctx);

        assert!(!sub_ctx.is_subtype(ctx.string_type(), ctx.datetime_type()).unwrap());
        assert!(!sub_ctx.is_subtype(ctx.boolean_type(), ctx.null_type()).unwrap());
        assert!(!sub_ctx.is_subtype(ctx.null_type(), ctx.integer_type()).unwrap());
    }

    #[test]
    fn test_tuple_subtyping() {
        let mut ctx = TypeContext::new();
        let int = ctx.integer_type();
        let real = ctx.real_type();
        let string = ctx.string_type();
        let narrow = ctx.tuple_type(vec![int, string]);
        let wide = ctx.tuple_type(vec![real, string]);
        let longer = ctx.tuple_type(vec![int, string, string]);
        let empty1 = ctx.tuple_type(vec![]);
        let seq = ctx.sequence_type(int);
        let mut sub_ctx = SubtypingContext::new(&ctx);

        assert!(sub_ctx.is_subtype(narrow, wide).unwrap());
        assert!(!sub_ctx.is_subtype(wide, narrow).unwrap());
        assert!(!sub_ctx.is_subtype(longer, wide).unwrap());
        assert!(!sub_ctx.is_subtype(wide, longer).unwrap());
        assert!(sub_ctx.is_subtype(empty1, empty1).unwrap());
        assert!(!sub_ctx.is_subtype(empty1, narrow).unwrap());
        assert!(!sub_ctx.is_subtype(seq, empty1).unwrap());
        assert!(!sub_ctx.is_subtype(empty1, seq).unwrap());
    }

    #[test]
    fn test_object_width_and_depth() {
        let mut ctx = TypeContext::new();
        let int = ctx.integer_type();
        let real = ctx.real_type();
        let base = ctx
            .register_object_tag("Base", vec![Field::new("x", real)], &[])
            .unwrap();
        let sub = ctx
            .register_object_tag("Sub", vec![Field::new("x", int), Field::new("y", int)], &["Base"])
            .unwrap();
        let other = ctx
            .register_object_tag("Other", vec![Field::new("x", int)], &[])
            .unwrap();
        let mut sub_ctx = SubtypingContext::new(&ctx);

        assert!(sub_ctx.is_subtype(sub, base).unwrap());
        assert!(!sub_ctx.is_subtype(base, sub).unwrap());
        // Same shape, different lineage
        assert!(!sub_ctx.is_subtype(other, base).unwrap());
        assert!(sub_ctx.is_subtype(other, TypeContext::ROOT_OBJECT).unwrap());
    }

    #[test]
    fn test_union_subtyping() {
        let mut ctx = TypeContext::new();
        let int = ctx.integer_type();
        let string = ctx.string_type();
        let union = ctx.union_type(vec![int, string]).unwrap();
        let mut sub_ctx = SubtypingContext::new(&ctx);

        assert!(sub_ctx.is_subtype(int, union).unwrap());
        assert!(sub_ctx.is_subtype(string, union).unwrap());
        assert!(sub_ctx.is_subtype(union, union).unwrap());
        assert!(!sub_ctx.is_subtype(union, int).unwrap());
        assert!(sub_ctx.is_subtype(union, ctx.any_type()).unwrap());
    }

    #[test]
    fn test_recursive_types_terminate() {
        let mut ctx = TypeContext::new();
        ctx.register_object_tag("Node", vec![], &[]).unwrap();
        let int = ctx.integer_type();
        let real = ctx.real_type();
        let null = ctx.null_type();

        // Node { value: Integer, next: Node | Null } and the same over Real
        let int_next = ctx.placeholder("IntNext");
        let int_node = ctx
            .object_type("Node", vec![Field::new("value", int), Field::new("next", int_next)])
            .unwrap();
        let int_tail = ctx.union_type(vec![int_node, null]).unwrap();
        ctx.resolve_placeholder(int_next, int_tail).unwrap();

        let real_next = ctx.placeholder("RealNext");
        let real_node = ctx
            .object_type("Node", vec![Field::new("value", real), Field::new("next", real_next)])
            .unwrap();
        let real_tail = ctx.union_type(vec![real_node, null]).unwrap();
        ctx.resolve_placeholder(real_next, real_tail).unwrap();

        let mut sub_ctx = SubtypingContext::new(&ctx);
        assert!(sub_ctx.is_subtype(int_node, real_node).unwrap());
        assert!(!sub_ctx.is_subtype(real_node, int_node).unwrap());
    }

    #[test]
    fn test_unresolved_placeholder_is_an_error() {
        let mut ctx = TypeContext::new();
        let p = ctx.placeholder("Later");
        let seq = ctx.sequence_type(p);
        let int_seq = {
            let int = ctx.integer_type();
            ctx.sequence_type(int)
        };
        let mut sub_ctx = SubtypingContext::new(&ctx);

        assert_eq!(
            sub_ctx.is_subtype(int_seq, seq),
            Err(TypeError::UnresolvedPlaceholder {
                name: "Later".into()
            })
        );
    }
}

//! Join algorithms over the nominal hierarchy
//!
//! The join of two tags is the unique minimal element of the intersection of
//! their ancestor sets. The implicit root is never a join candidate between
//! two other tags: every tag reaches it, so merging to it would throw away
//! all precision. Joins are nominal only and never widen field sets.

use crate::context::TypeContext;
use crate::error::{TypeError, TypeResult};
use crate::nominal::NominalGraph;
use crate::subtyping::SubtypingContext;
use crate::ty::{TagId, Type, TypeId};

/// Minimal common ancestors of two tags, root excluded, sorted by id
pub fn minimal_common_ancestors(graph: &NominalGraph, a: TagId, b: TagId) -> Vec<TagId> {
    let left = graph.ancestors(a);
    let right = graph.ancestors(b);
    let common: Vec<TagId> = left
        .iter()
        .filter(|t| **t != TagId::ROOT && right.contains(t))
        .copied()
        .collect();

    let mut minimal: Vec<TagId> = common
        .iter()
        .copied()
        .filter(|&candidate| {
            !common
                .iter()
                .any(|&other| other != candidate && graph.ancestors(other).contains(&candidate))
        })
        .collect();
    minimal.sort_unstable();
    minimal
}

/// Least common supertag of `a` and `b`
///
/// Fails with [`TypeError::AmbiguousJoin`] when several incomparable common
/// ancestors are minimal, and with [`TypeError::NoCommonAncestor`] when the
/// two tags only meet at the root.
pub fn join_tags(graph: &NominalGraph, a: TagId, b: TagId) -> TypeResult<TagId> {
    if a == b {
        return Ok(a);
    }
    if a == TagId::ROOT || b == TagId::ROOT {
        return Ok(TagId::ROOT);
    }

    let minimal = minimal_common_ancestors(graph, a, b);
    match minimal.as_slice() {
        [single] => Ok(*single),
        [] => Err(TypeError::NoCommonAncestor {
            left: graph.label(a),
            right: graph.label(b),
        }),
        candidates => Err(TypeError::AmbiguousJoin {
            left: graph.label(a),
            right: graph.label(b),
            candidates: candidates.iter().map(|&t| graph.label(t)).collect(),
        }),
    }
}

/// A set of object clauses sharing one running join
#[derive(Debug, Clone)]
struct JoinGroup {
    tag: TagId,
    members: Vec<TypeId>,
}

/// Partition object clauses into join groups and collapse each group
///
/// Object clauses are visited in id order, so the partition depends only on
/// the set of clauses. Each clause is folded into the first group whose running join with it
/// exists and whose join descriptor is a supertype of every member;
/// otherwise it starts a new group. Groups of one clause pass through
/// unchanged, larger groups become the registered descriptor of their join.
/// Clauses that are not object types are returned as they are.
pub fn group_joins(ctx: &TypeContext, clauses: &[TypeId]) -> TypeResult<Vec<TypeId>> {
    let graph = ctx.graph();
    let mut sub_ctx = SubtypingContext::new(ctx);
    let mut groups: Vec<JoinGroup> = Vec::new();
    let mut passthrough = Vec::new();

    let mut objects = Vec::with_capacity(clauses.len());
    for &clause in clauses {
        match ctx.resolve(clause)? {
            Type::Object(obj) => objects.push((clause, obj.tag)),
            _ => passthrough.push(clause),
        }
    }
    objects.sort_unstable_by_key(|&(clause, _)| clause);

    'clauses: for (clause, tag) in objects {
        for group in groups.iter_mut() {
            let joined = match join_tags(graph, group.tag, tag) {
                Ok(joined) => joined,
                Err(_) => continue,
            };
            let descriptor = match graph.descriptor(joined) {
                Some(descriptor) => descriptor,
                None => continue,
            };

            let mut covers_all = sub_ctx.is_subtype(clause, descriptor)?;
            for &member in &group.members {
                if !covers_all {
                    break;
                }
                covers_all = sub_ctx.is_subtype(member, descriptor)?;
            }
            if !covers_all {
                continue;
            }

            tracing::trace!(
                group = %graph.label(group.tag),
                clause = %graph.label(tag),
                join = %graph.label(joined),
                "folded clause into join group"
            );
            group.tag = joined;
            group.members.push(clause);
            continue 'clauses;
        }

        groups.push(JoinGroup {
            tag,
            members: vec![clause],
        });
    }

    let mut result = passthrough;
    for group in groups {
        match group.members.as_slice() {
            [single] => result.push(*single),
            _ => match graph.descriptor(group.tag) {
                Some(descriptor) => result.push(descriptor),
                None => result.extend(group.members),
            },
        }
    }
    Ok(result)
}

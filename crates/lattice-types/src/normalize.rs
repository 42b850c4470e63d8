//! Union normalization
//!
//! Builds the canonical form of a union from arbitrary candidates:
//! flatten nested unions, drop duplicates, drop clauses subsumed by a
//! sibling, then merge object clauses that share an unambiguous nominal
//! join. The result is `Nothing` for no clauses, the clause itself for one
//! clause, and an interned union sorted by id otherwise.

use crate::context::TypeContext;
use crate::error::TypeResult;
use crate::poset::group_joins;
use crate::subtyping::SubtypingContext;
use crate::ty::{Type, TypeId, UnionType};
use rustc_hash::FxHashSet;

impl TypeContext {
    /// Create a normalized union type
    ///
    /// Fails only if a candidate is, or flattens into, an unresolved placeholder.
    pub fn union_type(&mut self, candidates: Vec<TypeId>) -> TypeResult<TypeId> {
        let flat = self.flatten_union_members(&candidates)?;
        let clauses = {
            let mut sub_ctx = SubtypingContext::new(self);
            let unique = dedup_equal(&mut sub_ctx, flat)?;
            let mut clauses = drop_subsumed(&mut sub_ctx, unique)?;

            if self.options().merge_nominal && count_objects(self, &clauses)? > 1 {
                let merged = group_joins(self, &clauses)?;
                clauses = drop_subsumed(&mut sub_ctx, dedup_ids(merged))?;
            }
            clauses
        };

        tracing::trace!(
            candidates = candidates.len(),
            clauses = clauses.len(),
            "normalized union"
        );

        match clauses.as_slice() {
            [] => Ok(Self::NOTHING),
            [single] => Ok(*single),
            _ => {
                let mut members = clauses;
                members.sort_unstable();
                Ok(self.intern(Type::Union(UnionType { members })))
            }
        }
    }

    /// Inline nested unions, dropping `Nothing` and exact duplicates
    ///
    /// The result is sorted by id, so every later step sees the same clause
    /// order for the same set of candidates.
    fn flatten_union_members(&self, candidates: &[TypeId]) -> TypeResult<Vec<TypeId>> {
        let mut flat = Vec::with_capacity(candidates.len());
        let mut stack: Vec<TypeId> = candidates.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let id = self.canonical(id)?;
            match self.resolve(id)? {
                Type::Union(union) => stack.extend(union.members.iter().rev().copied()),
                Type::Nothing => {}
                _ => flat.push(id),
            }
        }
        flat.sort_unstable();
        flat.dedup();
        Ok(flat)
    }
}

fn dedup_ids(ids: Vec<TypeId>) -> Vec<TypeId> {
    let mut seen = FxHashSet::default();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Keep the first of every group of mutually equal clauses
fn dedup_equal(sub_ctx: &mut SubtypingContext<'_>, clauses: Vec<TypeId>) -> TypeResult<Vec<TypeId>> {
    let mut kept: Vec<TypeId> = Vec::with_capacity(clauses.len());
    'outer: for clause in clauses {
        for &existing in &kept {
            if sub_ctx.is_subtype(clause, existing)? && sub_ctx.is_subtype(existing, clause)? {
                continue 'outer;
            }
        }
        kept.push(clause);
    }
    Ok(kept)
}

/// Drop every clause that is a subtype of another clause
///
/// Expects clauses to be pairwise unequal, so subsumption is strict.
fn drop_subsumed(sub_ctx: &mut SubtypingContext<'_>, clauses: Vec<TypeId>) -> TypeResult<Vec<TypeId>> {
    let mut kept = Vec::with_capacity(clauses.len());
    'outer: for (i, &clause) in clauses.iter().enumerate() {
        for (j, &other) in clauses.iter().enumerate() {
            if i != j && sub_ctx.is_subtype(clause, other)? {
                continue 'outer;
            }
        }
        kept.push(clause);
    }
    Ok(kept)
}

fn count_objects(ctx: &TypeContext, clauses: &[TypeId]) -> TypeResult<usize> {
    let mut count = 0;
    for &clause in clauses {
        if matches!(ctx.resolve(clause)?, Type::Object(_)) {
            count += 1;
        }
    }
    Ok(count)
}

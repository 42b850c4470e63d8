//! Nominal tag registry
//!
//! Owns every object tag by index together with its declared supertags and
//! fields. Supertag edges form a DAG whose single implicit root is
//! [`TagId::ROOT`]; a tag declared without supertags hangs directly off it.
//!
//! Tags can be forward-declared so that mutually referring definitions are
//! expressible. Because completing a forward declaration can add edges above
//! tags that are already registered, ancestor sets are only cached once the
//! registry is frozen.

use crate::error::{TypeError, TypeResult};
use crate::ty::{Field, TagId, TypeId};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// Reflexive-transitive set of ancestors of a tag
pub type AncestorSet = Arc<FxHashSet<TagId>>;

#[derive(Debug, Clone)]
struct TagNode {
    name: String,
    supertags: Vec<TagId>,
    /// Declared fields, including those inherited from supertags
    fields: Vec<Field>,
    /// Registered descriptor; `None` while only forward-declared
    descriptor: Option<TypeId>,
}

/// Registry of nominal tags and their supertag edges
#[derive(Debug)]
pub struct NominalGraph {
    nodes: Vec<TagNode>,
    by_name: FxHashMap<String, TagId>,
    frozen: bool,
    ancestor_cache: RwLock<FxHashMap<TagId, AncestorSet>>,
}

impl Clone for NominalGraph {
    fn clone(&self) -> Self {
        NominalGraph {
            nodes: self.nodes.clone(),
            by_name: self.by_name.clone(),
            frozen: self.frozen,
            ancestor_cache: RwLock::new(self.ancestor_cache.read().clone()),
        }
    }
}

impl NominalGraph {
    /// Create a graph holding only the root tag
    pub(crate) fn new(root_name: &str) -> Self {
        let mut by_name = FxHashMap::default();
        by_name.insert(root_name.to_string(), TagId::ROOT);
        NominalGraph {
            nodes: vec![TagNode {
                name: root_name.to_string(),
                supertags: Vec::new(),
                fields: Vec::new(),
                descriptor: None,
            }],
            by_name,
            frozen: false,
            ancestor_cache: RwLock::new(FxHashMap::default()),
        }
    }

    /// Look up a tag by name
    pub fn lookup(&self, name: &str) -> Option<TagId> {
        self.by_name.get(name).copied()
    }

    /// Name of a tag, `None` for a tag that does not belong to this graph
    pub fn name(&self, tag: TagId) -> Option<&str> {
        self.nodes.get(tag.index()).map(|node| node.name.as_str())
    }

    /// Name of a tag, or its raw id when it does not belong to this graph
    pub fn label(&self, tag: TagId) -> String {
        match self.name(tag) {
            Some(name) => name.to_string(),
            None => tag.to_string(),
        }
    }

    /// Declared direct supertags of a tag (empty for root children and the root)
    pub fn supertags(&self, tag: TagId) -> &[TagId] {
        self.nodes
            .get(tag.index())
            .map_or(&[], |node| node.supertags.as_slice())
    }

    /// Declared fields of a tag, inherited ones included
    pub fn fields(&self, tag: TagId) -> &[Field] {
        self.nodes
            .get(tag.index())
            .map_or(&[], |node| node.fields.as_slice())
    }

    /// Registered descriptor of a tag, if it has been defined
    pub fn descriptor(&self, tag: TagId) -> Option<TypeId> {
        self.nodes.get(tag.index()).and_then(|node| node.descriptor)
    }

    /// Whether the tag has been defined (not just forward-declared)
    pub fn is_defined(&self, tag: TagId) -> bool {
        self.descriptor(tag).is_some()
    }

    /// Whether registration is closed
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Number of tags, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// The graph always holds at least the root
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn set_root_descriptor(&mut self, descriptor: TypeId) {
        self.nodes[TagId::ROOT.index()].descriptor = Some(descriptor);
    }

    /// Forward-declare a tag, returning the existing id if already known
    pub(crate) fn declare(&mut self, name: &str) -> TypeResult<TagId> {
        if let Some(tag) = self.lookup(name) {
            return Ok(tag);
        }
        if self.frozen {
            return Err(TypeError::RegistryFrozen {
                tag: name.to_string(),
            });
        }
        let tag = TagId(self.nodes.len() as u32);
        self.nodes.push(TagNode {
            name: name.to_string(),
            supertags: Vec::new(),
            fields: Vec::new(),
            descriptor: None,
        });
        self.by_name.insert(name.to_string(), tag);
        tracing::trace!(tag = name, "forward-declared tag");
        Ok(tag)
    }

    /// Validate a registration without touching the graph
    ///
    /// Returns the resolved supertag ids, deduplicated in declaration order.
    pub(crate) fn check_registration(
        &self,
        name: &str,
        supertags: &[&str],
    ) -> TypeResult<Vec<TagId>> {
        if self.frozen {
            return Err(TypeError::RegistryFrozen {
                tag: name.to_string(),
            });
        }

        let existing = self.lookup(name);
        if let Some(tag) = existing {
            if self.is_defined(tag) || tag == TagId::ROOT {
                return Err(TypeError::DuplicateTag {
                    tag: name.to_string(),
                });
            }
        }

        let mut resolved = Vec::with_capacity(supertags.len());
        for &sup in supertags {
            let sup_id = self.lookup(sup).ok_or_else(|| TypeError::UnknownSupertag {
                tag: name.to_string(),
                supertag: sup.to_string(),
            })?;
            if !resolved.contains(&sup_id) {
                resolved.push(sup_id);
            }
        }

        // Only a forward-declared tag can already sit below one of its new parents.
        if let Some(tag) = existing {
            for &sup in &resolved {
                if let Some(path) = self.path_to(sup, tag) {
                    let mut names: Vec<&str> = vec![name];
                    names.extend(path.iter().filter_map(|&t| self.name(t)));
                    return Err(TypeError::CyclicHierarchy {
                        cycle: names.join(" -> "),
                    });
                }
            }
        }

        Ok(resolved)
    }

    /// Record a validated registration
    pub(crate) fn define(
        &mut self,
        name: &str,
        supertags: Vec<TagId>,
        fields: Vec<Field>,
        descriptor: TypeId,
    ) -> TagId {
        let tag = match self.lookup(name) {
            Some(tag) => tag,
            None => {
                let tag = TagId(self.nodes.len() as u32);
                self.nodes.push(TagNode {
                    name: name.to_string(),
                    supertags: Vec::new(),
                    fields: Vec::new(),
                    descriptor: None,
                });
                self.by_name.insert(name.to_string(), tag);
                tag
            }
        };
        let node = &mut self.nodes[tag.index()];
        node.supertags = supertags;
        node.fields = fields;
        node.descriptor = Some(descriptor);
        tag
    }

    /// Id `name` has or will receive on definition
    pub(crate) fn next_tag(&self, name: &str) -> TagId {
        self.lookup(name).unwrap_or(TagId(self.nodes.len() as u32))
    }

    /// Close the registry and enable ancestor caching
    pub(crate) fn freeze(&mut self) {
        if !self.frozen {
            self.frozen = true;
            tracing::debug!(tags = self.nodes.len(), "nominal registry frozen");
        }
    }

    /// Reflexive-transitive ancestors of `tag`, the root always included
    pub fn ancestors(&self, tag: TagId) -> AncestorSet {
        if !self.frozen {
            return Arc::new(self.compute_ancestors(tag));
        }
        if let Some(cached) = self.ancestor_cache.read().get(&tag) {
            return Arc::clone(cached);
        }
        let set = Arc::new(self.compute_ancestors(tag));
        self.ancestor_cache
            .write()
            .entry(tag)
            .or_insert_with(|| Arc::clone(&set));
        set
    }

    /// Defined tags strictly below `tag`
    pub(crate) fn descendants(&self, tag: TagId) -> Vec<TagId> {
        (0..self.nodes.len() as u32)
            .map(TagId)
            .filter(|&t| t != tag && self.is_defined(t) && self.ancestors(t).contains(&tag))
            .collect()
    }

    /// Whether `sub` equals or nominally reaches `sup`
    pub fn is_subtag(&self, sub: TagId, sup: TagId) -> bool {
        sub == sup || sup == TagId::ROOT || self.ancestors(sub).contains(&sup)
    }

    fn compute_ancestors(&self, tag: TagId) -> FxHashSet<TagId> {
        let mut seen = FxHashSet::default();
        seen.insert(TagId::ROOT);
        let mut stack = vec![tag];
        while let Some(current) = stack.pop() {
            if seen.insert(current) {
                stack.extend(self.supertags(current).iter().copied());
            }
        }
        seen
    }

    /// Supertag path from `from` up to `to`, both ends included
    fn path_to(&self, from: TagId, to: TagId) -> Option<Vec<TagId>> {
        if from == to {
            return Some(vec![from]);
        }
        let mut visited = FxHashSet::default();
        let mut stack = vec![(from, vec![from])];
        while let Some((current, path)) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            for &sup in self.supertags(current) {
                let mut next = path.clone();
                next.push(sup);
                if sup == to {
                    return Some(next);
                }
                stack.push((sup, next));
            }
        }
        None
    }
}

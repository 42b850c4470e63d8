//! Type system errors

use thiserror::Error;

/// Errors raised by registration, type construction and type queries
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    /// A nominal tag was registered twice
    #[error("Duplicate tag: {tag} is already registered")]
    DuplicateTag {
        /// Tag name
        tag: String,
    },

    /// A supertag named at registration was never registered or declared
    #[error("Unknown supertag: {tag} declares unregistered supertag {supertag}")]
    UnknownSupertag {
        /// Tag being registered
        tag: String,
        /// Missing supertag
        supertag: String,
    },

    /// An object type was built over a tag the registry does not know
    #[error("Unknown tag: {tag}")]
    UnknownTag {
        /// Tag name
        tag: String,
    },

    /// Registration would close a cycle in the nominal hierarchy
    #[error("Cyclic hierarchy detected: {cycle}")]
    CyclicHierarchy {
        /// Description of the cycle
        cycle: String,
    },

    /// A tag lacks, or narrows incompatibly, a field its supertag declares
    #[error("Field conflict: {tag} does not refine field {field} of supertag {supertag}")]
    FieldConflict {
        /// Tag whose field is missing or incompatible
        tag: String,
        /// Supertag declaring the field
        supertag: String,
        /// Field name
        field: String,
    },

    /// Registration attempted after the registry was frozen
    #[error("Registry is frozen: cannot register {tag}")]
    RegistryFrozen {
        /// Tag that was being registered
        tag: String,
    },

    /// A query reached a placeholder that was never resolved
    #[error("Unresolved placeholder: {name}")]
    UnresolvedPlaceholder {
        /// Placeholder name
        name: String,
    },

    /// A placeholder was resolved a second time
    #[error("Placeholder {name} is already resolved")]
    PlaceholderAlreadyResolved {
        /// Placeholder name
        name: String,
    },

    /// A placeholder was resolved to itself, directly or through other placeholders
    #[error("Placeholder {name} resolves to itself")]
    CyclicPlaceholder {
        /// Placeholder name
        name: String,
    },

    /// A type id that does not belong to this context
    #[error("TypeId({id}) does not belong to this context")]
    InvalidTypeId {
        /// Raw type id
        id: u32,
    },

    /// Placeholder resolution targeted an id that is not a placeholder
    #[error("TypeId({id}) is not a placeholder")]
    NotAPlaceholder {
        /// Raw type id
        id: u32,
    },

    /// Two tags have more than one minimal common ancestor
    #[error("Ambiguous join of {left} and {right}: candidates {}", candidates.join(", "))]
    AmbiguousJoin {
        /// Left tag
        left: String,
        /// Right tag
        right: String,
        /// Incomparable minimal common ancestors
        candidates: Vec<String>,
    },

    /// Two tags share no ancestor below the root
    #[error("No common ancestor of {left} and {right} below the root")]
    NoCommonAncestor {
        /// Left tag
        left: String,
        /// Right tag
        right: String,
    },

    /// A runtime value could not be classified for a conformance check
    #[error("Unprobeable value: {reason}")]
    UnprobeableValue {
        /// Why the value could not be probed
        reason: String,
    },

    /// Options could not be parsed
    #[error("Invalid options: {reason}")]
    InvalidOptions {
        /// Parser message
        reason: String,
    },
}

/// Result alias for type operations
pub type TypeResult<T> = Result<T, TypeError>;

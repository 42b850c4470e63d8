//! Lattice Type Algebra
//!
//! Type descriptors, subtyping, union normalization over a nominal
//! hierarchy, and runtime conformance checking.

#![warn(missing_docs)]

pub mod ty;
pub mod context;
pub mod error;
pub mod config;
pub mod nominal;
pub mod subtyping;
pub mod poset;
pub mod normalize;
pub mod value;
pub mod conform;

pub use ty::{Field, LeafKind, NumericKind, SingletonKind, TagId, Type, TypeId};
pub use context::TypeContext;
pub use error::{TypeError, TypeResult};
pub use config::Options;
pub use nominal::{AncestorSet, NominalGraph};
pub use subtyping::SubtypingContext;
pub use poset::{group_joins, join_tags, minimal_common_ancestors};
pub use value::{Number, Record, Value};
pub use conform::ConformanceChecker;

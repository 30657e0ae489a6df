//! Linking Passes
//!
//! Passes that turn the parsed graph into a linked one:
//! - `simple_type`: drops duplicate implicit simple types from extensions
//! - `reference`: resolves property targets across visible namespaces
//! - `subclass`: links bases and overlays, composes inherited properties
//! - `merge`: collapses merge directives into equivalence classes

pub mod disjoint_set;
pub mod merge;
pub mod reference;
pub mod simple_type;
pub mod subclass;

pub use disjoint_set::DisjointSet;
pub use merge::{LeafType, MergeClass, MergeClasses, MergeDirectiveResolver, PropertyPath};
pub use reference::ReferenceResolver;
pub use simple_type::DuplicateSimpleTypeDiminisher;
pub use subclass::{ComposedProperty, Composition, SubclassBaseValidator, SubclassLinker};

//! MetaEd Linker
//!
//! The linking core of the MetaEd toolchain. Takes the unlinked entity graph
//! a parser produces and runs an ordered pipeline of passes over it:
//!
//! - **Reference resolution**: property type names to entities, honoring
//!   namespace visibility
//! - **Subclass linking**: bases, extension overlays, composed property lists
//!   and identity renames
//! - **Merge directives**: path equivalence classes via union-find
//! - **JSON path projection**: AllPaths, DocumentPaths and IdentityPaths per
//!   resource
//! - **Hardcoded security**: version-checked securable elements for a few
//!   legacy resources
//!
//! ## Architecture
//!
//! ```text
//! ModelRepository ──► Pipeline ──► LinkContext
//!   (namespaces,        (passes in     (resolved targets, compositions,
//!    entity arena)       fixed order)    merge classes, api_schema side table,
//!                                        diagnostics)
//! ```
//!
//! ## Example
//!
//! ```
//! use metaed_linker::{DataStandardVersion, ModelBuilder, Pipeline};
//!
//! let repository = ModelBuilder::new()
//!     .namespace("EdFi")
//!     .domain_entity("School")
//!     .integer_identity("SchoolId")
//!     .build()?;
//!
//! let context = Pipeline::core().link(repository, DataStandardVersion::parse("5.0.0")?)?;
//! let school = context.find_resource("School").unwrap();
//! let paths = context.json_paths(school).unwrap();
//! assert_eq!(paths.identity_json_paths(), vec!["$.schoolId"]);
//! # Ok::<(), metaed_linker::LinkError>(())
//! ```

pub mod builder;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod link;
pub mod model;
pub mod naming;
pub mod pipeline;
pub mod projection;
pub mod security;
pub mod version;

pub use builder::ModelBuilder;
pub use config::LinkerConfig;
pub use context::{Aspect, AspectData, LinkContext, SideTable};
pub use diagnostics::{Diagnostics, FailureCode, Severity, ValidationFailure};
pub use error::{LinkError, Result};
pub use model::{
    EntityId, EntityKind, ModelEntity, ModelRepository, Namespace, Property, PropertyRef, PropertyType,
    TypeName,
};
pub use pipeline::{LinkedField, Pass, Pipeline};
pub use projection::{EqualityConstraint, JsonPathEntry, JsonPathProjection};
pub use security::SecurableElement;
pub use version::DataStandardVersion;

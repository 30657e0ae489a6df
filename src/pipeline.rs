//! Pass Pipeline
//!
//! Stages run strictly in the order listed. Each stage declares the linked
//! fields it reads and writes; [`Pipeline::validate`] checks at startup that
//! every read is produced by an earlier stage (or by the parser).

use std::collections::HashSet;
use std::fmt;

use crate::config::LinkerConfig;
use crate::context::LinkContext;
use crate::error::{LinkError, Result};
use crate::link::{
    DuplicateSimpleTypeDiminisher, MergeDirectiveResolver, ReferenceResolver, SubclassBaseValidator,
    SubclassLinker,
};
use crate::model::ModelRepository;
use crate::projection::JsonPathProjector;
use crate::security::catalog;
use crate::version::DataStandardVersion;

/// A piece of derived model state a stage can depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkedField {
    /// Entities and properties as parsed
    Syntax,
    /// Duplicate implicit simple types removed
    SimpleTypes,
    ResolvedTargets,
    BaseEntities,
    ExtensionOverlays,
    Compositions,
    EquivalenceClasses,
    JsonPaths,
    SecurableElements,
}

impl LinkedField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::SimpleTypes => "simple types",
            Self::ResolvedTargets => "resolved targets",
            Self::BaseEntities => "base entities",
            Self::ExtensionOverlays => "extension overlays",
            Self::Compositions => "compositions",
            Self::EquivalenceClasses => "equivalence classes",
            Self::JsonPaths => "json paths",
            Self::SecurableElements => "securable elements",
        }
    }
}

impl fmt::Display for LinkedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One named stage of the pipeline
pub trait Pass {
    fn name(&self) -> &'static str;

    /// Fields this stage needs populated before it runs
    fn reads(&self) -> &'static [LinkedField];

    /// Fields this stage populates
    fn writes(&self) -> &'static [LinkedField];

    fn run(&self, context: &mut LinkContext) -> Result<()>;
}

/// Ordered list of stages
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Pass>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage
    pub fn with_stage(mut self, pass: impl Pass + 'static) -> Self {
        self.stages.push(Box::new(pass));
        self
    }

    /// Linking and projection, without the security overlays
    pub fn core() -> Self {
        Self::linking(true)
    }

    /// Core stages followed by every hardcoded security diminisher
    pub fn standard() -> Self {
        Self::linking(true).with_diminishers()
    }

    /// Stages selected by configuration
    pub fn from_config(config: &LinkerConfig) -> Self {
        let pipeline = Self::linking(config.projection.include_extensions);
        if config.security.enabled {
            pipeline.with_diminishers()
        } else {
            pipeline
        }
    }

    fn linking(include_extensions: bool) -> Self {
        Self::new()
            .with_stage(DuplicateSimpleTypeDiminisher)
            .with_stage(ReferenceResolver)
            .with_stage(SubclassLinker)
            .with_stage(MergeDirectiveResolver)
            .with_stage(JsonPathProjector { include_extensions })
            .with_stage(SubclassBaseValidator)
    }

    fn with_diminishers(self) -> Self {
        catalog::all()
            .into_iter()
            .fold(self, |pipeline, diminisher| pipeline.with_stage(diminisher))
    }

    /// Stage names in run order
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Check that every stage's reads are written by an earlier stage
    pub fn validate(&self) -> Result<()> {
        let mut available: HashSet<LinkedField> = HashSet::from([LinkedField::Syntax]);

        for stage in &self.stages {
            if let Some(missing) = stage.reads().iter().find(|f| !available.contains(*f)) {
                return Err(LinkError::PassOrder {
                    stage: stage.name(),
                    field: missing.as_str(),
                });
            }
            available.extend(stage.writes().iter().copied());
        }

        Ok(())
    }

    /// Run every stage in order. Fatal errors stop the run immediately.
    pub fn run(&self, context: &mut LinkContext) -> Result<()> {
        self.validate()?;

        for stage in &self.stages {
            let span = tracing::info_span!("stage", name = stage.name());
            let _guard = span.enter();

            let before = context.diagnostics.len();
            stage.run(context)?;
            tracing::debug!(
                new_failures = context.diagnostics.len() - before,
                "stage complete"
            );
        }

        tracing::info!(
            errors = context.diagnostics.error_count(),
            warnings = context.diagnostics.warning_count(),
            "linking complete"
        );
        Ok(())
    }

    /// Build a context for the repository and run the pipeline over it
    pub fn link(&self, repository: ModelRepository, version: DataStandardVersion) -> Result<LinkContext> {
        let mut context = LinkContext::new(repository, version);
        self.run(&mut context)?;
        Ok(context)
    }
}

//! Step-driven pipeline used to publish a synthesized recipe.
//!
//! - Steps are defined via the `PipelineStep` trait
//! - Each step returns `next_step` to indicate what runs next
//! - Outputs are handed between steps through a `StepOutputStore`
//! - The orchestrator builds one registry per publish attempt so the upload
//!   ledger and dependencies are scoped to that attempt

mod executor;
mod step;
pub mod steps;

pub use executor::{run_pipeline, PipelineRun, StepRegistry};
pub use step::{
    MemoryOutputStore, PipelineStep, StepContext, StepMetadata, StepOutputStore, StepResult,
};

/// The step every publish starts from.
pub const PUBLISH_FIRST_STEP: &str = steps::GenerateImagesStep::NAME;

//! Runs the publish chain. Each step names its successor; a step runs at
//! most once per attempt.

use tracing::{info_span, Instrument};

use crate::pipeline::step::{PipelineStep, StepContext, StepOutputStore, StepResult};
use crate::types::GeneratedRecipe;

/// The steps available to one publish attempt, in registration order.
#[derive(Default)]
pub struct StepRegistry {
    steps: Vec<Box<dyn PipelineStep>>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a step. Names are expected to be unique.
    pub fn register(&mut self, step: Box<dyn PipelineStep>) {
        self.steps.push(step);
    }

    pub fn get(&self, name: &str) -> Option<&dyn PipelineStep> {
        self.steps
            .iter()
            .find(|s| s.metadata().name == name)
            .map(|s| s.as_ref())
    }

    fn tolerates_failure(&self, name: &str) -> bool {
        self.get(name)
            .is_some_and(|s| s.metadata().continues_on_failure)
    }
}

/// What one run of the chain produced.
#[derive(Debug, Default)]
pub struct PipelineRun {
    /// Results in execution order.
    pub results: Vec<StepResult>,
    fatal: Option<usize>,
}

impl PipelineRun {
    /// The failed step that stopped the chain, if any. Failures of steps that
    /// continue on failure are not fatal.
    pub fn fatal(&self) -> Option<&StepResult> {
        self.fatal.and_then(|i| self.results.get(i))
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.step_name.as_str()).collect()
    }
}

/// Run the chain from `first_step` until a step names no successor or a
/// step that must succeed fails.
pub async fn run_pipeline(
    first_step: &str,
    recipe: &GeneratedRecipe,
    slug: &str,
    store: &mut dyn StepOutputStore,
    registry: &StepRegistry,
) -> PipelineRun {
    let mut run = PipelineRun::default();
    let mut next = Some(first_step.to_string());

    while let Some(step_name) = next.take() {
        if run.results.iter().any(|r| r.step_name == step_name) {
            tracing::warn!(step = %step_name, slug, "step requested twice, stopping");
            break;
        }
        let Some(step) = registry.get(&step_name) else {
            tracing::warn!(step = %step_name, "unknown pipeline step");
            break;
        };

        let meta = step.metadata();
        let ctx = StepContext {
            recipe,
            slug,
            outputs: store,
        };
        let result = step
            .execute(&ctx)
            .instrument(info_span!("pipeline_step", step = %step_name, slug = %slug))
            .await;

        if result.success {
            if let Err(e) = store.save_output(meta.name, &result.output) {
                tracing::warn!(step = meta.name, error = %e, "failed to keep step output");
            }
        } else if let Some(error) = &result.error {
            error.log(meta.description);
        }

        tracing::debug!(
            step = meta.name,
            success = result.success,
            duration_ms = result.duration_ms,
            "step finished"
        );

        let stop = !result.success && !registry.tolerates_failure(meta.name);
        next = result.next_step.clone();
        run.results.push(result);

        if stop {
            run.fatal = Some(run.results.len() - 1);
            break;
        }
    }

    run
}

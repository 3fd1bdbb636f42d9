use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{PipelineError, Stage};
use crate::json_repair::{parse_with_repair, JsonShape};
use crate::llm::LlmProvider;
use crate::prompts::{render_directions_prompt, DirectionSeeds, DIRECTIONS_PROMPT_NAME};

pub const DIRECTION_COUNT: usize = 5;
const DIRECTIONS_MAX_TOKENS: u32 = 500;

/// Ask the model for short directions to seed a bulk backlog.
pub async fn suggest_directions(
    provider: &dyn LlmProvider,
    max_retries: u32,
) -> Result<Vec<String>, PipelineError> {
    let seeds = DirectionSeeds::random(&mut StdRng::from_os_rng());
    let prompt = render_directions_prompt(&seeds, DIRECTION_COUNT);

    tracing::info!(prompt = DIRECTIONS_PROMPT_NAME, "suggesting directions");

    let raw = provider
        .complete(&prompt, DIRECTIONS_MAX_TOKENS)
        .await
        .map_err(|e| PipelineError::from_llm(Stage::Directions, e))?;

    let directions: Vec<String> = parse_with_repair(provider, &raw, JsonShape::Array, max_retries)
        .await
        .map_err(|e| PipelineError::from_repair(Stage::Directions, e))?;

    let directions: Vec<String> = directions
        .into_iter()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect();

    if directions.is_empty() {
        return Err(PipelineError::malformed(
            Stage::Directions,
            "model returned no directions",
        ));
    }
    Ok(directions)
}

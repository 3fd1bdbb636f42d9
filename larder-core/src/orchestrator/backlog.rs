//! Bulk generation: a FIFO backlog of directions processed one at a time.
//!
//! Each direction goes through the same stages as a [`GenerationSession`],
//! but both selection points wait at most `bulk_advance` for the operator and
//! then select everything. A failure drops the current direction only.
//!
//! [`GenerationSession`]: super::GenerationSession

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use super::report::{DirectionOutcome, DirectionReport, Failure};
use super::session::{select, SessionState, SESSION_IDEA_COUNT};
use super::Engine;
use crate::generate::IdeaRequest;
use crate::types::RecipeIdea;

/// Split operator input into directions: one per non-blank line.
pub fn parse_directions(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum BacklogPhase {
    GeneratingIdeas,
    ChoosingIdeas,
    SynthesizingRecipes,
    ChoosingRecipes,
    Publishing,
    Drained,
}

impl BacklogPhase {
    fn state(self) -> SessionState {
        match self {
            BacklogPhase::GeneratingIdeas | BacklogPhase::Drained => SessionState::Idle,
            BacklogPhase::ChoosingIdeas | BacklogPhase::SynthesizingRecipes => {
                SessionState::IdeasReady
            }
            BacklogPhase::ChoosingRecipes => SessionState::RecipesReady,
            BacklogPhase::Publishing => SessionState::Publishing,
        }
    }
}

/// An operator's choice at a decision point. An empty selection skips the
/// current direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "point", content = "selection", rename_all = "snake_case")]
pub enum Decision {
    Ideas(Vec<usize>),
    Recipes(Vec<usize>),
}

impl Decision {
    fn phase(&self) -> BacklogPhase {
        match self {
            Decision::Ideas(_) => BacklogPhase::ChoosingIdeas,
            Decision::Recipes(_) => BacklogPhase::ChoosingRecipes,
        }
    }

    fn selection(&self) -> &[usize] {
        match self {
            Decision::Ideas(selection) | Decision::Recipes(selection) => selection,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecisionError {
    #[error("backlog is not waiting for that decision (currently {0:?})")]
    NotWaiting(BacklogPhase),

    #[error("selection index {index} is out of range (have {len})")]
    OutOfRange { index: usize, len: usize },

    #[error("backlog is no longer accepting decisions")]
    Closed,
}

/// Snapshot of a running backlog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct BacklogStatus {
    pub id: Uuid,
    pub state: SessionState,
    pub phase: BacklogPhase,
    pub current: Option<String>,
    pub pending: Vec<String>,
    pub ideas: Vec<RecipeIdea>,
    /// Titles of the recipes awaiting a publish decision.
    pub recipes: Vec<String>,
    /// When the current decision point selects everything on its own.
    pub advances_at: Option<DateTime<Utc>>,
    pub reports: Vec<DirectionReport>,
    /// Incremented at every decision point so late decisions can be told apart.
    #[serde(skip)]
    decision_point: u64,
}

impl BacklogStatus {
    fn new(id: Uuid, pending: Vec<String>) -> Self {
        Self {
            id,
            state: SessionState::Idle,
            phase: BacklogPhase::GeneratingIdeas,
            current: None,
            pending,
            ideas: Vec::new(),
            recipes: Vec::new(),
            advances_at: None,
            reports: Vec::new(),
            decision_point: 0,
        }
    }

    fn enter(&mut self, phase: BacklogPhase) {
        self.phase = phase;
        self.state = phase.state();
        if !matches!(
            phase,
            BacklogPhase::ChoosingIdeas | BacklogPhase::ChoosingRecipes
        ) {
            self.advances_at = None;
        }
    }

    fn options(&self) -> usize {
        match self.phase {
            BacklogPhase::ChoosingIdeas => self.ideas.len(),
            BacklogPhase::ChoosingRecipes => self.recipes.len(),
            _ => 0,
        }
    }
}

type SharedStatus = Arc<Mutex<BacklogStatus>>;

/// A backlog running in the background.
///
/// Dropping the handle does not stop the backlog; it keeps auto-advancing
/// until drained.
#[derive(Debug)]
pub struct BacklogHandle {
    id: Uuid,
    status: SharedStatus,
    decisions: mpsc::Sender<(u64, Decision)>,
    task: JoinHandle<()>,
}

impl BacklogHandle {
    pub fn spawn(engine: Engine, directions: Vec<String>) -> Self {
        let id = Uuid::new_v4();
        let status = Arc::new(Mutex::new(BacklogStatus::new(id, directions.clone())));
        let (tx, rx) = mpsc::channel(8);

        tracing::info!(backlog = %id, directions = directions.len(), "starting backlog");
        let task = tokio::spawn(run_backlog(engine, status.clone(), rx, directions));

        Self {
            id,
            status,
            decisions: tx,
            task,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> BacklogStatus {
        self.status.lock().unwrap().clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Hand a selection to the decision point the backlog is waiting at.
    pub fn decide(&self, decision: Decision) -> Result<(), DecisionError> {
        let point = {
            let status = self.status.lock().unwrap();
            if status.phase != decision.phase() {
                return Err(DecisionError::NotWaiting(status.phase));
            }
            let len = status.options();
            if let Some(&index) = decision.selection().iter().find(|&&i| i >= len) {
                return Err(DecisionError::OutOfRange { index, len });
            }
            status.decision_point
        };

        self.decisions
            .try_send((point, decision))
            .map_err(|_| DecisionError::Closed)
    }

    /// Wait for the backlog to drain and return its reports.
    pub async fn finish(self) -> Vec<DirectionReport> {
        if let Err(e) = self.task.await {
            tracing::error!(backlog = %self.id, error = %e, "backlog task panicked");
        }
        let status = self.status.lock().unwrap();
        status.reports.clone()
    }
}

async fn run_backlog(
    engine: Engine,
    status: SharedStatus,
    mut decisions: mpsc::Receiver<(u64, Decision)>,
    directions: Vec<String>,
) {
    let mut queue: VecDeque<String> = directions.into();

    while let Some(direction) = queue.pop_front() {
        {
            let mut s = status.lock().unwrap();
            s.pending = queue.iter().cloned().collect();
            s.current = Some(direction.clone());
            s.ideas.clear();
            s.recipes.clear();
        }

        let outcome = run_direction(&engine, &status, &mut decisions, &direction).await;
        match &outcome {
            DirectionOutcome::Completed { recipes } => tracing::info!(
                direction = %direction,
                published = recipes.iter().filter(|r| r.is_published()).count(),
                "backlog item done"
            ),
            DirectionOutcome::Failed { failure } => tracing::warn!(
                direction = %direction,
                kind = %failure.kind,
                stage = ?failure.stage,
                "backlog item dropped"
            ),
            DirectionOutcome::Skipped => {
                tracing::info!(direction = %direction, "backlog item skipped")
            }
        }

        status.lock().unwrap().reports.push(DirectionReport {
            direction,
            outcome,
        });
    }

    let mut s = status.lock().unwrap();
    s.current = None;
    s.pending.clear();
    s.ideas.clear();
    s.recipes.clear();
    s.enter(BacklogPhase::Drained);
    tracing::info!(backlog = %s.id, items = s.reports.len(), "backlog drained");
}

async fn run_direction(
    engine: &Engine,
    status: &SharedStatus,
    decisions: &mut mpsc::Receiver<(u64, Decision)>,
    direction: &str,
) -> DirectionOutcome {
    status.lock().unwrap().enter(BacklogPhase::GeneratingIdeas);
    let ideas = match engine
        .ideas(&IdeaRequest::for_direction(direction), SESSION_IDEA_COUNT)
        .await
    {
        Ok(ideas) => ideas,
        Err(e) => {
            e.log("backlog idea generation failed");
            return DirectionOutcome::Failed {
                failure: Failure::from(&e),
            };
        }
    };

    let point = open_decision(engine, status, BacklogPhase::ChoosingIdeas, |s| {
        s.ideas = ideas.clone()
    });
    let selection = await_decision(engine, decisions, point, ideas.len()).await;
    let Ok(selected) = select(&ideas, &selection) else {
        return DirectionOutcome::Skipped;
    };

    status.lock().unwrap().enter(BacklogPhase::SynthesizingRecipes);
    let recipes = match engine.recipes(&selected).await {
        Ok(recipes) => recipes,
        Err(e) => {
            e.log("backlog recipe synthesis failed");
            return DirectionOutcome::Failed {
                failure: Failure::from(&e),
            };
        }
    };

    let titles: Vec<String> = recipes.iter().map(|r| r.title.clone()).collect();
    let point = open_decision(engine, status, BacklogPhase::ChoosingRecipes, |s| {
        s.recipes = titles
    });
    let selection = await_decision(engine, decisions, point, recipes.len()).await;
    let Ok(selected) = select(&recipes, &selection) else {
        return DirectionOutcome::Skipped;
    };

    status.lock().unwrap().enter(BacklogPhase::Publishing);
    DirectionOutcome::Completed {
        recipes: engine.publish_many(selected).await,
    }
}

fn open_decision(
    engine: &Engine,
    status: &SharedStatus,
    phase: BacklogPhase,
    fill: impl FnOnce(&mut BacklogStatus),
) -> u64 {
    let advance = engine.config().bulk_advance;
    let mut s = status.lock().unwrap();
    fill(&mut s);
    s.enter(phase);
    s.decision_point += 1;
    s.advances_at = chrono::Duration::from_std(advance)
        .ok()
        .map(|d| Utc::now() + d);
    s.decision_point
}

/// Wait for the operator until the auto-advance deadline, then select all.
async fn await_decision(
    engine: &Engine,
    decisions: &mut mpsc::Receiver<(u64, Decision)>,
    point: u64,
    options: usize,
) -> Vec<usize> {
    let everything: Vec<usize> = (0..options).collect();
    let deadline = Instant::now() + engine.config().bulk_advance;

    loop {
        match tokio::time::timeout_at(deadline, decisions.recv()).await {
            Err(_) => return everything,
            // Nobody can decide any more; don't wait for the timer.
            Ok(None) => return everything,
            Ok(Some((ticket, decision))) if ticket == point => {
                tracing::info!(selected = decision.selection().len(), "operator decision received");
                return decision.selection().to_vec();
            }
            Ok(Some((ticket, _))) => {
                tracing::debug!(ticket, point, "ignoring decision for an earlier decision point");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::images::FakeImageGenerator;
    use crate::llm::FakeProvider;
    use crate::storage::MemoryObjectStore;
    use crate::store::MemoryRecipeStore;

    fn engine(provider: FakeProvider, store: Arc<MemoryRecipeStore>) -> Engine {
        Engine::new(
            Arc::new(provider),
            Arc::new(FakeImageGenerator::default()),
            Arc::new(MemoryObjectStore::default()),
            store,
            PipelineConfig::default(),
        )
    }

    fn provider() -> FakeProvider {
        let provider = FakeProvider::new().with_default_response("[]");
        provider.add_response(
            "recipe idea",
            r#"[{"title": "Barley Risotto", "description": "Nutty"},
                {"title": "Leek Tart", "description": "Flaky"}]"#,
        );
        for title in ["Barley Risotto", "Leek Tart"] {
            provider.add_response(
                &format!("for \"{}\"", title),
                &format!(
                    r#"{{"title": "{}", "ingredients": [{{"name": "Butter", "quantity": "1", "unit": "tbsp"}}],
                        "instructions": ["Cook gently."]}}"#,
                    title
                ),
            );
        }
        provider
    }

    #[test]
    fn directions_are_one_per_line() {
        assert_eq!(
            parse_directions("  comfort food \n\n\tquick lunches\r\n   "),
            vec!["comfort food", "quick lunches"]
        );
        assert!(parse_directions("\n  \n").is_empty());
    }

    #[test]
    fn decisions_use_a_tagged_wire_format() {
        let decision: Decision =
            serde_json::from_str(r#"{"point": "recipes", "selection": [1]}"#).unwrap();
        assert_eq!(decision, Decision::Recipes(vec![1]));
    }

    #[tokio::test(start_paused = true)]
    async fn auto_advances_and_drains() {
        let store = Arc::new(MemoryRecipeStore::default());
        let handle = BacklogHandle::spawn(
            engine(provider(), store.clone()),
            vec!["autumn".to_string(), "brunch".to_string()],
        );

        let reports = handle.finish().await;
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.published() == 2));
        assert_eq!(store.recipes().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn operator_selection_overrides_the_timer() {
        let store = Arc::new(MemoryRecipeStore::default());
        let handle = BacklogHandle::spawn(
            engine(provider(), store.clone()),
            vec!["autumn".to_string()],
        );

        while handle.status().phase != BacklogPhase::ChoosingIdeas {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
        assert_eq!(handle.status().state, SessionState::IdeasReady);
        assert_eq!(
            handle.decide(Decision::Recipes(vec![0])),
            Err(DecisionError::NotWaiting(BacklogPhase::ChoosingIdeas))
        );
        assert_eq!(
            handle.decide(Decision::Ideas(vec![5])),
            Err(DecisionError::OutOfRange { index: 5, len: 2 })
        );
        handle.decide(Decision::Ideas(vec![1])).unwrap();

        let reports = handle.finish().await;
        assert_eq!(reports[0].published(), 1);
        assert_eq!(store.recipes()[0].title, "Leek Tart");
    }

    #[tokio::test(start_paused = true)]
    async fn empty_selection_skips_the_direction() {
        let store = Arc::new(MemoryRecipeStore::default());
        let handle = BacklogHandle::spawn(
            engine(provider(), store.clone()),
            vec!["autumn".to_string()],
        );

        while handle.status().phase != BacklogPhase::ChoosingIdeas {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
        handle.decide(Decision::Ideas(vec![])).unwrap();

        let reports = handle.finish().await;
        assert_eq!(reports[0].outcome, DirectionOutcome::Skipped);
        assert!(store.recipes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn idea_failure_drops_only_that_direction() {
        let provider = FakeProvider::new().with_default_response("[]");
        provider.add_failure("direction: broken.", "overloaded");
        provider.add_response(
            "recipe idea",
            r#"[{"title": "Leek Tart", "description": "Flaky"}]"#,
        );
        provider.add_response(
            "for \"Leek Tart\"",
            r#"{"title": "Leek Tart", "ingredients": [{"name": "Leek", "quantity": "2", "unit": ""}],
                "instructions": ["Bake."]}"#,
        );
        let store = Arc::new(MemoryRecipeStore::default());
        let handle = BacklogHandle::spawn(
            engine(provider, store.clone()),
            vec!["broken".to_string(), "spring".to_string()],
        );

        let status_before = handle.status();
        assert_eq!(status_before.pending.len(), 2);

        let reports = handle.finish().await;
        assert!(matches!(reports[0].outcome, DirectionOutcome::Failed { .. }));
        assert_eq!(reports[1].published(), 1);
        assert_eq!(store.recipes().len(), 1);
    }
}

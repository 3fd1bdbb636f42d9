//! Single-direction generation: ideas, then recipes, then publish, with an
//! explicit selection at each step.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::report::{Failure, RecipeReport};
use super::Engine;
use crate::error::PipelineError;
use crate::generate::IdeaRequest;
use crate::types::{GeneratedRecipe, RecipeIdea};

/// Ideas generated per direction outside the preview wizard.
pub const SESSION_IDEA_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    IdeasReady,
    RecipesReady,
    Publishing,
    Done,
    Failed,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot {action} while {state:?}")]
    InvalidTransition {
        state: SessionState,
        action: &'static str,
    },

    #[error("select at least one item")]
    EmptySelection,

    #[error("selection index {index} is out of range (have {len})")]
    SelectionOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl SessionError {
    /// Whether the request itself was wrong rather than a stage failing.
    pub fn is_caller_error(&self) -> bool {
        match self {
            SessionError::Pipeline(e) => e.is_caller_error(),
            _ => true,
        }
    }
}

/// Pick `indices` out of `items`, keeping selection order and dropping
/// repeated indices.
pub(crate) fn select<T: Clone>(items: &[T], indices: &[usize]) -> Result<Vec<T>, SessionError> {
    if indices.is_empty() {
        return Err(SessionError::EmptySelection);
    }
    let mut seen = Vec::with_capacity(indices.len());
    for &index in indices {
        if index >= items.len() {
            return Err(SessionError::SelectionOutOfRange {
                index,
                len: items.len(),
            });
        }
        if !seen.contains(&index) {
            seen.push(index);
        }
    }
    Ok(seen.into_iter().map(|i| items[i].clone()).collect())
}

/// One operator's pass through a single direction.
///
/// Transitions only move forward, except [`go_back`](Self::go_back) from
/// `IdeasReady` or `RecipesReady`, which discards everything downstream. A
/// failed action leaves the session `Failed`; the same action can be tried
/// again from there.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct GenerationSession {
    pub id: Uuid,
    state: SessionState,
    /// The state a failed action started from.
    #[serde(skip_serializing_if = "Option::is_none")]
    resume: Option<SessionState>,
    request: Option<IdeaRequest>,
    ideas: Vec<RecipeIdea>,
    recipes: Vec<GeneratedRecipe>,
    reports: Vec<RecipeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<Failure>,
}

impl Default for GenerationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Idle,
            resume: None,
            request: None,
            ideas: Vec::new(),
            recipes: Vec::new(),
            reports: Vec::new(),
            failure: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn ideas(&self) -> &[RecipeIdea] {
        &self.ideas
    }

    pub fn recipes(&self) -> &[GeneratedRecipe] {
        &self.recipes
    }

    pub fn reports(&self) -> &[RecipeReport] {
        &self.reports
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    /// The state actions are checked against: a failed session behaves like
    /// the state its failed action started from.
    fn effective_state(&self) -> SessionState {
        match (self.state, self.resume) {
            (SessionState::Failed, Some(resume)) => resume,
            (state, _) => state,
        }
    }

    fn require(&self, allowed: &[SessionState], action: &'static str) -> Result<(), SessionError> {
        let state = self.effective_state();
        if allowed.contains(&state) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                state: self.state,
                action,
            })
        }
    }

    fn fail(&mut self, from: SessionState, err: PipelineError) -> SessionError {
        err.log("generation session step failed");
        self.state = SessionState::Failed;
        self.resume = Some(from);
        self.failure = Some(Failure::from(&err));
        SessionError::Pipeline(err)
    }

    fn settle(&mut self, state: SessionState) {
        self.state = state;
        self.resume = None;
        self.failure = None;
    }

    /// Idle → IdeasReady. A finished session may start over.
    pub async fn generate_ideas(
        &mut self,
        engine: &Engine,
        request: IdeaRequest,
    ) -> Result<&[RecipeIdea], SessionError> {
        self.require(&[SessionState::Idle, SessionState::Done], "generate ideas")?;
        request.validate()?;
        let from = self.effective_state();

        match engine.ideas(&request, SESSION_IDEA_COUNT).await {
            Ok(ideas) => {
                self.request = Some(request);
                self.ideas = ideas;
                self.recipes.clear();
                self.reports.clear();
                self.settle(SessionState::IdeasReady);
                Ok(&self.ideas)
            }
            Err(e) => Err(self.fail(from, e)),
        }
    }

    /// IdeasReady → RecipesReady for the selected ideas.
    pub async fn synthesize(
        &mut self,
        engine: &Engine,
        selection: &[usize],
    ) -> Result<&[GeneratedRecipe], SessionError> {
        self.require(&[SessionState::IdeasReady], "synthesize recipes")?;
        let selected = select(&self.ideas, selection)?;

        match engine.recipes(&selected).await {
            Ok(recipes) => {
                self.recipes = recipes;
                self.settle(SessionState::RecipesReady);
                Ok(&self.recipes)
            }
            Err(e) => Err(self.fail(SessionState::IdeasReady, e)),
        }
    }

    /// RecipesReady → Publishing → Done.
    ///
    /// Recipes that fail are reported and rolled back individually. When every
    /// selected recipe fails the session is `Failed` and publishing can be
    /// retried.
    pub async fn publish(
        &mut self,
        engine: &Engine,
        selection: &[usize],
    ) -> Result<&[RecipeReport], SessionError> {
        self.require(&[SessionState::RecipesReady], "publish")?;
        let selected = select(&self.recipes, selection)?;

        self.state = SessionState::Publishing;
        let reports = engine.publish_many(selected).await;

        let published = reports.iter().filter(|r| r.is_published()).count();
        tracing::info!(
            session = %self.id,
            published,
            total = reports.len(),
            "session publish finished"
        );

        if published == 0 {
            let failure = reports.iter().find_map(|r| match &r.outcome {
                super::RecipeOutcome::Failed { failure } => Some(failure.clone()),
                _ => None,
            });
            self.reports = reports;
            self.state = SessionState::Failed;
            self.resume = Some(SessionState::RecipesReady);
            self.failure = failure;
        } else {
            self.reports = reports;
            self.settle(SessionState::Done);
        }
        Ok(&self.reports)
    }

    /// Step back one stage, discarding what that stage produced.
    pub fn go_back(&mut self) -> Result<SessionState, SessionError> {
        match self.effective_state() {
            SessionState::IdeasReady => {
                self.ideas.clear();
                self.recipes.clear();
                self.settle(SessionState::Idle);
            }
            SessionState::RecipesReady => {
                self.recipes.clear();
                self.settle(SessionState::IdeasReady);
            }
            SessionState::Idle if self.state == SessionState::Failed => {
                self.settle(SessionState::Idle);
            }
            _ => {
                return Err(SessionError::InvalidTransition {
                    state: self.state,
                    action: "go back",
                })
            }
        }
        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::PipelineConfig;
    use crate::images::FakeImageGenerator;
    use crate::llm::FakeProvider;
    use crate::storage::MemoryObjectStore;
    use crate::store::MemoryRecipeStore;

    const IDEAS: &str = r#"[{"title": "Tofu Scramble", "description": "Spicy"},
        {"title": "Chili Oats", "description": "Warm"},
        {"title": "Vegan Chilaquiles", "description": "Crunchy"}]"#;

    fn recipe_json(title: &str) -> String {
        format!(
            r#"{{"title": "{}", "ingredients": [{{"name": "Tofu", "quantity": "200", "unit": "g"}}],
                "instructions": ["Crumble and fry."]}}"#,
            title
        )
    }

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
        provider.add_response("recipe idea", IDEAS);
        provider.add_response("for \"Tofu Scramble\"", &recipe_json("Tofu Scramble"));
        provider.add_response("for \"Chili Oats\"", &recipe_json("Chili Oats"));
        provider
    }

    #[tokio::test]
    async fn walks_every_state() {
        let store = Arc::new(MemoryRecipeStore::default());
        let engine = engine(provider(), store.clone());
        let mut session = GenerationSession::new();

        let ideas = session
            .generate_ideas(&engine, IdeaRequest::for_direction("spicy vegan breakfast"))
            .await
            .unwrap();
        assert_eq!(ideas.len(), 3);
        assert_eq!(session.state(), SessionState::IdeasReady);

        session.synthesize(&engine, &[1, 0]).await.unwrap();
        assert_eq!(session.state(), SessionState::RecipesReady);
        assert_eq!(session.recipes()[0].title, "Chili Oats");

        let reports = session.publish(&engine, &[0, 1]).await.unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(session.state(), SessionState::Done);
        assert_eq!(store.recipes().len(), 2);
    }

    #[tokio::test]
    async fn rejects_out_of_order_actions() {
        let engine = engine(provider(), Arc::new(MemoryRecipeStore::default()));
        let mut session = GenerationSession::new();

        let err = session.synthesize(&engine, &[0]).await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
        assert!(session.go_back().is_err());
    }

    #[tokio::test]
    async fn selection_is_validated() {
        let engine = engine(provider(), Arc::new(MemoryRecipeStore::default()));
        let mut session = GenerationSession::new();
        session
            .generate_ideas(&engine, IdeaRequest::default())
            .await
            .unwrap();

        assert!(matches!(
            session.synthesize(&engine, &[]).await,
            Err(SessionError::EmptySelection)
        ));
        assert!(matches!(
            session.synthesize(&engine, &[7]).await,
            Err(SessionError::SelectionOutOfRange { index: 7, len: 3 })
        ));
        assert_eq!(session.state(), SessionState::IdeasReady);
    }

    #[tokio::test]
    async fn go_back_discards_downstream_state() {
        let engine = engine(provider(), Arc::new(MemoryRecipeStore::default()));
        let mut session = GenerationSession::new();
        session
            .generate_ideas(&engine, IdeaRequest::default())
            .await
            .unwrap();
        session.synthesize(&engine, &[0]).await.unwrap();

        assert_eq!(session.go_back().unwrap(), SessionState::IdeasReady);
        assert!(session.recipes().is_empty());
        assert_eq!(session.ideas().len(), 3);

        assert_eq!(session.go_back().unwrap(), SessionState::Idle);
        assert!(session.ideas().is_empty());
    }

    #[tokio::test]
    async fn failure_can_be_retried() {
        let provider = provider();
        provider.add_failure("for \"Vegan Chilaquiles\"", "overloaded");
        let engine = engine(provider, Arc::new(MemoryRecipeStore::default()));
        let mut session = GenerationSession::new();
        session
            .generate_ideas(&engine, IdeaRequest::default())
            .await
            .unwrap();

        let err = session.synthesize(&engine, &[2]).await.unwrap_err();
        assert!(!err.is_caller_error());
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(
            session.failure().unwrap().message,
            crate::error::OVERLOADED_MESSAGE
        );

        session.synthesize(&engine, &[0]).await.unwrap();
        assert_eq!(session.state(), SessionState::RecipesReady);
        assert!(session.failure().is_none());
    }
}

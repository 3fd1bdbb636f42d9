//! End-to-end tests of the generation pipeline against in-memory fakes.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use larder_core::blog::{render_blog, BlogBlock};
use larder_core::config::PipelineConfig;
use larder_core::images::FakeImageGenerator;
use larder_core::json_repair::{extract_and_parse, JsonShape};
use larder_core::llm::FakeProvider;
use larder_core::orchestrator::{
    BacklogHandle, DirectionOutcome, Engine, GenerationSession, SessionState,
};
use larder_core::storage::MemoryObjectStore;
use larder_core::store::MemoryRecipeStore;
use larder_core::types::GeneratedRecipe;
use larder_core::IdeaRequest;

const TACOS: &str = "Smoky Chipotle Tofu Breakfast Tacos";

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

fn recipe_json(title: &str, ingredients: &str, blog_prompts: usize) -> String {
    let prompts: Vec<String> = (1..=blog_prompts)
        .map(|i| format!(r#"{{"prompt": "{} detail {}", "altText": "detail {}"}}"#, title, i, i))
        .collect();
    format!(
        r#"{{"title": "{}", "ingredients": {}, "instructions": ["Cook it."],
            "blogContent": "Intro", "blogSummary": "Short.", "blogImagePrompts": [{}]}}"#,
        title,
        ingredients,
        prompts.join(",")
    )
}

fn recipe(title: &str, ingredients: &str, blog_prompts: usize) -> GeneratedRecipe {
    serde_json::from_str(&recipe_json(title, ingredients, blog_prompts)).unwrap()
}

struct World {
    objects: Arc<MemoryObjectStore>,
    store: Arc<MemoryRecipeStore>,
    engine: Engine,
}

fn world(provider: FakeProvider) -> World {
    let objects = Arc::new(MemoryObjectStore::default());
    let store = Arc::new(MemoryRecipeStore::default());
    let engine = Engine::new(
        Arc::new(provider),
        Arc::new(FakeImageGenerator::default()),
        objects.clone(),
        store.clone(),
        PipelineConfig::default(),
    );
    World {
        objects,
        store,
        engine,
    }
}

#[tokio::test]
async fn repair_calls_never_exceed_the_retry_budget() {
    for retries in 0..4 {
        let provider = FakeProvider::with_response("rewrite the entire JSON", "{still: broken");
        let result = extract_and_parse(&provider, "{broken", JsonShape::Object, retries).await;
        assert!(result.is_err());
        assert_eq!(provider.call_count(), retries as usize);
    }
}

#[tokio::test]
async fn first_publisher_sets_the_catalog_unit() {
    let w = world(FakeProvider::new().with_default_response("[]"));

    w.engine
        .publish(recipe("Shortbread", r#"[{"name": "Flour", "quantity": "250", "unit": "g"}]"#, 0))
        .await
        .unwrap();
    w.engine
        .publish(recipe("Pancakes", r#"[{"name": "Flour", "quantity": "1.5", "unit": "cup"}]"#, 0))
        .await
        .unwrap();

    let flour: Vec<_> = w.store.catalog().into_iter().filter(|i| i.name == "Flour").collect();
    assert_eq!(flour.len(), 1);
    assert_eq!(flour[0].unit, "g");
    assert_eq!(w.store.recipes()[1].ingredients[0].quantity, 1.5);
}

#[tokio::test]
async fn failed_database_write_removes_every_upload() {
    let w = world(FakeProvider::new().with_default_response(
        r#"[{"name": "Kim", "content": "Great"}, {"name": "Bo", "content": "Yum"}, {"name": "Al", "content": "Nice"}]"#,
    ));
    w.store.fail_commits(true);

    let err = w
        .engine
        .publish(recipe("Flatbread", r#"[{"name": "Yeast", "quantity": "7", "unit": "g"}]"#, 3))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "persistence");
    assert_eq!(w.objects.put_count(), 4);
    let deleted: HashSet<_> = w.objects.deleted_keys().into_iter().collect();
    assert_eq!(deleted.len(), 4);
    assert!(w.objects.is_empty());
    assert!(w.store.recipes().is_empty());
    assert!(w.store.catalog().is_empty());
    assert_eq!(w.store.comment_count(), 0);
}

#[tokio::test]
async fn blog_placeholders_resolve_to_uploaded_images() {
    let w = world(FakeProvider::new().with_default_response("[]"));
    let mut generated = recipe(
        "Fig Toast",
        r#"[{"name": "Figs", "quantity": "4", "unit": ""}]"#,
        2,
    );
    generated.blog_content = "<<IMAGE 1>>\nText\n<<IMAGE 2>>\n<<IMAGE 5>>".to_string();

    let published = w.engine.publish(generated).await.unwrap();
    let blocks = render_blog(&published.blog_content, &published.blog_images);

    let urls: Vec<_> = blocks
        .iter()
        .filter_map(|b| match b {
            BlogBlock::Image { image_url, .. } => Some(image_url.clone()),
            _ => None,
        })
        .collect();
    let expected: Vec<_> = published.blog_images.iter().map(|i| i.image_url.clone()).collect();
    assert_eq!(urls, expected);
    assert_eq!(blocks.len(), 3);
}

#[tokio::test]
async fn blank_blog_prompt_keeps_placeholder_positions() {
    let w = world(FakeProvider::new().with_default_response("[]"));
    let generated: GeneratedRecipe = serde_json::from_str(
        r#"{"title": "Fig Toast", "ingredients": [{"name": "Figs", "quantity": "4"}],
            "instructions": ["Toast."],
            "blogContent": "<<IMAGE 3>>\nmiddle\n<<IMAGE 2>>",
            "blogImagePrompts": [
                {"prompt": "figs", "altText": "one"},
                {"prompt": "", "altText": "two"},
                {"prompt": "toast", "altText": "three"}]}"#,
    )
    .unwrap();

    let published = w.engine.publish(generated).await.unwrap();
    assert_eq!(published.blog_images.len(), 3);

    let blocks = render_blog(&published.blog_content, &published.blog_images);
    let alts: Vec<_> = blocks
        .iter()
        .map(|b| match b {
            BlogBlock::Image { alt_text, .. } => alt_text.as_str(),
            BlogBlock::Paragraph { text } => text.as_str(),
            BlogBlock::Heading { text, .. } => text.as_str(),
        })
        .collect();
    assert_eq!(alts, vec!["three", "middle", "two"]);
}

#[tokio::test(start_paused = true)]
async fn backlog_survives_a_failing_middle_item() {
    let provider = FakeProvider::new().with_default_response("[]");
    for (direction, title) in [
        ("first", "Apple Crumble"),
        ("second", "Broken Bake"),
        ("third", "Cherry Clafoutis"),
    ] {
        provider.add_response(
            &format!("direction: {}.", direction),
            &format!(r#"[{{"title": "{}", "description": "x"}}]"#, title),
        );
    }
    provider.add_response(
        "for \"Apple Crumble\"",
        &recipe_json("Apple Crumble", r#"[{"name": "Apples", "quantity": "4", "unit": ""}]"#, 1),
    );
    provider.add_failure("for \"Broken Bake\"", "Model too busy");
    provider.add_response(
        "for \"Cherry Clafoutis\"",
        &recipe_json("Cherry Clafoutis", r#"[{"name": "Cherries", "quantity": "300", "unit": "g"}]"#, 1),
    );
    let w = world(provider);

    let handle = BacklogHandle::spawn(
        w.engine.clone(),
        vec!["first".to_string(), "second".to_string(), "third".to_string()],
    );
    let status = handle.status();
    assert_eq!(status.pending.len(), 3);

    let reports = handle.finish().await;

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].published(), 1);
    assert!(matches!(reports[1].outcome, DirectionOutcome::Failed { .. }));
    assert_eq!(reports[2].published(), 1);

    let titles: Vec<_> = w.store.recipes().into_iter().map(|r| r.title).collect();
    assert_eq!(titles, ["Apple Crumble", "Cherry Clafoutis"]);
}

#[tokio::test(start_paused = true)]
async fn drained_backlog_reports_idle() {
    let w = world(FakeProvider::new().with_default_response("[]"));
    let handle = BacklogHandle::spawn(w.engine.clone(), Vec::new());
    while !handle.is_finished() {
        tokio::task::yield_now().await;
    }
    let status = handle.status();
    assert_eq!(status.state, SessionState::Idle);
    assert!(status.pending.is_empty());
    assert!(status.current.is_none());
}

#[tokio::test]
async fn failing_comments_still_publish() {
    let provider = FakeProvider::new();
    provider.add_failure("comments for a recipe titled", "Model too busy");
    let w = world(provider);

    let published = w
        .engine
        .publish(recipe("Oat Bars", r#"[{"name": "Oats", "quantity": "2", "unit": "cup"}]"#, 1))
        .await
        .unwrap();

    assert!(published.comments.is_empty());
    assert_eq!(w.store.recipes().len(), 1);
    assert_eq!(w.objects.len(), 2);
}

#[tokio::test]
async fn spicy_vegan_breakfast_from_direction_to_recipe() {
    let provider = FakeProvider::new().with_default_response("[]");
    provider.add_response(
        "direction: spicy vegan breakfast.",
        &format!(
            r#"Sure! [{{"title": "{}", "description": "Smoky tofu in corn tortillas"}},
               {{"title": "Harissa Chickpea Hash", "description": "Crispy and hot"}}]"#,
            TACOS
        ),
    );
    provider.add_response(&format!("for \"{}\"", TACOS), &fixture("spicy_vegan_breakfast.txt"));
    let w = world(provider);

    let mut session = GenerationSession::new();
    let ideas = session
        .generate_ideas(&w.engine, IdeaRequest::for_direction("spicy vegan breakfast"))
        .await
        .unwrap();
    assert!(!ideas.is_empty());
    assert!(ideas.iter().all(|i| !i.title.trim().is_empty()));

    let recipes = session.synthesize(&w.engine, &[0]).await.unwrap();
    let tacos = &recipes[0];
    assert!(tacos.servings >= 1);
    assert!(!tacos.instructions.is_empty());
    assert!(!tacos.ingredients.is_empty());
    assert_eq!(tacos.cooking_time, 25);

    let reports = session.publish(&w.engine, &[0]).await.unwrap();
    assert!(reports[0].is_published());
    assert_eq!(session.state(), SessionState::Done);

    let saved = &w.store.recipes()[0];
    let quantities: Vec<_> = saved.ingredients.iter().map(|i| i.quantity).collect();
    assert_eq!(quantities, [400.0, 1.5, 1.0, 8.0, 1.0]);
}

#[tokio::test]
async fn sugar_quantity_is_stored_as_a_float() {
    let w = world(FakeProvider::new().with_default_response("[]"));

    let published = w
        .engine
        .publish(recipe("Lemonade", r#"[{"name": "Sugar", "quantity": "2", "unit": "cup"}]"#, 0))
        .await
        .unwrap();

    let sugar = &published.ingredients[0];
    assert_eq!(sugar.ingredient.name, "Sugar");
    assert_eq!(sugar.ingredient.unit, "cup");
    assert_eq!(sugar.quantity, 2.0);
}

#[tokio::test]
async fn identical_titles_never_share_storage_keys() {
    let w = world(FakeProvider::new().with_default_response("[]"));
    let ingredients = r#"[{"name": "Rice", "quantity": "1", "unit": "cup"}]"#;

    w.engine.publish(recipe("Rice Pudding", ingredients, 3)).await.unwrap();
    assert_eq!(w.objects.put_count(), 4);
    assert_eq!(w.objects.keys().len(), 4);

    w.engine.publish(recipe("Rice Pudding", ingredients, 3)).await.unwrap();
    let keys = w.objects.keys();
    assert_eq!(keys.len(), 8);
    assert!(keys.iter().all(|k| k.starts_with("recipes/rice-pudding-")));
    assert_eq!(keys.iter().filter(|k| k.contains("-main-")).count(), 2);
}

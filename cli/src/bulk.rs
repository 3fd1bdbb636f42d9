use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use larder_core::orchestrator::{
    parse_directions, BacklogPhase, BacklogStatus, DirectionOutcome, DirectionReport,
    RecipeOutcome,
};
use serde::{Deserialize, Serialize};

use crate::client::Client;

#[derive(Debug, Serialize)]
struct CreateBacklogRequest {
    directions: String,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    directions: Vec<String>,
}

/// Ask the server for suggested directions.
pub async fn suggest(client: &Client) -> Result<Vec<String>> {
    let response: DirectionsResponse = client
        .post("/api/generate/directions", &serde_json::json!({}))
        .await
        .context("Failed to fetch direction suggestions")?;
    Ok(response.directions)
}

/// Gather directions from `--direction` flags and an optional file (one per line).
pub fn collect_directions(flags: &[String], file: Option<&Path>) -> Result<Vec<String>> {
    let mut text = flags.join("\n");
    if let Some(path) = file {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        text.push('\n');
        text.push_str(&contents);
    }
    Ok(parse_directions(&text))
}

/// Submit a backlog and print its progress until it drains. Decision points
/// are left to the server's auto-advance timer.
pub async fn run(client: &Client, directions: Vec<String>, poll: Duration) -> Result<()> {
    if directions.is_empty() {
        bail!("No directions given");
    }

    let mut status: BacklogStatus = client
        .post(
            "/api/backlogs",
            &CreateBacklogRequest {
                directions: directions.join("\n"),
            },
        )
        .await
        .context("Failed to start backlog")?;
    println!("Backlog {} started with {} direction(s)", status.id, directions.len());

    let path = format!("/api/backlogs/{}", status.id);
    let mut last_line = String::new();
    loop {
        let line = describe(&status);
        if line != last_line {
            println!("{}", line);
            last_line = line;
        }
        if status.phase == BacklogPhase::Drained {
            break;
        }
        tokio::time::sleep(poll).await;
        status = client.get(&path).await?;
    }

    println!();
    for report in &status.reports {
        print!("{}", render_report(report));
    }
    let published: usize = status.reports.iter().map(DirectionReport::published).sum();
    println!("Published {} recipe(s)", published);

    if let Err(e) = client.delete::<serde_json::Value>(&path).await {
        tracing::warn!(backlog = %status.id, error = %e, "failed to remove drained backlog");
    }
    Ok(())
}

/// One progress line for the current state of a backlog.
pub fn describe(status: &BacklogStatus) -> String {
    let current = status.current.as_deref().unwrap_or("-");
    match status.phase {
        BacklogPhase::ChoosingIdeas => format!(
            "[{}] choosing from {} idea(s) (auto-selects all)",
            current,
            status.ideas.len()
        ),
        BacklogPhase::ChoosingRecipes => format!(
            "[{}] choosing from {} recipe(s) (auto-selects all)",
            current,
            status.recipes.len()
        ),
        BacklogPhase::Drained => "backlog drained".to_string(),
        phase => format!(
            "[{}] {:?}, {} direction(s) waiting",
            current,
            phase,
            status.pending.len()
        ),
    }
}

pub fn render_report(report: &DirectionReport) -> String {
    let mut out = format!("{}\n", report.direction);
    match &report.outcome {
        DirectionOutcome::Completed { recipes } => {
            for recipe in recipes {
                match &recipe.outcome {
                    RecipeOutcome::Published { recipe: summary } => {
                        out.push_str(&format!("  published  {} ({})\n", recipe.title, summary.slug))
                    }
                    RecipeOutcome::Failed { failure } => out.push_str(&format!(
                        "  failed     {}: {} [{}]\n",
                        recipe.title, failure.message, failure.kind
                    )),
                }
            }
        }
        DirectionOutcome::Failed { failure } => {
            out.push_str(&format!("  dropped: {} [{}]\n", failure.message, failure.kind))
        }
        DirectionOutcome::Skipped => out.push_str("  skipped\n"),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn status(json: &str) -> BacklogStatus {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn directions_come_from_flags_and_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "spicy vegan breakfast\n\n  quick weeknight pasta  ").unwrap();

        let directions =
            collect_directions(&["autumn soups".to_string()], Some(file.path())).unwrap();
        assert_eq!(
            directions,
            vec!["autumn soups", "spicy vegan breakfast", "quick weeknight pasta"]
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(collect_directions(&[], Some(Path::new("/nonexistent/directions.txt"))).is_err());
    }

    #[test]
    fn describes_decision_points() {
        let s = status(
            r#"{"id":"00000000-0000-0000-0000-000000000001","state":"ideas_ready",
                "phase":"choosing_ideas","current":"autumn soups","pending":[],
                "ideas":[{"title":"Squash Soup","description":""}],
                "recipes":[],"advancesAt":null,"reports":[]}"#,
        );
        assert_eq!(
            describe(&s),
            "[autumn soups] choosing from 1 idea(s) (auto-selects all)"
        );
    }

    #[test]
    fn renders_mixed_reports() {
        let report: DirectionReport = serde_json::from_str(
            r#"{"direction":"tacos","outcome":{"status":"completed","recipes":[
                {"title":"Tofu Tacos","outcome":{"status":"published",
                  "recipe":{"id":"00000000-0000-0000-0000-000000000002","slug":"tofu-tacos","title":"Tofu Tacos"}}},
                {"title":"Fish Tacos","outcome":{"status":"failed",
                  "failure":{"stage":null,"kind":"storage","message":"busy","retryable":true}}}]}}"#,
        )
        .unwrap();
        let text = render_report(&report);
        assert!(text.contains("published  Tofu Tacos (tofu-tacos)"));
        assert!(text.contains("failed     Fish Tacos: busy [storage]"));
    }
}

//! Drive the live-preview wizard from a terminal. The server keeps nothing
//! between calls, so the wizard is saved to a local JSON file after every
//! action and sent back with the next one.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use larder_core::orchestrator::{PreviewStep, PreviewWizard, WizardEdit};
use larder_core::{IdeaRequest, RecipeIdea};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::Client;

#[derive(Subcommand)]
pub enum PreviewCommand {
    /// Start over with a new request
    Start {
        /// What to cook, e.g. "spicy vegan breakfast"
        #[arg(long)]
        direction: Option<String>,
        /// Cuisine to lean on (repeatable)
        #[arg(long = "cuisine")]
        cuisines: Vec<String>,
        /// 0 (classic) to 100 (adventurous)
        #[arg(long)]
        innovation: Option<u8>,
    },
    /// Print the saved wizard
    Show,
    /// Run the current step
    Advance,
    /// Discard the current step's output and go back one step
    Back,
    /// Replace the generated idea
    Idea {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Replace the main image prompt
    ImagePrompt { prompt: String },
    /// Replace the instructions with the lines of a file
    Instructions { file: std::path::PathBuf },
    /// Delete the saved wizard
    Reset,
}

#[derive(Debug, Deserialize)]
struct PreviewResponse {
    message: String,
    #[serde(default)]
    error: Option<String>,
    wizard: PreviewWizard,
}

#[derive(Debug, Serialize)]
struct PreviewRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    wizard: Option<&'a PreviewWizard>,
    action: serde_json::Value,
}

/// Read the saved wizard, if there is one.
pub fn load(path: &Path) -> Result<Option<PreviewWizard>> {
    if !path.exists() {
        return Ok(None);
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let wizard = PreviewWizard::from_json(&json)
        .with_context(|| format!("{} does not hold a usable wizard", path.display()))?;
    Ok(Some(wizard))
}

pub fn save(path: &Path, wizard: &PreviewWizard) -> Result<()> {
    let json = wizard.to_json().context("Failed to serialize wizard")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

fn action_for(command: PreviewCommand) -> Result<Option<serde_json::Value>> {
    let action = match command {
        PreviewCommand::Start {
            direction,
            cuisines,
            innovation,
        } => {
            let request = IdeaRequest {
                direction,
                cuisines,
                innovation_level: innovation,
            };
            json!({ "type": "start", "request": request })
        }
        PreviewCommand::Advance => json!({ "type": "advance" }),
        PreviewCommand::Back => json!({ "type": "back" }),
        PreviewCommand::Idea { title, description } => edit(WizardEdit::Idea(RecipeIdea {
            title,
            description,
        }))?,
        PreviewCommand::ImagePrompt { prompt } => edit(WizardEdit::ImagePrompt(prompt))?,
        PreviewCommand::Instructions { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let steps = text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect();
            edit(WizardEdit::Instructions(steps))?
        }
        PreviewCommand::Show | PreviewCommand::Reset => return Ok(None),
    };
    Ok(Some(action))
}

fn edit(edit: WizardEdit) -> Result<serde_json::Value> {
    Ok(json!({ "type": "edit", "edit": serde_json::to_value(edit)? }))
}

pub async fn run(server: &str, state: &Path, command: PreviewCommand) -> Result<()> {
    if matches!(command, PreviewCommand::Reset) {
        if state.exists() {
            std::fs::remove_file(state)
                .with_context(|| format!("Failed to remove {}", state.display()))?;
        }
        println!("Wizard reset");
        return Ok(());
    }

    let saved = load(state)?;
    let Some(action) = action_for(command)? else {
        match &saved {
            Some(wizard) => print!("{}", render(wizard)),
            None => println!("No wizard saved at {}", state.display()),
        }
        return Ok(());
    };

    let client = Client::new(server);
    let response: PreviewResponse = client
        .post(
            "/api/preview",
            &PreviewRequest {
                wizard: saved.as_ref(),
                action,
            },
        )
        .await?;

    save(state, &response.wizard)?;
    match response.error {
        Some(code) => println!("{} ({})", response.message, code),
        None => println!("{}", response.message),
    }
    print!("{}", render(&response.wizard));
    Ok(())
}

/// Human-readable summary of the wizard's current step.
pub fn render(wizard: &PreviewWizard) -> String {
    let mut out = format!("Step: {:?}\n", wizard.step);
    match wizard.step {
        PreviewStep::Idea => {
            let request = &wizard.request;
            out.push_str(&format!(
                "Direction: {}\n",
                request.direction.as_deref().unwrap_or("(any)")
            ));
            if !request.cuisines.is_empty() {
                out.push_str(&format!("Cuisines: {}\n", request.cuisines.join(", ")));
            }
        }
        PreviewStep::EditIdea => {
            if let Some(idea) = &wizard.idea {
                out.push_str(&format!("Idea: {}\n  {}\n", idea.title, idea.description));
            }
        }
        PreviewStep::Recipe => {
            if let Some(recipe) = &wizard.recipe {
                out.push_str(&format!("Recipe: {}\n", recipe.title));
                for line in &recipe.ingredients {
                    out.push_str(&format!("  - {} {} {}\n", line.quantity, line.unit, line.name));
                }
                for (i, step) in recipe.instructions.iter().enumerate() {
                    out.push_str(&format!("  {}. {}\n", i + 1, step));
                }
            }
        }
        PreviewStep::Published => {
            if let Some(published) = &wizard.published {
                out.push_str(&format!("Published: {} ({})\n", published.title, published.slug));
            }
        }
    }
    if let Some(failure) = &wizard.error {
        out.push_str(&format!("Last error: {} [{}]\n", failure.message, failure.kind));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_state_file_means_no_wizard() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("preview.json")).unwrap().is_none());
    }

    #[test]
    fn wizard_survives_a_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preview.json");

        let mut wizard = PreviewWizard::new(IdeaRequest::for_direction("spicy vegan breakfast"));
        wizard.step = PreviewStep::EditIdea;
        wizard.idea = Some(RecipeIdea {
            title: "Chipotle Tofu Tacos".to_string(),
            description: "Smoky and quick.".to_string(),
        });
        save(&path, &wizard).unwrap();

        assert_eq!(load(&path).unwrap(), Some(wizard));
    }

    #[test]
    fn incomplete_state_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preview.json");
        std::fs::write(&path, r#"{"step":"recipe"}"#).unwrap();
        assert!(load(&path).is_err());
    }

    #[test]
    fn idea_edits_are_tagged_for_the_server() {
        let action = action_for(PreviewCommand::Idea {
            title: "Soup".to_string(),
            description: String::new(),
        })
        .unwrap()
        .unwrap();
        assert_eq!(action["type"], "edit");
        assert_eq!(action["edit"]["field"], "idea");
        assert_eq!(action["edit"]["value"]["title"], "Soup");
    }

    #[test]
    fn show_needs_no_request() {
        assert!(action_for(PreviewCommand::Show).unwrap().is_none());
    }

    #[test]
    fn renders_the_idea_step() {
        let wizard = PreviewWizard::new(IdeaRequest {
            direction: Some("autumn soups".to_string()),
            cuisines: vec!["French".to_string()],
            innovation_level: None,
        });
        let text = render(&wizard);
        assert!(text.contains("Direction: autumn soups"));
        assert!(text.contains("Cuisines: French"));
    }
}

//! Recommendation commands.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use nudgewell_core::{Recommendation, RefreshOutcome, Task, UserProfile};

use super::Workspace;

#[derive(Subcommand)]
pub enum RecommendAction {
    /// Regenerate recommendations from a profile and task snapshot
    Refresh {
        /// Profile JSON file (omit when no profile exists yet)
        #[arg(long)]
        profile: Option<PathBuf>,
        /// Tasks JSON file (array of tasks)
        #[arg(long)]
        tasks: Option<PathBuf>,
        /// Only populate when nothing is stored yet
        #[arg(long)]
        auto: bool,
    },
    /// Show active recommendations
    List {
        /// Include dismissed, completed and expired entries
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Dismiss a recommendation so it never resurfaces
    Dismiss {
        /// Recommendation ID
        id: String,
    },
    /// Mark a recommendation as done
    Complete {
        /// Recommendation ID
        id: String,
    },
    /// Forget all dismissed recommendation IDs
    ClearDismissed,
}

pub async fn run(
    workspace: &Workspace,
    action: RecommendAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = workspace.open_engine().await?;

    match action {
        RecommendAction::Refresh { profile, tasks, auto } => {
            let profile = profile.as_deref().map(read_profile).transpose()?;
            let tasks = match tasks.as_deref() {
                Some(path) => read_tasks(path)?,
                None => Vec::new(),
            };

            let outcome = if auto {
                engine.auto_refresh(profile.as_ref(), &tasks).await?
            } else {
                engine.refresh(profile.as_ref(), &tasks).await?
            };

            match outcome {
                RefreshOutcome::NoProfile => println!("No profile available; nothing generated."),
                RefreshOutcome::Skipped => println!("Recommendations already populated; skipped."),
                RefreshOutcome::Refreshed { context, generated, merge } => {
                    println!("Generated {} recommendation(s)", generated);
                    println!("  Added: {}", merge.added);
                    println!("  Expired removed: {}", merge.expired);
                    println!("  Time of day: {}", context.time_of_day.name());
                    if !context.struggling_areas.is_empty() {
                        println!("  Struggling: {}", context.struggling_areas.join(", "));
                    }
                }
            }
        }
        RecommendAction::List { all, json } => {
            let recs = if all {
                engine.recommendations().await
            } else {
                engine.active_recommendations().await
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&recs)?);
            } else if recs.is_empty() {
                println!("No recommendations right now.");
            } else {
                print_recommendations(&recs);
            }
        }
        RecommendAction::Dismiss { id } => {
            engine.dismiss(&id).await?;
            println!("Dismissed: {id}");
        }
        RecommendAction::Complete { id } => {
            engine.complete(&id).await?;
            println!("Completed: {id}");
        }
        RecommendAction::ClearDismissed => {
            engine.clear_dismissed().await?;
            println!("Dismissed list cleared");
        }
    }
    Ok(())
}

fn read_profile(path: &Path) -> Result<UserProfile, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let profile: UserProfile = serde_json::from_str(&content)?;
    profile.validate()?;
    Ok(profile)
}

fn read_tasks(path: &Path) -> Result<Vec<Task>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn print_recommendations(recs: &[Recommendation]) {
    println!("=== Recommendations ===\n");
    for (i, rec) in recs.iter().enumerate() {
        println!("{}. {} (Score: {:.2})", i + 1, rec.title, rec.relevance_score);
        println!("   {}", rec.description);
        println!("   Reason: {}", rec.reason);
        if let (Some(label), Some(route)) = (&rec.action_label, &rec.action_route) {
            println!("   Action: {} -> {}", label, route);
        }
        let mut flags = Vec::new();
        if rec.dismissed {
            flags.push("dismissed");
        }
        if rec.completed {
            flags.push("completed");
        }
        if !flags.is_empty() {
            println!("   Status: {}", flags.join(", "));
        }
        println!("   ID: {}", rec.id);
        println!();
    }
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "nudgewell-cli", version, about = "Nudgewell CLI")]
struct Cli {
    /// Data directory (defaults to ~/.config/nudgewell)
    #[arg(long, global = true, env = "NUDGEWELL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Personalized recommendations
    Recommend {
        #[command(subcommand)]
        action: commands::recommend::RecommendAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let workspace = match commands::Workspace::resolve(cli.data_dir) {
        Ok(workspace) => workspace,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    commands::init_logging(&workspace);

    let result = match cli.command {
        Commands::Recommend { action } => commands::recommend::run(&workspace, action).await,
        Commands::Config { action } => commands::config::run(&workspace, action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

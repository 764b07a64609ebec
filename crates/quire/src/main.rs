//! quire - build, preview and logo task runner for the IDEEP website.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use quire_proc::{GeneratorError, Runner, SystemRunner};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "quire")]
#[command(about = "Build, preview and logo task runner for the IDEEP website")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to quire.toml config file
    #[arg(short, long, default_value = "quire.toml", global = true)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the site generator in release mode
    Build,

    /// Serve the built site, freeing the port first
    Serve {
        /// Port to listen on (defaults to config or 8000)
        port: Option<u16>,

        /// Directory to serve (defaults to the configured output dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Open the site in a browser
        #[arg(long)]
        open: bool,
    },

    /// Build, then serve
    Preview {
        /// Port to listen on (defaults to config or 8000)
        port: Option<u16>,

        /// Open the site in a browser
        #[arg(long)]
        open: bool,
    },

    /// Build, serve, and rebuild when content changes
    Dev {
        /// Port to listen on (defaults to config or 8000)
        port: Option<u16>,

        /// Open the site in a browser
        #[arg(long)]
        open: bool,
    },

    /// Terminate whatever is listening on a port
    KillPort {
        /// Port to free (defaults to config or 8000)
        port: Option<u16>,
    },

    /// Build a logo's PDF and SVG from its LaTeX source
    Logo {
        /// Logo job name
        #[arg(default_value = "logo")]
        name: String,
    },

    /// Build the IDEEP logo
    IdeepLogo,

    /// Remove generated output
    Clean {
        /// Also remove stray LaTeX intermediates in the assets directory
        #[arg(long)]
        all: bool,
    },

    /// Write a default quire.toml
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            match err.downcast_ref::<GeneratorError>() {
                Some(e) => ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1)),
                None => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let runner: Arc<dyn Runner> = Arc::new(SystemRunner);
    // init and kill-port must work even when the existing file is broken
    let load = || config::load(&cli.config);

    match cli.command {
        Commands::Init { yes } => commands::init::run(&cli.config, yes).await,
        Commands::Build => commands::build::run(&load()?, runner).await,
        Commands::Serve { port, dir, open } => {
            commands::serve::run(&load()?, runner, port, dir, open).await
        }
        Commands::Preview { port, open } => {
            commands::preview::run(&load()?, runner, port, open).await
        }
        Commands::Dev { port, open } => commands::dev::run(&load()?, runner, port, open).await,
        Commands::KillPort { port } => {
            let port = commands::kill_port::resolve_port(port, &cli.config);
            commands::kill_port::run(runner, port).await
        }
        Commands::Logo { ref name } => commands::logo::run(&load()?, runner, name).await,
        Commands::IdeepLogo => commands::logo::run(&load()?, runner, "ideep-logo").await,
        Commands::Clean { all } => commands::clean::run(&load()?, all).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn ports_are_positional() {
        let cli = Cli::try_parse_from(["quire", "serve", "9000"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { port: Some(9000), .. }));

        let cli = Cli::try_parse_from(["quire", "kill-port"]).unwrap();
        assert!(matches!(cli.command, Commands::KillPort { port: None }));
    }

    #[test]
    fn logo_commands() {
        let cli = Cli::try_parse_from(["quire", "logo"]).unwrap();
        assert!(matches!(cli.command, Commands::Logo { ref name } if name == "logo"));

        let cli = Cli::try_parse_from(["quire", "ideep-logo"]).unwrap();
        assert!(matches!(cli.command, Commands::IdeepLogo));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["quire", "build", "--config", "site.toml", "-v"]).unwrap();

        assert_eq!(cli.config, PathBuf::from("site.toml"));
        assert!(cli.verbose);
    }
}

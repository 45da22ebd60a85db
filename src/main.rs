mod ai;
mod autofix;
mod config;
mod diff;
mod github;
mod report;
mod signature;
mod webhook;

#[cfg(test)]
mod test_support;

use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, info_span};
use tracing_subscriber::EnvFilter;

/// PR Assistant: GitHub webhook bot that answers issues, reviews pull
/// requests and replies to review comments using a chat-completion model.
#[derive(Parser, Debug)]
#[command(name = "pr-assistant", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the webhook server
    Serve {
        /// Listen address (overrides BIND_ADDR and the config file)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Print the digest of a unified diff, as forwarded to the model in reviews
    Digest {
        /// Diff file to read. Reads stdin when omitted.
        file: Option<PathBuf>,

        /// Optional output file path for a markdown report
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Use the built-in sample diff
        #[arg(long)]
        r#mock: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind } => serve(bind).await,
        Command::Digest {
            file,
            output,
            r#mock,
        } => digest(file, output, r#mock),
    }
}

async fn serve(bind: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    info!("loading configuration");
    let config = config::Config::load()?;

    let policy = config.signature_policy()?;
    let github = github::GitHubClient::new(config.github_token()?, config.github.api_base.clone());
    let ai = ai::AiClient::new(config.ai.clone());
    if config.fix.auto_apply {
        info!("automatic fix PRs enabled");
    }

    let dispatcher = webhook::Dispatcher::new(
        Arc::new(ai),
        Arc::new(github),
        webhook::BotSettings {
            default_label: config.github.default_label.clone(),
            auto_apply_fix: config.fix.auto_apply,
        },
    );
    let app = webhook::build_router(webhook::AppState::new(policy, dispatcher));

    let addr = bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %listener.local_addr()?, "listening for webhooks");

    axum::serve(listener, app).await?;
    Ok(())
}

fn digest(
    file: Option<PathBuf>,
    output: Option<PathBuf>,
    mock: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let _span = info_span!("digest").entered();

    let diff_text = if mock {
        info!("using built-in sample diff");
        include_str!("../tests/fixtures/sample_diff.patch").to_string()
    } else if let Some(path) = &file {
        info!(path = %path.display(), "reading diff file");
        std::fs::read_to_string(path)?
    } else {
        info!("reading diff from stdin");
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    };

    let built_report = report::build(&diff_text);
    report::output(&built_report, output.as_deref())?;
    info!(
        files = built_report.files_changed(),
        added = built_report.total_added,
        removed = built_report.total_removed,
        "done"
    );

    Ok(())
}

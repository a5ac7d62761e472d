mod request;
mod serve;

use anyhow::Context;
use clap::{Parser, Subcommand};
use redscout_engine::analysis::DEFAULT_COMMENT_TYPE;
use redscout_engine::backend::Backend;
use redscout_engine::{ConfigLoader, NoteService, RedscoutConfig};
use redscout_h::ChromiumBackend;
use request::{DEFAULT_SEARCH_LIMIT, Request};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "redscout", version, about = "Xiaohongshu note automation")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file (defaults to ./redscout.yaml, then ~/.redscout/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Browser profile directory holding the login
    #[arg(long, global = true)]
    profile_dir: Option<PathBuf>,

    /// Run the browser without a window
    #[arg(long, global = true)]
    headless: bool,

    /// Print the structured result as JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Open the site and wait for a QR-code login
    Login,
    /// Search notes by keywords
    Search {
        keywords: String,
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
        /// Sort by newest first
        #[arg(long)]
        latest: bool,
    },
    /// Read a note's title, author, date and body
    Note { url: String },
    /// Collect a note's comments
    Comments { url: String },
    /// Classify a note and extract keywords
    Analyze { url: String },
    /// Analyze a note and print guidance for writing a comment
    SmartComment {
        url: String,
        #[arg(long = "type", default_value = DEFAULT_COMMENT_TYPE)]
        comment_type: String,
    },
    /// Post a comment
    Comment { url: String, text: String },
    /// Like a note
    Like { url: String },
    /// Follow a note's author
    Follow { url: String },
    /// Read JSON requests from stdin, one per line
    Serve,
}

impl Command {
    fn into_request(self) -> Option<Request> {
        let request = match self {
            Command::Login => Request::Login,
            Command::Search {
                keywords,
                limit,
                latest,
            } => Request::SearchNotes {
                keywords,
                limit,
                sort_by_time: latest,
            },
            Command::Note { url } => Request::GetNoteContent { url },
            Command::Comments { url } => Request::GetNoteComments { url },
            Command::Analyze { url } => Request::AnalyzeNote { url },
            Command::SmartComment { url, comment_type } => {
                Request::PostSmartComment { url, comment_type }
            }
            Command::Comment { url, text } => Request::PostComment { url, comment: text },
            Command::Like { url } => Request::LikeNote { url },
            Command::Follow { url } => Request::FollowUser { url },
            Command::Serve => return None,
        };
        Some(request)
    }
}

async fn load_config(args: &Args) -> anyhow::Result<RedscoutConfig> {
    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from(path)
            .await
            .with_context(|| format!("Cannot load config {}", path.display()))?,
        None => ConfigLoader::load_default().await?,
    };
    if let Some(dir) = &args.profile_dir {
        config.browser.profile_dir = Some(dir.clone());
    }
    if args.headless {
        config.browser.headless = true;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries results; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args).await?;

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling");
            ctrl_c.cancel();
        }
    });

    let browser = config.browser.clone();
    let service = NoteService::new(
        config,
        Box::new(move || -> Box<dyn Backend> { Box::new(ChromiumBackend::new(browser.clone())) }),
        token.clone(),
    );

    let outcome = match args.command.into_request() {
        Some(request) => run_once(&service, request, args.json).await,
        None => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            serve::run(&service, stdin, tokio::io::stdout(), token).await
        }
    };

    if let Err(e) = service.shutdown().await {
        tracing::warn!("Browser shutdown failed: {}", e);
    }
    outcome
}

async fn run_once(service: &NoteService, request: Request, json: bool) -> anyhow::Result<()> {
    let reply = request::execute(service, request).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&reply.result)?);
    } else {
        println!("{}", reply.text);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smart_comment_type_defaults_to_traffic() {
        let args = Args::try_parse_from([
            "redscout",
            "smart-comment",
            "https://www.xiaohongshu.com/explore/1",
        ])
        .unwrap();
        let Some(Request::PostSmartComment { comment_type, .. }) = args.command.into_request()
        else {
            panic!("expected a smart comment request");
        };
        assert_eq!(comment_type, "引流");
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let args = Args::try_parse_from(["redscout", "login", "--headless", "--json"]).unwrap();
        assert!(args.headless);
        assert!(args.json);
        assert!(matches!(args.command, Command::Login));
    }
}

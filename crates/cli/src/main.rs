// ABOUTME: CLI for inspecting video feeds: fetch a page from a static file or remote API, classify URLs.
// ABOUTME: Prints JSON to stdout; logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use reelfeed_client::FeedClient;
use reelfeed_feed::{
    classify, AssemblerConfig, Cursor, FeedAssembler, FeedPage, FeedQuery, FeedSource, PageNotice,
    StaticSource,
};
use serde_json::{json, Value};

/// Inspect video feeds and print JSON.
#[derive(Parser, Debug)]
#[command(name = "reelfeed")]
#[command(about = "Fetch video feed pages and classify video URLs", long_about = None)]
struct Cli {
    /// Output compact JSON instead of pretty.
    #[arg(long, global = true, default_value_t = false)]
    compact: bool,

    /// Log debug output to stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one page of playable video items.
    Page(PageArgs),
    /// Classify one or more URLs as video descriptors.
    Classify {
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

#[derive(ClapArgs, Debug)]
#[command(group = clap::ArgGroup::new("source").required(true).args(["static_path", "remote"]))]
struct PageArgs {
    /// Static JSON collection (array of entries or {"casts": [...]}).
    #[arg(long = "static", value_name = "FILE")]
    static_path: Option<PathBuf>,

    /// Remote feed API base URL.
    #[arg(long, value_name = "URL")]
    remote: Option<String>,

    #[arg(long, env = "REELFEED_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Upstream feed selector.
    #[arg(long, default_value = "filter")]
    feed_type: String,

    #[arg(long)]
    cursor: Option<String>,

    #[arg(long)]
    limit: Option<usize>,

    /// Only entries by this author.
    #[arg(long)]
    fid: Option<u64>,

    /// Remote request timeout, e.g. "15s" or "1m".
    #[arg(long, value_parser = parse_timeout, default_value = "15s")]
    timeout: Duration,
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    parse_duration::parse(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "reelfeed_feed=debug,reelfeed_client=debug".to_string()
        } else {
            "warn".to_string()
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let output = match cli.command {
        Command::Page(args) => run_page(args).await?,
        Command::Classify { urls } => run_classify(&urls),
    };

    if cli.compact {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}

async fn run_page(args: PageArgs) -> Result<Value> {
    let source = match (&args.static_path, &args.remote) {
        (Some(path), _) => {
            let source = StaticSource::from_path(path)
                .with_context(|| format!("loading {}", path.display()))?;
            FeedSource::Static(Arc::new(source))
        }
        (None, Some(base_url)) => {
            let mut builder = FeedClient::builder()
                .base_url(base_url.clone())
                .feed_type(args.feed_type.clone())
                .timeout(args.timeout);
            if let Some(key) = args.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
                builder = builder.api_key(key);
            }
            FeedSource::Remote(Arc::new(builder.build()))
        }
        (None, None) => anyhow::bail!("one of --static or --remote is required"),
    };

    let assembler = FeedAssembler::new(source, AssemblerConfig::default());
    let query = FeedQuery {
        cursor: args.cursor.map(Cursor::new),
        limit: args.limit,
        fid: args.fid,
    };
    let page = assembler.get_page(&query).await?;
    Ok(page_json(page))
}

fn page_json(page: FeedPage) -> Value {
    let message = page.notice.map(|notice| match notice {
        PageNotice::NoQualifyingVideo { scanned } => {
            format!("no video content found in {scanned} entries")
        }
    });
    json!({
        "videos": page.items,
        "nextCursor": page.next_cursor,
        "hasMore": page.has_more,
        "totalAvailable": page.total_available,
        "message": message,
    })
}

fn run_classify(urls: &[String]) -> Value {
    let results: Vec<Value> = urls
        .iter()
        .map(|url| {
            json!({
                "url": url,
                "descriptor": classify(Some(url.as_str()), None),
            })
        })
        .collect();
    let recognised = results.iter().filter(|r| !r["descriptor"].is_null()).count();
    json!({
        "results": results,
        "total": results.len(),
        "recognised": recognised,
    })
}

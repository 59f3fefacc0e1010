//! corsaro - search ilCorsaroNero from the command line

use anyhow::{anyhow, bail, Context, Result};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use corsaro::log::{Diagnostics, FileLog, TracingDiagnostics};
use corsaro::normalize::format_size;
use corsaro::scrapers::ReqwestFetch;
use corsaro::{
    AnimeTorrent, MediaTitles, Provider, ProviderConfig, SearchOptions, SmartSearchOptions,
    TorrentProvider,
};

const USAGE: &str = "usage:
  corsaro search <query> [--json]
  corsaro smart <title> [--query <text>] [--episode <n>] [--batch] [--json]
  corsaro magnet <detail-url>
  corsaro hash <detail-url>
  corsaro settings";

/// Parsed command line
struct Args {
    command: String,
    positional: Vec<String>,
    query: Option<String>,
    episode: i32,
    batch: bool,
    json: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let command = args.next().ok_or_else(|| anyhow!(USAGE))?;

    let mut parsed = Args {
        command,
        positional: Vec::new(),
        query: None,
        episode: 0,
        batch: false,
        json: false,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => parsed.json = true,
            "--batch" => parsed.batch = true,
            "--query" => parsed.query = Some(args.next().context("--query needs a value")?),
            "--episode" => {
                parsed.episode = args
                    .next()
                    .context("--episode needs a value")?
                    .parse()
                    .context("--episode must be a number")?;
            }
            _ => parsed.positional.push(arg),
        }
    }

    Ok(parsed)
}

fn diagnostics() -> Arc<dyn Diagnostics> {
    let path = std::env::var("CORSARO_LOG_FILE")
        .ok()
        .map(Into::into)
        .or_else(FileLog::default_path);

    match path.map(|p| FileLog::init(p)) {
        Some(Ok(log)) => Arc::new(log),
        _ => Arc::new(TracingDiagnostics),
    }
}

fn build_provider(diag: Arc<dyn Diagnostics>) -> Result<Provider> {
    let config = match std::env::var("CORSARO_BASE_URL") {
        Ok(url) if !url.is_empty() => ProviderConfig::with_base_url(url),
        _ => ProviderConfig::default(),
    };
    let http = Arc::new(ReqwestFetch::new(&config)?);
    Ok(Provider::with_parts(config, http, diag))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max - 3).collect::<String>())
    }
}

fn print_results(results: &[AnimeTorrent], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results found");
        return Ok(());
    }

    println!("Found {} results:", results.len());
    for (i, r) in results.iter().enumerate() {
        let episode = match r.episode_number {
            -1 if r.is_batch => "batch".to_string(),
            -1 => "-".to_string(),
            n => format!("ep {}", n),
        };
        println!(
            "  {:>3}. {:<60} | {:>9} | {:>4} seeds | {}",
            i + 1,
            truncate(&r.name, 60),
            format_size(r.size),
            r.seeders,
            episode
        );
    }
    Ok(())
}

fn detail_torrent(link: String) -> AnimeTorrent {
    AnimeTorrent {
        name: String::new(),
        date: String::new(),
        size: 0,
        formatted_size: String::new(),
        seeders: 0,
        leechers: 0,
        download_count: 0,
        link,
        download_url: None,
        magnet_link: None,
        info_hash: String::new(),
        resolution: String::new(),
        is_batch: false,
        is_best_release: false,
        confirmed: false,
        episode_number: -1,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file - check current directory first, then config directory
    if dotenvy::dotenv().is_err() {
        if let Some(config_dir) = dirs::config_dir() {
            dotenvy::from_path(config_dir.join("corsaro").join(".env")).ok();
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let provider = build_provider(diagnostics())?;

    match args.command.as_str() {
        "search" => {
            let query = args.positional.join(" ");
            if query.is_empty() {
                bail!(USAGE);
            }
            let results = provider.search(&SearchOptions { query }).await;
            print_results(&results, args.json)?;
        }
        "smart" => {
            let title = args.positional.join(" ");
            let opts = SmartSearchOptions {
                media: MediaTitles {
                    english_title: Some(title),
                    ..MediaTitles::default()
                },
                query: args.query,
                batch: args.batch,
                episode_number: args.episode,
            };
            let results = provider.smart_search(&opts).await;
            print_results(&results, args.json)?;
        }
        "magnet" => {
            let link = args.positional.into_iter().next().ok_or_else(|| anyhow!(USAGE))?;
            let magnet = provider.get_torrent_magnet_link(&detail_torrent(link)).await?;
            println!("{}", magnet);
        }
        "hash" => {
            let link = args.positional.into_iter().next().ok_or_else(|| anyhow!(USAGE))?;
            let hash = provider.get_torrent_info_hash(&detail_torrent(link)).await;
            if hash.is_empty() {
                bail!("info hash not found");
            }
            println!("{}", hash);
        }
        "settings" => {
            println!("{}", serde_json::to_string_pretty(&provider.settings())?);
        }
        other => bail!("unknown command {:?}\n{}", other, USAGE),
    }

    Ok(())
}

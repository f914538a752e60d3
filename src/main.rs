//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `fetch_hole` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use url::Url;

use fetch_hole::config::{Command, Opt};
use fetch_hole::dns::RecordType;
use fetch_hole::initialization::init_logger_with;
use fetch_hole::{
    CacheOverrides, CacheType, DohClient, DohRequest, FetchHole, FetchOverrides, FetchRequest,
    HashAlgorithm,
};

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::parse();

    init_logger_with(opt.log_level.into(), opt.log_format)
        .context("Failed to initialize logger")?;

    let timeout = Duration::from_secs(opt.timeout_seconds);
    let result = match opt.command {
        Command::Get {
            url,
            max_redirects,
            soft_fail,
            cache,
            hash_algorithm,
            include_headers,
        } => {
            get(
                &url,
                GetOptions {
                    timeout,
                    max_redirects,
                    soft_fail,
                    cache,
                    hash_algorithm,
                    include_headers,
                },
            )
            .await
        }
        Command::Dns {
            name,
            record_type,
            provider,
            cd,
        } => dns(&name, &record_type, &provider, cd, timeout).await,
    };

    if let Err(e) = result {
        eprintln!("fetch_hole error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}

struct GetOptions {
    timeout: Duration,
    max_redirects: usize,
    soft_fail: bool,
    cache: CacheType,
    hash_algorithm: HashAlgorithm,
    include_headers: bool,
}

async fn get(url: &str, options: GetOptions) -> Result<()> {
    let overrides = FetchOverrides {
        cache: CacheOverrides {
            cache_type: Some(options.cache),
            hash_algorithm: Some(options.hash_algorithm),
            ..Default::default()
        },
        hard_fail: Some(!options.soft_fail),
        redirect_count: Some(options.max_redirects),
        timeout: Some(options.timeout),
        ..Default::default()
    };
    let fetch_hole = FetchHole::with_reqwest(overrides).context("Failed to build HTTP client")?;
    let request = FetchRequest::get(url).with_context(|| format!("Invalid URL: {}", url))?;

    let response = fetch_hole
        .fetch(request, &FetchOverrides::default())
        .await
        .with_context(|| format!("Fetch of {} failed", url))?;

    if options.include_headers {
        println!("{} {}", response.status.as_u16(), response.status_text);
        for (name, value) in &response.headers {
            println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
        }
        println!();
    }
    let body = response.text().await.context("Failed to read response body")?;
    print!("{}", body);
    Ok(())
}

async fn dns(name: &str, record_type: &str, provider: &str, cd: bool, timeout: Duration) -> Result<()> {
    let provider = Url::parse(provider).with_context(|| format!("Invalid provider URL: {}", provider))?;
    let record_type: RecordType = record_type.parse().context("Invalid record type")?;

    let client = DohClient::with_reqwest(provider)
        .context("Failed to build HTTP client")?
        .with_timeout(timeout);
    let request = DohRequest::new(name)
        .with_type(record_type)
        .with_checking_disabled(cd);
    let response = client
        .query(&request)
        .await
        .with_context(|| format!("DoH query for {} failed", name))?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

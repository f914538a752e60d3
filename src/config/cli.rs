//! Command-line options for the `fetch_hole` binary.

use clap::{Parser, Subcommand};

use crate::config::constants::DEFAULT_REDIRECT_COUNT;
use crate::config::types::{CacheType, HashAlgorithm, LogFormat, LogLevel};

/// Command-line options.
#[derive(Debug, Parser)]
#[command(name = "fetch_hole", version, about)]
pub struct Opt {
    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain, global = true)]
    pub log_format: LogFormat,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout_seconds: u64,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch a URL, following redirects
    Get {
        /// URL to fetch
        url: String,

        /// Maximum redirects to follow
        #[arg(long, default_value_t = DEFAULT_REDIRECT_COUNT)]
        max_redirects: usize,

        /// Return non-2xx responses instead of failing
        #[arg(long)]
        soft_fail: bool,

        /// Cache tier
        #[arg(long, value_enum, default_value_t = CacheType::Memory)]
        cache: CacheType,

        /// Digest used for cache fingerprints and ETag backfill
        #[arg(long, value_enum, default_value_t = HashAlgorithm::Sha256)]
        hash_algorithm: HashAlgorithm,

        /// Print response headers
        #[arg(short = 'i', long)]
        include_headers: bool,
    },
    /// Resolve a name over DNS-over-HTTPS
    Dns {
        /// Name to query
        name: String,

        /// Record type (name or number)
        #[arg(long = "type", default_value = "A")]
        record_type: String,

        /// DoH provider URL
        #[arg(long, default_value = "https://cloudflare-dns.com/dns-query")]
        provider: String,

        /// Disable DNSSEC validation (CD bit)
        #[arg(long)]
        cd: bool,
    },
}

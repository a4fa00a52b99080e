//! Hashbox CLI
//!
//! Runs the credential-hashing service or exercises it from the command line.
//!
//! # Commands
//!
//! - `serve` - Answer newline-delimited JSON requests on stdin/stdout
//! - `invoke` - Dispatch a single JSON request payload
//! - `hash` - Hash a piece of text
//! - `compare` - Check text against a stored hash
//! - `benchmark` - Time hash computations at the configured cost
//! - `random` - Print one block from the randomness source

use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Instant;

use hashbox::algorithm::{DEFAULT_COST, EntropySource, HASH_LEN, SALT_LEN};
use hashbox::config::{DEFAULT_MAX_PAYLOAD, ENV_COST, ENV_ENTROPY, ENV_MAX_PAYLOAD, ServiceConfig};
use hashbox::dispatch::Dispatcher;
use hashbox::{invocation, logging};

#[derive(Parser)]
#[command(name = "hashbox")]
#[command(version)]
#[command(about = "Salted bcrypt hashing service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// bcrypt cost factor for new hashes (4-31)
    #[arg(long, global = true, env = ENV_COST, default_value_t = DEFAULT_COST)]
    cost: u32,

    /// Largest accepted request payload in bytes
    #[arg(long, global = true, env = ENV_MAX_PAYLOAD, default_value_t = DEFAULT_MAX_PAYLOAD)]
    max_payload: usize,

    /// Seed for the randomness source: os, or time (weak fallback)
    #[arg(long, global = true, env = ENV_ENTROPY, default_value = "os")]
    entropy: EntropySource,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve JSON requests, one per line, on stdin/stdout
    Serve,

    /// Dispatch one JSON request payload and print the response
    Invoke {
        /// Request payload, e.g. {"action":"hash","text":"hello"}
        payload: String,
    },

    /// Hash a piece of text
    Hash {
        #[arg(long)]
        text: String,
    },

    /// Compare text against a stored hash
    Compare {
        #[arg(long)]
        text: String,

        #[arg(long)]
        hash: String,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of hashes to compute
        #[arg(short, long, default_value = "10")]
        count: u32,
    },

    /// Print one random block as hex
    Random,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: logging unavailable: {}", e);
    }

    let result = build_config(&cli).and_then(|config| match cli.command {
        Commands::Serve => cmd_serve(&config),
        Commands::Invoke { payload } => cmd_invoke(&config, &payload),
        Commands::Hash { text } => cmd_hash(&config, &text),
        Commands::Compare { text, hash } => cmd_compare(&config, &text, &hash),
        Commands::Benchmark { count } => cmd_benchmark(&config, count),
        Commands::Random => cmd_random(&config),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Build and validate the service config from CLI args / environment
fn build_config(cli: &Cli) -> anyhow::Result<ServiceConfig> {
    let config = ServiceConfig {
        cost: cli.cost,
        max_payload_bytes: cli.max_payload,
        entropy: cli.entropy,
    };
    Ok(config.validate()?)
}

fn cmd_serve(config: &ServiceConfig) -> anyhow::Result<()> {
    let dispatcher = Arc::new(Dispatcher::from_config(config));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let answered = runtime.block_on(invocation::run_stdio(dispatcher))?;

    tracing::info!(answered, "input closed, shutting down");
    Ok(())
}

fn cmd_invoke(config: &ServiceConfig, payload: &str) -> anyhow::Result<()> {
    let reply = Dispatcher::from_config(config).dispatch(payload);
    println!("{}", reply.payload());
    if !reply.success {
        anyhow::bail!("request failed");
    }
    Ok(())
}

fn cmd_hash(config: &ServiceConfig, text: &str) -> anyhow::Result<()> {
    let hash = Dispatcher::from_config(config)
        .engine()
        .compute_hash(text, config.cost)?;
    println!("{}", hash);
    Ok(())
}

fn cmd_compare(config: &ServiceConfig, text: &str, hash: &str) -> anyhow::Result<()> {
    let matches = Dispatcher::from_config(config).engine().verify(text, hash);
    println!("{}", if matches { "match" } else { "no-match" });
    Ok(())
}

fn cmd_benchmark(config: &ServiceConfig, count: u32) -> anyhow::Result<()> {
    println!(
        "Running benchmark with {} hashes at cost {}...",
        count, config.cost
    );

    let dispatcher = Dispatcher::from_config(config);
    let engine = dispatcher.engine();

    let start = Instant::now();
    let mut last = String::new();
    for i in 0..count {
        last = engine.compute_hash(&format!("benchmark input {}", i), config.cost)?;
    }
    let elapsed = start.elapsed();

    let verify_start = Instant::now();
    let verified = count == 0 || engine.verify(&format!("benchmark input {}", count - 1), &last);
    let verify_elapsed = verify_start.elapsed();

    println!("\nResults:");
    println!("  Total hashes: {}", count);
    println!("  Time elapsed: {:.2}s", elapsed.as_secs_f64());
    if count > 0 {
        println!(
            "  Per hash: {:.1} ms",
            elapsed.as_secs_f64() * 1000.0 / count as f64
        );
        println!(
            "  Verify: {:.1} ms ({})",
            verify_elapsed.as_secs_f64() * 1000.0,
            if verified { "ok" } else { "MISMATCH" }
        );
    }

    println!("\nScheme parameters:");
    println!("  Cost: {} (2^{} rounds)", config.cost, config.cost);
    println!("  Salt length: {}", SALT_LEN);
    println!("  Hash length: {}", HASH_LEN);

    if !verified {
        anyhow::bail!("benchmark hash failed to verify");
    }
    Ok(())
}

fn cmd_random(config: &ServiceConfig) -> anyhow::Result<()> {
    let dispatcher = Dispatcher::from_config(config);
    let block = dispatcher.engine().salts().next_block();
    println!("{}", hex::encode(block));
    Ok(())
}

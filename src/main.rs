//! Candle-vote round resolver entry point.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use candle_resolver::api::{create_router, AppState};
use candle_resolver::chain::{ChainClient, ResolutionChain, ResolveCall};
use candle_resolver::config::{Config, VERBOSE_LOG_DIRECTIVE};
use candle_resolver::market::{CandleSource, KlinesClient, Symbol};
use candle_resolver::metrics;
use candle_resolver::round::{
    decide, resolve_round, BoundaryTicker, Profile, RoundProfile, RoundReport, Schedule,
    SymbolStatus,
};
use candle_resolver::signing::address_from_private_key;
use candle_resolver::utils::{format_ether, shutdown_signal};

/// Candle-vote round resolver.
#[derive(Parser, Debug)]
#[command(name = "candle-resolver")]
#[command(about = "Resolves candle-vote prediction rounds on-chain")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the configured profile (default): daily runs one round and
    /// exits, fifteen-min resolves every quarter hour.
    Run {
        /// Profile to run (overrides PROFILE).
        #[arg(long, value_enum)]
        profile: Option<Profile>,

        /// Sign but do not broadcast transactions.
        #[arg(long)]
        dry_run: bool,

        /// HTTP server port for health/status/metrics.
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Resolve exactly one round now, regardless of profile cadence.
    Once {
        /// Profile to run (overrides PROFILE).
        #[arg(long, value_enum)]
        profile: Option<Profile>,

        /// Sign but do not broadcast transactions.
        #[arg(long)]
        dry_run: bool,
    },

    /// Check configuration and contract artifacts.
    CheckConfig,

    /// Check operator address, balance and nonce.
    CheckAccount,

    /// Print candle stats and outcomes without touching the chain.
    Stats {
        /// Profile whose lookback to use (overrides PROFILE).
        #[arg(long, value_enum)]
        profile: Option<Profile>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging; config errors are reported again once logging is up
    let filter = match Config::load() {
        Ok(config) => EnvFilter::new(config.log_directive(args.verbose)),
        Err(_) if args.verbose => EnvFilter::new(VERBOSE_LOG_DIRECTIVE),
        Err(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Some(Command::Run {
            profile,
            dry_run,
            port,
        }) => cmd_run(profile, dry_run.then_some(true), port).await,
        Some(Command::Once { profile, dry_run }) => {
            cmd_once(profile, dry_run.then_some(true)).await
        }
        Some(Command::CheckConfig) => cmd_check_config().await,
        Some(Command::CheckAccount) => cmd_check_account().await,
        Some(Command::Stats { profile }) => cmd_stats(profile).await,
        None => cmd_run(None, None, None).await,
    }
}

/// Load and validate configuration, applying CLI overrides.
fn load_config(dry_run_override: Option<bool>) -> candle_resolver::Result<Config> {
    info!("Loading configuration...");
    let mut config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Some(dry_run) = dry_run_override {
        config.dry_run = dry_run;
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    Ok(config)
}

/// Everything a round needs, built once at startup.
struct Resolver {
    config: Config,
    params: RoundProfile,
    symbols: Vec<Symbol>,
    klines: KlinesClient,
    chain: ChainClient,
}

impl Resolver {
    async fn start(
        profile_override: Option<Profile>,
        dry_run_override: Option<bool>,
    ) -> candle_resolver::Result<Self> {
        let config = load_config(dry_run_override)?;
        let profile = match profile_override {
            Some(p) => p,
            None => config.profile()?,
        };
        let params = config.round_profile(profile);
        let symbols = config.symbols()?;

        let contract = ResolveCall::load(&params.address_file, &params.abi_file)?;
        let chain = ChainClient::connect(&config, contract).await?;
        let klines = KlinesClient::new(&config)?;

        info!("========================================");
        info!("Profile: {}", profile);
        info!("Mode: {}", if config.dry_run { "DRY RUN" } else { "LIVE" });
        info!("Contract: {}", chain.contract_address());
        info!("Operator: {}", chain.operator());
        info!(
            "Symbols: {}",
            symbols.iter().map(Symbol::as_str).collect::<Vec<_>>().join(", ")
        );
        info!(
            "Lookback: {} x 1m, gas limit {}, ties: {}",
            params.lookback, params.gas_limit, params.tie_policy
        );
        info!("========================================");

        Ok(Self {
            config,
            params,
            symbols,
            klines,
            chain,
        })
    }

    async fn round(&self) -> anyhow::Result<RoundReport> {
        let report = resolve_round(&self.klines, &self.chain, &self.symbols, &self.params).await?;
        log_report(&report);
        Ok(report)
    }
}

fn log_report(report: &RoundReport) {
    for r in &report.results {
        match &r.status {
            SymbolStatus::Submitted { tx_hash, nonce } => info!(
                "[{}] green={} red={} -> {} (nonce {}, tx {})",
                r.symbol, r.stats.green, r.stats.red, r.outcome, nonce, tx_hash
            ),
            SymbolStatus::Skipped => info!(
                "[{}] green={} red={} -> draw, skipped",
                r.symbol, r.stats.green, r.stats.red
            ),
            SymbolStatus::Failed { reason, .. } => warn!(
                "[{}] green={} red={} -> {} FAILED: {}",
                r.symbol, r.stats.green, r.stats.red, r.outcome, reason
            ),
        }
    }
}

/// Run the configured profile.
async fn cmd_run(
    profile_override: Option<Profile>,
    dry_run_override: Option<bool>,
    port_override: Option<u16>,
) -> anyhow::Result<()> {
    let resolver = Resolver::start(profile_override, dry_run_override).await?;

    if resolver.params.schedule == Schedule::Once {
        metrics::init_metrics();
        resolver.round().await?;
        return Ok(());
    }

    // Long-lived quarter-hour loop with health/status endpoints.
    let mut app_state = AppState::new(resolver.params.profile);
    if resolver.config.metrics_enabled {
        let handle = metrics::install_prometheus()?;
        app_state = app_state.with_prometheus(handle);
    } else {
        metrics::init_metrics();
    }
    *app_state.operator.write().await = Some(resolver.chain.operator().to_checksum(None));

    let port = port_override.unwrap_or(resolver.config.port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    let router = create_router(app_state.clone());
    let _server_handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    });

    info!("Waiting for 15-minute boundaries (:00, :15, :30, :45 UTC)...");
    app_state.set_ready(true);

    let mut ticker = BoundaryTicker::new();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            boundary = ticker.tick() => {
                info!("Resolving round for boundary {}", boundary);
                match resolver.round().await {
                    Ok(report) => app_state.record_round(report).await,
                    Err(e) => error!("Round aborted: {}", e),
                }
            }
            _ = &mut shutdown => {
                info!("Stopping resolver loop");
                break;
            }
        }
    }

    Ok(())
}

/// Resolve one round now.
async fn cmd_once(
    profile_override: Option<Profile>,
    dry_run_override: Option<bool>,
) -> anyhow::Result<()> {
    metrics::init_metrics();
    let resolver = Resolver::start(profile_override, dry_run_override).await?;
    let report = resolver.round().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Check configuration validity.
async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("CANDLE RESOLVER - CONFIGURATION CHECK");
    println!("======================================================================");

    // Load configuration
    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    // Validate configuration
    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    // Check private key
    print!("Checking private key... ");
    match address_from_private_key(&config.base_private_key) {
        Ok(addr) => {
            println!("OK");
            println!("  Operator address: {}", addr);
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Private key invalid"));
        }
    }

    let profile = config.profile()?;
    let params = config.round_profile(profile);

    // Check contract artifacts
    print!("Loading contract artifacts... ");
    match ResolveCall::load(&params.address_file, &params.abi_file) {
        Ok(call) => {
            println!("OK");
            println!("  Contract: {}", call.address);
            println!("  resolve selector: 0x{}", hex::encode(call.selector()));
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Contract artifacts invalid"));
        }
    }

    // Show configuration summary
    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Profile: {}", profile);
    println!("  RPC URL: {}", config.base_rpc_url);
    println!("  Address file: {}", params.address_file.display());
    println!("  ABI file: {}", params.abi_file.display());
    println!("  Symbols: {}", config.symbols.join(", "));
    println!("  Lookback: {} x 1m", params.lookback);
    println!("  Gas limit: {}", params.gas_limit);
    println!("  Tie policy: {}", params.tie_policy);
    println!("  Dry Run: {}", config.dry_run);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Check operator balance and nonce.
async fn cmd_check_account() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("CANDLE RESOLVER - ACCOUNT CHECK");
    println!("======================================================================");

    let config = load_config(None)?;
    let params = config.round_profile(config.profile()?);

    println!("RPC: {}", config.base_rpc_url);
    println!("======================================================================");

    print!("\n1. Loading contract artifacts... ");
    let contract = ResolveCall::load(&params.address_file, &params.abi_file)?;
    println!("OK");

    print!("\n2. Connecting... ");
    let chain = ChainClient::connect(&config, contract).await?;
    println!("OK");
    println!("   Chain ID: {}", chain.chain_id());
    println!("   Operator: {}", chain.operator());

    print!("\n3. Getting balance... ");
    match chain.balance().await {
        Ok(balance) => {
            println!("OK");
            println!("   Balance (wei): {}", balance);
            println!("   Balance (eth): {}", format_ether(balance));
        }
        Err(e) => {
            println!("FAILED");
            println!("   Error: {}", e);
        }
    }

    print!("\n4. Getting pending nonce... ");
    match chain.next_nonce().await {
        Ok(nonce) => {
            println!("OK");
            println!("   Nonce: {}", nonce);
        }
        Err(e) => {
            println!("FAILED");
            println!("   Error: {}", e);
        }
    }

    println!("\n======================================================================");
    println!("ACCOUNT CHECK COMPLETED");
    println!("======================================================================");

    Ok(())
}

/// Print candle stats and decided outcomes.
async fn cmd_stats(profile_override: Option<Profile>) -> anyhow::Result<()> {
    let config = load_config(None)?;
    let profile = match profile_override {
        Some(p) => p,
        None => config.profile()?,
    };
    let params = config.round_profile(profile);
    let klines = KlinesClient::new(&config)?;

    println!("======================================================================");
    println!("CANDLE RESOLVER - STATS ({}, last {} x 1m)", profile, params.lookback);
    println!("======================================================================");

    for symbol in config.symbols()? {
        let stats = klines.round_stats(symbol, params.lookback).await;
        let outcome = decide(stats);
        println!(
            "  {:<4} green={:<5} red={:<5} -> {:<4} ({:?})",
            symbol,
            stats.green,
            stats.red,
            outcome,
            params.tie_policy.apply(outcome)
        );
    }

    println!("======================================================================");
    Ok(())
}

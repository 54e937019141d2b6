mod server;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rmcp::{ServiceExt, transport::stdio};
use vs_core::{
    CachedSimulator, ElectionResult, Side, build_marginal, compute_bonus, compute_vote_share,
    parse_marginal, parse_scenario, parse_tally, region_code, segment_preference, simulate,
    tally_electoral,
};
use vs_store::{Config, Store, cache_path, default_base_dir, resolve_config_path};

#[derive(Parser)]
#[command(name = "vs", about = "Vote-share simulation CLI and MCP server")]
struct Cli {
    /// Path to vs.toml (defaults to $VS_CONFIG, then <data dir>/vs.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server on stdio transport
    Serve,

    /// Build the attitude marginal for one entity
    Marginal {
        /// Normalized recognition in [0, 1]
        #[arg(allow_negative_numbers = true)]
        recognition: f64,
        /// Favorability in [-1, 1]
        #[arg(allow_negative_numbers = true)]
        favorability: f64,
    },

    /// Compute the favorability tilt from two similarity scores
    Bonus {
        #[arg(allow_negative_numbers = true)]
        similarity_a: f64,
        #[arg(allow_negative_numbers = true)]
        similarity_b: f64,
        /// Tilt multiplier (defaults to the configured value)
        #[arg(long)]
        multiplier: Option<f64>,
    },

    /// Combine two marginals, given as JSON arrays or objects
    VoteShare { marginal_a: String, marginal_b: String },

    /// Simulate a scenario file
    Simulate {
        file: PathBuf,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
        /// Bypass the result cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Tally a {"winners": {REGION: entity|null}} file
    Tally { file: PathBuf },

    /// List electoral units, or show one region
    Units { region: Option<String> },

    /// Inspect, purge or clear the result cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show entry counts
    Stats,
    /// Remove every entry
    Clear,
    /// Remove entries older than the configured TTL
    Purge,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let path = resolve_config_path(cli.config.as_deref(), &default_base_dir());
    Config::load(&path).context("failed to load configuration")
}

fn open_store(config: &Config) -> Result<Store> {
    let path = cache_path(&default_base_dir());
    let store = Store::open(&path)
        .with_context(|| format!("failed to open cache at {}", path.display()))?;
    Ok(store.with_ttl(config.cache_ttl_secs))
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Serve => cmd_serve(&config).await,
        Commands::Marginal {
            recognition,
            favorability,
        } => cmd_marginal(*recognition, *favorability),
        Commands::Bonus {
            similarity_a,
            similarity_b,
            multiplier,
        } => cmd_bonus(&config, *similarity_a, *similarity_b, *multiplier),
        Commands::VoteShare {
            marginal_a,
            marginal_b,
        } => cmd_vote_share(marginal_a, marginal_b),
        Commands::Simulate {
            file,
            json,
            no_cache,
        } => cmd_simulate(&config, file, *json, *no_cache),
        Commands::Tally { file } => cmd_tally(&config, file),
        Commands::Units { region } => cmd_units(&config, region.as_deref()),
        Commands::Cache { action } => cmd_cache(&config, action),
    }
}

// ---------------------------------------------------------------------------
// Advisory pidfile for observability
// ---------------------------------------------------------------------------

fn pidfile_path() -> PathBuf {
    default_base_dir().join("vs-serve.pid")
}

/// Check for an existing pidfile and log accordingly, then write our own.
fn acquire_pidfile() -> Option<PathBuf> {
    let path = pidfile_path();
    if let Ok(content) = std::fs::read_to_string(&path)
        && let Ok(pid) = content.trim().parse::<u32>()
    {
        if is_process_alive(pid) {
            tracing::warn!("another vs serve (PID {pid}) is running, sharing the cache");
        } else {
            tracing::info!("cleaned up stale pidfile (PID {pid} is dead)");
            let _ = std::fs::remove_file(&path);
        }
    }

    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match std::fs::File::create(&path) {
        Ok(mut f) => {
            let _ = write!(f, "{}", std::process::id());
            tracing::info!("wrote pidfile: {}", path.display());
            Some(path)
        }
        Err(e) => {
            tracing::warn!("failed to write pidfile: {e}");
            None
        }
    }
}

fn release_pidfile(path: &Path) {
    let _ = std::fs::remove_file(path);
    tracing::info!("removed pidfile: {}", path.display());
}

#[cfg(unix)]
fn is_process_alive(pid: u32) -> bool {
    // kill(pid, 0) checks existence without sending a signal
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
}

#[cfg(not(unix))]
fn is_process_alive(_pid: u32) -> bool {
    false
}

async fn cmd_serve(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    tracing::info!("starting MCP server");

    let pidfile = acquire_pidfile();

    let server = server::VsServer::new(store, config);
    let outcome = run_service(server).await;

    if let Some(path) = pidfile {
        release_pidfile(&path);
    }
    outcome
}

async fn run_service(server: server::VsServer) -> Result<()> {
    let service = match server.serve(stdio()).await {
        Ok(service) => service,
        Err(e) => {
            // Client hung up before the handshake completed.
            tracing::info!("MCP session ended before initialization: {e}");
            return Ok(());
        }
    };

    tokio::select! {
        result = service.waiting() => {
            result.context("MCP server task failed")?;
        }
        _ = shutdown_signal() => {
            tracing::info!("received shutdown signal");
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = term.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(e) => {
                tracing::warn!("failed to install SIGTERM handler: {e}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn cmd_marginal(recognition: f64, favorability: f64) -> Result<()> {
    let m = build_marginal(recognition, favorability);
    println!("favorable:   {:.4}", m.favorable);
    println!("neutral:     {:.4}", m.neutral);
    println!("unfavorable: {:.4}", m.unfavorable);
    println!("unknown:     {:.4}", m.unknown);
    Ok(())
}

fn cmd_bonus(
    config: &Config,
    similarity_a: f64,
    similarity_b: f64,
    multiplier: Option<f64>,
) -> Result<()> {
    let multiplier = multiplier.unwrap_or(config.bonus_multiplier);
    let bonus = compute_bonus(Some(similarity_a), Some(similarity_b), multiplier);
    let pref = segment_preference(similarity_a, similarity_b);
    println!("bonus_a:    {:+.4}", bonus.a);
    println!("bonus_b:    {:+.4}", bonus.b);
    let leans = match pref.preferred {
        Some(Side::A) => "a",
        Some(Side::B) => "b",
        None => "none",
    };
    println!("leans:      {leans} ({:?} confidence)", pref.confidence);
    Ok(())
}

fn cmd_vote_share(marginal_a: &str, marginal_b: &str) -> Result<()> {
    let a = parse_marginal(marginal_a).context("invalid marginal A")?;
    let b = parse_marginal(marginal_b).context("invalid marginal B")?;
    let result = compute_vote_share(&a, &b);
    println!("vote_share_a: {:.2}%", result.vote_share_pct_a);
    println!("vote_share_b: {:.2}%", result.vote_share_pct_b);
    println!("turnout:      {:.4}", result.turnout_fraction);
    if result.low_confidence {
        println!("(no decided votes, 50/50 fallback)");
    }
    Ok(())
}

fn cmd_simulate(config: &Config, file: &Path, json: bool, no_cache: bool) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let scenario = parse_scenario(&content)
        .with_context(|| format!("invalid scenario in {}", file.display()))?;

    let simulation = config.simulation();
    let units = config.effective_units();

    let (result, source) = if no_cache {
        (simulate(&scenario, &simulation, &units), None)
    } else {
        let mut store = open_store(config)?;
        let outcome = CachedSimulator::new(&mut store, &simulation, &units).run(&scenario);
        tracing::debug!(key = %outcome.key, source = ?outcome.source, "simulation finished");
        (outcome.result, Some(outcome.source))
    };

    for region in result.low_confidence_regions() {
        tracing::warn!("region {region}: no decided votes, reporting 50/50 fallback");
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("failed to serialize result")?
        );
    } else {
        print_result(&result);
        if let Some(source) = source {
            println!("source: {}", serde_json::to_string(&source)?.trim_matches('"'));
        }
    }
    Ok(())
}

fn print_result(result: &ElectionResult) {
    println!("{} vs {}", result.entity_a, result.entity_b);
    for (region, r) in &result.regions {
        let winner = match r.winner {
            Some(side) => side.pick(&result.entity_a, &result.entity_b).as_str(),
            None => "-",
        };
        let flag = if r.low_confidence { "  (low confidence)" } else { "" };
        println!(
            "  {region:<4} {:>6.2}% {:>6.2}%  {winner}{flag}",
            r.vote_share_pct_a, r.vote_share_pct_b
        );
    }
    let overall = &result.national.overall;
    println!(
        "national: {} {:.2}%, {} {:.2}%",
        result.entity_a, overall.vote_share_pct_a, result.entity_b, overall.vote_share_pct_b
    );
    let units_a = result.tally.per_entity.get(&result.entity_a).copied().unwrap_or(0);
    let units_b = result.tally.per_entity.get(&result.entity_b).copied().unwrap_or(0);
    println!(
        "units: {} {units_a}, {} {units_b}, unallocated {}",
        result.entity_a, result.entity_b, result.tally.unallocated
    );
    match &result.tally.national_winner {
        Some(winner) => println!("winner: {winner}"),
        None => println!("winner: none"),
    }
}

fn cmd_tally(config: &Config, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let input = parse_tally(&content)
        .with_context(|| format!("invalid winners file {}", file.display()))?;
    let units = input.units.unwrap_or_else(|| config.effective_units());

    let tally = tally_electoral(&input.winners, &units, config.tie_break);
    println!(
        "{}",
        serde_json::to_string_pretty(&tally).context("failed to serialize tally")?
    );
    Ok(())
}

fn cmd_units(config: &Config, region: Option<&str>) -> Result<()> {
    let units = config.effective_units();
    let Some(region) = region else {
        for (code, count) in &units {
            println!("{code:<4} {count}");
        }
        println!("total {}", units.values().sum::<u32>());
        return Ok(());
    };
    let code = region_code(region);
    match units.get(&code) {
        Some(count) => println!("{code} {count}"),
        None => bail!("unknown region '{region}'"),
    }
    Ok(())
}

fn cmd_cache(config: &Config, action: &CacheAction) -> Result<()> {
    let store = open_store(config)?;
    match action {
        CacheAction::Stats => {
            let stats = store.stats().context("failed to read cache stats")?;
            println!("entries: {}", stats.entries);
            println!("fresh:   {}", stats.fresh);
            println!("expired: {}", stats.expired);
            match stats.ttl_secs {
                Some(ttl) => println!("ttl:     {ttl}s"),
                None => println!("ttl:     none"),
            }
        }
        CacheAction::Clear => {
            let removed = store.clear().context("failed to clear cache")?;
            println!("removed {removed} entries");
        }
        CacheAction::Purge => {
            let removed = store.purge().context("failed to purge cache")?;
            println!("purged {removed} expired entries");
        }
    }
    Ok(())
}

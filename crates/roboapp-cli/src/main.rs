//! `roboapp` – dashboard state monitor.
//!
//! Replays recorded samples into the dashboard stores and logs every store
//! update:
//!
//! 1. Loads `roboapp/config.toml` (defaults when the file is absent).
//! 2. Builds the [`AppContext`] and subscribes a logger to every store.
//! 3. Feeds `FILE` (or stdin) through the sample bus into the router.
//! 4. On EOF or Ctrl-C prints the final store values.
//!
//! ```text
//! roboapp [FILE]
//! ```

mod config;
mod replay;

use colored::Colorize;
use std::path::PathBuf;
use tracing::{error, info, warn};

use roboapp_middleware::{KeyTable, PumpStats, Router, SampleBus, pump};
use roboapp_state::{AppContext, Subscription};

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // RUST_LOG selects the filter (default "info"); ROBOAPP_LOG_FORMAT=json
    // switches to newline-delimited JSON.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("ROBOAPP_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg_path = config::config_path();
    let cfg = match config::load(&cfg_path) {
        Ok(Some(cfg)) => {
            info!(path = %cfg_path.display(), "config loaded");
            cfg
        }
        Ok(None) => {
            info!(path = %cfg_path.display(), "no config file; using defaults");
            config::Config::default()
        }
        Err(e) => {
            warn!(error = %e, "config error; using defaults");
            config::Config::default()
        }
    };

    let source = std::env::args_os().nth(1).map(PathBuf::from);

    // Stores are single-threaded, so everything runs on one thread.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start runtime");
            std::process::exit(1);
        }
    };

    runtime.block_on(run(cfg, source));
}

async fn run(cfg: config::Config, source: Option<PathBuf>) {
    let ctx = AppContext::new();
    let router = Router::new(ctx.clone(), KeyTable::new(&cfg.global.zenoh_prefix));
    let subscriptions = watch_stores(&ctx);

    let bus = SampleBus::default();
    let subscriber = bus.subscribe_prefix(router.keys().prefix());
    let producer = tokio::spawn(async move { replay::feed_source(source.as_deref(), bus).await });

    let stats = tokio::select! {
        stats = pump(subscriber, &router) => Some(stats),
        _ = tokio::signal::ctrl_c() => {
            println!();
            println!("{}", "⚠  Ctrl-C received – stopping replay …".yellow().bold());
            None
        }
    };

    if stats.is_none() {
        producer.abort();
    }
    match producer.await {
        Ok(Ok(feed)) => info!(published = feed.published, skipped = feed.skipped, "replay finished"),
        Ok(Err(e)) => error!(error = %e, "failed to read samples"),
        Err(e) if e.is_cancelled() => {}
        Err(e) => error!(error = %e, "replay task failed"),
    }

    for sub in &subscriptions {
        sub.unsubscribe();
    }
    print_summary(&ctx, stats);
}

/// Log every update of every store.
fn watch_stores(ctx: &AppContext) -> Vec<Subscription> {
    vec![
        ctx.camera_id()
            .subscribe(|id| info!(store = "camera_id", value = id, "store updated")),
        ctx.lidar()
            .subscribe(|v| info!(store = "lidar", value = ?v, "store updated")),
        ctx.left_disk()
            .subscribe(|v| info!(store = "left_disk", value = v, "store updated")),
        ctx.right_disk()
            .subscribe(|v| info!(store = "right_disk", value = v, "store updated")),
        ctx.flap()
            .subscribe(|v| info!(store = "flap", value = ?v, "store updated")),
        ctx.damage_panel()
            .subscribe(|v| info!(store = "damage_panel", value = ?v, "store updated")),
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// Summary
// ─────────────────────────────────────────────────────────────────────────────

fn print_summary(ctx: &AppContext, stats: Option<PumpStats>) {
    println!();
    println!("{}", "  Final dashboard state".bold().cyan());
    println!("    camera_id     {}", ctx.camera_id().get().to_string().bold());
    println!("    lidar         {}", describe(ctx.lidar().get()));
    println!("    left_disk     {}", ctx.left_disk().get().to_string().bold());
    println!("    right_disk    {}", ctx.right_disk().get().to_string().bold());
    println!("    flap          {}", describe(ctx.flap().get()));
    println!("    damage_panel  {:?}", ctx.damage_panel().get());

    if let Some(stats) = stats {
        println!();
        println!(
            "  {} routed, {} rejected, {} lagged",
            stats.routed.to_string().green(),
            stats.rejected.to_string().red(),
            stats.lagged.to_string().yellow()
        );
    }
    println!();
}

fn describe<T: std::fmt::Debug>(value: Option<T>) -> String {
    match value {
        Some(v) => format!("{v:?}"),
        None => "–".dimmed().to_string(),
    }
}

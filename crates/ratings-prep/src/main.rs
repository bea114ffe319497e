mod config;
mod error;
mod export;
mod model;
mod pipeline;
mod remap;
mod table;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use env_flags::env_flags;
use once_cell::sync::OnceCell;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::config::{UserConfig, load_user_config, parse_delimiter, pick_setting, require_dir};
use crate::pipeline::{PrepSettings, run};
use crate::remap::UnmappedPolicy;

#[derive(Debug, Clone, Copy)]
enum LogStyle {
    Json,
    Compact,
    Pretty,
    Full,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn fmt_layer<W>(writer: W, ansi: bool, style: LogStyle) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = tracing_subscriber::fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_target(true)
        .with_ansi(ansi)
        .with_writer(writer);
    match style {
        LogStyle::Json => base.json().boxed(),
        LogStyle::Compact => base.compact().boxed(),
        LogStyle::Pretty => base.pretty().boxed(),
        LogStyle::Full => base.boxed(),
    }
}

fn prep_home() -> PathBuf {
    env_flags! {
        /// Home for config.toml and logs. Defaults to $HOME/.ratings-prep
        RATINGS_PREP_HOME: &str = "";
    }
    if !(*RATINGS_PREP_HOME).is_empty() {
        PathBuf::from((*RATINGS_PREP_HOME).to_string())
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".ratings-prep")
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".ratings-prep")
    }
}

fn init_tracing(home: &Path, user_cfg: Option<&UserConfig>) {
    env_flags! {
        /// Tracing filter, e.g. "info", "debug", or targets format.
        RUST_LOG: &str = "info";
        /// Preferred filter env (alias). If set, overrides RUST_LOG.
        TRACING_FILTER: &str = "";
        /// Pretty formatting for logs (ignored if TRACING_JSON=true).
        TRACING_PRETTY: bool = false;
        /// Compact single-line formatting for logs (ignored if TRACING_JSON=true)
        TRACING_COMPACT: bool = true;
        /// JSON formatting for logs
        TRACING_JSON: bool = false;
        /// If true, also log to a daily file under <RATINGS_PREP_HOME>/logs or LOG_DIR
        LOG_TO_FILE: bool = false;
        /// Optional explicit log directory (absolute).
        LOG_DIR: &str = "";
    }

    let env_set = |k: &str| std::env::var_os(k).is_some();

    let mut level = if !(*TRACING_FILTER).is_empty() {
        (*TRACING_FILTER).to_string()
    } else {
        (*RUST_LOG).to_string()
    };
    let mut json = *TRACING_JSON;
    let mut compact = *TRACING_COMPACT;
    let mut pretty = *TRACING_PRETTY;
    let mut to_file = *LOG_TO_FILE;
    let mut log_dir = if !(*LOG_DIR).is_empty() {
        Some(PathBuf::from((*LOG_DIR).to_string()))
    } else {
        None
    };

    if let Some(cfg) = user_cfg.and_then(|c| c.logging.as_ref()) {
        if !(env_set("TRACING_FILTER") || env_set("RUST_LOG"))
            && let Some(l) = cfg.level.as_ref()
        {
            level = l.clone();
        }
        if !env_set("TRACING_JSON")
            && let Some(v) = cfg.json
        {
            json = v;
        }
        if !env_set("TRACING_COMPACT")
            && let Some(v) = cfg.compact
        {
            compact = v;
        }
        if !env_set("TRACING_PRETTY")
            && let Some(v) = cfg.pretty
        {
            pretty = v;
        }
        if !env_set("LOG_TO_FILE")
            && let Some(v) = cfg.to_file
        {
            to_file = v;
        }
        if !env_set("LOG_DIR")
            && let Some(dir) = cfg.dir.as_ref()
        {
            log_dir = Some(config::expand_home(dir));
        }
    }

    let style = if json {
        LogStyle::Json
    } else if compact {
        LogStyle::Compact
    } else if pretty {
        LogStyle::Pretty
    } else {
        LogStyle::Full
    };
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout is reserved for the confirmation message.
    let mut layers: Vec<BoxedLayer> = vec![fmt_layer(std::io::stderr, true, style)];

    static FILE_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();
    let mut log_dir_err = None;
    if to_file {
        let dir = log_dir.unwrap_or_else(|| home.join("logs"));
        match std::fs::create_dir_all(&dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(&dir, "ratings-prep.log");
                let (nb, guard) = tracing_appender::non_blocking(appender);
                let _ = FILE_GUARD.set(guard);
                layers.push(fmt_layer(nb, false, style));
            }
            Err(e) => log_dir_err = Some((dir, e)),
        }
    }

    use tracing_subscriber::prelude::*;
    if let Err(e) = tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
    {
        tracing::debug!("tracing already set: {:?}", e);
    }
    if let Some((dir, e)) = log_dir_err {
        tracing::warn!("failed to create log dir {}: {}", dir.display(), e);
    }
}

fn resolve_settings(user_cfg: Option<&UserConfig>) -> anyhow::Result<PrepSettings> {
    env_flags! {
        /// Directory containing users.csv, products.csv and interactions.csv. Required.
        DATA_PATH: &str = "";
        /// Destination directory for ratings.csv, user_map.csv, product_map.csv. Required.
        OUTPUT_PATH: &str = "";
        /// Unmapped identifier policy: "keep", "drop" or "fail"
        REMAP_UNMAPPED: &str = "keep";
        /// Input delimiter (single ASCII character, or "\t")
        REMAP_DELIMITER: &str = ",";
    }

    let env_set = |k: &str| std::env::var_os(k).is_some();
    let paths = user_cfg.and_then(|c| c.paths.as_ref());
    let remap = user_cfg.and_then(|c| c.remap.as_ref());

    let data_dir = require_dir(
        "DATA_PATH",
        env_set("DATA_PATH").then_some(*DATA_PATH),
        paths.and_then(|p| p.data_path.as_deref()),
    )?;
    let output_dir = require_dir(
        "OUTPUT_PATH",
        env_set("OUTPUT_PATH").then_some(*OUTPUT_PATH),
        paths.and_then(|p| p.output_path.as_deref()),
    )?;

    let unmapped_raw = pick_setting(
        env_set("REMAP_UNMAPPED").then_some(*REMAP_UNMAPPED),
        remap.and_then(|r| r.unmapped.as_deref()),
        *REMAP_UNMAPPED,
    );
    let unmapped = UnmappedPolicy::parse(&unmapped_raw).with_context(|| {
        format!("unmapped policy must be keep, drop or fail, got '{unmapped_raw}'")
    })?;

    let delimiter_raw = pick_setting(
        env_set("REMAP_DELIMITER").then_some(*REMAP_DELIMITER),
        remap.and_then(|r| r.delimiter.as_deref()),
        *REMAP_DELIMITER,
    );
    let delimiter = parse_delimiter(&delimiter_raw)?;

    Ok(PrepSettings {
        data_dir,
        output_dir,
        delimiter,
        unmapped,
    })
}

fn main() -> anyhow::Result<()> {
    let home = prep_home();
    let user_cfg = load_user_config(&home);
    init_tracing(&home, user_cfg.as_ref().ok().and_then(|c| c.as_ref()));
    let user_cfg = user_cfg?;

    let settings = resolve_settings(user_cfg.as_ref())?;
    tracing::info!(
        "starting ratings-prep (data={}, output={}, unmapped={:?})",
        settings.data_dir.display(),
        settings.output_dir.display(),
        settings.unmapped
    );

    let summary = run(&settings)?;
    tracing::info!(
        "prepared {} rating(s) from {} interaction(s); users={} products={} dropped={}",
        summary.ratings_written,
        summary.interactions,
        summary.users,
        summary.products,
        summary.dropped
    );
    tracing::debug!(
        "unmapped user_id={} product_id={}; outputs: {}, {}, {}",
        summary.unmapped_users,
        summary.unmapped_products,
        summary.outputs.ratings.display(),
        summary.outputs.user_map.display(),
        summary.outputs.product_map.display()
    );

    println!(
        "✔ Data prepared: {} ratings, {} users, {} products written to {}",
        summary.ratings_written,
        summary.users,
        summary.products,
        settings.output_dir.display()
    );
    Ok(())
}

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use gfdir_core::normalizer::normalize_all;
use gfdir_core::prefs::{FileStore, MapStyle, Preferences};
use gfdir_core::present::{distance_to, format_distance, matches_query, safety_label, tag_label};
use gfdir_core::{
    baseline, Coordinates, DisabledSource, GfSafety, HttpSource, Loader, LoaderConfig,
    RefreshOutcome, RefreshReport, RemoteSource, Restaurant, RestaurantStore, StaticSource,
};

const DEFAULT_PREFS: &str = "gfdir-prefs.json";

/// gfdir - gluten-free restaurant directory CLI
///
/// Load, merge and inspect the restaurant collection, and manage local
/// preferences.
#[derive(Parser)]
#[command(name = "gfdir", version, about, long_about = None)]
struct Cli {
    /// Log pipeline progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one refresh cycle and print the published collection
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Skip the network; publish the baseline only
        #[arg(long, conflicts_with = "remote_file")]
        offline: bool,
        /// Use a local JSON file as the remote payload
        #[arg(long, value_name = "PATH")]
        remote_file: Option<PathBuf>,
        /// Remote endpoint (overrides GFDIR_ENDPOINT)
        #[arg(long)]
        endpoint: Option<String>,
        /// Status partition to request (overrides GFDIR_STATUS)
        #[arg(long)]
        status: Option<String>,
        /// Fetch timeout in seconds (overrides GFDIR_TIMEOUT_SECS)
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
        /// Show distances from this point, as LAT,LON
        #[arg(long, value_name = "LAT,LON", value_parser = parse_coordinates, allow_hyphen_values = true)]
        near: Option<Coordinates>,
        /// Only restaurants matching this text
        #[arg(long)]
        query: Option<String>,
        /// Only restaurants that can be placed on a map
        #[arg(long)]
        mappable: bool,
        /// Exit 1 when the remote list could not be merged
        #[arg(long)]
        require_remote: bool,
    },

    /// Normalize raw records from a JSON file (one record or a list)
    Normalize {
        /// Path to .json file
        file: PathBuf,
    },

    /// Print the bundled baseline list, normalized, as JSON
    Baseline,

    /// Toggle a restaurant in the favorites
    Favorite {
        /// Restaurant id
        id: String,
        /// Preference file
        #[arg(long, default_value = DEFAULT_PREFS)]
        prefs: PathBuf,
    },

    /// List favorite restaurant ids
    Favorites {
        /// Preference file
        #[arg(long, default_value = DEFAULT_PREFS)]
        prefs: PathBuf,
    },

    /// Show or change the map style
    Style {
        /// New style; omit to print the current one
        #[arg(value_enum)]
        style: Option<StyleArg>,
        /// Preference file
        #[arg(long, default_value = DEFAULT_PREFS)]
        prefs: PathBuf,
    },

    /// Remember the last known location
    Locate {
        /// Position as LAT,LON
        #[arg(value_parser = parse_coordinates, allow_hyphen_values = true)]
        position: Coordinates,
        /// Preference file
        #[arg(long, default_value = DEFAULT_PREFS)]
        prefs: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum StyleArg {
    Light,
    Dark,
    Toggle,
}

struct ListOptions {
    json: bool,
    near: Option<Coordinates>,
    query: Option<String>,
    mappable: bool,
    require_remote: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match cli.command {
        Commands::List {
            json,
            offline,
            remote_file,
            endpoint,
            status,
            timeout,
            near,
            query,
            mappable,
            require_remote,
        } => {
            let options = ListOptions {
                json,
                near,
                query,
                mappable,
                require_remote,
            };
            match loader_config(endpoint, status, timeout) {
                Err(e) => fail(2, &e),
                Ok(config) if offline => run_list(DisabledSource, config, &options).await,
                Ok(config) => match remote_file {
                    Some(path) => match read_json(&path) {
                        Ok(payload) => {
                            run_list(StaticSource::new(payload), config, &options).await
                        }
                        Err((code, msg)) => fail(code, &msg),
                    },
                    None => match HttpSource::new(&config) {
                        Ok(source) => run_list(source, config, &options).await,
                        Err(e) => fail(2, &e.to_string()),
                    },
                },
            }
        }
        Commands::Normalize { file } => match read_json(&file) {
            Ok(serde_json::Value::Array(items)) => print_json(&normalize_all(&items)),
            Ok(single) => print_json(&gfdir_core::normalize(&single)),
            Err((code, msg)) => fail(code, &msg),
        },
        Commands::Baseline => print_json(&baseline::baseline()),
        Commands::Favorite { id, prefs } => cmd_favorite(&id, &prefs),
        Commands::Favorites { prefs } => {
            let favorites = Preferences::new(FileStore::new(prefs)).favorites();
            for id in &favorites {
                println!("{}", id);
            }
            0
        }
        Commands::Style { style, prefs } => cmd_style(style, &prefs),
        Commands::Locate { position, prefs } => {
            let mut preferences = Preferences::new(FileStore::new(prefs));
            match preferences.save_last_location(position) {
                Ok(saved) => {
                    println!("{} {:.6},{:.6}", "saved".green(), saved.lat, saved.lon);
                    0
                }
                Err(e) => fail(2, &e.to_string()),
            }
        }
        Commands::Version => {
            println!(
                "gfdir {} (gfdir-core {})",
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_VERSION")
            );
            0
        }
    };

    process::exit(exit_code);
}

// ── Commands ──────────────────────────────────────────────

async fn run_list<S: RemoteSource>(source: S, config: LoaderConfig, options: &ListOptions) -> i32 {
    let store = Arc::new(RestaurantStore::new());
    let loader = Loader::new(source, store, config);
    let report = loader.refresh().await;

    let shown: Vec<&Restaurant> = report
        .snapshot
        .restaurants
        .iter()
        .filter(|r| !options.mappable || r.position().is_some())
        .filter(|r| {
            options
                .query
                .as_deref()
                .map_or(true, |q| matches_query(r, q))
        })
        .collect();

    if options.json {
        print_list_json(&report, &shown, options.near);
    } else {
        print_list_human(&report, &shown, options.near);
    }

    let merged = matches!(report.outcome, RefreshOutcome::Merged { .. });
    if options.require_remote && !merged {
        1
    } else {
        0
    }
}

fn cmd_favorite(id: &str, prefs: &Path) -> i32 {
    let mut preferences = Preferences::new(FileStore::new(prefs));
    match preferences.toggle_favorite(id) {
        Ok(true) => {
            println!("{} {}", "★".yellow(), id);
            0
        }
        Ok(false) => {
            println!("{} {}", "☆".dimmed(), id);
            0
        }
        Err(e) => fail(2, &e.to_string()),
    }
}

fn cmd_style(style: Option<StyleArg>, prefs: &Path) -> i32 {
    let mut preferences = Preferences::new(FileStore::new(prefs));
    let next = match style {
        None => {
            println!("{}", preferences.map_style().as_str());
            return 0;
        }
        Some(StyleArg::Light) => MapStyle::Light,
        Some(StyleArg::Dark) => MapStyle::Dark,
        Some(StyleArg::Toggle) => preferences.map_style().toggled(),
    };
    match preferences.set_map_style(next) {
        Ok(()) => {
            println!("{}", next.as_str());
            0
        }
        Err(e) => fail(2, &e.to_string()),
    }
}

// ── Output ────────────────────────────────────────────────

fn print_list_json(report: &RefreshReport, shown: &[&Restaurant], near: Option<Coordinates>) {
    let restaurants: Vec<serde_json::Value> = shown
        .iter()
        .map(|r| {
            let mut value = serde_json::to_value(r).unwrap_or_default();
            if let (Some(from), serde_json::Value::Object(map)) = (near, &mut value) {
                map.insert("distanceKm".into(), serde_json::json!(distance_to(from, r)));
            }
            value
        })
        .collect();

    let (outcome, error) = match &report.outcome {
        RefreshOutcome::Merged { .. } => ("merged", None),
        RefreshOutcome::MalformedPayload => ("malformed", None),
        RefreshOutcome::Failed(e) => ("failed", Some(e.to_string())),
    };

    let output = serde_json::json!({
        "cycle": report.cycle,
        "origin": report.snapshot.origin,
        "outcome": outcome,
        "error": error,
        "fingerprint": report.snapshot.fingerprint,
        "count": restaurants.len(),
        "restaurants": restaurants,
    });
    print_json(&output);
}

fn print_list_human(report: &RefreshReport, shown: &[&Restaurant], near: Option<Coordinates>) {
    match &report.outcome {
        RefreshOutcome::Failed(e) => {
            eprintln!("{}: remote unavailable ({}); showing baseline", "warning".yellow(), e)
        }
        RefreshOutcome::MalformedPayload => {
            eprintln!("{}: remote payload is not a list; showing baseline", "warning".yellow())
        }
        RefreshOutcome::Merged { discarded, .. } if *discarded > 0 => {
            eprintln!("{}: {} remote record(s) without id or name ignored", "note".cyan(), discarded)
        }
        RefreshOutcome::Merged { .. } => {}
    }

    for r in shown {
        let mut line = format!("{} {}", safety_badge(r.gf_safety), r.name.bold());
        if !r.score_label.is_empty() {
            line.push_str(&format!("  {}", r.score_label));
        }
        if !r.price.is_empty() {
            line.push_str(&format!("  {}", r.price));
        }
        let place: Vec<&str> = [r.neighborhood.as_str(), r.city.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        if !place.is_empty() {
            line.push_str(&format!("  {}", place.join(", ").dimmed()));
        }
        if let Some(km) = near.and_then(|from| distance_to(from, r)) {
            line.push_str(&format!("  {}", format_distance(km).cyan()));
        }
        println!("{}", line);

        if !r.tags.is_empty() {
            let labels: Vec<&str> = r.tags.iter().map(|t| tag_label(t)).collect();
            println!("    {}", labels.join(" · ").dimmed());
        }
    }

    println!(
        "{} restaurant(s) ({:?}, cycle {})",
        shown.len(),
        report.snapshot.origin,
        report.cycle
    );
}

fn safety_badge(level: GfSafety) -> colored::ColoredString {
    let label = format!("[{}]", safety_label(level));
    match level {
        GfSafety::Dedicated => label.green(),
        GfSafety::Option => label.yellow(),
        GfSafety::Risk => label.red(),
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => fail(2, &e.to_string()),
    }
}

// ── Helpers ───────────────────────────────────────────────

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::ERROR
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn loader_config(
    endpoint: Option<String>,
    status: Option<String>,
    timeout: Option<u64>,
) -> Result<LoaderConfig, String> {
    let mut config = LoaderConfig::from_env().map_err(|e| e.to_string())?;
    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint;
    }
    if let Some(status) = status {
        config.status = status;
    }
    if let Some(secs) = timeout {
        config.timeout = Duration::from_secs(secs);
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Read and parse a JSON file; exit code 2 for I/O, 1 for invalid JSON
fn read_json(path: &Path) -> Result<serde_json::Value, (i32, String)> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| (2, format!("cannot read {}: {}", path.display(), e)))?;
    serde_json::from_str(&text).map_err(|e| (1, format!("invalid JSON in {}: {}", path.display(), e)))
}

fn parse_coordinates(text: &str) -> Result<Coordinates, String> {
    let (lat, lon) = text
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got {:?}", text))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude {:?}", lat))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude {:?}", lon))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(format!("coordinates out of range: {},{}", lat, lon));
    }
    Ok(Coordinates { lat, lon })
}

fn fail(code: i32, message: &str) -> i32 {
    eprintln!("{}: {}", "error".red(), message);
    code
}

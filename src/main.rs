use anyhow::{anyhow, Result};
use clap::{Arg, Command};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use walkdir::WalkDir;

use yt_traffic_analyzer::{
    report, Config, InputTable, TrafficAnalyzer, VideoMetadataFetcher, YouTubeClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("YouTube Traffic Analyzer")
        .version("0.1.0")
        .about("Enriches YouTube Analytics traffic-source exports with video metadata")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("PATH")
                .help("CSV file or directory of CSV files to process")
                .required(true),
        )
        .arg(
            Arg::new("api-key")
                .short('k')
                .long("api-key")
                .value_name("KEY")
                .help("YouTube Data API key (falls back to YT_ANALYZER_API_KEY)"),
        )
        .arg(
            Arg::new("reference-url")
                .short('r')
                .long("reference-url")
                .value_name("URL")
                .help("Watch-page URL of a reference video for overlap analysis"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write the flat CSV export to this file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");
    tracing_subscriber::fmt()
        .with_env_filter(if verbose {
            "yt_traffic_analyzer=debug,info"
        } else {
            "yt_traffic_analyzer=info,warn"
        })
        .init();

    // Load configuration
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    if let Some(key) = matches.get_one::<String>("api-key") {
        config.api.api_key = Some(key.clone());
    }
    if let Some(output) = matches.get_one::<String>("output") {
        config.output.export_path = Some(PathBuf::from(output));
    }

    // Credential and sanity checks happen before any file or network I/O
    config.validate()?;
    let api_key = config.api.api_key.clone().ok_or_else(|| {
        anyhow!("No API key provided (use --api-key or YT_ANALYZER_API_KEY)")
    })?;

    info!("🚀 YouTube Traffic Analyzer starting...");
    if verbose {
        info!("{}", config.summary());
    }

    let input = PathBuf::from(matches.get_one::<String>("input").unwrap());
    if !input.exists() {
        error!("Input path does not exist: {}", input.display());
        return Err(anyhow!("Input path not found"));
    }

    let tables = collect_tables(&input).await?;
    if tables.is_empty() {
        return Err(anyhow!("No CSV files found at {}", input.display()));
    }
    info!("📁 Loaded {} input table(s)", tables.len());

    let client = YouTubeClient::new(api_key, config.api.timeout_seconds)?;
    let fetcher = VideoMetadataFetcher::new(client, config.api.clone());
    let mut analyzer = TrafficAnalyzer::with_ingest_config(fetcher, &config.ingest);

    let start_time = std::time::Instant::now();
    let reference_url = matches.get_one::<String>("reference-url").map(String::as_str);
    let result = analyzer.analyze(&tables, reference_url).await;

    for warning in &result.warnings {
        warn!("⚠️ {}", warning);
    }

    if result.total_identifiers == 0 {
        error!("No valid video IDs found in the input tables");
        return Err(anyhow!("no valid video IDs found"));
    }

    info!(
        "🎉 Processed {} table(s) in {:.2}s ({} skipped)",
        result.tables_processed,
        start_time.elapsed().as_secs_f64(),
        result.tables_failed
    );

    // Per-bucket summary
    info!("📈 Analytics summary:");
    for (category, count) in report::summary_counts(&result.records) {
        info!("   {}: {} videos", category, count);
    }
    let total_views: u64 = result.records.iter().map(|r| r.display_views()).sum();
    info!("👀 Combined views: {}", report::format_number(total_views));

    for (category, members) in report::group_by_category(&result.records) {
        let top = members[0];
        info!(
            "📺 {}: top video \"{}\" ({} views, {} avg duration)",
            category,
            top.title,
            report::format_number(top.display_views()),
            report::format_duration(&top.metrics.average_view_duration)
        );
    }

    if let Some(path) = &config.output.export_path {
        let csv = report::export_csv(&result.records);
        tokio::fs::write(path, csv).await?;
        info!("💾 Export written to: {}", path.display());
    }

    Ok(())
}

/// Collect CSV tables from a file or directory path, in sorted order.
/// Unreadable files are skipped with a warning; the run continues.
async fn collect_tables(input: &Path) -> Result<Vec<InputTable>> {
    let mut paths = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if path
                .extension()
                .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"))
            {
                paths.push(path.to_path_buf());
            }
        }
        paths.sort();
    } else {
        paths.push(input.to_path_buf());
    }

    let mut tables = Vec::new();
    for path in paths {
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => tables.push(InputTable::new(path.display().to_string(), content)),
            Err(e) => warn!("⚠️ Skipping unreadable file {}: {}", path.display(), e),
        }
    }
    Ok(tables)
}

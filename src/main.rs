//! twitch-viewers CLI - map Twitch channels to their current chatters.
//!
//! Run `twitch-viewers --help` for usage information.

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use twitch_viewers::{Args, Config, TwitchClient, ViewerReport};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse_args();

    // Setup logging
    setup_logging(&args);

    // Print banner
    if !args.json_logs {
        print_banner();
    }

    // Load configuration
    let config = match Config::from_args(&args) {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    // Credentials are only needed when the channel list comes from Helix
    if args.channels.is_empty() && config.credentials.is_none() {
        error!("No credentials configured");
        eprintln!(
            "{} a client id and access token are required unless --channels is given",
            style("Error:").red().bold()
        );
        std::process::exit(1);
    }

    // Dry run mode
    if args.dry_run {
        eprintln!("\n{}", style("DRY RUN MODE").yellow().bold());
        eprintln!("Configuration validated successfully.\n");
        print_config_summary(&args, &config);
        return Ok(());
    }

    if args.verbose && !args.json_logs {
        print_config_summary(&args, &config);
    }

    let client = TwitchClient::new(config.api.clone())?;
    let show_progress = !args.no_progress && !args.json_logs;

    let streamers = if args.channels.is_empty() {
        let spinner = spinner(show_progress, format!("Fetching top {} streamers", args.count));
        let streamers = client
            .get_top_streamers(config.credentials()?, args.count)
            .await;
        finish(spinner);
        streamers?
    } else {
        args.channels.clone()
    };

    info!(streamers = streamers.len(), "Looking up viewers");

    let spinner = spinner(
        show_progress,
        format!("Gathering viewers of {} channels", streamers.len()),
    );
    let viewers = client.get_viewer_map(&streamers).await;
    finish(spinner);

    let report = ViewerReport::new(streamers, viewers);

    match &args.output {
        Some(output) => {
            report.write_to(output).await?;
            if !args.json_logs {
                eprintln!(
                    "{} Report saved to: {}",
                    style("✓").green().bold(),
                    output.display()
                );
            }
        }
        None => println!("{}", report.to_json()?),
    }

    let missing = report.missing();
    let stats = client.stats();

    if args.json_logs {
        info!(
            channels = report.viewers.len(),
            missing = missing.len(),
            viewers = report.viewers.total_viewers(),
            requests = stats.total_requests(),
            failed_requests = stats.failure_count(),
            avg_latency_ms = stats.avg_latency_ms(),
            "Complete"
        );
    } else {
        eprintln!(
            "{} {} channels, {} viewers",
            style("✓").green().bold(),
            report.viewers.len(),
            report.viewers.total_viewers()
        );
        if !missing.is_empty() {
            eprintln!(
                "{} No viewers for: {}",
                style("⚠").yellow().bold(),
                missing.join(", ")
            );
        }
        eprintln!("  {}", style(stats.summary()).dim());
    }

    Ok(())
}

fn setup_logging(args: &Args) {
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("twitch_viewers={level}")));

    // stdout carries the report, so logs go to stderr
    if args.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false)
                    .compact(),
            )
            .init();
    }
}

fn spinner(enabled: bool, message: String) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.magenta} [{elapsed_precise}] {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

fn finish(spinner: Option<ProgressBar>) {
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
}

fn print_banner() {
    eprintln!("\n    {}", style("twitch-viewers").magenta().bold());
    eprintln!(
        "    {}",
        style("Top streamers and their chatters").white().dim()
    );
    eprintln!(
        "    {}",
        style(format!("v{}", twitch_viewers::VERSION)).white().dim()
    );
    eprintln!();
}

fn print_config_summary(args: &Args, config: &Config) {
    eprintln!("{}", style("Configuration:").bold());
    if args.channels.is_empty() {
        eprintln!("  Streamers:  top {}", args.count);
    } else {
        eprintln!("  Channels:   {}", args.channels.join(", "));
    }
    match &config.credentials {
        Some(credentials) => eprintln!("  Client ID:  {}", credentials.client_id),
        None => eprintln!("  Client ID:  (none)"),
    }
    eprintln!("  Helix:      {}", config.api.helix_base_url);
    eprintln!("  TMI:        {}", config.api.tmi_base_url);
    eprintln!("  Timeout:    {:?}", config.api.timeout);
    if let Some(output) = &args.output {
        eprintln!("  Output:     {}", output.display());
    }
    eprintln!();
}

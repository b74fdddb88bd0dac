use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{WrapErr, eyre};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use csi_monitor::capture::{self, CsiCapture};
use csi_monitor::cli::{AnalyzeArgs, Cli, Commands, MonitorArgs, RecordArgs};
use csi_monitor::monitor::{self, MonitorSettings, MonitorState};
use csi_monitor::presence::Features;
use csi_monitor::record::{self, RecordLimits};
use csi_monitor::report;
use csi_monitor::serial;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // The live view owns the terminal; everything it reports goes to its log panel.
    if !matches!(cli.command, Commands::Monitor(_)) {
        tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(io::stderr),
            )
            .init();
    }

    match cli.command {
        Commands::Ports => list_ports(),
        Commands::Record(args) => record_capture(args),
        Commands::Analyze(args) => analyze(args),
        Commands::Monitor(args) => run_monitor(args),
    }
}

fn list_ports() -> color_eyre::Result<()> {
    let ports = serial::available_ports()?;
    if ports.is_empty() {
        warn!("No serial ports found!");
        return Ok(());
    }
    for (i, p) in ports.iter().enumerate() {
        println!("  [{}] {}", i, p.port_name);
    }
    Ok(())
}

fn record_capture(args: RecordArgs) -> color_eyre::Result<()> {
    let mut port = serial::open(&args.port, args.baud)
        .wrap_err_with(|| format!("failed to open {}", args.port))?;
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(args.append)
        .truncate(!args.append)
        .open(&args.output)
        .wrap_err_with(|| format!("failed to open {}", args.output.display()))?;

    let limits = RecordLimits {
        frames: args.frames,
        duration: args.seconds.map(Duration::from_secs),
    };
    info!(port = %args.port, output = %args.output.display(), "recording CSI");

    let summary = record::record(&mut *port, &mut BufWriter::new(file), limits)?;
    info!(
        frames = summary.frames,
        malformed = summary.malformed,
        elapsed_s = summary.elapsed.as_secs_f64(),
        "recording finished"
    );
    Ok(())
}

fn scenario_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn load(path: &Path) -> color_eyre::Result<CsiCapture> {
    let capture = capture::load_capture(path)?;
    info!(
        path = %path.display(),
        frames = capture.frames(),
        subcarriers = capture.width(),
        skipped = capture.skipped(),
        "loaded capture"
    );
    Ok(capture)
}

fn analyze(args: AnalyzeArgs) -> color_eyre::Result<()> {
    let thresholds = args.analysis.thresholds()?;
    let sigma = args.analysis.sigma()?;

    let paths: Vec<&Path> = std::iter::once(args.baseline.as_path())
        .chain(args.captures.iter().map(|p| p.as_path()))
        .collect();
    let mut captures = paths
        .iter()
        .map(|path| load(path))
        .collect::<color_eyre::Result<Vec<_>>>()?;

    if args.trim {
        let frames = capture::trim_to_common_length(&mut captures);
        info!(frames, "all captures trimmed");
    }

    let baseline = Features::extract(&captures[0], sigma);
    let reports: Vec<_> = paths
        .iter()
        .zip(&captures)
        .map(|(path, capture)| {
            report::analyze_scenario(&scenario_name(path), capture, &baseline, sigma, &thresholds)
        })
        .collect();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        report::write_json(&mut out, &reports)?;
    } else {
        report::write_cards(&mut out, &reports)?;
    }
    out.flush()?;
    Ok(())
}

fn run_monitor(args: MonitorArgs) -> color_eyre::Result<()> {
    let thresholds = args.analysis.thresholds()?;
    let sigma = args.analysis.sigma()?;

    let port_name = match args.port {
        Some(port) => port,
        None => serial::available_ports()?
            .into_iter()
            .next()
            .map(|p| p.port_name)
            .ok_or_else(|| eyre!("No serial ports found!"))?,
    };

    let settings = MonitorSettings {
        window: usize::try_from(args.window)?,
        sigma,
        thresholds,
    };
    let mut state = MonitorState::new(port_name.clone(), settings);

    if let Some(path) = &args.baseline {
        let capture = capture::load_capture(path)?;
        let baseline = Features::extract(&capture, settings.sigma);
        state.set_baseline(baseline);
        state.push_message(format!(
            "Baseline loaded from {} ({} frames)",
            path.display(),
            capture.frames()
        ));
    }

    monitor::run(port_name, args.baud, state)
}

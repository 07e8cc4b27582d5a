use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use form_sentinel::replay::{LandmarkSource, ReplayFrame};
use form_sentinel::{
    journal, Config, ExerciseClassifier, ExerciseKind, ExerciseReport, Frame, FrontMonitor,
    MonitorSession, PostureReport, SideMonitor, StatusSnapshot, ThresholdProfile, View,
};

#[derive(Parser, Debug)]
#[command(
    name = "form-sentinel",
    version,
    about = "Rep counting and posture alarms from body landmarks"
)]
struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Count repetitions (or hold time) over a landmark recording
    Exercise {
        #[arg(value_enum)]
        kind: ExerciseKind,
        #[arg(long)]
        input: PathBuf,
    },
    /// Replay front and side recordings through the posture monitors
    Posture {
        #[arg(long)]
        front: Option<PathBuf>,
        #[arg(long)]
        side: Option<PathBuf>,
        #[arg(long, help = "Calibrate the front view from its first visible frame")]
        calibrate: bool,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        user: Option<String>,
        #[arg(long, help = "Append the session summary to this CSV file")]
        journal: Option<PathBuf>,
    },
    /// List built-in threshold profiles
    Profiles,
    /// Write the default configuration file
    InitConfig { path: PathBuf },
}

#[derive(Serialize)]
struct ExerciseLine<'a> {
    t: f64,
    exercise: ExerciseKind,
    #[serde(flatten)]
    report: &'a ExerciseReport,
}

#[derive(Serialize)]
struct PostureLine<'a> {
    t: f64,
    #[serde(flatten)]
    status: &'a StatusSnapshot,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Exercise { kind, input } => run_exercise(kind, &input, cli.json),
        Commands::Posture {
            front,
            side,
            calibrate,
            config,
            user,
            journal,
        } => {
            let config = match config {
                Some(path) => Config::load(path)?,
                None => Config::default(),
            };
            let options = PostureOptions {
                front,
                side,
                calibrate,
                user,
                journal,
                json: cli.json,
            };
            run_posture(&config, options)
        }
        Commands::Profiles => list_profiles(cli.json),
        Commands::InitConfig { path } => {
            Config::default().save(&path)?;
            println!("wrote {}", path.display());
            Ok(())
        }
    }
}

fn run_exercise(kind: ExerciseKind, input: &Path, json: bool) -> Result<()> {
    let mut classifier = ExerciseClassifier::new(kind);
    let base = Instant::now();
    let mut best = 0;
    let mut last = None;

    for record in LandmarkSource::open(input)? {
        let ReplayFrame { timestamp, frame } = record?;
        let Some(frame) = frame else {
            continue;
        };

        let report = classifier.process_at(&frame, base + timestamp);
        best = best.max(report.count);

        let t = timestamp.as_secs_f64();
        if json {
            let line = ExerciseLine {
                t,
                exercise: kind,
                report: &report,
            };
            println!("{}", serde_json::to_string(&line)?);
        } else {
            println!(
                "{t:>7.2}s  {:<8} count={:<3} angle={:>6.1}  {}",
                report.stage.label(),
                report.count,
                report.angle,
                report.feedback
            );
        }
        last = Some(report);
    }

    if !json {
        match (kind.is_timed(), last) {
            (_, None) => println!("{kind}: no body detected"),
            (true, Some(_)) => println!("{kind}: longest hold {best}s"),
            (false, Some(report)) => println!("{kind}: {} reps", report.count),
        }
    }
    Ok(())
}

struct PostureOptions {
    front: Option<PathBuf>,
    side: Option<PathBuf>,
    calibrate: bool,
    user: Option<String>,
    journal: Option<PathBuf>,
    json: bool,
}

struct ViewEvent {
    timestamp: Duration,
    view: View,
    frame: Option<Frame>,
    /// The recording for this view ends here.
    last: bool,
}

fn load_view(path: Option<&Path>, view: View) -> Result<Vec<ViewEvent>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let frames = LandmarkSource::open(path)?.read_all()?;
    info!(%view, frames = frames.len(), "loaded recording");
    let count = frames.len();
    Ok(frames
        .into_iter()
        .enumerate()
        .map(|(i, f)| ViewEvent {
            timestamp: f.timestamp,
            view,
            frame: f.frame,
            last: i + 1 == count,
        })
        .collect())
}

fn run_posture(config: &Config, options: PostureOptions) -> Result<()> {
    if options.front.is_none() && options.side.is_none() {
        anyhow::bail!("at least one of --front or --side is required");
    }

    let profile = config.threshold_profile()?;
    let settings = config.view_settings();
    let user = options.user.unwrap_or_else(|| config.session.user.clone());
    let target = Duration::from_secs(u64::from(config.session.target_minutes) * 60);

    let mut front = FrontMonitor::new(profile.clone(), settings);
    let side = SideMonitor::new(profile.clone(), settings);
    let session = MonitorSession::new(&profile, user, target);

    let mut events = load_view(options.front.as_deref(), View::Front)?;
    events.extend(load_view(options.side.as_deref(), View::Side)?);
    events.sort_by_key(|event| event.timestamp);

    let base = Instant::now();
    for ViewEvent {
        timestamp,
        view,
        frame,
        last,
    } in events
    {
        let report: PostureReport = match view {
            View::Front => {
                if options.calibrate && !front.is_calibrated() {
                    if let Some(frame) = frame.as_ref() {
                        if let Err(e) = front.calibrate(frame) {
                            warn!("calibration skipped: {e}");
                        }
                    }
                }
                front.check(frame.as_ref())
            }
            View::Side => side.check(frame.as_ref()),
        };
        session.publish(report);

        let snapshot = session.check(base + timestamp);
        if last {
            debug!(%view, "recording ended");
            session.publish(PostureReport::unknown(view));
        }
        let t = timestamp.as_secs_f64();
        if options.json {
            let line = PostureLine {
                t,
                status: &snapshot,
            };
            println!("{}", serde_json::to_string(&line)?);
        } else {
            let categories: Vec<String> =
                snapshot.categories.iter().map(|c| c.to_string()).collect();
            println!(
                "{t:>7.2}s  front={:<7} side={:<7} alarm={}{}",
                snapshot.front.to_string(),
                snapshot.side.to_string(),
                snapshot.alarm,
                if categories.is_empty() {
                    String::new()
                } else {
                    format!("  [{}]", categories.join(","))
                }
            );
        }
    }

    let summary = session.summary();
    if options.json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!(
            "session {}: monitored {}s of {}s, {} errors (tilt={} close={} neck={} back={})",
            summary.user,
            summary.actual_secs,
            summary.target_secs,
            summary.total_errors,
            summary.tilt,
            summary.close,
            summary.neck,
            summary.back
        );
    }

    let journal_path = options
        .journal
        .or_else(|| config.session.journal_path.as_ref().map(PathBuf::from));
    if let Some(path) = journal_path {
        journal::append(&path, &summary)?;
        info!(path = %path.display(), "session summary appended");
    }
    Ok(())
}

fn list_profiles(json: bool) -> Result<()> {
    let mut profiles = BTreeMap::new();
    for name in ThresholdProfile::NAMES {
        profiles.insert(name, ThresholdProfile::named(name)?);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }
    for (name, p) in &profiles {
        println!(
            "{name:<9} neck={} torso={} round={} tilt={} offset={}px delay={}s",
            p.neck_thresh,
            p.torso_thresh,
            p.shoulder_round_thresh,
            p.tilt_thresh,
            p.offset_y,
            p.alarm_delay_secs
        );
    }
    Ok(())
}

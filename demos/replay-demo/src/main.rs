//! FormCoach Replay Demo
//!
//! Replays a JSON-lines landmark trace through one squat session:
//! - Per-rep progress
//! - Coaching feedback as it would be spoken
//! - End-of-session summary as JSON
//!
//! Usage: `replay-demo [--config session.json] [trace.jsonl]`
//!
//! Without a trace a synthetic workout is generated.

use std::error::Error;
use std::path::PathBuf;

use formcoach_core::SessionId;
use formcoach_feedback::TracingSink;
use formcoach_runtime::{logging, SessionConfig, SquatSession};
use formcoach_test::{parse_json_lines, SquatTraceBuilder, TraceFrame};
use tracing::info;

struct Args {
    config: Option<PathBuf>,
    trace: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config: None,
        trace: None,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = iter.next().ok_or("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            "--help" | "-h" => {
                return Err("usage: replay-demo [--config session.json] [trace.jsonl]".into())
            }
            _ if args.trace.is_none() => args.trace = Some(PathBuf::from(arg)),
            _ => return Err(format!("unexpected argument: {}", arg)),
        }
    }

    Ok(args)
}

/// A short workout: two clean reps, a leaning rep, a camera glitch, a shallow rep
fn synthetic_trace() -> Vec<TraceFrame> {
    let clean = SquatTraceBuilder::new()
        .jitter(0.5, 2024)
        .stand(1.0)
        .reps(2, 85.0, 2.0)
        .stand(0.5)
        .build();

    let leaning = SquatTraceBuilder::new()
        .jitter(0.5, 2025)
        .lean_ratio(0.8)
        .hold(50.0, 0.5)
        .hold(82.0, 2.0)
        .dropout(8)
        .stand(0.5)
        .rep(50.0, 1.5)
        .stand(1.0)
        .build();

    // Second part continues where the first ends
    let offset = clean.len() as f64 / 30.0;
    clean
        .into_iter()
        .chain(leaning.into_iter().map(|mut f| {
            f.t += offset;
            f
        }))
        .collect()
}

fn main() -> Result<(), Box<dyn Error>> {
    logging::init("warn");

    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };

    let trace = match &args.trace {
        Some(path) => parse_json_lines(&std::fs::read_to_string(path)?)?,
        None => synthetic_trace(),
    };

    println!("=== FormCoach Replay ===\n");
    println!("   Tier:     {}", config.skill_tier());
    println!("   Cooldown: {:?}", config.feedback_config().cooldown);
    println!("   Frames:   {}\n", trace.len());

    let mut session = SquatSession::new(SessionId::new(1), &config)?.with_sink(TracingSink);
    info!(frames = trace.len(), "replay started");

    for frame in &trace {
        let report = session.process_frame(&frame.frame, frame.at());

        if let Some(verdict) = report.rep {
            println!(
                "[{:7.2}s] rep {:?}: {} valid, {} faulted",
                frame.t, verdict, report.valid_reps, report.faulted_reps
            );
        }
        if let Some(feedback) = &report.feedback {
            println!("[{:7.2}s] coach: {}", frame.t, feedback.message);
        }
    }

    let skipped = session.skipped_frames();
    let summary = session.finish();

    println!("\n   Skipped frames: {}", skipped);
    println!("\n=== Summary ===");
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

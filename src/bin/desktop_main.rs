// src/bin/desktop_main.rs
//! Desktop runner: one assessment session against the configured skeleton source

use clap::Parser;
use motion_assess::config::{ConfigLoader, SystemConfig};
use motion_assess::detection::TestKind;
use motion_assess::error::{AssessError, AssessResult};
use motion_assess::sensor::{script_for, ScriptedSkeletonSource, SourceType};
use motion_assess::session::AssessmentSession;
use motion_assess::speech::{Announcer, LogSpeechEngine, SpeechEngine};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "motion-desktop")]
#[command(about = "Run one clinical mobility test against the scripted skeleton source", long_about = None)]
struct Args {
    /// Test to run: frt, sfbt, tug or wst (defaults to system.default_test)
    #[arg(value_name = "TEST")]
    test: Option<TestKind>,

    /// Configuration file, replaces the standard search path
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(long, value_name = "FRAMES")]
    max_frames: Option<u64>,

    /// Print the result as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

/// Prints announcements on the console
struct ConsoleSpeechEngine;

impl SpeechEngine for ConsoleSpeechEngine {
    fn speak(&mut self, text: &str) -> Result<(), AssessError> {
        println!(">> {}", text);
        Ok(())
    }
}

fn load_config(args: &Args) -> AssessResult<SystemConfig> {
    let mut loader = match &args.config {
        Some(path) => ConfigLoader::with_paths(vec![path.clone()]),
        None => ConfigLoader::new(),
    };
    Ok(loader.load_system_config()?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args)?;
    let kind = args.test.unwrap_or(config.system.default_test);

    if !args.json {
        println!("{} v{}", motion_assess::NAME, motion_assess::VERSION);
        println!("Test: {}", kind.label());
    }

    if config.sensor.source_type == SourceType::Kinect {
        return Err(AssessError::SensorUnavailable(
            "no depth-camera driver is built into this binary".to_string(),
        )
        .into());
    }

    let script = script_for(kind, &config.tests);
    let mut source = ScriptedSkeletonSource::new(script, config.simulator()).map_err(AssessError::from)?;

    // keep stdout clean for JSON output
    let announcer = if args.json {
        Announcer::spawn(LogSpeechEngine, &config.speech)
    } else {
        Announcer::spawn(ConsoleSpeechEngine, &config.speech)
    };
    let mut session = AssessmentSession::new(kind, &config, announcer)?;

    let outcome = session.run(&mut source, args.max_frames).await?;
    session.drain_announcements();

    match outcome {
        Some(result) if args.json => println!("{}", result.to_json()?),
        Some(result) => {
            println!("Test Completed at frame {}", result.frame_index);
            for metric in result.scaled(config.reporting.unit) {
                println!(
                    "  {}: {}",
                    metric.column_title(),
                    metric.formatted(config.reporting.decimal_precision)
                );
            }
            if config.reporting.enabled {
                println!("Saved to {}", config.reporting.results_path(kind).display());
            }
        }
        None => println!("No result, session ended in {}", session.state()),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let args = Args::try_parse_from([
            "motion-desktop",
            "tug",
            "--config",
            "lab.toml",
            "--max-frames",
            "300",
            "--json",
        ])
        .unwrap();
        assert_eq!(args.test, Some(TestKind::UpAndGo));
        assert_eq!(args.config, Some(PathBuf::from("lab.toml")));
        assert_eq!(args.max_frames, Some(300));
        assert!(args.json);
    }

    #[test]
    fn test_test_kind_is_optional() {
        let args = Args::try_parse_from(["motion-desktop"]).unwrap();
        assert_eq!(args.test, None);
        assert!(!args.json);
    }

    #[test]
    fn test_bad_arguments_rejected() {
        assert!(Args::try_parse_from(["motion-desktop", "--max-frames"]).is_err());
        assert!(Args::try_parse_from(["motion-desktop", "--max-frames", "ten"]).is_err());
        assert!(Args::try_parse_from(["motion-desktop", "balance"]).is_err());
        assert!(Args::try_parse_from(["motion-desktop", "--frames", "3"]).is_err());
    }

    #[test]
    fn test_console_engine_speaks() {
        assert!(ConsoleSpeechEngine.speak("Test Ready").is_ok());
    }
}

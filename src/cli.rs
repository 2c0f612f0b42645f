//! Command-line argument parsing, in the teacher's `cli.rs` shape: a
//! hand-rolled parser (no `clap`), mutual exclusion between `--scenario`
//! and `--preset`, `--help` prints usage and exits.

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepetitionPeriodArg {
    Day,
    Week,
    Auto,
}

pub struct CliOptions {
    pub scenario: Option<PathBuf>,
    pub preset: Option<String>,
    pub export_events: Option<PathBuf>,
    pub export_layout: Option<PathBuf>,
    pub smart_charging: bool,
    pub repetition_period: Option<RepetitionPeriodArg>,
    pub api_bind: Option<String>,
    pub tui: bool,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

pub fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    if args.len() == 1 && (args[0] == "--help" || args[0] == "-h") {
        print_usage();
        std::process::exit(0);
    }
    parse_options(&args)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut scenario = None;
    let mut preset = None;
    let mut export_events = None;
    let mut export_layout = None;
    let mut smart_charging = false;
    let mut repetition_period = None;
    let mut api_bind = None;
    let mut tui = false;

    while i < args.len() {
        match args[i].as_str() {
            "--scenario" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --scenario (expected a path)")?;
                if scenario.replace(PathBuf::from(path)).is_some() {
                    return Err("--scenario provided more than once".to_string());
                }
            }
            "--preset" => {
                i += 1;
                let name = args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                if preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--export-events" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --export-events (expected a file path)")?;
                if export_events.replace(PathBuf::from(path)).is_some() {
                    return Err("--export-events provided more than once".to_string());
                }
            }
            "--export-layout" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --export-layout (expected a file path)")?;
                if export_layout.replace(PathBuf::from(path)).is_some() {
                    return Err("--export-layout provided more than once".to_string());
                }
            }
            "--smart-charging" => {
                smart_charging = true;
            }
            "--repetition-period" => {
                i += 1;
                let value = args.next_or_err(i, "missing value for --repetition-period (expected day|week|auto)")?;
                let parsed = match value {
                    "day" => RepetitionPeriodArg::Day,
                    "week" => RepetitionPeriodArg::Week,
                    "auto" => RepetitionPeriodArg::Auto,
                    other => return Err(format!("unknown --repetition-period value: {other}")),
                };
                if repetition_period.replace(parsed).is_some() {
                    return Err("--repetition-period provided more than once".to_string());
                }
            }
            "--api-bind" => {
                i += 1;
                let addr = args.next_or_err(i, "missing value for --api-bind (expected host:port)")?;
                if api_bind.replace(addr.to_string()).is_some() {
                    return Err("--api-bind provided more than once".to_string());
                }
            }
            "--tui" => {
                tui = true;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if scenario.is_some() && preset.is_some() {
        return Err(
            "arguments `--scenario` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    if scenario.is_none() && preset.is_none() {
        preset = Some("single_type_demo".to_string());
    }

    Ok(CliOptions {
        scenario,
        preset,
        export_events,
        export_layout,
        smart_charging,
        repetition_period,
        api_bind,
        tui,
    })
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  depot-sim [--scenario <path> | --preset <name>]");
    eprintln!("            [--export-events <path>] [--export-layout <path>]");
    eprintln!("            [--smart-charging] [--repetition-period {{day,week,auto}}]");
    eprintln!("            [--api-bind <host:port>] [--tui]");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_scenario_cli() {
        let opts = parse_args_from(vec!["--scenario".to_string(), "scenario.toml".to_string()])
            .expect("parse should succeed");
        assert_eq!(
            opts.scenario.as_deref().and_then(|p| p.to_str()),
            Some("scenario.toml")
        );
        assert!(opts.preset.is_none());
    }

    #[test]
    fn supports_preset_cli() {
        let opts = parse_args_from(vec!["--preset".to_string(), "baseline".to_string()])
            .expect("parse should succeed");
        assert_eq!(opts.preset.as_deref(), Some("baseline"));
        assert!(opts.scenario.is_none());
    }

    #[test]
    fn defaults_to_single_type_demo_preset() {
        let opts = parse_args_from(vec![]).expect("parse should succeed");
        assert_eq!(opts.preset.as_deref(), Some("single_type_demo"));
    }

    #[test]
    fn rejects_scenario_and_preset_together() {
        let err = parse_args_from(vec![
            "--scenario".to_string(),
            "a.toml".to_string(),
            "--preset".to_string(),
            "baseline".to_string(),
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn supports_smart_charging_flag() {
        let opts = parse_args_from(vec!["--smart-charging".to_string()]).unwrap();
        assert!(opts.smart_charging);
    }

    #[test]
    fn supports_repetition_period_flag() {
        let opts = parse_args_from(vec![
            "--repetition-period".to_string(),
            "week".to_string(),
        ])
        .unwrap();
        assert_eq!(opts.repetition_period, Some(RepetitionPeriodArg::Week));
    }

    #[test]
    fn supports_export_flags() {
        let opts = parse_args_from(vec![
            "--export-events".to_string(),
            "events.csv".to_string(),
            "--export-layout".to_string(),
            "layout.csv".to_string(),
        ])
        .unwrap();
        assert_eq!(
            opts.export_events.as_deref().and_then(|p| p.to_str()),
            Some("events.csv")
        );
        assert_eq!(
            opts.export_layout.as_deref().and_then(|p| p.to_str()),
            Some("layout.csv")
        );
    }

    #[test]
    fn supports_tui_flag() {
        let opts = parse_args_from(vec!["--tui".to_string()]).unwrap();
        assert!(opts.tui);
    }

    #[test]
    fn supports_api_bind_cli() {
        let opts = parse_args_from(vec![
            "--preset".to_string(),
            "baseline".to_string(),
            "--api-bind".to_string(),
            "127.0.0.1:8080".to_string(),
        ])
        .expect("parse should succeed");
        assert_eq!(opts.api_bind.as_deref(), Some("127.0.0.1:8080"));
    }
}

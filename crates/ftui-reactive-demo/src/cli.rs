#![forbid(unsafe_code)]

//! Command-line argument parsing for the reactive demo.
//!
//! Parses args manually to keep the binary lean. Supports environment
//! variable overrides via the `FTUI_REACTIVE_DEMO_*` prefix.

use std::env;
use std::process;

use ftui_reactive::RebuildPolicy;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HELP_TEXT: &str = "\
FrankenTUI Reactive Demo: a clock element fed by a ticking source

USAGE:
    ftui-reactive-demo [OPTIONS]

OPTIONS:
    --ticks=N            Number of clock ticks before exiting (default: 5)
    --interval-ms=N      Milliseconds between ticks (default: 200)
    --rebuild=POLICY     Input rebuild policy: 'always' or 'skip-unchanged' (default: always)
    --template=PATH      Load the element template from a JSON file
    --help, -h           Show this help message
    --version, -V        Show version

ENVIRONMENT VARIABLES:
    FTUI_REACTIVE_DEMO_TICKS        Override --ticks
    FTUI_REACTIVE_DEMO_INTERVAL_MS  Override --interval-ms
    FTUI_REACTIVE_DEMO_REBUILD      Override --rebuild
    FTUI_REACTIVE_DEMO_TEMPLATE     Override --template
    RUST_LOG                        Log filter (default: warn)";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Clock ticks to run.
    pub ticks: u64,
    /// Delay between ticks.
    pub interval_ms: u64,
    pub rebuild: RebuildPolicy,
    /// Template JSON file; the built-in clock template when unset.
    pub template: Option<String>,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            ticks: 5,
            interval_ms: 200,
            rebuild: RebuildPolicy::Always,
            template: None,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Run,
    Help,
    Version,
}

impl Opts {
    /// Parse command-line arguments and environment variables.
    ///
    /// Environment variables take precedence over defaults but are overridden
    /// by explicit command-line flags.
    pub fn parse() -> Self {
        let mut opts = Self::default();
        opts.apply_env(|key| env::var(key).ok());

        let args: Vec<String> = env::args().skip(1).collect();
        match opts.apply_args(&args) {
            Ok(Action::Run) => opts,
            Ok(Action::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Action::Version) => {
                println!("ftui-reactive-demo {VERSION}");
                process::exit(0);
            }
            Err(message) => {
                eprintln!("{message}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// Apply `FTUI_REACTIVE_DEMO_*` overrides. Unparseable values are ignored.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("FTUI_REACTIVE_DEMO_TICKS")
            && let Ok(n) = val.parse()
        {
            self.ticks = n;
        }
        if let Some(val) = var("FTUI_REACTIVE_DEMO_INTERVAL_MS")
            && let Ok(n) = val.parse()
        {
            self.interval_ms = n;
        }
        if let Some(val) = var("FTUI_REACTIVE_DEMO_REBUILD")
            && let Ok(policy) = val.parse()
        {
            self.rebuild = policy;
        }
        if let Some(val) = var("FTUI_REACTIVE_DEMO_TEMPLATE")
            && !val.is_empty()
        {
            self.template = Some(val);
        }
    }

    /// Apply command-line flags.
    pub fn apply_args(&mut self, args: &[String]) -> Result<Action, String> {
        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Ok(Action::Help),
                "--version" | "-V" => return Ok(Action::Version),
                other => {
                    if let Some(val) = other.strip_prefix("--ticks=") {
                        self.ticks = val
                            .parse()
                            .map_err(|_| format!("Invalid --ticks value: {val}"))?;
                    } else if let Some(val) = other.strip_prefix("--interval-ms=") {
                        self.interval_ms = val
                            .parse()
                            .map_err(|_| format!("Invalid --interval-ms value: {val}"))?;
                    } else if let Some(val) = other.strip_prefix("--rebuild=") {
                        self.rebuild = val.parse().map_err(|err| format!("{err}"))?;
                    } else if let Some(val) = other.strip_prefix("--template=") {
                        self.template = Some(val.to_string());
                    } else {
                        return Err(format!("Unknown argument: {other}"));
                    }
                }
            }
        }
        Ok(Action::Run)
    }
}

use std::env;
use std::path::PathBuf;

/// Default API port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default seed for `--demo`.
pub const DEFAULT_DEMO_SEED: u64 = 42;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Read tables from a directory.
    Dir(PathBuf),
    /// Generate a synthetic town from a seed.
    Demo { seed: u64 },
    /// Use the directory named in the configuration.
    Configured,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    pub data: DataSource,
    pub out: Option<PathBuf>,
    pub serve: bool,
    pub port: u16,
    pub help: bool,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

/// Parses arguments, excluding the program name.
///
/// # Errors
///
/// Returns a message naming the offending argument.
pub fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut config = None;
    let mut preset = None;
    let mut data_dir = None;
    let mut demo = false;
    let mut seed = None;
    let mut out = None;
    let mut serve = false;
    let mut port = DEFAULT_PORT;

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --config (expected a TOML file path)")?;
                if config.replace(PathBuf::from(path)).is_some() {
                    return Err("--config provided more than once".to_string());
                }
            }
            "--preset" => {
                i += 1;
                let name = args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                if preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--data" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --data (expected a directory)")?;
                if data_dir.replace(PathBuf::from(path)).is_some() {
                    return Err("--data provided more than once".to_string());
                }
            }
            "--demo" => demo = true,
            "--seed" => {
                i += 1;
                let value = args.next_or_err(i, "missing value for --seed (expected a u64)")?;
                let parsed = value
                    .parse::<u64>()
                    .map_err(|_| format!("--seed value \"{value}\" is not a valid u64"))?;
                seed = Some(parsed);
            }
            "--out" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --out (expected a directory)")?;
                if out.replace(PathBuf::from(path)).is_some() {
                    return Err("--out provided more than once".to_string());
                }
            }
            "--serve" => serve = true,
            "--port" => {
                i += 1;
                let value = args.next_or_err(i, "missing value for --port (expected a u16)")?;
                port = value
                    .parse::<u16>()
                    .map_err(|_| format!("--port value \"{value}\" is not a valid u16"))?;
            }
            "--help" | "-h" => {
                return Ok(CliOptions {
                    config: None,
                    preset: None,
                    data: DataSource::Configured,
                    out: None,
                    serve: false,
                    port,
                    help: true,
                });
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if config.is_some() && preset.is_some() {
        return Err(
            "arguments `--config` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }
    if demo && data_dir.is_some() {
        return Err("arguments `--data` and `--demo` are mutually exclusive".to_string());
    }
    if seed.is_some() && !demo {
        return Err("--seed only applies with --demo".to_string());
    }

    let data = match (data_dir, demo) {
        (Some(dir), _) => DataSource::Dir(dir),
        (None, true) => DataSource::Demo {
            seed: seed.unwrap_or(DEFAULT_DEMO_SEED),
        },
        (None, false) => DataSource::Configured,
    };

    Ok(CliOptions {
        config,
        preset,
        data,
        out,
        serve,
        port,
        help: false,
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
    eprintln!("ghg-inventory - municipal greenhouse-gas inventory estimator");
    eprintln!();
    eprintln!("Usage:");
    eprintln!(
        "  ghg-inventory [--config <path> | --preset <name>] [--data <dir> | --demo [--seed <u64>]]"
    );
    eprintln!("                [--out <dir>] [--serve [--port <u16>]]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>   Load settings from a TOML file");
    eprintln!("  --preset <name>   Use a built-in preset (baseline, all_year_round)");
    eprintln!("  --data <dir>      Read source tables from <dir>");
    eprintln!("  --demo            Use a seeded synthetic town instead of files");
    eprintln!("  --seed <u64>      Seed for --demo (default: {DEFAULT_DEMO_SEED})");
    eprintln!("  --out <dir>       Write derived tables as CSV into <dir>");
    eprintln!("  --serve           Serve the report over HTTP (requires the `api` feature)");
    eprintln!("  --port <u16>      API port (default: {DEFAULT_PORT})");
}

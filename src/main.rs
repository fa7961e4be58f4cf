//! gaiactl - apply Check Point Gaia configuration templates over SSH
//!
//! Parses the command line, merges the optional defaults file underneath
//! it, and hands off to the run orchestrator. Exit codes: 0 on success,
//! 1 on a failed run, 2 on usage or credential errors, 130 on Ctrl-C.

use std::env;
use std::path::PathBuf;
use std::process;

use tracing::debug;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use gaiactl::config::loader::ConfigLoader;
use gaiactl::config::{ConnectionProfile, DeviceMode, RunConfig};
use gaiactl::logsink::{build_log_path, LogSink};
use gaiactl::{runner, ToleratedErrors};

/// Parsed command line, before defaults are merged in.
///
/// No Debug impl: the struct holds passwords.
#[derive(Default)]
struct CliArgs {
    host: Option<String>,
    user: Option<String>,
    password: Option<Zeroizing<String>>,
    keyfile: Option<PathBuf>,
    port: Option<u16>,
    template: Option<PathBuf>,
    gaia_mode: Option<DeviceMode>,
    expert_password: Option<Zeroizing<String>>,
    tolerated: Vec<String>,
    dry_run: bool,
    log_dir: Option<PathBuf>,
    log_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    debug: bool,
}

impl CliArgs {
    /// Parse command line arguments
    fn parse(args: &[String]) -> Result<Self, String> {
        let mut cli = CliArgs::default();

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--host" => {
                    cli.host = Some(Self::take_value(args, &mut i, "--host")?);
                }
                "--user" | "-u" => {
                    cli.user = Some(Self::take_value(args, &mut i, "--user")?);
                }
                "--password" => {
                    cli.password = Some(Zeroizing::new(Self::take_value(args, &mut i, "--password")?));
                }
                "--keyfile" | "-i" => {
                    cli.keyfile = Some(PathBuf::from(Self::take_value(args, &mut i, "--keyfile")?));
                }
                "--port" | "-p" => {
                    let raw = Self::take_value(args, &mut i, "--port")?;
                    cli.port = Some(
                        raw.parse::<u16>()
                            .map_err(|_| format!("Invalid port: {}", raw))?,
                    );
                }
                "--template" | "-t" => {
                    cli.template = Some(PathBuf::from(Self::take_value(args, &mut i, "--template")?));
                }
                "--gaia-mode" => {
                    cli.gaia_mode = Some(Self::take_value(args, &mut i, "--gaia-mode")?.parse()?);
                }
                "--expert-password" => {
                    cli.expert_password = Some(Zeroizing::new(Self::take_value(
                        args,
                        &mut i,
                        "--expert-password",
                    )?));
                }
                "--tolerated" => {
                    cli.tolerated.push(Self::take_value(args, &mut i, "--tolerated")?);
                }
                "--dry-run" | "-n" => {
                    cli.dry_run = true;
                }
                "--log-dir" => {
                    cli.log_dir = Some(PathBuf::from(Self::take_value(args, &mut i, "--log-dir")?));
                }
                "--log-path" => {
                    cli.log_path = Some(PathBuf::from(Self::take_value(args, &mut i, "--log-path")?));
                }
                "--config" | "-c" => {
                    cli.config_path = Some(PathBuf::from(Self::take_value(args, &mut i, "--config")?));
                }
                "--debug" | "-d" => {
                    cli.debug = true;
                }
                "--help" | "-h" => {
                    print_help();
                    process::exit(0);
                }
                "--version" | "-V" => {
                    println!("gaiactl v{}", env!("CARGO_PKG_VERSION"));
                    process::exit(0);
                }
                other => {
                    return Err(format!("Unknown option: {}", other));
                }
            }
            i += 1;
        }

        Ok(cli)
    }

    fn take_value(args: &[String], i: &mut usize, flag: &str) -> Result<String, String> {
        if *i + 1 < args.len() {
            *i += 1;
            Ok(args[*i].clone())
        } else {
            Err(format!("Missing value for {}", flag))
        }
    }
}

/// Print help information
fn print_help() {
    println!("gaiactl - apply Check Point Gaia configuration templates over SSH");
    println!();
    println!("USAGE:");
    println!("    gaiactl --host <HOST> --template <FILE> [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("        --host <HOST>            Target device hostname or address");
    println!("    -t, --template <FILE>        Template file to apply");
    println!("    -u, --user <USER>            Login user (default: admin)");
    println!("        --password <PASSWORD>    Login password");
    println!("    -i, --keyfile <FILE>         SSH private key file");
    println!("    -p, --port <PORT>            SSH port (default: 22)");
    println!("        --gaia-mode <MODE>       Device variant: spark or full (default: spark)");
    println!("        --expert-password <PW>   Expert-mode password (default: login password)");
    println!("        --tolerated <SUBSTRING>  Extra tolerated error substring (repeatable)");
    println!("    -n, --dry-run                Parse and print blocks without connecting");
    println!("        --log-dir <DIR>          Directory for the run transcript file");
    println!("        --log-path <FILE>        Exact transcript file path (overrides --log-dir)");
    println!("    -c, --config <PATH>          Defaults file (overrides the search paths)");
    println!("    -d, --debug                  Verbose diagnostic logging");
    println!("    -h, --help                   Print this help message");
    println!("    -V, --version                Print version information");
    println!();
    println!("CONFIGURATION:");
    println!("    gaiactl looks for a defaults file in the following order:");
    println!("    1. Path specified with --config");
    println!("    2. ~/.config/gaiactl/config.toml");
    println!("    3. ~/.gaiactl.toml");
    println!("    4. ./gaiactl.toml");
    println!("    5. Built-in defaults");
    println!();
    println!("ENVIRONMENT:");
    println!("    RUST_LOG    Set logging level (error, warn, info, debug, trace)");
    println!();
    println!("EXIT CODES:");
    println!("    0    All blocks applied");
    println!("    1    Run failed");
    println!("    2    Usage or credential error");
    println!("    130  Interrupted");
}

fn usage_error(msg: &str) -> ! {
    eprintln!("error: {}", msg);
    eprintln!();
    print_help();
    process::exit(2);
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let cli = CliArgs::parse(&args).unwrap_or_else(|e| usage_error(&e));

    // Initialize logging based on debug flag; RUST_LOG wins if set
    let log_level = if cli.debug { "debug" } else { "warn" };
    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from(env_filter))
        .with_target(false)
        .compact()
        .init();
    debug!("gaiactl v{} starting", env!("CARGO_PKG_VERSION"));

    let defaults = match &cli.config_path {
        Some(path) => ConfigLoader::load_from(path),
        None => ConfigLoader::load(),
    };

    let host = match cli.host.clone() {
        Some(host) => host,
        None => usage_error("--host is required"),
    };
    let template_path = match cli.template.clone() {
        Some(path) => path,
        None => usage_error("--template is required"),
    };

    let mut profile = ConnectionProfile::new(host);
    if let Some(user) = cli.user.clone().or(defaults.user) {
        profile.user = user;
    }
    if let Some(port) = cli.port.or(defaults.port) {
        profile.port = port;
    }
    profile.password = cli.password.clone();
    profile.keyfile = cli.keyfile.clone();

    if !cli.dry_run && !profile.has_credentials() {
        usage_error("no credentials: supply --password or --keyfile");
    }

    let mut tolerated = ToleratedErrors::default();
    if let Some(extra) = defaults.tolerated {
        tolerated.extend(extra);
    }
    tolerated.extend(cli.tolerated.clone());

    let config = RunConfig {
        device_mode: cli.gaia_mode.or(defaults.gaia_mode).unwrap_or_default(),
        timeouts: defaults.timeouts.unwrap_or_default(),
        tolerated,
        expert_password: cli.expert_password.clone(),
        dry_run: cli.dry_run,
    };

    let mut sink = match build_log_path(
        cli.log_dir.as_deref(),
        cli.log_path.as_deref(),
        &template_path,
    ) {
        Some(path) => match LogSink::to_file(&path) {
            Ok(sink) => {
                println!("Logging to {}", path.display());
                sink
            }
            Err(e) => usage_error(&format!("cannot open log file: {}", e)),
        },
        None => LogSink::console_only(),
    };

    let outcome = tokio::select! {
        outcome = runner::run(&profile, config, &template_path, &mut sink) => outcome,
        _ = tokio::signal::ctrl_c() => {
            eprintln!();
            eprintln!("Interrupted");
            process::exit(130);
        }
    };

    if !outcome.success {
        process::exit(1);
    }
}

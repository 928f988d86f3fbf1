mod commands;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_CONFIG_ERROR, EXIT_FAILURE, EXIT_LAUNCH_ERROR};
use std::path::PathBuf;
use std::process::ExitCode;
use synastria_core::{Launcher, TuningFlags};

#[derive(Debug, Parser)]
#[command(
    name = "synastria",
    version,
    about = "Launcher for the Synastria WoW client (native on Windows, Proton-GE on Linux)"
)]
struct Cli {
    /// Path to the launcher settings file (defaults to launcher.json in the config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Compatibility layer tuning; each flag overrides the settings file.
#[derive(Debug, Clone, Default, Args)]
struct TuningArgs {
    /// Use the OpenGL-based D3D implementation instead of DXVK.
    #[arg(long, default_value_t = false)]
    wined3d: bool,
    /// Disable eventfd-based synchronization.
    #[arg(long, default_value_t = false)]
    no_esync: bool,
    /// Disable futex-based synchronization.
    #[arg(long, default_value_t = false)]
    no_fsync: bool,
    /// CPU topology exposed to the client, e.g. "4:2".
    #[arg(long)]
    cpu_topology: Option<String>,
    /// DXVK HUD configuration, e.g. "fps".
    #[arg(long)]
    dxvk_hud: Option<String>,
    /// WINEDEBUG channels, e.g. "-all".
    #[arg(long)]
    wine_debug: Option<String>,
}

impl From<TuningArgs> for TuningFlags {
    fn from(args: TuningArgs) -> Self {
        Self {
            use_wined3d: args.wined3d,
            no_esync: args.no_esync,
            no_fsync: args.no_fsync,
            cpu_topology: args.cpu_topology,
            dxvk_hud: args.dxvk_hud,
            wine_debug: args.wine_debug,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Launch the client found in a client directory.
    Launch {
        /// Directory containing wow.exe or wowext.exe.
        client_dir: PathBuf,
        /// Compatibility layer to use (directory name, e.g. GE-Proton9-1).
        #[arg(long)]
        layer: Option<String>,
        /// Use this prefix instead of the one derived from the client directory.
        #[arg(long)]
        prefix: Option<PathBuf>,
        #[command(flatten)]
        tuning: TuningArgs,
    },
    /// Create and initialize the compatibility prefix of a client directory.
    InitPrefix {
        /// Directory containing wow.exe or wowext.exe.
        client_dir: PathBuf,
        /// Compatibility layer to use (directory name).
        #[arg(long)]
        layer: Option<String>,
        /// Seconds to wait for initialization before cutting it short.
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// List installed compatibility layers.
    Layers,
    /// List the client executables found in a directory.
    Executables {
        /// Directory to scan.
        client_dir: PathBuf,
    },
    /// Check whether a directory contains a launchable client.
    Validate {
        /// Directory to check.
        client_dir: PathBuf,
    },
    /// Print the prefix path derived for a client directory.
    Prefix {
        /// Client directory.
        client_dir: PathBuf,
    },
    /// Show platform, configuration directory, layers and Steam paths.
    Info,
    /// Show the launcher settings.
    Settings {
        /// Write the current (or default) settings to the settings file.
        #[arg(long, default_value_t = false)]
        init: bool,
    },
    /// Run diagnostic checks on the host and, optionally, a client directory.
    Doctor {
        /// Client directory to include in the checks.
        client_dir: Option<PathBuf>,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("SYNASTRIA_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let launcher = Launcher::from_host();
    let settings_path = cli
        .config
        .unwrap_or_else(|| launcher.dirs().settings_file(launcher.platform()));
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Launch {
            client_dir,
            layer,
            prefix,
            tuning,
        } => commands::launch::run(
            &launcher,
            &settings_path,
            &client_dir,
            layer.as_deref(),
            prefix.as_deref(),
            &tuning.into(),
            json_output,
        ),
        Commands::InitPrefix {
            client_dir,
            layer,
            timeout,
        } => commands::init_prefix::run(
            launcher,
            &settings_path,
            &client_dir,
            layer.as_deref(),
            timeout,
            json_output,
        ),
        Commands::Layers => commands::layers::run(&launcher, json_output),
        Commands::Executables { client_dir } => {
            commands::executables::run(&launcher, &client_dir, json_output)
        }
        Commands::Validate { client_dir } => {
            commands::validate::run(&launcher, &client_dir, json_output)
        }
        Commands::Prefix { client_dir } => {
            commands::prefix::run(&launcher, &client_dir, json_output)
        }
        Commands::Info => commands::info::run(&launcher, json_output),
        Commands::Settings { init } => commands::settings::run(&settings_path, init, json_output),
        Commands::Doctor { client_dir } => commands::doctor::run(
            &launcher,
            &settings_path,
            client_dir.as_deref(),
            json_output,
        ),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("config error:") {
                EXIT_CONFIG_ERROR
            } else if msg.starts_with("launch failed:")
                || msg.starts_with("prefix initialization failed:")
            {
                EXIT_LAUNCH_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

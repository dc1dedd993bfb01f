mod commands;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use commands::exec::RunAs;
use commands::{Toggle, EXIT_CONFIG_ERROR, EXIT_FAILURE, EXIT_STATE_ERROR};
use isctl_core::Controller;
use isctl_runtime::{select_backend, Toolchain};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "isctl",
    version,
    about = "Control local Caché, Ensemble and IRIS instances"
)]
struct Cli {
    /// Toolchain config file (default: ~/.config/isctl/toolchain.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tool backend: `system` runs the real tools, `mock` is a dry run.
    #[arg(long, default_value = "system", global = true)]
    backend: String,

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

#[derive(Debug, Args)]
#[group(multiple = false)]
struct ExecIdentity {
    /// Run as this user (requires root unless it is the current user).
    #[arg(long)]
    as_user: Option<String>,
    /// Run as the instance owner.
    #[arg(long, default_value_t = false)]
    as_owner: bool,
    /// Run as the instance manager.
    #[arg(long, default_value_t = false)]
    as_manager: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List installed instances.
    List,
    /// Show everything qlist reports about an instance.
    Inspect {
        /// Instance name.
        name: String,
    },
    /// Start an instance, then check that it reports ready.
    Start {
        /// Instance name.
        name: String,
    },
    /// Stop an instance, bypassing sign-on inhibition when needed.
    Stop {
        /// Instance name.
        name: String,
    },
    /// Wait until an instance is ready (Ctrl-C cancels).
    Wait {
        /// Instance name.
        name: String,
        /// Give up after this many seconds.
        #[arg(long, default_value_t = 60)]
        timeout: u64,
    },
    /// Execute INT code with a MAIN label inside an instance.
    Exec {
        /// Instance name.
        name: String,
        /// Script file, or `-` for stdin.
        #[arg(default_value = "-")]
        file: PathBuf,
        /// Namespace to run in.
        #[arg(short, long, default_value = "USER")]
        namespace: String,
        #[command(flatten)]
        identity: ExecIdentity,
    },
    /// Show the owner and manager of an instance.
    Identity {
        /// Instance name.
        name: String,
    },
    /// Show installation parameters from parameters.isc.
    Params {
        /// Instance name.
        name: String,
        /// Only show this `group.name` key.
        key: Option<String>,
    },
    /// Inspect the database files listed in the instance's CPF.
    Databases {
        /// Instance name.
        name: String,
    },
    /// Show the configured journal directory.
    Journal {
        /// Instance name.
        name: String,
        /// Show the alternate directory instead of the current one.
        #[arg(long, default_value_t = false)]
        alternate: bool,
    },
    /// Turn the ZSTU startup routine on or off in a CPF file.
    Zstu {
        /// Path to the CPF file.
        cpf: PathBuf,
        /// New setting.
        setting: Toggle,
    },
    /// Report which administration tools are installed.
    Commands,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
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
            tracing_subscriber::EnvFilter::try_from_env("ISCTL_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let json = cli.json;
    let controller = || make_controller(cli.config.as_deref(), &cli.backend);

    let result = match cli.command {
        Commands::List => controller().and_then(|c| commands::list::run(&c, json)),
        Commands::Inspect { name } => {
            controller().and_then(|c| commands::inspect::run(&c, &name, json))
        }
        Commands::Start { name } => controller().and_then(|c| commands::start::run(&c, &name, json)),
        Commands::Stop { name } => controller().and_then(|c| commands::stop::run(&c, &name, json)),
        Commands::Wait { name, timeout } => {
            controller().and_then(|c| commands::wait::run(&c, &name, timeout, json))
        }
        Commands::Exec {
            name,
            file,
            namespace,
            identity,
        } => {
            let run_as = if identity.as_owner {
                RunAs::Owner
            } else if identity.as_manager {
                RunAs::Manager
            } else if let Some(user) = identity.as_user {
                RunAs::User(user)
            } else {
                RunAs::Current
            };
            controller().and_then(|c| commands::exec::run(&c, &name, &namespace, &file, &run_as))
        }
        Commands::Identity { name } => {
            controller().and_then(|c| commands::identity::run(&c, &name, json))
        }
        Commands::Params { name, key } => {
            controller().and_then(|c| commands::params::run(&c, &name, key.as_deref(), json))
        }
        Commands::Databases { name } => {
            controller().and_then(|c| commands::databases::run(&c, &name, json))
        }
        Commands::Journal { name, alternate } => {
            controller().and_then(|c| commands::journal::run(&c, &name, alternate, json))
        }
        Commands::Zstu { cpf, setting } => commands::zstu::run(&cpf, setting, json),
        Commands::Commands => controller().and_then(|c| commands::available::run(&c, json)),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    finish(result)
}

fn make_controller(config: Option<&Path>, backend: &str) -> Result<Controller, String> {
    let toolchain = match config {
        Some(path) => Toolchain::load(path),
        None => Toolchain::load_default(),
    }
    .map_err(|e| format!("config error: {e}"))?;
    tracing::debug!(backend, ?toolchain, "building controller");
    let backend = select_backend(backend, &toolchain).map_err(|e| format!("config error: {e}"))?;
    Ok(Controller::new(backend, toolchain))
}

fn finish(result: Result<u8, String>) -> ExitCode {
    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("config error:")
                || msg.starts_with("config file error:")
                || msg.starts_with("malformed qlist record")
            {
                EXIT_CONFIG_ERROR
            } else if msg.starts_with("failed to start instance")
                || msg.starts_with("failed to stop instance")
                || msg.starts_with("instance not found")
                || msg.starts_with("wait for instance")
                || (msg.starts_with("instance ") && msg.contains("not ready after"))
            {
                EXIT_STATE_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand, ValueEnum};
use hello_teal::{contract, delta, emit, global_schema, Artifacts, EmitConfig, Invocation, TEAL_VERSION};
use serde_json::json;

#[derive(Parser)]
#[command(name = "hello-teal")]
#[command(about = "build, compile and dry-run the hello-world teal contract")]
struct Cli {
    /// with no command, emit approval.teal and clear.teal into the current directory
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// compile both programs and write them to disk
    Emit {
        /// output directory
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
        /// teal version
        #[arg(short, long, default_value_t = TEAL_VERSION)]
        version: u64,
    },
    /// print a compiled program
    Show {
        program: Program,
        /// teal version
        #[arg(short, long, default_value_t = TEAL_VERSION)]
        version: u64,
    },
    /// evaluate the approval program for one call and print the global delta
    Dryrun {
        /// application id (0 = creation call)
        #[arg(short, long)]
        app_id: u64,
        /// caller address
        #[arg(short, long)]
        sender: String,
        /// latest timestamp in seconds, defaults to now
        #[arg(short, long)]
        timestamp: Option<u64>,
    },
    /// print the global state schema needed at creation
    Schema,
}

#[derive(Clone, Copy, ValueEnum)]
enum Program {
    Approval,
    Clear,
}

fn init_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    let _ = subscriber.try_init();
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn run(command: Commands) -> hello_teal::Result<()> {
    match command {
        Commands::Emit { out_dir, version } => {
            let config = EmitConfig::default().out_dir(out_dir).version(version);
            let report = emit(&config)?;
            println!("{}", report.approval.display());
            println!("{}", report.clear.display());
        }
        Commands::Show { program, version } => {
            let artifacts = Artifacts::compile(version)?;
            match program {
                Program::Approval => println!("{}", artifacts.approval),
                Program::Clear => println!("{}", artifacts.clear),
            }
        }
        Commands::Dryrun {
            app_id,
            sender,
            timestamp,
        } => {
            let invocation = Invocation::new(app_id, sender, timestamp.unwrap_or_else(now));
            let outcome = contract::evaluate_approval(&invocation)?;
            let global_delta = delta::to_delta(&outcome.global_state);
            let readable = delta::readable(&global_delta)?;

            let result = json!({
                "decision": outcome.decision,
                "global-delta": global_delta,
                "global-state": readable,
            });
            println!("{}", serde_json::to_string_pretty(&result).unwrap_or(result.to_string()));
        }
        Commands::Schema => {
            let schema = global_schema(&contract::approval());
            println!("{}", json!(schema));
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_subscriber("info");

    let command = cli.command.unwrap_or(Commands::Emit {
        out_dir: PathBuf::from("."),
        version: TEAL_VERSION,
    });

    match run(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

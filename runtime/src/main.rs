//! roam-export — export Roam Research graphs through the web app.

use clap::{Parser, Subcommand};
use roam_export::cli::{doctor, export_cmd, output};
use roam_export::ExportFormat;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roam-export", version, about = "Export Roam Research graphs through the web app")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Only print errors
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Log every step of the workflow
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Print machine-readable JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Log in, open a graph and export it in one or more formats
    Export {
        /// Account email
        #[arg(long, env = "ROAM_EMAIL")]
        email: String,

        /// Account password
        #[arg(long, env = "ROAM_PASSWORD", hide_env_values = true)]
        password: String,

        /// Name of the graph to export
        #[arg(long, short)]
        graph: String,

        /// Export format as labelled in the dialog (repeatable)
        #[arg(long = "format", short = 'f', default_value = "JSON")]
        formats: Vec<ExportFormat>,

        /// Unzip each archive into <out>/<format>/
        #[arg(long, short = 'x')]
        extract: bool,

        /// Output folder (default: current directory)
        #[arg(long, short)]
        out: Option<PathBuf>,

        /// Give up on a download after this many seconds
        #[arg(long)]
        download_timeout: Option<u64>,
    },

    /// Check that a browser is available and the output folder is usable
    Doctor {
        /// Output folder to check (default: current directory)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}

fn init_tracing(cli: &Cli) {
    let level = if cli.verbose {
        "roam_export=debug"
    } else if cli.quiet {
        "roam_export=error"
    } else {
        "roam_export=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Global flags are read back through the environment by cli::output.
    if cli.quiet {
        std::env::set_var("ROAM_EXPORT_QUIET", "1");
    }
    if cli.verbose {
        std::env::set_var("ROAM_EXPORT_VERBOSE", "1");
    }
    if cli.json {
        std::env::set_var("ROAM_EXPORT_JSON", "1");
    }
    if cli.no_color {
        std::env::set_var("ROAM_EXPORT_NO_COLOR", "1");
    }

    init_tracing(&cli);

    let result = match cli.command {
        Command::Export {
            email,
            password,
            graph,
            formats,
            extract,
            out,
            download_timeout,
        } => {
            export_cmd::run(export_cmd::ExportArgs {
                email,
                password,
                graph,
                formats,
                extract,
                out_dir: out,
                download_timeout_secs: download_timeout,
            })
            .await
        }
        Command::Doctor { out } => doctor::run(out.as_deref()).await,
    };

    if let Err(e) = result {
        if !output::is_json() {
            let s = output::Styled::new();
            eprintln!("  {} {e:#}", s.fail_sym());
        }
        std::process::exit(1);
    }
}

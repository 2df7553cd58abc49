//! `toolex` — a pass-through toolexec interceptor binary.
//!
//! Wires [`toolex_core`] to the no-op [`Unchanged`] modifier, which makes it
//! a drop-in `-toolexec` target for validating the interception machinery
//! (classification, identity forging, file splicing, manifest patching)
//! without changing any code:
//!
//! ```text
//! go build -a -toolexec="/path/to/toolex" ./...
//! ```
//!
//! Callers with a real modifier depend on `toolex_core` directly and build
//! their own binary; this one exists for wiring checks and as a template.

#![warn(missing_docs)]

use std::process;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use toolex_core::{run, Invocation, Options, Unchanged};

/// Transparent interception shim for the Go toolchain.
#[derive(Parser, Debug)]
#[command(name = "toolex", version, about = "Toolexec interception shim")]
struct Cli {
    /// Enable verbose (debug-level) output on stderr.
    #[arg(short, long)]
    verbose: bool,

    /// Skip imports that cannot be resolved instead of aborting.
    #[arg(long)]
    skip_unresolved: bool,

    /// The intercepted command: `[working-dir] <tool> [tool-args...]`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    command: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Rebuild the logical argument vector the core expects: our own name,
    // then the intercepted command verbatim.
    let mut argv = vec!["toolex".to_string()];
    argv.extend(cli.command);

    let options = Options {
        skip_unresolved: cli.skip_unresolved,
    };

    let code = Invocation::parse(argv)
        .and_then(|invocation| run(&invocation, &Unchanged, &options))
        .unwrap_or_else(|err| {
            error!(%err, "invocation aborted");
            eprintln!("toolex: {err}");
            1
        });
    process::exit(code);
}

/// Sets up tracing output on stderr.
///
/// Stdout is part of the interception protocol (it carries the forged
/// version line and the child compiler's output), so diagnostics must never
/// land there.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

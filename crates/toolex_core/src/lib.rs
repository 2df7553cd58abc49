//! Transparent interception of a Go toolchain's per-file compile step.
//!
//! `toolex_core` sits between the build orchestrator (`go build
//! -toolexec=...`) and the real compiler binary. It classifies each
//! invocation, forges the cache-identity token on version probes so the
//! orchestrator's build cache keys on the interceptor's own content, rewrites
//! the source files slated for compilation through a caller-supplied
//! [`Modifier`], patches the dependency manifest (`importcfg`) with any
//! imports the modification introduced, and re-dispatches the real tool with
//! the rewritten file paths spliced into the original argument vector.
//!
//! The entry point is [`run`]; a binary that wants the default wiring can
//! construct an [`Invocation`] from its argument vector and pass any
//! [`Modifier`] implementation:
//!
//! ```no_run
//! use toolex_core::{run, Invocation, Options, Unchanged};
//!
//! let argv: Vec<String> = std::env::args().collect();
//! let invocation = Invocation::parse(argv).unwrap();
//! let code = match run(&invocation, &Unchanged, &Options::default()) {
//!     Ok(code) => code,
//!     Err(err) => {
//!         eprintln!("toolex: {err}");
//!         1
//!     }
//! };
//! std::process::exit(code);
//! ```

#![warn(missing_docs)]

mod dispatch;
mod error;
mod extract;
mod identity;
mod importcfg;
mod invocation;
mod modify;
mod process;
mod queries;
mod rewrite;

pub use error::InterceptError;
pub use invocation::{classify, Invocation, ToolStage};
pub use modify::{Modifier, Unchanged};
pub use process::{run, Options};
pub use rewrite::{rewrite_batch, rewrite_file, RewrittenFile};

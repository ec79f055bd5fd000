//! Shared plumbing for the `parser` and `lex` binaries: logging setup,
//! grammar loading, and diagnostic rendering. Kept here rather than
//! duplicated in each `src/bin/*.rs`, the way `faxt` shares its `config`/
//! `error` modules across subcommands.

use std::io::IsTerminal;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialise `tracing`, filtered by `RUST_LOG` (default `info`), raised
/// to `debug` when `-v`/`--verbose` is passed.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let subscriber = fmt::layer().with_target(false).with_thread_ids(false).with_thread_names(false);
    let _ = tracing_subscriber::registry().with(filter).with(subscriber).try_init();
}

/// Load the grammar text: the file at `path` if given, otherwise the
/// grammar bundled into the binary at compile time.
pub fn load_grammar(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read grammar file '{}'", path.display())),
        None => Ok(oreoc_syn::DEFAULT_GRAMMAR.to_string()),
    }
}

/// Read the source file named on the command line.
pub fn load_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read source file '{}'", path.display()))
}

/// Render a compiler diagnostic the way `spec.md` §4.7 and §6 require:
/// written to standard output, coloured only when stdout is a terminal.
pub fn render_diagnostic(diagnostic: &oreoc_util::Diagnostic) -> String {
    diagnostic.render(std::io::stdout().is_terminal())
}

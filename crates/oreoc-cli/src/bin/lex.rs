//! `lex <source>` — lexes a literal source string, printing one token per
//! line. Mirrors the original's standalone `lexer.py` entry point, per
//! `spec.md` §6.

use clap::Parser;

/// Lex a literal oreo source string, printing one token per line.
#[derive(Parser, Debug)]
#[command(name = "lex")]
#[command(about = "Lex an oreo source string and print its tokens", long_about = None)]
struct Cli {
    /// Source text to lex
    source: String,

    /// Enable verbose (debug-level) logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    oreoc_cli::init_logging(cli.verbose);

    match run(&cli.source) {
        Ok(output) => println!("{output}"),
        Err(diagnostic) => {
            println!("{}", oreoc_cli::render_diagnostic(&diagnostic));
            std::process::exit(1);
        }
    }
}

/// One line per token: `NAME(attribute)` for tokens that carry one
/// (identifiers, numbers, strings), bare `NAME` for keywords and
/// punctuation, matching the notation `spec.md` §8's scenarios use.
fn render_token(token: &oreoc_lex::Token) -> String {
    match &token.attribute {
        Some(attribute) => format!("{}({attribute})", token.name),
        None => token.name.clone(),
    }
}

fn run(source: &str) -> oreoc_util::CompileResult<String> {
    let tokens = oreoc_lex::lex(source)?;
    let lines: Vec<String> = tokens.iter().map(render_token).collect();
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_an_assignment() {
        let output = run("x := 10").unwrap();
        assert_eq!(output, "ID(x)\n:=\nNUMBER(10)");
    }

    #[test]
    fn an_unrecognised_character_surfaces_as_a_lex_diagnostic() {
        let err = run("x := 10 @").unwrap_err();
        assert_eq!(err.kind, oreoc_util::Kind::Lex);
    }
}

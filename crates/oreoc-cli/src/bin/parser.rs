//! `parser <file> [--grammar <path>]` — lexes and parses a source file,
//! printing the resulting tree. Mirrors the original's standalone
//! `parser.py` entry point, per `spec.md` §6.

use std::path::PathBuf;

use clap::Parser;

/// Lex and parse an oreo source file, printing the parse tree.
#[derive(Parser, Debug)]
#[command(name = "parser")]
#[command(about = "Parse an oreo source file and print its tree", long_about = None)]
struct Cli {
    /// Source file to parse
    file: PathBuf,

    /// Grammar file to use (defaults to the bundled grammar)
    #[arg(long)]
    grammar: Option<PathBuf>,

    /// Annotate each node with its resolved scope
    #[arg(long)]
    print_scope: bool,

    /// Annotate each node with its resolved type
    #[arg(long)]
    print_type: bool,

    /// Enable verbose (debug-level) logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    oreoc_cli::init_logging(cli.verbose);

    let source = match oreoc_cli::load_source(&cli.file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    };
    let grammar_text = match oreoc_cli::load_grammar(cli.grammar.as_deref()) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    };

    match run(&source, &grammar_text, cli.print_scope, cli.print_type) {
        Ok(output) => println!("{output}"),
        Err(diagnostic) => {
            println!("{}", oreoc_cli::render_diagnostic(&diagnostic));
            std::process::exit(1);
        }
    }
}

fn run(
    source: &str,
    grammar_text: &str,
    print_scope: bool,
    print_type: bool,
) -> oreoc_util::CompileResult<String> {
    let tokens = oreoc_lex::lex(source)?;
    let table = oreoc_syn::RuleTable::load(grammar_text)?;
    let (tree, root) = oreoc_syn::parse(&tokens, &table)?;

    if !print_scope && !print_type {
        return Ok(tree.pretty_print(root, false, false, &|_| None, &|_| None));
    }

    let analysis = oreoc_sem::analyze(&tree, root)?;
    let scope_of = |id: oreoc_syn::NodeId| -> Option<String> {
        analysis.refs.get(&id).map(|owner| owner.clone().unwrap_or_else(|| "global".to_string()))
    };
    let type_of = |id: oreoc_syn::NodeId| -> Option<String> { analysis.types.get(&id).map(|ty| ty.to_string()) };
    Ok(tree.pretty_print(root, print_scope, print_type, &scope_of, &type_of))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_print_omits_annotations() {
        let grammar = oreoc_syn::DEFAULT_GRAMMAR;
        let output = run("program p begin var x := 1; end", grammar, false, false).unwrap();
        assert!(!output.contains("[scope:"));
        assert!(!output.contains("[type:"));
    }

    #[test]
    fn print_scope_and_type_annotate_nodes() {
        let grammar = oreoc_syn::DEFAULT_GRAMMAR;
        let output = run("program p begin var x := 1; end", grammar, true, true).unwrap();
        assert!(output.contains("[scope: global]"));
        assert!(output.contains("[type: num]"));
    }

    #[test]
    fn a_parse_error_surfaces_as_a_diagnostic() {
        let grammar = oreoc_syn::DEFAULT_GRAMMAR;
        let err = run("program p begin var := 1; end", grammar, false, false).unwrap_err();
        assert_eq!(err.kind, oreoc_util::Kind::Parse);
    }
}

use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use log::{debug, LevelFilter};

use portugol::evaluator::Evaluator;
use portugol::lexer::Lexer;
use portugol::parser::parse;
use portugol::transformer::transform;
use portugol::Error;

#[derive(Parser, Debug)]
#[clap(name = "portugol", version, about = "Interpretador de Portugol")]
struct Cli {
    /// Arquivo-fonte a executar
    #[clap(value_parser)]
    file: PathBuf,

    /// Mostra os tokens antes de executar
    #[clap(long)]
    tokens: bool,

    /// Mostra a árvore sintática concreta antes de executar
    #[clap(long)]
    tree: bool,

    /// Mostra a AST antes de executar
    #[clap(long)]
    ast: bool,

    /// Limite de chamadas aninhadas
    #[clap(long, default_value_t = portugol::evaluator::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Aumenta o detalhamento dos logs (-v debug, -vv trace)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u64,
}

fn init_logger(verbose: u64) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));

    match verbose {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }

    builder.init();
}

fn execute(cli: &Cli, source: &str) -> Result<(), Error> {
    let tokens = Lexer::new(source).lex()?;
    if cli.tokens {
        eprintln!("Tokens: {:#?}", tokens);
    }

    let tree = parse(&tokens)?;
    if cli.tree {
        eprintln!("Parse tree: {:#?}", tree);
    }

    let program = transform(&tree)?;
    if cli.ast {
        eprintln!("AST: {:#?}", program);
    }

    debug!("running {}", cli.file.display());
    Evaluator::new().with_max_depth(cli.max_depth).eval(&program)
}

fn run(cli: Cli) -> ExitCode {
    let source = match fs::read_to_string(&cli.file) {
        Ok(source) => source,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            eprintln!(
                "{} Arquivo '{}' não encontrado.",
                "Erro:".red().bold(),
                cli.file.display()
            );
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("{} {}", "Erro:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    match execute(&cli, &source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Erro:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    run(cli)
}

use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::error::{Reporter, StderrReporter, Tally};
use rox::interpreter::Interpreter;
use rox::lox::{read_source, Lox, Status};
use rox::parser::Parser;
use rox::scanner::{scan_tokens, Scanner};
use rox::token::Token;

/// Exit code for malformed input (static errors).
const EX_DATAERR: i32 = 65;
/// Exit code for runtime errors.
const EX_SOFTWARE: i32 = 70;
/// Exit code when the script cannot be read.
const EX_IOERR: i32 = 74;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Write a debug log to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every token of a script, one per line
    Tokenize {
        filename: PathBuf,

        /// Print tokens as JSON lines instead of `TYPE lexeme literal`
        #[arg(long)]
        json: bool,
    },

    /// Parse a file holding one expression and print its syntax tree
    Parse { filename: PathBuf },

    /// Evaluate a file holding one expression and print the value
    Evaluate { filename: PathBuf },

    /// Execute a script
    Run { filename: PathBuf },

    /// Starts an interactive prompt; globals persist between lines
    Repl,
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env() // RUST_LOG overrides the default
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn load(filename: &PathBuf) -> String {
    match read_source(filename).with_context(|| format!("Failed to read {:?}", filename)) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{:#}", e);
            process::exit(EX_IOERR);
        }
    }
}

/// Scan and parse `source` as one expression, exiting on static errors.
fn parse_single(source: &str) -> rox::expr::Expr {
    let mut reporter = StderrReporter;
    let mut tally = Tally::new(&mut reporter);

    let tokens: Vec<Token> = scan_tokens(source, &mut tally);
    let mut parser = Parser::new(&tokens);
    let parsed = parser.parse_expression();
    let lex_errors: usize = tally.static_errors;

    match parsed {
        Ok(expr) if lex_errors == 0 => expr,
        Ok(_) => process::exit(EX_DATAERR),
        Err(e) => {
            debug!("Parse debug: {}", e);
            tally.report(&e);
            process::exit(EX_DATAERR);
        }
    }
}

fn tokenize(source: &str, json: bool) -> Result<()> {
    let mut tokenized = true;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for token in Scanner::new(source) {
        match token {
            Ok(token) if json => {
                serde_json::to_writer(&mut out, &token).context("Failed to encode token")?;
                writeln!(out)?;
            }
            Ok(token) => writeln!(out, "{}", token)?,
            Err(e) => {
                tokenized = false;
                StderrReporter.report(&e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EX_DATAERR);
        process::exit(EX_DATAERR);
    }

    Ok(())
}

fn repl() -> Result<()> {
    let mut lox = Lox::new();
    let mut reporter = StderrReporter;
    let stdin = io::stdin();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }

        let status: Status = lox.run(&line, &mut reporter);
        debug!("REPL line finished with {:?}", status);
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("Parsed arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => {
            info!("tokenize command");
            let source = load(&filename);
            tokenize(&source, json)?;
        }

        Commands::Parse { filename } => {
            info!("parse command");
            let source = load(&filename);
            let expr = parse_single(&source);

            println!("{}", AstPrinter.print(&expr));
        }

        Commands::Evaluate { filename } => {
            info!("evaluate command");
            let source = load(&filename);
            let expr = parse_single(&source);
            let mut interpreter = Interpreter::new();

            match interpreter.evaluate(&expr) {
                Ok(value) => println!("{}", value),
                Err(e) => {
                    StderrReporter.report(&e);
                    process::exit(EX_SOFTWARE);
                }
            }
        }

        Commands::Run { filename } => {
            info!("run command");
            let source = load(&filename);
            let mut lox = Lox::new();

            match lox.run(&source, &mut StderrReporter) {
                Status::Ok => info!("Program executed successfully"),
                Status::StaticError => process::exit(EX_DATAERR),
                Status::RuntimeError => process::exit(EX_SOFTWARE),
            }
        }

        Commands::Repl => {
            info!("repl command");
            repl()?;
        }
    }

    Ok(())
}

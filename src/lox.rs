//! One interpreter session: scan → parse → resolve → interpret.
//!
//! A `Lox` value owns exactly one [`Interpreter`], so globals defined by one
//! `run` call are visible to the next (the REPL relies on this) while two
//! sessions never see each other's state.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use log::{debug, info};

use crate::error::{Reporter, Tally};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;
use crate::stmt::Stmt;
use crate::token::Token;

/// Outcome of running one source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    /// Lexing, parsing or resolution failed; nothing was executed.
    StaticError,
    /// Execution started and was aborted by a runtime error.
    RuntimeError,
}

pub struct Lox<W: Write = io::Stdout> {
    interpreter: Interpreter<W>,
    /// First node id for the next parse, so ids stay unique per session.
    next_id: usize,
}

impl Lox<io::Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Lox<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Lox<W> {
    pub fn with_output(out: W) -> Self {
        Self {
            interpreter: Interpreter::with_output(out),
            next_id: 0,
        }
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter<W> {
        &mut self.interpreter
    }

    /// Run one buffer of source text, reporting every diagnostic.
    pub fn run(&mut self, source: &str, reporter: &mut dyn Reporter) -> Status {
        info!("Running {} bytes of source", source.len());

        let mut tally: Tally<'_> = Tally::new(reporter);

        let tokens: Vec<Token> = scan_tokens(source, &mut tally);

        let mut parser: Parser<'_> = Parser::with_first_id(&tokens, self.next_id);
        let statements: Vec<Stmt> = parser.parse(&mut tally);
        self.next_id = parser.next_id();

        if tally.static_errors > 0 {
            debug!("Skipping resolution: {} static error(s)", tally.static_errors);
            return Status::StaticError;
        }

        let resolve_errors: usize = Resolver::new(&mut self.interpreter).resolve(&statements, &mut tally);

        if resolve_errors > 0 {
            debug!("Skipping execution: {} resolve error(s)", resolve_errors);
            return Status::StaticError;
        }

        match self.interpreter.interpret(&statements) {
            Ok(()) => Status::Ok,
            Err(e) => {
                tally.report(&e);
                Status::RuntimeError
            }
        }
    }
}

/// Read a script from disk as UTF‑8 text.
pub fn read_source(path: &Path) -> crate::error::Result<String> {
    info!("Reading file: {:?}", path);

    let bytes: Vec<u8> = fs::read(path)?;

    info!("Read {} bytes from {:?}", bytes.len(), path);

    Ok(String::from_utf8(bytes)?)
}

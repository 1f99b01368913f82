#![allow(dead_code)]

use rox::error::Diagnostics;
use rox::lox::{Lox, Status};

/// Everything observable from running one program.
pub struct Outcome {
    pub status: Status,
    pub output: String,
    pub diagnostics: Diagnostics,
}

impl Outcome {
    pub fn lines(&self) -> Vec<&str> {
        self.output.lines().collect()
    }
}

/// Run `source` in a fresh session with captured output.
pub fn run(source: &str) -> Outcome {
    let mut lox = Lox::with_output(Vec::new());
    run_in(&mut lox, source)
}

/// Run `source` in an existing session, returning only what this call printed.
pub fn run_in(lox: &mut Lox<Vec<u8>>, source: &str) -> Outcome {
    let mut diagnostics = Diagnostics::new();
    let status = lox.run(source, &mut diagnostics);

    let buffer: &mut Vec<u8> = lox.interpreter_mut().output_mut();
    let output = String::from_utf8(std::mem::take(buffer)).expect("output is UTF-8");

    Outcome {
        status,
        output,
        diagnostics,
    }
}

/// Run a program that must succeed and return its printed lines.
pub fn output_of(source: &str) -> Vec<String> {
    let outcome = run(source);

    assert_eq!(
        outcome.status,
        Status::Ok,
        "program failed: {:?}",
        outcome.diagnostics
    );

    outcome.output.lines().map(str::to_string).collect()
}

/// Run `test` on a thread with a generous stack.  Debug builds use far
/// more stack per Lox call than release builds do.
pub fn on_large_stack<F>(test: F)
where
    F: FnOnce() + Send + 'static,
{
    std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(test)
        .expect("spawn test thread")
        .join()
        .expect("test thread panicked");
}

// ABOUTME: The script-running CLI front end — parses a file or stdin, evaluates each top-level form

use clap::Parser;
use lisp_core::bootstrap_environment;
use lisp_core::error::EvalError;
use lisp_core::eval;
use lisp_core::parser::parse_program;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

/// A Scheme-family interpreter: evaluates a source file, or stdin if none is given.
#[derive(Parser, Debug)]
#[command(version, about = "A Scheme-flavored Lisp interpreter")]
struct CliArgs {
    /// Source file to run. Reads from stdin when omitted.
    #[arg(value_name = "FILE")]
    source: Option<PathBuf>,

    /// Raise log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{} {}] {}", record.target(), record.level(), message))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .expect("logger is only ever initialized once");
}

fn read_source(path: &Option<PathBuf>) -> std::io::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Parses `source` once, then evaluates its top-level forms in order, stopping
/// at the first error rather than continuing past a broken form.
fn run(source: &str) -> Result<(), EvalError> {
    let env = bootstrap_environment()?;
    for form in parse_program(source)? {
        log::debug!("evaluating {}", form);
        let result = eval::eval(form, env.clone())?;
        log::trace!("=> {}", result);
    }
    Ok(())
}

fn error_kind(e: &EvalError) -> &'static str {
    match e {
        EvalError::LexError { .. } => "lex",
        EvalError::SyntaxError { .. } => "syntax",
        EvalError::UnboundSymbol(_) => "unbound-symbol",
        EvalError::TypeError { .. } => "type",
        EvalError::ArityError { .. } => "arity",
        EvalError::MacroMatchFailure { .. } => "macro",
        EvalError::IOError(_) => "io",
        EvalError::ValueError(_) => "value",
    }
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    let source = match read_source(&args.source) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("io: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", error_kind(&e), e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_a_simple_program_without_error() {
        assert!(run("(define x 10) (+ x 1)").is_ok());
    }

    #[test]
    fn stops_at_the_first_failing_top_level_form() {
        let err = run("(undefined-symbol) (+ 1 1)").unwrap_err();
        assert!(matches!(err, EvalError::UnboundSymbol(_)));
    }

    #[test]
    fn error_kind_names_cover_every_variant() {
        assert_eq!(error_kind(&EvalError::UnboundSymbol("x".to_string())), "unbound-symbol");
        assert_eq!(error_kind(&EvalError::ValueError("oops".to_string())), "value");
    }
}

//! Punto de entrada ("driver").
//!
//! Este módulo orquesta las diferentes fases del proceso de
//! compilación y expone una CLI.

use anyhow::{self, Context};
use clap::{self, crate_version, Arg};
use pinc::{ast::Program, error::Diagnostics, lex::Lexer, parse, source, target};

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    process,
};

fn main() -> anyhow::Result<()> {
    // Parsing de CLI
    let args = clap::App::new("ESP32 DSL compiler")
        .version(crate_version!())
        .arg(
            Arg::new("input")
                .required(true)
                .value_name("INPUT")
                .help("Source program ('-' for stdin)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .default_value("-")
                .value_name("FILE")
                .help("Output C++ file ('-' for stdout)"),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .help("Stop after semantic analysis"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Report progress on stderr"),
        )
        .get_matches();

    // Se extraen argumentos necesarios
    let input = args.value_of("input").unwrap_or("-");
    let output = args.value_of("output").unwrap_or("-");
    let verbose = args.is_present("verbose");

    let program = match input {
        "-" => {
            let stdin = io::stdin();
            let stdin = stdin.lock();
            frontend(stdin, "<stdin>")
        }

        path => {
            let file =
                File::open(path).with_context(|| format!("Failed to open for reading: {}", path))?;

            frontend(BufReader::new(file), path)
        }
    };

    let program = match program {
        Ok(program) => program,
        Err(diagnostics) => {
            eprint!("{}", diagnostics);
            process::exit(1);
        }
    };

    if verbose {
        eprintln!(
            "Semantic analysis finished without errors ({} declarations, {} commands)",
            program.declarations.len(),
            program.commands().count()
        );
    }

    if args.is_present("check") {
        return Ok(());
    }

    match output {
        "-" => {
            let stdout = io::stdout();
            let mut stdout = stdout.lock();
            target::emit(&program, &mut stdout).context("Failed to emit to stdout")?;
        }

        path => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to open for writing: {}", path))?;

            target::emit(&program, &mut file)
                .and_then(|()| file.flush())
                .with_context(|| format!("Failed to emit to file: {}", path))?;

            if verbose {
                eprintln!("C++ code written to {}", path);
            }
        }
    };

    Ok(())
}

/// Ejecuta análisis léxico, sintáctico y semántico.
fn frontend<R: BufRead>(reader: R, name: &str) -> Result<Program, Diagnostics> {
    let (start, stream) = source::consume(reader, name);

    let tokens = Lexer::new(start.clone(), stream)
        .try_exhaustive()
        .map_err(|errors| Diagnostics::from(errors).kind("Lexical error"))?;

    let program = parse::parse(tokens.iter(), start)
        .map_err(|error| Diagnostics::from(error).kind("Syntax error"))?;

    program
        .analyze()
        .map_err(|error| Diagnostics::from(error).kind("Semantic error"))?;

    Ok(program)
}

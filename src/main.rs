use clap::{Arg, Command};
use std::fs;
use std::io::{self, Read};
use std::process;

fn main() {
    let matches = Command::new("tinybasic")
        .about("A tree-walking interpreter for a small BASIC dialect")
        .arg(
            Arg::new("file")
                .help("The program to execute; standard input is read when this is omitted or '-'")
                .value_name("FILE")
                .index(1),
        )
        .get_matches();

    match matches.get_one::<String>("file") {
        Some(path) if path != "-" => run_file(path),
        _ => run_stdin(),
    }
}

fn run_file(path: &str) {
    match fs::read_to_string(path) {
        Ok(source) => tinybasic::runner::run(&source, path),
        Err(error) => {
            eprintln!("Can't open {} for reading: {}", path, error);
            process::exit(1);
        }
    }
}

fn run_stdin() {
    let mut source = String::new();
    if let Err(error) = io::stdin().read_to_string(&mut source) {
        eprintln!("Error reading standard input: {}", error);
        process::exit(1);
    }
    tinybasic::runner::run(&source, "<stdin>");
}

use std::io::{self, BufRead};

use weft_compiler::compile;
use weft_runtime::{dump, execute, ExecOptions, Mode};

const USAGE: &str = "wgrep [--debug] PATTERN";

fn main() -> Result<(), String> {
    let mut debug = false;
    let mut pattern = None;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--debug" | "-d" => debug = true,
            _ if pattern.is_none() => pattern = Some(arg),
            _ => return Err(USAGE.to_string()),
        }
    }

    let pattern = pattern.ok_or_else(|| USAGE.to_string())?;
    let program = compile(&pattern).map_err(|e| e.to_string())?;

    if debug {
        let disassembly = dump(&program).map_err(|e| e.to_string())?;
        println!("DEBUG\n--------\n{}--------\n", disassembly);
    }

    for line in io::stdin().lock().lines() {
        let line = line.map_err(|e| e.to_string())?;
        if execute(&program, &line, ExecOptions::new(Mode::Search)).is_some() {
            println!("{}", line);
        }
    }

    Ok(())
}


use std::error::Error;
use std::fs::File;
use std::io::Write;
use std::process::ExitCode;

use as_lib::assemble_with_symbols;

use clap::Parser;

/// Assembler for the 16-bit word machine
#[derive(Parser)]
#[command(about)]
struct Args {
    /// Input assembly file
    input: String,

    /// File name to output to
    #[arg(long, short)]
    output: Option<String>,

    /// Dump symbol table (json).
    #[arg(long)]
    symbols: bool,
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let input = std::fs::read_to_string(&args.input)?;
    let (image, symbols) = assemble_with_symbols(&input)?;

    let outname = args.output.as_deref().unwrap_or("a.out");
    let mut out = File::create(outname)?;
    out.write_all(&image)?;

    if args.symbols {
        println!("{}", serde_json::to_string(&symbols)?);
    }
    Ok(())
}

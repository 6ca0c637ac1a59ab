
use std::error::Error;
use std::io::Read;
use std::process::ExitCode;
use std::sync::mpsc::Sender;
use std::thread;

use as_lib::assemble;
use emu_lib::{Display, Interrupt, Machine, NullDisplay, TextDisplay};

use clap::{ArgAction, Parser};

/// 16-bit word machine
#[derive(Parser)]
#[command(about)]
struct Args {
    /// Source or image file to run; prints the version when omitted
    file: Option<String>,

    /// Assemble the input before running it
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    asm: bool,

    /// Run without a terminal display
    #[arg(long)]
    headless: bool,

    /// Print the zero segment after a clean halt
    #[arg(long)]
    dump: bool,
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    let Some(file) = args.file.as_deref() else {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    };

    match run(file, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(file: &str, args: &Args) -> Result<(), Box<dyn Error>> {
    let raw = std::fs::read(file)?;
    let image = if args.asm {
        assemble(&String::from_utf8(raw)?)?
    } else {
        raw
    };

    let display: Box<dyn Display> = if args.headless {
        Box::new(NullDisplay)
    } else {
        Box::new(TextDisplay::new())
    };
    let mut machine = Machine::with_display(display);
    if let Some(sender) = machine.interrupt_sender() {
        spawn_keyboard(sender);
    }
    machine.boot(&image)?;

    if args.dump {
        println!("{machine}");
    }
    Ok(())
}

/// Feed stdin bytes into the interrupt queue; the guest installs a handler
/// through the IRK cell to consume them.
fn spawn_keyboard(sender: Sender<Interrupt>) {
    thread::spawn(move || {
        let mut byte = [0u8; 1];
        let mut stdin = std::io::stdin().lock();
        while stdin.read_exact(&mut byte).is_ok() {
            if sender.send(Interrupt::keyboard(byte[0] as u16)).is_err() {
                break;
            }
        }
    });
}

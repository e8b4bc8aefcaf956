use std::path::PathBuf;

use brainflakes::engine::{CountMode, Engine, EngineConfig, ExecutionResult};
use brainflakes::error::Error;
use brainflakes::io::{ByteInput, ConsoleInput, WriterOutput};
use brainflakes::memory::DEFAULT_MEMORY_SIZE;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status for a source file that cannot be read.
const EXIT_OPEN_INPUT_FILE: i32 = 105;

#[derive(Parser)]
#[command(name = "brainflakes", about = "Run a program on an 8-bit cell tape machine")]
struct Cli {
    /// Source file to run.
    file: PathBuf,

    /// Number of memory cells.
    #[arg(long, default_value_t = DEFAULT_MEMORY_SIZE)]
    memory_size: usize,

    /// Report the instruction count modulo 256.
    #[arg(long)]
    wrap_count: bool,

    /// Refuse source files larger than this many bytes.
    #[arg(long)]
    max_source_bytes: Option<u64>,

    /// Prompt before each `,` and drop the newline typed after the character.
    #[arg(long)]
    interactive: bool,

    /// Do not print the closing execution summary.
    #[arg(long)]
    quiet: bool,
}

/// Read the source file, honoring the optional size cap.
fn read_source(cli: &Cli) -> Result<String, String> {
    let meta = std::fs::metadata(&cli.file)
        .map_err(|e| format!("Error opening input file: {}: {e}", cli.file.display()))?;
    if let Some(limit) = cli.max_source_bytes {
        if meta.len() > limit {
            return Err(format!(
                "Source file is {} bytes, over the {limit} byte limit.",
                meta.len()
            ));
        }
    }
    let bytes = std::fs::read(&cli.file)
        .map_err(|e| format!("Error opening input file: {}: {e}", cli.file.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn print_error(error: &Error) {
    eprintln!("\n(!) ERROR: {error}");
    if let Error::MemOverflow { pointer, size } = error {
        eprintln!("\t Memory size: {size}");
        eprintln!("\t Memory pointer: {pointer}");
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brainflakes=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    info!("Reading file: {}", cli.file.display());
    let source = match read_source(&cli) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("\n(!) ERROR: {e}");
            std::process::exit(EXIT_OPEN_INPUT_FILE);
        }
    };

    let config = EngineConfig {
        memory_size: cli.memory_size,
        count_mode: if cli.wrap_count {
            CountMode::Wrapping8
        } else {
            CountMode::Unbounded
        },
    };
    debug!(?config, "engine config");

    let mut engine = match Engine::from_source(&source, config) {
        Ok(engine) => engine,
        Err(e) => {
            print_error(&e);
            std::process::exit(e.code() as i32);
        }
    };

    let stdin = std::io::stdin().lock();
    let mut input: Box<dyn ByteInput> = if cli.interactive {
        Box::new(ConsoleInput::interactive(stdin, std::io::stderr()))
    } else {
        Box::new(ConsoleInput::new(stdin))
    };
    let mut output = WriterOutput::new(std::io::stdout().lock());

    let result = engine.run(input.as_mut(), &mut output);

    if !cli.quiet {
        eprintln!("\n-------------------------------------------------");
        eprintln!(
            "Execution finished. Total instructions executed: {}",
            result.instructions()
        );
    }

    if let ExecutionResult::Failed { error, context } = result {
        debug!(ip = context.ip, "failed at instruction");
        print_error(&error);
        std::process::exit(error.code() as i32);
    }
}

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use typewriter::playback::drive;
use typewriter::sim;
use typewriter::terminal::TerminalSurface;
use typewriter::timer::RealTimer;
use typewriter::{
    shared, BufferSurface, RawConfig, SharedSurface, Typewriter, TypewriterConfig, WriteOptions,
};

#[derive(Debug, Args, Clone)]
struct TypingArgs {
    /// Text to type
    #[arg(long, conflicts_with = "input")]
    text: Option<String>,

    /// Input text file, or '-' for stdin
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Keep existing surface contents instead of clearing first
    #[arg(long)]
    append: bool,

    /// JSON config file (camelCase keys). Flags below override it.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Base delay between characters (ms)
    #[arg(long)]
    interval: Option<f64>,

    /// Random +/- variation applied to each interval (ms)
    #[arg(long)]
    flexibility: Option<f64>,

    /// Probability (0.0-1.0) that a character is mistyped and corrected
    #[arg(long)]
    backtrack_probability: Option<f64>,

    /// Mistype neighboring QWERTY keys instead of random letters
    #[arg(long)]
    smart_backtracking: bool,

    /// Extra delay before a mistyped character is deleted (ms)
    #[arg(long)]
    backtrack_delay: Option<f64>,

    /// Retype the text forever
    #[arg(long)]
    infinite: bool,

    /// Wait between passes when looping (ms)
    #[arg(long)]
    loop_wait_time: Option<f64>,

    /// Delay after a space or newline (ms)
    #[arg(long)]
    pause_between_words: Option<f64>,

    /// Delay before typing starts (ms)
    #[arg(long)]
    delay: Option<f64>,

    /// Optional RNG seed (for debugging)
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Parser)]
#[command(name = "typewriter")]
#[command(about = "Type text out like a human, mistakes included", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Type into the terminal in real time
    Play {
        #[command(flatten)]
        typing: TypingArgs,

        /// Disable the console status line
        #[arg(long)]
        no_trace: bool,
    },

    /// Simulate typing on a virtual clock and save every frame (JSON)
    Record {
        #[command(flatten)]
        typing: TypingArgs,

        /// Output recording file (defaults to stdout)
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Stop recording after this many ms (required with --infinite)
        #[arg(long)]
        duration: Option<u64>,

        /// How line breaks are rendered in recorded frames
        #[arg(long, default_value = "\n")]
        line_break: String,
    },
}

fn read_input(path: &PathBuf) -> Result<String> {
    if path.as_os_str() == std::ffi::OsStr::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }

    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_output(path: &PathBuf, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

fn load_raw_config(path: &PathBuf) -> Result<RawConfig> {
    let json =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&json).context("failed to parse config JSON")
}

fn build_config(args: &TypingArgs) -> Result<TypewriterConfig> {
    let flags = RawConfig {
        interval: args.interval,
        flexibility: args.flexibility,
        backtrack_probability: args.backtrack_probability,
        smart_backtracking: args.smart_backtracking.then_some(true),
        backtrack_delay: args.backtrack_delay,
        infinite: args.infinite.then_some(true),
        loop_wait_time: args.loop_wait_time,
        pause_between_words: args.pause_between_words,
    };
    let raw = match &args.config {
        Some(path) => flags.or(load_raw_config(path)?),
        None => flags,
    };
    Ok(TypewriterConfig::from_raw(&raw)?)
}

fn text_of(args: &TypingArgs) -> Result<String> {
    match (&args.text, &args.input) {
        (Some(text), _) => Ok(text.clone()),
        (None, Some(path)) => read_input(path),
        (None, None) => Err(anyhow!("one of --text or --input is required")),
    }
}

fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn submit(tw: &mut Typewriter, target: SharedSurface, text: &str, args: &TypingArgs) -> Result<()> {
    let mut options = WriteOptions::new();
    if let Some(delay) = args.delay {
        options = options.delay(delay);
    }
    if args.append {
        tw.append(target, text, options)?;
    } else {
        tw.write(target, text, options)?;
    }
    Ok(())
}

fn escape_for_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Play { typing, no_trace } => {
            let config = build_config(&typing)?;
            let text = text_of(&typing)?;
            let mut tw = Typewriter::with_rng(config, rng_from_seed(typing.seed))?;

            let stop = Arc::new(AtomicBool::new(false));
            {
                let stop = stop.clone();
                ctrlc::set_handler(move || {
                    stop.store(true, Ordering::SeqCst);
                })
                .context("failed to install Ctrl+C handler")?;
            }

            if !no_trace {
                const RESET: &str = "\x1b[0m";
                const TYPING: &str = "\x1b[34m";
                eprintln!("{TYPING}Typing{RESET} \"{}\"...", escape_for_log(&text));
            }

            let terminal = shared(TerminalSurface::stdout());
            submit(&mut tw, terminal.clone(), &text, &typing)?;

            let result = drive(&mut tw, &mut RealTimer::new(), stop.as_ref());
            println!();

            if let Some(err) = terminal.borrow_mut().take_error() {
                return Err(err).context("failed to write to terminal");
            }
            result?;
        }
        Command::Record {
            typing,
            output,
            duration,
            line_break,
        } => {
            let config = build_config(&typing)?;
            let text = text_of(&typing)?;
            let mut tw = Typewriter::with_rng(config, rng_from_seed(typing.seed))?;

            let buffer = shared(BufferSurface::with_line_break(line_break));
            submit(&mut tw, buffer.clone(), &text, &typing)?;

            let recording = sim::record(&mut tw, &*buffer, duration)?;

            let stats = sim::stats(&recording);
            eprintln!(
                "Recorded: {} frames, {} corrections, ~{:.1}s",
                stats.frames,
                stats.corrections,
                (stats.duration_ms as f64) / 1000.0
            );

            let json = serde_json::to_string_pretty(&recording)
                .context("failed to serialize recording")?;
            if let Some(out) = output {
                write_output(&out, &json)?;
            } else {
                println!("{json}");
            }
        }
    }

    Ok(())
}

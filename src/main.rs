//! Headless sequencer host
//!
//! Loads a song directory and drives the engine at the configured tick rate,
//! reporting driver traffic through the logger.

mod args;

use std::fmt::{self, Write as _};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use psg_sequencer::loader::SONG_FILE;
use psg_sequencer::{
    convert_midi_file, load_engine, ChannelDriver, Engine, EngineConfig, LoggingDriver,
    MalformedLinePolicy, TickResult,
};

use args::CliArgs;

fn write_status<D: ChannelDriver>(out: &mut String, engine: &Engine<D>) -> fmt::Result {
    let envelopes = engine.envelopes();
    for (index, channel) in engine.channels().iter().enumerate() {
        write!(
            out,
            "\nCh {index:2} {} vol:{:?} vib:{:?}",
            if channel.is_active() { "on " } else { "off" },
            channel.volume_envelope().map(|s| s.index() + 1),
            channel.vibrato_envelope().map(|s| s.index() + 1),
        )?;
        if let Some(slot) = channel.volume_envelope() {
            let e = envelopes.volume(slot);
            write!(
                out,
                " [A:{} D:{} S:{} R:{}]",
                e.attack, e.decay, e.sustain, e.release
            )?;
        }
        if let Some(slot) = channel.vibrato_envelope() {
            let p = envelopes.pitch(slot);
            write!(
                out,
                " (P delay:{} rate:{} depth:{} ramp:{})",
                p.delay, p.rate, p.depth, p.ramp
            )?;
        }
    }
    write!(
        out,
        "\n64th:{} BPM:{} framesPer64th:{:.4} frame:{}",
        engine.song_position().floor(),
        engine.bpm(),
        engine.frames_per_tick(),
        engine.frame()
    )
}

fn status_block<D: ChannelDriver>(engine: &Engine<D>) -> Result<String> {
    let mut out = String::new();
    write_status(&mut out, engine).context("formatting status block")?;
    Ok(out)
}

fn convert(args: &CliArgs, midi: &Path) -> Result<()> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.song_dir.join(SONG_FILE));
    let song = convert_midi_file(midi, &output)
        .with_context(|| format!("converting {}", midi.display()))?;
    log::info!(
        "Converted '{}' -> '{}' ({} unique events, BPM={})",
        midi.display(),
        output.display(),
        song.lines.len(),
        song.bpm
    );
    Ok(())
}

fn run(args: &CliArgs) -> Result<()> {
    let mut config = match &args.config_path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if args.skip_malformed {
        config.malformed_lines = MalformedLinePolicy::Skip;
    }

    let mut engine = load_engine(&args.song_dir, config, LoggingDriver)
        .with_context(|| format!("loading song directory {}", args.song_dir.display()))?;

    let period = Duration::from_secs_f64(1.0 / config.tick_rate_hz);
    let mut next_tick = Instant::now();
    let mut ticks = 0u64;
    let mut loops = 0u64;

    while args.ticks.map_or(true, |limit| ticks < limit) {
        if engine.tick() == TickResult::Looped {
            loops += 1;
        }
        ticks += 1;

        if args.status_every > 0 && ticks % args.status_every == 0 {
            log::info!("{}", status_block(&engine)?);
        }

        if !args.fast {
            next_tick += period;
            let now = Instant::now();
            if next_tick > now {
                thread::sleep(next_tick - now);
            } else {
                // fell behind, do not try to catch up
                next_tick = now;
            }
        }
    }

    log::info!("Stopped after {ticks} ticks ({loops} loops)");
    Ok(())
}

fn main() -> Result<()> {
    // RUST_LOG=trace shows every driver command
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = CliArgs::parse();
    if args.show_help {
        CliArgs::print_help();
        return Ok(());
    }

    match &args.convert {
        Some(midi) => convert(&args, midi),
        None => run(&args),
    }
}

//! Command-line argument parsing for the sequencer host.

use std::env;
use std::path::PathBuf;

/// Parsed command-line arguments.
#[derive(Debug)]
pub struct CliArgs {
    /// Song directory
    pub song_dir: PathBuf,
    /// JSON engine configuration file
    pub config_path: Option<PathBuf>,
    /// Stop after this many ticks
    pub ticks: Option<u64>,
    /// Run as fast as possible instead of at the tick rate
    pub fast: bool,
    /// Skip malformed song lines instead of failing
    pub skip_malformed: bool,
    /// Log a status block every N ticks (0 = never)
    pub status_every: u64,
    /// MIDI file to convert instead of playing
    pub convert: Option<PathBuf>,
    /// Song file written by a conversion (default: DIR/song.txt)
    pub output: Option<PathBuf>,
    /// Whether help was requested
    pub show_help: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            song_dir: PathBuf::from("."),
            config_path: None,
            ticks: None,
            fast: false,
            skip_malformed: false,
            status_every: 0,
            convert: None,
            output: None,
            show_help: false,
        }
    }
}

fn number(flag: &str, value: Option<String>, show_help: &mut bool) -> Option<u64> {
    let Some(value) = value else {
        eprintln!("{flag} requires a number");
        *show_help = true;
        return None;
    };
    match value.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            eprintln!("{flag}: not a number: {value}");
            *show_help = true;
            None
        }
    }
}

impl CliArgs {
    /// Parse arguments from the command line.
    pub fn parse() -> Self {
        Self::parse_from(env::args().skip(1))
    }

    /// Parse arguments from an iterator (without the program name).
    pub fn parse_from<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut args = Self::default();
        let mut iter = iter.into_iter();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--help" | "-h" => args.show_help = true,
                "--fast" => args.fast = true,
                "--skip-malformed" => args.skip_malformed = true,
                "--config" => match iter.next() {
                    Some(path) => args.config_path = Some(PathBuf::from(path)),
                    None => {
                        eprintln!("--config requires a file");
                        args.show_help = true;
                    }
                },
                "--convert" => match iter.next() {
                    Some(path) => args.convert = Some(PathBuf::from(path)),
                    None => {
                        eprintln!("--convert requires a MIDI file");
                        args.show_help = true;
                    }
                },
                "--output" | "-o" => match iter.next() {
                    Some(path) => args.output = Some(PathBuf::from(path)),
                    None => {
                        eprintln!("--output requires a file");
                        args.show_help = true;
                    }
                },
                "--ticks" => {
                    args.ticks = number("--ticks", iter.next(), &mut args.show_help);
                }
                "--status-every" => {
                    if let Some(n) = number("--status-every", iter.next(), &mut args.show_help) {
                        args.status_every = n;
                    }
                }
                _ if arg.starts_with('-') => {
                    eprintln!("Unknown flag: {arg}");
                    args.show_help = true;
                }
                _ => args.song_dir = PathBuf::from(arg),
            }
        }

        args
    }

    /// Print help text to stderr.
    pub fn print_help() {
        eprintln!(
            "Usage:\n  psg-sequencer [DIR] [--config FILE] [--ticks N] [--fast] [--skip-malformed] [--status-every N]\n  \
             psg-sequencer [DIR] --convert MIDI [--output FILE]\n\n\
             DIR holds song.txt (or demoSong.txt) and envelopes.txt; defaults to the current directory.\n\n\
             Flags:\n\
             \x20 --config FILE        JSON engine configuration\n\
             \x20 --ticks N            Stop after N ticks (default: play forever)\n\
             \x20 --fast               Do not pace ticks to the tick rate\n\
             \x20 --skip-malformed     Skip malformed song lines instead of failing\n\
             \x20 --status-every N     Log channel status every N ticks\n\
             \x20 --convert MIDI       Convert a MIDI file to DIR/song.txt and exit\n\
             \x20 -o, --output FILE    Write the converted song here instead\n\
             \x20 -h, --help           Show this help\n\n\
             Set RUST_LOG=debug or RUST_LOG=trace for driver traffic."
        );
    }
}

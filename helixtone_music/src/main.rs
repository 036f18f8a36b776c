// Helixtone CLI entry point.
//
// Converts a DNA sequence to a MIDI file, draws an SVG chart of it and plays
// it. The pipeline: load sequence → generate notes → encode + verify →
// atomic write → visualize → play.
//
// Usage:
//   cargo run -p helixtone_music -- [--mode sample|file|random] [--input PATH]
//     [--length N] [--seed N] [--output PATH] [--plot PATH] [--no-plot]
//     [--no-play] [--config PATH]
//
// Without --mode, a menu on stdin picks the source. Configuration comes from
// --config, else helixtone.json in the working directory, else defaults.
// Failing to encode or write the MIDI file exits with status 1; chart and
// playback failures are reported and the run still completes.

use helixtone_music::config::ConverterConfig;
use helixtone_music::events::RandomDurations;
use helixtone_music::normalize::{LoadedSequence, SequenceOrigin, load_or_synthesize, synthesize};
use helixtone_music::pipeline::{render, write_atomic};
use helixtone_music::playback::Player;
use helixtone_music::visualize::render_svg;
use helixtone_prng::SeqRng;
use std::fmt::Display;
use std::io::{BufRead, Write};
use std::path::PathBuf;

const DEFAULT_CONFIG: &str = "helixtone.json";

enum Source {
    Sample,
    File(PathBuf),
    Random(usize),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Vec<String> = std::env::args().collect();

    let config = load_config(&args);
    let seed: Option<u64> = parse_flag(&args, "--seed");
    let source = match parse_flag::<String>(&args, "--mode") {
        Some(mode) => source_from_flags(&mode, &args, &config),
        None => prompt_source(&config),
    };
    let output: PathBuf = parse_flag(&args, "--output").unwrap_or_else(|| config.output_path.clone());
    let plot: Option<PathBuf> = if has_flag(&args, "--no-plot") {
        None
    } else {
        Some(parse_flag(&args, "--plot").unwrap_or_else(|| config.plot_path.clone()))
    };
    let play = !has_flag(&args, "--no-play");

    println!();
    println!("=== Helixtone: DNA to Music ===");
    if let Some(s) = seed {
        println!("Seed: {}", s);
    }

    let mut rng = match seed {
        Some(s) => SeqRng::new(s),
        None => SeqRng::from_entropy(),
    };

    println!("[1/5] Loading DNA sequence...");
    let loaded = load_sequence(source, &config, &mut rng);
    println!("  Source: {}", loaded.origin);
    println!("  Sequence length: {} bases", loaded.sequence.len());

    println!("[2/5] Converting to music...");
    let pitches = config
        .pitch_table()
        .unwrap_or_else(|e| fatal("Invalid pitch table", e));
    let mut durations = RandomDurations::new(config.durations.clone(), rng)
        .unwrap_or_else(|e| fatal("Invalid durations", e));
    let rendering = render(loaded.sequence, &pitches, &mut durations, &config.midi)
        .unwrap_or_else(|e| fatal("Error encoding MIDI", e));
    println!(
        "  {} notes, {} beats ({:.1}s at {} BPM)",
        rendering.events.len(),
        rendering.total_beats,
        rendering.duration_seconds(config.midi.tempo_bpm),
        config.midi.tempo_bpm
    );

    println!("[3/5] Writing MIDI to {}...", output.display());
    write_atomic(&output, &rendering.smf).unwrap_or_else(|e| fatal("Error writing MIDI", e));
    println!("  MIDI file saved as {} ({} bytes)", output.display(), rendering.smf.len());

    println!("[4/5] Creating visualization...");
    match plot {
        None => println!("  Skipped."),
        Some(path) => match config.color_table() {
            Err(e) => eprintln!("  Error creating visualization: {}", e),
            Ok(colors) => match render_svg(&rendering.sequence, &rendering.events, &colors, &path) {
                Ok(true) => println!("  Saved {}", path.display()),
                Ok(false) => println!("  Nothing to visualize."),
                Err(e) => eprintln!("  Error creating visualization: {}", e),
            },
        },
    }

    println!("[5/5] Playing music...");
    if play {
        let player = config.player();
        println!("  Using {}...", player.program());
        match player.play(&output) {
            Ok(()) => println!("  Playback finished."),
            Err(e) => eprintln!(
                "  Error playing MIDI file: {}. Try opening {} with another MIDI player.",
                e,
                output.display()
            ),
        }
    } else {
        println!("  Skipped.");
    }

    println!();
    println!("Conversion complete!");
}

fn load_config(args: &[String]) -> ConverterConfig {
    let path = parse_flag::<PathBuf>(args, "--config").or_else(|| {
        let default = PathBuf::from(DEFAULT_CONFIG);
        default.exists().then_some(default)
    });
    match path {
        None => ConverterConfig::default(),
        Some(path) => {
            let config = ConverterConfig::load(&path)
                .unwrap_or_else(|e| fatal("Invalid configuration", e));
            log::info!("using configuration from {}", path.display());
            config
        }
    }
}

fn source_from_flags(mode: &str, args: &[String], config: &ConverterConfig) -> Source {
    match mode {
        "sample" => Source::Sample,
        "file" => Source::File(
            parse_flag(args, "--input")
                .unwrap_or_else(|| PathBuf::from(prompt("Enter filename containing DNA sequence: "))),
        ),
        "random" => Source::Random(
            parse_flag::<String>(args, "--length")
                .map_or(config.clamp_length(config.fallback_length), |n| {
                    config.requested_length(&n)
                }),
        ),
        other => {
            eprintln!("Unknown mode '{}'. Using sample sequence.", other);
            Source::Sample
        }
    }
}

fn prompt_source(config: &ConverterConfig) -> Source {
    println!("DNA to Music Converter");
    println!("1. Use sample DNA sequence");
    println!("2. Load DNA sequence from file");
    println!("3. Generate random DNA sequence");
    match prompt("Enter your choice (1-3): ").as_str() {
        "1" => Source::Sample,
        "2" => Source::File(PathBuf::from(prompt(
            "Enter filename containing DNA sequence: ",
        ))),
        "3" => {
            let question = format!(
                "Enter length of random sequence ({}-{}): ",
                config.min_length, config.max_length
            );
            let length = config.parse_length(&prompt(&question)).unwrap_or_else(|| {
                let fallback = config.clamp_length(config.fallback_length);
                println!("Not a number. Using {} bases.", fallback);
                fallback
            });
            Source::Random(length)
        }
        _ => {
            println!("Invalid choice. Using sample sequence.");
            Source::Sample
        }
    }
}

fn load_sequence(source: Source, config: &ConverterConfig, rng: &mut SeqRng) -> LoadedSequence {
    match source {
        Source::Sample => LoadedSequence {
            sequence: config.sample(),
            origin: SequenceOrigin::Sample,
        },
        Source::File(path) => load_or_synthesize(
            &path,
            config.header_marker,
            config.fallback_length,
            rng,
        ),
        Source::Random(length) => LoadedSequence {
            sequence: synthesize(length, rng),
            origin: SequenceOrigin::Synthesized { length },
        },
    }
}

/// Print `question` and read one trimmed line from stdin. Empty on EOF.
fn prompt(question: &str) -> String {
    print!("{}", question);
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    if let Err(e) = std::io::stdin().lock().read_line(&mut line) {
        log::warn!("could not read from stdin: {}", e);
    }
    line.trim().to_string()
}

fn fatal(context: &str, err: impl Display) -> ! {
    eprintln!("  {}: {}", context, err);
    std::process::exit(1);
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}

//! Beat renderer
//!
//! Loads a beat file, runs the player offline for a number of audio blocks
//! and prints every note event it emits. Transport commands can be scheduled
//! at block indices to audition fills, part changes and endings.
//!
//! Usage: render_beat <beat.json|beat.ron> [blocks] [--config player.ron]
//!        [--fill N] [--next N] [--stop N]

use beat_sequencer::sequencer::note::note_name;
use beat_sequencer::{BeatDescription, Player, PlayerConfig, TransportCommand};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const BLOCK_SIZE: usize = 512;

struct Options {
    beat_path: PathBuf,
    blocks: usize,
    config_path: Option<PathBuf>,
    schedule: Vec<(usize, TransportCommand)>,
}

fn parse_args() -> Result<Options, String> {
    let mut args = std::env::args().skip(1);
    let mut beat_path = None;
    let mut blocks = 256;
    let mut config_path = None;
    let mut schedule = Vec::new();

    while let Some(arg) = args.next() {
        let command = match arg.as_str() {
            "--config" => {
                let path = args.next().ok_or("--config needs a path")?;
                config_path = Some(PathBuf::from(path));
                continue;
            }
            "--fill" => Some(TransportCommand::Fill),
            "--next" => Some(TransportCommand::Next),
            "--stop" => Some(TransportCommand::Stop),
            _ => None,
        };

        match command {
            Some(command) => {
                let block = args
                    .next()
                    .and_then(|n| n.parse::<usize>().ok())
                    .ok_or_else(|| format!("{} needs a block index", arg))?;
                schedule.push((block, command));
            }
            None if beat_path.is_none() => beat_path = Some(PathBuf::from(arg)),
            None => {
                blocks = arg
                    .parse()
                    .map_err(|_| format!("invalid block count '{}'", arg))?;
            }
        }
    }

    Ok(Options {
        beat_path: beat_path.ok_or("missing beat file")?,
        blocks,
        config_path,
        schedule,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = parse_args()?;
    let config = match &options.config_path {
        Some(path) => PlayerConfig::from_file(path)?,
        None => PlayerConfig::default(),
    };

    let beat = Arc::new(BeatDescription::load(&options.beat_path)?);
    println!(
        "Beat '{}' ({}), {} BPM, {} parts",
        beat.name(),
        beat.time_signature(),
        beat.tempo().bpm(),
        beat.part_count()
    );
    for part in beat.parts() {
        println!(
            "  {}: {} bar(s), {} fill(s){}",
            part.name,
            part.main_loop.bars(beat.quarters_per_bar()),
            part.fills.len(),
            if part.transition.is_some() { ", transition" } else { "" }
        );
    }

    let (mut player, mut processor) = Player::new(&config);
    if !player.load_beat_description(beat) {
        return Err("beat has no playable part".into());
    }

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    processor.set_note_callback(move |delay, pitch, velocity| {
        if let Ok(mut events) = sink.lock() {
            events.push((delay, pitch, velocity));
        }
    });

    player.start();
    for block in 0..options.blocks {
        for (_, command) in options.schedule.iter().filter(|(at, _)| *at == block) {
            let sent = match command {
                TransportCommand::Start => player.start(),
                TransportCommand::Stop => player.stop(),
                TransportCommand::Fill => player.fill_in(),
                TransportCommand::Next => player.next(),
            };
            if !sent {
                log::warn!("Command {:?} dropped at block {}", command, block);
            }
        }

        processor.tick(BLOCK_SIZE);

        let emitted: Vec<_> = events
            .lock()
            .map(|mut e| e.drain(..).collect())
            .unwrap_or_default();
        for (delay, pitch, velocity) in emitted {
            let sample = block * BLOCK_SIZE + delay as usize;
            let name = note_name(pitch);
            if velocity > 0.0 {
                println!("{:>9}  on   {:<4} {:.2}  [{:?}]", sample, name, velocity, player.state());
            } else {
                println!("{:>9}  off  {:<4}", sample, name);
            }
        }
    }

    if player.overrun_blocks() > 0 {
        log::warn!(
            "{} block(s) crossed too many sequence ends and were cut short",
            player.overrun_blocks()
        );
    }

    println!(
        "Finished in state {:?}, part {:?}",
        player.state(),
        player.part_name()
    );
    Ok(())
}

#[cfg(feature = "live-audio")]
mod audio;
mod wav;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tonelink_core::{
    Command as ModemCommand, DecodeStatus, DecodedPacket, Decoder, Encoder,
    HalfDuplexController, SessionReport, SAMPLE_RATE,
};

use crate::wav::{WavFileSink, WavFileSource};

#[derive(Parser)]
#[command(name = "tonelink")]
#[command(about = "AFSK text modem for half-duplex acoustic messaging")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a message into a WAV file
    Send {
        /// Message text (ASCII, up to 255 bytes)
        message: String,

        /// Destination endpoint id
        #[arg(long)]
        to: u8,

        /// Local endpoint id
        #[arg(long)]
        from: u8,

        /// Output WAV file
        #[arg(short, long, value_name = "OUTPUT.WAV")]
        output: PathBuf,
    },

    /// Decode a message from a WAV file
    Recv {
        /// Input WAV file
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Local endpoint id
        #[arg(long)]
        id: u8,
    },

    /// Encode a message and play it through the default output device
    #[cfg(feature = "live-audio")]
    Play {
        /// Message text (ASCII, up to 255 bytes)
        message: String,

        /// Destination endpoint id
        #[arg(long)]
        to: u8,

        /// Local endpoint id
        #[arg(long)]
        from: u8,
    },

    /// Listen on the default input device for one packet
    #[cfg(feature = "live-audio")]
    Listen {
        /// Local endpoint id
        #[arg(long)]
        id: u8,
    },

    /// Interactive half-duplex session simulated over WAV files
    Repl {
        /// Local endpoint id
        #[arg(long)]
        id: u8,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Send {
            message,
            to,
            from,
            output,
        } => send_command(&message, from, to, &output)?,
        Commands::Recv { input, id } => recv_command(&input, id)?,
        #[cfg(feature = "live-audio")]
        Commands::Play { message, to, from } => play_command(&message, from, to)?,
        #[cfg(feature = "live-audio")]
        Commands::Listen { id } => listen_command(id)?,
        Commands::Repl { id } => repl_command(id)?,
    }

    Ok(())
}

fn send_command(
    message: &str,
    from: u8,
    to: u8,
    output: &PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let samples = Encoder::new().encode(message, from, to)?;
    wav::write_samples(output, &samples)?;

    println!(
        "Wrote {} samples ({:.2} s) to {}",
        samples.len(),
        samples.len() as f32 / SAMPLE_RATE as f32,
        output.display()
    );
    Ok(())
}

fn recv_command(input: &PathBuf, id: u8) -> Result<(), Box<dyn std::error::Error>> {
    let samples = wav::read_samples(input)?;
    println!("Read {} samples from {}", samples.len(), input.display());

    let packet = Decoder::new().decode(&samples, id)?;
    print_packet(&packet);
    Ok(())
}

#[cfg(feature = "live-audio")]
fn play_command(message: &str, from: u8, to: u8) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = HalfDuplexController::new(from);
    let mut sink = audio::CpalSink::open()?;

    match controller.transmit(message, to, &mut sink)? {
        SessionReport::Sent { samples } => {
            println!(
                "Transmitted {samples} samples ({:.2} s)",
                samples as f32 / SAMPLE_RATE as f32
            );
        }
        other => println!("Unexpected session report: {other:?}"),
    }
    Ok(())
}

#[cfg(feature = "live-audio")]
fn listen_command(id: u8) -> Result<(), Box<dyn std::error::Error>> {
    println!("Listening (local id {id}), press Ctrl+C to stop...");
    let mut controller = HalfDuplexController::new(id);
    let mut source = audio::CpalSource::open()?;

    match controller.receive(&mut source)? {
        SessionReport::Received(packet) => print_packet(&packet),
        other => println!("Unexpected session report: {other:?}"),
    }
    Ok(())
}

fn repl_command(id: u8) -> Result<(), Box<dyn std::error::Error>> {
    println!("AFSK half-duplex modem, local id {id}");
    println!("Transmit writes a WAV capture; receive replays one.");
    println!("Commands: 't' transmit, 'r' receive, 'q' quit");

    let mut controller = HalfDuplexController::new(id);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("[{:?}] > ", controller.state());
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };

        let command = match line.trim().to_lowercase().as_str() {
            "t" => {
                let message = prompt(&mut lines, "Message: ")?;
                let target = prompt(&mut lines, "Target id (0-255): ")?;
                match target.trim().parse() {
                    Ok(target_id) => ModemCommand::Transmit { message, target_id },
                    Err(_) => {
                        println!("Invalid target id");
                        continue;
                    }
                }
            }
            "r" => ModemCommand::Receive,
            "q" => ModemCommand::Quit,
            "" => continue,
            other => {
                println!("Unknown command '{other}'");
                continue;
            }
        };

        match command {
            ModemCommand::Transmit { message, target_id } => {
                let output = prompt(&mut lines, "Output WAV file: ")?;
                let mut sink = WavFileSink::new(PathBuf::from(output.trim()));
                match controller.transmit(&message, target_id, &mut sink) {
                    Ok(SessionReport::Sent { samples }) => {
                        println!(
                            "Sent {samples} samples ({:.2} s) to endpoint {target_id}",
                            samples as f32 / SAMPLE_RATE as f32
                        );
                    }
                    Ok(other) => println!("Unexpected session report: {other:?}"),
                    Err(err) => println!("Transmit failed: {err}"),
                }
            }
            ModemCommand::Receive => {
                let input = prompt(&mut lines, "Input WAV file: ")?;
                let mut source = match WavFileSource::open(input.trim().as_ref()) {
                    Ok(source) => source,
                    Err(err) => {
                        println!("Cannot open capture: {err}");
                        continue;
                    }
                };
                match controller.receive(&mut source) {
                    Ok(SessionReport::Received(packet)) => print_packet(&packet),
                    Ok(other) => println!("Unexpected session report: {other:?}"),
                    Err(err) => println!("Receive failed: {err}"),
                }
            }
            ModemCommand::Quit => break,
        }
    }

    println!("Session closed");
    Ok(())
}

fn prompt(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    label: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    print!("{label}");
    io::stdout().flush()?;
    match lines.next() {
        Some(line) => Ok(line?),
        None => Err("input closed".into()),
    }
}

fn print_packet(packet: &DecodedPacket) {
    println!("--- Receive result ---");
    match packet.status {
        DecodeStatus::Ok => println!("Status: message received and verified"),
        DecodeStatus::HeaderTooShort => println!("Status: packet too short for its header"),
        DecodeStatus::NotAddressed => println!("Status: packet addressed to another endpoint"),
        DecodeStatus::Truncated => println!("Status: packet truncated"),
        DecodeStatus::CrcMismatch => println!("Status: integrity check failed"),
    }
    if !packet.text.is_empty() {
        println!("Message: '{}'", packet.text);
    }
    println!("CRC OK: {}", packet.crc_ok);
}

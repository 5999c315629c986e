use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use spectrogram_viewer::client::{reload_spectrogram, send_message, AudioSource, FileAudioSource};
use spectrogram_viewer::graphics::{GpuRenderer, LoggingRenderer, Renderer, RendererCaps};
use spectrogram_viewer::protocol::messages::request_file_spectrogram;
use spectrogram_viewer::protocol::{decode, Frame, Message};
use spectrogram_viewer::view::{Axis, PointerEvent, WheelEvent};
use spectrogram_viewer::{EventLoop, LogObserver, Session, SessionEvent, ViewerConfig};

#[derive(Parser)]
#[command(name = "specview")]
#[command(about = "Spectrogram viewer client: build requests, inspect and replay frames")]
struct Args {
    /// JSON config file; defaults are used when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a request for a spectrogram of a file on the server
    RequestFile {
        filename: String,
        #[arg(short, long, default_value = "request.json")]
        output: PathBuf,
    },
    /// Write a request carrying a local audio file
    RequestData {
        audio: PathBuf,
        #[arg(short, long, default_value = "request.bin")]
        output: PathBuf,
    },
    /// Decode a frame file and print what it holds
    Inspect { frame: PathBuf },
    /// Feed recorded server frames and input events through a session
    Replay {
        /// Frame files, applied in order (.json files are text frames)
        frames: Vec<PathBuf>,
        /// JSON list of input events applied after the frames
        #[arg(short, long)]
        events: Option<PathBuf>,
        /// Upload chunks to a headless GPU device instead of logging them
        #[arg(long)]
        gpu: bool,
        /// Offscreen target size for the GPU renderer
        #[arg(long, default_value = "1024x512", value_parser = parse_size)]
        size: (u32, u32),
    },
}

/// One recorded user input.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ScriptedInput {
    Wheel(WheelEvent),
    Pointer(PointerEvent),
    Resize { width: u32, height: u32 },
}

impl From<ScriptedInput> for SessionEvent {
    fn from(input: ScriptedInput) -> Self {
        match input {
            ScriptedInput::Wheel(wheel) => SessionEvent::Wheel(wheel),
            ScriptedInput::Pointer(pointer) => SessionEvent::PointerMove(pointer),
            ScriptedInput::Resize { width, height } => SessionEvent::Resize { width, height },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ViewerConfig::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => ViewerConfig::default(),
    };

    match args.command {
        Command::RequestFile { filename, output } => {
            let message = request_file_spectrogram(&filename, config.nfft, config.overlap)?;
            write_message(&message, &output).await?;
        }
        Command::RequestData { audio, output } => {
            let source = FileAudioSource::new(audio);
            match reload_spectrogram(Some(&source as &dyn AudioSource), config.nfft, config.overlap).await? {
                Some(message) => write_message(&message, &output).await?,
                None => info!("Nothing to request"),
            }
        }
        Command::Inspect { frame } => {
            let frame = read_frame(&frame).await?;
            let message = decode(&frame)?;
            println!("type:    {}", message.kind);
            println!("content: {}", serde_json::to_string_pretty(&message.content)?);
            match message.payload {
                Some(payload) => println!("payload: {} bytes", payload.len()),
                None => println!("payload: none"),
            }
        }
        Command::Replay { frames, events, gpu, size } => {
            let mut recorded = Vec::with_capacity(frames.len());
            for path in &frames {
                recorded.push(read_frame(path).await?);
            }
            let inputs: Vec<ScriptedInput> = match &events {
                Some(path) => serde_json::from_str(&tokio::fs::read_to_string(path).await?)?,
                None => Vec::new(),
            };

            info!("Replaying {} frames and {} input events", recorded.len(), inputs.len());
            tokio::task::spawn_blocking(move || replay(config, recorded, inputs, gpu.then_some(size))).await??;
        }
    }

    Ok(())
}

async fn write_message(message: &Message, output: &Path) -> Result<()> {
    let mut sent: Vec<Frame> = Vec::new();
    send_message(&mut sent, message)?;

    for frame in sent {
        match frame {
            Frame::Text(text) => tokio::fs::write(output, text).await?,
            Frame::Binary(bytes) => tokio::fs::write(output, bytes).await?,
        }
    }
    info!("Wrote '{}' request to {}", message.kind, output.display());
    Ok(())
}

async fn read_frame(path: &Path) -> Result<Frame> {
    let is_text = path.extension().is_some_and(|ext| ext == "json");
    let frame = if is_text {
        Frame::Text(tokio::fs::read_to_string(path).await?)
    } else {
        Frame::Binary(tokio::fs::read(path).await?)
    };
    Ok(frame)
}

fn parse_size(value: &str) -> std::result::Result<(u32, u32), String> {
    let (width, height) = value
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let width = width.parse().map_err(|e| format!("bad width: {}", e))?;
    let height = height.parse().map_err(|e| format!("bad height: {}", e))?;
    Ok((width, height))
}

fn replay(
    config: ViewerConfig,
    frames: Vec<Frame>,
    inputs: Vec<ScriptedInput>,
    gpu_target: Option<(u32, u32)>,
) -> Result<()> {
    let renderer: Box<dyn Renderer> = match gpu_target {
        Some((width, height)) => Box::new(pollster::block_on(GpuRenderer::new_headless(width, height))?),
        None => Box::new(LoggingRenderer::new(RendererCaps::default())),
    };

    let mut session = Session::new(renderer, Box::new(LogObserver), &config);
    let event_loop = EventLoop::new();
    let sender = event_loop.sender();

    for frame in frames {
        sender.send(SessionEvent::Frame(frame))?;
    }
    for input in inputs {
        sender.send(input.into())?;
    }
    drop(sender);

    event_loop.run_with_ticks(&mut session, config.render_interval());
    info!(
        "{} renderer drew {} frames",
        session.renderer().renderer_type(),
        session.renderer().frames_drawn()
    );

    match session.viewport().view_extent() {
        Some(view) => {
            for axis in Axis::ALL {
                info!("{:?}: {:?}", axis, view.range(axis));
            }
        }
        None => info!("No spectrogram loaded"),
    }
    Ok(())
}

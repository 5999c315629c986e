use async_trait::async_trait;
use log::{info, warn};
use std::path::PathBuf;

use crate::error::{Result, ViewerError};
use crate::protocol::messages::request_data_spectrogram;
use crate::protocol::{Frame, Message};

/// Where the audio for a data request comes from.
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Display name, used for logging.
    fn name(&self) -> String;

    /// The complete encoded audio file, as the server expects it.
    async fn read_all(&self) -> Result<Vec<u8>>;
}

pub struct FileAudioSource {
    path: PathBuf,
}

impl FileAudioSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AudioSource for FileAudioSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    async fn read_all(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}

/// Outgoing side of the connection.
pub trait FrameSink {
    fn send_frame(&mut self, frame: Frame) -> Result<()>;
}

impl FrameSink for Vec<Frame> {
    fn send_frame(&mut self, frame: Frame) -> Result<()> {
        self.push(frame);
        Ok(())
    }
}

pub fn send_message(sink: &mut dyn FrameSink, message: &Message) -> Result<()> {
    let frame = message.encode()?;
    info!("Sending '{}' ({} bytes)", message.kind, frame.len());
    sink.send_frame(frame)
}

/// Build a data spectrogram request from the selected source. Without a
/// selection there is nothing to send; that is logged and `None` returned.
pub async fn reload_spectrogram(
    source: Option<&dyn AudioSource>,
    nfft: usize,
    overlap: f64,
) -> Result<Option<Message>> {
    let Some(source) = source else {
        warn!("{}", ViewerError::Input("no audio file selected".to_string()));
        return Ok(None);
    };

    let audio = source.read_all().await?;
    info!("Read {} bytes from {}", audio.len(), source.name());
    Ok(Some(request_data_spectrogram(audio, nfft, overlap)?))
}

pub mod dispatch;
pub mod event_loop;

pub use dispatch::Dispatcher;
pub use event_loop::{EventLoop, SessionEvent};

use log::{debug, info, warn};

use crate::config::ViewerConfig;
use crate::error::{Result, ViewerError};
use crate::graphics::{ChunkDescriptor, ChunkPlanner, Renderer};
use crate::protocol::messages::{self, parse_content, Information, LoadingProgress};
use crate::protocol::{decode, DecodedMessage, Frame, ProgressIndicator, Spectrogram};
use crate::view::{CursorReadout, DataExtent, Extent, InputResponse, PointerEvent, ViewportController, WheelEvent};

/// Notifications out of the session. Every method defaults to a no-op.
pub trait SessionObserver {
    fn on_spectrogram_loaded(&mut self, _chunks: &[ChunkDescriptor], _data: &DataExtent, _view: &Extent) {}

    fn on_progress(&mut self, _progress: f64) {}

    /// Diagnostic text, from the server or from a rejected load.
    fn on_info(&mut self, _text: &str) {}

    fn on_cursor(&mut self, _readout: CursorReadout) {}
}

/// Observer that writes every notification to the log.
#[derive(Debug, Default)]
pub struct LogObserver;

impl SessionObserver for LogObserver {
    fn on_spectrogram_loaded(&mut self, chunks: &[ChunkDescriptor], data: &DataExtent, view: &Extent) {
        info!(
            "Spectrogram loaded: {}x{} samples in {} chunks, view {:?}",
            data.num_t(),
            data.num_f(),
            chunks.len(),
            view
        );
    }

    fn on_progress(&mut self, progress: f64) {
        match ProgressIndicator::from_progress(progress) {
            ProgressIndicator::Visible(p) => info!("Loading... {:.0}%", p * 100.0),
            ProgressIndicator::Hidden => debug!("Progress indicator hidden"),
        }
    }

    fn on_info(&mut self, text: &str) {
        info!("{}", text);
    }

    fn on_cursor(&mut self, readout: CursorReadout) {
        debug!("Cursor at {:.3}s, {:.1}Hz", readout.time, readout.frequency);
    }
}

/// Everything a message handler may touch.
pub struct SessionState {
    pub viewport: ViewportController,
    pub planner: ChunkPlanner,
    pub chunks: Vec<ChunkDescriptor>,
    pub renderer: Box<dyn Renderer>,
    pub observer: Box<dyn SessionObserver>,
    pub dirty: bool,
}

/// One viewer: data, view, chunks and the handlers that update them.
/// Single-threaded; feed it from an [`EventLoop`].
pub struct Session {
    state: SessionState,
    dispatcher: Dispatcher<SessionState>,
}

impl Session {
    pub fn new(renderer: Box<dyn Renderer>, observer: Box<dyn SessionObserver>, config: &ViewerConfig) -> Self {
        let caps = config.renderer_caps(renderer.caps());
        info!(
            "{} renderer: max texture size {}, {} texture units",
            renderer.renderer_type(),
            caps.max_texture_size,
            caps.max_texture_units
        );

        let state = SessionState {
            viewport: ViewportController::new(config.viewport_settings()),
            planner: ChunkPlanner::new(caps),
            chunks: Vec::new(),
            renderer,
            observer,
            dirty: false,
        };

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(messages::SPECTROGRAM, load_spectrogram);
        dispatcher.register(messages::LOADING_PROGRESS, |state: &mut SessionState, msg: &DecodedMessage<'_>| {
            let progress: LoadingProgress = parse_content(&msg.kind, &msg.content)?;
            state.observer.on_progress(progress.progress);
            Ok(())
        });
        dispatcher.register(messages::INFORMATION, |state: &mut SessionState, msg: &DecodedMessage<'_>| {
            let information: Information = parse_content(&msg.kind, &msg.content)?;
            state.observer.on_info(&information.text);
            Ok(())
        });

        Self { state, dispatcher }
    }

    /// Install a handler for a message type, replacing any existing one.
    pub fn register_handler<F>(&mut self, kind: &str, handler: F) -> bool
    where
        F: FnMut(&mut SessionState, &DecodedMessage<'_>) -> Result<()> + 'static,
    {
        self.dispatcher.register(kind, handler)
    }

    pub fn unregister_handler(&mut self, kind: &str) -> bool {
        self.dispatcher.unregister(kind)
    }

    /// Decode and dispatch one incoming frame. Bad frames are logged and
    /// dropped; the session state is left as it was.
    pub fn handle_frame(&mut self, frame: &Frame) {
        let message = match decode(frame) {
            Ok(message) => message,
            Err(e) => {
                warn!("Dropping {} byte frame: {}", frame.len(), e);
                return;
            }
        };

        match self.dispatcher.dispatch(&mut self.state, &message) {
            Some(Ok(())) => {}
            Some(Err(e)) => warn!("Failed to handle '{}' message: {}", message.kind, e),
            None => debug!("Ignoring message of unknown type '{}'", message.kind),
        }
    }

    pub fn handle_wheel(&mut self, wheel: &WheelEvent) -> InputResponse {
        let response = self.state.viewport.handle_wheel(wheel);
        if response.view_changed {
            self.state.dirty = true;
        }
        response
    }

    pub fn handle_pointer(&mut self, pointer: &PointerEvent) -> Option<CursorReadout> {
        let readout = self.state.viewport.cursor(pointer)?;
        self.state.observer.on_cursor(readout);
        Some(readout)
    }

    /// Resize the drawing surface. The view extent is kept; only the next
    /// frame is redrawn at the new size.
    pub fn handle_resize(&mut self, width: u32, height: u32) {
        self.state.renderer.resize(width, height);
        self.state.dirty = true;
    }

    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Frame(frame) => self.handle_frame(&frame),
            SessionEvent::Wheel(wheel) => {
                self.handle_wheel(&wheel);
            }
            SessionEvent::PointerMove(pointer) => {
                self.handle_pointer(&pointer);
            }
            SessionEvent::Resize { width, height } => self.handle_resize(width, height),
            SessionEvent::Render => {
                self.render_frame();
            }
        }
    }

    /// Draw if anything changed since the last frame. Returns whether it drew.
    pub fn render_frame(&mut self) -> bool {
        if !self.state.dirty {
            return false;
        }
        self.state.dirty = false;

        let state = &mut self.state;
        match (state.viewport.data_extent(), state.viewport.view_extent()) {
            (Some(data), Some(view)) => {
                state.renderer.draw(&state.chunks, data, view);
                true
            }
            _ => false,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.state.dirty
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.state.viewport
    }

    pub fn chunks(&self) -> &[ChunkDescriptor] {
        &self.state.chunks
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.state.renderer.as_ref()
    }
}

/// Replace data, view and chunks in one step. A grid the renderer cannot
/// hold is reported to the observer and the previous spectrogram stays.
fn load_spectrogram(state: &mut SessionState, message: &DecodedMessage<'_>) -> Result<()> {
    let spectrogram = Spectrogram::parse(message)?;
    let chunks = match state
        .planner
        .plan(&spectrogram.samples, spectrogram.nblocks, spectrogram.header.nfreqs)
    {
        Ok(chunks) => chunks,
        Err(e @ ViewerError::Capability { .. }) => {
            warn!("Spectrogram rejected: {}", e);
            state.observer.on_info(&e.to_string());
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let data = spectrogram.data_extent();
    state.renderer.load_chunks(&chunks);
    let view = state.viewport.load(data);
    state.chunks = chunks;
    state.dirty = true;
    state.observer.on_spectrogram_loaded(&state.chunks, &data, &view);
    Ok(())
}

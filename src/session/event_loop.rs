use crossbeam_channel::{select, tick, unbounded, Receiver, Sender};
use log::{debug, info};
use std::time::Duration;

use super::Session;
use crate::protocol::Frame;
use crate::view::{PointerEvent, WheelEvent};

/// Everything that can happen to a session, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Frame(Frame),
    Wheel(WheelEvent),
    PointerMove(PointerEvent),
    /// The drawing surface changed size, in pixels.
    Resize { width: u32, height: u32 },
    Render,
}

/// Single consumer queue in front of a [`Session`]. Producers on any thread
/// push through cloned senders; the session is only touched by the thread
/// that drains the loop.
pub struct EventLoop {
    sender: Sender<SessionEvent>,
    receiver: Receiver<SessionEvent>,
}

impl EventLoop {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    pub fn sender(&self) -> Sender<SessionEvent> {
        self.sender.clone()
    }

    /// Apply every queued event without blocking. Returns how many ran.
    pub fn pump(&self, session: &mut Session) -> usize {
        let mut handled = 0;
        for event in self.receiver.try_iter() {
            session.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Block until every outside sender is gone, then draw once more.
    pub fn run(self, session: &mut Session) -> usize {
        let EventLoop { sender, receiver } = self;
        drop(sender);

        let mut handled = 0;
        for event in receiver.iter() {
            session.handle_event(event);
            handled += 1;
        }
        session.render_frame();
        info!("Event loop finished after {} events", handled);
        handled
    }

    /// Like [`run`](Self::run), with a render tick at a fixed interval.
    pub fn run_with_ticks(self, session: &mut Session, interval: Duration) -> usize {
        let EventLoop { sender, receiver } = self;
        drop(sender);

        let ticker = tick(interval);
        let mut handled = 0;
        loop {
            select! {
                recv(receiver) -> event => match event {
                    Ok(event) => {
                        session.handle_event(event);
                        handled += 1;
                    }
                    Err(_) => break,
                },
                recv(ticker) -> _ => {
                    if session.render_frame() {
                        debug!("Rendered on tick");
                    }
                }
            }
        }
        session.render_frame();
        info!("Event loop finished after {} events", handled);
        handled
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

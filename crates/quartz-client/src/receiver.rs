//! Background receiver: socket bytes to decoded responses on a bounded queue.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::Arc;
use std::thread::JoinHandle;

use quartz_frame::{is_timeout, FrameError, FrameReader, Response};
use quartz_transport::RouterStream;
use serde::Serialize;
use tracing::{debug, warn};

use crate::link::Link;

/// Name given to every receiver thread.
pub const RECEIVER_THREAD_NAME: &str = "quartz-rx";

/// Snapshot of receiver counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReceiverStats {
    /// Complete frames extracted from the stream.
    pub frames_received: u64,
    /// Responses pushed onto the queue.
    pub responses_delivered: u64,
    /// Frames that failed to decode or exceeded the frame length limit.
    pub frames_dropped: u64,
}

/// Live counters shared between the receiver thread and the client.
#[derive(Debug, Default)]
pub struct ReceiverCounters {
    frames_received: AtomicU64,
    responses_delivered: AtomicU64,
    frames_dropped: AtomicU64,
}

impl ReceiverCounters {
    pub fn snapshot(&self) -> ReceiverStats {
        ReceiverStats {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            responses_delivered: self.responses_delivered.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
        }
    }

    fn received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    fn delivered(&self) {
        self.responses_delivered.fetch_add(1, Ordering::Relaxed);
    }

    fn dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }
}

/// Everything the receiver loop needs for one session.
pub(crate) struct Receiver {
    pub reader: FrameReader<RouterStream>,
    pub queue: SyncSender<Response>,
    pub link: Arc<Link>,
    pub session: u64,
    pub stop: Arc<AtomicBool>,
    pub counters: Arc<ReceiverCounters>,
}

impl Receiver {
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name(RECEIVER_THREAD_NAME.to_string())
            .spawn(move || self.run())
    }

    fn run(mut self) {
        debug!(session = self.session, "receiver started");
        loop {
            if self.stop.load(Ordering::Acquire) {
                debug!(session = self.session, "receiver stopped");
                return;
            }

            match self.reader.read_frame() {
                Ok(frame) => {
                    self.counters.received();
                    let response = match Response::decode_frame(&frame) {
                        Ok(response) => response,
                        Err(err) => {
                            self.counters.dropped();
                            debug!(
                                frame = %frame.text().escape_debug(),
                                error = %err,
                                "dropping undecodable frame"
                            );
                            continue;
                        }
                    };
                    // Blocks while the queue is full.
                    if self.queue.send(response).is_err() {
                        debug!(session = self.session, "response queue closed");
                        return;
                    }
                    self.counters.delivered();
                }
                Err(FrameError::FrameTooLong { len, max }) => {
                    self.counters.dropped();
                    warn!(len, max, "discarding oversized frame");
                }
                Err(err) if is_timeout(&err) => continue,
                Err(FrameError::ConnectionClosed) => {
                    debug!(session = self.session, "router closed connection");
                    self.link.mark_disconnected(self.session);
                    return;
                }
                Err(err) => {
                    if !self.stop.load(Ordering::Acquire) {
                        warn!(session = self.session, error = %err, "receiver read failed");
                    }
                    self.link.mark_disconnected(self.session);
                    return;
                }
            }
        }
    }
}

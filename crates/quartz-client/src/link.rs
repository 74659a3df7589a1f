//! Shared connection handle.
//!
//! The caller thread and the receiver thread both change connection state, so
//! every transition goes through [`Link`]. Each connect opens a new session;
//! a transition tagged with an older session is ignored, which keeps an
//! exiting receiver from tearing down a connection opened after it.

use std::io::Write;
use std::sync::{Mutex, MutexGuard};

use quartz_frame::{is_end_of_stream, Command, CommandWriter, FrameError};
use quartz_transport::RouterStream;
use serde::Serialize;
use tracing::debug;

use crate::error::{ClientError, Result};

/// Whether a client currently holds an open connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

#[derive(Debug, Default)]
struct LinkState {
    session: u64,
    connected: bool,
    // Kept only to shut the socket down from either side.
    control: Option<RouterStream>,
}

struct SessionWriter<W> {
    session: u64,
    writer: CommandWriter<W>,
}

/// Mutex-guarded connection state shared by the client and its receiver.
///
/// The writer has its own lock so a blocked write never holds up a state
/// transition. Lock order is writer, then state.
pub struct Link<W = RouterStream> {
    state: Mutex<LinkState>,
    writer: Mutex<Option<SessionWriter<W>>>,
}

impl<W> Default for Link<W> {
    fn default() -> Self {
        Self {
            state: Mutex::default(),
            writer: Mutex::new(None),
        }
    }
}

impl<W: Write> Link<W> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        if self.lock_state().connected {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Current session number. Zero until the first connect.
    pub fn session(&self) -> u64 {
        self.lock_state().session
    }

    /// Install a freshly connected socket and open a new session.
    pub(crate) fn attach(
        &self,
        writer: CommandWriter<W>,
        control: RouterStream,
    ) -> Result<u64> {
        let mut writer_slot = self.lock_writer();
        let mut state = self.lock_state();
        if state.connected {
            return Err(ClientError::AlreadyConnected);
        }
        state.session += 1;
        state.connected = true;
        state.control = Some(control);
        *writer_slot = Some(SessionWriter {
            session: state.session,
            writer,
        });
        Ok(state.session)
    }

    /// Close the current session, whichever it is.
    ///
    /// Returns false when there was nothing to close.
    pub(crate) fn close(&self) -> bool {
        let session = {
            let state = self.lock_state();
            if !state.connected {
                return false;
            }
            state.session
        };
        self.mark_disconnected(session)
    }

    /// Close `session` if it is still the current one.
    ///
    /// The socket is shut down before the writer is released so a write
    /// blocked on it returns. Returns whether anything changed.
    pub(crate) fn mark_disconnected(&self, session: u64) -> bool {
        if !self.shutdown_session(session) {
            return false;
        }
        let mut writer_slot = self.lock_writer();
        if writer_slot.as_ref().is_some_and(|w| w.session == session) {
            *writer_slot = None;
        }
        true
    }

    /// Validate and write one command on the current session.
    ///
    /// End-of-stream while writing closes the session and counts as success.
    pub(crate) fn write(&self, command: &Command) -> Result<()> {
        let mut writer_slot = self.lock_writer();
        let Some(current) = writer_slot.as_mut() else {
            return Err(ClientError::NotConnected);
        };

        match current.writer.send(command) {
            Ok(()) => Ok(()),
            Err(FrameError::Command(err)) => Err(ClientError::Command(err)),
            Err(err) if is_end_of_stream(&err) => {
                let session = current.session;
                debug!(session, command = command.name(), "router closed connection during write");
                *writer_slot = None;
                self.shutdown_session(session);
                Ok(())
            }
            Err(err) => Err(ClientError::Frame(err)),
        }
    }

    fn shutdown_session(&self, session: u64) -> bool {
        let control = {
            let mut state = self.lock_state();
            if !state.connected || state.session != session {
                return false;
            }
            state.connected = false;
            state.control.take()
        };
        if let Some(stream) = control {
            // NotConnected here means the peer already closed; nothing to do.
            let _ = stream.shutdown();
        }
        debug!(session, "link closed");
        true
    }

    fn lock_state(&self) -> MutexGuard<'_, LinkState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_writer(&self) -> MutexGuard<'_, Option<SessionWriter<W>>> {
        self.writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W> std::fmt::Debug for Link<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f.debug_struct("Link")
            .field("session", &state.session)
            .field("connected", &state.connected)
            .finish()
    }
}

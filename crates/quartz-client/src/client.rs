use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver as QueueReceiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use quartz_frame::{
    Command, CommandWriter, DeviceMode, FrameReader, Level, LevelSet, Response, Timecode,
};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::link::{ConnectionState, Link};
use crate::receiver::{Receiver, ReceiverCounters, ReceiverStats};

struct Session {
    queue: QueueReceiver<Response>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

/// A connection to one router.
///
/// Commands are written synchronously on the caller's thread. Everything the
/// router sends is decoded on a background thread and queued in arrival
/// order; the queue is bounded, so callers must keep draining it or
/// reception stalls.
pub struct QuartzClient {
    config: ClientConfig,
    link: Arc<Link>,
    counters: Arc<ReceiverCounters>,
    session: Option<Session>,
    backlog: VecDeque<Response>,
}

impl QuartzClient {
    pub fn new(address: impl Into<String>, port: u16, restricted: bool) -> Self {
        Self::with_config(ClientConfig::new(address, port).with_restricted(restricted))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            config,
            link: Arc::new(Link::new()),
            counters: Arc::new(ReceiverCounters::default()),
            session: None,
            backlog: VecDeque::new(),
        }
    }

    /// Open the connection and start the receiver.
    pub fn connect(&mut self) -> Result<()> {
        if self.link.is_connected() {
            return Err(ClientError::AlreadyConnected);
        }
        // A previous session may have ended on its own.
        self.retire_session();

        let stream = quartz_transport::connect_with_timeout(
            &self.config.address,
            self.config.port,
            self.config.connect_timeout,
        )?;
        let control = stream.try_clone()?;
        let read_half = stream.try_clone()?;

        let reader = FrameReader::with_config_router(read_half, self.config.reader_frame_config())?;
        let writer = CommandWriter::with_config_router(
            stream,
            self.config.mode,
            self.config.writer_frame_config(),
        )?;

        let session = self.link.attach(writer, control)?;
        let (tx, rx) = mpsc::sync_channel(self.config.queue_capacity.max(1));
        let stop = Arc::new(AtomicBool::new(false));

        let spawned = Receiver {
            reader,
            queue: tx,
            link: Arc::clone(&self.link),
            session,
            stop: Arc::clone(&stop),
            counters: Arc::clone(&self.counters),
        }
        .spawn();

        let handle = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                self.link.mark_disconnected(session);
                return Err(ClientError::Spawn(err));
            }
        };

        self.session = Some(Session {
            queue: rx,
            stop,
            handle: Some(handle),
        });
        info!(
            address = %self.config.address,
            port = self.config.port,
            session,
            "connected to router"
        );
        Ok(())
    }

    /// Close the connection and stop the receiver.
    ///
    /// Responses already queued stay available through the `recv` family.
    /// Calling this while disconnected does nothing.
    pub fn disconnect(&mut self) -> Result<()> {
        if self.link.close() {
            debug!(address = %self.config.address, "disconnected from router");
        }
        self.retire_session();
        Ok(())
    }

    /// Stop and join the receiver, keeping whatever it had queued.
    fn retire_session(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        session.stop.store(true, Ordering::Release);
        // The socket is already shut down, so the receiver's next read ends
        // and it drops the sender; until then keep draining in case it is
        // blocked on a full queue.
        self.backlog.extend(session.queue.iter());
        if let Some(handle) = session.handle.take() {
            if handle.join().is_err() {
                warn!("receiver thread panicked");
            }
        }
    }

    /// Validate and send any command.
    pub fn send(&self, command: &Command) -> Result<()> {
        self.link.write(command)
    }

    pub fn set_crosspoint(
        &self,
        levels: impl Into<LevelSet>,
        destination: u32,
        source: u32,
    ) -> Result<()> {
        self.send(&Command::SetCrosspoint {
            levels: levels.into(),
            destination,
            source,
        })
    }

    pub fn lock_destination(&self, destination: u32) -> Result<()> {
        self.send(&Command::LockDestination(destination))
    }

    pub fn unlock_destination(&self, destination: u32) -> Result<()> {
        self.send(&Command::UnlockDestination(destination))
    }

    pub fn query_destination_lock(&self, destination: u32) -> Result<()> {
        self.send(&Command::QueryDestinationLock(destination))
    }

    pub fn fire_system_salvo(&self, salvo: u32) -> Result<()> {
        self.send(&Command::FireSystemSalvo(salvo))
    }

    pub fn get_route(&self, level: Level, destination: u32) -> Result<()> {
        self.send(&Command::GetRoute { level, destination })
    }

    pub fn read_destination_name(&self, destination: u32) -> Result<()> {
        self.send(&Command::ReadDestinationName(destination))
    }

    pub fn read_source_name(&self, source: u32) -> Result<()> {
        self.send(&Command::ReadSourceName(source))
    }

    pub fn read_level_name(&self, level: Level) -> Result<()> {
        self.send(&Command::ReadLevelName(level))
    }

    pub fn read_destination_button_name(&self, destination: u32) -> Result<()> {
        self.send(&Command::ReadDestinationButtonName(destination))
    }

    pub fn read_source_button_name(&self, source: u32) -> Result<()> {
        self.send(&Command::ReadSourceButtonName(source))
    }

    pub fn read_level_button_name(&self, level: Level) -> Result<()> {
        self.send(&Command::ReadLevelButtonName(level))
    }

    pub fn write_destination_name(&self, destination: u32, name: &str) -> Result<()> {
        self.send(&Command::WriteDestinationName {
            destination,
            name: name.to_string(),
        })
    }

    pub fn write_source_name(&self, source: u32, name: &str) -> Result<()> {
        self.send(&Command::WriteSourceName {
            source,
            name: name.to_string(),
        })
    }

    pub fn write_level_name(&self, level: Level, name: &str) -> Result<()> {
        self.send(&Command::WriteLevelName {
            level,
            name: name.to_string(),
        })
    }

    pub fn write_destination_button_name(&self, destination: u32, name: &str) -> Result<()> {
        self.send(&Command::WriteDestinationButtonName {
            destination,
            name: name.to_string(),
        })
    }

    pub fn write_source_button_name(&self, source: u32, name: &str) -> Result<()> {
        self.send(&Command::WriteSourceButtonName {
            source,
            name: name.to_string(),
        })
    }

    pub fn write_level_button_name(&self, level: Level, name: &str) -> Result<()> {
        self.send(&Command::WriteLevelButtonName {
            level,
            name: name.to_string(),
        })
    }

    pub fn salvo_select(&self, salvo: u32) -> Result<()> {
        self.send(&Command::SalvoSelect(salvo))
    }

    pub fn salvo_empty(&self, salvo: u32) -> Result<()> {
        self.send(&Command::SalvoEmpty(salvo))
    }

    pub fn salvo_add_crosspoint(
        &self,
        levels: impl Into<LevelSet>,
        destination: u32,
        source: u32,
    ) -> Result<()> {
        self.send(&Command::SalvoAddCrosspoint {
            levels: levels.into(),
            destination,
            source,
        })
    }

    pub fn salvo_fire(&self, salvo: u32) -> Result<()> {
        self.send(&Command::SalvoFireNow(salvo))
    }

    pub fn salvo_fire_at(&self, salvo: u32, time: Timecode) -> Result<()> {
        self.send(&Command::SalvoFireAt { salvo, time })
    }

    pub fn salvo_delete(&self, salvo: u32) -> Result<()> {
        self.send(&Command::SalvoDelete(salvo))
    }

    pub fn salvo_list_count(&self, salvo: u32) -> Result<()> {
        self.send(&Command::SalvoListCount(salvo))
    }

    pub fn send_ping(&self) -> Result<()> {
        self.send(&Command::Ping)
    }

    /// Next response, blocking until one arrives.
    ///
    /// Fails with `Disconnected` once the connection has ended and everything
    /// it delivered has been consumed.
    pub fn recv(&mut self) -> Result<Response> {
        if let Some(response) = self.backlog.pop_front() {
            return Ok(response);
        }
        match &self.session {
            Some(session) => session.queue.recv().map_err(|_| ClientError::Disconnected),
            None => Err(ClientError::NotConnected),
        }
    }

    /// Next response, waiting at most `timeout`.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Result<Response> {
        if let Some(response) = self.backlog.pop_front() {
            return Ok(response);
        }
        match &self.session {
            Some(session) => session.queue.recv_timeout(timeout).map_err(|err| match err {
                RecvTimeoutError::Timeout => ClientError::Timeout(timeout),
                RecvTimeoutError::Disconnected => ClientError::Disconnected,
            }),
            None => Err(ClientError::NotConnected),
        }
    }

    /// Next response if one is ready.
    pub fn try_recv(&mut self) -> Option<Response> {
        if let Some(response) = self.backlog.pop_front() {
            return Some(response);
        }
        match self.session.as_ref()?.queue.try_recv() {
            Ok(response) => Some(response),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Every response ready right now, oldest first.
    pub fn drain(&mut self) -> Vec<Response> {
        let mut out: Vec<Response> = self.backlog.drain(..).collect();
        if let Some(session) = &self.session {
            out.extend(session.queue.try_iter());
        }
        out
    }

    pub fn state(&self) -> ConnectionState {
        self.link.state()
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    pub fn mode(&self) -> DeviceMode {
        self.config.mode
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Receiver counters, accumulated over every session of this client.
    pub fn stats(&self) -> ReceiverStats {
        self.counters.snapshot()
    }
}

impl Drop for QuartzClient {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}

impl std::fmt::Debug for QuartzClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuartzClient")
            .field("address", &self.config.address)
            .field("port", &self.config.port)
            .field("mode", &self.config.mode)
            .field("state", &self.state())
            .finish()
    }
}

use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use quartz_transport::RouterStream;

use crate::codec::FrameConfig;
use crate::command::{Command, DeviceMode};
use crate::error::{FrameError, Result};
use crate::reader::transport_to_frame_error;

const INITIAL_BUFFER_CAPACITY: usize = 64;

/// Validates commands and writes their wire form to any `Write` stream.
pub struct CommandWriter<T> {
    inner: T,
    buf: BytesMut,
    mode: DeviceMode,
    config: FrameConfig,
}

impl<T: Write> CommandWriter<T> {
    /// Create a new command writer for a standard device.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, DeviceMode::Standard, FrameConfig::default())
    }

    /// Create a new command writer with explicit mode and configuration.
    pub fn with_config(inner: T, mode: DeviceMode, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            mode,
            config,
        }
    }

    /// Validate and send one command (blocking).
    ///
    /// Nothing is written if validation fails. A write that makes no progress
    /// returns `Err(FrameError::ConnectionClosed)`.
    pub fn send(&mut self, command: &Command) -> Result<()> {
        self.buf.clear();
        command.encode(self.mode, &mut self.buf)?;
        tracing::trace!(command = command.name(), "writing command");

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Device mode commands are validated against.
    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current command writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl CommandWriter<RouterStream> {
    /// Create a command writer for `RouterStream` and apply write timeout from config.
    pub fn with_config_router(
        inner: RouterStream,
        mode: DeviceMode,
        config: FrameConfig,
    ) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, mode, config))
    }
}

/// Whether `err` means the peer is gone rather than the write failing.
pub fn is_end_of_stream(err: &FrameError) -> bool {
    match err {
        FrameError::ConnectionClosed => true,
        FrameError::Io(io) => matches!(io.kind(), ErrorKind::WriteZero | ErrorKind::UnexpectedEof),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::error::CommandError;
    use crate::level::LevelSet;

    fn written(writer: CommandWriter<Cursor<Vec<u8>>>) -> Vec<u8> {
        writer.into_inner().into_inner()
    }

    #[test]
    fn write_single_command() {
        let mut writer = CommandWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(&Command::LockDestination(4)).unwrap();
        assert_eq!(written(writer), b".BL4\r");
    }

    #[test]
    fn write_multiple_commands() {
        let mut writer = CommandWriter::new(Cursor::new(Vec::<u8>::new()));

        writer
            .send(&Command::SetCrosspoint {
                levels: LevelSet::from("AV"),
                destination: 1,
                source: 2,
            })
            .unwrap();
        writer.send(&Command::QueryDestinationLock(1)).unwrap();
        writer.send(&Command::Ping).unwrap();

        assert_eq!(written(writer), b".SVA1,2\r.BI1\r.#01\r");
    }

    #[test]
    fn invalid_command_writes_nothing() {
        let mut writer = CommandWriter::new(Cursor::new(Vec::<u8>::new()));
        let err = writer
            .send(&Command::WriteDestinationName {
                destination: 1,
                name: "NINECHARS".to_string(),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            FrameError::Command(CommandError::NameTooLong { len: 9, max: 8 })
        ));
        assert!(written(writer).is_empty());
    }

    #[test]
    fn restricted_writer_rejects_salvo() {
        let mut writer = CommandWriter::with_config(
            Cursor::new(Vec::<u8>::new()),
            DeviceMode::Restricted,
            FrameConfig::default(),
        );
        assert_eq!(writer.mode(), DeviceMode::Restricted);
        let err = writer.send(&Command::SalvoFireNow(3)).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Command(CommandError::Unsupported { .. })
        ));

        writer.send(&Command::FireSystemSalvo(3)).unwrap();
        assert_eq!(written(writer), b".F3\r");
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = CommandWriter::new(sink);

        writer.send(&Command::Ping).unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut writer = CommandWriter::new(cursor);

        let _ = writer.get_ref();
        let _ = writer.get_mut();
        assert_eq!(writer.config().max_frame_len, 1024);
        let _inner = writer.into_inner();
    }

    #[test]
    fn handles_interrupted_write_and_flush() {
        let writer_impl = InterruptedWriteThenFlush {
            wrote_once: false,
            flush_interrupted: false,
            data: Vec::new(),
        };

        let mut writer = CommandWriter::new(writer_impl);
        writer.send(&Command::UnlockDestination(9)).unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.data, b".BU9\r");
    }

    #[test]
    fn would_block_write_surfaces_as_io_error() {
        let mut writer = CommandWriter::new(WouldBlockWriter);
        let err = writer.send(&Command::Ping).unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock));
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = CommandWriter::new(ZeroWriter);
        let err = writer.send(&Command::Ping).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
        assert!(is_end_of_stream(&err));
    }

    #[test]
    fn end_of_stream_classification() {
        assert!(is_end_of_stream(&FrameError::Io(std::io::Error::from(
            ErrorKind::WriteZero
        ))));
        assert!(is_end_of_stream(&FrameError::Io(std::io::Error::from(
            ErrorKind::UnexpectedEof
        ))));
        assert!(!is_end_of_stream(&FrameError::Io(std::io::Error::from(
            ErrorKind::BrokenPipe
        ))));
        assert!(!is_end_of_stream(&FrameError::FrameTooLong { len: 2, max: 1 }));
    }

    #[test]
    fn applies_write_timeout_for_router_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let stream = quartz_transport::connect("127.0.0.1", port).unwrap();
        let (_server, _) = listener.accept().unwrap();

        let cfg = FrameConfig {
            write_timeout: Some(std::time::Duration::from_millis(10)),
            ..FrameConfig::default()
        };

        let writer = CommandWriter::with_config_router(stream, DeviceMode::Standard, cfg);
        assert!(writer.is_ok());
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct InterruptedWriteThenFlush {
        wrote_once: bool,
        flush_interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedWriteThenFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.wrote_once {
                self.wrote_once = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_interrupted {
                self.flush_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            Ok(())
        }
    }

    struct WouldBlockWriter;

    impl Write for WouldBlockWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::WouldBlock))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn written_bytes_read_back_as_frames() {
        let mut writer = CommandWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(&Command::ReadSourceName(3)).unwrap();

        let wire = written(writer);
        let mut framed = crate::reader::FrameReader::new(Cursor::new(wire));
        let frame = framed.read_frame().unwrap();
        assert_eq!(frame.as_bytes(), b".RS3\r");
    }
}

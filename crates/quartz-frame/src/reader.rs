use std::io::{ErrorKind, Read};

use quartz_transport::RouterStream;

use crate::codec::{Frame, FrameConfig, FrameExtractor};
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Bytes are accumulated until a terminator arrives; callers only ever see
/// complete frames. A partial frame survives read timeouts and is completed
/// by later reads.
pub struct FrameReader<T> {
    inner: T,
    extractor: FrameExtractor,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            extractor: FrameExtractor::with_max_frame_len(config.max_frame_len),
            config,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Buffered frames are returned before the stream is read again. Returns
    /// `Err(FrameError::ConnectionClosed)` at end-of-stream; an unfinished
    /// frame is dropped with it. `FrameTooLong` leaves the reader usable.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.extractor.next_frame()? {
                return Ok(frame);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.extractor.extend(&chunk[..read]);
        }
    }

    /// Bytes of an unfinished frame currently held.
    pub fn pending_len(&self) -> usize {
        self.extractor.pending_len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update the longest frame kept for subsequent reads.
    pub fn set_max_frame_len(&mut self, max_frame_len: usize) {
        self.config.max_frame_len = max_frame_len;
        self.extractor.set_max_frame_len(max_frame_len);
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<RouterStream> {
    /// Create a frame reader for `RouterStream` and apply read timeout from config.
    pub fn with_config_router(inner: RouterStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: quartz_transport::TransportError) -> FrameError {
    match err {
        quartz_transport::TransportError::Io(io) => FrameError::Io(io),
        quartz_transport::TransportError::Resolve { source, .. }
        | quartz_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}

/// Whether `err` is a read timeout rather than a failure.
pub fn is_timeout(err: &FrameError) -> bool {
    matches!(
        err,
        FrameError::Io(io) if matches!(io.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
    )
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::net::TcpListener;
    use std::time::Duration;

    use super::*;

    fn text(frame: &Frame) -> String {
        frame.text().into_owned()
    }

    #[test]
    fn read_single_frame() {
        let mut reader = FrameReader::new(Cursor::new(b".A\r".to_vec()));
        let frame = reader.read_frame().unwrap();
        assert_eq!(text(&frame), ".A\r");
    }

    #[test]
    fn read_multiple_frames() {
        let mut reader = FrameReader::new(Cursor::new(b".A\r.UV1,2\r.P\r".to_vec()));

        let f1 = reader.read_frame().unwrap();
        let f2 = reader.read_frame().unwrap();
        let f3 = reader.read_frame().unwrap();

        assert_eq!(text(&f1), ".A\r");
        assert_eq!(text(&f2), ".UV1,2\r");
        assert_eq!(text(&f3), ".P\r");
    }

    #[test]
    fn partial_read_handling() {
        let byte_reader = ByteByByteReader {
            bytes: b"\n.RAD12,CAMERA1\r".to_vec(),
            pos: 0,
        };
        let mut reader = FrameReader::new(byte_reader);

        let frame = reader.read_frame().unwrap();
        assert_eq!(text(&frame), ".RAD12,CAMERA1\r");
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_frame() {
        let mut reader = FrameReader::new(Cursor::new(b".UV1,".to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn oversized_frame_reported_then_reader_recovers() {
        let cfg = FrameConfig {
            max_frame_len: 8,
            ..FrameConfig::default()
        };
        let mut reader =
            FrameReader::with_config(Cursor::new(b".UV1000,2000\r.A\r".to_vec()), cfg);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLong { max: 8, .. }));

        let frame = reader.read_frame().unwrap();
        assert_eq!(text(&frame), ".A\r");
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[test]
    fn oversized_frame_tail_is_not_reframed() {
        let cfg = FrameConfig {
            max_frame_len: 8,
            ..FrameConfig::default()
        };
        let byte_reader = ByteByByteReader {
            bytes: b".RAD12,CAMERA.A\r.P\r".to_vec(),
            pos: 0,
        };
        let mut reader = FrameReader::with_config(byte_reader, cfg);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLong { len: 9, max: 8 }));

        let frame = reader.read_frame().unwrap();
        assert_eq!(text(&frame), ".P\r");
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut reader = FrameReader::new(cursor);

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        assert_eq!(reader.pending_len(), 0);
        let _inner = reader.into_inner();
    }

    #[test]
    fn read_would_block_propagates_io_error() {
        let reader = WouldBlockThenData {
            state: 0,
            bytes: b".A\r".to_vec(),
            pos: 0,
        };
        let mut framed = FrameReader::new(reader);
        let err = framed.read_frame().unwrap_err();
        assert!(is_timeout(&err));
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock));

        let frame = framed.read_frame().unwrap();
        assert_eq!(text(&frame), ".A\r");
    }

    struct WouldBlockThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for WouldBlockThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::WouldBlock));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let remaining = self.bytes.len() - self.pos;
            let n = remaining.min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            state: 0,
            bytes: b".E\r".to_vec(),
            pos: 0,
        };
        let mut framed = FrameReader::new(reader);
        let frame = framed.read_frame().unwrap();
        assert_eq!(text(&frame), ".E\r");
    }

    struct InterruptedThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let remaining = self.bytes.len() - self.pos;
            let n = remaining.min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn partial_frame_survives_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let stream = quartz_transport::connect("127.0.0.1", port).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        let cfg = FrameConfig {
            read_timeout: Some(Duration::from_millis(30)),
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config_router(stream, cfg).unwrap();

        use std::io::Write;
        server.write_all(b".BA5,").unwrap();
        let err = reader.read_frame().unwrap_err();
        assert!(is_timeout(&err), "unexpected error: {err}");
        assert_eq!(reader.pending_len(), 5);

        server.write_all(b"0\r").unwrap();
        let frame = reader.read_frame().unwrap();
        assert_eq!(text(&frame), ".BA5,0\r");
    }

    #[test]
    fn reads_over_tcp_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let stream = quartz_transport::connect("127.0.0.1", port).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        let writer = std::thread::spawn(move || {
            use std::io::Write;
            for i in 0..32u32 {
                server.write_all(format!(".UV{i},{}\r", i + 1).as_bytes()).unwrap();
            }
        });

        let mut reader = FrameReader::new(stream);
        for i in 0..32u32 {
            let frame = reader.read_frame().unwrap();
            assert_eq!(text(&frame), format!(".UV{i},{}\r", i + 1));
        }
        writer.join().unwrap();
    }
}

//! `tokio_util::codec` adapter for use with `Framed` transports.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{extract_frame, ScanState, DEFAULT_MAX_FRAME_LEN};
use crate::command::{Command, DeviceMode};
use crate::error::{FrameError, Result};
use crate::response::Response;

/// Decodes router responses and encodes commands over an async byte stream.
///
/// Frames that fail to decode and frames longer than the configured maximum
/// are skipped and counted in [`dropped`](Self::dropped).
#[derive(Debug)]
pub struct QuartzCodec {
    scan: ScanState,
    mode: DeviceMode,
    max_frame_len: usize,
    dropped: u64,
}

impl QuartzCodec {
    pub fn new(mode: DeviceMode) -> Self {
        Self::with_max_frame_len(mode, DEFAULT_MAX_FRAME_LEN)
    }

    pub fn with_max_frame_len(mode: DeviceMode, max_frame_len: usize) -> Self {
        Self {
            scan: ScanState::new(),
            mode,
            max_frame_len,
            dropped: 0,
        }
    }

    /// Frames skipped so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn mode(&self) -> DeviceMode {
        self.mode
    }
}

impl Default for QuartzCodec {
    fn default() -> Self {
        Self::new(DeviceMode::Standard)
    }
}

impl Decoder for QuartzCodec {
    type Item = Response;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Response>> {
        loop {
            let frame = match extract_frame(src, &mut self.scan, self.max_frame_len) {
                Ok(Some(frame)) => frame,
                Ok(None) => return Ok(None),
                Err(FrameError::FrameTooLong { len, max }) => {
                    self.dropped += 1;
                    tracing::warn!(len, max, "discarding oversized frame");
                    continue;
                }
                Err(err) => return Err(err),
            };

            match Response::decode_frame(&frame) {
                Ok(response) => return Ok(Some(response)),
                Err(err) => {
                    self.dropped += 1;
                    tracing::debug!(frame = %frame.text().escape_debug(), error = %err, "dropping undecodable frame");
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Response>> {
        match self.decode(src)? {
            Some(response) => Ok(Some(response)),
            None => {
                // An unterminated frame at end-of-stream is never emitted.
                src.clear();
                self.scan = ScanState::new();
                Ok(None)
            }
        }
    }
}

impl Encoder<&Command> for QuartzCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &Command, dst: &mut BytesMut) -> Result<()> {
        item.encode(self.mode, dst)?;
        Ok(())
    }
}

impl Encoder<Command> for QuartzCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<()> {
        <Self as Encoder<&Command>>::encode(self, &item, dst)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::error::CommandError;
    use crate::response::ResponseKind;

    #[tokio::test]
    async fn decodes_stream_in_order() {
        let wire: &[u8] = b"junk.A\r.UV3,4\r.RDabc,\r.BA7,0\r.E\r";
        let mut framed = FramedRead::new(wire, QuartzCodec::default());

        let mut kinds = Vec::new();
        while let Some(item) = framed.next().await {
            kinds.push(item.unwrap().kind());
        }

        assert_eq!(
            kinds,
            vec![
                ResponseKind::Acknowledge,
                ResponseKind::Update,
                ResponseKind::LockStatus,
                ResponseKind::Error,
            ]
        );
        assert_eq!(framed.decoder().dropped(), 1);
    }

    #[tokio::test]
    async fn trailing_partial_frame_is_not_emitted() {
        let wire: &[u8] = b".P\r.UV1,";
        let mut framed = FramedRead::new(wire, QuartzCodec::default());

        let first = framed.next().await.unwrap().unwrap();
        assert_eq!(first.kind(), ResponseKind::PowerOn);
        assert!(framed.next().await.is_none());
    }

    #[tokio::test]
    async fn oversized_frames_are_skipped() {
        let wire: &[u8] = b".UV1000000,2000000\r.A\r";
        let mut framed = FramedRead::new(wire, QuartzCodec::with_max_frame_len(DeviceMode::Standard, 8));

        let first = framed.next().await.unwrap().unwrap();
        assert_eq!(first.kind(), ResponseKind::Acknowledge);
        assert_eq!(framed.decoder().dropped(), 1);
    }

    #[tokio::test]
    async fn encodes_commands() {
        let mut framed = FramedWrite::new(Vec::new(), QuartzCodec::default());
        framed.send(Command::LockDestination(2)).await.unwrap();
        framed.send(&Command::Ping).await.unwrap();
        assert_eq!(framed.get_ref().as_slice(), b".BL2\r.#01\r");
    }

    #[tokio::test]
    async fn restricted_encoder_rejects_unsupported() {
        let mut framed = FramedWrite::new(Vec::new(), QuartzCodec::new(DeviceMode::Restricted));
        let err = framed.send(Command::SalvoDelete(1)).await.unwrap_err();
        assert!(matches!(
            err,
            FrameError::Command(CommandError::Unsupported { .. })
        ));
        assert!(framed.get_ref().is_empty());
    }
}

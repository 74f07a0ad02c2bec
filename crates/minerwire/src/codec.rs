use {
    super::*,
    bytes::{Buf, BytesMut},
    tokio_util::codec::{Decoder, Encoder},
};

const LENGTH_SIZE: usize = 4;

/// `tokio_util` codec for [`Frame`]s.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_size: usize,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self {
            max_size: MAX_FRAME_SIZE,
        }
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self { max_size }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        if src.len() < LENGTH_SIZE {
            return Ok(None);
        }

        let len = BigEndian::read_u32(&src[..LENGTH_SIZE]) as usize;

        ensure!(
            len <= self.max_size,
            FrameTooLargeSnafu {
                len,
                max: self.max_size,
            }
        );

        ensure!(
            len >= 1,
            TruncatedSnafu {
                what: "frame",
                expected: 1usize,
                actual: len,
            }
        );

        if src.len() < LENGTH_SIZE + len {
            src.reserve(LENGTH_SIZE + len - src.len());
            return Ok(None);
        }

        src.advance(LENGTH_SIZE);
        let kind = MessageKind::try_from(src.get_u8())?;
        let payload = src.split_to(len - 1).to_vec();

        Ok(Some(Frame { kind, payload }))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result {
        let len = 1 + frame.payload.len();

        ensure!(
            len <= self.max_size,
            FrameTooLargeSnafu {
                len,
                max: self.max_size,
            }
        );

        dst.extend_from_slice(&frame.to_bytes());

        Ok(())
    }
}

use super::*;

/// Payload of the stop-mining notice. The literal is distinct from every other frame payload.
pub const STOP_MINING: &[u8] = b"end_current_mining";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[repr(u8)]
pub enum MessageKind {
    Job = 1,
    Report = 2,
    StopMining = 3,
    Register = 4,
}

impl TryFrom<u8> for MessageKind {
    type Error = Error;

    fn try_from(kind: u8) -> Result<Self> {
        match kind {
            1 => Ok(Self::Job),
            2 => Ok(Self::Report),
            3 => Ok(Self::StopMining),
            4 => Ok(Self::Register),
            kind => UnknownKindSnafu { kind }.fail(),
        }
    }
}

/// One length-delimited unit on the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: MessageKind,
    pub payload: Vec<u8>,
}

impl Frame {
    pub const HEADER_SIZE: usize = 4 + 1;

    pub fn job(job: &JobMessage) -> Self {
        Self {
            kind: MessageKind::Job,
            payload: job.encode(),
        }
    }

    pub fn report(report: &ResultReport) -> Self {
        Self {
            kind: MessageKind::Report,
            payload: report.encode(),
        }
    }

    pub fn stop_mining() -> Self {
        Self {
            kind: MessageKind::StopMining,
            payload: STOP_MINING.to_vec(),
        }
    }

    pub fn register(address: &str) -> Self {
        Self {
            kind: MessageKind::Register,
            payload: address.as_bytes().to_vec(),
        }
    }

    pub fn is_stop_mining(&self) -> bool {
        self.kind == MessageKind::StopMining && self.payload == STOP_MINING
    }

    /// Full wire bytes: `u32 length | u8 kind | payload`, where length covers kind and payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0; Self::HEADER_SIZE];
        BigEndian::write_u32(&mut bytes[..4], (1 + self.payload.len()) as u32);
        bytes[4] = self.kind as u8;
        bytes.extend_from_slice(&self.payload);
        bytes
    }
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Job(JobMessage),
    Report(ResultReport),
    StopMining,
    Register(String),
}

impl TryFrom<Frame> for Message {
    type Error = Error;

    fn try_from(frame: Frame) -> Result<Self> {
        Ok(match frame.kind {
            MessageKind::Job => Self::Job(JobMessage::decode(&frame.payload)?),
            MessageKind::Report => Self::Report(ResultReport::decode(&frame.payload)?),
            MessageKind::StopMining => Self::StopMining,
            MessageKind::Register => {
                Self::Register(String::from_utf8(frame.payload).context(Utf8Snafu)?)
            }
        })
    }
}

use {
    byteorder::{BigEndian, ByteOrder},
    derive_more::Display,
    error::*,
    rand::RngCore,
    serde_with::{DeserializeFromStr, SerializeDisplay},
    snafu::{OptionExt, ResultExt, Snafu, ensure},
    std::{
        fmt::{self, Formatter},
        str::FromStr,
    },
};

pub use {
    error::{Error, Result},
    frame::{Frame, Message, MessageKind, STOP_MINING},
    height::Height,
    job::JobMessage,
    nonce::{CoinbaseNonce, HeadNonce},
    report::ResultReport,
    work_unit::WorkUnit,
};

#[cfg(feature = "codec")]
pub use codec::FrameCodec;

/// Upper bound on `kind + payload` for a single frame.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

#[cfg(feature = "codec")]
mod codec;
mod error;
mod frame;
mod height;
mod job;
mod nonce;
mod report;
mod work_unit;

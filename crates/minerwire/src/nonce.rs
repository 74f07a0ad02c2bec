use super::*;

/// Nonce field of the block header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct HeadNonce(u32);

impl HeadNonce {
    pub const SIZE: usize = 4;

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        self.0.to_be_bytes()
    }

    pub fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
        Self(u32::from_be_bytes(bytes))
    }
}

impl fmt::Display for HeadNonce {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl FromStr for HeadNonce {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self(
            u32::from_str_radix(s, 16).context(ParseIntSnafu { input: s })?,
        ))
    }
}

impl From<u32> for HeadNonce {
    fn from(n: u32) -> Self {
        Self(n)
    }
}

impl From<HeadNonce> for u32 {
    fn from(n: HeadNonce) -> u32 {
        n.0
    }
}

/// Worker-chosen nonce carried in the coinbase. Randomizing it gives every attempt a fresh
/// merkle root and therefore a fresh header nonce space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct CoinbaseNonce([u8; 32]);

impl CoinbaseNonce {
    pub const SIZE: usize = 32;

    pub fn random() -> Self {
        let mut bytes = [0; Self::SIZE];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; Self::SIZE] {
        &self.0
    }
}

impl From<[u8; 32]> for CoinbaseNonce {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for CoinbaseNonce {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for CoinbaseNonce {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut bytes = [0; Self::SIZE];
        hex::decode_to_slice(s, &mut bytes).context(HexSnafu)?;
        Ok(Self(bytes))
    }
}

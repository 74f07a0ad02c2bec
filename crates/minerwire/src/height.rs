use super::*;

/// Block height as carried on the wire: a 5-byte big-endian unsigned integer.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    DeserializeFromStr,
    SerializeDisplay,
)]
pub struct Height(u64);

impl Height {
    pub const SIZE: usize = 5;
    pub const MAX: Self = Self((1 << (8 * Self::SIZE)) - 1);

    pub fn new(height: u64) -> Result<Self> {
        ensure!(height <= Self::MAX.0, HeightOverflowSnafu { height });
        Ok(Self(height))
    }

    /// Reads the height from the first five bytes of `bytes`. Trailing bytes are ignored.
    pub fn from_prefix(bytes: &[u8]) -> Result<Self> {
        let prefix = bytes.get(..Self::SIZE).context(TruncatedSnafu {
            what: "height",
            expected: Self::SIZE,
            actual: bytes.len(),
        })?;

        Ok(Self(BigEndian::read_uint(prefix, Self::SIZE)))
    }

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut bytes = [0; Self::SIZE];
        BigEndian::write_uint(&mut bytes, self.0, Self::SIZE);
        bytes
    }

    pub fn next(self) -> Result<Self> {
        Self::new(self.0 + 1)
    }
}

impl FromStr for Height {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let height = s.parse::<u64>().context(ParseIntSnafu { input: s })?;
        Self::new(height)
    }
}

impl TryFrom<u64> for Height {
    type Error = Error;

    fn try_from(height: u64) -> Result<Self> {
        Self::new(height)
    }
}

impl From<Height> for u64 {
    fn from(height: Height) -> u64 {
        height.0
    }
}

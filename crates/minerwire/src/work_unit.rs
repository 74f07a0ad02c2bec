use super::*;

/// Per-period job number written into the coinbase so that no two jobs share a nonce space.
///
/// Wraps to zero past `u32::MAX`. Uniqueness is only needed within the issuance volume of one
/// period, so the counter is deliberately not widened.
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
#[repr(transparent)]
pub struct WorkUnit(u32);

impl WorkUnit {
    pub const SIZE: usize = 4;

    pub fn new(n: u32) -> Self {
        Self(n)
    }

    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        self.0.to_be_bytes()
    }
}

impl FromStr for WorkUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self(s.parse().context(ParseIntSnafu { input: s })?))
    }
}

impl From<u32> for WorkUnit {
    fn from(n: u32) -> Self {
        Self(n)
    }
}

impl From<WorkUnit> for u32 {
    fn from(work_unit: WorkUnit) -> u32 {
        work_unit.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_wraps() {
        assert_eq!(WorkUnit::new(0).next(), WorkUnit::new(1));
        assert_eq!(WorkUnit::new(u32::MAX - 1).next(), WorkUnit::new(u32::MAX));
        assert_eq!(WorkUnit::new(u32::MAX).next(), WorkUnit::new(0));
    }

    #[test]
    fn bytes_are_big_endian() {
        assert_eq!(WorkUnit::new(0x0102_0304).to_bytes(), [1, 2, 3, 4]);
    }

    #[test]
    fn parse() {
        assert_eq!("17".parse::<WorkUnit>().unwrap(), WorkUnit::new(17));
        assert!("4294967296".parse::<WorkUnit>().is_err());
        assert!("x".parse::<WorkUnit>().is_err());
    }
}

use super::*;

/// Worker → pool: outcome of one mining attempt.
///
/// Failed attempts are reported too when the worker runs with hash-rate reporting enabled; the
/// pool credits the attempt's hash worth to the account either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultReport {
    pub success: bool,
    pub height: Height,
    pub head_nonce: HeadNonce,
    pub coinbase_nonce: CoinbaseNonce,
}

impl ResultReport {
    pub const SIZE: usize = 1 + Height::SIZE + HeadNonce::SIZE + CoinbaseNonce::SIZE;

    /// Offset of the height field, which doubles as the candidate height prefix.
    pub const HEIGHT_OFFSET: usize = 1;

    pub fn encode(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(Self::SIZE);
        payload.push(u8::from(self.success));
        payload.extend_from_slice(&self.height.to_bytes());
        payload.extend_from_slice(&self.head_nonce.to_bytes());
        payload.extend_from_slice(self.coinbase_nonce.as_bytes());
        payload
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        ensure!(
            payload.len() == Self::SIZE,
            TruncatedSnafu {
                what: "result report",
                expected: Self::SIZE,
                actual: payload.len(),
            }
        );

        let success = match payload[0] {
            0 => false,
            1 => true,
            byte => return InvalidFlagSnafu { byte }.fail(),
        };

        let height = Height::from_prefix(&payload[Self::HEIGHT_OFFSET..])?;

        let mut rest = &payload[Self::HEIGHT_OFFSET + Height::SIZE..];

        let mut head_nonce = [0; HeadNonce::SIZE];
        head_nonce.copy_from_slice(&rest[..HeadNonce::SIZE]);
        rest = &rest[HeadNonce::SIZE..];

        let mut coinbase_nonce = [0; CoinbaseNonce::SIZE];
        coinbase_nonce.copy_from_slice(rest);

        Ok(Self {
            success,
            height,
            head_nonce: HeadNonce::from_bytes(head_nonce),
            coinbase_nonce: CoinbaseNonce::from(coinbase_nonce),
        })
    }

    /// The bytes a pool feeds to its stale-height pre-check.
    pub fn candidate_height(payload: &[u8]) -> &[u8] {
        payload.get(Self::HEIGHT_OFFSET..).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq};

    fn report(success: bool) -> ResultReport {
        ResultReport {
            success,
            height: Height::new(1000).unwrap(),
            head_nonce: HeadNonce::from(0xdead_beef),
            coinbase_nonce: CoinbaseNonce::from([7; 32]),
        }
    }

    #[test]
    fn layout() {
        let bytes = report(true).encode();

        assert_eq!(bytes.len(), 42);
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..6], &[0, 0, 0, 0x03, 0xe8]);
        assert_eq!(&bytes[6..10], &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(&bytes[10..], &[7; 32]);

        assert_eq!(ResultReport::decode(&bytes).unwrap(), report(true));
        assert_eq!(
            ResultReport::decode(&report(false).encode()).unwrap(),
            report(false)
        );
    }

    #[test]
    fn candidate_height_skips_success_flag() {
        let bytes = report(false).encode();
        assert_eq!(
            Height::from_prefix(ResultReport::candidate_height(&bytes)).unwrap(),
            Height::new(1000).unwrap()
        );
        assert!(ResultReport::candidate_height(&[]).is_empty());
    }

    #[test]
    fn rejects_bad_flag() {
        let mut bytes = report(true).encode();
        bytes[0] = 2;
        assert_eq!(
            ResultReport::decode(&bytes).unwrap_err().to_string(),
            "invalid success flag 0x02"
        );
    }

    #[test]
    fn rejects_wrong_length() {
        let bytes = report(true).encode();
        assert!(ResultReport::decode(&bytes[..41]).is_err());
        assert!(ResultReport::decode(&[bytes.as_slice(), &[0]].concat()).is_err());
    }
}

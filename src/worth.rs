use super::*;

/// Hash worth and its per-account sums. The widest single worth is `2^256`.
pub type Worth = U512;

static TWO_POW_256: LazyLock<Worth> = LazyLock::new(|| Worth::one() << 256_u32);

/// Expected number of hashes needed to find a digest at or below `digest`, `2^256 / (digest + 1)`.
///
/// Every leading zero bit doubles the worth.
pub fn hash_worth(digest: &Digest) -> Worth {
    *TWO_POW_256 / (Worth::from_big_endian(digest) + Worth::one())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leading_zero_bits(zeros: usize) -> Digest {
        let mut digest = [0xff; 32];
        for byte in digest.iter_mut().take(zeros / 8) {
            *byte = 0;
        }
        if zeros % 8 > 0 {
            digest[zeros / 8] = 0xff >> (zeros % 8);
        }
        digest
    }

    #[test]
    fn extremes() {
        assert_eq!(hash_worth(&[0xff; 32]), Worth::one());
        assert_eq!(hash_worth(&[0; 32]), Worth::one() << 256_u32);
    }

    #[test]
    fn each_leading_zero_bit_doubles_worth() {
        for zeros in 0..64 {
            assert_eq!(
                hash_worth(&leading_zero_bits(zeros)),
                Worth::one() << zeros,
                "{zeros} leading zero bits"
            );
        }
    }

    #[test]
    fn monotonic() {
        let mut previous = Worth::zero();
        for zeros in (0..=255).step_by(17) {
            let worth = hash_worth(&leading_zero_bits(zeros));
            assert!(worth > previous);
            previous = worth;
        }
    }

    #[test]
    fn decimal_display() {
        assert_eq!(hash_worth(&leading_zero_bits(10)).to_string(), "1024");
    }
}

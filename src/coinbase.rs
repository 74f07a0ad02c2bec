use super::*;

/// Builds the coinbase of a block template. The script sig carries the BIP34 height followed by a
/// fixed-width stamp (work unit, coinbase nonce) that is rewritten in place for every job and
/// every mining attempt.
#[derive(Clone)]
pub(crate) struct CoinbaseBuilder {
    height: Height,
    payout: ScriptBuf,
    pool_sig: Option<String>,
    value: Amount,
}

impl CoinbaseBuilder {
    pub(crate) const MAX_COINBASE_SCRIPT_SIG_SIZE: usize = 100;

    pub(crate) fn new(height: Height, payout: ScriptBuf, value: Amount) -> Self {
        Self {
            height,
            payout,
            pool_sig: None,
            value,
        }
    }

    pub(crate) fn with_pool_sig(mut self, pool_sig: String) -> Self {
        self.pool_sig = Some(pool_sig);
        self
    }

    pub(crate) fn build(self) -> Result<Transaction> {
        let mut buf: Vec<u8> = Vec::with_capacity(Self::MAX_COINBASE_SCRIPT_SIG_SIZE);

        // BIP34 encode block height
        let mut minimally_encoded_serialized_cscript = [0u8; 8];
        let len = write_scriptint(
            &mut minimally_encoded_serialized_cscript,
            i64::try_from(u64::from(self.height)).context("height out of range")?,
        );
        buf.push(len as u8);
        buf.extend_from_slice(&minimally_encoded_serialized_cscript[..len]);

        buf.extend_from_slice(&WorkUnit::default().to_bytes());
        buf.extend_from_slice(CoinbaseNonce::default().as_bytes());

        if let Some(sig) = self.pool_sig {
            buf.extend_from_slice(sig.as_bytes())
        }

        let script_sig = ScriptBuf::from_bytes(buf);
        let script_sig_size = script_sig.len();

        ensure!(
            script_sig_size <= Self::MAX_COINBASE_SCRIPT_SIG_SIZE,
            "Script sig too large is {script_sig_size} bytes (max {})",
            Self::MAX_COINBASE_SCRIPT_SIG_SIZE
        );

        Ok(Transaction {
            version: bitcoin::transaction::Version::TWO,
            lock_time: LockTime::ZERO,
            input: vec![TxIn {
                previous_output: OutPoint::null(),
                script_sig,
                sequence: Sequence::MAX,
                witness: Witness::new(),
            }],
            output: vec![TxOut {
                value: self.value,
                script_pubkey: self.payout,
            }],
        })
    }
}

/// Byte range of the stamp inside the coinbase script sig, if the script has room for one.
fn stamp_range(script_sig: &[u8]) -> Option<std::ops::Range<usize>> {
    let start = 1 + usize::from(*script_sig.first()?);
    let end = start + WorkUnit::SIZE + CoinbaseNonce::SIZE;
    (end <= script_sig.len()).then_some(start..end)
}

fn rewrite(coinbase: &mut Transaction, offset: usize, bytes: &[u8]) -> bool {
    let Some(input) = coinbase.input.first_mut() else {
        return false;
    };

    let mut script_sig = input.script_sig.to_bytes();

    let Some(range) = stamp_range(&script_sig) else {
        return false;
    };

    script_sig[range.start + offset..range.start + offset + bytes.len()].copy_from_slice(bytes);
    input.script_sig = ScriptBuf::from_bytes(script_sig);

    true
}

/// Writes `work_unit` and `nonce` into the coinbase stamp. Returns false if the coinbase was not
/// built by [`CoinbaseBuilder`].
pub(crate) fn stamp(coinbase: &mut Transaction, work_unit: WorkUnit, nonce: &CoinbaseNonce) -> bool {
    rewrite(coinbase, 0, &work_unit.to_bytes()) && stamp_nonce(coinbase, nonce)
}

pub(crate) fn stamp_nonce(coinbase: &mut Transaction, nonce: &CoinbaseNonce) -> bool {
    rewrite(coinbase, WorkUnit::SIZE, nonce.as_bytes())
}

pub(crate) fn read_stamp(coinbase: &Transaction) -> Option<(WorkUnit, CoinbaseNonce)> {
    let script_sig = coinbase.input.first()?.script_sig.as_bytes();
    let range = stamp_range(script_sig)?;
    let stamp = &script_sig[range];

    let work_unit = WorkUnit::new(BigEndian::read_u32(&stamp[..WorkUnit::SIZE]));

    let mut nonce = [0; CoinbaseNonce::SIZE];
    nonce.copy_from_slice(&stamp[WorkUnit::SIZE..]);

    Some((work_unit, CoinbaseNonce::from(nonce)))
}

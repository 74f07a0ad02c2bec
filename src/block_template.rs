use {
    super::*,
    coinbase::{CoinbaseBuilder, read_stamp, stamp, stamp_nonce},
    merkle::{merkle_branches, merkle_root},
};

pub const DEFAULT_POOL_SIG: &str = "|minerpool|";

/// A bitcoin block under construction. The coinbase carries a work unit / coinbase nonce stamp,
/// see [`CoinbaseBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub struct BlockTemplate {
    block: Block,
    height: Height,
    merkle_branches: Vec<TxMerkleNode>,
    payout: ScriptBuf,
    pool_sig: String,
    value: Amount,
}

pub struct BlockTemplateBuilder {
    bits: CompactTarget,
    height: Height,
    payout: ScriptBuf,
    pool_sig: String,
    prev_blockhash: BlockHash,
    time: Option<u32>,
    transactions: Vec<Transaction>,
    value: Amount,
}

impl BlockTemplateBuilder {
    pub fn payout(mut self, payout: ScriptBuf) -> Self {
        self.payout = payout;
        self
    }

    pub fn pool_sig(mut self, pool_sig: impl Into<String>) -> Self {
        self.pool_sig = pool_sig.into();
        self
    }

    pub fn time(mut self, time: u32) -> Self {
        self.time = Some(time);
        self
    }

    pub fn transactions(mut self, transactions: Vec<Transaction>) -> Self {
        self.transactions = transactions;
        self
    }

    pub fn value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }

    pub fn build(self) -> Result<BlockTemplate> {
        let coinbase = CoinbaseBuilder::new(self.height, self.payout.clone(), self.value)
            .with_pool_sig(self.pool_sig.clone())
            .build()?;

        let merkle_branches = merkle_branches(
            self.transactions
                .iter()
                .map(Transaction::compute_txid)
                .collect(),
        );

        let mut template = BlockTemplate {
            block: Block {
                header: Header {
                    version: block::Version::TWO,
                    prev_blockhash: self.prev_blockhash,
                    merkle_root: TxMerkleNode::all_zeros(),
                    time: self.time.unwrap_or_else(unix_time),
                    bits: self.bits,
                    nonce: 0,
                },
                txdata: iter::once(coinbase).chain(self.transactions).collect(),
            },
            height: self.height,
            merkle_branches,
            payout: self.payout,
            pool_sig: self.pool_sig,
            value: self.value,
        };

        template.update_merkle_root();

        Ok(template)
    }
}

impl BlockTemplate {
    pub fn builder(
        height: Height,
        prev_blockhash: BlockHash,
        bits: CompactTarget,
    ) -> BlockTemplateBuilder {
        BlockTemplateBuilder {
            bits,
            height,
            payout: ScriptBuf::new(),
            pool_sig: DEFAULT_POOL_SIG.into(),
            prev_blockhash,
            time: None,
            transactions: Vec::new(),
            value: Amount::from_sat(50 * COIN_VALUE),
        }
    }

    /// Empty template for the next height, mined on top of this block.
    pub fn successor(&self) -> Result<Self> {
        Self::builder(
            self.height.next()?,
            self.block.block_hash(),
            self.block.header.bits,
        )
        .payout(self.payout.clone())
        .pool_sig(self.pool_sig.clone())
        .time(unix_time().max(self.block.header.time + 1))
        .value(self.value)
        .build()
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn block_hash(&self) -> BlockHash {
        self.block.block_hash()
    }

    pub fn coinbase(&self) -> &Transaction {
        &self.block.txdata[0]
    }

    pub fn meta(&self) -> HeadMeta {
        HeadMeta {
            height: self.height,
            header: self.block.header,
            coinbase: self.coinbase().clone(),
            merkle_branches: self.merkle_branches.clone(),
        }
    }
}

impl Template for BlockTemplate {
    fn height(&self) -> Height {
        self.height
    }

    fn set_coinbase_work_unit(&mut self, work_unit: WorkUnit) {
        let stamped = stamp(
            &mut self.block.txdata[0],
            work_unit,
            &CoinbaseNonce::default(),
        );
        debug_assert!(stamped, "template coinbase has no stamp");
    }

    fn update_merkle_root(&mut self) {
        self.block.header.merkle_root =
            merkle_root(self.coinbase().compute_txid(), &self.merkle_branches);
    }

    fn head_meta(&self) -> Vec<u8> {
        self.meta().encode()
    }

    fn solve(
        &self,
        work_unit: WorkUnit,
        coinbase_nonce: &CoinbaseNonce,
        head_nonce: HeadNonce,
    ) -> Self {
        let mut solved = self.clone();
        stamp(&mut solved.block.txdata[0], work_unit, coinbase_nonce);
        solved.update_merkle_root();
        solved.block.header.nonce = head_nonce.into();
        solved
    }

    fn digest(&self) -> Digest {
        let mut digest = self.block.block_hash().to_byte_array();
        digest.reverse();
        digest
    }

    fn meets_target(&self) -> bool {
        self.block
            .header
            .target()
            .is_met_by(self.block.block_hash())
    }
}

/// Everything a worker needs to mine a job: the header, the stamped coinbase and the merkle path
/// from the coinbase to the root.
///
/// Layout: `height (5) | header (80) | branch count (1) | branches (32 each) | coinbase`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadMeta {
    pub height: Height,
    pub header: Header,
    pub coinbase: Transaction,
    pub merkle_branches: Vec<TxMerkleNode>,
}

impl HeadMeta {
    const HEADER_SIZE: usize = 80;

    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = self.height.to_bytes().to_vec();
        bytes.extend_from_slice(&consensus::serialize(&self.header));
        bytes.push(self.merkle_branches.len() as u8);
        for branch in &self.merkle_branches {
            bytes.extend_from_slice(branch.as_byte_array());
        }
        bytes.extend_from_slice(&consensus::serialize(&self.coinbase));
        bytes
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let height = Height::from_prefix(bytes)?;
        let rest = &bytes[Height::SIZE..];

        ensure!(
            rest.len() > Self::HEADER_SIZE,
            "head meta truncated at {} bytes",
            bytes.len()
        );

        let header: Header = consensus::deserialize(&rest[..Self::HEADER_SIZE])
            .context("invalid block header")?;
        let rest = &rest[Self::HEADER_SIZE..];

        let count = usize::from(rest[0]);
        let rest = &rest[1..];

        ensure!(
            rest.len() >= count * 32,
            "head meta truncated in merkle branches"
        );

        let merkle_branches = rest[..count * 32]
            .chunks_exact(32)
            .map(|chunk| {
                let mut branch = [0; 32];
                branch.copy_from_slice(chunk);
                TxMerkleNode::from_byte_array(branch)
            })
            .collect();

        let coinbase: Transaction =
            consensus::deserialize(&rest[count * 32..]).context("invalid coinbase")?;

        ensure!(
            read_stamp(&coinbase).is_some(),
            "coinbase carries no work unit stamp"
        );

        Ok(Self {
            height,
            header,
            coinbase,
            merkle_branches,
        })
    }

    pub fn work_unit(&self) -> WorkUnit {
        read_stamp(&self.coinbase)
            .map(|(work_unit, _)| work_unit)
            .unwrap_or_default()
    }

    /// Header to hash for an attempt using `coinbase_nonce`, with the nonce field zeroed.
    pub fn header_for(&self, coinbase_nonce: &CoinbaseNonce) -> Header {
        let mut coinbase = self.coinbase.clone();
        stamp_nonce(&mut coinbase, coinbase_nonce);

        Header {
            merkle_root: merkle_root(coinbase.compute_txid(), &self.merkle_branches),
            nonce: 0,
            ..self.header
        }
    }
}

fn unix_time() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u32::try_from(elapsed.as_secs()).unwrap_or(u32::MAX))
        .unwrap_or_default()
}

use {super::*, crate::block_template::DEFAULT_POOL_SIG};

#[derive(Clone, Debug, Parser)]
pub(crate) struct PoolConfig {
    #[arg(long, env = "MINERPOOL_ADDRESS", help = "Listen at <ADDRESS>.")]
    address: Option<String>,
    #[arg(long, env = "MINERPOOL_PORT", help = "Listen on <PORT>.")]
    port: Option<u16>,
    #[arg(
        long,
        help = "Start mining at block <START_HEIGHT>.",
        default_value = "1"
    )]
    start_height: Height,
    #[arg(
        long,
        help = "Mine against compact target <NBITS>.",
        default_value = "207fffff",
        value_parser = parse_nbits
    )]
    nbits: CompactTarget,
    #[arg(long, help = "Pay block rewards to <PAYOUT_ADDRESS>.")]
    payout_address: Option<Address<NetworkUnchecked>>,
    #[arg(
        long,
        help = "Tag coinbases with <POOL_SIG>.",
        default_value = DEFAULT_POOL_SIG
    )]
    pool_sig: String,
    #[arg(
        long,
        help = "Queue up to <SINK_CAPACITY> found blocks.",
        default_value = "16",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    sink_capacity: u16,
}

fn parse_nbits(s: &str) -> Result<CompactTarget> {
    let bits = u32::from_str_radix(s.trim_start_matches("0x"), 16)
        .with_context(|| format!("invalid nbits `{s}`"))?;

    Ok(CompactTarget::from_consensus(bits))
}

impl PoolConfig {
    pub(crate) fn address(&self) -> String {
        self.address.clone().unwrap_or_else(|| "0.0.0.0".into())
    }

    pub(crate) fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub(crate) fn start_height(&self) -> Height {
        self.start_height
    }

    pub(crate) fn nbits(&self) -> CompactTarget {
        self.nbits
    }

    /// Output script for block rewards. Empty without a payout address.
    pub(crate) fn payout(&self) -> ScriptBuf {
        self.payout_address
            .clone()
            .map(|address| address.assume_checked().script_pubkey())
            .unwrap_or_default()
    }

    pub(crate) fn pool_sig(&self) -> String {
        self.pool_sig.clone()
    }

    pub(crate) fn sink_capacity(&self) -> usize {
        self.sink_capacity.into()
    }
}

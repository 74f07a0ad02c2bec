use super::*;

#[derive(Clone, Debug, Parser)]
pub(crate) struct WorkerConfig {
    #[arg(help = "Pool <HOST:PORT>.")]
    pool_endpoint: String,
    #[arg(long, env = "MINERPOOL_REWARD_ADDRESS", help = "Mine for reward <ADDRESS>.")]
    address: String,
    #[arg(long, help = "Hash on <THREADS> threads. Defaults to one per CPU.")]
    threads: Option<NonZeroUsize>,
    #[arg(long, help = "Report every attempt, not only found blocks.")]
    report_hashrate: bool,
    #[arg(
        long,
        help = "Check the pool connection every <RECONNECT_INTERVAL> seconds.",
        default_value = "120",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    reconnect_interval: u64,
    #[arg(
        long,
        help = "Hash <NONCES_PER_ATTEMPT> header nonces per attempt.",
        default_value = "1048576",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    nonces_per_attempt: u32,
    #[arg(
        long,
        help = "Give up connecting after <TIMEOUT> seconds.",
        default_value = "10"
    )]
    timeout: u64,
}

impl WorkerConfig {
    pub(crate) fn pool_endpoint(&self) -> String {
        if self.pool_endpoint.contains(':') {
            self.pool_endpoint.clone()
        } else {
            format!("{}:{DEFAULT_PORT}", self.pool_endpoint)
        }
    }

    pub(crate) fn address(&self) -> String {
        self.address.clone()
    }

    pub(crate) fn threads(&self) -> usize {
        self.threads
            .or_else(|| thread::available_parallelism().ok())
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    }

    pub(crate) fn report_hashrate(&self) -> bool {
        self.report_hashrate
    }

    pub(crate) fn reconnect_interval(&self) -> Duration {
        Duration::from_secs(self.reconnect_interval)
    }

    pub(crate) fn nonces_per_attempt(&self) -> u32 {
        self.nonces_per_attempt
    }

    pub(crate) fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

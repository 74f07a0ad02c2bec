use {super::*, block_template::HeadMeta};

pub use {
    controller::Controller,
    engine::Engine,
    feeder::feed,
    link::{Dialer, Link, LinkState, TcpDialer},
};

mod controller;
mod engine;
mod feeder;
mod link;

/// Latest job from the pool, `None` while there is nothing to mine.
pub type PendingWork = watch::Sender<Option<Arc<Job>>>;

/// A job received from the pool.
#[derive(Debug, PartialEq)]
pub struct Job {
    pub work_unit: WorkUnit,
    pub meta: HeadMeta,
}

impl Job {
    pub fn from_message(message: JobMessage) -> Result<Self> {
        let meta = HeadMeta::decode(&message.head_meta)?;

        ensure!(
            meta.work_unit() == message.work_unit,
            "job for work unit {} carries coinbase for work unit {}",
            message.work_unit,
            meta.work_unit(),
        );

        Ok(Self {
            work_unit: message.work_unit,
            meta,
        })
    }

    pub fn height(&self) -> Height {
        self.meta.height
    }
}

/// One unit of engine work: a job with a fresh coinbase nonce.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub coinbase_nonce: CoinbaseNonce,
    pub header: Header,
    pub job: Arc<Job>,
}

impl Attempt {
    pub fn new(job: Arc<Job>) -> Self {
        let coinbase_nonce = CoinbaseNonce::random();

        Self {
            header: job.meta.header_for(&coinbase_nonce),
            coinbase_nonce,
            job,
        }
    }
}

/// Outcome of an attempt: a block, or the best header nonce found.
#[derive(Debug, Clone)]
pub struct MiningResult {
    pub coinbase_nonce: CoinbaseNonce,
    pub head_nonce: HeadNonce,
    pub job: Arc<Job>,
    pub success: bool,
}

impl MiningResult {
    pub fn report(&self) -> ResultReport {
        ResultReport {
            success: self.success,
            height: self.job.height(),
            head_nonce: self.head_nonce,
            coinbase_nonce: self.coinbase_nonce,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use {super::*, block_template::BlockTemplate};

    pub(crate) fn job(height: u64, work_unit: u32) -> Arc<Job> {
        let mut template = BlockTemplate::builder(
            Height::new(height).unwrap(),
            BlockHash::all_zeros(),
            CompactTarget::from_consensus(0x207fffff),
        )
        .time(1_700_000_000)
        .build()
        .unwrap();

        template.set_coinbase_work_unit(work_unit.into());
        template.update_merkle_root();

        Arc::new(
            Job::from_message(JobMessage {
                work_unit: work_unit.into(),
                head_meta: template.head_meta(),
            })
            .unwrap(),
        )
    }

    #[test]
    fn job_from_message() {
        let job = job(1000, 5);
        assert_eq!(job.work_unit, WorkUnit::new(5));
        assert_eq!(job.height(), Height::new(1000).unwrap());
    }

    #[test]
    fn job_work_unit_must_match_coinbase() {
        let meta = job(1000, 5).meta.encode();

        assert!(
            Job::from_message(JobMessage {
                work_unit: WorkUnit::new(6),
                head_meta: meta,
            })
            .is_err()
        );
    }

    #[test]
    fn attempts_use_fresh_coinbase_nonces() {
        let job = job(1000, 1);
        let a = Attempt::new(job.clone());
        let b = Attempt::new(job);

        assert_ne!(a.coinbase_nonce, b.coinbase_nonce);
        assert_ne!(a.header.merkle_root, b.header.merkle_root);
        assert_eq!(a.header.prev_blockhash, b.header.prev_blockhash);
    }

    #[test]
    fn report_carries_job_height() {
        let job = job(1000, 1);

        let result = MiningResult {
            coinbase_nonce: CoinbaseNonce::from([1; 32]),
            head_nonce: 42.into(),
            job,
            success: true,
        };

        assert_eq!(
            result.report(),
            ResultReport {
                success: true,
                height: Height::new(1000).unwrap(),
                head_nonce: 42.into(),
                coinbase_nonce: CoinbaseNonce::from([1; 32]),
            }
        );
    }
}

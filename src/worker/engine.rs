use super::*;

/// Blocking hashing threads fed from the attempt queue.
pub struct Engine {
    threads: Vec<thread::JoinHandle<()>>,
}

impl Engine {
    /// Spawns `threads` hashing threads. Each takes an attempt, hashes up to `nonces` header
    /// nonces and sends one result. Threads exit once either channel closes.
    pub fn spawn(
        threads: usize,
        nonces: u32,
        attempts: mpsc::Receiver<Attempt>,
        results: mpsc::Sender<MiningResult>,
    ) -> Result<Self> {
        let attempts = Arc::new(Mutex::new(attempts));

        let threads = (0..threads.max(1))
            .map(|index| {
                let attempts = attempts.clone();
                let results = results.clone();
                thread::Builder::new()
                    .name(format!("engine-{index}"))
                    .spawn(move || Self::work(&attempts, &results, nonces))
                    .context("failed to spawn engine thread")
            })
            .collect::<Result<Vec<thread::JoinHandle<()>>>>()?;

        info!("Started {} engine threads", threads.len());

        Ok(Self { threads })
    }

    fn work(
        attempts: &Mutex<mpsc::Receiver<Attempt>>,
        results: &mpsc::Sender<MiningResult>,
        nonces: u32,
    ) {
        loop {
            let Some(attempt) = attempts.lock().blocking_recv() else {
                break;
            };

            if results.blocking_send(search(attempt, nonces)).is_err() {
                break;
            }
        }
    }

    pub fn threads(&self) -> usize {
        self.threads.len()
    }

    /// Waits for every thread to exit.
    pub fn join(self) {
        for thread in self.threads {
            if thread.join().is_err() {
                error!("Engine thread panicked");
            }
        }
    }
}

/// Hashes header nonces `0..nonces` of `attempt`, stopping at the first one that meets the
/// header's target. Otherwise returns the nonce with the lowest hash.
pub(crate) fn search(attempt: Attempt, nonces: u32) -> MiningResult {
    let target = attempt.header.target();
    let mut header = attempt.header;
    let mut best: Option<(Digest, u32)> = None;

    for nonce in 0..nonces.max(1) {
        header.nonce = nonce;

        let hash = header.block_hash();

        if target.is_met_by(hash) {
            debug!("Solved height {} with hash {hash}", attempt.job.height());
            return MiningResult {
                coinbase_nonce: attempt.coinbase_nonce,
                head_nonce: nonce.into(),
                job: attempt.job,
                success: true,
            };
        }

        let mut digest = hash.to_byte_array();
        digest.reverse();

        if best.is_none_or(|(best, _)| digest < best) {
            best = Some((digest, nonce));
        }
    }

    MiningResult {
        coinbase_nonce: attempt.coinbase_nonce,
        head_nonce: best.map(|(_, nonce)| nonce).unwrap_or_default().into(),
        job: attempt.job,
        success: false,
    }
}

use {
    super::*,
    crate::worker::{Controller, Engine, TcpDialer, feed},
    worker_config::WorkerConfig,
};

mod worker_config;

#[derive(Debug, Parser)]
pub(crate) struct Worker {
    #[command(flatten)]
    pub(crate) config: WorkerConfig,
}

impl Worker {
    pub(crate) async fn run(&self, cancel_token: CancellationToken) -> Result {
        let config = &self.config;

        let endpoint = config.pool_endpoint();
        let threads = config.threads();

        info!(
            "Mining for {} at {endpoint} on {threads} threads",
            config.address()
        );

        let (pending, pending_rx) = watch::channel(None);
        let (attempts_tx, attempts_rx) = mpsc::channel(threads);
        let (results_tx, results_rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);

        let engine = Engine::spawn(
            threads,
            config.nonces_per_attempt(),
            attempts_rx,
            results_tx,
        )?;

        let feeder = tokio::spawn(feed(pending_rx, attempts_tx, cancel_token.clone()));

        Controller::new(
            TcpDialer::new(endpoint, config.address(), config.timeout()),
            Arc::new(pending),
            results_rx,
            cancel_token.clone(),
        )
        .with_reconnect_interval(config.reconnect_interval())
        .with_report_hashrate(config.report_hashrate())
        .run()
        .await;

        cancel_token.cancel();

        feeder.await?;

        task::spawn_blocking(move || engine.join()).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq};

    fn parse_worker_args(args: &str) -> Worker {
        match Arguments::try_parse_from(args.split_whitespace()) {
            Ok(arguments) => match arguments.subcommand {
                Subcommand::Worker(worker) => worker,
                subcommand => panic!("unexpected subcommand: {subcommand:?}"),
            },
            Err(err) => panic!("error parsing arguments: {err}"),
        }
    }

    #[test]
    fn defaults() {
        let config = parse_worker_args("minerpool worker pool.example.com --address alice").config;

        assert_eq!(config.pool_endpoint(), "pool.example.com:3339");
        assert_eq!(config.address(), "alice");
        assert!(config.threads() >= 1);
        assert!(!config.report_hashrate());
        assert_eq!(config.reconnect_interval(), DEFAULT_RECONNECT_INTERVAL);
        assert_eq!(config.nonces_per_attempt(), 1 << 20);
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn overrides() {
        let config = parse_worker_args(
            "minerpool worker 127.0.0.1:4000 \
                --address bob \
                --threads 3 \
                --report-hashrate \
                --reconnect-interval 5 \
                --nonces-per-attempt 1000 \
                --timeout 2",
        )
        .config;

        assert_eq!(config.pool_endpoint(), "127.0.0.1:4000");
        assert_eq!(config.threads(), 3);
        assert!(config.report_hashrate());
        assert_eq!(config.reconnect_interval(), Duration::from_secs(5));
        assert_eq!(config.nonces_per_attempt(), 1000);
        assert_eq!(config.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn address_is_required() {
        assert!(Arguments::try_parse_from(["minerpool", "worker", "127.0.0.1"]).is_err());
    }

    #[test]
    fn zero_threads_rejected() {
        assert!(
            Arguments::try_parse_from([
                "minerpool",
                "worker",
                "127.0.0.1",
                "--address",
                "alice",
                "--threads",
                "0"
            ])
            .is_err()
        );
    }
}

use {super::*, link::receive};

/// Supervises the worker: keeps the pool connection alive and turns engine results into reports.
pub struct Controller<D: Dialer> {
    cancel: CancellationToken,
    dialer: Arc<D>,
    link: Arc<Link>,
    pending: Arc<PendingWork>,
    reconnect_interval: Duration,
    report_hashrate: bool,
    results: mpsc::Receiver<MiningResult>,
}

impl<D: Dialer> Controller<D> {
    pub fn new(
        dialer: D,
        pending: Arc<PendingWork>,
        results: mpsc::Receiver<MiningResult>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            cancel,
            dialer: Arc::new(dialer),
            link: Arc::new(Link::new()),
            pending,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            report_hashrate: false,
            results,
        }
    }

    pub fn with_reconnect_interval(mut self, reconnect_interval: Duration) -> Self {
        self.reconnect_interval = reconnect_interval;
        self
    }

    /// Also report unsuccessful attempts so the pool can credit hash worth.
    pub fn with_report_hashrate(mut self, report_hashrate: bool) -> Self {
        self.report_hashrate = report_hashrate;
        self
    }

    pub fn link(&self) -> Arc<Link> {
        self.link.clone()
    }

    pub async fn run(mut self) {
        let mut ticker = interval(self.reconnect_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut connects = JoinSet::new();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Shutting down worker");
                    break;
                }
                _ = ticker.tick() => {
                    self.check_connection(&mut connects);
                }
                result = self.results.recv() => match result {
                    Some(result) => {
                        self.on_result(&result);
                    }
                    None => {
                        info!("Engine stopped");
                        break;
                    }
                },
                Some(joined) = connects.join_next(), if !connects.is_empty() => {
                    if let Err(err) = joined {
                        error!("Connection task failed: {err}");
                    }
                }
            }
        }

        connects.shutdown().await;
    }

    /// Starts a connect in the background unless one is established or in flight.
    fn check_connection(&self, connects: &mut JoinSet<()>) -> bool {
        if !self.link.begin_connect() {
            return false;
        }

        debug!("Connecting to pool");

        let dialer = self.dialer.clone();
        let link = self.link.clone();
        let pending = self.pending.clone();

        connects.spawn(async move {
            match dialer.dial().await {
                Ok((connection, reader)) => {
                    info!("Connected to pool at {}", connection.peer());
                    let id = connection.id();
                    link.connected(connection);
                    receive(reader, id, link, pending).await;
                }
                Err(err) => {
                    warn!("Failed to connect to pool: {err:#}");
                    link.connect_failed();
                }
            }
        });

        true
    }

    /// Returns whether a report was queued for the pool.
    fn on_result(&self, result: &MiningResult) -> bool {
        if result.success {
            info!(
                "Found block at height {} with work unit {}",
                result.job.height(),
                result.job.work_unit
            );

            self.pending.send_if_modified(|pending| {
                let current = pending
                    .as_ref()
                    .is_some_and(|job| Arc::ptr_eq(job, &result.job));

                if current {
                    *pending = None;
                }

                current
            });
        } else if !self.report_hashrate {
            return false;
        }

        self.link.send(Frame::report(&result.report()))
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*, crate::worker::tests::job, pretty_assertions::assert_eq,
        std::sync::atomic::AtomicUsize,
    };

    struct FailingDialer {
        dials: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Dialer for FailingDialer {
        async fn dial(&self) -> Result<(Connection, FrameReader)> {
            self.dials.fetch_add(1, Ordering::SeqCst);
            bail!("connection refused")
        }
    }

    struct Fixture {
        controller: Controller<FailingDialer>,
        dials: Arc<AtomicUsize>,
        pending: Arc<PendingWork>,
        results: mpsc::Sender<MiningResult>,
        cancel: CancellationToken,
    }

    fn fixture() -> Fixture {
        let dials = Arc::new(AtomicUsize::new(0));
        let pending = Arc::new(watch::channel(None).0);
        let (results, results_rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();

        let controller = Controller::new(
            FailingDialer {
                dials: dials.clone(),
            },
            pending.clone(),
            results_rx,
            cancel.clone(),
        );

        Fixture {
            controller,
            dials,
            pending,
            results,
            cancel,
        }
    }

    fn connect(link: &Link) -> mpsc::Receiver<Frame> {
        let (tx, rx) = mpsc::channel(4);
        link.connected(Connection::new(SocketAddr::from(([127, 0, 0, 1], 3339)), tx));
        rx
    }

    fn result(job: Arc<Job>, success: bool) -> MiningResult {
        MiningResult {
            coinbase_nonce: CoinbaseNonce::from([5; 32]),
            head_nonce: 9.into(),
            job,
            success,
        }
    }

    async fn settle() {
        for _ in 0..16 {
            task::yield_now().await;
        }
    }

    #[test]
    fn success_is_reported_once_and_clears_pending() {
        let fixture = fixture();
        let mut rx = connect(&fixture.controller.link);

        let job = job(1000, 1);
        fixture.pending.send_replace(Some(job.clone()));

        let result = result(job, true);
        assert!(fixture.controller.on_result(&result));

        assert_eq!(rx.try_recv().unwrap(), Frame::report(&result.report()));
        assert!(rx.try_recv().is_err());
        assert!(fixture.pending.borrow().is_none());
    }

    #[test]
    fn success_while_disconnected_is_not_transmitted() {
        let fixture = fixture();

        let job = job(1000, 1);
        fixture.pending.send_replace(Some(job.clone()));

        assert!(!fixture.controller.on_result(&result(job, true)));
        assert!(fixture.pending.borrow().is_none());
        assert_eq!(fixture.controller.link.state(), LinkState::Disconnected);
    }

    #[test]
    fn closed_connection_is_not_retried() {
        let fixture = fixture();
        let rx = connect(&fixture.controller.link);
        drop(rx);

        let job = job(1000, 1);

        assert!(!fixture.controller.on_result(&result(job, true)));
        assert_eq!(fixture.controller.link.state(), LinkState::Disconnected);
    }

    #[test]
    fn stale_success_keeps_newer_job() {
        let fixture = fixture();
        let mut rx = connect(&fixture.controller.link);

        let newer = job(1001, 1);
        fixture.pending.send_replace(Some(newer.clone()));

        assert!(fixture.controller.on_result(&result(job(1000, 1), true)));
        assert!(rx.try_recv().is_ok());

        assert!(
            fixture
                .pending
                .borrow()
                .as_ref()
                .is_some_and(|job| Arc::ptr_eq(job, &newer))
        );
    }

    #[test]
    fn unsuccessful_results_need_hashrate_reporting() {
        let fixture = fixture();
        let mut rx = connect(&fixture.controller.link);

        let job = job(1000, 1);
        fixture.pending.send_replace(Some(job.clone()));

        assert!(!fixture.controller.on_result(&result(job.clone(), false)));
        assert!(rx.try_recv().is_err());

        let controller = fixture.controller.with_report_hashrate(true);

        let result = result(job, false);
        assert!(controller.on_result(&result));
        assert_eq!(rx.try_recv().unwrap(), Frame::report(&result.report()));
        assert!(fixture.pending.borrow().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn reconnects_every_interval() {
        let fixture = fixture();
        let link = fixture.controller.link();
        let worker = tokio::spawn(fixture.controller.run());

        settle().await;
        assert_eq!(fixture.dials.load(Ordering::SeqCst), 1);
        assert_eq!(link.state(), LinkState::Disconnected);

        tokio::time::advance(DEFAULT_RECONNECT_INTERVAL - Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(fixture.dials.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(fixture.dials.load(Ordering::SeqCst), 2);

        fixture.cancel.cancel();
        worker.await.unwrap();
        drop(fixture.results);
    }

    #[tokio::test(start_paused = true)]
    async fn no_reconnect_while_connected() {
        let fixture = fixture();
        let link = fixture.controller.link();
        let _rx = connect(&link);

        let worker = tokio::spawn(
            fixture
                .controller
                .with_reconnect_interval(Duration::from_secs(5))
                .run(),
        );

        for _ in 0..4 {
            settle().await;
            tokio::time::advance(Duration::from_secs(5)).await;
        }

        assert_eq!(fixture.dials.load(Ordering::SeqCst), 0);
        assert_eq!(link.state(), LinkState::Connected);

        fixture.cancel.cancel();
        worker.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn results_are_forwarded() {
        let fixture = fixture();
        let link = fixture.controller.link();
        let mut rx = connect(&link);

        let worker = tokio::spawn(fixture.controller.run());

        let job = job(1000, 1);
        fixture.pending.send_replace(Some(job.clone()));
        fixture.results.send(result(job, true)).await.unwrap();

        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.kind, MessageKind::Report);
        assert!(fixture.pending.borrow().is_none());

        drop(fixture.results);
        worker.await.unwrap();
    }
}

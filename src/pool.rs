use {super::*, session::Session};

#[derive(Debug, Clone)]
struct Registration {
    address: String,
    connection: Connection,
}

/// Hands out work for the current [`MiningPeriod`] and moves registered connections from one
/// period to the next.
pub struct Pool<T: Template> {
    period: RwLock<Arc<MiningPeriod<T>>>,
    registrations: DashMap<ConnectionId, Registration>,
    sink: mpsc::Sender<T>,
}

impl<T: Template> Pool<T> {
    /// Creates a pool mining `template`. Found blocks arrive on the returned receiver.
    pub fn new(template: T, sink_capacity: usize) -> (Arc<Self>, mpsc::Receiver<T>) {
        let (sink, blocks) = mpsc::channel(sink_capacity.max(1));

        let period = Arc::new(MiningPeriod::new(template).with_result_sink(sink.clone()));

        info!("Mining period started at height {}", period.height());

        let pool = Arc::new(Self {
            period: RwLock::new(period),
            registrations: DashMap::new(),
            sink,
        });

        (pool, blocks)
    }

    pub fn period(&self) -> Arc<MiningPeriod<T>> {
        self.period.read().clone()
    }

    pub fn client_count(&self) -> usize {
        self.registrations.len()
    }

    /// Registers `connection` for `address` and sends it its first job. Holding the period lock
    /// keeps the registration and the join in the same period.
    pub fn register(&self, address: String, connection: Connection) -> WorkUnit {
        let period = self.period.read();

        info!("Registered {} for {address}", connection.peer());

        self.registrations.insert(
            connection.id(),
            Registration {
                address: address.clone(),
                connection: connection.clone(),
            },
        );

        let client = period.join(&address, connection);
        period.issue_job_to(&client)
    }

    pub fn disconnect(&self, id: ConnectionId) {
        let period = self.period.read();

        if let Some((_, registration)) = self.registrations.remove(&id) {
            info!(
                "Disconnected {} for {}",
                registration.connection.peer(),
                registration.address
            );
        }

        period.leave(id);
    }

    pub fn submit(&self, id: ConnectionId, payload: &[u8]) -> Submission {
        let period = self.period();

        let Some(client) = period.client(id) else {
            return Submission::Unregistered;
        };

        period.submit(&client, payload)
    }

    /// Replaces the current period with one mining `template`. The old period is ended and every
    /// registered connection receives a job for the new one.
    pub fn begin_period(&self, template: T) -> Arc<MiningPeriod<T>> {
        let next = Arc::new(MiningPeriod::new(template).with_result_sink(self.sink.clone()));

        let (previous, clients) = {
            let mut current = self.period.write();

            let previous = mem::replace(&mut *current, next.clone());

            previous.end_period();

            let registrations = self
                .registrations
                .iter()
                .map(|entry| entry.value().clone())
                .collect::<Vec<Registration>>();

            for registration in &registrations {
                let client = next.join(&registration.address, registration.connection.clone());
                next.issue_job_to(&client);
            }

            (previous, registrations.len())
        };

        match serde_json::to_string(&previous.summary()) {
            Ok(summary) => info!("Period summary: {summary}"),
            Err(err) => warn!("Failed to serialize period summary: {err}"),
        }

        info!(
            "Mining period started at height {} with {clients} clients",
            next.height()
        );

        next
    }

    /// Accepts connections until `cancel` fires, serving each in its own task.
    pub async fn serve(self: Arc<Self>, listener: TcpListener, cancel: CancellationToken) -> Result {
        let mut sessions = JoinSet::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Shutting down pool");
                    break;
                }
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(err) => {
                            warn!("Failed to accept connection: {err}");
                            continue;
                        }
                    };

                    debug!("Accepted connection from {peer}");

                    let session = match Session::new(self.clone(), stream, cancel.child_token()) {
                        Ok(session) => session,
                        Err(err) => {
                            warn!("Failed to set up connection from {peer}: {err:#}");
                            continue;
                        }
                    };

                    sessions.spawn(async move {
                        if let Err(err) = session.serve().await {
                            warn!("Connection from {peer} failed: {err:#}");
                        }
                    });
                }
                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    if let Err(err) = joined {
                        error!("Session task failed: {err}");
                    }
                }
            }
        }

        sessions.shutdown().await;

        Ok(())
    }
}

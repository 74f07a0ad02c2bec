use super::*;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
pub enum LinkState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Default)]
struct Inner {
    connection: Option<Connection>,
    state: LinkState,
}

/// The worker's connection to the pool and where it is in its lifecycle.
#[derive(Debug, Default)]
pub struct Link {
    inner: Mutex<Inner>,
}

impl Link {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LinkState {
        self.inner.lock().state
    }

    pub fn connection(&self) -> Option<Connection> {
        self.inner.lock().connection.clone()
    }

    /// Moves from disconnected to connecting. Fails in any other state so that only one connect
    /// is ever in flight.
    pub fn begin_connect(&self) -> bool {
        let mut inner = self.inner.lock();

        if inner.state != LinkState::Disconnected {
            return false;
        }

        inner.state = LinkState::Connecting;

        true
    }

    pub fn connected(&self, connection: Connection) {
        let mut inner = self.inner.lock();
        inner.state = LinkState::Connected;
        inner.connection = Some(connection);
    }

    pub fn connect_failed(&self) {
        let mut inner = self.inner.lock();
        if inner.state == LinkState::Connecting {
            inner.state = LinkState::Disconnected;
        }
    }

    /// Drops `id` if it is still the current connection.
    pub fn disconnected(&self, id: ConnectionId) {
        let mut inner = self.inner.lock();

        if inner
            .connection
            .as_ref()
            .is_some_and(|connection| connection.id() == id)
        {
            inner.connection = None;
            inner.state = LinkState::Disconnected;
        }
    }

    /// Makes a single non-blocking write attempt. Returns whether the frame was queued.
    pub fn send(&self, frame: Frame) -> bool {
        let Some(connection) = self.connection() else {
            return false;
        };

        match connection.write(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Write queue to {} full, dropping frame", connection.peer());
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!("Connection to {} closed", connection.peer());
                self.disconnected(connection.id());
                false
            }
        }
    }
}

/// Opens registered connections to the pool.
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    async fn dial(&self) -> Result<(Connection, FrameReader)>;
}

pub struct TcpDialer {
    address: String,
    endpoint: String,
    timeout: Duration,
}

impl TcpDialer {
    pub fn new(endpoint: String, address: String, timeout: Duration) -> Self {
        Self {
            address,
            endpoint,
            timeout,
        }
    }
}

#[async_trait]
impl Dialer for TcpDialer {
    async fn dial(&self) -> Result<(Connection, FrameReader)> {
        let stream = timeout(self.timeout, TcpStream::connect(&self.endpoint))
            .await
            .with_context(|| format!("timed out connecting to {}", self.endpoint))?
            .with_context(|| format!("failed to connect to {}", self.endpoint))?;

        let (connection, reader) = Connection::spawn(stream)?;

        connection
            .write(Frame::register(&self.address))
            .map_err(|err| anyhow!("failed to register with {}: {err}", self.endpoint))?;

        Ok((connection, reader))
    }
}

/// Applies pool messages to the pending work until the connection fails.
pub(crate) async fn receive(
    mut reader: FrameReader,
    id: ConnectionId,
    link: Arc<Link>,
    pending: Arc<PendingWork>,
) {
    loop {
        let frame = match reader.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(err)) => {
                warn!("Failed to read from pool: {err}");
                break;
            }
            None => {
                info!("Pool closed the connection");
                break;
            }
        };

        match Message::try_from(frame) {
            Ok(Message::Job(message)) => match Job::from_message(message) {
                Ok(job) => {
                    info!(
                        "Mining work unit {} at height {}",
                        job.work_unit,
                        job.height()
                    );
                    pending.send_replace(Some(Arc::new(job)));
                }
                Err(err) => warn!("Ignoring invalid job: {err:#}"),
            },
            Ok(Message::StopMining) => {
                info!("Pool ended the current period");
                pending.send_replace(None);
            }
            Ok(message) => warn!("Ignoring unexpected message from pool: {message:?}"),
            Err(err) => {
                warn!("Failed to decode message from pool: {err}");
                break;
            }
        }
    }

    link.disconnected(id);
}

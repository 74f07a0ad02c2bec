use super::*;

/// One pool-side connection: a register handshake followed by result reports.
pub(crate) struct Session<T: Template> {
    cancel: CancellationToken,
    connection: Connection,
    pool: Arc<Pool<T>>,
    reader: FrameReader,
}

impl<T: Template> Session<T> {
    pub(crate) fn new(pool: Arc<Pool<T>>, stream: TcpStream, cancel: CancellationToken) -> Result<Self> {
        let (connection, reader) = Connection::spawn(stream)?;

        Ok(Self {
            cancel,
            connection,
            pool,
            reader,
        })
    }

    pub(crate) async fn serve(mut self) -> Result {
        let address = match timeout(HANDSHAKE_TIMEOUT, self.handshake()).await {
            Ok(address) => address?,
            Err(_) => bail!("no registration within {}s", HANDSHAKE_TIMEOUT.as_secs()),
        };

        let id = self.connection.id();

        self.pool.register(address, self.connection.clone());

        let result = self.receive().await;

        self.pool.disconnect(id);

        result
    }

    async fn handshake(&mut self) -> Result<String> {
        let frame = tokio::select! {
            _ = self.cancel.cancelled() => bail!("shutting down"),
            frame = self.reader.next() => frame,
        };

        let frame = frame.context("connection closed before registering")??;

        match Message::try_from(frame)? {
            Message::Register(address) => {
                ensure!(!address.is_empty(), "empty reward address");
                Ok(address)
            }
            message => bail!("expected registration, got {message:?}"),
        }
    }

    async fn receive(&mut self) -> Result {
        let peer = self.connection.peer();

        loop {
            let frame = tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                frame = self.reader.next() => frame,
            };

            let Some(frame) = frame else {
                debug!("Connection closed by {peer}");
                return Ok(());
            };

            let frame = frame.with_context(|| format!("failed to read from {peer}"))?;

            match frame.kind {
                MessageKind::Report => self.report(&frame.payload),
                kind => warn!("Ignoring {kind} frame from {peer}"),
            }
        }
    }

    fn report(&self, payload: &[u8]) {
        let peer = self.connection.peer();

        match self.pool.submit(self.connection.id(), payload) {
            Submission::Block => info!("Block found by {peer}"),
            Submission::Credited | Submission::Duplicate => {}
            Submission::Stale => debug!("Stale report from {peer}"),
            submission => warn!("Rejected report from {peer}: {submission}"),
        }
    }
}

use super::*;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

pub type FrameReader = FramedRead<OwnedReadHalf, FrameCodec>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle to a connection's writer task.
///
/// Writes only enqueue the frame, they never wait for the socket. The connection closes once every
/// handle is dropped.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    peer: SocketAddr,
    tx: mpsc::Sender<Frame>,
}

impl Connection {
    pub fn new(peer: SocketAddr, tx: mpsc::Sender<Frame>) -> Self {
        Self {
            id: ConnectionId::next(),
            peer,
            tx,
        }
    }

    /// Splits `stream`, spawns a writer task for the write half and returns the framed read half.
    pub fn spawn(stream: TcpStream) -> Result<(Self, FrameReader)> {
        let peer = stream.peer_addr().context("failed to get peer address")?;
        let (reader, writer) = stream.into_split();
        let (tx, rx) = mpsc::channel(WRITE_QUEUE_CAPACITY);

        let connection = Self::new(peer, tx);

        tokio::spawn(Self::writer(connection.id, peer, writer, rx));

        Ok((connection, FramedRead::new(reader, FrameCodec::new())))
    }

    async fn writer(
        id: ConnectionId,
        peer: SocketAddr,
        writer: OwnedWriteHalf,
        mut rx: mpsc::Receiver<Frame>,
    ) {
        let mut writer = FramedWrite::new(writer, FrameCodec::new());

        while let Some(frame) = rx.recv().await {
            if let Err(err) = writer.send(frame).await {
                warn!("Failed to write to {peer}: {err}");
                break;
            }
        }

        debug!("Writer for connection {id} to {peer} finished");
    }

    pub fn write(&self, frame: Frame) -> Result<(), TrySendError<Frame>> {
        self.tx.try_send(frame)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let (tx, _rx) = mpsc::channel(1);
        let peer = SocketAddr::from(([127, 0, 0, 1], 1));
        let a = Connection::new(peer, tx.clone());
        let b = Connection::new(peer, tx);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn write_does_not_block_when_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let connection = Connection::new(SocketAddr::from(([127, 0, 0, 1], 1)), tx);

        assert!(connection.write(Frame::stop_mining()).is_ok());
        assert!(matches!(
            connection.write(Frame::stop_mining()),
            Err(TrySendError::Full(_))
        ));

        assert_eq!(rx.try_recv().unwrap(), Frame::stop_mining());

        drop(rx);
        assert!(connection.is_closed());
        assert!(matches!(
            connection.write(Frame::stop_mining()),
            Err(TrySendError::Closed(_))
        ));
    }

    #[tokio::test]
    async fn frames_reach_the_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (client, server) = tokio::join!(TcpStream::connect(addr), listener.accept());

        let (connection, _reader) = Connection::spawn(client.unwrap()).unwrap();
        let (_peer_connection, mut peer_reader) = Connection::spawn(server.unwrap().0).unwrap();

        connection.write(Frame::register("alice")).unwrap();
        connection.write(Frame::stop_mining()).unwrap();

        assert_eq!(
            peer_reader.next().await.unwrap().unwrap(),
            Frame::register("alice")
        );
        assert_eq!(
            peer_reader.next().await.unwrap().unwrap(),
            Frame::stop_mining()
        );

        drop(connection);
        assert!(peer_reader.next().await.is_none());
    }
}

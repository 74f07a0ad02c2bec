use super::*;

/// A reward address mining in one period, with the connections mining for it and the hash worth
/// they have contributed.
#[derive(Debug)]
pub struct Account {
    active_clients: DashMap<ConnectionId, Connection>,
    address: String,
    worth: Mutex<Worth>,
}

impl Account {
    pub fn new(address: String) -> Self {
        Self {
            active_clients: DashMap::new(),
            address,
            worth: Mutex::new(Worth::zero()),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Credits the worth of a proof hash. Only this account's lock is taken.
    pub fn add_pow_worth(&self, digest: &Digest) {
        let worth = hash_worth(digest);
        let mut total = self.worth.lock();
        *total = total.saturating_add(worth);
    }

    pub fn worth(&self) -> Worth {
        *self.worth.lock()
    }

    pub fn add_client(&self, connection: Connection) {
        self.active_clients.insert(connection.id(), connection);
    }

    pub fn remove_client(&self, id: ConnectionId) -> bool {
        self.active_clients.remove(&id).is_some()
    }

    /// Point-in-time copy of the connected clients.
    pub fn active_clients(&self) -> Vec<Connection> {
        self.active_clients
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn client_count(&self) -> usize {
        self.active_clients.len()
    }
}

/// A connection mining for an account during one period.
#[derive(Debug)]
pub struct Client {
    account: Arc<Account>,
    connection: Connection,
    work_unit: Mutex<Option<WorkUnit>>,
}

impl Client {
    pub fn new(account: Arc<Account>, connection: Connection) -> Self {
        Self {
            account,
            connection,
            work_unit: Mutex::new(None),
        }
    }

    pub fn account(&self) -> &Arc<Account> {
        &self.account
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn id(&self) -> ConnectionId {
        self.connection.id()
    }

    /// The last work unit issued to this client.
    pub fn work_unit(&self) -> Option<WorkUnit> {
        *self.work_unit.lock()
    }

    pub(crate) fn set_work_unit(&self, work_unit: WorkUnit) {
        *self.work_unit.lock() = Some(work_unit);
    }
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq};

    fn connection() -> Connection {
        let (tx, _rx) = mpsc::channel(1);
        Connection::new(SocketAddr::from(([127, 0, 0, 1], 3339)), tx)
    }

    fn digest(byte: u8) -> Digest {
        let mut digest = [0xff; 32];
        digest[0] = byte;
        digest
    }

    #[test]
    fn worth_accumulates() {
        let account = Account::new("alice".into());
        assert_eq!(account.worth(), Worth::zero());

        let hashes = [digest(0x00), digest(0x0f), digest(0x7f), digest(0xff)];
        for hash in &hashes {
            account.add_pow_worth(hash);
        }

        let expected = hashes
            .iter()
            .map(hash_worth)
            .fold(Worth::zero(), |total, worth| total + worth);
        assert_eq!(account.worth(), expected);
    }

    #[test]
    fn concurrent_accounts_do_not_corrupt_each_other() {
        let accounts: Vec<Arc<Account>> = ["alice", "bob", "carol"]
            .into_iter()
            .map(|address| Arc::new(Account::new(address.into())))
            .collect();

        let hashes: Vec<Digest> = (0..=255u8).map(digest).collect();

        thread::scope(|scope| {
            for account in &accounts {
                for chunk in hashes.chunks(32) {
                    let account = account.clone();
                    scope.spawn(move || {
                        for hash in chunk {
                            account.add_pow_worth(hash);
                        }
                    });
                }
            }
        });

        let expected = hashes
            .iter()
            .map(hash_worth)
            .fold(Worth::zero(), |total, worth| total + worth);

        for account in &accounts {
            assert_eq!(account.worth(), expected, "{}", account.address());
        }
    }

    #[test]
    fn clients_join_and_leave() {
        let account = Account::new("alice".into());
        let c1 = connection();
        let c2 = connection();

        account.add_client(c1.clone());
        account.add_client(c2.clone());
        account.add_client(c2.clone());
        assert_eq!(account.client_count(), 2);

        let snapshot = account.active_clients();

        assert!(account.remove_client(c1.id()));
        assert!(!account.remove_client(c1.id()));
        assert_eq!(account.client_count(), 1);
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn statistics_survive_disconnect() {
        let account = Arc::new(Account::new("alice".into()));
        let client = Client::new(account.clone(), connection());
        account.add_client(client.connection().clone());

        client.account().add_pow_worth(&digest(0));
        account.remove_client(client.id());

        assert_eq!(account.client_count(), 0);
        assert_eq!(account.worth(), hash_worth(&digest(0)));
    }

    #[test]
    fn client_remembers_last_work_unit() {
        let client = Client::new(Arc::new(Account::new("alice".into())), connection());
        assert_eq!(client.work_unit(), None);
        client.set_work_unit(WorkUnit::new(4));
        client.set_work_unit(WorkUnit::new(5));
        assert_eq!(client.work_unit(), Some(WorkUnit::new(5)));
    }
}

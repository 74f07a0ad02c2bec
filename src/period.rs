use super::*;

struct Target<T> {
    block: T,
    work_unit: WorkUnit,
}

/// Outcome of a worker's result report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Submission {
    /// The report names a different height.
    Stale,
    /// The report payload could not be decoded.
    Malformed,
    /// The connection is not a client of this period.
    Unregistered,
    /// No job was ever issued to the client.
    Unassigned,
    /// Worth credited, no block claimed.
    Credited,
    /// Block claimed but the rebuilt candidate misses the target.
    Invalid,
    /// Block accepted, the period is finished.
    Block,
    /// Block valid but another one already finished the period.
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub address: String,
    pub clients: usize,
    pub worth: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub height: Height,
    pub work_units_issued: WorkUnit,
    pub finished: bool,
    pub accounts: Vec<AccountSummary>,
}

/// All mining coordination state for a single block height.
///
/// The target block and its work unit counter live behind one lock. Per-account worth is locked
/// separately so that crediting proofs never waits on job issuance.
pub struct MiningPeriod<T: Template> {
    accounts: DashMap<String, Arc<Account>>,
    clients: DashMap<ConnectionId, Arc<Client>>,
    height: Height,
    sink: Option<mpsc::Sender<T>>,
    success: OnceLock<T>,
    target: Mutex<Target<T>>,
}

impl<T: Template> MiningPeriod<T> {
    pub fn new(template: T) -> Self {
        Self {
            accounts: DashMap::new(),
            clients: DashMap::new(),
            height: template.height(),
            sink: None,
            success: OnceLock::new(),
            target: Mutex::new(Target {
                block: template,
                work_unit: WorkUnit::default(),
            }),
        }
    }

    /// Found blocks are forwarded to `sink`.
    pub fn with_result_sink(mut self, sink: mpsc::Sender<T>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn height(&self) -> Height {
        self.height
    }

    /// Adds `connection` as a client of the account for `address`, creating the account on first
    /// use.
    pub fn join(&self, address: &str, connection: Connection) -> Arc<Client> {
        let account = self
            .accounts
            .entry(address.to_string())
            .or_insert_with(|| Arc::new(Account::new(address.to_string())))
            .clone();

        account.add_client(connection.clone());

        let client = Arc::new(Client::new(account, connection));

        self.clients.insert(client.id(), client.clone());

        client
    }

    /// Removes a client. Its account and accumulated worth stay.
    pub fn leave(&self, id: ConnectionId) -> Option<Arc<Client>> {
        let (_, client) = self.clients.remove(&id)?;
        client.account().remove_client(id);
        Some(client)
    }

    pub fn client(&self, id: ConnectionId) -> Option<Arc<Client>> {
        self.clients.get(&id).map(|entry| entry.value().clone())
    }

    fn next_job(&self) -> (WorkUnit, Frame) {
        let mut target = self.target.lock();

        target.work_unit = target.work_unit.next();
        let work_unit = target.work_unit;

        target.block.set_coinbase_work_unit(work_unit);
        target.block.update_merkle_root();

        let frame = Frame::job(&JobMessage {
            work_unit,
            head_meta: target.block.head_meta(),
        });

        (work_unit, frame)
    }

    fn transmit(&self, connection: &Connection, work_unit: WorkUnit, frame: Frame) {
        if let Err(err) = connection.write(frame) {
            warn!(
                "Failed to send work unit {work_unit} at height {} to {}: {err}",
                self.height,
                connection.peer()
            );
        }
    }

    /// Assigns the next work unit and sends a job for it to `connection`.
    ///
    /// Numbering advances even if the write fails.
    pub fn issue_job(&self, connection: &Connection) -> WorkUnit {
        let (work_unit, frame) = self.next_job();
        self.transmit(connection, work_unit, frame);
        work_unit
    }

    /// Like [`Self::issue_job`], remembering the work unit so the client's reports can be
    /// rebuilt.
    pub fn issue_job_to(&self, client: &Client) -> WorkUnit {
        let (work_unit, frame) = self.next_job();
        client.set_work_unit(work_unit);
        self.transmit(client.connection(), work_unit, frame);
        work_unit
    }

    /// Cheap pre-check on the height prefix of a reported candidate.
    pub fn accept_candidate(&self, bytes: &[u8]) -> bool {
        Height::from_prefix(bytes).is_ok_and(|height| height == self.height)
    }

    /// Records `block` as this period's solution. Only the first call wins.
    pub fn on_success(&self, block: T) -> bool {
        if self.success.set(block.clone()).is_err() {
            debug!("Period at height {} already has a block", self.height);
            return false;
        }

        info!("Period at height {} found a block", self.height);

        let Some(sink) = &self.sink else {
            return true;
        };

        match sink.try_send(block) {
            Ok(()) => {}
            Err(TrySendError::Full(block)) => match Handle::try_current() {
                Ok(handle) => {
                    debug!("Result sink full, delivering block in the background");
                    let sink = sink.clone();
                    let height = self.height;
                    handle.spawn(async move {
                        if sink.send(block).await.is_err() {
                            warn!(
                                "Result sink closed before block at height {height} was delivered"
                            );
                        }
                    });
                }
                Err(err) => {
                    warn!(
                        "Result sink full and no runtime to wait on it, dropping block at height {}: {err}",
                        self.height
                    );
                }
            },
            Err(TrySendError::Closed(_)) => {
                warn!(
                    "Result sink closed, dropping block at height {}",
                    self.height
                );
            }
        }

        true
    }

    pub fn success_block(&self) -> Option<&T> {
        self.success.get()
    }

    pub fn is_finished(&self) -> bool {
        self.success.get().is_some()
    }

    /// Tells every active client to stop mining. Returns the number of stop notices attempted.
    pub fn end_period(&self) -> usize {
        let mut attempted = 0;

        for account in self.accounts() {
            for connection in account.active_clients() {
                attempted += 1;
                if let Err(err) = connection.write(Frame::stop_mining()) {
                    debug!("Failed to send stop notice to {}: {err}", connection.peer());
                }
            }
        }

        info!(
            "Ended period at height {}, notified {attempted} clients",
            self.height
        );

        attempted
    }

    /// Point-in-time copy of the accounts.
    pub fn accounts(&self) -> Vec<Arc<Account>> {
        self.accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn work_units_issued(&self) -> WorkUnit {
        self.target.lock().work_unit
    }

    pub fn summary(&self) -> PeriodSummary {
        let mut accounts = self
            .accounts()
            .iter()
            .map(|account| AccountSummary {
                address: account.address().to_string(),
                clients: account.client_count(),
                worth: account.worth().to_string(),
            })
            .collect::<Vec<AccountSummary>>();

        accounts.sort_by(|a, b| a.address.cmp(&b.address));

        PeriodSummary {
            height: self.height,
            work_units_issued: self.work_units_issued(),
            finished: self.is_finished(),
            accounts,
        }
    }

    /// Processes a result report from `client`: rebuilds the candidate from the client's last
    /// work unit, credits its worth and finishes the period if it is a valid block.
    pub fn submit(&self, client: &Client, payload: &[u8]) -> Submission {
        if !self.accept_candidate(ResultReport::candidate_height(payload)) {
            return Submission::Stale;
        }

        let report = match ResultReport::decode(payload) {
            Ok(report) => report,
            Err(err) => {
                debug!("Malformed report from {}: {err}", client.connection().peer());
                return Submission::Malformed;
            }
        };

        let Some(work_unit) = client.work_unit() else {
            return Submission::Unassigned;
        };

        let template = self.target.lock().block.clone();

        let candidate = template.solve(work_unit, &report.coinbase_nonce, report.head_nonce);

        client.account().add_pow_worth(&candidate.digest());

        if !report.success {
            return Submission::Credited;
        }

        if !candidate.meets_target() {
            warn!(
                "Client {} of {} claimed a block that misses the target",
                client.connection().peer(),
                client.account().address()
            );
            return Submission::Invalid;
        }

        if self.on_success(candidate) {
            Submission::Block
        } else {
            Submission::Duplicate
        }
    }
}

use super::*;

/// Keeps the engine busy: while a job is pending, queues one fresh attempt for it after another.
///
/// A queued send is abandoned as soon as the pending job changes, so attempts never outlive the
/// job they were built from by more than what is already queued.
pub async fn feed(
    mut pending: watch::Receiver<Option<Arc<Job>>>,
    attempts: mpsc::Sender<Attempt>,
    cancel: CancellationToken,
) {
    loop {
        let job = tokio::select! {
            _ = cancel.cancelled() => return,
            job = pending.wait_for(Option::is_some) => match job {
                Ok(job) => job.clone(),
                Err(_) => return,
            },
        };

        let Some(job) = job else {
            continue;
        };

        let attempt = Attempt::new(job);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = pending.changed() => {}
            sent = attempts.send(attempt) => {
                if sent.is_err() {
                    return;
                }
            }
        }
    }
}

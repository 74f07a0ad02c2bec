use super::*;

pub(crate) mod pool;
pub(crate) mod worker;

#[derive(Debug, Parser)]
pub(crate) enum Subcommand {
    #[command(about = "Run a mining pool")]
    Pool(pool::Pool),
    #[command(about = "Mine for a pool")]
    Worker(worker::Worker),
}

impl Subcommand {
    pub(crate) async fn run(self, cancel_token: CancellationToken) -> Result {
        match self {
            Self::Pool(pool) => pool.run(cancel_token).await,
            Self::Worker(worker) => worker.run(cancel_token).await,
        }
    }
}

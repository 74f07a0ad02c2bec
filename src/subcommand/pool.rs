use {super::*, crate::block_template::BlockTemplate, pool_config::PoolConfig};

mod pool_config;

#[derive(Parser, Debug)]
pub(crate) struct Pool {
    #[command(flatten)]
    pub(crate) config: PoolConfig,
}

impl Pool {
    pub(crate) async fn run(&self, cancel_token: CancellationToken) -> Result {
        let config = &self.config;

        let template = BlockTemplate::builder(
            config.start_height(),
            BlockHash::all_zeros(),
            config.nbits(),
        )
        .payout(config.payout())
        .pool_sig(config.pool_sig())
        .build()?;

        let (pool, blocks) = crate::pool::Pool::new(template, config.sink_capacity());

        let address = config.address();
        let port = config.port();

        let listener = TcpListener::bind((address.clone(), port))
            .await
            .with_context(|| format!("failed to listen on {address}:{port}"))?;

        info!("Listening on {address}:{port}");

        let relay = tokio::spawn(relay_blocks(pool.clone(), blocks, cancel_token.clone()));

        pool.serve(listener, cancel_token).await?;

        relay.await?;

        Ok(())
    }
}

/// Prints every found block and moves the pool on to the next height.
async fn relay_blocks(
    pool: Arc<crate::pool::Pool<BlockTemplate>>,
    mut blocks: mpsc::Receiver<BlockTemplate>,
    cancel_token: CancellationToken,
) {
    loop {
        let block = tokio::select! {
            _ = cancel_token.cancelled() => break,
            block = blocks.recv() => match block {
                Some(block) => block,
                None => break,
            },
        };

        info!(
            "Found block {} at height {}",
            block.block_hash(),
            block.height()
        );

        println!("{}", hex::encode(consensus::serialize(block.block())));

        match block.successor() {
            Ok(successor) => {
                pool.begin_period(successor);
            }
            Err(err) => {
                error!("Failed to build template after height {}: {err:#}", block.height());
                break;
            }
        }
    }
}

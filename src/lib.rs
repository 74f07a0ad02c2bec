use {
    account::{Account, Client},
    anyhow::{Context, Error, anyhow, bail, ensure},
    arguments::Arguments,
    async_trait::async_trait,
    bitcoin::{
        Address, Amount, Block, BlockHash, CompactTarget, OutPoint, ScriptBuf, Sequence,
        Transaction, TxIn, TxMerkleNode, TxOut, Txid, Witness,
        address::NetworkUnchecked,
        block::{self, Header},
        consensus,
        hashes::{Hash, sha256d},
        locktime::absolute::LockTime,
        script::write_scriptint,
    },
    byteorder::{BigEndian, ByteOrder},
    clap::Parser,
    connection::{Connection, ConnectionId, FrameReader},
    dashmap::DashMap,
    derive_more::Display,
    futures::{sink::SinkExt, stream::StreamExt},
    minerwire::{
        CoinbaseNonce, Frame, FrameCodec, HeadNonce, Height, JobMessage, Message, MessageKind,
        ResultReport, WorkUnit,
    },
    parking_lot::{Mutex, RwLock},
    period::{MiningPeriod, Submission},
    pool::Pool,
    primitive_types::U512,
    serde::{Deserialize, Serialize},
    std::{
        env, iter, mem,
        net::SocketAddr,
        num::NonZeroUsize,
        process,
        sync::{
            Arc, LazyLock, OnceLock,
            atomic::{AtomicU64, Ordering},
        },
        thread,
        time::{Duration, SystemTime, UNIX_EPOCH},
    },
    template::{Digest, Template},
    tokio::{
        net::{
            TcpListener, TcpStream,
            tcp::{OwnedReadHalf, OwnedWriteHalf},
        },
        runtime::{Handle, Runtime},
        sync::{
            mpsc::{self, error::TrySendError},
            watch,
        },
        task::{self, JoinSet},
        time::{MissedTickBehavior, interval, timeout},
    },
    tokio_util::{
        codec::{FramedRead, FramedWrite},
        sync::CancellationToken,
    },
    tracing::{debug, error, info, warn},
    tracing_appender::non_blocking,
    tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt},
    worth::{Worth, hash_worth},
};

#[cfg(test)]
use minerwire::STOP_MINING;

pub mod account;
mod arguments;
pub mod block_template;
mod coinbase;
pub mod connection;
mod logs;
mod merkle;
pub mod period;
pub mod pool;
mod session;
mod signal;
mod subcommand;
pub mod template;
pub mod worker;
pub mod worth;

pub const COIN_VALUE: u64 = 100_000_000;
pub const DEFAULT_PORT: u16 = 3339;
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(120);
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);
pub const RESULT_CHANNEL_CAPACITY: usize = 64;
pub const WRITE_QUEUE_CAPACITY: usize = 64;

type Result<T = (), E = Error> = std::result::Result<T, E>;

pub fn main() {
    let _guard = logs::init();

    let args = Arguments::parse();

    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: failed to create tokio runtime: {err}");
            process::exit(1);
        }
    };

    runtime.block_on(async {
        let cancel_token = signal::setup_signal_handler();

        match args.run(cancel_token).await {
            Err(err) => {
                eprintln!("error: {err}");

                for (i, cause) in err.chain().skip(1).enumerate() {
                    if i == 0 {
                        eprintln!();
                        eprintln!("because:");
                    }
                    eprintln!("- {cause}");
                }

                if env::var_os("RUST_BACKTRACE")
                    .map(|val| val == "1")
                    .unwrap_or_default()
                {
                    eprintln!();
                    eprintln!("{}", err.backtrace());
                }
                process::exit(1);
            }
            Ok(_) => {
                process::exit(0);
            }
        }
    });
}

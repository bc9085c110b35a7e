//! FIX 4.4 acceptor backed by the full session engine.
//!
//! Architecture:
//! - one task per connection reads frames with [`FixCodec`] and delivers
//!   parsed messages into the session loop
//! - the session loop owns all session state and pushes outbound frames to a
//!   writer task
//! - business logic runs in a separate order-processor task fed through a
//!   channel by the application callbacks, and answers through the registry

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::BytesMut;
use rust_decimal::Decimal;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::Decoder as _;
use tracing::{error, info, warn};

use cobaltfix::engine::{Engine, SessionRegistry};
use cobaltfix::prelude::*;
use cobaltfix::store::FileStore;

mod common;
use common::{ExampleConfig, init_logging};

/// An inbound order forwarded from the session task to the processor.
#[derive(Debug)]
struct OrderRequest {
    session_id: SessionId,
    cl_ord_id: String,
    symbol: String,
    side: String,
    qty: String,
    price: Option<Decimal>,
}

/// Application that acknowledges orders through an order-processor task.
struct ExchangeApp {
    orders: mpsc::Sender<OrderRequest>,
}

#[async_trait]
impl Application for ExchangeApp {
    async fn on_create(&self, session_id: &SessionId) {
        info!(session = %session_id, "session created");
    }

    async fn on_logon(&self, session_id: &SessionId) {
        info!(session = %session_id, "logged on");
    }

    async fn on_logout(&self, session_id: &SessionId) {
        info!(session = %session_id, "logged out");
    }

    async fn to_admin(&self, _message: &mut MessageBuilder, _session_id: &SessionId) {}

    async fn from_admin(
        &self,
        _message: &OwnedMessage,
        _session_id: &SessionId,
    ) -> std::result::Result<(), RejectReason> {
        Ok(())
    }

    async fn to_app(
        &self,
        _message: &mut MessageBuilder,
        _session_id: &SessionId,
    ) -> std::result::Result<(), DoNotSend> {
        Ok(())
    }

    async fn from_app(
        &self,
        message: &OwnedMessage,
        session_id: &SessionId,
    ) -> std::result::Result<(), RejectReason> {
        if message.msg_type().as_str() != "D" {
            warn!(msg_type = %message.msg_type(), "unsupported application message");
            return Ok(());
        }

        let order = OrderRequest {
            session_id: session_id.clone(),
            cl_ord_id: message.get_field_str(tags::CL_ORD_ID).unwrap_or("").into(),
            symbol: message.get_field_str(tags::SYMBOL).unwrap_or("N/A").into(),
            side: message.get_field_str(tags::SIDE).unwrap_or("1").into(),
            qty: message.get_field_str(tags::ORDER_QTY).unwrap_or("0").into(),
            price: message
                .get_field_str(tags::PRICE)
                .and_then(|p| Decimal::from_str(p).ok()),
        };
        // Hand off; execution reports come back through the registry.
        if self.orders.try_send(order).is_err() {
            warn!("order processor backlogged, dropping order");
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cfg = ExampleConfig::acceptor();
    info!("starting FIX 4.4 acceptor on {}", cfg.addr());

    let (orders_tx, orders_rx) = mpsc::channel(1024);
    let engine = Arc::new(
        EngineBuilder::new()
            .with_application(ExchangeApp { orders: orders_tx })
            .build(),
    );

    tokio::spawn(order_processor(orders_rx, engine.registry()));

    let listener = TcpListener::bind(cfg.addr()).await?;
    loop {
        let (socket, addr) = listener.accept().await?;
        info!("connection from {addr}");
        let engine = Arc::clone(&engine);
        let cfg = cfg.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, engine, cfg).await {
                error!("connection error: {e}");
            }
        });
    }
}

/// Fills and acknowledges orders; decoupled from the session tasks.
async fn order_processor(
    mut orders: mpsc::Receiver<OrderRequest>,
    registry: Arc<SessionRegistry>,
) {
    let mut exec_id: u64 = 0;
    while let Some(order) = orders.recv().await {
        exec_id += 1;
        info!(
            session = %order.session_id,
            cl_ord_id = %order.cl_ord_id,
            symbol = %order.symbol,
            qty = %order.qty,
            price = ?order.price,
            "filling order"
        );

        let mut exec = MessageBuilder::new(MsgType::App("8".to_string()));
        exec.set_body(tags::ORDER_ID, format!("ORD{exec_id}"));
        exec.set_body(tags::EXEC_ID, format!("EX{exec_id}"));
        exec.set_body(tags::CL_ORD_ID, order.cl_ord_id);
        exec.set_body(tags::EXEC_TYPE, "0");
        exec.set_body(tags::ORD_STATUS, "0");
        exec.set_body(tags::SYMBOL, order.symbol);
        exec.set_body(tags::SIDE, order.side);
        exec.set_body(tags::LEAVES_QTY, order.qty);
        exec.set_body(tags::CUM_QTY, "0");
        if let Some(price) = order.price {
            exec.set_body_decimal(tags::AVG_PX, price);
        } else {
            exec.set_body(tags::AVG_PX, "0");
        }

        if let Err(e) = registry.send_to(&order.session_id, exec).await {
            warn!(session = %order.session_id, error = %e, "failed to send execution report");
        }
    }
}

async fn handle_connection(
    socket: TcpStream,
    engine: Arc<Engine<ExchangeApp>>,
    cfg: ExampleConfig,
) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = SessionConfig::new(
        BeginString::Fix44,
        CompId::new(&cfg.sender_comp_id).ok_or("sender comp id too long")?,
        CompId::new(&cfg.target_comp_id).ok_or("target comp id too long")?,
    )
    .with_heartbeat_interval(std::time::Duration::from_secs(cfg.heartbeat_interval));
    let session_id = config.session_id();

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();

    let (handle, join) = match &cfg.store_dir {
        Some(dir) => {
            let store = Arc::new(FileStore::open(dir, &session_id.storage_key())?);
            engine.start_session(config, store, outbound_tx).await
        }
        None => {
            let store = Arc::new(MemoryStore::new());
            engine.start_session(config, store, outbound_tx).await
        }
    };

    let (mut read_half, mut write_half) = socket.into_split();

    // Writer: drain the session's outbound frames onto the socket.
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if let Err(e) = write_half.write_all(&frame).await {
                error!("write error: {e}");
                break;
            }
        }
    });

    // Reader: cut frames, parse, deliver to the session loop.
    let mut codec = FixCodec::new();
    let mut buf = BytesMut::with_capacity(4096);
    loop {
        match read_half.read_buf(&mut buf).await {
            Ok(0) => {
                info!(session = %handle.session_id(), "peer closed connection");
                break;
            }
            Ok(_) => loop {
                match codec.decode(&mut buf) {
                    Ok(Some(frame)) => match Decoder::new(&frame).decode() {
                        Ok(raw) => {
                            if handle.deliver(raw.to_owned()).await.is_err() {
                                return finish(engine, handle.session_id().clone(), writer, join)
                                    .await;
                            }
                        }
                        Err(e) => warn!("dropping unparseable frame: {e}"),
                    },
                    Ok(None) => break,
                    Err(e) => {
                        error!("framing error: {e}");
                        let _ = handle.disconnect().await;
                        return finish(engine, handle.session_id().clone(), writer, join).await;
                    }
                }
            },
            Err(e) => {
                error!("read error: {e}");
                break;
            }
        }
    }

    let _ = handle.disconnect().await;
    finish(engine, handle.session_id().clone(), writer, join).await
}

async fn finish(
    engine: Arc<Engine<ExchangeApp>>,
    session_id: SessionId,
    writer: tokio::task::JoinHandle<()>,
    join: tokio::task::JoinHandle<()>,
) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    engine.registry().unregister(&session_id);
    let _ = join.await;
    let _ = writer.await;
    Ok(())
}

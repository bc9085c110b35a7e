//! FIX 4.4 initiator: connects, logs on, sends one order, logs out.

use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::codec::Decoder as _;
use tracing::{error, info, warn};

use cobaltfix::prelude::*;

mod common;
use common::{ExampleConfig, init_logging};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cfg = ExampleConfig::initiator();
    info!("connecting to {}", cfg.addr());

    let config = SessionConfig::new(
        BeginString::Fix44,
        CompId::new(&cfg.sender_comp_id).ok_or("sender comp id too long")?,
        CompId::new(&cfg.target_comp_id).ok_or("target comp id too long")?,
    )
    .with_heartbeat_interval(Duration::from_secs(cfg.heartbeat_interval));

    let engine = EngineBuilder::new().build();
    let socket = TcpStream::connect(cfg.addr()).await?;
    let (mut read_half, mut write_half) = socket.into_split();

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    let store = Arc::new(MemoryStore::new());
    let (handle, join) = engine.start_session(config, store, outbound_tx).await;

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if let Err(e) = write_half.write_all(&frame).await {
                error!("write error: {e}");
                break;
            }
        }
    });

    let reader_handle = handle.clone();
    let reader = tokio::spawn(async move {
        let mut codec = FixCodec::new();
        let mut buf = BytesMut::with_capacity(4096);
        loop {
            match read_half.read_buf(&mut buf).await {
                Ok(0) => {
                    info!("server closed connection");
                    let _ = reader_handle.disconnect().await;
                    break;
                }
                Ok(_) => loop {
                    match codec.decode(&mut buf) {
                        Ok(Some(frame)) => match Decoder::new(&frame).decode() {
                            Ok(raw) => {
                                if reader_handle.deliver(raw.to_owned()).await.is_err() {
                                    return;
                                }
                            }
                            Err(e) => warn!("dropping unparseable frame: {e}"),
                        },
                        Ok(None) => break,
                        Err(e) => {
                            error!("framing error: {e}");
                            let _ = reader_handle.disconnect().await;
                            return;
                        }
                    }
                },
                Err(e) => {
                    error!("read error: {e}");
                    let _ = reader_handle.disconnect().await;
                    break;
                }
            }
        }
    });

    handle.initiate_logon().await?;
    sleep(Duration::from_millis(500)).await;

    let mut order = MessageBuilder::new(MsgType::App("D".to_string()));
    order.set_body(tags::CL_ORD_ID, "ORDER-1");
    order.set_body(tags::SYMBOL, "MSFT");
    order.set_body(tags::SIDE, "1");
    order.set_body(tags::ORDER_QTY, "100");
    order.set_body(tags::ORD_TYPE, "2");
    order.set_body(tags::PRICE, "101.25");
    info!("sending order");
    handle.send(order).await?;

    sleep(Duration::from_secs(2)).await;
    info!("logging out");
    handle.initiate_logout("session complete").await?;

    let _ = join.await;
    let _ = writer.await;
    reader.abort();
    Ok(())
}

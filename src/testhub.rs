// ── Hubchat: In-Process Test Hub ───────────────────────────────────────────
// Minimal hub used by connection and session tests: accepts WebSocket
// clients on a loopback port, decodes SendMessage frames, and fans them back
// out to every connected client as ReceiveMessage frames, the original
// sender included. `kick` force-closes all current client sockets while the
// listener keeps accepting, which is how tests simulate a transport drop.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Notify};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::wire::ChatEvent;

pub(crate) struct TestHub {
    pub url: String,
    tx: broadcast::Sender<String>,
    kick: Arc<Notify>,
}

impl TestHub {
    /// Push an inbound event to every connected client, as the hub would
    /// after receiving a SendMessage from some peer.
    pub fn broadcast(&self, sender: &str, text: &str) {
        let _ = self.tx.send(ChatEvent::new(sender, text).encode_inbound());
    }

    /// Close every currently connected client socket. The listener stays up,
    /// so clients can reconnect.
    pub fn kick(&self) {
        self.kick.notify_waiters();
    }
}

pub(crate) async fn spawn_hub() -> TestHub {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test hub");
    let port = listener.local_addr().expect("hub addr").port();
    let (tx, _) = broadcast::channel::<String>(64);
    let kick = Arc::new(Notify::new());

    let fanout = tx.clone();
    let kick_signal = kick.clone();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else { break };
            let ws = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(_) => continue,
            };
            let tx = fanout.clone();
            let mut rx = fanout.subscribe();
            let kick = kick_signal.clone();
            tokio::spawn(async move {
                let (mut write, mut read) = ws.split();
                loop {
                    tokio::select! {
                        frame = read.next() => {
                            match frame {
                                Some(Ok(WsMessage::Text(raw))) => {
                                    if let Some(ev) = ChatEvent::decode_outbound(&raw) {
                                        let _ = tx.send(ev.encode_inbound());
                                    }
                                }
                                Some(Ok(WsMessage::Ping(data))) => {
                                    let _ = write.send(WsMessage::Pong(data)).await;
                                }
                                Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
                                Some(Ok(_)) => {}
                            }
                        }
                        out = rx.recv() => {
                            let Ok(raw) = out else { continue };
                            if write.send(WsMessage::Text(raw)).await.is_err() {
                                break;
                            }
                        }
                        _ = kick.notified() => {
                            let _ = write.close().await;
                            break;
                        }
                    }
                }
            });
        }
    });

    TestHub { url: format!("ws://127.0.0.1:{}/chathub", port), tx, kick }
}

/// Poll `cond` until it holds or the timeout elapses.
pub(crate) async fn wait_for<F: Fn() -> bool>(cond: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    cond()
}

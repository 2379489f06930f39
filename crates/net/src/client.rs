//! TCP client for the chat gateway

use std::net::SocketAddr;

use tokio::io::{ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};
use crate::protocol::GatewayMessage;

/// Event surfaced to the bot runtime
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// Registration accepted, updates will flow
    Ready,
    /// An update from a chat (Command or Callback)
    Update(GatewayMessage),
    /// Ack for a posted message
    Posted {
        correlation: Uuid,
        chat_id: i64,
        message_ref: i64,
    },
    /// Connection lost
    Disconnected,
}

enum ClientCommand {
    Send(GatewayMessage),
    Disconnect,
}

/// Client handle for gateway operations
pub struct GatewayClient {
    event_rx: mpsc::Receiver<GatewayEvent>,
    cmd_tx: mpsc::Sender<ClientCommand>,
}

impl GatewayClient {
    /// Connect to the gateway and start the registration handshake
    pub async fn connect(addr: SocketAddr, token: String) -> Result<Self> {
        info!(addr = %addr, "Connecting to gateway");

        let stream = TcpStream::connect(addr).await?;
        let (reader, mut writer) = tokio::io::split(stream);

        write_frame(&mut writer, &GatewayMessage::Register { token }).await?;

        let (event_tx, event_rx) = mpsc::channel(64);
        let (cmd_tx, cmd_rx) = mpsc::channel(64);

        tokio::spawn(connection_task(reader, writer, event_tx, cmd_rx));

        Ok(GatewayClient { event_rx, cmd_tx })
    }

    /// Get the next gateway event
    pub async fn next_event(&mut self) -> Option<GatewayEvent> {
        self.event_rx.recv().await
    }

    /// Send a message to the gateway
    pub async fn send(&self, msg: GatewayMessage) -> Result<()> {
        self.cmd_tx
            .send(ClientCommand::Send(msg))
            .await
            .map_err(|_| Error::NotConnected)
    }

    /// Disconnect from the gateway
    pub async fn disconnect(&self) {
        let _ = self.cmd_tx.send(ClientCommand::Disconnect).await;
    }
}

/// Main connection task
async fn connection_task(
    mut reader: ReadHalf<TcpStream>,
    mut writer: WriteHalf<TcpStream>,
    event_tx: mpsc::Sender<GatewayEvent>,
    mut cmd_rx: mpsc::Receiver<ClientCommand>,
) {
    // First frame decides the session: Registered or Rejected
    match read_frame(&mut reader).await {
        Ok(GatewayMessage::Registered) => {
            info!("Registered with gateway");
            let _ = event_tx.send(GatewayEvent::Ready).await;
        }
        Ok(GatewayMessage::Rejected { reason }) => {
            warn!(reason = %reason, "Gateway rejected registration");
            let _ = event_tx.send(GatewayEvent::Disconnected).await;
            return;
        }
        Ok(_) => {
            warn!("Unexpected first message from gateway");
            let _ = event_tx.send(GatewayEvent::Disconnected).await;
            return;
        }
        Err(e) => {
            error!(error = %e, "Failed to read registration response");
            let _ = event_tx.send(GatewayEvent::Disconnected).await;
            return;
        }
    }

    loop {
        tokio::select! {
            result = read_frame(&mut reader) => {
                match result {
                    Ok(msg) => dispatch(msg, &event_tx).await,
                    Err(Error::ConnectionClosed) => {
                        debug!("Gateway closed connection");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "Read error");
                        break;
                    }
                }
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(ClientCommand::Send(msg)) => {
                        if let Err(e) = write_frame(&mut writer, &msg).await {
                            warn!(error = %e, "Write error");
                            break;
                        }
                    }
                    Some(ClientCommand::Disconnect) | None => {
                        debug!("Disconnect requested");
                        break;
                    }
                }
            }
        }
    }

    let _ = event_tx.send(GatewayEvent::Disconnected).await;
    info!("Disconnected from gateway");
}

/// Route one inbound frame to the event channel
async fn dispatch(msg: GatewayMessage, event_tx: &mpsc::Sender<GatewayEvent>) {
    match msg {
        update @ (GatewayMessage::Command { .. } | GatewayMessage::Callback { .. }) => {
            let _ = event_tx.send(GatewayEvent::Update(update)).await;
        }
        GatewayMessage::MessagePosted {
            correlation,
            chat_id,
            message_ref,
        } => {
            let _ = event_tx
                .send(GatewayEvent::Posted {
                    correlation,
                    chat_id,
                    message_ref,
                })
                .await;
        }
        GatewayMessage::Pong => {
            debug!("Received pong");
        }
        other => {
            debug!(message = ?other, "Ignoring unexpected gateway message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SenderInfo;
    use chrono::Utc;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn register_receive_and_send() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let gateway = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (mut reader, mut writer) = tokio::io::split(stream);

            let hello = read_frame(&mut reader).await.unwrap();
            assert!(matches!(hello, GatewayMessage::Register { .. }));

            write_frame(&mut writer, &GatewayMessage::Registered)
                .await
                .unwrap();
            write_frame(
                &mut writer,
                &GatewayMessage::Command {
                    chat_id: 42,
                    chat_title: "Tigers".into(),
                    sender: SenderInfo {
                        name: "Alice".into(),
                        handle: "alice".into(),
                    },
                    command: "/nextmatch".into(),
                    args: String::new(),
                    update_id: "u-1".into(),
                    timestamp: Utc::now(),
                },
            )
            .await
            .unwrap();

            let outbound = read_frame(&mut reader).await.unwrap();
            assert!(matches!(outbound, GatewayMessage::Ping));
        });

        let mut client = GatewayClient::connect(addr, "secret".into()).await.unwrap();

        assert!(matches!(
            client.next_event().await,
            Some(GatewayEvent::Ready)
        ));
        match client.next_event().await {
            Some(GatewayEvent::Update(GatewayMessage::Command { chat_id, .. })) => {
                assert_eq!(chat_id, 42);
            }
            other => panic!("expected command update, got {other:?}"),
        }

        client.send(GatewayMessage::Ping).await.unwrap();
        gateway.await.unwrap();

        client.disconnect().await;
        assert!(matches!(
            client.next_event().await,
            Some(GatewayEvent::Disconnected)
        ));
    }

    #[tokio::test]
    async fn rejected_registration_disconnects() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (mut reader, mut writer) = tokio::io::split(stream);
            let _ = read_frame(&mut reader).await.unwrap();
            write_frame(
                &mut writer,
                &GatewayMessage::Rejected {
                    reason: "bad token".into(),
                },
            )
            .await
            .unwrap();
        });

        let mut client = GatewayClient::connect(addr, "wrong".into()).await.unwrap();
        assert!(matches!(
            client.next_event().await,
            Some(GatewayEvent::Disconnected)
        ));
    }
}

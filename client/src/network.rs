use futures_util::{SinkExt, StreamExt};
use log::{debug, warn};
use shared::{ClientMessage, ServerMessage};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub struct LobbyClient {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl LobbyClient {
    pub async fn connect(
        server_addr: &str,
        lobby_id: &str,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let url = format!("ws://{}/lobby?id={}", server_addr, lobby_id);
        debug!("Connecting to {}", url);

        let (socket, _) = connect_async(url.as_str()).await?;
        Ok(LobbyClient { socket })
    }

    pub async fn send_move(
        &mut self,
        row: usize,
        col: usize,
        value: u8,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.send(&ClientMessage::Move { row, col, value }).await
    }

    pub async fn send_clear(
        &mut self,
        row: usize,
        col: usize,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.send(&ClientMessage::Clear { row, col }).await
    }

    pub async fn request_state(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.send(&ClientMessage::RequestState).await
    }

    async fn send(&mut self, message: &ClientMessage) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string(message)?;
        self.socket.send(Message::Text(json)).await?;
        Ok(())
    }

    /// Waits for the next parseable server message. Returns `None` once the
    /// connection is closed or broken.
    pub async fn next_message(&mut self) -> Option<ServerMessage> {
        while let Some(result) = self.socket.next().await {
            match result {
                Ok(Message::Text(text)) => match serde_json::from_str(&text) {
                    Ok(message) => return Some(message),
                    Err(err) => warn!("Discarding unparseable server message: {}", err),
                },
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(err) => {
                    warn!("Socket error: {}", err);
                    return None;
                }
            }
        }
        None
    }

    pub async fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.socket.close(None).await?;
        Ok(())
    }
}

//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::matchmaking::LobbyHandle;
use crate::session::PlayerId;
use crate::util::rate_limit::PlayerRateLimiter;
use crate::ws::protocol::{ClientMsg, ProtocolError, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (ws_sink, mut ws_stream) = socket.split();
    let (out_tx, out_rx) = mpsc::unbounded_channel::<ServerMsg>();

    // Writer must be draining before the lobby starts sending
    let writer_handle = tokio::spawn(run_writer(ws_sink, out_rx));

    let Some(player_id) = state.lobby.connect(out_tx).await else {
        error!("Lobby unavailable, dropping connection");
        writer_handle.abort();
        return;
    };

    let rate_limiter = PlayerRateLimiter::new(state.config.input_rate_limit);

    // Reader loop: WebSocket -> lobby
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                handle_text(&state.lobby, &rate_limiter, player_id, &text).await;
            }
            Ok(Message::Binary(_)) => {
                warn!(player_id = %player_id, error = %ProtocolError::Binary, "Dropping client message");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                debug!(player_id = %player_id, "Received ping/pong");
            }
            Ok(Message::Close(_)) => {
                info!(player_id = %player_id, "Client initiated close");
                break;
            }
            Err(e) => {
                debug!(player_id = %player_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Removing the player drops its sender, which ends the writer
    state.lobby.disconnect(player_id).await;
    if let Err(e) = writer_handle.await {
        debug!(player_id = %player_id, error = %e, "Writer task ended abnormally");
    }

    info!(player_id = %player_id, "WebSocket connection closed");
}

async fn handle_text(
    lobby: &LobbyHandle,
    rate_limiter: &PlayerRateLimiter,
    player_id: PlayerId,
    text: &str,
) {
    match ClientMsg::parse(text) {
        Ok(ClientMsg::PlayerInput { input }) => {
            if !rate_limiter.check_input_kind(input) {
                warn!(player_id = %player_id, ?input, "Rate limited input message");
                return;
            }
            lobby.input(player_id, input).await;
        }
        Err(e) => {
            if rate_limiter.check_input() {
                warn!(player_id = %player_id, error = %e, "Dropping client message");
            }
        }
    }
}

/// Drain outbound messages into the socket until either side closes
async fn run_writer(
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut out_rx: mpsc::UnboundedReceiver<ServerMsg>,
) {
    while let Some(msg) = out_rx.recv().await {
        if let Err(e) = send_msg(&mut ws_sink, &msg).await {
            debug!(error = %e, "WebSocket send failed");
            break;
        }
    }
    let _ = ws_sink.close().await;
}

/// Send a message over WebSocket
async fn send_msg(sink: &mut SplitSink<WebSocket, Message>, msg: &ServerMsg) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json)).await.map_err(|e| e.to_string())
}

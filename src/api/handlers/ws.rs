use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};

use crate::{
    api::state::AppState,
    realtime::{DisplaySubscriber, ServerEvent},
};

pub async fn display_board(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let ctx = &state.service_context;
    let (mut subscriber, mut events, snapshot) =
        match DisplaySubscriber::connect(ctx.channels.clone(), ctx.display_service.clone()).await {
            Ok(connected) => connected,
            Err(e) => {
                tracing::error!("Could not start display board session: {}", e);
                return;
            }
        };

    let (mut sender, mut receiver) = socket.split();

    if send_event(&mut sender, &snapshot).await.is_ok() {
        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    if send_event(&mut sender, &event).await.is_err() {
                        break;
                    }
                }
                message = receiver.next() => match message {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = subscriber.handle_text(&text).await {
                            if send_event(&mut sender, &reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!("Display board {} socket error: {}", subscriber.id(), e);
                        break;
                    }
                },
            }
        }
    }

    subscriber.disconnect().await;
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("Failed to serialize display board event: {}", e);
            return Ok(());
        }
    };
    sender.send(Message::Text(text)).await
}

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use palaver::SessionBuilder;
use palaver::core::transcript::{Sender, Turn};
use palaver::core::{ClientConfigBuilder, ConnectionStatus, Update};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

/// Greets the client, then answers every frame.
async fn serve_assistant() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::Text("Hello! How can I **help**?".into()))
            .await
            .unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Text(text) = msg {
                let reply = format!("You said: {}", text.as_str());
                if ws.send(Message::Text(reply.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    port
}

async fn next_assistant_turn(
    update_rx: &mut mpsc::UnboundedReceiver<Update>,
) -> Turn {
    loop {
        let update = timeout(Duration::from_secs(5), update_rx.recv())
            .await
            .expect("timed out waiting for an update")
            .expect("update channel closed");
        if let Update::TurnAppended { turn, .. } = update {
            if turn.sender() == Sender::Assistant {
                return turn;
            }
        }
    }
}

#[tokio::test]
async fn test_chat_over_websocket() {
    let port = serve_assistant().await;
    let config = ClientConfigBuilder::new()
        .with_host(format!("127.0.0.1:{port}"))
        .build();

    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    let session = SessionBuilder::with_config(config)
        .with_session_id(7.into())
        .on_update(move |update| {
            update_tx.send(update.clone()).ok();
        })
        .build();
    assert_eq!(
        session.controller().endpoint().url(),
        format!("ws://127.0.0.1:{port}/ws/7")
    );

    let greeting = next_assistant_turn(&mut update_rx).await;
    assert_eq!(greeting.text(), "Hello! How can I **help**?");
    assert_eq!(session.status().await, ConnectionStatus::Open);

    session.send_message("hello").await.unwrap();
    let reply = next_assistant_turn(&mut update_rx).await;
    assert_eq!(reply.text(), "You said: hello");

    let snapshot = session.snapshot().await.unwrap();
    assert!(!snapshot.pending);
    let senders: Vec<_> =
        snapshot.transcript.iter().map(Turn::sender).collect();
    assert_eq!(
        senders,
        [Sender::System, Sender::Assistant, Sender::User, Sender::Assistant]
    );

    session.shutdown().await;
    assert_eq!(session.status().await, ConnectionStatus::Closed);
}

#[tokio::test]
async fn test_unreachable_backend() {
    // Bind and drop to get a port nobody listens on.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = ClientConfigBuilder::new()
        .with_host(format!("127.0.0.1:{port}"))
        .build();
    let session = SessionBuilder::with_config(config)
        .with_connect_timeout(Duration::from_secs(5))
        .build();

    let mut status = session.status().await;
    for _ in 0..100 {
        if status == ConnectionStatus::Errored {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        status = session.status().await;
    }
    assert_eq!(status, ConnectionStatus::Errored);

    let err = session.send_message("hello").await.unwrap_err();
    assert_eq!(err.kind(), palaver::core::ErrorKind::ConnectionNotOpen);
}

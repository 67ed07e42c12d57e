use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use palaver_transport::{CloseInfo, EventSink, SocketState, StateCell};
use tokio::net::TcpStream;
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug)]
pub enum Command {
    Send(String),
    Close,
}

enum Outcome {
    Closed(Option<CloseInfo>),
    Failed(String),
}

pub async fn run_socket(
    url: String,
    connect_timeout: Option<Duration>,
    state: StateCell,
    sink: EventSink,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
) {
    // Nothing can be sent before the socket opens, so the only command
    // that matters here is a close request.
    let connected = select! {
        biased;

        _ = wait_for_close(&mut cmd_rx) => {
            debug!("closed while connecting");
            finish(&state, &sink, Outcome::Closed(None));
            return;
        }
        res = connect(&url, connect_timeout) => res,
    };

    let ws = match connected {
        Ok(ws) => ws,
        Err(err) => {
            warn!("failed to connect: {err}");
            finish(&state, &sink, Outcome::Failed(err));
            return;
        }
    };

    if !state.transition(SocketState::Open) {
        // A close request won the race against the handshake.
        let mut ws = ws;
        ws.close(None).await.ok();
        finish(&state, &sink, Outcome::Closed(None));
        return;
    }
    debug!("opened");
    sink.opened();

    let outcome = pump(ws, &sink, &mut cmd_rx).await;
    finish(&state, &sink, outcome);
}

async fn connect(
    url: &str,
    connect_timeout: Option<Duration>,
) -> Result<WsStream, String> {
    let handshake = connect_async(url);
    let result = match connect_timeout {
        Some(limit) => match timeout(limit, handshake).await {
            Ok(result) => result,
            Err(_) => return Err(format!("timed out after {limit:?}")),
        },
        None => handshake.await,
    };
    result.map(|(ws, _)| ws).map_err(|err| format!("{err}"))
}

async fn wait_for_close(cmd_rx: &mut mpsc::UnboundedReceiver<Command>) {
    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            Command::Close => return,
            Command::Send(_) => {
                warn!("discarding a frame sent before the socket opened");
            }
        }
    }
}

async fn pump(
    ws: WsStream,
    sink: &EventSink,
    cmd_rx: &mut mpsc::UnboundedReceiver<Command>,
) -> Outcome {
    let (mut ws_tx, mut ws_rx) = ws.split();
    loop {
        select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(Command::Send(text)) => {
                    trace!("sending {} bytes", text.len());
                    let frame = Message::Text(text.into());
                    if let Err(err) = ws_tx.send(frame).await {
                        return Outcome::Failed(format!("{err}"));
                    }
                }
                Some(Command::Close) | None => {
                    // Best effort, the peer may already be gone.
                    ws_tx.close().await.ok();
                    return Outcome::Closed(None);
                }
            },
            msg = ws_rx.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    trace!("received {} bytes", text.len());
                    sink.message(text.as_str());
                }
                Some(Ok(Message::Close(frame))) => {
                    return Outcome::Closed(frame.map(close_info));
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return Outcome::Failed(format!("{err}")),
                None => return Outcome::Closed(None),
            },
        }
    }
}

fn close_info(frame: CloseFrame) -> CloseInfo {
    CloseInfo {
        code: frame.code.into(),
        reason: frame.reason.as_str().to_owned(),
    }
}

fn finish(state: &StateCell, sink: &EventSink, outcome: Outcome) {
    match outcome {
        Outcome::Closed(info) => {
            state.transition(SocketState::Closed);
            debug!(?info, "closed");
            sink.closed(info);
        }
        Outcome::Failed(err) => {
            state.transition(SocketState::Failed);
            sink.errored(err);
            sink.closed(None);
        }
    }
}

//! WebSocket front end
//!
//! Each connection gets a writer task that owns the socket sink. Every
//! `start-crawl` request spawns a session task with its own event streamer
//! writing into that connection. Closing the connection cancels its
//! sessions; they still finalize before the connection task ends.

mod protocol;

pub use protocol::{parse_inbound, Inbound, ProtocolError};

use crate::crawler::SessionRunner;
use crate::stream::{spawn_streamer, Event};
use crate::CrawlerError;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

/// Accepts subscriber connections and runs their crawl requests
pub struct CrawlServer {
    runner: Arc<SessionRunner>,
    progress_window: Duration,
    shutdown: CancellationToken,
}

impl CrawlServer {
    pub fn new(runner: Arc<SessionRunner>, progress_window: Duration) -> Self {
        Self {
            runner,
            progress_window,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops the accept loop and cancels every session
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Serves connections until the shutdown token fires
    ///
    /// Waits for open connections (and their sessions) to wind down
    /// before returning.
    pub async fn serve(self, listener: TcpListener) -> Result<(), CrawlerError> {
        tracing::info!("Listening for subscribers on ws://{}", listener.local_addr()?);

        let mut connections: Vec<JoinHandle<()>> = Vec::new();

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        connections.retain(|handle| !handle.is_finished());
                        let runner = self.runner.clone();
                        let window = self.progress_window;
                        let cancel = self.shutdown.child_token();
                        connections.push(tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, peer, runner, window, cancel).await {
                                tracing::debug!("Connection {} ended with error: {}", peer, e);
                            }
                        }));
                    }
                    Err(e) => tracing::warn!("Failed to accept connection: {}", e),
                },
            }
        }

        tracing::info!("Shutting down, waiting for {} connections", connections.len());
        for handle in connections {
            let _ = handle.await;
        }
        Ok(())
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    runner: Arc<SessionRunner>,
    window: Duration,
    cancel: CancellationToken,
) -> Result<(), CrawlerError> {
    let socket = tokio_tungstenite::accept_async(stream).await?;
    tracing::info!("Subscriber connected: {}", peer);

    let (mut sink, mut source) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();

    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let mut sessions: Vec<JoinHandle<()>> = Vec::new();

    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => break,
            message = source.next() => message,
        };

        let message = match message {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                tracing::debug!("Read error from {}: {}", peer, e);
                break;
            }
            None => break,
        };

        match message {
            Message::Text(text) => match parse_inbound(&text) {
                Ok(Inbound::StartCrawl { url, user_id }) => {
                    tracing::info!("start-crawl from {} for user {}: {}", peer, user_id, url);
                    sessions.push(spawn_session(
                        runner.clone(),
                        window,
                        out_tx.clone(),
                        user_id,
                        url,
                        cancel.child_token(),
                    ));
                }
                Err(e) => reply(&out_tx, Event::session_error(e.to_string())),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    tracing::info!("Subscriber disconnected: {}", peer);
    cancel.cancel();
    for session in sessions {
        let _ = session.await;
    }

    drop(out_tx);
    let _ = writer.await;
    Ok(())
}

fn reply(out: &mpsc::UnboundedSender<String>, event: Event) {
    if let Ok(frame) = event.to_json() {
        let _ = out.send(frame);
    }
}

/// Runs one session with its own event streamer
///
/// A session task that dies still ends with a terminal `error` event; its
/// crawl flag is released by the session's own admission on unwind.
fn spawn_session(
    runner: Arc<SessionRunner>,
    window: Duration,
    out: mpsc::UnboundedSender<String>,
    user_id: String,
    url: String,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let (events, streamer) = spawn_streamer(window, out);

        let task = {
            let events = events.clone();
            let user_id = user_id.clone();
            tokio::spawn(async move { runner.run(&user_id, &url, events, cancel).await })
        };

        if let Err(e) = task.await {
            tracing::error!("Session task for user {} aborted: {}", user_id, e);
            events.send(Event::session_error("Crawl aborted unexpectedly."));
        }

        drop(events);
        let _ = streamer.await;
    })
}

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::broadcast;

use renmado_ipc::{ControlEvent, SubscribeRequest};

use super::transport::{Listener, EVENT_ENDPOINT};

pub struct EventServer {
    endpoint: String,
    event_rx: broadcast::Receiver<ControlEvent>,
}

impl EventServer {
    pub fn new(event_rx: broadcast::Receiver<ControlEvent>) -> Self {
        Self {
            endpoint: EVENT_ENDPOINT.to_string(),
            event_rx,
        }
    }

    pub async fn run(self) -> Result<()> {
        let mut listener = Listener::bind(&self.endpoint)
            .with_context(|| format!("Failed to listen on {}", self.endpoint))?;
        tracing::info!("Event server listening on {}", self.endpoint);

        loop {
            match listener.accept().await {
                Ok(stream) => {
                    let event_rx = self.event_rx.resubscribe();
                    tokio::spawn(async move {
                        if let Err(e) = handle_subscriber(stream, event_rx).await {
                            tracing::debug!("Event subscriber disconnected: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Event server accept error: {}", e);
                }
            }
        }
    }
}

/// Reads the subscribe request line, then streams matching events until the
/// subscriber goes away or the broadcaster closes.
pub(crate) async fn handle_subscriber<S>(
    stream: S,
    mut event_rx: broadcast::Receiver<ControlEvent>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Ok(()); // EOF
    }

    let request: SubscribeRequest = serde_json::from_str(line.trim()).unwrap_or_default();
    let filter = request.effective_filter();

    tracing::debug!("New event subscriber with filter: {:?}", filter);

    loop {
        match event_rx.recv().await {
            Ok(event) => {
                if filter.matches(&event) {
                    let json = serde_json::to_string(&event)?;
                    writer.write_all(json.as_bytes()).await?;
                    writer.write_all(b"\n").await?;
                    writer.flush().await?;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("Event subscriber lagged by {} messages", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    Ok(())
}

/// Sender side of the event stream, cheap to clone into callbacks.
#[derive(Clone)]
pub struct EventBroadcaster {
    event_tx: broadcast::Sender<ControlEvent>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity);
        Self { event_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControlEvent> {
        self.event_tx.subscribe()
    }

    pub fn send(&self, event: ControlEvent) {
        // No subscribers is not an error
        let _ = self.event_tx.send(event);
    }
}

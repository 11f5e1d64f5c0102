use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use renmado_ipc::{Command, ErrorKind, Response};

use super::transport::{Listener, COMMAND_ENDPOINT};

pub type CommandSender = mpsc::Sender<(Command, mpsc::Sender<Response>)>;

pub struct IpcServer {
    endpoint: String,
    cmd_tx: CommandSender,
}

impl IpcServer {
    pub fn new(cmd_tx: CommandSender) -> Self {
        Self::with_endpoint(COMMAND_ENDPOINT, cmd_tx)
    }

    pub fn with_endpoint(endpoint: &str, cmd_tx: CommandSender) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            cmd_tx,
        }
    }

    pub async fn run(&self) -> Result<()> {
        let mut listener = Listener::bind(&self.endpoint)
            .with_context(|| format!("Failed to listen on {}", self.endpoint))?;
        tracing::info!("IPC server listening on {}", self.endpoint);

        loop {
            match listener.accept().await {
                Ok(stream) => {
                    let cmd_tx = self.cmd_tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, cmd_tx).await {
                            tracing::error!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// One JSON request per line, answered in order with one JSON response line.
pub(crate) async fn handle_connection<S>(stream: S, cmd_tx: CommandSender) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            break; // EOF
        }

        let request = line.trim();
        if request.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Command>(request) {
            Ok(cmd) => {
                tracing::debug!("Received command: {:?}", cmd);
                let (resp_tx, mut resp_rx) = mpsc::channel(1);

                if cmd_tx.send((cmd, resp_tx)).await.is_err() {
                    Response::error(
                        ErrorKind::OsOperationFailed,
                        "Internal error: command channel closed",
                    )
                } else {
                    resp_rx.recv().await.unwrap_or_else(|| {
                        Response::error(ErrorKind::OsOperationFailed, "Internal error: no response")
                    })
                }
            }
            Err(e) => Response::error(ErrorKind::InvalidArgument, format!("Invalid command: {}", e)),
        };

        let response_json = serde_json::to_string(&response)?;
        writer.write_all(response_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    Ok(())
}

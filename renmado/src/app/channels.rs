use std::sync::mpsc as std_mpsc;

use tokio::sync::{broadcast, mpsc};

use renmado_ipc::{Command, ControlEvent, Response};

use crate::ipc::{EventBroadcaster, EventServer, IpcServer};

pub type IpcCommandWithResponse = (Command, mpsc::Sender<Response>);

const IPC_QUEUE_CAPACITY: usize = 256;

pub struct TokioChannels {
    pub cmd_tx: std_mpsc::Sender<IpcCommandWithResponse>,
    pub server_tx: mpsc::Sender<IpcCommandWithResponse>,
    pub server_rx: mpsc::Receiver<IpcCommandWithResponse>,
    pub event_server_rx: broadcast::Receiver<ControlEvent>,
}

pub struct MainChannels {
    pub cmd_rx: std_mpsc::Receiver<IpcCommandWithResponse>,
}

pub fn create_channels(broadcaster: &EventBroadcaster) -> (TokioChannels, MainChannels) {
    // IPC commands, tokio -> engine thread
    let (cmd_tx, cmd_rx) = std_mpsc::channel::<IpcCommandWithResponse>();

    // IPC server -> relay loop (tokio internal)
    let (server_tx, server_rx) = mpsc::channel::<IpcCommandWithResponse>(IPC_QUEUE_CAPACITY);

    let tokio_channels = TokioChannels {
        cmd_tx,
        server_tx,
        server_rx,
        event_server_rx: broadcaster.subscribe(),
    };

    (tokio_channels, MainChannels { cmd_rx })
}

/// Hosts both servers and relays commands to the engine thread. Returns once
/// the command server is gone or the engine thread stops listening.
pub async fn run_async(channels: TokioChannels) {
    let TokioChannels {
        cmd_tx,
        server_tx,
        mut server_rx,
        event_server_rx,
    } = channels;

    tracing::info!("Tokio runtime started");

    let ipc_server = IpcServer::new(server_tx);
    tokio::spawn(async move {
        if let Err(e) = ipc_server.run().await {
            tracing::error!("IPC server error: {:#}", e);
        }
    });

    let event_server = EventServer::new(event_server_rx);
    tokio::spawn(async move {
        if let Err(e) = event_server.run().await {
            tracing::error!("Event server error: {:#}", e);
        }
    });

    while let Some((cmd, resp_tx)) = server_rx.recv().await {
        if cmd_tx.send((cmd, resp_tx)).is_err() {
            tracing::error!("Failed to forward IPC command to engine thread");
            break;
        }
    }

    tracing::info!("Tokio runtime exiting");
}


mod channels;
mod dispatch;

use anyhow::{Context, Result};
use renmado_ipc::{Command, ControlEvent};

use crate::core::Config;
use crate::ipc::EventBroadcaster;
use crate::manager::WindowManager;
use crate::native::{self, NativeBackend};
use channels::MainChannels;
use dispatch::dispatch_command;

const EVENT_CHANNEL_CAPACITY: usize = 256;

pub struct App {
    manager: WindowManager<NativeBackend>,
    events: EventBroadcaster,
}

impl App {
    pub fn run(config: Config) -> Result<()> {
        let (backend, capture) = native::platform()?;
        let manager = WindowManager::new(backend, capture, &config);

        let events = EventBroadcaster::new(EVENT_CHANNEL_CAPACITY);
        let callback_events = events.clone();
        manager.set_control_action_callback(Some(Box::new(move |action| {
            callback_events.send(ControlEvent::ControlAction { action });
        })));

        let (tokio_channels, main_channels) = channels::create_channels(&events);

        std::thread::Builder::new()
            .name("renmado-ipc".to_string())
            .spawn(move || {
                let rt = match tokio::runtime::Runtime::new() {
                    Ok(rt) => rt,
                    Err(e) => {
                        tracing::error!("Failed to start tokio runtime: {}", e);
                        return;
                    }
                };
                rt.block_on(channels::run_async(tokio_channels));
            })
            .context("Failed to spawn IPC thread")?;

        let app = App { manager, events };
        app.run_main_loop(main_channels);
        Ok(())
    }

    /// Engine commands are serialized on this thread; the manager's own
    /// locking covers the mirror workers.
    fn run_main_loop(self, channels: MainChannels) {
        tracing::info!("Starting main loop");

        while let Ok((cmd, resp_tx)) = channels.cmd_rx.recv() {
            let quit = matches!(cmd, Command::Quit);
            let response = dispatch_command(cmd, &self.manager, &self.events);
            if resp_tx.blocking_send(response).is_err() {
                tracing::debug!("Client went away before the response was sent");
            }
            if quit {
                break;
            }
        }

        if self.manager.uninstall_hooks() {
            self.events.send(ControlEvent::SessionStopped);
        }
        tracing::info!("Main loop exited");
    }
}

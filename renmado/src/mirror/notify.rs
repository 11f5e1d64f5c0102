use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use renmado_ipc::ControlAction;

use super::lock;

pub type ControlActionCallback = Box<dyn Fn(ControlAction) + Send + 'static>;

struct Shared {
    pending: [AtomicBool; 2],
    shutdown: AtomicBool,
    callback: Mutex<Option<ControlActionCallback>>,
}

/// Delivers control-action notifications to the embedding application on its
/// own thread. At most one notification per kind is pending, and the callback
/// is never invoked concurrently with itself.
pub struct ControlActionNotifier {
    shared: Arc<Shared>,
    wake: SyncSender<()>,
    worker: Option<JoinHandle<()>>,
}

/// Cheap, cloneable producer side. `notify` never blocks.
#[derive(Clone)]
pub struct NotifierHandle {
    shared: Arc<Shared>,
    wake: SyncSender<()>,
}

impl NotifierHandle {
    pub fn notify(&self, action: ControlAction) {
        self.shared.pending[action.index()].store(true, Ordering::Release);
        // A full wake slot means the worker is already due to run.
        let _ = self.wake.try_send(());
    }
}

impl ControlActionNotifier {
    pub fn new() -> Self {
        let shared = Arc::new(Shared {
            pending: [AtomicBool::new(false), AtomicBool::new(false)],
            shutdown: AtomicBool::new(false),
            callback: Mutex::new(None),
        });
        let (wake, rx) = sync_channel(1);

        let worker_shared = shared.clone();
        let worker = std::thread::Builder::new()
            .name("renmado-notify".into())
            .spawn(move || run_worker(worker_shared, rx));
        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::error!("Failed to spawn notifier thread: {}", e);
                None
            }
        };

        Self {
            shared,
            wake,
            worker,
        }
    }

    pub fn handle(&self) -> NotifierHandle {
        NotifierHandle {
            shared: self.shared.clone(),
            wake: self.wake.clone(),
        }
    }

    /// Replace the sink. `None` stops delivery; pending notifications are then discarded.
    pub fn set_callback(&self, callback: Option<ControlActionCallback>) {
        *lock(&self.shared.callback) = callback;
    }
}

impl Default for ControlActionNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ControlActionNotifier {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        let _ = self.wake.try_send(());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("Notifier thread panicked");
            }
        }
    }
}

fn run_worker(shared: Arc<Shared>, rx: Receiver<()>) {
    while rx.recv().is_ok() {
        if shared.shutdown.load(Ordering::Acquire) {
            break;
        }
        for action in ControlAction::ALL {
            if !shared.pending[action.index()].swap(false, Ordering::AcqRel) {
                continue;
            }
            let callback = lock(&shared.callback);
            match callback.as_ref() {
                Some(callback) => callback(action),
                None => tracing::debug!("No control action callback, dropping {}", action),
            }
        }
    }
    tracing::debug!("Notifier thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;
    use std::time::Duration;

    #[test]
    fn test_notify_reaches_callback() {
        let notifier = ControlActionNotifier::new();
        let (tx, rx) = channel();
        let tx = Mutex::new(tx);
        notifier.set_callback(Some(Box::new(move |action| {
            let _ = tx.lock().unwrap().send(action);
        })));

        notifier.handle().notify(ControlAction::MouseWheelAction);
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(2)).unwrap(),
            ControlAction::MouseWheelAction
        );
    }

    #[test]
    fn test_slow_consumer_sees_coalesced_notifications() {
        let notifier = ControlActionNotifier::new();
        let (entered_tx, entered_rx) = channel();
        let (gate_tx, gate_rx) = channel::<()>();
        let (out_tx, out_rx) = channel();
        let state = Mutex::new((entered_tx, gate_rx, out_tx));
        notifier.set_callback(Some(Box::new(move |action| {
            let state = state.lock().unwrap();
            let _ = state.0.send(());
            let _ = state.1.recv();
            let _ = state.2.send(action);
        })));

        let handle = notifier.handle();
        handle.notify(ControlAction::MouseClickAction);
        entered_rx.recv_timeout(Duration::from_secs(2)).unwrap();

        // Consumer is blocked; none of these may block the producer.
        for _ in 0..50 {
            handle.notify(ControlAction::MouseClickAction);
        }

        for _ in 0..10 {
            gate_tx.send(()).unwrap();
        }
        let timeout = Duration::from_secs(2);
        assert_eq!(out_rx.recv_timeout(timeout).unwrap(), ControlAction::MouseClickAction);
        assert_eq!(out_rx.recv_timeout(timeout).unwrap(), ControlAction::MouseClickAction);
        assert!(out_rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_drop_joins_worker() {
        let notifier = ControlActionNotifier::new();
        let handle = notifier.handle();
        drop(notifier);
        // Producer side stays usable after the worker is gone.
        handle.notify(ControlAction::MouseClickAction);
    }
}

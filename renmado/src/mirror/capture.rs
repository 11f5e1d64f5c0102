use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{SyncSender, TrySendError};
use std::sync::Arc;

use renmado_ipc::{KeyEventKind, MouseEventKind};

use crate::core::{Modifiers, Point};
use crate::error::Error;

/// Raw input as seen by a global hook. Points are screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturedEvent {
    Mouse {
        kind: MouseEventKind,
        point: Point,
    },
    /// Deltas in `WHEEL_DELTA` units.
    Wheel {
        point: Point,
        delta_x: i32,
        delta_y: i32,
    },
    Key {
        code: u32,
        kind: KeyEventKind,
        modifiers: Modifiers,
    },
}

#[derive(Debug)]
pub enum DispatchMessage {
    Input(CapturedEvent),
    Shutdown,
}

/// Producer half of the capture queue, handed to the OS hook.
/// Never blocks: a full queue drops the event.
#[derive(Clone)]
pub struct CaptureSink {
    tx: SyncSender<DispatchMessage>,
    dropped: Arc<AtomicU64>,
}

impl CaptureSink {
    pub fn new(tx: SyncSender<DispatchMessage>) -> Self {
        Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn push(&self, event: CapturedEvent) -> bool {
        match self.tx.try_send(DispatchMessage::Input(event)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped.is_power_of_two() {
                    tracing::warn!("Capture queue full, {} events dropped so far", dropped);
                }
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Installs the global keyboard and mouse hooks for one session.
pub trait InputCapture: Send + Sync {
    fn install(&self, sink: CaptureSink) -> Result<CaptureGuard, Error>;
}

/// Uninstalls the hooks when dropped.
pub struct CaptureGuard {
    uninstall: Option<Box<dyn FnOnce() + Send>>,
}

impl CaptureGuard {
    pub fn new(uninstall: impl FnOnce() + Send + 'static) -> Self {
        Self {
            uninstall: Some(Box::new(uninstall)),
        }
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        if let Some(uninstall) = self.uninstall.take() {
            uninstall();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::mpsc::sync_channel;

    fn click() -> CapturedEvent {
        CapturedEvent::Mouse {
            kind: MouseEventKind::MouseDown,
            point: Point::new(1, 1),
        }
    }

    #[test]
    fn test_sink_drops_when_full() {
        let (tx, rx) = sync_channel(2);
        let sink = CaptureSink::new(tx);

        assert!(sink.push(click()));
        assert!(sink.push(click()));
        assert!(!sink.push(click()));
        assert_eq!(sink.dropped(), 1);

        rx.recv().unwrap();
        assert!(sink.push(click()));
    }

    #[test]
    fn test_sink_after_consumer_gone() {
        let (tx, rx) = sync_channel(1);
        let sink = CaptureSink::new(tx);
        drop(rx);
        assert!(!sink.push(click()));
        assert_eq!(sink.dropped(), 0);
    }

    #[test]
    fn test_guard_runs_uninstall_once() {
        let flag = Arc::new(AtomicBool::new(false));
        let guard = {
            let flag = flag.clone();
            CaptureGuard::new(move || {
                assert!(!flag.swap(true, Ordering::SeqCst));
            })
        };
        assert!(!flag.load(Ordering::SeqCst));
        drop(guard);
        assert!(flag.load(Ordering::SeqCst));
    }
}

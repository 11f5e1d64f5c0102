use std::sync::Arc;

use anyhow::Result;

use crate::mirror::InputCapture;
use crate::platform::PlatformWindowBackend;

/// The backend the daemon drives, chosen at build time.
pub type NativeBackend = dyn PlatformWindowBackend;

#[cfg(target_os = "windows")]
pub fn platform() -> Result<(Arc<NativeBackend>, Box<dyn InputCapture>)> {
    use crate::win32::{Win32Backend, Win32Capture};

    let backend: Arc<NativeBackend> = Arc::new(Win32Backend::new());
    let capture: Box<dyn InputCapture> = Box::new(Win32Capture::new());
    Ok((backend, capture))
}

#[cfg(target_os = "macos")]
pub fn platform() -> Result<(Arc<NativeBackend>, Box<dyn InputCapture>)> {
    use crate::macos::{self, MacBackend, MacCapture};

    if !macos::is_trusted() {
        // Arranging still works once granted; group control asks again on start
        tracing::warn!("Accessibility permission not granted, requesting...");
        macos::is_trusted_with_prompt();
    }
    let backend: Arc<NativeBackend> = Arc::new(MacBackend::new());
    let capture: Box<dyn InputCapture> = Box::new(MacCapture::new());
    Ok((backend, capture))
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub fn platform() -> Result<(Arc<NativeBackend>, Box<dyn InputCapture>)> {
    Err(crate::error::Error::Unsupported.into())
}

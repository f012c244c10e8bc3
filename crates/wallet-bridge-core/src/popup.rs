use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::{PopupGeometry, ScreenFrame, WindowRef, WindowRequest};
use crate::error::BridgeError;
use crate::ports::PopupPort;

pub const DEFAULT_POPUP_WIDTH: u32 = 420;
pub const DEFAULT_POPUP_HEIGHT: u32 = 720;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopupConfig {
    pub wallet_url: String,
    pub width: u32,
    pub height: u32,
    /// Prefix of every window name; a per-popup sequence number is appended.
    pub name_prefix: String,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            wallet_url: "http://localhost:5173/".to_owned(),
            width: DEFAULT_POPUP_WIDTH,
            height: DEFAULT_POPUP_HEIGHT,
            name_prefix: "wallet-popup".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupHandle {
    pub sequence: u64,
    pub url: String,
    pub geometry: PopupGeometry,
    pub window: WindowRef,
}

impl PopupHandle {
    pub fn name(&self) -> &str {
        &self.window.name
    }
}

/// Centers a `width` x `height` window over `frame`.
pub fn centered_geometry(frame: &ScreenFrame, width: u32, height: u32) -> PopupGeometry {
    let dx = (i64::from(frame.width) - i64::from(width)) / 2;
    let dy = (i64::from(frame.height) - i64::from(height)) / 2;
    PopupGeometry {
        left: clamp_i32(i64::from(frame.x) + dx),
        top: clamp_i32(i64::from(frame.y) + dy),
        width,
        height,
    }
}

fn clamp_i32(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Owns the single wallet window of the current flow.
pub struct PopupTransport<P: PopupPort> {
    port: P,
    config: PopupConfig,
    sequence: AtomicU64,
    active: Mutex<Option<PopupHandle>>,
}

impl<P: PopupPort> PopupTransport<P> {
    pub fn new(port: P, config: PopupConfig) -> Self {
        Self {
            port,
            config,
            sequence: AtomicU64::new(0),
            active: Mutex::new(None),
        }
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn config(&self) -> &PopupConfig {
        &self.config
    }

    pub fn active(&self) -> Option<PopupHandle> {
        lock_or_recover!(self.active).clone()
    }

    /// Opens a fresh, uniquely named window at `url` and makes it the active popup.
    pub fn open(&self, url: &str) -> Result<PopupHandle, BridgeError> {
        let frame = self.port.caller_frame()?;
        let geometry = centered_geometry(&frame, self.config.width, self.config.height);
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let request = WindowRequest {
            url: url.to_owned(),
            name: format!("{}-{sequence}", self.config.name_prefix),
            geometry,
        };

        let window = match self.port.open_window(&request)? {
            Some(window) => window,
            None => {
                warn!(name = %request.name, "popup blocked by host");
                return Err(BridgeError::PopupBlocked);
            }
        };
        let handle = PopupHandle {
            sequence,
            url: request.url,
            geometry,
            window,
        };
        info!(name = %handle.name(), ?geometry, "popup opened");

        let previous = lock_or_recover!(self.active).replace(handle.clone());
        if let Some(previous) = previous {
            self.close(Some(&previous));
        }
        Ok(handle)
    }

    /// Returns the active popup unless it has reported closed; opens a new one otherwise.
    pub fn ensure_open(&self) -> Result<PopupHandle, BridgeError> {
        if let Some(active) = self.active() {
            if !self.reported_closed(&active) {
                return Ok(active);
            }
            self.forget(&active);
        }
        let url = self.config.wallet_url.clone();
        self.open(&url)
    }

    /// Idempotent; closing an absent or already closed popup does nothing.
    pub fn close(&self, handle: Option<&PopupHandle>) {
        let Some(handle) = handle else {
            return;
        };
        self.forget(handle);
        if self.reported_closed(handle) {
            return;
        }
        match self.port.close_window(&handle.window) {
            Ok(()) => info!(name = %handle.name(), "popup closed"),
            Err(e) => warn!(name = %handle.name(), error = %e, "popup close failed"),
        }
    }

    pub fn close_active(&self) {
        let active = self.active();
        self.close(active.as_ref());
    }

    /// True once if the active popup was closed outside the bridge.
    pub fn poll_closed(&self) -> bool {
        match self.active() {
            Some(active) if self.reported_closed(&active) => {
                debug!(name = %active.name(), "popup closed by user");
                self.forget(&active);
                true
            }
            _ => false,
        }
    }

    fn reported_closed(&self, handle: &PopupHandle) -> bool {
        self.port.is_window_closed(&handle.window).unwrap_or(true)
    }

    fn forget(&self, handle: &PopupHandle) {
        let mut g = lock_or_recover!(self.active);
        if g.as_ref().map(|a| a.sequence) == Some(handle.sequence) {
            *g = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::centered_geometry;
    use crate::domain::ScreenFrame;

    #[test]
    fn geometry_is_centered_over_caller() {
        let frame = ScreenFrame {
            x: 100,
            y: 50,
            width: 1280,
            height: 800,
        };
        let g = centered_geometry(&frame, 420, 720);
        assert_eq!((g.left, g.top), (100 + 430, 50 + 40));
        assert_eq!((g.width, g.height), (420, 720));
    }

    #[test]
    fn geometry_for_small_caller_may_go_negative() {
        let frame = ScreenFrame {
            x: 0,
            y: 0,
            width: 300,
            height: 300,
        };
        let g = centered_geometry(&frame, 420, 720);
        assert_eq!((g.left, g.top), (-60, -210));
    }
}

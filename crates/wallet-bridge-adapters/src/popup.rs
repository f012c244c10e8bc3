use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use wallet_bridge_core::{
    PopupGeometry, PopupPort, PortError, ScreenFrame, WindowRef, WindowRequest,
};

use crate::BridgeAdapterConfig;

/// In-process window host. Stands in for the browser when the bridge runs
/// natively, and lets callers simulate a popup blocker or the user closing
/// the window.
#[derive(Debug, Clone)]
pub struct HeadlessPopupAdapter {
    inner: Arc<Mutex<HeadlessState>>,
}

#[derive(Debug)]
struct HeadlessState {
    frame: ScreenFrame,
    blocked: bool,
    windows: BTreeMap<String, HeadlessWindow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessWindow {
    pub name: String,
    pub url: String,
    pub geometry: PopupGeometry,
    pub closed: bool,
}

impl Default for HeadlessPopupAdapter {
    fn default() -> Self {
        Self::with_config(&BridgeAdapterConfig::default())
    }
}

impl HeadlessPopupAdapter {
    pub fn with_config(config: &BridgeAdapterConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HeadlessState {
                frame: config.caller_frame,
                blocked: false,
                windows: BTreeMap::new(),
            })),
        }
    }

    pub fn set_blocked(&self, blocked: bool) -> Result<(), PortError> {
        self.lock()?.blocked = blocked;
        Ok(())
    }

    /// Marks the window closed as if the user dismissed it.
    pub fn simulate_user_close(&self, name: &str) -> Result<(), PortError> {
        let mut g = self.lock()?;
        let window = g
            .windows
            .get_mut(name)
            .ok_or_else(|| PortError::NotFound(format!("popup window missing: {name}")))?;
        window.closed = true;
        Ok(())
    }

    pub fn windows(&self) -> Result<Vec<HeadlessWindow>, PortError> {
        Ok(self.lock()?.windows.values().cloned().collect())
    }

    pub fn open_windows(&self) -> Result<Vec<HeadlessWindow>, PortError> {
        Ok(self
            .lock()?
            .windows
            .values()
            .filter(|w| !w.closed)
            .cloned()
            .collect())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HeadlessState>, PortError> {
        self.inner
            .lock()
            .map_err(|e| PortError::Transport(format!("popup lock poisoned: {e}")))
    }
}

impl PopupPort for HeadlessPopupAdapter {
    fn caller_frame(&self) -> Result<ScreenFrame, PortError> {
        Ok(self.lock()?.frame)
    }

    fn open_window(&self, request: &WindowRequest) -> Result<Option<WindowRef>, PortError> {
        let mut g = self.lock()?;
        if g.blocked {
            debug!(name = %request.name, "headless popup blocked");
            return Ok(None);
        }
        if g.windows.get(&request.name).is_some_and(|w| !w.closed) {
            return Err(PortError::Validation(format!(
                "popup window name already in use: {}",
                request.name
            )));
        }
        g.windows.insert(
            request.name.clone(),
            HeadlessWindow {
                name: request.name.clone(),
                url: request.url.clone(),
                geometry: request.geometry,
                closed: false,
            },
        );
        Ok(Some(WindowRef {
            name: request.name.clone(),
        }))
    }

    fn close_window(&self, window: &WindowRef) -> Result<(), PortError> {
        let mut g = self.lock()?;
        if let Some(w) = g.windows.get_mut(&window.name) {
            w.closed = true;
        }
        Ok(())
    }

    fn is_window_closed(&self, window: &WindowRef) -> Result<bool, PortError> {
        Ok(self
            .lock()?
            .windows
            .get(&window.name)
            .map_or(true, |w| w.closed))
    }
}

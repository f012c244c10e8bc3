use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use wallet_bridge_core::{PopupPort, PortError, ScreenFrame, WindowRef, WindowRequest};

/// `window.open` based popup host for the wasm build.
#[derive(Debug, Clone, Default)]
pub struct BrowserPopupAdapter {
    windows: Rc<RefCell<HashMap<String, web_sys::Window>>>,
}

impl BrowserPopupAdapter {
    fn caller() -> Result<web_sys::Window, PortError> {
        web_sys::window().ok_or_else(|| PortError::Transport("missing window".to_owned()))
    }
}

impl PopupPort for BrowserPopupAdapter {
    fn caller_frame(&self) -> Result<ScreenFrame, PortError> {
        let window = Self::caller()?;
        let x = window
            .screen_x()
            .map_err(|e| PortError::Transport(format!("read screenX failed: {e:?}")))?;
        let y = window
            .screen_y()
            .map_err(|e| PortError::Transport(format!("read screenY failed: {e:?}")))?;
        let width = window
            .outer_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        let height = window
            .outer_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        Ok(ScreenFrame {
            x,
            y,
            width: width.max(0.0) as u32,
            height: height.max(0.0) as u32,
        })
    }

    fn open_window(&self, request: &WindowRequest) -> Result<Option<WindowRef>, PortError> {
        let window = Self::caller()?;
        // Browsers either throw or hand back null when a blocker intervenes.
        let opened = window
            .open_with_url_and_target_and_features(
                &request.url,
                &request.name,
                &request.geometry.features(),
            )
            .ok()
            .flatten();
        let Some(popup) = opened else {
            return Ok(None);
        };
        self.windows.borrow_mut().insert(request.name.clone(), popup);
        Ok(Some(WindowRef {
            name: request.name.clone(),
        }))
    }

    fn close_window(&self, window: &WindowRef) -> Result<(), PortError> {
        let popup = self.windows.borrow_mut().remove(&window.name);
        if let Some(popup) = popup {
            popup
                .close()
                .map_err(|e| PortError::Transport(format!("window.close failed: {e:?}")))?;
        }
        Ok(())
    }

    fn is_window_closed(&self, window: &WindowRef) -> Result<bool, PortError> {
        let windows = self.windows.borrow();
        match windows.get(&window.name) {
            Some(popup) => popup
                .closed()
                .map_err(|e| PortError::Transport(format!("read window.closed failed: {e:?}"))),
            None => Ok(true),
        }
    }
}

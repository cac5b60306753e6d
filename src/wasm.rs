//! Browser bindings: the unsaved-changes guard and localStorage preferences.

use std::cell::RefCell;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::BeforeUnloadEvent;

use crate::constants::UNSAVED_CHANGES_WARNING;
use crate::error::PreferenceError;
use crate::preferences::PreferenceStore;
use crate::undo::UnloadGuard;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

thread_local! {
    /// The page-wide `beforeunload` hook and the number of guards holding it.
    static UNLOAD_HOOK: RefCell<UnloadHook> = RefCell::new(UnloadHook::default());
}

#[derive(Default)]
struct UnloadHook {
    listener: Option<Closure<dyn FnMut(BeforeUnloadEvent)>>,
    holders: usize,
}

impl UnloadHook {
    fn acquire(&mut self) {
        self.holders += 1;
        if self.holders > 1 || self.listener.is_some() {
            return;
        }
        let Some(window) = web_sys::window() else {
            log::warn!("No window object, unsaved changes are not guarded");
            return;
        };
        let listener = Closure::wrap(Box::new(|event: BeforeUnloadEvent| {
            event.prevent_default();
            event.set_return_value(UNSAVED_CHANGES_WARNING);
        }) as Box<dyn FnMut(BeforeUnloadEvent)>);
        match window
            .add_event_listener_with_callback("beforeunload", listener.as_ref().unchecked_ref())
        {
            Ok(()) => self.listener = Some(listener),
            Err(e) => log::warn!("Failed to register beforeunload listener: {:?}", e),
        }
    }

    fn release(&mut self) {
        self.holders = self.holders.saturating_sub(1);
        if self.holders > 0 {
            return;
        }
        let Some(listener) = self.listener.take() else {
            return;
        };
        if let Some(window) = web_sys::window() {
            if let Err(e) = window
                .remove_event_listener_with_callback("beforeunload", listener.as_ref().unchecked_ref())
            {
                log::warn!("Failed to remove beforeunload listener: {:?}", e);
            }
        }
    }
}

/// Asks for confirmation before leaving the page while armed.
///
/// Every guard on the page shares one `beforeunload` listener. It is attached
/// when the first guard arms and removed when the last one disarms or is
/// dropped.
#[derive(Debug, Default)]
pub struct BeforeUnloadGuard {
    armed: bool,
}

impl BeforeUnloadGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

impl UnloadGuard for BeforeUnloadGuard {
    fn arm(&mut self) {
        if self.armed {
            return;
        }
        self.armed = true;
        UNLOAD_HOOK.with(|hook| hook.borrow_mut().acquire());
    }

    fn disarm(&mut self) {
        if !self.armed {
            return;
        }
        self.armed = false;
        UNLOAD_HOOK.with(|hook| hook.borrow_mut().release());
    }
}

impl Drop for BeforeUnloadGuard {
    fn drop(&mut self) {
        self.disarm();
    }
}

/// Preferences kept in the browser's localStorage.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    fn storage() -> Result<web_sys::Storage, PreferenceError> {
        let window = web_sys::window()
            .ok_or_else(|| PreferenceError::Storage("No window object available".to_string()))?;
        window
            .local_storage()
            .map_err(|e| PreferenceError::Storage(format!("localStorage access error: {:?}", e)))?
            .ok_or_else(|| PreferenceError::Storage("localStorage not available".to_string()))
    }
}

impl PreferenceStore for LocalStorageStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        match Self::storage().map(|storage| storage.get_item(key)) {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                log::warn!("Failed to read {} from localStorage: {:?}", key, e);
                None
            }
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        }
    }

    fn set_raw(&mut self, key: &str, value: String) -> Result<(), PreferenceError> {
        Self::storage()?.set_item(key, &value).map_err(|e| {
            PreferenceError::Storage(format!("Failed to save to localStorage: {:?}", e))
        })
    }
}

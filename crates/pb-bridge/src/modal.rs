//! Blocking modal-dialog protocol
//!
//! The emulator core expects modal dialogs: mid-call, on its own thread,
//! it needs an answer before it can continue. The engine thread posts a
//! `ModalRequest` to whatever `DialogHost` the UI has installed and blocks
//! on a response slot that is fulfilled exactly once. If no host is
//! installed (the UI is torn down for reconfiguration), the request is
//! answered with a sentinel and reissued after a short sleep, indefinitely,
//! until a real answer arrives.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::Duration;

/// Response meaning "the UI could not show the dialog, try again"
pub const UNAVAILABLE_RESPONSE: i32 = -1;

/// Button label the host can never honor: there is no debugger to hand
/// the emulated OS over to, so such buttons are not rendered.
pub const UNSUPPORTED_BUTTON_LABEL: &str = "Debug";

/// How long the engine thread sleeps before reissuing an unanswered
/// request, giving the UI a chance to finish rebuilding
const RETRY_DELAY: Duration = Duration::from_millis(100);

/// One choice the engine offers the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalButton {
    pub id: i32,
    pub label: String,
    pub visible: bool,
    pub enabled: bool,
}

/// A decision the engine is blocked on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalRequest {
    pub title: String,
    pub message: String,
    /// At most three buttons
    pub buttons: Vec<ModalButton>,
}

impl ModalRequest {
    /// Build a request from the engine's raw dialog arrays.
    ///
    /// `labels[3]`, when present, carries the message body; `props` holds
    /// (visible, enabled, ..) per button at stride 4.
    pub fn from_raw(title: &str, ids: &[i32], labels: &[String], props: &[bool]) -> Self {
        let mut buttons = Vec::new();
        for (i, &id) in ids.iter().enumerate().take(3) {
            let label = labels.get(i).cloned().unwrap_or_default();
            let visible = props.get(i * 4).copied().unwrap_or(false);
            let enabled = props.get(i * 4 + 1).copied().unwrap_or(false);
            buttons.push(ModalButton {
                id,
                label,
                visible,
                enabled,
            });
        }
        Self {
            title: title.to_string(),
            message: labels.get(3).cloned().unwrap_or_default(),
            buttons,
        }
    }

    /// The buttons a dialog should actually render: visible, enabled, and
    /// not a capability the host cannot honor.
    pub fn choices(&self) -> impl Iterator<Item = &ModalButton> {
        self.buttons
            .iter()
            .filter(|b| b.visible && b.enabled && b.label != UNSUPPORTED_BUTTON_LABEL)
    }
}

struct ResponseSlot {
    state: Mutex<Option<i32>>,
    condvar: Condvar,
}

/// Write half of a response slot. Fulfilled exactly once; later calls are
/// ignored with a warning.
#[derive(Clone)]
pub struct ModalResponder {
    slot: Arc<ResponseSlot>,
}

impl ModalResponder {
    pub fn respond(&self, id: i32) {
        let mut state = self.slot.state.lock();
        if state.is_some() {
            tracing::warn!("modal response {} ignored, already answered", id);
            return;
        }
        *state = Some(id);
        self.slot.condvar.notify_all();
    }
}

/// Where modal requests are delivered.
///
/// `present` runs on the engine thread and must not block: hand the
/// request to the UI and return. A host that cannot currently show a
/// dialog must answer `UNAVAILABLE_RESPONSE` through the responder.
pub trait DialogHost: Send + Sync {
    fn present(&self, request: ModalRequest, responder: ModalResponder);
}

/// Engine-side entry point for blocking dialogs
pub struct ModalBridge {
    host: Mutex<Option<Arc<dyn DialogHost>>>,
}

impl ModalBridge {
    pub fn new() -> Self {
        Self {
            host: Mutex::new(None),
        }
    }

    /// Install the UI's dialog host. Replaces any previous one.
    pub fn install_host(&self, host: Arc<dyn DialogHost>) {
        *self.host.lock() = Some(host);
    }

    /// Remove the dialog host, e.g. while the UI is being rebuilt.
    /// Requests issued in the window answer themselves with the sentinel
    /// and retry.
    pub fn uninstall_host(&self) {
        *self.host.lock() = None;
    }

    /// Block until the user picks a button; returns its id.
    ///
    /// Reissues the identical request every `RETRY_DELAY` for as long as
    /// the UI answers with the sentinel. There is deliberately no retry
    /// bound: the only unavailability cause is a transient UI rebuild,
    /// and the engine cannot make progress without an answer anyway.
    pub fn request(&self, request: &ModalRequest) -> i32 {
        loop {
            let slot = Arc::new(ResponseSlot {
                state: Mutex::new(None),
                condvar: Condvar::new(),
            });
            let responder = ModalResponder {
                slot: Arc::clone(&slot),
            };

            match self.host.lock().clone() {
                Some(host) => host.present(request.clone(), responder),
                None => {
                    tracing::debug!("no dialog host installed, answering unavailable");
                    responder.respond(UNAVAILABLE_RESPONSE);
                }
            }

            let answer = {
                let mut state = slot.state.lock();
                while state.is_none() {
                    slot.condvar.wait(&mut state);
                }
                state.unwrap_or(UNAVAILABLE_RESPONSE)
            };

            if answer != UNAVAILABLE_RESPONSE {
                tracing::debug!("modal '{}' answered with {}", request.title, answer);
                return answer;
            }
            std::thread::sleep(RETRY_DELAY);
        }
    }
}

impl Default for ModalBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_button_request() -> ModalRequest {
        ModalRequest {
            title: "Emulator Alert".into(),
            message: "Something needs deciding".into(),
            buttons: vec![
                ModalButton {
                    id: 10,
                    label: "OK".into(),
                    visible: true,
                    enabled: true,
                },
                ModalButton {
                    id: 11,
                    label: "Debug".into(),
                    visible: true,
                    enabled: true,
                },
                ModalButton {
                    id: 12,
                    label: "Cancel".into(),
                    visible: true,
                    enabled: false,
                },
            ],
        }
    }

    #[test]
    fn test_from_raw_layout() {
        let ids = [1, 2, 3];
        let labels: Vec<String> = ["Yes", "No", "Maybe", "Pick one"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut props = vec![false; 12];
        props[0] = true; // button 0 visible
        props[1] = true; // button 0 enabled
        props[4] = true; // button 1 visible

        let req = ModalRequest::from_raw("T", &ids, &labels, &props);
        assert_eq!(req.message, "Pick one");
        assert_eq!(req.buttons.len(), 3);
        assert!(req.buttons[0].visible && req.buttons[0].enabled);
        assert!(req.buttons[1].visible && !req.buttons[1].enabled);
        assert!(!req.buttons[2].visible);
    }

    #[test]
    fn test_choices_filter_sentinel_and_disabled() {
        let req = three_button_request();
        let choices: Vec<i32> = req.choices().map(|b| b.id).collect();
        // "Debug" excluded despite visible && enabled; disabled excluded
        assert_eq!(choices, vec![10]);
    }

    #[test]
    fn test_responder_fulfills_once() {
        struct PressTwice;
        impl DialogHost for PressTwice {
            fn present(&self, _request: ModalRequest, responder: ModalResponder) {
                responder.respond(7);
                responder.respond(8);
            }
        }

        let bridge = ModalBridge::new();
        bridge.install_host(Arc::new(PressTwice));
        assert_eq!(bridge.request(&three_button_request()), 7);
    }

    #[test]
    fn test_retry_reissues_identical_request() {
        // First two deliveries answer unavailable, third answers 5. Every
        // delivery is recorded so the reissued content can be compared.
        struct FlakyHost {
            seen: Mutex<Vec<ModalRequest>>,
        }
        impl DialogHost for FlakyHost {
            fn present(&self, request: ModalRequest, responder: ModalResponder) {
                let mut seen = self.seen.lock();
                seen.push(request);
                if seen.len() < 3 {
                    responder.respond(UNAVAILABLE_RESPONSE);
                } else {
                    responder.respond(5);
                }
            }
        }

        let host = Arc::new(FlakyHost {
            seen: Mutex::new(Vec::new()),
        });
        let bridge = ModalBridge::new();
        bridge.install_host(Arc::clone(&host) as Arc<dyn DialogHost>);

        assert_eq!(bridge.request(&three_button_request()), 5);

        let seen = host.seen.lock();
        assert_eq!(seen.len(), 3);
        // Each retry carries the same title, message, and buttons.
        assert!(seen.iter().all(|r| *r == three_button_request()));
    }

    #[test]
    fn test_request_survives_missing_host() {
        // No host installed: requests self-answer unavailable and retry.
        // Install a host from another thread while the request is blocked.
        struct PickFirst;
        impl DialogHost for PickFirst {
            fn present(&self, request: ModalRequest, responder: ModalResponder) {
                let id = request.choices().next().map(|b| b.id).unwrap_or(0);
                responder.respond(id);
            }
        }

        let bridge = Arc::new(ModalBridge::new());
        let late = Arc::clone(&bridge);
        let installer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(150));
            late.install_host(Arc::new(PickFirst));
        });

        assert_eq!(bridge.request(&three_button_request()), 10);
        installer.join().unwrap();
    }
}

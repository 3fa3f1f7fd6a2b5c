//! Operator controls bound to a session controller
//!
//! Attaching a control twice does not bind it twice, so one click never
//! produces two operations.

use crate::controller::SessionController;
use citycast_core::CitycastError;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A clickable control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// Grant camera and microphone permission
    Grant,
    /// Join the room
    Join,
    /// Leave the room
    Leave,
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Control::Grant => write!(f, "grant"),
            Control::Join => write!(f, "join"),
            Control::Leave => write!(f, "leave"),
        }
    }
}

/// Set of controls wired to one controller
#[derive(Debug)]
pub struct ControlPanel {
    controller: Arc<SessionController>,
    attached: Mutex<HashSet<Control>>,
}

impl ControlPanel {
    /// Create a panel with nothing attached
    pub fn new(controller: Arc<SessionController>) -> Self {
        Self {
            controller,
            attached: Mutex::new(HashSet::new()),
        }
    }

    /// Create a panel with every control attached
    pub fn with_all(controller: Arc<SessionController>) -> Self {
        let panel = Self::new(controller);
        for control in [Control::Grant, Control::Join, Control::Leave] {
            panel.attach(control);
        }
        panel
    }

    /// Bind `control`; returns `false` if it was already bound
    pub fn attach(&self, control: Control) -> bool {
        let added = self.attached.lock().insert(control);
        debug!(%control, added, "Control attached");
        added
    }

    /// Unbind `control`; returns `false` if it was not bound
    pub fn detach(&self, control: Control) -> bool {
        self.attached.lock().remove(&control)
    }

    /// Check if `control` is bound
    pub fn is_attached(&self, control: Control) -> bool {
        self.attached.lock().contains(&control)
    }

    /// Check if `control` is bound and the controller accepts it now
    pub fn enabled(&self, control: Control) -> bool {
        if !self.is_attached(control) {
            return false;
        }
        let controls = self.controller.controls();
        match control {
            Control::Grant => controls.grant,
            Control::Join => controls.join,
            Control::Leave => controls.leave,
        }
    }

    /// Click `control`
    ///
    /// Returns `None` when the control is not bound. The controller itself
    /// rejects clicks its state does not accept.
    pub async fn activate(&self, control: Control) -> Option<Result<(), CitycastError>> {
        if !self.is_attached(control) {
            debug!(%control, "Click on unbound control ignored");
            return None;
        }
        let result = match control {
            Control::Grant => self.controller.grant().await.map(|_| ()),
            Control::Join => self.controller.join().await,
            Control::Leave => self.controller.leave().await,
        };
        Some(result)
    }
}

//! Operator device selection and constraint resolution

use crate::capture::{AudioConstraint, CaptureConstraints, FacingMode, VideoConstraint};

/// Camera selected by the operator
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CameraChoice {
    /// One specific device
    Device(String),
    /// Logical front-facing camera
    Front,
    /// Logical back-facing camera
    Back,
    /// Let the platform pick
    #[default]
    Unspecified,
}

impl CameraChoice {
    /// Parse the raw value of a camera selector option
    pub fn from_selector_value(value: &str) -> Self {
        match value.trim() {
            "" => CameraChoice::Unspecified,
            "front" | "user" => CameraChoice::Front,
            "back" | "environment" => CameraChoice::Back,
            id => CameraChoice::Device(id.to_string()),
        }
    }

    /// Video constraint for this choice
    ///
    /// The back camera is a hard requirement: no other camera is substituted.
    pub fn constraint(&self) -> VideoConstraint {
        match self {
            CameraChoice::Front => VideoConstraint::Facing {
                mode: FacingMode::User,
                exact: false,
            },
            CameraChoice::Back => VideoConstraint::Facing {
                mode: FacingMode::Environment,
                exact: true,
            },
            CameraChoice::Device(id) if !id.is_empty() => VideoConstraint::Device(id.clone()),
            CameraChoice::Device(_) | CameraChoice::Unspecified => VideoConstraint::Any,
        }
    }
}

/// Microphone selected by the operator
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MicrophoneChoice {
    /// One specific device
    Device(String),
    /// Let the platform pick
    #[default]
    Unspecified,
}

impl MicrophoneChoice {
    /// Parse the raw value of a microphone selector option
    pub fn from_selector_value(value: &str) -> Self {
        match value.trim() {
            "" => MicrophoneChoice::Unspecified,
            id => MicrophoneChoice::Device(id.to_string()),
        }
    }

    /// Audio constraint for this choice
    pub fn constraint(&self) -> AudioConstraint {
        match self {
            MicrophoneChoice::Device(id) if !id.is_empty() => AudioConstraint::Device(id.clone()),
            MicrophoneChoice::Device(_) | MicrophoneChoice::Unspecified => AudioConstraint::Any,
        }
    }
}

/// Device selection taken from the controls at join time
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CaptureSelection {
    /// Camera choice
    pub camera: CameraChoice,
    /// Microphone choice
    pub microphone: MicrophoneChoice,
}

impl CaptureSelection {
    /// Create a selection
    pub fn new(camera: CameraChoice, microphone: MicrophoneChoice) -> Self {
        Self { camera, microphone }
    }

    /// Resolve into platform capture constraints
    pub fn resolve(&self) -> CaptureConstraints {
        CaptureConstraints {
            video: self.camera.constraint(),
            audio: self.microphone.constraint(),
        }
    }
}

// MediaPipe landmark provider bridge
// Abstracts the external pose/hand landmark estimator behind a trait so the
// classifiers never see a provider-specific encoding.

use crate::models::capture::RawFrame;
use crate::models::landmarks::{
    BodyLandmarkSet, HandLandmarkSet, Handedness, Landmark, LandmarkObservation,
};
use crate::models::monitor::{MonitorError, MonitorResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// ==============================================================================
// Provider Options
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelComplexity {
    Lite = 0,  // Fastest, less accurate
    Full = 1,  // Balanced
    Heavy = 2, // Slowest, most accurate
}

/// Thresholds handed to the landmark estimator. They change its recall and
/// precision only; the classifiers use their own fixed thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderOptions {
    pub pose_min_detection_confidence: f32, // default: 0.5
    pub pose_min_tracking_confidence: f32,  // default: 0.5
    pub hand_min_detection_confidence: f32, // default: 0.6
    pub hand_min_tracking_confidence: f32,  // default: 0.6
    pub max_num_hands: u32,                 // default: 2
    pub static_image_mode: bool,            // default: false (video stream)
    pub model_complexity: ModelComplexity,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            pose_min_detection_confidence: 0.5,
            pose_min_tracking_confidence: 0.5,
            hand_min_detection_confidence: 0.6,
            hand_min_tracking_confidence: 0.6,
            max_num_hands: 2,
            static_image_mode: false,
            model_complexity: ModelComplexity::Full,
        }
    }
}

impl ProviderOptions {
    pub const MIN_SLIDER_PERCENT: u32 = 10;
    pub const MAX_SLIDER_PERCENT: u32 = 100;

    /// Pose thresholds from the control panel sliders (10-100 %)
    pub fn from_slider_percent(detection: u32, tracking: u32) -> MonitorResult<Self> {
        for (name, value) in [("detection", detection), ("tracking", tracking)] {
            if !(Self::MIN_SLIDER_PERCENT..=Self::MAX_SLIDER_PERCENT).contains(&value) {
                return Err(MonitorError::InvalidConfig(format!(
                    "{} confidence {}% must be between {}% and {}%",
                    name,
                    value,
                    Self::MIN_SLIDER_PERCENT,
                    Self::MAX_SLIDER_PERCENT
                )));
            }
        }

        Ok(Self {
            pose_min_detection_confidence: detection as f32 / 100.0,
            pose_min_tracking_confidence: tracking as f32 / 100.0,
            ..Self::default()
        })
    }

    pub fn validate(&self) -> MonitorResult<()> {
        let confidences = [
            ("pose_min_detection_confidence", self.pose_min_detection_confidence),
            ("pose_min_tracking_confidence", self.pose_min_tracking_confidence),
            ("hand_min_detection_confidence", self.hand_min_detection_confidence),
            ("hand_min_tracking_confidence", self.hand_min_tracking_confidence),
        ];
        for (name, value) in confidences {
            if !(0.0..=1.0).contains(&value) {
                return Err(MonitorError::InvalidConfig(format!(
                    "{} = {} must be between 0.0 and 1.0",
                    name, value
                )));
            }
        }

        if self.max_num_hands == 0 || self.max_num_hands > 4 {
            return Err(MonitorError::InvalidConfig(format!(
                "max_num_hands = {} must be between 1 and 4",
                self.max_num_hands
            )));
        }

        Ok(())
    }
}

// ==============================================================================
// Provider payload (JSON shared by recordings and the Python backend)
// ==============================================================================

/// One hand as emitted by the estimator, in MediaPipe index order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderHand {
    pub handedness: Handedness,
    #[serde(default = "default_hand_confidence")]
    pub confidence: f32,
    pub landmarks: Vec<Landmark>, // 21 keypoints
}

fn default_hand_confidence() -> f32 {
    1.0
}

/// Raw estimator output for one frame, before adapting to internal joints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderPayload {
    #[serde(default)]
    pub body: Option<Vec<Landmark>>, // 33 keypoints, MediaPipe Pose order
    #[serde(default)]
    pub hands: Vec<ProviderHand>,
}

impl ProviderPayload {
    /// Adapt to the internal joint enumeration, keeping at most `max_hands` hands
    pub fn into_observation(self, max_hands: u32) -> MonitorResult<LandmarkObservation> {
        let body = match self.body {
            Some(ref keypoints) if !keypoints.is_empty() => {
                Some(BodyLandmarkSet::from_mediapipe(keypoints)?)
            }
            _ => None,
        };

        if self.hands.len() > max_hands as usize {
            debug!(
                "Provider reported {} hands, keeping the first {}",
                self.hands.len(),
                max_hands
            );
        }

        // A malformed hand is dropped on its own; the rest of the frame stays usable
        let hands = self
            .hands
            .iter()
            .take(max_hands as usize)
            .filter_map(|hand| {
                HandLandmarkSet::from_mediapipe(hand.handedness, hand.confidence, &hand.landmarks)
                    .map_err(|e| warn!("Dropping hand: {}", e))
                    .ok()
            })
            .collect();

        Ok(LandmarkObservation { body, hands })
    }
}

// ==============================================================================
// Provider trait
// ==============================================================================

/// External pose/hand landmark estimator.
/// Implement this for PyO3, recordings, or any other backend.
pub trait LandmarkProvider: Send {
    /// Run inference on a frame. An error means the frame is skipped.
    fn infer(&mut self, frame: &RawFrame) -> MonitorResult<LandmarkObservation>;

    /// Release backend resources. The provider must not be used afterwards.
    fn close(&mut self);

    fn is_initialized(&self) -> bool;

    fn options(&self) -> &ProviderOptions;

    fn describe(&self) -> String;
}

pub type ProviderFactory =
    Box<dyn Fn(&ProviderOptions) -> MonitorResult<Box<dyn LandmarkProvider>> + Send>;

/// Owns the live provider and rebuilds it when thresholds change
pub struct ProviderHandle {
    provider: Box<dyn LandmarkProvider>,
    factory: ProviderFactory,
    generation: u32,
}

impl ProviderHandle {
    pub fn open(options: &ProviderOptions, factory: ProviderFactory) -> MonitorResult<Self> {
        options.validate()?;
        let provider = factory(options)?;
        info!("Opened landmark provider: {}", provider.describe());

        Ok(Self {
            provider,
            factory,
            generation: 0,
        })
    }

    /// Tear down the current provider and build a fresh one with `options`.
    ///
    /// Invalid options are rejected before anything is torn down. If the
    /// factory fails after teardown, the handle is left uninitialized and
    /// every `infer` fails until the next successful reconfigure.
    pub fn reconfigure(&mut self, options: &ProviderOptions) -> MonitorResult<()> {
        options.validate()?;

        let mut old = std::mem::replace(
            &mut self.provider,
            Box::new(DummyProvider::closed(options.clone())),
        );
        old.close();
        drop(old);
        self.generation += 1;

        self.provider = (self.factory)(options)?;
        info!(
            "Reconfigured landmark provider (generation {}): {}",
            self.generation,
            self.provider.describe()
        );
        Ok(())
    }

    /// Number of successful or attempted rebuilds since `open`
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl LandmarkProvider for ProviderHandle {
    fn infer(&mut self, frame: &RawFrame) -> MonitorResult<LandmarkObservation> {
        self.provider.infer(frame)
    }

    fn close(&mut self) {
        self.provider.close();
    }

    fn is_initialized(&self) -> bool {
        self.provider.is_initialized()
    }

    fn options(&self) -> &ProviderOptions {
        self.provider.options()
    }

    fn describe(&self) -> String {
        self.provider.describe()
    }
}

// ==============================================================================
// PyO3 Implementation (Python MediaPipe)
// ==============================================================================

#[cfg(feature = "ml-pyo3")]
pub mod pyo3_backend {
    use super::*;
    use crate::models::capture::PixelFormat;
    use pyo3::prelude::*;
    use pyo3::types::{PyBytes, PyDict};

    /// Python module expected on `sys.path`. It exposes
    /// `create_session(**options)` returning an object with
    /// `process(image_bytes, width, height, pixel_format) -> str` (a JSON
    /// `ProviderPayload`) and `close()`.
    pub const PYTHON_MODULE: &str = "mediapipe_landmarks";

    pub struct PyO3Provider {
        session: Option<PyObject>,
        options: ProviderOptions,
    }

    fn load_failed(e: PyErr) -> MonitorError {
        MonitorError::ProviderFailed(format!("Python MediaPipe: {}", e))
    }

    fn inference_failed(e: PyErr) -> MonitorError {
        MonitorError::InferenceFailed(format!("Python MediaPipe: {}", e))
    }

    impl PyO3Provider {
        pub fn new(options: &ProviderOptions) -> MonitorResult<Self> {
            options.validate()?;

            Python::with_gil(|py| {
                let module = py.import_bound(PYTHON_MODULE).map_err(|e| {
                    MonitorError::ProviderFailed(format!(
                        "Failed to import {}: {}. Make sure mediapipe is installed",
                        PYTHON_MODULE, e
                    ))
                })?;

                let kwargs = PyDict::new_bound(py);
                kwargs
                    .set_item("pose_min_detection_confidence", options.pose_min_detection_confidence)
                    .map_err(load_failed)?;
                kwargs
                    .set_item("pose_min_tracking_confidence", options.pose_min_tracking_confidence)
                    .map_err(load_failed)?;
                kwargs
                    .set_item("hand_min_detection_confidence", options.hand_min_detection_confidence)
                    .map_err(load_failed)?;
                kwargs
                    .set_item("hand_min_tracking_confidence", options.hand_min_tracking_confidence)
                    .map_err(load_failed)?;
                kwargs
                    .set_item("max_num_hands", options.max_num_hands)
                    .map_err(load_failed)?;
                kwargs
                    .set_item("static_image_mode", options.static_image_mode)
                    .map_err(load_failed)?;
                kwargs
                    .set_item("model_complexity", options.model_complexity as u8)
                    .map_err(load_failed)?;

                let session = module
                    .call_method("create_session", (), Some(&kwargs))
                    .map_err(load_failed)?;

                Ok(Self {
                    session: Some(session.unbind()),
                    options: options.clone(),
                })
            })
        }
    }

    impl LandmarkProvider for PyO3Provider {
        fn infer(&mut self, frame: &RawFrame) -> MonitorResult<LandmarkObservation> {
            let session = self.session.as_ref().ok_or(MonitorError::NotInitialized)?;
            let pixel_format = match frame.format {
                PixelFormat::RGB8 => "rgb",
                PixelFormat::BGR8 => "bgr",
                PixelFormat::RGBA8 => "rgba",
            };

            let json: String = Python::with_gil(|py| {
                let image_bytes = PyBytes::new_bound(py, &frame.data);
                session
                    .bind(py)
                    .call_method1("process", (image_bytes, frame.width, frame.height, pixel_format))
                    .map_err(inference_failed)?
                    .extract::<String>()
                    .map_err(inference_failed)
            })?;

            let payload: ProviderPayload = serde_json::from_str(&json)
                .map_err(|e| MonitorError::InferenceFailed(format!("Failed to parse JSON: {}", e)))?;
            payload.into_observation(self.options.max_num_hands)
        }

        fn close(&mut self) {
            if let Some(session) = self.session.take() {
                Python::with_gil(|py| {
                    if let Err(e) = session.bind(py).call_method0("close") {
                        warn!("Failed to close Python MediaPipe session: {}", e);
                    }
                });
            }
        }

        fn is_initialized(&self) -> bool {
            self.session.is_some()
        }

        fn options(&self) -> &ProviderOptions {
            &self.options
        }

        fn describe(&self) -> String {
            format!(
                "PyO3 MediaPipe (pose det {:.2}/trk {:.2}, hands det {:.2}/trk {:.2}, max {} hands)",
                self.options.pose_min_detection_confidence,
                self.options.pose_min_tracking_confidence,
                self.options.hand_min_detection_confidence,
                self.options.hand_min_tracking_confidence,
                self.options.max_num_hands
            )
        }
    }

    impl Drop for PyO3Provider {
        fn drop(&mut self) {
            self.close();
        }
    }
}

// ==============================================================================
// Dummy Implementation (for builds without an ML backend)
// ==============================================================================

/// Detects nothing; every frame yields an empty observation
pub struct DummyProvider {
    options: ProviderOptions,
    open: bool,
}

impl DummyProvider {
    pub fn new(options: &ProviderOptions) -> MonitorResult<Self> {
        options.validate()?;
        warn!("Using dummy landmark provider (no inference). Enable the 'ml-pyo3' feature for MediaPipe");
        Ok(Self {
            options: options.clone(),
            open: true,
        })
    }

    fn closed(options: ProviderOptions) -> Self {
        Self {
            options,
            open: false,
        }
    }
}

impl LandmarkProvider for DummyProvider {
    fn infer(&mut self, _frame: &RawFrame) -> MonitorResult<LandmarkObservation> {
        if !self.open {
            return Err(MonitorError::NotInitialized);
        }
        Ok(LandmarkObservation::empty())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_initialized(&self) -> bool {
        self.open
    }

    fn options(&self) -> &ProviderOptions {
        &self.options
    }

    fn describe(&self) -> String {
        "Dummy provider (no ML inference - enable 'ml-pyo3' feature)".to_string()
    }
}

// ==============================================================================
// Default Backend Selection
// ==============================================================================

/// Factory for the backend selected at compile time
pub fn default_provider_factory() -> ProviderFactory {
    Box::new(|options: &ProviderOptions| -> MonitorResult<Box<dyn LandmarkProvider>> {
        #[cfg(feature = "ml-pyo3")]
        {
            Ok(Box::new(pyo3_backend::PyO3Provider::new(options)?))
        }

        #[cfg(not(feature = "ml-pyo3"))]
        {
            Ok(Box::new(DummyProvider::new(options)?))
        }
    })
}

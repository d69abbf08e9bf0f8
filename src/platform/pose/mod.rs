// Landmark provider integration
// Provides the MediaPipe bridge and recorded-landmark playback

pub mod mediapipe_bridge;
pub mod replay;

pub use mediapipe_bridge::{
    default_provider_factory, DummyProvider, LandmarkProvider, ModelComplexity, ProviderFactory,
    ProviderHandle, ProviderOptions, ProviderPayload,
};
pub use replay::{load_recording, parse_recording, RecordedFrame, ReplayProvider};

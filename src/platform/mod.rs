// Integrations with collaborators outside the classification core:
// webcam devices and the landmark estimator

pub mod camera;
pub mod pose;

pub mod classify;
pub mod geometry;
pub mod landmark;

pub use classify::{Classifier, FeetOrientation};
pub use geometry::{angle, distance, midpoint, pixel_distance, signed_angle, AngleRange};
pub use landmark::{Landmark, LandmarkFrame, LandmarkIndex, Side};

pub mod cycle;
pub mod gate;
pub mod hold;
pub mod smooth;

pub use cycle::CycleCounter;
pub use gate::{GatedPhase, Verdict};
pub use hold::{HoldTimer, HoldUpdate};
pub use smooth::{LandmarkSmoother, SmoothingStrategy};

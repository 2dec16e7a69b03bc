//! Collaborators outside the render loop: narration audio, the disruption
//! sensor and the video publisher. Each is a trait with an in-process default.

mod narration;
mod publish;
mod sensor;

pub use narration::{Narration, SilentNarration};
pub use publish::{FramePublisher, LoggingPublisher};
pub use sensor::{NoSensor, SensorInput};

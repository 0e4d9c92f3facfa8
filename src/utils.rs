pub mod clock;
pub mod throttle;

pub use clock::{Clock, ManualClock, SystemClock};
pub use throttle::FrameThrottle;

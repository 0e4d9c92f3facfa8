pub mod alert;
pub mod config;
pub mod confirm;
pub mod detect;
pub mod error;
pub mod monitor;
pub mod source;
pub mod utils;

// Commonly used types
pub use alert::{AlertDispatcher, AlertGate, AlertMessage, Notifier};
pub use config::Config;
pub use confirm::{ClassSet, ConfirmationEngine, CounterPolicy, MonitoredClass};
pub use detect::{BoundingBox, DetectParams, Detection, Detector, YoloDetector};
pub use error::{Result, WatchError};
pub use monitor::{Monitor, MonitorSettings};
pub use source::VideoSource;

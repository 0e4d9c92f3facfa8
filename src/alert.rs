//! Alerting: rate limiting, evidence rendering and notification.

pub mod annotate;
pub mod dispatch;
pub mod gate;
pub mod notify;

pub use annotate::{Annotation, bundled_font, draw_annotations, load_font, select_annotations};
pub use dispatch::{AlertDispatcher, DispatchReport, artifact_path};
pub use gate::{AlertGate, AlertGateState};
pub use notify::{AlertMessage, Notifier, SmtpNotifier};

use ab_glyph::FontVec;
use chrono::{DateTime, Local};
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::alert::annotate::{bundled_font, draw_annotations, select_annotations};
use crate::alert::notify::{AlertMessage, Notifier};
use crate::confirm::{ClassSet, MonitoredClass};
use crate::detect::Detection;
use crate::error::Result;

/// What a dispatch produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub artifact: PathBuf,
    pub message: AlertMessage,
    /// Boxes drawn on the artifact.
    pub boxes: usize,
    /// `false` when no transport is configured or the transport failed.
    pub delivered: bool,
}

/// Produces the evidence frame for a confirmed, gated event and hands it to the transport.
pub struct AlertDispatcher {
    output_dir: PathBuf,
    notifier: Option<Box<dyn Notifier>>,
    font: Option<FontVec>,
}

impl AlertDispatcher {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            notifier: None,
            font: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Caption font to use instead of the bundled one.
    pub fn with_font(mut self, font: FontVec) -> Self {
        self.font = Some(font);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Annotate `frame` with the secondary detections, persist it and notify.
    ///
    /// `levels` are the current counter values of the confirmed classes, quoted in the body.
    ///
    /// # Errors
    /// Only when the artifact cannot be written. A transport failure is logged and reported
    /// through [`DispatchReport::delivered`]; the artifact stays on disk.
    pub fn dispatch(
        &self,
        frame: &DynamicImage,
        secondary: &[Detection],
        confirmed: ClassSet,
        levels: &[(MonitoredClass, u8)],
        at: DateTime<Local>,
    ) -> Result<DispatchReport> {
        let (width, height) = frame.dimensions();
        let annotations = select_annotations(secondary, width, height);
        let annotated = match &self.font {
            Some(font) => draw_annotations(frame, &annotations, font),
            None => draw_annotations(frame, &annotations, &bundled_font()?),
        };

        std::fs::create_dir_all(&self.output_dir)?;
        let artifact = artifact_path(&self.output_dir, at);
        // JPEG has no alpha channel
        DynamicImage::ImageRgb8(annotated.to_rgb8()).save_with_format(&artifact, ImageFormat::Jpeg)?;
        info!(path = %artifact.display(), boxes = annotations.len(), "Saved annotated detection frame");

        let message = AlertMessage {
            subject: alert_subject(confirmed),
            body: alert_body(levels, at),
            artifact: artifact.clone(),
        };

        let delivered = match &self.notifier {
            Some(notifier) => match notifier.send(&message) {
                Ok(()) => true,
                Err(e) => {
                    error!(error = %e, path = %artifact.display(), "Alert delivery failed; artifact kept on disk");
                    false
                }
            },
            None => {
                info!(subject = %message.subject, "No notification destination configured; alert logged only");
                false
            }
        };

        Ok(DispatchReport {
            artifact,
            message,
            boxes: annotations.len(),
            delivered,
        })
    }
}

/// `<dir>/wildfire_<YYYYmmdd_HHMMSS>.jpg`, suffixed `_1`, `_2`, ... when that name is taken.
pub fn artifact_path(dir: &Path, at: DateTime<Local>) -> PathBuf {
    let stem = format!("wildfire_{}", at.format("%Y%m%d_%H%M%S"));
    let mut candidate = dir.join(format!("{stem}.jpg"));
    let mut n = 1;
    while candidate.exists() {
        candidate = dir.join(format!("{stem}_{n}.jpg"));
        n += 1;
    }
    candidate
}

fn alert_subject(confirmed: ClassSet) -> String {
    let names: Vec<&str> = confirmed.iter().map(|c| c.as_str()).collect();
    if names.is_empty() {
        "Wildfire Detected".to_string()
    } else {
        format!("Wildfire {} Detected", names.join(" and "))
    }
}

fn alert_body(levels: &[(MonitoredClass, u8)], at: DateTime<Local>) -> String {
    let mut body = format!("Smoke / Fire detected at {}.", at.format("%Y-%m-%d %H:%M:%S"));
    for (class, level) in levels {
        body.push_str(&format!("\n{class} danger level: {level}"));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;
    use crate::error::WatchError;
    use chrono::TimeZone;
    use image::{Rgb, RgbImage};
    use std::sync::{Arc, Mutex};

    struct Recording(Arc<Mutex<Vec<AlertMessage>>>);

    impl Notifier for Recording {
        fn send(&self, message: &AlertMessage) -> Result<()> {
            self.0.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    struct Failing;

    impl Notifier for Failing {
        fn send(&self, _message: &AlertMessage) -> Result<()> {
            Err(WatchError::notify("connection refused"))
        }
    }

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 7, 14, 15, 30, 5).unwrap()
    }

    fn frame() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(80, 60, Rgb([40, 40, 40])))
    }

    fn secondary() -> Vec<Detection> {
        vec![Detection::new(BoundingBox::new(5.0, 5.0, 30.0, 30.0), 0, "Smoke", 0.91)]
    }

    fn smoke() -> ClassSet {
        [MonitoredClass::Smoke].into_iter().collect()
    }

    #[test]
    fn artifact_names_never_collide() {
        let dir = tempfile::tempdir().unwrap();
        let first = artifact_path(dir.path(), at());
        assert_eq!(first.file_name().unwrap(), "wildfire_20260714_153005.jpg");
        std::fs::write(&first, b"x").unwrap();

        let second = artifact_path(dir.path(), at());
        assert_eq!(second.file_name().unwrap(), "wildfire_20260714_153005_1.jpg");
    }

    #[test]
    fn dispatch_persists_and_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = AlertDispatcher::new(dir.path().join("detections"))
            .with_notifier(Box::new(Recording(sent.clone())));

        let report = dispatcher
            .dispatch(&frame(), &secondary(), smoke(), &[(MonitoredClass::Smoke, 6)], at())
            .unwrap();

        assert!(report.delivered);
        assert_eq!(report.boxes, 1);
        assert!(report.artifact.exists());
        assert_eq!(image::open(&report.artifact).unwrap().dimensions(), (80, 60));

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Wildfire Smoke Detected");
        assert!(sent[0].body.starts_with("Smoke / Fire detected at 2026-07-14 15:30:05."));
        assert!(sent[0].body.contains("Smoke danger level: 6"));
    }

    #[test]
    fn configured_font_replaces_bundled_captions() {
        let dir = tempfile::tempdir().unwrap();
        let font_path = dir.path().join("caption.ttf");
        std::fs::write(&font_path, include_bytes!("../../assets/fonts/DejaVuSansMono.ttf")).unwrap();
        let dispatcher = AlertDispatcher::new(dir.path().join("detections"))
            .with_font(crate::alert::load_font(&font_path).unwrap());

        let report = dispatcher
            .dispatch(&frame(), &secondary(), smoke(), &[(MonitoredClass::Smoke, 7)], at())
            .unwrap();

        assert_eq!(report.boxes, 1);
        assert!(!report.delivered);
        assert!(report.artifact.exists());
    }

    #[test]
    fn transport_failure_keeps_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = AlertDispatcher::new(dir.path()).with_notifier(Box::new(Failing));

        let report = dispatcher
            .dispatch(&frame(), &secondary(), smoke(), &[], at())
            .unwrap();

        assert!(!report.delivered);
        assert!(report.artifact.exists());
    }

    #[test]
    fn subject_names_every_confirmed_class() {
        let both: ClassSet = MonitoredClass::ALL.into_iter().collect();
        assert_eq!(alert_subject(both), "Wildfire Smoke and Fire Detected");
        assert_eq!(
            alert_subject([MonitoredClass::Fire].into_iter().collect()),
            "Wildfire Fire Detected"
        );
    }
}

//! Evidence rendering for alert frames.
//!
//! Selection is a pure function of the secondary detector output; drawing happens on a copy
//! of the frame and touches neither disk nor network.

use ab_glyph::{Font, FontRef, FontVec, PxScale};
use image::{DynamicImage, GenericImageView, ImageBuffer, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use raqote::{DrawOptions, DrawTarget, LineJoin, PathBuilder, SolidSource, Source, StrokeStyle};
use std::path::Path;

use crate::detect::{BoundingBox, Detection};
use crate::error::{Result, WatchError};

/// DejaVu Sans Mono, used for captions unless `annotation_font` overrides it.
/// License: `assets/fonts/DejaVu-LICENSE.txt`.
const BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSansMono.ttf");

const BOX_COLOR: SolidSource = SolidSource { r: 0xFF, g: 0x00, b: 0x00, a: 0xFF };
const BOX_WIDTH: f32 = 2.0;
const LABEL_SCALE: f32 = 16.0;
const LABEL_PADDING: i32 = 2;
/// Gap between the caption band and the top edge of its box.
const LABEL_OFFSET: i32 = 10;

/// A box ready to draw, clamped to the frame, with its caption.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub bbox: BoundingBox,
    /// `"<label> <confidence>"`, confidence with two decimals.
    pub label: String,
}

/// Pick the secondary-validated detections to render on a `width` x `height` frame.
///
/// Boxes are clamped to the frame and rounded to whole pixels. Boxes that end up empty are
/// dropped. Order follows the detector output.
pub fn select_annotations(secondary: &[Detection], width: u32, height: u32) -> Vec<Annotation> {
    secondary
        .iter()
        .filter_map(|det| {
            let b = det.bbox.clamp(width as f32, height as f32);
            let bbox = BoundingBox::new(b.x1.floor(), b.y1.floor(), b.x2.ceil(), b.y2.ceil());
            bbox.is_valid().then(|| Annotation {
                bbox,
                label: format!("{} {:.2}", det.class_name, det.confidence),
            })
        })
        .collect()
}

/// The caption font compiled into the binary.
///
/// # Errors
/// Only if the embedded font data is corrupt.
pub fn bundled_font() -> Result<FontRef<'static>> {
    FontRef::try_from_slice(BUNDLED_FONT)
        .map_err(|e| WatchError::config(format!("bundled caption font is invalid: {e}")))
}

/// Load a TrueType/OpenType font for label text.
///
/// # Errors
/// `Io` when the file cannot be read, `Config` when it is not a font.
pub fn load_font(path: impl AsRef<Path>) -> Result<FontVec> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    FontVec::try_from_vec(bytes)
        .map_err(|e| WatchError::config(format!("invalid font {}: {}", path.display(), e)))
}

/// Draw annotations on a copy of `frame`.
///
/// Each box is stroked in red and gets a red caption band above it carrying its label in white.
///
/// # Arguments
/// * `frame` - frame the detections were made on; it is not modified
/// * `annotations` - output of [`select_annotations`]
/// * `font` - caption font, usually [`bundled_font`] or a configured override
///
/// # Returns
/// The annotated copy, RGBA at the frame's size.
pub fn draw_annotations(frame: &DynamicImage, annotations: &[Annotation], font: &impl Font) -> DynamicImage {
    let (width, height) = frame.dimensions();
    let mut dt = DrawTarget::new(width as i32, height as i32);

    let image_data: Vec<u32> = frame
        .to_rgba8()
        .chunks(4)
        .map(|p| u32::from_le_bytes([p[2], p[1], p[0], p[3]]))
        .collect();
    let img = raqote::Image {
        width: width as i32,
        height: height as i32,
        data: &image_data,
    };
    dt.draw_image_at(0.0, 0.0, &img, &DrawOptions::new());

    let style = StrokeStyle {
        join: LineJoin::Round,
        width: BOX_WIDTH,
        ..StrokeStyle::default()
    };
    let mut captions = Vec::new();
    for annotation in annotations {
        let bbox = &annotation.bbox;
        let mut pb = PathBuilder::new();
        pb.rect(bbox.x1, bbox.y1, bbox.width(), bbox.height());
        dt.stroke(&pb.finish(), &Source::Solid(BOX_COLOR), &style, &DrawOptions::default());

        let (text_w, text_h) = text_size(PxScale::from(LABEL_SCALE), font, &annotation.label);
        let x = bbox.x1 as i32;
        let y = (bbox.y1 as i32 - LABEL_OFFSET - text_h as i32).max(0);
        dt.fill_rect(
            x as f32,
            y as f32,
            (text_w as i32 + 2 * LABEL_PADDING) as f32,
            (text_h as i32 + 2 * LABEL_PADDING) as f32,
            &Source::Solid(BOX_COLOR),
            &DrawOptions::new(),
        );
        captions.push((x + LABEL_PADDING, y + LABEL_PADDING, annotation.label.as_str()));
    }

    let pixels: Vec<u8> = dt
        .get_data()
        .iter()
        .flat_map(|&pixel| {
            let [b, g, r, a] = pixel.to_le_bytes();
            [r, g, b, a]
        })
        .collect();
    let mut canvas: RgbaImage = ImageBuffer::from_raw(width, height, pixels)
        .unwrap_or_else(|| frame.to_rgba8());

    for (x, y, text) in captions {
        draw_text_mut(&mut canvas, Rgba([0xFF, 0xFF, 0xFF, 0xFF]), x, y, PxScale::from(LABEL_SCALE), font, text);
    }

    DynamicImage::ImageRgba8(canvas)
}

use anyhow::{bail, Result};
use lopdf::Document;
use rmcp::schemars;
use serde::Deserialize;

use super::document::{page_object_id, visible_box};
use super::stamp::{check_font_size, text_width, Rgb, Stamper, TextStamp};
use crate::page_range::ResolvedPageSet;

/// Corner placements keep this fraction of the page size clear.
const CORNER_MARGIN: f32 = 0.05;

pub const DEFAULT_TEXT: &str = "CONFIDENTIAL";
pub const DEFAULT_COLOR: &str = "#3498db";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, schemars::JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum WatermarkPosition {
    #[default]
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    /// Centre plus the upper and lower thirds
    Tiled,
}

#[derive(Debug, Clone)]
pub struct WatermarkOptions {
    pub text: String,
    pub position: WatermarkPosition,
    /// Degrees, counter-clockwise
    pub rotation: f32,
    /// Percent, 0 to 100
    pub opacity: u8,
    pub font_size: f32,
    pub color: Rgb,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        WatermarkOptions {
            text: DEFAULT_TEXT.to_string(),
            position: WatermarkPosition::Center,
            rotation: 45.0,
            opacity: 60,
            font_size: 36.0,
            color: Rgb {
                r: 0x34 as f32 / 255.0,
                g: 0x98 as f32 / 255.0,
                b: 0xdb as f32 / 255.0,
            },
        }
    }
}

/// Centre points of the watermark text within `visible`.
fn centres(
    position: WatermarkPosition,
    visible: [f32; 4],
    width: f32,
    height: f32,
) -> Vec<(f32, f32)> {
    let [llx, lly, urx, ury] = visible;
    let (page_w, page_h) = (urx - llx, ury - lly);
    let mid_x = llx + page_w / 2.0;
    let mid_y = lly + page_h / 2.0;
    let left = llx + page_w * CORNER_MARGIN + width / 2.0;
    let right = urx - page_w * CORNER_MARGIN - width / 2.0;
    let top = ury - page_h * CORNER_MARGIN - height / 2.0;
    let bottom = lly + page_h * CORNER_MARGIN + height / 2.0;

    match position {
        WatermarkPosition::Center => vec![(mid_x, mid_y)],
        WatermarkPosition::TopLeft => vec![(left, top)],
        WatermarkPosition::TopRight => vec![(right, top)],
        WatermarkPosition::BottomLeft => vec![(left, bottom)],
        WatermarkPosition::BottomRight => vec![(right, bottom)],
        WatermarkPosition::Tiled => vec![
            (mid_x, mid_y),
            (mid_x, lly + page_h * 5.0 / 6.0),
            (mid_x, lly + page_h / 6.0),
        ],
    }
}

/// Draw a text watermark on each selected page. Returns the pages marked.
pub fn add_watermark(
    doc: &mut Document,
    pages: &ResolvedPageSet,
    options: &WatermarkOptions,
) -> Result<usize> {
    if options.text.trim().is_empty() {
        bail!("Watermark text must not be empty");
    }
    if options.opacity > 100 {
        bail!("Opacity must be between 0 and 100, got {}", options.opacity);
    }
    check_font_size(options.font_size)?;

    let stamper = Stamper::new(doc, Some(f32::from(options.opacity) / 100.0));
    let width = text_width(&options.text, options.font_size);
    // Rotation happens around the text centre.
    let offset = (-width / 2.0, -options.font_size / 3.0);

    for page in pages.iter() {
        let page_id = page_object_id(doc, page)?;
        let stamps: Vec<TextStamp> = centres(
            options.position,
            visible_box(doc, page_id),
            width,
            options.font_size,
        )
        .into_iter()
        .map(|origin| TextStamp {
            text: options.text.clone(),
            origin,
            offset,
            rotation: options.rotation,
            font_size: options.font_size,
            color: options.color,
        })
        .collect();
        stamper.stamp(doc, page_id, &stamps)?;
    }

    tracing::debug!(pages = %pages, position = ?options.position, "watermark drawn");
    Ok(pages.count())
}

use anyhow::Result;
use lopdf::Document;
use rmcp::schemars;
use serde::Deserialize;

use super::document::{page_object_id, visible_box};
use super::stamp::{check_font_size, text_width, Rgb, Stamper, TextStamp};
use crate::page_range::ResolvedPageSet;

/// Distance between the number and the page edge, in points.
const EDGE_MARGIN: f32 = 20.0;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, schemars::JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum NumberPosition {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    #[default]
    BottomCenter,
    BottomRight,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, schemars::JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum NumberFormat {
    /// 7
    #[default]
    Number,
    /// Page 7 of 10
    PageOfTotal,
    /// -7-
    NumberWithDash,
    /// vii
    RomanLower,
    /// VII
    RomanUpper,
}

impl NumberFormat {
    pub fn render(self, number: u32, total: u32) -> String {
        match self {
            NumberFormat::Number => number.to_string(),
            NumberFormat::PageOfTotal => format!("Page {} of {}", number, total),
            NumberFormat::NumberWithDash => format!("-{}-", number),
            NumberFormat::RomanLower => to_roman(number).to_lowercase(),
            NumberFormat::RomanUpper => to_roman(number),
        }
    }
}

/// Roman numerals for 1..=3999; anything else is written in decimal.
fn to_roman(mut number: u32) -> String {
    if !(1..=3999).contains(&number) {
        return number.to_string();
    }
    const NUMERALS: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        while number >= value {
            number -= value;
            out.push_str(numeral);
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct PageNumberOptions {
    pub position: NumberPosition,
    pub format: NumberFormat,
    pub font_size: f32,
    /// Number printed on the first selected page
    pub start_number: u32,
}

impl Default for PageNumberOptions {
    fn default() -> Self {
        PageNumberOptions {
            position: NumberPosition::default(),
            format: NumberFormat::default(),
            font_size: 12.0,
            start_number: 1,
        }
    }
}

/// Where the text baseline starts for a label `width` points wide.
fn anchor(position: NumberPosition, visible: [f32; 4], width: f32, font_size: f32) -> (f32, f32) {
    let [llx, lly, urx, ury] = visible;
    let x = match position {
        NumberPosition::TopLeft | NumberPosition::BottomLeft => llx + EDGE_MARGIN,
        NumberPosition::TopCenter | NumberPosition::BottomCenter => {
            llx + (urx - llx - width) / 2.0
        }
        NumberPosition::TopRight | NumberPosition::BottomRight => urx - width - EDGE_MARGIN,
    };
    let y = match position {
        NumberPosition::TopLeft | NumberPosition::TopCenter | NumberPosition::TopRight => {
            ury - EDGE_MARGIN - font_size
        }
        _ => lly + EDGE_MARGIN,
    };
    (x, y)
}

/// Print a running number on each selected page. The k-th selected page
/// (counting from zero) gets `start_number + k`. Returns the pages numbered.
pub fn add_page_numbers(
    doc: &mut Document,
    pages: &ResolvedPageSet,
    options: &PageNumberOptions,
) -> Result<usize> {
    check_font_size(options.font_size)?;
    let total = doc.get_pages().len() as u32;
    let stamper = Stamper::new(doc, None);

    for (k, page) in pages.iter().enumerate() {
        let page_id = page_object_id(doc, page)?;
        let number = options.start_number.saturating_add(k as u32);
        let text = options.format.render(number, total);
        let width = text_width(&text, options.font_size);
        let origin = anchor(
            options.position,
            visible_box(doc, page_id),
            width,
            options.font_size,
        );

        let stamp = TextStamp {
            text,
            origin,
            offset: (0.0, 0.0),
            rotation: 0.0,
            font_size: options.font_size,
            color: Rgb::BLACK,
        };
        stamper.stamp(doc, page_id, &[stamp])?;
    }

    tracing::debug!(pages = %pages, "page numbers drawn");
    Ok(pages.count())
}

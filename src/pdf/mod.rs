pub mod crop;
mod document;
pub mod images;
pub mod merge;
pub mod metadata;
pub mod page_numbers;
pub mod rotate;
mod stamp;
pub mod watermark;

#[cfg(test)]
pub mod fixture;

pub use document::PdfDocument;
pub use stamp::Rgb;

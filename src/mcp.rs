use anyhow::Result;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};

use crate::commands;
use crate::config::Config;
use crate::page_range::{PageRangeError, PageSpan};
use crate::pdf::crop::Margins;
use crate::pdf::metadata::MetadataUpdate;
use crate::pdf::page_numbers::{NumberFormat, NumberPosition, PageNumberOptions};
use crate::pdf::watermark::{WatermarkOptions, WatermarkPosition, DEFAULT_COLOR, DEFAULT_TEXT};
use crate::pdf::Rgb;
use crate::selection::PageSelection;
use crate::split::SplitMethod;

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ResolvePagesRequest {
    #[schemars(description = "PDF file to resolve against (or give total_pages)")]
    #[serde(default)]
    pub path: Option<String>,
    #[schemars(description = "Page count to resolve against when no file is given")]
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[schemars(description = "Which pages to pick (default: all)")]
    #[serde(default)]
    pub selection: PageSelection,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SelectPagesRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Which pages to pick (default: all)")]
    #[serde(default)]
    pub selection: PageSelection,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SplitBy {
    /// One file per range
    Ranges {
        #[schemars(description = "Ranges like '1-3' or '4-end'")]
        ranges: Vec<String>,
    },
    /// Cut after each of these pages
    AtPages { pages: Vec<u32> },
    /// Files of N consecutive pages
    EveryN { n: u32 },
    /// One file per page
    AllPages,
}

impl SplitBy {
    fn into_method(self) -> Result<SplitMethod, PageRangeError> {
        Ok(match self {
            SplitBy::Ranges { ranges } => {
                let mut spans: Vec<PageSpan> = Vec::new();
                for range in &ranges {
                    spans.extend(commands::split::parse_ranges(range)?);
                }
                SplitMethod::ByRanges(spans)
            }
            SplitBy::AtPages { pages } => SplitMethod::AtPages(pages),
            SplitBy::EveryN { n } => SplitMethod::EveryN(n),
            SplitBy::AllPages => SplitMethod::AllPages,
        })
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SplitRequest {
    #[schemars(description = "Path to the PDF file to split")]
    pub path: String,
    #[schemars(description = "Directory the parts are written to")]
    pub output_dir: String,
    #[schemars(description = "How to cut the document")]
    pub split: SplitBy,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CropRequest {
    pub path: String,
    #[serde(default)]
    pub selection: PageSelection,
    #[schemars(description = "Points trimmed from the left edge")]
    #[serde(default)]
    pub left: f32,
    #[serde(default)]
    pub right: f32,
    #[serde(default)]
    pub top: f32,
    #[serde(default)]
    pub bottom: f32,
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PageNumbersRequest {
    pub path: String,
    #[serde(default)]
    pub selection: PageSelection,
    #[serde(default)]
    pub position: NumberPosition,
    #[serde(default)]
    pub format: NumberFormat,
    #[schemars(description = "Font size in points (default: 12)")]
    #[serde(default)]
    pub font_size: Option<f32>,
    #[schemars(description = "Number printed on the first selected page (default: 1)")]
    #[serde(default)]
    pub start_number: Option<u32>,
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct WatermarkRequest {
    pub path: String,
    #[serde(default)]
    pub selection: PageSelection,
    #[schemars(description = "Watermark text (default: CONFIDENTIAL)")]
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub position: WatermarkPosition,
    #[schemars(description = "Rotation in degrees (default: 45)")]
    #[serde(default)]
    pub rotation: Option<f32>,
    #[schemars(description = "Opacity percent, 0 to 100 (default: 60)")]
    #[serde(default)]
    pub opacity: Option<u8>,
    #[schemars(description = "Font size in points (default: 36)")]
    #[serde(default)]
    pub font_size: Option<f32>,
    #[schemars(description = "Colour as #RRGGBB (default: #3498db)")]
    #[serde(default)]
    pub color: Option<String>,
    pub output: String,
}

impl WatermarkRequest {
    fn options(&self) -> Result<WatermarkOptions> {
        let defaults = WatermarkOptions::default();
        Ok(WatermarkOptions {
            text: self.text.as_deref().unwrap_or(DEFAULT_TEXT).to_string(),
            position: self.position,
            rotation: self.rotation.unwrap_or(defaults.rotation),
            opacity: self.opacity.unwrap_or(defaults.opacity),
            font_size: self.font_size.unwrap_or(defaults.font_size),
            color: Rgb::parse_hex(self.color.as_deref().unwrap_or(DEFAULT_COLOR))?,
        })
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MetadataRequest {
    pub path: String,
    #[schemars(description = "Fields left out are unchanged; an empty string removes a field")]
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub producer: Option<String>,
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RotateRequest {
    pub path: String,
    #[serde(default)]
    pub selection: PageSelection,
    #[schemars(description = "Degrees clockwise, a multiple of 90; negative turns the other way")]
    pub degrees: i64,
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ExtractImagesRequest {
    pub path: String,
    #[serde(default)]
    pub selection: PageSelection,
    #[schemars(description = "Directory the images are written to")]
    pub output_dir: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MergeRequest {
    #[schemars(description = "PDF files or directories of PDFs, in order")]
    pub inputs: Vec<String>,
    #[schemars(description = "Output file path")]
    pub output: String,
}

/// Failure payload: `{"error": {"kind": ..., "detail": ...}}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: &'static str,
    detail: String,
}

fn error_kind(err: &anyhow::Error) -> &'static str {
    if let Some(range_err) = err.downcast_ref::<PageRangeError>() {
        return range_err.kind();
    }
    if err.chain().any(|cause| cause.is::<std::io::Error>()) {
        return "io";
    }
    "document"
}

fn error_json(err: &anyhow::Error) -> String {
    let body = serde_json::json!({
        "error": ErrorBody {
            kind: error_kind(err),
            detail: format!("{:#}", err),
        }
    });
    serde_json::to_string_pretty(&body).unwrap_or_else(|_| format!("Error: {:#}", err))
}

/// Run `work` on the blocking pool and render its outcome as JSON.
async fn respond<T, F>(tool: &'static str, work: F) -> String
where
    T: Serialize + Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let result = match tokio::task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(e) => Err(anyhow::Error::new(e).context("PDF worker task failed")),
    };
    match result.and_then(|outcome| Ok(serde_json::to_string_pretty(&outcome)?)) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(tool, error = %format!("{:#}", e), "tool failed");
            error_json(&e)
        }
    }
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    config: Config,
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

impl PdfServer {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Get PDF metadata including title, author, creator, producer, dates, and page count")]
    async fn pdf_info(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        respond("pdf_info", move || commands::info::run(&path)).await
    }

    #[tool(description = "Show which pages a selection picks in a PDF (or in a document of total_pages pages) without changing anything")]
    async fn pdf_resolve_pages(&self, Parameters(req): Parameters<ResolvePagesRequest>) -> String {
        respond("pdf_resolve_pages", move || match (req.path, req.total_pages) {
            (Some(path), _) => commands::resolve::run_for_file(&path, &req.selection),
            (None, Some(total)) => commands::resolve::run(total, &req.selection),
            (None, None) => anyhow::bail!("Give either path or total_pages"),
        })
        .await
    }

    #[tool(description = "Copy the selected pages of a PDF into a new file")]
    async fn pdf_extract(&self, Parameters(req): Parameters<SelectPagesRequest>) -> String {
        let config = self.config.clone();
        respond("pdf_extract", move || {
            commands::extract::run(&config, &req.path, &req.selection, &req.output)
        })
        .await
    }

    #[tool(description = "Write a copy of a PDF without the selected pages; at least one page must remain")]
    async fn pdf_remove_pages(&self, Parameters(req): Parameters<SelectPagesRequest>) -> String {
        let config = self.config.clone();
        respond("pdf_remove_pages", move || {
            commands::remove::run(&config, &req.path, &req.selection, &req.output)
        })
        .await
    }

    #[tool(description = "Split a PDF into several files by ranges, at given pages, every N pages, or one file per page")]
    async fn pdf_split(&self, Parameters(req): Parameters<SplitRequest>) -> String {
        let config = self.config.clone();
        respond("pdf_split", move || {
            let method = req.split.into_method()?;
            commands::split::run(&config, &req.path, &method, &req.output_dir)
        })
        .await
    }

    #[tool(description = "Trim margins (in points) off the selected pages by setting their CropBox")]
    async fn pdf_crop(&self, Parameters(req): Parameters<CropRequest>) -> String {
        let config = self.config.clone();
        respond("pdf_crop", move || {
            let margins = Margins {
                left: req.left,
                right: req.right,
                top: req.top,
                bottom: req.bottom,
            };
            commands::crop::run(&config, &req.path, &req.selection, &margins, &req.output)
        })
        .await
    }

    #[tool(description = "Print page numbers (plain, 'Page X of Y', -X-, or roman) on the selected pages")]
    async fn pdf_add_page_numbers(
        &self,
        Parameters(req): Parameters<PageNumbersRequest>,
    ) -> String {
        let config = self.config.clone();
        respond("pdf_add_page_numbers", move || {
            let defaults = PageNumberOptions::default();
            let options = PageNumberOptions {
                position: req.position,
                format: req.format,
                font_size: req.font_size.unwrap_or(defaults.font_size),
                start_number: req.start_number.unwrap_or(defaults.start_number),
            };
            commands::number::run(&config, &req.path, &req.selection, &options, &req.output)
        })
        .await
    }

    #[tool(description = "Draw a semi-transparent text watermark on the selected pages")]
    async fn pdf_watermark(&self, Parameters(req): Parameters<WatermarkRequest>) -> String {
        let config = self.config.clone();
        respond("pdf_watermark", move || {
            let options = req.options()?;
            commands::watermark::run(&config, &req.path, &req.selection, &options, &req.output)
        })
        .await
    }

    #[tool(description = "Set or clear document information fields (title, author, subject, keywords, creator, producer)")]
    async fn pdf_edit_metadata(&self, Parameters(req): Parameters<MetadataRequest>) -> String {
        let config = self.config.clone();
        respond("pdf_edit_metadata", move || {
            let update = MetadataUpdate {
                title: req.title,
                author: req.author,
                subject: req.subject,
                keywords: req.keywords,
                creator: req.creator,
                producer: req.producer,
            };
            commands::metadata::run(&config, &req.path, &update, &req.output)
        })
        .await
    }

    #[tool(description = "Rotate the selected pages by a multiple of 90 degrees, on top of their current rotation")]
    async fn pdf_rotate(&self, Parameters(req): Parameters<RotateRequest>) -> String {
        let config = self.config.clone();
        respond("pdf_rotate", move || {
            commands::rotate::run(&config, &req.path, &req.selection, req.degrees, &req.output)
        })
        .await
    }

    #[tool(description = "Save the JPEG and JPEG 2000 images embedded in the selected pages; other images are listed as skipped")]
    async fn pdf_extract_images(
        &self,
        Parameters(req): Parameters<ExtractImagesRequest>,
    ) -> String {
        let config = self.config.clone();
        respond("pdf_extract_images", move || {
            commands::images::run(&config, &req.path, &req.selection, &req.output_dir)
        })
        .await
    }

    #[tool(description = "Combine PDFs into one file, in order; directories contribute their PDF files sorted by name")]
    async fn pdf_merge(&self, Parameters(req): Parameters<MergeRequest>) -> String {
        let config = self.config.clone();
        respond("pdf_merge", move || {
            commands::merge::run(&config, &req.inputs, &req.output)
        })
        .await
    }
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Page-level PDF editing tools. Every tool that works on pages takes a `selection` \
                 object: {\"mode\": \"all\"}, {\"mode\": \"custom\", \"pages\": \"1-3,7,10-end\"}, \
                 {\"mode\": \"pages\", \"pages\": [1, 4]}, {\"mode\": \"ranges\", \"ranges\": [\"1-3\"]}, \
                 {\"mode\": \"every_nth\", \"n\": 2}, {\"mode\": \"even\"}, {\"mode\": \"odd\"}, \
                 {\"mode\": \"current\", \"page\": 3}, {\"mode\": \"first\"} or {\"mode\": \"last\"}. \
                 Use pdf_resolve_pages to preview a selection."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    tracing::info!(overwrite = config.overwrite, "starting MCP server on stdio");
    let server = PdfServer::new(config);

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}

use async_trait::async_trait;
use browserless_client::{BrowserlessClient, BrowserlessError, RenderOptions};
use persona_common::FetchError;
use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};
use tracing::{info, warn};

/// Placeholder text some wikis show until client-side rendering finishes.
const LOADING_MARKER: &str = "Loading...";

/// How much of the page text is checked for [`LOADING_MARKER`].
const LOADING_WINDOW_CHARS: usize = 200;

/// A rendered page: reduced plain text plus the raw markup it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    pub text: String,
    pub markup: String,
}

impl FetchedDocument {
    /// Build a document from rendered HTML, rejecting pages that never
    /// finished loading.
    pub fn from_markup(url: &str, markup: String) -> Result<Self, FetchError> {
        let text = html_to_text(url, &markup);

        if text.is_empty() {
            return Err(FetchError::EmptyPage {
                url: url.to_string(),
            });
        }

        let head = ai_client::truncate_chars(&text, LOADING_WINDOW_CHARS);
        if head.contains(LOADING_MARKER) {
            return Err(FetchError::StillLoading {
                url: url.to_string(),
            });
        }

        Ok(Self { text, markup })
    }
}

#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Render `url` and return its text and markup.
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError>;
}

// --- Browserless fetcher ---

/// Renders pages through a Browserless instance, waiting a fixed settle time
/// for scripts to hydrate before the DOM is captured.
pub struct BrowserlessFetcher {
    client: BrowserlessClient,
    options: RenderOptions,
}

impl BrowserlessFetcher {
    pub fn new(client: BrowserlessClient, options: RenderOptions) -> Self {
        Self { client, options }
    }
}

#[async_trait]
impl DocumentFetcher for BrowserlessFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        validate_url(url)?;

        info!(url, settle_ms = self.options.settle.as_millis() as u64, "Rendering page");

        let markup = self
            .client
            .content(url, &self.options)
            .await
            .map_err(|e| render_error(url, e))?;

        let document = FetchedDocument::from_markup(url, markup);
        if let Err(ref e) = document {
            warn!(url, error = %e, "Rendered page unusable");
        }
        document
    }
}

fn validate_url(url: &str) -> Result<(), FetchError> {
    let parsed = url::Url::parse(url).map_err(|e| FetchError::Render {
        url: url.to_string(),
        message: format!("invalid URL: {e}"),
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(FetchError::Render {
            url: url.to_string(),
            message: format!("only http/https URLs are allowed, got {}", parsed.scheme()),
        });
    }
    Ok(())
}

fn render_error(url: &str, err: BrowserlessError) -> FetchError {
    FetchError::Render {
        url: url.to_string(),
        message: err.to_string(),
    }
}

/// Reduce HTML to plain text: scripts and styles dropped, one trimmed
/// non-empty line per text block.
pub fn html_to_text(url: &str, html: &str) -> String {
    let parsed_url = url::Url::parse(url).ok();
    let config = TransformConfig {
        readability: false,
        main_content: false,
        return_format: ReturnFormat::Text,
        filter_images: true,
        filter_svg: true,
        clean_html: true,
    };
    let input = TransformInput {
        url: parsed_url.as_ref(),
        content: html.as_bytes(),
        screenshot_bytes: None,
        encoding: None,
        selector_config: None,
        ignore_tags: None,
    };

    let text = transform_content_input(input, &config);

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

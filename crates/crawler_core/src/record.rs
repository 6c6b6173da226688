use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Icon {
    pub link: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub sizes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OpenGraph {
    pub title: String,
    pub description: String,
    pub image: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub site_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternate {
    pub link: String,
    pub locale: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub source: String,
    pub alt: String,
    pub title: String,
}

/// Everything an extractor pulls out of a document. The pipeline adds the
/// crawled URL and the measured response time to make a [`CrawlResult`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedPage {
    pub name: String,
    pub description: String,
    pub icons: Vec<Icon>,
    pub open_graph: OpenGraph,
    pub canonical: Option<String>,
    pub alternates: Vec<Alternate>,
    /// Absolute outbound links in document order, without duplicates.
    pub links: Vec<String>,
    pub text: Vec<String>,
    pub images: Vec<Image>,
}

/// The persisted record of one successful crawl. Built once, written once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResult {
    pub name: String,
    pub description: String,
    pub icons: Vec<Icon>,
    pub open_graph: OpenGraph,
    pub url: String,
    pub canonical: Option<String>,
    pub alternates: Vec<Alternate>,
    pub links: Vec<String>,
    pub text: Vec<String>,
    pub images: Vec<Image>,
    #[serde(rename = "responseTime")]
    pub response_time_ms: u64,
}

impl CrawlResult {
    pub fn new(page: ExtractedPage, url: impl Into<String>, response_time_ms: u64) -> Self {
        let ExtractedPage {
            name,
            description,
            icons,
            open_graph,
            canonical,
            alternates,
            links,
            text,
            images,
        } = page;
        Self {
            name,
            description,
            icons,
            open_graph,
            url: url.into(),
            canonical,
            alternates,
            links,
            text,
            images,
            response_time_ms,
        }
    }
}

use std::collections::HashSet;

use crawler_core::{Alternate, ExtractedPage, Icon, Image, OpenGraph};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Turns a decoded HTML document into page metadata. The pipeline adds the
/// crawled URL and response time.
pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str, base_url: &Url) -> ExtractedPage;
}

/// Extracts title, description, icons, OpenGraph tags, canonical and
/// alternate links, absolute outbound links, text blocks and images.
#[derive(Debug, Default)]
pub struct MetadataExtractor;

impl Extractor for MetadataExtractor {
    fn extract(&self, html: &str, base_url: &Url) -> ExtractedPage {
        let doc = Html::parse_document(html);
        let canonical = select(&doc, r#"link[rel="canonical"]"#)
            .next()
            .and_then(|el| el.value().attr("href"))
            .map(|href| href.trim().to_string());

        ExtractedPage {
            name: first_text(&doc, "title").unwrap_or_default(),
            description: meta_content(&doc, r#"meta[name="description"]"#)
                .or_else(|| meta_content(&doc, r#"meta[name="Description"]"#))
                .unwrap_or_default(),
            icons: icons(&doc, base_url),
            open_graph: open_graph(&doc),
            canonical,
            alternates: alternates(&doc),
            links: absolute_links(&doc),
            text: text_blocks(&doc),
            images: images(&doc),
        }
    }
}

fn select<'a>(doc: &'a Html, css: &str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    let selector = Selector::parse(css).ok();
    selector
        .map(|sel| doc.select(&sel).collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
}

fn first_text(doc: &Html, css: &str) -> Option<String> {
    select(doc, css)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

fn meta_content(doc: &Html, css: &str) -> Option<String> {
    select(doc, css)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|content| content.to_string())
        .filter(|content| !content.is_empty())
}

fn attr(el: &ElementRef, name: &str) -> String {
    el.value().attr(name).unwrap_or_default().to_string()
}

fn icons(doc: &Html, base_url: &Url) -> Vec<Icon> {
    let mut touch = Vec::new();
    let mut regular = Vec::new();
    for el in select(doc, "link[rel][href]") {
        let rel = attr(&el, "rel").to_ascii_lowercase();
        if !rel.contains("icon") {
            continue;
        }
        let Some(link) = el
            .value()
            .attr("href")
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .and_then(|href| base_url.join(href).ok())
        else {
            continue;
        };
        if rel == "apple-touch-icon" || rel == "apple-touch-icon-precomposed" {
            touch.push(Icon {
                link: link.to_string(),
                mime_type: String::new(),
                sizes: String::new(),
            });
        } else {
            regular.push(Icon {
                link: link.to_string(),
                mime_type: attr(&el, "type"),
                sizes: attr(&el, "sizes"),
            });
        }
    }
    touch.extend(regular);
    touch
}

fn open_graph(doc: &Html) -> OpenGraph {
    let property = |name: &str| {
        meta_content(doc, &format!(r#"meta[property="og:{name}"]"#)).unwrap_or_default()
    };
    OpenGraph {
        title: property("title"),
        description: property("description"),
        image: property("image"),
        url: property("url"),
        kind: property("type"),
        site_name: property("site_name"),
    }
}

fn alternates(doc: &Html) -> Vec<Alternate> {
    select(doc, r#"link[rel="alternate"][href]"#)
        .filter_map(|el| {
            let href = el.value().attr("href")?.trim();
            let url = Url::parse(href).ok()?;
            is_http(&url).then(|| Alternate {
                link: href.to_string(),
                locale: attr(&el, "hreflang"),
            })
        })
        .collect()
}

/// Absolute http(s) hrefs in document order, without duplicates. Relative
/// hrefs are not followed.
fn absolute_links(doc: &Html) -> Vec<String> {
    let mut seen = HashSet::new();
    select(doc, "a[href]")
        .filter_map(|el| Url::parse(el.value().attr("href")?.trim()).ok())
        .filter(is_http)
        .map(|mut url| {
            url.set_fragment(None);
            url.to_string()
        })
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

fn text_blocks(doc: &Html) -> Vec<String> {
    select(doc, "p, h1, h2, h3, h4, h5, h6, li")
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect()
}

fn images(doc: &Html) -> Vec<Image> {
    select(doc, "img[src]")
        .filter_map(|el| {
            let source = el.value().attr("src")?.trim();
            (!source.is_empty()).then(|| Image {
                source: source.to_string(),
                alt: attr(&el, "alt"),
                title: attr(&el, "title"),
            })
        })
        .collect()
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

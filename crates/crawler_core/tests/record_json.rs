use crawler_core::{CrawlResult, ExtractedPage, Icon, OpenGraph, WorkerEvent, ErrorContext};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn crawl_result_uses_stored_column_names() {
    let page = ExtractedPage {
        name: "Home".to_string(),
        icons: vec![Icon {
            link: "https://a.test/favicon.ico".to_string(),
            mime_type: "image/x-icon".to_string(),
            sizes: String::new(),
        }],
        open_graph: OpenGraph {
            site_name: "A".to_string(),
            ..OpenGraph::default()
        },
        ..ExtractedPage::default()
    };
    let result = CrawlResult::new(page, "https://a.test/", 42);

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["openGraph"]["site_name"], json!("A"));
    assert_eq!(value["icons"][0]["type"], json!("image/x-icon"));
    assert_eq!(value["responseTime"], json!(42));
    assert_eq!(value["url"], json!("https://a.test/"));
    assert_eq!(value["canonical"], json!(null));
}

#[test]
fn events_render_with_their_category_word_first() {
    let cases = [
        (
            WorkerEvent::Loaded { count: 3 },
            "Loaded 3 visited URLs from the database.",
        ),
        (
            WorkerEvent::Blocked {
                url: "http://a.test/".to_string(),
            },
            "Blocked by robots.txt : http://a.test/",
        ),
        (
            WorkerEvent::error(ErrorContext::Robots, "timeout"),
            "Error while fetching robots.txt : timeout",
        ),
        (
            WorkerEvent::warning("No URLs in queue."),
            "Warning - No URLs in queue.",
        ),
    ];
    for (event, expected) in cases {
        let rendered = event.to_string();
        assert_eq!(rendered, expected);
        assert!(rendered.starts_with(event.kind().label()));
    }
}

//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use md_crawler::config::Config;
use md_crawler::crawler::{run_crawl, Coordinator};
use md_crawler::output::SkipReason;
use md_crawler::url::page_filename;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing into `output_dir`
fn create_test_config(output_dir: &Path, max_pages: u32, max_depth: u32) -> Config {
    let mut config = Config::default();
    config.crawler.max_pages = max_pages;
    config.crawler.max_depth = max_depth;
    config.renderer.timeout_secs = 5;
    config.output.output_dir = output_dir.to_string_lossy().into_owned();
    config
}

/// Mounts an HTML page at `route`
async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn read(dir: &Path, file: &str) -> String {
    std::fs::read_to_string(dir.join(file))
        .unwrap_or_else(|e| panic!("failed to read {}: {}", file, e))
}

#[tokio::test]
async fn test_full_crawl_writes_mirror() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        format!(
            r#"<html><head><title>Home</title></head><body>
            <h1>Welcome</h1>
            <p>Read <a href="{}/page1">Page 1</a> or <a href="/page2">Page 2</a>.</p>
            </body></html>"#,
            base_url
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/page1",
        r#"<html><body><h1>Page 1</h1><p><a href="/page2#intro">Next</a></p></body></html>"#
            .to_string(),
    )
    .await;
    mount_page(
        &mock_server,
        "/page2",
        r#"<html><body><h1>Page 2</h1><p><a href="/">Home</a></p></body></html>"#.to_string(),
    )
    .await;

    let start = format!("{}/", base_url);
    let report = run_crawl(create_test_config(dir.path(), 10, 0), &start)
        .await
        .unwrap();

    assert_eq!(report.pages_dispatched, 3);
    assert_eq!(report.pages_saved, 3);
    assert!(report.skips.is_empty());
    assert!(report.finished_at.is_some());

    let index = read(dir.path(), "index.md");
    assert!(index.starts_with(&format!("# [{}]({})", start, start)));
    assert!(index.contains(&format!("**Source URL:** {}", start)));
    assert!(index.contains("# Welcome"));
    assert!(index.contains("[Page 1](page1.md)"));
    assert!(index.contains("[Page 2](page2.md)"));

    let page1 = read(dir.path(), "page1.md");
    assert!(page1.contains("[Next](page2.md)"));

    let page2 = read(dir.path(), "page2.md");
    assert!(page2.contains("[Home](index.md)"));
}

#[tokio::test]
async fn test_forward_reference_matches_saved_file() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        r#"<p><a href="/list?page=2">Older posts</a></p>"#.to_string(),
    )
    .await;
    mount_page(
        &mock_server,
        "/list",
        r#"<p>Second page of posts</p>"#.to_string(),
    )
    .await;

    let report = Coordinator::new(
        create_test_config(dir.path(), 10, 0),
        &format!("{}/", base_url),
    )
    .unwrap()
    .run()
    .await
    .unwrap();
    assert_eq!(report.pages_saved, 2);

    let target = page_filename(&url::Url::parse(&format!("{}/list?page=2", base_url)).unwrap());
    assert!(target.starts_with("list_"));

    let index = read(dir.path(), "index.md");
    assert!(index.contains(&format!("[Older posts]({})", target)));
    assert!(read(dir.path(), &target).contains("Second page of posts"));
}

#[tokio::test]
async fn test_page_budget_limits_dispatches() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&mock_server, "/", r#"<a href="/p1">1</a>"#.to_string()).await;
    mount_page(&mock_server, "/p1", r#"<a href="/p2">2</a>"#.to_string()).await;
    Mock::given(method("GET"))
        .and(path("/p2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>unreachable</p>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let report = Coordinator::new(
        create_test_config(dir.path(), 2, 0),
        &format!("{}/", mock_server.uri()),
    )
    .unwrap()
    .run()
    .await
    .unwrap();

    assert_eq!(report.pages_dispatched, 2);
    assert!(dir.path().join("index.md").exists());
    assert!(dir.path().join("p1.md").exists());
    assert!(!dir.path().join("p2.md").exists());
    // The link to the page that was never fetched still points at its name
    assert!(read(dir.path(), "p1.md").contains("[2](p2.md)"));
}

#[tokio::test]
async fn test_depth_limit_discards_deeper_pages() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/a">A</a> <a href="/b">B</a>"#.to_string(),
    )
    .await;
    mount_page(&mock_server, "/a", r#"<a href="/deep">Deep</a>"#.to_string()).await;
    mount_page(&mock_server, "/b", "<p>B</p>".to_string()).await;

    let report = Coordinator::new(
        create_test_config(dir.path(), 10, 2),
        &format!("{}/", mock_server.uri()),
    )
    .unwrap()
    .run()
    .await
    .unwrap();

    assert_eq!(report.pages_dispatched, 3);
    assert_eq!(report.pages_discarded, 1);
    assert!(!dir.path().join("deep.md").exists());
}

#[tokio::test]
async fn test_out_of_domain_links_left_alone() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        r#"<p><a href="https://elsewhere.example/docs">External</a></p>"#.to_string(),
    )
    .await;

    let report = Coordinator::new(
        create_test_config(dir.path(), 10, 0),
        &format!("{}/", mock_server.uri()),
    )
    .unwrap()
    .run()
    .await
    .unwrap();

    assert_eq!(report.pages_dispatched, 1);
    let index = read(dir.path(), "index.md");
    assert!(index.contains("[External](https://elsewhere.example/docs)"));
}

#[tokio::test]
async fn test_render_failure_is_skipped() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/broken">Broken</a> <a href="/ok">Ok</a>"#.to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/ok", "<p>Fine</p>".to_string()).await;

    let report = Coordinator::new(
        create_test_config(dir.path(), 10, 0),
        &format!("{}/", base_url),
    )
    .unwrap()
    .run()
    .await
    .unwrap();

    assert_eq!(report.pages_dispatched, 3);
    assert_eq!(report.pages_saved, 2);
    assert_eq!(report.skips.len(), 1);
    assert_eq!(report.skips[0].url, format!("{}/broken", base_url));
    assert_eq!(
        report.skips[0].reason,
        SkipReason::Render("HTTP status 500".to_string())
    );
    assert!(!dir.path().join("broken.md").exists());
    assert!(dir.path().join("ok.md").exists());
}

#[tokio::test]
async fn test_sitemap_index_seeds_crawl() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let base_url = mock_server.uri();

    Mock::given(method("HEAD"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <sitemap><loc>{0}/sitemap-a.xml</loc></sitemap>
              <sitemap><loc>{0}/sitemap-b.xml</loc></sitemap>
            </sitemapindex>"#,
            base_url
        )))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap-a.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url><loc>{0}/alpha</loc></url>
              <url><loc>{0}/beta</loc></url>
            </urlset>"#,
            base_url
        )))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap-b.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url><loc>{0}/beta</loc></url>
              <url><loc>{0}/gamma</loc></url>
              <url><loc>https://elsewhere.example/page</loc></url>
            </urlset>"#,
            base_url
        )))
        .mount(&mock_server)
        .await;

    mount_page(&mock_server, "/", "<p>Home</p>".to_string()).await;
    mount_page(&mock_server, "/alpha", "<p>Alpha</p>".to_string()).await;
    mount_page(&mock_server, "/beta", "<p>Beta</p>".to_string()).await;
    mount_page(&mock_server, "/gamma", "<p>Gamma</p>".to_string()).await;

    let mut config = create_test_config(dir.path(), 10, 1);
    config.crawler.use_sitemap = true;

    let report = Coordinator::new(config, &format!("{}/", base_url))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.sitemap_seeds, 3);
    assert_eq!(report.pages_saved, 4);
    for file in ["index.md", "alpha.md", "beta.md", "gamma.md"] {
        assert!(dir.path().join(file).exists(), "missing {}", file);
    }
}

#[tokio::test]
async fn test_missing_sitemap_falls_back_to_start_url() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&mock_server, "/", "<p>Only page</p>".to_string()).await;

    let mut config = create_test_config(dir.path(), 10, 1);
    config.crawler.use_sitemap = true;

    let report = Coordinator::new(config, &format!("{}/", mock_server.uri()))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.sitemap_seeds, 0);
    assert_eq!(report.pages_saved, 1);
    assert!(dir.path().join("index.md").exists());
}

#[tokio::test]
async fn test_assets_downloaded_and_rewritten() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<p><img src="/img/logo.png" alt="Logo"></p>
           <p><img src="/img/missing.png" alt="Gone"></p>"#
            .to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/img/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\x89PNG fake".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(dir.path(), 10, 1);
    config.crawler.download_assets = true;

    let report = Coordinator::new(config, &format!("{}/", base_url))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.assets_downloaded, 1);
    assert_eq!(
        std::fs::read(dir.path().join("assets/logo.png")).unwrap(),
        b"\x89PNG fake"
    );

    let index = read(dir.path(), "index.md");
    assert!(index.contains("![Logo](assets/logo.png)"));
    assert!(index.contains(&format!("![Gone]({}/img/missing.png)", base_url)));

    assert_eq!(report.skips.len(), 1);
    assert_eq!(report.skips[0].url, format!("{}/img/missing.png", base_url));
    assert_eq!(
        report.skips[0].reason,
        SkipReason::Asset("HTTP status 404".to_string())
    );
}

#[tokio::test]
async fn test_asset_and_sitemap_failures_are_reported() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let base_url = mock_server.uri();

    Mock::given(method("HEAD"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <sitemap><loc>{0}/sitemap-broken.xml</loc></sitemap>
              <sitemap><loc>{0}/sitemap-ok.xml</loc></sitemap>
            </sitemapindex>"#,
            base_url
        )))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap-broken.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap-ok.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<urlset><url><loc>{}/alpha</loc></url></urlset>"#,
            base_url
        )))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    mount_page(
        &mock_server,
        "/",
        r#"<p><img src="/img/missing.png" alt="Gone"></p>"#.to_string(),
    )
    .await;
    mount_page(&mock_server, "/alpha", "<p>Alpha</p>".to_string()).await;

    let mut config = create_test_config(dir.path(), 10, 1);
    config.crawler.use_sitemap = true;
    config.crawler.download_assets = true;

    let report = Coordinator::new(config, &format!("{}/", base_url))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.sitemap_seeds, 1);
    assert_eq!(report.pages_saved, 2);

    let sitemap_skip = report
        .skips
        .iter()
        .find(|s| matches!(s.reason, SkipReason::Sitemap(_)))
        .expect("sitemap failure recorded");
    assert_eq!(sitemap_skip.url, format!("{}/sitemap-broken.xml", base_url));
    assert_eq!(
        sitemap_skip.reason,
        SkipReason::Sitemap("HTTP status 500".to_string())
    );

    let asset_skip = report
        .skips
        .iter()
        .find(|s| matches!(s.reason, SkipReason::Asset(_)))
        .expect("asset failure recorded");
    assert_eq!(asset_skip.url, format!("{}/img/missing.png", base_url));

    let counts = report.skips_by_kind();
    assert_eq!(counts.get("sitemap"), Some(&1));
    assert_eq!(counts.get("asset"), Some(&1));
}

#[tokio::test]
async fn test_assets_left_remote_when_disabled() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<p><img src="/img/logo.png" alt="Logo"></p>"#.to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/img/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png".to_vec()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let report = Coordinator::new(
        create_test_config(dir.path(), 10, 1),
        &format!("{}/", base_url),
    )
    .unwrap()
    .run()
    .await
    .unwrap();

    assert_eq!(report.assets_downloaded, 0);
    let index = read(dir.path(), "index.md");
    assert!(index.contains(&format!("![Logo]({}/img/logo.png)", base_url)));
    assert!(!dir.path().join("assets").exists());
}

#[tokio::test]
async fn test_links_in_code_and_labels_with_backticks() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<html><body>
           <p>Start with <a href="/api/run">the `run` method</a>.</p>
           <pre><code>use <a href="/std/vec">Vec</a>;</code></pre>
           </body></html>"#
            .to_string(),
    )
    .await;
    mount_page(&mock_server, "/api/run", "<p>run</p>".to_string()).await;
    mount_page(&mock_server, "/std/vec", "<p>Vec</p>".to_string()).await;

    let report = Coordinator::new(
        create_test_config(dir.path(), 10, 0),
        &format!("{}/", base_url),
    )
    .unwrap()
    .run()
    .await
    .unwrap();

    assert_eq!(report.pages_saved, 3);
    let index = read(dir.path(), "index.md");
    assert!(index.contains("[the `run` method](api_run.md)"), "{}", index);
    assert!(index.contains("[Vec](std_vec.md)"), "{}", index);
    assert!(dir.path().join("api_run.md").exists());
    assert!(dir.path().join("std_vec.md").exists());
}

#[tokio::test]
async fn test_single_page_returns_rewritten_markdown() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/guide",
        r#"<html><body><h1>Guide</h1><p>See <a href="/faq">the FAQ</a>.</p>
           <script>console.log("hidden")</script></body></html>"#
            .to_string(),
    )
    .await;

    let markdown = Coordinator::new(
        create_test_config(&dir.path().join("mirror"), 10, 1),
        &format!("{}/guide", base_url),
    )
    .unwrap()
    .single_page()
    .await
    .unwrap();

    assert!(markdown.contains("# Guide"));
    assert!(markdown.contains("[the FAQ](faq.md)"));
    assert!(!markdown.contains("hidden"));
    assert!(!markdown.contains("**Source URL:**"));
    assert!(!dir.path().join("mirror").exists());
}

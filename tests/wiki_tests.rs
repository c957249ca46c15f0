use std::collections::HashSet;
use std::fs;

use axum::body::Bytes;
use axum::http::{header, Method, StatusCode};
use flatwiki::{build_app, App, Committed, Config, Request};
use tempfile::TempDir;

fn wiki() -> (TempDir, App) {
    let dir = TempDir::new().unwrap();
    let app = build_app(&Config::with_data_dir(dir.path()));
    (dir, app)
}

fn get(app: &App, path: &str, query: Option<&str>) -> Committed {
    app.dispatch(Request::get(path, query))
}

fn save(app: &App, path: &str, content: &str) -> Committed {
    let body = serde_urlencoded::to_string([("content", content)]).unwrap();
    app.dispatch(Request::new(Method::POST, path, Some("do=update".into()), Bytes::from(body)))
}

#[test]
fn saved_notice_is_one_shot() {
    let (_dir, app) = wiki();

    let saved = save(&app, "/notes", "Hello");
    assert_eq!(saved.status, StatusCode::OK);
    assert!(saved.text().contains("Content saved"));

    let read = get(&app, "/notes", None);
    assert_eq!(read.status, StatusCode::OK);
    assert!(read.text().contains("<p>Hello</p>"));
    assert!(!read.text().contains("Content saved"));
}

#[test]
fn missing_page_redirects_to_editor() {
    let (_dir, app) = wiki();
    let resp = get(&app, "/missing", None);
    assert_eq!(resp.status, StatusCode::FOUND);
    assert_eq!(resp.header(header::LOCATION), Some("?do=update"));
}

#[test]
fn editor_for_missing_page_is_empty() {
    let (_dir, app) = wiki();
    let resp = get(&app, "/missing", Some("do=update"));
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.text().contains("<textarea name=\"content\" rows=\"24\" autofocus></textarea>"));
}

#[test]
fn deleting_unknown_page_still_redirects() {
    let (dir, app) = wiki();
    let resp = get(&app, "/a/b", Some("do=delete"));
    assert_eq!(resp.status, StatusCode::FOUND);
    assert_eq!(resp.header(header::LOCATION), Some("/index"));
    assert!(!dir.path().join("a").exists());

    let again = app.dispatch(Request::new(Method::POST, "/a/b", Some("do=delete".into()), Bytes::new()));
    assert_eq!(again.status, StatusCode::FOUND);
}

#[test]
fn save_then_read_renders_markdown() {
    let (_dir, app) = wiki();
    save(&app, "/guide/setup", "# Setup\n\nRun **cargo** & relax <3\n");
    let html = get(&app, "/guide/setup", None).text();
    assert!(html.contains("<h1 id=\"setup\">Setup</h1>"));
    assert!(html.contains("<strong>cargo</strong>"));
    assert!(html.contains("&amp; relax &lt;3"));
}

#[test]
fn resave_overwrites() {
    let (dir, app) = wiki();
    save(&app, "/notes", "first");
    save(&app, "/notes", "second");
    assert_eq!(fs::read_to_string(dir.path().join("notes.md")).unwrap(), "second");
    let html = get(&app, "/notes", None).text();
    assert!(html.contains("second"));
    assert!(!html.contains("first"));
}

#[test]
fn root_is_the_index_document() {
    let (dir, app) = wiki();
    assert_eq!(get(&app, "/", None).status, StatusCode::FOUND);
    save(&app, "/", "Welcome");
    assert!(dir.path().join("index.md").is_file());
    assert!(get(&app, "/", None).text().contains("<p>Welcome</p>"));
}

#[test]
fn delete_then_read_redirects() {
    let (_dir, app) = wiki();
    save(&app, "/temp", "short lived");
    assert_eq!(get(&app, "/temp", Some("do=delete")).status, StatusCode::FOUND);
    assert_eq!(get(&app, "/temp", None).header(header::LOCATION), Some("?do=update"));
}

#[test]
fn listing_covers_every_page_but_the_index() {
    let (_dir, app) = wiki();
    for path in ["/", "/notes", "/a/b", "/a/c", "/deep/er/page"] {
        save(&app, path, "x");
    }

    let html = get(&app, "/index", None).text();
    let listed: Vec<&str> = html
        .split("<li><a href=\"")
        .skip(1)
        .filter_map(|chunk| chunk.split('"').next())
        .collect();
    let unique: HashSet<&str> = listed.iter().copied().collect();

    assert_eq!(listed.len(), unique.len());
    let expected: HashSet<&str> = ["/notes", "/a/b", "/a/c", "/deep/er/page"].into_iter().collect();
    assert_eq!(unique, expected);
}

#[test]
fn trailing_slash_page_is_listed() {
    let (dir, app) = wiki();
    assert_eq!(save(&app, "/a/", "hi").status, StatusCode::OK);
    assert!(dir.path().join("a/.md").is_file());
    assert!(get(&app, "/a/", None).text().contains("<p>hi</p>"));

    let html = get(&app, "/index", None).text();
    assert!(html.contains("<li><a href=\"/a/\">/a/</a></li>"));
    assert!(!html.contains("No pages yet"));
}

#[test]
fn empty_listing() {
    let (_dir, app) = wiki();
    let resp = get(&app, "/index", None);
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.text().contains("No pages yet"));
}

#[test]
fn static_assets_win_over_pages() {
    let (dir, app) = wiki();
    fs::create_dir_all(dir.path().join("css")).unwrap();
    fs::write(dir.path().join("css/wiki.css.md"), "shadow").unwrap();

    let resp = get(&app, "/css/wiki.css", None);
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.header(header::CONTENT_TYPE), Some("text/css; charset=utf-8"));
    assert!(!resp.text().contains("shadow"));
}

#[test]
fn debug_mode_reads_assets_from_disk() {
    let data = TempDir::new().unwrap();
    let assets = TempDir::new().unwrap();
    fs::create_dir_all(assets.path().join("templates")).unwrap();
    fs::create_dir_all(assets.path().join("www")).unwrap();
    let layout = "<title>{{ title }}</title>{{ main }}";
    fs::write(assets.path().join("templates/layout.html"), layout).unwrap();
    fs::write(assets.path().join("templates/read.html"), "<live>{{ content }}</live>").unwrap();
    fs::write(assets.path().join("www/robots.txt"), "User-agent: *").unwrap();

    let mut config = Config::with_data_dir(data.path());
    config.debug = true;
    config.asset_dir = assets.path().to_path_buf();
    let app = build_app(&config);

    fs::write(data.path().join("page.md"), "text").unwrap();
    assert_eq!(get(&app, "/page", None).text(), "<title>Wiki</title><live><p>text</p>\n</live>");

    let robots = get(&app, "/robots.txt", None);
    assert_eq!(robots.status, StatusCode::OK);
    assert_eq!(robots.text(), "User-agent: *");
    assert_eq!(robots.header(header::CONTENT_TYPE), Some("text/plain; charset=utf-8"));
}

#[test]
fn broken_template_is_a_500() {
    let data = TempDir::new().unwrap();
    let assets = TempDir::new().unwrap();
    fs::create_dir_all(assets.path().join("templates")).unwrap();
    fs::write(assets.path().join("templates/layout.html"), "{{ main }}").unwrap();
    fs::write(assets.path().join("templates/read.html"), "{{#if content}}never closed").unwrap();

    let mut config = Config::with_data_dir(data.path());
    config.debug = true;
    config.asset_dir = assets.path().to_path_buf();
    let app = build_app(&config);

    fs::write(data.path().join("page.md"), "text").unwrap();
    let resp = get(&app, "/page", None);
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.text(), "Template error: read: unclosed `#if content`\n");
}

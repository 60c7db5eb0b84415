//! Integration tests for the release pipeline
//!
//! These tests use wiremock to mock the list host, the spreadsheet export and
//! the catalogue API, and run whole requests end-to-end.

use reel_dates::catalogue::CatalogueClient;
use reel_dates::config::PipelineConfig;
use reel_dates::fetch::{build_http_client, Fetcher, FixedIdentity, RetryPolicy};
use reel_dates::pipeline::{PipelineStage, StageTracker};
use reel_dates::{FilmResult, ReleasePipeline, ReleaseRequest};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

/// Creates a pipeline against mock servers, with no politeness delays
fn create_test_pipeline(listing: &MockServer, catalogue: Option<&MockServer>) -> ReleasePipeline {
    create_test_pipeline_with_max_pages(listing, catalogue, 100)
}

fn create_test_pipeline_with_max_pages(
    listing: &MockServer,
    catalogue: Option<&MockServer>,
    max_pages: u32,
) -> ReleasePipeline {
    let timeout = Duration::from_secs(5);
    let fetcher = Fetcher::new(
        build_http_client(timeout).expect("Failed to build HTTP client"),
        RetryPolicy::immediate(2),
        Arc::new(FixedIdentity::new("TestAgent/1.0")),
        timeout,
    );
    let catalogue =
        catalogue.map(|server| CatalogueClient::new(fetcher.clone(), &server.uri(), TOKEN));

    ReleasePipeline::from_parts(
        fetcher,
        &listing.uri(),
        catalogue,
        PipelineConfig {
            concurrency: 2,
            page_delay_min_ms: 0,
            page_delay_max_ms: 0,
            item_delay_ms: 0,
            max_pages,
        },
    )
}

/// List page markup with the given slugs and page count
fn list_page_html(slugs: &[&str], pages: u32) -> String {
    let items: String = slugs
        .iter()
        .map(|slug| {
            format!(
                r#"<li class="poster-container"><div class="film-poster" data-film-slug="{}"></div></li>"#,
                slug
            )
        })
        .collect();

    let pagination = if pages > 1 {
        let links: String = (1..=pages)
            .map(|page| format!(r#"<li class="paginate-page"><a href="/page/{0}/">{0}</a></li>"#, page))
            .collect();
        format!(r#"<div class="paginate-pages"><ul>{}</ul></div>"#, links)
    } else {
        String::new()
    };

    format!(
        r#"<html><body><ul class="poster-list">{}</ul>{}</body></html>"#,
        items, pagination
    )
}

/// Film detail page markup
fn detail_page_html(title: &str, catalogue_id: Option<u64>) -> String {
    let id_marker = catalogue_id
        .map(|id| format!(r#"<body class="film" data-tmdb-id="{}">"#, id))
        .unwrap_or_else(|| "<body class=\"film\">".to_string());

    format!(
        r#"<html><head><meta property="og:title" content="{0}"></head>{1}<h1>{0}</h1></body></html>"#,
        title, id_marker
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_release_dates(server: &MockServer, catalogue_id: u64, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/3/movie/{}/release_dates", catalogue_id)))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_string(body.to_string()),
        )
        .mount(server)
        .await;
}

fn queries(results: &[FilmResult]) -> Vec<&str> {
    results.iter().map(|r| r.film_query.as_str()).collect()
}

fn find<'a>(results: &'a [FilmResult], query: &str) -> &'a FilmResult {
    results
        .iter()
        .find(|r| r.film_query == query)
        .unwrap_or_else(|| panic!("No result for {}", query))
}

#[tokio::test]
async fn test_full_run_over_two_pages() {
    let listing = MockServer::start().await;
    let catalogue = MockServer::start().await;

    // "gamma" appears on both pages
    mount_page(
        &listing,
        "/someone/list/faves/",
        list_page_html(&["alpha", "beta", "gamma"], 2),
    )
    .await;
    mount_page(
        &listing,
        "/someone/list/faves/page/2/",
        list_page_html(&["gamma", "delta"], 2),
    )
    .await;

    mount_page(&listing, "/film/alpha/", detail_page_html("Alpha (2021)", Some(1))).await;
    mount_page(&listing, "/film/beta/", detail_page_html("Beta", Some(2))).await;
    mount_page(&listing, "/film/gamma/", detail_page_html("Gamma (1982)", None)).await;
    mount_page(&listing, "/film/delta/", detail_page_html("Delta", Some(4))).await;

    mount_release_dates(
        &catalogue,
        1,
        r#"{"id": 1, "results": [
            {"iso_3166_1": "US", "release_dates": [
                {"certification": "", "note": "", "release_date": "2021-05-01T00:00:00.000Z", "type": 3},
                {"certification": "", "note": "", "release_date": "2021-04-10T00:00:00.000Z", "type": 4}
            ]},
            {"iso_3166_1": "GB", "release_dates": [
                {"certification": "", "note": "", "release_date": "2021-03-01T00:00:00.000Z", "type": 4}
            ]}
        ]}"#,
    )
    .await;
    mount_release_dates(
        &catalogue,
        2,
        r#"{"id": 2, "results": [
            {"iso_3166_1": "US", "release_dates": [
                {"release_date": "2019-05-05T00:00:00.000Z", "type": 3}
            ]}
        ]}"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/3/movie/4/release_dates"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"status_code": 34}"#))
        .mount(&catalogue)
        .await;

    let pipeline = create_test_pipeline(&listing, Some(&catalogue));
    let mut tracker = StageTracker::new();
    let results = pipeline
        .run_tracked(&ReleaseRequest::for_list("someone", "faves", "us"), &mut tracker)
        .await
        .expect("Run should succeed");

    assert_eq!(
        tracker.history(),
        &[
            PipelineStage::FetchingFirstPage,
            PipelineStage::CountingPages,
            PipelineStage::FetchingRemainingPages,
            PipelineStage::ResolvingItems,
            PipelineStage::Sorting,
            PipelineStage::Done,
        ]
    );

    // Each film exactly once, ordered by country date then name
    assert_eq!(queries(&results), vec!["beta", "alpha", "delta", "gamma"]);

    let alpha = find(&results, "alpha");
    assert_eq!(alpha.film_name.as_deref(), Some("Alpha"));
    assert_eq!(alpha.tmdb_id, Some(1));
    assert_eq!(alpha.country_release.as_deref(), Some("10-04-2021"));
    assert_eq!(alpha.country_release_type, Some(4));
    assert_eq!(alpha.digital_release.as_deref(), Some("01-03-2021"));
    assert_eq!(alpha.digital_release_type, Some(4));
    assert!(alpha.error.is_empty());

    let beta = find(&results, "beta");
    assert_eq!(beta.country_release.as_deref(), Some("05-05-2019"));
    assert_eq!(beta.country_release_type, Some(3));
    assert_eq!(beta.digital_release, None);
    assert_eq!(beta.error, vec!["No digital release date found".to_string()]);

    let gamma = find(&results, "gamma");
    assert_eq!(gamma.film_name.as_deref(), Some("Gamma"));
    assert_eq!(gamma.tmdb_id, None);
    assert_eq!(gamma.error, vec!["No TMDB id found on the film page".to_string()]);

    let delta = find(&results, "delta");
    assert_eq!(delta.tmdb_id, Some(4));
    assert_eq!(delta.country_release, None);
    assert_eq!(delta.error.len(), 1);
    assert!(delta.error[0].starts_with("TMDB lookup failed"));
    assert!(delta.error[0].contains("HTTP 404"));
}

#[tokio::test]
async fn test_exclude_premieres_only_filters_country_date() {
    let listing = MockServer::start().await;
    let catalogue = MockServer::start().await;

    mount_page(&listing, "/someone/list/one/", list_page_html(&["solo"], 1)).await;
    mount_page(&listing, "/film/solo/", detail_page_html("Solo", Some(9))).await;
    mount_release_dates(
        &catalogue,
        9,
        r#"{"id": 9, "results": [
            {"iso_3166_1": "FR", "release_dates": [
                {"release_date": "2020-01-01T00:00:00.000Z", "type": 1},
                {"release_date": "2020-02-02T00:00:00.000Z", "type": 3}
            ]},
            {"iso_3166_1": "DE", "release_dates": [
                {"release_date": "2019-12-24T00:00:00.000Z", "type": 4}
            ]}
        ]}"#,
    )
    .await;

    let pipeline = create_test_pipeline(&listing, Some(&catalogue));

    let all_types = pipeline
        .run(&ReleaseRequest::for_list("someone", "one", "FR"))
        .await
        .expect("Run should succeed");
    assert_eq!(all_types[0].country_release.as_deref(), Some("01-01-2020"));
    assert_eq!(all_types[0].country_release_type, Some(1));

    let without_premieres = pipeline
        .run(&ReleaseRequest::for_list("someone", "one", "FR").excluding_premieres())
        .await
        .expect("Run should succeed");
    assert_eq!(without_premieres[0].country_release.as_deref(), Some("02-02-2020"));
    assert_eq!(without_premieres[0].country_release_type, Some(3));
    assert_eq!(without_premieres[0].digital_release.as_deref(), Some("24-12-2019"));
}

#[tokio::test]
async fn test_failing_item_is_isolated() {
    let listing = MockServer::start().await;
    let slugs = ["one", "two", "three", "four", "five"];

    mount_page(&listing, "/someone/list/five/", list_page_html(&slugs, 1)).await;
    for (index, slug) in slugs.iter().enumerate() {
        if *slug == "three" {
            continue;
        }
        mount_page(
            &listing,
            &format!("/film/{}/", slug),
            detail_page_html(&slug.to_uppercase(), Some(index as u64 + 100)),
        )
        .await;
    }

    Mock::given(method("GET"))
        .and(path("/film/three/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal error"))
        .expect(2)
        .mount(&listing)
        .await;

    let pipeline = create_test_pipeline(&listing, None);
    let response = pipeline
        .handle(&ReleaseRequest::for_list("someone", "five", "US"))
        .await;

    assert!(response.ok);
    assert_eq!(response.results.len(), 5);

    let failed = find(&response.results, "three");
    assert!(!failed.error.is_empty());
    assert!(failed.error[0].starts_with("Film page lookup failed"));
    assert!(failed.error[0].contains("2 attempts"));
    assert_eq!(failed.tmdb_id, None);
    assert_eq!(failed.country_release, None);
    assert_eq!(failed.digital_release, None);

    for slug in ["one", "two", "four", "five"] {
        let result = find(&response.results, slug);
        assert!(result.tmdb_id.is_some(), "{} should have an id", slug);
        assert_eq!(result.film_name.as_deref(), Some(slug.to_uppercase().as_str()));
        assert_eq!(
            result.error,
            vec!["TMDB token not configured; release dates skipped".to_string()]
        );
    }

    listing.verify().await;
}

#[tokio::test]
async fn test_first_page_failure_fails_request() {
    let listing = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/someone/list/gone/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Upstream down"))
        .mount(&listing)
        .await;

    let pipeline = create_test_pipeline(&listing, None);
    let request = ReleaseRequest::for_list("someone", "gone", "US");

    let mut tracker = StageTracker::new();
    let err = pipeline
        .run_tracked(&request, &mut tracker)
        .await
        .expect_err("First page failure is fatal");
    assert!(err.to_string().contains("/someone/list/gone/"));
    assert_eq!(tracker.current(), PipelineStage::Failed);

    let response = pipeline.handle(&request).await;
    assert!(!response.ok);
    assert!(response.results.is_empty());
    assert!(response.error.unwrap().contains("first page"));

    let detail = response.detail.expect("Cause should be reported");
    assert!(detail.contains("2 attempts"));
    assert!(detail.contains("HTTP 500"));

    let json = serde_json::to_value(&pipeline.handle(&request).await).unwrap();
    assert_eq!(json["ok"], false);
    assert!(json["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_later_page_failure_is_skipped() {
    let listing = MockServer::start().await;

    mount_page(
        &listing,
        "/someone/list/long/",
        list_page_html(&["kept"], 3),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/someone/list/long/page/2/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&listing)
        .await;
    mount_page(
        &listing,
        "/someone/list/long/page/3/",
        list_page_html(&["also-kept"], 3),
    )
    .await;
    mount_page(&listing, "/film/kept/", detail_page_html("Kept", Some(1))).await;
    mount_page(&listing, "/film/also-kept/", detail_page_html("Also Kept", Some(2))).await;

    let pipeline = create_test_pipeline(&listing, None);
    let response = pipeline
        .handle(&ReleaseRequest::for_list("someone", "long", "US"))
        .await;

    assert!(response.ok);
    // No dates anywhere, so the display name decides
    assert_eq!(queries(&response.results), vec!["also-kept", "kept"]);
}

#[tokio::test]
async fn test_page_count_is_capped() {
    let listing = MockServer::start().await;

    mount_page(
        &listing,
        "/someone/list/huge/",
        list_page_html(&["first"], 5),
    )
    .await;
    mount_page(
        &listing,
        "/someone/list/huge/page/2/",
        list_page_html(&["second"], 5),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/someone/list/huge/page/3/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&listing)
        .await;
    mount_page(&listing, "/film/first/", detail_page_html("First", Some(1))).await;
    mount_page(&listing, "/film/second/", detail_page_html("Second", Some(2))).await;

    let pipeline = create_test_pipeline_with_max_pages(&listing, None, 2);
    let response = pipeline
        .handle(&ReleaseRequest::for_list("someone", "huge", "US"))
        .await;

    assert!(response.ok);
    assert_eq!(queries(&response.results), vec!["first", "second"]);

    listing.verify().await;
}

#[tokio::test]
async fn test_spreadsheet_source() {
    let sheet = MockServer::start().await;
    let catalogue = MockServer::start().await;

    mount_page(
        &sheet,
        "/films.csv",
        "film_query,film_name,tmdb_id\nheat-1995,Heat,949\nthief,,\n,,\nheat-1995,Heat,949\n"
            .to_string(),
    )
    .await;

    // A known id means the detail page is never needed
    Mock::given(method("GET"))
        .and(path("/film/heat-1995/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&sheet)
        .await;
    mount_page(&sheet, "/film/thief/", detail_page_html("Thief (1981)", Some(11524))).await;

    mount_release_dates(
        &catalogue,
        949,
        r#"{"id": 949, "results": [
            {"iso_3166_1": "US", "release_dates": [
                {"release_date": "1995-12-15T00:00:00.000Z", "type": 3}
            ]}
        ]}"#,
    )
    .await;
    mount_release_dates(
        &catalogue,
        11524,
        r#"{"id": 11524, "results": [
            {"iso_3166_1": "US", "release_dates": [
                {"release_date": "1981-03-27T00:00:00.000Z", "type": 3},
                {"release_date": "2014-02-25T00:00:00.000Z", "type": 4}
            ]}
        ]}"#,
    )
    .await;

    let pipeline = create_test_pipeline(&sheet, Some(&catalogue));
    let request = ReleaseRequest::for_sheet(&format!("{}/films.csv", sheet.uri()), "US");

    let mut tracker = StageTracker::new();
    let results = pipeline
        .run_tracked(&request, &mut tracker)
        .await
        .expect("Run should succeed");

    assert_eq!(
        tracker.history(),
        &[
            PipelineStage::FetchingFirstPage,
            PipelineStage::ResolvingItems,
            PipelineStage::Sorting,
            PipelineStage::Done,
        ]
    );

    assert_eq!(queries(&results), vec!["thief", "heat-1995"]);

    let thief = &results[0];
    assert_eq!(thief.film_name.as_deref(), Some("Thief"));
    assert_eq!(thief.country_release.as_deref(), Some("27-03-1981"));
    assert_eq!(thief.digital_release.as_deref(), Some("25-02-2014"));

    let heat = &results[1];
    assert_eq!(heat.film_name.as_deref(), Some("Heat"));
    assert_eq!(heat.tmdb_id, Some(949));
    assert_eq!(heat.country_release.as_deref(), Some("15-12-1995"));

    sheet.verify().await;
}

#[tokio::test]
async fn test_missing_sheet_fails_request() {
    let sheet = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing.csv"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&sheet)
        .await;

    let pipeline = create_test_pipeline(&sheet, None);
    let response = pipeline
        .handle(&ReleaseRequest::for_sheet(
            &format!("{}/missing.csv", sheet.uri()),
            "US",
        ))
        .await;

    assert!(!response.ok);
    assert!(response.detail.unwrap().contains("HTTP 404"));
}

#[tokio::test]
async fn test_empty_list_succeeds_with_no_results() {
    let listing = MockServer::start().await;
    mount_page(&listing, "/someone/list/empty/", list_page_html(&[], 1)).await;

    let pipeline = create_test_pipeline(&listing, None);
    let response = pipeline
        .handle(&ReleaseRequest::for_list("someone", "empty", "US"))
        .await;

    assert!(response.ok);
    assert!(response.results.is_empty());
}

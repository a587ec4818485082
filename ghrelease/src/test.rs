use crate::{
    error::FetchError,
    forge::{ReleaseSource, Repository},
    release::{Asset, MalformedResponse, Release},
    widget::{ReleaseWidget, RenderState, BUTTON_CLASS, ERROR_CLASS, TITLE_CLASS},
    ForgeBuilder, HtmlDocument, WidgetOptions,
};
use anyhow::Result;
use async_trait::async_trait;
use mockito::Server;
use reqwest::StatusCode;
use serde_json::json;
use std::{
    cell::RefCell,
    rc::Rc,
    sync::atomic::{AtomicUsize, Ordering},
};
use test_log::test;
use url::Url;

pub(crate) enum Outcome {
    Release(Release),
    NotFound,
    Malformed,
}

/// A [`ReleaseSource`] with canned answers. Every fetch yields to the runtime once before
/// answering so tests can look at the document while a load is in flight.
pub(crate) struct FakeSource {
    latest: Vec<Outcome>,
    releases: Option<Vec<Release>>,
    latest_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl FakeSource {
    pub(crate) fn with_latest(outcome: Outcome) -> Self {
        FakeSource::with_latest_sequence(vec![outcome])
    }

    /// The nth fetch of the latest release gets the nth outcome. Once they run out the last one
    /// repeats.
    pub(crate) fn with_latest_sequence(outcomes: Vec<Outcome>) -> Self {
        FakeSource {
            latest: outcomes,
            releases: None,
            latest_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_releases(releases: Vec<Release>) -> Self {
        FakeSource {
            latest: vec![Outcome::NotFound],
            releases: Some(releases),
            latest_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
        }
    }

    /// A release with a `tool.exe` (10 downloads) and a `tool.jar` (4 downloads).
    pub(crate) fn release(tag: &str) -> Release {
        let asset = |name: &str, download_count| Asset {
            name: name.to_string(),
            download_url: Url::parse(&format!(
                "https://github.com/o/r/releases/download/{tag}/{name}"
            ))
            .unwrap(),
            download_count,
        };
        Release {
            published_at: "2024-01-01".to_string(),
            version: tag.to_string(),
            assets: vec![asset("tool.exe", 10), asset("tool.jar", 4)],
        }
    }

    pub(crate) fn latest_calls(&self) -> usize {
        self.latest_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

fn fake_url(repository: &Repository, path: &str) -> Url {
    Url::parse(&format!(
        "https://api.github.com/repos/{repository}/{path}"
    ))
    .unwrap()
}

fn not_found(url: Url) -> FetchError {
    FetchError::Status {
        url,
        status: StatusCode::NOT_FOUND,
    }
}

#[async_trait]
impl ReleaseSource for FakeSource {
    async fn latest_release(&self, repository: &Repository) -> Result<Release, FetchError> {
        let call = self.latest_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let url = fake_url(repository, "releases/latest");
        match &self.latest[call.min(self.latest.len() - 1)] {
            Outcome::Release(release) => Ok(release.clone()),
            Outcome::NotFound => Err(not_found(url)),
            Outcome::Malformed => Err(FetchError::MalformedResponse {
                url,
                source: MalformedResponse("missing field `tag_name`".to_string()),
            }),
        }
    }

    async fn releases(&self, repository: &Repository) -> Result<Vec<Release>, FetchError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        self.releases
            .clone()
            .ok_or_else(|| not_found(fake_url(repository, "releases")))
    }
}

#[test(tokio::test)]
async fn renders_latest_release_from_forge() -> Result<()> {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", "/repos/some/tool/releases/latest")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "published_at": "2024-01-01",
                "tag_name": "v2.0",
                "assets": [
                    {
                        "name": "tool.exe",
                        "browser_download_url": "http://x/tool.exe",
                        "download_count": 10,
                    },
                ],
            })
            .to_string(),
        )
        .create_async()
        .await;

    let forge = ForgeBuilder::new().api_base_url(&server.url()).build()?;
    let doc = Rc::new(RefCell::new(HtmlDocument::with_container("releases")));
    let widget = ReleaseWidget::new(
        doc.clone(),
        forge,
        "some/tool".parse()?,
        "releases",
        WidgetOptions::default(),
    );

    widget.load().await?;
    m.assert_async().await;

    assert_eq!(widget.state(), RenderState::Populated);
    let doc = doc.borrow();
    let container = doc.body();
    let titles = doc.find_by_class(container, TITLE_CLASS);
    assert_eq!(titles.len(), 1);
    assert_eq!(doc.text(titles[0]), Some("Version: v2.0"));

    let buttons = doc.find_by_class(container, BUTTON_CLASS);
    assert_eq!(buttons.len(), 1);
    let link = doc.children(buttons[0])[0];
    assert_eq!(doc.attribute(link, "href"), Some("http://x/tool.exe"));
    assert_eq!(doc.text(link), Some("tool.exe (10 downloads)"));

    assert_eq!(
        doc.to_html(container),
        concat!(
            r#"<body><div id="releases" class="ghrelease">"#,
            r#"<h3 class="ghrelease-title">Version: v2.0</h3>"#,
            r#"<div class="ghrelease-button"><a href="http://x/tool.exe">tool.exe (10 downloads)</a></div>"#,
            "</div></body>",
        ),
    );

    Ok(())
}

#[test(tokio::test)]
async fn forge_error_is_rendered_and_returned() -> Result<()> {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", "/repos/some/tool/releases/latest")
        .with_status(404)
        .with_body(r#"{"message": "Not Found"}"#)
        .create_async()
        .await;

    let forge = ForgeBuilder::new().api_base_url(&server.url()).build()?;
    let doc = Rc::new(RefCell::new(HtmlDocument::with_container("releases")));
    let widget = ReleaseWidget::new(
        doc.clone(),
        forge,
        Repository::new("some", "tool"),
        "releases",
        WidgetOptions::default(),
    );

    let err = widget.load().await.expect_err("load fails");
    m.assert_async().await;

    assert!(matches!(err, FetchError::Status { .. }), "{err:?}");
    assert_eq!(widget.state(), RenderState::Failed);
    let doc = doc.borrow();
    assert_eq!(doc.find_by_class(doc.body(), ERROR_CLASS).len(), 1);

    Ok(())
}

#[test(tokio::test)]
async fn download_totals_from_forge() -> Result<()> {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", "/repos/some/tool/releases")
        .with_status(200)
        .with_body(
            json!([
                {
                    "published_at": "2024-02-01",
                    "tag_name": "v2",
                    "assets": [
                        {"name": "b.jar", "browser_download_url": "https://x/b.jar", "download_count": 5},
                        {"name": "c.exe", "browser_download_url": "https://x/c.exe", "download_count": 2},
                    ],
                },
                {
                    "published_at": "2024-01-01",
                    "tag_name": "v1",
                    "assets": [
                        {"name": "a.exe", "browser_download_url": "https://x/a.exe", "download_count": 3},
                    ],
                },
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let forge = ForgeBuilder::new().api_base_url(&server.url()).build()?;
    let totals =
        crate::fetch_download_totals(&forge, Repository::new("some", "tool")).await?;
    m.assert_async().await;

    assert_eq!(
        totals
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect::<Vec<_>>(),
        vec![("exe".to_string(), 5), ("jar".to_string(), 5)],
    );

    Ok(())
}

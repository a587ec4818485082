use crate::{
    error::FetchError,
    release::{parse_release, parse_releases, MalformedResponse, Release},
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::{
    header::{HeaderValue, ACCEPT},
    Client, StatusCode,
};
use serde_json::Value;
use std::{fmt, str::FromStr, sync::LazyLock};
use url::Url;

static GITHUB_PROJECT_BASE_URL: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://github.com").unwrap());
static GITHUB_API_BASE_URL: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://api.github.com").unwrap());
static FORGEJO_PROJECT_BASE_URL: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://codeberg.org").unwrap());
static FORGEJO_API_BASE_URL: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://codeberg.org/api/v1").unwrap());

// It'd be nice to use clap::ValueEnum here, but then we'd need to add clap as a dependency for the
// library code, which would be annoying for downstream users who just want to use the library.
/// The forges whose release API this crate knows how to read. Forgejo serves the same release JSON
/// shape as GitHub, so both share the request and parsing code.
#[derive(
    strum::AsRefStr,
    Clone,
    Copy,
    Debug,
    Default,
    strum::Display,
    strum::EnumString,
    PartialEq,
    Eq,
    strum::VariantNames,
)]
#[allow(clippy::module_name_repetitions)]
pub enum ForgeType {
    #[strum(serialize = "forgejo")]
    Forgejo,
    #[strum(serialize = "github")]
    #[default]
    GitHub,
}

impl ForgeType {
    /// Guesses the forge from a project string. Only a URL on a known Forgejo host is detected as
    /// Forgejo, everything else is GitHub.
    #[must_use]
    pub fn detect(project: &str) -> ForgeType {
        let Ok(url) = Url::parse(project) else {
            return ForgeType::default();
        };
        if url.domain().is_some() && url.domain() == FORGEJO_PROJECT_BASE_URL.domain() {
            ForgeType::Forgejo
        } else {
            ForgeType::default()
        }
    }

    pub(crate) fn project_base_url(self) -> Url {
        match self {
            ForgeType::Forgejo => FORGEJO_PROJECT_BASE_URL.clone(),
            ForgeType::GitHub => GITHUB_PROJECT_BASE_URL.clone(),
        }
    }

    pub(crate) fn api_base_url(self) -> Url {
        match self {
            ForgeType::Forgejo => FORGEJO_API_BASE_URL.clone(),
            ForgeType::GitHub => GITHUB_API_BASE_URL.clone(),
        }
    }
}

/// An `owner/name` pair identifying a repository on a forge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    #[must_use]
    pub fn new(owner: &str, name: &str) -> Self {
        Repository {
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Accepts either `owner/name` or the URL of any page in the project, like
/// `https://github.com/owner/name/releases`.
impl FromStr for Repository {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parsed = if s.starts_with("http://") || s.starts_with("https://") {
            Url::parse(s)?
        } else {
            ForgeType::default().project_base_url().join(s)?
        };

        let parts = parsed.path().split('/').collect::<Vec<_>>();
        // The first part is an empty string for the leading '/' in the path.
        if parts.len() < 3 || parts[1].is_empty() || parts[2].is_empty() {
            return Err(anyhow!("could not parse owner and repository name from `{s}`"));
        }

        let repository = Repository::new(parts[1], parts[2]);
        debug!("Parsed `{s}` = {repository}");
        Ok(repository)
    }
}

/// Something that can hand out releases for a repository.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// The most recent release of the repository.
    async fn latest_release(&self, repository: &Repository) -> Result<Release, FetchError>;

    /// Every release of the repository, in the order the forge returns them (newest first).
    async fn releases(&self, repository: &Repository) -> Result<Vec<Release>, FetchError>;
}

/// A [`ReleaseSource`] that talks to a forge's REST API. Use the
/// [`ForgeBuilder`](crate::ForgeBuilder) struct to create one.
#[derive(Debug)]
pub struct Forge {
    forge_type: ForgeType,
    api_base_url: Url,
    client: Client,
}

impl Forge {
    pub(crate) fn new(forge_type: ForgeType, api_base_url: Url, client: Client) -> Self {
        Forge {
            forge_type,
            api_base_url,
            client,
        }
    }

    #[must_use]
    pub fn forge_type(&self) -> ForgeType {
        self.forge_type
    }

    /// `{api_base}/repos/{owner}/{name}/releases/latest`
    #[must_use]
    pub fn latest_release_url(&self, repository: &Repository) -> Url {
        let mut url = self.releases_url(repository);
        url.path_segments_mut()
            .expect("could not get path segments for url")
            .push("latest");
        url
    }

    /// `{api_base}/repos/{owner}/{name}/releases`
    #[must_use]
    pub fn releases_url(&self, repository: &Repository) -> Url {
        let mut url = self.api_base_url.clone();
        // The builder rejects base URLs that cannot have path segments.
        url.path_segments_mut()
            .expect("could not get path segments for url")
            .pop_if_empty()
            .push("repos")
            .push(&repository.owner)
            .push(&repository.name)
            .push("releases");
        url
    }

    async fn get_json(&self, url: Url) -> Result<Value, FetchError> {
        debug!("Getting release info from `{url}`");

        let req = self
            .client
            .get(url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .build()
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;
        let resp = self
            .client
            .execute(req)
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status { url, status });
        }

        let body = resp.text().await.map_err(|source| FetchError::Transport {
            url: url.clone(),
            source,
        })?;
        serde_json::from_str::<Value>(&body).map_err(|e| FetchError::MalformedResponse {
            url,
            source: MalformedResponse(format!("response body is not JSON: {e}")),
        })
    }
}

#[async_trait]
impl ReleaseSource for Forge {
    async fn latest_release(&self, repository: &Repository) -> Result<Release, FetchError> {
        let url = self.latest_release_url(repository);
        let value = self.get_json(url.clone()).await?;
        parse_release(value).map_err(|source| FetchError::MalformedResponse { url, source })
    }

    async fn releases(&self, repository: &Repository) -> Result<Vec<Release>, FetchError> {
        let url = self.releases_url(repository);
        let value = self.get_json(url.clone()).await?;
        parse_releases(value).map_err(|source| FetchError::MalformedResponse { url, source })
    }
}

/// The `builder` module contains the `ForgeBuilder` struct which is used to create a `Forge`.
use crate::forge::{Forge, ForgeType};
use anyhow::{anyhow, Context, Result};
use log::debug;
use reqwest::{
    header::{HeaderMap, HeaderValue, USER_AGENT},
    Client,
};
use url::Url;

/// `ForgeBuilder` is used to create a [`Forge`] instance.
#[derive(Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct ForgeBuilder<'a> {
    forge: Option<ForgeType>,
    api_base_url: Option<&'a str>,
}

impl<'a> ForgeBuilder<'a> {
    /// Returns a new empty `ForgeBuilder`.
    #[must_use]
    pub fn new() -> Self {
        ForgeBuilder::default()
    }

    /// Set the forge type to talk to. This determines the default API base URL. The default is
    /// GitHub.
    #[must_use]
    pub fn forge(mut self, forge: ForgeType) -> Self {
        self.forge = Some(forge);
        self
    }

    /// Set the base URL for the forge site's API. This is useful for testing or if you want to
    /// operate against an Enterprise version of GitHub or a self-hosted Forgejo. This should be
    /// something like `https://github.my-corp.example.com/api/v3`.
    #[must_use]
    pub fn api_base_url(mut self, api_base_url: &'a str) -> Self {
        self.api_base_url = Some(api_base_url);
        self
    }

    /// Builds a new [`Forge`] instance and returns it.
    ///
    /// # Errors
    ///
    /// Returns an error if the API base URL cannot be parsed or cannot have path segments appended
    /// to it, or if the HTTP client cannot be created.
    pub fn build(self) -> Result<Forge> {
        let forge_type = self.forge.unwrap_or_default();
        let api_base_url = if let Some(api_base_url) = self.api_base_url {
            Url::parse(api_base_url)
                .with_context(|| format!("invalid API base URL `{api_base_url}`"))?
        } else {
            forge_type.api_base_url()
        };
        if api_base_url.cannot_be_a_base() {
            return Err(anyhow!(
                "the API base URL `{api_base_url}` cannot be used as a base for other URLs"
            ));
        }
        debug!("Using {forge_type} API at {api_base_url}");

        Ok(Forge::new(forge_type, api_base_url, reqwest_client()?))
    }
}

fn reqwest_client() -> Result<Client> {
    let builder = Client::builder().gzip(true);

    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("ghrelease version {}", super::VERSION))?,
    );
    Ok(builder.default_headers(headers).build()?)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_to_github() -> Result<()> {
        let forge = ForgeBuilder::new().build()?;
        assert_eq!(forge.forge_type(), ForgeType::GitHub);
        Ok(())
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let err = ForgeBuilder::new()
            .api_base_url("not a url")
            .build()
            .expect_err("build fails");
        assert!(err.to_string().contains("invalid API base URL"), "{err}");
    }

    #[test]
    fn rejects_base_url_without_path() {
        let err = ForgeBuilder::new()
            .api_base_url("mailto:someone@example.com")
            .build()
            .expect_err("build fails");
        assert!(err.to_string().contains("cannot be used as a base"), "{err}");
    }
}

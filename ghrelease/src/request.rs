use crate::{
    error::FetchError,
    forge::{ReleaseSource, Repository},
    release::Release,
};
use log::debug;

type Callback<'a, T> = Box<dyn FnOnce(Result<T, FetchError>) + 'a>;

/// A request for the most recent release of a repository.
///
/// Either `fetch` it and use the result directly, or register a callback and `send` it. The
/// callback is called exactly once with the outcome, including failures.
pub struct ReleaseRequest<'a, S: ReleaseSource + ?Sized> {
    source: &'a S,
    repository: Repository,
    callback: Option<Callback<'a, Release>>,
}

impl<'a, S: ReleaseSource + ?Sized> ReleaseRequest<'a, S> {
    #[must_use]
    pub fn new(source: &'a S, repository: Repository) -> Self {
        Self {
            source,
            repository,
            callback: None,
        }
    }

    /// Registers the function that receives the outcome when the request is sent.
    #[must_use]
    pub fn callback(mut self, callback: impl FnOnce(Result<Release, FetchError>) + 'a) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Fetches the release.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] on transport failures, non-200 responses, and malformed bodies.
    pub async fn fetch(&self) -> Result<Release, FetchError> {
        debug!("Fetching latest release of {}", self.repository);
        self.source.latest_release(&self.repository).await
    }

    /// Fetches the release and hands the outcome to the registered callback. Without a callback
    /// the outcome is dropped.
    pub async fn send(self) {
        let res = self.fetch().await;
        deliver(&self.repository, self.callback, res);
    }
}

/// A request for every release of a repository, newest first.
///
/// This works the same way as [`ReleaseRequest`].
pub struct ReleaseListRequest<'a, S: ReleaseSource + ?Sized> {
    source: &'a S,
    repository: Repository,
    callback: Option<Callback<'a, Vec<Release>>>,
}

impl<'a, S: ReleaseSource + ?Sized> ReleaseListRequest<'a, S> {
    #[must_use]
    pub fn new(source: &'a S, repository: Repository) -> Self {
        Self {
            source,
            repository,
            callback: None,
        }
    }

    #[must_use]
    pub fn callback(
        mut self,
        callback: impl FnOnce(Result<Vec<Release>, FetchError>) + 'a,
    ) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Fetches the releases.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] on transport failures, non-200 responses, and malformed bodies.
    pub async fn fetch(&self) -> Result<Vec<Release>, FetchError> {
        debug!("Fetching all releases of {}", self.repository);
        self.source.releases(&self.repository).await
    }

    pub async fn send(self) {
        let res = self.fetch().await;
        deliver(&self.repository, self.callback, res);
    }
}

fn deliver<T>(
    repository: &Repository,
    callback: Option<Callback<'_, T>>,
    res: Result<T, FetchError>,
) {
    match callback {
        Some(callback) => callback(res),
        None => match res {
            Ok(_) => debug!("No callback registered for {repository}, discarding the response"),
            Err(e) => debug!("No callback registered for {repository}, discarding error: {e}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{FakeSource, Outcome};
    use anyhow::Result;
    use std::cell::RefCell;
    use test_log::test;

    #[test(tokio::test)]
    async fn send_calls_callback_once_with_release() -> Result<()> {
        let source = FakeSource::with_latest(Outcome::Release(FakeSource::release("v2.0")));
        let got = RefCell::new(Vec::new());

        ReleaseRequest::new(&source, Repository::new("o", "r"))
            .callback(|res| got.borrow_mut().push(res.map(|r| r.version)))
            .send()
            .await;

        let got = got.into_inner();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].as_ref().ok(), Some(&"v2.0".to_string()));
        assert_eq!(source.latest_calls(), 1);

        Ok(())
    }

    #[test(tokio::test)]
    async fn send_calls_callback_with_failure() -> Result<()> {
        let source = FakeSource::with_latest(Outcome::NotFound);
        let mut failed = false;

        ReleaseRequest::new(&source, Repository::new("o", "r"))
            .callback(|res| failed = matches!(res, Err(FetchError::Status { .. })))
            .send()
            .await;

        assert!(failed, "callback saw the status error");

        Ok(())
    }

    #[test(tokio::test)]
    async fn send_without_callback_still_fetches() -> Result<()> {
        let source = FakeSource::with_latest(Outcome::Release(FakeSource::release("v1")));
        ReleaseRequest::new(&source, Repository::new("o", "r"))
            .send()
            .await;
        assert_eq!(source.latest_calls(), 1);
        Ok(())
    }

    #[test(tokio::test)]
    async fn list_request_delivers_all_releases_in_order() -> Result<()> {
        let source = FakeSource::with_releases(vec![
            FakeSource::release("v3"),
            FakeSource::release("v2"),
            FakeSource::release("v1"),
        ]);
        let mut versions = Vec::new();

        ReleaseListRequest::new(&source, Repository::new("o", "r"))
            .callback(|res| {
                if let Ok(releases) = res {
                    versions.extend(releases.into_iter().map(|r| r.version));
                }
            })
            .send()
            .await;

        assert_eq!(versions, vec!["v3", "v2", "v1"]);

        Ok(())
    }

    #[test(tokio::test)]
    async fn fetch_returns_the_result() -> Result<()> {
        let source = FakeSource::with_releases(vec![FakeSource::release("v1")]);
        let releases = ReleaseListRequest::new(&source, Repository::new("o", "r"))
            .fetch()
            .await?;
        assert_eq!(releases.len(), 1);
        Ok(())
    }
}

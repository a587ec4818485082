use crate::{
    error::FetchError,
    forge::{ReleaseSource, Repository},
    release::{Asset, Release},
    request::ReleaseListRequest,
};
use itertools::Itertools;
use std::collections::BTreeMap;

/// The two buckets download counts are grouped into. An asset whose name ends in `.exe` is an
/// `Exe`, anything else is a `Jar`.
#[derive(
    strum::AsRefStr, Clone, Copy, Debug, strum::Display, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum AssetKind {
    #[strum(serialize = "exe")]
    Exe,
    #[strum(serialize = "jar")]
    Jar,
}

impl AssetKind {
    #[must_use]
    pub fn of(asset: &Asset) -> AssetKind {
        if asset.name.ends_with(".exe") {
            AssetKind::Exe
        } else {
            AssetKind::Jar
        }
    }
}

/// Sums the download counts of every asset of every release by [`AssetKind`]. A kind with no
/// assets at all is left out of the result rather than reported as zero.
#[must_use]
pub fn download_totals(releases: &[Release]) -> BTreeMap<AssetKind, u64> {
    releases
        .iter()
        .flat_map(|release| &release.assets)
        .map(|asset| (AssetKind::of(asset), asset.download_count))
        .into_grouping_map()
        .sum()
        .into_iter()
        .collect()
}

/// Fetches every release of `repository` and returns [`download_totals`] for them.
///
/// # Errors
///
/// Returns the [`FetchError`] from the release list request.
pub async fn fetch_download_totals<S: ReleaseSource + ?Sized>(
    source: &S,
    repository: Repository,
) -> Result<BTreeMap<AssetKind, u64>, FetchError> {
    let releases = ReleaseListRequest::new(source, repository).fetch().await?;
    Ok(download_totals(&releases))
}

/// Like [`fetch_download_totals`], but hands the outcome to `callback` instead of returning it.
/// The callback is called exactly once, with the fetch error if the release list could not be
/// fetched.
pub async fn send_download_totals<'a, S: ReleaseSource + ?Sized>(
    source: &'a S,
    repository: Repository,
    callback: impl FnOnce(Result<BTreeMap<AssetKind, u64>, FetchError>) + 'a,
) {
    ReleaseListRequest::new(source, repository)
        .callback(|res| callback(res.map(|releases| download_totals(&releases))))
        .send()
        .await;
}

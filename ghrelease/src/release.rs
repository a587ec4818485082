use log::debug;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Returned when a JSON value does not have the shape of a release or asset.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct MalformedResponse(pub(crate) String);

/// One downloadable file attached to a [`Release`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub download_url: Url,
    pub download_count: u64,
}

/// One published version of a repository. The assets are kept in the order the API returned them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Release {
    /// The publish date exactly as the API sent it.
    pub published_at: String,
    /// The tag name.
    pub version: String,
    pub assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
struct AssetJson {
    name: String,
    browser_download_url: Url,
    download_count: u64,
}

#[derive(Debug, Deserialize)]
struct ReleaseJson {
    published_at: String,
    tag_name: String,
    assets: Vec<Value>,
}

impl From<AssetJson> for Asset {
    fn from(json: AssetJson) -> Self {
        Asset {
            name: json.name,
            download_url: json.browser_download_url,
            download_count: json.download_count,
        }
    }
}

/// Parses one asset object shaped like `{name, browser_download_url, download_count}`.
///
/// # Errors
///
/// Returns a [`MalformedResponse`] if a field is missing or has the wrong type, if the download
/// URL is not absolute, or if the download count is negative.
pub fn parse_asset(value: Value) -> Result<Asset, MalformedResponse> {
    serde_json::from_value::<AssetJson>(value)
        .map(Asset::from)
        .map_err(|e| MalformedResponse(e.to_string()))
}

/// Parses one release object shaped like `{published_at, tag_name, assets: [...]}`. Each asset is
/// parsed with [`parse_asset`].
///
/// # Errors
///
/// Returns a [`MalformedResponse`] if the release or any of its assets is malformed.
pub fn parse_release(value: Value) -> Result<Release, MalformedResponse> {
    let json = serde_json::from_value::<ReleaseJson>(value)
        .map_err(|e| MalformedResponse(e.to_string()))?;

    let assets = json
        .assets
        .into_iter()
        .enumerate()
        .map(|(i, asset)| {
            parse_asset(asset).map_err(|e| {
                MalformedResponse(format!("asset {i} of release {}: {e}", json.tag_name))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    debug!(
        "parsed release {} with {} asset(s)",
        json.tag_name,
        assets.len()
    );

    Ok(Release {
        published_at: json.published_at,
        version: json.tag_name,
        assets,
    })
}

/// Parses a JSON array of release objects, keeping the order of the array.
///
/// # Errors
///
/// Returns a [`MalformedResponse`] if the value is not an array or if any element is malformed.
pub fn parse_releases(value: Value) -> Result<Vec<Release>, MalformedResponse> {
    let Value::Array(items) = value else {
        return Err(MalformedResponse(format!(
            "expected an array of releases but got {}",
            json_type_name(&value),
        )));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            parse_release(item).map_err(|e| MalformedResponse(format!("release {i}: {e}")))
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

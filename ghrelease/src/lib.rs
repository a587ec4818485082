//! A library for showing the releases of a project hosted on GitHub or a Forgejo instance.
//!
//! It fetches release information from the forge's REST API and either renders the latest
//! release into an element of a document, with a title and one download button per asset, or
//! sums download counts across every release.
//!
//! This project also ships a CLI tool named `ghrelease`. See [the project's GitHub
//! repo](https://github.com/houseabsolute/ghrelease) for more details on installing and using
//! this tool.
//!
//! The main entry point for programmatic use is the [`ForgeBuilder`] struct, which creates a
//! [`Forge`]. Here is an example of rendering the latest release into a document:
//!
//! ```ignore
//! use ghrelease::{ForgeBuilder, HtmlDocument, ReleaseWidget, WidgetOptions};
//! use std::{cell::RefCell, rc::Rc};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let forge = ForgeBuilder::new().build()?;
//!     let doc = Rc::new(RefCell::new(HtmlDocument::with_container("releases")));
//!     let widget = ReleaseWidget::new(
//!         doc.clone(),
//!         forge,
//!         "houseabsolute/precious".parse()?,
//!         "releases",
//!         WidgetOptions::default(),
//!     );
//!
//!     widget.load().await?;
//!     println!("{}", doc.borrow().to_html(doc.borrow().body()));
//!
//!     Ok(())
//! }
//! ```
//!
//! ## What Gets Rendered
//!
//! [`ReleaseWidget::load`] looks for the element with the configured id. The element gets the
//! `ghrelease` class and a `ghrelease-loader` child while the fetch is in flight. When the fetch
//! succeeds the container's children are replaced by an `h3.ghrelease-title` element followed by
//! one `div.ghrelease-button` per asset, each wrapping a link to the asset's download URL. When it
//! fails they are replaced by a single `div.ghrelease-error`.
//!
//! Any node tree can be rendered into by implementing the [`Document`] trait. The crate ships
//! [`HtmlDocument`], which keeps the tree in memory and serializes it as HTML.
//!
//! ## Download Totals
//!
//! [`fetch_download_totals`] fetches every release of a project and sums the download counts of
//! their assets in two buckets. Assets whose name ends with `.exe` are counted as `exe` and
//! everything else as `jar`. [`send_download_totals`] does the same but hands the outcome to a
//! callback.
//!
//! ## Features
//!
//! This crate offers several features to control the TLS dependency used by `reqwest`:
//!
#![doc = document_features::document_features!()]

mod builder;
mod dom;
mod error;
mod forge;
mod release;
mod request;
#[cfg(test)]
mod test;
mod totals;
mod widget;

pub use crate::{
    builder::ForgeBuilder,
    dom::{create_element_with_classes, Document, HtmlDocument, NodeId},
    error::FetchError,
    forge::{Forge, ForgeType, ReleaseSource, Repository},
    release::{parse_asset, parse_release, parse_releases, Asset, MalformedResponse, Release},
    request::{ReleaseListRequest, ReleaseRequest},
    totals::{download_totals, fetch_download_totals, send_download_totals, AssetKind},
    widget::{
        default_button_text, default_title_text, ButtonText, ReleaseWidget, RenderState,
        TitleText, WidgetOptions, BUTTON_CLASS, CONTAINER_CLASS, ERROR_CLASS, LOADER_CLASS,
        TITLE_CLASS,
    },
};

// The version of the `ghrelease` crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(feature = "logging")]
use fern::{
    colors::{Color, ColoredLevelConfig},
    Dispatch,
};

/// Sets up colored logging to stderr. It's public for the sake of the `ghrelease` binary, but it
/// lives in the library crate so that anything embedding the library can share the same format.
///
/// # Errors
///
/// This can return a `log::SetLoggerError` error if a logger was already set.
#[cfg(feature = "logging")]
pub fn init_logger(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    let line_colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::BrightBlack)
        .debug(Color::BrightBlack)
        .trace(Color::BrightBlack);
    let level_colors = line_colors.info(Color::Green).debug(Color::Black);

    Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{color_line}[{target}][{level}{color_line}] {message}\x1B[0m",
                color_line = format_args!(
                    "\x1B[{}m",
                    line_colors.get_color(&record.level()).to_fg_str()
                ),
                target = record.target(),
                level = level_colors.color(record.level()),
                message = message,
            ));
        })
        .level(level)
        .level_for("hyper", log::LevelFilter::Error)
        .level_for("hyper_util", log::LevelFilter::Error)
        .level_for("reqwest", log::LevelFilter::Error)
        .chain(std::io::stderr())
        .apply()
}

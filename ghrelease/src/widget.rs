use crate::{
    dom::{create_element_with_classes, Document},
    error::FetchError,
    forge::{ReleaseSource, Repository},
    release::{Asset, Release},
    request::ReleaseRequest,
};
use log::{debug, error, warn};
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

/// Added to the container element.
pub const CONTAINER_CLASS: &str = "ghrelease";
pub const LOADER_CLASS: &str = "ghrelease-loader";
pub const TITLE_CLASS: &str = "ghrelease-title";
/// Added to the element wrapping each asset's link.
pub const BUTTON_CLASS: &str = "ghrelease-button";
pub const ERROR_CLASS: &str = "ghrelease-error";

const LOADER_TEXT: &str = "Loading...";
const ERROR_TEXT: &str = "Unable to load release information";

pub type TitleText = fn(&Release) -> String;
pub type ButtonText = fn(&Asset) -> String;

/// The text shown by a [`ReleaseWidget`].
#[derive(Clone, Copy)]
pub struct WidgetOptions {
    /// Text of the title element. Defaults to [`default_title_text`].
    pub title_text: TitleText,
    /// Text of each asset's link. Defaults to [`default_button_text`].
    pub button_text: ButtonText,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        WidgetOptions {
            title_text: default_title_text,
            button_text: default_button_text,
        }
    }
}

/// `Version: {version}`
#[must_use]
pub fn default_title_text(release: &Release) -> String {
    format!("Version: {}", release.version)
}

/// `{name} ({download_count} downloads)`
#[must_use]
pub fn default_button_text(asset: &Asset) -> String {
    format!("{} ({} downloads)", asset.name, asset.download_count)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderState {
    /// `load` has not done anything yet.
    Idle,
    Loading,
    Populated,
    Failed,
}

/// Renders the latest release of a repository into one container element of a document.
///
/// The document is shared with whatever else uses the page, so it is only borrowed for the
/// synchronous steps of a load and never across the fetch.
pub struct ReleaseWidget<S, D> {
    document: Rc<RefCell<D>>,
    source: S,
    repository: Repository,
    container_id: String,
    options: WidgetOptions,
    state: Cell<RenderState>,
}

impl<S: ReleaseSource, D: Document> ReleaseWidget<S, D> {
    #[must_use]
    pub fn new(
        document: Rc<RefCell<D>>,
        source: S,
        repository: Repository,
        container_id: &str,
        options: WidgetOptions,
    ) -> Self {
        ReleaseWidget {
            document,
            source,
            repository,
            container_id: container_id.to_string(),
            options,
            state: Cell::new(RenderState::Idle),
        }
    }

    #[must_use]
    pub fn state(&self) -> RenderState {
        self.state.get()
    }

    /// Shows a loader in the container, fetches the latest release, then replaces the container's
    /// contents with a title and one button per asset.
    ///
    /// If the container does not exist this logs a warning and does nothing else. Every call
    /// clears what an earlier call rendered, so loading the same release twice leaves the
    /// container as it was after the first load.
    ///
    /// # Errors
    ///
    /// If the fetch fails the container shows an error element instead and the [`FetchError`] is
    /// returned.
    pub async fn load(&self) -> Result<(), FetchError> {
        let Some(container) = self.show_loader() else {
            warn!(
                "No element with id `{}` found, not rendering releases for {}",
                self.container_id, self.repository,
            );
            return Ok(());
        };

        let res = ReleaseRequest::new(&self.source, self.repository.clone())
            .fetch()
            .await;
        match res {
            Ok(release) => {
                self.populate(container, &release);
                self.state.set(RenderState::Populated);
                Ok(())
            }
            Err(e) => {
                error!("Could not load releases for {}: {e}", self.repository);
                self.show_error(container);
                self.state.set(RenderState::Failed);
                Err(e)
            }
        }
    }

    fn show_loader(&self) -> Option<D::Node> {
        let mut doc = self.document.borrow_mut();
        let container = doc.element_by_id(&self.container_id)?;

        doc.add_class(container, CONTAINER_CLASS);
        let loader = create_element_with_classes(&mut *doc, "div", &[LOADER_CLASS]);
        doc.set_text(loader, LOADER_TEXT);
        doc.append_child(container, loader);
        self.state.set(RenderState::Loading);

        Some(container)
    }

    fn populate(&self, container: D::Node, release: &Release) {
        debug!(
            "Rendering {} with {} asset(s) into `{}`",
            release.version,
            release.assets.len(),
            self.container_id,
        );

        let mut doc = self.document.borrow_mut();
        doc.clear_children(container);

        let title = create_element_with_classes(&mut *doc, "h3", &[TITLE_CLASS]);
        doc.set_text(title, &(self.options.title_text)(release));
        doc.append_child(container, title);

        for asset in &release.assets {
            let button = create_element_with_classes(&mut *doc, "div", &[BUTTON_CLASS]);
            let link = doc.create_element("a");
            doc.set_attribute(link, "href", asset.download_url.as_str());
            doc.set_text(link, &(self.options.button_text)(asset));
            doc.append_child(button, link);
            doc.append_child(container, button);
        }
    }

    fn show_error(&self, container: D::Node) {
        let mut doc = self.document.borrow_mut();
        doc.clear_children(container);
        let message = create_element_with_classes(&mut *doc, "div", &[ERROR_CLASS]);
        doc.set_text(message, ERROR_TEXT);
        doc.append_child(container, message);
    }
}

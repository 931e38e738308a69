//! Call-to-action routing.

use log::debug;

use crate::slides::{Cta, CtaKind, Slide};

/// Host capability that performs navigation on behalf of the carousel.
pub trait Navigator {
    /// Client-side navigation to an in-app route.
    fn navigate_internal(&mut self, link: &str);
    /// Open a link in a new browsing context.
    fn open_external(&mut self, url: &str);
}

/// Where a call-to-action leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CtaRoute {
    Internal(String),
    External(String),
    /// No link: only the activation event is emitted.
    None,
}

/// Emitted whenever a call-to-action is activated.
#[derive(Debug, Clone, PartialEq)]
pub struct CtaActivation {
    pub slide: Slide,
    pub slide_index: usize,
    pub cta: Cta,
    pub cta_index: usize,
}

fn is_absolute(link: &str) -> bool {
    if link.starts_with("//") || link.starts_with("mailto:") || link.starts_with("tel:") {
        return true;
    }
    match link.split_once("://") {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

impl Cta {
    pub fn route(&self) -> CtaRoute {
        let Some(link) = self.link.as_deref().map(str::trim).filter(|l| !l.is_empty()) else {
            return CtaRoute::None;
        };
        if self.kind == Some(CtaKind::External) || is_absolute(link) {
            CtaRoute::External(link.to_string())
        } else {
            CtaRoute::Internal(link.to_string())
        }
    }
}

/// Route `cta` through `navigator`.
pub fn follow(cta: &Cta, navigator: &mut dyn Navigator) -> CtaRoute {
    let route = cta.route();
    match &route {
        CtaRoute::Internal(link) => {
            debug!("cta '{}' -> internal {link}", cta.label);
            navigator.navigate_internal(link);
        }
        CtaRoute::External(url) => {
            debug!("cta '{}' -> external {url}", cta.label);
            navigator.open_external(url);
        }
        CtaRoute::None => debug!("cta '{}' has no link", cta.label),
    }
    route
}

/// A navigator that only remembers what it was asked to do.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordingNavigator {
    pub internal: Vec<String>,
    pub external: Vec<String>,
}

impl Navigator for RecordingNavigator {
    fn navigate_internal(&mut self, link: &str) {
        self.internal.push(link.to_string());
    }

    fn open_external(&mut self, url: &str) {
        self.external.push(url.to_string());
    }
}

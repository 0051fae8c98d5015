#![forbid(unsafe_code)]

//! The slice of the DOM the adapter needs.

use tourkit_core::{Rect, Size};

/// `ScrollIntoViewOptions.behavior`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBehavior {
    /// Whatever the page's `scroll-behavior` CSS says.
    #[default]
    Auto,
    /// Animated scroll.
    Smooth,
    /// Jump without animation.
    Instant,
}

/// `ScrollIntoViewOptions.block` / `.inline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollLogicalPosition {
    /// Align the element's start edge with the scroll container's.
    #[default]
    Start,
    /// Center the element.
    Center,
    /// Align the element's end edge with the scroll container's.
    End,
    /// Scroll as little as possible to bring the element into view.
    Nearest,
}

/// Arguments to `Element.scrollIntoView`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollIntoViewOptions {
    /// Animated or instant.
    pub behavior: ScrollBehavior,
    /// Vertical alignment.
    pub block: ScrollLogicalPosition,
}

impl ScrollIntoViewOptions {
    /// Smooth scroll that centers the element vertically.
    pub const fn centered() -> Self {
        Self {
            behavior: ScrollBehavior::Smooth,
            block: ScrollLogicalPosition::Center,
        }
    }
}

/// DOM operations implemented by the embedding environment.
///
/// `Element` is whatever the glue uses to name a node (a `web_sys::Element`,
/// an index into a JS-side table, ...). Implementations must not call back
/// into the adapter.
pub trait DomHost: 'static {
    /// Element handle type.
    type Element: Clone + 'static;

    /// `document.querySelectorAll(selector)` in document order. Invalid
    /// selectors yield no matches.
    fn query_selector_all(&self, selector: &str) -> Vec<Self::Element>;

    /// `element.getBoundingClientRect()`.
    fn bounding_client_rect(&self, element: &Self::Element) -> Rect;

    /// `element.scrollIntoView(options)`.
    fn scroll_into_view(&self, element: &Self::Element, options: ScrollIntoViewOptions);

    /// `(window.innerWidth, window.innerHeight)`.
    fn inner_size(&self) -> Size;

    /// `(element.offsetWidth, element.offsetHeight)`.
    fn offset_size(&self, element: &Self::Element) -> Size;
}

/// First element matching `selector` that has a non-empty bounding box,
/// falling back to the first match.
///
/// Layouts that render the same control twice (a desktop toolbar and a mobile
/// drawer, one of them hidden) would otherwise resolve to the hidden copy.
pub fn find_visible_element<D>(host: &D, selector: &str) -> Option<D::Element>
where
    D: DomHost + ?Sized,
{
    let mut matches = host.query_selector_all(selector).into_iter();
    let first = matches.next()?;
    if !host.bounding_client_rect(&first).is_degenerate() {
        return Some(first);
    }
    matches
        .find(|element| !host.bounding_client_rect(element).is_degenerate())
        .or(Some(first))
}

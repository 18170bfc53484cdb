//! DOM snapshot model.
//!
//! A page is a parsed HTML document (`scraper::Html`) plus the location it
//! was loaded from. Element handles are `scraper::ElementRef`, which are
//! cheap `Copy` references into the snapshot; identity and containment are
//! decided by node id, the same way the browser compares element handles.
//!
//! Computed styles are not part of a static snapshot, so background images
//! are read through the [`StyleResolver`] seam.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

use crate::error::{DomError, DomResult};

/// Elements that delimit a single post.
pub const POST_CONTAINER_SELECTOR: &str = r#"article, [data-testid="tweet"]"#;

static POST_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(POST_CONTAINER_SELECTOR).unwrap());

static CSS_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"url\(\s*['"]?([^'")]+?)['"]?\s*\)"#).unwrap());

/// A parsed page and its location.
#[derive(Debug)]
pub struct PageSnapshot {
    document: Html,
    location: Option<Url>,
}

impl PageSnapshot {
    /// Parse an HTML document. `location` is the page URL, if known.
    pub fn parse(html: &str, location: Option<&str>) -> DomResult<Self> {
        let location = location.map(Url::parse).transpose()?;
        Ok(Self {
            document: Html::parse_document(html),
            location,
        })
    }

    /// Wrap an already parsed document.
    pub fn from_document(document: Html, location: Option<Url>) -> Self {
        Self { document, location }
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    /// URL of the page the snapshot was taken from.
    pub fn location(&self) -> Option<&Url> {
        self.location.as_ref()
    }

    /// First element matching a CSS selector.
    pub fn select_first(&self, css: &str) -> DomResult<Option<ElementRef<'_>>> {
        let selector = parse_selector(css)?;
        Ok(self.document.select(&selector).next())
    }

    /// All elements matching a CSS selector, in document order.
    pub fn select_all(&self, css: &str) -> DomResult<Vec<ElementRef<'_>>> {
        let selector = parse_selector(css)?;
        Ok(self.document.select(&selector).collect())
    }
}

/// Parse a CSS selector into a typed error instead of panicking.
pub fn parse_selector(css: &str) -> DomResult<Selector> {
    Selector::parse(css).map_err(|e| DomError::InvalidSelector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// Lower-case tag name of an element.
pub fn tag_name<'a>(element: &ElementRef<'a>) -> &'a str {
    element.value().name()
}

/// Whether two handles point at the same element.
pub fn is_same(a: ElementRef<'_>, b: ElementRef<'_>) -> bool {
    a.id() == b.id()
}

/// Whether `node` is `ancestor` or lives somewhere below it.
pub fn contains(ancestor: ElementRef<'_>, node: ElementRef<'_>) -> bool {
    is_same(ancestor, node) || node.ancestors().any(|n| n.id() == ancestor.id())
}

/// Parent element, skipping the document node.
pub fn parent_element<'a>(element: ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.parent().and_then(ElementRef::wrap)
}

/// The element followed by its element ancestors, innermost first.
pub fn self_and_ancestors<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    std::iter::successors(Some(element), |current| parent_element(*current))
}

/// Nearest ancestor-or-self matching `selector`.
pub fn closest<'a>(element: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    self_and_ancestors(element).find(|candidate| selector.matches(candidate))
}

/// The nearest post container at or above `element`, if any.
pub fn enclosing_post(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    closest(element, &POST_CONTAINER)
}

/// The smallest post container around `clicked`, or `clicked` itself when
/// the element is not inside any post.
pub fn find_post_container(clicked: ElementRef<'_>) -> ElementRef<'_> {
    enclosing_post(clicked).unwrap_or(clicked)
}

/// Elements matching `selector` at or below `root`, in document order.
///
/// Unlike `ElementRef::select`, the root itself is a candidate.
pub fn select_within<'a>(
    root: ElementRef<'a>,
    selector: &'a Selector,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    std::iter::once(root)
        .filter(move |el| selector.matches(el))
        .chain(root.select(selector))
}

/// The element and every element below it, in document order.
pub fn elements_within<'a>(root: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    root.descendants().filter_map(ElementRef::wrap)
}

/// Extract the URL from a CSS `url(...)` value.
pub fn parse_css_url(value: &str) -> Option<String> {
    CSS_URL
        .captures(value)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|url| !url.is_empty())
}

/// Source of an element's background image.
///
/// In a live browser this is the computed style; for a static snapshot the
/// default implementation reads the inline `style` attribute.
pub trait StyleResolver: Send + Sync {
    /// The `background-image` value of the element, `None` when unset or `none`.
    fn background_image(&self, element: ElementRef<'_>) -> Option<String>;
}

/// Reads `background-image` (or a `background` shorthand carrying `url(...)`)
/// from the inline `style` attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineStyleResolver;

impl StyleResolver for InlineStyleResolver {
    fn background_image(&self, element: ElementRef<'_>) -> Option<String> {
        let style = element.value().attr("style")?;

        let mut shorthand = None;
        for declaration in style.split(';') {
            let Some((property, value)) = declaration.split_once(':') else {
                continue;
            };
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim();

            if property == "background-image" {
                return (!value.is_empty() && !value.eq_ignore_ascii_case("none"))
                    .then(|| value.to_string());
            }
            if property == "background" && value.contains("url(") {
                shorthand = Some(value.to_string());
            }
        }

        shorthand
    }
}

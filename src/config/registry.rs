//! Tag registry
//!
//! Every element the parser understands is described by a [`TagInfo`]: its
//! name, the attributes it accepts, a handler, and an ordering key. Handlers
//! run grouped by ordering key, so appender tags always complete before any
//! logger tag is processed, regardless of where they sit in the document.
//!
//! Third parties contribute tags through an [`ExtensionResolver`], consulted
//! when the configuration contains an `<extension name="..."/>` element.

use super::element::{AttributeSpec, Element};
use super::parser::ParseContext;
use crate::core::{IntakeError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Ordering key of extension-loading tags; processed in their own pass
pub const ORDER_EXTENSION: i32 = 0;
/// Ordering key of the built-in console appender tag
pub const ORDER_CONSOLE_APPENDER: i32 = 100;
/// Ordering key of the built-in ajax appender tag
pub const ORDER_AJAX_APPENDER: i32 = 110;
/// Ordering key of the logger tag; extension appenders must stay below it
pub const ORDER_LOGGER: i32 = 1000;

pub type TagHandler = Arc<dyn Fn(&Element, &mut ParseContext<'_>) -> Result<()> + Send + Sync>;

/// Descriptor binding an element name to its handler
#[derive(Clone)]
pub struct TagInfo {
    tag: String,
    attributes: Vec<AttributeSpec>,
    order: i32,
    handler: TagHandler,
}

impl TagInfo {
    pub fn new<F>(tag: impl Into<String>, attributes: &[AttributeSpec], order: i32, handler: F) -> Self
    where
        F: Fn(&Element, &mut ParseContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            tag: tag.into(),
            attributes: attributes.to_vec(),
            order,
            handler: Arc::new(handler),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn attributes(&self) -> &[AttributeSpec] {
        &self.attributes
    }

    /// Validate the element against the attribute contract, then run the handler
    pub fn invoke(&self, element: &Element, ctx: &mut ParseContext<'_>) -> Result<()> {
        element.validate_attributes(&self.attributes)?;
        (self.handler)(element, ctx)
    }
}

impl fmt::Debug for TagInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagInfo")
            .field("tag", &self.tag)
            .field("order", &self.order)
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// Ordered set of tag handlers for one parse
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    tags: Vec<TagInfo>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self { tags: Vec::new() }
    }

    /// Add a handler; a tag name may only be registered once
    pub fn register(&mut self, tag_info: TagInfo) -> Result<()> {
        if self.find(tag_info.tag()).is_some() {
            return Err(IntakeError::DuplicateTag {
                tag: tag_info.tag().to_string(),
            });
        }
        self.tags.push(tag_info);
        Ok(())
    }

    pub fn extend(&mut self, tag_infos: impl IntoIterator<Item = TagInfo>) -> Result<()> {
        tag_infos
            .into_iter()
            .try_for_each(|tag_info| self.register(tag_info))
    }

    /// Sort by ordering key; ties keep registration order
    pub fn resolve_order(&mut self) {
        self.tags.sort_by_key(TagInfo::order);
    }

    pub fn find(&self, tag: &str) -> Option<&TagInfo> {
        self.tags.iter().find(|t| t.tag == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagInfo> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Looks up the tags contributed by a named extension
pub trait ExtensionResolver: Send + Sync {
    /// `None` when the identifier is unknown
    fn resolve(&self, name: &str) -> Option<Vec<TagInfo>>;
}

/// Resolver that knows no extensions
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExtensions;

impl ExtensionResolver for NoExtensions {
    fn resolve(&self, _name: &str) -> Option<Vec<TagInfo>> {
        None
    }
}

type ExtensionFactory = Arc<dyn Fn() -> Vec<TagInfo> + Send + Sync>;

/// Extensions registered by the host at startup, keyed by identifier
///
/// # Example
///
/// ```
/// use rust_log_intake::config::{ExtensionRegistry, ExtensionResolver};
///
/// let extensions = ExtensionRegistry::new().with_extension("empty", Vec::new);
/// assert!(extensions.resolve("empty").is_some());
/// assert!(extensions.resolve("missing").is_none());
/// ```
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    factories: HashMap<String, ExtensionFactory>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_extension<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Vec<TagInfo> + Send + Sync + 'static,
    {
        self.add_extension(name, factory);
        self
    }

    pub fn add_extension<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Vec<TagInfo> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }
}

impl ExtensionResolver for ExtensionRegistry {
    fn resolve(&self, name: &str) -> Option<Vec<TagInfo>> {
        self.factories.get(name).map(|factory| factory())
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("ExtensionRegistry").field("extensions", &names).finish()
    }
}

//! Configuration loading
//!
//! A declarative [`Element`] tree is parsed against a [`TagRegistry`] into a
//! [`Configuration`] plus the [`ClientScript`] that mirrors it on the client.

pub mod active;
pub mod client_script;
pub mod element;
pub mod model;
pub mod parser;
pub mod registry;
pub mod tags;

pub use active::ActiveConfiguration;
pub use client_script::{ClientOption, ClientScript, ClientStatement, ClientValue};
pub use element::{AttributeSpec, Element};
pub use model::{
    parent_logger_name, AppenderConfig, AppenderKind, Configuration, GlobalOptions, LoggerConfig,
    OnceOnlyRule, Pattern,
};
pub use parser::{
    is_extension_tag, ConfigBuilder, ConfigParser, ParseContext, ParseEnvironment,
    ParsedConfiguration, DEFAULT_AJAX_URL, EXTENSION_TAG, ROOT_TAG,
};
pub use registry::{
    ExtensionRegistry, ExtensionResolver, NoExtensions, TagHandler, TagInfo, TagRegistry,
    ORDER_AJAX_APPENDER, ORDER_CONSOLE_APPENDER, ORDER_EXTENSION, ORDER_LOGGER,
};
pub use tags::declare_extension_appender;

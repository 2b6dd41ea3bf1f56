//! Built-in tag handlers
//!
//! `extension`, `consoleAppender`, `ajaxAppender` and `logger` at the root,
//! `onceOnly` inside a logger.

use super::client_script::{ClientOption, ClientValue};
use super::element::{AttributeSpec, Element};
use super::model::{AppenderConfig, AppenderKind, LoggerConfig, OnceOnlyRule};
use super::parser::{process_elements, split_appender_names, ParseContext, EXTENSION_TAG};
use super::registry::{
    TagInfo, TagRegistry, ORDER_AJAX_APPENDER, ORDER_CONSOLE_APPENDER, ORDER_EXTENSION,
    ORDER_LOGGER,
};
use crate::core::{IntakeError, Result};

pub const CONSOLE_APPENDER_TAG: &str = "consoleAppender";
pub const AJAX_APPENDER_TAG: &str = "ajaxAppender";
pub const LOGGER_TAG: &str = "logger";
pub const ONCE_ONLY_TAG: &str = "onceOnly";

const EXTENSION_ATTRIBUTES: [AttributeSpec; 1] = [AttributeSpec::required("name")];

const CONSOLE_APPENDER_ATTRIBUTES: [AttributeSpec; 8] = [
    AttributeSpec::required("name"),
    AttributeSpec::optional("level"),
    AttributeSpec::optional("userAgentRegex"),
    AttributeSpec::optional("ipRegex"),
    AttributeSpec::optional("storeInBufferLevel"),
    AttributeSpec::optional("sendWithBufferLevel"),
    AttributeSpec::optional("bufferSize"),
    AttributeSpec::optional("batchSize"),
];

const AJAX_APPENDER_ATTRIBUTES: [AttributeSpec; 12] = [
    AttributeSpec::required("name"),
    AttributeSpec::optional("level"),
    AttributeSpec::optional("userAgentRegex"),
    AttributeSpec::optional("ipRegex"),
    AttributeSpec::optional("storeInBufferLevel"),
    AttributeSpec::optional("sendWithBufferLevel"),
    AttributeSpec::optional("bufferSize"),
    AttributeSpec::optional("batchSize"),
    AttributeSpec::optional("url"),
    AttributeSpec::optional("batchTimeout"),
    AttributeSpec::optional("sendTimeout"),
    AttributeSpec::optional("maxBatchSize"),
];

const LOGGER_ATTRIBUTES: [AttributeSpec; 6] = [
    AttributeSpec::optional("name"),
    AttributeSpec::optional("level"),
    AttributeSpec::optional("userAgentRegex"),
    AttributeSpec::optional("ipRegex"),
    AttributeSpec::optional("disallow"),
    AttributeSpec::optional("appenders"),
];

const ONCE_ONLY_ATTRIBUTES: [AttributeSpec; 1] = [AttributeSpec::optional("regex")];

/// Handler for `<extension name="..."/>`
pub fn extension_tag() -> TagInfo {
    TagInfo::new(EXTENSION_TAG, &EXTENSION_ATTRIBUTES, ORDER_EXTENSION, |element, ctx| {
        let name = element.required("name")?;
        ctx.load_extension(name)
    })
}

/// Content tags available at the root of every configuration
pub fn builtin_tags() -> Vec<TagInfo> {
    vec![
        TagInfo::new(
            CONSOLE_APPENDER_TAG,
            &CONSOLE_APPENDER_ATTRIBUTES,
            ORDER_CONSOLE_APPENDER,
            handle_console_appender,
        ),
        TagInfo::new(
            AJAX_APPENDER_TAG,
            &AJAX_APPENDER_ATTRIBUTES,
            ORDER_AJAX_APPENDER,
            handle_ajax_appender,
        ),
        TagInfo::new(LOGGER_TAG, &LOGGER_ATTRIBUTES, ORDER_LOGGER, handle_logger),
    ]
}

/// Tags accepted inside a `<logger>` element
pub fn logger_child_tags() -> Vec<TagInfo> {
    vec![TagInfo::new(
        ONCE_ONLY_TAG,
        &ONCE_ONLY_ATTRIBUTES,
        0,
        |element, ctx| {
            let rule = OnceOnlyRule {
                pattern: element.optional_pattern("regex")?,
            };
            let logger = ctx.current_logger_mut().ok_or_else(|| {
                IntakeError::other("onceOnly is only valid inside a logger element")
            })?;
            logger.once_only.push(rule);
            Ok(())
        },
    )]
}

fn reject_children(element: &Element) -> Result<()> {
    match element.children().first() {
        Some(child) => Err(IntakeError::unknown_tag(child.tag(), element.tag())),
        None => Ok(()),
    }
}

/// Parse the attributes every built-in appender shares
fn common_appender(element: &Element, kind: AppenderKind) -> Result<AppenderConfig> {
    let mut appender = AppenderConfig::new(element.required("name")?, kind);
    appender.level = element.optional_level("level")?;
    appender.user_agent_regex = element.optional_pattern("userAgentRegex")?;
    appender.ip_regex = element.optional_pattern("ipRegex")?;
    appender.store_in_buffer_level = element.optional_level("storeInBufferLevel")?;
    appender.send_with_buffer_level = element.optional_level("sendWithBufferLevel")?;
    appender.buffer_size = element.optional_u32("bufferSize")?;
    appender.batch_size = element.optional_u32("batchSize")?;
    Ok(appender)
}

fn appender_client_options(appender: &AppenderConfig) -> Vec<ClientOption> {
    let mut options = Vec::new();
    if let Some(level) = appender.level {
        options.push(ClientOption::new("level", level.value()));
    }
    if let Some(re) = &appender.user_agent_regex {
        options.push(ClientOption::new("userAgentRegex", re.as_str()));
    }
    if let Some(re) = &appender.ip_regex {
        options.push(ClientOption::new("ipRegex", re.as_str()));
    }
    if let Some(level) = appender.store_in_buffer_level {
        options.push(ClientOption::new("storeInBufferLevel", level.value()));
    }
    if let Some(level) = appender.send_with_buffer_level {
        options.push(ClientOption::new("sendWithBufferLevel", level.value()));
    }
    if let Some(size) = appender.buffer_size {
        options.push(ClientOption::new("bufferSize", size));
    }
    if let Some(size) = appender.batch_size {
        options.push(ClientOption::new("batchSize", size));
    }

    if let AppenderKind::Ajax {
        url,
        batch_timeout,
        send_timeout,
        max_batch_size,
    } = &appender.kind
    {
        if let Some(url) = url {
            options.push(ClientOption::new("url", url.as_str()));
        }
        if let Some(ms) = batch_timeout {
            options.push(ClientOption::new("batchTimeout", *ms));
        }
        if let Some(ms) = send_timeout {
            options.push(ClientOption::new("sendTimeout", *ms));
        }
        if let Some(size) = max_batch_size {
            options.push(ClientOption::new("maxBatchSize", *size));
        }
    }
    options
}

fn handle_console_appender(element: &Element, ctx: &mut ParseContext<'_>) -> Result<()> {
    reject_children(element)?;
    let appender = common_appender(element, AppenderKind::Console)?;
    let options = appender_client_options(&appender);
    ctx.declare_appender(appender, "createConsoleAppender", options)
}

fn handle_ajax_appender(element: &Element, ctx: &mut ParseContext<'_>) -> Result<()> {
    reject_children(element)?;
    let kind = AppenderKind::Ajax {
        url: element
            .attribute("url")
            .map(|url| ctx.environment().resolve_path(url)),
        batch_timeout: element.optional_u32("batchTimeout")?,
        send_timeout: element.optional_u32("sendTimeout")?,
        max_batch_size: element.optional_u32("maxBatchSize")?,
    };
    let appender = common_appender(element, kind)?;
    let options = appender_client_options(&appender);
    ctx.declare_appender(appender, "createAjaxAppender", options)
}

fn handle_logger(element: &Element, ctx: &mut ParseContext<'_>) -> Result<()> {
    let mut logger = LoggerConfig::new(element.attribute("name").unwrap_or(""));
    logger.level = element.optional_level("level")?;
    logger.user_agent_regex = element.optional_pattern("userAgentRegex")?;
    logger.ip_regex = element.optional_pattern("ipRegex")?;
    logger.disallow = element.optional_pattern("disallow")?;
    logger.appenders = element.attribute("appenders").map(split_appender_names);

    let mut children = TagRegistry::new();
    children.extend(logger_child_tags())?;

    ctx.begin_logger(logger);
    let processed = process_elements(element.children(), &children, LOGGER_TAG, ctx, |_| true);
    let logger = ctx.end_logger()?;
    processed?;

    ctx.declare_logger(logger)
}

/// Client options mirroring a logger declaration
pub(crate) fn logger_client_options(logger: &LoggerConfig) -> Vec<ClientOption> {
    let mut options = Vec::new();
    if let Some(level) = logger.level {
        options.push(ClientOption::new("level", level.value()));
    }
    if let Some(re) = &logger.user_agent_regex {
        options.push(ClientOption::new("userAgentRegex", re.as_str()));
    }
    if let Some(re) = &logger.ip_regex {
        options.push(ClientOption::new("ipRegex", re.as_str()));
    }
    if let Some(re) = &logger.disallow {
        options.push(ClientOption::new("disallow", re.as_str()));
    }
    if let Some(names) = &logger.appenders {
        options.push(ClientOption::new(
            "appenders",
            ClientValue::Appenders(names.clone()),
        ));
    }
    if !logger.once_only.is_empty() {
        let patterns: Vec<String> = logger
            .once_only
            .iter()
            .map(|rule| rule.pattern.as_ref().map_or("", |p| p.as_str()).to_string())
            .collect();
        options.push(ClientOption::new("onceOnly", patterns));
    }
    options
}

/// Declare an appender contributed by an extension tag
///
/// Every attribute but `name` is kept verbatim and forwarded to the client
/// constructor as a string option.
pub fn declare_extension_appender(
    element: &Element,
    ctx: &mut ParseContext<'_>,
    constructor: &str,
) -> Result<()> {
    reject_children(element)?;
    let name = element.required("name")?;
    let attributes = element
        .attributes()
        .filter(|(key, _)| *key != "name")
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    let options = element
        .attributes()
        .filter(|(key, _)| *key != "name")
        .map(|(key, value)| ClientOption::new(key, value))
        .collect();

    let appender = AppenderConfig::new(
        name,
        AppenderKind::Extension {
            tag: element.tag().to_string(),
            attributes,
        },
    );
    ctx.declare_appender(appender, constructor, options)
}

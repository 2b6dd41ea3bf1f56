//! Two-pass configuration parser
//!
//! Pass 1 visits only `<extension>` elements and collects the tags they
//! contribute. The built-in tags and the contributed ones are then combined
//! and sorted once by ordering key. Pass 2 visits every other element,
//! grouped by tag in that order and in document order within a tag.
//!
//! State is threaded through both passes in a [`ParseContext`]; the finished
//! [`Configuration`] is only handed out once parsing has succeeded.

use super::client_script::{ClientOption, ClientScript, ClientStatement};
use super::element::{AttributeSpec, Element};
use super::model::{AppenderConfig, Configuration, GlobalOptions, LoggerConfig};
use super::registry::{ExtensionResolver, NoExtensions, TagInfo, TagRegistry};
use super::tags;
use crate::core::{DateFormat, IntakeError, MessageFormat, Result};
use std::sync::Arc;

/// Tag of the root element
pub const ROOT_TAG: &str = "logging";

/// Tag of the extension-loading element
pub const EXTENSION_TAG: &str = "extension";

/// Endpoint the client posts batches to unless `defaultAjaxUrl` says otherwise
pub const DEFAULT_AJAX_URL: &str = "~/jsnlog.logger";

pub(crate) const ROOT_ATTRIBUTES: [AttributeSpec; 9] = [
    AttributeSpec::optional("enabled"),
    AttributeSpec::optional("maxMessages"),
    AttributeSpec::optional("defaultAjaxUrl"),
    AttributeSpec::optional("corsAllowedOriginsRegex"),
    AttributeSpec::optional("serverSideLogger"),
    AttributeSpec::optional("serverSideLevel"),
    AttributeSpec::optional("serverSideMessageFormat"),
    AttributeSpec::optional("dateFormat"),
    AttributeSpec::optional("productionLibraryPath"),
];

/// Whether an element belongs to the extension pass
pub fn is_extension_tag(tag: &str) -> bool {
    tag == EXTENSION_TAG
}

/// Host-supplied inputs for client code generation
#[derive(Debug, Clone)]
pub struct ParseEnvironment {
    /// Request id handed to the client; generated when absent
    pub request_id: Option<String>,
    /// Address of the client the page is rendered for
    pub client_ip: String,
    /// Application root that `~/` paths resolve against
    pub app_root: String,
}

impl Default for ParseEnvironment {
    fn default() -> Self {
        Self {
            request_id: None,
            client_ip: String::new(),
            app_root: "/".to_string(),
        }
    }
}

impl ParseEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    #[must_use]
    pub fn with_client_ip(mut self, client_ip: impl Into<String>) -> Self {
        self.client_ip = client_ip.into();
        self
    }

    #[must_use]
    pub fn with_app_root(mut self, app_root: impl Into<String>) -> Self {
        self.app_root = app_root.into();
        self
    }

    /// Resolve an application-relative `~/` path
    ///
    /// ```
    /// use rust_log_intake::config::ParseEnvironment;
    ///
    /// let env = ParseEnvironment::new().with_app_root("/shop/");
    /// assert_eq!(env.resolve_path("~/jsnlog.logger"), "/shop/jsnlog.logger");
    /// assert_eq!(env.resolve_path("https://cdn.example/x.js"), "https://cdn.example/x.js");
    /// ```
    pub fn resolve_path(&self, path: &str) -> String {
        match path.strip_prefix("~/") {
            Some(rest) => format!("{}/{}", self.app_root.trim_end_matches('/'), rest),
            None => path.to_string(),
        }
    }

    fn resolved_request_id(&self) -> String {
        self.request_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }
}

/// Accumulates the configuration model while the tree is walked
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    options: GlobalOptions,
    appenders: Vec<AppenderConfig>,
    loggers: Vec<LoggerConfig>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(&self) -> &GlobalOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: GlobalOptions) {
        self.options = options;
    }

    pub fn has_appender(&self, name: &str) -> bool {
        self.appenders.iter().any(|a| a.name == name)
    }

    pub fn add_appender(&mut self, appender: AppenderConfig) -> Result<()> {
        if self.has_appender(&appender.name) {
            return Err(IntakeError::DuplicateAppender {
                name: appender.name,
            });
        }
        self.appenders.push(appender);
        Ok(())
    }

    /// Add a logger; every appender it names must already be declared
    pub fn add_logger(&mut self, logger: LoggerConfig) -> Result<()> {
        if self.loggers.iter().any(|l| l.name == logger.name) {
            return Err(IntakeError::DuplicateLogger { name: logger.name });
        }
        if let Some(missing) = logger
            .appenders
            .iter()
            .flatten()
            .find(|name| !self.has_appender(name))
        {
            return Err(IntakeError::unknown_appender(&logger.name, missing));
        }
        self.loggers.push(logger);
        Ok(())
    }

    pub fn build(self) -> Configuration {
        Configuration {
            options: self.options,
            appenders: self.appenders,
            loggers: self.loggers,
        }
    }
}

/// Mutable state handed to tag handlers
pub struct ParseContext<'a> {
    builder: ConfigBuilder,
    script: ClientScript,
    resolver: &'a dyn ExtensionResolver,
    env: &'a ParseEnvironment,
    discovered: Vec<TagInfo>,
    current_logger: Option<LoggerConfig>,
}

impl<'a> ParseContext<'a> {
    fn new(resolver: &'a dyn ExtensionResolver, env: &'a ParseEnvironment) -> Self {
        Self {
            builder: ConfigBuilder::new(),
            script: ClientScript::new(),
            resolver,
            env,
            discovered: Vec::new(),
            current_logger: None,
        }
    }

    pub fn builder(&self) -> &ConfigBuilder {
        &self.builder
    }

    /// Host environment the tree is parsed against
    pub fn environment(&self) -> &ParseEnvironment {
        self.env
    }

    pub fn builder_mut(&mut self) -> &mut ConfigBuilder {
        &mut self.builder
    }

    pub fn emit(&mut self, statement: ClientStatement) {
        self.script.push(statement);
    }

    /// Register an appender and emit its construction statement
    pub fn declare_appender(
        &mut self,
        appender: AppenderConfig,
        constructor: &str,
        options: Vec<ClientOption>,
    ) -> Result<()> {
        let name = appender.name.clone();
        self.builder.add_appender(appender)?;
        self.emit(ClientStatement::CreateAppender {
            name,
            constructor: constructor.to_string(),
            options,
        });
        Ok(())
    }

    /// Register a logger and emit its configuration statement
    pub fn declare_logger(&mut self, logger: LoggerConfig) -> Result<()> {
        let name = logger.name.clone();
        let options = tags::logger_client_options(&logger);
        self.builder.add_logger(logger)?;
        self.emit(ClientStatement::ConfigureLogger { name, options });
        Ok(())
    }

    /// Logger whose children are being processed, if any
    pub fn current_logger_mut(&mut self) -> Option<&mut LoggerConfig> {
        self.current_logger.as_mut()
    }

    pub(crate) fn begin_logger(&mut self, logger: LoggerConfig) {
        self.current_logger = Some(logger);
    }

    pub(crate) fn end_logger(&mut self) -> Result<LoggerConfig> {
        self.current_logger
            .take()
            .ok_or_else(|| IntakeError::other("logger children processed outside a logger"))
    }

    /// Resolve an extension and queue the tags it contributes
    pub fn load_extension(&mut self, name: &str) -> Result<()> {
        let tag_infos = self
            .resolver
            .resolve(name)
            .ok_or_else(|| IntakeError::UnresolvedExtension {
                name: name.to_string(),
            })?;
        tracing::debug!(extension = name, tags = tag_infos.len(), "loaded configuration extension");
        self.discovered.extend(tag_infos);
        Ok(())
    }
}

/// Dispatch `elements` accepted by `visit` to the handlers in `registry`
///
/// Unknown tags are rejected before any handler runs. Handlers then run in
/// registry order; elements sharing a tag run in document order.
pub fn process_elements<F>(
    elements: &[Element],
    registry: &TagRegistry,
    parent: &str,
    ctx: &mut ParseContext<'_>,
    visit: F,
) -> Result<()>
where
    F: Fn(&Element) -> bool,
{
    let visited: Vec<&Element> = elements.iter().filter(|e| visit(e)).collect();

    if let Some(unknown) = visited.iter().find(|e| registry.find(e.tag()).is_none()) {
        return Err(IntakeError::unknown_tag(unknown.tag(), parent));
    }

    for tag_info in registry.iter() {
        for element in visited.iter().filter(|e| e.tag() == tag_info.tag()) {
            tag_info.invoke(element, ctx)?;
        }
    }
    Ok(())
}

/// Result of a successful parse
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedConfiguration {
    pub configuration: Configuration,
    pub script: ClientScript,
}

/// Turns a declarative tree into a [`Configuration`] and client statements
#[derive(Clone)]
pub struct ConfigParser {
    resolver: Arc<dyn ExtensionResolver>,
}

impl ConfigParser {
    pub fn new() -> Self {
        Self {
            resolver: Arc::new(NoExtensions),
        }
    }

    pub fn with_extensions(resolver: Arc<dyn ExtensionResolver>) -> Self {
        Self { resolver }
    }

    /// Parse for server-side use only; client statements are discarded
    pub fn parse_configuration(&self, root: &Element) -> Result<Configuration> {
        let env = ParseEnvironment::new().with_request_id("");
        self.parse(root, &env).map(|parsed| parsed.configuration)
    }

    pub fn parse(&self, root: &Element, env: &ParseEnvironment) -> Result<ParsedConfiguration> {
        if root.tag() != ROOT_TAG {
            return Err(IntakeError::InvalidRoot {
                expected: ROOT_TAG.to_string(),
                found: root.tag().to_string(),
            });
        }
        root.validate_attributes(&ROOT_ATTRIBUTES)?;

        let options = parse_global_options(root, env)?;
        let mut ctx = ParseContext::new(self.resolver.as_ref(), env);

        if !options.enabled {
            // Options only; appenders and loggers are not processed at all.
            if let Some(path) = &options.production_library_path {
                ctx.emit(ClientStatement::LoadLibrary { path: path.clone() });
            }
            ctx.emit(ClientStatement::SetGlobalOptions {
                options: explicit_client_options(&options),
            });
            ctx.builder.set_options(options);
            return Ok(ctx.into_parsed());
        }

        let mut client_options = explicit_client_options(&options);
        if options.default_ajax_url.is_none() {
            client_options.push(ClientOption::new(
                "defaultAjaxUrl",
                env.resolve_path(DEFAULT_AJAX_URL),
            ));
        }
        client_options.push(ClientOption::new("clientIP", env.client_ip.as_str()));
        client_options.push(ClientOption::new("requestId", env.resolved_request_id()));
        ctx.emit(ClientStatement::SetGlobalOptions {
            options: client_options,
        });
        let library_path = options.production_library_path.clone();
        ctx.builder.set_options(options);

        // Pass 1: extensions
        let mut extension_registry = TagRegistry::new();
        extension_registry.register(tags::extension_tag())?;
        process_elements(root.children(), &extension_registry, ROOT_TAG, &mut ctx, |e| {
            is_extension_tag(e.tag())
        })?;

        // Built-ins first, then discovered tags, sorted once
        let mut registry = TagRegistry::new();
        registry.extend(tags::builtin_tags())?;
        registry.extend(std::mem::take(&mut ctx.discovered))?;
        registry.resolve_order();

        // Pass 2: content
        process_elements(root.children(), &registry, ROOT_TAG, &mut ctx, |e| {
            !is_extension_tag(e.tag())
        })?;

        if let Some(path) = library_path {
            ctx.emit(ClientStatement::LoadLibrary { path });
        }

        Ok(ctx.into_parsed())
    }
}

impl Default for ConfigParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseContext<'_> {
    fn into_parsed(self) -> ParsedConfiguration {
        ParsedConfiguration {
            configuration: self.builder.build(),
            script: self.script,
        }
    }
}

fn parse_global_options(root: &Element, env: &ParseEnvironment) -> Result<GlobalOptions> {
    let date_format = match root.attribute("dateFormat") {
        Some(value) => DateFormat::parse(value).ok_or_else(|| {
            IntakeError::invalid_value(ROOT_TAG, "dateFormat", value, "a date format name or strftime pattern")
        })?,
        None => DateFormat::default(),
    };

    Ok(GlobalOptions {
        enabled: root.optional_bool("enabled")?.unwrap_or(true),
        max_messages: root.optional_u32("maxMessages")?,
        default_ajax_url: root.attribute("defaultAjaxUrl").map(|url| env.resolve_path(url)),
        cors_allowed_origins: root.optional_pattern("corsAllowedOriginsRegex")?,
        server_side_logger: root.attribute("serverSideLogger").map(str::to_string),
        server_side_level: root.optional_level("serverSideLevel")?,
        message_format: root
            .attribute("serverSideMessageFormat")
            .map(MessageFormat::new)
            .unwrap_or_default(),
        date_format,
        production_library_path: root
            .attribute("productionLibraryPath")
            .filter(|path| !path.trim().is_empty())
            .map(|path| env.resolve_path(path)),
    })
}

/// Client options taken from attributes the root actually carries
fn explicit_client_options(options: &GlobalOptions) -> Vec<ClientOption> {
    let mut client_options = vec![ClientOption::new("enabled", options.enabled)];
    if let Some(max) = options.max_messages {
        client_options.push(ClientOption::new("maxMessages", max));
    }
    if let Some(url) = &options.default_ajax_url {
        client_options.push(ClientOption::new("defaultAjaxUrl", url.as_str()));
    }
    client_options
}

/// Split an `appenders` attribute into names
pub fn split_appender_names(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::client_script::ClientValue;
    use crate::config::registry::{ExtensionRegistry, ORDER_CONSOLE_APPENDER};
    use crate::config::AppenderKind;
    use crate::core::Level;

    fn env() -> ParseEnvironment {
        ParseEnvironment::new()
            .with_request_id("req-1")
            .with_client_ip("10.0.0.9")
    }

    #[test]
    fn test_rejects_wrong_root() {
        let err = ConfigParser::new()
            .parse(&Element::new("jsnlog"), &env())
            .unwrap_err();
        assert!(matches!(err, IntakeError::InvalidRoot { .. }));
    }

    #[test]
    fn test_global_options_statement_has_computed_defaults() {
        let root = Element::new(ROOT_TAG).with_attribute("maxMessages", "5");
        let parsed = ConfigParser::new()
            .parse(&root, &env().with_app_root("/app"))
            .unwrap();

        let ClientStatement::SetGlobalOptions { options } = &parsed.script.statements()[0] else {
            panic!("first statement must set global options");
        };
        let names: Vec<&str> = options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["enabled", "maxMessages", "defaultAjaxUrl", "clientIP", "requestId"]
        );
        assert_eq!(options[2].value, ClientValue::from("/app/jsnlog.logger"));
        assert_eq!(options[4].value, ClientValue::from("req-1"));
    }

    #[test]
    fn test_generated_request_id_when_absent() {
        let parsed = ConfigParser::new()
            .parse(&Element::new(ROOT_TAG), &ParseEnvironment::new())
            .unwrap();
        let ClientStatement::SetGlobalOptions { options } = &parsed.script.statements()[0] else {
            panic!("first statement must set global options");
        };
        let request_id = options.iter().find(|o| o.name == "requestId").unwrap();
        let ClientValue::Json(serde_json::Value::String(id)) = &request_id.value else {
            panic!("request id must be a string");
        };
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn test_unknown_tag_is_rejected_before_handlers_run() {
        let root = Element::new(ROOT_TAG)
            .with_child(Element::new("ajaxAppender").with_attribute("name", "a"))
            .with_child(Element::new("fileAppender").with_attribute("name", "f"));
        let err = ConfigParser::new().parse(&root, &env()).unwrap_err();
        assert!(matches!(
            err,
            IntakeError::UnknownTag { ref tag, ref parent } if tag == "fileAppender" && parent == ROOT_TAG
        ));
    }

    #[test]
    fn test_unknown_root_attribute() {
        let root = Element::new(ROOT_TAG).with_attribute("verbose", "true");
        let err = ConfigParser::new().parse(&root, &env()).unwrap_err();
        assert!(matches!(err, IntakeError::UnknownAttribute { .. }));
    }

    #[test]
    fn test_loggers_processed_after_appenders_regardless_of_position() {
        let root = Element::new(ROOT_TAG)
            .with_child(Element::new("logger").with_attribute("appenders", "console;ajax"))
            .with_child(Element::new("ajaxAppender").with_attribute("name", "ajax"))
            .with_child(Element::new("consoleAppender").with_attribute("name", "console"));

        let parsed = ConfigParser::new().parse(&root, &env()).unwrap();
        let kinds: Vec<&str> = parsed
            .script
            .statements()
            .iter()
            .map(|s| match s {
                ClientStatement::SetGlobalOptions { .. } => "options",
                ClientStatement::CreateAppender { name, .. } => name.as_str(),
                ClientStatement::ConfigureLogger { .. } => "logger",
                ClientStatement::LoadLibrary { .. } => "library",
            })
            .collect();
        assert_eq!(kinds, vec!["options", "console", "ajax", "logger"]);
    }

    #[test]
    fn test_extension_tags_are_loaded_before_content() {
        let extensions = ExtensionRegistry::new().with_extension("custom", || {
            vec![TagInfo::new(
                "customAppender",
                &[AttributeSpec::required("name"), AttributeSpec::optional("channel")],
                ORDER_CONSOLE_APPENDER + 50,
                |element, ctx| {
                    let name = element.required("name")?.to_string();
                    let attributes = element
                        .attributes()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect();
                    ctx.declare_appender(
                        AppenderConfig::new(
                            name,
                            AppenderKind::Extension {
                                tag: element.tag().to_string(),
                                attributes,
                            },
                        ),
                        "createCustomAppender",
                        Vec::new(),
                    )
                },
            )]
        });

        // Extension element placed last in the document
        let root = Element::new(ROOT_TAG)
            .with_child(Element::new("logger").with_attribute("appenders", "c"))
            .with_child(
                Element::new("customAppender")
                    .with_attribute("name", "c")
                    .with_attribute("channel", "#ops"),
            )
            .with_child(Element::new(EXTENSION_TAG).with_attribute("name", "custom"));

        let config = ConfigParser::with_extensions(Arc::new(extensions))
            .parse_configuration(&root)
            .unwrap();
        assert!(matches!(
            config.appender("c").map(|a| &a.kind),
            Some(AppenderKind::Extension { .. })
        ));
        assert_eq!(config.loggers()[0].appenders, Some(vec!["c".to_string()]));
    }

    #[test]
    fn test_unresolved_extension() {
        let root = Element::new(ROOT_TAG)
            .with_child(Element::new(EXTENSION_TAG).with_attribute("name", "ghost"));
        let err = ConfigParser::new().parse(&root, &env()).unwrap_err();
        assert!(matches!(err, IntakeError::UnresolvedExtension { ref name } if name == "ghost"));
    }

    #[test]
    fn test_extension_cannot_shadow_builtin_tag() {
        let extensions = ExtensionRegistry::new()
            .with_extension("bad", || vec![TagInfo::new("logger", &[], 1, |_, _| Ok(()))]);
        let root = Element::new(ROOT_TAG)
            .with_child(Element::new(EXTENSION_TAG).with_attribute("name", "bad"));
        let err = ConfigParser::with_extensions(Arc::new(extensions))
            .parse(&root, &env())
            .unwrap_err();
        assert!(matches!(err, IntakeError::DuplicateTag { .. }));
    }

    #[test]
    fn test_disabled_short_circuits() {
        let root = Element::new(ROOT_TAG)
            .with_attribute("enabled", "false")
            .with_attribute("productionLibraryPath", "~/scripts/jsnlog.min.js")
            .with_child(Element::new("ajaxAppender").with_attribute("name", "a"))
            .with_child(Element::new("bogus"));

        let parsed = ConfigParser::new().parse(&root, &env()).unwrap();
        assert!(!parsed.configuration.options().enabled);
        assert!(parsed.configuration.appenders().is_empty());
        assert!(parsed.configuration.loggers().is_empty());
        assert_eq!(
            parsed.script.statements()[0],
            ClientStatement::LoadLibrary {
                path: "/scripts/jsnlog.min.js".into()
            }
        );
        assert!(parsed.script.statements()[1].is_global_options());
        assert_eq!(parsed.script.len(), 2);
    }

    #[test]
    fn test_global_option_parsing() {
        let root = Element::new(ROOT_TAG)
            .with_attribute("serverSideLogger", "jslogger")
            .with_attribute("serverSideLevel", "ERROR")
            .with_attribute("serverSideMessageFormat", "%logger: %message")
            .with_attribute("dateFormat", "%Y")
            .with_attribute("corsAllowedOriginsRegex", "^https://a\\.com$");
        let config = ConfigParser::new().parse_configuration(&root).unwrap();
        let options = config.options();
        assert_eq!(options.server_side_logger.as_deref(), Some("jslogger"));
        assert_eq!(options.server_side_level, Some(Level::Error));
        assert_eq!(options.message_format.source(), "%logger: %message");
        assert_eq!(options.date_format, DateFormat::Custom("%Y".into()));
        assert!(options.cors_allowed_origins.is_some());
    }

    #[test]
    fn test_bad_date_format() {
        let root = Element::new(ROOT_TAG).with_attribute("dateFormat", "%");
        let err = ConfigParser::new().parse_configuration(&root).unwrap_err();
        assert!(matches!(err, IntakeError::InvalidValue { ref attribute, .. } if attribute == "dateFormat"));
    }

    #[test]
    fn test_split_appender_names() {
        assert_eq!(split_appender_names(" a ; b;;c "), vec!["a", "b", "c"]);
        assert!(split_appender_names("").is_empty());
    }
}

//! Client initialization statements
//!
//! The parser records what the browser client must do to mirror the server
//! configuration: set global options, construct appenders, then configure
//! loggers. Statements keep their emission order; rendering to JavaScript is
//! a separate step.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Write as _;

/// Name of the function wrapping generated code
pub const CONFIGURE_FUNCTION: &str = "__jsnlog_configure";

/// Name of the client library object
pub const CLIENT_OBJECT: &str = "JL";

#[derive(Debug, Clone, PartialEq)]
pub enum ClientValue {
    Json(Value),
    /// Appenders referenced by name, rendered as their constructed variables
    Appenders(Vec<String>),
}

macro_rules! json_client_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ClientValue {
                fn from(value: $ty) -> Self {
                    ClientValue::Json(Value::from(value))
                }
            }
        )*
    };
}

json_client_value!(bool, i32, i64, u32, &str, String, Vec<String>);

impl From<Value> for ClientValue {
    fn from(value: Value) -> Self {
        ClientValue::Json(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientOption {
    pub name: String,
    pub value: ClientValue,
}

impl ClientOption {
    pub fn new(name: impl Into<String>, value: impl Into<ClientValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientStatement {
    /// Load the client library from a resolved path
    LoadLibrary { path: String },
    /// Set options on the client library object
    SetGlobalOptions { options: Vec<ClientOption> },
    /// Construct a named appender with a constructor such as `createAjaxAppender`
    CreateAppender {
        name: String,
        constructor: String,
        options: Vec<ClientOption>,
    },
    /// Configure the logger with the given name
    ConfigureLogger {
        name: String,
        options: Vec<ClientOption>,
    },
}

impl ClientStatement {
    pub fn is_global_options(&self) -> bool {
        matches!(self, ClientStatement::SetGlobalOptions { .. })
    }

    pub fn is_appender(&self) -> bool {
        matches!(self, ClientStatement::CreateAppender { .. })
    }

    pub fn is_logger(&self) -> bool {
        matches!(self, ClientStatement::ConfigureLogger { .. })
    }
}

/// Ordered statement buffer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientScript {
    statements: Vec<ClientStatement>,
}

impl ClientScript {
    pub fn new() -> Self {
        Self {
            statements: Vec::new(),
        }
    }

    pub fn push(&mut self, statement: ClientStatement) {
        self.statements.push(statement);
    }

    pub fn statements(&self) -> &[ClientStatement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Render as JavaScript
    ///
    /// With `closure` set, the code is wrapped in a configure function that is
    /// called immediately if the client library is already loaded. Library
    /// loads are skipped; see [`ClientScript::render_html`].
    pub fn render_js(&self, closure: bool) -> String {
        let mut out = String::new();
        let mut vars: HashMap<&str, String> = HashMap::new();

        if closure {
            let _ = writeln!(out, "var {} = function ({}) {{", CONFIGURE_FUNCTION, CLIENT_OBJECT);
        }

        for statement in &self.statements {
            match statement {
                ClientStatement::LoadLibrary { .. } => {}
                ClientStatement::SetGlobalOptions { options } => {
                    let _ = writeln!(
                        out,
                        "{}.setOptions({});",
                        CLIENT_OBJECT,
                        render_options(options, &vars)
                    );
                }
                ClientStatement::CreateAppender {
                    name,
                    constructor,
                    options,
                } => {
                    let var = format!("a{}", vars.len());
                    let _ = writeln!(
                        out,
                        "var {}={}.{}({});",
                        var,
                        CLIENT_OBJECT,
                        constructor,
                        Value::String(name.clone())
                    );
                    if !options.is_empty() {
                        let _ = writeln!(out, "{}.setOptions({});", var, render_options(options, &vars));
                    }
                    vars.insert(name.as_str(), var);
                }
                ClientStatement::ConfigureLogger { name, options } => {
                    let _ = writeln!(
                        out,
                        "{}({}).setOptions({});",
                        CLIENT_OBJECT,
                        Value::String(name.clone()),
                        render_options(options, &vars)
                    );
                }
            }
        }

        if closure {
            let _ = writeln!(
                out,
                "}}; try {{ {}({}); }} catch(e) {{}};",
                CONFIGURE_FUNCTION, CLIENT_OBJECT
            );
        }

        out
    }

    /// Render as HTML script tags, library loads included
    ///
    /// Library loads keep their position relative to the inline code: those
    /// recorded before any other statement load first, the rest load after.
    pub fn render_html(&self, closure: bool) -> String {
        let mut out = String::new();
        let leading = self
            .statements
            .iter()
            .take_while(|s| matches!(s, ClientStatement::LoadLibrary { .. }))
            .count();

        let (before, after) = self.statements.split_at(leading);
        write_library_tags(before, &mut out);

        let _ = writeln!(out, "<script type=\"text/javascript\">");
        out.push_str(&self.render_js(closure));
        let _ = writeln!(out, "</script>");

        write_library_tags(after, &mut out);
        out
    }
}

fn write_library_tags(statements: &[ClientStatement], out: &mut String) {
    for statement in statements {
        if let ClientStatement::LoadLibrary { path } = statement {
            let _ = writeln!(
                out,
                "<script type=\"text/javascript\" src=\"{}\"></script>",
                escape_attribute(path)
            );
        }
    }
}

fn render_options(options: &[ClientOption], vars: &HashMap<&str, String>) -> String {
    let rendered: Vec<String> = options
        .iter()
        .map(|option| {
            let value = match &option.value {
                ClientValue::Json(value) => value.to_string(),
                ClientValue::Appenders(names) => {
                    let refs: Vec<&str> = names
                        .iter()
                        .filter_map(|name| vars.get(name.as_str()).map(String::as_str))
                        .collect();
                    format!("[{}]", refs.join(","))
                }
            };
            format!("{}: {}", Value::String(option.name.clone()), value)
        })
        .collect();
    format!("{{{}}}", rendered.join(", "))
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

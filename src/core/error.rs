//! Error types for the intake pipeline

pub type Result<T> = std::result::Result<T, IntakeError>;

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    /// Element tag not registered for the position it appears in
    #[error("Unknown element <{tag}> inside <{parent}>")]
    UnknownTag { tag: String, parent: String },

    /// Two tag handlers claim the same element name
    #[error("Element <{tag}> is registered more than once")]
    DuplicateTag { tag: String },

    /// Required attribute absent
    #[error("Element <{element}> is missing required attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    /// Attribute not in the element's contract
    #[error("Element <{element}> does not accept attribute '{attribute}'")]
    UnknownAttribute { element: String, attribute: String },

    /// Severity token that is neither a level name nor an integer
    #[error("Invalid level '{value}' in attribute '{attribute}' of <{element}>")]
    InvalidLevel {
        element: String,
        attribute: String,
        value: String,
    },

    /// Regular expression that does not compile
    #[error("Invalid regex '{value}' in attribute '{attribute}' of <{element}>: {source}")]
    InvalidRegex {
        element: String,
        attribute: String,
        value: String,
        #[source]
        source: regex::Error,
    },

    /// Attribute value of the wrong shape (bool, integer, ...)
    #[error("Invalid value '{value}' in attribute '{attribute}' of <{element}>: expected {expected}")]
    InvalidValue {
        element: String,
        attribute: String,
        value: String,
        expected: String,
    },

    /// Logger references an appender that was never declared
    #[error("Logger '{logger}' references unknown appender '{appender}'")]
    UnknownAppender { logger: String, appender: String },

    /// Appender name declared twice
    #[error("Appender '{name}' is declared more than once")]
    DuplicateAppender { name: String },

    /// Logger name declared twice
    #[error("Logger '{name}' is declared more than once")]
    DuplicateLogger { name: String },

    /// Extension identifier that the resolver does not know
    #[error("Extension '{name}' could not be resolved")]
    UnresolvedExtension { name: String },

    /// Root element has the wrong tag
    #[error("Expected root element <{expected}>, found <{found}>")]
    InvalidRoot { expected: String, found: String },

    /// Request body is not a log batch
    #[error("Malformed log batch: {0}")]
    MalformedBatch(#[source] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl IntakeError {
    pub fn unknown_tag(tag: impl Into<String>, parent: impl Into<String>) -> Self {
        IntakeError::UnknownTag {
            tag: tag.into(),
            parent: parent.into(),
        }
    }

    pub fn missing_attribute(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        IntakeError::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }

    pub fn unknown_attribute(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        IntakeError::UnknownAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }

    pub fn invalid_level(
        element: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        IntakeError::InvalidLevel {
            element: element.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn invalid_regex(
        element: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
        source: regex::Error,
    ) -> Self {
        IntakeError::InvalidRegex {
            element: element.into(),
            attribute: attribute.into(),
            value: value.into(),
            source,
        }
    }

    pub fn invalid_value(
        element: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        IntakeError::InvalidValue {
            element: element.into(),
            attribute: attribute.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }

    pub fn unknown_appender(logger: impl Into<String>, appender: impl Into<String>) -> Self {
        IntakeError::UnknownAppender {
            logger: logger.into(),
            appender: appender.into(),
        }
    }

    /// Body parsed as JSON but is not an entry array or envelope
    pub fn malformed_batch(msg: impl std::fmt::Display) -> Self {
        IntakeError::MalformedBatch(serde::de::Error::custom(msg))
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        IntakeError::Other(msg.into())
    }

    /// True for errors raised while loading a configuration
    pub fn is_configuration_error(&self) -> bool {
        !matches!(
            self,
            IntakeError::MalformedBatch(_) | IntakeError::Other(_)
        )
    }
}

//! Macro for building configuration trees in code.
//!
//! # Examples
//!
//! ```
//! use rust_log_intake::element;
//!
//! let root = element!("logging", { "corsAllowedOriginsRegex" => "^https://app\\.example$" }, [
//!     element!("ajaxAppender", { "name" => "appender1", "level" => "WARN" }),
//!     element!("logger", { "appenders" => "appender1" }, [
//!         element!("onceOnly", { "regex" => "timeout" }),
//!     ]),
//! ]);
//!
//! assert_eq!(root.children().len(), 2);
//! assert_eq!(root.children()[1].children()[0].attribute("regex"), Some("timeout"));
//! ```

/// Build an [`Element`](crate::config::Element).
///
/// Forms: `element!(tag)`, `element!(tag, { attr => value, .. })`,
/// `element!(tag, [children..])` and `element!(tag, { .. }, [children..])`.
#[macro_export]
macro_rules! element {
    ($tag:expr, [ $($child:expr),* $(,)? ]) => {
        $crate::element!($tag, {}, [ $($child),* ])
    };
    ($tag:expr, { $($name:expr => $value:expr),* $(,)? }, [ $($child:expr),* $(,)? ]) => {{
        #[allow(unused_mut)]
        let mut element = $crate::element!($tag, { $($name => $value),* });
        $( element.push_child($child); )*
        element
    }};
    ($tag:expr, { $($name:expr => $value:expr),* $(,)? }) => {{
        #[allow(unused_mut)]
        let mut element = $crate::config::Element::new($tag);
        $( element.set_attribute($name, $value); )*
        element
    }};
    ($tag:expr) => {
        $crate::config::Element::new($tag)
    };
}

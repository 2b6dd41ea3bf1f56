//! Console sink

use crate::core::{DateFormat, Level, LogSink};
use chrono::Utc;
use colored::Colorize;

pub struct ConsoleSink {
    use_colors: bool,
    date_format: DateFormat,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            date_format: DateFormat::default(),
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            date_format: DateFormat::default(),
        }
    }

    /// Set the format of the receive-time prefix
    ///
    /// # Example
    ///
    /// ```
    /// use rust_log_intake::sinks::ConsoleSink;
    /// use rust_log_intake::DateFormat;
    ///
    /// let sink = ConsoleSink::new().with_date_format(DateFormat::Rfc3339);
    /// ```
    #[must_use]
    pub fn with_date_format(mut self, format: DateFormat) -> Self {
        self.date_format = format;
        self
    }

    fn format_line(&self, level: Level, logger_name: &str, message: &str) -> String {
        let level_str = if self.use_colors {
            format!("{:5}", level.to_str())
                .color(level.color_code())
                .to_string()
        } else {
            format!("{:5}", level.to_str())
        };
        let logger_name = if logger_name.is_empty() { "root" } else { logger_name };

        format!(
            "[{}] [{}] {} - {}",
            self.date_format.format(&Utc::now()),
            level_str,
            logger_name,
            message
        )
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for ConsoleSink {
    fn log(&self, level: Level, logger_name: &str, message: &str) {
        let line = self.format_line(level, logger_name, message);

        // Error and Fatal go to stderr, the rest to stdout
        match level {
            Level::Error | Level::Fatal => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }

    fn flush(&self) {
        use std::io::Write;
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
    }

    fn name(&self) -> &str {
        "console"
    }
}

//! Runtime view of a configuration
//!
//! Built once per activated [`Configuration`]. Every declared logger gets its
//! effective settings resolved up front: whatever a logger leaves unset is
//! taken from the nearest declared ancestor. Once-only rules stay with the
//! logger that declares them, together with their armed/fired state.

use super::once_only::OnceOnlySet;
use crate::config::{
    parent_logger_name, AppenderConfig, Configuration, GlobalOptions, LoggerConfig, Pattern,
};
use crate::core::{DropReason, Level};
use std::collections::HashMap;

/// Effective settings of one logger
#[derive(Debug)]
pub struct LoggerState {
    name: String,
    level: Level,
    user_agent_regex: Option<Pattern>,
    ip_regex: Option<Pattern>,
    disallow: Option<Pattern>,
    appenders: Option<Vec<AppenderConfig>>,
    once_only: OnceOnlySet,
}

impl LoggerState {
    /// Logger that accepts everything, used when nothing is declared
    pub fn implicit_default() -> Self {
        Self {
            name: String::new(),
            level: Level::All,
            user_agent_regex: None,
            ip_regex: None,
            disallow: None,
            appenders: None,
            once_only: OnceOnlySet::default(),
        }
    }

    fn resolve(logger: &LoggerConfig, configuration: &Configuration) -> Self {
        let chain = ancestry(logger, configuration);

        let appenders = chain.iter().find_map(|l| l.appenders.as_ref()).map(|names| {
            names
                .iter()
                .filter_map(|name| configuration.appender(name).cloned())
                .collect()
        });

        Self {
            name: logger.name.clone(),
            level: chain.iter().find_map(|l| l.level).unwrap_or(Level::All),
            user_agent_regex: chain.iter().find_map(|l| l.user_agent_regex.clone()),
            ip_regex: chain.iter().find_map(|l| l.ip_regex.clone()),
            disallow: chain.iter().find_map(|l| l.disallow.clone()),
            appenders,
            once_only: OnceOnlySet::new(&logger.once_only),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn appenders(&self) -> Option<&[AppenderConfig]> {
        self.appenders.as_deref()
    }

    pub fn once_only(&self) -> &OnceOnlySet {
        &self.once_only
    }

    /// Run every stateless filter; `None` means the entry may proceed
    ///
    /// Once-only rules are left to [`LoggerState::check_once_only`] so that an
    /// entry dropped here never uses up a rule.
    pub fn filter(
        &self,
        level: Level,
        message: &str,
        user_agent: &str,
        client_address: &str,
    ) -> Option<DropReason> {
        if self.level == Level::Off || level < self.level {
            return Some(DropReason::BelowLevel);
        }
        let client_rejected = self
            .user_agent_regex
            .as_ref()
            .is_some_and(|re| !re.is_match(user_agent))
            || self
                .ip_regex
                .as_ref()
                .is_some_and(|re| !re.is_match(client_address));
        if client_rejected {
            return Some(DropReason::ClientFilter);
        }
        if self.disallow.as_ref().is_some_and(|re| re.is_match(message)) {
            return Some(DropReason::Disallowed);
        }
        if let Some(appenders) = &self.appenders {
            if !appenders
                .iter()
                .any(|a| a.admits(level, user_agent, client_address))
            {
                return Some(DropReason::NoAppender);
            }
        }
        None
    }

    pub fn check_once_only(&self, message: &str) -> bool {
        self.once_only.check(message)
    }
}

/// The logger itself followed by its declared ancestors, nearest first
fn ancestry<'c>(logger: &'c LoggerConfig, configuration: &'c Configuration) -> Vec<&'c LoggerConfig> {
    let mut chain = vec![logger];
    let mut name = parent_logger_name(&logger.name);
    while let Some(current) = name {
        if let Some(ancestor) = configuration.logger(current) {
            chain.push(ancestor);
        }
        name = parent_logger_name(current);
    }
    chain
}

/// Configuration plus its runtime state
#[derive(Debug)]
pub struct IntakeState {
    configuration: Configuration,
    loggers: HashMap<String, LoggerState>,
    default_logger: LoggerState,
}

impl IntakeState {
    pub fn new(configuration: Configuration) -> Self {
        let loggers = configuration
            .loggers()
            .iter()
            .map(|logger| {
                (
                    logger.name.clone(),
                    LoggerState::resolve(logger, &configuration),
                )
            })
            .collect();

        Self {
            configuration,
            loggers,
            default_logger: LoggerState::implicit_default(),
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn options(&self) -> &GlobalOptions {
        self.configuration.options()
    }

    /// Most specific declared logger for `name`, else the implicit default
    pub fn resolve(&self, name: &str) -> &LoggerState {
        let mut candidate = Some(name);
        while let Some(current) = candidate {
            if let Some(logger) = self.loggers.get(current) {
                return logger;
            }
            candidate = parent_logger_name(current);
        }
        &self.default_logger
    }
}

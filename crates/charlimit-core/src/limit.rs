//! Limit tag parsing.
//!
//! A text layer declares its character budget in its own name, e.g.
//! `"Description [CC:200]"`. The first `<keyword>:<digits>` occurrence wins.

use regex::{Regex, RegexBuilder};

use crate::config::LimitConfig;
use crate::error::ConfigResult;

/// Compiled limit tag matcher.
#[derive(Debug, Clone)]
pub struct LimitPattern {
    regex: Regex,
    max_limit: Option<usize>,
}

impl LimitPattern {
    /// Compile the tag pattern described by `config`.
    ///
    /// The keyword is matched literally; regex metacharacters in it are escaped.
    pub fn new(config: &LimitConfig) -> ConfigResult<Self> {
        let source = format!(r"{}:(\d+)", regex::escape(config.keyword.trim()));
        let regex = RegexBuilder::new(&source)
            .case_insensitive(config.case_insensitive)
            .build()?;
        Ok(Self {
            regex,
            max_limit: config.max_limit,
        })
    }

    /// Extract the character limit declared in `name`.
    ///
    /// Returns `None` when the name carries no tag. A captured number that
    /// overflows `usize` or exceeds the configured ceiling is also `None`:
    /// an unusable limit is no limit, never zero.
    pub fn parse(&self, name: &str) -> Option<usize> {
        let digits = self.regex.captures(name)?.get(1)?.as_str();
        let Ok(limit) = digits.parse::<usize>() else {
            tracing::warn!(name, digits, "limit tag out of range, ignoring");
            return None;
        };
        if let Some(max) = self.max_limit
            && limit > max
        {
            tracing::warn!(name, limit, max, "limit tag above configured ceiling, ignoring");
            return None;
        }
        Some(limit)
    }
}

impl Default for LimitPattern {
    fn default() -> Self {
        Self {
            regex: RegexBuilder::new(r"CC:(\d+)")
                .case_insensitive(true)
                .build()
                .expect("default limit regex should compile"),
            max_limit: None,
        }
    }
}

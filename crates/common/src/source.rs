//! Proto source identity parsed from a repository URL
//!
//! Repositories follow the `<space>/<service>-proto` naming convention, e.g.
//! `git@gitlab.example.com:org/user-proto.git` is space `org`, service `user`.

use crate::{GeneratorError, Result};
use regex::Regex;
use serde::Serialize;

const URL_PATTERN: &str = r"(?:^|[:/])([^/:]+)/([^/:]+?)-proto(?:\.git)?/?$";

/// One input repository and the labels derived from its URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtoSource {
    pub url: String,
    pub space: String,
    pub service: String,
}

impl ProtoSource {
    /// Parse `space` and `service` from a repository URL
    ///
    /// Fails with [`GeneratorError::Configuration`] when the URL does not end
    /// in `<space>/<service>-proto` (optionally followed by `.git`).
    pub fn parse(url: &str) -> Result<Self> {
        let pattern = Regex::new(URL_PATTERN)
            .map_err(|e| GeneratorError::Configuration(format!("Invalid url pattern: {}", e)))?;
        let captures = pattern.captures(url.trim()).ok_or_else(|| {
            GeneratorError::Configuration(format!(
                "git url '{}' does not match the '<space>/<service>-proto' convention",
                url
            ))
        })?;

        Ok(Self {
            url: url.to_string(),
            space: captures[1].to_string(),
            service: captures[2].to_string(),
        })
    }

    /// TypeScript identifier that scopes everything generated for this source
    ///
    /// The ordinal `index` keeps two sources with the same labels apart.
    pub fn namespace_ident(&self, index: usize) -> String {
        format!(
            "{}_{}_{}",
            to_identifier(&self.space),
            to_identifier(&self.service),
            index
        )
    }
}

/// Replace anything that is not valid in a JS identifier with `_`
pub fn to_identifier(s: &str) -> String {
    let mut result: String = s
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' {
                ch
            } else {
                '_'
            }
        })
        .collect();

    if result.chars().next().map_or(true, |ch| ch.is_ascii_digit()) {
        result.insert(0, '_');
    }
    result
}

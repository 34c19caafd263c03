use serde::Deserialize;

use crate::{error::BuildfmtError, rewrite};

/// Application configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Rewrite configuration section
    #[serde(default)]
    pub rewrite: RewriteConfig,
}

impl AppConfig {
    /// Check that every configured pass name and sort context is well formed.
    ///
    /// # Errors
    ///
    /// Returns [`BuildfmtError::Config`] for an unknown pass name in
    /// `disable` or a malformed `allow_sort` entry.
    pub fn validate(&self) -> Result<(), BuildfmtError> {
        self.rewrite.validate()
    }
}

/// Rewrite configuration section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RewriteConfig {
    /// Names of rewrite passes to skip
    #[serde(default)]
    pub disable: Vec<String>,

    /// Extra sort contexts: `attr` for every rule, or `kind.attr` for one rule kind
    #[serde(default)]
    pub allow_sort: Vec<String>,
}

impl RewriteConfig {
    /// Returns `true` if the pass named `pass` is disabled.
    pub fn is_disabled(&self, pass: &str) -> bool {
        self.disable.iter().any(|name| name == pass)
    }

    /// Returns `true` if an `allow_sort` entry covers `attr` of rules of kind `kind`.
    pub fn allows_sort(&self, kind: &str, attr: &str) -> bool {
        self.allow_sort
            .iter()
            .any(|entry| match entry.split_once('.') {
                Some((entry_kind, entry_attr)) => entry_kind == kind && entry_attr == attr,
                None => entry == attr,
            })
    }

    /// Add pass names to disable. Empty names are ignored.
    pub fn with_disabled<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_non_empty(&mut self.disable, names);
        self
    }

    /// Add sort contexts. Empty entries are ignored.
    pub fn with_allow_sort<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_non_empty(&mut self.allow_sort, entries);
        self
    }

    fn validate(&self) -> Result<(), BuildfmtError> {
        if let Some(unknown) = self
            .disable
            .iter()
            .find(|name| !rewrite::pass_names().any(|known| known == name.as_str()))
        {
            let known: Vec<_> = rewrite::pass_names().collect();
            return Err(BuildfmtError::Config(format!(
                "unknown rewrite pass `{unknown}` in `disable`, expected one of: {}",
                known.join(", ")
            )));
        }

        let malformed = |entry: &String| match entry.split_once('.') {
            Some((kind, attr)) => kind.is_empty() || attr.is_empty() || attr.contains('.'),
            None => entry.is_empty(),
        };
        if let Some(entry) = self.allow_sort.iter().find(|entry| malformed(entry)) {
            return Err(BuildfmtError::Config(format!(
                "invalid `allow_sort` entry `{entry}`, expected `attr` or `kind.attr`"
            )));
        }
        Ok(())
    }
}

fn extend_non_empty<I, S>(target: &mut Vec<String>, values: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    for value in values {
        let value = value.into();
        let value = value.trim();
        if !value.is_empty() && !target.iter().any(|existing| existing == value) {
            target.push(value.to_string());
        }
    }
}

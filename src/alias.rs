use std::collections::HashMap;

use crate::error::ConfigError;

/// Alias of the directory uploaded files are written under.
pub const STATIC_PATH_ALIAS: &str = "@static";
/// Alias of the public URL serving [`STATIC_PATH_ALIAS`].
pub const STATIC_URL_ALIAS: &str = "@staticUrl";

/// Environment variable read into [`STATIC_PATH_ALIAS`] by [`Aliases::from_env`].
pub const STATIC_PATH_ENV: &str = "FILE_BEHAVIOR_STATIC_PATH";
/// Environment variable read into [`STATIC_URL_ALIAS`] by [`Aliases::from_env`].
pub const STATIC_URL_ENV: &str = "FILE_BEHAVIOR_STATIC_URL";

/// Named path and URL prefixes such as `@static`.
///
/// A string starting with `@name` resolves to the registered value followed by
/// the rest of the string. Strings without a leading `@` resolve to themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aliases {
    values: HashMap<String, String>,
}

impl Aliases {
    /// Creates an empty alias table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding the two static aliases.
    pub fn with_static(path: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new()
            .with_alias(STATIC_PATH_ALIAS, path)
            .with_alias(STATIC_URL_ALIAS, url)
    }

    /// Reads the static aliases from the environment.
    ///
    /// Missing variables leave the corresponding alias unregistered.
    pub fn from_env() -> Self {
        let mut aliases = Self::new();
        if let Ok(path) = std::env::var(STATIC_PATH_ENV) {
            aliases.set(STATIC_PATH_ALIAS, path);
        }
        if let Ok(url) = std::env::var(STATIC_URL_ENV) {
            aliases.set(STATIC_URL_ALIAS, url);
        }
        aliases
    }

    /// Registers an alias, builder style.
    pub fn with_alias(mut self, alias: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(alias, value);
        self
    }

    /// Registers or replaces an alias. A missing leading `@` is added.
    pub fn set(&mut self, alias: impl Into<String>, value: impl Into<String>) {
        let mut alias = alias.into();
        if !alias.starts_with('@') {
            alias.insert(0, '@');
        }
        let value = value.into();
        let trimmed = value.trim_end_matches('/');
        // Keep a bare "/" root intact.
        let value = if trimmed.is_empty() { value } else { trimmed.to_owned() };
        self.values.insert(alias, value);
    }

    /// Returns the raw value of an alias.
    pub fn get(&self, alias: &str) -> Option<&str> {
        self.values.get(alias).map(String::as_str)
    }

    /// Expands the leading alias of `value`.
    pub fn resolve(&self, value: &str) -> Result<String, ConfigError> {
        if !value.starts_with('@') {
            return Ok(value.to_owned());
        }

        let (alias, rest) = match value.find('/') {
            Some(slash) => value.split_at(slash),
            None => (value, ""),
        };
        let root = self.get(alias).ok_or_else(|| ConfigError::UnknownAlias {
            alias: alias.to_owned(),
        })?;

        if root == "/" && rest.starts_with('/') {
            return Ok(rest.to_owned());
        }
        Ok(format!("{root}{rest}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_leading_alias() {
        let aliases = Aliases::with_static("/var/www/static/", "https://cdn.example.com");
        assert_eq!(
            aliases.resolve("@static/users").expect("known alias"),
            "/var/www/static/users"
        );
        assert_eq!(
            aliases.resolve("@staticUrl").expect("known alias"),
            "https://cdn.example.com"
        );
        assert_eq!(aliases.resolve("/plain/path").expect("plain"), "/plain/path");
    }

    #[test]
    fn unknown_alias_is_rejected() {
        let err = Aliases::new().resolve("@uploads/a").expect_err("alias is unknown");
        assert_eq!(
            err,
            ConfigError::UnknownAlias {
                alias: "@uploads".into()
            }
        );
    }

    #[test]
    fn static_aliases_load_from_environment() {
        std::env::set_var(STATIC_PATH_ENV, "/srv/www/static/");
        std::env::set_var(STATIC_URL_ENV, "https://cdn.example.com/");
        let aliases = Aliases::from_env();
        std::env::remove_var(STATIC_PATH_ENV);
        std::env::remove_var(STATIC_URL_ENV);

        assert_eq!(aliases.get(STATIC_PATH_ALIAS), Some("/srv/www/static"));
        assert_eq!(
            aliases.resolve("@staticUrl/users").expect("known alias"),
            "https://cdn.example.com/users"
        );
        assert_eq!(Aliases::from_env(), Aliases::new());
    }

    #[test]
    fn root_slash_alias_does_not_double_separator() {
        let aliases = Aliases::new().with_alias("web", "/");
        assert_eq!(aliases.resolve("@web/static").expect("known alias"), "/static");
    }
}

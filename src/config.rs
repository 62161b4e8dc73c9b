use crate::{
    alias::{Aliases, STATIC_PATH_ALIAS, STATIC_URL_ALIAS},
    error::ConfigError,
    naming::{tableize, NameStrategy},
    storage::StorageLocation,
};

/// Per-attribute behavior configuration, fixed at attach time.
#[derive(Debug, Clone)]
pub struct FileBehaviorConfig {
    /// Field receiving the file URL. Required.
    pub attribute: String,
    /// Storage root, alias-expanded. Defaults to `@static/<table>`.
    pub base_path: Option<String>,
    /// Public URL of `base_path`, alias-expanded. Defaults to `@staticUrl/<table>`.
    pub base_url: Option<String>,
    /// How stored file names are chosen.
    pub file_name: NameStrategy,
    /// Only a new upload may change the attribute; other input is reverted.
    pub change_by_file_only: bool,
    /// Field whose truthy value clears the attribute when no upload is sent.
    pub delete_attribute: Option<String>,
    /// Overwrite an existing file with the same name instead of suffixing.
    pub overwrite_file: bool,
    /// Delete the previous file when the attribute changes.
    pub delete_old_file: bool,
    /// Delete the file when the record is deleted.
    pub delete_file_with_model: bool,
}

impl Default for FileBehaviorConfig {
    fn default() -> Self {
        Self {
            attribute: String::new(),
            base_path: None,
            base_url: None,
            file_name: NameStrategy::Original,
            change_by_file_only: true,
            delete_attribute: None,
            overwrite_file: true,
            delete_old_file: true,
            delete_file_with_model: true,
        }
    }
}

impl FileBehaviorConfig {
    /// Creates a default configuration for `attribute`.
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            ..Self::default()
        }
    }

    /// Validates required options.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attribute.trim().is_empty() {
            return Err(ConfigError::MissingAttribute);
        }
        Ok(())
    }

    /// Resolves the storage root and URL for records of `record_type`.
    pub fn resolve_location(
        &self,
        aliases: &Aliases,
        record_type: &str,
    ) -> Result<StorageLocation, ConfigError> {
        let folder = tableize(record_type);
        let base_path = match &self.base_path {
            Some(path) => aliases.resolve(path)?,
            None => aliases.resolve(&format!("{STATIC_PATH_ALIAS}/{folder}"))?,
        };
        let base_url = match &self.base_url {
            Some(url) => aliases.resolve(url)?,
            None => aliases.resolve(&format!("{STATIC_URL_ALIAS}/{folder}"))?,
        };
        Ok(StorageLocation::new(
            base_path.trim_end_matches('/'),
            base_url,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn missing_attribute_is_rejected() {
        assert_eq!(
            FileBehaviorConfig::default().validate(),
            Err(ConfigError::MissingAttribute)
        );
        assert_eq!(FileBehaviorConfig::new("avatar").validate(), Ok(()));
    }

    #[test]
    fn defaults_to_tableized_static_folder() {
        let aliases = Aliases::with_static("/srv/static", "/static");
        let location = FileBehaviorConfig::new("avatar")
            .resolve_location(&aliases, "UserProfile")
            .expect("aliases are registered");
        assert_eq!(location.base_path(), Path::new("/srv/static/user_profiles"));
        assert_eq!(location.base_url(), "/static/user_profiles");
    }

    #[test]
    fn explicit_locations_are_alias_expanded() {
        let aliases = Aliases::with_static("/srv/static", "/static");
        let config = FileBehaviorConfig {
            base_path: Some("@static/avatars/".into()),
            base_url: Some("https://cdn.example.com/avatars".into()),
            ..FileBehaviorConfig::new("avatar")
        };
        let location = config
            .resolve_location(&aliases, "User")
            .expect("aliases are registered");
        assert_eq!(location.base_path(), Path::new("/srv/static/avatars"));
        assert_eq!(location.base_url(), "https://cdn.example.com/avatars");
    }
}

use crate::{
    alias::Aliases, behavior::FileBehavior, config::FileBehaviorConfig, error::ConfigError,
    handle::FileMeta, naming::NameStrategy, record::Record,
};

/// Builder for configuring a [`FileBehavior`].
#[derive(Debug, Clone, Default)]
pub struct FileBehaviorBuilder {
    config: FileBehaviorConfig,
}

impl FileBehaviorBuilder {
    /// Creates a builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current builder configuration snapshot.
    pub fn config(&self) -> &FileBehaviorConfig {
        &self.config
    }

    /// Sets the attribute holding the file URL.
    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.config.attribute = attribute.into();
        self
    }

    /// Sets the storage root (aliases allowed).
    pub fn base_path(mut self, path: impl Into<String>) -> Self {
        self.config.base_path = Some(path.into());
        self
    }

    /// Sets the public URL of the storage root (aliases allowed).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Sets the file naming strategy.
    pub fn file_name(mut self, strategy: NameStrategy) -> Self {
        self.config.file_name = strategy;
        self
    }

    /// Names files after the slugified value of another field.
    pub fn file_name_from(self, field: impl Into<String>) -> Self {
        self.file_name(NameStrategy::attribute(field))
    }

    /// Names files with a custom generator.
    pub fn custom_file_name<F>(self, generator: F) -> Self
    where
        F: Fn(&dyn Record, &FileMeta, Option<usize>) -> Option<String> + Send + Sync + 'static,
    {
        self.file_name(NameStrategy::custom(generator))
    }

    /// Only uploads may change the attribute.
    pub fn change_by_file_only(mut self, enabled: bool) -> Self {
        self.config.change_by_file_only = enabled;
        self
    }

    /// Field whose truthy value clears the file.
    pub fn delete_attribute(mut self, field: impl Into<String>) -> Self {
        self.config.delete_attribute = Some(field.into());
        self
    }

    /// Overwrite existing files instead of suffixing names.
    pub fn overwrite_file(mut self, enabled: bool) -> Self {
        self.config.overwrite_file = enabled;
        self
    }

    /// Delete the previous file when it is replaced.
    pub fn delete_old_file(mut self, enabled: bool) -> Self {
        self.config.delete_old_file = enabled;
        self
    }

    /// Delete the file together with the record.
    pub fn delete_file_with_model(mut self, enabled: bool) -> Self {
        self.config.delete_file_with_model = enabled;
        self
    }

    /// Validates the configuration and attaches it to records of `record_type`.
    pub fn build(self, aliases: &Aliases, record_type: &str) -> Result<FileBehavior, ConfigError> {
        FileBehavior::with_config(self.config, aliases, record_type)
    }
}

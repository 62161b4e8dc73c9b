use crate::handle::{FileMeta, UploadedFile};

/// Value held by one record field.
#[derive(Debug, Default)]
pub enum AttributeValue {
    /// No value.
    #[default]
    Null,
    /// String value; file attributes hold their public URL here.
    Text(String),
    /// Integer value.
    Int(i64),
    /// Boolean value.
    Flag(bool),
    /// Upload placed on the field by the caller, not yet taken by a behavior.
    Upload(UploadedFile),
    /// Upload owned by a behavior and awaiting save.
    Bound(FileMeta),
}

impl AttributeValue {
    /// Builds a text value.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Builds a text value, or `Null` for `None`.
    pub fn from_url(value: Option<&str>) -> Self {
        value.map_or(Self::Null, |url| Self::Text(url.to_owned()))
    }

    /// Returns the string content of a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Text usable as a file-name source.
    pub fn as_name_source(&self) -> Option<String> {
        match self {
            Self::Text(value) if !value.is_empty() => Some(value.clone()),
            Self::Int(value) => Some(value.to_string()),
            _ => None,
        }
    }

    /// Returns `true` for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for values carrying a file.
    pub fn is_file(&self) -> bool {
        matches!(self, Self::Upload(_) | Self::Bound(_))
    }

    /// Loose truthiness used for flag fields such as a delete checkbox.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Text(value) => !value.is_empty() && value != "0",
            Self::Int(value) => *value != 0,
            Self::Flag(value) => *value,
            Self::Upload(_) | Self::Bound(_) => true,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<UploadedFile> for AttributeValue {
    fn from(value: UploadedFile) -> Self {
        Self::Upload(value)
    }
}

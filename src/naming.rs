use std::{fmt, sync::Arc};

use unicode_normalization::UnicodeNormalization;

use crate::{handle::FileMeta, record::Record};

/// Slug used when a base name slugifies to nothing.
pub const FALLBACK_SLUG: &str = "file";

/// Signature of a custom name generator.
///
/// Receives the record, the pending file, and the collision-avoidance index
/// (`None` on the first attempt). A returned name is used verbatim.
pub type NameGenerator =
    dyn Fn(&dyn Record, &FileMeta, Option<usize>) -> Option<String> + Send + Sync;

/// How the stored file name is chosen.
#[derive(Clone, Default)]
pub enum NameStrategy {
    /// Slugified client file name.
    #[default]
    Original,
    /// Slugified value of another record field.
    Attribute(String),
    /// Caller-supplied generator.
    Custom(Arc<NameGenerator>),
}

impl NameStrategy {
    /// Uses the given record field as the slug source.
    pub fn attribute(name: impl Into<String>) -> Self {
        Self::Attribute(name.into())
    }

    /// Uses a custom generator.
    pub fn custom<F>(generator: F) -> Self
    where
        F: Fn(&dyn Record, &FileMeta, Option<usize>) -> Option<String> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(generator))
    }

    /// Computes the file name for one attempt.
    pub fn generate(&self, record: &dyn Record, meta: &FileMeta, index: Option<usize>) -> String {
        let mut base = meta.base_name().to_owned();

        match self {
            Self::Original => {}
            Self::Attribute(field) => {
                if let Some(source) = record.field(field).and_then(|value| value.as_name_source()) {
                    base = source;
                }
            }
            Self::Custom(generator) => {
                if let Some(name) = generator(record, meta, index).filter(|name| !name.is_empty()) {
                    return name;
                }
            }
        }

        let mut name = slugify(&base);
        if name.is_empty() {
            name.push_str(FALLBACK_SLUG);
        }
        if let Some(index) = index {
            name.push('_');
            name.push_str(&index.to_string());
        }
        let extension = meta.extension().to_lowercase();
        if !extension.is_empty() {
            name.push('.');
            name.push_str(&extension);
        }
        name
    }
}

impl fmt::Debug for NameStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Original => f.write_str("Original"),
            Self::Attribute(field) => f.debug_tuple("Attribute").field(field).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Transliterates `input` into a lower-case URL-safe token.
///
/// Non-Latin scripts are romanized and diacritics stripped. Runs of
/// whitespace, `=` and dashes become a single `-`; every other
/// non-alphanumeric character is dropped.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_separator = false;

    for ch in input.nfkd() {
        if ch.is_ascii() {
            push_slug_char(&mut out, &mut pending_separator, ch);
        } else if matches!(ch, '\u{2013}' | '\u{2014}') || ch.is_whitespace() {
            pending_separator = true;
        } else if let Some(ascii) = deunicode::deunicode_char(ch) {
            for ch in ascii.chars() {
                push_slug_char(&mut out, &mut pending_separator, ch);
            }
        }
    }
    out
}

fn push_slug_char(out: &mut String, pending_separator: &mut bool, ch: char) {
    if ch.is_ascii_alphanumeric() {
        if *pending_separator && !out.is_empty() {
            out.push('-');
        }
        *pending_separator = false;
        out.push(ch.to_ascii_lowercase());
    } else if ch.is_whitespace() || matches!(ch, '=' | '-') {
        *pending_separator = true;
    }
}

/// Converts a record type name into its default table/folder name.
///
/// `UserProfile` becomes `user_profiles`; module paths are ignored.
pub fn tableize(type_name: &str) -> String {
    let base = type_name.rsplit("::").next().unwrap_or(type_name);
    let base = base.rsplit('\\').next().unwrap_or(base);
    pluralize(&underscore(base))
}

fn underscore(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let chars: Vec<char> = name.chars().collect();
    for (i, ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let next_lower = chars.get(i + 1).is_some_and(|next| next.is_lowercase());
            let prev_upper = i > 0 && chars[i - 1].is_uppercase();
            if i > 0 && (prev_lower || (prev_upper && next_lower)) && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else if ch.is_alphanumeric() {
            out.push(*ch);
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_owned()
}

fn pluralize(word: &str) -> String {
    const UNCHANGED: &[&str] = &["data", "media", "news", "series", "species", "equipment", "information"];
    const IRREGULAR: &[(&str, &str)] = &[
        ("person", "people"),
        ("child", "children"),
        ("man", "men"),
        ("woman", "women"),
    ];

    let (head, last) = match word.rfind('_') {
        Some(split) => word.split_at(split + 1),
        None => ("", word),
    };

    if last.is_empty() || UNCHANGED.contains(&last) {
        return word.to_owned();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(single, _)| *single == last) {
        return format!("{head}{plural}");
    }

    let plural = if last.ends_with('y') && !ends_with_vowel_y(last) {
        format!("{}ies", &last[..last.len() - 1])
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|suffix| last.ends_with(suffix)) {
        format!("{last}es")
    } else {
        format!("{last}s")
    };
    format!("{head}{plural}")
}

fn ends_with_vowel_y(word: &str) -> bool {
    let mut rev = word.chars().rev();
    rev.next();
    rev.next().is_some_and(|ch| matches!(ch, 'a' | 'e' | 'i' | 'o' | 'u'))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{behavior::MAX_NAME_ATTEMPTS, field::AttributeValue, record::MapRecord};

    fn meta(name: &str) -> FileMeta {
        FileMeta {
            name: name.to_owned(),
            content_type: mime::APPLICATION_OCTET_STREAM,
            size: 1,
        }
    }

    #[test]
    fn original_name_is_slugged_with_lowercase_extension() {
        let record = MapRecord::new("User");
        let strategy = NameStrategy::Original;
        assert_eq!(strategy.generate(&record, &meta("My Photo.JPG"), None), "my-photo.jpg");
        assert_eq!(strategy.generate(&record, &meta("My Photo.JPG"), Some(3)), "my-photo_3.jpg");
        assert_eq!(strategy.generate(&record, &meta("README"), None), "readme");
        assert_eq!(strategy.generate(&record, &meta("???.png"), Some(0)), "file_0.png");
    }

    #[test]
    fn attribute_strategy_slugs_the_field_value() {
        let strategy = NameStrategy::attribute("title");
        let upload = meta("IMG_0001.PNG");

        let titled = MapRecord::new("Post").with_field("title", "Summer Trip");
        assert_eq!(strategy.generate(&titled, &upload, None), "summer-trip.png");
        assert_eq!(strategy.generate(&titled, &upload, Some(2)), "summer-trip_2.png");

        let numbered = MapRecord::new("Post").with_field("title", 42_i64);
        assert_eq!(strategy.generate(&numbered, &upload, None), "42.png");

        let blank = MapRecord::new("Post").with_field("title", "");
        assert_eq!(strategy.generate(&blank, &upload, None), "img0001.png");

        let flagged = MapRecord::new("Post").with_field("title", AttributeValue::Flag(true));
        assert_eq!(strategy.generate(&flagged, &upload, None), "img0001.png");

        let missing = MapRecord::new("Post");
        assert_eq!(strategy.generate(&missing, &upload, None), "img0001.png");
    }

    #[test]
    fn custom_name_is_used_verbatim() {
        let strategy = NameStrategy::custom(|_, meta, index| {
            Some(format!("Keep Me {}-{}", meta.base_name(), index.map_or(-1, |i| i as i64)))
        });
        let record = MapRecord::new("User");
        assert_eq!(strategy.generate(&record, &meta("a.PNG"), None), "Keep Me a--1");
        assert_eq!(strategy.generate(&record, &meta("a.PNG"), Some(4)), "Keep Me a-4");
    }

    #[test]
    fn custom_none_or_empty_falls_back_to_base_name() {
        let record = MapRecord::new("User");
        let none = NameStrategy::custom(|_, _, _| None);
        assert_eq!(none.generate(&record, &meta("Big Cat.GIF"), None), "big-cat.gif");
        assert_eq!(none.generate(&record, &meta("Big Cat.GIF"), Some(1)), "big-cat_1.gif");

        let empty = NameStrategy::custom(|_, _, _| Some(String::new()));
        assert_eq!(empty.generate(&record, &meta("Big Cat.GIF"), None), "big-cat.gif");
    }

    #[test]
    fn custom_generator_sees_record_and_every_index() {
        let seen = std::sync::Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let strategy = NameStrategy::custom(move |record, _, index| {
            log.lock().expect("index log").push(index);
            let id = record.field("id").and_then(AttributeValue::as_name_source)?;
            Some(format!("user-{id}.bin"))
        });
        let record = MapRecord::new("User").with_field("id", 9_i64);

        assert_eq!(strategy.generate(&record, &meta("x"), None), "user-9.bin");
        for index in 0..MAX_NAME_ATTEMPTS {
            strategy.generate(&record, &meta("x"), Some(index));
        }
        let mut expected = vec![None];
        expected.extend((0..MAX_NAME_ATTEMPTS).map(Some));
        assert_eq!(*seen.lock().expect("index log"), expected);
    }

    #[test]
    fn strategy_debug_hides_closures() {
        assert_eq!(format!("{:?}", NameStrategy::Original), "Original");
        assert_eq!(format!("{:?}", NameStrategy::attribute("title")), "Attribute(\"title\")");
        assert_eq!(format!("{:?}", NameStrategy::custom(|_, _, _| None)), "Custom(..)");
    }

    #[test]
    fn slugify_transliterates_and_collapses() {
        assert_eq!(slugify("Photo"), "photo");
        assert_eq!(slugify("Crème Brûlée"), "creme-brulee");
        assert_eq!(slugify("  a -- b  "), "a-b");
        assert_eq!(slugify("my_file.v2"), "myfilev2");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn slugify_romanizes_non_latin_scripts() {
        let report = slugify("отчёт");
        let contract = slugify("договор");
        let greek = slugify("Ελλάδα");
        let chinese = slugify("报告 文件");

        for slug in [&report, &contract, &greek, &chinese] {
            assert!(!slug.is_empty());
            assert!(slug
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-'));
        }
        assert_ne!(report, contract);
        assert_eq!(contract, "dogovor");
        assert!(chinese.contains('-'));
    }

    #[test]
    fn distinct_non_latin_uploads_get_distinct_names() {
        let record = MapRecord::new("Doc");
        let first = NameStrategy::Original.generate(&record, &meta("отчёт.PDF"), None);
        let second = NameStrategy::Original.generate(&record, &meta("договор.pdf"), None);
        assert_ne!(first, second);
        assert_ne!(first, "file.pdf");
        assert_eq!(second, "dogovor.pdf");
    }

    #[test]
    fn tableize_pluralizes_snake_case() {
        assert_eq!(tableize("UserProfile"), "user_profiles");
        assert_eq!(tableize("app::models::Category"), "categories");
        assert_eq!(tableize("Box"), "boxes");
        assert_eq!(tableize("Key"), "keys");
        assert_eq!(tableize("Person"), "people");
        assert_eq!(tableize("HTTPRequest"), "http_requests");
    }
}

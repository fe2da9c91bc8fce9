//! Header block parsing and metadata validation

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::BuildError;

/// Marker that opens and closes a header block
pub const DELIMITER: &str = "---";

/// Date format accepted in the `date` field
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fields every dated, non-index document must declare
pub const REQUIRED_FIELDS: [&str; 4] = ["title", "date", "description", "tags"];

/// Custom deserializer that handles both a single string and a list of strings
fn string_or_vec<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Option<Vec<String>>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(vec![value.to_string()]))
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                vec.push(item);
            }
            Ok(Some(vec))
        }

        // `tags:` with no value still counts as declared
        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Vec::new()))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Vec::new()))
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Header block of a content file, as declared by the author
///
/// Only `draft` is interpreted during the registry scan; the other typed
/// fields are checked by [`FrontMatter::validate`] once the file is about
/// to be rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "string_or_vec")]
    pub tags: Option<Vec<String>>,
    pub draft: bool,

    /// Any other key the author declared, in declaration order
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

/// Validated metadata handed to templates as `meta`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub title: String,
    /// Always present for dated documents; optional on index pages
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

/// Split raw file text into its header block and body.
///
/// Returns `None` unless the text starts with the delimiter and a second
/// delimiter follows it somewhere later in the text.
pub fn split_header(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix(DELIMITER)?;
    let end = rest.find(DELIMITER)?;
    Some((&rest[..end], &rest[end + DELIMITER.len()..]))
}

/// Parse a `YYYY-MM-DD` date declared in `path`
pub fn parse_date(path: &str, value: &str) -> Result<NaiveDate, BuildError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| BuildError::InvalidDate {
        path: path.to_string(),
        value: value.to_string(),
    })
}

impl FrontMatter {
    /// Parse the header block of `text`, returning it with the trimmed body.
    ///
    /// Text without a complete header block yields empty metadata and the
    /// whole text as body. A header that is not valid YAML is an error.
    pub fn parse<'a>(path: &str, text: &'a str) -> Result<(Self, &'a str), BuildError> {
        let Some((header, body)) = split_header(text) else {
            return Ok((FrontMatter::default(), text.trim()));
        };

        if header.trim().is_empty() {
            return Ok((FrontMatter::default(), body.trim()));
        }

        let front_matter =
            serde_yaml::from_str::<FrontMatter>(header).map_err(|source| BuildError::Header {
                path: path.to_string(),
                source,
            })?;

        Ok((front_matter, body.trim()))
    }

    /// The declared date, parsed.
    ///
    /// A missing date is reported the same way as a missing required field.
    pub fn parsed_date(&self, path: &str) -> Result<NaiveDate, BuildError> {
        match &self.date {
            Some(value) => parse_date(path, value),
            None => Err(BuildError::MissingField {
                path: path.to_string(),
                field: "date",
            }),
        }
    }

    /// Check the header for a full render.
    ///
    /// `title` is always required; with `dated` set, `date`, `description`
    /// and `tags` are required too. A declared date must be well-formed
    /// either way.
    pub fn validate(&self, path: &str, dated: bool) -> Result<Metadata, BuildError> {
        let missing = |field: &'static str| BuildError::MissingField {
            path: path.to_string(),
            field,
        };

        let title = self.title.clone().ok_or_else(|| missing("title"))?;

        if dated {
            for field in REQUIRED_FIELDS {
                let declared = match field {
                    "title" => self.title.is_some(),
                    "date" => self.date.is_some(),
                    "description" => self.description.is_some(),
                    _ => self.tags.is_some(),
                };
                if !declared {
                    return Err(missing(field));
                }
            }
        }

        let date = self
            .date
            .as_deref()
            .map(|value| parse_date(path, value))
            .transpose()?;

        Ok(Metadata {
            title,
            date,
            description: self.description.clone(),
            tags: self.tags.clone().unwrap_or_default(),
            extra: self.extra.clone(),
        })
    }
}

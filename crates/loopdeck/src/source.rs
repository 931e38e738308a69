//! Slide payload loading.
//!
//! Payloads are JSON objects of the form `{ "slides": [ ... ] }`. Anything that
//! does not have that shape is rejected as a whole; the carousel never runs on
//! a partially parsed list.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::slides::Slide;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("malformed slide payload: {0}")]
    Malformed(String),
}

/// Somewhere slide payloads can be fetched from.
pub trait SlideSource {
    /// Human-readable origin, for logs.
    fn describe(&self) -> String;

    /// Fetch the raw payload text.
    fn fetch(&self) -> Result<String, SourceError>;
}

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SlideSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<String, SourceError> {
        std::fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl SlideSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self) -> Result<String, SourceError> {
        let wrap = |source: ureq::Error| SourceError::Http {
            url: self.url.clone(),
            source: Box::new(source),
        };
        ureq::get(&self.url)
            .call()
            .map_err(wrap)?
            .body_mut()
            .read_to_string()
            .map_err(wrap)
    }
}

/// Pick a source for a CLI-style location: `http(s)://` URLs are fetched,
/// anything else is read from disk.
pub fn from_location(location: &str) -> Box<dyn SlideSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(HttpSource::new(location))
    } else {
        Box::new(FileSource::new(location))
    }
}

#[derive(Deserialize)]
struct Envelope {
    slides: serde_json::Value,
}

/// Validate and decode a payload.
pub fn parse_payload(text: &str) -> Result<Vec<Slide>, SourceError> {
    let envelope: Envelope =
        serde_json::from_str(text).map_err(|e| SourceError::Malformed(e.to_string()))?;
    if !envelope.slides.is_array() {
        return Err(SourceError::Malformed(format!(
            "expected `slides` to be an array, got {}",
            kind_of(&envelope.slides)
        )));
    }
    serde_json::from_value(envelope.slides).map_err(|e| SourceError::Malformed(e.to_string()))
}

fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Fetch and decode slides from `source`.
pub fn fetch_slides(source: &dyn SlideSource) -> Result<Vec<Slide>, SourceError> {
    let text = source.fetch()?;
    parse_payload(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_valid_payload() {
        let slides = parse_payload(
            r#"{ "slides": [
                { "id": 1, "desktopImg": "a.jpg", "mobileImg": "a-m.jpg", "title": "A", "text": "" },
                { "id": 2, "desktopImg": "b.jpg", "mobileImg": "b-m.jpg", "title": "B", "text": "" }
            ] }"#,
        )
        .unwrap();
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[1].title, "B");
    }

    #[test]
    fn test_empty_array_is_valid() {
        assert!(parse_payload(r#"{ "slides": [] }"#).unwrap().is_empty());
    }

    #[test]
    fn test_non_array_slides_rejected() {
        let err = parse_payload(r#"{ "slides": { "id": 1 } }"#).unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
        assert!(err.to_string().contains("an object"));
    }

    #[test]
    fn test_missing_slides_rejected() {
        assert!(parse_payload(r#"{ "items": [] }"#).is_err());
        assert!(parse_payload("not json").is_err());
        assert!(parse_payload("[]").is_err());
    }

    #[test]
    fn test_bad_element_rejects_whole_payload() {
        let err = parse_payload(r#"{ "slides": [ { "id": 1 }, { "title": "no id" } ] }"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_file_source_roundtrip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "slides": [ {{ "id": 9, "title": "Nine" }} ] }}"#).unwrap();
        let source = FileSource::new(file.path());
        let slides = fetch_slides(&source).unwrap();
        assert_eq!(slides[0].id, 9);
        assert_eq!(source.describe(), file.path().display().to_string());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("absent.json"));
        assert!(matches!(
            fetch_slides(&source),
            Err(SourceError::Io { .. })
        ));
    }

    #[test]
    fn test_from_location_picks_transport() {
        assert!(from_location("https://example.com/slides.json")
            .describe()
            .starts_with("https://"));
        assert_eq!(from_location("slides.json").describe(), "slides.json");
    }
}

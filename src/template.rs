//! Blob path templates with a single `{name}` placeholder.
//!
//! Storage triggers are bound to paths such as `uploads/{name}` and
//! `medium/{name}-medium.png`. The same template is used in both directions:
//! rendering an output path for an object name, and recognising which
//! incoming paths belong to the trigger (and which name they carry).

use crate::error::ResizeError;
use regex::Regex;
use std::fmt;

/// The placeholder substituted with the uploaded object's name.
pub const NAME_PLACEHOLDER: &str = "{name}";

/// A parsed path template, e.g. `funkytown/Evidence/{name}`.
#[derive(Clone)]
pub struct PathTemplate {
    raw: String,
    prefix: String,
    suffix: String,
    matcher: Regex,
}

impl PathTemplate {
    /// Parse a template. It must contain `{name}` exactly once.
    pub fn parse(raw: &str) -> Result<Self, ResizeError> {
        let count = raw.matches(NAME_PLACEHOLDER).count();
        if count != 1 {
            return Err(ResizeError::InvalidConfig(format!(
                "path template '{raw}' must contain {NAME_PLACEHOLDER} exactly once (found {count})"
            )));
        }

        let (prefix, suffix) = raw
            .split_once(NAME_PLACEHOLDER)
            .ok_or_else(|| ResizeError::InvalidConfig(format!("bad path template '{raw}'")))?;

        let pattern = format!(
            "^{}(?P<name>.+){}$",
            regex::escape(prefix),
            regex::escape(suffix)
        );
        let matcher = Regex::new(&pattern)
            .map_err(|e| ResizeError::InvalidConfig(format!("path template '{raw}': {e}")))?;

        Ok(Self {
            raw: raw.to_string(),
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            matcher,
        })
    }

    /// Substitute `name` into the template.
    pub fn render(&self, name: &str) -> String {
        format!("{}{}{}", self.prefix, name, self.suffix)
    }

    /// Extract the object name from a concrete path, if it fits the template.
    pub fn match_path(&self, path: &str) -> Option<String> {
        self.matcher
            .captures(path)
            .and_then(|c| c.name("name"))
            .map(|m| m.as_str().to_string())
    }

    /// Literal text before the placeholder. Used as the listing prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl fmt::Debug for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathTemplate").field(&self.raw).finish()
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Join a directory-like prefix and a file template with exactly one `/`.
pub fn join_path(dir: &str, file: &str) -> String {
    let dir = dir.trim_end_matches('/');
    let file = file.trim_start_matches('/');
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{dir}/{file}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_name() {
        let t = PathTemplate::parse("funkytown/MediumSize/{name}-medium.png").unwrap();
        assert_eq!(
            t.render("cat.jpg"),
            "funkytown/MediumSize/cat.jpg-medium.png"
        );
    }

    #[test]
    fn match_extracts_name() {
        let t = PathTemplate::parse("funkytown/Evidence/{name}").unwrap();
        assert_eq!(
            t.match_path("funkytown/Evidence/cat.jpg").as_deref(),
            Some("cat.jpg")
        );
        assert_eq!(t.match_path("funkytown/Other/cat.jpg"), None);
        assert_eq!(t.match_path("funkytown/Evidence/"), None);
    }

    #[test]
    fn match_escapes_regex_metacharacters() {
        let t = PathTemplate::parse("in.box/(raw)/{name}.png").unwrap();
        assert_eq!(t.match_path("in.box/(raw)/a.png").as_deref(), Some("a"));
        assert_eq!(t.match_path("inXbox/(raw)/a.png"), None);
    }

    #[test]
    fn rejects_missing_or_repeated_placeholder() {
        assert!(PathTemplate::parse("static/path.png").is_err());
        assert!(PathTemplate::parse("{name}/{name}").is_err());
    }

    #[test]
    fn prefix_is_text_before_placeholder() {
        let t = PathTemplate::parse("funkytown/Evidence/{name}").unwrap();
        assert_eq!(t.prefix(), "funkytown/Evidence/");
    }

    #[test]
    fn join_path_normalises_slashes() {
        assert_eq!(join_path("a/b/", "c.png"), "a/b/c.png");
        assert_eq!(join_path("a/b", "/c.png"), "a/b/c.png");
        assert_eq!(join_path("", "c.png"), "c.png");
    }
}

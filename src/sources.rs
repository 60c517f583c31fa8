//! # Source Registry
//!
//! Static catalog of the news sites we scan, each with an ordered list of
//! structural hint sets used by the extractor.
//!
//! - Built-in seed with the four Central Asian tech outlets.
//! - Optional TOML override (`config/sources.toml`), validated on load.
//! - Loaded once at startup and never mutated afterwards.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::{fmt, fs, path::Path};

/// A structural fragment used to scan markup.
///
/// Written as a plain tag name (`h2`, `article`, `time`) or as a class-name
/// substring prefixed with a dot (`.news-item`, `.title`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Marker {
    Tag(String),
    Class(String),
}

impl Marker {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if let Some(class) = raw.strip_prefix('.') {
            if class.is_empty() || class.contains(char::is_whitespace) {
                bail!("invalid class marker `{raw}`");
            }
            return Ok(Marker::Class(class.to_ascii_lowercase()));
        }
        if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            bail!("invalid tag marker `{raw}`");
        }
        Ok(Marker::Tag(raw.to_ascii_lowercase()))
    }

    pub fn tag(name: &str) -> Self {
        Marker::Tag(name.to_ascii_lowercase())
    }

    pub fn class(fragment: &str) -> Self {
        Marker::Class(fragment.to_ascii_lowercase())
    }

    /// Does an element with `tag` name and raw `class` attribute value match?
    pub fn matches(&self, tag: &str, class_attr: Option<&str>) -> bool {
        match self {
            Marker::Tag(t) => t.eq_ignore_ascii_case(tag),
            Marker::Class(c) => class_attr
                .map(|cls| cls.to_ascii_lowercase().contains(c.as_str()))
                .unwrap_or(false),
        }
    }
}

impl TryFrom<String> for Marker {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Marker::parse(&value)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Tag(t) => write!(f, "{t}"),
            Marker::Class(c) => write!(f, ".{c}"),
        }
    }
}

fn default_link_marker() -> Marker {
    Marker::tag("a")
}

/// One bundle of structural markers, ordered by decreasing specificity inside
/// a source's list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HintSet {
    pub container_markers: Vec<Marker>,
    #[serde(default)]
    pub title_markers: Vec<Marker>,
    #[serde(default = "default_link_marker")]
    pub link_marker: Marker,
    #[serde(default)]
    pub date_markers: Vec<Marker>,
    #[serde(default)]
    pub description_markers: Vec<Marker>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Source {
    pub name: String,
    pub base_url: String,
    pub hint_sets: Vec<HintSet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    /// Load from `path` if given, otherwise fall back to `default_seed()`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let content = fs::read_to_string(p)
                    .with_context(|| format!("reading sources from {}", p.display()))?;
                Self::from_toml_str(&content)
                    .with_context(|| format!("parsing sources from {}", p.display()))
            }
            None => Ok(Self::default_seed()),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let reg: SourceRegistry = toml::from_str(s)?;
        reg.validate()?;
        Ok(reg)
    }

    fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            bail!("source registry is empty");
        }
        for src in &self.sources {
            if src.name.trim().is_empty() {
                bail!("source with empty name");
            }
            let url = url::Url::parse(&src.base_url)
                .map_err(|e| anyhow!("source `{}` has invalid base_url: {e}", src.name))?;
            if !matches!(url.scheme(), "http" | "https") {
                bail!("source `{}` base_url must be http(s)", src.name);
            }
            if src.hint_sets.is_empty() {
                bail!("source `{}` has no hint sets", src.name);
            }
            if src.hint_sets.iter().any(|h| h.container_markers.is_empty()) {
                bail!("source `{}` has a hint set without container markers", src.name);
            }
        }
        Ok(())
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn get(&self, name: &str) -> Option<&Source> {
        self.sources
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Built-in catalog used when no override file is configured.
    pub fn default_seed() -> Self {
        let m = |xs: &[&str]| -> Vec<Marker> {
            xs.iter()
                .map(|x| match x.strip_prefix('.') {
                    Some(c) => Marker::class(c),
                    None => Marker::tag(x),
                })
                .collect()
        };

        // Shared field markers; the sites differ mostly in container naming.
        let specific = |containers: &[&str]| HintSet {
            container_markers: m(containers),
            title_markers: m(&["h1", "h2", "h3", ".title", ".headline"]),
            link_marker: Marker::tag("a"),
            date_markers: m(&["time", ".date", ".time", ".published"]),
            description_markers: m(&[".excerpt", ".summary", ".description", "p"]),
        };
        let generic = HintSet {
            container_markers: m(&["article", ".news", ".post", ".item", ".card"]),
            title_markers: m(&["h1", "h2", "h3", "h4", ".title"]),
            link_marker: Marker::tag("a"),
            date_markers: m(&["time", ".date"]),
            description_markers: m(&["p"]),
        };

        let source = |name: &str, url: &str, containers: &[&str]| Source {
            name: name.to_string(),
            base_url: url.to_string(),
            hint_sets: vec![specific(containers), generic.clone()],
        };

        Self {
            sources: vec![
                source(
                    "Digital Business",
                    "https://digitalbusiness.kz/",
                    &[".post", ".news-item", ".content-item", ".entry", "article"],
                ),
                source(
                    "Spot.uz",
                    "https://spot.uz/",
                    &[
                        ".news-item",
                        ".article-item",
                        ".post-item",
                        ".content-item",
                        ".news-card",
                        ".article-card",
                    ],
                ),
                source(
                    "The Tech",
                    "https://the-tech.kz/",
                    &[".post", ".news-item", ".content-item", ".entry", ".blog-post", "article"],
                ),
                source(
                    "Blue Screen",
                    "https://bluescreen.kz/",
                    &[
                        ".post",
                        ".news-item",
                        ".content-item",
                        ".entry",
                        ".blog-post",
                        ".news-card",
                        "article",
                    ],
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_parse_distinguishes_tag_and_class() {
        assert_eq!(Marker::parse("H2").unwrap(), Marker::Tag("h2".into()));
        assert_eq!(
            Marker::parse(".News-Item").unwrap(),
            Marker::Class("news-item".into())
        );
        assert!(Marker::parse(".").is_err());
        assert!(Marker::parse("div p").is_err());
    }

    #[test]
    fn class_marker_is_substring_and_case_insensitive() {
        let m = Marker::class("news");
        assert!(m.matches("div", Some("Latest-NEWS-card")));
        assert!(!m.matches("div", Some("post")));
        assert!(!m.matches("div", None));
        assert!(Marker::tag("article").matches("ARTICLE", None));
    }

    #[test]
    fn seed_has_four_sources_with_ordered_hint_sets() {
        let reg = SourceRegistry::default_seed();
        assert_eq!(reg.len(), 4);
        for s in reg.sources() {
            assert_eq!(s.hint_sets.len(), 2, "{}", s.name);
            assert!(!s.hint_sets[0].container_markers.is_empty());
        }
        assert!(reg.get("spot.uz").is_some());
        reg.validate().expect("seed must validate");
    }

    #[test]
    fn toml_override_parses_and_validates() {
        let toml = r#"
[[sources]]
name = "Example"
base_url = "https://example.kz/"

[[sources.hint_sets]]
container_markers = [".story", "article"]
title_markers = ["h2"]
date_markers = ["time"]
description_markers = [".lead"]
"#;
        let reg = SourceRegistry::from_toml_str(toml).unwrap();
        let s = reg.get("Example").unwrap();
        assert_eq!(s.hint_sets[0].link_marker, Marker::tag("a"));
        assert_eq!(s.hint_sets[0].container_markers[0], Marker::class("story"));
    }

    #[test]
    fn toml_with_bad_url_is_rejected() {
        let toml = r#"
[[sources]]
name = "Broken"
base_url = "ftp://example.kz/"

[[sources.hint_sets]]
container_markers = ["article"]
"#;
        assert!(SourceRegistry::from_toml_str(toml).is_err());
    }
}

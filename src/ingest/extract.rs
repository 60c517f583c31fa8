// src/ingest/extract.rs
//! Article extractor: cascading, best-effort structural scan.
//!
//! 1. Structural pass: the first hint set whose container markers match at
//!    least one element wins; each container is mined for title, link,
//!    description and date.
//! 2. Heading fallback: when the structural pass produced no records, every
//!    `h1`..`h6` on the page becomes a candidate, gated by the classifier.
//! 3. Cap: results are truncated in discovery order.
//!
//! This is a tag scanner, not a DOM parser. Nested same-name containers are
//! depth-counted; unclosed ones are cut at the next sibling opening or at a
//! size limit, so callers should expect an occasional truncated container.

use std::ops::Range;
use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::ingest::normalize_text;
use crate::ingest::types::{title_in_bounds, ArticleRecord, RecordError};
use crate::relevance::Classifier;
use crate::sources::{HintSet, Marker, Source};

/// Unterminated elements are cut off after this many bytes.
const MAX_UNCLOSED_BYTES: usize = 16 * 1024;

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Page scaffolding that never counts as an article container, whatever its class.
const IGNORED_CONTAINER_TAGS: &[&str] = &["html", "head", "body"];

static RE_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<!--.*?-->|<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<noscript\b[^>]*>.*?</noscript\s*>|<!doctype[^>]*>",
    )
    .expect("noise regex")
});
static RE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9-]*)([^>]*)>").expect("tag regex"));
static RE_CLASS: Lazy<Regex> = Lazy::new(|| attr_regex("class"));
static RE_HREF: Lazy<Regex> = Lazy::new(|| attr_regex("href"));
static RE_DATETIME: Lazy<Regex> = Lazy::new(|| attr_regex("datetime"));

fn attr_regex(name: &str) -> Regex {
    Regex::new(&format!(
        r#"(?i)(?:^|\s){name}\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#
    ))
    .expect("attribute regex")
}

fn attr_value<'a>(re: &Regex, attrs: &'a str) -> Option<&'a str> {
    let caps = re.captures(attrs)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str())
}

/// Per-strategy result caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionCaps {
    pub structural: usize,
    pub fallback: usize,
}

impl ExtractionCaps {
    /// Extracting a single source on its own.
    pub const SINGLE_SOURCE: Self = Self {
        structural: 10,
        fallback: 10,
    };
    /// Extracting as one of several sources in a batch run.
    pub const BATCH: Self = Self {
        structural: 5,
        fallback: 5,
    };
}

impl Default for ExtractionCaps {
    fn default() -> Self {
        Self::SINGLE_SOURCE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Structural,
    HeadingFallback,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub strategy: Strategy,
    pub records: Vec<ArticleRecord>,
    /// Containers found by the winning hint set (0 when none matched).
    pub containers: usize,
    /// Containers skipped because of a missing/invalid title or malformed markup.
    pub skipped: usize,
}

impl Extraction {
    pub fn into_records(self) -> Vec<ArticleRecord> {
        self.records
    }
}

/// Why a container produced no record.
#[derive(Debug)]
enum ContainerSkip {
    NoTitle,
    Title(RecordError),
    Malformed(&'static str),
}

#[derive(Debug)]
struct Tag {
    name: String,
    closing: bool,
    void: bool,
    start: usize,
    end: usize,
    attrs: Range<usize>,
}

#[derive(Debug, Clone)]
struct Element {
    /// Index of the opening tag.
    open: usize,
    /// Tag indices strictly inside the element.
    children: Range<usize>,
    /// Byte range of the inner markup.
    inner: Range<usize>,
    truncated: bool,
}

/// Flat tag index over a cleaned document.
struct Scan {
    src: String,
    tags: Vec<Tag>,
}

impl Scan {
    fn new(markup: &str) -> Self {
        let src = RE_NOISE.replace_all(markup, " ").into_owned();
        let tags = RE_TAG
            .captures_iter(&src)
            .filter_map(|c| {
                let whole = c.get(0)?;
                let name = c.get(2)?.as_str().to_ascii_lowercase();
                let attrs = c.get(3)?;
                let self_closing = attrs.as_str().trim_end().ends_with('/');
                let void = self_closing || VOID_TAGS.contains(&name.as_str());
                Some(Tag {
                    closing: !c.get(1)?.as_str().is_empty(),
                    void,
                    name,
                    start: whole.start(),
                    end: whole.end(),
                    attrs: attrs.range(),
                })
            })
            .collect();
        Self { src, tags }
    }

    fn attrs(&self, t: &Tag) -> &str {
        &self.src[t.attrs.clone()]
    }

    fn class_of(&self, t: &Tag) -> Option<&str> {
        attr_value(&RE_CLASS, self.attrs(t))
    }

    fn matches(&self, idx: usize, marker: &Marker) -> bool {
        let t = &self.tags[idx];
        !t.closing && marker.matches(&t.name, self.class_of(t))
    }

    /// Resolve the element opened at `open`, searching no further than tag index `limit`.
    /// Same-name tags are depth-counted so nested containers don't end early.
    fn element(&self, open: usize, limit: usize, limit_byte: usize) -> Element {
        let tag = &self.tags[open];
        if tag.void {
            return Element {
                open,
                children: open + 1..open + 1,
                inner: tag.end..tag.end,
                truncated: false,
            };
        }

        // Closing tags past the size cap are not looked for.
        let cap_byte = tag.end.saturating_add(MAX_UNCLOSED_BYTES);
        let mut depth = 1usize;
        for j in open + 1..limit {
            let t = &self.tags[j];
            if t.start >= cap_byte {
                break;
            }
            if t.name != tag.name || t.void {
                continue;
            }
            if t.closing {
                depth -= 1;
                if depth == 0 {
                    return Element {
                        open,
                        children: open + 1..j,
                        inner: tag.end..t.start,
                        truncated: false,
                    };
                }
            } else {
                depth += 1;
            }
        }

        // Unclosed: stop at the next same-name opening tag, the scope end, or the size cap.
        let mut end_byte = limit_byte.min(tag.end.saturating_add(MAX_UNCLOSED_BYTES));
        let mut end_idx = limit;
        for j in open + 1..limit {
            let t = &self.tags[j];
            if t.start >= end_byte {
                end_idx = j;
                break;
            }
            if !t.closing && t.name == tag.name {
                end_byte = t.start;
                end_idx = j;
                break;
            }
        }
        while end_byte > tag.end && !self.src.is_char_boundary(end_byte) {
            end_byte -= 1;
        }
        // Keep tags that straddle the cut out of the child range.
        while end_idx > open + 1 && self.tags[end_idx - 1].end > end_byte {
            end_idx -= 1;
        }
        Element {
            open,
            children: open + 1..end_idx,
            inner: tag.end..end_byte,
            truncated: true,
        }
    }

    /// All non-overlapping elements in `scope` matching any of `markers`, in document order.
    fn collect(&self, scope: Range<usize>, markers: &[Marker], skip: &[&str]) -> Vec<Element> {
        let limit_byte = self.scope_end_byte(&scope);
        let mut out = Vec::new();
        let mut i = scope.start;
        while i < scope.end {
            let t = &self.tags[i];
            if !skip.contains(&t.name.as_str()) && markers.iter().any(|m| self.matches(i, m)) {
                let el = self.element(i, scope.end, limit_byte);
                i = if el.truncated || t.void {
                    el.children.end.max(i + 1)
                } else {
                    el.children.end + 1
                };
                out.push(el);
            } else {
                i += 1;
            }
        }
        out
    }

    /// First element in `scope` matching `marker` whose text is non-empty.
    fn first_text(&self, scope: &Range<usize>, marker: &Marker) -> Option<(Element, String)> {
        let limit_byte = self.scope_end_byte(scope);
        for i in scope.clone() {
            if !self.matches(i, marker) {
                continue;
            }
            let el = self.element(i, scope.end, limit_byte);
            if let Some(text) = self.text(&el) {
                if !text.is_empty() {
                    return Some((el, text));
                }
            }
        }
        None
    }

    fn scope_end_byte(&self, scope: &Range<usize>) -> usize {
        self.tags
            .get(scope.end)
            .map(|t| t.start)
            .unwrap_or(self.src.len())
    }

    fn text(&self, el: &Element) -> Option<String> {
        self.src.get(el.inner.clone()).map(normalize_text)
    }
}

/// Resolve `href` against `base`; only http(s) results are accepted.
pub fn resolve_link(base: &str, href: &str) -> Option<String> {
    let href = html_escape::decode_html_entities(href.trim()).into_owned();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let base = url::Url::parse(base).ok()?;
    let resolved = base.join(&href).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

pub struct Extractor {
    classifier: Arc<Classifier>,
    caps: ExtractionCaps,
}

impl Extractor {
    pub fn new(classifier: Arc<Classifier>, caps: ExtractionCaps) -> Self {
        Self { classifier, caps }
    }

    pub fn caps(&self) -> ExtractionCaps {
        self.caps
    }

    pub fn with_caps(&self, caps: ExtractionCaps) -> Self {
        Self {
            classifier: self.classifier.clone(),
            caps,
        }
    }

    /// Turn raw markup into article records. Never fails; bad containers are skipped.
    pub fn extract(&self, markup: &str, source: &Source) -> Extraction {
        let scan = Scan::new(markup);
        let all = 0..scan.tags.len();

        let mut containers = Vec::new();
        let mut winner: Option<&HintSet> = None;
        for hints in &source.hint_sets {
            containers = scan.collect(all.clone(), &hints.container_markers, IGNORED_CONTAINER_TAGS);
            if !containers.is_empty() {
                winner = Some(hints);
                break;
            }
        }

        let mut records = Vec::new();
        let mut skipped = 0usize;
        if let Some(hints) = winner {
            for el in &containers {
                if records.len() >= self.caps.structural {
                    break;
                }
                match self.container_record(&scan, el, hints, source) {
                    Ok(rec) => records.push(rec),
                    Err(ContainerSkip::Malformed(why)) => {
                        skipped += 1;
                        warn!(target: "ingest", source = %source.name, reason = why, "container skipped");
                    }
                    Err(why) => {
                        skipped += 1;
                        debug!(target: "ingest", source = %source.name, reason = ?why, "container skipped");
                    }
                }
            }
        }

        if !records.is_empty() {
            return Extraction {
                strategy: Strategy::Structural,
                records,
                containers: containers.len(),
                skipped,
            };
        }

        counter!("ingest_fallback_total").increment(1);
        debug!(
            target: "ingest",
            source = %source.name,
            containers = containers.len(),
            "structural pass empty; scanning headings"
        );
        Extraction {
            strategy: Strategy::HeadingFallback,
            records: self.heading_fallback(&scan, source),
            containers: containers.len(),
            skipped,
        }
    }

    fn container_record(
        &self,
        scan: &Scan,
        el: &Element,
        hints: &HintSet,
        source: &Source,
    ) -> Result<ArticleRecord, ContainerSkip> {
        if el.inner.start > el.inner.end || scan.src.get(el.inner.clone()).is_none() {
            return Err(ContainerSkip::Malformed("container bounds"));
        }
        let scope = el.children.clone();

        // Title: first marker with text, then anchor text.
        let title = hints
            .title_markers
            .iter()
            .find_map(|m| scan.first_text(&scope, m))
            .or_else(|| scan.first_text(&scope, &Marker::tag("a")))
            .map(|(_, text)| text)
            .ok_or(ContainerSkip::NoTitle)?;

        let link = self
            .first_link(scan, el, &hints.link_marker, &source.base_url)
            .unwrap_or_else(|| source.base_url.clone());

        let mut rec = ArticleRecord::new(&title, link, source.name.clone())
            .map_err(ContainerSkip::Title)?;

        let description = hints.description_markers.iter().find_map(|m| {
            scan.first_text(&scope, m)
                .map(|(_, text)| text)
                .filter(|text| text != rec.title())
        });
        if let Some(d) = description {
            // Out-of-bounds descriptions are treated as absent.
            rec = match rec.clone().with_description(&d) {
                Ok(r) => r,
                Err(_) => rec,
            };
        }

        if let Some(date) = self.first_date(scan, &scope, &hints.date_markers) {
            rec = rec.with_published_hint(&date);
        }

        Ok(rec)
    }

    /// First href-bearing link inside the container, or the container itself if it is one.
    fn first_link(&self, scan: &Scan, el: &Element, marker: &Marker, base: &str) -> Option<String> {
        let href_of = |idx: usize| attr_value(&RE_HREF, scan.attrs(&scan.tags[idx]));
        let inner = el
            .children
            .clone()
            .filter(|&i| scan.matches(i, marker))
            .find_map(href_of);
        let href = inner.or_else(|| {
            scan.matches(el.open, marker)
                .then(|| href_of(el.open))
                .flatten()
        })?;
        resolve_link(base, href)
    }

    fn first_date(&self, scan: &Scan, scope: &Range<usize>, markers: &[Marker]) -> Option<String> {
        for m in markers {
            if let Some((_, text)) = scan.first_text(scope, m) {
                return Some(text);
            }
            // <time datetime="..."></time> with no visible text
            let attr = scope.clone().filter(|&i| scan.matches(i, m)).find_map(|i| {
                attr_value(&RE_DATETIME, scan.attrs(&scan.tags[i]))
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
            });
            if let Some(v) = attr {
                return Some(v.to_string());
            }
        }
        None
    }

    fn heading_fallback(&self, scan: &Scan, source: &Source) -> Vec<ArticleRecord> {
        let headings: Vec<Marker> = (1..=6).map(|n| Marker::tag(&format!("h{n}"))).collect();
        let now = Utc::now();
        let mut out = Vec::new();
        for el in scan.collect(0..scan.tags.len(), &headings, &[]) {
            if out.len() >= self.caps.fallback {
                break;
            }
            let Some(text) = scan.text(&el) else {
                continue;
            };
            if !title_in_bounds(&text) || !self.classifier.is_relevant(&text) {
                continue;
            }
            if let Ok(rec) = ArticleRecord::new(&text, source.base_url.clone(), source.name.clone()) {
                out.push(rec.with_extracted_at(now));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SourceRegistry;

    fn source() -> Source {
        Source {
            name: "Test".into(),
            base_url: "https://test.kz/".into(),
            hint_sets: vec![
                HintSet {
                    container_markers: vec![Marker::class("news-item")],
                    title_markers: vec![Marker::tag("h2"), Marker::class("title")],
                    link_marker: Marker::tag("a"),
                    date_markers: vec![Marker::tag("time"), Marker::class("date")],
                    description_markers: vec![Marker::class("excerpt"), Marker::tag("p")],
                },
                HintSet {
                    container_markers: vec![Marker::tag("article")],
                    title_markers: vec![Marker::tag("h3")],
                    link_marker: Marker::tag("a"),
                    date_markers: vec![],
                    description_markers: vec![],
                },
            ],
        }
    }

    fn extractor() -> Extractor {
        Extractor::new(Arc::new(Classifier::default()), ExtractionCaps::SINGLE_SOURCE)
    }

    #[test]
    fn structural_pass_extracts_all_fields() {
        let html = r#"
<div class="news-item">
  <h2><a href="/news/1">Стартап из Алматы привлек инвестиции</a></h2>
  <time datetime="2024-03-12">12 марта 2024</time>
  <div class="excerpt">Раунд &amp; детали сделки</div>
</div>"#;
        let ex = extractor().extract(html, &source());
        assert_eq!(ex.strategy, Strategy::Structural);
        assert_eq!(ex.records.len(), 1);
        let r = &ex.records[0];
        assert_eq!(r.title(), "Стартап из Алматы привлек инвестиции");
        assert_eq!(r.link(), "https://test.kz/news/1");
        assert_eq!(r.published_hint(), Some("12 марта 2024"));
        assert_eq!(r.description(), Some("Раунд & детали сделки"));
        assert_eq!(r.source_name(), "Test");
    }

    #[test]
    fn self_closing_container_does_not_hide_next_sibling() {
        let html = r#"<div class="news-item"/><div class="news-item"><h2>Финтех платформа запущена в Ташкенте</h2></div>"#;
        let scan = Scan::new(html);
        let found = scan.collect(0..scan.tags.len(), &[Marker::class("news-item")], &[]);
        assert_eq!(found.len(), 2);
        let ex = extractor().extract(html, &source());
        assert_eq!(ex.strategy, Strategy::Structural);
        assert_eq!(ex.records.len(), 1);
        assert_eq!(ex.records[0].title(), "Финтех платформа запущена в Ташкенте");
    }

    #[test]
    fn many_unclosed_containers_scan_in_linear_time() {
        let mut html = String::new();
        for i in 0..8000 {
            html.push_str(&format!(
                "<li class=\"news-item\"><h2>Стартап номер {i:05} в Алматы</h2><p>Детали"
            ));
        }
        let t0 = std::time::Instant::now();
        let ex = extractor().extract(&html, &source());
        assert_eq!(ex.records.len(), ExtractionCaps::SINGLE_SOURCE.structural);
        assert_eq!(ex.records[0].title(), "Стартап номер 00000 в Алматы");

        let scan = Scan::new(&html);
        let all = scan.collect(0..scan.tags.len(), &[Marker::class("news-item")], &[]);
        assert_eq!(all.len(), 8000);
        assert!(all.iter().all(|el| el.truncated));
        assert!(
            t0.elapsed() < std::time::Duration::from_secs(5),
            "unclosed scan took {:?}",
            t0.elapsed()
        );
    }

    #[test]
    fn nested_same_name_containers_are_not_cut_short() {
        let html = r#"
<div class="news-item">
  <div class="meta"><span>Tag</span></div>
  <div class="body"><h2>A headline placed after a nested div</h2></div>
</div>"#;
        let ex = extractor().extract(html, &source());
        assert_eq!(ex.records.len(), 1);
        assert_eq!(ex.records[0].title(), "A headline placed after a nested div");
    }

    #[test]
    fn first_hint_set_with_containers_wins() {
        let html = r#"
<article><h3>Only the generic hint set sees this</h3></article>"#;
        let ex = extractor().extract(html, &source());
        assert_eq!(ex.strategy, Strategy::Structural);
        assert_eq!(ex.records[0].title(), "Only the generic hint set sees this");
    }

    #[test]
    fn missing_link_defaults_to_base_and_bad_schemes_are_ignored() {
        let html = r#"
<div class="news-item"><h2>Headline without any anchor</h2></div>
<div class="news-item"><h2>Headline with a script link</h2><a href="javascript:void(0)">x</a></div>"#;
        let ex = extractor().extract(html, &source());
        assert_eq!(ex.records.len(), 2);
        assert!(ex.records.iter().all(|r| r.link() == "https://test.kz/"));
    }

    #[test]
    fn short_or_long_titles_skip_the_container() {
        let long = "x".repeat(201);
        let html = format!(
            r#"<div class="news-item"><h2>Too short</h2></div>
<div class="news-item"><h2>{long}</h2></div>
<div class="news-item"><h2>This one is just right</h2></div>"#
        );
        let ex = extractor().extract(&html, &source());
        assert_eq!(ex.records.len(), 1);
        assert_eq!(ex.skipped, 2);
    }

    #[test]
    fn anchor_text_is_the_title_fallback() {
        let html = r#"<div class="news-item"><a href="https://other.kz/x">Anchor text headline here</a></div>"#;
        let ex = extractor().extract(html, &source());
        assert_eq!(ex.records[0].title(), "Anchor text headline here");
        assert_eq!(ex.records[0].link(), "https://other.kz/x");
    }

    #[test]
    fn oversized_description_is_dropped_not_truncated() {
        let html = format!(
            r#"<div class="news-item"><h2>Headline that is valid</h2><p>{}</p></div>"#,
            "d".repeat(501)
        );
        let ex = extractor().extract(&html, &source());
        assert_eq!(ex.records.len(), 1);
        assert_eq!(ex.records[0].description(), None);
    }

    #[test]
    fn structural_cap_is_enforced_in_order() {
        let html: String = (0..15)
            .map(|i| format!(r#"<div class="news-item"><h2>Headline number {i:02}</h2></div>"#))
            .collect();
        let ex = extractor().extract(&html, &source());
        assert_eq!(ex.records.len(), 10);
        assert_eq!(ex.records[0].title(), "Headline number 00");
        assert_eq!(ex.records[9].title(), "Headline number 09");

        let batch = extractor().with_caps(ExtractionCaps::BATCH).extract(&html, &source());
        assert_eq!(batch.records.len(), 5);
    }

    #[test]
    fn heading_fallback_applies_classifier() {
        let html = r#"
<html><body>
<h1>Hello World</h1>
<h2>Fintech <b>startup</b> opens in Tashkent</h2>
<h3>Short</h3>
</body></html>"#;
        let ex = extractor().extract(html, &source());
        assert_eq!(ex.strategy, Strategy::HeadingFallback);
        assert_eq!(ex.containers, 0);
        assert_eq!(ex.records.len(), 1);
        let r = &ex.records[0];
        assert_eq!(r.title(), "Fintech startup opens in Tashkent");
        assert_eq!(r.link(), "https://test.kz/");
        assert_eq!(r.description(), None);
        assert_eq!(r.published_hint(), None);
    }

    #[test]
    fn fallback_runs_when_containers_yield_nothing() {
        let html = r#"
<div class="news-item"><h2>tiny</h2></div>
<h1>Blockchain conference in Astana</h1>"#;
        let ex = extractor().extract(html, &source());
        assert_eq!(ex.strategy, Strategy::HeadingFallback);
        assert_eq!(ex.containers, 1);
        assert_eq!(ex.records.len(), 1);
    }

    #[test]
    fn scripts_comments_and_body_class_are_ignored() {
        let html = r#"
<body class="news-item-page">
<!-- <div class="news-item"><h2>Commented out headline</h2></div> -->
<script>var s = '<div class="news-item"><h2>Script headline text</h2></div>';</script>
<div class="news-item"><h2>The real visible headline</h2></div>
</body>"#;
        let ex = extractor().extract(html, &source());
        assert_eq!(ex.records.len(), 1);
        assert_eq!(ex.records[0].title(), "The real visible headline");
    }

    #[test]
    fn unclosed_container_is_truncated_at_next_sibling() {
        let html = r#"
<div class="news-item"><h2>First headline, never closed</h2>
<div class="news-item"><h2>Second headline is closed</h2></div>"#;
        let ex = extractor().extract(html, &source());
        let titles: Vec<_> = ex.records.iter().map(|r| r.title().to_string()).collect();
        assert!(titles.contains(&"First headline, never closed".to_string()));
    }

    #[test]
    fn garbage_input_never_panics() {
        let ex = extractor().extract("<<<>>></div><div class=\"news-item\"", &source());
        assert!(ex.records.is_empty());
        let ex = extractor().extract("", &source());
        assert!(ex.records.is_empty());
    }

    #[test]
    fn seed_sources_handle_typical_markup() {
        let reg = SourceRegistry::default_seed();
        let spot = reg.get("Spot.uz").unwrap();
        let html = r#"
<div class="news-card">
  <a class="news-card__link" href="/ru/2024/03/12/ai-lab/">
    <h3 class="news-card__title">В Ташкенте открылась AI-лаборатория</h3>
  </a>
  <span class="news-card__date">12 марта</span>
</div>"#;
        let ex = extractor().extract(html, spot);
        assert_eq!(ex.records.len(), 1);
        assert_eq!(ex.records[0].link(), "https://spot.uz/ru/2024/03/12/ai-lab/");
        assert_eq!(ex.records[0].published_hint(), Some("12 марта"));
    }

    #[test]
    fn resolve_link_rules() {
        let base = "https://x.kz/news/";
        assert_eq!(resolve_link(base, "/a").as_deref(), Some("https://x.kz/a"));
        assert_eq!(resolve_link(base, "b").as_deref(), Some("https://x.kz/news/b"));
        assert_eq!(resolve_link(base, "#top"), None);
        assert_eq!(resolve_link(base, "mailto:a@b.c"), None);
        assert_eq!(
            resolve_link(base, "https://y.kz/?a=1&amp;b=2").as_deref(),
            Some("https://y.kz/?a=1&b=2")
        );
    }
}

// src/ingest/types.rs
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const TITLE_MIN_EXCLUSIVE: usize = 10;
pub const TITLE_MAX: usize = 200;
pub const DESCRIPTION_MAX: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Published,
    Rejected,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Published => "published",
            Status::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Status::Pending),
            "published" | "approved" => Ok(Status::Published),
            "rejected" => Ok(Status::Rejected),
            other => Err(format!("unknown status `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("title length {0} outside (10, 200]")]
    TitleLength(usize),
    #[error("description length {0} outside (0, 500]")]
    DescriptionLength(usize),
}

/// True if the trimmed title length (in chars) is in (10, 200].
pub fn title_in_bounds(title: &str) -> bool {
    let n = title.trim().chars().count();
    n > TITLE_MIN_EXCLUSIVE && n <= TITLE_MAX
}

/// Canonical article record. Built only through `ArticleRecord::new`, so the
/// title bounds always hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleRecord {
    title: String,
    link: String,
    #[serde(rename = "source")]
    source_name: String,
    #[serde(rename = "date")]
    published_hint: Option<String>,
    description: Option<String>,
    #[serde(rename = "timestamp")]
    extracted_at: DateTime<Utc>,
    status: Status,
}

impl ArticleRecord {
    pub fn new(
        title: &str,
        link: impl Into<String>,
        source_name: impl Into<String>,
    ) -> Result<Self, RecordError> {
        let title = title.trim();
        if !title_in_bounds(title) {
            return Err(RecordError::TitleLength(title.chars().count()));
        }
        Ok(Self {
            title: title.to_string(),
            link: link.into(),
            source_name: source_name.into(),
            published_hint: None,
            description: None,
            extracted_at: Utc::now(),
            status: Status::Pending,
        })
    }

    /// Attach a description; empty or over-long text is rejected.
    pub fn with_description(mut self, description: &str) -> Result<Self, RecordError> {
        let d = description.trim();
        let n = d.chars().count();
        if n == 0 || n > DESCRIPTION_MAX {
            return Err(RecordError::DescriptionLength(n));
        }
        self.description = Some(d.to_string());
        Ok(self)
    }

    /// Raw, unparsed date text as found in the markup.
    pub fn with_published_hint(mut self, hint: &str) -> Self {
        let h = hint.trim();
        self.published_hint = (!h.is_empty()).then(|| h.to_string());
        self
    }

    pub fn with_extracted_at(mut self, at: DateTime<Utc>) -> Self {
        self.extracted_at = at;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }
    pub fn link(&self) -> &str {
        &self.link
    }
    pub fn source_name(&self) -> &str {
        &self.source_name
    }
    pub fn published_hint(&self) -> Option<&str> {
        self.published_hint.as_deref()
    }
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
    pub fn extracted_at(&self) -> DateTime<Utc> {
        self.extracted_at
    }
    pub fn status(&self) -> Status {
        self.status
    }

    /// Only the moderation store moves a record out of `Pending`.
    pub(crate) fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    /// Identity used for duplicate detection: (title, source).
    pub fn identity(&self) -> (&str, &str) {
        (&self.title, &self.source_name)
    }
}

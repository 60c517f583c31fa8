// src/relevance.rs
//! Relevance classifier: a permissive, case-insensitive keyword gate.
//!
//! A title is relevant if any vocabulary entry is a substring of the
//! lower-cased title. No stemming, no scoring; a single hit is enough.
//! False positives are expected and left to human moderation.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Short anonymized id for log lines; raw titles stay out of the logs.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Built-in vocabulary: Russian + English tech/startup/investment/AI terms
/// plus regional qualifiers for Kazakhstan, Uzbekistan and neighbours.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    // ru: startups & investment
    "стартап", "стартапы", "инвестиции", "инвестиция", "венчурный", "венчур",
    "акселератор", "инкубатор", "технопарк", "хакатон", "единорог",
    // ru: technology
    "технологии", "технология", "искусственный интеллект", "ИИ", "блокчейн",
    "криптовалюта", "криптовалюты", "финтех", "цифровизация", "цифровая трансформация",
    "IT", "айти", "программирование", "разработка", "софт", "приложение", "приложения",
    "мобильное приложение", "веб-разработка", "данные", "большие данные",
    "машинное обучение", "нейросеть", "нейросети", "автоматизация", "робот", "роботы",
    "инновации", "инновация", "IT-конференция", "цифровая экономика",
    "электронная коммерция", "e-commerce", "онлайн", "платежная система",
    "банковские технологии", "финансовые технологии", "регулятивные технологии",
    "regtech", "suptech", "insurtech", "proptech", "edtech", "healthtech", "agritech",
    "cleantech", "greentech", "умный город", "интернет вещей", "IoT", "5G", "6G",
    "облачные технологии", "облако", "микросервисы", "контейнеризация", "DevOps",
    "кибербезопасность", "защита данных", "персональные данные", "GDPR",
    "электронная подпись", "цифровая идентификация", "биометрия",
    "виртуальная реальность", "VR", "дополненная реальность", "AR", "метавселенная",
    "NFT", "токен", "токены", "DeFi", "Web3",
    // ru: region
    "центральная азия", "казахстан", "узбекистан", "кыргызстан", "таджикистан",
    "туркменистан", "алматы", "астана", "нур-султан", "ташкент", "бишкек", "душанбе",
    "ашхабад",
    // en
    "startup", "startups", "investment", "investments", "technology", "tech",
    "artificial intelligence", "AI", "blockchain", "cryptocurrency", "crypto", "fintech",
    "digitalization", "digital transformation", "programming", "development", "software",
    "application", "apps", "mobile app", "web development", "data", "big data",
    "machine learning", "neural network", "automation", "robot", "robots", "innovation",
    "venture", "accelerator", "incubator", "tech park", "hackathon", "IT conference",
    "digital economy", "online", "payment system", "banking technology",
    "financial technology", "regulatory technology", "smart city", "internet of things",
    "cloud technology", "cloud", "microservices", "containerization", "cybersecurity",
    "data protection", "personal data", "electronic signature", "digital identification",
    "biometrics", "virtual reality", "augmented reality", "metaverse",
    // en: region
    "central asia", "kazakhstan", "uzbekistan", "kyrgyzstan", "tajikistan",
    "turkmenistan", "almaty", "astana", "nur-sultan", "tashkent", "bishkek", "dushanbe",
    "ashgabat",
];

#[derive(Debug, Deserialize)]
struct RelevanceRoot {
    relevance: RelevanceSection,
}

#[derive(Debug, Deserialize)]
struct RelevanceSection {
    keywords: Vec<String>,
    /// Append to the built-in list instead of replacing it.
    #[serde(default)]
    extend_defaults: bool,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    keywords: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS.iter().copied())
    }
}

impl Classifier {
    /// Keywords are lower-cased, trimmed and deduplicated; empties are dropped.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for k in keywords {
            let k = k.as_ref().trim().to_lowercase();
            if !k.is_empty() && !out.contains(&k) {
                out.push(k);
            }
        }
        Self { keywords: out }
    }

    /// Load from a TOML file if given, otherwise use the built-in vocabulary.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!(
                "Failed to read relevance config at {}: {}",
                path.display(),
                e
            )
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let root: RelevanceRoot = toml::from_str(toml_str)?;
        let section = root.relevance;
        let cls = if section.extend_defaults {
            Self::new(
                DEFAULT_KEYWORDS
                    .iter()
                    .map(|s| s.to_string())
                    .chain(section.keywords),
            )
        } else {
            Self::new(section.keywords)
        };
        if cls.keywords.is_empty() {
            anyhow::bail!("relevance vocabulary is empty");
        }
        Ok(cls)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// First vocabulary entry found in `title`, if any.
    pub fn first_hit(&self, title: &str) -> Option<&str> {
        let lower = title.to_lowercase();
        self.keywords
            .iter()
            .find(|k| lower.contains(k.as_str()))
            .map(|k| k.as_str())
    }

    pub fn is_relevant(&self, title: &str) -> bool {
        match self.first_hit(title) {
            Some(hit) => {
                debug!(target: "relevance", id = %anon_hash(title), keyword = hit, "hit");
                true
            }
            None => {
                debug!(target: "relevance", id = %anon_hash(title), "miss");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn russian_keyword_hits_case_insensitively() {
        let c = Classifier::default();
        assert!(c.is_relevant("Стартап из Алматы привлек инвестиции"));
        assert_eq!(
            c.first_hit("ИНВЕСТИЦИИ в регион"),
            Some("инвестиции"),
        );
    }

    #[test]
    fn english_and_acronyms_hit() {
        let c = Classifier::default();
        assert!(c.is_relevant("New AI lab opens"));
        assert!(c.is_relevant("Fintech weekly roundup"));
    }

    #[test]
    fn unrelated_titles_miss() {
        let c = Classifier::default();
        assert!(!c.is_relevant("Hello World"));
        assert!(!c.is_relevant("Погода на выходные будет солнечной"));
    }

    #[test]
    fn vocabulary_is_normalized_and_deduped() {
        let c = Classifier::new(["  Tech ", "tech", "", "ИИ"]);
        assert_eq!(c.keywords(), &["tech".to_string(), "ии".to_string()]);
    }

    #[test]
    fn toml_replace_and_extend() {
        let only = Classifier::from_toml_str(
            r#"
[relevance]
keywords = ["quantum"]
"#,
        )
        .unwrap();
        assert!(only.is_relevant("Quantum chips arrive"));
        assert!(!only.is_relevant("Startup raises seed"));

        let extended = Classifier::from_toml_str(
            r#"
[relevance]
keywords = ["quantum"]
extend_defaults = true
"#,
        )
        .unwrap();
        assert!(extended.is_relevant("Startup raises seed"));
        assert!(extended.is_relevant("Quantum chips arrive"));
    }

    #[test]
    fn empty_vocabulary_is_rejected() {
        assert!(Classifier::from_toml_str("[relevance]\nkeywords = []\n").is_err());
    }

    #[test]
    fn anon_hash_is_short_and_stable() {
        let a = anon_hash("same");
        assert_eq!(a.len(), 12);
        assert_eq!(a, anon_hash("same"));
        assert_ne!(a, anon_hash("other"));
    }
}

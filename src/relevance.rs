//! Keyword relevance filtering.
//!
//! Matching is case-insensitive substring containment. An empty keyword set
//! disables filtering: everything matches and nothing is tagged.

use itertools::Itertools;

/// Tag list used by the original Al Hurra collection runs.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "حماس", "إسرائيل", "اسرائيل", "الفلسطينيين", "نتنياهو", "غزة", "أسرى",
    "الاحتلال", "فلسطينية", "الإسرائيلي", "استشهاد", "الجيش الإسرائيلي",
    "المقاومة", "المقاومة الإسلامية", "سرايا القدس", "القسام", "طوفان الأقصى",
    "الفلسطينية", "الإسرائيلية", "أبو عبيدة", "عبيدة", "مقاطعة", "المقاطعة",
    "سوريا", "بشار", "الأسد", "السوريين", "السورية",
    "دونالد", "ترامب", "أميركا", "الرئاسة الأميركية", "انتخابات", "الأميركية",
    "الانتخابات", "الولايات المتحدة", "ولاية ثانية", "الانتخابات الأميركية",
    "الأميركي", "الانتخابية", "الرئاسية", "التصويت", "المرشح", "الولاية", "الرئيس",
    "حرائق", "كاليفورنيا", "الغابات", "نيران", "اندلاع حرائق", "الحرائق",
    "لوس أنجلوس", "لوس", "أنجلوس", "للحرائق", "الخسائر", "للحرق", "الرياح القوية",
];

/// An immutable, ordered keyword set.
#[derive(Debug, Clone, Default)]
pub struct RelevanceFilter {
    /// (original, lowercased) pairs in configuration order.
    keywords: Vec<(String, String)>,
}

impl RelevanceFilter {
    /// Blank entries are ignored and repeats keep their first position.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| {
                let k: String = k.into();
                k.trim().to_string()
            })
            .filter(|k| !k.is_empty())
            .unique()
            .map(|k| {
                let lowered = k.to_lowercase();
                (k, lowered)
            })
            .collect();
        Self { keywords }
    }

    /// False when the set is empty and every title passes.
    pub fn is_enabled(&self) -> bool {
        !self.keywords.is_empty()
    }

    /// Number of distinct keywords.
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    /// Whether `text` contains any keyword, ignoring case.
    ///
    /// # Arguments
    ///
    /// * `text` - Usually a listing title
    ///
    /// # Returns
    ///
    /// `true` on the first hit, or always when the filter is disabled.
    pub fn matches(&self, text: &str) -> bool {
        if !self.is_enabled() {
            return true;
        }
        let text = text.to_lowercase();
        self.keywords.iter().any(|(_, k)| text.contains(k.as_str()))
    }

    /// Keywords found in `text`, in keyword-list order.
    pub fn matched_keywords(&self, text: &str) -> Vec<String> {
        let text = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|(_, k)| text.contains(k.as_str()))
            .map(|(original, _)| original.clone())
            .collect()
    }
}

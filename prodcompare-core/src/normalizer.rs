//! Spec normalizer: turns free-text specification values into comparable numbers.
//!
//! The attribute label picks an extraction category by keyword (checked in a
//! fixed priority order, first match wins) and the category's pattern pulls a
//! leading number plus unit out of the value. Units are folded into one base
//! unit per category: GB for memory, Hz for frequency.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::RulesConfig;
use crate::types::UNKNOWN_VALUE;

/// Extraction category selected by an attribute label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecCategory {
    Memory,
    Camera,
    Battery,
    Time,
    Weight,
    Screen,
    Frequency,
    Charging,
    Rating,
}

impl SpecCategory {
    /// Matching priority. A label containing keywords of several categories
    /// resolves to the earliest one in this list.
    pub const PRIORITY: [SpecCategory; 9] = [
        SpecCategory::Memory,
        SpecCategory::Camera,
        SpecCategory::Battery,
        SpecCategory::Time,
        SpecCategory::Weight,
        SpecCategory::Screen,
        SpecCategory::Frequency,
        SpecCategory::Charging,
        SpecCategory::Rating,
    ];

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "memory" => Some(SpecCategory::Memory),
            "camera" => Some(SpecCategory::Camera),
            "battery" => Some(SpecCategory::Battery),
            "time" => Some(SpecCategory::Time),
            "weight" => Some(SpecCategory::Weight),
            "screen" => Some(SpecCategory::Screen),
            "frequency" => Some(SpecCategory::Frequency),
            "charging" => Some(SpecCategory::Charging),
            "rating" => Some(SpecCategory::Rating),
            _ => None,
        }
    }
}

impl std::fmt::Display for SpecCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SpecCategory::Memory => "memory",
            SpecCategory::Camera => "camera",
            SpecCategory::Battery => "battery",
            SpecCategory::Time => "time",
            SpecCategory::Weight => "weight",
            SpecCategory::Screen => "screen",
            SpecCategory::Frequency => "frequency",
            SpecCategory::Charging => "charging",
            SpecCategory::Rating => "rating",
        };
        write!(f, "{name}")
    }
}

const NUMBER: &str = r"(\d+(?:[.,]\d+)?)";

struct ExtractionPatterns {
    memory: Regex,
    camera: Regex,
    battery: Regex,
    time: Regex,
    weight: Regex,
    screen: Regex,
    frequency: Regex,
    charging: Regex,
    decimal: Regex,
}

impl ExtractionPatterns {
    fn compile() -> Self {
        let unit = |suffix: &str| {
            Regex::new(&format!(r"(?i){NUMBER}\s*{suffix}")).expect("static extraction pattern")
        };
        Self {
            memory: unit("(ГБ|GB|ТБ|TB)"),
            camera: unit("Мп"),
            battery: unit("мАч"),
            time: unit("час"),
            weight: unit("г"),
            screen: unit("\""),
            frequency: unit("(кГц|kHz|Гц|Hz)"),
            charging: unit("мин"),
            decimal: Regex::new(NUMBER).expect("static extraction pattern"),
        }
    }
}

static PATTERNS: LazyLock<ExtractionPatterns> = LazyLock::new(ExtractionPatterns::compile);

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse::<f64>().ok()
}

/// Number captured by `pattern` in group 1, with the optional unit in group 2.
fn capture<'v>(pattern: &Regex, value: &'v str) -> Option<(f64, Option<&'v str>)> {
    let caps = pattern.captures(value)?;
    let number = parse_number(caps.get(1)?.as_str())?;
    Some((number, caps.get(2).map(|m| m.as_str())))
}

/// Extracts comparable magnitudes from specification values.
#[derive(Debug, Clone)]
pub struct SpecNormalizer {
    /// Lowercased keywords per category, in priority order.
    keywords: Vec<(SpecCategory, Vec<String>)>,
    /// Lowercased directionality labels; the fallback allow-list.
    comparable: Vec<String>,
}

impl SpecNormalizer {
    pub fn new(rules: &RulesConfig) -> Self {
        let keywords = rules
            .keywords
            .iter()
            .filter_map(|(name, words)| {
                let category = SpecCategory::from_name(name)?;
                let words = words.iter().map(|w| w.to_lowercase()).collect();
                Some((category, words))
            })
            .collect();
        let comparable = rules
            .higher_is_better
            .iter()
            .chain(&rules.lower_is_better)
            .map(|label| label.to_lowercase())
            .collect();
        Self {
            keywords,
            comparable,
        }
    }

    /// The first category, in priority order, whose keyword occurs in `label`.
    pub fn category_for(&self, label: &str) -> Option<SpecCategory> {
        let label = label.to_lowercase();
        self.keywords
            .iter()
            .find(|(_, words)| words.iter().any(|w| label.contains(w.as_str())))
            .map(|(category, _)| *category)
    }

    /// Whether `label` appears in either directionality list.
    pub fn is_comparable(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.comparable.iter().any(|c| label.contains(c.as_str()))
    }

    /// Extract a numeric magnitude for `value` under attribute `label`.
    ///
    /// Returns `None` when the value is the unknown sentinel, when the label's
    /// category pattern does not match, or when the label has no category and
    /// is not in the comparable allow-list.
    pub fn extract(&self, label: &str, value: &str) -> Option<f64> {
        let value = value.trim();
        if value.is_empty() || value == UNKNOWN_VALUE {
            return None;
        }

        let patterns = &*PATTERNS;
        let Some(category) = self.category_for(label) else {
            if self.is_comparable(label) {
                return capture(&patterns.decimal, value).map(|(n, _)| n);
            }
            return None;
        };

        let extracted = match category {
            SpecCategory::Memory => capture(&patterns.memory, value).map(|(n, unit)| {
                let unit = unit.unwrap_or_default().to_lowercase();
                if unit == "тб" || unit == "tb" {
                    n * 1024.0
                } else {
                    n
                }
            }),
            SpecCategory::Frequency => capture(&patterns.frequency, value).map(|(n, unit)| {
                let unit = unit.unwrap_or_default().to_lowercase();
                if unit == "кгц" || unit == "khz" {
                    n * 1000.0
                } else {
                    n
                }
            }),
            SpecCategory::Camera => capture(&patterns.camera, value).map(|(n, _)| n),
            SpecCategory::Battery => capture(&patterns.battery, value).map(|(n, _)| n),
            SpecCategory::Time => capture(&patterns.time, value).map(|(n, _)| n),
            SpecCategory::Weight => capture(&patterns.weight, value).map(|(n, _)| n),
            SpecCategory::Screen => capture(&patterns.screen, value).map(|(n, _)| n),
            SpecCategory::Charging => capture(&patterns.charging, value).map(|(n, _)| n),
            SpecCategory::Rating => capture(&patterns.decimal, value).map(|(n, _)| n),
        };

        if extracted.is_none() {
            tracing::trace!(label, value, %category, "spec value not extractable");
        }
        extracted
    }
}

impl Default for SpecNormalizer {
    fn default() -> Self {
        Self::new(&RulesConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> SpecNormalizer {
        SpecNormalizer::default()
    }

    #[test]
    fn test_memory_gb_and_tb() {
        let n = normalizer();
        assert_eq!(n.extract("Встроенная память", "512 ГБ"), Some(512.0));
        assert_eq!(n.extract("Встроенная память", "1 ТБ"), Some(1024.0));
        assert_eq!(n.extract("Оперативная память", "8GB"), Some(8.0));
        assert_eq!(n.extract("Оперативная память", "2 tb"), Some(2048.0));
    }

    #[test]
    fn test_memory_without_unit_is_not_extractable() {
        let n = normalizer();
        assert_eq!(n.extract("Встроенная память", "много"), None);
        assert_eq!(n.extract("Встроенная память", "256"), None);
    }

    #[test]
    fn test_camera_battery_time_charging() {
        let n = normalizer();
        assert_eq!(n.extract("Камера", "48 Мп + 12 Мп"), Some(48.0));
        assert_eq!(n.extract("Батарея", "5000 мАч"), Some(5000.0));
        assert_eq!(n.extract("Время работы", "до 30 часов"), Some(30.0));
        assert_eq!(n.extract("Быстрая зарядка", "65 Вт, 30 мин"), Some(30.0));
    }

    #[test]
    fn test_weight_in_grams() {
        let n = normalizer();
        assert_eq!(n.extract("Вес", "187 г"), Some(187.0));
        assert_eq!(n.extract("Вес", "1.2 кг"), None);
    }

    #[test]
    fn test_screen_inches() {
        let n = normalizer();
        assert_eq!(n.extract("Диагональ экрана", "6.1\""), Some(6.1));
        assert_eq!(n.extract("Диагональ экрана", "6,7 \" OLED"), Some(6.7));
        assert_eq!(n.extract("Диагональ экрана", "6.1 дюйма"), None);
    }

    #[test]
    fn test_frequency_hz_and_khz() {
        let n = normalizer();
        assert_eq!(n.extract("Частотный диапазон", "20 кГц"), Some(20_000.0));
        assert_eq!(n.extract("Частотный диапазон", "20-20000 Гц"), Some(20_000.0));
        assert_eq!(n.extract("Частотный диапазон", "40 kHz"), Some(40_000.0));
        assert_eq!(n.extract("Частотный диапазон", "100 Hz"), Some(100.0));
    }

    #[test]
    fn test_rating_any_decimal() {
        let n = normalizer();
        assert_eq!(n.extract("Рейтинг", "4.5"), Some(4.5));
        assert_eq!(n.extract("Рейтинг", "оценка 3"), Some(3.0));
    }

    #[test]
    fn test_unknown_sentinel_is_not_extractable() {
        let n = normalizer();
        assert_eq!(n.extract("Батарея", UNKNOWN_VALUE), None);
        assert_eq!(n.extract("Цена", ""), None);
    }

    #[test]
    fn test_fallback_for_comparable_labels() {
        let n = normalizer();
        // "Цена" has no category keyword but is in the lower-is-better list.
        assert_eq!(n.category_for("Цена"), None);
        assert_eq!(n.extract("Цена", "10000"), Some(10_000.0));
    }

    #[test]
    fn test_non_comparable_label_is_not_extractable() {
        let n = normalizer();
        assert_eq!(n.extract("Процессор", "8 ядер"), None);
        assert_eq!(n.extract("Цвет", "42"), None);
    }

    #[test]
    fn test_label_matching_is_case_insensitive() {
        let n = normalizer();
        assert_eq!(n.category_for("ВСТРОЕННАЯ ПАМЯТЬ"), Some(SpecCategory::Memory));
        assert_eq!(n.category_for("основная камера"), Some(SpecCategory::Camera));
    }

    #[test]
    fn test_priority_order_first_match_wins() {
        let n = normalizer();
        // Contains both "время" (time) and "зарядка" (charging); time wins.
        assert_eq!(
            n.category_for("Время: быстрая зарядка"),
            Some(SpecCategory::Time)
        );
        // Memory outranks everything.
        assert_eq!(
            n.category_for("Память камеры"),
            Some(SpecCategory::Memory)
        );
        // Recognized category with a non-matching value does not fall through.
        assert_eq!(n.extract("Время: быстрая зарядка", "30 мин"), None);
    }

    #[test]
    fn test_custom_keywords() {
        let mut rules = RulesConfig::default();
        rules.keywords.battery.push("battery".into());
        let n = SpecNormalizer::new(&rules);
        assert_eq!(n.extract("Battery capacity", "4500 мАч"), Some(4500.0));
    }
}

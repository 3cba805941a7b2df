//! Table builder: assembles the comparison rows for a comparison set.
//!
//! Built-in rows come first in a fixed order (image, name, brand, price,
//! rating, stock), followed by one row per specification label in
//! first-discovery order. Difference flags are computed from the rendered
//! values, independently of ranking.

use std::collections::HashSet;

use crate::config::RulesConfig;
use crate::ranking::{RankEngine, classify_stock};
use crate::types::{Classification, ComparisonRow, ComparisonSet, Product, RowKind};

/// Display label of the price row; also the label ranked for price.
pub const PRICE_LABEL: &str = "Цена";
/// Display label of the rating row; also the label ranked for rating.
pub const RATING_LABEL: &str = "Рейтинг";

const IMAGE_LABEL: &str = "Изображение";
const NAME_LABEL: &str = "Название";
const BRAND_LABEL: &str = "Бренд";
const STOCK_LABEL: &str = "В наличии";

/// Rendered in-stock status.
pub fn stock_label(in_stock: bool) -> &'static str {
    if in_stock { "Да" } else { "Нет" }
}

/// Render a price in rubles with space-grouped thousands, e.g. `"10 000 ₽"`.
///
/// Kopecks are shown only when present, with a comma separator.
pub fn format_price(price: f64) -> String {
    let cents = (price * 100.0).round() as i64;
    let whole = (cents / 100).unsigned_abs().to_string();
    let fraction = (cents % 100).unsigned_abs();

    let mut out = String::with_capacity(whole.len() + 8);
    if cents < 0 {
        out.push('-');
    }
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    if fraction != 0 {
        out.push(',');
        out.push_str(format!("{fraction:02}").trim_end_matches('0'));
    }
    out.push_str(" ₽");
    out
}

fn is_different(values: &[String]) -> bool {
    values.iter().collect::<HashSet<_>>().len() > 1
}

/// Builds comparison rows with rank classifications.
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    engine: RankEngine,
}

impl TableBuilder {
    pub fn new(rules: &RulesConfig) -> Self {
        Self {
            engine: RankEngine::new(rules),
        }
    }

    pub fn with_engine(engine: RankEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &RankEngine {
        &self.engine
    }

    /// Build the rows for `set`, optionally dropping rows whose values are
    /// all identical. Image and name rows survive the filter.
    pub fn build(&self, set: &ComparisonSet, hide_identical: bool) -> Vec<ComparisonRow> {
        let rows = self.build_rows(set.products());
        let total = rows.len();
        let rows = if hide_identical {
            filter_identical(rows)
        } else {
            rows
        };
        tracing::debug!(
            products = set.len(),
            rows = rows.len(),
            hidden = total - rows.len(),
            "comparison table built"
        );
        rows
    }

    /// Build every row for `products` without filtering.
    pub fn build_rows(&self, products: &[Product]) -> Vec<ComparisonRow> {
        if products.is_empty() {
            return Vec::new();
        }

        let neutral = vec![Classification::Neutral; products.len()];
        let mut rows = Vec::new();

        rows.push(ComparisonRow {
            key: "image".into(),
            label: IMAGE_LABEL.into(),
            kind: RowKind::Image,
            values: products
                .iter()
                .map(|p| p.primary_image().to_string())
                .collect(),
            is_different: false,
            classifications: neutral.clone(),
        });

        let names: Vec<String> = products.iter().map(|p| p.name.clone()).collect();
        rows.push(ComparisonRow {
            key: "name".into(),
            label: NAME_LABEL.into(),
            kind: RowKind::Name,
            is_different: is_different(&names),
            values: names,
            classifications: neutral.clone(),
        });

        let brands: Vec<String> = products.iter().map(|p| p.brand.clone()).collect();
        rows.push(ComparisonRow {
            key: "brand".into(),
            label: BRAND_LABEL.into(),
            kind: RowKind::Brand,
            is_different: is_different(&brands),
            values: brands,
            classifications: neutral,
        });

        let raw_prices: Vec<String> = products.iter().map(|p| p.price.to_string()).collect();
        let prices: Vec<String> = products.iter().map(|p| format_price(p.price)).collect();
        rows.push(ComparisonRow {
            key: "price".into(),
            label: PRICE_LABEL.into(),
            kind: RowKind::Price,
            is_different: is_different(&prices),
            classifications: self.engine.classify(PRICE_LABEL, &raw_prices),
            values: prices,
        });

        let ratings: Vec<String> = products.iter().map(|p| p.rating.to_string()).collect();
        rows.push(ComparisonRow {
            key: "rating".into(),
            label: RATING_LABEL.into(),
            kind: RowKind::Rating,
            is_different: is_different(&ratings),
            classifications: self.engine.classify(RATING_LABEL, &ratings),
            values: ratings,
        });

        let statuses: Vec<bool> = products.iter().map(|p| p.in_stock).collect();
        let stock: Vec<String> = statuses
            .iter()
            .map(|s| stock_label(*s).to_string())
            .collect();
        rows.push(ComparisonRow {
            key: "inStock".into(),
            label: STOCK_LABEL.into(),
            kind: RowKind::InStock,
            is_different: is_different(&stock),
            classifications: classify_stock(&statuses),
            values: stock,
        });

        for label in crate::types::spec_labels(products) {
            let values: Vec<String> = products
                .iter()
                .map(|p| p.spec_or_unknown(&label).to_string())
                .collect();
            rows.push(ComparisonRow {
                key: label.clone(),
                is_different: is_different(&values),
                classifications: self.engine.classify(&label, &values),
                label,
                kind: RowKind::Specification,
                values,
            });
        }

        rows
    }
}

/// Drop rows whose values are all identical, keeping the anchor rows.
pub fn filter_identical(rows: Vec<ComparisonRow>) -> Vec<ComparisonRow> {
    rows.into_iter()
        .filter(|row| row.is_different || row.kind.is_anchor())
        .collect()
}

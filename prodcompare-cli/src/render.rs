//! Plain-text rendering for the terminal.
//!
//! Column widths are measured with `unicode-width` so Cyrillic labels and the
//! ruble sign line up.

use chrono::{DateTime, Utc};
use prodcompare_core::table::format_price;
use prodcompare_core::{Classification, Comment, ComparisonRow, Product, RowKind};
use unicode_width::UnicodeWidthStr;

const BEST_MARK: &str = "▲";
const WORST_MARK: &str = "▼";
const COLUMN_GAP: &str = "  ";

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(UnicodeWidthStr::width(text));
    format!("{text}{}", " ".repeat(fill))
}

fn cell(value: &str, class: Classification) -> String {
    match class {
        Classification::Best => format!("{value} {BEST_MARK}"),
        Classification::Worst => format!("{value} {WORST_MARK}"),
        Classification::Neutral => value.to_string(),
    }
}

/// Render comparison rows as an aligned table. The image row is omitted.
pub fn comparison_table(rows: &[ComparisonRow]) -> String {
    let rows: Vec<&ComparisonRow> = rows.iter().filter(|r| r.kind != RowKind::Image).collect();
    let Some(first) = rows.first() else {
        return String::new();
    };
    let columns = first.values.len();

    let cells: Vec<(String, Vec<String>)> = rows
        .iter()
        .map(|row| {
            let marker = if row.is_different { "*" } else { " " };
            let values = row
                .values
                .iter()
                .zip(&row.classifications)
                .map(|(v, c)| cell(v, *c))
                .collect();
            (format!("{marker} {}", row.label), values)
        })
        .collect();

    let label_width = cells
        .iter()
        .map(|(label, _)| UnicodeWidthStr::width(label.as_str()))
        .max()
        .unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            cells
                .iter()
                .filter_map(|(_, values)| values.get(i))
                .map(|v| UnicodeWidthStr::width(v.as_str()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for (label, values) in &cells {
        let mut line = pad(label, label_width);
        for (value, width) in values.iter().zip(&widths) {
            line.push_str(COLUMN_GAP);
            line.push_str(&pad(value, *width));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out.push_str(&format!(
        "\n* differs   {BEST_MARK} best   {WORST_MARK} worst\n"
    ));
    out
}

/// One line per product: id, name, brand, price, stock.
pub fn product_list(products: &[&Product]) -> String {
    let id_width = products
        .iter()
        .map(|p| UnicodeWidthStr::width(p.id.as_str()))
        .max()
        .unwrap_or(0);
    let name_width = products
        .iter()
        .map(|p| UnicodeWidthStr::width(p.name.as_str()))
        .max()
        .unwrap_or(0);

    products
        .iter()
        .map(|p| {
            let stock = if p.in_stock { "" } else { "  (нет в наличии)" };
            format!(
                "{}{COLUMN_GAP}{}{COLUMN_GAP}{} · {}{stock}\n",
                pad(&p.id, id_width),
                pad(&p.name, name_width),
                p.brand,
                format_price(p.price),
            )
        })
        .collect()
}

pub fn comment_list(comments: &[&Comment]) -> String {
    comments
        .iter()
        .map(|c| {
            let when = DateTime::<Utc>::from_timestamp_millis(c.timestamp)
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            format!(
                "[{}] {} {}/5 {when}\n    {}\n",
                c.id, c.author, c.rating, c.text
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use prodcompare_core::TableBuilder;
    use prodcompare_core::types::ComparisonSet;
    use std::collections::BTreeMap;

    fn product(id: &str, name: &str, price: f64) -> Product {
        Product {
            id: id.into(),
            name: name.into(),
            brand: "Brand".into(),
            category: "Category".into(),
            price,
            rating: 4.5,
            review_count: 0,
            in_stock: true,
            description: String::new(),
            images: vec![],
            specifications: BTreeMap::new(),
        }
    }

    #[test]
    fn test_pad_uses_display_width() {
        assert_eq!(pad("Цена", 6), "Цена  ");
        assert_eq!(pad("long text", 3), "long text");
    }

    #[test]
    fn test_comparison_table_marks_best_and_worst() {
        let set =
            ComparisonSet::new(vec![product("a", "A", 100.0), product("b", "B", 200.0)]).unwrap();
        let rows = TableBuilder::default().build(&set, true);
        let text = comparison_table(&rows);
        let price_line = text.lines().find(|l| l.contains("Цена")).unwrap();
        assert!(price_line.starts_with('*'));
        assert!(price_line.contains("100 ₽ ▲"));
        assert!(price_line.contains("200 ₽ ▼"));
        assert!(!text.contains("placeholder"));
    }

    #[test]
    fn test_comparison_table_empty() {
        assert_eq!(comparison_table(&[]), "");
    }

    #[test]
    fn test_product_list_aligns_names() {
        let a = product("1", "Короткое", 1_000.0);
        let b = product("22", "Длинное название", 2_000.0);
        let text = product_list(&[&a, &b]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0].find("Brand").map(|i| lines[0][..i].chars().count()),
            lines[1].find("Brand").map(|i| lines[1][..i].chars().count())
        );
    }
}

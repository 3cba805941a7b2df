//! Export adapter: serializes a comparison set to JSON or CSV.
//!
//! Encoding is pure; delivery goes through the [`ExportSink`] port and user
//! feedback through the [`Notifier`] port, so the engine never touches the
//! file system or a UI directly.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ExportError;
use crate::persistence::atomic_write;
use crate::table::stock_label;
use crate::types::{Product, spec_labels};

/// Source tag written into JSON export metadata.
pub const EXPORT_SOURCE: &str = "ProductCompare";

const CSV_BOM: &str = "\u{FEFF}";

const CSV_HEADERS: [&str; 8] = [
    "Название",
    "Бренд",
    "Категория",
    "Цена (₽)",
    "Рейтинг",
    "Количество отзывов",
    "В наличии",
    "Описание",
];

/// Supported export encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    /// Download file name, e.g. `comparison-2024-05-01.csv`.
    pub fn file_name(self, date: NaiveDate) -> String {
        format!("comparison-{}.{}", date.format("%Y-%m-%d"), self.extension())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(ExportError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportMetadata {
    export_date: String,
    products_count: usize,
    source: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportedProduct<'a> {
    id: &'a str,
    name: &'a str,
    brand: &'a str,
    category: &'a str,
    #[serde(serialize_with = "serialize_number")]
    price: f64,
    #[serde(serialize_with = "serialize_number")]
    rating: f64,
    review_count: u32,
    in_stock: bool,
    description: &'a str,
    specifications: &'a BTreeMap<String, String>,
}

/// Whole numbers are written without a fractional part (`10000`, not `10000.0`).
fn serialize_number<S: serde::Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    const EXACT_LIMIT: f64 = 9_007_199_254_740_992.0;
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= EXACT_LIMIT {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

#[derive(Debug, Serialize)]
struct ExportDocument<'a> {
    metadata: ExportMetadata,
    products: Vec<ExportedProduct<'a>>,
}

/// Pretty-printed JSON document with export metadata and core product fields.
pub fn to_json(products: &[Product], exported_at: DateTime<Utc>) -> Result<String, ExportError> {
    let document = ExportDocument {
        metadata: ExportMetadata {
            export_date: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            products_count: products.len(),
            source: EXPORT_SOURCE,
        },
        products: products
            .iter()
            .map(|p| ExportedProduct {
                id: &p.id,
                name: &p.name,
                brand: &p.brand,
                category: &p.category,
                price: p.price,
                rating: p.rating,
                review_count: p.review_count,
                in_stock: p.in_stock,
                description: &p.description,
                specifications: &p.specifications,
            })
            .collect(),
    };
    serde_json::to_string_pretty(&document).map_err(|e| ExportError::Encode {
        message: e.to_string(),
    })
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// CSV with a UTF-8 byte-order mark, a fixed header plus one column per
/// discovered specification label, and one row per product.
pub fn to_csv(products: &[Product]) -> String {
    let labels = spec_labels(products);

    let mut header: Vec<String> = CSV_HEADERS.iter().map(|h| h.to_string()).collect();
    header.extend(labels.iter().cloned());

    let mut lines = vec![header.join(",")];
    for p in products {
        let mut fields = vec![
            quote(&p.name),
            quote(&p.brand),
            quote(&p.category),
            p.price.to_string(),
            p.rating.to_string(),
            p.review_count.to_string(),
            stock_label(p.in_stock).to_string(),
            quote(&p.description),
        ];
        fields.extend(labels.iter().map(|label| {
            quote(p.specifications.get(label).map(String::as_str).unwrap_or(""))
        }));
        lines.push(fields.join(","));
    }

    format!("{CSV_BOM}{}", lines.join("\n"))
}

/// Encode `products` in `format`.
pub fn encode(
    products: &[Product],
    format: ExportFormat,
    exported_at: DateTime<Utc>,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => to_json(products, exported_at),
        ExportFormat::Csv => Ok(to_csv(products)),
    }
}

/// Destination for encoded exports (a download, a file, a buffer).
pub trait ExportSink: Send + Sync {
    /// Deliver `content` under `file_name`, returning where it ended up.
    fn deliver(&self, file_name: &str, content: &[u8]) -> Result<PathBuf, ExportError>;
}

/// User-facing feedback channel for export outcomes.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Writes exports atomically into a directory.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ExportSink for DirectorySink {
    fn deliver(&self, file_name: &str, content: &[u8]) -> Result<PathBuf, ExportError> {
        let path = self.dir.join(file_name);
        atomic_write(&path, content).map_err(|e| ExportError::Delivery {
            file_name: file_name.to_string(),
            message: e.to_string(),
        })?;
        Ok(path)
    }
}

/// Notifier that reports through `tracing`.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }
}

/// Result of a delivered export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReceipt {
    pub file_name: String,
    pub location: PathBuf,
    pub format: ExportFormat,
    pub products: usize,
}

/// Encodes, delivers, and reports a comparison export.
pub struct Exporter {
    sink: Arc<dyn ExportSink>,
    notifier: Arc<dyn Notifier>,
}

impl Exporter {
    pub fn new(sink: Arc<dyn ExportSink>, notifier: Arc<dyn Notifier>) -> Self {
        Self { sink, notifier }
    }

    /// Export the unfiltered product set at the current time.
    pub fn export(
        &self,
        products: &[Product],
        format: ExportFormat,
    ) -> Result<ExportReceipt, ExportError> {
        self.export_at(products, format, Utc::now())
    }

    /// Export the unfiltered product set with an explicit timestamp.
    pub fn export_at(
        &self,
        products: &[Product],
        format: ExportFormat,
        exported_at: DateTime<Utc>,
    ) -> Result<ExportReceipt, ExportError> {
        let file_name = format.file_name(exported_at.date_naive());
        let result = encode(products, format, exported_at)
            .and_then(|content| self.sink.deliver(&file_name, content.as_bytes()));

        match result {
            Ok(location) => {
                self.notifier
                    .success(&format!("Файл {file_name} успешно загружен!"));
                Ok(ExportReceipt {
                    file_name,
                    location,
                    format,
                    products: products.len(),
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, %format, "export failed");
                self.notifier.error("Ошибка при экспорте данных");
                Err(e)
            }
        }
    }
}

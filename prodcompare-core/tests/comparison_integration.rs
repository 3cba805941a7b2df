//! End-to-end comparison flows: catalog → selection → table → export.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;

use prodcompare_core::export::ExportSink;
use prodcompare_core::{
    Catalog, Classification, ComparisonRow, ComparisonSet, DirectorySink, ExportFormat, Exporter,
    InMemoryStore, JsonDirStore, Notifier, Product, RowKind, SelectionStore, SharedStore,
    TableBuilder, UNKNOWN_VALUE,
};

fn product(id: &str, name: &str, price: f64, rating: f64, specs: &[(&str, &str)]) -> Product {
    Product {
        id: id.into(),
        name: name.into(),
        brand: "Brand".into(),
        category: "Смартфоны".into(),
        price,
        rating,
        review_count: 10,
        in_stock: true,
        description: String::new(),
        images: vec![],
        specifications: specs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>(),
    }
}

fn row<'a>(rows: &'a [ComparisonRow], label: &str) -> &'a ComparisonRow {
    rows.iter()
        .find(|r| r.label == label)
        .unwrap_or_else(|| panic!("row {label} missing"))
}

#[derive(Default)]
struct Recorder {
    messages: Mutex<Vec<String>>,
}

impl Notifier for Recorder {
    fn success(&self, message: &str) {
        self.messages.lock().unwrap().push(format!("ok: {message}"));
    }

    fn error(&self, message: &str) {
        self.messages.lock().unwrap().push(format!("err: {message}"));
    }
}

#[test]
fn storage_units_are_normalized_before_ranking() {
    let set = ComparisonSet::new(vec![
        product("1", "Big", 1.0, 4.0, &[("Встроенная память", "1 ТБ")]),
        product("2", "Small", 1.0, 4.0, &[("Встроенная память", "512 ГБ")]),
    ])
    .unwrap();
    let rows = TableBuilder::default().build(&set, false);
    assert_eq!(
        row(&rows, "Встроенная память").classifications,
        vec![Classification::Best, Classification::Worst]
    );
}

#[test]
fn stock_is_ranked_only_when_mixed() {
    let mut out = product("3", "Out", 1.0, 4.0, &[]);
    out.in_stock = false;
    let set = ComparisonSet::new(vec![
        product("1", "A", 1.0, 4.0, &[]),
        product("2", "B", 1.0, 4.0, &[]),
        out,
    ])
    .unwrap();
    let rows = TableBuilder::default().build(&set, false);
    let stock = row(&rows, "В наличии");
    assert_eq!(
        stock.classifications,
        vec![
            Classification::Best,
            Classification::Best,
            Classification::Worst
        ]
    );
    assert_eq!(stock.values, vec!["Да", "Да", "Нет"]);
}

#[test]
fn price_and_rating_scenario_with_hidden_identical_rows() {
    let a = product("a", "A", 10_000.0, 4.5, &[("Цвет", "Чёрный")]);
    let b = product("b", "B", 12_000.0, 4.8, &[("Цвет", "Чёрный")]);
    let set = ComparisonSet::new(vec![a, b]).unwrap();
    let builder = TableBuilder::default();

    let rows = builder.build(&set, false);
    assert_eq!(
        row(&rows, "Цена").classifications,
        vec![Classification::Best, Classification::Worst]
    );
    assert_eq!(
        row(&rows, "Рейтинг").classifications,
        vec![Classification::Worst, Classification::Best]
    );
    assert_eq!(
        row(&rows, "Цвет").classifications,
        vec![Classification::Neutral, Classification::Neutral]
    );

    let visible: Vec<RowKind> = builder.build(&set, true).iter().map(|r| r.kind).collect();
    assert_eq!(
        visible,
        vec![
            RowKind::Image,
            RowKind::Name,
            RowKind::Price,
            RowKind::Rating
        ]
    );
}

#[test]
fn partial_extraction_keeps_row_neutral() {
    let set = ComparisonSet::new(vec![
        product("1", "A", 1.0, 4.0, &[("Батарея", "5000 мАч")]),
        product("2", "B", 1.0, 4.0, &[]),
        product("3", "C", 1.0, 4.0, &[("Батарея", "4000 мАч")]),
    ])
    .unwrap();
    let rows = TableBuilder::default().build(&set, false);
    let battery = row(&rows, "Батарея");
    assert_eq!(battery.values[1], UNKNOWN_VALUE);
    assert!(battery.is_different);
    assert!(
        battery
            .classifications
            .iter()
            .all(|c| *c == Classification::Neutral)
    );
}

#[test]
fn selection_drives_comparison_and_export() {
    let catalog = Catalog::new(vec![
        product("1", "One", 100.0, 4.0, &[("Вес", "180 г")]),
        product("2", "Two", 200.0, 4.2, &[("Вес", "200 г")]),
        product("3", "Three", 300.0, 4.4, &[]),
    ])
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let store: SharedStore = Arc::new(JsonDirStore::new(dir.path().join("store")));
    let mut selection = SelectionStore::open(store.clone()).unwrap();
    selection.add("2").unwrap();
    selection.add("1").unwrap();

    let reopened = SelectionStore::open(store).unwrap();
    let set = catalog.comparison_set(reopened.items()).unwrap();
    let names: Vec<&str> = set.products().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Two", "One"]);

    let rows = TableBuilder::default().build(&set, true);
    assert_eq!(
        row(&rows, "Вес").classifications,
        vec![Classification::Worst, Classification::Best]
    );

    let out = dir.path().join("exports");
    let notifier = Arc::new(Recorder::default());
    let exporter = Exporter::new(Arc::new(DirectorySink::new(&out)), notifier.clone());
    let at = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
    let receipt = exporter
        .export_at(set.products(), ExportFormat::Csv, at)
        .unwrap();

    assert_eq!(receipt.file_name, "comparison-2024-03-05.csv");
    assert_eq!(receipt.products, 2);
    let csv = std::fs::read_to_string(out.join(&receipt.file_name)).unwrap();
    assert!(csv.starts_with('\u{feff}'));
    assert_eq!(csv.lines().count(), 3);
    assert_eq!(
        notifier.messages.lock().unwrap().as_slice(),
        ["ok: Файл comparison-2024-03-05.csv успешно загружен!"]
    );
}

#[test]
fn json_export_carries_metadata() {
    let products = vec![product("1", "One", 100.0, 4.0, &[])];
    let dir = tempfile::tempdir().unwrap();
    let sink = DirectorySink::new(dir.path());
    let exporter = Exporter::new(Arc::new(sink), Arc::new(Recorder::default()));
    let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let receipt = exporter
        .export_at(&products, ExportFormat::Json, at)
        .unwrap();

    let raw = std::fs::read_to_string(&receipt.location).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["metadata"]["productsCount"], 1);
    assert_eq!(doc["metadata"]["source"], "ProductCompare");
    assert_eq!(doc["metadata"]["exportDate"], "2024-01-02T03:04:05.000Z");
    assert!(doc["products"][0].get("images").is_none());
}

#[test]
fn in_memory_store_is_shareable_across_stores() {
    let store = InMemoryStore::shared();
    let mut a = SelectionStore::open(store.clone()).unwrap();
    a.add("x").unwrap();
    let b = SelectionStore::open(store).unwrap();
    assert!(b.contains("x"));
}

#[test]
fn directory_sink_reports_location() {
    let dir = tempfile::tempdir().unwrap();
    let sink = DirectorySink::new(dir.path());
    let path = sink.deliver("x.json", b"{}").unwrap();
    assert_eq!(path, dir.path().join("x.json"));
}

//! Bulk import through the public admin API, with an in-memory catalog.
//!
//! Workbooks are built with `rust_xlsxwriter` and read back by the same code
//! path the upload endpoint uses.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use rust_decimal::Decimal;

use carsi_admin::import::{DEFAULT_MAX_IMPORT_ROWS, Importer, feed, sheet};
use carsi_core::cart::{Cart, CartOutcome, NewCartItem};
use carsi_integration_tests::{MemoryCatalog, workbook};

const HEADER: &[&str] = &["Ürün Adı", "Fiyat", "Eski Fiyat", "Stok", "Kategori", "Görsel"];

#[tokio::test]
async fn test_workbook_with_one_malformed_row() {
    let bytes = workbook(&[
        HEADER,
        &["Bakır Cezve", "349,90", "499,90", "4", "Mutfak", "https://cdn.example.com/cezve.jpg"],
        &["", "120", "", "2", "Mutfak", ""],
        &["Türk Kahvesi 250g", "89.5", "", "30", "Gıda", ""],
    ])
    .unwrap();

    let rows = sheet::read_workbook(bytes).unwrap();
    assert_eq!(rows.len(), 3);

    let catalog = MemoryCatalog::default();
    let report = Importer::new(&catalog, DEFAULT_MAX_IMPORT_ROWS)
        .run(rows)
        .await;

    assert_eq!(report.success_count, 2);
    assert_eq!(report.error_count, 1);
    assert_eq!(report.errors[0].row, 2);

    let products = catalog.products();
    assert_eq!(products[0].slug, "bakir-cezve");
    assert_eq!(products[0].price, Decimal::new(34990, 2));
    assert_eq!(products[0].discount_percent(), 30);
    assert_eq!(products[1].slug, "turk-kahvesi-250g");
    assert_eq!(
        catalog.primary_image(products[0].id).as_deref(),
        Some("https://cdn.example.com/cezve.jpg")
    );
    assert_eq!(catalog.categories().len(), 2);
}

#[tokio::test]
async fn test_imported_stock_bounds_the_cart() {
    let bytes = workbook(&[HEADER, &["El Yapımı Sabun", "45", "", "2", "", ""]]).unwrap();
    let catalog = MemoryCatalog::default();
    Importer::new(&catalog, DEFAULT_MAX_IMPORT_ROWS)
        .run(sheet::read_workbook(bytes).unwrap())
        .await;
    let product = catalog.products().remove(0);

    let mut cart = Cart::new();
    let offer = NewCartItem::from_product(&product, None);
    assert!(matches!(
        cart.add_item(offer.clone(), 2),
        CartOutcome::Added { .. }
    ));
    assert_eq!(cart.add_item(offer, 1), CartOutcome::InsufficientStock);
    assert_eq!(cart.total_items(), 2);
    assert_eq!(cart.total_price(), Decimal::from(90));
}

#[tokio::test]
async fn test_feed_rows_share_the_pipeline() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <urunler>
          <urun>
            <name>Keten Masa Örtüsü</name>
            <price>260</price>
            <stock>7</stock>
            <category>Ev Tekstili</category>
          </urun>
          <urun>
            <price>15</price>
          </urun>
          <urun>
            <name>Keten Peçete</name>
            <price>40</price>
            <category>ev tekstili</category>
          </urun>
        </urunler>"#;

    let rows = feed::parse_feed(xml).unwrap();
    let catalog = MemoryCatalog::default();
    let report = Importer::new(&catalog, DEFAULT_MAX_IMPORT_ROWS)
        .run(rows)
        .await;

    assert_eq!(report.success_count, 2);
    assert_eq!(report.error_count, 1);
    let categories = catalog.categories();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].slug, "ev-tekstili");
}

#[tokio::test]
async fn test_row_ceiling_skips_the_tail() {
    let names: Vec<String> = (1..=6).map(|i| format!("Defter {i}")).collect();
    let mut rows: Vec<&[&str]> = vec![&["name"]];
    let cells: Vec<[&str; 1]> = names.iter().map(|n| [n.as_str()]).collect();
    rows.extend(cells.iter().map(<[&str; 1]>::as_slice));
    let bytes = workbook(&rows).unwrap();

    let catalog = MemoryCatalog::default();
    let report = Importer::new(&catalog, 4)
        .run(sheet::read_workbook(bytes).unwrap())
        .await;

    assert_eq!(report.success_count, 4);
    assert_eq!(report.skipped, 2);
    assert_eq!(catalog.products().len(), 4);
}

//! Source rows and their normalization into products.
//!
//! Spreadsheet headers and feed tags are matched against per-field alias
//! lists, in alias order; the first alias with a non-empty value wins. For
//! each alias an exact key beats a case-insensitive one, and among equal
//! matches the earlier column wins.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use carsi_core::catalog::NewProduct;
use carsi_core::slug::slugify;

use super::RowError;

/// Column aliases per product field.
pub mod columns {
    pub const NAME: &[&str] = &["Ürün Adı", "name", "urun_adi"];
    pub const PRICE: &[&str] = &["Fiyat", "price"];
    pub const COMPARE_PRICE: &[&str] = &["Eski Fiyat", "compare_price", "eski_fiyat"];
    pub const DESCRIPTION: &[&str] = &["Açıklama", "description", "aciklama"];
    pub const SHORT_DESCRIPTION: &[&str] = &["Kısa Açıklama", "short_description", "kisa_aciklama"];
    pub const STOCK: &[&str] = &["Stok", "stock_quantity", "stock"];
    pub const SKU: &[&str] = &["SKU"];
    pub const BARCODE: &[&str] = &["Barkod", "barcode"];
    pub const ACTIVE: &[&str] = &["Aktif", "is_active"];
    pub const FEATURED: &[&str] = &["Öne Çıkan", "is_featured", "one_cikan"];
    pub const DIGITAL: &[&str] = &["Dijital", "is_digital"];
    pub const WEIGHT: &[&str] = &["Ağırlık", "weight", "agirlik"];
    pub const DIMENSIONS: &[&str] = &["Boyutlar", "dimensions"];
    pub const TAGS: &[&str] = &["Etiketler", "tags"];
    pub const CATEGORY: &[&str] = &["Kategori", "category"];
    pub const IMAGE: &[&str] = &["Görsel", "image_url", "image", "gorsel"];
}

/// A single cell or tag value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Int(i64),
    Bool(bool),
}

impl CellValue {
    /// Text form, trimmed. Whole floats print without a fraction so that
    /// numeric SKUs and barcodes survive.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.trim().to_string(),
            Self::Number(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
            Self::Number(f) => f.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }

    /// Numeric form, if the value reads as a number.
    ///
    /// Text accepts a currency suffix or prefix (`TL`, `₺`) and Turkish
    /// decimal commas (`1.234,50`).
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Number(f) => Decimal::from_f64(*f),
            Self::Int(i) => Some(Decimal::from(*i)),
            Self::Bool(_) => None,
            Self::Text(s) => parse_decimal(s),
        }
    }

    /// Boolean form, if the value reads as a yes/no.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(i) => Some(*i != 0),
            Self::Number(f) => Some(*f != 0.0),
            Self::Text(s) => match s.trim().to_lowercase().as_str() {
                "true" | "evet" | "yes" | "1" | "x" => Some(true),
                "false" | "hayır" | "hayir" | "no" | "0" => Some(false),
                _ => None,
            },
        }
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('₺')
        .trim_end_matches("TL")
        .trim_end_matches('₺')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let normalized = match (cleaned.contains('.'), cleaned.contains(',')) {
        (true, true) => cleaned.replace('.', "").replace(',', "."),
        (false, true) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    Decimal::from_str(&normalized).ok()
}

/// One record from a source: field names and values in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRow {
    fields: Vec<(String, CellValue)>,
}

impl SourceRow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Blank text values are not stored, and a repeated key
    /// keeps its first value.
    pub fn insert(&mut self, key: impl Into<String>, value: CellValue) {
        if matches!(&value, CellValue::Text(s) if s.trim().is_empty()) {
            return;
        }
        let key = key.into().trim().to_string();
        if self.fields.iter().any(|(existing, _)| *existing == key) {
            return;
        }
        self.fields.push((key, value));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Value stored under one alias: the exact key if present, otherwise the
    /// first key equal to it ignoring case.
    #[must_use]
    pub fn get(&self, alias: &str) -> Option<&CellValue> {
        self.fields
            .iter()
            .find(|(key, _)| key == alias)
            .or_else(|| {
                let alias = alias.to_lowercase();
                self.fields
                    .iter()
                    .find(|(key, _)| key.to_lowercase() == alias)
            })
            .map(|(_, value)| value)
    }

    /// First value found under any of `aliases`, tried in order.
    #[must_use]
    pub fn lookup(&self, aliases: &[&str]) -> Option<&CellValue> {
        aliases.iter().find_map(|alias| self.get(alias))
    }

    /// Whether any of `aliases` holds an explicit no.
    fn any_false(&self, aliases: &[&str]) -> bool {
        aliases
            .iter()
            .filter_map(|alias| self.get(alias))
            .any(|value| value.as_bool() == Some(false))
    }

    fn text(&self, aliases: &[&str]) -> Option<String> {
        self.lookup(aliases)
            .map(CellValue::as_text)
            .filter(|s| !s.is_empty())
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for SourceRow {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (key, value) in iter {
            row.insert(key, value);
        }
        row
    }
}

/// A normalized row: the product plus what still has to be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    /// Product to insert; `category_id` is filled in by the importer.
    pub product: NewProduct,
    /// Category display name, if the row names one.
    pub category: Option<String>,
    /// Primary image URL, if the row has one.
    pub image_url: Option<String>,
}

impl ProductDraft {
    /// Normalize a source row.
    ///
    /// Numbers fall back to zero (price, stock) or `None` (compare price,
    /// weight) when missing or unparseable. Negative stock becomes zero. A
    /// product is active unless some active column says no.
    ///
    /// # Errors
    ///
    /// Returns `RowError::MissingName` if the row has no name, and
    /// `RowError::EmptySlug` if the name has no letters or digits.
    pub fn from_row(row: &SourceRow) -> Result<Self, RowError> {
        let name = row.text(columns::NAME).ok_or(RowError::MissingName)?;
        let slug = slugify(&name);
        if slug.is_empty() {
            return Err(RowError::EmptySlug(name));
        }

        let price = row
            .lookup(columns::PRICE)
            .and_then(CellValue::as_decimal)
            .unwrap_or(Decimal::ZERO);
        let compare_price = row
            .lookup(columns::COMPARE_PRICE)
            .and_then(CellValue::as_decimal);
        let stock_quantity = row
            .lookup(columns::STOCK)
            .and_then(CellValue::as_decimal)
            .and_then(|d| d.trunc().to_i32())
            .unwrap_or(0)
            .max(0);
        let weight = row.lookup(columns::WEIGHT).and_then(CellValue::as_decimal);
        let tags = row.text(columns::TAGS).map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect::<Vec<_>>()
        });

        let product = NewProduct {
            name,
            slug,
            price,
            compare_price,
            description: row.text(columns::DESCRIPTION).unwrap_or_default(),
            short_description: row.text(columns::SHORT_DESCRIPTION).unwrap_or_default(),
            stock_quantity,
            sku: row.text(columns::SKU).unwrap_or_default(),
            barcode: row.text(columns::BARCODE).unwrap_or_default(),
            is_active: !row.any_false(columns::ACTIVE),
            is_featured: row.lookup(columns::FEATURED).and_then(CellValue::as_bool) == Some(true),
            is_digital: row.lookup(columns::DIGITAL).and_then(CellValue::as_bool) == Some(true),
            weight,
            dimensions: row.text(columns::DIMENSIONS),
            tags,
            category_id: None,
        };

        Ok(Self {
            product,
            category: row.text(columns::CATEGORY),
            image_url: row.text(columns::IMAGE),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_turkish_headers_map_to_fields() {
        let row: SourceRow = [
            ("Ürün Adı", text("Bakır Cezve")),
            ("Fiyat", CellValue::Number(349.9)),
            ("Eski Fiyat", text("399,90")),
            ("Stok", CellValue::Int(12)),
            ("SKU", CellValue::Number(100_245.0)),
            ("Kategori", text(" Mutfak ")),
            ("Etiketler", text("kahve, bakır ,,el yapımı")),
        ]
        .into_iter()
        .collect();

        let draft = ProductDraft::from_row(&row).unwrap();
        let p = &draft.product;

        assert_eq!(p.name, "Bakır Cezve");
        assert_eq!(p.slug, "bakir-cezve");
        assert_eq!(p.price, Decimal::new(3499, 1));
        assert_eq!(p.compare_price, Some(Decimal::new(39990, 2)));
        assert_eq!(p.stock_quantity, 12);
        assert_eq!(p.sku, "100245");
        assert_eq!(
            p.tags,
            Some(vec![
                "kahve".to_string(),
                "bakır".to_string(),
                "el yapımı".to_string()
            ])
        );
        assert_eq!(draft.category.as_deref(), Some("Mutfak"));
        assert!(p.is_active);
        assert!(!p.is_featured);
        assert!(!p.is_digital);
    }

    #[test]
    fn test_english_aliases_and_case_insensitivity() {
        let row: SourceRow = [
            ("Name", text("Desk Lamp")),
            ("PRICE", text("₺1.250,00")),
            ("Stock", text("3")),
            ("is_featured", CellValue::Bool(true)),
        ]
        .into_iter()
        .collect();

        let draft = ProductDraft::from_row(&row).unwrap();
        assert_eq!(draft.product.price, Decimal::new(125_000, 2));
        assert_eq!(draft.product.stock_quantity, 3);
        assert!(draft.product.is_featured);
    }

    #[test]
    fn test_first_alias_wins() {
        let row: SourceRow = [("Ürün Adı", text("Türkçe")), ("name", text("English"))]
            .into_iter()
            .collect();
        assert_eq!(ProductDraft::from_row(&row).unwrap().product.name, "Türkçe");
    }

    #[test]
    fn test_exact_header_beats_other_case() {
        for fields in [
            [("Name", text("Büyük")), ("name", text("Küçük"))],
            [("name", text("Küçük")), ("Name", text("Büyük"))],
        ] {
            let row: SourceRow = fields.into_iter().collect();
            assert_eq!(ProductDraft::from_row(&row).unwrap().product.name, "Küçük");
        }

        let row: SourceRow = [("NAME", text("İlk")), ("Name", text("İkinci"))]
            .into_iter()
            .collect();
        assert_eq!(ProductDraft::from_row(&row).unwrap().product.name, "İlk");
    }

    #[test]
    fn test_repeated_key_keeps_first_value() {
        let mut row = SourceRow::new();
        row.insert("Fiyat", text("10"));
        row.insert("Fiyat", text("99"));
        row.insert(" Fiyat ", text("77"));
        assert_eq!(row.lookup(columns::PRICE), Some(&text("10")));
    }

    #[test]
    fn test_numbers_fall_back_safely() {
        let row: SourceRow = [
            ("name", text("Bozuk Sayılar")),
            ("price", text("abc")),
            ("stock", text("-4")),
            ("weight", text("?")),
        ]
        .into_iter()
        .collect();

        let p = ProductDraft::from_row(&row).unwrap().product;
        assert_eq!(p.price, Decimal::ZERO);
        assert_eq!(p.stock_quantity, 0);
        assert_eq!(p.weight, None);
        assert_eq!(p.compare_price, None);
        assert_eq!(p.tags, None);
    }

    #[test]
    fn test_active_only_false_when_explicit() {
        let inactive: SourceRow = [("name", text("Pasif")), ("Aktif", text("Hayır"))]
            .into_iter()
            .collect();
        let unknown: SourceRow = [("name", text("Belirsiz")), ("Aktif", text("belki"))]
            .into_iter()
            .collect();

        assert!(!ProductDraft::from_row(&inactive).unwrap().product.is_active);
        assert!(ProductDraft::from_row(&unknown).unwrap().product.is_active);
    }

    #[test]
    fn test_any_active_column_can_deactivate() {
        let row: SourceRow = [
            ("name", text("Çelişkili")),
            ("Aktif", CellValue::Bool(true)),
            ("is_active", CellValue::Bool(false)),
        ]
        .into_iter()
        .collect();
        assert!(!ProductDraft::from_row(&row).unwrap().product.is_active);
    }

    #[test]
    fn test_missing_name_is_malformed() {
        let row: SourceRow = [("price", CellValue::Number(10.0))].into_iter().collect();
        assert!(matches!(
            ProductDraft::from_row(&row),
            Err(RowError::MissingName)
        ));

        let blank: SourceRow = [("name", text("   "))].into_iter().collect();
        assert!(matches!(
            ProductDraft::from_row(&blank),
            Err(RowError::MissingName)
        ));
    }

    #[test]
    fn test_name_without_alphanumerics_is_malformed() {
        let row: SourceRow = [("name", text("***"))].into_iter().collect();
        assert!(matches!(
            ProductDraft::from_row(&row),
            Err(RowError::EmptySlug(_))
        ));
    }

    #[test]
    fn test_parse_decimal_variants() {
        assert_eq!(parse_decimal("12.5"), Some(Decimal::new(125, 1)));
        assert_eq!(parse_decimal("12,5"), Some(Decimal::new(125, 1)));
        assert_eq!(parse_decimal("49,90 TL"), Some(Decimal::new(4990, 2)));
        assert_eq!(parse_decimal(""), None);
    }
}

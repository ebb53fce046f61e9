//! Catalogue types: products, search parameters, write payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mayombe_core::rating::RatingSummary;
use mayombe_core::{Money, ProductId, UserId};

/// Largest page size for product search.
pub const MAX_SEARCH_LIMIT: u32 = 100;
/// Page size when none is requested.
pub const DEFAULT_SEARCH_LIMIT: u32 = 24;

const MAX_NAME_LENGTH: usize = 200;
const MAX_DESCRIPTION_LENGTH: usize = 5_000;

/// A listed product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub seller_id: UserId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Money,
    pub stock: i32,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether the product offers a given size/color combination.
    ///
    /// A product without sizes (or colors) accepts only an absent value.
    #[must_use]
    pub fn offers_variant(&self, size: Option<&str>, color: Option<&str>) -> bool {
        let matches = |options: &[String], chosen: Option<&str>| match chosen {
            Some(value) => options.iter().any(|o| o == value),
            None => options.is_empty(),
        };
        matches(&self.sizes, size) && matches(&self.colors, color)
    }
}

/// Product page payload.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub rating: RatingSummary,
}

/// Vendor payload for listing a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub price: Money,
    pub stock: u32,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewProduct {
    /// Trim text fields and check bounds.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message for the first invalid field.
    pub fn normalized(self) -> Result<Self, String> {
        let name = self.name.trim().to_owned();
        let category = self.category.trim().to_lowercase();
        let description = self.description.trim().to_owned();

        validate_name(&name)?;
        if category.is_empty() {
            return Err("category is required".to_string());
        }
        validate_description(&description)?;
        if self.price == Money::ZERO {
            return Err("price must be greater than zero".to_string());
        }
        if i32::try_from(self.stock).is_err() {
            return Err("stock is too large".to_string());
        }

        Ok(Self {
            name,
            description,
            category,
            price: self.price,
            stock: self.stock,
            sizes: clean_options(self.sizes),
            colors: clean_options(self.colors),
            image_url: self.image_url.filter(|u| !u.trim().is_empty()),
        })
    }
}

/// Vendor payload for editing a product. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<Money>,
    pub stock: Option<u32>,
    pub sizes: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

impl ProductUpdate {
    /// Trim text fields and check bounds.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message for the first invalid field.
    pub fn normalized(self) -> Result<Self, String> {
        let name = self.name.map(|n| n.trim().to_owned());
        if let Some(name) = &name {
            validate_name(name)?;
        }
        let description = self.description.map(|d| d.trim().to_owned());
        if let Some(description) = &description {
            validate_description(description)?;
        }
        let category = self.category.map(|c| c.trim().to_lowercase());
        if category.as_deref().is_some_and(str::is_empty) {
            return Err("category is required".to_string());
        }
        if self.price == Some(Money::ZERO) {
            return Err("price must be greater than zero".to_string());
        }
        if self.stock.is_some_and(|s| i32::try_from(s).is_err()) {
            return Err("stock is too large".to_string());
        }

        Ok(Self {
            name,
            description,
            category,
            price: self.price,
            stock: self.stock,
            sizes: self.sizes.map(clean_options),
            colors: self.colors.map(clean_options),
            image_url: self.image_url,
            is_active: self.is_active,
        })
    }
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name is required".to_string());
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(format!("name must be at most {MAX_NAME_LENGTH} characters"));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), String> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(format!(
            "description must be at most {MAX_DESCRIPTION_LENGTH} characters"
        ));
    }
    Ok(())
}

/// Trim, drop blanks, and de-duplicate variant options keeping first occurrence.
fn clean_options(options: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(options.len());
    for option in options {
        let option = option.trim();
        if !option.is_empty() && !cleaned.iter().any(|o| o == option) {
            cleaned.push(option.to_owned());
        }
    }
    cleaned
}

/// Search ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

impl ProductSort {
    /// SQL `ORDER BY` clause. Ties fall back to id for stable paging.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => " ORDER BY created_at DESC, id DESC",
            Self::PriceAsc => " ORDER BY price ASC, id ASC",
            Self::PriceDesc => " ORDER BY price DESC, id DESC",
        }
    }
}

/// Query-string parameters for `GET /api/products`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    /// Case-insensitive substring of name or description.
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub seller_id: Option<UserId>,
    #[serde(default)]
    pub sort: ProductSort,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ProductQuery {
    /// Requested page size, capped at [`MAX_SEARCH_LIMIT`].
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(
            self.limit
                .unwrap_or(DEFAULT_SEARCH_LIMIT)
                .clamp(1, MAX_SEARCH_LIMIT),
        )
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.offset.unwrap_or(0))
    }

    /// The search text trimmed, or `None` when blank.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// `ILIKE` pattern for the search text with wildcards escaped.
    #[must_use]
    pub fn like_pattern(&self) -> Option<String> {
        self.text().map(|q| {
            let escaped = q
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{escaped}%")
        })
    }

    /// The category filter, normalized like stored categories.
    #[must_use]
    pub fn category(&self) -> Option<String> {
        self.category
            .as_deref()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(sizes: &[&str], colors: &[&str]) -> Product {
        Product {
            id: ProductId::new(1),
            seller_id: UserId::new(2),
            name: "Chemise en pagne".to_string(),
            description: String::new(),
            category: "mode".to_string(),
            price: Money::francs(15_000),
            stock: 4,
            sizes: sizes.iter().map(ToString::to_string).collect(),
            colors: colors.iter().map(ToString::to_string).collect(),
            image_url: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_offers_variant() {
        let p = product(&["M", "L"], &[]);
        assert!(p.offers_variant(Some("M"), None));
        assert!(!p.offers_variant(Some("XS"), None));
        assert!(!p.offers_variant(None, None));
        assert!(!p.offers_variant(Some("M"), Some("rouge")));

        let plain = product(&[], &[]);
        assert!(plain.offers_variant(None, None));
    }

    #[test]
    fn test_new_product_normalized() {
        let p = NewProduct {
            name: "  Panier tressé ".to_string(),
            description: String::new(),
            category: " Maison ".to_string(),
            price: Money::francs(8_000),
            stock: 3,
            sizes: vec![" S".to_string(), "S".to_string(), String::new()],
            colors: vec![],
            image_url: Some("  ".to_string()),
        }
        .normalized()
        .unwrap();

        assert_eq!(p.name, "Panier tressé");
        assert_eq!(p.category, "maison");
        assert_eq!(p.sizes, vec!["S".to_string()]);
        assert_eq!(p.image_url, None);
    }

    #[test]
    fn test_new_product_rejects_zero_price_and_blank_name() {
        let base = NewProduct {
            name: "Savon noir".to_string(),
            description: String::new(),
            category: "beauté".to_string(),
            price: Money::ZERO,
            stock: 1,
            sizes: vec![],
            colors: vec![],
            image_url: None,
        };
        assert!(base.clone().normalized().is_err());
        let blank = NewProduct {
            name: " ".to_string(),
            price: Money::francs(1_000),
            ..base
        };
        assert!(blank.normalized().is_err());
    }

    #[test]
    fn test_query_limit_is_capped() {
        let q = ProductQuery {
            limit: Some(1_000),
            ..ProductQuery::default()
        };
        assert_eq!(q.limit(), 100);
        assert_eq!(ProductQuery::default().limit(), 24);
        let zero = ProductQuery {
            limit: Some(0),
            ..ProductQuery::default()
        };
        assert_eq!(zero.limit(), 1);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        let q = ProductQuery {
            q: Some(" 100%_coton ".to_string()),
            ..ProductQuery::default()
        };
        assert_eq!(q.like_pattern().unwrap(), "%100\\%\\_coton%");
        assert_eq!(ProductQuery::default().like_pattern(), None);
    }

    #[test]
    fn test_query_deserializes_from_query_string() {
        let q: ProductQuery = serde_json::from_value(serde_json::json!({
            "q": "wax",
            "min_price": "1000",
            "sort": "price_desc",
            "seller_id": 7
        }))
        .unwrap();
        assert_eq!(q.min_price, Some(Money::francs(1_000)));
        assert_eq!(q.sort, ProductSort::PriceDesc);
        assert_eq!(q.seller_id, Some(UserId::new(7)));
    }
}

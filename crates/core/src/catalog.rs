//! Store catalog options and product filtering.
//!
//! The public listing is filtered by the backend; [`StoreQuery`] only parses
//! the page's query string and re-encodes it for the API. The admin product
//! table is filtered locally by [`AdminProductFilter`].

use std::fmt::Write as _;

use url::{Url, form_urlencoded};

use crate::models::Product;
use crate::types::ProductStatus;

/// Store categories offered in the filter sidebar.
pub const CATEGORIES: [&str; 17] = [
    "UI Kits",
    "Templates",
    "Icon Sets",
    "Graphics",
    "Fonts",
    "Mockups",
    "Illustrations",
    "3D Assets",
    "Photos",
    "Patterns",
    "Brushes",
    "Wireframes",
    "Design Systems",
    "UI Animations",
    "Color Palettes",
    "Textures",
    "Wallpapers",
];

/// Pseudo-category for discounted products; shown as its own tile.
pub const SALES_CATEGORY: &str = "Sales";

/// Tags offered in the filter sidebar.
pub const TAGS: [&str; 16] = [
    "Modern",
    "Minimal",
    "Dark",
    "Creative",
    "Professional",
    "Holographic",
    "Dashboard",
    "Clean",
    "Futuristic",
    "Typography",
    "Cyber",
    "Abstract",
    "Digital",
    "Bundle",
    "Landing",
    "Web",
];

/// Design programs a product can target.
pub const PROGRAMS: [&str; 9] = [
    "Figma",
    "Sketch",
    "Adobe XD",
    "Photoshop",
    "Illustrator",
    "After Effects",
    "Blender",
    "Cinema 4D",
    "Affinity Designer",
];

/// Downloadable file types for product assets.
pub const FILE_TYPES: [&str; 9] = [
    ".psd", ".fig", ".ai", ".xd", ".sketch", ".aep", ".blend", ".c4d", ".afdesign",
];

/// Price slider bounds, in whole dollars.
pub const PRICE_MIN: u32 = 0;
pub const PRICE_MAX: u32 = 200;
pub const PRICE_STEP: u32 = 5;

/// Rating slider bounds.
pub const RATING_MIN: f64 = 0.0;
pub const RATING_MAX: f64 = 5.0;

/// Placeholder shown when a product has no image.
pub const PLACEHOLDER_IMAGE: &str = "/static/img/placeholder.svg";

/// Categories selectable in the admin product form.
#[must_use]
pub fn admin_categories() -> Vec<&'static str> {
    CATEGORIES
        .iter()
        .copied()
        .chain(std::iter::once(SALES_CATEGORY))
        .collect()
}

/// Price ordering for the store listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    PriceAsc,
    PriceDesc,
}

impl SortOrder {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "price_asc" => Some(Self::PriceAsc),
            "price_desc" => Some(Self::PriceDesc),
            _ => None,
        }
    }
}

/// The store page's filter state, parsed from and written back to its
/// query string.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoreQuery {
    pub q: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub programs: Vec<String>,
    pub min_price: Option<u32>,
    pub max_price: Option<u32>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub sort: Option<SortOrder>,
}

impl StoreQuery {
    /// Parse a raw query string.
    ///
    /// List parameters may be repeated (`tags=Dark&tags=Web`) or
    /// comma-joined (`tags=Dark,Web`). Unparseable numbers are ignored and
    /// numbers are clamped to the slider bounds. A slider resting on its own
    /// end (minimum at the floor, maximum at the ceiling) filters nothing and
    /// is dropped, so unrated or pricier products are not hidden.
    #[must_use]
    pub fn from_query_str(raw: &str) -> Self {
        let mut query = Self::default();
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            let value = value.trim();
            match key.as_ref() {
                "q" if !value.is_empty() => query.q = Some(value.to_owned()),
                "categories" => push_list(&mut query.categories, value),
                "tags" => push_list(&mut query.tags, value),
                "programs" => push_list(&mut query.programs, value),
                "min_price" => query.min_price = parse_price(value).filter(|&p| p != PRICE_MIN),
                "max_price" => query.max_price = parse_price(value).filter(|&p| p != PRICE_MAX),
                "min_rating" => {
                    query.min_rating = parse_rating(value).filter(|&r| r > RATING_MIN);
                }
                "max_rating" => {
                    query.max_rating = parse_rating(value).filter(|&r| r < RATING_MAX);
                }
                "sort" => query.sort = SortOrder::parse(value),
                _ => {}
            }
        }
        query
    }

    /// Query pairs for `GET /products`, with list parameters repeated.
    #[must_use]
    pub fn api_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(q) = &self.q {
            pairs.push(("q", q.clone()));
        }
        pairs.extend(self.categories.iter().map(|c| ("categories", c.clone())));
        pairs.extend(self.tags.iter().map(|t| ("tags", t.clone())));
        pairs.extend(self.programs.iter().map(|p| ("programs", p.clone())));
        if let Some(min) = self.min_price {
            pairs.push(("min_price", min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("max_price", max.to_string()));
        }
        if let Some(min) = self.min_rating {
            pairs.push(("min_rating", min.to_string()));
        }
        if let Some(max) = self.max_rating {
            pairs.push(("max_rating", max.to_string()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort", sort.as_str().to_owned()));
        }
        pairs
    }

    /// Encode back into a query string (without the leading `?`).
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.api_pairs() {
            serializer.append_pair(key, &value);
        }
        serializer.finish()
    }

    /// Whether no filter is applied at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The same filters with the price sort flipped. Anything other than
    /// descending flips to descending.
    #[must_use]
    pub fn toggled_sort(&self) -> Self {
        let sort = if self.sort == Some(SortOrder::PriceDesc) {
            SortOrder::PriceAsc
        } else {
            SortOrder::PriceDesc
        };
        Self {
            sort: Some(sort),
            ..self.clone()
        }
    }

    /// Label for the sort toggle button.
    #[must_use]
    pub fn sort_label(&self) -> &'static str {
        if self.sort == Some(SortOrder::PriceDesc) {
            "Price ↑"
        } else {
            "Price ↓"
        }
    }

    /// Link target for the sort toggle.
    #[must_use]
    pub fn sort_toggle_href(&self) -> String {
        let mut href = String::from("/store?");
        let _ = write!(href, "{}", self.toggled_sort().to_query_string());
        href
    }

    /// The same filters with the Sales tile switched.
    #[must_use]
    pub fn sales_toggle_href(&self) -> String {
        let mut next = self.clone();
        if next.has_category(SALES_CATEGORY) {
            next.categories.retain(|c| c != SALES_CATEGORY);
        } else {
            next.categories.push(SALES_CATEGORY.to_owned());
        }
        format!("/store?{}", next.to_query_string())
    }

    #[must_use]
    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    #[must_use]
    pub fn has_program(&self, program: &str) -> bool {
        self.programs.iter().any(|p| p == program)
    }

    /// Lower price bound for the form, defaulting to the slider minimum.
    #[must_use]
    pub fn min_price_or_default(&self) -> u32 {
        self.min_price.unwrap_or(PRICE_MIN)
    }

    /// Upper price bound for the form, defaulting to the slider maximum.
    #[must_use]
    pub fn max_price_or_default(&self) -> u32 {
        self.max_price.unwrap_or(PRICE_MAX)
    }

    #[must_use]
    pub fn min_rating_or_default(&self) -> f64 {
        self.min_rating.unwrap_or(RATING_MIN)
    }

    #[must_use]
    pub fn max_rating_or_default(&self) -> f64 {
        self.max_rating.unwrap_or(RATING_MAX)
    }
}

fn push_list(list: &mut Vec<String>, raw: &str) {
    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !list.iter().any(|existing| existing == item) {
            list.push(item.to_owned());
        }
    }
}

fn parse_price(raw: &str) -> Option<u32> {
    let value: f64 = raw.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to 0..=200
    let dollars = value.clamp(f64::from(PRICE_MIN), f64::from(PRICE_MAX)).round() as u32;
    Some(dollars)
}

fn parse_rating(raw: &str) -> Option<f64> {
    let value: f64 = raw.parse().ok()?;
    value
        .is_finite()
        .then(|| value.clamp(RATING_MIN, RATING_MAX))
}

/// Status selector on the admin products table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Disabled,
}

impl StatusFilter {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("active") => Self::Active,
            Some("disabled") => Self::Disabled,
            _ => Self::All,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Disabled => "disabled",
        }
    }

    fn accepts(self, status: ProductStatus) -> bool {
        match self {
            Self::All => true,
            Self::Active => status == ProductStatus::Active,
            Self::Disabled => status == ProductStatus::Disabled,
        }
    }
}

/// Search box plus status selector for the admin products table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminProductFilter {
    pub search: String,
    pub status: StatusFilter,
}

impl AdminProductFilter {
    /// Whether a product passes both the status filter and the
    /// case-insensitive search over name, category, programs and status.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if !self.status.accepts(product.status()) {
            return false;
        }
        let term = self.search.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        let status = product
            .status
            .as_deref()
            .unwrap_or(ProductStatus::Active.as_str());
        [
            Some(product.name.as_str()),
            product.category.as_deref(),
            product.programs.as_deref(),
            Some(status),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&term))
    }

    /// Products passing the filter, in their original order.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }
}

/// Active/disabled totals for the dashboard cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProductCounts {
    pub active: usize,
    pub disabled: usize,
}

impl ProductCounts {
    #[must_use]
    pub fn from_products(products: &[Product]) -> Self {
        products
            .iter()
            .fold(Self::default(), |mut counts, product| {
                match product.status() {
                    ProductStatus::Active => counts.active += 1,
                    ProductStatus::Disabled => counts.disabled += 1,
                }
                counts
            })
    }
}

/// Resolve a product or avatar image reference to something a browser can
/// load. Backend-relative paths are served by the API host.
#[must_use]
pub fn resolve_image_url(api_base: &Url, image: Option<&str>) -> String {
    match image.map(str::trim) {
        Some(path) if path.starts_with('/') => {
            format!("{}{path}", api_base.as_str().trim_end_matches('/'))
        }
        Some(other) if !other.is_empty() => other.to_owned(),
        _ => PLACEHOLDER_IMAGE.to_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Price, ProductId};

    fn product(name: &str, category: Option<&str>, programs: Option<&str>, status: Option<&str>) -> Product {
        Product {
            id: ProductId::new(1),
            name: name.to_string(),
            description: None,
            category: category.map(String::from),
            price: Price::from_cents(1000),
            image: None,
            file_type: None,
            tags: None,
            programs: programs.map(String::from),
            rating: None,
            sales: None,
            status: status.map(String::from),
            created_at: None,
        }
    }

    #[test]
    fn test_store_query_repeated_and_comma_lists() {
        let query = StoreQuery::from_query_str(
            "tags=Dark&tags=Web,Minimal&categories=UI+Kits&programs=Adobe%20XD&tags=Dark",
        );
        assert_eq!(query.tags, vec!["Dark", "Web", "Minimal"]);
        assert_eq!(query.categories, vec!["UI Kits"]);
        assert_eq!(query.programs, vec!["Adobe XD"]);
    }

    #[test]
    fn test_store_query_numbers() {
        let query = StoreQuery::from_query_str(
            "min_price=-5&max_price=250&min_rating=abc&max_rating=4.5&sort=price_asc",
        );
        assert_eq!(query.min_price, None);
        assert_eq!(query.max_price, None);
        assert_eq!(query.min_rating, None);
        assert_eq!(query.max_rating, Some(4.5));
        assert_eq!(query.sort, Some(SortOrder::PriceAsc));
    }

    #[test]
    fn test_store_query_sliders_at_bounds_dropped() {
        let query = StoreQuery::from_query_str(
            "q=&categories=Fonts&min_price=0&max_price=200&min_rating=0.0&max_rating=5.0",
        );
        assert_eq!(query.api_pairs(), vec![("categories", "Fonts".to_string())]);

        let untouched =
            StoreQuery::from_query_str("min_price=0&max_price=200&min_rating=0&max_rating=5");
        assert!(untouched.is_empty());

        let moved = StoreQuery::from_query_str("min_price=10&max_price=150&min_rating=3.5");
        assert_eq!(moved.min_price, Some(10));
        assert_eq!(moved.max_price, Some(150));
        assert_eq!(moved.min_rating, Some(3.5));
        assert_eq!(moved.max_rating, None);
    }

    #[test]
    fn test_store_query_empty_q_ignored() {
        let query = StoreQuery::from_query_str("q=+&sort=bogus");
        assert!(query.is_empty());
    }

    #[test]
    fn test_api_pairs_repeat_keys() {
        let query = StoreQuery::from_query_str("q=kit&tags=Dark,Web&max_price=50");
        let pairs = query.api_pairs();
        assert_eq!(
            pairs,
            vec![
                ("q", "kit".to_string()),
                ("tags", "Dark".to_string()),
                ("tags", "Web".to_string()),
                ("max_price", "50".to_string()),
            ]
        );
    }

    #[test]
    fn test_toggled_sort() {
        let query = StoreQuery::default();
        assert_eq!(query.sort_label(), "Price ↓");
        let toggled = query.toggled_sort();
        assert_eq!(toggled.sort, Some(SortOrder::PriceDesc));
        assert_eq!(toggled.sort_label(), "Price ↑");
        assert_eq!(toggled.toggled_sort().sort, Some(SortOrder::PriceAsc));
        assert_eq!(query.sort_toggle_href(), "/store?sort=price_desc");
    }

    #[test]
    fn test_sales_toggle() {
        let query = StoreQuery::from_query_str("categories=Fonts");
        assert_eq!(
            query.sales_toggle_href(),
            "/store?categories=Fonts&categories=Sales"
        );
        let with_sales = StoreQuery::from_query_str("categories=Sales,Fonts");
        assert_eq!(with_sales.sales_toggle_href(), "/store?categories=Fonts");
    }

    #[test]
    fn test_admin_filter_status() {
        let products = vec![
            product("A", None, None, None),
            product("B", None, None, Some("disabled")),
            product("C", None, None, Some("active")),
        ];
        let filter = AdminProductFilter {
            search: String::new(),
            status: StatusFilter::Active,
        };
        let names: Vec<_> = filter.apply(&products).iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);

        let filter = AdminProductFilter {
            search: String::new(),
            status: StatusFilter::Disabled,
        };
        assert_eq!(filter.apply(&products).len(), 1);
    }

    #[test]
    fn test_admin_filter_search_fields() {
        let kit = product("Dark Kit", Some("UI Kits"), Some("Figma,Sketch"), None);
        let search = |term: &str| AdminProductFilter {
            search: term.to_string(),
            status: StatusFilter::All,
        };
        assert!(search("dark").matches(&kit));
        assert!(search("ui kits").matches(&kit));
        assert!(search("SKETCH").matches(&kit));
        assert!(search("active").matches(&kit));
        assert!(!search("blender").matches(&kit));
    }

    #[test]
    fn test_product_counts() {
        let products = vec![
            product("A", None, None, None),
            product("B", None, None, Some("disabled")),
            product("C", None, None, Some("active")),
        ];
        assert_eq!(
            ProductCounts::from_products(&products),
            ProductCounts {
                active: 2,
                disabled: 1
            }
        );
    }

    #[test]
    fn test_resolve_image_url() {
        let api = Url::parse("http://127.0.0.1:8000/").unwrap();
        assert_eq!(
            resolve_image_url(&api, Some("/uploads/a.png")),
            "http://127.0.0.1:8000/uploads/a.png"
        );
        assert_eq!(
            resolve_image_url(&api, Some("https://cdn.example.com/a.png")),
            "https://cdn.example.com/a.png"
        );
        assert_eq!(resolve_image_url(&api, None), PLACEHOLDER_IMAGE);
        assert_eq!(resolve_image_url(&api, Some("  ")), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_admin_categories_include_sales() {
        let categories = admin_categories();
        assert_eq!(categories.len(), 18);
        assert_eq!(categories.last(), Some(&"Sales"));
    }
}

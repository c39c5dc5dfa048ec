//! Store listing and product detail.
//!
//! Filtering happens in the backend; the page only turns the query string
//! into a [`StoreQuery`] and renders the sidebar from it.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, RawQuery, State};
use deadforest_core::ProductId;
use deadforest_core::catalog::{
    CATEGORIES, PRICE_MAX, PRICE_MIN, PRICE_STEP, PROGRAMS, RATING_MAX, RATING_MIN, SALES_CATEGORY,
    StoreQuery, TAGS,
};
use deadforest_core::models::Product;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::routes::layout::Layout;
use crate::state::AppState;

// =============================================================================
// View Models
// =============================================================================

/// Product tile in the store grid.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: ProductId,
    pub name: String,
    pub category: Option<String>,
    pub price: String,
    pub image_url: String,
    /// `★ 4.5 (12)`, absent for unrated products.
    pub rating: Option<String>,
}

impl ProductCard {
    #[must_use]
    pub fn new(state: &AppState, product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.price.display(),
            image_url: state.image_url(product.image.as_deref()),
            rating: rating_label(product),
        }
    }
}

fn rating_label(product: &Product) -> Option<String> {
    let rating = product.rating.filter(|r| *r > 0.0)?;
    Some(match product.sales.filter(|s| *s > 0) {
        Some(sales) => format!("★ {rating} ({sales})"),
        None => format!("★ {rating}"),
    })
}

/// A checkbox in the filter sidebar.
#[derive(Debug, Clone)]
pub struct FilterOption {
    pub value: &'static str,
    pub checked: bool,
}

fn options(values: &[&'static str], is_checked: impl Fn(&str) -> bool) -> Vec<FilterOption> {
    values
        .iter()
        .map(|&value| FilterOption {
            value,
            checked: is_checked(value),
        })
        .collect()
}

/// Sidebar state.
#[derive(Debug, Clone)]
pub struct FiltersView {
    pub q: String,
    pub categories: Vec<FilterOption>,
    pub tags: Vec<FilterOption>,
    pub programs: Vec<FilterOption>,
    pub sales_active: bool,
    pub sales_href: String,
    pub min_price: u32,
    pub max_price: u32,
    pub min_rating: String,
    pub max_rating: String,
    pub sort: String,
    pub sort_label: &'static str,
    pub sort_href: String,
    pub is_filtered: bool,
}

impl From<&StoreQuery> for FiltersView {
    fn from(query: &StoreQuery) -> Self {
        Self {
            q: query.q.clone().unwrap_or_default(),
            categories: options(&CATEGORIES, |c| query.has_category(c)),
            tags: options(&TAGS, |t| query.has_tag(t)),
            programs: options(&PROGRAMS, |p| query.has_program(p)),
            sales_active: query.has_category(SALES_CATEGORY),
            sales_href: query.sales_toggle_href(),
            min_price: query.min_price_or_default(),
            max_price: query.max_price_or_default(),
            min_rating: format!("{:.1}", query.min_rating_or_default()),
            max_rating: format!("{:.1}", query.max_rating_or_default()),
            sort: query.sort.map(|s| s.as_str().to_owned()).unwrap_or_default(),
            sort_label: query.sort_label(),
            sort_href: query.sort_toggle_href(),
            is_filtered: !query.is_empty(),
        }
    }
}

/// Store page template.
#[derive(Template, WebTemplate)]
#[template(path = "store/index.html")]
pub struct StoreTemplate {
    pub layout: Layout,
    pub filters: FiltersView,
    pub products: Vec<ProductCard>,
    pub error: Option<String>,
    /// Where "Add to cart" returns to.
    pub return_to: String,
    pub price_min: u32,
    pub price_max: u32,
    pub price_step: u32,
    pub rating_min: f64,
    pub rating_max: f64,
}

/// Product detail view.
#[derive(Debug, Clone)]
pub struct ProductDetailView {
    pub card: ProductCard,
    pub description: Option<String>,
    pub file_type: Option<String>,
    pub tags: Vec<String>,
    pub programs: Vec<String>,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "store/show.html")]
pub struct ProductTemplate {
    pub layout: Layout,
    pub product: ProductDetailView,
    pub return_to: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the store with filters applied.
#[instrument(skip(state, session, raw_query))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RawQuery(raw_query): RawQuery,
) -> StoreTemplate {
    let query = StoreQuery::from_query_str(raw_query.as_deref().unwrap_or_default());

    let (layout, products) = tokio::join!(
        Layout::load(&state, &session),
        state.api().products().list(&query)
    );

    let (products, error) = match products {
        Ok(products) => (
            products.iter().map(|p| ProductCard::new(&state, p)).collect(),
            None,
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load products");
            (Vec::new(), Some(e.user_message()))
        }
    };

    let return_to = if query.is_empty() {
        "/store".to_string()
    } else {
        format!("/store?{}", query.to_query_string())
    };

    StoreTemplate {
        layout,
        filters: FiltersView::from(&query),
        products,
        error,
        return_to,
        price_min: PRICE_MIN,
        price_max: PRICE_MAX,
        price_step: PRICE_STEP,
        rating_min: RATING_MIN,
        rating_max: RATING_MAX,
    }
}

/// Display a single product.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<ProductTemplate> {
    let (layout, product) = tokio::join!(
        Layout::load(&state, &session),
        state.api().products().get(id)
    );

    let product = product.map_err(|e| {
        if e.is_not_found() {
            AppError::NotFound(format!("product {id}"))
        } else {
            AppError::Api(e)
        }
    })?;

    Ok(ProductTemplate {
        layout,
        product: ProductDetailView {
            card: ProductCard::new(&state, &product),
            description: product.description.clone(),
            file_type: product.file_type.clone(),
            tags: product.tag_list().into_iter().map(str::to_owned).collect(),
            programs: product.program_list().into_iter().map(str::to_owned).collect(),
        },
        return_to: format!("/store/{id}"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(rating: Option<f64>, sales: Option<u32>) -> Product {
        let mut product: Product =
            serde_json::from_str(r#"{"id": 1, "name": "Kit", "price": 10}"#).unwrap();
        product.rating = rating;
        product.sales = sales;
        product
    }

    #[test]
    fn test_rating_label() {
        assert_eq!(rating_label(&product(None, Some(3))), None);
        assert_eq!(rating_label(&product(Some(4.5), None)).as_deref(), Some("★ 4.5"));
        assert_eq!(
            rating_label(&product(Some(4.5), Some(12))).as_deref(),
            Some("★ 4.5 (12)")
        );
    }

    #[test]
    fn test_filters_view_marks_selection() {
        let query = StoreQuery::from_query_str("tags=Dark&categories=Sales&sort=price_desc");
        let view = FiltersView::from(&query);
        assert!(view.sales_active);
        assert!(view.tags.iter().any(|t| t.value == "Dark" && t.checked));
        assert_eq!(view.sort_label, "Price ↑");
        assert!(view.is_filtered);
        assert_eq!(view.max_price, PRICE_MAX);
    }
}

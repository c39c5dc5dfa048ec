//! Admin product management.
//!
//! Create and update are multipart so the image can travel with the form.
//! The image goes to the backend first; its URL is then stored on the
//! product.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use deadforest_core::catalog::{
    AdminProductFilter, FILE_TYPES, PROGRAMS, ProductCounts, StatusFilter, admin_categories,
};
use deadforest_core::models::{Product, ProductPayload, TopProduct};
use deadforest_core::validation::{
    PRODUCT_IMAGE_MAX_BYTES, ValidationError, check_product_file, check_product_image,
};
use deadforest_core::{Price, ProductId, ProductStatus};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{AdminNav, AdminSection, load_layout};
use crate::api::{ApiError, ApiToken};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAdmin, set_flash};
use crate::models::Flash;
use crate::routes::layout::Layout;
use crate::routes::multipart::MultipartForm;
use crate::state::AppState;

/// Multipart part carrying the product image.
const IMAGE_FIELD: &str = "image_file";
/// Multipart part carrying the downloadable file. Only its name is
/// checked; the contents are drained and never forwarded.
const PRODUCT_FILE_FIELD: &str = "product_file";

// =============================================================================
// Table
// =============================================================================

/// Product row for the admin table.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub price: String,
    pub image_url: String,
    pub status: &'static str,
    pub status_class: &'static str,
    pub is_active: bool,
    pub sales: u32,
    pub created_at: String,
}

impl ProductRow {
    fn new(state: &AppState, product: &Product, sales: &HashMap<ProductId, u32>) -> Self {
        let status = product.status();
        Self {
            id: product.id,
            name: product.name.clone(),
            category: product.category.clone().unwrap_or_default(),
            price: product.price.display(),
            image_url: state.image_url(product.image.as_deref()),
            status: status.as_str(),
            status_class: status.badge_class(),
            is_active: status == ProductStatus::Active,
            sales: sales
                .get(&product.id)
                .copied()
                .or(product.sales)
                .unwrap_or(0),
            created_at: deadforest_core::models::timestamp::display(product.created_at.as_ref()),
        }
    }
}

fn sales_by_product(top: &[TopProduct]) -> HashMap<ProductId, u32> {
    top.iter().map(|p| (p.id, p.sales)).collect()
}

/// Table query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    pub q: Option<String>,
    pub status: Option<String>,
}

/// Products table template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/index.html")]
pub struct ProductsTemplate {
    pub layout: Layout,
    pub nav: AdminNav,
    pub products: Vec<ProductRow>,
    pub counts: ProductCounts,
    pub search: String,
    pub status: &'static str,
    pub statuses: [StatusFilter; 3],
    pub error: Option<String>,
}

/// Display the products table.
#[instrument(skip(state, session, admin))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    admin: RequireAdmin,
    Query(query): Query<ProductsQuery>,
) -> ProductsTemplate {
    let filter = AdminProductFilter {
        search: query.q.unwrap_or_default(),
        status: StatusFilter::parse(query.status.as_deref()),
    };

    let api = state.api().admin(&admin.token);
    let (layout, products, top) = tokio::join!(
        load_layout(&state, &session, &admin),
        api.products(),
        api.top_products()
    );

    let sales = top
        .inspect_err(|e| tracing::debug!(error = %e, "Top products unavailable"))
        .map(|top| sales_by_product(&top))
        .unwrap_or_default();

    let (products, counts, error) = match products {
        Ok(products) => (
            filter
                .apply(&products)
                .into_iter()
                .map(|p| ProductRow::new(&state, p, &sales))
                .collect(),
            ProductCounts::from_products(&products),
            None,
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load admin products");
            (Vec::new(), ProductCounts::default(), Some(e.user_message()))
        }
    };

    ProductsTemplate {
        layout,
        nav: AdminNav::new(AdminSection::Products),
        products,
        counts,
        search: filter.search,
        status: filter.status.as_str(),
        statuses: [StatusFilter::All, StatusFilter::Active, StatusFilter::Disabled],
        error,
    }
}

// =============================================================================
// Form
// =============================================================================

/// A checkbox or select option on the product form.
#[derive(Debug, Clone)]
pub struct FormOption {
    pub value: &'static str,
    pub selected: bool,
}

fn form_options(values: &[&'static str], selected: impl Fn(&str) -> bool) -> Vec<FormOption> {
    values
        .iter()
        .map(|&value| FormOption {
            value,
            selected: selected(value),
        })
        .collect()
}

/// Product form state, from an existing product or a rejected submission.
#[derive(Debug, Clone, Default)]
pub struct ProductFormView {
    pub id: Option<ProductId>,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: String,
    pub tags: String,
    pub programs: Vec<String>,
    pub file_type: String,
    /// Stored image reference, kept when no new file is uploaded.
    pub image: String,
    pub image_url: Option<String>,
    pub status: ProductStatus,
}

impl ProductFormView {
    fn from_product(state: &AppState, product: &Product) -> Self {
        Self {
            id: Some(product.id),
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            category: product.category.clone().unwrap_or_default(),
            price: product.price.amount().to_string(),
            tags: product.tags.clone().unwrap_or_default(),
            programs: product
                .program_list()
                .into_iter()
                .map(str::to_string)
                .collect(),
            file_type: product.file_type.clone().unwrap_or_default(),
            image: product.image.clone().unwrap_or_default(),
            image_url: product
                .image
                .as_deref()
                .map(|image| state.image_url(Some(image))),
            status: product.status(),
        }
    }

    fn from_form(id: Option<ProductId>, form: &MultipartForm) -> Self {
        Self {
            id,
            name: form.text("name").to_string(),
            description: form.text("description").to_string(),
            category: form.text("category").to_string(),
            price: form.text("price").to_string(),
            tags: form.text("tags").to_string(),
            programs: form.all("programs"),
            file_type: form.text("file_type").to_string(),
            image: form.text("image").to_string(),
            image_url: None,
            status: ProductStatus::from_raw(form.get("status")),
        }
    }

    #[must_use]
    pub fn action(&self) -> String {
        self.id
            .map_or_else(|| "/admin/products".to_string(), |id| format!("/admin/products/{id}"))
    }

    #[must_use]
    pub const fn is_edit(&self) -> bool {
        self.id.is_some()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }
}

/// Product form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/form.html")]
pub struct ProductFormTemplate {
    pub layout: Layout,
    pub nav: AdminNav,
    pub product: ProductFormView,
    pub categories: Vec<FormOption>,
    pub programs: Vec<FormOption>,
    pub file_types: Vec<FormOption>,
    pub error: Option<String>,
}

impl ProductFormTemplate {
    fn new(layout: Layout, product: ProductFormView, error: Option<String>) -> Self {
        let categories = admin_categories();
        Self {
            layout,
            nav: AdminNav::new(AdminSection::Products),
            categories: form_options(&categories, |c| c == product.category),
            programs: form_options(&PROGRAMS, |p| product.programs.iter().any(|s| s == p)),
            file_types: form_options(&FILE_TYPES, |t| t == product.file_type),
            product,
            error,
        }
    }
}

/// Display the empty product form.
#[instrument(skip(state, session, admin))]
pub async fn new_form(
    State(state): State<AppState>,
    session: Session,
    admin: RequireAdmin,
) -> ProductFormTemplate {
    let layout = load_layout(&state, &session, &admin).await;
    ProductFormTemplate::new(layout, ProductFormView::default(), None)
}

/// Display the form for an existing product.
#[instrument(skip(state, session, admin))]
pub async fn edit_form(
    State(state): State<AppState>,
    session: Session,
    admin: RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<ProductFormTemplate> {
    let (layout, product) = tokio::join!(
        load_layout(&state, &session, &admin),
        find_product(&state, &admin.token, id)
    );
    let product = product?;

    Ok(ProductFormTemplate::new(
        layout,
        ProductFormView::from_product(&state, &product),
        None,
    ))
}

/// The backend has no admin endpoint for one product, and the public one
/// hides disabled products, so look it up in the admin list.
async fn find_product(state: &AppState, token: &ApiToken, id: ProductId) -> Result<Product> {
    state
        .api()
        .admin(token)
        .products()
        .await?
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Build the request body from the submitted fields.
///
/// # Errors
///
/// Returns a user-facing message for the first invalid field.
pub fn product_payload(form: &MultipartForm) -> std::result::Result<ProductPayload, String> {
    let name = form.text("name").trim();
    if name.is_empty() {
        return Err("Name is required".to_string());
    }
    let price = Price::parse_input(form.text("price"))
        .ok_or_else(|| "Price must be a non-negative number".to_string())?;

    let file_type = non_blank(form.text("file_type"));
    check_product_file(file_type.as_deref(), form.file_name(PRODUCT_FILE_FIELD))
        .map_err(|e| e.to_string())?;

    Ok(ProductPayload {
        name: name.to_string(),
        description: non_blank(form.text("description")),
        category: non_blank(form.text("category")),
        price,
        tags: non_blank(form.text("tags")),
        programs: ProductPayload::join_programs(&form.all("programs")),
        file_type,
        image: non_blank(form.text("image")),
        status: ProductStatus::from_raw(form.get("status")),
    })
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Why a product could not be saved.
enum SaveError {
    Invalid(String),
    Api(ApiError),
}

impl From<ValidationError> for SaveError {
    fn from(err: ValidationError) -> Self {
        Self::Invalid(err.to_string())
    }
}

impl From<ApiError> for SaveError {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}

/// Validate, upload the image if one was chosen, then create or update.
async fn save_product(
    state: &AppState,
    token: &ApiToken,
    id: Option<ProductId>,
    form: &mut MultipartForm,
) -> std::result::Result<Product, SaveError> {
    let mut payload = product_payload(form).map_err(SaveError::Invalid)?;

    if let Some(file) = form.file.take() {
        check_product_image(file.content_type.as_deref(), file.size())?;
        let uploaded = state.api().admin(token).upload_product_image(file).await?;
        payload.image = Some(uploaded.image_url);
    }

    let api = state.api().admin(token);
    let product = match id {
        Some(id) => api.update_product(id, &payload).await?,
        None => api.create_product(&payload).await?,
    };
    Ok(product)
}

async fn handle_save(
    state: AppState,
    session: Session,
    admin: RequireAdmin,
    id: Option<ProductId>,
    multipart: Multipart,
) -> Result<Response> {
    let mut form = MultipartForm::read(multipart, IMAGE_FIELD, PRODUCT_IMAGE_MAX_BYTES).await?;

    let error = match save_product(&state, &admin.token, id, &mut form).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id, admin_id = %admin.user.id, "Product saved");
            let verb = if id.is_some() { "updated" } else { "created" };
            set_flash(&session, Flash::success(format!("Product {} {verb}", product.name))).await;
            return Ok(Redirect::to("/admin/products").into_response());
        }
        Err(SaveError::Invalid(message)) => message,
        Err(SaveError::Api(e)) if e.is_unauthorized() => return Err(e.into()),
        Err(SaveError::Api(e)) => {
            tracing::warn!(error = %e, "Product save failed");
            e.user_message()
        }
    };

    let layout = load_layout(&state, &session, &admin).await;
    let mut view = ProductFormView::from_form(id, &form);
    view.image_url = non_blank(&view.image).map(|image| state.image_url(Some(&image)));
    Ok(ProductFormTemplate::new(layout, view, Some(error)).into_response())
}

/// Create a product.
#[instrument(skip(state, session, admin, multipart))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    admin: RequireAdmin,
    multipart: Multipart,
) -> Result<Response> {
    handle_save(state, session, admin, None, multipart).await
}

/// Update a product.
#[instrument(skip(state, session, admin, multipart))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    admin: RequireAdmin,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Response> {
    handle_save(state, session, admin, Some(id), multipart).await
}

// =============================================================================
// Status and deletion
// =============================================================================

/// Enable a disabled product or disable an active one.
#[instrument(skip(state, session, admin))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    admin: RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Redirect> {
    let product = find_product(&state, &admin.token, id).await?;
    let api = state.api().admin(&admin.token);

    let (result, message) = match product.status() {
        ProductStatus::Active => (api.disable_product(id).await, "disabled"),
        ProductStatus::Disabled => (api.enable_product(id).await, "enabled"),
    };

    match result {
        Ok(()) => {
            tracing::info!(product_id = %id, status = message, "Product status changed");
            set_flash(&session, Flash::success(format!("{} {message}", product.name))).await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Product status change failed");
            set_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Ok(Redirect::to("/admin/products"))
}

/// Delete confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/delete.html")]
pub struct DeleteProductTemplate {
    pub layout: Layout,
    pub nav: AdminNav,
    pub id: ProductId,
    pub name: String,
}

/// Ask before deleting.
#[instrument(skip(state, session, admin))]
pub async fn confirm_delete(
    State(state): State<AppState>,
    session: Session,
    admin: RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<DeleteProductTemplate> {
    let (layout, product) = tokio::join!(
        load_layout(&state, &session, &admin),
        find_product(&state, &admin.token, id)
    );
    let product = product?;

    Ok(DeleteProductTemplate {
        layout,
        nav: AdminNav::new(AdminSection::Products),
        id,
        name: product.name,
    })
}

/// Delete a product.
#[instrument(skip(state, session, admin))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    admin: RequireAdmin,
    Path(id): Path<ProductId>,
) -> Redirect {
    match state.api().admin(&admin.token).delete_product(id).await {
        Ok(()) => {
            tracing::info!(product_id = %id, admin_id = %admin.user.id, "Product deleted");
            set_flash(&session, Flash::success("Product deleted")).await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Product delete failed");
            set_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Redirect::to("/admin/products")
}

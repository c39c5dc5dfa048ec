//! Data shared by every page: navigation and the pending flash message.

use deadforest_core::models::User;
use tower_sessions::Session;

use crate::api::ApiToken;
use crate::error::set_sentry_user;
use crate::middleware::{api_token, take_flash};
use crate::models::Flash;
use crate::state::AppState;

/// Signed-in user as shown in the navigation bar.
#[derive(Debug, Clone)]
pub struct NavUser {
    pub name: String,
    pub initials: String,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
}

impl NavUser {
    fn new(state: &AppState, user: &User) -> Self {
        Self {
            name: user.name.clone(),
            initials: user.initials(),
            avatar_url: user
                .avatar
                .as_deref()
                .map(|avatar| state.image_url(Some(avatar))),
            is_admin: user.is_admin,
        }
    }
}

/// Layout data rendered by `base.html`.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub user: Option<NavUser>,
    /// Units in the cart, for the badge.
    pub cart_count: u32,
    pub flash: Option<Flash>,
}

impl Layout {
    /// Build the layout for the session's user. The profile and the cart are
    /// fetched concurrently; any failure shows the anonymous navigation.
    pub async fn load(state: &AppState, session: &Session) -> Self {
        let flash = take_flash(session).await;
        let Some(token) = api_token(session).await else {
            return Self {
                flash,
                ..Self::default()
            };
        };

        let api = state.api();
        let (user, cart) = tokio::join!(api.auth().me(&token), api.cart(&token).get());

        match user {
            Ok(user) => {
                set_sentry_user(&user.id, Some(user.email.as_str()));
                Self {
                    user: Some(NavUser::new(state, &user)),
                    cart_count: cart.map(|cart| cart.item_count()).unwrap_or(0),
                    flash,
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Navigation falling back to anonymous");
                Self {
                    flash,
                    ..Self::default()
                }
            }
        }
    }

    /// Layout for a user already fetched by the handler; only the cart is
    /// requested.
    pub async fn for_user(state: &AppState, session: &Session, token: &ApiToken, user: &User) -> Self {
        let flash = take_flash(session).await;
        let cart_count = state
            .api()
            .cart(token)
            .get()
            .await
            .map(|cart| cart.item_count())
            .unwrap_or(0);

        Self {
            user: Some(NavUser::new(state, user)),
            cart_count,
            flash,
        }
    }

    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|user| user.is_admin)
    }
}

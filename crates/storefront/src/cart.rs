//! Cart persistence in the shopper's session.
//!
//! The cart is stored under [`CART_STORAGE_KEY`] as its JSON snapshot. A
//! snapshot that no longer parses is dropped and the shopper starts over with
//! an empty cart.

use carsi_core::cart::{CART_STORAGE_KEY, Cart};
use thiserror::Error;
use tower_sessions::Session;

/// Error reading or writing the cart in the session store.
#[derive(Debug, Error)]
pub enum CartSessionError {
    #[error("session store error: {0}")]
    Session(#[from] tower_sessions::session::Error),
    #[error("cart encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Load the session's cart, or an empty one.
///
/// # Errors
///
/// Returns `CartSessionError::Session` if the session store fails.
pub async fn load_cart(session: &Session) -> Result<Cart, CartSessionError> {
    let Some(json) = session.get::<String>(CART_STORAGE_KEY).await? else {
        return Ok(Cart::new());
    };

    match Cart::from_json(&json) {
        Ok(cart) => Ok(cart),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable cart snapshot");
            Ok(Cart::new())
        }
    }
}

/// Write the cart back to the session.
///
/// # Errors
///
/// Returns a `CartSessionError` if encoding or the session store fails.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), CartSessionError> {
    session.insert(CART_STORAGE_KEY, cart.to_json()?).await?;
    Ok(())
}

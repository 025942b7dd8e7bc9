//! Client-side shop state for storefront and admin frontends.
//!
//! [`ShopStore`] holds the state and applies [`Action`]s through a pure
//! reducer. [`ShopSession`] drives it against a [`ShopBackend`], keeping the
//! guest cart in a [`GuestStorage`] until sign-in merges it into the server
//! cart.

mod backend;
mod optimistic;
mod session;
mod storage;
mod store;

pub use backend::{HttpBackend, ShopBackend};
pub use optimistic::OptimisticMutation;
pub use session::{
    DEFAULT_DELIVERY_FEE, Notification, NotificationKind, SessionPhase, ShopSession,
};
pub use storage::{FileStorage, GuestStorage, MemoryStorage, StoredSession};
pub use store::{Action, ShopState, ShopStore};

use thiserror::Error;

use crate::cart::CartError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with `success: false`.
    #[error("{0}")]
    Rejected(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not Authorized Login Again")]
    NotSignedIn,

    #[error("Guest cart merge has not completed")]
    MergePending,

    #[error("{0}")]
    Checkout(String),
}

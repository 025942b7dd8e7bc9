use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::order::{OrderLineItem, OrderStatus, PaymentMethod};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Minor currency units.
    pub price: i64,
    pub category: String,
    pub sub_category: String,
    pub sizes: Vec<String>,
    pub images: Vec<String>,
    pub bestseller: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<OrderLineItem>,
    pub amount: i64,
    pub address: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    /// Whether payment has been received.
    pub payment: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("Email is required")]
    Empty,

    #[error("Email must be at most {max} characters")]
    TooLong { max: usize },

    #[error("Please enter a valid email")]
    Malformed,
}

/// Email address with a basic structural check: one `@`, non-empty local
/// part, and a dotted domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub const MAX_LENGTH: usize = 254;

    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::Malformed)?;
        let domain_ok = !domain.contains('@')
            && domain
                .split('.')
                .filter(|label| !label.is_empty())
                .count()
                >= 2
            && !domain.starts_with('.')
            && !domain.ends_with('.');
        if local.is_empty() || !domain_ok || s.chars().any(char::is_whitespace) {
            return Err(EmailError::Malformed);
        }

        Ok(Self(s.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_accepts_common_shapes() {
        assert_eq!(
            Email::parse(" Jane.Doe+shop@Example.co.uk ").unwrap().as_str(),
            "jane.doe+shop@example.co.uk"
        );
    }

    #[test]
    fn email_rejects_malformed() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
        for bad in ["no-at", "@example.com", "user@", "user@localhost", "a@b@c.com", "a b@c.com", "user@.com"] {
            assert_eq!(Email::parse(bad), Err(EmailError::Malformed), "{bad}");
        }
    }

    #[test]
    fn email_rejects_overlong() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(Email::parse(&long), Err(EmailError::TooLong { .. })));
    }
}

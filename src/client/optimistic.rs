use std::future::Future;

use super::{
    ClientError,
    store::{Action, ShopState, ShopStore},
};

/// Local change applied before the server confirms it, paired with the
/// action that restores the previous state if the server rejects it.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimisticMutation {
    apply: Action,
    inverse: Action,
}

impl OptimisticMutation {
    pub fn new(apply: Action, inverse: Action) -> Self {
        Self { apply, inverse }
    }

    /// Increment of one unit; reverting restores the prior quantity.
    pub fn cart_add(state: &ShopState, item_id: &str, size: &str) -> Self {
        Self::new(
            Action::AddToCart {
                item_id: item_id.to_owned(),
                size: size.to_owned(),
            },
            restore(state, item_id, size),
        )
    }

    pub fn cart_set(state: &ShopState, item_id: &str, size: &str, quantity: i64) -> Self {
        Self::new(
            Action::SetQuantity {
                item_id: item_id.to_owned(),
                size: size.to_owned(),
                quantity,
            },
            restore(state, item_id, size),
        )
    }

    /// Applies the change, awaits `commit`, and applies the inverse if the
    /// commit fails. The commit error is returned unchanged.
    pub async fn run<T, F, Fut>(self, store: &ShopStore, commit: F) -> Result<T, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        store.dispatch(self.apply)?;
        match commit().await {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Err(revert) = store.dispatch(self.inverse) {
                    tracing::warn!(error = %revert, "optimistic revert rejected");
                }
                Err(err)
            }
        }
    }
}

fn restore(state: &ShopState, item_id: &str, size: &str) -> Action {
    Action::SetQuantity {
        item_id: item_id.to_owned(),
        size: size.to_owned(),
        quantity: i64::from(state.cart.quantity(item_id, size)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(item: &str, size: &str, quantity: i64) -> ShopStore {
        let store = ShopStore::default();
        store
            .dispatch(Action::SetQuantity {
                item_id: item.into(),
                size: size.into(),
                quantity,
            })
            .unwrap();
        store
    }

    #[tokio::test]
    async fn failed_commit_reverts_add() {
        let store = store_with("p1", "M", 2);
        let mutation = store.with(|s| OptimisticMutation::cart_add(s, "p1", "M"));

        let result: Result<(), _> = mutation
            .run(&store, || async {
                Err(ClientError::Rejected("server down".into()))
            })
            .await;

        assert!(matches!(result, Err(ClientError::Rejected(_))));
        assert_eq!(store.with(|s| s.cart.quantity("p1", "M")), 2);
    }

    #[tokio::test]
    async fn failed_commit_restores_removed_entry() {
        let store = store_with("p1", "M", 3);
        let mutation = store.with(|s| OptimisticMutation::cart_set(s, "p1", "M", 0));

        let result: Result<(), _> = mutation
            .run(&store, || async {
                Err(ClientError::Rejected("nope".into()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(store.with(|s| s.cart.quantity("p1", "M")), 3);
    }

    #[tokio::test]
    async fn successful_commit_keeps_change() {
        let store = ShopStore::default();
        let mutation = store.with(|s| OptimisticMutation::cart_add(s, "p9", "S"));

        let value = mutation.run(&store, || async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
        assert_eq!(store.with(|s| s.cart.quantity("p9", "S")), 1);
    }

    #[tokio::test]
    async fn invalid_local_change_never_commits() {
        let store = ShopStore::default();
        let mutation = store.with(|s| OptimisticMutation::cart_add(s, "p1", ""));

        let mut committed = false;
        let result: Result<(), _> = mutation
            .run(&store, || {
                committed = true;
                async { Ok(()) }
            })
            .await;
        assert!(matches!(result, Err(ClientError::Cart(_))));
        assert!(!committed);
    }
}

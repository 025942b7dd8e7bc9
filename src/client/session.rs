use std::mem;

use uuid::Uuid;

use super::{
    ClientError,
    backend::ShopBackend,
    optimistic::OptimisticMutation,
    storage::GuestStorage,
    store::{Action, ShopState, ShopStore},
};
use crate::{
    cart::{CartData, CartError},
    dto::orders::PlaceOrderRequest,
    order::{OrderLineItem, PaymentMethod},
};

/// Flat delivery charge added at checkout, in the same minor units as
/// product prices.
pub const DEFAULT_DELIVERY_FEE: i64 = 1000;

/// Guest, then MergePending right after sign-in, then Authenticated once the
/// guest cart has been folded into the server cart. Logout returns to Guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Guest,
    MergePending,
    Authenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// Transient message for the UI to show once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

pub struct ShopSession<B, S> {
    backend: B,
    storage: S,
    store: ShopStore,
    phase: SessionPhase,
    delivery_fee: i64,
    notifications: Vec<Notification>,
}

impl<B: ShopBackend, S: GuestStorage> ShopSession<B, S> {
    /// Restores from storage. A stored token resumes an authenticated
    /// session; the server cart is fetched by [`ShopSession::refresh`]. A
    /// stored token next to a non-empty guest cart means the sign-in merge
    /// never finished, so the session resumes in `MergePending` and
    /// `refresh` completes it.
    pub fn new(backend: B, storage: S) -> Result<Self, ClientError> {
        let stored = storage.load()?;
        let (phase, state) = match stored.token {
            Some(token) if stored.guest_cart.is_empty() => (
                SessionPhase::Authenticated,
                ShopState {
                    token: Some(token),
                    ..ShopState::default()
                },
            ),
            Some(token) => (
                SessionPhase::MergePending,
                ShopState {
                    token: Some(token),
                    cart: stored.guest_cart,
                    ..ShopState::default()
                },
            ),
            None => (
                SessionPhase::Guest,
                ShopState {
                    cart: stored.guest_cart,
                    ..ShopState::default()
                },
            ),
        };

        Ok(Self {
            backend,
            storage,
            store: ShopStore::new(state),
            phase,
            delivery_fee: DEFAULT_DELIVERY_FEE,
            notifications: Vec::new(),
        })
    }

    pub fn with_delivery_fee(mut self, fee: i64) -> Self {
        self.delivery_fee = fee;
        self
    }

    pub fn store(&self) -> &ShopStore {
        &self.store
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn delivery_fee(&self) -> i64 {
        self.delivery_fee
    }

    /// Reloads the catalogue and, when signed in, the server cart. A
    /// pending guest cart merge is completed first.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let products = self.backend.list_products().await;
        let products = self.notify_err(products)?;
        self.store.dispatch(Action::SetProducts(products))?;

        match self.phase {
            SessionPhase::MergePending => self.complete_merge().await,
            SessionPhase::Authenticated => {
                let token = self.token()?;
                let cart = self.backend.get_cart(&token).await;
                let cart = self.notify_err(cart)?;
                self.store.dispatch(Action::SetCart(cart))?;
                Ok(())
            }
            SessionPhase::Guest => Ok(()),
        }
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), ClientError> {
        let token = self.backend.login(email, password).await;
        let token = self.notify_err(token)?;
        self.complete_sign_in(token).await
    }

    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ClientError> {
        let token = self.backend.register(name, email, password).await;
        let token = self.notify_err(token)?;
        self.complete_sign_in(token).await
    }

    /// Stores the token and runs the one-time guest cart merge.
    pub async fn complete_sign_in(&mut self, token: String) -> Result<(), ClientError> {
        self.storage
            .update(|session| session.token = Some(token.clone()))?;
        self.store.dispatch(Action::SetToken(token))?;
        self.phase = SessionPhase::MergePending;
        self.complete_merge().await
    }

    /// Folds the guest cart into the server cart. The guest copy is only
    /// discarded after the server accepted it, so a failed merge can be
    /// retried by calling this again.
    pub async fn complete_merge(&mut self) -> Result<(), ClientError> {
        if self.phase != SessionPhase::MergePending {
            return Ok(());
        }
        let token = self.token()?;
        let guest = self.storage.load()?.guest_cart;

        let merged = self.backend.merge_cart(&token, &guest).await;
        let merged = self.notify_err(merged)?;

        self.storage
            .update(|session| session.guest_cart = CartData::new())?;
        self.store.dispatch(Action::SetCart(merged))?;
        self.phase = SessionPhase::Authenticated;
        tracing::debug!(entries = guest.lines().count(), "guest cart merged");
        Ok(())
    }

    /// Back to guest. The server cart stays as it is for the next sign-in.
    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.storage.update(|session| session.token = None)?;
        let guest = self.storage.load()?.guest_cart;
        self.store.dispatch(Action::ClearToken)?;
        self.store.dispatch(Action::SetCart(guest))?;
        self.store.dispatch(Action::SetOrders(Vec::new()))?;
        self.phase = SessionPhase::Guest;
        Ok(())
    }

    /// Adds one unit. Signed-in sessions update locally first and revert if
    /// the server rejects the change.
    pub async fn add(&mut self, item_id: &str, size: &str) -> Result<(), ClientError> {
        if size.is_empty() {
            return self.notify_err(Err(CartError::MissingSize.into()));
        }

        match self.phase {
            SessionPhase::Authenticated => {
                let token = self.token()?;
                let mutation = self
                    .store
                    .with(|state| OptimisticMutation::cart_add(state, item_id, size));
                let backend = &self.backend;
                let result = mutation
                    .run(&self.store, || backend.add_to_cart(&token, item_id, size))
                    .await
                    .map(drop);
                self.notify_err(result)
            }
            SessionPhase::Guest | SessionPhase::MergePending => {
                let action = Action::AddToCart {
                    item_id: item_id.to_owned(),
                    size: size.to_owned(),
                };
                let result = self.store.dispatch(action).map_err(ClientError::from);
                self.notify_err(result)?;
                self.persist_guest_cart()
            }
        }
    }

    /// Absolute set; zero or less removes the entry.
    pub async fn set_quantity(
        &mut self,
        item_id: &str,
        size: &str,
        quantity: i64,
    ) -> Result<(), ClientError> {
        match self.phase {
            SessionPhase::Authenticated => {
                let token = self.token()?;
                let mutation = self
                    .store
                    .with(|state| OptimisticMutation::cart_set(state, item_id, size, quantity));
                let backend = &self.backend;
                let result = mutation
                    .run(&self.store, || {
                        backend.update_cart(&token, item_id, size, quantity)
                    })
                    .await
                    .map(drop);
                self.notify_err(result)
            }
            SessionPhase::Guest | SessionPhase::MergePending => {
                let action = Action::SetQuantity {
                    item_id: item_id.to_owned(),
                    size: size.to_owned(),
                    quantity,
                };
                let result = self.store.dispatch(action).map_err(ClientError::from);
                self.notify_err(result)?;
                self.persist_guest_cart()
            }
        }
    }

    pub fn read(&self) -> CartData {
        self.store.with(|state| state.cart.clone())
    }

    pub fn count(&self) -> u64 {
        self.store.with(|state| state.cart.count())
    }

    /// Cart subtotal against the loaded catalogue, without delivery.
    pub fn amount_total(&self) -> i64 {
        self.store
            .with(|state| state.cart.amount_total(&state.products))
    }

    /// Snapshot lines for every cart entry whose product is still listed.
    pub fn order_lines(&self) -> Vec<OrderLineItem> {
        self.store.with(|state| {
            state
                .cart
                .lines()
                .filter_map(|line| {
                    let product = state
                        .products
                        .iter()
                        .find(|p| p.id.to_string() == line.product_id)?;
                    Some(OrderLineItem::snapshot(product, line.size, line.quantity))
                })
                .collect()
        })
    }

    /// Places an order for the current cart plus the delivery fee, then
    /// empties the local cart and reloads the order history.
    pub async fn place_order(
        &mut self,
        address: &str,
        payment_method: PaymentMethod,
    ) -> Result<Uuid, ClientError> {
        if self.phase != SessionPhase::Authenticated {
            let err = match self.phase {
                SessionPhase::MergePending => ClientError::MergePending,
                _ => ClientError::NotSignedIn,
            };
            return self.notify_err(Err(err));
        }
        let token = self.token()?;

        let items = self.order_lines();
        if items.is_empty() {
            return self.notify_err(Err(ClientError::Checkout("Your cart is empty".into())));
        }
        let amount = self.amount_total().saturating_add(self.delivery_fee);
        let request = PlaceOrderRequest::new(&items, amount, address, payment_method)?;

        let order_id = self.backend.place_order(&token, &request).await;
        let order_id = self.notify_err(order_id)?;

        self.store.dispatch(Action::SetCart(CartData::new()))?;
        self.notify(NotificationKind::Success, "Order placed successfully");
        tracing::info!(order_id = %order_id, amount, "order placed");

        if let Err(err) = self.load_orders().await {
            tracing::warn!(error = %err, "order history reload failed");
        }
        Ok(order_id)
    }

    pub async fn load_orders(&mut self) -> Result<(), ClientError> {
        let token = self.token()?;
        let orders = self.backend.user_orders(&token).await;
        let orders = self.notify_err(orders)?;
        self.store.dispatch(Action::SetOrders(orders))?;
        Ok(())
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        mem::take(&mut self.notifications)
    }

    fn token(&self) -> Result<String, ClientError> {
        self.store
            .with(|state| state.token.clone())
            .ok_or(ClientError::NotSignedIn)
    }

    fn persist_guest_cart(&self) -> Result<(), ClientError> {
        let cart = self.read();
        self.storage.update(|session| session.guest_cart = cart)
    }

    fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) {
        self.notifications.push(Notification {
            kind,
            message: message.into(),
        });
    }

    fn notify_err<T>(&mut self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        if let Err(err) = &result {
            self.notify(NotificationKind::Error, err.to_string());
        }
        result
    }
}

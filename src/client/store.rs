use tokio::sync::watch;

use crate::{
    cart::{CartData, CartError},
    models::{Order, Product},
};

/// Everything a frontend renders from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShopState {
    pub token: Option<String>,
    pub cart: CartData,
    pub products: Vec<Product>,
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetToken(String),
    ClearToken,
    SetProducts(Vec<Product>),
    SetCart(CartData),
    AddToCart {
        item_id: String,
        size: String,
    },
    SetQuantity {
        item_id: String,
        size: String,
        quantity: i64,
    },
    MergeCart(CartData),
    SetOrders(Vec<Order>),
}

impl ShopState {
    /// Applies one action. Returns whether anything changed; a rejected
    /// action leaves the state untouched.
    pub fn reduce(&mut self, action: Action) -> Result<bool, CartError> {
        let changed = match action {
            Action::SetToken(token) => replace(&mut self.token, Some(token)),
            Action::ClearToken => replace(&mut self.token, None),
            Action::SetProducts(products) => replace(&mut self.products, products),
            Action::SetCart(cart) => replace(&mut self.cart, cart),
            Action::AddToCart { item_id, size } => {
                self.cart.add_one(&item_id, &size)?;
                true
            }
            Action::SetQuantity {
                item_id,
                size,
                quantity,
            } => {
                let previous = self.cart.set_quantity(&item_id, &size, quantity)?;
                i64::from(previous) != quantity.max(0)
            }
            Action::MergeCart(guest) => self.cart.merge(&guest) > 0,
            Action::SetOrders(orders) => replace(&mut self.orders, orders),
        };
        Ok(changed)
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

/// Shared state container. Subscribers are woken only when an action
/// actually changes the state.
#[derive(Debug)]
pub struct ShopStore {
    tx: watch::Sender<ShopState>,
}

impl ShopStore {
    pub fn new(initial: ShopState) -> Self {
        Self {
            tx: watch::Sender::new(initial),
        }
    }

    pub fn dispatch(&self, action: Action) -> Result<bool, CartError> {
        let mut outcome = Ok(false);
        self.tx.send_if_modified(|state| {
            outcome = state.reduce(action);
            matches!(outcome, Ok(true))
        });
        outcome
    }

    pub fn snapshot(&self) -> ShopState {
        self.tx.borrow().clone()
    }

    /// Reads the current state without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&ShopState) -> R) -> R {
        f(&self.tx.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<ShopState> {
        self.tx.subscribe()
    }
}

impl Default for ShopStore {
    fn default() -> Self {
        Self::new(ShopState::default())
    }
}

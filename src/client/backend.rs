use std::{future::Future, sync::Arc};

use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use uuid::Uuid;

use super::ClientError;
use crate::{
    cart::CartData,
    dto::{
        auth::TokenResponse,
        cart::CartResponse,
        orders::{OrderList, PlaceOrderRequest, PlaceOrderResponse},
        products::ProductList,
    },
    middleware::auth::TOKEN_HEADER,
    models::{Order, Product},
    order::OrderStatus,
    response::ApiResponse,
};

/// REST calls a frontend makes. Every method resolves to the payload of a
/// successful envelope or to the server's failure message.
pub trait ShopBackend: Send + Sync {
    fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;

    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;

    fn admin_login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;

    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, ClientError>> + Send;

    fn get_cart(&self, token: &str) -> impl Future<Output = Result<CartData, ClientError>> + Send;

    fn add_to_cart(
        &self,
        token: &str,
        item_id: &str,
        size: &str,
    ) -> impl Future<Output = Result<CartData, ClientError>> + Send;

    fn update_cart(
        &self,
        token: &str,
        item_id: &str,
        size: &str,
        quantity: i64,
    ) -> impl Future<Output = Result<CartData, ClientError>> + Send;

    fn merge_cart(
        &self,
        token: &str,
        guest_cart: &CartData,
    ) -> impl Future<Output = Result<CartData, ClientError>> + Send;

    fn place_order(
        &self,
        token: &str,
        request: &PlaceOrderRequest,
    ) -> impl Future<Output = Result<Uuid, ClientError>> + Send;

    fn user_orders(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Vec<Order>, ClientError>> + Send;

    fn all_orders(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Vec<Order>, ClientError>> + Send;

    fn update_status(
        &self,
        token: &str,
        order_id: Uuid,
        status: OrderStatus,
    ) -> impl Future<Output = Result<Order, ClientError>> + Send;

    fn delete_order(
        &self,
        token: &str,
        order_id: Uuid,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// [`ShopBackend`] over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    inner: Arc<HttpBackendInner>,
}

struct HttpBackendInner {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// `base_url` is the server origin, e.g. `http://localhost:4000`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            inner: Arc::new(HttpBackendInner {
                client,
                base_url: base_url.into().trim_end_matches('/').to_owned(),
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.inner.base_url)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.inner.client.get(self.url(path)).send().await?;
        handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<T, ClientError> {
        let mut request = self.inner.client.post(self.url(path)).json(body);
        if let Some(token) = token {
            request = request.header(TOKEN_HEADER, token);
        }
        let response = request.send().await?;
        handle_response(response).await
    }
}

/// Failure envelopes carry `{error}` instead of the payload type, so the
/// body is read loosely first.
async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    let envelope: ApiResponse<Value> = serde_json::from_slice(&bytes).map_err(|err| {
        tracing::warn!(status = %status, error = %err, "response is not an envelope");
        err
    })?;
    open_envelope(envelope)
}

pub(crate) fn open_envelope<T: DeserializeOwned>(
    envelope: ApiResponse<Value>,
) -> Result<T, ClientError> {
    if !envelope.success {
        return Err(ClientError::Rejected(envelope.message));
    }
    let data = envelope.data.unwrap_or(Value::Null);
    Ok(serde_json::from_value(data)?)
}

impl ShopBackend for HttpBackend {
    async fn register(&self, name: &str, email: &str, password: &str) -> Result<String, ClientError> {
        let body = json!({ "name": name, "email": email, "password": password });
        let resp: TokenResponse = self.post("/user/register", None, &body).await?;
        Ok(resp.token)
    }

    async fn login(&self, email: &str, password: &str) -> Result<String, ClientError> {
        let body = json!({ "email": email, "password": password });
        let resp: TokenResponse = self.post("/user/login", None, &body).await?;
        Ok(resp.token)
    }

    async fn admin_login(&self, email: &str, password: &str) -> Result<String, ClientError> {
        let body = json!({ "email": email, "password": password });
        let resp: TokenResponse = self.post("/user/admin", None, &body).await?;
        Ok(resp.token)
    }

    async fn list_products(&self) -> Result<Vec<Product>, ClientError> {
        let resp: ProductList = self.get("/products/list").await?;
        Ok(resp.items)
    }

    async fn get_cart(&self, token: &str) -> Result<CartData, ClientError> {
        let resp: CartResponse = self.post("/cart/get", Some(token), &json!({})).await?;
        Ok(resp.cart_data)
    }

    async fn add_to_cart(
        &self,
        token: &str,
        item_id: &str,
        size: &str,
    ) -> Result<CartData, ClientError> {
        let body = json!({ "item_id": item_id, "size": size });
        let resp: CartResponse = self.post("/cart/add", Some(token), &body).await?;
        Ok(resp.cart_data)
    }

    async fn update_cart(
        &self,
        token: &str,
        item_id: &str,
        size: &str,
        quantity: i64,
    ) -> Result<CartData, ClientError> {
        let body = json!({ "item_id": item_id, "size": size, "quantity": quantity });
        let resp: CartResponse = self.post("/cart/update", Some(token), &body).await?;
        Ok(resp.cart_data)
    }

    async fn merge_cart(&self, token: &str, guest_cart: &CartData) -> Result<CartData, ClientError> {
        let body = json!({ "guest_cart": guest_cart });
        let resp: CartResponse = self.post("/cart/merge", Some(token), &body).await?;
        Ok(resp.cart_data)
    }

    async fn place_order(
        &self,
        token: &str,
        request: &PlaceOrderRequest,
    ) -> Result<Uuid, ClientError> {
        let resp: PlaceOrderResponse = self.post("/order/place", Some(token), request).await?;
        Ok(resp.order_id)
    }

    async fn user_orders(&self, token: &str) -> Result<Vec<Order>, ClientError> {
        let resp: OrderList = self.post("/order/userOrders", Some(token), &json!({})).await?;
        Ok(resp.items)
    }

    async fn all_orders(&self, token: &str) -> Result<Vec<Order>, ClientError> {
        let resp: OrderList = self.post("/order/list", Some(token), &json!({})).await?;
        Ok(resp.items)
    }

    async fn update_status(
        &self,
        token: &str,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, ClientError> {
        let body = json!({ "order_id": order_id, "status": status.as_str() });
        self.post("/order/status", Some(token), &body).await
    }

    async fn delete_order(&self, token: &str, order_id: Uuid) -> Result<(), ClientError> {
        let body = json!({ "order_id": order_id });
        let _: Value = self.post("/order/delete", Some(token), &body).await?;
        Ok(())
    }
}

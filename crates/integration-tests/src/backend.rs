//! Request handling for the mock backend.
//!
//! Orders and payments are deduplicated by `Idempotency-Key` the way the
//! real backend does: a repeated key returns the original result, and a key
//! reused with a different payload is refused.

use std::collections::VecDeque;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use crate::fixtures::{self, ADMIN_LOGIN, ADMIN_TOKEN, CREATED_AT, MEMBER_LOGIN, MEMBER_TOKEN, PASSWORD};
use crate::{RecordedRequest, Reply, Script, Shared, lock};

const API_PREFIX: &str = "/api/v1";

/// An order together with the request that created it.
pub(crate) struct StoredOrder {
    pub(crate) member_id: i64,
    pub(crate) key: String,
    pub(crate) request: Value,
    pub(crate) order: Value,
}

pub(crate) struct StoredPayment {
    pub(crate) key: String,
    pub(crate) request: Value,
}

/// Mutable backend state.
pub(crate) struct Backend {
    pub(crate) requests: Vec<RecordedRequest>,
    pub(crate) scripts: VecDeque<Script>,
    pub(crate) products: Vec<Value>,
    pub(crate) legacy_listing: bool,
    pub(crate) tokens_valid: bool,
    pub(crate) cart: Vec<Value>,
    next_cart_item: i64,
    pub(crate) orders: Vec<StoredOrder>,
    pub(crate) payments: Vec<StoredPayment>,
}

impl Backend {
    pub(crate) fn seeded() -> Self {
        Self {
            requests: Vec::new(),
            scripts: VecDeque::new(),
            products: fixtures::products(),
            legacy_listing: false,
            tokens_valid: true,
            cart: Vec::new(),
            next_cart_item: 100,
            orders: Vec::new(),
            payments: Vec::new(),
        }
    }

    fn take_script(&mut self, method: &Method, path: &str) -> Option<Reply> {
        let index = self
            .scripts
            .iter()
            .position(|script| &script.method == method && script.path == path)?;
        self.scripts.remove(index).map(|script| script.reply)
    }

    fn product(&self, id: i64) -> Option<&Value> {
        self.products.iter().find(|product| product["id"] == id)
    }

    pub(crate) fn add_cart_item(&mut self, product_id: i64, quantity: i64, option_ids: Vec<Value>) {
        self.next_cart_item += 1;
        self.cart.push(json!({
            "id": self.next_cart_item,
            "productId": product_id,
            "quantity": quantity,
            "optionIds": option_ids,
        }));
    }

    // =========================================================================
    // Routing
    // =========================================================================

    fn route(&mut self, request: &RecordedRequest) -> Reply {
        let segments: Vec<&str> = request.path.trim_matches('/').split('/').collect();

        match (request.method.as_str(), segments.as_slice()) {
            ("POST", ["members", "login"]) => self.login(request),
            ("POST", ["members", "register"]) => register(request),
            ("GET", ["products"]) => self.list_products(request),
            ("GET", ["products", "addons"]) => ok(&fixtures::addons()),
            ("GET", ["products", id]) => self.show_product(id),
            ("GET", ["products", id, "options"]) => self.product_options(id),
            ("GET", ["system", "codes"]) => ok(&fixtures::system_codes()),
            ("GET", ["stores", "nearby"]) => {
                let mut store = fixtures::store();
                store["distance"] = json!(1.2);
                ok(&json!([store]))
            }
            ("GET", ["stores", "5"]) => ok(&fixtures::store()),
            ("GET", ["stores", _]) => error(StatusCode::NOT_FOUND, "Store not found"),
            _ => self.route_member(request, &segments),
        }
    }

    /// Endpoints that need a valid bearer token.
    fn route_member(&mut self, request: &RecordedRequest, segments: &[&str]) -> Reply {
        let authorized = self.tokens_valid
            && matches!(request.bearer(), Some(MEMBER_TOKEN | ADMIN_TOKEN));
        if !authorized {
            return error(StatusCode::UNAUTHORIZED, "Authentication required");
        }

        match (request.method.as_str(), segments) {
            ("GET", ["carts"]) => ok(&self.cart_body()),
            ("POST", ["carts", "items"]) => self.add_to_cart(request),
            ("PATCH", ["carts", "items", id]) => self.set_cart_quantity(request, id),
            ("DELETE", ["carts", "items", id]) => {
                let before = self.cart.len();
                self.cart.retain(|item| !matches_id(&item["id"], id));
                if self.cart.len() == before {
                    return error(StatusCode::NOT_FOUND, "Cart item not found");
                }
                ok(&json!({}))
            }
            ("POST", ["orders"]) => self.create_order(request, false),
            ("POST", ["orders", "direct"]) => self.create_order(request, true),
            ("GET", ["orders", "my"]) => {
                let member_id = request
                    .query_param("memberId")
                    .and_then(|id| id.parse::<i64>().ok());
                let orders: Vec<Value> = self
                    .orders
                    .iter()
                    .filter(|stored| Some(stored.member_id) == member_id)
                    .map(|stored| stored.order.clone())
                    .collect();
                ok(&Value::Array(orders))
            }
            ("GET", ["orders", id]) => self.find_order(id).map_or_else(
                || error(StatusCode::NOT_FOUND, "Order not found"),
                |stored| ok(&stored.order),
            ),
            ("POST", ["orders", id, "cancel"]) => self.cancel_order(id),
            ("POST", ["payments"]) => self.pay(request),
            _ => error(StatusCode::NOT_FOUND, "No such endpoint"),
        }
    }

    // =========================================================================
    // Members
    // =========================================================================

    fn login(&mut self, request: &RecordedRequest) -> Reply {
        let body = request.body.clone().unwrap_or(Value::Null);
        if body["password"] != PASSWORD {
            return error(StatusCode::UNAUTHORIZED, "Invalid login ID or password");
        }
        self.tokens_valid = true;
        match body["loginId"].as_str() {
            Some(MEMBER_LOGIN) => ok(&fixtures::member()),
            Some(ADMIN_LOGIN) => ok(&fixtures::admin()),
            _ => error(StatusCode::UNAUTHORIZED, "Invalid login ID or password"),
        }
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    fn list_products(&self, request: &RecordedRequest) -> Reply {
        if self.legacy_listing {
            return ok(&Value::Array(self.products.clone()));
        }

        let page = request
            .query_param("page")
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(0);
        let size = request
            .query_param("size")
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(20)
            .max(1);

        let total = self.products.len();
        let content: Vec<Value> = self
            .products
            .iter()
            .skip(page * size)
            .take(size)
            .cloned()
            .collect();
        let total_pages = total.div_ceil(size);

        ok(&json!({
            "empty": content.is_empty(),
            "content": content,
            "totalPages": total_pages,
            "totalElements": total,
            "last": page + 1 >= total_pages,
            "size": size,
            "number": page,
            "first": page == 0,
        }))
    }

    fn show_product(&self, id: &str) -> Reply {
        id.parse::<i64>()
            .ok()
            .and_then(|id| self.product(id))
            .map_or_else(|| error(StatusCode::NOT_FOUND, "Product not found"), ok)
    }

    fn product_options(&self, id: &str) -> Reply {
        id.parse::<i64>()
            .ok()
            .and_then(|id| self.product(id))
            .map_or_else(
                || error(StatusCode::NOT_FOUND, "Product not found"),
                |product| ok(&product.get("options").cloned().unwrap_or_else(|| json!([]))),
            )
    }

    // =========================================================================
    // Cart
    // =========================================================================

    fn cart_body(&self) -> Value {
        let mut total_price = 0;
        let mut total_quantity = 0;
        for item in &self.cart {
            let quantity = item["quantity"].as_i64().unwrap_or(0);
            total_quantity += quantity;
            if let Some(product) = item["productId"].as_i64().and_then(|id| self.product(id)) {
                total_price += unit_price(product) * quantity;
            }
        }
        json!({
            "id": 1,
            "items": self.cart,
            "totalPrice": total_price,
            "totalQuantity": total_quantity,
        })
    }

    fn add_to_cart(&mut self, request: &RecordedRequest) -> Reply {
        let body = request.body.clone().unwrap_or(Value::Null);
        let (Some(product_id), Some(quantity)) = (body["productId"].as_i64(), body["quantity"].as_i64()) else {
            return error(StatusCode::BAD_REQUEST, "productId and quantity are required");
        };
        if self.product(product_id).is_none() {
            return error(StatusCode::NOT_FOUND, "Product not found");
        }
        let option_ids = body["optionIds"].as_array().cloned().unwrap_or_default();
        self.add_cart_item(product_id, quantity, option_ids);
        ok(&json!({}))
    }

    fn set_cart_quantity(&mut self, request: &RecordedRequest, id: &str) -> Reply {
        let Some(quantity) = request.body.as_ref().and_then(|body| body["quantity"].as_i64()) else {
            return error(StatusCode::BAD_REQUEST, "quantity is required");
        };
        match self.cart.iter_mut().find(|item| matches_id(&item["id"], id)) {
            Some(item) => {
                item["quantity"] = json!(quantity);
                ok(&json!({}))
            }
            None => error(StatusCode::NOT_FOUND, "Cart item not found"),
        }
    }

    // =========================================================================
    // Orders and payments
    // =========================================================================

    fn find_order(&self, id: &str) -> Option<&StoredOrder> {
        self.orders
            .iter()
            .find(|stored| matches_id(&stored.order["id"], id))
    }

    fn create_order(&mut self, request: &RecordedRequest, direct: bool) -> Reply {
        let Some(key) = request.idempotency_key().map(str::to_string) else {
            return error(StatusCode::BAD_REQUEST, "Idempotency-Key header is required");
        };
        let body = request.body.clone().unwrap_or(Value::Null);

        if let Some(stored) = self.orders.iter().find(|stored| stored.key == key) {
            if stored.request != body {
                return error(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "Idempotency-Key was already used for a different order",
                );
            }
            return ok(&stored.order);
        }

        let lines: Vec<(i64, i64)> = if direct {
            match (body["productId"].as_i64(), body["quantity"].as_i64()) {
                (Some(product_id), Some(quantity)) => vec![(product_id, quantity)],
                _ => return error(StatusCode::BAD_REQUEST, "productId and quantity are required"),
            }
        } else {
            self.cart
                .iter()
                .filter_map(|item| Some((item["productId"].as_i64()?, item["quantity"].as_i64()?)))
                .collect()
        };
        if lines.is_empty() {
            return error(StatusCode::BAD_REQUEST, "Cart is empty");
        }

        let mut items = Vec::new();
        let mut total = 0;
        for (product_id, quantity) in lines {
            let Some(product) = self.product(product_id) else {
                return error(StatusCode::NOT_FOUND, "Product not found");
            };
            if product["stockQuantity"].as_i64().unwrap_or(0) < quantity {
                return error(StatusCode::CONFLICT, "Not enough stock");
            }
            let price = unit_price(product);
            total += price * quantity;
            items.push(json!({
                "productId": product_id,
                "productName": product["name"],
                "quantity": quantity,
                "price": price,
            }));
        }

        let id = i64::try_from(self.orders.len()).unwrap_or(i64::MAX) + 1;
        let order = json!({
            "id": id,
            "orderNo": format!("ORD-{id:05}"),
            "totalAmount": total,
            "status": "PENDING",
            "items": items,
            "createdAt": CREATED_AT,
        });
        if !direct {
            self.cart.clear();
        }
        self.orders.push(StoredOrder {
            member_id: body["memberId"].as_i64().unwrap_or_default(),
            key,
            request: body,
            order: order.clone(),
        });
        ok(&order)
    }

    fn cancel_order(&mut self, id: &str) -> Reply {
        let Some(stored) = self
            .orders
            .iter_mut()
            .find(|stored| matches_id(&stored.order["id"], id))
        else {
            return error(StatusCode::NOT_FOUND, "Order not found");
        };
        if stored.order["status"] != "PENDING" && stored.order["status"] != "PAID" {
            return error(StatusCode::CONFLICT, "Order can no longer be cancelled");
        }
        stored.order["status"] = json!("CANCELLED");
        ok(&json!({}))
    }

    fn pay(&mut self, request: &RecordedRequest) -> Reply {
        let Some(key) = request.idempotency_key().map(str::to_string) else {
            return error(StatusCode::BAD_REQUEST, "Idempotency-Key header is required");
        };
        let body = request.body.clone().unwrap_or(Value::Null);

        if let Some(payment) = self.payments.iter().find(|payment| payment.key == key) {
            if payment.request != body {
                return error(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "Idempotency-Key was already used for a different payment",
                );
            }
            return ok(&json!({ "status": "PAID" }));
        }

        let Some(order_id) = body["orderId"].as_i64() else {
            return error(StatusCode::BAD_REQUEST, "orderId is required");
        };
        let Some(stored) = self
            .orders
            .iter_mut()
            .find(|stored| stored.order["id"] == order_id)
        else {
            return error(StatusCode::NOT_FOUND, "Order not found");
        };
        if stored.order["status"] != "PENDING" {
            return error(StatusCode::CONFLICT, "Order is not awaiting payment");
        }
        stored.order["status"] = json!("PAID");
        self.payments.push(StoredPayment { key, request: body });
        ok(&json!({ "status": "PAID" }))
    }
}

fn register(request: &RecordedRequest) -> Reply {
    let body = request.body.clone().unwrap_or(Value::Null);
    ok(&json!({
        "id": 8,
        "loginId": body["loginId"],
        "name": body["name"],
        "role": "USER",
        "email": body["email"],
        "token": "new-member-token",
    }))
}

/// Discount price when present, otherwise the list price.
fn unit_price(product: &Value) -> i64 {
    product["discountPrice"]
        .as_i64()
        .or_else(|| product["price"].as_i64())
        .unwrap_or(0)
}

fn matches_id(value: &Value, id: &str) -> bool {
    id.parse::<i64>().is_ok_and(|id| value == &json!(id))
}

fn ok(body: &Value) -> Reply {
    Reply::json(StatusCode::OK, body)
}

fn error(status: StatusCode, message: &str) -> Reply {
    Reply::json(status, &json!({ "message": message }))
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.status, [(CONTENT_TYPE, "application/json")], self.body).into_response()
    }
}

/// Record the request, then answer from a script or the default routes.
pub(crate) async fn handle(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix(API_PREFIX)
        .unwrap_or_else(|| uri.path())
        .to_string();
    let request = RecordedRequest {
        method,
        path,
        query: uri.query().map(str::to_string),
        headers,
        body: serde_json::from_slice(&body).ok(),
    };

    let mut backend = lock(&state);
    backend.requests.push(request.clone());

    let reply = match backend.take_script(&request.method, &request.path) {
        Some(reply) if reply.after_processing => {
            backend.route(&request);
            reply
        }
        Some(reply) => reply,
        None => backend.route(&request),
    };
    reply.into_response()
}

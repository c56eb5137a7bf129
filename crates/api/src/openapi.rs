//! OpenAPI document and Swagger UI.
//!
//! The document is generated from the handler annotations in [`crate::routes`]
//! and the `ToSchema` derives on the models. It is served next to the health
//! checks, outside the rate limiter.

use axum::Router;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ErrorBody;
use crate::middleware::auth::NOTIFY_SECRET_HEADER;
use crate::models::{
    AddToCartPayload, Address, AddressPayload, Cart, CartItem, Category, CreateCategoryPayload,
    CreateOrderItem, CreateOrderPayload, LoginPayload, Order, OrderItem, OrderItemDetailed,
    OrderWithItems, Payment, PaymentConfirmation, Product, ProductPayload, RegisterPayload,
    Review, ReviewPayload, UpdateOrderPayload, User,
};
use crate::routes::payments::Acknowledged;
use crate::routes::users::LoginResponse;
use crate::routes::{self, addresses, cart, categories, orders, payments, products, reviews, users};

/// Where the JSON document is served.
pub const OPENAPI_JSON: &str = "/api-docs/openapi.json";

/// Swagger UI mount point.
pub const SWAGGER_UI: &str = "/swagger";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Executive",
        description = "Commerce API: accounts, catalog, carts, orders, reviews, addresses and payment reconciliation."
    ),
    paths(
        routes::health,
        routes::readiness,
        users::register,
        users::login,
        users::show,
        categories::index,
        categories::create,
        categories::show,
        products::index,
        products::create,
        products::show,
        products::update,
        products::delete,
        cart::add,
        cart::items,
        orders::create,
        orders::index,
        orders::show,
        orders::update,
        reviews::create,
        reviews::index,
        reviews::show,
        reviews::update,
        reviews::delete,
        addresses::create,
        addresses::current,
        addresses::update,
        payments::confirm,
        payments::by_checkout_id,
    ),
    components(schemas(
        ErrorBody,
        LoginResponse,
        Acknowledged,
        User,
        RegisterPayload,
        LoginPayload,
        Category,
        CreateCategoryPayload,
        Product,
        ProductPayload,
        Cart,
        CartItem,
        AddToCartPayload,
        Order,
        OrderItem,
        OrderItemDetailed,
        OrderWithItems,
        CreateOrderItem,
        CreateOrderPayload,
        UpdateOrderPayload,
        Review,
        ReviewPayload,
        Address,
        AddressPayload,
        Payment,
        PaymentConfirmation,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness and readiness"),
        (name = "users", description = "Accounts and bearer tokens"),
        (name = "catalog", description = "Categories and products"),
        (name = "cart", description = "The caller's cart"),
        (name = "orders", description = "Checkout and order status"),
        (name = "reviews", description = "Product reviews"),
        (name = "addresses", description = "Shipping addresses"),
        (name = "payments", description = "Payment bridge callbacks"),
    )
)]
pub struct ApiDoc;

/// Registers the two credentials the API accepts.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("Token from /api/v1/login; also accepted as ?token="))
                    .build(),
            ),
        );
        components.add_security_scheme(
            "notify_secret",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(NOTIFY_SECRET_HEADER))),
        );
    }
}

/// Swagger UI plus the JSON document it renders.
pub fn docs_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new(SWAGGER_UI)
        .url(OPENAPI_JSON, ApiDoc::openapi())
        .into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::Value;

    use super::*;

    fn document() -> Value {
        serde_json::to_value(ApiDoc::openapi()).unwrap()
    }

    #[test]
    fn test_every_route_is_documented() {
        let doc = document();
        let routes = [
            ("/health", "get"),
            ("/health/ready", "get"),
            ("/api/v1/register", "post"),
            ("/api/v1/login", "post"),
            ("/api/v1/users/{id}", "get"),
            ("/api/v1/categories", "get"),
            ("/api/v1/categories", "post"),
            ("/api/v1/categories/{id}", "get"),
            ("/api/v1/products", "get"),
            ("/api/v1/products", "post"),
            ("/api/v1/products/{id}", "get"),
            ("/api/v1/products/{id}", "put"),
            ("/api/v1/products/{id}", "delete"),
            ("/api/v1/products/{id}/cart", "post"),
            ("/api/v1/products/{id}/reviews", "get"),
            ("/api/v1/products/{id}/reviews", "post"),
            ("/api/v1/cart/my/items", "get"),
            ("/api/v1/orders", "get"),
            ("/api/v1/orders", "post"),
            ("/api/v1/orders/{id}", "get"),
            ("/api/v1/orders/{id}", "patch"),
            ("/api/v1/reviews/{id}", "get"),
            ("/api/v1/reviews/{id}", "put"),
            ("/api/v1/reviews/{id}", "delete"),
            ("/api/v1/address", "get"),
            ("/api/v1/address", "post"),
            ("/api/v1/address/{id}", "put"),
            ("/api/v1/payments/confirm", "post"),
            ("/api/v1/payments/checkout/{checkout_request_id}", "get"),
        ];

        for (path, method) in routes {
            assert!(
                doc["paths"][path][method].is_object(),
                "{method} {path} missing from the document"
            );
        }
        let documented: usize = doc["paths"]
            .as_object()
            .unwrap()
            .values()
            .map(|item| item.as_object().unwrap().len())
            .sum();
        assert_eq!(documented, routes.len());
    }

    #[test]
    fn test_security_schemes() {
        let doc = document();
        let schemes = &doc["components"]["securitySchemes"];
        assert_eq!(schemes["bearer_auth"]["type"], "http");
        assert_eq!(schemes["bearer_auth"]["scheme"], "bearer");
        assert_eq!(schemes["notify_secret"]["type"], "apiKey");
        assert_eq!(schemes["notify_secret"]["in"], "header");
        assert_eq!(schemes["notify_secret"]["name"], NOTIFY_SECRET_HEADER);

        let confirm = &doc["paths"]["/api/v1/payments/confirm"]["post"];
        assert!(confirm["security"][0]["notify_secret"].is_array());
        let place = &doc["paths"]["/api/v1/orders"]["post"];
        assert!(place["security"][0]["bearer_auth"].is_array());
        assert!(doc["paths"]["/api/v1/products"]["get"]["security"].is_null());
    }

    #[test]
    fn test_money_fields_are_numbers() {
        let doc = document();
        let schemas = &doc["components"]["schemas"];
        assert_eq!(schemas["Order"]["properties"]["total"]["type"], "number");
        assert_eq!(schemas["Product"]["properties"]["price"]["type"], "number");
        assert_eq!(schemas["Payment"]["properties"]["amount"]["type"], "number");
        assert!(schemas["ErrorBody"]["properties"]["error"].is_object());
    }
}

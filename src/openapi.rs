use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "cartpay-api",
        description = "Cart management and payment gateway integration API"
    ),
    paths(
        crate::handlers::carts::add_cart_line,
        crate::handlers::carts::get_cart,
        crate::handlers::carts::update_cart_line,
        crate::handlers::carts::remove_cart_line,
        crate::handlers::payments::initiate_payment,
        crate::handlers::payment_webhooks::payment_webhook,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::handlers::carts::AddCartLineRequest,
        crate::handlers::carts::UpdateCartLineRequest,
        crate::handlers::carts::RemoveCartLineRequest,
        crate::handlers::carts::CartLineResponse,
        crate::handlers::carts::CartResponse,
        crate::handlers::payments::InitiatePaymentRequest,
        crate::services::carts::CartLineDetail,
    )),
    tags(
        (name = "Cart", description = "Cart line management"),
        (name = "Payments", description = "Payment initiation and webhook reconciliation")
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at /docs, serving the generated document
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}

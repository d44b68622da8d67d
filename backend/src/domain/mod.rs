//! Domain primitives, services, and ports for the storefront services.
//!
//! Purpose: keep the catalogue, cart, checkout, order, and authentication
//! rules independent of HTTP and storage. Adapters reach the domain through
//! the services below and are reached by it through [`ports`].
//!
//! Public surface:
//! - Error, ErrorCode - API error payload and stable codes.
//! - Album, Price, CartItem, Order and friends - validated value types.
//! - CatalogService, CartService, CheckoutService, OrderService,
//!   AuthService - use-cases driven by the inbound adapters.

pub mod album;
pub mod auth;
pub mod auth_service;
pub mod cart;
pub mod cart_service;
pub mod catalog_service;
pub mod checkout;
pub mod checkout_service;
pub mod error;
pub mod idempotency;
pub mod order;
pub mod order_service;
pub mod password;
pub mod payment;
pub mod ports;
pub mod retry;
pub mod trace_id;
pub mod user;

pub use self::album::{
    Album, AlbumId, AlbumValidationError, NewAlbum, Price, PriceValidationError, sum_line_totals,
};
pub use self::auth::{
    AuthSession, EmptyTokenError, IssuedToken, LoginCredentials, LoginValidationError,
    SessionToken, TokenDigest,
};
pub use self::auth_service::{AuthService, BOOTSTRAP_ADMIN_USERNAME};
pub use self::cart::{
    AlbumDetails, Cart, CartItem, CartItemId, CartSessionId, CartSessionIdError, Quantity,
    QuantityError,
};
pub use self::cart_service::CartService;
pub use self::catalog_service::{CatalogPorts, CatalogService, CoverUpload};
pub use self::checkout::{CheckoutForm, CheckoutValidationError, REQUIRED_FIELDS, field_label};
pub use self::checkout_service::{
    CheckoutOutcome, CheckoutPorts, CheckoutRejection, CheckoutService,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::idempotency::{
    IDEMPOTENCY_KEY_HEADER, IdempotencyKey, IdempotencyKeyValidationError, PayloadHash,
    PayloadHashError,
};
pub use self::order::{
    BillingInfo, CustomerDetails, EmptyStatusError, Order, OrderDraft, OrderId, OrderLine,
    OrderNumber, OrderReceipt, OrderStatus, OrderSummary, OrderValidationError, PaymentSummary,
    ShippingInfo,
};
pub use self::order_service::{CreateOrderOutcome, MAX_ORDER_NUMBER_ATTEMPTS, OrderService};
pub use self::payment::{PaymentDecision, PaymentGate, SimulatedPaymentGate};
pub use self::retry::{RetryPolicy, Sleeper, TokioSleeper, Transient, retry_with_backoff};
pub use self::trace_id::TraceId;
pub use self::user::{NewUser, Role, User, UserId, UserProfile, UserRecord};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use storefront::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;

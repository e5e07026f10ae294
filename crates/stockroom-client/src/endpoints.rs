//! API paths and the public/protected classification.

/// Login endpoint.
pub const LOGIN: &str = "/auth/login/";
/// Registration endpoint.
pub const REGISTER: &str = "/auth/register/";
/// Email verification endpoint (`GET ?token=`).
pub const VERIFY_EMAIL: &str = "/auth/verify-email/";
/// Password reset request endpoint.
pub const PASSWORD_RESET: &str = "/auth/password-reset/";
/// Password reset confirmation endpoint.
pub const PASSWORD_RESET_CONFIRM: &str = "/auth/password-reset/confirm/";
/// Logout endpoint (protected).
pub const LOGOUT: &str = "/auth/logout/";
/// Current user endpoint (protected).
pub const CURRENT_USER: &str = "/auth/user/";

/// Catalog categories collection.
pub const CATEGORIES: &str = "/catalog/categories/";
/// Catalog products collection (`?category=`, `?search=`).
pub const PRODUCTS: &str = "/catalog/products/";
/// Orders collection.
pub const ORDERS: &str = "/orders/";
/// Order statistics.
pub const ORDER_STATS: &str = "/orders/stats/";
/// Payment transactions across all orders.
pub const TRANSACTIONS: &str = "/orders/transactions/";
/// Paystack transaction initialization.
pub const PAYSTACK_INITIALIZE: &str = "/orders/payments/paystack/initialize/";
/// Paystack verification; the reference is appended.
pub const PAYSTACK_VERIFY: &str = "/orders/payments/paystack/verify/";
/// Inventory SKUs collection.
pub const SKUS: &str = "/inventory/skus/";
/// Inventory alerts collection (`?type=`, `?acknowledged=`).
pub const ALERTS: &str = "/inventory/alerts/";

/// Paths that never carry credentials.
pub const DEFAULT_PUBLIC_ENDPOINTS: [&str; 5] = [
    LOGIN,
    REGISTER,
    PASSWORD_RESET,
    PASSWORD_RESET_CONFIRM,
    VERIFY_EMAIL,
];

/// Decides whether a request URL is public.
///
/// A URL is public when it contains any allow-listed path as a substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPolicy {
    public: Vec<String>,
}

impl EndpointPolicy {
    /// Policy with an explicit allow-list.
    pub fn new<I, S>(public: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            public: public.into_iter().map(Into::into).collect(),
        }
    }

    /// Add more public paths.
    pub fn with_public<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public.extend(extra.into_iter().map(Into::into));
        self
    }

    /// Whether `url` targets a public endpoint.
    pub fn is_public(&self, url: &str) -> bool {
        self.public.iter().any(|p| !p.is_empty() && url.contains(p.as_str()))
    }

    /// The allow-list.
    pub fn public_endpoints(&self) -> &[String] {
        &self.public
    }
}

impl Default for EndpointPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_ENDPOINTS)
    }
}

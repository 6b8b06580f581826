use axum::{
    routing::{get, post},
    Router,
};

pub mod accounts;
pub mod auth;
pub mod common;
pub mod contacts;
pub mod invoices;
pub mod ledger;
pub mod payments;
pub mod portal;
pub mod products;
pub mod purchase_orders;
pub mod reports;
pub mod sales_orders;
pub mod system;
pub mod taxes;
pub mod users;

use ledgerly_invoicing::InvoiceKind;

/// Endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/auth/me", get(auth::me))
        .nest("/users", users::router())
        .nest("/contacts", contacts::router())
        .nest("/products", products::router())
        .nest("/taxes", taxes::router())
        .nest("/accounts", accounts::router())
        .nest("/purchase-orders", purchase_orders::router())
        .nest("/sales-orders", sales_orders::router())
        .nest("/vendor-bills", invoices::router(InvoiceKind::VendorBill))
        .nest("/customer-invoices", invoices::router(InvoiceKind::CustomerInvoice))
        .nest("/payments", payments::router())
        .nest("/ledger", ledger::router())
        .nest("/reports", reports::router())
        .nest("/portal", portal::router())
}

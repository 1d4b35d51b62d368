//! Meal orders and payment verification

use tracing::info;

use crate::models::{CreateOrder, OrderDetails, OrderHistory, PaymentVerification, VerificationResult};
use crate::{AuthenticatedClient, Error, Result};

pub const ORDERS: &str = "api/payments/orders/";
pub const CREATE_ORDER: &str = "api/payments/create-order/";
pub const VERIFY_PAYMENT: &str = "api/payments/verify-payment/";

/// Order history, newest first. Not paginated.
pub async fn history(client: &AuthenticatedClient) -> Result<Vec<OrderHistory>> {
    client.get(ORDERS, &[]).await?.json()
}

pub async fn create(client: &AuthenticatedClient, order: &CreateOrder) -> Result<OrderDetails> {
    if order.servings == 0 {
        return Err(Error::InvalidRequest("servings must be at least 1".into()));
    }
    let details: OrderDetails = client.post(CREATE_ORDER, order).await?.json()?;
    info!(order_id = %details.order_id, amount = details.amount, "order created");
    Ok(details)
}

/// Forward the gateway's signed callback. A failed signature check comes
/// back as a 400 `Http` error carrying `{status: "failed", message}`.
pub async fn verify_payment(
    client: &AuthenticatedClient,
    payment: &PaymentVerification,
) -> Result<VerificationResult> {
    client.post(VERIFY_PAYMENT, payment).await?.json()
}

//! Order-status lookup: fetch the raw row, then normalize it.

use orderdesk_core::{normalize, CanonicalOrderStatus};
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::ServerState;

const SERVICE: &str = "order status service";

/// Looks up `customer` and returns the canonical order status.
pub async fn lookup(state: &ServerState, customer: &str) -> Result<CanonicalOrderStatus, AppError> {
    debug!("Looking up order for {:?}", customer);
    let raw = state.orders.fetch(customer).await.map_err(|e| {
        error!("Order lookup for {:?} failed: {}", customer, e);
        AppError::upstream(SERVICE, &e)
    })?;

    let Some(raw) = raw else {
        info!("No order found for {:?}", customer);
        return Err(AppError::NotFound("No order found for that customer.".into()));
    };

    normalize(&raw).map_err(|e| {
        warn!("Order record for {:?} is incomplete: {}", customer, e);
        AppError::from(e)
    })
}

//! Gateway detection.
//!
//! Inspects an inbound notification's shape and selects the concrete
//! gateway that sent it. The rules are deliberately minimal and evaluated
//! in order; anything matching neither is rejected before any validation
//! or signature work happens.

use super::{GatewayKind, Notification};
use crate::error::{KassaflowError, Result};

/// Select the gateway variant for a notification.
///
/// 1. JSON body carrying `merchant_id` → MegaKassa.
/// 2. Otherwise a body carrying `project` → TopKassa.
/// 3. Otherwise → `GatewayNotFound`.
pub fn detect(notification: &Notification) -> Result<GatewayKind> {
    if notification.is_json() && notification.has("merchant_id") {
        Ok(GatewayKind::MegaKassa)
    } else if notification.has("project") {
        Ok(GatewayKind::TopKassa)
    } else {
        Err(KassaflowError::GatewayNotFound)
    }
}

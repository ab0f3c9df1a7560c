//! Notification payload to in-app destination mapping.

use tracing::debug;

use notifsync_core::types::{Destination, NotificationData};

/// Notification list; the fallback destination.
pub const NOTIFICATIONS_ROUTE: &str = "/notifications";
/// Order detail screen.
pub const ORDER_DETAIL_ROUTE: &str = "/order-details";
/// Shopping cart.
pub const CART_ROUTE: &str = "/cart";
/// Negotiation thread.
pub const NEGOTIATION_DETAIL_ROUTE: &str = "/negotiation-details";
/// Return / refund detail screen.
pub const RETURN_DETAIL_ROUTE: &str = "/return-details";
/// Product page.
pub const PRODUCT_DETAIL_ROUTE: &str = "/product-details";

/// Action asking the app to restore a negotiated cart.
const LOAD_CART_ACTION: &str = "load_cart";

/// `data.screen` value, route, and the payload keys forwarded as parameters.
const SCREEN_ROUTES: &[(&str, &str, &[&str])] = &[
    ("Notifications", NOTIFICATIONS_ROUTE, &[]),
    ("OrderDetails", ORDER_DETAIL_ROUTE, &["orderId"]),
    ("Cart", CART_ROUTE, &["cartId"]),
    ("NegotiationDetails", NEGOTIATION_DETAIL_ROUTE, &["negotiationId", "sessionId"]),
    ("ReturnDetails", RETURN_DETAIL_ROUTE, &["returnId", "orderId"]),
    ("ProductDetails", PRODUCT_DETAIL_ROUTE, &["productId"]),
];

/// Resolve the destination for a notification payload.
///
/// A negotiation payload with `action = "load_cart"` opens the cart with
/// `cartId`, `sessionId` and `action` parameters. A missing or unknown
/// `screen` resolves to the notification list.
pub fn resolve_navigation(data: &NotificationData) -> Destination {
    let Some(screen) = data.text("screen") else {
        return Destination::new(NOTIFICATIONS_ROUTE);
    };

    if screen == "NegotiationDetails" && data.text("action").as_deref() == Some(LOAD_CART_ACTION) {
        return with_params(Destination::new(CART_ROUTE), data, &["cartId", "sessionId"])
            .with_param("action", LOAD_CART_ACTION);
    }

    match SCREEN_ROUTES.iter().find(|(name, _, _)| *name == screen) {
        Some((_, route, keys)) => with_params(Destination::new(*route), data, keys),
        None => {
            debug!(screen = %screen, "Unknown notification screen; opening list");
            Destination::new(NOTIFICATIONS_ROUTE)
        }
    }
}

fn with_params(mut destination: Destination, data: &NotificationData, keys: &[&str]) -> Destination {
    for key in keys {
        if let Some(value) = data.text(key) {
            destination = destination.with_param(*key, value);
        }
    }
    destination
}

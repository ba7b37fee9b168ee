//! Manual Fulfillment Workflow
//!
//! Orders with a MANUAL line stay PAID until an admin composes a delivery
//! email. Rendering is a pure function (preview has no side effects); sending
//! dispatches the mail, writes the DeliveryItem records instant fulfillment
//! would have written, and moves the order to DELIVERED. The final status
//! change is a compare-and-set, so a second send cannot re-deliver.

use serde::{Deserialize, Serialize};
use shared::models::{FulfillmentMode, Order, OrderLine, OrderStatus, ProductKind};
use validator::Validate;

use crate::checkout::CheckoutError;
use crate::core::{Config, ServerState};
use crate::db::repository::{delivery, order, product};
use crate::fulfillment::downloads;
use crate::services::OutgoingEmail;
use crate::utils::{AppError, AppResult};

/// What the composed email carries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmailContentType {
    Keys,
    SourceCode,
    AccessLink,
    DigitalAccount,
    Custom,
}

/// Admin-composed email specification
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EmailSpec {
    /// Buyer address (user directory is an upstream collaborator, so the
    /// admin supplies the recipient)
    #[validate(email)]
    pub to: String,
    /// Sender identity override; falls back to the configured identity
    #[validate(email)]
    pub from_email: Option<String>,
    pub from_name: Option<String>,
    /// Subject override; a template subject is used when absent
    pub subject: Option<String>,
    pub content_type: EmailContentType,
    /// One key per unit sold (content type `keys`)
    #[serde(default)]
    pub keys: Vec<String>,
    pub access_link: Option<String>,
    pub account_username: Option<String>,
    pub account_password: Option<String>,
    pub account_note: Option<String>,
    pub custom_html: Option<String>,
}

/// Rendered email: pure output of [`render`]
#[derive(Debug, Clone, Serialize)]
pub struct RenderedEmail {
    pub to: String,
    pub from: String,
    pub from_name: String,
    pub subject: String,
    pub html: String,
}

impl From<RenderedEmail> for OutgoingEmail {
    fn from(r: RenderedEmail) -> Self {
        OutgoingEmail {
            to: r.to,
            from: r.from,
            from_name: r.from_name,
            subject: r.subject,
            html: r.html,
        }
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Total units across MANUAL lines
fn manual_units(lines: &[OrderLine]) -> i64 {
    lines
        .iter()
        .filter(|l| l.fulfillment == FulfillmentMode::Manual)
        .map(|l| l.quantity)
        .sum()
}

/// Render the delivery email. Pure: no side effects, safe to call for
/// preview.
pub fn render(
    order: &Order,
    lines: &[OrderLine],
    spec: &EmailSpec,
    config: &Config,
) -> AppResult<RenderedEmail> {
    spec.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let from = spec
        .from_email
        .clone()
        .filter(|f| !f.is_empty())
        .or_else(|| (!config.mail_from.is_empty()).then(|| config.mail_from.clone()))
        .ok_or_else(|| AppError::Validation("No sender address configured".into()))?;
    let from_name = spec
        .from_name
        .clone()
        .unwrap_or_else(|| config.mail_from_name.clone());
    let subject = spec
        .subject
        .clone()
        .unwrap_or_else(|| format!("Your order {} is ready", order.order_no));

    let item_list: String = lines
        .iter()
        .map(|l| format!("<li>{} × {}</li>", escape_html(&l.product_name), l.quantity))
        .collect();

    let body = match spec.content_type {
        EmailContentType::Keys => {
            let units = manual_units(lines);
            if spec.keys.len() as i64 != units {
                return Err(AppError::Validation(format!(
                    "Expected {} keys (one per unit), got {}",
                    units,
                    spec.keys.len()
                )));
            }
            let keys: String = spec
                .keys
                .iter()
                .map(|k| format!("<li><code>{}</code></li>", escape_html(k)))
                .collect();
            format!("<p>Here are your keys:</p><ul>{keys}</ul>")
        }
        EmailContentType::SourceCode => {
            "<p>Your download links are attached to your order page. \
             Each link allows a limited number of downloads.</p>"
                .to_string()
        }
        EmailContentType::AccessLink => {
            let link = spec
                .access_link
                .as_deref()
                .filter(|l| !l.is_empty())
                .ok_or_else(|| AppError::Validation("Access link is required".into()))?;
            format!(
                "<p>Access your purchase here:</p><p><a href=\"{0}\">{0}</a></p>",
                escape_html(link)
            )
        }
        EmailContentType::DigitalAccount => {
            let username = spec
                .account_username
                .as_deref()
                .filter(|u| !u.is_empty())
                .ok_or_else(|| AppError::Validation("Account username is required".into()))?;
            let password = spec
                .account_password
                .as_deref()
                .filter(|p| !p.is_empty())
                .ok_or_else(|| AppError::Validation("Account password is required".into()))?;
            let note = spec
                .account_note
                .as_deref()
                .map(|n| format!("<p>{}</p>", escape_html(n)))
                .unwrap_or_default();
            format!(
                "<p>Your account credentials:</p>\
                 <p>Username: <code>{}</code><br>Password: <code>{}</code></p>{}",
                escape_html(username),
                escape_html(password),
                note
            )
        }
        EmailContentType::Custom => spec
            .custom_html
            .clone()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| AppError::Validation("Custom content is required".into()))?,
    };

    let html = format!(
        "<html><body>\
         <p>Thank you for your purchase — order <strong>{}</strong>.</p>\
         <ul>{}</ul>\
         {}\
         <p>— {}</p>\
         </body></html>",
        escape_html(&order.order_no),
        item_list,
        body,
        escape_html(&from_name)
    );

    Ok(RenderedEmail {
        to: spec.to.clone(),
        from,
        from_name,
        subject,
        html,
    })
}

/// Preview the delivery email for an order (no side effects)
pub async fn preview(state: &ServerState, order_id: i64, spec: &EmailSpec) -> AppResult<RenderedEmail> {
    let (order, lines) = load_manual_order(state, order_id).await?;
    render(&order, &lines, spec, &state.config)
}

/// Send the delivery email: dispatch mail, write delivery items, move the
/// order to DELIVERED. Fails with `AlreadyDelivered` instead of re-delivering.
pub async fn send(state: &ServerState, order_id: i64, spec: &EmailSpec) -> AppResult<RenderedEmail> {
    let (order, lines) = load_manual_order(state, order_id).await?;
    let rendered = render(&order, &lines, spec, &state.config)?;

    // Dispatch before the write transaction — never inside it
    state
        .mailer
        .send(&rendered.clone().into())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let mut tx = state.pool.begin().await?;
    write_delivery_items(&mut tx, state, &order, &lines, spec).await?;
    let moved = order::transition(&mut *tx, order.id, OrderStatus::Paid, OrderStatus::Delivered)
        .await?;
    if !moved {
        // Lost the race with a concurrent send — keep the first delivery
        return Err(CheckoutError::AlreadyDelivered {
            order_no: order.order_no.clone(),
        }
        .into());
    }
    tx.commit().await?;

    tracing::info!(order_no = %order.order_no, to = %rendered.to, "Manual fulfillment delivered");
    Ok(rendered)
}

async fn load_manual_order(state: &ServerState, order_id: i64) -> AppResult<(Order, Vec<OrderLine>)> {
    let order = order::find_by_id(&state.pool, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {order_id} not found")))?;

    if order.status == OrderStatus::Delivered {
        return Err(CheckoutError::AlreadyDelivered {
            order_no: order.order_no.clone(),
        }
        .into());
    }
    if order.status != OrderStatus::Paid {
        return Err(CheckoutError::InvalidTransition {
            from: order.status,
            to: OrderStatus::Delivered,
        }
        .into());
    }

    let lines = order::lines(&state.pool, order.id).await?;
    if manual_units(&lines) == 0 {
        return Err(AppError::Validation(format!(
            "Order {} has no manual-fulfillment lines",
            order.order_no
        )));
    }
    Ok((order, lines))
}

/// Write the DeliveryItem records instant fulfillment would have written,
/// derived from the composed payload.
async fn write_delivery_items(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    state: &ServerState,
    order: &Order,
    lines: &[OrderLine],
    spec: &EmailSpec,
) -> AppResult<()> {
    let manual_lines: Vec<&OrderLine> = lines
        .iter()
        .filter(|l| l.fulfillment == FulfillmentMode::Manual)
        .collect();

    match spec.content_type {
        EmailContentType::Keys => {
            let units = manual_units(lines);
            if spec.keys.len() as i64 != units {
                return Err(AppError::Validation(format!(
                    "Expected {} keys (one per unit), got {}",
                    units,
                    spec.keys.len()
                )));
            }
            let mut keys = spec.keys.iter();
            for line in &manual_lines {
                for _ in 0..line.quantity {
                    // Counted above, so the iterator cannot run dry
                    let key = keys.next().expect("key count verified");
                    delivery::insert(&mut **tx, order.id, line.product_id, line.kind, key).await?;
                }
            }
        }
        EmailContentType::SourceCode => {
            for line in &manual_lines {
                let product = product::find_by_id(&state.pool, line.product_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Product {} not found", line.product_id))
                    })?;
                let source_file = product.source_file.as_deref().ok_or_else(|| {
                    AppError::Validation(format!(
                        "Product {} has no source file configured",
                        product.id
                    ))
                })?;
                for _ in 0..line.quantity {
                    let token = downloads::mint(
                        &mut **tx,
                        &state.config,
                        order.id,
                        line.product_id,
                        source_file,
                    )
                    .await?;
                    delivery::insert(
                        &mut **tx,
                        order.id,
                        line.product_id,
                        ProductKind::SourceCode,
                        &token,
                    )
                    .await?;
                }
            }
        }
        EmailContentType::AccessLink => {
            let link = spec
                .access_link
                .as_deref()
                .ok_or_else(|| AppError::Validation("Access link is required".into()))?;
            for line in &manual_lines {
                for _ in 0..line.quantity {
                    delivery::insert(&mut **tx, order.id, line.product_id, line.kind, link).await?;
                }
            }
        }
        EmailContentType::DigitalAccount => {
            let content = serde_json::json!({
                "username": spec.account_username,
                "password": spec.account_password,
                "note": spec.account_note,
            })
            .to_string();
            for line in &manual_lines {
                for _ in 0..line.quantity {
                    delivery::insert(&mut **tx, order.id, line.product_id, line.kind, &content)
                        .await?;
                }
            }
        }
        EmailContentType::Custom => {
            let content = spec
                .custom_html
                .as_deref()
                .ok_or_else(|| AppError::Validation("Custom content is required".into()))?;
            for line in &manual_lines {
                for _ in 0..line.quantity {
                    delivery::insert(&mut **tx, order.id, line.product_id, line.kind, content)
                        .await?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::PaymentMethod;

    fn test_order() -> Order {
        Order {
            id: 1,
            order_no: "INV-20260101-0000AB".into(),
            user_id: 7,
            subtotal_idr: 100_000,
            discount_idr: 0,
            total_idr: 100_000,
            status: OrderStatus::Paid,
            payment_method: PaymentMethod::Balance,
            promo_code: None,
            gateway_ref: None,
            fulfillment_note: None,
            paid_at: Some(1),
            created_at: 1,
            updated_at: 1,
        }
    }

    fn test_line(kind: ProductKind, quantity: i64) -> OrderLine {
        OrderLine {
            id: 1,
            order_id: 1,
            product_id: 9,
            product_name: "Pro License".into(),
            category_id: 2,
            quantity,
            unit_price_idr: 100_000,
            line_total_idr: 100_000 * quantity,
            kind,
            fulfillment: FulfillmentMode::Manual,
        }
    }

    fn keys_spec(keys: Vec<&str>) -> EmailSpec {
        EmailSpec {
            to: "buyer@example.com".into(),
            from_email: Some("store@example.com".into()),
            from_name: None,
            subject: None,
            content_type: EmailContentType::Keys,
            keys: keys.into_iter().map(String::from).collect(),
            access_link: None,
            account_username: None,
            account_password: None,
            account_note: None,
            custom_html: None,
        }
    }

    #[test]
    fn render_is_pure_and_fills_defaults() {
        let config = Config::with_overrides("/tmp/lapak-test", 0);
        let order = test_order();
        let lines = [test_line(ProductKind::Keys, 1)];
        let spec = keys_spec(vec!["AAAA-BBBB"]);

        let first = render(&order, &lines, &spec, &config).unwrap();
        let second = render(&order, &lines, &spec, &config).unwrap();

        assert_eq!(first.subject, second.subject);
        assert_eq!(first.html, second.html);
        assert_eq!(first.to, "buyer@example.com");
        assert_eq!(first.from, "store@example.com");
        assert!(first.subject.contains(&order.order_no));
        assert!(first.html.contains("AAAA-BBBB"));
        assert!(first.html.contains("Pro License"));
    }

    #[test]
    fn render_rejects_missing_payload() {
        let config = Config::with_overrides("/tmp/lapak-test", 0);
        let order = test_order();
        let lines = [test_line(ProductKind::Keys, 1)];

        let mut spec = keys_spec(vec![]);
        assert!(render(&order, &lines, &spec, &config).is_err());

        spec.content_type = EmailContentType::AccessLink;
        assert!(render(&order, &lines, &spec, &config).is_err());

        spec.content_type = EmailContentType::DigitalAccount;
        assert!(render(&order, &lines, &spec, &config).is_err());
    }

    #[test]
    fn render_rejects_invalid_recipient() {
        let config = Config::with_overrides("/tmp/lapak-test", 0);
        let order = test_order();
        let lines = [test_line(ProductKind::Keys, 1)];
        let mut spec = keys_spec(vec!["K-1"]);
        spec.to = "not-an-email".into();
        assert!(render(&order, &lines, &spec, &config).is_err());
    }

    #[test]
    fn render_escapes_html_in_keys() {
        let config = Config::with_overrides("/tmp/lapak-test", 0);
        let order = test_order();
        let lines = [test_line(ProductKind::Keys, 1)];
        let spec = keys_spec(vec!["<script>alert(1)</script>"]);
        let rendered = render(&order, &lines, &spec, &config).unwrap();
        assert!(!rendered.html.contains("<script>"));
        assert!(rendered.html.contains("&lt;script&gt;"));
    }
}

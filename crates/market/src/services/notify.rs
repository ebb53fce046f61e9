//! Email notifications for order and negotiation updates.
//!
//! Sending never blocks or fails the request that triggered it: every message
//! is rendered and sent on a spawned task, and failures are only logged. With
//! no SMTP configuration the notifier is disabled and each skipped message is
//! logged at debug level.

use std::sync::Arc;

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use thiserror::Error;

use mayombe_core::order::OrderItem;
use mayombe_core::{NegotiationStatus, OrderId, UserId};

use crate::config::EmailConfig;
use crate::db::{ProfileRepository, RepositoryError};
use crate::models::{Negotiation, Order};

/// One order line as shown in an email.
struct EmailLine {
    name: String,
    quantity: u32,
    total: String,
}

impl EmailLine {
    fn from_item(item: &OrderItem) -> Self {
        Self {
            name: item.name.clone(),
            quantity: item.quantity,
            total: item
                .line_total()
                .map_or_else(|_| "-".to_string(), |t| t.to_string()),
        }
    }
}

#[derive(Template)]
#[template(path = "email/order_status.html")]
struct OrderStatusEmailHtml<'a> {
    order_id: OrderId,
    status: &'a str,
    total: &'a str,
    order_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_status.txt")]
struct OrderStatusEmailText<'a> {
    order_id: OrderId,
    status: &'a str,
    total: &'a str,
    order_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/new_order.html")]
struct NewOrderEmailHtml<'a> {
    order_id: OrderId,
    lines: &'a [EmailLine],
    city: &'a str,
    order_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/new_order.txt")]
struct NewOrderEmailText<'a> {
    order_id: OrderId,
    lines: &'a [EmailLine],
    city: &'a str,
    order_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/negotiation_answered.html")]
struct NegotiationAnsweredEmailHtml<'a> {
    product_name: &'a str,
    proposed_price: &'a str,
    accepted: bool,
    product_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/negotiation_answered.txt")]
struct NegotiationAnsweredEmailText<'a> {
    product_name: &'a str,
    proposed_price: &'a str,
    accepted: bool,
    product_url: &'a str,
}

/// Errors that can occur when sending a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Recipient lookup failed.
    #[error("Recipient lookup failed: {0}")]
    Repository(#[from] RepositoryError),
}

/// A rendered message ready to send.
struct Rendered {
    subject: String,
    text: String,
    html: String,
}

struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl Mailer {
    fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }

    async fn send(&self, to: &str, message: &Rendered) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| NotifyError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| NotifyError::InvalidAddress(to.to_string()))?)
            .subject(&message.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(message.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.html.clone()),
                    ),
            )?;

        self.transport.send(email).await?;

        tracing::info!(to = %to, subject = %message.subject, "Email sent");
        Ok(())
    }
}

/// Fire-and-forget email notifier.
#[derive(Clone)]
pub struct Notifier {
    mailer: Option<Arc<Mailer>>,
    pool: PgPool,
    base_url: Arc<str>,
}

impl Notifier {
    /// Build a notifier. `None` configuration disables sending.
    ///
    /// # Errors
    ///
    /// Returns `SmtpError` if the SMTP relay cannot be configured.
    pub fn new(
        config: Option<&EmailConfig>,
        pool: PgPool,
        base_url: &str,
    ) -> Result<Self, SmtpError> {
        let mailer = config.map(Mailer::new).transpose()?.map(Arc::new);
        if mailer.is_none() {
            tracing::info!("SMTP not configured, email notifications disabled");
        }
        Ok(Self {
            mailer,
            pool,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        })
    }

    /// Whether messages are actually sent.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.mailer.is_some()
    }

    /// Tell the buyer their order changed status.
    pub fn order_status_changed(&self, order: &Order) {
        let order_url = format!("{}/commandes/{}", self.base_url, order.id);
        let status = order.status.label_fr();
        let total = order.total.to_string();

        let message = render_order_status(order.id, status, &total, &order_url);

        self.dispatch("order_status", vec![(order.buyer_id, message)]);
    }

    /// Tell each vendor of a new order about their own lines.
    pub fn order_placed(&self, order: &Order) {
        let order_url = format!("{}/vendeur/commandes/{}", self.base_url, order.id);
        let city = order.delivery_city.as_deref().unwrap_or("-");

        let messages = mayombe_core::order::seller_ids(&order.items)
            .into_iter()
            .map(|seller| {
                let lines: Vec<EmailLine> = order
                    .items
                    .iter()
                    .filter(|item| item.seller_id == seller)
                    .map(EmailLine::from_item)
                    .collect();
                let rendered = render_new_order(order.id, &lines, city, &order_url);
                (seller, rendered)
            })
            .collect();

        self.dispatch("new_order", messages);
    }

    /// Tell the buyer the seller answered their offer.
    pub fn negotiation_answered(&self, negotiation: &Negotiation, product_name: &str) {
        let product_url = format!("{}/produits/{}", self.base_url, negotiation.product_id);
        let proposed_price = negotiation.proposed_price.to_string();
        let accepted = negotiation.status == NegotiationStatus::Accepted;

        let message = render_negotiation_answered(
            product_name,
            &proposed_price,
            accepted,
            &product_url,
        );

        self.dispatch("negotiation_answered", vec![(negotiation.buyer_id, message)]);
    }

    /// Look up recipients and send on a background task.
    fn dispatch(
        &self,
        kind: &'static str,
        messages: Vec<(UserId, Result<Rendered, askama::Error>)>,
    ) {
        let Some(mailer) = self.mailer.clone() else {
            tracing::debug!(kind, "Email notification skipped, SMTP not configured");
            return;
        };
        let pool = self.pool.clone();

        tokio::spawn(async move {
            if let Err(e) = send_all(&mailer, &pool, messages).await {
                tracing::warn!(kind, error = %e, "Email notification failed");
            }
        });
    }
}

fn render_order_status(
    order_id: OrderId,
    status: &str,
    total: &str,
    order_url: &str,
) -> Result<Rendered, askama::Error> {
    Ok(Rendered {
        subject: format!("Votre commande n°{order_id} est {status}"),
        text: OrderStatusEmailText {
            order_id,
            status,
            total,
            order_url,
        }
        .render()?,
        html: OrderStatusEmailHtml {
            order_id,
            status,
            total,
            order_url,
        }
        .render()?,
    })
}

fn render_new_order(
    order_id: OrderId,
    lines: &[EmailLine],
    city: &str,
    order_url: &str,
) -> Result<Rendered, askama::Error> {
    Ok(Rendered {
        subject: format!("Nouvelle commande n°{order_id}"),
        text: NewOrderEmailText {
            order_id,
            lines,
            city,
            order_url,
        }
        .render()?,
        html: NewOrderEmailHtml {
            order_id,
            lines,
            city,
            order_url,
        }
        .render()?,
    })
}

fn render_negotiation_answered(
    product_name: &str,
    proposed_price: &str,
    accepted: bool,
    product_url: &str,
) -> Result<Rendered, askama::Error> {
    let verdict = if accepted { "acceptée" } else { "refusée" };
    Ok(Rendered {
        subject: format!("Votre offre sur {product_name} a été {verdict}"),
        text: NegotiationAnsweredEmailText {
            product_name,
            proposed_price,
            accepted,
            product_url,
        }
        .render()?,
        html: NegotiationAnsweredEmailHtml {
            product_name,
            proposed_price,
            accepted,
            product_url,
        }
        .render()?,
    })
}

async fn send_all(
    mailer: &Mailer,
    pool: &PgPool,
    messages: Vec<(UserId, Result<Rendered, askama::Error>)>,
) -> Result<(), NotifyError> {
    let ids: Vec<UserId> = messages.iter().map(|(id, _)| *id).collect();
    let emails = ProfileRepository::new(pool).emails(&ids).await?;

    for (recipient, rendered) in messages {
        let rendered = rendered?;
        let Some((_, to)) = emails.iter().find(|(id, _)| *id == recipient) else {
            tracing::warn!(user_id = %recipient, "Notification recipient has no profile");
            continue;
        };
        mailer.send(to, &rendered).await?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mayombe_core::{Money, ProductId};

    use super::*;

    #[test]
    fn test_order_status_templates_render() {
        let text = OrderStatusEmailText {
            order_id: OrderId::new(42),
            status: "expédiée",
            total: "12 500 FCFA",
            order_url: "https://mayombe.cg/commandes/42",
        }
        .render()
        .unwrap();
        assert!(text.contains("42"));
        assert!(text.contains("expédiée"));
        assert!(text.contains("12 500 FCFA"));

        let html = OrderStatusEmailHtml {
            order_id: OrderId::new(42),
            status: "expédiée",
            total: "12 500 FCFA",
            order_url: "https://mayombe.cg/commandes/42",
        }
        .render()
        .unwrap();
        assert!(html.contains("<strong>n°42</strong>"));
        assert!(text.contains("https://mayombe.cg/commandes/42"));
    }

    #[test]
    fn test_new_order_lists_vendor_lines() {
        let item = OrderItem {
            product_id: ProductId::new(1),
            seller_id: UserId::new(2),
            name: "Pagne wax <hollandais>".to_string(),
            unit_price: Money::francs(7_500),
            quantity: 2,
            size: None,
            color: None,
        };
        let lines = vec![EmailLine::from_item(&item)];

        let html = NewOrderEmailHtml {
            order_id: OrderId::new(7),
            lines: &lines,
            city: "Brazzaville",
            order_url: "https://mayombe.cg/vendeur/commandes/7",
        }
        .render()
        .unwrap();

        assert!(html.contains("15 000 FCFA"));
        assert!(html.contains("&lt;hollandais&gt;"));
        assert!(html.contains("Brazzaville"));
    }

    #[test]
    fn test_negotiation_templates_reflect_outcome() {
        let accepted = NegotiationAnsweredEmailText {
            product_name: "Sac en raphia",
            proposed_price: "4 000 FCFA",
            accepted: true,
            product_url: "https://mayombe.cg/produits/3",
        }
        .render()
        .unwrap();
        assert!(accepted.contains("acceptée"));

        let rejected = NegotiationAnsweredEmailText {
            product_name: "Sac en raphia",
            proposed_price: "4 000 FCFA",
            accepted: false,
            product_url: "https://mayombe.cg/produits/3",
        }
        .render()
        .unwrap();
        assert!(rejected.contains("refusée"));
    }
}

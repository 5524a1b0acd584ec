//! Transactional email via AWS SES
//!
//! Call sites treat sends as best-effort: failures are logged by the
//! caller and never roll back the mutation that triggered them.

use aws_sdk_sesv2::Client as SesClient;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

async fn send(ses: &SesClient, from: &str, to: &str, subject: &str, body_text: String) -> Result<(), BoxError> {
    let subject = Content::builder().data(subject).build()?;

    let body = Body::builder()
        .text(Content::builder().data(body_text).build()?)
        .build();

    let message = Message::builder().subject(subject).body(body).build();

    ses.send_email()
        .from_email_address(from)
        .destination(Destination::builder().to_addresses(to).build())
        .content(EmailContent::builder().simple(message).build())
        .send()
        .await?;

    Ok(())
}

pub async fn send_order_confirmation(
    ses: &SesClient,
    from: &str,
    to: &str,
    order_number: &str,
    total: &str,
) -> Result<(), BoxError> {
    let body = format!(
        "Thank you for your order!\n\n\
         Order {order_number} is confirmed and being prepared.\n\
         Order total: {total}\n\n\
         We will let you know as soon as it ships."
    );
    send(ses, from, to, "Your order is confirmed", body).await?;
    tracing::info!(to = to, order_number = order_number, "Order confirmation sent");
    Ok(())
}

pub async fn send_shipping_confirmation(
    ses: &SesClient,
    from: &str,
    to: &str,
    order_number: &str,
    tracking_number: &str,
    tracking_url: Option<&str>,
) -> Result<(), BoxError> {
    let mut body = format!(
        "Good news — order {order_number} has shipped!\n\n\
         Tracking number: {tracking_number}\n"
    );
    if let Some(url) = tracking_url {
        body.push_str(&format!("Track your package: {url}\n"));
    }
    send(ses, from, to, "Your order has shipped", body).await?;
    tracing::info!(to = to, order_number = order_number, "Shipping confirmation sent");
    Ok(())
}

pub async fn send_payment_failed(
    ses: &SesClient,
    from: &str,
    to: &str,
    order_number: &str,
) -> Result<(), BoxError> {
    let body = format!(
        "We were unable to process the payment for order {order_number}.\n\
         Please try again with a different payment method."
    );
    send(ses, from, to, "Payment failed", body).await?;
    tracing::info!(to = to, order_number = order_number, "Payment failed email sent");
    Ok(())
}

pub async fn send_refund_processed(
    ses: &SesClient,
    from: &str,
    to: &str,
    order_number: &str,
    amount: &str,
) -> Result<(), BoxError> {
    let body = format!(
        "Your refund of {amount} for order {order_number} has been processed.\n\
         The amount will be returned to your original payment method."
    );
    send(ses, from, to, "Refund processed", body).await?;
    tracing::info!(to = to, order_number = order_number, "Refund processed email sent");
    Ok(())
}

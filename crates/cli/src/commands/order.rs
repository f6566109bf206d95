//! Ordering commands.
//!
//! Both order commands run one checkout attempt: a single idempotency key is
//! minted up front and every automatic retry resends it, so a flaky network
//! never places the same order twice. When retries run out the key is
//! printed; passing it back with `--idempotency-key` (or `--payment-key`)
//! resumes the same attempt instead of starting a new one.
//!
//! # Usage
//!
//! ```bash
//! blossom order checkout --method pickup --name Kim --phone 010-1234-5678 --address Seoul
//! blossom order direct 3 -q 2 --method quick --name Kim --phone 010-1234-5678 \
//!     --address Seoul --pay card
//! blossom order checkout --method pickup --name Kim --phone 010-1234-5678 --address Seoul \
//!     --idempotency-key 5f0c2b7e-3d4a-4c1b-9e8f-0a1b2c3d4e5f
//! blossom orders list
//! blossom orders cancel 42
//! ```

use blossom_core::{IdempotencyKey, OptionId, OrderId, PaymentMethod, ProductId, format_currency};
use blossom_storefront::ApiError;
use blossom_storefront::cart::CartView;
use blossom_storefront::checkout::{
    CartOrder, CheckoutAttempt, CheckoutError, DirectOrder, Payment, RetryPolicy, Submission,
};
use blossom_storefront::types::{DeliveryDetails, Order};
use tracing::info;

use super::{CommandError, Context, out};

/// Keys from an earlier run to resume under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resume {
    pub order_key: Option<IdempotencyKey>,
    pub payment_key: Option<IdempotencyKey>,
}

fn attempt<S: Submission>(
    ctx: &Context,
    submission: S,
    key: Option<IdempotencyKey>,
) -> CheckoutAttempt<S> {
    match key {
        Some(key) => CheckoutAttempt::resume(ctx.client.clone(), submission, key),
        None => CheckoutAttempt::begin(ctx.client.clone(), submission),
    }
}

/// Buy one product without going through the cart.
///
/// # Errors
///
/// Returns an error if signed out, the order is invalid, or it fails after retries.
pub async fn direct(
    ctx: &Context,
    product_id: ProductId,
    quantity: i64,
    option_ids: Vec<OptionId>,
    delivery: DeliveryDetails,
    pay: Option<PaymentMethod>,
    resume: Resume,
) -> Result<(), CommandError> {
    let member_id = ctx
        .client
        .session()
        .member_id()
        .ok_or(ApiError::NotSignedIn)?;

    let order = attempt(
        ctx,
        DirectOrder::new(member_id, product_id, quantity, option_ids, delivery),
        resume.order_key,
    );
    let order = place(ctx, order, "--idempotency-key").await?;
    settle(ctx, order, pay, resume.payment_key).await
}

/// Order everything in the cart.
///
/// A resumed checkout skips the cart check: the earlier try may already have
/// placed the order and emptied the cart.
///
/// # Errors
///
/// Returns an error if signed out, the cart is empty, or the order fails after retries.
pub async fn checkout(
    ctx: &Context,
    delivery: DeliveryDetails,
    pay: Option<PaymentMethod>,
    resume: Resume,
) -> Result<(), CommandError> {
    let order = match resume.order_key {
        Some(key) => {
            let member_id = ctx
                .client
                .session()
                .member_id()
                .ok_or(ApiError::NotSignedIn)?;
            attempt(ctx, CartOrder::new(member_id, delivery), Some(key))
        }
        None => CartView::load(&ctx.client).await?.checkout(delivery)?,
    };
    let order = place(ctx, order, "--idempotency-key").await?;
    settle(ctx, order, pay, resume.payment_key).await
}

/// List the member's orders.
///
/// # Errors
///
/// Returns an error if signed out or the request fails.
pub async fn list(ctx: &Context) -> Result<(), CommandError> {
    let member_id = ctx
        .client
        .session()
        .member_id()
        .ok_or(ApiError::NotSignedIn)?;

    let orders = ctx.client.my_orders(member_id).await?;
    if orders.is_empty() {
        out("No orders yet");
    }
    for order in &orders {
        out(summary(order));
    }
    Ok(())
}

/// Show one order with its items.
///
/// # Errors
///
/// Returns an error if the order cannot be fetched.
pub async fn show(ctx: &Context, id: OrderId) -> Result<(), CommandError> {
    let order = ctx.client.order(id).await?;
    print_order(&order);
    Ok(())
}

/// Cancel an order.
///
/// # Errors
///
/// Returns an error if the backend refuses the cancellation.
pub async fn cancel(ctx: &Context, id: OrderId) -> Result<(), CommandError> {
    ctx.client.cancel_order(id).await?;
    out(format_args!("Order #{id} cancelled"));
    Ok(())
}

/// Run an attempt to completion, retrying transient failures on the same key.
async fn place<S: Submission>(
    ctx: &Context,
    mut attempt: CheckoutAttempt<S>,
    resume_flag: &str,
) -> Result<Order, CommandError> {
    let policy = RetryPolicy::from_config(&ctx.config);
    match attempt.submit_with(&policy).await {
        Ok(order) => {
            info!(
                order_no = %order.order_no,
                idempotency_key = %attempt.key(),
                tries = attempt.tries(),
                "Checkout complete"
            );
            Ok(order)
        }
        Err(e) => {
            report(&e, attempt.key(), resume_flag);
            Err(e.into())
        }
    }
}

/// Pay for a freshly placed order if asked to, then print it.
async fn settle(
    ctx: &Context,
    order: Order,
    pay: Option<PaymentMethod>,
    payment_key: Option<IdempotencyKey>,
) -> Result<(), CommandError> {
    let Some(method) = pay else {
        print_order(&order);
        return Ok(());
    };

    out(format_args!("Order {} placed, paying by {method}", order.order_no));
    let payment = attempt(ctx, Payment::new(order.id, method), payment_key);
    let paid = place(ctx, payment, "--payment-key").await?;
    print_order(&paid);
    Ok(())
}

fn report(err: &CheckoutError, key: &IdempotencyKey, resume_flag: &str) {
    if let Some(failure) = err.failure() {
        let prompt = failure.prompt();
        out(&prompt.message);
        if prompt.retry_offered {
            out(resume_hint(key, resume_flag));
        }
    }
}

fn resume_hint(key: &IdempotencyKey, resume_flag: &str) -> String {
    format!("To retry, run the same command again with {resume_flag} {key}")
}

fn summary(order: &Order) -> String {
    format!(
        "#{} {} {} {} ({} items) {}",
        order.id,
        order.order_no,
        order.status,
        format_currency(order.total_amount),
        order.total_quantity(),
        order.created_at.format("%Y-%m-%d %H:%M"),
    )
}

fn print_order(order: &Order) {
    out(summary(order));
    for item in &order.items {
        out(format_args!(
            "  {} x{} {}",
            item.product_name,
            item.quantity,
            format_currency(item.price)
        ));
    }
}

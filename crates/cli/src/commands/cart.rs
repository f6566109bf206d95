//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! blossom cart show
//! blossom cart add 3 --quantity 2 --option 7
//! blossom cart qty 11 3
//! blossom cart remove 11
//! ```

use blossom_core::{CartItemId, OptionId, ProductId, format_currency};
use blossom_storefront::cart::CartView;

use super::{CommandError, Context, out};

/// Show the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded.
pub async fn show(ctx: &Context) -> Result<(), CommandError> {
    let view = CartView::load(&ctx.client).await?;
    print_cart(&view);
    Ok(())
}

/// Add a product to the cart.
///
/// # Errors
///
/// Returns an error if signed out or the backend rejects the item.
pub async fn add(
    ctx: &Context,
    product_id: ProductId,
    quantity: i64,
    options: Vec<OptionId>,
) -> Result<(), CommandError> {
    let mut view = CartView::load(&ctx.client).await?;
    view.add(product_id, quantity, options).await?;
    print_cart(&view);
    Ok(())
}

/// Change a cart line's quantity.
///
/// # Errors
///
/// Returns an error if signed out or the backend rejects the change.
pub async fn set_quantity(
    ctx: &Context,
    item_id: CartItemId,
    quantity: i64,
) -> Result<(), CommandError> {
    let mut view = CartView::load(&ctx.client).await?;
    view.set_quantity(item_id, quantity).await?;
    print_cart(&view);
    Ok(())
}

/// Remove a cart line.
///
/// # Errors
///
/// Returns an error if signed out or the request fails.
pub async fn remove(ctx: &Context, item_id: CartItemId) -> Result<(), CommandError> {
    let mut view = CartView::load(&ctx.client).await?;
    view.remove(item_id).await?;
    print_cart(&view);
    Ok(())
}

fn print_cart(view: &CartView) {
    if view.is_empty() {
        out("Cart is empty");
        return;
    }
    for line in view.lines() {
        out(format_args!(
            "#{} {} x{}",
            line.item.id, line.product_name, line.item.quantity
        ));
    }
    out(format_args!(
        "{} items, total {}",
        view.total_quantity(),
        format_currency(view.total_price())
    ));
}

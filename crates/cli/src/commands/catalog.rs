//! Catalog commands.
//!
//! # Usage
//!
//! ```bash
//! blossom products list --page 0 --size 20 --sort price,asc
//! blossom products show 3
//! blossom products options 3
//! blossom codes
//! ```

use blossom_core::{ProductId, format_currency};
use blossom_storefront::codes::CodeBook;
use blossom_storefront::types::{PageRequest, Product};

use super::{CommandError, Context, out};

/// List one page of products.
///
/// # Errors
///
/// Returns an error if the listing cannot be fetched.
pub async fn list(
    ctx: &Context,
    page: u32,
    size: u32,
    sort: Option<String>,
    category_id: Option<i64>,
) -> Result<(), CommandError> {
    let request = PageRequest {
        page,
        size,
        sort,
        category_id,
    };
    let listing = ctx.client.products_page(&request).await?;

    for product in &listing.content {
        out(summary(product));
    }
    out(format_args!(
        "page {} of {} ({} products)",
        listing.number + 1,
        listing.total_pages.max(1),
        listing.total_elements
    ));
    if let Some(next) = listing.next_request() {
        out(format_args!("next: --page {}", next.page));
    }
    Ok(())
}

/// Show one product.
///
/// # Errors
///
/// Returns an error if the product cannot be fetched.
pub async fn show(ctx: &Context, id: ProductId) -> Result<(), CommandError> {
    let product = ctx.client.product(id).await?;

    out(summary(&product));
    if let Some(description) = &product.description {
        out(format_args!("  {description}"));
    }
    out(format_args!("  stock: {}", product.stock_quantity));
    if let Some(rating) = product.average_rating {
        out(format_args!(
            "  rating: {rating:.1} ({} reviews)",
            product.review_count.unwrap_or(0)
        ));
    }
    for option in &product.options {
        out(format_args!(
            "  option #{} {}: {} (+{})",
            option.id,
            option.name,
            option.option_value,
            format_currency(option.price_adjustment)
        ));
    }
    Ok(())
}

/// List a product's options.
///
/// # Errors
///
/// Returns an error if the options cannot be fetched.
pub async fn options(ctx: &Context, id: ProductId) -> Result<(), CommandError> {
    let options = ctx.client.product_options(id).await?;
    if options.is_empty() {
        out("No options");
    }
    for option in options {
        out(format_args!(
            "#{} {}: {} (+{})",
            option.id,
            option.name,
            option.option_value,
            format_currency(option.price_adjustment)
        ));
    }
    Ok(())
}

/// Show the category and delivery-type code tables.
///
/// # Errors
///
/// Returns an error if the codes cannot be fetched.
pub async fn codes(ctx: &Context) -> Result<(), CommandError> {
    let book = CodeBook::new(ctx.client.clone());

    out("Categories:");
    for item in book.category_options().await? {
        out(format_args!("  {:<20} {}", item.value, item.label));
    }
    out("Delivery types:");
    for item in book.delivery_type_options().await? {
        out(format_args!("  {:<20} {}", item.value, item.label));
    }
    Ok(())
}

fn summary(product: &Product) -> String {
    let mut line = format!(
        "#{} {} {}",
        product.id,
        product.name,
        format_currency(product.effective_price())
    );
    if product.discount_price.is_some() {
        line.push_str(&format!(" (was {})", format_currency(product.price)));
    }
    if !product.is_orderable() {
        line.push_str(" [sold out]");
    }
    line
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product(price: i64, discount: Option<i64>, stock: i64) -> Product {
        Product {
            id: ProductId::new(3),
            name: "Rose Bouquet".to_string(),
            description: None,
            price: Decimal::from(price),
            discount_price: discount.map(Decimal::from),
            stock_quantity: stock,
            thumbnail_url: None,
            category: None,
            is_active: Some(true),
            is_available_today: None,
            delivery_type: None,
            options: Vec::new(),
            review_count: None,
            total_rating: None,
            average_rating: None,
        }
    }

    #[test]
    fn test_summary_shows_discount() {
        assert_eq!(
            summary(&product(30_000, Some(25_000), 5)),
            "#3 Rose Bouquet ₩25,000 (was ₩30,000)"
        );
    }

    #[test]
    fn test_summary_marks_sold_out() {
        assert_eq!(summary(&product(30_000, None, 0)), "#3 Rose Bouquet ₩30,000 [sold out]");
    }
}

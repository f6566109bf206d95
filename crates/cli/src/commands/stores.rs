//! Store locator commands.
//!
//! # Usage
//!
//! ```bash
//! blossom stores nearby --lat 37.5665 --lon 126.978 --radius-km 3 --keyword rose
//! blossom stores show 12
//! ```

use blossom_core::StoreId;
use blossom_storefront::types::{NearbyStoreQuery, Store};

use super::{CommandError, Context, out};

/// List stores near a point, closest first.
///
/// # Errors
///
/// Returns an error if the query is invalid or the request fails.
pub async fn nearby(
    ctx: &Context,
    lat: f64,
    lon: f64,
    radius_km: f64,
    keyword: Option<String>,
) -> Result<(), CommandError> {
    let mut query = NearbyStoreQuery::new(lat, lon, radius_km);
    if let Some(keyword) = keyword {
        query = query.with_keyword(keyword);
    }

    let mut stores = ctx.client.nearby_stores(&query).await?;
    stores.sort_by(|a, b| {
        a.distance
            .unwrap_or(f64::MAX)
            .total_cmp(&b.distance.unwrap_or(f64::MAX))
    });

    if stores.is_empty() {
        out("No stores found");
    }
    for found in stores {
        let distance = found
            .distance
            .map_or_else(String::new, |km| format!(" ({km:.1} km)"));
        out(format_args!("#{} {}{distance}", found.store.id, found.store.name));
        out(format_args!("  {}", found.store.address));
    }
    Ok(())
}

/// Show one store.
///
/// # Errors
///
/// Returns an error if the store cannot be fetched.
pub async fn show(ctx: &Context, id: StoreId) -> Result<(), CommandError> {
    let store = ctx.client.store(id).await?;
    print_store(&store);
    Ok(())
}

fn print_store(store: &Store) {
    out(format_args!("#{} {}", store.id, store.name));
    out(format_args!("  {}", store.address));
    out(format_args!("  phone: {}", store.phone));
    out(format_args!("  hours: {}-{}", store.open_time, store.close_time));
    if !store.closed_days.is_empty() {
        out(format_args!("  closed: {}", store.closed_days.join(", ")));
    }
    out(format_args!("  {}", store.description));
}

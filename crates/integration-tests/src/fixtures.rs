//! Seed data served by the mock backend.

use serde_json::{Value, json};

pub const MEMBER_LOGIN: &str = "florist";
pub const ADMIN_LOGIN: &str = "rootadmin";
pub const PASSWORD: &str = "secret1";
pub const MEMBER_ID: i64 = 7;
pub const ADMIN_ID: i64 = 1;
pub const MEMBER_TOKEN: &str = "member-token";
pub const ADMIN_TOKEN: &str = "admin-token";

/// Fixed creation time of every mock order.
pub const CREATED_AT: &str = "2025-03-01T10:00:00";

pub fn member() -> Value {
    json!({
        "id": MEMBER_ID,
        "loginId": MEMBER_LOGIN,
        "name": "Kim Florist",
        "role": "USER",
        "email": "florist@example.com",
        "phone": "010-1234-5678",
        "token": MEMBER_TOKEN,
    })
}

pub fn admin() -> Value {
    json!({
        "id": ADMIN_ID,
        "loginId": ADMIN_LOGIN,
        "name": "Root Admin",
        "role": "ROOT_ADMIN",
        "token": ADMIN_TOKEN,
    })
}

pub fn products() -> Vec<Value> {
    vec![
        json!({
            "id": 1,
            "name": "Rose Bouquet",
            "description": "Twelve red roses",
            "price": 30000,
            "discountPrice": 25000,
            "stockQuantity": 10,
            "thumbnailUrl": "https://cdn.example.com/rose.jpg",
            "category": "FLOWER_BOUQUET",
            "isActive": true,
            "deliveryType": "QUICK",
            "options": [
                {"id": 11, "name": "Wrapping", "optionValue": "Premium", "priceAdjustment": 5000}
            ],
            "reviewCount": 4,
            "averageRating": 4.5
        }),
        json!({
            "id": 2,
            "name": "Tulip Basket",
            "price": 45000,
            "stockQuantity": 3,
            "category": "FLOWER_BASKET",
            "isActive": true
        }),
        json!({
            "id": 3,
            "name": "Lily Vase",
            "price": 60000,
            "stockQuantity": 0,
            "isActive": true
        }),
    ]
}

pub fn addons() -> Value {
    json!([
        {"id": 1, "name": "Message Card", "price": 3000},
        {"id": 2, "name": "Glass Vase", "price": 15000}
    ])
}

pub fn system_codes() -> Value {
    json!({
        "category": [
            {"label": "Flower Basket", "value": "FLOWER_BASKET", "order": 2},
            {"label": "Flower Bouquet", "value": "FLOWER_BOUQUET", "order": 1}
        ],
        "deliveryType": [
            {"label": "Pickup", "value": "PICKUP", "order": 1},
            {"label": "Quick Delivery", "value": "QUICK", "order": 2}
        ]
    })
}

pub fn store() -> Value {
    json!({
        "id": 5,
        "name": "Blossom Gangnam",
        "address": "1 Teheran-ro, Seoul",
        "phone": "02-555-0100",
        "lat": 37.4979,
        "lon": 127.0276,
        "description": "Flagship store with same-day delivery",
        "openTime": "09:00",
        "closeTime": "20:00",
        "closedDays": ["SUNDAY"]
    })
}

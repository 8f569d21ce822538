// Catalog models for the five bookable product categories
// Every price is carried in minor currency units (cents) end to end

use serde::{Deserialize, Serialize};
use std::fmt;

// Product category tags, also used as stable key prefixes for schedule entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Golf,
    Hotel,
    Restaurant,
    Experience,
    Package,
}

impl ItemCategory {
    pub const ALL: [ItemCategory; 5] = [
        ItemCategory::Golf,
        ItemCategory::Hotel,
        ItemCategory::Restaurant,
        ItemCategory::Experience,
        ItemCategory::Package,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ItemCategory::Golf => "golf",
            ItemCategory::Hotel => "hotel",
            ItemCategory::Restaurant => "restaurant",
            ItemCategory::Experience => "experience",
            ItemCategory::Package => "package",
        }
    }

    pub fn parse(s: &str) -> Option<ItemCategory> {
        match s {
            "golf" => Some(ItemCategory::Golf),
            "hotel" => Some(ItemCategory::Hotel),
            "restaurant" => Some(ItemCategory::Restaurant),
            "experience" => Some(ItemCategory::Experience),
            "package" => Some(ItemCategory::Package),
            _ => None,
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GolfCourse {
    pub id: String,
    pub name: String,
    pub location: String,
    pub holes: u8,
    pub par: u8,
    pub green_fee_minor: i64,
    pub rating: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub id: String,
    pub name: String,
    pub location: String,
    pub stars: u8,
    pub nightly_rate_minor: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub cuisine: String,
    pub location: String,
    pub average_price_minor: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_minor: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_minor: i64,
    pub includes: Vec<String>,
}

// Tagged union over the catalog categories; immutable once added to an itinerary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum BookableItem {
    Golf(GolfCourse),
    Hotel(Hotel),
    Restaurant(Restaurant),
    Experience(Experience),
    Package(Package),
}

impl BookableItem {
    pub fn id(&self) -> &str {
        match self {
            BookableItem::Golf(c) => &c.id,
            BookableItem::Hotel(h) => &h.id,
            BookableItem::Restaurant(r) => &r.id,
            BookableItem::Experience(e) => &e.id,
            BookableItem::Package(p) => &p.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            BookableItem::Golf(c) => &c.name,
            BookableItem::Hotel(h) => &h.name,
            BookableItem::Restaurant(r) => &r.name,
            BookableItem::Experience(e) => &e.name,
            BookableItem::Package(p) => &p.name,
        }
    }

    pub fn category(&self) -> ItemCategory {
        match self {
            BookableItem::Golf(_) => ItemCategory::Golf,
            BookableItem::Hotel(_) => ItemCategory::Hotel,
            BookableItem::Restaurant(_) => ItemCategory::Restaurant,
            BookableItem::Experience(_) => ItemCategory::Experience,
            BookableItem::Package(_) => ItemCategory::Package,
        }
    }

    // Hotels quote per night; callers multiply by the trip's night count
    pub fn price_minor(&self) -> i64 {
        match self {
            BookableItem::Golf(c) => c.green_fee_minor,
            BookableItem::Hotel(h) => h.nightly_rate_minor,
            BookableItem::Restaurant(r) => r.average_price_minor,
            BookableItem::Experience(e) => e.price_minor,
            BookableItem::Package(p) => p.price_minor,
        }
    }

    // Schedule entry key, `{category}_{id}`
    pub fn entry_key(&self) -> String {
        format!("{}_{}", self.category().key(), self.id())
    }
}

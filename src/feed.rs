// Supplier feed decoding. Catalog lists arrive as JSON per category; the
// golf tee-time supplier speaks attribute-heavy XML. Decoding is pure; the
// REST clients own all I/O.

use crate::catalog::{
    BookableItem, Experience, GolfCourse, Hotel, ItemCategory, Package, Restaurant,
};
use crate::schedule::parse_time_label;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("invalid time label: {0}")]
    InvalidTime(String),
}

// One JSON catalog feed: a flat entry list plus feed metadata
#[derive(Debug, Deserialize, Serialize)]
pub struct CatalogFeed {
    pub feed_id: String,
    pub category: String,
    pub currency: String,
    pub timestamp: String,
    #[serde(default)]
    pub entries: Vec<FeedEntry>,
}

// Wire-level catalog entry; category-specific fields are optional and only
// read for the matching category. Prices come in major units.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedEntry {
    pub id: String,
    pub name: String,
    pub location: String,
    pub description: String,
    pub cuisine: String,
    pub price: f64,
    pub holes: Option<u8>,
    pub par: Option<u8>,
    pub rating: Option<f32>,
    pub stars: Option<u8>,
    pub includes: Vec<String>,
}

fn to_minor(amount: f64) -> Result<i64, FeedError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(FeedError::InvalidPrice(amount.to_string()));
    }
    Ok((amount * 100.0).round() as i64)
}

fn entry_to_item(category: ItemCategory, entry: FeedEntry) -> Result<BookableItem, FeedError> {
    let price_minor = to_minor(entry.price)?;

    let item = match category {
        ItemCategory::Golf => BookableItem::Golf(GolfCourse {
            id: entry.id,
            name: entry.name,
            location: entry.location,
            holes: entry.holes.unwrap_or(18),
            par: entry.par.unwrap_or(72),
            green_fee_minor: price_minor,
            rating: entry.rating.unwrap_or(0.0),
        }),
        ItemCategory::Hotel => BookableItem::Hotel(Hotel {
            id: entry.id,
            name: entry.name,
            location: entry.location,
            stars: entry.stars.unwrap_or(0),
            nightly_rate_minor: price_minor,
        }),
        ItemCategory::Restaurant => BookableItem::Restaurant(Restaurant {
            id: entry.id,
            name: entry.name,
            cuisine: entry.cuisine,
            location: entry.location,
            average_price_minor: price_minor,
        }),
        ItemCategory::Experience => BookableItem::Experience(Experience {
            id: entry.id,
            name: entry.name,
            description: entry.description,
            price_minor,
        }),
        ItemCategory::Package => BookableItem::Package(Package {
            id: entry.id,
            name: entry.name,
            description: entry.description,
            price_minor,
            includes: entry.includes,
        }),
    };

    Ok(item)
}

// Decode a JSON catalog feed into bookable items
pub fn decode_catalog(payload: &[u8]) -> Result<Vec<BookableItem>, FeedError> {
    let feed: CatalogFeed = serde_json::from_slice(payload)?;
    let category = ItemCategory::parse(&feed.category)
        .ok_or_else(|| FeedError::UnknownCategory(feed.category.clone()))?;

    feed.entries
        .into_iter()
        .map(|entry| entry_to_item(category, entry))
        .collect()
}

// Structures for tee-sheet XML deserialization
#[derive(Debug, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
#[serde(rename = "TeeSheetRS")]
pub struct XmlTeeSheet {
    #[serde(rename = "@courseCode")]
    pub course_code: String,
    #[serde(rename = "@date")]
    pub date: String,
    pub tee_times: XmlTeeTimes,
}

#[derive(Debug, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XmlTeeTimes {
    #[serde(rename = "TeeTime")]
    pub tee_times: Vec<XmlTeeTime>,
}

#[derive(Debug, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct XmlTeeTime {
    #[serde(rename = "@time")]
    pub time: String,
    #[serde(rename = "@available")]
    pub available: String,
    #[serde(rename = "@price")]
    pub price: String,
    #[serde(rename = "@currency")]
    pub currency: String,
}

// Decoded tee-sheet availability for one course and day
#[derive(Debug, Clone, PartialEq)]
pub struct TeeSheet {
    pub course_id: String,
    pub date: NaiveDate,
    pub slots: Vec<TeeTimeSlot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeeTimeSlot {
    pub start_minutes: u16,
    pub available: bool,
    pub price_minor: i64,
}

// Decode the supplier's tee-sheet XML into typed slots
pub fn decode_tee_sheet(xml: &str) -> Result<TeeSheet, FeedError> {
    let sheet: XmlTeeSheet =
        quick_xml::de::from_str(xml).map_err(|e| FeedError::Xml(e.to_string()))?;

    let date = NaiveDate::parse_from_str(&sheet.date, "%Y-%m-%d")
        .map_err(|_| FeedError::InvalidDate(sheet.date.clone()))?;

    let mut slots = Vec::with_capacity(sheet.tee_times.tee_times.len());
    for tee_time in sheet.tee_times.tee_times {
        let start_minutes = parse_time_label(&tee_time.time)
            .map_err(|_| FeedError::InvalidTime(tee_time.time.clone()))?;
        let price: f64 = tee_time
            .price
            .parse()
            .map_err(|_| FeedError::InvalidPrice(tee_time.price.clone()))?;

        slots.push(TeeTimeSlot {
            start_minutes,
            available: tee_time.available.eq_ignore_ascii_case("true"),
            price_minor: to_minor(price)?,
        });
    }

    Ok(TeeSheet {
        course_id: sheet.course_code,
        date,
        slots,
    })
}

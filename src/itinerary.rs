// The assembled trip: per-category item lists plus free-text notes
// This is the only state persisted across sessions; everything derived from
// it (schedule, conflicts) is rebuilt on load

use crate::catalog::{BookableItem, ItemCategory};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub golf_courses: Vec<BookableItem>,
    pub hotels: Vec<BookableItem>,
    pub restaurants: Vec<BookableItem>,
    pub experiences: Vec<BookableItem>,
    pub packages: Vec<BookableItem>,
    pub notes: String,
}

impl Itinerary {
    pub fn new() -> Self {
        Self::default()
    }

    fn list(&self, category: ItemCategory) -> &Vec<BookableItem> {
        match category {
            ItemCategory::Golf => &self.golf_courses,
            ItemCategory::Hotel => &self.hotels,
            ItemCategory::Restaurant => &self.restaurants,
            ItemCategory::Experience => &self.experiences,
            ItemCategory::Package => &self.packages,
        }
    }

    fn list_mut(&mut self, category: ItemCategory) -> &mut Vec<BookableItem> {
        match category {
            ItemCategory::Golf => &mut self.golf_courses,
            ItemCategory::Hotel => &mut self.hotels,
            ItemCategory::Restaurant => &mut self.restaurants,
            ItemCategory::Experience => &mut self.experiences,
            ItemCategory::Package => &mut self.packages,
        }
    }

    // Re-adding an item already present under the same (category, id) is a no-op,
    // which keeps the one-entry-per-item schedule invariant trivially true.
    // Returns whether the item was actually added.
    pub fn add(&mut self, item: BookableItem) -> bool {
        let list = self.list_mut(item.category());
        if list.iter().any(|existing| existing.id() == item.id()) {
            return false;
        }
        list.push(item);
        true
    }

    // Returns the removed item, if it was present
    pub fn remove(&mut self, category: ItemCategory, id: &str) -> Option<BookableItem> {
        let list = self.list_mut(category);
        let index = list.iter().position(|item| item.id() == id)?;
        Some(list.remove(index))
    }

    pub fn contains(&self, category: ItemCategory, id: &str) -> bool {
        self.list(category).iter().any(|item| item.id() == id)
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn item_count(&self) -> usize {
        ItemCategory::ALL
            .iter()
            .map(|category| self.list(*category).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    // All items in a fixed category order: golf, hotel, restaurant, experience, package
    pub fn items(&self) -> Vec<&BookableItem> {
        ItemCategory::ALL
            .iter()
            .flat_map(|category| self.list(*category).iter())
            .collect()
    }

    // Trip total in minor units. Hotels quote per night and are multiplied by
    // the night count; every other category is a flat price per item.
    pub fn total_minor(&self, nights: u32) -> i64 {
        self.items()
            .iter()
            .map(|item| match item.category() {
                ItemCategory::Hotel => item.price_minor() * i64::from(nights.max(1)),
                _ => item.price_minor(),
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{GolfCourse, Hotel, Restaurant};

    fn course(id: &str, fee: i64) -> BookableItem {
        BookableItem::Golf(GolfCourse {
            id: id.to_string(),
            name: format!("Course {}", id),
            location: "Troon".to_string(),
            holes: 18,
            par: 71,
            green_fee_minor: fee,
            rating: 4.5,
        })
    }

    fn hotel(id: &str, nightly: i64) -> BookableItem {
        BookableItem::Hotel(Hotel {
            id: id.to_string(),
            name: format!("Hotel {}", id),
            location: "Troon".to_string(),
            stars: 4,
            nightly_rate_minor: nightly,
        })
    }

    fn restaurant(id: &str, price: i64) -> BookableItem {
        BookableItem::Restaurant(Restaurant {
            id: id.to_string(),
            name: format!("Restaurant {}", id),
            cuisine: "Seafood".to_string(),
            location: "Troon".to_string(),
            average_price_minor: price,
        })
    }

    #[test]
    fn test_add_is_idempotent_per_category_and_id() {
        let mut itinerary = Itinerary::new();
        assert!(itinerary.add(course("c1", 10_000)));
        assert!(!itinerary.add(course("c1", 10_000)));
        assert_eq!(itinerary.item_count(), 1);

        // Same id in a different category is a distinct item
        assert!(itinerary.add(hotel("c1", 20_000)));
        assert_eq!(itinerary.item_count(), 2);
    }

    #[test]
    fn test_remove_returns_item() {
        let mut itinerary = Itinerary::new();
        itinerary.add(restaurant("r1", 6_000));

        let removed = itinerary.remove(ItemCategory::Restaurant, "r1");
        assert!(removed.is_some());
        assert!(itinerary.is_empty());
        assert!(itinerary.remove(ItemCategory::Restaurant, "r1").is_none());
    }

    #[test]
    fn test_total_multiplies_hotel_by_nights() {
        let mut itinerary = Itinerary::new();
        itinerary.add(course("c1", 15_000));
        itinerary.add(hotel("h1", 20_000));
        itinerary.add(restaurant("r1", 6_000));

        assert_eq!(itinerary.total_minor(2), 15_000 + 2 * 20_000 + 6_000);
        // A zero-night range still charges one night
        assert_eq!(itinerary.total_minor(0), 15_000 + 20_000 + 6_000);
    }

    #[test]
    fn test_items_follow_category_order() {
        let mut itinerary = Itinerary::new();
        itinerary.add(restaurant("r1", 6_000));
        itinerary.add(course("c1", 15_000));
        itinerary.add(hotel("h1", 20_000));

        let keys: Vec<String> = itinerary.items().iter().map(|i| i.entry_key()).collect();
        assert_eq!(keys, vec!["golf_c1", "hotel_h1", "restaurant_r1"]);
    }

    #[test]
    fn test_persisted_round_trip() {
        let mut itinerary = Itinerary::new();
        itinerary.add(course("c1", 15_000));
        itinerary.set_notes("bring rain gear");

        let json = serde_json::to_string(&itinerary).unwrap();
        let back: Itinerary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, itinerary);
    }
}

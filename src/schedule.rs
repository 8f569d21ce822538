// Itinerary assembler: deterministic calendar placement and conflict detection
// Scheduled entries are derived state, rebuilt whenever the item lists or the
// selected date range change; they are never persisted

use crate::catalog::{BookableItem, ItemCategory};
use crate::itinerary::Itinerary;
use chrono::{Duration, NaiveDate};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

// Default placement slots, minutes since midnight
pub const GOLF_TEE_OFF_MINUTES: u16 = 9 * 60;
pub const GOLF_ROUND_MINUTES: u32 = 240;
pub const DINNER_SEATING_MINUTES: u16 = 19 * 60;
pub const DINNER_DURATION_MINUTES: u32 = 120;
pub const EXPERIENCE_START_MINUTES: u16 = 14 * 60;
pub const EXPERIENCE_DURATION_MINUTES: u32 = 120;
pub const HOTEL_CHECK_IN_MINUTES: u16 = 15 * 60;
pub const HOTEL_CHECK_OUT_MINUTES: u16 = 11 * 60;

// At most this many conflict lines are rendered before the "+N more" tail
pub const CONFLICT_DISPLAY_CAP: usize = 3;

// Durations used when a drop synthesizes an entry that placement never made.
// Note the experience value differs from the generated 120-minute slot; the
// drop table is its own contract.
pub fn drop_duration_minutes(category: ItemCategory) -> u32 {
    match category {
        ItemCategory::Golf => 240,
        ItemCategory::Restaurant => 120,
        ItemCategory::Experience => 180,
        ItemCategory::Hotel => 1440,
        ItemCategory::Package => 120,
    }
}

// Inclusive day range of the trip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    // A reversed range is normalized rather than rejected
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    // Inclusive day count: a same-day range is 1 day
    pub fn day_count(&self) -> u32 {
        (self.end - self.start).num_days() as u32 + 1
    }

    pub fn nights(&self) -> u32 {
        self.day_count() - 1
    }

    pub fn day(&self, index: u32) -> NaiveDate {
        self.start + Duration::days(i64::from(index))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

// Derived calendar placement for one bookable item, keyed `{category}_{id}`.
// Multi-day stays carry an end date/time instead of a meaningful duration.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEntry {
    pub key: String,
    pub category: ItemCategory,
    pub item_id: String,
    pub label: String,
    pub date: NaiveDate,
    pub start_minutes: u16,
    pub duration_minutes: u32,
    pub end: Option<(NaiveDate, u16)>,
}

impl ScheduledEntry {
    pub fn is_span(&self) -> bool {
        self.end.is_some()
    }

    // Half-open minute interval [start, start + duration)
    fn interval(&self) -> (u32, u32) {
        let start = u32::from(self.start_minutes);
        (start, start + self.duration_minutes)
    }
}

// A manual drag placement, kept per item key until the item is removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ManualSlot {
    date: NaiveDate,
    start_minutes: u16,
}

// Two point entries on the same calendar date whose intervals overlap.
// The raw relation is symmetric: both directions are reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub first_key: String,
    pub first_label: String,
    pub second_key: String,
    pub second_label: String,
    pub date: NaiveDate,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("invalid time label: {0:?}")]
    InvalidLabel(String),
    #[error("hour out of range: {0}")]
    HourOutOfRange(u32),
    #[error("minute out of range: {0}")]
    MinuteOutOfRange(u32),
}

// Parse a 12-hour label ("7:30 PM") into minutes since midnight.
// 12 AM maps to 0 and 12 PM to 720; both cases are normalized explicitly.
pub fn parse_time_label(label: &str) -> Result<u16, TimeParseError> {
    let invalid = || TimeParseError::InvalidLabel(label.to_string());

    let (clock, meridiem) = label.trim().rsplit_once(' ').ok_or_else(invalid)?;
    let (hour_str, minute_str) = clock.split_once(':').ok_or_else(invalid)?;
    let hour: u32 = hour_str.parse().map_err(|_| invalid())?;
    let minute: u32 = minute_str.parse().map_err(|_| invalid())?;

    if !(1..=12).contains(&hour) {
        return Err(TimeParseError::HourOutOfRange(hour));
    }
    if minute > 59 {
        return Err(TimeParseError::MinuteOutOfRange(minute));
    }

    let hour24 = match (meridiem.to_ascii_uppercase().as_str(), hour) {
        ("AM", 12) => 0,
        ("AM", h) => h,
        ("PM", 12) => 12,
        ("PM", h) => h + 12,
        _ => return Err(invalid()),
    };

    Ok((hour24 * 60 + minute) as u16)
}

// Inverse of parse_time_label; input outside a day wraps at midnight
pub fn format_time_label(minutes: u16) -> String {
    let minutes = minutes % 1440;
    let hour24 = minutes / 60;
    let minute = minutes % 60;

    let (hour12, meridiem) = match hour24 {
        0 => (12, "AM"),
        12 => (12, "PM"),
        h if h < 12 => (h, "AM"),
        h => (h - 12, "PM"),
    };

    format!("{}:{:02} {}", hour12, minute, meridiem)
}

// The derived calendar for one itinerary and date range
#[derive(Debug, Clone)]
pub struct Schedule {
    range: DateRange,
    entries: Vec<ScheduledEntry>,
    manual: HashMap<String, ManualSlot>,
}

impl Schedule {
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            entries: Vec::new(),
            manual: HashMap::new(),
        }
    }

    pub fn generate(itinerary: &Itinerary, range: DateRange) -> Self {
        let mut schedule = Self::new(range);
        schedule.regenerate(itinerary);
        schedule
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn entries(&self) -> &[ScheduledEntry] {
        &self.entries
    }

    pub fn entry(&self, key: &str) -> Option<&ScheduledEntry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    pub fn set_range(&mut self, range: DateRange, itinerary: &Itinerary) {
        self.range = range;
        self.regenerate(itinerary);
    }

    // Rebuild every entry from the item lists. Manual placements survive
    // regeneration, keyed by item; they are dropped only once the item
    // itself has left the itinerary.
    pub fn regenerate(&mut self, itinerary: &Itinerary) {
        let live_keys: HashSet<String> = itinerary
            .items()
            .iter()
            .map(|item| item.entry_key())
            .collect();
        self.manual.retain(|key, _| live_keys.contains(key));

        self.entries = build_entries(itinerary, self.range);

        for entry in &mut self.entries {
            if let Some(slot) = self.manual.get(&entry.key) {
                entry.date = slot.date;
                entry.start_minutes = slot.start_minutes;
            }
        }

        // Items placement skips (packages) can still hold a manual slot
        for (key, slot) in &self.manual {
            if self.entries.iter().any(|entry| &entry.key == key) {
                continue;
            }
            if let Some(item) = itinerary
                .items()
                .into_iter()
                .find(|item| &item.entry_key() == key)
            {
                self.entries.push(synthesized_entry(item, *slot));
            }
        }
    }

    // Drop an item onto a (date, time) cell. An existing entry is moved in
    // place; otherwise one is synthesized from the drop duration table.
    pub fn move_item(&mut self, item: &BookableItem, date: NaiveDate, start_minutes: u16) {
        let key = item.entry_key();
        let slot = ManualSlot {
            date,
            start_minutes,
        };
        self.manual.insert(key.clone(), slot);

        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.key == key) {
            entry.date = date;
            entry.start_minutes = start_minutes;
        } else {
            self.entries.push(synthesized_entry(item, slot));
        }
    }

    pub fn conflicts(&self) -> Vec<Conflict> {
        detect_conflicts(&self.entries)
    }
}

fn point_entry(
    item: &BookableItem,
    date: NaiveDate,
    start_minutes: u16,
    duration_minutes: u32,
) -> ScheduledEntry {
    ScheduledEntry {
        key: item.entry_key(),
        category: item.category(),
        item_id: item.id().to_string(),
        label: item.name().to_string(),
        date,
        start_minutes,
        duration_minutes,
        end: None,
    }
}

fn synthesized_entry(item: &BookableItem, slot: ManualSlot) -> ScheduledEntry {
    ScheduledEntry {
        key: item.entry_key(),
        category: item.category(),
        item_id: item.id().to_string(),
        label: item.name().to_string(),
        date: slot.date,
        start_minutes: slot.start_minutes,
        duration_minutes: drop_duration_minutes(item.category()),
        end: None,
    }
}

// Default placement: golf, dining and experiences round-robin across the
// inclusive day range by index % day_count; hotels span check-in to
// check-out as a single entry; packages stay list-only.
fn build_entries(itinerary: &Itinerary, range: DateRange) -> Vec<ScheduledEntry> {
    let days = range.day_count();
    let mut entries = Vec::new();

    for (index, item) in itinerary.golf_courses.iter().enumerate() {
        entries.push(point_entry(
            item,
            range.day(index as u32 % days),
            GOLF_TEE_OFF_MINUTES,
            GOLF_ROUND_MINUTES,
        ));
    }

    for item in &itinerary.hotels {
        let mut entry = point_entry(item, range.start(), HOTEL_CHECK_IN_MINUTES, 0);
        entry.end = Some((range.end(), HOTEL_CHECK_OUT_MINUTES));
        entries.push(entry);
    }

    for (index, item) in itinerary.restaurants.iter().enumerate() {
        entries.push(point_entry(
            item,
            range.day(index as u32 % days),
            DINNER_SEATING_MINUTES,
            DINNER_DURATION_MINUTES,
        ));
    }

    for (index, item) in itinerary.experiences.iter().enumerate() {
        entries.push(point_entry(
            item,
            range.day(index as u32 % days),
            EXPERIENCE_START_MINUTES,
            EXPERIENCE_DURATION_MINUTES,
        ));
    }

    entries
}

fn intervals_overlap(a: (u32, u32), b: (u32, u32)) -> bool {
    let (a_start, a_end) = a;
    let (b_start, b_end) = b;

    let starts_during = a_start >= b_start && a_start < b_end;
    let ends_during = a_end > b_start && a_end <= b_end;
    let contains = a_start <= b_start && a_end >= b_end;

    starts_during || ends_during || contains
}

// Pairwise same-day overlap over point entries. O(n^2) over a day's entries
// is fine at trip sizes. Span entries (hotel stays) are advisory and do not
// participate. Both directions of each overlapping pair are reported.
pub fn detect_conflicts(entries: &[ScheduledEntry]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for a in entries {
        if a.is_span() {
            continue;
        }
        for b in entries {
            if b.is_span() || a.key == b.key || a.date != b.date {
                continue;
            }
            if intervals_overlap(a.interval(), b.interval()) {
                conflicts.push(Conflict {
                    first_key: a.key.clone(),
                    first_label: a.label.clone(),
                    second_key: b.key.clone(),
                    second_label: b.label.clone(),
                    date: a.date,
                });
            }
        }
    }

    conflicts
}

// Human-readable advisory lines, deduplicated by unordered pair and capped.
// Conflicts never block checkout.
pub fn conflict_summary(conflicts: &[Conflict]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut lines = Vec::new();

    for conflict in conflicts {
        let mut pair = [conflict.first_key.as_str(), conflict.second_key.as_str()];
        pair.sort_unstable();
        if !seen.insert((pair[0].to_string(), pair[1].to_string(), conflict.date)) {
            continue;
        }
        lines.push(format!(
            "{} conflicts with {} on {}",
            conflict.first_label,
            conflict.second_label,
            conflict.date.format("%Y-%m-%d")
        ));
    }

    if lines.len() > CONFLICT_DISPLAY_CAP {
        let hidden = lines.len() - CONFLICT_DISPLAY_CAP;
        lines.truncate(CONFLICT_DISPLAY_CAP);
        lines.push(format!("+{} more", hidden));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Experience, GolfCourse, Hotel, Package, Restaurant};
    use test_case::test_case;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, day).unwrap()
    }

    fn course(id: &str) -> BookableItem {
        BookableItem::Golf(GolfCourse {
            id: id.to_string(),
            name: format!("Course {}", id),
            location: "Dornoch".to_string(),
            holes: 18,
            par: 70,
            green_fee_minor: 14_000,
            rating: 4.8,
        })
    }

    fn hotel(id: &str) -> BookableItem {
        BookableItem::Hotel(Hotel {
            id: id.to_string(),
            name: format!("Hotel {}", id),
            location: "Dornoch".to_string(),
            stars: 5,
            nightly_rate_minor: 30_000,
        })
    }

    fn restaurant(id: &str) -> BookableItem {
        BookableItem::Restaurant(Restaurant {
            id: id.to_string(),
            name: format!("Restaurant {}", id),
            cuisine: "Scottish".to_string(),
            location: "Dornoch".to_string(),
            average_price_minor: 7_500,
        })
    }

    fn experience(id: &str) -> BookableItem {
        BookableItem::Experience(Experience {
            id: id.to_string(),
            name: format!("Experience {}", id),
            description: "Distillery tour".to_string(),
            price_minor: 4_500,
        })
    }

    fn package(id: &str) -> BookableItem {
        BookableItem::Package(Package {
            id: id.to_string(),
            name: format!("Package {}", id),
            description: "Three rounds and two nights".to_string(),
            price_minor: 99_000,
            includes: vec!["golf".to_string(), "hotel".to_string()],
        })
    }

    fn three_day_range() -> DateRange {
        // Mon 2026-05-04 through Wed 2026-05-06
        DateRange::new(date(4), date(6))
    }

    #[test]
    fn test_day_count_is_inclusive() {
        assert_eq!(three_day_range().day_count(), 3);
        assert_eq!(three_day_range().nights(), 2);
        assert_eq!(DateRange::new(date(4), date(4)).day_count(), 1);
        // Reversed input normalizes
        assert_eq!(DateRange::new(date(6), date(4)).start(), date(4));
    }

    #[test]
    fn test_round_robin_day_assignment() {
        let mut itinerary = Itinerary::new();
        for i in 0..5 {
            itinerary.add(course(&format!("c{}", i)));
        }

        let schedule = Schedule::generate(&itinerary, three_day_range());
        let days: Vec<NaiveDate> = schedule.entries().iter().map(|e| e.date).collect();
        assert_eq!(days, vec![date(4), date(5), date(6), date(4), date(5)]);

        for entry in schedule.entries() {
            assert_eq!(entry.start_minutes, GOLF_TEE_OFF_MINUTES);
            assert_eq!(entry.duration_minutes, GOLF_ROUND_MINUTES);
        }
    }

    #[test]
    fn test_hotel_span_invariant() {
        let mut itinerary = Itinerary::new();
        itinerary.add(hotel("h1"));
        for i in 0..4 {
            itinerary.add(course(&format!("c{}", i)));
        }

        let schedule = Schedule::generate(&itinerary, three_day_range());
        let entry = schedule.entry("hotel_h1").expect("hotel entry");
        assert_eq!(entry.date, date(4));
        assert_eq!(entry.start_minutes, HOTEL_CHECK_IN_MINUTES);
        assert_eq!(entry.end, Some((date(6), HOTEL_CHECK_OUT_MINUTES)));
        assert!(entry.is_span());
    }

    #[test]
    fn test_every_non_package_item_gets_exactly_one_entry() {
        let mut itinerary = Itinerary::new();
        itinerary.add(course("c1"));
        itinerary.add(hotel("h1"));
        itinerary.add(restaurant("r1"));
        itinerary.add(experience("e1"));
        itinerary.add(package("p1"));

        let schedule = Schedule::generate(&itinerary, three_day_range());
        assert_eq!(schedule.entries().len(), 4);

        let keys: HashSet<&str> = schedule.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys.len(), 4);
        assert!(keys.contains("golf_c1"));
        assert!(keys.contains("hotel_h1"));
        assert!(keys.contains("restaurant_r1"));
        assert!(keys.contains("experience_e1"));
        assert!(schedule.entry("package_p1").is_none());
    }

    #[test]
    fn test_conflict_symmetry_and_even_count() {
        let mut itinerary = Itinerary::new();
        itinerary.add(course("c1"));
        itinerary.add(experience("e1"));

        let mut schedule = Schedule::generate(&itinerary, three_day_range());
        // Pull the experience onto the golf morning so they overlap
        schedule.move_item(&experience("e1"), date(4), GOLF_TEE_OFF_MINUTES + 60);

        let conflicts = schedule.conflicts();
        assert_eq!(conflicts.len() % 2, 0, "raw relation must be symmetric");
        assert!(conflicts
            .iter()
            .any(|c| c.first_key == "golf_c1" && c.second_key == "experience_e1"));
        assert!(conflicts
            .iter()
            .any(|c| c.first_key == "experience_e1" && c.second_key == "golf_c1"));
    }

    #[test]
    fn test_no_conflict_across_days() {
        let mut itinerary = Itinerary::new();
        itinerary.add(course("c1"));
        itinerary.add(course("c2"));

        // Two-day range: same tee time, different days
        let schedule = Schedule::generate(&itinerary, DateRange::new(date(4), date(5)));
        assert!(schedule.conflicts().is_empty());
    }

    #[test]
    fn test_hotel_span_never_conflicts() {
        let mut itinerary = Itinerary::new();
        itinerary.add(hotel("h1"));
        itinerary.add(restaurant("r1"));

        // Dinner starts after check-in on the same date; still advisory-only
        let schedule = Schedule::generate(&itinerary, three_day_range());
        assert!(schedule.conflicts().is_empty());
    }

    #[test]
    fn test_adjacent_intervals_do_not_conflict() {
        let mut itinerary = Itinerary::new();
        itinerary.add(course("c1"));
        itinerary.add(restaurant("r1"));

        let mut schedule = Schedule::generate(&itinerary, three_day_range());
        // Dinner starts exactly when the round ends: [540, 780) then [780, 900)
        schedule.move_item(
            &restaurant("r1"),
            date(4),
            GOLF_TEE_OFF_MINUTES + GOLF_ROUND_MINUTES as u16,
        );
        assert!(schedule.conflicts().is_empty());
    }

    #[test]
    fn test_drop_overwrite_is_idempotent() {
        let mut itinerary = Itinerary::new();
        itinerary.add(course("c1"));

        let mut schedule = Schedule::generate(&itinerary, three_day_range());
        schedule.move_item(&course("c1"), date(5), 600);
        schedule.move_item(&course("c1"), date(5), 600);

        let matching: Vec<_> = schedule
            .entries()
            .iter()
            .filter(|e| e.key == "golf_c1")
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].date, date(5));
        assert_eq!(matching[0].start_minutes, 600);
    }

    #[test]
    fn test_drop_synthesizes_entry_from_duration_table() {
        let mut itinerary = Itinerary::new();
        itinerary.add(package("p1"));

        let mut schedule = Schedule::generate(&itinerary, three_day_range());
        assert!(schedule.entries().is_empty());

        schedule.move_item(&package("p1"), date(5), 900);
        let entry = schedule.entry("package_p1").expect("synthesized entry");
        assert_eq!(entry.duration_minutes, drop_duration_minutes(ItemCategory::Package));
        assert_eq!(entry.date, date(5));
    }

    #[test]
    fn test_manual_placement_survives_regeneration() {
        let mut itinerary = Itinerary::new();
        itinerary.add(course("c1"));
        itinerary.add(course("c2"));

        let mut schedule = Schedule::generate(&itinerary, three_day_range());
        schedule.move_item(&course("c1"), date(6), 660);

        // A range change regenerates everything; the dragged slot holds
        schedule.set_range(DateRange::new(date(4), date(7)), &itinerary);
        let entry = schedule.entry("golf_c1").unwrap();
        assert_eq!(entry.date, date(6));
        assert_eq!(entry.start_minutes, 660);

        // Removing the item finally releases the manual slot
        itinerary.remove(ItemCategory::Golf, "c1");
        schedule.regenerate(&itinerary);
        assert!(schedule.entry("golf_c1").is_none());
        assert!(schedule.entry("golf_c2").is_some());
    }

    #[test]
    fn test_conflict_summary_caps_at_three() {
        let mut itinerary = Itinerary::new();
        for i in 0..5 {
            itinerary.add(experience(&format!("e{}", i)));
        }

        let mut schedule = Schedule::generate(&itinerary, three_day_range());
        // Pile every experience onto the same afternoon
        for i in 0..5 {
            schedule.move_item(&experience(&format!("e{}", i)), date(4), 840);
        }

        let conflicts = schedule.conflicts();
        // 5 entries all overlapping: 20 ordered pairs, 10 unordered
        assert_eq!(conflicts.len(), 20);

        let lines = conflict_summary(&conflicts);
        assert_eq!(lines.len(), CONFLICT_DISPLAY_CAP + 1);
        assert_eq!(lines[CONFLICT_DISPLAY_CAP], "+7 more");
        assert!(lines[0].contains("conflicts with"));
        assert!(lines[0].contains("2026-05-04"));
    }

    #[test_case("12:00 AM", 0)]
    #[test_case("12:00 PM", 720)]
    #[test_case("1:30 PM", 810)]
    #[test_case("11:59 PM", 1439)]
    #[test_case("9:00 AM", 540)]
    #[test_case("12:30 AM", 30)]
    #[test_case("7:30 pm", 1170)]
    fn test_parse_time_label(label: &str, expected: u16) {
        assert_eq!(parse_time_label(label), Ok(expected));
    }

    #[test_case("13:00 PM")]
    #[test_case("0:30 AM")]
    #[test_case("7:61 PM")]
    #[test_case("7:30")]
    #[test_case("noon")]
    #[test_case("7.30 PM")]
    fn test_parse_time_label_rejects(label: &str) {
        assert!(parse_time_label(label).is_err());
    }

    #[test_case(0, "12:00 AM")]
    #[test_case(720, "12:00 PM")]
    #[test_case(810, "1:30 PM")]
    #[test_case(1439, "11:59 PM")]
    #[test_case(540, "9:00 AM")]
    fn test_format_time_label(minutes: u16, expected: &str) {
        assert_eq!(format_time_label(minutes), expected);
    }

    #[test]
    fn test_label_round_trip() {
        for minutes in (0..1440).step_by(7) {
            let label = format_time_label(minutes);
            assert_eq!(parse_time_label(&label), Ok(minutes), "label {}", label);
        }
    }

    #[test]
    fn test_end_to_end_three_day_trip() {
        let mut itinerary = Itinerary::new();
        itinerary.add(course("c1"));
        itinerary.add(course("c2"));
        itinerary.add(hotel("h1"));
        itinerary.add(restaurant("r1"));
        assert_eq!(itinerary.item_count(), 4);

        let schedule = Schedule::generate(&itinerary, three_day_range());

        assert_eq!(schedule.entry("golf_c1").unwrap().date, date(4));
        assert_eq!(schedule.entry("golf_c2").unwrap().date, date(5));

        let stay = schedule.entry("hotel_h1").unwrap();
        assert_eq!(
            (stay.date, stay.start_minutes),
            (date(4), HOTEL_CHECK_IN_MINUTES)
        );
        assert_eq!(stay.end, Some((date(6), HOTEL_CHECK_OUT_MINUTES)));

        let dinner = schedule.entry("restaurant_r1").unwrap();
        assert_eq!(dinner.date, date(4));
        assert_eq!(dinner.start_minutes, DINNER_SEATING_MINUTES);

        // Golf ends 13:00, dinner starts 19:00: nothing overlaps
        assert!(schedule.conflicts().is_empty());
    }
}

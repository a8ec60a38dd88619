//! Conversion between the two weekday numberings in use.
//!
//! Work-day masks are Sunday-first: slot 0 is Sunday, slot 6 is Saturday,
//! and a `1` marks a staffed day. The backend instead lists staffed days by
//! number, Monday-first: 0 is Monday, 6 is Sunday.

/// Highest valid backend day number (Sunday)
const LAST_DAY: u8 = 6;

/// Staffed days of a Sunday-first mask, as backend day numbers in mask order.
pub fn to_backend_days(mask: &[u8; 7]) -> Vec<u8> {
    mask.iter()
        .enumerate()
        .filter(|(_, &slot)| slot == 1)
        .map(|(index, _)| if index == 0 { LAST_DAY } else { index as u8 - 1 })
        .collect()
}

/// Sunday-first mask for a list of backend day numbers. Out-of-range days
/// are ignored.
pub fn to_work_day_mask(days: &[u8]) -> [u8; 7] {
    let mut mask = [0u8; 7];
    for &day in days.iter().filter(|&&d| d <= LAST_DAY) {
        let slot = if day == LAST_DAY { 0 } else { day as usize + 1 };
        mask[slot] = 1;
    }
    mask
}

/// Parse the backend's comma-separated day list, skipping junk entries.
pub fn parse_days(dates: &str) -> Vec<u8> {
    dates
        .split(',')
        .filter_map(|part| part.trim().parse::<u8>().ok())
        .filter(|&d| d <= LAST_DAY)
        .collect()
}

pub fn join_days(days: &[u8]) -> String {
    days.iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Short English names for a Sunday-first mask, e.g. "Mon, Fri".
pub fn mask_display(mask: &[u8; 7]) -> String {
    const NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
    let days: Vec<&str> = mask
        .iter()
        .zip(NAMES)
        .filter(|(&slot, _)| slot == 1)
        .map(|(_, name)| name)
        .collect();
    if days.is_empty() {
        "none".to_string()
    } else {
        days.join(", ")
    }
}

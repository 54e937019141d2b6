//! Static electoral unit table: 50 US states plus DC, post-2020 apportionment.

use std::collections::BTreeMap;

/// Region code and its electoral unit count.
pub const US_ELECTORAL_UNITS: [(&str, u32); 51] = [
    ("AK", 3), ("AL", 9), ("AR", 6), ("AZ", 11), ("CA", 54),
    ("CO", 10), ("CT", 7), ("DC", 3), ("DE", 3), ("FL", 30),
    ("GA", 16), ("HI", 4), ("IA", 6), ("ID", 4), ("IL", 19),
    ("IN", 11), ("KS", 6), ("KY", 8), ("LA", 8), ("MA", 11),
    ("MD", 10), ("ME", 4), ("MI", 15), ("MN", 10), ("MO", 10),
    ("MS", 6), ("MT", 4), ("NC", 16), ("ND", 3), ("NE", 5),
    ("NH", 4), ("NJ", 14), ("NM", 5), ("NV", 6), ("NY", 28),
    ("OH", 17), ("OK", 7), ("OR", 8), ("PA", 19), ("RI", 4),
    ("SC", 9), ("SD", 3), ("TN", 11), ("TX", 40), ("UT", 6),
    ("VA", 13), ("VT", 3), ("WA", 12), ("WI", 10), ("WV", 4),
    ("WY", 3),
];

/// The unit table as an owned map, ready to be overridden by configuration.
pub fn us_electoral_units() -> BTreeMap<String, u32> {
    US_ELECTORAL_UNITS
        .iter()
        .map(|(code, units)| (code.to_string(), *units))
        .collect()
}

/// Canonical form of a region code: trimmed and uppercased.
pub fn region_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

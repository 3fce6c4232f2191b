use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A parking permit the driver owns. Owned by whatever stores the driver's permits and handed in
/// per query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permit {
    pub id: String,
    /// Like "Q"
    pub area_code: String,
    pub city_code: String,
    /// No expiration means it never lapses.
    #[serde(default)]
    pub expiration: Option<NaiveDateTime>,
}

impl Permit {
    pub fn new<I: Into<String>>(id: I, area_code: I, city_code: I) -> Permit {
        Permit {
            id: id.into(),
            area_code: area_code.into(),
            city_code: city_code.into(),
            expiration: None,
        }
    }

    /// The expiration moment itself still counts as expired.
    pub fn is_expired_at(&self, now: NaiveDateTime) -> bool {
        match self.expiration {
            Some(expiration) => now >= expiration,
            None => false,
        }
    }

    pub fn matches_area(&self, code: &str) -> bool {
        self.area_code.trim().eq_ignore_ascii_case(code.trim())
    }
}

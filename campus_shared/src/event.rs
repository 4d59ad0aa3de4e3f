use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A dated entry for one module. Events are never updated in place;
/// changing one is remove + re-add.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    module: String,
    date: String,
    description: String,
    created: String,
}

impl Event {
    pub fn new(module: String, date: String, description: String) -> Self {
        Self {
            module,
            date,
            description,
            created: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn get_module(&self) -> &str {
        &self.module
    }

    pub fn get_date(&self) -> &str {
        &self.date
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }

    /// The calendar day this event falls on, or `None` when the stored
    /// string does not parse. Callers skip unparseable dates.
    pub fn parse_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT).ok()
    }
}

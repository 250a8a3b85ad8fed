use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Format of the `date` field in the entry store
pub const STORE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of dates as displayed by the forum
pub const PAGE_DATE_FORMAT: &str = "%Y年%m月%d日%H:%M";

/// Metadata of one diary entry
///
/// The serialized field names are the ones used by existing
/// `page_info.json` files, so old mirrors can be resumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub title: String,

    #[serde(with = "store_date")]
    pub date: NaiveDateTime,

    /// The chronologically previous entry; `None` ends the chain
    #[serde(rename = "prev_diary_id")]
    pub predecessor_id: Option<String>,

    #[serde(rename = "diary_id")]
    pub id: String,
}

impl EntryRecord {
    /// Date as shown by the forum (`YYYY年MM月DD日HH:MM`)
    pub fn display_date(&self) -> String {
        self.date.format(PAGE_DATE_FORMAT).to_string()
    }
}

mod store_date {
    use super::STORE_DATE_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(STORE_DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&text, STORE_DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}

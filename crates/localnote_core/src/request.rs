use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Caller-assigned notification identity.
///
/// The calling layer sends IDs either as strings or as integers; both are
/// canonicalized to the trimmed decimal string so `7`, `7.0` and `"7"` compare
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(String);

impl NotificationId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NotificationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NotificationId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<i64> for NotificationId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<i32> for NotificationId {
    fn from(value: i32) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for NotificationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NotificationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Integer(i64),
            Unsigned(u64),
            Float(f64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => NotificationId::new(text),
            RawId::Integer(value) => NotificationId::from(value),
            RawId::Unsigned(value) => NotificationId(value.to_string()),
            RawId::Float(value) if value.is_finite() && value.fract() == 0.0 => {
                NotificationId(format!("{value:.0}"))
            }
            RawId::Float(value) => {
                return Err(serde::de::Error::custom(format!(
                    "notification id must be a whole number, got {value}"
                )))
            }
        })
    }
}

/// A request to show and schedule one notification, as sent by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub id: NotificationId,
    #[serde(default, deserialize_with = "nullable_string")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub message: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub short_message: String,
    /// `Some(0)` clears the badge; `None` leaves it untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<i32>,
    /// Fire time in epoch seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<f64>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub small_image: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub image: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub wide_image: String,
    #[serde(skip)]
    raw: Option<String>,
}

impl NotificationRequest {
    pub fn new(id: impl Into<NotificationId>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            message: String::new(),
            short_message: String::new(),
            badge: None,
            date: None,
            small_image: String::new(),
            image: String::new(),
            wide_image: String::new(),
            raw: None,
        }
    }

    /// Parses a request and remembers the exact text it came from; that text
    /// is what lifecycle events carry back to the host.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        let mut request: Self = serde_json::from_str(raw)?;
        request.raw = Some(raw.to_string());
        Ok(request)
    }

    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        let raw = value.to_string();
        let mut request: Self = serde_json::from_value(value)?;
        request.raw = Some(raw);
        Ok(request)
    }

    /// Serialized form of the request as it arrived, or a fresh serialization
    /// for requests built in code.
    pub fn payload(&self) -> String {
        match &self.raw {
            Some(raw) => raw.clone(),
            None => serde_json::to_string(self).unwrap_or_default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_short_message(mut self, short_message: impl Into<String>) -> Self {
        self.short_message = short_message.into();
        self
    }

    pub fn with_badge(mut self, badge: i32) -> Self {
        self.badge = Some(badge);
        self
    }

    pub fn with_date(mut self, epoch_seconds: f64) -> Self {
        self.date = Some(epoch_seconds);
        self
    }

    pub fn with_images(
        mut self,
        small_image: impl Into<String>,
        image: impl Into<String>,
        wide_image: impl Into<String>,
    ) -> Self {
        self.small_image = small_image.into();
        self.image = image.into();
        self.wide_image = wide_image.into();
        self
    }
}

fn nullable_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_and_string_ids_are_the_same() {
        let from_int: NotificationId = serde_json::from_str("42").unwrap();
        let from_str: NotificationId = serde_json::from_str("\" 42 \"").unwrap();
        assert_eq!(from_int, from_str);
        assert_eq!(from_int.as_str(), "42");
    }

    #[test]
    fn whole_floats_and_large_integers_are_ids_too() {
        let from_float: NotificationId = serde_json::from_str("42.0").unwrap();
        assert_eq!(from_float, NotificationId::from(42));
        let negative: NotificationId = serde_json::from_str("-3.0").unwrap();
        assert_eq!(negative.as_str(), "-3");

        let large: NotificationId = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(large.as_str(), "18446744073709551615");

        assert!(serde_json::from_str::<NotificationId>("1.5").is_err());
    }

    #[test]
    fn parses_host_options() {
        let raw = r#"{"id":"7","title":"Standup","message":"Daily standup in 5","shortMessage":"Standup","badge":0,"date":1700000000,"smallImage":"","image":"http://example.com/a.png","wideImage":null,"autoCancel":true}"#;
        let request = NotificationRequest::from_json(raw).unwrap();
        assert_eq!(request.id, NotificationId::from(7));
        assert_eq!(request.badge, Some(0));
        assert_eq!(request.date, Some(1_700_000_000.0));
        assert_eq!(request.short_message, "Standup");
        assert!(request.wide_image.is_empty());
        assert_eq!(request.payload(), raw);
    }

    #[test]
    fn missing_badge_stays_unset() {
        let request = NotificationRequest::from_json(r#"{"id":1}"#).unwrap();
        assert_eq!(request.badge, None);
        assert_eq!(request.date, None);
        assert!(request.title.is_empty());
    }

    #[test]
    fn built_requests_serialize_themselves() {
        let request = NotificationRequest::new(3).with_title("Hi").with_badge(2);
        let payload: serde_json::Value = serde_json::from_str(&request.payload()).unwrap();
        assert_eq!(payload["id"], "3");
        assert_eq!(payload["title"], "Hi");
        assert_eq!(payload["badge"], 2);
        assert!(payload.get("date").is_none());
    }
}

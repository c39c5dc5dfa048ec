//! Status enums for various entities.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Product visibility in the public store.
///
/// The backend stores this as free text and older rows have no status at
/// all; a missing status means the product is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Active,
    Disabled,
}

impl ProductStatus {
    /// Interpret the raw backend value. Unknown values count as active, the
    /// same way the public listing treats them.
    #[must_use]
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("disabled") => Self::Disabled,
            _ => Self::Active,
        }
    }

    /// The wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Disabled => "disabled",
        }
    }

    /// CSS class for status badges.
    #[must_use]
    pub const fn badge_class(&self) -> &'static str {
        match self {
            Self::Active => "badge-success",
            Self::Disabled => "badge-muted",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order status as reported by the backend.
///
/// Orders created through checkout are `paid`; anything else is kept
/// verbatim so new backend states still render.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Paid,
    Pending,
    Other(String),
}

impl OrderStatus {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Paid => "paid",
            Self::Pending => "pending",
            Self::Other(s) => s,
        }
    }

    /// CSS class for status badges.
    #[must_use]
    pub const fn badge_class(&self) -> &'static str {
        match self {
            Self::Paid => "badge-primary",
            Self::Pending => "badge-secondary",
            Self::Other(_) => "badge-outline",
        }
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "paid" => Self::Paid,
            "pending" => Self::Pending,
            _ => Self::Other(s),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a backend log record.
///
/// Levels outside the standard five (custom logging levels such as
/// `Level 25`) are kept verbatim in [`LogLevel::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
    Other(String),
}

impl LogLevel {
    /// The standard levels, lowest severity first.
    pub const ALL: [Self; 5] = [
        Self::Debug,
        Self::Info,
        Self::Warning,
        Self::Error,
        Self::Critical,
    ];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
            Self::Other(s) => s,
        }
    }

    /// Colour class used by the log viewer: red for errors, yellow for
    /// warnings, green for everything else.
    #[must_use]
    pub const fn color_class(&self) -> &'static str {
        match self {
            Self::Error | Self::Critical => "log-red",
            Self::Warning => "log-yellow",
            Self::Debug | Self::Info | Self::Other(_) => "log-green",
        }
    }

    fn standard(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Some(Self::Debug),
            "INFO" => Some(Self::Info),
            "WARNING" | "WARN" => Some(Self::Warning),
            "ERROR" => Some(Self::Error),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for LogLevel {
    fn from(s: String) -> Self {
        Self::standard(&s).unwrap_or(Self::Other(s))
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Other(s) => s,
            standard => standard.as_str().to_owned(),
        }
    }
}

/// Parses the standard levels only; used for filter selectors.
impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::standard(s).ok_or_else(|| format!("invalid log level: {s}"))
    }
}

/// Bucket size for the sales time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SalesPeriod {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl SalesPeriod {
    pub const ALL: [Self; 4] = [Self::Day, Self::Week, Self::Month, Self::Year];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Day => "Daily",
            Self::Week => "Weekly",
            Self::Month => "Monthly",
            Self::Year => "Yearly",
        }
    }
}

impl fmt::Display for SalesPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SalesPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(format!("invalid sales period: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_status_missing_is_active() {
        assert_eq!(ProductStatus::from_raw(None), ProductStatus::Active);
        assert_eq!(ProductStatus::from_raw(Some("active")), ProductStatus::Active);
        assert_eq!(
            ProductStatus::from_raw(Some("Disabled")),
            ProductStatus::Disabled
        );
    }

    #[test]
    fn test_order_status_round_trips_unknown_values() {
        let status: OrderStatus = serde_json::from_str("\"refunded\"").unwrap();
        assert_eq!(status, OrderStatus::Other("refunded".to_string()));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"refunded\"");
        let paid: OrderStatus = serde_json::from_str("\"paid\"").unwrap();
        assert_eq!(paid, OrderStatus::Paid);
        assert_eq!(paid.badge_class(), "badge-primary");
    }

    #[test]
    fn test_log_level_parsing() {
        let level: LogLevel = serde_json::from_str("\"WARNING\"").unwrap();
        assert_eq!(level, LogLevel::Warning);
        let level: LogLevel = serde_json::from_str("\"WARN\"").unwrap();
        assert_eq!(level, LogLevel::Warning);
        assert_eq!("error".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_log_level_keeps_custom_levels() {
        let level: LogLevel = serde_json::from_str("\"Level 25\"").unwrap();
        assert_eq!(level, LogLevel::Other("Level 25".to_string()));
        assert_eq!(level.as_str(), "Level 25");
        assert_eq!(level.color_class(), "log-green");
        assert_eq!(serde_json::to_string(&level).unwrap(), "\"Level 25\"");
    }

    #[test]
    fn test_log_level_colors() {
        assert_eq!(LogLevel::Error.color_class(), "log-red");
        assert_eq!(LogLevel::Critical.color_class(), "log-red");
        assert_eq!(LogLevel::Warning.color_class(), "log-yellow");
        assert_eq!(LogLevel::Info.color_class(), "log-green");
    }

    #[test]
    fn test_sales_period() {
        assert_eq!(SalesPeriod::default(), SalesPeriod::Month);
        assert_eq!("week".parse::<SalesPeriod>().unwrap(), SalesPeriod::Week);
        assert!("decade".parse::<SalesPeriod>().is_err());
    }
}

//! Sales chart range selection and bar layout.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::models::SalesPoint;

/// Look-back window for the dashboard sales chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SalesRange {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl SalesRange {
    pub const ALL: [Self; 4] = [Self::Week, Self::Month, Self::Quarter, Self::Year];

    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("7d") => Self::Week,
            Some("90d") => Self::Quarter,
            Some("365d") => Self::Year,
            _ => Self::Month,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "7d",
            Self::Month => "30d",
            Self::Quarter => "90d",
            Self::Year => "365d",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Week => "Last 7 days",
            Self::Month => "Last 30 days",
            Self::Quarter => "Last 90 days",
            Self::Year => "Last 365 days",
        }
    }

    #[must_use]
    pub const fn days(&self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
            Self::Year => 365,
        }
    }

    /// `(start, end)` for the timeseries request, both RFC 3339.
    #[must_use]
    pub fn bounds(&self, now: DateTime<Utc>) -> (String, String) {
        let start = now - Duration::days(self.days());
        (
            start.to_rfc3339_opts(SecondsFormat::Millis, true),
            now.to_rfc3339_opts(SecondsFormat::Millis, true),
        )
    }
}

/// One rendered bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesBar {
    pub bucket: String,
    pub revenue: String,
    pub orders: u64,
    /// Bar height as a percentage of the largest revenue.
    pub revenue_pct: u8,
    /// Order bar height as a percentage of the largest order count.
    pub orders_pct: u8,
}

/// Revenue and order bars for the dashboard, in bucket order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesChart {
    pub bars: Vec<SalesBar>,
}

impl SalesChart {
    #[must_use]
    pub fn from_points(points: &[SalesPoint]) -> Self {
        let max_revenue = points
            .iter()
            .map(|p| p.revenue.amount())
            .max()
            .unwrap_or(Decimal::ZERO);
        let max_orders = points.iter().map(|p| p.orders).max().unwrap_or(0);

        let bars = points
            .iter()
            .map(|point| SalesBar {
                bucket: point.bucket.clone(),
                revenue: point.revenue.display_compact(),
                orders: point.orders,
                revenue_pct: percent(point.revenue.amount(), max_revenue),
                orders_pct: percent(Decimal::from(point.orders), Decimal::from(max_orders)),
            })
            .collect();
        Self { bars }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

fn percent(value: Decimal, max: Decimal) -> u8 {
    if max <= Decimal::ZERO || value <= Decimal::ZERO {
        return 0;
    }
    (value * Decimal::ONE_HUNDRED / max)
        .round()
        .to_u8()
        .unwrap_or(100)
        .min(100)
}

//! Sales report.
//!
//! # Usage
//!
//! ```bash
//! df-cli sales --period week --range 90d
//! ```

use chrono::Utc;
use deadforest_core::SalesPeriod;
use deadforest_core::sales::{SalesChart, SalesRange};

use super::{CliError, Session};

/// Print revenue and orders per bucket over the range.
pub async fn report(session: &Session, period: SalesPeriod, range: Option<&str>) -> Result<(), CliError> {
    let range = SalesRange::parse(range);
    let (start, end) = range.bounds(Utc::now());

    let points = session
        .admin()
        .sales_timeseries(period, &start, &end)
        .await?;
    let chart = SalesChart::from_points(&points);

    tracing::info!("{} sales, {}", period.label(), range.label());
    if chart.is_empty() {
        tracing::info!("No sales in this range");
        return Ok(());
    }
    for bar in &chart.bars {
        tracing::info!(
            "{:<12} {:>10} {:>5} orders {}",
            bar.bucket,
            bar.revenue,
            bar.orders,
            "#".repeat(usize::from(bar.revenue_pct / 5)),
        );
    }
    Ok(())
}

//! Natural-language insights and recommendations
//!
//! Both generators are best effort: a numerical degeneracy such as an empty
//! table or a non-finite mean is logged and yields an empty list instead of
//! an error. A zero-footprint day only suppresses the trend statement.

use crate::anomaly::Anomaly;
use crate::data::SourceCategory;
use crate::features::{is_weekend, FeatureRow, FeatureTable};
use chrono::Datelike;
use footprint_math::statistics::{ensure_finite, mean, pct_change, sample_std_dev};
use footprint_math::{MathError, Result};
use std::collections::BTreeMap;
use tracing::warn;

/// Largest number of recommendations returned
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Fewer specific recommendations than this are padded from the generic pool
const MIN_SPECIFIC_RECOMMENDATIONS: usize = 3;

const GENERIC_RECOMMENDATIONS: [&str; 4] = [
    "Consider setting up a home energy monitoring system",
    "Look into carbon offset programs",
    "Try to reduce food waste and eat more plant-based meals",
    "Consider installing solar panels or other renewable energy sources",
];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Descriptive statements about the footprint history
pub fn insights(table: &FeatureTable) -> Vec<String> {
    match try_insights(table) {
        Ok(insights) => insights,
        Err(e) => {
            warn!(error = %e, rows = table.len(), "insight generation failed");
            Vec::new()
        }
    }
}

/// Up to five suggestions, specific ones first
pub fn recommendations(table: &FeatureTable, anomalies: &[Anomaly]) -> Vec<String> {
    match try_recommendations(table, anomalies) {
        Ok(recommendations) => recommendations,
        Err(e) => {
            warn!(error = %e, rows = table.len(), "recommendation generation failed");
            Vec::new()
        }
    }
}

fn try_insights(table: &FeatureTable) -> Result<Vec<String>> {
    let values = table.values();
    let mean_footprint = footprint_mean(&values)?;
    let std_footprint = ensure_finite(
        sample_std_dev(&values).ok_or_else(|| {
            MathError::InsufficientData("Need at least two days of history".to_string())
        })?,
        "footprint standard deviation",
    )?;

    let mut insights = Vec::new();

    // a zero day makes the relative change undefined; only the trend is skipped
    let changes = pct_change(&values);
    let trend_stats = if changes.iter().all(|c| c.is_finite()) {
        mean(&changes).zip(sample_std_dev(&changes))
    } else {
        None
    };
    if let Some((trend, trend_std)) = trend_stats {
        if trend.abs() > trend_std {
            let direction = if trend > 0.0 { "increasing" } else { "decreasing" };
            insights.push(format!(
                "Your carbon footprint has been {} by {:.1}% per day",
                direction,
                trend.abs() * 100.0
            ));
        }
    }

    if let Some(peak) = table
        .rows()
        .iter()
        .fold(None, |best: Option<&FeatureRow>, row| match best {
            Some(b) if b.value >= row.value => Some(b),
            _ => Some(row),
        })
    {
        if peak.value > mean_footprint + 2.0 * std_footprint {
            insights.push(format!(
                "Highest carbon footprint ({:.1} kg CO2) was recorded on {}",
                peak.value,
                peak.date.format("%Y-%m-%d")
            ));
        }
    }

    let (weekend, weekday): (Vec<_>, Vec<_>) =
        table.rows().iter().partition(|row| is_weekend(row.date));
    let weekend_avg = mean(&weekend.iter().map(|r| r.value).collect::<Vec<_>>());
    let weekday_avg = mean(&weekday.iter().map(|r| r.value).collect::<Vec<_>>());
    if let (Some(weekend_avg), Some(weekday_avg)) = (weekend_avg, weekday_avg) {
        if weekend_avg > weekday_avg * 1.1 {
            let excess =
                ensure_finite((weekend_avg / weekday_avg - 1.0) * 100.0, "weekend ratio")?;
            insights.push(format!(
                "Your carbon footprint is {:.1}% higher on weekends",
                excess
            ));
        }
    }

    let mut by_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for row in table.rows() {
        by_month.entry(row.date.month()).or_default().push(row.value);
    }
    let monthly: Vec<(u32, f64)> = by_month
        .into_iter()
        .filter_map(|(month, values)| mean(&values).map(|m| (month, m)))
        .collect();
    let monthly_avgs: Vec<f64> = monthly.iter().map(|(_, avg)| *avg).collect();
    if let (Some(spread), Some(level)) = (sample_std_dev(&monthly_avgs), mean(&monthly_avgs)) {
        if spread > level * 0.05 {
            let highest = monthly
                .iter()
                .fold(None, |best: Option<(u32, f64)>, &(month, avg)| match best {
                    Some((_, b)) if b >= avg => best,
                    _ => Some((month, avg)),
                });
            if let Some((month, _)) = highest {
                insights.push(format!(
                    "Your carbon footprint is typically highest in {}",
                    MONTH_NAMES[(month - 1) as usize]
                ));
            }
        }
    }

    if let Some((category, impact)) = largest_source(table) {
        if impact > mean_footprint * 0.3 {
            let share = ensure_finite(impact / mean_footprint * 100.0, "source share")?;
            insights.push(format!(
                "{} contributes {:.1}% of your total footprint",
                category.label(),
                share
            ));
        }
    }

    Ok(insights)
}

fn try_recommendations(table: &FeatureTable, anomalies: &[Anomaly]) -> Result<Vec<String>> {
    let values = table.values();
    let mean_footprint = footprint_mean(&values)?;
    let mut recommendations = Vec::new();

    if !anomalies.is_empty() {
        let dates: Vec<String> = anomalies
            .iter()
            .take(3)
            .map(|a| a.date.format("%Y-%m-%d").to_string())
            .collect();
        recommendations.push(format!(
            "Investigate causes of high emissions on {}",
            dates.join(", ")
        ));
    }

    if mean_footprint > 20.0 {
        recommendations.push(format!(
            "Your average daily carbon footprint ({:.1} kg CO2) is above recommended levels",
            mean_footprint
        ));
    }

    if let Some((category, impact)) = largest_source(table) {
        if impact > mean_footprint * 0.4 {
            let share = ensure_finite(impact / mean_footprint * 100.0, "source share")?;
            recommendations.push(format!(
                "Focus on reducing {} emissions, which contributes {:.1}% of your total footprint",
                category.key(),
                share
            ));
        }
    }

    let advice = [
        (
            SourceCategory::Transportation,
            10.0,
            "Consider carpooling or using public transport more often",
        ),
        (
            SourceCategory::Energy,
            8.0,
            "Look into energy-efficient appliances and renewable energy sources",
        ),
        (
            SourceCategory::Waste,
            5.0,
            "Focus on reducing waste and improving recycling habits",
        ),
    ];
    for (category, limit, text) in advice {
        if source_mean(table, category).map_or(false, |impact| impact > limit) {
            recommendations.push(text.to_string());
        }
    }

    if recommendations.len() < MIN_SPECIFIC_RECOMMENDATIONS {
        recommendations.extend(GENERIC_RECOMMENDATIONS.iter().map(|s| s.to_string()));
    }
    recommendations.truncate(MAX_RECOMMENDATIONS);

    Ok(recommendations)
}

fn footprint_mean(values: &[f64]) -> Result<f64> {
    let value = mean(values)
        .ok_or_else(|| MathError::InsufficientData("Feature table is empty".to_string()))?;
    ensure_finite(value, "mean footprint")
}

/// Mean of the recorded values of one source, `None` when it was never recorded
fn source_mean(table: &FeatureTable, category: SourceCategory) -> Option<f64> {
    let values: Vec<f64> = table
        .rows()
        .iter()
        .filter_map(|row| row.sources.get(category))
        .collect();
    mean(&values)
}

/// Source with the highest mean; the first category wins ties
fn largest_source(table: &FeatureTable) -> Option<(SourceCategory, f64)> {
    SourceCategory::ALL
        .iter()
        .filter_map(|&category| source_mean(table, category).map(|m| (category, m)))
        .fold(None, |best: Option<(SourceCategory, f64)>, (category, impact)| match best {
            Some((_, b)) if b >= impact => best,
            _ => Some((category, impact)),
        })
}

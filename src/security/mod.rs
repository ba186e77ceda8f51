//! Per-district views over the security table: the daily incident
//! series the forecast endpoint projects from, and the community
//! engagement scatter data.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::data::Dataset;

/// One dated value in an actual or forecast series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Sum incidents by calendar date for every district, dates ascending.
/// Rows sharing a (district, date) pair aggregate by summation.
pub fn incident_series(data: &Dataset) -> BTreeMap<String, Vec<SeriesPoint>> {
    let mut by_district: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
    for rec in &data.security.rows {
        *by_district
            .entry(rec.district.clone())
            .or_default()
            .entry(rec.date)
            .or_default() += rec.security_incidents as f64;
    }

    by_district
        .into_iter()
        .map(|(district, dates)| {
            let series = dates
                .into_iter()
                .map(|(date, value)| SeriesPoint { date, value })
                .collect();
            (district, series)
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct ScatterPoint {
    pub x: i64,
    pub y: f64,
}

#[derive(Debug, Serialize)]
pub struct DistrictScatter {
    pub district: String,
    pub points: Vec<ScatterPoint>,
}

/// Engagement-events vs crime-prevention-effectiveness scatter, one
/// point per source row, grouped by district (districts ascending).
/// `year` filters on the calendar year of each row's date.
pub fn engagement_effectiveness(data: &Dataset, year: Option<i32>) -> Vec<DistrictScatter> {
    let mut by_district: BTreeMap<String, Vec<ScatterPoint>> = BTreeMap::new();
    for rec in &data.security.rows {
        if let Some(wanted) = year {
            if rec.date.year() != wanted {
                continue;
            }
        }
        by_district
            .entry(rec.district.clone())
            .or_default()
            .push(ScatterPoint {
                x: rec.community_engagement_events,
                y: rec.crime_prevention_effectiveness_pct,
            });
    }

    by_district
        .into_iter()
        .map(|(district, points)| DistrictScatter { district, points })
        .collect()
}

//! Financial, HR, supply-chain and R&D aggregations. Every function is a
//! pure read over `&Dataset` plus an optional year filter; grouping goes
//! through `BTreeMap` keys so output ordering falls out of key order.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::data::Dataset;
use crate::util::round2;

/// `None` means "all years"; handlers pass the parsed `year=` query set.
pub type YearFilter<'a> = Option<&'a HashSet<i32>>;

fn year_selected(years: YearFilter, year: i32) -> bool {
    years.map_or(true, |set| set.contains(&year))
}

fn period_label(quarter: &str, year: i32) -> String {
    format!("{} FY{}", quarter, year)
}

#[derive(Debug, Serialize)]
pub struct SummaryTotals {
    pub total_revenue: f64,
    pub total_profit: f64,
}

/// Revenue and profit totals over the filtered year set.
pub fn summary(data: &Dataset, years: YearFilter) -> SummaryTotals {
    let mut total_revenue = 0.0;
    let mut total_profit = 0.0;
    for rec in &data.financial.rows {
        if year_selected(years, rec.year) {
            total_revenue += rec.revenue_m;
            total_profit += rec.net_profit_m;
        }
    }
    SummaryTotals {
        total_revenue,
        total_profit,
    }
}

/// Distinct years present in the financial table, ascending.
pub fn available_years(data: &Dataset) -> Vec<i32> {
    let years: BTreeSet<i32> = data.financial.rows.iter().map(|r| r.year).collect();
    years.into_iter().collect()
}

/// Sum revenue and GVA per (year, quarter) group. BTreeMap keeps the
/// (Year, Quarter) ascending order every downstream shape relies on.
fn quarterly_sums(data: &Dataset, years: YearFilter) -> BTreeMap<(i32, String), (f64, f64)> {
    let mut sums: BTreeMap<(i32, String), (f64, f64)> = BTreeMap::new();
    for rec in &data.financial.rows {
        if !year_selected(years, rec.year) {
            continue;
        }
        let entry = sums.entry((rec.year, rec.quarter.clone())).or_default();
        entry.0 += rec.revenue_m;
        entry.1 += rec.gva;
    }
    sums
}

#[derive(Debug, PartialEq, Serialize)]
pub struct YoyPoint {
    #[serde(rename = "Period")]
    pub period: String,
    #[serde(rename = "Revenue_YoY_%")]
    pub revenue_yoy_pct: f64,
    #[serde(rename = "GVA_YoY_%")]
    pub gva_yoy_pct: f64,
}

/// Year-over-year growth of quarterly revenue and GVA sums.
///
/// Growth is computed per quarter label against the previous year that
/// has the same quarter, never against the previous row. The first
/// occurrence of each quarter has no predecessor and is omitted, as is
/// any group whose predecessor sum is zero (the percent change would be
/// undefined).
pub fn revenue_gva_yoy(data: &Dataset, years: YearFilter) -> Vec<YoyPoint> {
    let grouped = quarterly_sums(data, years);

    let mut previous: HashMap<&str, (f64, f64)> = HashMap::new();
    let mut points = Vec::new();
    for ((year, quarter), (revenue, gva)) in &grouped {
        if let Some((prev_revenue, prev_gva)) = previous.get(quarter.as_str()) {
            if *prev_revenue != 0.0 && *prev_gva != 0.0 {
                points.push(YoyPoint {
                    period: period_label(quarter, *year),
                    revenue_yoy_pct: (revenue - prev_revenue) / prev_revenue * 100.0,
                    gva_yoy_pct: (gva - prev_gva) / prev_gva * 100.0,
                });
            }
        }
        previous.insert(quarter.as_str(), (*revenue, *gva));
    }
    points
}

#[derive(Debug, Serialize)]
pub struct QuarterlySeries {
    pub periods: Vec<String>,
    pub revenue: Vec<f64>,
    pub gva: Vec<f64>,
}

/// Quarterly revenue and GVA sums as parallel arrays, (Year, Quarter)
/// ascending, values rounded to 2 decimals.
pub fn output_vs_gva(data: &Dataset, years: YearFilter) -> QuarterlySeries {
    let grouped = quarterly_sums(data, years);

    let mut series = QuarterlySeries {
        periods: Vec::with_capacity(grouped.len()),
        revenue: Vec::with_capacity(grouped.len()),
        gva: Vec::with_capacity(grouped.len()),
    };
    for ((year, quarter), (revenue, gva)) in grouped {
        series.periods.push(period_label(&quarter, year));
        series.revenue.push(round2(revenue));
        series.gva.push(round2(gva));
    }
    series
}

#[derive(Debug, Serialize)]
pub struct DivisionQuarterBreakdown {
    pub year: i32,
    pub divisions: Vec<String>,
    pub quarters: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

/// Quarterly revenue per division, one breakdown per year.
///
/// Divisions are ordered descending by their total revenue across the
/// whole filtered set, and that order is shared by every year in the
/// response so chart legends line up. The values matrix is always
/// divisions x quarters, with 0.0 where a combination has no rows.
pub fn revenue_by_division_quarter(
    data: &Dataset,
    years: YearFilter,
) -> BTreeMap<i32, DivisionQuarterBreakdown> {
    let mut sums: HashMap<(i32, String, String), f64> = HashMap::new();
    let mut division_totals: HashMap<String, f64> = HashMap::new();
    let mut quarters_by_year: BTreeMap<i32, BTreeSet<String>> = BTreeMap::new();

    for rec in &data.financial.rows {
        if !year_selected(years, rec.year) {
            continue;
        }
        let Some(division) = &rec.division else {
            continue;
        };
        *sums
            .entry((rec.year, division.clone(), rec.quarter.clone()))
            .or_default() += rec.revenue_m;
        *division_totals.entry(division.clone()).or_default() += rec.revenue_m;
        quarters_by_year
            .entry(rec.year)
            .or_default()
            .insert(rec.quarter.clone());
    }

    let mut divisions: Vec<(String, f64)> = division_totals.into_iter().collect();
    divisions.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let divisions: Vec<String> = divisions.into_iter().map(|(name, _)| name).collect();

    let mut breakdowns = BTreeMap::new();
    for (year, quarters) in quarters_by_year {
        let quarters: Vec<String> = quarters.into_iter().collect();
        let values: Vec<Vec<f64>> = divisions
            .iter()
            .map(|division| {
                quarters
                    .iter()
                    .map(|quarter| {
                        sums.get(&(year, division.clone(), quarter.clone()))
                            .copied()
                            .unwrap_or(0.0)
                    })
                    .collect()
            })
            .collect();
        breakdowns.insert(
            year,
            DivisionQuarterBreakdown {
                year,
                divisions: divisions.clone(),
                quarters,
                values,
            },
        );
    }
    breakdowns
}

#[derive(Debug, Serialize)]
pub struct DivisionRevenue {
    #[serde(rename = "Division")]
    pub division: String,
    #[serde(rename = "Revenue_M")]
    pub revenue_m: f64,
}

/// Total revenue per division, descending.
pub fn revenue_by_division(data: &Dataset, years: YearFilter) -> Vec<DivisionRevenue> {
    let mut totals: HashMap<String, f64> = HashMap::new();
    for rec in &data.financial.rows {
        if !year_selected(years, rec.year) {
            continue;
        }
        if let Some(division) = &rec.division {
            *totals.entry(division.clone()).or_default() += rec.revenue_m;
        }
    }
    let mut out: Vec<DivisionRevenue> = totals
        .into_iter()
        .map(|(division, revenue)| DivisionRevenue {
            division,
            revenue_m: round2(revenue),
        })
        .collect();
    out.sort_by(|a, b| {
        b.revenue_m
            .total_cmp(&a.revenue_m)
            .then_with(|| a.division.cmp(&b.division))
    });
    out
}

#[derive(Debug, Serialize)]
pub struct DepartmentCount {
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "Count")]
    pub count: usize,
}

/// Headcount rows per department, descending by count.
pub fn employee_distribution(data: &Dataset) -> Vec<DepartmentCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for rec in &data.hr.rows {
        *counts.entry(rec.department.clone()).or_default() += 1;
    }
    let mut out: Vec<DepartmentCount> = counts
        .into_iter()
        .map(|(department, count)| DepartmentCount { department, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.department.cmp(&b.department)));
    out
}

#[derive(Debug, Serialize)]
pub struct RegionDelivery {
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "AvgDeliveryTime")]
    pub avg_delivery_time: f64,
}

/// Mean delivery time per region, regions ascending.
pub fn supply_performance(data: &Dataset) -> Vec<RegionDelivery> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for rec in &data.supply.rows {
        let (Some(region), Some(days)) = (&rec.region, rec.delivery_time_days) else {
            continue;
        };
        let entry = sums.entry(region.clone()).or_default();
        entry.0 += days;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(region, (total, n))| RegionDelivery {
            region,
            avg_delivery_time: round2(total / n as f64),
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct StatusCount {
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Count")]
    pub count: usize,
}

/// Project rows per status, descending by count.
pub fn rd_status(data: &Dataset) -> Vec<StatusCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for rec in &data.rd.rows {
        if let Some(status) = &rec.status {
            *counts.entry(status.clone()).or_default() += 1;
        }
    }
    let mut out: Vec<StatusCount> = counts
        .into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.status.cmp(&b.status)));
    out
}

#[derive(Debug, Serialize)]
pub struct PatentsByYear {
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "TotalPatents")]
    pub total_patents: i64,
}

/// Patent applications summed per year, ascending.
pub fn rd_patents_trend(data: &Dataset) -> Vec<PatentsByYear> {
    let mut totals: BTreeMap<i32, i64> = BTreeMap::new();
    for rec in &data.rd.rows {
        let (Some(year), Some(patents)) = (rec.year, rec.patent_applications) else {
            continue;
        };
        *totals.entry(year).or_default() += patents;
    }
    totals
        .into_iter()
        .map(|(year, total_patents)| PatentsByYear {
            year,
            total_patents,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FinancialRecord, HrRecord, RdRecord, SecurityRecord, SupplyRecord, Table};

    fn financial(year: i32, quarter: &str, division: &str, revenue: f64) -> FinancialRecord {
        let costs = revenue * 0.6;
        FinancialRecord {
            year,
            quarter: quarter.to_string(),
            division: Some(division.to_string()),
            revenue_m: revenue,
            operating_costs_m: costs,
            net_profit_m: revenue - costs,
            gva: revenue - costs,
        }
    }

    fn dataset(rows: Vec<FinancialRecord>) -> Dataset {
        Dataset {
            financial: Table::new(
                rows,
                [
                    "Year",
                    "Quarter",
                    "Division",
                    "Revenue_M",
                    "Operating_Costs_M",
                    "Net_Profit_M",
                ],
            ),
            hr: Table::<HrRecord>::new(vec![], ["Employee_ID", "Department"]),
            supply: Table::<SupplyRecord>::new(
                vec![],
                ["Supplier", "Region", "Delivery_Time_Days"],
            ),
            rd: Table::<RdRecord>::new(
                vec![],
                ["Project_ID", "Status", "Year", "Patent_Applications"],
            ),
            security: Table::<SecurityRecord>::new(
                vec![],
                [
                    "Date",
                    "District",
                    "Security_Incidents",
                    "Community_Engagement_Events",
                    "Crime_Prevention_Effectiveness_Pct",
                ],
            ),
        }
    }

    #[test]
    fn available_years_is_ascending_and_distinct() {
        let data = dataset(vec![
            financial(2024, "Q1", "Aerospace", 10.0),
            financial(2022, "Q1", "Aerospace", 10.0),
            financial(2024, "Q2", "Biotech", 10.0),
            financial(2023, "Q1", "Aerospace", 10.0),
        ]);
        assert_eq!(available_years(&data), vec![2022, 2023, 2024]);
    }

    #[test]
    fn summary_with_all_years_matches_unfiltered() {
        let data = dataset(vec![
            financial(2022, "Q1", "Aerospace", 100.0),
            financial(2023, "Q1", "Aerospace", 150.0),
        ]);
        let all: HashSet<i32> = [2022, 2023].into_iter().collect();
        let filtered = summary(&data, Some(&all));
        let unfiltered = summary(&data, None);
        assert_eq!(filtered.total_revenue, unfiltered.total_revenue);
        assert_eq!(filtered.total_profit, unfiltered.total_profit);
    }

    #[test]
    fn summary_filters_to_requested_years() {
        let data = dataset(vec![
            financial(2021, "Q1", "Aerospace", 100.0),
            financial(2022, "Q1", "Aerospace", 100.0),
            financial(2023, "Q1", "Aerospace", 100.0),
        ]);
        let years: HashSet<i32> = [2022, 2023].into_iter().collect();
        assert_eq!(summary(&data, Some(&years)).total_revenue, 200.0);
    }

    #[test]
    fn yoy_example_single_quarter_pair() {
        let data = dataset(vec![
            financial(2023, "Q1", "Aerospace", 100.0),
            financial(2024, "Q1", "Aerospace", 150.0),
        ]);
        let points = revenue_gva_yoy(&data, None);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].period, "Q1 FY2024");
        assert!((points[0].revenue_yoy_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn yoy_sums_duplicate_rows_before_growth() {
        // Two 2023 Q1 rows aggregate to 100 before the comparison.
        let data = dataset(vec![
            financial(2023, "Q1", "Aerospace", 60.0),
            financial(2023, "Q1", "Biotech", 40.0),
            financial(2024, "Q1", "Aerospace", 120.0),
        ]);
        let points = revenue_gva_yoy(&data, None);
        assert_eq!(points.len(), 1);
        assert!((points[0].revenue_yoy_pct - 20.0).abs() < 1e-9);
    }

    #[test]
    fn yoy_quarter_with_single_year_contributes_nothing() {
        let data = dataset(vec![
            financial(2023, "Q1", "Aerospace", 100.0),
            financial(2023, "Q2", "Aerospace", 100.0),
            financial(2024, "Q1", "Aerospace", 110.0),
        ]);
        let points = revenue_gva_yoy(&data, None);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].period, "Q1 FY2024");
    }

    #[test]
    fn yoy_compares_against_previous_present_year_across_gaps() {
        let data = dataset(vec![
            financial(2021, "Q3", "Aerospace", 100.0),
            financial(2024, "Q3", "Aerospace", 130.0),
        ]);
        let points = revenue_gva_yoy(&data, None);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].period, "Q3 FY2024");
        assert!((points[0].revenue_yoy_pct - 30.0).abs() < 1e-9);
    }

    #[test]
    fn output_vs_gva_orders_and_rounds() {
        let mut early = financial(2023, "Q2", "Aerospace", 100.124);
        early.gva = 40.567;
        let mut late = financial(2024, "Q1", "Aerospace", 90.0);
        late.gva = 35.0;
        let data = dataset(vec![late, early]);

        let series = output_vs_gva(&data, None);
        assert_eq!(series.periods, vec!["Q2 FY2023", "Q1 FY2024"]);
        assert_eq!(series.revenue, vec![100.12, 90.0]);
        assert_eq!(series.gva, vec![40.57, 35.0]);
    }

    #[test]
    fn division_matrix_is_dense_and_consistently_ordered() {
        let data = dataset(vec![
            financial(2023, "Q1", "Aerospace", 50.0),
            financial(2023, "Q2", "Biotech", 300.0),
            financial(2024, "Q1", "Aerospace", 60.0),
            financial(2024, "Q1", "Biotech", 250.0),
        ]);
        let breakdowns = revenue_by_division_quarter(&data, None);
        assert_eq!(breakdowns.len(), 2);

        // Biotech out-earns Aerospace overall, so it leads in every year.
        for (year, breakdown) in &breakdowns {
            assert_eq!(breakdown.year, *year);
            assert_eq!(breakdown.divisions, vec!["Biotech", "Aerospace"]);
            assert_eq!(breakdown.values.len(), breakdown.divisions.len());
            for row in &breakdown.values {
                assert_eq!(row.len(), breakdown.quarters.len());
            }
        }

        let y2023 = &breakdowns[&2023];
        assert_eq!(y2023.quarters, vec!["Q1", "Q2"]);
        // Biotech had no Q1 rows in 2023: zero-filled, not omitted.
        assert_eq!(y2023.values[0], vec![0.0, 300.0]);
        assert_eq!(y2023.values[1], vec![50.0, 0.0]);
    }

    #[test]
    fn revenue_by_division_sorts_descending() {
        let data = dataset(vec![
            financial(2023, "Q1", "Aerospace", 50.0),
            financial(2023, "Q2", "Biotech", 300.0),
            financial(2024, "Q1", "Aerospace", 60.0),
        ]);
        let out = revenue_by_division(&data, None);
        assert_eq!(out[0].division, "Biotech");
        assert_eq!(out[1].division, "Aerospace");
        assert_eq!(out[1].revenue_m, 110.0);
    }

    #[test]
    fn hr_supply_rd_breakdowns() {
        let mut data = dataset(vec![]);
        data.hr = Table::new(
            vec![
                HrRecord {
                    employee_id: "EMP001".into(),
                    department: "Engineering".into(),
                },
                HrRecord {
                    employee_id: "EMP002".into(),
                    department: "Engineering".into(),
                },
                HrRecord {
                    employee_id: "EMP003".into(),
                    department: "Finance".into(),
                },
            ],
            ["Employee_ID", "Department"],
        );
        data.supply = Table::new(
            vec![
                SupplyRecord {
                    supplier: "Acme".into(),
                    region: Some("North".into()),
                    delivery_time_days: Some(4.0),
                },
                SupplyRecord {
                    supplier: "Bolt".into(),
                    region: Some("North".into()),
                    delivery_time_days: Some(6.0),
                },
            ],
            ["Supplier", "Region", "Delivery_Time_Days"],
        );
        data.rd = Table::new(
            vec![
                RdRecord {
                    project_id: "PRJ-1".into(),
                    status: Some("Active".into()),
                    year: Some(2023),
                    patent_applications: Some(2),
                },
                RdRecord {
                    project_id: "PRJ-2".into(),
                    status: Some("Active".into()),
                    year: Some(2024),
                    patent_applications: Some(3),
                },
                RdRecord {
                    project_id: "PRJ-3".into(),
                    status: Some("Completed".into()),
                    year: Some(2023),
                    patent_applications: Some(1),
                },
            ],
            ["Project_ID", "Status", "Year", "Patent_Applications"],
        );

        let departments = employee_distribution(&data);
        assert_eq!(departments[0].department, "Engineering");
        assert_eq!(departments[0].count, 2);

        let regions = supply_performance(&data);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].avg_delivery_time, 5.0);

        let statuses = rd_status(&data);
        assert_eq!(statuses[0].status, "Active");
        assert_eq!(statuses[0].count, 2);

        let patents = rd_patents_trend(&data);
        assert_eq!(
            patents.iter().map(|p| (p.year, p.total_patents)).collect::<Vec<_>>(),
            vec![(2023, 3), (2024, 3)]
        );
    }
}

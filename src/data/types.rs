use chrono::NaiveDate;
use serde::Deserialize;

/// One quarterly ledger row from `financial_data.csv`.
///
/// `Division` is optional: the breakdown endpoints that need it check for
/// the column at request time instead of failing the whole load.
#[derive(Debug, Clone, Deserialize)]
pub struct FinancialRecord {
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Quarter")]
    pub quarter: String,
    #[serde(rename = "Division")]
    pub division: Option<String>,
    #[serde(rename = "Revenue_M")]
    pub revenue_m: f64,
    #[serde(rename = "Operating_Costs_M")]
    pub operating_costs_m: f64,
    #[serde(rename = "Net_Profit_M")]
    pub net_profit_m: f64,
    /// Gross value added, derived once at load time: revenue minus
    /// operating costs. Not a CSV column.
    #[serde(skip)]
    pub gva: f64,
}

/// One row from `hr_analytics.csv`.
#[derive(Debug, Clone, Deserialize)]
pub struct HrRecord {
    #[serde(rename = "Employee_ID")]
    pub employee_id: String,
    #[serde(rename = "Department")]
    pub department: String,
}

/// One row from `supply_chain.csv`.
#[derive(Debug, Clone, Deserialize)]
pub struct SupplyRecord {
    #[serde(rename = "Supplier")]
    pub supplier: String,
    #[serde(rename = "Region")]
    pub region: Option<String>,
    #[serde(rename = "Delivery_Time_Days")]
    pub delivery_time_days: Option<f64>,
}

/// One row from `rd_portfolio.csv`.
#[derive(Debug, Clone, Deserialize)]
pub struct RdRecord {
    #[serde(rename = "Project_ID")]
    pub project_id: String,
    #[serde(rename = "Status")]
    pub status: Option<String>,
    #[serde(rename = "Year")]
    pub year: Option<i32>,
    #[serde(rename = "Patent_Applications")]
    pub patent_applications: Option<i64>,
}

/// One daily observation from `security_data.csv`.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "District")]
    pub district: String,
    #[serde(rename = "Security_Incidents")]
    pub security_incidents: i64,
    #[serde(rename = "Community_Engagement_Events")]
    pub community_engagement_events: i64,
    #[serde(rename = "Crime_Prevention_Effectiveness_Pct")]
    pub crime_prevention_effectiveness_pct: f64,
}

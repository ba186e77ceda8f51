use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::info;

use super::{
    Dataset, FinancialRecord, Table, FINANCIAL_CSV, HR_CSV, RD_CSV, SECURITY_CSV, SUPPLY_CSV,
};

/// Read one CSV into a typed table, keeping the header list around for
/// per-query column checks.
fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Table<T>> {
    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let columns: Vec<String> = reader
        .headers()
        .with_context(|| format!("reading headers of {}", path.display()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.deserialize().enumerate() {
        let row: T =
            result.with_context(|| format!("row {} of {}", idx + 2, path.display()))?;
        rows.push(row);
    }

    Ok(Table::new(rows, columns))
}

fn derive_gva(financial: &mut Table<FinancialRecord>) {
    for rec in &mut financial.rows {
        rec.gva = rec.revenue_m - rec.operating_costs_m;
    }
}

/// Load all five datasets from `data_dir`. Any failure here is fatal:
/// the service refuses to start on incomplete data.
pub fn load_dataset(data_dir: &Path) -> Result<Dataset> {
    let mut financial = read_table(&data_dir.join(FINANCIAL_CSV))?;
    derive_gva(&mut financial);

    let hr = read_table(&data_dir.join(HR_CSV))?;
    let supply = read_table(&data_dir.join(SUPPLY_CSV))?;
    let rd = read_table(&data_dir.join(RD_CSV))?;
    let security = read_table(&data_dir.join(SECURITY_CSV))?;

    info!(
        financial = financial.len(),
        hr = hr.len(),
        supply = supply.len(),
        rd = rd.len(),
        security = security.len(),
        "loaded datasets from {}",
        data_dir.display()
    );

    Ok(Dataset {
        financial,
        hr,
        supply,
        rd,
        security,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_fixture_csvs(dir: &Path, financial_header: &str, financial_rows: &[&str]) {
        let mut financial = String::from(financial_header);
        financial.push('\n');
        for row in financial_rows {
            financial.push_str(row);
            financial.push('\n');
        }
        fs::write(dir.join(FINANCIAL_CSV), financial).unwrap();
        fs::write(
            dir.join(HR_CSV),
            "Employee_ID,Department\nEMP001,Engineering\nEMP002,Engineering\n",
        )
        .unwrap();
        fs::write(
            dir.join(SUPPLY_CSV),
            "Supplier,Region,Delivery_Time_Days\nAcme,North,3.5\nBolt,South,5.0\n",
        )
        .unwrap();
        fs::write(
            dir.join(RD_CSV),
            "Project_ID,Status,Year,Patent_Applications\nPRJ-1,Active,2023,2\nPRJ-2,Completed,2024,1\n",
        )
        .unwrap();
        fs::write(
            dir.join(SECURITY_CSV),
            "Date,District,Security_Incidents,Community_Engagement_Events,Crime_Prevention_Effectiveness_Pct\n\
             2024-01-01,Downtown,4,2,71.5\n2024-01-02,Downtown,6,1,70.2\n",
        )
        .unwrap();
    }

    #[test]
    fn loads_all_tables_and_derives_gva() {
        let dir = tempdir().unwrap();
        write_fixture_csvs(
            dir.path(),
            "Year,Quarter,Division,Revenue_M,Operating_Costs_M,Net_Profit_M",
            &["2023,Q1,Aerospace,120.5,80.0,30.5", "2023,Q2,Aerospace,130.0,85.5,32.0"],
        );

        let data = load_dataset(dir.path()).unwrap();
        assert_eq!(data.financial.len(), 2);
        assert_eq!(data.financial.rows[0].gva, 120.5 - 80.0);
        assert_eq!(data.hr.len(), 2);
        assert_eq!(data.security.rows[1].security_incidents, 6);
        assert!(data.financial.has_column("Division"));
    }

    #[test]
    fn absent_division_column_loads_but_is_reported_missing() {
        let dir = tempdir().unwrap();
        write_fixture_csvs(
            dir.path(),
            "Year,Quarter,Revenue_M,Operating_Costs_M,Net_Profit_M",
            &["2023,Q1,120.5,80.0,30.5"],
        );

        let data = load_dataset(dir.path()).unwrap();
        assert_eq!(data.financial.rows[0].division, None);
        assert_eq!(
            data.financial.missing_columns(&["Division"]),
            vec!["Division".to_string()]
        );
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let dir = tempdir().unwrap();
        write_fixture_csvs(
            dir.path(),
            "Year,Quarter,Division,Operating_Costs_M,Net_Profit_M",
            &["2023,Q1,Aerospace,80.0,30.5"],
        );

        let err = load_dataset(dir.path()).unwrap_err();
        assert!(err.to_string().contains(FINANCIAL_CSV));
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = tempdir().unwrap();
        assert!(load_dataset(dir.path()).is_err());
    }
}

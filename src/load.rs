use crate::catalog::LOCATION_ID_COLUMN;
use crate::error::{C19Error, Result};
use crate::{DeathTable, HospTable, MetricTable, DATE_FORMAT};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use log::debug;
use std::path::Path;

pub const DATE_COLUMN: usize = 2;
pub const DAILY_DEATHS_OFFSET: usize = 25;
pub const TOTAL_DEATHS_OFFSET: usize = 28;
pub const MOBILITY_COLUMN: usize = 38;
pub const CONFIRMED_COLUMN: usize = 41;

/// source columns of the hospitalization table, in table order:
/// estimated infections, hospital beds, ICU beds, ventilation, death rate per 100K
const HOSP_SOURCE_COLUMNS: [usize; 15] = [42, 43, 44, 4, 5, 6, 7, 8, 9, 10, 11, 12, 46, 47, 48];

// death table columns
pub const DEATHS_MEAN: usize = 0;
pub const DEATHS_LOWER: usize = 1;
pub const DEATHS_UPPER: usize = 2;
pub const MOBILITY: usize = 3;

// hospitalization table, first column (mean) of each mean/lower/upper triple
pub const INFECTED: usize = 0;
pub const HOSPITALIZED: usize = 3;
pub const ICU: usize = 6;
pub const VENTILATED: usize = 9;
pub const DEATH_RATE: usize = 12;
pub const CONFIRMED: usize = 15;

/// Daily or cumulative death counts, selecting the source column triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathFraming {
    Daily,
    Total,
}

impl DeathFraming {
    pub fn offset(self) -> usize {
        match self {
            DeathFraming::Daily => DAILY_DEATHS_OFFSET,
            DeathFraming::Total => TOTAL_DEATHS_OFFSET,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DeathFraming::Daily => "Daily",
            DeathFraming::Total => "Total",
        }
    }
}

/// Loads deaths (mean, lower, upper) and mobility of one location.
/// A blank mobility field becomes 0.
pub fn load_deaths<P: AsRef<Path>>(
    fin: P,
    location_id: &str,
    framing: DeathFraming,
) -> Result<DeathTable> {
    debug!(
        "loading {} deaths from {}, location id {}",
        framing.label(),
        fin.as_ref().display(),
        location_id
    );
    let offset = framing.offset();
    load_rows(fin.as_ref(), location_id, |record, line| {
        Ok([
            number(record, line, offset)?,
            number(record, line, offset + 1)?,
            number(record, line, offset + 2)?,
            number_or(record, line, MOBILITY_COLUMN, 0.)?,
        ])
    })
}

/// Loads infections, hospital use, death rate and confirmed cases of one location.
/// A blank confirmed cases field becomes NAN.
pub fn load_hospitalizations<P: AsRef<Path>>(fin: P, location_id: &str) -> Result<HospTable> {
    debug!(
        "loading hospitalizations from {}, location id {}",
        fin.as_ref().display(),
        location_id
    );
    load_rows(fin.as_ref(), location_id, |record, line| {
        let mut row = [f64::NAN; 16];
        for (r, &c) in row.iter_mut().zip(HOSP_SOURCE_COLUMNS.iter()) {
            *r = number(record, line, c)?;
        }
        row[CONFIRMED] = number_or(record, line, CONFIRMED_COLUMN, f64::NAN)?;
        Ok(row)
    })
}

/// scans all the data rows and keeps those of location_id, in file order
fn load_rows<const N: usize, F>(fin: &Path, location_id: &str, mut extract: F) -> Result<MetricTable<N>>
where
    F: FnMut(&StringRecord, u64) -> Result<[f64; N]>,
{
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(fin)?;
    let mut table = MetricTable::new(1000);
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        if field(&record, line, LOCATION_ID_COLUMN)? != location_id {
            continue;
        }
        let date_str = field(&record, line, DATE_COLUMN)?;
        let date = NaiveDate::parse_from_str(date_str.trim(), DATE_FORMAT).map_err(|_| {
            C19Error::Date {
                line,
                value: date_str.to_string(),
            }
        })?;
        table.push_row(date, extract(&record, line)?);
    }
    if table.is_empty() {
        return Err(C19Error::NoRows(location_id.to_string()));
    }
    debug!("loaded {} rows", table.len());
    Ok(table)
}

fn field(record: &StringRecord, line: u64, column: usize) -> Result<&str> {
    record
        .get(column)
        .ok_or(C19Error::MissingColumn { line, column })
}

fn number(record: &StringRecord, line: u64, column: usize) -> Result<f64> {
    let value = field(record, line, column)?;
    value.trim().parse().map_err(|_| C19Error::Number {
        line,
        column,
        value: value.to_string(),
    })
}

/// like number, but a blank field gives fill
fn number_or(record: &StringRecord, line: u64, column: usize, fill: f64) -> Result<f64> {
    if field(record, line, column)?.trim().is_empty() {
        Ok(fill)
    } else {
        number(record, line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const WIDTH: usize = 50;

    /// a data row where column c holds c + base, with the catalog fields set
    fn row(id: &str, date: &str, base: f64) -> Vec<String> {
        let mut r: Vec<String> = (0..WIDTH).map(|c| format!("{}", c as f64 + base)).collect();
        r[1] = format!("loc {}", id);
        r[2] = date.to_string();
        r[3] = id.to_string();
        r
    }

    fn write_fixture(name: &str, rows: &[Vec<String>]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("c19_load_{}_{}.csv", name, std::process::id()));
        let mut content: Vec<String> = vec![(0..WIDTH).map(|c| format!("c{}", c)).collect::<Vec<_>>().join(",")];
        content.extend(rows.iter().map(|r| r.join(",")));
        std::fs::write(&path, content.join("\n") + "\n").unwrap();
        path
    }

    #[test]
    fn test_deaths_daily_columns() {
        let mut r2 = row("7", "2020-04-02", 100.);
        r2[MOBILITY_COLUMN] = String::new();
        let path = write_fixture("daily", &[row("7", "2020-04-01", 0.), r2]);
        let table = load_deaths(&path, "7", DeathFraming::Daily).unwrap();
        assert_eq!(table.rows(), &[[25., 26., 27., 38.], [125., 126., 127., 0.]]);
        assert_eq!(table.dates()[1], NaiveDate::from_ymd_opt(2020, 4, 2).unwrap());
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_deaths_total_columns() {
        let path = write_fixture("total", &[row("7", "2020-04-01", 0.)]);
        let table = load_deaths(&path, "7", DeathFraming::Total).unwrap();
        assert_eq!(table.rows(), &[[28., 29., 30., 38.]]);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_hospitalization_columns() {
        let mut r2 = row("7", "2020-04-02", 0.);
        r2[CONFIRMED_COLUMN] = String::new();
        let path = write_fixture("hosp", &[row("7", "2020-04-01", 0.), r2]);
        let table = load_hospitalizations(&path, "7").unwrap();
        assert_eq!(
            &table.rows()[0][..15],
            &[42., 43., 44., 4., 5., 6., 7., 8., 9., 10., 11., 12., 46., 47., 48.]
        );
        assert_eq!(table.rows()[0][CONFIRMED], 41.);
        assert!(table.rows()[1][CONFIRMED].is_nan());
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_filters_location_and_keeps_lengths() {
        let rows = vec![
            row("1", "2020-04-01", 0.),
            row("2", "2020-04-01", 0.),
            row("1", "2020-04-02", 1.),
            row("2", "2020-04-02", 1.),
            row("1", "2020-04-03", 2.),
        ];
        let path = write_fixture("filter", &rows);
        let deaths = load_deaths(&path, "1", DeathFraming::Daily).unwrap();
        assert_eq!(deaths.len(), 3);
        assert_eq!(deaths.dates().len(), deaths.rows().len());
        assert_eq!(deaths.column(DEATHS_MEAN), vec![25., 26., 27.]);
        let hosp = load_hospitalizations(&path, "2").unwrap();
        assert_eq!(hosp.len(), 2);
        assert_eq!(hosp.dates().len(), hosp.rows().len());
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_unknown_id_has_no_rows() {
        let path = write_fixture("norows", &[row("1", "2020-04-01", 0.)]);
        assert!(matches!(
            load_hospitalizations(&path, "9"),
            Err(C19Error::NoRows(_))
        ));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_bad_date_fails() {
        let path = write_fixture("baddate", &[row("1", "04/01/2020", 0.)]);
        match load_deaths(&path, "1", DeathFraming::Daily) {
            Err(C19Error::Date { line, value }) => {
                assert_eq!(line, 2);
                assert_eq!(value, "04/01/2020");
            }
            other => panic!("expected Date error, got {:?}", other),
        }
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_blank_metric_fails() {
        let mut r = row("1", "2020-04-01", 0.);
        r[DAILY_DEATHS_OFFSET] = String::new();
        let path = write_fixture("blank", &[r]);
        assert!(matches!(
            load_deaths(&path, "1", DeathFraming::Daily),
            Err(C19Error::Number { column: 25, .. })
        ));
        std::fs::remove_file(path).unwrap();
    }
}

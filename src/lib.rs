use chrono::prelude::*;
pub mod catalog;
pub mod error;
pub mod load;
pub mod logger;
pub mod plot;
pub mod projection;
pub mod render;

pub use catalog::LocationCatalog;
pub use error::{C19Error, Result};
pub use load::{load_deaths, load_hospitalizations, DeathFraming};
pub use projection::{first_divergent_index, last_observed_index};
pub use render::{plot_deaths, plot_hospitalizations, BandStyle, RenderOptions};

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const DEFAULT_CSV: &str = "Reference_hospitalization_all_locs.csv";

/// Projections of deaths with mobility: mean, lower, upper, mobility
pub type DeathTable = MetricTable<4>;

/// Projections of infections, hospital use and death rate, plus confirmed cases
pub type HospTable = MetricTable<16>;

/// Dates and fixed-width metric rows of one location.
/// The column meaning depends on the loader that built the table,
/// see the column constants in `load`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTable<const N: usize> {
    dates: Vec<NaiveDate>,
    rows: Vec<[f64; N]>,
}

impl<const N: usize> MetricTable<N> {
    pub fn new(capacity: usize) -> MetricTable<N> {
        MetricTable {
            dates: Vec::with_capacity(capacity),
            rows: Vec::with_capacity(capacity),
        }
    }

    pub fn push_row(&mut self, date: NaiveDate, row: [f64; N]) {
        self.dates.push(date);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn rows(&self) -> &[[f64; N]] {
        &self.rows
    }

    /// copies out column j, panics if j >= N
    pub fn column(&self, j: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[j]).collect()
    }

    /// keeps the first n dates and rows, drops the rest
    pub fn truncate(&mut self, n: usize) {
        self.dates.truncate(n);
        self.rows.truncate(n);
    }
}

/// Formats an axis value as a truncated human readable string,
/// e.g. 1_234_567 -> "1M", 2_500 -> "2K", 500 -> "500".
pub fn format_y_tick(v: f64) -> String {
    let t = v.trunc();
    if t > 999_999. {
        format!("{}M", (v / 1_000_000.).trunc() as i64)
    } else if t > 999. {
        format!("{}K", (v / 1_000.).trunc() as i64)
    } else {
        format!("{}", v)
    }
}

/// "united_states_of_america" -> "United States Of America"
pub fn title_case(location: &str) -> String {
    let mut title = String::with_capacity(location.len());
    let mut prev_alpha = false;
    for c in location.replace('_', " ").chars() {
        if prev_alpha {
            title.extend(c.to_lowercase());
        } else {
            title.extend(c.to_uppercase());
        }
        prev_alpha = c.is_alphabetic();
    }
    title
}

/// midnight UTC of the given date, the x coordinate used by the charts
pub fn to_utc(d: &NaiveDate) -> DateTime<Utc> {
    TimeZone::from_utc_datetime(&Utc, &d.and_time(NaiveTime::MIN))
}

pub fn min_and_max<T: std::cmp::PartialOrd + Copy>(s: &[T]) -> Option<(T, T)> {
    let mut self_iter = s.iter();
    let (mut min, mut max) = match self_iter.next() {
        Some(v) => (*v, *v),
        None => return None,
    };
    for es in self_iter {
        if *es > max {
            max = *es
        }
        if *es < min {
            min = *es
        }
    }
    Some((min, max))
}

/// min and max ignoring NAN, None if nothing but NAN
pub fn nan_min_and_max(s: &[f64]) -> Option<(f64, f64)> {
    let valid: Vec<f64> = s.iter().copied().filter(|v| !v.is_nan()).collect();
    min_and_max(&valid[..])
}

pub fn suitable_xfmt(d: chrono::Duration) -> &'static str {
    if d > chrono::Duration::days(730) {
        "%Y"
    } else if d > chrono::Duration::days(60) {
        "%Y-%m"
    } else {
        "%m-%d"
    }
}

/// Error types for loading and plotting the projection data
use thiserror::Error;

/// Main error type for c19_plot operations
#[derive(Error, Debug)]
pub enum C19Error {
    /// Could not open or create a file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The csv reader failed on a record
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Date field is not in %Y-%m-%d format
    #[error("line {line}: invalid date '{value}'")]
    Date { line: u64, value: String },

    /// A metric field is not a number
    #[error("line {line}, column {column}: invalid number '{value}'")]
    Number {
        line: u64,
        column: usize,
        value: String,
    },

    /// Record too short for the fixed column layout
    #[error("line {line}: missing column {column}")]
    MissingColumn { line: u64, column: usize },

    /// No row in the file carries the location identifier
    #[error("no rows found for location id '{0}'")]
    NoRows(String),

    /// Location selector is not in the catalog
    #[error("invalid location '{given}' (choose from: {})", .valid.join(", "))]
    UnknownLocation { given: String, valid: Vec<String> },

    /// Nothing left to draw after truncation
    #[error("empty series, nothing to plot")]
    EmptySeries,

    /// A global logger was already installed
    #[error("Failed to set up logging: {0}")]
    Logger(#[from] log::SetLoggerError),

    /// Error coming from the drawing backend
    #[error("Failed to draw chart: {0}")]
    Plot(String),
}

/// Type alias for Results using C19Error
pub type Result<T> = std::result::Result<T, C19Error>;

//! Market data domain types.
//!
//! - `symbol`: ticker identifiers
//! - `params`: query parameter enums (interval, period, earnings frequency)
//! - `series`: OHLCV bars, quotes, historical series, dividends
//! - `fundamentals`: company profile, earnings, options chains

pub mod fundamentals;
pub mod params;
pub mod series;
pub mod symbol;

pub use fundamentals::{CompanyProfile, EarningsReport, EarningsRow, OptionsChain};
pub use params::{EarningsFrequency, Interval, Period};
pub use series::{Bar, Dividend, DividendHistory, HistoricalSeries, Quote};
pub use symbol::Symbol;

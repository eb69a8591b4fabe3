//! Value coercion rules for captured text fragments.

pub mod amounts;
pub mod currency;
pub mod dates;
pub mod exchange;
pub mod patterns;
pub mod text;

pub use amounts::{parse_amount, parse_decimal, parse_exchange_rate, parse_shares};
pub use currency::{currency_from_symbol, parse_currency, parse_currency_code};
pub use dates::{combine_date_time, parse_date, parse_time};
pub use exchange::{add_fee, add_tax, check_and_set_gross_unit, implied_rate, resolve_gross_unit};
pub use text::{replace_multiple_blanks, trim};

use serde::{Deserialize, Serialize};

/// Number formatting convention of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberLocale {
    /// `1.234,56`
    #[default]
    German,
    /// `1,234.56`
    English,
    /// `1'234.56`
    Swiss,
}

impl NumberLocale {
    /// Separator between digit groups.
    pub fn grouping(&self) -> char {
        match self {
            NumberLocale::German => '.',
            NumberLocale::English => ',',
            NumberLocale::Swiss => '\'',
        }
    }

    /// Separator before the fractional digits.
    pub fn decimal(&self) -> char {
        match self {
            NumberLocale::German => ',',
            NumberLocale::English | NumberLocale::Swiss => '.',
        }
    }
}

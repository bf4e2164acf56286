//! Salary normalization into the base currency.

use crate::api::Salary;
use crate::error::NormalizationError;
use vacscan_core::ExchangeRates;

/// Multiplier applied to salaries stated before tax (13% income tax).
pub const GROSS_TO_NET: f64 = 0.87;

/// Salary bounds in the base currency, net of tax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SalaryBounds {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl SalaryBounds {
    /// True when at least one bound is known.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }
}

/// Convert each non-null bound: `trunc(value * net_factor / rate)`.
///
/// The rate is only looked up when there is a bound to convert, so a salary
/// object with both bounds null never fails.
#[allow(clippy::cast_possible_truncation)]
pub fn normalize_salary(
    salary: &Salary,
    rates: &ExchangeRates,
) -> Result<SalaryBounds, NormalizationError> {
    if salary.from.is_none() && salary.to.is_none() {
        return Ok(SalaryBounds::default());
    }

    let currency = salary
        .currency
        .as_deref()
        .ok_or(NormalizationError::MissingCurrency)?;
    let rate = rates
        .get(currency)
        .ok_or_else(|| NormalizationError::UnknownCurrency(currency.to_string()))?;
    if !rate.is_finite() || rate <= 0.0 {
        return Err(NormalizationError::InvalidRate {
            currency: currency.to_string(),
            rate,
        });
    }

    let factor = if salary.gross.unwrap_or(false) {
        GROSS_TO_NET
    } else {
        1.0
    };
    let convert = |value: f64| (factor * value / rate).trunc() as i64;

    Ok(SalaryBounds {
        from: salary.from.map(convert),
        to: salary.to.map(convert),
    })
}

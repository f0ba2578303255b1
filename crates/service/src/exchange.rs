//! Currency conversion with up-front parameter validation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::errors::ServiceError;

/// Conversion input. All fields are optional on the wire so that a missing
/// field reaches validation instead of failing deserialization.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ConversionRequest {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Conversion {
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub rate: f64,
    pub converted: f64,
}

/// Units of each currency per one unit of a common base. Codes are upper-cased.
#[derive(Clone, Debug, Default)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl RateTable {
    /// Every rate must be finite and positive, otherwise a conversion could
    /// divide by zero or yield a negative amount.
    pub fn new<I, S>(rates: I) -> Result<Self, ServiceError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut table = HashMap::new();
        for (code, rate) in rates {
            let code = code.as_ref().trim().to_ascii_uppercase();
            if code.is_empty() {
                return Err(ServiceError::invalid("currency code must not be empty"));
            }
            if !rate.is_finite() || rate <= 0.0 {
                return Err(ServiceError::invalid(format!("rate for {} must be finite and positive", code)));
            }
            table.insert(code, rate);
        }
        Ok(Self { rates: table })
    }

    pub fn is_empty(&self) -> bool { self.rates.is_empty() }

    /// Rate to multiply an amount in `from` by to get `to`.
    pub fn rate(&self, from: &str, to: &str) -> Result<f64, ServiceError> {
        if from == to {
            return Ok(1.0);
        }
        let lookup = |code: &str| {
            self.rates
                .get(code)
                .copied()
                .ok_or_else(|| ServiceError::invalid(format!("unsupported currency {}", code)))
        };
        Ok(lookup(to)? / lookup(from)?)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ExchangeService {
    rates: RateTable,
}

impl ExchangeService {
    pub fn new(rates: RateTable) -> Self { Self { rates } }

    /// Validate that `from`, `to` and `amount` are all present, then convert.
    #[instrument(skip(self))]
    pub async fn convert_amount(&self, req: ConversionRequest) -> Result<Conversion, ServiceError> {
        let from = required_code(req.from.as_deref(), "from")?;
        let to = required_code(req.to.as_deref(), "to")?;
        let amount = match req.amount {
            Some(a) if a.is_finite() && a != 0.0 => a,
            Some(_) => return Err(ServiceError::invalid("amount must be a non-zero finite number")),
            None => return Err(ServiceError::invalid("missing required field `amount`")),
        };
        let rate = self.rates.rate(&from, &to)?;
        debug!(%from, %to, amount, rate, "conversion_rate_resolved");
        Ok(Conversion { from, to, amount, rate, converted: amount * rate })
    }
}

fn required_code(value: Option<&str>, field: &str) -> Result<String, ServiceError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_ascii_uppercase()),
        _ => Err(ServiceError::invalid(format!("missing required field `{}`", field))),
    }
}

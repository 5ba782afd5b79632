use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX_DIGITS: usize = 5;
const DECIMAL_PLACES: usize = 2;

/// Preço decimal com duas casas, guardado em centavos.
///
/// Serializa sempre como string (`"5.50"`), tanto no JSON quanto no BSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Price {
    cents: i64,
}

impl Price {
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    pub fn cents(&self) -> i64 {
        self.cents
    }
}

impl FromStr for Price {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.starts_with('-') {
            return Err("Ensure this value is greater than or equal to 0.".to_string());
        }

        let (whole, fraction) = match s.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (s, ""),
        };

        let is_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
            return Err("A valid number is required.".to_string());
        }

        let fraction = fraction.trim_end_matches('0');
        if fraction.len() > DECIMAL_PLACES {
            return Err(format!(
                "Ensure that there are no more than {} decimal places.",
                DECIMAL_PLACES
            ));
        }

        let whole = whole.trim_start_matches('0');
        if whole.len() > MAX_DIGITS - DECIMAL_PLACES {
            return Err(format!(
                "Ensure that there are no more than {} digits before the decimal point.",
                MAX_DIGITS - DECIMAL_PLACES
            ));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| "A valid number is required.".to_string())?
        };

        let fraction_cents = fraction
            .bytes()
            .zip([10i64, 1])
            .map(|(digit, weight)| i64::from(digit - b'0') * weight)
            .sum::<i64>();

        Ok(Self::from_cents(whole * 100 + fraction_cents))
    }
}

impl TryFrom<String> for Price {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Price> for String {
    fn from(price: Price) -> Self {
        price.to_string()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

/// Preço como chega no payload: número JSON ou string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(serde_json::Number),
    Text(String),
}

impl PriceInput {
    pub fn parse(&self) -> Result<Price, String> {
        match self {
            PriceInput::Number(n) => n.to_string().parse(),
            PriceInput::Text(s) => s.parse(),
        }
    }
}

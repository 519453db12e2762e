//! Lenient field decoders. The telemetry API is not consistent about whether
//! numbers and ids are sent as JSON numbers or strings.

use serde::{Deserialize, Deserializer, de::Error};

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Num(f64),
    Str(String),
}

impl Loose {
    fn into_number<E: Error>(self) -> Result<f64, E> {
        match self {
            Loose::Num(num) => Ok(num),
            Loose::Str(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected a number, got {s:?}"))),
        }
    }

    fn into_text(self) -> String {
        match self {
            Loose::Num(num) => num.to_string(),
            Loose::Str(s) => s,
        }
    }
}

pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Loose::deserialize(deserializer)?.into_number()
}

pub fn opt_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(loose) => loose.into_number().map(Some),
        None => Ok(None),
    }
}

/// One reading within a series. Missing, empty or non-numeric values become `None`
/// so a single bad sample leaves a gap instead of failing the whole series.
pub fn reading<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let reading = match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Num(num)) => Some(num),
        Some(Loose::Str(s)) => s.trim().parse().ok(),
        None => None,
    };

    Ok(reading.filter(|num: &f64| num.is_finite()))
}

/// Ids and free-form values that may be numeric; `1` and `"1"` both become `"1"`.
pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Loose::deserialize(deserializer)?.into_text())
}

pub fn opt_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Loose>::deserialize(deserializer)?.map(Loose::into_text))
}

pub fn text_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let list = Vec::<Loose>::deserialize(deserializer)?;
    Ok(list.into_iter().map(Loose::into_text).collect())
}

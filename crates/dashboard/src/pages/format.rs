use std::fmt::Display;

use pretty_bytes_typed::{pretty_bytes, pretty_bytes_binary};

pub const NA: &str = "N/A";

pub fn calc_percent(used: f64, total: f64) -> f64 {
    if total <= 0. {
        return 0.;
    };

    let percent = used / total * 100.;
    // Round percent to 2 decimal places
    (percent * 100.).round() / 100.
}

pub fn round2(val: f64) -> f64 {
    (val * 100.).round() / 100.
}

/// Decimal units, for byte counts reported by the telemetry API.
pub fn bytes(val: f64) -> String {
    pretty_bytes(val.max(0.) as u64, Some(2)).to_string()
}

/// Binary units, for host disk stats.
pub fn bytes_binary(val: f64) -> String {
    pretty_bytes_binary(val.max(0.) as u64, Some(2)).to_string()
}

pub fn mebibytes(mb: f64) -> String {
    bytes_binary(mb * 1024. * 1024.)
}

pub fn gigabytes(val: f64) -> String {
    format!("{val:.2} GB")
}

/// VM RAM figures are reported in MB.
pub fn megabytes(val: f64) -> String {
    format!("{val:.2} MB")
}

/// A bare MB figure as sent in some VM overviews; unparseable text is shown as is.
pub fn megabytes_raw(raw: &str) -> String {
    raw.trim().parse().map_or_else(|_| raw.to_string(), megabytes)
}

pub fn or_na<T: Display>(val: Option<T>) -> String {
    val.map_or_else(|| NA.to_string(), |x| x.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageLevel {
    Ok,
    Warn,
    Critical,
}

impl UsageLevel {
    pub fn of(percent: f64) -> Self {
        if percent < 60. {
            Self::Ok
        } else if percent < 80. {
            Self::Warn
        } else {
            Self::Critical
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            Self::Ok => "-ok",
            Self::Warn => "-warn",
            Self::Critical => "-critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempLevel {
    Normal,
    Warm,
    Hot,
}

impl TempLevel {
    pub fn of(celsius: f64) -> Self {
        if celsius >= 80. {
            Self::Hot
        } else if celsius >= 60. {
            Self::Warm
        } else {
            Self::Normal
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            Self::Normal => "-normal",
            Self::Warm => "-warm",
            Self::Hot => "-hot",
        }
    }
}

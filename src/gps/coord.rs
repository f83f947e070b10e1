// src/gps/coord.rs
//! NMEA degree-minute coordinate decoding

/// Convert an NMEA `DDMM.MMMM` / `DDDMM.MMMM` field and its hemisphere
/// letter into signed decimal degrees.
///
/// The last two integer digits before the decimal point are minutes and
/// everything before them is degrees. Unparsable halves count as `0.0`.
/// `S` and `W` negate the result; any other hemisphere leaves it positive.
pub fn decode(value: &str, hemisphere: &str) -> f64 {
    if value.is_empty() {
        return 0.0;
    }

    let boundary = match value.find('.') {
        Some(dot) if dot > 2 => dot - 2,
        _ => value.len().saturating_sub(2),
    };

    // `get` rather than indexing: a stray multi-byte char must not panic
    let (degrees, minutes) = match (value.get(..boundary), value.get(boundary..)) {
        (Some(d), Some(m)) => (parse_or_zero(d), parse_or_zero(m)),
        _ => (0.0, 0.0),
    };

    let decimal = degrees + minutes / 60.0;
    match hemisphere {
        "S" | "W" => -decimal,
        _ => decimal,
    }
}

fn parse_or_zero(s: &str) -> f64 {
    s.parse::<f64>().unwrap_or(0.0)
}

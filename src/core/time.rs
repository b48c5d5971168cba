use time::{format_description::well_known::Rfc3339, OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn to_primitive_utc(value: OffsetDateTime) -> PrimitiveDateTime {
    let utc = value.to_offset(UtcOffset::UTC);
    PrimitiveDateTime::new(utc.date(), utc.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

/// Render a stored UTC instant in an exam's display offset, for user-facing
/// messages only. Accepts "UTC", "Z", "+HH:MM", "-HH:MM" and bare "+HH";
/// anything else falls back to UTC.
pub(crate) fn format_in_zone(value: PrimitiveDateTime, zone: &str) -> String {
    let offset = parse_display_offset(zone).unwrap_or(UtcOffset::UTC);
    let shifted = value.assume_utc().to_offset(offset);
    shifted.format(&Rfc3339).unwrap_or_else(|_| shifted.to_string())
}

pub(crate) fn parse_display_offset(zone: &str) -> Option<UtcOffset> {
    let trimmed = zone.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
        return Some(UtcOffset::UTC);
    }

    let (sign, rest) = match trimmed.as_bytes().first()? {
        b'+' => (1i8, &trimmed[1..]),
        b'-' => (-1i8, &trimmed[1..]),
        _ => return None,
    };

    let mut parts = rest.splitn(2, ':');
    let hours: i8 = parts.next()?.parse().ok()?;
    let minutes: i8 = match parts.next() {
        Some(raw) => raw.parse().ok()?,
        None => 0,
    };

    if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
        return None;
    }

    UtcOffset::from_hms(sign * hours, sign * minutes, 0).ok()
}

use jiff::{SignedDuration, Span, SpanRelativeTo};

/// Accepts `10s`, `PT1M30S`, `1h 30m` or a plain number of seconds.
pub fn parse_duration(input: &str) -> Result<SignedDuration, String> {
    if let Ok(duration) = input.parse::<SignedDuration>() {
        return Ok(duration.abs());
    }

    if let Ok(duration) = input
        .parse::<Span>()
        .and_then(|span| span.to_duration(SpanRelativeTo::days_are_24_hours()))
    {
        return Ok(duration.abs());
    }

    if let Ok(seconds) = input.parse::<i64>() {
        return Ok(SignedDuration::from_secs(seconds.abs()));
    }

    Err(format!("Invalid duration: {input}"))
}

#[macro_export]
macro_rules! timer_debug {
    ($msg:literal,$block:expr) => {{
        let now = jiff::Timestamp::now();
        let result = $block;
        let elapsed = jiff::Timestamp::now().duration_since(now);

        tracing::debug!("{}: Took {:?}", $msg, elapsed);

        result
    }};
}

/// Wall-clock deadline checked between search rounds.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Option<jiff::Timestamp>);

impl Deadline {
    pub fn after(duration: Option<jiff::SignedDuration>) -> Self {
        Deadline(duration.and_then(|duration| jiff::Timestamp::now().checked_add(duration).ok()))
    }

    pub fn none() -> Self {
        Deadline(None)
    }

    pub fn is_reached(&self) -> bool {
        self.0
            .is_some_and(|deadline| jiff::Timestamp::now() >= deadline)
    }
}

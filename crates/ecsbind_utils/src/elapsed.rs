use std::{
    fmt::{self, Display},
    time::Duration,
};

/// Displays a [`Duration`] as `m:ss.fffffff`, the way load progress is reported.
///
/// ## Example
/// ```
/// # use ecsbind_utils::ElapsedDisplay;
/// # use std::time::Duration;
/// let d = Duration::from_millis(61_250);
/// assert_eq!(ElapsedDisplay(d).to_string(), "1:01.2500000");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ElapsedDisplay(pub Duration);

impl Display for ElapsedDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        // 100ns ticks
        let ticks = self.0.subsec_nanos() / 100;
        let text = format!("{}:{:02}.{ticks:07}", secs / 60, secs % 60);

        // `pad` applies the caller's width and alignment
        f.pad(&text)
    }
}

use anyhow::anyhow;
use std::{error::Error, fmt::Display};

use crate::AnyResult;

/// Converts results and options into [`AnyResult`]s with an attached context message.
///
/// ## Example
/// ```
/// use ecsbind_utils::AnyhowResultExt;
///
/// let missing: Option<u32> = None;
/// let err = missing.otherwise("no such unit").unwrap_err();
/// assert_eq!(err.to_string(), "no such unit");
/// ```
pub trait AnyhowResultExt<T> {
    fn otherwise(self, s: impl Display) -> AnyResult<T>;
}

impl<T, E: Error + Send + Sync + 'static> AnyhowResultExt<T> for Result<T, E> {
    fn otherwise(self, s: impl Display) -> AnyResult<T> {
        self.map_err(|e| anyhow::Error::from(e).context(s.to_string()))
    }
}

impl<T> AnyhowResultExt<T> for Option<T> {
    fn otherwise(self, s: impl Display) -> AnyResult<T> {
        self.ok_or_else(|| anyhow!("{s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::AnyhowResultExt;
    use std::io;

    #[test]
    fn error_keeps_source_under_context() {
        let result: Result<(), io::Error> = Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = result.otherwise("while reading units/gameplay.toml").unwrap_err();

        assert_eq!(err.to_string(), "while reading units/gameplay.toml");
        assert_eq!(err.root_cause().to_string(), "gone");
    }
}

pub mod config;
pub mod error;
pub mod logging;
pub mod status;

pub use config::Config;
pub use error::{ErrorKind, FlipperError, Result};
pub use status::{Severity, StatusMessage};

/// Round to cents the way prices are displayed and persisted.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.346), 12.35);
        assert_eq!(round2(19.999), 20.0);
        assert_eq!(round2(10.0 * 1.2), 12.0);
        assert_eq!(round2(0.0), 0.0);
    }
}

//! Ring configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ring::{IdSpace, DEFAULT_BITS};

/// Default key resolved by a simulation run.
pub const DEFAULT_LOOKUP_KEY: u64 = 200;

/// Settings for building and querying a ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Identifier bits `m`; the ring has `2^m` slots.
    pub bits: u32,
    /// Key whose owner is reported after the ring is sealed.
    pub lookup_key: u64,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            bits: DEFAULT_BITS,
            lookup_key: DEFAULT_LOOKUP_KEY,
        }
    }
}

impl RingConfig {
    /// Checks `bits` and that the lookup key fits the resulting space.
    pub fn validate(&self) -> Result<IdSpace> {
        let space = IdSpace::new(self.bits)?;
        space.check(self.lookup_key)?;
        Ok(space)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_default_config() {
        let config = RingConfig::default();
        assert_eq!(config.bits, 10);
        assert_eq!(config.lookup_key, 200);
        assert_eq!(config.validate().unwrap().size(), 1024);
    }

    #[test]
    fn test_validation() {
        let config = RingConfig {
            bits: 0,
            ..RingConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidBits(0))));

        let config = RingConfig {
            bits: 4,
            lookup_key: 200,
        };
        assert!(matches!(
            config.validate(),
            Err(Error::IdOutOfRange { id: 200, size: 16 })
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RingConfig = serde_json::from_str(r#"{"bits": 6}"#).unwrap();
        assert_eq!(config.bits, 6);
        assert_eq!(config.lookup_key, DEFAULT_LOOKUP_KEY);
    }
}

use serde::{Deserialize, Serialize};
use std::time::{self, Duration, SystemTime, UNIX_EPOCH};

/// seconds since `1970-1-1 00:00:00`, stored on disk as 8 bytes
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

/// calculate what time is it since `1970-1-1 00:00:00`,named as [UNIX_EPOCH]
pub fn now() -> Timestamp {
    let secs = match SystemTime::now().duration_since(time::UNIX_EPOCH) {
        Ok(since_epoch) => since_epoch.as_secs() as i64,
        Err(before_epoch) => -(before_epoch.duration().as_secs() as i64),
    };
    Timestamp(secs)
}

impl From<Timestamp> for SystemTime {
    fn from(value: Timestamp) -> Self {
        let secs = Duration::from_secs(value.0.unsigned_abs());
        if value.0 >= 0 {
            UNIX_EPOCH + secs
        } else {
            UNIX_EPOCH - secs
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_after_epoch() {
        assert!(now() > Timestamp(0));
    }

    #[test]
    fn test_system_time_conversion() {
        let system_time: SystemTime = Timestamp(1_700_000_000).into();
        assert_eq!(
            system_time.duration_since(UNIX_EPOCH).unwrap(),
            Duration::from_secs(1_700_000_000)
        );
        let before: SystemTime = Timestamp(-10).into();
        assert!(before < UNIX_EPOCH);
    }
}

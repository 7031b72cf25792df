use thiserror::Error;

/// Error type for building and analyzing a dive profile series.
#[derive(Error, Debug, Clone, PartialEq, uniffi::Error)]
#[uniffi(flat_error)]
pub enum ProfileError {
    #[error("failed to allocate a series of {points} points")]
    Allocation { points: u64 },

    #[error("sample {sample} uses cylinder {cylinder}, but the dive has {cylinders} cylinders")]
    CylinderOutOfRange {
        sample: u32,
        cylinder: u32,
        cylinders: u32,
    },

    #[error("sample {sample} at {sec}s is earlier than the previous sample at {previous_sec}s")]
    TimeWentBackwards {
        sample: u32,
        sec: i32,
        previous_sec: i32,
    },

    #[error("invalid analysis config: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_error_display() {
        let err = ProfileError::Allocation { points: 12 };
        assert_eq!(err.to_string(), "failed to allocate a series of 12 points");

        let err = ProfileError::CylinderOutOfRange {
            sample: 3,
            cylinder: 2,
            cylinders: 1,
        };
        assert_eq!(
            err.to_string(),
            "sample 3 uses cylinder 2, but the dive has 1 cylinders"
        );

        let err = ProfileError::TimeWentBackwards {
            sample: 4,
            sec: 50,
            previous_sec: 60,
        };
        assert_eq!(
            err.to_string(),
            "sample 4 at 50s is earlier than the previous sample at 60s"
        );

        let err = ProfileError::InvalidConfig("empty window list".to_string());
        assert_eq!(
            err.to_string(),
            "invalid analysis config: empty window list"
        );
    }
}

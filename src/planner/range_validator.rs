//! # Range Validation Module
//!
//! Centralizza la validazione dei range temporali selezionati.
//! Evita duplicazione tra le diverse modalità di export.

use crate::{
    error::{PlanError, PlanResult},
    params::{ClipMetadata, TimeRange},
};
use tracing::debug;

/// Slack on the clip end: probe durations are rounded to milliseconds
const DURATION_TOLERANCE: f64 = 1e-3;

/// Utility per validare i range in modo centralizzato
pub struct RangeValidator;

impl RangeValidator {
    /// Controlla che i range siano ordinati, non sovrapposti e dentro la clip
    pub fn validate(ranges: &[TimeRange], clip: &ClipMetadata) -> PlanResult<()> {
        let mut previous: Option<&TimeRange> = None;

        for range in ranges {
            if !range.start.is_finite() || !range.end.is_finite() {
                return Err(PlanError::InvalidTimeRange(format!("range {} is not finite", range)));
            }
            if range.start < 0.0 {
                return Err(PlanError::InvalidTimeRange(format!("range {} starts before 0", range)));
            }
            if range.end <= range.start {
                return Err(PlanError::InvalidTimeRange(format!("range {} must have end > start", range)));
            }
            if range.end > clip.duration_seconds + DURATION_TOLERANCE {
                return Err(PlanError::InvalidTimeRange(format!(
                    "range {} exceeds clip duration {:.3}s",
                    range, clip.duration_seconds
                )));
            }

            if let Some(prev) = previous {
                if range.start < prev.start {
                    return Err(PlanError::InvalidTimeRange(format!(
                        "range {} is not sorted after {}",
                        range, prev
                    )));
                }
                if range.start < prev.end {
                    return Err(PlanError::InvalidTimeRange(format!(
                        "range {} overlaps {}",
                        range, prev
                    )));
                }
            }
            previous = Some(range);
        }

        debug!("Validated {} range(s) against {:.3}s clip", ranges.len(), clip.duration_seconds);
        Ok(())
    }

    /// Un singolo range che copre tutta la clip
    pub fn full_clip(clip: &ClipMetadata) -> Vec<TimeRange> {
        vec![TimeRange::new(0.0, clip.duration_seconds)]
    }

    pub fn total_duration(ranges: &[TimeRange]) -> f64 {
        ranges.iter().map(TimeRange::duration).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip() -> ClipMetadata {
        ClipMetadata {
            duration_seconds: 60.0,
            native_width: 1280,
            native_height: 720,
            native_fps: 25.0,
        }
    }

    #[test]
    fn test_valid_ranges() {
        let ranges = [TimeRange::new(0.0, 5.0), TimeRange::new(5.0, 10.0), TimeRange::new(30.0, 60.0)];
        assert!(RangeValidator::validate(&ranges, &clip()).is_ok());
        assert!(RangeValidator::validate(&[], &clip()).is_ok());
        assert_eq!(RangeValidator::total_duration(&ranges), 40.0);
    }

    #[test]
    fn test_rejects_overlap() {
        let ranges = [TimeRange::new(0.0, 10.0), TimeRange::new(9.0, 12.0)];
        let err = RangeValidator::validate(&ranges, &clip()).unwrap_err();
        assert!(matches!(err, PlanError::InvalidTimeRange(msg) if msg.contains("overlaps")));
    }

    #[test]
    fn test_rejects_unsorted() {
        let ranges = [TimeRange::new(20.0, 30.0), TimeRange::new(0.0, 10.0)];
        let err = RangeValidator::validate(&ranges, &clip()).unwrap_err();
        assert!(matches!(err, PlanError::InvalidTimeRange(msg) if msg.contains("sorted")));
    }

    #[test]
    fn test_rejects_out_of_bounds() {
        let past_end = [TimeRange::new(50.0, 61.0)];
        assert!(matches!(
            RangeValidator::validate(&past_end, &clip()),
            Err(PlanError::InvalidTimeRange(_))
        ));

        let negative = [TimeRange::new(-1.0, 2.0)];
        assert!(matches!(
            RangeValidator::validate(&negative, &clip()),
            Err(PlanError::InvalidTimeRange(_))
        ));

        let inverted = [TimeRange::new(8.0, 3.0)];
        assert!(matches!(
            RangeValidator::validate(&inverted, &clip()),
            Err(PlanError::InvalidTimeRange(_))
        ));
    }

    #[test]
    fn test_tolerates_rounded_probe_duration() {
        let ranges = [TimeRange::new(0.0, 60.0005)];
        assert!(RangeValidator::validate(&ranges, &clip()).is_ok());
    }

    #[test]
    fn test_full_clip() {
        assert_eq!(RangeValidator::full_clip(&clip()), vec![TimeRange::new(0.0, 60.0)]);
    }
}

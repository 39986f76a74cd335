//! Tolerance-band evaluation for a feature's measurement series.
//!
//! A point is checked one of two ways:
//!
//! - `actual` vs `nominal + tol` when both `actual` and `nominal` are present
//! - `deviation` vs `tol` otherwise
//!
//! If a point carries both forms and they disagree, the `actual`/`nominal`
//! comparison wins. A point with neither contributes nothing.

use crate::domain::MeasurementPoint;

/// Which side of the band was crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreachKind {
    AboveUpper,
    BelowLower,
}

/// Which values the breach was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Basis {
    ActualVsNominal,
    Deviation,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breach {
    pub kind: BreachKind,
    pub basis: Basis,
    /// The measured quantity (`actual` or `deviation`).
    pub value: f64,
    /// The limit it crossed, in the same units as `value`.
    pub limit: f64,
}

/// Returns `true` on the first point that breaches its band.
///
/// Empty input is never out of tolerance.
pub fn is_out_of_tolerance(points: &[MeasurementPoint]) -> bool {
    points.iter().any(|p| point_breach(p).is_some())
}

/// Check a single point. Upper is tested before lower.
pub fn point_breach(point: &MeasurementPoint) -> Option<Breach> {
    let upper = point.upper_tol;
    let lower = point.lower_tol;

    let (value, offset, basis) = match (point.nominal, point.actual) {
        (Some(nominal), Some(actual)) => (actual, nominal, Basis::ActualVsNominal),
        _ => (point.deviation?, 0.0, Basis::Deviation),
    };

    if let Some(tol) = upper {
        let limit = offset + tol;
        if value > limit {
            return Some(Breach { kind: BreachKind::AboveUpper, basis, value, limit });
        }
    }
    if let Some(tol) = lower {
        let limit = offset + tol;
        if value < limit {
            return Some(Breach { kind: BreachKind::BelowLower, basis, value, limit });
        }
    }
    None
}

/// Tolerance offsets shared by a series.
///
/// Points in one feature are expected to carry the same pair, but the backend
/// does not guarantee it, so each bound is the first numeric value found.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ToleranceBand {
    pub upper: Option<f64>,
    pub lower: Option<f64>,
}

impl ToleranceBand {
    pub fn from_points(points: &[MeasurementPoint]) -> Self {
        Self {
            upper: points.iter().find_map(|p| p.upper_tol),
            lower: points.iter().find_map(|p| p.lower_tol),
        }
    }

    /// Present bounds, upper first.
    pub fn bounds(&self) -> impl Iterator<Item = f64> {
        self.upper.into_iter().chain(self.lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actual_point(nominal: f64, actual: f64, upper: Option<f64>, lower: Option<f64>) -> MeasurementPoint {
        MeasurementPoint {
            nominal: Some(nominal),
            actual: Some(actual),
            upper_tol: upper,
            lower_tol: lower,
            ..MeasurementPoint::default()
        }
    }

    #[test]
    fn empty_series_is_in_tolerance() {
        assert!(!is_out_of_tolerance(&[]));
    }

    #[test]
    fn actual_above_nominal_plus_upper() {
        assert!(is_out_of_tolerance(&[actual_point(10.0, 13.0, Some(2.0), None)]));
        assert!(!is_out_of_tolerance(&[actual_point(10.0, 13.0, Some(5.0), None)]));
    }

    #[test]
    fn actual_below_nominal_plus_lower() {
        let b = point_breach(&actual_point(10.0, 9.0, None, Some(-0.5))).unwrap();
        assert_eq!(b.kind, BreachKind::BelowLower);
        assert_eq!(b.basis, Basis::ActualVsNominal);
        assert!((b.limit - 9.5).abs() < 1e-12);
    }

    #[test]
    fn deviation_only_below_lower() {
        let pt = MeasurementPoint {
            deviation: Some(-6.0),
            lower_tol: Some(-5.0),
            ..MeasurementPoint::default()
        };
        assert!(is_out_of_tolerance(&[pt]));
    }

    #[test]
    fn boundary_values_are_inside() {
        assert!(!is_out_of_tolerance(&[actual_point(10.0, 12.0, Some(2.0), Some(-2.0))]));
        let pt = MeasurementPoint {
            deviation: Some(0.05),
            upper_tol: Some(0.05),
            ..MeasurementPoint::default()
        };
        assert!(!is_out_of_tolerance(&[pt]));
    }

    #[test]
    fn actual_nominal_wins_over_disagreeing_deviation() {
        let pt = MeasurementPoint {
            nominal: Some(10.0),
            actual: Some(10.1),
            deviation: Some(9.0),
            upper_tol: Some(0.5),
            ..MeasurementPoint::default()
        };
        assert!(point_breach(&pt).is_none());
    }

    #[test]
    fn half_pair_falls_back_to_deviation() {
        let pt = MeasurementPoint {
            nominal: Some(10.0),
            deviation: Some(1.0),
            upper_tol: Some(0.5),
            ..MeasurementPoint::default()
        };
        let b = point_breach(&pt).unwrap();
        assert_eq!(b.basis, Basis::Deviation);
    }

    #[test]
    fn point_without_values_never_breaches() {
        let pt = MeasurementPoint {
            upper_tol: Some(-1.0),
            lower_tol: Some(1.0),
            ..MeasurementPoint::default()
        };
        assert!(point_breach(&pt).is_none());
    }

    #[test]
    fn band_takes_first_numeric_bound_independently() {
        let points = vec![
            MeasurementPoint { lower_tol: Some(-0.2), ..MeasurementPoint::default() },
            MeasurementPoint { upper_tol: Some(0.3), lower_tol: Some(-0.9), ..MeasurementPoint::default() },
        ];
        let band = ToleranceBand::from_points(&points);
        assert_eq!(band.upper, Some(0.3));
        assert_eq!(band.lower, Some(-0.2));
        assert_eq!(band.bounds().collect::<Vec<_>>(), vec![0.3, -0.2]);
    }
}

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Which of the two mark components of a unit a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkComponent {
    Mst,
    Assignment,
}

impl Display for MarkComponent {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Mst => write!(f, "MST marks"),
            Self::Assignment => write!(f, "assignment marks"),
        }
    }
}

/// A mark value that cannot be stored against a unit
#[derive(Debug, Clone, PartialEq)]
pub enum MarkError {
    NotANumber(MarkComponent),
    Negative(MarkComponent, f64),
    AboveMaximum {
        component: MarkComponent,
        value: f64,
        max: f64,
    },
}

impl Display for MarkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::NotANumber(component) => write!(f, "{component} must be a number"),
            Self::Negative(component, value) => {
                write!(f, "{component} cannot be negative (got {value})")
            }
            Self::AboveMaximum {
                component,
                value,
                max,
            } => write!(f, "{component} {value} exceeds maximum of {max}"),
        }
    }
}

impl std::error::Error for MarkError {}

/// The mark ceilings of one unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitLimits {
    pub max_mst_marks: f64,
    pub max_assignment_marks: f64,
}

impl UnitLimits {
    pub fn new(max_mst_marks: f64, max_assignment_marks: f64) -> Self {
        Self {
            max_mst_marks,
            max_assignment_marks,
        }
    }

    /// Checks the supplied components; absent components are not checked
    pub fn check(&self, mst: Option<f64>, assignment: Option<f64>) -> Result<(), MarkError> {
        if let Some(value) = mst {
            check_one(MarkComponent::Mst, value, self.max_mst_marks)?;
        }
        if let Some(value) = assignment {
            check_one(MarkComponent::Assignment, value, self.max_assignment_marks)?;
        }
        Ok(())
    }
}

fn check_one(component: MarkComponent, value: f64, max: f64) -> Result<(), MarkError> {
    if !value.is_finite() {
        return Err(MarkError::NotANumber(component));
    }
    if value < 0.0 {
        return Err(MarkError::Negative(component, value));
    }
    if value > max {
        return Err(MarkError::AboveMaximum {
            component,
            value,
            max,
        });
    }
    Ok(())
}

/// Percentage of `obtained` over `max`, or `None` when nothing is attainable
pub fn percentage(obtained: f64, max: f64) -> Option<f64> {
    (max > 0.0).then(|| obtained / max * 100.0)
}

/// Rounds to one decimal place for display
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_accepts_values_within_limits() {
        let limits = UnitLimits::new(20.0, 10.0);
        assert!(limits.check(Some(20.0), Some(0.0)).is_ok());
        assert!(limits.check(Some(12.5), None).is_ok());
        assert!(limits.check(None, None).is_ok());
    }

    #[test]
    fn test_check_rejects_out_of_range() {
        let limits = UnitLimits::new(20.0, 10.0);

        assert_eq!(
            limits.check(Some(21.0), None),
            Err(MarkError::AboveMaximum {
                component: MarkComponent::Mst,
                value: 21.0,
                max: 20.0
            })
        );
        assert_eq!(
            limits.check(None, Some(-1.0)),
            Err(MarkError::Negative(MarkComponent::Assignment, -1.0))
        );
        assert_eq!(
            limits.check(Some(f64::NAN), None),
            Err(MarkError::NotANumber(MarkComponent::Mst))
        );
    }

    #[test]
    fn test_error_messages() {
        let err = UnitLimits::new(20.0, 10.0)
            .check(None, Some(11.0))
            .unwrap_err();
        assert_eq!(err.to_string(), "assignment marks 11 exceeds maximum of 10");
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(15.0, 30.0), Some(50.0));
        assert_eq!(percentage(5.0, 0.0), None);
        assert_eq!(round1(66.666), 66.7);
    }
}

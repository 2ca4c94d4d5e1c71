//! Total score to letter grade mapping.

use transcript_state::Grade;

/// Inclusive lower bounds, evaluated highest first.
const THRESHOLDS: [(f64, Grade); 7] = [
    (90.0, Grade::O),
    (80.0, Grade::APlus),
    (70.0, Grade::A),
    (60.0, Grade::BPlus),
    (50.0, Grade::B),
    (40.0, Grade::C),
    (35.0, Grade::P),
];

/// Map a total score to its grade. Anything below the lowest threshold,
/// including negative or non-finite input, is an `F`.
pub fn grade_of(total: f64) -> Grade {
    THRESHOLDS
        .iter()
        .find(|(min, _)| total >= *min)
        .map(|(_, grade)| *grade)
        .unwrap_or(Grade::F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_map_exactly() {
        let cases = [
            (34.0, Grade::F),
            (35.0, Grade::P),
            (39.0, Grade::P),
            (40.0, Grade::C),
            (49.0, Grade::C),
            (50.0, Grade::B),
            (59.0, Grade::B),
            (60.0, Grade::BPlus),
            (69.0, Grade::BPlus),
            (70.0, Grade::A),
            (79.0, Grade::A),
            (80.0, Grade::APlus),
            (89.0, Grade::APlus),
            (90.0, Grade::O),
        ];
        for (total, expected) in cases {
            assert_eq!(grade_of(total), expected, "total {}", total);
        }
    }

    #[test]
    fn point_is_non_increasing_as_total_drops() {
        let mut previous = grade_of(100.0).point();
        for total in (0..=100).rev() {
            let point = grade_of(f64::from(total)).point();
            assert!(point <= previous, "point rose at total {}", total);
            previous = point;
        }
    }

    #[test]
    fn out_of_range_totals() {
        assert_eq!(grade_of(-5.0), Grade::F);
        assert_eq!(grade_of(f64::NAN), Grade::F);
        assert_eq!(grade_of(140.0), Grade::O);
        assert_eq!(grade_of(34.99), Grade::F);
    }
}

// src/progress.rs
//
// Derived-value helpers shared by the progress endpoints and the
// platform statistics scan. Both zero-guards go through `safe_ratio`
// so the degenerate cases stay consistent across call sites.

/// `numerator / denominator`, or `0.0` when the denominator is zero or
/// negative. The zero case is policy (empty course, no quizzes taken),
/// not error suppression.
pub fn safe_ratio(numerator: i64, denominator: i64) -> f64 {
    if denominator <= 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

/// Completion percentage for one enrollment, rounded to the nearest
/// integer. A course with zero modules yields 0% rather than an error:
/// the denominator is floored to 1.
pub fn completion_percent(completed_modules: i64, module_count: i64) -> i64 {
    (100.0 * safe_ratio(completed_modules, module_count.max(1))).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_ratio_guards_zero_denominator() {
        assert_eq!(safe_ratio(5, 0), 0.0);
        assert_eq!(safe_ratio(0, 0), 0.0);
    }

    #[test]
    fn safe_ratio_divides_normally() {
        assert_eq!(safe_ratio(3, 4), 0.75);
    }

    #[test]
    fn completion_is_zero_for_empty_course() {
        assert_eq!(completion_percent(0, 0), 0);
    }

    #[test]
    fn completion_hits_bounds() {
        assert_eq!(completion_percent(0, 4), 0);
        assert_eq!(completion_percent(4, 4), 100);
    }

    #[test]
    fn completion_rounds_to_nearest_integer() {
        assert_eq!(completion_percent(1, 4), 25);
        assert_eq!(completion_percent(1, 3), 33);
        assert_eq!(completion_percent(2, 3), 67);
    }
}

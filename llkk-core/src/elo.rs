//! Elo rating update with the logistic (base-10, 400-point) expectation.

/// Expected score of A against B.
pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((rating_b - rating_a) / 400.0))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EloUpdater {
    k_factor: f64,
}

impl EloUpdater {
    pub fn new(k_factor: f64) -> Self {
        Self { k_factor }
    }

    pub fn k_factor(&self) -> f64 {
        self.k_factor
    }

    /// New ratings for A and B after one match.
    ///
    /// `outcome_a` is 1 (A wins), 0.5 (draw) or 0 (B wins); B's outcome is the
    /// complement. Both expectations are computed from the same rating pair, so
    /// the two deltas cancel up to float rounding.
    pub fn update(&self, rating_a: f64, rating_b: f64, outcome_a: f64) -> (f64, f64) {
        let expected_a = expected_score(rating_a, rating_b);
        let expected_b = expected_score(rating_b, rating_a);
        let outcome_b = 1.0 - outcome_a;
        (
            rating_a + self.k_factor * (outcome_a - expected_a),
            rating_b + self.k_factor * (outcome_b - expected_b),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_ratings_expect_half() {
        assert_eq!(expected_score(1500.0, 1500.0), 0.5);
    }

    #[test]
    fn worked_example_win_at_equal_ratings() {
        let (a, b) = EloUpdater::new(16.0).update(1500.0, 1500.0, 1.0);
        assert_eq!(a, 1508.0);
        assert_eq!(b, 1492.0);
    }

    #[test]
    fn draw_between_equals_changes_nothing() {
        let (a, b) = EloUpdater::new(16.0).update(1500.0, 1500.0, 0.5);
        assert_eq!((a, b), (1500.0, 1500.0));
    }

    #[test]
    fn underdog_win_moves_more_than_favourite_win() {
        let elo = EloUpdater::new(16.0);
        let (underdog, _) = elo.update(1400.0, 1600.0, 1.0);
        let (favourite, _) = elo.update(1600.0, 1400.0, 1.0);
        assert!(underdog - 1400.0 > favourite - 1600.0);
    }

    #[test]
    fn four_hundred_points_is_ten_to_one() {
        let e = expected_score(1900.0, 1500.0);
        assert!((e - 10.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn deltas_cancel() {
        let (a, b) = EloUpdater::new(24.0).update(1432.5, 1611.25, 0.0);
        assert!(((a - 1432.5) + (b - 1611.25)).abs() < 1e-9);
    }
}

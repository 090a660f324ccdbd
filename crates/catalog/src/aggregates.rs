//! Values a bootcamp derives from its courses and reviews.

/// Mean course tuition rounded up to the next multiple of 10, or `None` when
/// there are no courses.
pub fn average_cost(tuitions: &[f64]) -> Option<f64> {
    mean(tuitions).map(|m| (m / 10.0).ceil() * 10.0)
}

/// Mean review rating, unrounded, or `None` when there are no reviews.
pub fn average_rating(ratings: &[f64]) -> Option<f64> {
    mean(ratings)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_rounds_up_to_tens() {
        assert_eq!(average_cost(&[10000.0, 12001.0]), Some(11010.0));
        assert_eq!(average_cost(&[8000.0]), Some(8000.0));
        assert_eq!(average_cost(&[1.0]), Some(10.0));
        assert_eq!(average_cost(&[]), None);
    }

    #[test]
    fn rating_is_plain_mean() {
        assert_eq!(average_rating(&[8.0, 9.0]), Some(8.5));
        assert_eq!(average_rating(&[]), None);
    }
}

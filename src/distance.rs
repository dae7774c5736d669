pub fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    let mut sum = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        sum += (x - y).powi(2);
    }
    sum
}

// Returns `None` as soon as the partial sum exceeds `bound`.
pub fn squared_euclidean_within(a: &[f64], b: &[f64], bound: f64) -> Option<f64> {
    let mut sum = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        sum += (x - y).powi(2);
        if sum > bound {
            return None;
        }
    }
    Some(sum)
}

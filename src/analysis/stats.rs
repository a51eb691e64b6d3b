/// Population standard deviation, `None` for an empty sample
pub fn population_std<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let values: Vec<f64> = values.into_iter().collect();
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt())
}

/// Spread of the nonzero thickness samples; 0 when fewer than two exist
pub fn nonzero_std(thickness: &[u32]) -> f64 {
    let nonzero: Vec<f64> = thickness
        .iter()
        .filter(|t| **t > 0)
        .map(|t| *t as f64)
        .collect();
    if nonzero.len() < 2 {
        return 0.0;
    }
    population_std(nonzero).unwrap_or(0.0)
}

pub fn count_zeros(thickness: &[u32]) -> usize {
    thickness.iter().filter(|t| **t == 0).count()
}

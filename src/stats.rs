//! Descriptive statistics over plain `f64` slices.
//!
//! Undefined results (too few observations, zero spread) are `None` rather
//! than NaN so they serialize as null.

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::models::Regression;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Standard deviation with an `n - 1` denominator.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq: f64 = values.iter().map(|value| (value - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().min_by(|a, b| a.total_cmp(b))
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().max_by(|a, b| a.total_cmp(b))
}

/// Standard scores using the sample standard deviation.
///
/// Every entry is `None` when the group has fewer than two values or no spread.
pub fn z_scores(values: &[f64]) -> Vec<Option<f64>> {
    let spread = match (mean(values), sample_std(values)) {
        (Some(mean), Some(std)) if std > 0.0 => Some((mean, std)),
        _ => None,
    };
    values
        .iter()
        .map(|value| spread.map(|(mean, std)| (value - mean) / std))
        .collect()
}

fn all_finite(xs: &[f64], ys: &[f64]) -> bool {
    xs.iter().chain(ys).all(|value| value.is_finite())
}

/// Pearson correlation coefficient of two equally long samples.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 || !all_finite(xs, ys) {
        return None;
    }
    let mean_x = mean(xs)?;
    let mean_y = mean(ys)?;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Ordinary least squares fit of `ys` on `xs`.
///
/// The p-value is two-sided for a zero slope under Student's t with `n - 2`
/// degrees of freedom. Returns `None` for fewer than two points or when every
/// `x` is identical.
pub fn linear_regression(xs: &[f64], ys: &[f64]) -> Option<Regression> {
    const TINY: f64 = 1.0e-20;

    let n = xs.len();
    if n != ys.len() || n < 2 || !all_finite(xs, ys) {
        return None;
    }
    let mean_x = mean(xs)?;
    let mean_y = mean(ys)?;
    let mut ssxm = 0.0;
    let mut ssym = 0.0;
    let mut ssxym = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        ssxm += (x - mean_x).powi(2);
        ssym += (y - mean_y).powi(2);
        ssxym += (x - mean_x) * (y - mean_y);
    }
    if ssxm == 0.0 {
        return None;
    }

    let r_value = if ssym == 0.0 {
        0.0
    } else {
        (ssxym / (ssxm * ssym).sqrt()).clamp(-1.0, 1.0)
    };
    if !r_value.is_finite() {
        return None;
    }
    let slope = ssxym / ssxm;
    let intercept = mean_y - slope * mean_x;

    let (p_value, std_err) = if n == 2 {
        (if ssym == 0.0 { 1.0 } else { 0.0 }, 0.0)
    } else {
        let df = (n - 2) as f64;
        let t = r_value * (df / ((1.0 - r_value + TINY) * (1.0 + r_value + TINY))).sqrt();
        let p_value = StudentsT::new(0.0, 1.0, df)
            .ok()
            .map(|dist| 2.0 * (1.0 - dist.cdf(t.abs())))?;
        let std_err = ((1.0 - r_value * r_value) * ssym / ssxm / df).max(0.0).sqrt();
        (p_value.clamp(0.0, 1.0), std_err)
    };

    Some(Regression {
        slope,
        intercept,
        r_value,
        p_value,
        std_err,
    })
}

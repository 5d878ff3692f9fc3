use statrs::distribution::{ContinuousCDF, StudentsT};

use super::{mean, Correlation};

/// Pearson correlation between paired samples, with a two-sided p-value.
///
/// Returns `None` when there are fewer than two pairs, the slices differ in
/// length, or either sample has zero variance (the coefficient is undefined).
pub fn pearson(x: &[f64], y: &[f64]) -> Option<Correlation> {
    let n = x.len();
    if n < 2 || n != y.len() {
        return None;
    }

    let mean_x = mean(x);
    let mean_y = mean(y);

    let (sxy, sxx, syy) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0, 0.0), |(sxy, sxx, syy), (xi, yi)| {
            let dx = xi - mean_x;
            let dy = yi - mean_y;
            (sxy + dx * dy, sxx + dx * dx, syy + dy * dy)
        });

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }

    let r = snap_to_unit(sxy / (sxx * syy).sqrt());

    Some(Correlation {
        coefficient: r,
        p_value: p_value(r, n),
    })
}

/// Clamp r into [-1, 1], treating values within a few ulps of +-1 as exact.
fn snap_to_unit(r: f64) -> f64 {
    if 1.0 - r.abs() <= f64::EPSILON * 4.0 {
        r.signum()
    } else {
        r.clamp(-1.0, 1.0)
    }
}

/// Two-sided p-value for r under the null of no correlation.
///
/// t = r * sqrt((n - 2) / (1 - r^2)) follows Student's t with n - 2 degrees of freedom.
fn p_value(r: f64, n: usize) -> f64 {
    // Two points always lie on a line.
    if n == 2 {
        return 1.0;
    }
    if r.abs() >= 1.0 {
        return 0.0;
    }

    let df = (n - 2) as f64;
    let t_statistic = r * (df / (1.0 - r * r)).sqrt();

    match StudentsT::new(0.0, 1.0, df) {
        Ok(t_dist) => (2.0 * t_dist.sf(t_statistic.abs())).min(1.0),
        Err(_) => 1.0,
    }
}

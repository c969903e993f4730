//! Summary statistics and the two-sided Mann-Whitney U test.

use serde::Serialize;

/// Returned by [`z_score`] when the ensemble spread is zero or undefined.
pub const UNDEFINED_Z_SCORE: f64 = -1.0;

/// The normal approximation is used only when both samples exceed this size.
const EXACT_LIMIT: usize = 8;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Standard deviation with Bessel's correction; needs at least two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let squares: f64 = values.iter().map(|value| (value - mean).powi(2)).sum();
    Some((squares / (values.len() - 1) as f64).sqrt())
}

/// `(original - mean) / sample_std` of the ensemble values.
pub fn z_score(original: f64, ensemble: &[f64]) -> f64 {
    match (mean(ensemble), sample_std(ensemble)) {
        (Some(mean), Some(std)) if std > 0.0 => (original - mean) / std,
        _ => UNDEFINED_Z_SCORE,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMethod {
    Exact,
    Asymptotic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MannWhitney {
    /// U statistic of the first sample.
    pub statistic: f64,
    pub p_value: f64,
    pub method: TestMethod,
}

/// Two-sided Mann-Whitney U test.
///
/// Uses the exact null distribution when there are no ties and at least one
/// sample holds at most eight values, otherwise the normal approximation with
/// tie and continuity correction. Returns `None` when either sample is empty.
pub fn mann_whitney_u(x: &[f64], y: &[f64]) -> Option<MannWhitney> {
    let (n1, n2) = (x.len(), y.len());
    if n1 == 0 || n2 == 0 {
        return None;
    }
    let (ranks, tie_sizes) = average_ranks(x.iter().chain(y.iter()).copied());
    let rank_sum_x: f64 = ranks[..n1].iter().sum();
    let u1 = rank_sum_x - (n1 * (n1 + 1)) as f64 / 2.0;
    let u2 = (n1 * n2) as f64 - u1;
    let u = u1.max(u2);
    let has_ties = tie_sizes.iter().any(|&t| t > 1);

    let both_large = n1 > EXACT_LIMIT && n2 > EXACT_LIMIT;
    if !both_large && !has_ties {
        let p_value = (2.0 * exact_upper_tail(n1, n2, u.round() as usize)).min(1.0);
        return Some(MannWhitney {
            statistic: u1,
            p_value,
            method: TestMethod::Exact,
        });
    }

    let n = (n1 + n2) as f64;
    let tie_term: f64 = tie_sizes
        .iter()
        .map(|&t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum();
    let variance = (n1 * n2) as f64 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
    let p_value = if variance <= 0.0 {
        1.0
    } else {
        let z = (u - (n1 * n2) as f64 / 2.0 - 0.5) / variance.sqrt();
        (2.0 * normal_sf(z)).min(1.0)
    };
    Some(MannWhitney {
        statistic: u1,
        p_value,
        method: TestMethod::Asymptotic,
    })
}

/// 1-based average ranks in input order, plus the size of every tie group.
fn average_ranks(values: impl Iterator<Item = f64>) -> (Vec<f64>, Vec<usize>) {
    let mut indexed: Vec<(usize, f64)> = values.enumerate().collect();
    indexed.sort_by(|a, b| a.1.total_cmp(&b.1));
    let mut ranks = vec![0.0; indexed.len()];
    let mut tie_sizes = Vec::new();
    let mut start = 0;
    while start < indexed.len() {
        let mut end = start + 1;
        while end < indexed.len() && indexed[end].1 == indexed[start].1 {
            end += 1;
        }
        let rank = (start + end + 1) as f64 / 2.0;
        for &(idx, _) in &indexed[start..end] {
            ranks[idx] = rank;
        }
        tie_sizes.push(end - start);
        start = end;
    }
    (ranks, tie_sizes)
}

/// P(U >= u) under the null hypothesis for sample sizes `n1`, `n2`.
///
/// The orderings counted by U are the coefficients of the Gaussian binomial
/// `[n1 + n2 choose m]_q` with `m = min(n1, n2)`, built one factor
/// `(1 - q^(n + i)) / (1 - q^i)` at a time in O(m * n1 * n2).
fn exact_upper_tail(n1: usize, n2: usize, u: usize) -> f64 {
    let (m, n) = if n1 <= n2 { (n1, n2) } else { (n2, n1) };
    let max_u = m * n;
    if u > max_u {
        return 0.0;
    }
    let mut counts = vec![0.0f64; max_u + 1];
    counts[0] = 1.0;
    for i in 1..=m {
        let shift = n + i;
        for s in (shift..=max_u).rev() {
            counts[s] -= counts[s - shift];
        }
        for s in i..=max_u {
            counts[s] += counts[s - i];
        }
    }
    let total: f64 = counts.iter().sum();
    (counts[u..].iter().sum::<f64>() / total).clamp(0.0, 1.0)
}

/// Survival function of the standard normal distribution.
pub fn normal_sf(z: f64) -> f64 {
    0.5 * erfc(z / std::f64::consts::SQRT_2)
}

/// Complementary error function, Chebyshev fit with fractional error below 1.2e-7.
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87
                                    + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let ans = t * poly.exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn z_score_fixtures() {
        assert_eq!(z_score(10.0, &[5.0, 5.0, 5.0, 5.0]), UNDEFINED_Z_SCORE);
        let ensemble = [2.0, 4.0, 6.0, 8.0];
        let std = sample_std(&ensemble).expect("four values");
        assert!(close(z_score(10.0, &ensemble), 5.0 / std, 1e-12));
        assert_eq!(z_score(3.0, &[1.0]), UNDEFINED_Z_SCORE);
        assert_eq!(z_score(3.0, &[]), UNDEFINED_Z_SCORE);
    }

    #[test]
    fn sample_std_uses_bessel_correction() {
        let std = sample_std(&[2.0, 4.0, 6.0, 8.0]).expect("std");
        assert!(close(std, (20.0f64 / 3.0).sqrt(), 1e-12));
        assert!(sample_std(&[1.0]).is_none());
    }

    #[test]
    fn erfc_matches_reference_values() {
        assert!(close(erfc(0.0), 1.0, 1e-7));
        assert!(close(erfc(1.0), 0.157_299_207, 1e-6));
        assert!(close(erfc(-1.0), 1.842_700_793, 1e-6));
        assert!(close(normal_sf(1.959_963_985), 0.025, 1e-6));
    }

    #[test]
    fn exact_test_on_separated_samples() {
        let result = mann_whitney_u(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).expect("testable");
        assert_eq!(result.method, TestMethod::Exact);
        assert_eq!(result.statistic, 0.0);
        assert!(close(result.p_value, 0.1, 1e-12));
    }

    #[test]
    fn exact_test_is_symmetric_and_capped() {
        let result = mann_whitney_u(&[1.0, 4.0], &[2.0, 3.0]).expect("testable");
        assert_eq!(result.statistic, 2.0);
        assert!(close(result.p_value, 1.0, 1e-12));
    }

    #[test]
    fn exact_test_when_only_one_sample_is_small() {
        let y: Vec<f64> = (4..24).map(f64::from).collect();
        let result = mann_whitney_u(&[1.0, 2.0, 3.0], &y).expect("testable");
        assert_eq!(result.method, TestMethod::Exact);
        assert_eq!(result.statistic, 0.0);
        // One of C(23, 3) orderings per tail.
        assert!(close(result.p_value, 2.0 / 1771.0, 1e-12), "{}", result.p_value);

        let swapped = mann_whitney_u(&y, &[1.0, 2.0, 3.0]).expect("testable");
        assert_eq!(swapped.method, TestMethod::Exact);
        assert!(close(swapped.p_value, result.p_value, 1e-12));
    }

    #[test]
    fn exact_tail_counts_match_small_tables() {
        // U over 2 x 2 orderings: 0, 1, 2, 2, 3, 4.
        assert!(close(exact_upper_tail(2, 2, 3), 2.0 / 6.0, 1e-12));
        assert!(close(exact_upper_tail(2, 2, 2), 4.0 / 6.0, 1e-12));
        assert!(close(exact_upper_tail(3, 2, 0), 1.0, 1e-12));
        assert_eq!(exact_upper_tail(2, 3, 7), 0.0);
    }

    #[test]
    fn asymptotic_test_on_large_samples() {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let y: Vec<f64> = (10..20).map(f64::from).collect();
        let result = mann_whitney_u(&x, &y).expect("testable");
        assert_eq!(result.method, TestMethod::Asymptotic);
        assert!(close(result.p_value, 1.8267e-4, 2e-6), "{}", result.p_value);
    }

    #[test]
    fn ties_force_the_normal_approximation() {
        let result = mann_whitney_u(&[1.0, 2.0, 2.0], &[2.0, 3.0, 4.0]).expect("testable");
        assert_eq!(result.method, TestMethod::Asymptotic);
        assert!(result.p_value > 0.05 && result.p_value <= 1.0);
    }

    #[test]
    fn degenerate_samples() {
        let tied = mann_whitney_u(&[1.0, 1.0, 1.0], &[1.0, 1.0]).expect("testable");
        assert_eq!(tied.p_value, 1.0);
        assert!(mann_whitney_u(&[], &[1.0]).is_none());
        assert!(mann_whitney_u(&[1.0], &[]).is_none());
    }
}

//! Pure rule helpers shared by every subsystem.
//!
//! None of these functions keep state between calls. Composite scores are
//! meant to be recomputed fresh from their inputs every tick, never
//! accumulated.

use indexmap::IndexMap;

/// Move `current` a fraction `rate` of the way towards `target`.
///
/// `rate` is clamped to `[0, 1]` (a non-finite rate means no movement). The
/// result never passes `target`.
#[must_use]
pub fn smooth_toward(current: f64, target: f64, rate: f64) -> f64 {
    let rate = if rate.is_finite() { rate.clamp(0.0, 1.0) } else { 0.0 };
    let next = current + (target - current) * rate;
    if current <= target {
        next.min(target)
    } else {
        next.max(target)
    }
}

/// Clamp to `[0, 1]`, mapping non-finite values to `0`.
#[must_use]
pub fn clamp_unit(value: f64) -> f64 {
    clamp_to(value, 0.0, 1.0)
}

/// Clamp to `[min, max]`, mapping non-finite values to `min`.
#[must_use]
pub fn clamp_to(value: f64, min: f64, max: f64) -> f64 {
    if value.is_finite() { value.clamp(min, max) } else { min }
}

/// Returns `value` when finite, otherwise `fallback`.
#[must_use]
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

/// Weighted average of `(value, weight)` pairs.
///
/// Pairs with a non-finite value or a non-positive weight are ignored. With
/// no usable weight the result is `0.0`.
#[must_use]
pub fn composite(terms: &[(f64, f64)]) -> f64 {
    let (sum, weight) = terms
        .iter()
        .filter(|(v, w)| v.is_finite() && w.is_finite() && *w > 0.0)
        .fold((0.0, 0.0), |(s, tw), (v, w)| (s + v * w, tw + w));
    if weight > 0.0 { sum / weight } else { 0.0 }
}

/// Arithmetic mean of the finite values, `0.0` when there are none.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        0.0
    } else {
        finite.iter().sum::<f64>() / finite.len() as f64
    }
}

/// Normalise proportions to non-negative weights summing to one.
///
/// Negative and non-finite proportions count as zero. When nothing is left
/// every key receives an equal share.
fn normalise(proportions: &IndexMap<String, f64>) -> IndexMap<String, f64> {
    let cleaned: IndexMap<String, f64> = proportions
        .iter()
        .map(|(k, p)| (k.clone(), if p.is_finite() && *p > 0.0 { *p } else { 0.0 }))
        .collect();
    let sum: f64 = cleaned.values().sum();
    if sum > 0.0 {
        cleaned.into_iter().map(|(k, p)| (k, p / sum)).collect()
    } else {
        let equal = 1.0 / cleaned.len().max(1) as f64;
        cleaned.into_keys().map(|k| (k, equal)).collect()
    }
}

/// Redistribute a continuous `total` across keys by `proportions`.
///
/// The shares are never negative and sum to `total` (a negative or
/// non-finite total is treated as zero). An empty proportion map yields an
/// empty result.
#[must_use]
pub fn reallocate(total: f64, proportions: &IndexMap<String, f64>) -> IndexMap<String, f64> {
    let total = if total.is_finite() { total.max(0.0) } else { 0.0 };
    let weights = normalise(proportions);
    let mut shares: IndexMap<String, f64> = weights.iter().map(|(k, w)| (k.clone(), total * w)).collect();

    // Fold the rounding residue into the last share so the sum is exact.
    if let Some((_, last)) = shares.last() {
        let others: f64 = shares.values().sum::<f64>() - last;
        let fixed = (total - others).max(0.0);
        if let Some((_, slot)) = shares.last_mut() {
            *slot = fixed;
        }
    }
    shares
}

/// Redistribute a whole-unit `total` (personnel, vessels, ...) by
/// `proportions` using the largest-remainder method.
///
/// The shares sum to exactly `total`. Ties in the remainder go to the
/// earlier key.
#[must_use]
pub fn reallocate_units(total: u64, proportions: &IndexMap<String, f64>) -> IndexMap<String, u64> {
    let weights = normalise(proportions);
    let quotas: Vec<(String, f64)> = weights.into_iter().map(|(k, w)| (k, total as f64 * w)).collect();

    let mut shares: IndexMap<String, u64> = quotas.iter().map(|(k, q)| (k.clone(), q.floor() as u64)).collect();
    let assigned: u64 = shares.values().sum();
    let mut remaining = total.saturating_sub(assigned);

    let mut by_remainder: Vec<(usize, f64)> = quotas
        .iter()
        .enumerate()
        .map(|(i, (_, q))| (i, q - q.floor()))
        .collect();
    by_remainder.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    for (idx, _) in by_remainder.into_iter().cycle() {
        if remaining == 0 || shares.is_empty() {
            break;
        }
        if let Some((_, share)) = shares.get_index_mut(idx) {
            *share += 1;
            remaining -= 1;
        }
    }
    shares
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(entries: &[(&str, f64)]) -> IndexMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_smoothing_increases_without_overshoot() {
        let target = 0.95;
        let mut value = 0.7;
        for _ in 0..200 {
            let next = smooth_toward(value, target, 0.1);
            assert!(next <= target);
            assert!(next >= value);
            value = next;
        }
        assert!((value - target).abs() < 1e-6);
    }

    #[test]
    fn test_smoothing_strictly_increases_early() {
        let mut value = 0.2;
        for _ in 0..20 {
            let next = smooth_toward(value, 0.9, 0.25);
            assert!(next > value);
            value = next;
        }
    }

    #[test]
    fn test_smoothing_rate_is_clamped() {
        assert_eq!(smooth_toward(0.2, 0.8, 3.0), 0.8);
        assert_eq!(smooth_toward(0.2, 0.8, -1.0), 0.2);
        assert_eq!(smooth_toward(0.2, 0.8, f64::NAN), 0.2);
        assert_eq!(smooth_toward(0.8, 0.2, 1.0), 0.2);
    }

    #[test]
    fn test_composite_ignores_unusable_terms() {
        assert!((composite(&[(1.0, 1.0), (0.0, 1.0)]) - 0.5).abs() < 1e-12);
        assert!((composite(&[(0.8, 3.0), (f64::NAN, 1.0), (0.2, 0.0)]) - 0.8).abs() < 1e-12);
        assert_eq!(composite(&[]), 0.0);
    }

    #[test]
    fn test_mean() {
        assert!((mean(&[0.2, 0.4, f64::INFINITY]) - 0.3).abs() < 1e-12);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_reallocate_preserves_total() {
        let vectors = [
            props(&[("a", 0.4), ("b", 0.25), ("c", 0.2), ("d", 0.1), ("e", 0.05)]),
            props(&[("a", 3.0), ("b", 1.0)]),
            props(&[("a", -1.0), ("b", 0.3), ("c", f64::NAN)]),
            props(&[("a", 0.0), ("b", 0.0), ("c", 0.0)]),
            props(&[("a", 1e-9), ("b", 0.7), ("c", 0.3)]),
        ];
        for total in [0.0, 1.0, 123.456, 50_000_000_000.0] {
            for p in &vectors {
                let shares = reallocate(total, p);
                let sum: f64 = shares.values().sum();
                assert!((sum - total).abs() <= total.abs() * 1e-12 + 1e-9, "sum {sum} != {total}");
                assert!(shares.values().all(|s| *s >= 0.0));
                assert_eq!(shares.len(), p.len());
            }
        }
    }

    #[test]
    fn test_reallocate_negative_total_is_zero() {
        let shares = reallocate(-10.0, &props(&[("a", 1.0)]));
        assert_eq!(shares["a"], 0.0);
    }

    #[test]
    fn test_reallocate_units_exact() {
        let p = props(&[("army", 0.5), ("navy", 0.24), ("air_force", 0.16), ("space_force", 0.06), ("cyber", 0.04)]);
        for total in [0u64, 1, 7, 52_500, 52_501, 99_999] {
            let shares = reallocate_units(total, &p);
            assert_eq!(shares.values().sum::<u64>(), total);
        }
        let shares = reallocate_units(52_500, &p);
        assert_eq!(shares["army"], 26_250);
    }

    #[test]
    fn test_reallocate_units_equal_split_when_all_zero() {
        let shares = reallocate_units(10, &props(&[("a", 0.0), ("b", 0.0), ("c", 0.0)]));
        assert_eq!(shares.values().sum::<u64>(), 10);
        assert_eq!(shares["a"], 4);
        assert_eq!(shares["b"], 3);
    }

    #[test]
    fn test_clamp_helpers() {
        assert_eq!(clamp_unit(1.5), 1.0);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_to(-3.0, 0.1, 0.9), 0.1);
        assert_eq!(finite_or(f64::INFINITY, 0.6), 0.6);
    }
}

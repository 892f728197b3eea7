//! Property tests for the binary classification statistics.

use proptest::prelude::*;

use rfgrid_rf::stats::{binomial_upper_tail, clopper_pearson, regularized_beta};
use rfgrid_rf::{BinaryMetrics, ConfusionMatrix};

fn confusion(tp: usize, fn_: usize, fp: usize, tn: usize) -> ConfusionMatrix {
    let mut truth = Vec::new();
    let mut pred = Vec::new();
    for (t, p, k) in [(0, 0, tp), (0, 1, fn_), (1, 0, fp), (1, 1, tn)] {
        truth.extend(std::iter::repeat_n(t, k));
        pred.extend(std::iter::repeat_n(p, k));
    }
    ConfusionMatrix::from_labels(&truth, &pred, 2).unwrap()
}

proptest! {
    #[test]
    fn interval_brackets_point_estimate(n in 1usize..500, frac in 0.0f64..=1.0) {
        let successes = ((n as f64) * frac).round() as usize;
        let (lo, hi) = clopper_pearson(successes, n, 0.95).unwrap();
        let p_hat = successes as f64 / n as f64;
        prop_assert!(0.0 <= lo && lo <= p_hat && p_hat <= hi && hi <= 1.0);
    }

    #[test]
    fn incomplete_beta_is_monotone(a in 0.5f64..50.0, b in 0.5f64..50.0, x in 0.01f64..0.98) {
        let lo = regularized_beta(x, a, b);
        let hi = regularized_beta(x + 0.01, a, b);
        prop_assert!(lo <= hi + 1e-12);
    }

    #[test]
    fn binomial_tail_decreases_in_k(n in 1usize..300, p in 0.01f64..0.99, k in 0usize..300) {
        let k = k.min(n);
        prop_assert!(binomial_upper_tail(k + 1, n, p) <= binomial_upper_tail(k, n, p) + 1e-12);
    }

    #[test]
    fn metrics_stay_in_unit_range(
        tp in 0usize..60, fn_ in 0usize..60, fp in 0usize..60, tn in 0usize..60,
    ) {
        prop_assume!(tp + fn_ + fp + tn > 0);
        let m = BinaryMetrics::from_confusion(&confusion(tp, fn_, fp, tn), 0).unwrap();
        for v in [
            m.accuracy, m.accuracy_lower, m.accuracy_upper, m.no_information_rate,
            m.p_value_acc_gt_nir, m.sensitivity, m.specificity, m.pos_pred_value,
            m.neg_pred_value, m.prevalence, m.detection_rate, m.detection_prevalence,
            m.balanced_accuracy,
        ] {
            prop_assert!((0.0..=1.0).contains(&v), "{m:?}");
        }
        prop_assert!(m.accuracy_lower <= m.accuracy && m.accuracy <= m.accuracy_upper);
        prop_assert_eq!(m.mcnemar_p_value.is_none(), fn_ + fp == 0);
    }
}

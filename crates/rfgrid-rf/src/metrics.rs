//! Binary classification statistics derived from a 2x2 confusion matrix.

use crate::confusion::ConfusionMatrix;
use crate::error::RfError;
use crate::stats::{binomial_upper_tail, clopper_pearson, mcnemar_p_value};

/// Confidence level of the accuracy interval.
pub const ACCURACY_CONFIDENCE: f64 = 0.95;

/// Statistics of a binary classifier relative to a chosen positive class.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BinaryMetrics {
    pub accuracy: f64,
    pub accuracy_lower: f64,
    pub accuracy_upper: f64,
    pub kappa: f64,
    pub no_information_rate: f64,
    /// One-sided P(X >= correct) for X ~ Bin(n, NIR).
    pub p_value_acc_gt_nir: f64,
    /// `None` when the classifier made no discordant errors.
    pub mcnemar_p_value: Option<f64>,
    pub sensitivity: f64,
    pub specificity: f64,
    pub pos_pred_value: f64,
    pub neg_pred_value: f64,
    pub prevalence: f64,
    pub detection_rate: f64,
    pub detection_prevalence: f64,
    pub balanced_accuracy: f64,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl BinaryMetrics {
    /// Compute every statistic with `positive` as the positive class index.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::NotBinary`] | Matrix is not 2x2 |
    /// | [`RfError::LabelOutOfRange`] | `positive` is not 0 or 1 |
    /// | [`RfError::EmptyDataset`] | Matrix holds no samples |
    pub fn from_confusion(cm: &ConfusionMatrix, positive: usize) -> Result<Self, RfError> {
        if cm.n_classes() != 2 {
            return Err(RfError::NotBinary {
                n_classes: cm.n_classes(),
            });
        }
        if positive > 1 {
            return Err(RfError::LabelOutOfRange {
                label: positive,
                position: 0,
                n_classes: 2,
            });
        }
        let n = cm.total();
        if n == 0 {
            return Err(RfError::EmptyDataset);
        }
        let negative = 1 - positive;

        let tp = cm.count(positive, positive);
        let fn_ = cm.count(positive, negative);
        let fp = cm.count(negative, positive);
        let tn = cm.count(negative, negative);
        let correct = tp + tn;

        let accuracy = ratio(correct, n);
        let (accuracy_lower, accuracy_upper) = clopper_pearson(correct, n, ACCURACY_CONFIDENCE)?;

        let nf = n as f64;
        let expected = (0..2)
            .map(|c| (cm.true_count(c) as f64 / nf) * (cm.predicted_count(c) as f64 / nf))
            .sum::<f64>();
        let kappa = if (1.0 - expected).abs() < f64::EPSILON {
            0.0
        } else {
            (accuracy - expected) / (1.0 - expected)
        };

        let no_information_rate = ratio(cm.true_count(0).max(cm.true_count(1)), n);
        let p_value_acc_gt_nir = binomial_upper_tail(correct, n, no_information_rate);

        let sensitivity = ratio(tp, tp + fn_);
        let specificity = ratio(tn, tn + fp);

        Ok(Self {
            accuracy,
            accuracy_lower,
            accuracy_upper,
            kappa,
            no_information_rate,
            p_value_acc_gt_nir,
            mcnemar_p_value: mcnemar_p_value(fp, fn_),
            sensitivity,
            specificity,
            pos_pred_value: ratio(tp, tp + fp),
            neg_pred_value: ratio(tn, tn + fn_),
            prevalence: ratio(tp + fn_, n),
            detection_rate: ratio(tp, n),
            detection_prevalence: ratio(tp + fp, n),
            balanced_accuracy: (sensitivity + specificity) / 2.0,
        })
    }
}

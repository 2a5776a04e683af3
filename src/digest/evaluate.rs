use super::config::OutputKind;
use super::error::Error;
use super::kernel::EmbeddingKernel;
use super::Digester;
use crate::model::geometry::{norm, sphere_to_cart, sub};
use ndarray::{ArrayD, ArrayView2, Ix2};
use tracing::{info, warn};

/// Mean and population standard deviation of a set of errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorStats {
    pub mean: f64,
    pub std: f64,
}

impl ErrorStats {
    fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std: var.sqrt(),
        }
    }
}

/// Summary of predicted against desired vector outputs.
///
/// `direct` compares the predicted vectors with the desired ones. For
/// [`OutputKind::SmoothP`], `indirect` compares the expectation of the
/// predicted probability field with the desired displacement and
/// `comparison` compares that expectation with the predicted displacement.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub cases: usize,
    pub direct: ErrorStats,
    pub indirect: Option<ErrorStats>,
    pub comparison: Option<ErrorStats>,
    /// Fraction of vector components whose sign was predicted correctly.
    pub sign_agreement: f64,
    pub average_desired: [f64; 3],
    pub average_predicted: [f64; 3],
}

impl EvaluationReport {
    /// Fraction of vector components predicted with the wrong sign.
    pub fn sign_disagreement(&self) -> f64 {
        1.0 - self.sign_agreement
    }
}

fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

fn last3(row: ndarray::ArrayView1<'_, f64>) -> [f64; 3] {
    let n = row.len();
    [row[n - 3], row[n - 2], row[n - 1]]
}

fn mean_vector(vectors: &[[f64; 3]]) -> [f64; 3] {
    let n = vectors.len() as f64;
    let mut mean = [0.0; 3];
    for v in vectors {
        for k in 0..3 {
            mean[k] += v[k] / n;
        }
    }
    mean
}

fn norm_errors(a: &[[f64; 3]], b: &[[f64; 3]]) -> Vec<f64> {
    a.iter().zip(b).map(|(&x, &y)| norm(sub(x, y))).collect()
}

fn as_matrix<'a>(what: &'static str, a: &'a ArrayD<f64>) -> Result<ArrayView2<'a, f64>, Error> {
    a.view()
        .into_dimensionality::<Ix2>()
        .map_err(|_| Error::shape_mismatch(what, &[a.len(), 3], a.shape()))
}

impl<K: EmbeddingKernel> Digester<K> {
    /// Logs error statistics of `predicted` against `desired` and returns
    /// them. Failures are logged and yield `None`.
    pub fn evaluate_test_outputs(
        &self,
        desired: &ArrayD<f64>,
        predicted: &ArrayD<f64>,
    ) -> Option<EvaluationReport> {
        match self.try_evaluate(desired, predicted) {
            Ok(report) => {
                info!(
                    output = %self.config.output,
                    cases = report.cases,
                    mean_error = report.direct.mean,
                    std_error = report.direct.std,
                    sign_agreement = report.sign_agreement,
                    average_desired = ?report.average_desired,
                    average_predicted = ?report.average_predicted,
                    "evaluated test outputs"
                );
                if let (Some(indirect), Some(comparison)) = (report.indirect, report.comparison) {
                    info!(
                        indirect_mean = indirect.mean,
                        indirect_std = indirect.std,
                        comparison_mean = comparison.mean,
                        comparison_std = comparison.std,
                        "probability expectation errors"
                    );
                }
                Some(report)
            }
            Err(error) => {
                warn!(%error, "evaluation failed");
                None
            }
        }
    }

    /// Error statistics of `predicted` against `desired`, both
    /// `(cases, width)` with the vector in the last three columns.
    ///
    /// Values are denormalized with the digester's normalization first.
    /// Spherical force outputs are compared in Cartesian form.
    pub fn try_evaluate(
        &self,
        desired: &ArrayD<f64>,
        predicted: &ArrayD<f64>,
    ) -> Result<EvaluationReport, Error> {
        let output = self.config.output;
        if !matches!(
            output,
            OutputKind::Disp
                | OutputKind::Force
                | OutputKind::GoForce
                | OutputKind::GoForceSphere
                | OutputKind::SmoothP
        ) {
            return Err(Error::UnsupportedEvaluation(output));
        }

        let des = as_matrix("desired output", desired)?;
        let pred = as_matrix("predicted output", predicted)?;
        if des.shape() != pred.shape() {
            return Err(Error::shape_mismatch(
                "predicted output",
                des.shape(),
                pred.shape(),
            ));
        }
        let (cases, width) = des.dim();
        let min_width = match output {
            OutputKind::SmoothP => self.config.grids.len() + 3,
            _ => 3,
        };
        if cases == 0 || width < min_width {
            return Err(Error::shape_mismatch(
                "desired output",
                &[cases.max(1), min_width],
                des.shape(),
            ));
        }

        let vectors = |m: &ArrayView2<'_, f64>| -> Vec<[f64; 3]> {
            m.outer_iter()
                .map(|row| {
                    let v = last3(row).map(|x| self.normalization.denormalize_value(x));
                    if output == OutputKind::GoForceSphere {
                        sphere_to_cart(v)
                    } else {
                        v
                    }
                })
                .collect()
        };
        let des_v = vectors(&des);
        let pred_v = vectors(&pred);

        let agreeing = des_v
            .iter()
            .zip(&pred_v)
            .flat_map(|(d, p)| (0..3).map(move |k| sign(d[k]) == sign(p[k])))
            .filter(|&same| same)
            .count();

        let (indirect, comparison) = if output == OutputKind::SmoothP {
            let ngau = self.config.grids.len();
            let expected: Vec<[f64; 3]> = pred
                .outer_iter()
                .map(|row| {
                    let coefficients: Vec<f64> = row.iter().take(ngau).copied().collect();
                    self.config
                        .grids
                        .expectation(&coefficients, self.config.blur_radius)
                })
                .collect();
            (
                Some(ErrorStats::from_samples(&norm_errors(&expected, &des_v))),
                Some(ErrorStats::from_samples(&norm_errors(&expected, &pred_v))),
            )
        } else {
            (None, None)
        };

        Ok(EvaluationReport {
            cases,
            direct: ErrorStats::from_samples(&norm_errors(&pred_v, &des_v)),
            indirect,
            comparison,
            sign_agreement: agreeing as f64 / (3 * cases) as f64,
            average_desired: mean_vector(&des_v),
            average_predicted: mean_vector(&pred_v),
        })
    }
}

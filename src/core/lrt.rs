// lrt.rs - Likelihood-ratio test between nested codeml models
//
// Each locus is fitted under a null model (e.g. model = 0, one omega for
// the whole tree) and an alternative model with extra free parameters.
// LR = -2 (lnL_null - lnL_alt) is compared against a chi-squared
// distribution and the raw p-values are Bonferroni corrected over the batch.

use std::collections::HashMap;
use std::path::Path;

use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::core::parser::parse_file;
use crate::data::{discover_inputs, InputFile};
use crate::errors::{Error, Result};

/// Log-likelihood of one locus under one model.
#[derive(Debug, Clone, PartialEq)]
pub struct LocusFit {
    pub locus_id: String,
    pub lnl: f64,
    pub np: Option<usize>,
}

/// Parameters of a test run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LrtConfig {
    pub df: usize,
    pub alpha: f64,
}

impl LrtConfig {
    pub fn new(df: usize, alpha: f64) -> Result<Self> {
        if df == 0 {
            return Err(Error::InvalidArgument {
                msg: "degrees of freedom must be at least 1".to_string(),
            });
        }
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(Error::InvalidArgument {
                msg: format!("alpha must be between 0 and 1, got {}", alpha),
            });
        }
        Ok(Self { df, alpha })
    }
}

/// Verdict for one locus.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub locus_id: String,
    pub lr_statistic: f64,
    pub raw_p_value: f64,
    pub corrected_p_value: f64,
    pub significant: bool,
}

impl TestResult {
    /// `*` for significant loci, `NS` otherwise
    pub fn marker(&self) -> &'static str {
        if self.significant {
            "*"
        } else {
            "NS"
        }
    }
}

pub fn likelihood_ratio_statistic(lnl_null: f64, lnl_alt: f64) -> f64 {
    -2.0 * (lnl_null - lnl_alt)
}

/// Upper tail of the chi-squared distribution with `df` degrees of freedom.
pub fn chi_squared_survival(statistic: f64, df: usize) -> Result<f64> {
    let dist = ChiSquared::new(df as f64).map_err(|e| Error::InvalidArgument {
        msg: format!("invalid chi-squared degrees of freedom {}: {}", df, e),
    })?;
    if statistic.is_nan() {
        return Err(Error::InvalidArgument {
            msg: "likelihood-ratio statistic is NaN".to_string(),
        });
    }
    if statistic <= 0.0 {
        return Ok(1.0);
    }
    Ok(dist.sf(statistic))
}

/// Bonferroni correction: `min(1, p * n)` over the whole batch.
pub fn bonferroni(p_values: &[f64]) -> Vec<f64> {
    let n = p_values.len() as f64;
    p_values.iter().map(|p| (p * n).min(1.0)).collect()
}

/// Correct raw p-values across the batch and flag significant loci.
/// Input triples are `(locus, LR statistic, raw p-value)`.
pub fn correct_and_flag(raw: Vec<(String, f64, f64)>, alpha: f64) -> Vec<TestResult> {
    let p_values: Vec<f64> = raw.iter().map(|(_, _, p)| *p).collect();
    let corrected = bonferroni(&p_values);

    raw.into_iter()
        .zip(corrected)
        .map(|((locus_id, lr_statistic, raw_p_value), corrected_p_value)| TestResult {
            locus_id,
            lr_statistic,
            raw_p_value,
            corrected_p_value,
            significant: corrected_p_value < alpha,
        })
        .collect()
}

/// Run the test for every alternative fit, in the order given.
///
/// Every alternative locus must have a null counterpart; a single missing
/// pair fails the whole run so the correction is never computed over a
/// partial population.
pub fn likelihood_ratio_test(
    alternative: &[LocusFit],
    null: &HashMap<String, LocusFit>,
    config: &LrtConfig,
) -> Result<Vec<TestResult>> {
    let mut raw = Vec::with_capacity(alternative.len());

    for alt in alternative {
        let null_fit = null.get(&alt.locus_id).ok_or_else(|| Error::MissingPair {
            locus: alt.locus_id.clone(),
        })?;

        if let (Some(np_null), Some(np_alt)) = (null_fit.np, alt.np) {
            if np_alt.checked_sub(np_null) != Some(config.df) {
                log::warn!(
                    "⚠️  {}: parameter counts differ by {} (np {} vs {}) but df = {}",
                    alt.locus_id,
                    np_alt as i64 - np_null as i64,
                    np_alt,
                    np_null,
                    config.df
                );
            }
        }

        let lr = likelihood_ratio_statistic(null_fit.lnl, alt.lnl);
        let p = chi_squared_survival(lr, config.df)?;
        raw.push((alt.locus_id.clone(), lr, p));
    }

    Ok(correct_and_flag(raw, config.alpha))
}

fn fit_from_file(input: &InputFile) -> Result<Option<LocusFit>> {
    let record = parse_file(input)?.record;
    Ok(record.lnl.map(|lnl| LocusFit {
        locus_id: record.locus_id,
        lnl,
        np: record.np,
    }))
}

/// Gather alternative fits (file name order) and their null counterparts.
///
/// The null file of a locus is `<null_dir>/<locus><null_ext>`. Loci whose
/// alternative output has no lnL line are skipped; absent null fits are
/// left out of the map and surface as `MissingPair` in the test.
pub fn collect_fits(
    alt_dir: &Path,
    alt_ext: &str,
    null_dir: &Path,
    null_ext: &str,
) -> Result<(Vec<LocusFit>, HashMap<String, LocusFit>)> {
    let alt_inputs = discover_inputs(alt_dir, alt_ext)?;

    let mut alternative = Vec::with_capacity(alt_inputs.len());
    let mut null = HashMap::new();

    for input in &alt_inputs {
        let Some(alt_fit) = fit_from_file(input)? else {
            log::warn!(
                "⚠️  {}: no lnL line in {}, skipping",
                input.locus_id,
                input.path.display()
            );
            continue;
        };

        let null_input = InputFile {
            locus_id: input.locus_id.clone(),
            path: null_dir.join(format!("{}{}", input.locus_id, null_ext)),
        };
        if null_input.path.is_file() {
            if let Some(null_fit) = fit_from_file(&null_input)? {
                null.insert(null_fit.locus_id.clone(), null_fit);
            }
        } else {
            log::debug!("no null-model output at {}", null_input.path.display());
        }

        alternative.push(alt_fit);
    }

    log::info!(
        "🔬 Collected {} alternative fits and {} null fits",
        alternative.len(),
        null.len()
    );
    Ok((alternative, null))
}

// rules.rs - Named extraction rules for codeml text output
//
// Each rule owns one positional or lexical assumption about the estimator's
// output. Rules report a rejection as `Err(detail)`; the parser turns that
// into a `MalformedSection` tagged with the rule name.

use std::sync::OnceLock;

use regex::Regex;

pub const SITE_PATTERN_BANNER: &str = "Printing out site pattern counts";
pub const DN_TREE_LENGTH_PREFIX: &str = "tree length for dN:";
pub const DS_TREE_LENGTH_PREFIX: &str = "tree length for dS:";
pub const TREE_LENGTH_PREFIX: &str = "tree length = ";
pub const BRANCH_HEADER_TOKEN: &str = "branch";

/// Rule names used in diagnostics
pub mod names {
    pub const KAPPA: &str = "kappa";
    pub const OMEGA: &str = "omega";
    pub const TOTAL_DN: &str = "tree-length-dN";
    pub const TOTAL_DS: &str = "tree-length-dS";
    pub const TREE_LENGTH: &str = "tree-length";
    pub const TREE_TEXT: &str = "tree-text";
    pub const SITE_COUNTS: &str = "site-counts";
    pub const BRANCH_HEADER: &str = "branch-header";
    pub const BRANCH_ROW: &str = "branch-row";
    pub const LOG_LIKELIHOOD: &str = "lnL";
}

/// Zero-based token holding the estimate on `kappa`/`omega` lines,
/// e.g. `kappa (ts/tv) =  2.31469`.
const PARAMETER_VALUE_TOKEN: usize = 3;

/// Zero-based token holding the value on `lnL` lines when the bracketed
/// prefix cannot be matched.
const LOG_LIKELIHOOD_VALUE_TOKEN: usize = 4;

/// Log-likelihood of one model fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LikelihoodFit {
    pub lnl: f64,
    pub ntime: Option<usize>,
    pub np: Option<usize>,
}

/// A numeric field together with the token it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub value: f64,
    pub text: String,
}

impl Estimate {
    fn from_token(token: &str) -> Result<Self, String> {
        parse_float(token).map(|value| Estimate {
            value,
            text: token.to_string(),
        })
    }
}

/// Finite floats only: codeml prints `nan`/`inf` when an optimisation fails.
pub fn parse_float(token: &str) -> Result<f64, String> {
    let value = token
        .parse::<f64>()
        .map_err(|_| format!("'{}' is not a number", token))?;
    if !value.is_finite() {
        return Err(format!("'{}' is not a finite number", token));
    }
    Ok(value)
}

/// `kappa`/`omega` style lines: first token equals `name`, value is the
/// fourth token. `None` when the line is not a `name` line.
pub fn parameter_estimate(tokens: &[&str], name: &str) -> Option<Result<Estimate, String>> {
    if tokens.first() != Some(&name) {
        return None;
    }
    Some(match tokens.get(PARAMETER_VALUE_TOKEN) {
        Some(token) => Estimate::from_token(token),
        None => Err(format!(
            "expected at least {} tokens, found {}",
            PARAMETER_VALUE_TOKEN + 1,
            tokens.len()
        )),
    })
}

/// Lines that start with a fixed prefix and end with the value.
pub fn prefixed_value(
    line: &str,
    tokens: &[&str],
    prefix: &str,
) -> Option<Result<Estimate, String>> {
    if !line.starts_with(prefix) {
        return None;
    }
    Some(match tokens.last() {
        Some(token) => Estimate::from_token(token),
        None => Err("line has no value".to_string()),
    })
}

/// Header line of the site pattern section: `numSeq numSites ...`.
pub fn site_counts(tokens: &[&str]) -> Result<(usize, usize), String> {
    match tokens {
        [num_seq, num_sites, ..] => {
            let num_seq = num_seq
                .parse::<usize>()
                .map_err(|_| format!("'{}' is not a sequence count", num_seq))?;
            let num_sites = num_sites
                .parse::<usize>()
                .map_err(|_| format!("'{}' is not a site count", num_sites))?;
            Ok((num_seq, num_sites))
        }
        _ => Err(format!("expected two counts, found {} tokens", tokens.len())),
    }
}

/// Character offsets of a breakdown row that differ from the reference
/// sequence. The leading row label is skipped and the remaining tokens are
/// read as one contiguous string.
pub fn polymorphic_offsets<'a>(tokens: &'a [&'a str]) -> impl Iterator<Item = usize> + 'a {
    tokens
        .iter()
        .skip(1)
        .flat_map(|token| token.chars())
        .enumerate()
        .filter(|(_, c)| *c != '.')
        .map(|(offset, _)| offset)
}

/// `None` only if the pattern fails to compile; lines then take the token fallback.
fn lnl_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^lnL\(ntime:\s*(\d+)\s+np:\s*(\d+)\):\s*(\S+)").ok())
        .as_ref()
}

/// `lnL(ntime:  7  np: 10):  -1234.567890  +0.000000`
pub fn log_likelihood(line: &str, tokens: &[&str]) -> Option<Result<LikelihoodFit, String>> {
    if !tokens.first().is_some_and(|t| t.starts_with("lnL")) {
        return None;
    }

    if let Some(caps) = lnl_pattern().and_then(|re| re.captures(line.trim_start())) {
        return Some(parse_float(&caps[3]).map(|lnl| LikelihoodFit {
            lnl,
            ntime: caps[1].parse().ok(),
            np: caps[2].parse().ok(),
        }));
    }

    Some(match tokens.get(LOG_LIKELIHOOD_VALUE_TOKEN) {
        Some(token) => parse_float(token).map(|lnl| LikelihoodFit {
            lnl,
            ntime: None,
            np: None,
        }),
        None => Err("log-likelihood line has no value".to_string()),
    })
}

/// Minimal Newick shape: `( ... );` with balanced parentheses.
pub fn looks_like_newick(text: &str) -> bool {
    let text = text.trim();
    if !text.starts_with('(') || !text.ends_with(';') {
        return false;
    }
    let mut depth: i64 = 0;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

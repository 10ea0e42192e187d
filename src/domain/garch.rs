//! GARCH(1,1) volatility model with a constant mean.
//!
//! r[t] = mu + e[t],  s2[t] = omega + alpha * e[t-1]^2 + beta * s2[t-1]
//!
//! Parameters are fitted by maximum likelihood under normal innovations.
//! The optimizer is Nelder-Mead on an unconstrained reparameterization that
//! keeps omega > 0, alpha >= 0, beta >= 0 and alpha + beta < 1. It always
//! stops after `max_iterations`; a fit that hit the cap is still usable.

use thiserror::Error;

pub const DEFAULT_MAX_ITERATIONS: usize = 500;
const TOLERANCE: f64 = 1e-8;
const VARIANCE_FLOOR: f64 = 1e-12;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GarchError {
    #[error("need at least {required} returns, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("returns have zero variance")]
    ZeroVariance,

    #[error("returns contain non-finite values")]
    NonFinite,

    #[error("likelihood is not finite at the fitted parameters")]
    Diverged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GarchFit {
    pub mu: f64,
    pub omega: f64,
    pub alpha: f64,
    pub beta: f64,
    pub log_likelihood: f64,
    pub iterations: usize,
    pub converged: bool,
    last_residual: f64,
    last_variance: f64,
}

impl GarchFit {
    pub fn fit(returns: &[f64], max_iterations: usize) -> Result<Self, GarchError> {
        if returns.len() < 3 {
            return Err(GarchError::InsufficientData {
                required: 3,
                available: returns.len(),
            });
        }
        if returns.iter().any(|r| !r.is_finite()) {
            return Err(GarchError::NonFinite);
        }
        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        if var <= VARIANCE_FLOOR {
            return Err(GarchError::ZeroVariance);
        }

        let start = Params {
            mu: mean,
            omega: var * 0.05,
            alpha: 0.1,
            beta: 0.85,
        }
        .to_raw();
        let objective = |raw: &[f64; 4]| {
            let ll = log_likelihood(returns, &Params::from_raw(raw), var);
            if ll.is_finite() { -ll } else { f64::INFINITY }
        };
        let min = nelder_mead(objective, start, max_iterations);
        let params = Params::from_raw(&min.x);

        let (ll, last_residual, last_variance) = filter(returns, &params, var);
        if !ll.is_finite() || !last_variance.is_finite() {
            return Err(GarchError::Diverged);
        }
        Ok(Self {
            mu: params.mu,
            omega: params.omega,
            alpha: params.alpha,
            beta: params.beta,
            log_likelihood: ll,
            iterations: min.iterations,
            converged: min.converged,
            last_residual,
            last_variance,
        })
    }

    /// Conditional variance of the last observed return.
    pub fn current_variance(&self) -> f64 {
        self.last_variance
    }

    /// One-step-ahead variance forecast.
    pub fn forecast_variance(&self) -> f64 {
        self.omega + self.alpha * self.last_residual.powi(2) + self.beta * self.last_variance
    }

    pub fn persistence(&self) -> f64 {
        self.alpha + self.beta
    }
}

#[derive(Debug, Clone, Copy)]
struct Params {
    mu: f64,
    omega: f64,
    alpha: f64,
    beta: f64,
}

impl Params {
    fn from_raw(raw: &[f64; 4]) -> Self {
        let persistence = logistic(raw[2]);
        let alpha = persistence * logistic(raw[3]);
        Self {
            mu: raw[0],
            omega: raw[1].exp(),
            alpha,
            beta: persistence - alpha,
        }
    }

    fn to_raw(self) -> [f64; 4] {
        let persistence = self.alpha + self.beta;
        [
            self.mu,
            self.omega.ln(),
            logit(persistence),
            logit(self.alpha / persistence),
        ]
    }
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

fn log_likelihood(returns: &[f64], params: &Params, backcast: f64) -> f64 {
    filter(returns, params, backcast).0
}

/// Run the variance recursion; returns (log-likelihood, last residual, last variance).
fn filter(returns: &[f64], p: &Params, backcast: f64) -> (f64, f64, f64) {
    let ln_2pi = (2.0 * std::f64::consts::PI).ln();
    let mut s2 = backcast;
    let mut prev_e2 = backcast;
    let mut ll = 0.0;
    let mut e = 0.0;
    for &r in returns {
        s2 = (p.omega + p.alpha * prev_e2 + p.beta * s2).max(VARIANCE_FLOOR);
        e = r - p.mu;
        ll -= 0.5 * (ln_2pi + s2.ln() + e * e / s2);
        prev_e2 = e * e;
    }
    (ll, e, s2)
}

struct Minimum {
    x: [f64; 4],
    iterations: usize,
    converged: bool,
}

fn nelder_mead<F>(f: F, start: [f64; 4], max_iterations: usize) -> Minimum
where
    F: Fn(&[f64; 4]) -> f64,
{
    const N: usize = 4;
    let mut simplex: Vec<([f64; 4], f64)> = Vec::with_capacity(N + 1);
    simplex.push((start, f(&start)));
    for i in 0..N {
        let mut x = start;
        x[i] += if x[i].abs() > 1e-3 { 0.1 * x[i].abs() } else { 0.1 };
        simplex.push((x, f(&x)));
    }

    let mut iterations = 0;
    let mut converged = false;
    while iterations < max_iterations {
        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        let best = simplex[0].1;
        let worst = simplex[N].1;
        if best.is_finite() && (worst - best).abs() <= TOLERANCE * (1.0 + best.abs()) {
            converged = true;
            break;
        }
        iterations += 1;

        let mut centroid = [0.0; N];
        for (x, _) in &simplex[..N] {
            for j in 0..N {
                centroid[j] += x[j] / N as f64;
            }
        }
        let worst_x = simplex[N].0;
        let towards = |t: f64| {
            let mut p = [0.0; N];
            for j in 0..N {
                p[j] = centroid[j] + t * (worst_x[j] - centroid[j]);
            }
            p
        };

        let reflected = towards(-1.0);
        let fr = f(&reflected);
        if fr < simplex[0].1 {
            let expanded = towards(-2.0);
            let fe = f(&expanded);
            simplex[N] = if fe < fr { (expanded, fe) } else { (reflected, fr) };
        } else if fr < simplex[N - 1].1 {
            simplex[N] = (reflected, fr);
        } else {
            let contracted = if fr < worst { towards(-0.5) } else { towards(0.5) };
            let fc = f(&contracted);
            if fc < worst.min(fr) {
                simplex[N] = (contracted, fc);
            } else {
                let anchor = simplex[0].0;
                for (x, fx) in simplex.iter_mut().skip(1) {
                    for j in 0..N {
                        x[j] = anchor[j] + 0.5 * (x[j] - anchor[j]);
                    }
                    *fx = f(x);
                }
            }
        }
    }

    simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
    Minimum {
        x: simplex[0].0,
        iterations,
        converged,
    }
}

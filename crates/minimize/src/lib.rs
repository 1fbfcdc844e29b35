//! Nelder–Mead simplex minimization without derivatives.
//!
//! The objective may return a non-finite value for points where it is undefined.
//! Any such evaluation stops the step with [`MinimizeError::Unevaluable`] and leaves
//! the simplex as it was, so callers can keep the best point found so far.

use thiserror::Error;

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MinimizeError {
    #[error("objective is not finite at the trial point")]
    Unevaluable,
    #[error("expected {expected} step sizes, got {found}")]
    Dimension { expected: usize, found: usize },
    #[error("step size #{index} must be non-zero and finite, got {value}")]
    InvalidStep { index: usize, value: f64 },
    #[error("cannot minimize over zero parameters")]
    Empty,
}

/// Which move the last iteration made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Reflection,
    Expansion,
    Contraction,
    Shrink,
}

/// Simplex state driven by [`NelderMead::iterate`].
pub struct NelderMead<F> {
    objective: F,
    vertices: Vec<Vec<f64>>,
    values: Vec<f64>,
    iterations: usize,
}

impl<F> NelderMead<F>
where
    F: FnMut(&[f64]) -> f64,
{
    /// Build the initial simplex `x0, x0 + steps[i]·e_i`.
    pub fn new(mut objective: F, x0: &[f64], steps: &[f64]) -> Result<Self, MinimizeError> {
        if x0.is_empty() {
            return Err(MinimizeError::Empty);
        }
        if steps.len() != x0.len() {
            return Err(MinimizeError::Dimension {
                expected: x0.len(),
                found: steps.len(),
            });
        }
        if let Some((index, &value)) = steps
            .iter()
            .enumerate()
            .find(|(_, s)| **s == 0.0 || !s.is_finite())
        {
            return Err(MinimizeError::InvalidStep { index, value });
        }

        let mut vertices = Vec::with_capacity(x0.len() + 1);
        vertices.push(x0.to_vec());
        for (i, step) in steps.iter().enumerate() {
            let mut vertex = x0.to_vec();
            vertex[i] += step;
            vertices.push(vertex);
        }
        let values = vertices
            .iter()
            .map(|v| evaluate(&mut objective, v))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            objective,
            vertices,
            values,
            iterations: 0,
        })
    }

    /// Perform one simplex move.
    pub fn iterate(&mut self) -> Result<Step, MinimizeError> {
        let (lo, hi, second_hi) = self.ranks();
        let centroid = self.centroid_without(hi);

        let reflected = along(&centroid, &self.vertices[hi], -REFLECTION);
        let f_reflected = evaluate(&mut self.objective, &reflected)?;

        let step = if f_reflected < self.values[lo] {
            let expanded = along(&centroid, &self.vertices[hi], -EXPANSION);
            let f_expanded = evaluate(&mut self.objective, &expanded)?;
            if f_expanded < f_reflected {
                self.replace(hi, expanded, f_expanded);
                Step::Expansion
            } else {
                self.replace(hi, reflected, f_reflected);
                Step::Reflection
            }
        } else if f_reflected < self.values[second_hi] {
            self.replace(hi, reflected, f_reflected);
            Step::Reflection
        } else {
            // outside contraction when the reflection improved on the worst vertex
            let (contracted, f_bound) = if f_reflected < self.values[hi] {
                (along(&centroid, &reflected, CONTRACTION), f_reflected)
            } else {
                (along(&centroid, &self.vertices[hi], CONTRACTION), self.values[hi])
            };
            let f_contracted = evaluate(&mut self.objective, &contracted)?;
            if f_contracted < f_bound {
                self.replace(hi, contracted, f_contracted);
                Step::Contraction
            } else {
                self.shrink(lo)?;
                Step::Shrink
            }
        };
        self.iterations += 1;
        Ok(step)
    }

    pub fn best_point(&self) -> &[f64] {
        &self.vertices[self.ranks().0]
    }

    pub fn best_value(&self) -> f64 {
        self.values[self.ranks().0]
    }

    /// Mean distance of the vertices from their centroid.
    pub fn size(&self) -> f64 {
        let n = self.vertices.len() as f64;
        let dim = self.vertices[0].len();
        let centroid: Vec<f64> = (0..dim)
            .map(|j| self.vertices.iter().map(|v| v[j]).sum::<f64>() / n)
            .collect();
        self.vertices
            .iter()
            .map(|v| distance(v, &centroid))
            .sum::<f64>()
            / n
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    fn ranks(&self) -> (usize, usize, usize) {
        let mut order: Vec<usize> = (0..self.values.len()).collect();
        order.sort_by(|&a, &b| self.values[a].total_cmp(&self.values[b]));
        let hi = order[order.len() - 1];
        let second_hi = if order.len() > 1 { order[order.len() - 2] } else { hi };
        (order[0], hi, second_hi)
    }

    fn centroid_without(&self, skip: usize) -> Vec<f64> {
        let dim = self.vertices[0].len();
        let count = (self.vertices.len() - 1) as f64;
        (0..dim)
            .map(|j| {
                self.vertices
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != skip)
                    .map(|(_, v)| v[j])
                    .sum::<f64>()
                    / count
            })
            .collect()
    }

    fn replace(&mut self, index: usize, vertex: Vec<f64>, value: f64) {
        self.vertices[index] = vertex;
        self.values[index] = value;
    }

    fn shrink(&mut self, best: usize) -> Result<(), MinimizeError> {
        let anchor = self.vertices[best].clone();
        let mut shrunk = self.vertices.clone();
        let mut values = self.values.clone();
        for (i, vertex) in shrunk.iter_mut().enumerate() {
            if i == best {
                continue;
            }
            *vertex = along(&anchor, vertex, SHRINK);
            values[i] = evaluate(&mut self.objective, vertex)?;
        }
        self.vertices = shrunk;
        self.values = values;
        Ok(())
    }
}

/// Stopping rules for [`minimize`].
#[derive(Debug, Clone, Copy)]
pub struct StopCriteria {
    pub max_iterations: usize,
    /// Stop once the simplex size falls below this.
    pub size_tolerance: f64,
    /// Stop once the best value falls to or below this.
    pub target: Option<f64>,
    /// Stop once two successive iterations leave best values closer than this.
    pub min_delta: Option<f64>,
}

impl StopCriteria {
    pub fn new(max_iterations: usize, size_tolerance: f64) -> Self {
        Self {
            max_iterations,
            size_tolerance,
            target: None,
            min_delta: None,
        }
    }
}

/// Why [`minimize`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    MaxIterations,
    Size,
    Target,
    /// The best value moved by less than `min_delta`.
    Stalled,
    /// A trial point was unevaluable; the simplex is the one before that step.
    Unevaluable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub size: f64,
    pub stop: Stop,
}

/// Run the simplex until one of `criteria` holds.
///
/// An unevaluable initial simplex is an error; an unevaluable trial point later on ends
/// the run with [`Stop::Unevaluable`] and the best point found so far.
pub fn minimize<F>(
    objective: F,
    x0: &[f64],
    steps: &[f64],
    criteria: StopCriteria,
) -> Result<Minimum, MinimizeError>
where
    F: FnMut(&[f64]) -> f64,
{
    let mut simplex = NelderMead::new(objective, x0, steps)?;
    let mut previous = f64::NAN;
    let stop = loop {
        if simplex.iterations() >= criteria.max_iterations {
            break Stop::MaxIterations;
        }
        if criteria.target.is_some_and(|target| simplex.best_value() <= target) {
            break Stop::Target;
        }
        if simplex.size() < criteria.size_tolerance {
            break Stop::Size;
        }
        match simplex.iterate() {
            Ok(_) => {}
            Err(MinimizeError::Unevaluable) => break Stop::Unevaluable,
            Err(err) => return Err(err),
        }
        let current = simplex.best_value();
        if criteria.min_delta.is_some_and(|delta| (current - previous).abs() < delta) {
            break Stop::Stalled;
        }
        previous = current;
    };
    Ok(Minimum {
        point: simplex.best_point().to_vec(),
        value: simplex.best_value(),
        iterations: simplex.iterations(),
        size: simplex.size(),
        stop,
    })
}

fn evaluate<F>(objective: &mut F, x: &[f64]) -> Result<f64, MinimizeError>
where
    F: FnMut(&[f64]) -> f64,
{
    let value = objective(x);
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MinimizeError::Unevaluable)
    }
}

/// `origin + coeff·(toward − origin)`.
fn along(origin: &[f64], toward: &[f64], coeff: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(toward)
        .map(|(o, t)| o + coeff * (t - o))
        .collect()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn criteria(max_iterations: usize) -> StopCriteria {
        StopCriteria::new(max_iterations, 1e-10)
    }

    #[test]
    fn finds_parabola_minimum_in_one_dimension() {
        let min = minimize(|x| (x[0] - 3.0).powi(2) + 1.0, &[0.0], &[0.5], criteria(500)).unwrap();
        assert_abs_diff_eq!(min.point[0], 3.0, epsilon = 1e-4);
        assert_abs_diff_eq!(min.value, 1.0, epsilon = 1e-8);
    }

    #[test]
    fn finds_rosenbrock_valley() {
        let rosenbrock = |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let min = minimize(rosenbrock, &[-1.2, 1.0], &[0.1, 0.1], criteria(5_000)).unwrap();
        assert_abs_diff_eq!(min.point[0], 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(min.point[1], 1.0, epsilon = 2e-3);
    }

    #[test]
    fn reports_unevaluable_objective() {
        let mut simplex = NelderMead::new(
            |x: &[f64]| if x[0] < 0.0 { f64::NAN } else { x[0] },
            &[0.5],
            &[0.5],
        )
        .unwrap();
        let mut outcome = Ok(Step::Reflection);
        for _ in 0..50 {
            outcome = simplex.iterate();
            if outcome.is_err() {
                break;
            }
        }
        assert_eq!(outcome, Err(MinimizeError::Unevaluable));
        assert!(simplex.best_value().is_finite());
    }

    #[test]
    fn rejects_mismatched_steps() {
        let result = NelderMead::new(|x: &[f64]| x[0], &[0.0, 1.0], &[1.0]);
        assert!(matches!(result, Err(MinimizeError::Dimension { expected: 2, found: 1 })));
        let result = NelderMead::new(|x: &[f64]| x[0], &[0.0], &[0.0]);
        assert!(matches!(result, Err(MinimizeError::InvalidStep { index: 0, .. })));
    }

    #[test]
    fn target_stops_early() {
        let min = minimize(
            |x| (x[0] - 2.0).abs(),
            &[0.0],
            &[0.25],
            StopCriteria {
                target: Some(0.1),
                ..StopCriteria::new(1_000, 0.0)
            },
        )
        .unwrap();
        assert!(min.value <= 0.1);
        assert!(min.iterations < 1_000);
        assert_eq!(min.stop, Stop::Target);
    }

    #[test]
    fn iteration_cap_is_exact() {
        let min = minimize(|x| x[0] * x[0] + x[1] * x[1], &[3.0, -2.0], &[0.1, 0.1], criteria(4))
            .unwrap();
        assert_eq!(min.iterations, 4);
        assert_eq!(min.stop, Stop::MaxIterations);
    }

    #[test]
    fn stalls_once_the_best_value_stops_moving() {
        // the first move from the vertex at 0 cannot beat it, so the best value repeats
        let min = minimize(
            |x| x[0] * x[0],
            &[0.0],
            &[1.0],
            StopCriteria {
                min_delta: Some(1e-12),
                ..StopCriteria::new(100, 0.0)
            },
        )
        .unwrap();
        assert_eq!(min.stop, Stop::Stalled);
        assert_eq!(min.iterations, 2);
        assert_eq!(min.value, 0.0);
    }

    #[test]
    fn unevaluable_step_keeps_the_best_point() {
        let min = minimize(
            |x| if x[0] < 0.0 { f64::NAN } else { x[0] },
            &[0.5],
            &[0.5],
            StopCriteria::new(50, 0.0),
        )
        .unwrap();
        assert_eq!(min.stop, Stop::Unevaluable);
        assert_eq!(min.point, vec![0.5]);
        assert_eq!(min.value, 0.5);
        assert_eq!(min.iterations, 0);
    }

    #[test]
    fn unevaluable_start_is_an_error() {
        let result = minimize(|_| f64::NAN, &[0.0], &[1.0], StopCriteria::new(10, 0.0));
        assert_eq!(result, Err(MinimizeError::Unevaluable));
    }

    #[test]
    fn size_shrinks_while_converging() {
        let mut simplex = NelderMead::new(|x: &[f64]| x[0] * x[0] + x[1] * x[1], &[1.0, 1.0], &[0.5, 0.5])
            .unwrap();
        let initial = simplex.size();
        for _ in 0..100 {
            simplex.iterate().unwrap();
        }
        assert!(simplex.size() < initial * 1e-3);
    }
}

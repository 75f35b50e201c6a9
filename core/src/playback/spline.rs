//! Natural cubic splines for smoothing ghost velocity.

use crate::replay::Trajectory;
use glam::Vec2;

/// Natural cubic spline through `(xs[i], ys[i])`.
///
/// Outside the knot range the spline continues linearly with the slope at
/// the nearest end, which is what a natural boundary implies.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
}

impl CubicSpline {
    /// Fit a spline. Returns `None` for no knots or knots that are not
    /// strictly increasing.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Option<Self> {
        let n = xs.len();
        if n == 0 || n != ys.len() || xs.windows(2).any(|w| w[1] <= w[0]) {
            return None;
        }

        let mut b = vec![0.0; n];
        let mut c = vec![0.0; n];
        let mut d = vec![0.0; n];

        if n >= 2 {
            let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();

            // Thomas algorithm on the interior rows; c[0] = c[n-1] = 0.
            if n >= 3 {
                let mut diag = vec![1.0; n];
                let mut rhs = vec![0.0; n];
                let mut upper = vec![0.0; n];
                for i in 1..n - 1 {
                    let lower = h[i - 1];
                    diag[i] = 2.0 * (h[i - 1] + h[i]) - lower * upper[i - 1];
                    upper[i] = h[i] / diag[i];
                    let slope = 3.0 * ((ys[i + 1] - ys[i]) / h[i] - (ys[i] - ys[i - 1]) / h[i - 1]);
                    rhs[i] = (slope - lower * rhs[i - 1]) / diag[i];
                }
                for i in (1..n - 1).rev() {
                    c[i] = rhs[i] - upper[i] * c[i + 1];
                }
            }

            for i in 0..n - 1 {
                b[i] = (ys[i + 1] - ys[i]) / h[i] - h[i] * (2.0 * c[i] + c[i + 1]) / 3.0;
                d[i] = (c[i + 1] - c[i]) / (3.0 * h[i]);
            }
            let last = n - 2;
            b[n - 1] = b[last] + 2.0 * c[last] * h[last] + 3.0 * d[last] * h[last] * h[last];
        }

        Some(Self { xs, ys, b, c, d })
    }

    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if x <= self.xs[0] {
            return self.ys[0] + self.b[0] * (x - self.xs[0]);
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1] + self.b[n - 1] * (x - self.xs[n - 1]);
        }

        let i = self.xs.partition_point(|&k| k <= x) - 1;
        let dx = x - self.xs[i];
        self.ys[i] + dx * (self.b[i] + dx * (self.c[i] + dx * self.d[i]))
    }
}

/// Smoothed per-sample position delta of one trajectory, used to orient
/// sprites that rotate with their direction of travel.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocitySpline {
    dx: CubicSpline,
    dy: CubicSpline,
}

impl VelocitySpline {
    /// Knot `i` sits at tick `i * subframes` and holds `frame[i+1] - frame[i]`.
    /// Needs at least two frames.
    pub fn fit(trajectory: &Trajectory, subframes: u32) -> Option<Self> {
        let frames = trajectory.frames();
        let knots: Vec<f64> = (0..frames.len().saturating_sub(1))
            .map(|i| (i as u32 * subframes) as f64)
            .collect();
        let dx = frames
            .windows(2)
            .map(|w| w[1].x as f64 - w[0].x as f64)
            .collect();
        let dy = frames
            .windows(2)
            .map(|w| w[1].y as f64 - w[0].y as f64)
            .collect();

        Some(Self {
            dx: CubicSpline::new(knots.clone(), dx)?,
            dy: CubicSpline::new(knots, dy)?,
        })
    }

    /// Smoothed delta at continuous tick `t`.
    pub fn at(&self, t: f64) -> Vec2 {
        Vec2::new(self.dx.eval(t) as f32, self.dy.eval(t) as f32)
    }

    /// Sprite angle in radians: `atan2(dy, -dx)`.
    pub fn angle(&self, t: f64) -> f32 {
        let delta = self.at(t);
        delta.y.atan2(-delta.x)
    }
}

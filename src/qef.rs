//! Quadric error function solver for Dual Contouring vertex placement.
//!
//! `QEF.cpp`/`QEF.h` in `original_source` solve the per-cell minimization
//!
//! ```text
//! E[x] = sum_i (N_i . (x - P_i))^2
//! ```
//!
//! by taking the full singular value decomposition of the `rows x 3`
//! matrix of accumulated normals (via Householder bidiagonalization and
//! Givens/Schur QR iteration) and solving the resulting system with the
//! smallest singular values zeroed out below a `0.1` threshold.
//!
//! This port solves the mathematically equivalent normal-equations form
//! instead: accumulating `A^T A` (a running `3x3` symmetric matrix) and
//! `A^T b` (a running 3-vector) as points are added, then diagonalizing
//! `A^T A` with the classic cyclic Jacobi eigenvalue algorithm. The right
//! singular vectors and singular values of `A` are exactly the
//! eigenvectors of `A^T A` and the square roots of its eigenvalues, so
//! truncating eigenvalues below `PINV_THRESHOLD^2` and solving
//! `x = massPoint + pinv(A^T A) * (A^T b - A^T A * massPoint)` produces the
//! same minimizer as the source's row-wise SVD solve. `DESIGN.md` records
//! this as a deliberate substitution: a hand-ported Householder/Givens
//! SVD is far easier to get subtly wrong when it can never be compiled or
//! run, and the 3x3 Jacobi sweep is simple enough to check by hand.

use crate::math::Vec3;

/// Singular values (and, equivalently here, eigenvalues of `A^T A`) below
/// this are treated as zero, discarding that direction from the solve.
/// Matches `QEF.cpp`'s `d[i] < 0.1` truncation.
const PINV_THRESHOLD: f64 = 0.1;

/// Number of Jacobi sweeps run over the 3x3 symmetric matrix. A 3x3
/// matrix converges in far fewer than this in practice; the fixed count
/// avoids a data-dependent convergence check.
const JACOBI_SWEEPS: usize = 12;

/// Accumulates the quadric error function for one Dual Contouring cell.
///
/// Call [`QefSolver::add`] once per edge crossing found in the cell, then
/// [`QefSolver::solve`] to get the vertex position minimizing the
/// accumulated planes' squared distance.
#[derive(Debug, Clone, Copy)]
pub struct QefSolver {
    ata: [[f64; 3]; 3],
    atb: [f64; 3],
    mass_point_sum: Vec3,
    num_points: u32,
}

impl Default for QefSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl QefSolver {
    /// Creates an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self { ata: [[0.0; 3]; 3], atb: [0.0; 3], mass_point_sum: Vec3::ZERO, num_points: 0 }
    }

    /// Adds one `(point, normal)` plane constraint. `normal` is expected
    /// to already be unit length (the caller's gradient-derived normal).
    pub fn add(&mut self, point: Vec3, normal: Vec3) {
        let n = [f64::from(normal.x), f64::from(normal.y), f64::from(normal.z)];
        let d = f64::from(normal.dot(point));

        for row in 0..3 {
            for col in 0..3 {
                self.ata[row][col] += n[row] * n[col];
            }
            self.atb[row] += n[row] * d;
        }

        self.mass_point_sum += point;
        self.num_points += 1;
    }

    /// True if no constraints were accumulated.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.num_points == 0
    }

    /// The average of every point passed to [`QefSolver::add`]. Used as
    /// the regularizing bias point, and as the fallback vertex position
    /// when the cell's planes don't constrain a unique solution well
    /// enough (spec's "degenerate gradients" edge case).
    #[must_use]
    pub fn mass_point(&self) -> Vec3 {
        if self.num_points == 0 {
            Vec3::ZERO
        } else {
            self.mass_point_sum * (1.0 / self.num_points as f32)
        }
    }

    /// Solves for the vertex position minimizing the accumulated QEF,
    /// biased toward [`QefSolver::mass_point`] along any direction the
    /// planes don't constrain.
    #[must_use]
    pub fn solve(&self) -> Vec3 {
        if self.num_points == 0 {
            return Vec3::ZERO;
        }

        let mass = self.mass_point();
        let mass_f64 = [f64::from(mass.x), f64::from(mass.y), f64::from(mass.z)];

        // rhs = A^T b - A^T A * massPoint
        let mut rhs = self.atb;
        for row in 0..3 {
            for col in 0..3 {
                rhs[row] -= self.ata[row][col] * mass_f64[col];
            }
        }

        let (eigenvalues, eigenvectors) = jacobi_eigen_3x3(self.ata);

        // x' = V * pinv(D) * V^T * rhs
        let mut vt_rhs = [0.0; 3];
        for col in 0..3 {
            for row in 0..3 {
                vt_rhs[col] += eigenvectors[row][col] * rhs[row];
            }
        }

        let mut scaled = [0.0; 3];
        for i in 0..3 {
            let singular_value = eigenvalues[i].max(0.0).sqrt();
            scaled[i] = if singular_value < PINV_THRESHOLD { 0.0 } else { vt_rhs[i] / eigenvalues[i] };
        }

        let mut delta = [0.0; 3];
        for row in 0..3 {
            for col in 0..3 {
                delta[row] += eigenvectors[row][col] * scaled[col];
            }
        }

        Vec3::new(mass.x + delta[0] as f32, mass.y + delta[1] as f32, mass.z + delta[2] as f32)
    }
}

/// Cyclic Jacobi eigenvalue decomposition of a symmetric 3x3 matrix.
/// Returns `(eigenvalues, eigenvectors)` where `eigenvectors[i][j]` is the
/// `i`-th component of the `j`-th eigenvector (eigenvectors as columns).
fn jacobi_eigen_3x3(mut a: [[f64; 3]; 3]) -> ([f64; 3], [[f64; 3]; 3]) {
    let mut v = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    for _sweep in 0..JACOBI_SWEEPS {
        let off_diagonal_magnitude = a[0][1].abs() + a[0][2].abs() + a[1][2].abs();
        if off_diagonal_magnitude < 1e-12 {
            break;
        }

        for &(p, q) in &[(0usize, 1usize), (0, 2), (1, 2)] {
            if a[p][q].abs() < 1e-15 {
                continue;
            }

            let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
            let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
            let c = 1.0 / (t * t + 1.0).sqrt();
            let s = t * c;
            let tau = s / (1.0 + c);

            let a_pq = a[p][q];
            let a_pp = a[p][p];
            let a_qq = a[q][q];

            a[p][p] = a_pp - t * a_pq;
            a[q][q] = a_qq + t * a_pq;
            a[p][q] = 0.0;
            a[q][p] = 0.0;

            for i in 0..3 {
                if i != p && i != q {
                    let a_ip = a[i][p];
                    let a_iq = a[i][q];
                    a[i][p] = a_ip - s * (a_iq + tau * a_ip);
                    a[p][i] = a[i][p];
                    a[i][q] = a_iq + s * (a_ip - tau * a_iq);
                    a[q][i] = a[i][q];
                }
            }

            for i in 0..3 {
                let v_ip = v[i][p];
                let v_iq = v[i][q];
                v[i][p] = v_ip - s * (v_iq + tau * v_ip);
                v[i][q] = v_iq + s * (v_ip - tau * v_iq);
            }
        }
    }

    ([a[0][0], a[1][1], a[2][2]], v)
}

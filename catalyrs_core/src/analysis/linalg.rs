//! Exact integer linear algebra
//!
//! Elimination runs on arbitrary precision integers. Rows are divided by their gcd after every
//! step so entries stay small, and no floating point tolerance is ever involved.
use nalgebra::DMatrix;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::analysis::AnalysisError;

/// Reduced row echelon form of an integer matrix, scaled to integer rows
///
/// Every pivot column is zero outside its pivot row, and every pivot is positive.
pub(crate) struct Echelon {
    rows: Vec<Vec<BigInt>>,
    pivots: Vec<usize>,
    ncols: usize,
}

impl Echelon {
    pub(crate) fn new(mat: &DMatrix<i64>) -> Echelon {
        let ncols = mat.ncols();
        let mut rows: Vec<Vec<BigInt>> = (0..mat.nrows())
            .map(|i| (0..ncols).map(|j| BigInt::from(mat[(i, j)])).collect())
            .collect();
        let mut pivots = Vec::new();
        let mut r = 0;
        for c in 0..ncols {
            if r == rows.len() {
                break;
            }
            let Some(p) = (r..rows.len()).find(|&i| !rows[i][c].is_zero()) else {
                continue;
            };
            rows.swap(p, r);
            make_primitive(&mut rows[r]);
            if rows[r][c].is_negative() {
                rows[r].iter_mut().for_each(|v| *v = -v.clone());
            }
            for i in 0..rows.len() {
                if i == r || rows[i][c].is_zero() {
                    continue;
                }
                let a = rows[r][c].clone();
                let b = rows[i][c].clone();
                // row_i <- a*row_i - b*row_r eliminates column c
                let pivot_row = rows[r].clone();
                for (x, y) in rows[i].iter_mut().zip(pivot_row.iter()) {
                    *x = &a * &*x - &b * y;
                }
                make_primitive(&mut rows[i]);
            }
            pivots.push(c);
            r += 1;
        }
        Echelon {
            rows,
            pivots,
            ncols,
        }
    }

    pub(crate) fn rank(&self) -> usize {
        self.pivots.len()
    }

    /// Integer basis of the null space, one primitive vector per free column
    ///
    /// The first nonzero entry of each vector is positive.
    pub(crate) fn nullspace(&self) -> Vec<Vec<BigInt>> {
        let scale = self
            .pivots
            .iter()
            .enumerate()
            .fold(BigInt::one(), |acc, (k, &c)| acc.lcm(&self.rows[k][c]));
        let free = (0..self.ncols).filter(|c| !self.pivots.contains(c));
        free.map(|f| {
            let mut x = vec![BigInt::zero(); self.ncols];
            x[f] = scale.clone();
            for (k, &c) in self.pivots.iter().enumerate() {
                x[c] = -(&self.rows[k][f] * &scale) / &self.rows[k][c];
            }
            make_primitive(&mut x);
            if let Some(first) = x.iter().find(|v| !v.is_zero()) {
                if first.is_negative() {
                    x.iter_mut().for_each(|v| *v = -v.clone());
                }
            }
            x
        })
        .collect()
    }
}

/// Rank of an integer matrix
pub(crate) fn rank(mat: &DMatrix<i64>) -> usize {
    Echelon::new(mat).rank()
}

/// Integer basis of the left null space of `mat`, as the rows of a matrix
///
/// # Returns
/// A matrix whose rows `c` satisfy `c * mat = 0`, together with the rank of `mat`.
pub(crate) fn left_nullspace(mat: &DMatrix<i64>) -> Result<(DMatrix<i64>, usize), AnalysisError> {
    let echelon = Echelon::new(&mat.transpose());
    let basis = echelon.nullspace();
    let mut out = DMatrix::<i64>::zeros(basis.len(), mat.nrows());
    for (i, vector) in basis.iter().enumerate() {
        for (j, value) in vector.iter().enumerate() {
            out[(i, j)] = value.to_i64().ok_or_else(|| {
                AnalysisError::StructuralInconsistency(format!(
                    "conservation law coefficient {} does not fit in 64 bits",
                    value
                ))
            })?;
        }
    }
    Ok((out, echelon.rank()))
}

/// Divide a vector by the gcd of its entries
fn make_primitive(v: &mut [BigInt]) {
    let g = v.iter().fold(BigInt::zero(), |acc, x| acc.gcd(x));
    if g.is_zero() || g.is_one() {
        return;
    }
    v.iter_mut().for_each(|x| *x = &*x / &g);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn product_is_zero(laws: &DMatrix<i64>, mat: &DMatrix<i64>) -> bool {
        (laws * mat).iter().all(|v| *v == 0)
    }

    #[test]
    fn rank_of_dependent_rows() {
        let mat = DMatrix::from_row_slice(3, 3, &[1i64, 2, 3, 2, 4, 6, 0, 1, 1]);
        assert_eq!(rank(&mat), 2);
        assert_eq!(rank(&DMatrix::<i64>::zeros(3, 2)), 0);
        assert_eq!(rank(&DMatrix::<i64>::identity(4, 4)), 4);
    }

    #[test]
    fn reversible_isomerization() {
        // A <-> B
        let net = DMatrix::from_row_slice(2, 2, &[-1i64, 1, 1, -1]);
        let (laws, r) = left_nullspace(&net).unwrap();
        assert_eq!(r, 1);
        assert_eq!(laws, DMatrix::from_row_slice(1, 2, &[1i64, 1]));
    }

    #[test]
    fn primitive_integer_laws() {
        // 2A -> B, B -> 2A gives the law A + 2B
        let net = DMatrix::from_row_slice(2, 2, &[-2i64, 2, 1, -1]);
        let (laws, _) = left_nullspace(&net).unwrap();
        assert_eq!(laws, DMatrix::from_row_slice(1, 2, &[1i64, 2]));
    }

    #[test]
    fn several_laws() {
        // E + S -> C, C -> E + P over species E, S, C, P
        let net = DMatrix::from_row_slice(4, 2, &[-1i64, 1, -1, 0, 1, -1, 0, 1]);
        let (laws, r) = left_nullspace(&net).unwrap();
        assert_eq!(r, 2);
        assert_eq!(laws.nrows(), 2);
        assert!(product_is_zero(&laws, &net));
        assert_eq!(rank(&laws), 2);
    }

    #[test]
    fn no_laws() {
        // ∅ -> A
        let net = DMatrix::from_row_slice(1, 1, &[1i64]);
        let (laws, r) = left_nullspace(&net).unwrap();
        assert_eq!(r, 1);
        assert_eq!(laws.nrows(), 0);
    }

    #[test]
    fn primitive_rows() {
        let mut v = vec![BigInt::from(4), BigInt::from(-6), BigInt::zero()];
        make_primitive(&mut v);
        assert_eq!(v, vec![BigInt::from(2), BigInt::from(-3), BigInt::zero()]);
        // Sign is kept, only the common factor is removed
        let mut v = vec![BigInt::from(-12), BigInt::from(18)];
        make_primitive(&mut v);
        assert_eq!(v, vec![BigInt::from(-2), BigInt::from(3)]);
    }

    #[test]
    fn nullspace_scale_uses_pivot_lcm() {
        // Pivots 2 and 3 need a common multiple to keep the basis integral
        let mat = DMatrix::from_row_slice(2, 3, &[2i64, 0, 1, 0, 3, 1]);
        let basis = Echelon::new(&mat).nullspace();
        assert_eq!(
            basis,
            vec![vec![BigInt::from(3), BigInt::from(2), BigInt::from(-6)]]
        );
    }
}

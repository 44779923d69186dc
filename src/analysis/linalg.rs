//! Dense linear algebra for the small systems of the estimators

/// Row-major square matrix
pub type Matrix = Vec<Vec<f64>>;

const PIVOT_EPSILON: f64 = 1e-12;

/// Inverse by Gauss-Jordan elimination with partial pivoting; `None` when
/// the matrix is singular
#[must_use]
pub fn invert(matrix: &Matrix) -> Option<Matrix> {
    let n = matrix.len();
    let mut a: Matrix = matrix
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut extended = row.clone();
            extended.extend((0..n).map(|j| if i == j { 1.0 } else { 0.0 }));
            extended
        })
        .collect();

    for col in 0..n {
        let pivot = (col..n).max_by(|&x, &y| a[x][col].abs().total_cmp(&a[y][col].abs()))?;
        if a[pivot][col].abs() < PIVOT_EPSILON {
            return None;
        }
        a.swap(col, pivot);

        let scale = a[col][col];
        for value in &mut a[col] {
            *value /= scale;
        }
        let pivot_row = a[col].clone();
        for (r, row) in a.iter_mut().enumerate() {
            let factor = row[col];
            if r == col || factor == 0.0 {
                continue;
            }
            for (value, p) in row.iter_mut().zip(&pivot_row) {
                *value -= factor * p;
            }
        }
    }

    Some(a.into_iter().map(|row| row[n..].to_vec()).collect())
}

/// `A * B`
#[must_use]
pub fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
    let inner = b.len();
    let cols = b.first().map_or(0, Vec::len);
    a.iter()
        .map(|row| {
            (0..cols)
                .map(|j| (0..inner).map(|k| row[k] * b[k][j]).sum())
                .collect()
        })
        .collect()
}

/// `A'`
#[must_use]
pub fn transpose(a: &Matrix) -> Matrix {
    let cols = a.first().map_or(0, Vec::len);
    (0..cols).map(|j| a.iter().map(|row| row[j]).collect()).collect()
}

/// `A * v`
#[must_use]
pub fn apply(a: &Matrix, v: &[f64]) -> Vec<f64> {
    a.iter()
        .map(|row| row.iter().zip(v).map(|(x, y)| x * y).sum())
        .collect()
}

//! Host side post-processing that turns an ascending eigendecomposition into an SVD-like one.

/// Reverses the column order of a column major matrix with `rows` rows
pub fn reverse_columns(data: &mut [f64], rows: usize) {
    if rows == 0 {
        return;
    }
    let cols = data.len() / rows;
    for j in 0..cols / 2 {
        let (left, right) = data.split_at_mut((cols - 1 - j) * rows);
        left[j * rows..(j + 1) * rows].swap_with_slice(&mut right[..rows]);
    }
}

/// `v = sqrt(max(v, 0))`
pub fn sqrt_non_negative(values: &mut [f64]) {
    for v in values {
        *v = v.max(0.0).sqrt();
    }
}

/// Negates every column whose largest magnitude entry is negative.
/// On ties the first such entry decides.
pub fn sign_flip(data: &mut [f64], rows: usize) {
    if rows == 0 {
        return;
    }
    for col in data.chunks_exact_mut(rows) {
        let mut max = 0;
        for (i, v) in col.iter().enumerate() {
            if v.abs() > col[max].abs() {
                max = i;
            }
        }
        if col[max] < 0.0 {
            col.iter_mut().for_each(|v| *v = -*v);
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{reverse_columns, sign_flip, sqrt_non_negative};

    #[test]
    fn reverse() {
        let mut data = [1., 2., 3., 4., 5., 6.];
        reverse_columns(&mut data, 2);
        assert_eq!(data, [5., 6., 3., 4., 1., 2.]);

        let mut data = [1., 2., 3., 4.];
        reverse_columns(&mut data, 1);
        assert_eq!(data, [4., 3., 2., 1.]);
    }

    #[test]
    fn sqrt_clamps() {
        let mut s = [4., -1e-12, 0., 2.25];
        sqrt_non_negative(&mut s);
        assert_eq!(s, [2., 0., 0., 1.5]);
    }

    #[test]
    fn flip() {
        let mut data = [1., -3., 2., 0.5, 4., -1.];
        sign_flip(&mut data, 3);
        assert_eq!(data, [-1., 3., -2., 0.5, 4., -1.]);
    }

    #[test]
    fn flip_tie_uses_first() {
        let mut data = [-2., 2.];
        sign_flip(&mut data, 2);
        assert_eq!(data, [2., -2.]);

        let mut data = [2., -2.];
        sign_flip(&mut data, 2);
        assert_eq!(data, [2., -2.]);
    }

    proptest! {
        #[test]
        fn flipped_columns_lead_non_negative(
            rows in 1usize..6,
            data in prop::collection::vec(-10.0f64..10.0, 0..36),
        ) {
            let mut data = data;
            data.truncate(data.len() / rows * rows);
            let before = data.clone();
            sign_flip(&mut data, rows);

            for (col, orig) in data.chunks(rows).zip(before.chunks(rows)) {
                let max = col.iter().fold(0.0f64, |m, v| m.max(v.abs()));
                let first = col.iter().find(|v| v.abs() == max).unwrap();
                prop_assert!(*first >= 0.0);
                // only whole columns are negated
                let same = col == orig;
                let negated = col.iter().zip(orig).all(|(a, b)| *a == -*b);
                prop_assert!(same || negated);
            }
        }

        #[test]
        fn reverse_twice_is_identity(
            rows in 1usize..6,
            data in prop::collection::vec(-10.0f64..10.0, 0..36),
        ) {
            let mut data = data;
            data.truncate(data.len() / rows * rows);
            let before = data.clone();
            reverse_columns(&mut data, rows);
            reverse_columns(&mut data, rows);
            prop_assert_eq!(data, before);
        }
    }
}

//! In-place radix-2 FFT kernel.

use num_complex::Complex64;
use std::f64::consts::PI;

/// Computes the in-place FFT of a power-of-two length buffer.
///
/// Iterative Cooley-Tukey: bit-reversal permutation followed by
/// log2(n) butterfly passes. The caller guarantees the length is a
/// power of two; lengths <= 1 are left untouched.
pub fn fft_in_place(x: &mut [Complex64]) {
    let n = x.len();
    if n <= 1 {
        return;
    }

    // Bit-reversal permutation.
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j &= !bit;
            bit >>= 1;
        }
        j |= bit;
        if i < j {
            x.swap(i, j);
        }
    }

    let mut size = 2;
    while size <= n {
        let angle = -2.0 * PI / size as f64;
        let wlen = Complex64::new(angle.cos(), angle.sin());
        let mut block = 0;
        while block < n {
            let mut w = Complex64::new(1.0, 0.0);
            for k in 0..size / 2 {
                let u = x[block + k];
                let v = w * x[block + k + size / 2];
                x[block + k] = u + v;
                x[block + k + size / 2] = u - v;
                w *= wlen;
            }
            block += size;
        }
        size <<= 1;
    }
}

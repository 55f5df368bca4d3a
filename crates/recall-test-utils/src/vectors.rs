// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hand-built vectors with exactly known cosine similarities.

/// Unit vector along axis `i`.
pub fn axis(dimensions: usize, i: usize) -> Vec<f32> {
    let mut v = vec![0.0; dimensions];
    v[i] = 1.0;
    v
}

/// Unit vector whose cosine with `axis(dimensions, i)` is exactly `cosine`.
///
/// The remainder of the length lies along axis `j`, so two blends built on
/// different `j` axes only share their `i` component.
pub fn blend(dimensions: usize, i: usize, j: usize, cosine: f32) -> Vec<f32> {
    let mut v = vec![0.0; dimensions];
    v[i] = cosine;
    v[j] = (1.0 - cosine * cosine).max(0.0).sqrt();
    v
}

/// Dot product over the shared prefix of two vectors.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub fn magnitude(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

/// Cosine similarity in [-1, 1]. Zero-length or zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (ma, mb) = (magnitude(a), magnitude(b));
    if ma == 0.0 || mb == 0.0 {
        return 0.0;
    }
    dot(a, b) / (ma * mb)
}

/// Scales `v` to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let m = magnitude(v);
    if m > 0.0 {
        v.iter_mut().for_each(|x| *x /= m);
    }
}

/// Converts a raw similarity into a 0–100 percentage with two decimals.
pub fn format_score(score: f32) -> f64 {
    let clamped = (score as f64).clamp(0.0, 1.0);
    round_to(clamped * 100.0, 2)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

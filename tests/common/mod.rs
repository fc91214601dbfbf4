//! Common test utilities
#![allow(dead_code)]

use tensr::tensor::TensorData;

/// Initialize test logging; repeated calls are no-ops
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Build an f32 dense tensor, panicking on length mismatch
pub fn tensor_f32(data: &[f32], shape: &[usize]) -> TensorData<f32> {
    TensorData::from_vec(data.to_vec(), shape).expect("test tensor construction")
}

/// Build an f64 dense tensor, panicking on length mismatch
pub fn tensor_f64(data: &[f64], shape: &[usize]) -> TensorData<f64> {
    TensorData::from_vec(data.to_vec(), shape).expect("test tensor construction")
}

/// 0..n as f32
pub fn iota_f32(n: usize) -> Vec<f32> {
    (0..n).map(|i| i as f32).collect()
}

/// Assert two f64 slices are close within tolerance
///
/// Uses the formula: |a - b| <= atol + rtol * |b|
pub fn assert_allclose_f64(a: &[f64], b: &[f64], rtol: f64, atol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

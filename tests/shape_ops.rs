//! Shape manipulation through the reference provider

mod common;

use common::{iota_f32, tensor_f32};
use tensr::error::ErrorKind;
use tensr::ops::{NaiveOps, TensorOps};

#[test]
fn test_reshape_with_inferred_dimension() {
    let ops = NaiveOps::new();
    let t = tensor_f32(&iota_f32(12), &[12]);

    let r = ops.reshape(&t, &[3, -1]).unwrap();
    assert_eq!(r.shape().as_slice(), &[3, 4]);
    // Row-major order is preserved
    assert_eq!(r.get(&[2, 3]).unwrap(), 11.0);
}

#[test]
fn test_reshape_volume_mismatch_rejected() {
    let ops = NaiveOps::new();
    let t = tensor_f32(&iota_f32(12), &[12]);
    let err = ops.reshape(&t, &[2, 4]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_reshape_double_inference_rejected() {
    let ops = NaiveOps::new();
    let t = tensor_f32(&iota_f32(12), &[12]);
    let err = ops.reshape(&t, &[-1, -1]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(err.to_string().contains("one inferred dimension"));
}

#[test]
fn test_transpose_round_trip() {
    let ops = NaiveOps::new();
    let t = tensor_f32(&iota_f32(6), &[2, 3]);

    let swapped = ops.transpose(&t, 0, 1).unwrap();
    assert_eq!(swapped.shape().as_slice(), &[3, 2]);
    assert_eq!(swapped.get(&[2, 1]).unwrap(), t.get(&[1, 2]).unwrap());

    let back = ops.transpose(&swapped, -2, -1).unwrap();
    assert_eq!(back.to_vec().unwrap(), t.to_vec().unwrap());
}

#[test]
fn test_transpose_aliases_parent() {
    let ops = NaiveOps::new();
    let t = tensor_f32(&iota_f32(4), &[2, 2]);
    let swapped = ops.transpose(&t, 0, 1).unwrap();

    // Transposed result is a view over the same buffer
    t.set(&[0, 1], 50.0).unwrap();
    assert_eq!(swapped.get(&[1, 0]).unwrap(), 50.0);
}

#[test]
fn test_flatten_and_squeeze() {
    let ops = NaiveOps::new();
    let t = tensor_f32(&iota_f32(6), &[1, 2, 3]);

    let flat = ops.flatten(&t).unwrap();
    assert_eq!(flat.shape().as_slice(), &[6]);

    let squeezed = ops.squeeze(&t, None).unwrap();
    assert_eq!(squeezed.shape().as_slice(), &[2, 3]);

    // Squeezing a non-unit dimension leaves the shape alone
    let same = ops.squeeze(&t, Some(1)).unwrap();
    assert_eq!(same.shape().as_slice(), &[1, 2, 3]);
}

#[test]
fn test_unsqueeze_positions() {
    let ops = NaiveOps::new();
    let t = tensor_f32(&iota_f32(3), &[3]);

    assert_eq!(ops.unsqueeze(&t, 0).unwrap().shape().as_slice(), &[1, 3]);
    assert_eq!(ops.unsqueeze(&t, 1).unwrap().shape().as_slice(), &[3, 1]);
    assert_eq!(ops.unsqueeze(&t, -1).unwrap().shape().as_slice(), &[3, 1]);
    assert!(ops.unsqueeze(&t, 3).is_err());
}

#[test]
fn test_concat_then_split_round_trip() {
    let ops = NaiveOps::new();
    let a = tensor_f32(&iota_f32(6), &[2, 3]);
    let b = tensor_f32(&[10.0, 11.0, 12.0], &[1, 3]);

    let joined = ops.concat(&[&a, &b], 0).unwrap();
    assert_eq!(joined.shape().as_slice(), &[3, 3]);

    let parts = ops.split(&joined, &[2, 1], 0).unwrap();
    assert_eq!(parts[0].to_vec().unwrap(), a.to_vec().unwrap());
    assert_eq!(parts[1].to_vec().unwrap(), b.to_vec().unwrap());
}

#[test]
fn test_concat_shape_mismatch_rejected() {
    let ops = NaiveOps::new();
    let a = tensor_f32(&iota_f32(6), &[2, 3]);
    let b = tensor_f32(&iota_f32(4), &[2, 2]);
    let err = ops.concat(&[&a, &b], 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_split_chunks_alias_source() {
    let ops = NaiveOps::new();
    let t = tensor_f32(&iota_f32(4), &[4]);
    let parts = ops.split(&t, &[2, 2], 0).unwrap();

    t.set(&[3], 99.0).unwrap();
    assert_eq!(parts[1].get(&[1]).unwrap(), 99.0);
}

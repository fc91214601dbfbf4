//! View, slice, and broadcast behavior through the public surface

mod common;

use common::{iota_f32, tensor_f32};
use tensr::error::ErrorKind;
use tensr::tensor::{Slice, TensorData};

#[test]
fn test_slice_range_is_zero_copy_window() {
    let t = tensor_f32(&iota_f32(12), &[3, 4]);
    let v = t.slice(&[Slice::range(1, 3), Slice::range(0, 2)]).unwrap();

    assert_eq!(v.shape().as_slice(), &[2, 2]);
    assert_eq!(v.to_vec().unwrap(), vec![4.0, 5.0, 8.0, 9.0]);

    // Writes through the view land in the parent
    v.set(&[0, 0], 40.0).unwrap();
    assert_eq!(t.get(&[1, 0]).unwrap(), 40.0);
}

#[test]
fn test_slice_at_reduces_rank() {
    let t = tensor_f32(&iota_f32(12), &[3, 4]);
    let row = t.slice(&[Slice::at(1), Slice::all()]).unwrap();
    assert_eq!(row.shape().as_slice(), &[4]);
    assert_eq!(row.to_vec().unwrap(), vec![4.0, 5.0, 6.0, 7.0]);

    let scalar = t.slice(&[Slice::at(2), Slice::at(3)]).unwrap();
    assert!(scalar.shape().is_scalar());
    assert_eq!(scalar.get(&[]).unwrap(), 11.0);
}

#[test]
fn test_slice_negative_indices_resolve_python_style() {
    let t = tensor_f32(&iota_f32(8), &[8]);
    let last = t.slice(&[Slice::at(-1)]).unwrap();
    assert_eq!(last.get(&[]).unwrap(), 7.0);

    let tail = t.slice(&[Slice::range(-3, 8)]).unwrap();
    assert_eq!(tail.to_vec().unwrap(), vec![5.0, 6.0, 7.0]);
}

#[test]
fn test_slice_step_skips_elements() {
    let t = tensor_f32(&iota_f32(10), &[10]);
    let v = t.slice(&[Slice::step(0, 10, 3)]).unwrap();
    assert_eq!(v.shape().as_slice(), &[4]);
    assert_eq!(v.to_vec().unwrap(), vec![0.0, 3.0, 6.0, 9.0]);
    assert!(!v.is_contiguous());
}

#[test]
fn test_slice_negative_step_reverses_dimension() {
    let t = tensor_f32(&iota_f32(4), &[4]);
    let v = t.slice(&[Slice::step(3, -5, -1)]).unwrap();
    assert_eq!(v.shape().as_slice(), &[4]);
    assert_eq!(v.to_vec().unwrap(), vec![3.0, 2.0, 1.0, 0.0]);
    assert!(!v.is_contiguous());

    // Writes through the reversed view land at the mirrored position
    v.set(&[0], 30.0).unwrap();
    assert_eq!(t.get(&[3]).unwrap(), 30.0);
}

#[test]
fn test_slice_negative_step_strided() {
    let t = tensor_f32(&iota_f32(12), &[3, 4]);

    // Reverse the rows, keep the columns
    let rows = t.slice(&[Slice::step(-1, -4, -1), Slice::all()]).unwrap();
    assert_eq!(rows.shape().as_slice(), &[3, 4]);
    assert_eq!(
        rows.to_vec().unwrap(),
        vec![8.0, 9.0, 10.0, 11.0, 4.0, 5.0, 6.0, 7.0, 0.0, 1.0, 2.0, 3.0]
    );

    // Every other element of one row, descending
    let r = t.slice(&[Slice::at(1), Slice::step(3, -5, -2)]).unwrap();
    assert_eq!(r.to_vec().unwrap(), vec![7.0, 5.0]);
}

#[test]
fn test_slice_invalid_descriptors_rejected() {
    let t = tensor_f32(&iota_f32(6), &[6]);

    // start > end
    let err = t.slice(&[Slice::range(4, 2)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    // At past the dimension
    let err = t.slice(&[Slice::at(6)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    // zero step
    let err = t.slice(&[Slice::step(0, 6, 0)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    // wrong descriptor count for rank
    let t2 = tensor_f32(&iota_f32(6), &[2, 3]);
    let err = t2.slice(&[Slice::all()]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_chained_slices_match_combined_slice() {
    let t = tensor_f32(&iota_f32(36), &[6, 6]);
    let a = t.slice(&[Slice::range(1, 5), Slice::step(0, 6, 2)]).unwrap();
    let b = a.slice(&[Slice::range(1, 3), Slice::range(1, 3)]).unwrap();

    let combined = t.slice(&[Slice::range(2, 4), Slice::step(2, 6, 2)]).unwrap();
    assert_eq!(b.shape().as_slice(), combined.shape().as_slice());
    assert_eq!(b.to_vec().unwrap(), combined.to_vec().unwrap());
}

#[test]
fn test_materialize_detaches_from_parent() {
    let t = tensor_f32(&iota_f32(6), &[2, 3]);
    let v = t.slice(&[Slice::all(), Slice::range(1, 3)]).unwrap();

    let m = v.materialize().unwrap();
    assert_eq!(m.to_vec(), vec![1.0, 2.0, 4.0, 5.0]);

    t.set(&[0, 1], 99.0).unwrap();
    assert_eq!(m.to_vec(), vec![1.0, 2.0, 4.0, 5.0]);
    // but the live view still aliases
    assert_eq!(v.get(&[0, 0]).unwrap(), 99.0);
}

#[test]
fn test_view_keeps_parent_buffer_alive() {
    let v = {
        let t = tensor_f32(&iota_f32(5), &[5]);
        t.slice(&[Slice::range(1, 4)]).unwrap()
    };
    // Parent handle dropped; the shared buffer survives through the view
    assert_eq!(v.to_vec().unwrap(), vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_broadcast_reads_repeat_source() {
    let src = tensor_f32(&[1.0, 2.0, 3.0], &[1, 3]);
    let b = src.broadcast_to([4, 3]).unwrap();

    assert_eq!(b.shape().as_slice(), &[4, 3]);
    for row in 0..4 {
        assert_eq!(b.get(&[row, 2]).unwrap(), 3.0);
    }
    assert_eq!(
        b.materialize().unwrap().to_vec(),
        vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0, 2.0, 3.0]
    );
}

#[test]
fn test_broadcast_write_and_bad_target_rejected() {
    let src = TensorData::<f32>::ones([2]);
    let err = src.clone().broadcast_to([3, 3]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let b = src.broadcast_to([3, 2]).unwrap();
    let err = b.set(&[0, 0], 1.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
}

#[test]
fn test_broadcast_slice_materializes_first() {
    let src = tensor_f32(&[1.0, 2.0], &[2]);
    let b = src.broadcast_to([3, 2]).unwrap();

    let v = b.slice(&[Slice::range(1, 3), Slice::all()]).unwrap();
    assert_eq!(v.shape().as_slice(), &[2, 2]);
    assert_eq!(v.to_vec().unwrap(), vec![1.0, 2.0, 1.0, 2.0]);
}

#[test]
fn test_copy_to_linearizes_strided_view() {
    let t = tensor_f32(&iota_f32(9), &[3, 3]);
    let v = t.slice(&[Slice::step(0, 3, 2), Slice::step(0, 3, 2)]).unwrap();

    let mut dest = vec![0.0f32; 4];
    v.copy_to(&mut dest, 0).unwrap();
    assert_eq!(dest, vec![0.0, 2.0, 6.0, 8.0]);
}

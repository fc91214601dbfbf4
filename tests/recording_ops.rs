//! End-to-end recording workflow: eager results plus graph structure

mod common;

use common::{assert_allclose_f64, init_logging, tensor_f64};
use tensr::error::ErrorKind;
use tensr::exec::{ExecutionContext, ExecutionMode, GraphTensorOps};
use tensr::ops::NaiveOps;
use tensr::tensor::TensorData;

fn ops() -> GraphTensorOps<NaiveOps> {
    GraphTensorOps::new(NaiveOps::new())
}

#[test]
fn test_recorded_add_computes_and_records_one_node() {
    init_logging();
    let ops = ops();
    let mut ctx = ExecutionContext::new();
    let a = TensorData::<f64>::ones([1]);
    let b = TensorData::<f64>::ones([1]);

    ctx.start_recording().unwrap();
    let c = ops.add(&mut ctx, &a, &b).unwrap();
    let graph = ctx.stop_recording().unwrap();

    assert_eq!(c.to_vec().unwrap(), vec![2.0]);
    assert_eq!(graph.node_count(), 1);

    let node = &graph.nodes()[0];
    assert!(node.id.starts_with("add_"));
    assert_eq!(node.operation.name, "add");
    assert_eq!(node.inputs.len(), 2);
    assert_eq!(node.outputs.len(), 1);
}

#[test]
fn test_graph_mode_without_recording_stays_silent() {
    let ops = ops();
    let mut ctx = ExecutionContext::new();
    ctx.switch_to_graph();
    assert_eq!(ctx.mode(), ExecutionMode::Graph);

    let a = TensorData::<f64>::ones([2, 2]);
    let b = TensorData::<f64>::ones([2, 2]);
    let c = ops.matmul(&mut ctx, &a, &b).unwrap();

    // Result is computed eagerly, graph untouched
    assert_eq!(c.to_vec().unwrap(), vec![2.0; 4]);
    assert_eq!(ctx.graph().node_count(), 0);
}

#[test]
fn test_pipeline_records_connected_dag() {
    init_logging();
    let ops = ops();
    let mut ctx = ExecutionContext::new();
    let x = tensor_f64(&[-1.0, 0.5, 2.0, -0.5], &[2, 2]);
    let w = tensor_f64(&[1.0, 0.0, 0.0, 1.0], &[2, 2]);

    ctx.start_recording().unwrap();
    let h = ops.matmul(&mut ctx, &x, &w).unwrap();
    let h = ops.relu(&mut ctx, &h).unwrap();
    let y = ops.softmax(&mut ctx, &h, -1).unwrap();
    let graph = ctx.stop_recording().unwrap();

    // Every softmax row sums to 1
    let rows = y.to_vec().unwrap();
    assert_allclose_f64(
        &[rows[0] + rows[1], rows[2] + rows[3]],
        &[1.0, 1.0],
        1e-12,
        1e-12,
        "softmax rows",
    );

    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 2);
    assert!(graph.validate().is_valid());

    let order: Vec<&str> = graph
        .topological_order()
        .unwrap()
        .iter()
        .map(|n| n.operation.name.as_str())
        .collect();
    assert_eq!(order, ["matmul", "relu", "softmax"]);
}

#[test]
fn test_recorded_specs_carry_shapes() {
    let ops = ops();
    let mut ctx = ExecutionContext::new();
    let a = TensorData::<f64>::ones([3, 4]);

    ctx.start_recording().unwrap();
    let _ = ops.sum(&mut ctx, &a, Some(0)).unwrap();
    let graph = ctx.stop_recording().unwrap();

    let node = &graph.nodes()[0];
    assert_eq!(node.inputs[0].shape.as_slice(), &[3, 4]);
    assert_eq!(node.outputs[0].shape.as_slice(), &[4]);
    assert_eq!(node.operation.params.get("dim").map(String::as_str), Some("0"));
}

#[test]
fn test_reductions_match_expected_values() {
    let ops = ops();
    let mut ctx = ExecutionContext::new();
    let t = tensor_f64(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);

    let total = ops.sum(&mut ctx, &t, None).unwrap();
    assert_eq!(total.get(&[]).unwrap(), 21.0);

    let means = ops.mean(&mut ctx, &t, Some(1)).unwrap();
    assert_allclose_f64(&means.to_vec().unwrap(), &[2.0, 5.0], 1e-12, 1e-12, "mean");

    let vars = ops.variance(&mut ctx, &t, Some(1)).unwrap();
    assert_allclose_f64(
        &vars.to_vec().unwrap(),
        &[2.0 / 3.0, 2.0 / 3.0],
        1e-12,
        1e-12,
        "variance",
    );
}

#[test]
fn test_bracket_misuse_is_invalid_state() {
    let mut ctx = ExecutionContext::new();

    let err = ctx.stop_recording().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    ctx.start_recording().unwrap();
    let err = ctx.start_recording().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    // Recovery: the open bracket still closes cleanly
    assert!(ctx.stop_recording().is_ok());
}

#[test]
fn test_failed_operation_records_nothing() {
    let ops = ops();
    let mut ctx = ExecutionContext::new();
    let a = TensorData::<f64>::ones([2, 3]);
    let b = TensorData::<f64>::ones([4, 5]);

    ctx.start_recording().unwrap();
    assert!(ops.matmul(&mut ctx, &a, &b).is_err());
    let graph = ctx.stop_recording().unwrap();
    assert!(graph.is_empty());
}

#[test]
fn test_consecutive_brackets_are_independent() {
    let ops = ops();
    let mut ctx = ExecutionContext::new();
    let a = TensorData::<f64>::ones([2]);

    ctx.start_recording().unwrap();
    let _ = ops.relu(&mut ctx, &a).unwrap();
    let first = ctx.stop_recording().unwrap();
    assert_eq!(first.node_count(), 1);

    ctx.start_recording().unwrap();
    let _ = ops.sigmoid(&mut ctx, &a).unwrap();
    let _ = ops.sqrt(&mut ctx, &a).unwrap();
    let second = ctx.stop_recording().unwrap();

    assert_eq!(second.node_count(), 2);
    assert!(second.nodes().iter().all(|n| !n.id.starts_with("relu_")));
}

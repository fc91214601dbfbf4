//! Naive loop-based reference provider
//!
//! `NaiveOps` computes every operation with plain index loops over the
//! logical index space. It exists so the recording layer, tests, and demos
//! have a concrete base provider to wrap; a real deployment substitutes an
//! optimized engine behind the same `TensorOps` trait.

use super::TensorOps;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::tensor::{
    broadcast_shapes, DenseData, IndexIter, Shape, Slice, Strides, TensorData, ViewData,
};

/// Reference `TensorOps` provider
#[derive(Debug, Default, Clone, Copy)]
pub struct NaiveOps;

impl NaiveOps {
    /// Create a reference provider
    pub fn new() -> Self {
        Self
    }
}

/// Element-wise map into a fresh Dense tensor of the same shape
fn map_elementwise<T: Element>(
    a: &TensorData<T>,
    f: impl Fn(T) -> T,
) -> Result<TensorData<T>> {
    let data = a.to_vec()?;
    let mapped = data.into_iter().map(f).collect();
    TensorData::from_vec(mapped, a.shape().clone())
}

/// Broadcasting element-wise combination of two operands
fn zip_elementwise<T: Element>(
    a: &TensorData<T>,
    b: &TensorData<T>,
    f: impl Fn(T, T) -> T,
) -> Result<TensorData<T>> {
    let out_shape = broadcast_shapes(a.shape(), b.shape())
        .ok_or_else(|| Error::broadcast(a.shape().as_slice(), b.shape().as_slice()))?;

    let lhs = expand(a, &out_shape)?;
    let rhs = expand(b, &out_shape)?;

    let mut data = Vec::with_capacity(out_shape.volume());
    for indices in IndexIter::new(&out_shape) {
        data.push(f(lhs.get(&indices)?, rhs.get(&indices)?));
    }
    TensorData::from_vec(data, out_shape)
}

fn expand<T: Element>(t: &TensorData<T>, target: &Shape) -> Result<TensorData<T>> {
    if t.shape() == target {
        Ok(t.clone())
    } else {
        t.clone().broadcast_to(target.clone())
    }
}

/// Rebuild a full index tuple from a reduced (dimension-removed) one
fn splice_index(outer: &[usize], dim: usize, k: usize) -> Vec<usize> {
    let mut indices = Vec::with_capacity(outer.len() + 1);
    indices.extend_from_slice(&outer[..dim]);
    indices.push(k);
    indices.extend_from_slice(&outer[dim..]);
    indices
}

fn reduced_shape(shape: &Shape, dim: usize) -> Shape {
    shape
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != dim)
        .map(|(_, &d)| d)
        .collect()
}

/// Reduce one lane at a time along `dim`, or the whole tensor when `dim` is
/// `None`. `f` folds a lane of f64 values into one f64.
fn reduce_lanes<T: Element>(
    a: &TensorData<T>,
    dim: Option<isize>,
    f: impl Fn(&[f64]) -> f64,
) -> Result<TensorData<T>> {
    match dim {
        None => {
            let lane: Vec<f64> = a.to_vec()?.into_iter().map(Element::to_f64).collect();
            let value = T::from_f64(f(&lane));
            Ok(TensorData::Dense(DenseData::from_vec(
                vec![value],
                Shape::scalar(),
            )?))
        }
        Some(d) => {
            let dim = a.shape().normalize_dim(d)?;
            let dim_size = a.shape()[dim];
            let out_shape = reduced_shape(a.shape(), dim);

            let mut data = Vec::with_capacity(out_shape.volume());
            for outer in IndexIter::new(&out_shape) {
                let mut lane = Vec::with_capacity(dim_size);
                for k in 0..dim_size {
                    lane.push(a.get(&splice_index(&outer, dim, k))?.to_f64());
                }
                data.push(T::from_f64(f(&lane)));
            }
            TensorData::from_vec(data, out_shape)
        }
    }
}

fn lane_mean(lane: &[f64]) -> f64 {
    lane.iter().sum::<f64>() / lane.len() as f64
}

impl<T: Element> TensorOps<T> for NaiveOps {
    // ===== Element-wise Binary Operations =====

    fn add(&self, a: &TensorData<T>, b: &TensorData<T>) -> Result<TensorData<T>> {
        zip_elementwise(a, b, |x, y| x + y)
    }

    fn sub(&self, a: &TensorData<T>, b: &TensorData<T>) -> Result<TensorData<T>> {
        zip_elementwise(a, b, |x, y| x - y)
    }

    fn mul(&self, a: &TensorData<T>, b: &TensorData<T>) -> Result<TensorData<T>> {
        zip_elementwise(a, b, |x, y| x * y)
    }

    fn div(&self, a: &TensorData<T>, b: &TensorData<T>) -> Result<TensorData<T>> {
        zip_elementwise(a, b, |x, y| x / y)
    }

    // ===== Matrix Multiplication =====

    fn matmul(&self, a: &TensorData<T>, b: &TensorData<T>) -> Result<TensorData<T>> {
        if a.rank() != 2 || b.rank() != 2 {
            return Err(Error::invalid_argument(
                "a",
                format!("matmul expects 2-D operands, got ranks {} and {}", a.rank(), b.rank()),
            ));
        }
        let (m, k) = (a.shape()[0], a.shape()[1]);
        let (k2, n) = (b.shape()[0], b.shape()[1]);
        if k != k2 {
            return Err(Error::shape_mismatch(a.shape().as_slice(), b.shape().as_slice()));
        }

        let mut data = Vec::with_capacity(m * n);
        for i in 0..m {
            for j in 0..n {
                let mut acc = 0.0f64;
                for p in 0..k {
                    acc += a.get(&[i, p])?.to_f64() * b.get(&[p, j])?.to_f64();
                }
                data.push(T::from_f64(acc));
            }
        }
        TensorData::from_vec(data, [m, n])
    }

    // ===== Shape / View Operations =====

    fn transpose(&self, a: &TensorData<T>, dim0: isize, dim1: isize) -> Result<TensorData<T>> {
        let d0 = a.shape().normalize_dim(dim0)?;
        let d1 = a.shape().normalize_dim(dim1)?;

        // Zero-copy where the operand has backing storage
        let (storage, shape, strides, offset, parent_shape) = match a {
            TensorData::Dense(d) => (
                d.storage().clone(),
                d.shape().clone(),
                d.shape().contiguous_strides(),
                0,
                d.shape().clone(),
            ),
            TensorData::View(v) => (
                v.storage().clone(),
                v.shape().clone(),
                v.strides().clone(),
                v.offset(),
                v.parent_shape().clone(),
            ),
            TensorData::Broadcast(_) => {
                let dense = a.materialize()?;
                return self.transpose(&TensorData::Dense(dense), dim0, dim1);
            }
        };

        let mut new_shape: Vec<usize> = shape.to_vec();
        let mut new_strides: Vec<isize> = strides.to_vec();
        new_shape.swap(d0, d1);
        new_strides.swap(d0, d1);

        let view = ViewData::new(
            storage,
            Shape::from(new_shape),
            Strides::from(new_strides),
            offset,
            parent_shape,
        )?;
        Ok(TensorData::View(view))
    }

    fn reshape(&self, a: &TensorData<T>, shape: &[isize]) -> Result<TensorData<T>> {
        let new_shape = a.shape().infer_reshape(shape)?;
        let data = a.to_vec()?;
        TensorData::from_vec(data, new_shape)
    }

    fn flatten(&self, a: &TensorData<T>) -> Result<TensorData<T>> {
        let volume = a.volume() as isize;
        self.reshape(a, &[volume])
    }

    fn squeeze(&self, a: &TensorData<T>, dim: Option<isize>) -> Result<TensorData<T>> {
        let new_shape: Shape = match dim {
            Some(d) => {
                let idx = a.shape().normalize_dim(d)?;
                if a.shape()[idx] == 1 {
                    reduced_shape(a.shape(), idx)
                } else {
                    a.shape().clone()
                }
            }
            None => a.shape().iter().copied().filter(|&d| d != 1).collect(),
        };
        let data = a.to_vec()?;
        TensorData::from_vec(data, new_shape)
    }

    fn unsqueeze(&self, a: &TensorData<T>, dim: isize) -> Result<TensorData<T>> {
        let rank = a.rank() as isize;
        let idx = if dim < 0 { rank + dim + 1 } else { dim };
        if idx < 0 || idx > rank {
            return Err(Error::invalid_argument(
                "dim",
                format!("insert position {} out of range for rank {}", dim, rank),
            ));
        }

        let mut new_shape: Vec<usize> = a.shape().to_vec();
        new_shape.insert(idx as usize, 1);
        let data = a.to_vec()?;
        TensorData::from_vec(data, new_shape)
    }

    fn concat(&self, tensors: &[&TensorData<T>], dim: isize) -> Result<TensorData<T>> {
        let first = tensors
            .first()
            .ok_or_else(|| Error::invalid_argument("tensors", "concat of zero tensors"))?;
        let dim = first.shape().normalize_dim(dim)?;

        let mut out_dim = 0usize;
        for t in tensors {
            if t.rank() != first.rank() {
                return Err(Error::shape_mismatch(
                    first.shape().as_slice(),
                    t.shape().as_slice(),
                ));
            }
            for (i, (&a, &b)) in first.shape().iter().zip(t.shape().iter()).enumerate() {
                if i != dim && a != b {
                    return Err(Error::shape_mismatch(
                        first.shape().as_slice(),
                        t.shape().as_slice(),
                    ));
                }
            }
            out_dim += t.shape()[dim];
        }

        let mut out_shape: Vec<usize> = first.shape().to_vec();
        out_shape[dim] = out_dim;
        let out = DenseData::zeros(out_shape);

        let mut base = 0usize;
        for t in tensors {
            for indices in IndexIter::new(t.shape()) {
                let mut out_indices = indices.to_vec();
                out_indices[dim] += base;
                out.set(&out_indices, t.get(&indices)?)?;
            }
            base += t.shape()[dim];
        }
        Ok(TensorData::Dense(out))
    }

    fn split(
        &self,
        a: &TensorData<T>,
        sizes: &[usize],
        dim: isize,
    ) -> Result<Vec<TensorData<T>>> {
        let dim = a.shape().normalize_dim(dim)?;
        let total: usize = sizes.iter().sum();
        if total != a.shape()[dim] {
            return Err(Error::invalid_argument(
                "sizes",
                format!(
                    "split sizes sum to {}, dimension {} has size {}",
                    total,
                    dim,
                    a.shape()[dim]
                ),
            ));
        }

        let mut chunks = Vec::with_capacity(sizes.len());
        let mut start = 0usize;
        for &size in sizes {
            let slices: Vec<Slice> = (0..a.rank())
                .map(|i| {
                    if i == dim {
                        Slice::range(start as isize, (start + size) as isize)
                    } else {
                        Slice::all()
                    }
                })
                .collect();
            chunks.push(a.slice(&slices)?);
            start += size;
        }
        Ok(chunks)
    }

    // ===== Activations =====

    fn relu(&self, a: &TensorData<T>) -> Result<TensorData<T>> {
        map_elementwise(a, |x| if x > T::zero() { x } else { T::zero() })
    }

    fn sigmoid(&self, a: &TensorData<T>) -> Result<TensorData<T>> {
        map_elementwise(a, |x| T::from_f64(1.0 / (1.0 + (-x.to_f64()).exp())))
    }

    fn softmax(&self, a: &TensorData<T>, dim: isize) -> Result<TensorData<T>> {
        let dim = a.shape().normalize_dim(dim)?;
        let dim_size = a.shape()[dim];
        let outer_shape = reduced_shape(a.shape(), dim);

        let out = DenseData::zeros(a.shape().clone());
        for outer in IndexIter::new(&outer_shape) {
            let mut lane = Vec::with_capacity(dim_size);
            for k in 0..dim_size {
                lane.push(a.get(&splice_index(&outer, dim, k))?.to_f64());
            }
            let max = lane.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let exps: Vec<f64> = lane.iter().map(|&v| (v - max).exp()).collect();
            let total: f64 = exps.iter().sum();
            for (k, &e) in exps.iter().enumerate() {
                out.set(&splice_index(&outer, dim, k), T::from_f64(e / total))?;
            }
        }
        Ok(TensorData::Dense(out))
    }

    // ===== Spatial Operations =====

    fn conv2d(
        &self,
        input: &TensorData<T>,
        kernel: &TensorData<T>,
        stride: (usize, usize),
        padding: (usize, usize),
    ) -> Result<TensorData<T>> {
        if input.rank() != 4 || kernel.rank() != 4 {
            return Err(Error::invalid_argument(
                "input",
                "conv2d expects [N, C, H, W] input and [O, C, KH, KW] kernel",
            ));
        }
        if stride.0 == 0 || stride.1 == 0 {
            return Err(Error::invalid_argument("stride", "stride must be >= 1"));
        }
        let (n, c, h, w) = (
            input.shape()[0],
            input.shape()[1],
            input.shape()[2],
            input.shape()[3],
        );
        let (o, kc, kh, kw) = (
            kernel.shape()[0],
            kernel.shape()[1],
            kernel.shape()[2],
            kernel.shape()[3],
        );
        if c != kc {
            return Err(Error::shape_mismatch(
                input.shape().as_slice(),
                kernel.shape().as_slice(),
            ));
        }
        let (ph, pw) = padding;
        if h + 2 * ph < kh || w + 2 * pw < kw {
            return Err(Error::invalid_argument(
                "kernel",
                "kernel larger than padded input",
            ));
        }
        let oh = (h + 2 * ph - kh) / stride.0 + 1;
        let ow = (w + 2 * pw - kw) / stride.1 + 1;

        let out = DenseData::zeros([n, o, oh, ow]);
        for ni in 0..n {
            for oi in 0..o {
                for y in 0..oh {
                    for x in 0..ow {
                        let mut acc = 0.0f64;
                        for ci in 0..c {
                            for ky in 0..kh {
                                for kx in 0..kw {
                                    let iy = (y * stride.0 + ky) as isize - ph as isize;
                                    let ix = (x * stride.1 + kx) as isize - pw as isize;
                                    if iy < 0 || ix < 0 || iy >= h as isize || ix >= w as isize {
                                        continue; // zero padding
                                    }
                                    let iv =
                                        input.get(&[ni, ci, iy as usize, ix as usize])?.to_f64();
                                    let kv = kernel.get(&[oi, ci, ky, kx])?.to_f64();
                                    acc += iv * kv;
                                }
                            }
                        }
                        out.set(&[ni, oi, y, x], T::from_f64(acc))?;
                    }
                }
            }
        }
        Ok(TensorData::Dense(out))
    }

    fn max_pool2d(
        &self,
        input: &TensorData<T>,
        kernel: (usize, usize),
        stride: (usize, usize),
    ) -> Result<TensorData<T>> {
        if input.rank() != 4 {
            return Err(Error::invalid_argument(
                "input",
                "max_pool2d expects [N, C, H, W] input",
            ));
        }
        if kernel.0 == 0 || kernel.1 == 0 || stride.0 == 0 || stride.1 == 0 {
            return Err(Error::invalid_argument(
                "kernel",
                "kernel and stride must be >= 1",
            ));
        }
        let (n, c, h, w) = (
            input.shape()[0],
            input.shape()[1],
            input.shape()[2],
            input.shape()[3],
        );
        if h < kernel.0 || w < kernel.1 {
            return Err(Error::invalid_argument(
                "kernel",
                "pooling window larger than input",
            ));
        }
        let oh = (h - kernel.0) / stride.0 + 1;
        let ow = (w - kernel.1) / stride.1 + 1;

        let out = DenseData::zeros([n, c, oh, ow]);
        for ni in 0..n {
            for ci in 0..c {
                for y in 0..oh {
                    for x in 0..ow {
                        let mut best = input.get(&[ni, ci, y * stride.0, x * stride.1])?;
                        for ky in 0..kernel.0 {
                            for kx in 0..kernel.1 {
                                let v =
                                    input.get(&[ni, ci, y * stride.0 + ky, x * stride.1 + kx])?;
                                if v > best {
                                    best = v;
                                }
                            }
                        }
                        out.set(&[ni, ci, y, x], best)?;
                    }
                }
            }
        }
        Ok(TensorData::Dense(out))
    }

    // ===== Reductions =====

    fn sum(&self, a: &TensorData<T>, dim: Option<isize>) -> Result<TensorData<T>> {
        reduce_lanes(a, dim, |lane| lane.iter().sum())
    }

    fn mean(&self, a: &TensorData<T>, dim: Option<isize>) -> Result<TensorData<T>> {
        if a.volume() == 0 {
            return Err(Error::invalid_argument("a", "mean of an empty tensor"));
        }
        reduce_lanes(a, dim, lane_mean)
    }

    fn variance(&self, a: &TensorData<T>, dim: Option<isize>) -> Result<TensorData<T>> {
        if a.volume() == 0 {
            return Err(Error::invalid_argument("a", "variance of an empty tensor"));
        }
        reduce_lanes(a, dim, |lane| {
            let mean = lane_mean(lane);
            lane.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / lane.len() as f64
        })
    }

    // ===== Unary / Conversion =====

    fn sqrt(&self, a: &TensorData<T>) -> Result<TensorData<T>> {
        map_elementwise(a, |x| T::from_f64(x.to_f64().sqrt()))
    }

    fn convert(&self, a: &TensorData<T>, dtype: DType) -> Result<TensorData<T>> {
        match dtype {
            DType::F64 => map_elementwise(a, |x| x),
            DType::F32 => map_elementwise(a, |x| T::from_f64(x.to_f64() as f32 as f64)),
            DType::I64 => map_elementwise(a, |x| T::from_f64(x.to_f64().trunc())),
            DType::I32 => map_elementwise(a, |x| T::from_f64(x.to_f64().trunc() as i32 as f64)),
            DType::Bool => Err(Error::unsupported(
                "convert",
                "bool has no numeric value grid",
            )),
        }
    }
}

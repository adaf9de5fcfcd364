//! Dense row-major `f64` tensors exposed to scripts as `Tensor` handles.

use crate::language::error::Result;
use crate::language::interpreter::value::{External, Module, Value};
use crate::runtime_error;
use super::expect_args;

pub const TENSOR_TAG: &str = "Tensor";

#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f64>,
}

fn element_count(shape: &[usize]) -> Result<usize> {
    match shape.iter().try_fold(1usize, |count, &dim| count.checked_mul(dim)) {
        Some(count) => Ok(count),
        None => runtime_error!("tensor shape too large"),
    }
}

impl Tensor {
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Result<Self> {
        if element_count(&shape)? != data.len() {
            return runtime_error!("data length does not match shape");
        }
        Ok(Tensor { shape, data })
    }

    pub fn filled(shape: Vec<usize>, value: f64) -> Result<Self> {
        let len = element_count(&shape)?;
        let mut data = Vec::new();
        if data.try_reserve_exact(len).is_err() {
            return runtime_error!("tensor shape too large");
        }
        data.resize(len, value);
        Ok(Tensor { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    fn offset(&self, index: &[usize]) -> Result<usize> {
        if index.len() != self.rank() {
            return runtime_error!("index has {} dimensions, tensor has {}", index.len(), self.rank());
        }
        let mut offset = 0;
        for (&i, &dim) in index.iter().zip(&self.shape) {
            if i >= dim {
                return runtime_error!("index out of bounds");
            }
            offset = offset * dim + i;
        }
        Ok(offset)
    }

    pub fn get(&self, index: &[usize]) -> Result<f64> {
        Ok(self.data[self.offset(index)?])
    }

    pub fn with_value(&self, index: &[usize], value: f64) -> Result<Tensor> {
        let offset = self.offset(index)?;
        let mut updated = self.clone();
        updated.data[offset] = value;
        Ok(updated)
    }

    fn zip_with(&self, other: &Tensor, op: fn(f64, f64) -> f64) -> Result<Tensor> {
        if self.shape != other.shape {
            return runtime_error!("shape mismatch: {:?} vs {:?}", self.shape, other.shape);
        }
        let data = self.data.iter().zip(&other.data).map(|(a, b)| op(*a, *b)).collect();
        Ok(Tensor { shape: self.shape.clone(), data })
    }

    pub fn dot(&self, other: &Tensor) -> Result<f64> {
        if self.rank() != 1 || other.rank() != 1 {
            return runtime_error!("dot requires two 1-D tensors");
        }
        if self.shape != other.shape {
            return runtime_error!("shape mismatch: {:?} vs {:?}", self.shape, other.shape);
        }
        Ok(self.data.iter().zip(&other.data).map(|(a, b)| a * b).sum())
    }

    pub fn matmul(&self, other: &Tensor) -> Result<Tensor> {
        let (&[rows, inner], &[other_inner, cols]) = (self.shape.as_slice(), other.shape.as_slice()) else {
            return runtime_error!("matmul requires two 2-D tensors");
        };
        if inner != other_inner {
            return runtime_error!("inner dimension mismatch: {} vs {}", inner, other_inner);
        }

        let mut data = vec![0.0; rows * cols];
        for r in 0..rows {
            for k in 0..inner {
                let a = self.data[r * inner + k];
                for c in 0..cols {
                    data[r * cols + c] += a * other.data[k * cols + c];
                }
            }
        }
        Ok(Tensor { shape: vec![rows, cols], data })
    }

    pub fn transpose(&self) -> Result<Tensor> {
        let &[rows, cols] = self.shape.as_slice() else {
            return runtime_error!("transpose requires a 2-D tensor");
        };
        let mut data = Vec::with_capacity(self.data.len());
        for c in 0..cols {
            for r in 0..rows {
                data.push(self.data[r * cols + c]);
            }
        }
        Ok(Tensor { shape: vec![cols, rows], data })
    }

    pub fn into_value(self) -> Value {
        Value::External(External::new(TENSOR_TAG, self))
    }
}

fn tensor_arg<'a>(function: &str, value: &'a Value) -> Result<&'a Tensor> {
    match value {
        Value::External(external) if external.type_tag() == TENSOR_TAG => match external.downcast_ref::<Tensor>() {
            Some(tensor) => Ok(tensor),
            None => runtime_error!("{}() received a corrupted Tensor handle", function),
        },
        other => runtime_error!("{}() expects a Tensor, found {}", function, other.type_name()),
    }
}

fn number(value: &Value) -> Result<f64> {
    match value {
        Value::Integer(n) => Ok(*n as f64),
        Value::Float(n) => Ok(*n),
        other => runtime_error!("tensor elements must be numbers, found {}", other.type_name()),
    }
}

fn indices(function: &str, value: &Value) -> Result<Vec<usize>> {
    let Value::Array(items) = value else {
        return runtime_error!("{}() expects an array of integers, found {}", function, value.type_name());
    };
    items
        .iter()
        .map(|item| match item {
            Value::Integer(n) if *n >= 0 => Ok(*n as usize),
            Value::Integer(_) => runtime_error!("index out of bounds"),
            other => runtime_error!("{}() expects integer dimensions, found {}", function, other.type_name()),
        })
        .collect()
}

fn flatten_into(value: &Value, out: &mut Vec<f64>) -> Result<()> {
    match value {
        Value::Array(items) => items.iter().try_for_each(|item| flatten_into(item, out)),
        other => {
            out.push(number(other)?);
            Ok(())
        }
    }
}

fn elementwise(name: &'static str, op: fn(f64, f64) -> f64) -> Value {
    Value::native(name, move |_, args| {
        let [a, b] = expect_args::<2>(name, args)?;
        Ok(tensor_arg(name, &a)?.zip_with(tensor_arg(name, &b)?, op)?.into_value())
    })
}

pub fn module() -> Result<Module> {
    let module = Module::new("linalg")
        .with_export("zeros", Value::native("zeros", |_, args| {
            let [shape] = expect_args::<1>("zeros", args)?;
            Ok(Tensor::filled(indices("zeros", &shape)?, 0.0)?.into_value())
        }))
        .with_export("ones", Value::native("ones", |_, args| {
            let [shape] = expect_args::<1>("ones", args)?;
            Ok(Tensor::filled(indices("ones", &shape)?, 1.0)?.into_value())
        }))
        .with_export("tensor", Value::native("tensor", |_, args| {
            let [data, shape] = expect_args::<2>("tensor", args)?;
            let mut flat = Vec::new();
            flatten_into(&data, &mut flat)?;
            Ok(Tensor::new(indices("tensor", &shape)?, flat)?.into_value())
        }))
        .with_export("shape", Value::native("shape", |_, args| {
            let [t] = expect_args::<1>("shape", args)?;
            let dims = tensor_arg("shape", &t)?.shape().iter().map(|&d| Value::Integer(d as i64)).collect();
            Ok(Value::array(dims))
        }))
        .with_export("rank", Value::native("rank", |_, args| {
            let [t] = expect_args::<1>("rank", args)?;
            Ok(Value::Integer(tensor_arg("rank", &t)?.rank() as i64))
        }))
        .with_export("get", Value::native("get", |_, args| {
            let [t, index] = expect_args::<2>("get", args)?;
            Ok(Value::Float(tensor_arg("get", &t)?.get(&indices("get", &index)?)?))
        }))
        .with_export("set", Value::native("set", |_, args| {
            let [t, index, value] = expect_args::<3>("set", args)?;
            let updated = tensor_arg("set", &t)?.with_value(&indices("set", &index)?, number(&value)?)?;
            Ok(updated.into_value())
        }))
        .with_export("add", elementwise("add", |a, b| a + b))
        .with_export("sub", elementwise("sub", |a, b| a - b))
        .with_export("mul", elementwise("mul", |a, b| a * b))
        .with_export("dot", Value::native("dot", |_, args| {
            let [a, b] = expect_args::<2>("dot", args)?;
            Ok(Value::Float(tensor_arg("dot", &a)?.dot(tensor_arg("dot", &b)?)?))
        }))
        .with_export("matmul", Value::native("matmul", |_, args| {
            let [a, b] = expect_args::<2>("matmul", args)?;
            Ok(tensor_arg("matmul", &a)?.matmul(tensor_arg("matmul", &b)?)?.into_value())
        }))
        .with_export("transpose", Value::native("transpose", |_, args| {
            let [t] = expect_args::<1>("transpose", args)?;
            Ok(tensor_arg("transpose", &t)?.transpose()?.into_value())
        }))
        .with_export("to_array", Value::native("to_array", |_, args| {
            let [t] = expect_args::<1>("to_array", args)?;
            let data = tensor_arg("to_array", &t)?.data().iter().map(|&x| Value::Float(x)).collect();
            Ok(Value::array(data))
        }));

    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: usize, cols: usize, data: &[f64]) -> Tensor {
        Tensor::new(vec![rows, cols], data.to_vec()).unwrap()
    }

    #[test]
    fn construction_checks_length() {
        assert!(Tensor::new(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]).is_ok());
        let error = Tensor::new(vec![2, 2], vec![1.0]).unwrap_err();
        assert_eq!(error.message, "data length does not match shape");
        assert_eq!(Tensor::filled(vec![2, 3], 1.0).unwrap().data().len(), 6);
    }

    #[test]
    fn oversized_shapes_are_errors() {
        let shape = vec![1 << 32, 1 << 32, 16];
        assert_eq!(Tensor::filled(shape.clone(), 0.0).unwrap_err().message, "tensor shape too large");
        assert_eq!(Tensor::new(shape, vec![]).unwrap_err().message, "tensor shape too large");

        let zeros = module().unwrap().export("zeros").unwrap().clone();
        let shape = Value::array(vec![Value::Integer(1 << 32), Value::Integer(1 << 32), Value::Integer(16)]);
        let error = crate::Interpreter::new().call_function(&zeros, vec![shape]).unwrap_err();
        assert_eq!(error.message, "tensor shape too large");
    }

    #[test]
    fn indexing_is_row_major_and_bounds_checked() {
        let m = matrix(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(m.get(&[1, 0]).unwrap(), 4.0);
        assert_eq!(m.get(&[0, 3]).unwrap_err().message, "index out of bounds");
        assert!(m.get(&[0]).is_err());

        let updated = m.with_value(&[0, 1], 9.0).unwrap();
        assert_eq!(updated.get(&[0, 1]).unwrap(), 9.0);
        assert_eq!(m.get(&[0, 1]).unwrap(), 2.0);
    }

    #[test]
    fn matmul_and_transpose() {
        let a = matrix(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = a.transpose().unwrap();
        assert_eq!(b.shape(), &[3, 2]);
        assert_eq!(b.data(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);

        let product = a.matmul(&b).unwrap();
        assert_eq!(product.shape(), &[2, 2]);
        assert_eq!(product.data(), &[14.0, 32.0, 32.0, 77.0]);

        assert!(a.matmul(&a).unwrap_err().message.starts_with("inner dimension mismatch"));
    }

    #[test]
    fn elementwise_and_dot() {
        let v = Tensor::new(vec![3], vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(v.dot(&v).unwrap(), 14.0);
        assert_eq!(v.zip_with(&v, |a, b| a * b).unwrap().data(), &[1.0, 4.0, 9.0]);

        let m = matrix(1, 3, &[1.0, 2.0, 3.0]);
        assert!(v.zip_with(&m, |a, b| a + b).unwrap_err().message.starts_with("shape mismatch"));
        assert!(m.dot(&m).is_err());
    }

    #[test]
    fn tensor_handles_round_trip_through_values() {
        let value = Tensor::filled(vec![2], 0.5).unwrap().into_value();
        assert_eq!(value.type_name(), "Tensor");
        let tensor = tensor_arg("test", &value).unwrap();
        assert_eq!(tensor.data(), &[0.5, 0.5]);
        assert!(tensor_arg("test", &Value::Integer(1)).is_err());
    }
}

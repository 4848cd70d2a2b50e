//! Host tensors stored inside blobs.
//!
//! A [`Tensor`] is a shape plus row-major contiguous storage of one element
//! type. It follows a create, resize, fill lifecycle: the shape is set first,
//! storage is allocated lazily on the first typed mutable access, and later
//! fills overwrite the same storage as long as the element count and type
//! do not change.

use std::fmt;

use crate::errors::{NetError, Result};

/// Element type held by a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Float32,
    Int32,
}

impl DataType {
    /// Returns the display name of the element type.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Float32 => "float32",
            DataType::Int32 => "int32",
        }
    }

    /// Returns the size of one element in bytes.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DataType::Float32 => std::mem::size_of::<f32>(),
            DataType::Int32 => std::mem::size_of::<i32>(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

mod sealed {
    use super::DataType;

    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for i32 {}

    #[derive(Debug, Clone, PartialEq)]
    pub enum Storage {
        Float32(Vec<f32>),
        Int32(Vec<i32>),
    }

    impl Storage {
        pub fn dtype(&self) -> DataType {
            match self {
                Storage::Float32(_) => DataType::Float32,
                Storage::Int32(_) => DataType::Int32,
            }
        }

        pub fn len(&self) -> usize {
            match self {
                Storage::Float32(values) => values.len(),
                Storage::Int32(values) => values.len(),
            }
        }
    }
}

use sealed::Storage;

/// Element types a [`Tensor`] can store.
pub trait Element: sealed::Sealed + Copy + Default + fmt::Debug + 'static {
    /// The matching runtime element type.
    const DTYPE: DataType;

    #[doc(hidden)]
    fn wrap(values: Vec<Self>) -> Storage;

    #[doc(hidden)]
    fn view(storage: &Storage) -> Option<&[Self]>;

    #[doc(hidden)]
    fn view_mut(storage: &mut Storage) -> Option<&mut [Self]>;
}

impl Element for f32 {
    const DTYPE: DataType = DataType::Float32;

    fn wrap(values: Vec<Self>) -> Storage {
        Storage::Float32(values)
    }

    fn view(storage: &Storage) -> Option<&[Self]> {
        match storage {
            Storage::Float32(values) => Some(values),
            _ => None,
        }
    }

    fn view_mut(storage: &mut Storage) -> Option<&mut [Self]> {
        match storage {
            Storage::Float32(values) => Some(values),
            _ => None,
        }
    }
}

impl Element for i32 {
    const DTYPE: DataType = DataType::Int32;

    fn wrap(values: Vec<Self>) -> Storage {
        Storage::Int32(values)
    }

    fn view(storage: &Storage) -> Option<&[Self]> {
        match storage {
            Storage::Int32(values) => Some(values),
            _ => None,
        }
    }

    fn view_mut(storage: &mut Storage) -> Option<&mut [Self]> {
        match storage {
            Storage::Int32(values) => Some(values),
            _ => None,
        }
    }
}

/// A dense, row-major host tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    storage: Option<Storage>,
}

impl Default for Tensor {
    /// An empty tensor with shape `[0]` and no storage.
    fn default() -> Self {
        Self {
            shape: vec![0],
            storage: None,
        }
    }
}

impl Tensor {
    /// Creates an empty tensor with no storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tensor from a shape and matching values.
    pub fn from_vec<T: Element>(shape: &[usize], values: Vec<T>) -> Result<Self> {
        let numel = shape.iter().product::<usize>();
        if values.len() != numel {
            return Err(NetError::shape_mismatch(
                "tensor construction",
                shape,
                &[values.len()],
            ));
        }
        Ok(Self {
            shape: shape.to_vec(),
            storage: Some(T::wrap(values)),
        })
    }

    /// Creates a 0-dimensional tensor holding one value.
    pub fn scalar<T: Element>(value: T) -> Self {
        Self {
            shape: Vec::new(),
            storage: Some(T::wrap(vec![value])),
        }
    }

    /// Returns the dimensions of the tensor.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Returns the number of elements implied by the shape.
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Returns the element type, if storage has been allocated.
    pub fn dtype(&self) -> Option<DataType> {
        self.storage.as_ref().map(Storage::dtype)
    }

    /// Returns true once storage has been allocated.
    pub fn is_initialized(&self) -> bool {
        self.storage.is_some()
    }

    /// Returns the size of the allocated storage in bytes.
    pub fn nbytes(&self) -> usize {
        self.storage
            .as_ref()
            .map(|storage| storage.len() * storage.dtype().size_in_bytes())
            .unwrap_or(0)
    }

    /// Changes the shape in place.
    ///
    /// Storage survives when the element count is unchanged; otherwise it is
    /// released and reallocated by the next [`Tensor::mutable_data`] call.
    pub fn resize(&mut self, shape: &[usize]) {
        let numel = shape.iter().product::<usize>();
        if numel != self.numel() {
            self.storage = None;
        }
        self.shape = shape.to_vec();
    }

    /// Returns a typed read view of the storage.
    pub fn data<T: Element>(&self) -> Result<&[T]> {
        let storage = self.storage.as_ref().ok_or(NetError::UninitializedTensor)?;
        T::view(storage).ok_or(NetError::DataTypeMismatch {
            requested: T::DTYPE.name(),
            actual: storage.dtype().name(),
        })
    }

    /// Returns a typed mutable view, allocating or retyping storage as needed.
    ///
    /// Existing values are kept when the type and element count already match.
    pub fn mutable_data<T: Element>(&mut self) -> &mut [T] {
        let numel = self.numel();
        let reusable = self
            .storage
            .as_ref()
            .is_some_and(|storage| storage.dtype() == T::DTYPE && storage.len() == numel);
        if !reusable {
            self.storage = Some(T::wrap(vec![T::default(); numel]));
        }
        match self.storage.as_mut().and_then(T::view_mut) {
            Some(values) => values,
            None => &mut [],
        }
    }

    /// Overwrites the storage with `values` using a bulk copy.
    pub fn copy_from_slice<T: Element>(&mut self, values: &[T]) -> Result<()> {
        if values.len() != self.numel() {
            return Err(NetError::shape_mismatch(
                "bulk copy",
                &self.shape,
                &[values.len()],
            ));
        }
        self.mutable_data::<T>().copy_from_slice(values);
        Ok(())
    }

    /// Returns an owned copy of the values.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        self.data::<T>().map(<[T]>::to_vec)
    }
}

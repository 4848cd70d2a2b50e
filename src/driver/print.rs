//! Human-readable tensor printing.

use crate::workspace::{DataType, Tensor};

fn format_shape(shape: &[usize]) -> String {
    match shape {
        [] => "()".to_string(),
        [dim] => format!("({dim},)"),
        dims => {
            let dims: Vec<String> = dims.iter().map(usize::to_string).collect();
            format!("({})", dims.join(", "))
        }
    }
}

fn nest(values: &[String], shape: &[usize], depth: usize) -> String {
    let Some((&len, rest)) = shape.split_first() else {
        return values.first().cloned().unwrap_or_default();
    };
    let stride: usize = rest.iter().product();
    let rows: Vec<String> = (0..len)
        .map(|i| nest(&values[i * stride..(i + 1) * stride], rest, depth + 1))
        .collect();
    let separator = if rest.is_empty() {
        " ".to_string()
    } else {
        format!("\n{}", " ".repeat(depth + 1))
    };
    format!("[{}]", rows.join(&separator))
}

/// Formats `tensor` as a header line followed by its values, nested by
/// dimension.
pub fn format_tensor(name: &str, tensor: &Tensor) -> String {
    let values: Option<Vec<String>> = match tensor.dtype() {
        Some(DataType::Float32) => tensor
            .data::<f32>()
            .ok()
            .map(|values| values.iter().map(|v| format!("{v:.6}")).collect()),
        Some(DataType::Int32) => tensor
            .data::<i32>()
            .ok()
            .map(|values| values.iter().map(i32::to_string).collect()),
        None => None,
    };
    let shape = format_shape(tensor.shape());
    match (tensor.dtype(), values) {
        (Some(dtype), Some(values)) => {
            format!("{name} {shape} {dtype}:\n{}", nest(&values, tensor.shape(), 0))
        }
        _ => format!("{name} {shape}: <uninitialized>"),
    }
}

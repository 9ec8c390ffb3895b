/// A uniform value as set by the caller.
///
/// `elems` is the vector width of one value (1 to 4); `values` may hold
/// several values for array uniforms.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Int { elems: u32, values: Vec<i32> },
    UInt { elems: u32, values: Vec<u32> },
    Float { elems: u32, values: Vec<f32> },
    /// Column-major unless `transpose` is set.
    Matrix {
        rows: u32,
        cols: u32,
        transpose: bool,
        values: Vec<f32>,
    },
}

impl UniformValue {
    /// Number of 32-bit words the value occupies.
    pub fn word_count(&self) -> usize {
        match self {
            UniformValue::Int { values, .. } => values.len(),
            UniformValue::UInt { values, .. } => values.len(),
            UniformValue::Float { values, .. } => values.len(),
            UniformValue::Matrix { values, .. } => values.len(),
        }
    }

    /// Raw 32-bit words in upload order; matrices come out column-major.
    pub fn to_words(&self) -> Vec<u32> {
        match self {
            UniformValue::Int { values, .. } => values.iter().map(|v| *v as u32).collect(),
            UniformValue::UInt { values, .. } => values.clone(),
            UniformValue::Float { values, .. } => values.iter().map(|v| v.to_bits()).collect(),
            UniformValue::Matrix {
                rows,
                cols,
                transpose,
                values,
            } => {
                let (rows, cols) = (*rows as usize, *cols as usize);
                let per = rows * cols;
                if !transpose || per == 0 {
                    return values.iter().map(|v| v.to_bits()).collect();
                }
                let mut out = Vec::with_capacity(values.len());
                for m in values.chunks(per) {
                    // Input is row-major: element (r, c) at r * cols + c.
                    for c in 0..cols {
                        for r in 0..rows {
                            out.push(m.get(r * cols + c).copied().unwrap_or(0.0).to_bits());
                        }
                    }
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_words_are_bit_patterns() {
        let v = UniformValue::Float { elems: 2, values: vec![1.0, -2.0] };
        assert_eq!(v.to_words(), vec![1.0f32.to_bits(), (-2.0f32).to_bits()]);
        assert_eq!(v.word_count(), 2);
    }

    #[test]
    fn transposed_matrix_becomes_column_major() {
        let v = UniformValue::Matrix {
            rows: 2,
            cols: 2,
            transpose: true,
            values: vec![1.0, 2.0, 3.0, 4.0],
        };
        let words: Vec<f32> = v.to_words().into_iter().map(f32::from_bits).collect();
        assert_eq!(words, vec![1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn ints_keep_sign_bits() {
        let v = UniformValue::Int { elems: 1, values: vec![-1] };
        assert_eq!(v.to_words(), vec![u32::MAX]);
    }
}

//! Plain-text matrix file format.
//!
//! ```text
//! <order N>
//! <a_00> <a_01> ... <a_0,N-1>
//! ...
//! <a_N-1,0> ... <a_N-1,N-1>
//! ```
//!
//! Entries are whitespace-separated, row-major. The same shape is used for
//! input and output; written values use Rust's shortest round-trip float
//! formatting. Malformed input is detected here, before anything reaches
//! the elimination kernel.

use std::path::Path;

use ndarray::Array2;
use thiserror::Error;

/// Errors reading or writing matrix files.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("failed to access file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error at line {line}: {message}")]
    Malformed { line: usize, message: String },
}

/// Parse a matrix from its text representation.
pub fn parse_matrix(content: &str) -> Result<Array2<f64>, FormatError> {
    let mut lines = content.lines().enumerate();

    let (_, header) = lines.next().ok_or(FormatError::Malformed {
        line: 1,
        message: "empty file; first line must be the matrix order".into(),
    })?;
    let n: usize = header.trim().parse().map_err(|_| FormatError::Malformed {
        line: 1,
        message: format!("first line must be the matrix order, got '{}'", header.trim()),
    })?;

    let mut data = Vec::with_capacity(n * n);
    let mut rows_found = 0;
    for (idx, line) in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if rows_found == n {
            return Err(FormatError::Malformed {
                line: idx + 1,
                message: format!("trailing data after {} rows", n),
            });
        }
        let mut entries = 0;
        for token in line.split_whitespace() {
            let value: f64 = token.parse().map_err(|_| FormatError::Malformed {
                line: idx + 1,
                message: format!("invalid numeric entry '{}'", token),
            })?;
            data.push(value);
            entries += 1;
        }
        if entries != n {
            return Err(FormatError::Malformed {
                line: idx + 1,
                message: format!("expected {} entries, got {}", n, entries),
            });
        }
        rows_found += 1;
    }

    if rows_found != n {
        return Err(FormatError::Malformed {
            line: 1,
            message: format!("header says {} rows but found {}", n, rows_found),
        });
    }

    Ok(Array2::from_shape_vec((n, n), data).expect("dimensions already checked"))
}

/// Read and parse a matrix file.
pub fn read_matrix(path: &Path) -> Result<Array2<f64>, FormatError> {
    let content = std::fs::read_to_string(path)?;
    parse_matrix(&content)
}

/// Render a matrix in the text format.
pub fn render_matrix(matrix: &Array2<f64>) -> String {
    let mut out = format!("{}\n", matrix.nrows());
    for row in matrix.rows() {
        let line = row
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Write a matrix file, creating parent directories as needed.
pub fn write_matrix(path: &Path, matrix: &Array2<f64>) -> Result<(), FormatError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, render_matrix(matrix))?;
    Ok(())
}

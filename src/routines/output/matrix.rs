use csv::{ReaderBuilder, WriterBuilder};
use eyre::{Result, WrapErr};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_csv::{Array2Reader, Array2Writer};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Writes a matrix as space separated values, one row per line
pub fn write_matrix<W: Write>(writer: W, matrix: ArrayView2<f64>) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .delimiter(b' ')
        .from_writer(writer);
    writer.serialize_array2(&matrix.to_owned())?;
    writer.flush()?;
    Ok(())
}

/// Writes a vector with one value per line
pub fn write_vector<W: Write>(writer: W, vector: ArrayView1<f64>) -> Result<()> {
    write_matrix(writer, vector.insert_axis(Axis(1)))
}

/// Reads a matrix written by [write_matrix]
pub fn read_matrix<R: Read>(reader: R) -> Result<Array2<f64>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b' ')
        .from_reader(reader);
    let matrix: Array2<f64> = reader.deserialize_array2_dynamic()?;
    Ok(matrix)
}

/// Reads a vector written by [write_vector]
///
/// A single row of values is accepted as well.
pub fn read_vector<R: Read>(reader: R) -> Result<Array1<f64>> {
    let matrix = read_matrix(reader)?;
    Ok(Array1::from_iter(matrix.iter().copied()))
}

pub fn read_matrix_file(path: impl AsRef<Path>) -> Result<Array2<f64>> {
    let path = path.as_ref();
    let file = File::open(path).wrap_err_with(|| format!("Unable to open {}", path.display()))?;
    read_matrix(file).wrap_err_with(|| format!("Unable to parse the matrix in {}", path.display()))
}

pub fn read_vector_file(path: impl AsRef<Path>) -> Result<Array1<f64>> {
    let path = path.as_ref();
    let file = File::open(path).wrap_err_with(|| format!("Unable to open {}", path.display()))?;
    read_vector(file).wrap_err_with(|| format!("Unable to parse the vector in {}", path.display()))
}

//! Binary model files
//!
//! Layout, little-endian, integers as i32 and parameters as f32:
//!
//! ```text
//! layer_count
//! per layer:
//!   input_width
//!   output_width
//!   weights[input_width * output_width]   (output × input, row-major)
//!   biases[output_width]
//!   activation_tag                        (0 Linear, 1 ReLU, 2 Sigmoid, 3 Softmax)
//! ```
//!
//! Files written with the older name-based layout store, in place of the tag,
//! the length of a NUL-terminated activation name followed by its bytes. The
//! reader accepts both: a value in the tag range is a tag, any other positive
//! value is a name length.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::{debug, warn};

use super::Network;
use crate::error::{NetworkError, Result};
use crate::layers::DenseLayer;
use crate::utils::Activation;

/// Longest activation name accepted from a name-based file, NUL included.
const MAX_NAME_LEN: i32 = 64;

impl Network {
    /// Write the network's architecture and parameters to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.check_ready()?;
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            warn!("could not open {} for writing: {}", path.display(), e);
            e
        })?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        debug!(path = %path.display(), layers = self.len(), "model saved");
        Ok(())
    }

    /// Serialize into any writer. Requires a ready network.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.check_ready()?;

        write_i32(writer, to_i32(self.layers.len())?)?;
        for layer in &self.layers {
            write_i32(writer, to_i32(layer.input_size())?)?;
            write_i32(writer, to_i32(layer.output_size())?)?;
            for &value in layer.weights() {
                writer.write_all(&value.to_le_bytes())?;
            }
            for &value in layer.biases() {
                writer.write_all(&value.to_le_bytes())?;
            }
            write_i32(writer, layer.activation().tag())?;
        }
        Ok(())
    }

    /// Read a network from `path`.
    ///
    /// The result is a fresh, ready network with zeroed gradients and no loss
    /// or optimizer configured. Nothing is returned unless the whole file
    /// parses.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Network> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            warn!("could not open {} for reading: {}", path.display(), e);
            e
        })?;
        let network = Self::read_from(&mut BufReader::new(file))?;
        debug!(path = %path.display(), layers = network.len(), "model loaded");
        Ok(network)
    }

    /// Deserialize from any reader. See the module docs for the layout.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Network> {
        let layer_count = read_count(reader, "layer count")?;
        let mut network = Network::new(layer_count)?;

        for _ in 0..layer_count {
            let input_size = read_count(reader, "input width")?;
            let output_size = read_count(reader, "output width")?;
            let weight_count = input_size.checked_mul(output_size).ok_or_else(|| {
                invalid_data(format!(
                    "layer of {} x {} is too large",
                    input_size, output_size
                ))
            })?;

            let weights = read_f32s(reader, weight_count)?;
            let biases = read_f32s(reader, output_size)?;
            let activation = read_activation(reader)?;

            let layer =
                DenseLayer::from_parameters(input_size, output_size, weights, biases, activation)?;
            network.push_layer(layer)?;
        }
        Ok(network)
    }
}

fn write_i32<W: Write>(writer: &mut W, value: i32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

fn to_i32(value: usize) -> Result<i32> {
    i32::try_from(value).map_err(|_| invalid_data(format!("{} does not fit in an i32", value)))
}

fn read_i32<R: Read>(reader: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

/// Reads a strictly positive count.
fn read_count<R: Read>(reader: &mut R, what: &str) -> Result<usize> {
    let value = read_i32(reader)?;
    if value <= 0 {
        warn!("model file: {} must be positive, got {}", what, value);
        return Err(invalid_data(format!("{} must be positive, got {}", what, value)));
    }
    Ok(value as usize)
}

fn read_f32s<R: Read>(reader: &mut R, count: usize) -> Result<Vec<f32>> {
    let byte_len = count
        .checked_mul(4)
        .ok_or_else(|| invalid_data(format!("{} values is too many", count)))?;
    let mut bytes = Vec::new();
    reader.by_ref().take(byte_len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != byte_len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes of parameters, found {}", byte_len, bytes.len()),
        )
        .into());
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn read_activation<R: Read>(reader: &mut R) -> Result<Activation> {
    let value = read_i32(reader)?;
    if let Some(activation) = Activation::from_tag(value) {
        return Ok(activation);
    }
    if value <= 0 || value > MAX_NAME_LEN {
        warn!("model file: unknown activation tag {}", value);
        return Err(NetworkError::UnknownActivation(format!("tag {}", value)));
    }

    let mut name = vec![0u8; value as usize];
    reader.read_exact(&mut name)?;
    let end = name.iter().position(|&b| b == 0).unwrap_or(name.len());
    let name = String::from_utf8_lossy(&name[..end]);

    Activation::from_name(&name).ok_or_else(|| {
        warn!("model file: unknown activation name {:?}", name);
        NetworkError::UnknownActivation(name.into_owned())
    })
}

fn invalid_data(message: String) -> NetworkError {
    NetworkError::Io(io::Error::new(io::ErrorKind::InvalidData, message))
}

//! CSV sample source
//!
//! Feature files hold one sample per line as comma-separated floats; label
//! files hold the class index as the first field of each line. Neither has a
//! header. Labels are expanded to one-hot vectors so they can be fed straight
//! to a categorical cross-entropy network.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while reading or splitting sample data
#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parse error at record {record}, field {field}: {message}")]
    Parse {
        record: usize,
        field: usize,
        message: String,
    },

    #[error("Expected {expected} records, found {found}")]
    NotEnoughRecords { expected: usize, found: usize },

    #[error("Label {label} at record {record} is outside 0..{num_classes}")]
    LabelOutOfRange {
        record: usize,
        label: i64,
        num_classes: usize,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

fn csv_reader<P: AsRef<Path>>(path: P) -> Result<csv::Reader<BufReader<File>>, DataError> {
    let file = File::open(path.as_ref()).map_err(|e| {
        warn!("failed to open {}: {}", path.as_ref().display(), e);
        e
    })?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file)))
}

fn check_counts(num_samples: usize, width: usize, what: &str) -> Result<(), DataError> {
    if num_samples == 0 || width == 0 {
        return Err(DataError::InvalidArgument(format!(
            "sample count and {} must be positive",
            what
        )));
    }
    Ok(())
}

/// Read `num_samples` rows of `input_size` floats each.
///
/// Extra fields beyond `input_size`, such as the empty field left by a
/// trailing comma, are ignored. Lines past `num_samples` are not read.
pub fn read_csv_data<P: AsRef<Path>>(
    path: P,
    num_samples: usize,
    input_size: usize,
) -> Result<Vec<Vec<f32>>, DataError> {
    check_counts(num_samples, input_size, "input size")?;
    let mut reader = csv_reader(&path)?;

    let mut data = Vec::with_capacity(num_samples);
    for (i, result) in reader.records().take(num_samples).enumerate() {
        let record = result?;
        let mut row = Vec::with_capacity(input_size);
        for j in 0..input_size {
            let field = record.get(j).ok_or_else(|| DataError::Parse {
                record: i,
                field: j,
                message: format!("expected {} fields, found {}", input_size, record.len()),
            })?;
            let value = field.parse::<f32>().map_err(|e| DataError::Parse {
                record: i,
                field: j,
                message: format!("{:?}: {}", field, e),
            })?;
            row.push(value);
        }
        data.push(row);
    }

    if data.len() < num_samples {
        return Err(DataError::NotEnoughRecords {
            expected: num_samples,
            found: data.len(),
        });
    }
    debug!(path = %path.as_ref().display(), samples = data.len(), "data loaded");
    Ok(data)
}

/// Read `num_samples` class indices and expand each to a one-hot vector of
/// length `num_classes`.
pub fn read_csv_labels<P: AsRef<Path>>(
    path: P,
    num_samples: usize,
    num_classes: usize,
) -> Result<Vec<Vec<f32>>, DataError> {
    check_counts(num_samples, num_classes, "class count")?;
    let mut reader = csv_reader(&path)?;

    let mut labels = Vec::with_capacity(num_samples);
    for (i, result) in reader.records().take(num_samples).enumerate() {
        let record = result?;
        let field = record.get(0).unwrap_or("");
        let label = field.parse::<i64>().map_err(|e| DataError::Parse {
            record: i,
            field: 0,
            message: format!("{:?}: {}", field, e),
        })?;
        if label < 0 || label as usize >= num_classes {
            return Err(DataError::LabelOutOfRange {
                record: i,
                label,
                num_classes,
            });
        }

        let mut one_hot = vec![0.0f32; num_classes];
        one_hot[label as usize] = 1.0;
        labels.push(one_hot);
    }

    if labels.len() < num_samples {
        return Err(DataError::NotEnoughRecords {
            expected: num_samples,
            found: labels.len(),
        });
    }
    debug!(path = %path.as_ref().display(), samples = labels.len(), "labels loaded");
    Ok(labels)
}

/// Paired inputs and targets.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub inputs: Vec<Vec<f32>>,
    pub labels: Vec<Vec<f32>>,
}

impl Dataset {
    pub fn new(inputs: Vec<Vec<f32>>, labels: Vec<Vec<f32>>) -> Result<Self, DataError> {
        if inputs.len() != labels.len() {
            return Err(DataError::InvalidArgument(format!(
                "{} inputs but {} labels",
                inputs.len(),
                labels.len()
            )));
        }
        Ok(Self { inputs, labels })
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[f32], &[f32])> {
        self.inputs
            .iter()
            .zip(&self.labels)
            .map(|(x, y)| (x.as_slice(), y.as_slice()))
    }

    /// Split into `(train, test)` without shuffling.
    ///
    /// The test set holds the last `floor(len * test_fraction)` samples; the
    /// training set is everything before them, in order.
    pub fn split(mut self, test_fraction: f32) -> Result<(Dataset, Dataset), DataError> {
        if !(0.0..=1.0).contains(&test_fraction) {
            return Err(DataError::InvalidArgument(format!(
                "test fraction must be in [0, 1], got {}",
                test_fraction
            )));
        }

        let test_count = (self.len() as f32 * test_fraction) as usize;
        let train_count = self.len() - test_count;
        let test = Dataset {
            inputs: self.inputs.split_off(train_count),
            labels: self.labels.split_off(train_count),
        };
        Ok((self, test))
    }
}

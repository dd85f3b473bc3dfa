use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;
use ndarray::{aview1, Array1};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{AttritionLabel, EmployeeRecord};

/// Artifact location, relative to the executable's directory. Falls back
/// to the working directory when run from a checkout.
pub const ARTIFACT_FILE: &str = "model/attrition_detection.json";

static ARTIFACT: OnceCell<Arc<AttritionArtifact>> = OnceCell::new();

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("cannot read artifact at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed artifact: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid artifact: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("record has no column named {0}")]
    MissingColumn(String),
    #[error("value {value:?} for {column} is outside the fitted vocabulary")]
    UnknownCategory { column: String, value: String },
    #[error("feature vector does not match the classifier's expected columns")]
    FeatureMismatch,
}

/// Fitted standardization for one numeric column.
#[derive(Debug, Clone, Deserialize)]
pub struct NumericColumn {
    pub column: String,
    pub mean: f32,
    pub std: f32,
}

/// Fitted one-hot vocabulary for one categorical column.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoricalColumn {
    pub column: String,
    pub categories: Vec<String>,
}

/// The fitted feature transformation: standardized numeric columns
/// followed by one-hot encoded categorical columns.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnEncoder {
    pub numeric: Vec<NumericColumn>,
    pub categorical: Vec<CategoricalColumn>,
}

impl ColumnEncoder {
    /// Output column names, in the order `transform` emits values.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.width());
        for num in &self.numeric {
            names.push(format!("num__{}", num.column));
        }
        for cat in &self.categorical {
            for category in &cat.categories {
                names.push(format!("cat__{}_{}", cat.column, category));
            }
        }
        names
    }

    pub fn width(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|c| c.categories.len())
                .sum::<usize>()
    }

    /// Encode one record into the model's feature space. A categorical
    /// value outside the fitted vocabulary fails the interaction.
    pub fn transform(&self, record: &EmployeeRecord) -> Result<FeatureVector, PredictError> {
        let mut values = Vec::with_capacity(self.width());
        for num in &self.numeric {
            let raw = record
                .numeric(&num.column)
                .ok_or_else(|| PredictError::MissingColumn(num.column.clone()))?;
            values.push((raw - num.mean) / num.std);
        }
        for cat in &self.categorical {
            let value = record
                .categorical(&cat.column)
                .ok_or_else(|| PredictError::MissingColumn(cat.column.clone()))?;
            let hit = cat
                .categories
                .iter()
                .position(|c| c == value)
                .ok_or_else(|| PredictError::UnknownCategory {
                    column: cat.column.clone(),
                    value: value.to_string(),
                })?;
            for slot in 0..cat.categories.len() {
                values.push(if slot == hit { 1.0 } else { 0.0 });
            }
        }
        Ok(FeatureVector {
            columns: self.feature_names(),
            values: Array1::from(values),
        })
    }
}

/// A single encoded row with the column names the classifier expects.
#[derive(Debug, Clone)]
pub struct FeatureVector {
    pub columns: Vec<String>,
    pub values: Array1<f32>,
}

/// Fitted binary classifier over the encoder's output: one coefficient
/// per feature, an intercept and a decision threshold on the sigmoid
/// score.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearClassifier {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f32>,
    pub intercept: f32,
    pub threshold: f32,
    pub version: String,
}

impl LinearClassifier {
    pub fn classify(&self, features: &FeatureVector) -> Result<Prediction, PredictError> {
        if features.columns != self.feature_names {
            return Err(PredictError::FeatureMismatch);
        }
        let logit = features.values.dot(&aview1(&self.coefficients)) + self.intercept;
        let probability = 1.0 / (1.0 + (-logit).exp());
        let class = u8::from(probability >= self.threshold);
        Ok(Prediction {
            label: AttritionLabel::from_class(class),
            probability,
        })
    }
}

/// One classifier decision for one record.
#[derive(Debug, Clone, Copy)]
pub struct Prediction {
    pub label: AttritionLabel,
    pub probability: f32,
}

/// Artifact metadata reported by the service.
#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub feature_names: Vec<String>,
    pub categorical_cols: Vec<String>,
    pub threshold: f32,
    pub version: String,
}

/// The pre-trained prediction artifact: the categorical columns to
/// validate, the fitted encoder and the fitted classifier. Loaded once at
/// startup, read-only afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct AttritionArtifact {
    pub categorical_cols: Vec<String>,
    pub preprocessing: ColumnEncoder,
    pub model: LinearClassifier,
}

impl AttritionArtifact {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: AttritionArtifact = serde_json::from_str(&raw)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Cross-checks the three parts against each other and against the
    /// record's known columns. A failure here is fatal at startup.
    fn validate(&self) -> Result<(), ArtifactError> {
        for col in &self.categorical_cols {
            if !EmployeeRecord::CATEGORICAL_FIELDS.contains(&col.as_str()) {
                return Err(ArtifactError::Invalid(format!(
                    "unknown categorical column {col}"
                )));
            }
        }
        for num in &self.preprocessing.numeric {
            if !EmployeeRecord::NUMERIC_FIELDS.contains(&num.column.as_str()) {
                return Err(ArtifactError::Invalid(format!(
                    "unknown numeric column {}",
                    num.column
                )));
            }
            if num.std <= 0.0 {
                return Err(ArtifactError::Invalid(format!(
                    "non-positive std for {}",
                    num.column
                )));
            }
        }
        for cat in &self.preprocessing.categorical {
            if !EmployeeRecord::CATEGORICAL_FIELDS.contains(&cat.column.as_str()) {
                return Err(ArtifactError::Invalid(format!(
                    "unknown categorical column {}",
                    cat.column
                )));
            }
            if cat.categories.is_empty() {
                return Err(ArtifactError::Invalid(format!(
                    "empty vocabulary for {}",
                    cat.column
                )));
            }
        }
        let names = self.preprocessing.feature_names();
        if self.model.feature_names != names {
            return Err(ArtifactError::Invalid(
                "classifier feature names do not match the encoder output".into(),
            ));
        }
        if self.model.coefficients.len() != names.len() {
            return Err(ArtifactError::Invalid(format!(
                "classifier expects {} coefficients, artifact has {}",
                names.len(),
                self.model.coefficients.len()
            )));
        }
        Ok(())
    }

    /// Columns the record must fill before a prediction is attempted.
    pub fn missing_fields<'a>(&'a self, record: &EmployeeRecord) -> Vec<&'a str> {
        record.missing_fields(&self.categorical_cols)
    }

    /// Encode and classify one validated record. Pure: the same record
    /// always produces the same prediction.
    pub fn predict(&self, record: &EmployeeRecord) -> Result<Prediction, PredictError> {
        let features = self.preprocessing.transform(record)?;
        self.model.classify(&features)
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            feature_names: self.model.feature_names.clone(),
            categorical_cols: self.categorical_cols.clone(),
            threshold: self.model.threshold,
            version: self.model.version.clone(),
        }
    }
}

fn artifact_path() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let installed = dir.join(ARTIFACT_FILE);
            if installed.exists() {
                return installed;
            }
        }
    }
    PathBuf::from(ARTIFACT_FILE)
}

/// Process-wide artifact accessor. The first call loads and validates the
/// file; later calls return the same shared instance.
pub fn get_artifact() -> Result<Arc<AttritionArtifact>, ArtifactError> {
    ARTIFACT
        .get_or_try_init(|| {
            let path = artifact_path();
            let artifact = AttritionArtifact::load(&path)?;
            info!(
                "artifact loaded from {}: {} features, model v{}",
                path.display(),
                artifact.model.feature_names.len(),
                artifact.model.version
            );
            Ok(Arc::new(artifact))
        })
        .map(Arc::clone)
}

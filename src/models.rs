use serde::{Deserialize, Serialize};

/// Display messages, one per outcome. Exactly one is shown per trigger.
pub const MSG_MISSING_FIELDS: &str = "🚫 Please fill in all the fields.";
pub const MSG_LIKELY_LEAVE: &str = "⚠️ Prediction: The employee is likely to leave.";
pub const MSG_LIKELY_STAY: &str = "✅ Prediction: The employee is likely to stay.";

/// One employee record as submitted by the form.
///
/// Wire names match the column names the artifact was fitted on. Numeric
/// fields default to 0 and are always valid; categorical fields default to
/// the empty-string sentinel and must be filled before prediction.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct EmployeeRecord {
    pub age: u32,
    pub num_companies_worked: u32,
    pub years_at_company: u32,
    pub business_travel: String,
    pub department: String,
    pub education_field: String,
    pub job_role: String,
    pub marital_status: String,
    pub over_time: String,
}

impl EmployeeRecord {
    pub const NUMERIC_FIELDS: [&'static str; 3] =
        ["Age", "NumCompaniesWorked", "YearsAtCompany"];
    pub const CATEGORICAL_FIELDS: [&'static str; 6] = [
        "BusinessTravel",
        "Department",
        "EducationField",
        "JobRole",
        "MaritalStatus",
        "OverTime",
    ];

    /// Current value of a categorical column, by its wire name.
    pub fn categorical(&self, column: &str) -> Option<&str> {
        match column {
            "BusinessTravel" => Some(&self.business_travel),
            "Department" => Some(&self.department),
            "EducationField" => Some(&self.education_field),
            "JobRole" => Some(&self.job_role),
            "MaritalStatus" => Some(&self.marital_status),
            "OverTime" => Some(&self.over_time),
            _ => None,
        }
    }

    /// Current value of a numeric column, by its wire name.
    pub fn numeric(&self, column: &str) -> Option<f32> {
        match column {
            "Age" => Some(self.age as f32),
            "NumCompaniesWorked" => Some(self.num_companies_worked as f32),
            "YearsAtCompany" => Some(self.years_at_company as f32),
            _ => None,
        }
    }

    /// Columns from `categorical_cols` still holding the unset sentinel.
    /// Numeric fields always carry a value and are never reported.
    pub fn missing_fields<'a>(&self, categorical_cols: &'a [String]) -> Vec<&'a str> {
        categorical_cols
            .iter()
            .filter(|col| !matches!(self.categorical(col.as_str()), Some(v) if !v.is_empty()))
            .map(String::as_str)
            .collect()
    }
}

/// Classifier output class. Class 1 means the employee is likely to leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttritionLabel {
    Yes,
    No,
}

impl AttritionLabel {
    pub fn from_class(class: u8) -> Self {
        if class == 1 {
            AttritionLabel::Yes
        } else {
            AttritionLabel::No
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttritionLabel::Yes => "Yes",
            AttritionLabel::No => "No",
        }
    }
}

/// One displayed prediction. Recomputed on every trigger, never stored.
#[derive(Debug, Serialize, Clone)]
pub struct PredictionResult {
    pub attrition: AttritionLabel,
    pub probability: f32,
    pub message: String,
    pub model_version: String,
}

impl PredictionResult {
    pub fn new(label: AttritionLabel, probability: f32, model_version: &str) -> Self {
        let message = match label {
            AttritionLabel::Yes => MSG_LIKELY_LEAVE,
            AttritionLabel::No => MSG_LIKELY_STAY,
        };
        PredictionResult {
            attrition: label,
            probability,
            message: message.to_string(),
            model_version: model_version.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: String,
    pub execution_time_ms: Option<u64>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            execution_time_ms: None,
        }
    }

    pub fn error(message: &str) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
            execution_time_ms: None,
        }
    }
}

use super::views::ReportModel;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    Excel,
    Word,
}

impl ReportFormat {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Excel => "Excel",
            Self::Word => "Word",
        }
    }
}

/// Rendering sink. Takes the model by value: a report is rendered once and not
/// touched afterwards.
pub trait ReportRenderer {
    type Output;
    type Error: std::error::Error;

    fn render(&self, report: ReportModel) -> Result<Self::Output, Self::Error>;
}

/// Serializes the model as JSON, the hand-off format for the document writers.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReportRenderer {
    pub pretty: bool,
}

impl ReportRenderer for JsonReportRenderer {
    type Output = Vec<u8>;
    type Error = serde_json::Error;

    fn render(&self, report: ReportModel) -> Result<Self::Output, Self::Error> {
        if self.pretty {
            serde_json::to_vec_pretty(&report)
        } else {
            serde_json::to_vec(&report)
        }
    }
}

/// `<Name>_Inspection_Report_<Excel|Word>_<YYYYMMDD_HHMMSS>`, with the name reduced
/// to filename-safe characters.
pub fn report_filename(name: &str, format: ReportFormat, at: NaiveDateTime) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let cleaned = cleaned.trim().replace(' ', "_");
    let cleaned = if cleaned.is_empty() {
        "Property".to_string()
    } else {
        cleaned
    };

    format!(
        "{cleaned}_Inspection_Report_{}_{}",
        format.label(),
        at.format("%Y%m%d_%H%M%S")
    )
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw OCR output split into the two views every extractor reads.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrText {
    pub full_text: String,
    /// Trimmed, non-empty lines in document order.
    pub lines: Vec<String>,
}

impl OcrText {
    pub fn new(text: &str) -> Self {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        OcrText {
            full_text: text.to_string(),
            lines,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "MALE",
            Sex::Female => "FEMALE",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed name components. `full_names` is always the joined token list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NameParts {
    pub full_names: String,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
}

impl NameParts {
    /// Split a single name run: first token, last token, anything between.
    pub fn from_tokens(tokens: &[String]) -> Option<Self> {
        if tokens.is_empty() {
            return None;
        }
        let last_name = if tokens.len() >= 2 {
            tokens.last().cloned()
        } else {
            None
        };
        let middle_name = if tokens.len() >= 3 {
            Some(tokens[1..tokens.len() - 1].join(" "))
        } else {
            None
        };
        Some(NameParts {
            full_names: tokens.join(" "),
            first_name: Some(tokens[0].clone()),
            middle_name,
            last_name,
        })
    }

    /// Build from separately labelled given names and surname.
    pub fn from_given_and_surname(given: &[String], surname: &[String]) -> Option<Self> {
        if given.is_empty() && surname.is_empty() {
            return None;
        }
        let full_names = given
            .iter()
            .chain(surname.iter())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        let middle_name = if given.len() >= 2 {
            Some(given[1..].join(" "))
        } else {
            None
        };
        Some(NameParts {
            full_names,
            first_name: given.first().cloned(),
            middle_name,
            last_name: if surname.is_empty() {
                None
            } else {
                Some(surname.join(" "))
            },
        })
    }
}

/// Everything the extractors found, before the success gate is applied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedFields {
    pub id_number: Option<String>,
    pub serial_number: Option<String>,
    pub names: Option<NameParts>,
    pub date_of_birth: Option<String>,
    pub date_of_issue: Option<String>,
    pub sex: Option<Sex>,
    pub district_of_birth: Option<String>,
    pub place_of_issue: Option<String>,
}

/// Account holder name a scan is checked against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedIdentity {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl ExpectedIdentity {
    pub fn new(first_name: Option<&str>, last_name: Option<&str>) -> Self {
        let clean = |name: Option<&str>| {
            name.map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
        };
        ExpectedIdentity {
            first_name: clean(first_name),
            last_name: clean(last_name),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none()
    }

    pub fn display_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .iter()
            .flatten()
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of one scan, in the shape handed to UI and submission code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub success: bool,
    pub id_number: Option<String>,
    pub serial_number: Option<String>,
    pub full_names: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub date_of_issue: Option<String>,
    pub sex: Option<Sex>,
    pub district_of_birth: Option<String>,
    pub place_of_issue: Option<String>,
    pub full_text: String,
    pub confidence: f32,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ScanResult {
    pub fn from_fields(
        fields: ExtractedFields,
        full_text: String,
        confidence: f32,
        errors: Vec<String>,
        warnings: Vec<String>,
    ) -> Self {
        let names = fields.names.unwrap_or_default();
        let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };
        ScanResult {
            success: fields.id_number.is_some(),
            id_number: fields.id_number,
            serial_number: fields.serial_number,
            full_names: non_empty(names.full_names),
            first_name: names.first_name,
            middle_name: names.middle_name,
            last_name: names.last_name,
            date_of_birth: fields.date_of_birth,
            date_of_issue: fields.date_of_issue,
            sex: fields.sex,
            district_of_birth: fields.district_of_birth,
            place_of_issue: fields.place_of_issue,
            full_text,
            confidence,
            errors,
            warnings,
        }
    }

    /// A scan that produced no usable data at all.
    pub fn failed(message: impl Into<String>) -> Self {
        ScanResult::from_fields(
            ExtractedFields::default(),
            String::new(),
            0.0,
            vec![message.into()],
            Vec::new(),
        )
    }

    pub fn names(&self) -> Option<NameParts> {
        self.full_names.as_ref().map(|full| NameParts {
            full_names: full.clone(),
            first_name: self.first_name.clone(),
            middle_name: self.middle_name.clone(),
            last_name: self.last_name.clone(),
        })
    }

    /// Typed view of the scan. Callers branch on this rather than on
    /// `success`, so fields are only reachable when an ID number exists.
    pub fn outcome(&self) -> ScanOutcome {
        match &self.id_number {
            Some(id_number) => ScanOutcome::Extracted {
                fields: IdFields {
                    id_number: id_number.clone(),
                    serial_number: self.serial_number.clone(),
                    names: self.names(),
                    date_of_birth: self.date_of_birth.clone(),
                    date_of_issue: self.date_of_issue.clone(),
                    sex: self.sex,
                    district_of_birth: self.district_of_birth.clone(),
                    place_of_issue: self.place_of_issue.clone(),
                },
                warnings: self.warnings.clone(),
            },
            None => ScanOutcome::Failed {
                reason: self
                    .errors
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "No ID number was detected".to_string()),
            },
        }
    }
}

/// Fields of a successful scan; the ID number is guaranteed present.
#[derive(Debug, Clone, PartialEq)]
pub struct IdFields {
    pub id_number: String,
    pub serial_number: Option<String>,
    pub names: Option<NameParts>,
    pub date_of_birth: Option<String>,
    pub date_of_issue: Option<String>,
    pub sex: Option<Sex>,
    pub district_of_birth: Option<String>,
    pub place_of_issue: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Extracted { fields: IdFields, warnings: Vec<String> },
    Failed { reason: String },
}

impl ScanOutcome {
    pub fn is_extracted(&self) -> bool {
        matches!(self, ScanOutcome::Extracted { .. })
    }
}

use crate::PathExtension;
use std::path::Path;

/// Represents the extension of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileExtension {
    /// CSV file extension.
    Csv,
    /// Excel 2007+ workbook.
    Xlsx,
    /// Legacy Excel workbook.
    Xls,
    /// Unknown file extension, storing the extension as a string.
    Unknown(String),
    /// Missing file extension, when no extension is present in the path.
    Missing,
}

impl FileExtension {
    /// Determines the file extension from a given path.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension_as_lowercase()
            .as_deref() // Converts `Option<String>` to `Option<&str>` for matching.
        {
            Some("csv") => FileExtension::Csv,
            Some("xlsx") => FileExtension::Xlsx,
            Some("xls") => FileExtension::Xls,
            Some(ext) => FileExtension::Unknown(ext.to_owned()),
            None => FileExtension::Missing,
        }
    }

    pub fn is_excel(&self) -> bool {
        matches!(self, FileExtension::Xlsx | FileExtension::Xls)
    }

    /// Short name shown next to the selected file ("CSV" or "EXCEL").
    pub fn kind(&self) -> &'static str {
        match self {
            FileExtension::Csv => "CSV",
            FileExtension::Xlsx | FileExtension::Xls => "EXCEL",
            FileExtension::Unknown(_) | FileExtension::Missing => "UNKNOWN",
        }
    }
}

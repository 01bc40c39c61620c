// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Exchange file header.

/// Decoded `FILE_DESCRIPTION`, `FILE_NAME` and `FILE_SCHEMA` records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderInfo {
    /// Free-form description lines.
    pub description: Vec<String>,
    /// Implementation level, usually `2;1`.
    pub implementation_level: String,
    /// Name of the file.
    pub file_name: String,
    /// Creation timestamp as written in the file.
    pub time_stamp: String,
    /// Authors.
    pub author: Vec<String>,
    /// Organisations.
    pub organization: Vec<String>,
    /// Tool that produced the text.
    pub preprocessor_version: String,
    /// Application that produced the data.
    pub originating_system: String,
    /// Authorising person.
    pub authorization: String,
    /// Schema identifiers; the writer falls back to the model's schema name
    /// when empty.
    pub schema: Vec<String>,
}

impl HeaderInfo {
    /// Header naming `file_name` and this tool as originating system.
    pub fn for_file(file_name: &str) -> Self {
        Self {
            description: vec!["ViewDefinition [CoordinationView]".to_owned()],
            implementation_level: "2;1".to_owned(),
            file_name: file_name.to_owned(),
            preprocessor_version: "graft".to_owned(),
            originating_system: "graft".to_owned(),
            ..Self::default()
        }
    }
}

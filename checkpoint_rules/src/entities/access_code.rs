//! Access code definitions.

use serde::{Deserialize, Serialize};

use super::FactionId;
use crate::clock::ValidityWindow;
use crate::mechanics::CodeType;

/// A credential string issued by command.
///
/// Whether a code is valid is derived from the day; nothing here stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessCode {
    pub code: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub code_type: CodeType,
    #[serde(flatten)]
    pub window: ValidityWindow,
    #[serde(default)]
    pub revoked: bool,
    /// Empty = any faction may present it.
    #[serde(default)]
    pub authorized_factions: Vec<FactionId>,
    #[serde(default)]
    pub red_herring: bool,
    /// The code whose textual shape this one imitates.
    #[serde(default)]
    pub mimics: Option<String>,
}

impl AccessCode {
    /// Create a standard, unrevoked code open to every faction.
    pub fn new(code: impl Into<String>, valid_from_day: u32, valid_until_day: Option<u32>) -> Self {
        Self {
            code: code.into(),
            label: String::new(),
            code_type: CodeType::Standard,
            window: ValidityWindow::new(valid_from_day, valid_until_day),
            revoked: false,
            authorized_factions: Vec::new(),
            red_herring: false,
            mimics: None,
        }
    }

    /// Set the code type.
    pub fn with_type(mut self, code_type: CodeType) -> Self {
        self.code_type = code_type;
        self
    }

    /// Restrict the code to a faction. May be called repeatedly.
    pub fn with_faction(mut self, faction: impl Into<String>) -> Self {
        self.authorized_factions.push(FactionId::new(faction));
        self
    }

    /// Mark the code revoked.
    pub fn revoke(mut self) -> Self {
        self.revoked = true;
        self
    }

    /// Text before the first `-`, or the whole code when there is none.
    pub fn prefix(&self) -> &str {
        code_prefix(&self.code)
    }

    /// Not revoked and inside its validity window.
    pub fn is_valid_on(&self, day: u32) -> bool {
        !self.revoked && self.window.contains(day)
    }

    /// Empty allowlist means unrestricted.
    pub fn is_authorized_for(&self, faction: &FactionId) -> bool {
        self.authorized_factions.is_empty() || self.authorized_factions.contains(faction)
    }
}

/// Parse the prefix of any code string.
pub fn code_prefix(code: &str) -> &str {
    code.split_once('-').map(|(prefix, _)| prefix).unwrap_or(code)
}

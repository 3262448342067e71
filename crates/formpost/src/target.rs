use core::str::FromStr;
use std::collections::HashMap;

use serde::Serialize;

/// Where the posts of a submission go: the account they are posted from and
/// the worksheet holding that account's rows.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TargetSelection {
    pub account_id: String,
    pub worksheet: String,
}

impl TargetSelection {
    pub fn new(account_id: impl Into<String>, worksheet: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            worksheet: worksheet.into(),
        }
    }
}

/// Errors raised while building a [`TargetTable`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("expected LABEL=ACCOUNT:WORKSHEET, got {0:?}")]
    Malformed(String),
    #[error("target label {0:?} is mapped twice")]
    DuplicateLabel(String),
    #[error("worksheet {0:?} is the target of more than one label")]
    DuplicateWorksheet(String),
}

/// The closed mapping from form labels to targets.
///
/// Labels and worksheets are both unique, so the mapping is injective.
/// Lookups are exact, including surrounding whitespace; an unknown label
/// resolves to nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetTable {
    entries: HashMap<String, TargetSelection>,
}

impl TargetTable {
    /// Builds a table from `(label, target)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if a label or a worksheet appears twice.
    pub fn new<I, L>(entries: I) -> Result<Self, TargetError>
    where
        I: IntoIterator<Item = (L, TargetSelection)>,
        L: Into<String>,
    {
        let mut table: HashMap<String, TargetSelection> = HashMap::new();
        for (label, target) in entries {
            let label = label.into();
            if table.values().any(|t| t.worksheet == target.worksheet) {
                return Err(TargetError::DuplicateWorksheet(target.worksheet));
            }
            if table.insert(label.clone(), target).is_some() {
                return Err(TargetError::DuplicateLabel(label));
            }
        }
        Ok(Self { entries: table })
    }

    /// Builds a table from parsed `LABEL=ACCOUNT:WORKSHEET` entries.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn from_entries(
        entries: impl IntoIterator<Item = TargetEntry>,
    ) -> Result<Self, TargetError> {
        Self::new(entries.into_iter().map(|e| (e.label, e.target)))
    }

    pub fn resolve(&self, label: &str) -> Option<&TargetSelection> {
        self.entries.get(label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One `LABEL=ACCOUNT:WORKSHEET` entry. The label is everything before the
/// last `=`, so labels may contain `=`; account and worksheet are split at the
/// first `:`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetEntry {
    pub label: String,
    pub target: TargetSelection,
}

impl FromStr for TargetEntry {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || TargetError::Malformed(s.to_string());
        let (label, rest) = s.rsplit_once('=').ok_or_else(malformed)?;
        let (account, worksheet) = rest.split_once(':').ok_or_else(malformed)?;
        let (label, account, worksheet) = (label.trim(), account.trim(), worksheet.trim());
        if label.is_empty() || account.is_empty() || worksheet.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            label: label.to_string(),
            target: TargetSelection::new(account, worksheet),
        })
    }
}

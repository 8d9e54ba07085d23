use serde::{Deserialize, Serialize};
use std::fmt;

/// The four kinds of record a user can keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    LoginSecret,
    TextSecret,
    CardSecret,
    Blob,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::LoginSecret,
        RecordKind::TextSecret,
        RecordKind::CardSecret,
        RecordKind::Blob,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::LoginSecret => "login_secret",
            RecordKind::TextSecret => "text_secret",
            RecordKind::CardSecret => "card_secret",
            RecordKind::Blob => "blob",
        }
    }

    /// Path segment under `/api/user/upload/`.
    pub fn upload_segment(self) -> &'static str {
        match self {
            RecordKind::LoginSecret => "logopass",
            RecordKind::TextSecret => "text",
            RecordKind::CardSecret => "credit-card",
            RecordKind::Blob => "binary",
        }
    }

    /// Path segment under `/api/user/download/` for the full listing.
    /// Blobs are listed as metadata only.
    pub fn download_segment(self) -> &'static str {
        match self {
            RecordKind::LoginSecret => "logopasses",
            RecordKind::TextSecret => "texts",
            RecordKind::CardSecret => "credit-cards",
            RecordKind::Blob => "binary-list",
        }
    }

    /// File name of the local collection.
    pub fn file_name(self) -> &'static str {
        match self {
            RecordKind::LoginSecret => "logo_passes.json",
            RecordKind::TextSecret => "text_data.json",
            RecordKind::CardSecret => "credit_cards.json",
            RecordKind::Blob => "binary_list.json",
        }
    }

    /// Table name in the remote store.
    pub fn table_name(self) -> &'static str {
        match self {
            RecordKind::LoginSecret => "logo_passes",
            RecordKind::TextSecret => "text_data",
            RecordKind::CardSecret => "credit_cards",
            RecordKind::Blob => "binary_data",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

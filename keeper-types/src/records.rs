//! Wire structs for the four record kinds.
//!
//! Field names match the JSON bodies the remote API accepts. Secret fields
//! hold base64 ciphertext everywhere except in memory right before display.

use crate::kind::RecordKind;
use crate::record::{Record, RecordMeta};
use serde::{Deserialize, Serialize};

/// Login and password pair for some external service, keyed by description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSecret {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub description: String,
    pub secret_login: String,
    #[serde(rename = "secret")]
    pub secret_password: String,
}

impl LoginSecret {
    pub fn new(description: &str, login: &str, password: &str) -> Self {
        Self {
            meta: RecordMeta::default(),
            description: description.to_string(),
            secret_login: login.to_string(),
            secret_password: password.to_string(),
        }
    }
}

impl Record for LoginSecret {
    const KIND: RecordKind = RecordKind::LoginSecret;

    fn unique_key(&self) -> &str {
        &self.description
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn secret_fields_mut(&mut self) -> Vec<&mut String> {
        vec![&mut self.secret_login, &mut self.secret_password]
    }
}

/// Free-form text, keyed by description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSecret {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub description: String,
    #[serde(rename = "data")]
    pub text: String,
}

impl TextSecret {
    pub fn new(description: &str, text: &str) -> Self {
        Self {
            meta: RecordMeta::default(),
            description: description.to_string(),
            text: text.to_string(),
        }
    }
}

impl Record for TextSecret {
    const KIND: RecordKind = RecordKind::TextSecret;

    fn unique_key(&self) -> &str {
        &self.description
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn secret_fields_mut(&mut self) -> Vec<&mut String> {
        vec![&mut self.text]
    }
}

/// Payment card, keyed by card number. The number stays plaintext because it
/// is the uniqueness key; holder, due date and CVV are encrypted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSecret {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub number: String,
    pub holder: String,
    pub due_date: String,
    pub cvv: String,
    #[serde(default)]
    pub description: String,
}

impl CardSecret {
    pub fn new(number: &str, holder: &str, due_date: &str, cvv: &str) -> Self {
        Self {
            meta: RecordMeta::default(),
            number: number.to_string(),
            holder: holder.to_string(),
            due_date: due_date.to_string(),
            cvv: cvv.to_string(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

impl Record for CardSecret {
    const KIND: RecordKind = RecordKind::CardSecret;

    fn unique_key(&self) -> &str {
        &self.number
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn secret_fields_mut(&mut self) -> Vec<&mut String> {
        vec![&mut self.holder, &mut self.due_date, &mut self.cvv]
    }
}

/// Opaque binary content, keyed by description.
///
/// Listings and the local vault carry metadata only (`content == None`).
/// Content moves only on an explicit upload or fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRecord {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub description: String,
    #[serde(rename = "binary", default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl BlobRecord {
    pub fn new(description: &str, content: Option<String>) -> Self {
        Self {
            meta: RecordMeta::default(),
            description: description.to_string(),
            content,
        }
    }

    /// Metadata projection of this record.
    pub fn metadata(&self) -> Self {
        Self {
            meta: RecordMeta {
                overwrite: false,
                ..self.meta.clone()
            },
            description: self.description.clone(),
            content: None,
        }
    }
}

impl Record for BlobRecord {
    const KIND: RecordKind = RecordKind::Blob;

    fn unique_key(&self) -> &str {
        &self.description
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn secret_fields_mut(&mut self) -> Vec<&mut String> {
        self.content.iter_mut().collect()
    }

    // Remote metadata never clobbers content already held locally.
    fn adopt_remote(&self, remote: &Self) -> Self {
        let mut merged = remote.clone();
        if merged.content.is_none() {
            merged.content = self.content.clone();
        }
        merged
    }

    fn for_push(&self) -> Self {
        let mut out = self.metadata();
        out.meta.overwrite = true;
        out
    }
}

/// Body of the blob fetch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobSelector {
    pub description: String,
}

/// Body of the register and login requests.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

//! Record service.
//!
//! Orchestrates the cipher, the local vault and the remote API for one
//! client. The service itself holds no session; callers get a [`Session`]
//! from [`RecordService::register`] or [`RecordService::login`] and pass it
//! to every operation.

use crate::api_client::KeeperApiClient;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::Session;
use keeper_crypto::{decrypt_from_base64, derive_owner_key, encrypt_to_base64};
use keeper_sync::{reconcile, MergeStats};
use keeper_types::{
    BlobRecord, CardSecret, LoginSecret, Record, RecordKind, TextSecret, now_millis,
};
use keeper_vault::{LocalVault, VaultResult};
use tracing::{debug, info, warn};

/// Notice shown when a reconciliation could not reach the remote.
pub const OFFLINE_NOTICE: &str =
    "Update failed due to poor internet connection, continuing offline";

/// Outcome of reconciling one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindReport {
    pub kind: RecordKind,
    pub stats: MergeStats,
    /// Pushes the remote accepted.
    pub pushed: usize,
    /// Pushes the remote rejected or that failed in transit.
    pub push_failed: usize,
    /// Blob pushes left for an explicit upload.
    pub deferred: usize,
    /// Why the kind could not be reconciled at all.
    pub error: Option<String>,
}

impl KindReport {
    fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            stats: MergeStats::default(),
            pushed: 0,
            push_failed: 0,
            deferred: 0,
            error: None,
        }
    }
}

/// Outcome of reconciling every kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub kinds: Vec<KindReport>,
    /// Set when the remote was unreachable for at least one kind.
    pub offline: bool,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        !self.offline && self.kinds.iter().all(|k| k.error.is_none() && k.push_failed == 0)
    }

    pub fn kind(&self, kind: RecordKind) -> Option<&KindReport> {
        self.kinds.iter().find(|k| k.kind == kind)
    }
}

/// Runs a vault call on the blocking pool.
async fn with_vault<T, F>(vault: &LocalVault, f: F) -> ClientResult<T>
where
    F: FnOnce(LocalVault) -> VaultResult<T> + Send + 'static,
    T: Send + 'static,
{
    let vault = vault.clone();
    Ok(tokio::task::spawn_blocking(move || f(vault)).await??)
}

pub struct RecordService {
    api: KeeperApiClient,
    config: ClientConfig,
}

impl RecordService {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        Ok(Self {
            api: KeeperApiClient::new(&config)?,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &KeeperApiClient {
        &self.api
    }

    // ── Session lifecycle ──

    /// Creates the account and opens a session. No reconciliation runs.
    pub async fn register(&self, login: &str, password: &str) -> ClientResult<Session> {
        self.api.register(login, password).await?;
        info!("registered {login}");
        self.open_session(login, password).await
    }

    /// Authenticates, opens a session and reconciles every kind.
    ///
    /// Losing the network during reconciliation does not fail the login; the
    /// report is marked offline instead.
    pub async fn login(
        &self,
        login: &str,
        password: &str,
    ) -> ClientResult<(Session, ReconcileReport)> {
        self.api.login(login, password).await?;
        let session = self.open_session(login, password).await?;
        let report = self.reconcile_all(&session).await;
        if report.offline {
            warn!("{OFFLINE_NOTICE}");
        }
        Ok((session, report))
    }

    /// Ends the session. The key is zeroized when `session` drops here.
    pub async fn logout(&self, session: Session) {
        self.api.logout().await;
        info!("{} logged out", session.owner());
    }

    async fn open_session(&self, login: &str, password: &str) -> ClientResult<Session> {
        let params = self.config.kdf;
        let (owner, pw) = (login.to_string(), password.to_string());
        let key =
            tokio::task::spawn_blocking(move || derive_owner_key(&owner, &pw, &params)).await??;

        let base = self.config.vault_dir.clone();
        let owner = login.to_string();
        let vault = tokio::task::spawn_blocking(move || LocalVault::open(base, &owner)).await??;
        Ok(Session::new(login, key, vault))
    }

    // ── Records ──

    /// Encrypts and stores `record` locally, then uploads it.
    ///
    /// The local write happens first. When the remote rejects the upload
    /// (`AlreadyExists` or `OldData`) the local write is undone, so the
    /// rejected version is never pushed by a later reconciliation; the
    /// caller decides whether to retry with `overwrite`. Any other upload
    /// failure leaves the record local for the next reconciliation. Either
    /// way the error is returned. Returns the plaintext record with its
    /// local id.
    pub async fn put_record<R: Record>(
        &self,
        session: &Session,
        mut record: R,
        overwrite: bool,
    ) -> ClientResult<R> {
        record.meta_mut().updated_at = now_millis();
        record.meta_mut().overwrite = overwrite;

        let sealed = session.seal(record.clone())?;
        let local = sealed.clone();
        let (stored, previous) =
            with_vault(session.vault(), move |v| v.upsert_tracked(local)).await?;
        record.meta_mut().id = stored.meta().id;

        match self.api.upload(&sealed).await {
            Ok(()) => {}
            Err(e @ (ClientError::AlreadyExists(_) | ClientError::OldData)) => {
                debug!(
                    "{} {} rejected by remote, undoing local write",
                    R::KIND,
                    stored.unique_key()
                );
                with_vault(session.vault(), move |v| v.restore_one(&stored, previous)).await?;
                return Err(e);
            }
            Err(e) => return Err(e),
        }
        record.meta_mut().overwrite = false;
        Ok(record)
    }

    /// Decrypted copy of the local collection, for display.
    pub async fn get_records<R: Record>(&self, session: &Session) -> ClientResult<Vec<R>> {
        let sealed = with_vault(session.vault(), |v| v.load_collection::<R>()).await?;
        sealed.into_iter().map(|r| session.open(r)).collect()
    }

    pub async fn login_secrets(&self, session: &Session) -> ClientResult<Vec<LoginSecret>> {
        self.get_records(session).await
    }

    pub async fn text_secrets(&self, session: &Session) -> ClientResult<Vec<TextSecret>> {
        self.get_records(session).await
    }

    pub async fn card_secrets(&self, session: &Session) -> ClientResult<Vec<CardSecret>> {
        self.get_records(session).await
    }

    /// Blob metadata held locally.
    pub async fn blob_list(&self, session: &Session) -> ClientResult<Vec<BlobRecord>> {
        with_vault(session.vault(), |v| v.load_collection::<BlobRecord>()).await
    }

    /// Encrypts and uploads `content`, then records the blob's metadata
    /// locally. Nothing is recorded when the upload fails, since the vault
    /// never holds content to retry from.
    pub async fn put_blob(
        &self,
        session: &Session,
        description: &str,
        content: &[u8],
        overwrite: bool,
    ) -> ClientResult<BlobRecord> {
        let mut blob = BlobRecord::new(description, Some(encrypt_to_base64(session.key(), content)?));
        blob.meta.updated_at = now_millis();
        blob.meta.overwrite = overwrite;

        self.api.upload(&blob).await?;

        // The remote now holds this version; mirror it even over a local-only entry.
        let mut local = blob.metadata();
        local.meta.overwrite = true;
        with_vault(session.vault(), move |v| v.upsert_one(local)).await
    }

    /// Downloads and decrypts a blob's content.
    pub async fn fetch_blob(&self, session: &Session, description: &str) -> ClientResult<Vec<u8>> {
        let blob = self.api.fetch_blob(description).await?;
        let content = blob
            .content
            .ok_or_else(|| ClientError::Decode(format!("blob {description} has no content")))?;
        Ok(decrypt_from_base64(session.key(), &content)?)
    }

    // ── Reconciliation ──

    /// Reconciles all four kinds concurrently. Never fails as a whole: each
    /// kind's failure is recorded in its [`KindReport`].
    pub async fn reconcile_all(&self, session: &Session) -> ReconcileReport {
        let (logins, texts, cards, blobs) = tokio::join!(
            self.reconcile_kind::<LoginSecret>(session),
            self.reconcile_kind::<TextSecret>(session),
            self.reconcile_kind::<CardSecret>(session),
            self.reconcile_kind::<BlobRecord>(session),
        );

        let mut report = ReconcileReport::default();
        for (kind, result) in [
            (RecordKind::LoginSecret, logins),
            (RecordKind::TextSecret, texts),
            (RecordKind::CardSecret, cards),
            (RecordKind::Blob, blobs),
        ] {
            match result {
                Ok(kind_report) => report.kinds.push(kind_report),
                Err(e) => {
                    report.offline |= e.is_offline();
                    warn!("reconciling {kind} failed: {e}");
                    let mut failed = KindReport::new(kind);
                    failed.error = Some(e.to_string());
                    report.kinds.push(failed);
                }
            }
        }
        report
    }

    /// Pull, merge under the collection lock, then replay pushes.
    ///
    /// Blob pushes are not replayed: content uploads are an explicit user
    /// action, so they are only counted as deferred.
    pub async fn reconcile_kind<R: Record>(&self, session: &Session) -> ClientResult<KindReport> {
        let remote = match self.api.download_all::<R>().await {
            Ok(records) => records,
            Err(ClientError::Empty) => Vec::new(),
            Err(e) => return Err(e),
        };

        let (push, stats) = with_vault(session.vault(), move |v| {
            v.modify_collection(move |local: Vec<R>| {
                let merged = reconcile(local, remote);
                Ok((merged.merged, (merged.push, merged.stats)))
            })
        })
        .await?;

        let mut report = KindReport::new(R::KIND);
        report.stats = stats;

        if R::KIND == RecordKind::Blob {
            report.deferred = push.len();
            return Ok(report);
        }

        for record in &push {
            match self.api.upload(record).await {
                Ok(()) => report.pushed += 1,
                Err(e) => {
                    debug!("push of {} {} failed: {e}", R::KIND, record.unique_key());
                    report.push_failed += 1;
                }
            }
        }
        Ok(report)
    }
}

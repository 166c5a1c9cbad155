//! In-memory fakes for service tests.
//!
//! `FakeStore` implements every repository port plus the transaction
//! backend. A session works on a private copy of the committed tables;
//! commit swaps that copy in, anything else throws it away.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use wordhoard_core::{AppError, AppResult};
use wordhoard_domain::{
    ExternalAuth, NewExternalAuth, NewUser, Patch, User, UserConfig, UserId, UserUpdateFields,
};

use crate::{
    CallContext, ExternalAuthRepository, IdentityTokenDecoder, PasswordHasher, Session,
    SessionTokenIssuer, SignupClaims, SignupService, TransactionBackend, TransactionManager,
    UserConfigRepository, UserRepository, UserService, UserStores,
};

#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    pub(crate) users: BTreeMap<UserId, User>,
    pub(crate) external_auths: Vec<ExternalAuth>,
    pub(crate) configs: BTreeMap<UserId, UserConfig>,
}

struct FakeSession {
    staged: Mutex<Tables>,
}

#[derive(Default)]
pub(crate) struct FakeStore {
    committed: Mutex<Tables>,
    pub(crate) begins: AtomicUsize,
    pub(crate) commits: AtomicUsize,
    pub(crate) rollbacks: AtomicUsize,
    pub(crate) abandons: AtomicUsize,
    pub(crate) writes: AtomicUsize,
    pub(crate) fail_begin: AtomicBool,
    pub(crate) fail_commit: AtomicBool,
    pub(crate) fail_rollback: AtomicBool,
    pub(crate) fail_user_soft_delete: AtomicBool,
    pub(crate) fail_config_create: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> AppResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|error| AppError::Internal(format!("failed to lock fake store: {error}")))
}

fn staged(session: &Session) -> AppResult<MutexGuard<'_, Tables>> {
    session.ensure_active()?;
    lock(&session.state::<FakeSession>()?.staged)
}

impl FakeStore {
    pub(crate) fn seed(&self, user: User) -> User {
        if let Ok(mut tables) = lock(&self.committed) {
            tables
                .configs
                .insert(user.id, UserConfig::default_for(user.id));
            tables.users.insert(user.id, user.clone());
        }
        user
    }

    pub(crate) fn seed_link(&self, user_id: UserId, provider: &str, subject: &str) {
        if let Ok(mut tables) = lock(&self.committed) {
            tables.external_auths.push(ExternalAuth {
                user_id,
                provider: provider.to_owned(),
                provider_subject: subject.to_owned(),
                deleted_at: None,
            });
        }
    }

    pub(crate) fn committed(&self) -> Tables {
        lock(&self.committed)
            .map(|tables| tables.clone())
            .unwrap_or_default()
    }

    pub(crate) fn stored_user(&self, user_id: UserId) -> Option<User> {
        self.committed().users.get(&user_id).cloned()
    }

    pub(crate) fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TransactionBackend for FakeStore {
    async fn begin(&self) -> AppResult<Session> {
        if self.fail_begin.load(Ordering::SeqCst) {
            return Err(AppError::Internal("connection refused".to_owned()));
        }

        self.begins.fetch_add(1, Ordering::SeqCst);
        let snapshot = lock(&self.committed)?.clone();
        Ok(Session::new(FakeSession {
            staged: Mutex::new(snapshot),
        }))
    }

    async fn commit(&self, session: &Session) -> AppResult<()> {
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(AppError::Internal("could not serialize access".to_owned()));
        }

        let staged = lock(&session.state::<FakeSession>()?.staged)?.clone();
        *lock(&self.committed)? = staged;
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&self, _session: &Session) -> AppResult<()> {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
        if self.fail_rollback.load(Ordering::SeqCst) {
            return Err(AppError::Internal("connection reset".to_owned()));
        }
        Ok(())
    }

    fn abandon(&self, _session: &Session) {
        self.abandons.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserRepository for FakeStore {
    async fn find_by_id(&self, session: &Session, user_id: UserId) -> AppResult<Option<User>> {
        Ok(staged(session)?
            .users
            .get(&user_id)
            .filter(|user| !user.is_deleted())
            .cloned())
    }

    async fn find_for_update(
        &self,
        session: &Session,
        user_id: UserId,
    ) -> AppResult<Option<User>> {
        self.find_by_id(session, user_id).await
    }

    async fn create(&self, session: &Session, user: &NewUser) -> AppResult<User> {
        let mut tables = staged(session)?;
        let email = user.email.as_ref().map(|email| email.as_str().to_owned());

        let duplicate_email = email.is_some()
            && tables
                .users
                .values()
                .any(|existing| !existing.is_deleted() && existing.email == email);
        if duplicate_email || tables.users.contains_key(&user.id) {
            return Err(AppError::Conflict(
                "an account with this email already exists".to_owned(),
            ));
        }

        let created = User {
            id: user.id,
            email,
            name: user.name.as_str().to_owned(),
            password_hash: user.password_hash.clone(),
            is_root: false,
            is_admin: false,
            is_test: user.is_test,
            created_at: Utc::now(),
            deleted_at: None,
        };
        tables.users.insert(created.id, created.clone());
        self.record_write();
        Ok(created)
    }

    async fn update_partial(
        &self,
        session: &Session,
        user_id: UserId,
        fields: &UserUpdateFields,
    ) -> AppResult<User> {
        let mut tables = staged(session)?;

        if let Patch::Present(email) = &fields.email {
            let taken = tables.users.values().any(|existing| {
                existing.id != user_id
                    && !existing.is_deleted()
                    && existing.email.as_deref() == Some(email.as_str())
            });
            if taken {
                return Err(AppError::Conflict(
                    "an account with this email already exists".to_owned(),
                ));
            }
        }

        let user = tables
            .users
            .get_mut(&user_id)
            .filter(|user| !user.is_deleted())
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' not found")))?;

        if let Patch::Present(name) = &fields.name {
            user.name = name.clone();
        }
        if let Patch::Present(email) = &fields.email {
            user.email = Some(email.clone());
        }
        if let Patch::Present(password_hash) = &fields.password_hash {
            user.password_hash = Some(password_hash.clone());
        }
        if let Patch::Present(is_admin) = fields.is_admin {
            user.is_admin = is_admin;
        }

        let updated = user.clone();
        self.record_write();
        Ok(updated)
    }

    async fn soft_delete_by_id(
        &self,
        session: &Session,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        if self.fail_user_soft_delete.load(Ordering::SeqCst) {
            return Err(AppError::Internal("deadlock detected".to_owned()));
        }

        let mut tables = staged(session)?;
        if let Some(user) = tables.users.get_mut(&user_id)
            && user.deleted_at.is_none()
        {
            user.deleted_at = Some(at);
        }
        self.record_write();
        Ok(())
    }

    async fn delete_if_test_user(&self, session: &Session, user_id: UserId) -> AppResult<bool> {
        let mut tables = staged(session)?;
        let is_test = tables.users.get(&user_id).is_some_and(|user| user.is_test);
        if !is_test {
            return Ok(false);
        }

        tables.users.remove(&user_id);
        tables.configs.remove(&user_id);
        tables
            .external_auths
            .retain(|link| link.user_id != user_id);
        self.record_write();
        Ok(true)
    }

    async fn exists(&self, session: &Session, user_id: UserId) -> AppResult<bool> {
        Ok(self.find_by_id(session, user_id).await?.is_some())
    }

    async fn is_test_user(&self, session: &Session, user_id: UserId) -> AppResult<bool> {
        Ok(self
            .find_by_id(session, user_id)
            .await?
            .is_some_and(|user| user.is_test))
    }
}

#[async_trait]
impl ExternalAuthRepository for FakeStore {
    async fn create(&self, session: &Session, link: &NewExternalAuth) -> AppResult<ExternalAuth> {
        let mut tables = staged(session)?;
        let taken = tables.external_auths.iter().any(|existing| {
            existing.provider == link.provider.as_str()
                && existing.provider_subject == link.provider_subject.as_str()
        });
        if taken {
            return Err(AppError::Conflict(
                "this external identity is already linked".to_owned(),
            ));
        }

        let created = ExternalAuth {
            user_id: link.user_id,
            provider: link.provider.as_str().to_owned(),
            provider_subject: link.provider_subject.as_str().to_owned(),
            deleted_at: None,
        };
        tables.external_auths.push(created.clone());
        self.record_write();
        Ok(created)
    }

    async fn soft_delete_by_user_id(
        &self,
        session: &Session,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut tables = staged(session)?;
        for link in tables
            .external_auths
            .iter_mut()
            .filter(|link| link.user_id == user_id && link.deleted_at.is_none())
        {
            link.deleted_at = Some(at);
        }
        self.record_write();
        Ok(())
    }
}

#[async_trait]
impl UserConfigRepository for FakeStore {
    async fn create_default(&self, session: &Session, user_id: UserId) -> AppResult<UserConfig> {
        if self.fail_config_create.load(Ordering::SeqCst) {
            return Err(AppError::Internal("disk full".to_owned()));
        }

        let mut tables = staged(session)?;
        if tables.configs.contains_key(&user_id) {
            return Err(AppError::Conflict("settings already exist".to_owned()));
        }

        let config = UserConfig::default_for(user_id);
        tables.configs.insert(user_id, config.clone());
        self.record_write();
        Ok(config)
    }

    async fn soft_delete_by_user_id(
        &self,
        session: &Session,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut tables = staged(session)?;
        if let Some(config) = tables.configs.get_mut(&user_id)
            && config.deleted_at.is_none()
        {
            config.deleted_at = Some(at);
        }
        self.record_write();
        Ok(())
    }
}

/// Reversible stand-in for Argon2 so tests stay fast.
pub(crate) struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        Ok(format!("hashed:{password}"))
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        Ok(hash == format!("hashed:{password}"))
    }
}

/// Decodes `signup|provider|subject|email|name` tokens; empty segments are absent.
pub(crate) struct PipeTokenDecoder;

impl IdentityTokenDecoder for PipeTokenDecoder {
    fn decode_signup_token(&self, token: &str) -> AppResult<SignupClaims> {
        let parts: Vec<&str> = token.split('|').collect();
        let [kind, provider, subject, email, name] = parts.as_slice() else {
            return Err(AppError::Unauthorized("malformed sign-up token".to_owned()));
        };
        if *kind != "signup" {
            return Err(AppError::Unauthorized("not a sign-up token".to_owned()));
        }

        let optional = |value: &str| (!value.is_empty()).then(|| value.to_owned());
        Ok(SignupClaims {
            provider: (*provider).to_owned(),
            subject: (*subject).to_owned(),
            email: optional(*email),
            name: optional(*name),
        })
    }
}

pub(crate) struct PrefixTokenIssuer;

impl SessionTokenIssuer for PrefixTokenIssuer {
    fn issue_session_token(&self, user_id: UserId) -> AppResult<String> {
        Ok(format!("session:{user_id}"))
    }
}

pub(crate) struct Harness {
    pub(crate) store: Arc<FakeStore>,
    pub(crate) transactions: TransactionManager,
    pub(crate) users: UserService,
    pub(crate) signups: SignupService,
}

pub(crate) fn harness() -> Harness {
    let store = Arc::new(FakeStore::default());
    let transactions = TransactionManager::new(store.clone());
    let stores = UserStores {
        users: store.clone(),
        external_auths: store.clone(),
        user_configs: store.clone(),
    };
    let hasher: Arc<dyn PasswordHasher> = Arc::new(PlainHasher);

    Harness {
        users: UserService::new(transactions.clone(), stores.clone(), hasher.clone()),
        signups: SignupService::new(
            transactions.clone(),
            stores,
            hasher,
            Arc::new(PipeTokenDecoder),
            Arc::new(PrefixTokenIssuer),
        ),
        transactions,
        store,
    }
}

pub(crate) fn ctx() -> CallContext {
    CallContext::new()
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct UserFlags {
    pub(crate) is_root: bool,
    pub(crate) is_admin: bool,
    pub(crate) is_test: bool,
}

pub(crate) const REGULAR: UserFlags = UserFlags {
    is_root: false,
    is_admin: false,
    is_test: false,
};
pub(crate) const ROOT: UserFlags = UserFlags {
    is_root: true,
    is_admin: false,
    is_test: false,
};
pub(crate) const TEST: UserFlags = UserFlags {
    is_root: false,
    is_admin: false,
    is_test: true,
};

pub(crate) fn user(flags: UserFlags, password: Option<&str>) -> User {
    let id = UserId::new();
    User {
        id,
        email: Some(format!("{id}@example.com")),
        name: "Learner".to_owned(),
        password_hash: password.map(|password| format!("hashed:{password}")),
        is_root: flags.is_root,
        is_admin: flags.is_admin,
        is_test: flags.is_test,
        created_at: Utc::now(),
        deleted_at: None,
    }
}

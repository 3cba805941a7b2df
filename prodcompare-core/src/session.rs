//! Mock sign-in: user repositories and the session service.
//!
//! There is no real authentication. Every account shares [`DEMO_PASSWORD`];
//! the signed-in user is persisted under [`SESSION_KEY`] so the session
//! survives a restart.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::{CompareError, Result, SessionError};
use crate::persistence::{atomic_write_json, load_json};
use crate::store::{SESSION_KEY, SharedStore, load_or_reset, save};
use crate::types::{Role, User};

/// Password accepted for every account.
pub const DEMO_PASSWORD: &str = "password";

/// Lookup and storage of user accounts.
pub trait UserRepository: Send + Sync {
    /// Find a user by email, ignoring case.
    fn find_by_email(&self, email: &str) -> std::result::Result<Option<User>, SessionError>;

    /// Add a new user. Fails with `UserExists` on a duplicate email.
    fn insert(&self, user: User) -> std::result::Result<(), SessionError>;

    /// Replace the stored record with the same id.
    fn update(&self, user: &User) -> std::result::Result<(), SessionError>;
}

/// The two built-in demo accounts.
pub fn demo_users() -> Vec<User> {
    let now = Utc::now();
    vec![
        User {
            id: "1".into(),
            email: "admin@example.com".into(),
            name: "Администратор".into(),
            role: Role::Admin,
            avatar: None,
            created_at: now,
        },
        User {
            id: "2".into(),
            email: "buyer@example.com".into(),
            name: "Покупатель".into(),
            role: Role::Buyer,
            avatar: None,
            created_at: now,
        },
    ]
}

fn same_email(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

fn insert_into(users: &mut Vec<User>, user: User) -> std::result::Result<(), SessionError> {
    if users.iter().any(|u| same_email(&u.email, &user.email)) {
        return Err(SessionError::UserExists { email: user.email });
    }
    users.push(user);
    Ok(())
}

fn update_in(users: &mut [User], user: &User) -> std::result::Result<(), SessionError> {
    let slot = users
        .iter_mut()
        .find(|u| u.id == user.id)
        .ok_or_else(|| SessionError::UserNotFound {
            email: user.email.clone(),
        })?;
    *slot = user.clone();
    Ok(())
}

/// Process-local user list.
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
        }
    }

    /// Repository holding the demo admin and buyer accounts.
    pub fn with_demo_users() -> Self {
        Self::new(demo_users())
    }

    fn lock(&self) -> std::result::Result<std::sync::MutexGuard<'_, Vec<User>>, SessionError> {
        self.users.lock().map_err(|_| SessionError::Repository {
            message: "user list lock poisoned".into(),
        })
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::with_demo_users()
    }
}

impl UserRepository for InMemoryUserRepository {
    fn find_by_email(&self, email: &str) -> std::result::Result<Option<User>, SessionError> {
        Ok(self
            .lock()?
            .iter()
            .find(|u| same_email(&u.email, email))
            .cloned())
    }

    fn insert(&self, user: User) -> std::result::Result<(), SessionError> {
        insert_into(&mut *self.lock()?, user)
    }

    fn update(&self, user: &User) -> std::result::Result<(), SessionError> {
        update_in(&mut *self.lock()?, user)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UserFile {
    users: Vec<User>,
}

/// User list kept in a JSON file, rewritten atomically on every change.
pub struct FileUserRepository {
    path: PathBuf,
    users: Mutex<Vec<User>>,
}

impl FileUserRepository {
    /// Open the file at `path`. A missing or unreadable file starts from the
    /// demo accounts; the file is replaced on the next change.
    pub fn open(path: impl Into<PathBuf>) -> std::result::Result<Self, SessionError> {
        let path = path.into();
        let users = match load_json::<UserFile>(&path) {
            Ok(Some(file)) => file.users,
            Ok(None) => demo_users(),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                tracing::warn!(path = %path.display(), error = %e, "user file is corrupt, starting from demo accounts");
                demo_users()
            }
            Err(e) => {
                return Err(SessionError::Repository {
                    message: format!("{}: {e}", path.display()),
                });
            }
        };
        Ok(Self {
            path,
            users: Mutex::new(users),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn modify(
        &self,
        f: impl FnOnce(&mut Vec<User>) -> std::result::Result<(), SessionError>,
    ) -> std::result::Result<(), SessionError> {
        let mut users = self.users.lock().map_err(|_| SessionError::Repository {
            message: "user list lock poisoned".into(),
        })?;
        let mut file = UserFile {
            users: users.clone(),
        };
        f(&mut file.users)?;
        atomic_write_json(&self.path, &file).map_err(|e| SessionError::Repository {
            message: e.to_string(),
        })?;
        *users = file.users;
        Ok(())
    }
}

impl UserRepository for FileUserRepository {
    fn find_by_email(&self, email: &str) -> std::result::Result<Option<User>, SessionError> {
        let users = self.users.lock().map_err(|_| SessionError::Repository {
            message: "user list lock poisoned".into(),
        })?;
        Ok(users.iter().find(|u| same_email(&u.email, email)).cloned())
    }

    fn insert(&self, user: User) -> std::result::Result<(), SessionError> {
        self.modify(|users| insert_into(users, user))
    }

    fn update(&self, user: &User) -> std::result::Result<(), SessionError> {
        self.modify(|users| update_in(users, user))
    }
}

/// Profile fields a signed-in user may change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub avatar: Option<String>,
}

/// Tracks the signed-in user.
pub struct SessionService {
    users: Arc<dyn UserRepository>,
    store: SharedStore,
    current: Option<User>,
}

impl SessionService {
    /// Create the service, restoring a persisted session if one exists.
    pub fn new(users: Arc<dyn UserRepository>, store: SharedStore) -> Result<Self> {
        let current: Option<User> = load_or_reset(store.as_ref(), SESSION_KEY)?;
        if let Some(user) = &current {
            tracing::debug!(email = %user.email, "restored session");
        }
        Ok(Self {
            users,
            store,
            current,
        })
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<&User> {
        let user = self
            .users
            .find_by_email(email)?
            .ok_or_else(|| SessionError::UserNotFound {
                email: email.to_string(),
            })?;
        if password != DEMO_PASSWORD {
            tracing::warn!(email = %user.email, "login rejected");
            return Err(SessionError::InvalidPassword.into());
        }
        tracing::info!(email = %user.email, role = %user.role, "signed in");
        self.set_current(user)
    }

    /// Create an account and sign it in. `role` defaults to buyer. The
    /// password is not stored.
    pub fn register(
        &mut self,
        email: &str,
        _password: &str,
        name: &str,
        role: Option<Role>,
    ) -> Result<&User> {
        let email = email.trim();
        if self.users.find_by_email(email)?.is_some() {
            return Err(SessionError::UserExists {
                email: email.to_string(),
            }
            .into());
        }
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            name: name.trim().to_string(),
            role: role.unwrap_or(Role::Buyer),
            avatar: None,
            created_at: Utc::now(),
        };
        self.users.insert(user.clone())?;
        tracing::info!(email = %user.email, role = %user.role, "registered");
        self.set_current(user)
    }

    pub fn logout(&mut self) -> Result<()> {
        if let Some(user) = self.current.take() {
            tracing::info!(email = %user.email, "signed out");
        }
        self.store.remove(SESSION_KEY)?;
        Ok(())
    }

    /// Apply profile changes to the signed-in user.
    pub fn update_user(&mut self, update: UserUpdate) -> Result<&User> {
        let mut user = self
            .current
            .clone()
            .ok_or(SessionError::NotAuthenticated)?;
        if let Some(name) = update.name {
            user.name = name.trim().to_string();
        }
        if let Some(avatar) = update.avatar {
            user.avatar = Some(avatar).filter(|a| !a.trim().is_empty());
        }
        self.users.update(&user)?;
        self.set_current(user)
    }

    /// The signed-in user, if it has the admin role.
    pub fn require_admin(&self) -> Result<&User> {
        let user = self.current.as_ref().ok_or(SessionError::NotAuthenticated)?;
        if !user.is_admin() {
            return Err(CompareError::Session(SessionError::AdminRequired));
        }
        Ok(user)
    }

    fn set_current(&mut self, user: User) -> Result<&User> {
        save(self.store.as_ref(), SESSION_KEY, &user)?;
        Ok(&*self.current.insert(user))
    }
}

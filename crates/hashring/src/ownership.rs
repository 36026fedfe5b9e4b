use std::path::Path;

use nix::unistd::{Gid, Uid, User, chown};

use crate::error::{Error, Result};

/// Ownership applied to derived files after they are written.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Ownership {
    /// Leave ownership as the writing process created it.
    #[default]
    Unchanged,

    /// Give the file to this user and its primary group.
    User(String),
}

/// A resolved owner, ready to be applied.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedOwner {
    name: String,
    uid: Uid,
    gid: Gid,
}

impl Ownership {
    /// Looks up the configured user. Done before writing, so an unknown
    /// owner leaves the previous derived file untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the lookup fails.
    pub fn resolve(&self) -> Result<Option<ResolvedOwner>> {
        match self {
            Self::Unchanged => Ok(None),
            Self::User(name) => {
                let user = User::from_name(name)
                    .map_err(|source| Error::OwnerLookup {
                        owner: name.clone(),
                        source,
                    })?
                    .ok_or_else(|| Error::UnknownOwner(name.clone()))?;

                Ok(Some(ResolvedOwner {
                    name: name.clone(),
                    uid: user.uid,
                    gid: user.gid,
                }))
            }
        }
    }
}

impl ResolvedOwner {
    /// Changes the owner and group of `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the ownership change is not permitted.
    pub fn apply(&self, path: &Path) -> Result<()> {
        chown(path, Some(self.uid), Some(self.gid)).map_err(|source| Error::Chown {
            owner: self.name.clone(),
            path: path.to_path_buf(),
            source,
        })
    }
}

use std::env;
use std::io;
use std::path::PathBuf;

use tokio::fs;
use uuid::Uuid;

pub const USER_DATA_DIR_ENV: &str = "BUSFLOW_USER_DATA_DIR";

/// A Chromium profile directory plus whether the adapter owns it.
#[derive(Clone, Debug)]
pub struct ProfileDir {
    pub path: PathBuf,
    pub ephemeral: bool,
}

impl ProfileDir {
    /// Deletes the directory if the adapter created it. Caller-owned
    /// profiles are left in place.
    pub async fn release(&self) -> io::Result<()> {
        if self.ephemeral {
            fs::remove_dir_all(&self.path).await?;
        }
        Ok(())
    }
}

/// Resolves the profile directory: explicit path, then the
/// `BUSFLOW_USER_DATA_DIR` override, then a fresh temp directory that is
/// removed again on close.
pub async fn resolve_profile_dir(explicit: Option<&PathBuf>) -> io::Result<ProfileDir> {
    if let Some(path) = explicit {
        fs::create_dir_all(path).await?;
        return Ok(ProfileDir {
            path: path.clone(),
            ephemeral: false,
        });
    }

    if let Ok(raw) = env::var(USER_DATA_DIR_ENV) {
        if !raw.trim().is_empty() {
            let path = PathBuf::from(raw.trim());
            fs::create_dir_all(&path).await?;
            return Ok(ProfileDir {
                path,
                ephemeral: false,
            });
        }
    }

    let path = env::temp_dir().join(format!(
        "busflow-profile-{}-{}",
        std::process::id(),
        Uuid::new_v4().simple()
    ));
    fs::create_dir_all(&path).await?;
    Ok(ProfileDir {
        path,
        ephemeral: true,
    })
}

pub fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn explicit_profile_dir_is_not_ephemeral() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("profile");
        let dir = resolve_profile_dir(Some(&target)).await.unwrap();
        assert!(!dir.ephemeral);
        assert!(target.is_dir());

        dir.release().await.unwrap();
        assert!(target.is_dir());
    }

    #[tokio::test]
    async fn ephemeral_profile_is_removed_on_release() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("scratch");
        fs::create_dir_all(path.join("Default")).await.unwrap();
        let dir = ProfileDir {
            path: path.clone(),
            ephemeral: true,
        };

        dir.release().await.unwrap();
        assert!(!path.exists());
    }
}

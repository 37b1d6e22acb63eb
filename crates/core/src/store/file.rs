// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Directory-backed store: one file per key.
//!
//! File names are the hex encoding of the key, so any key maps to a valid
//! name and the key can be recovered from a directory listing. Keys whose
//! hex form would exceed file name limits are stored under the SHA-256 of
//! the key instead, with the key itself framed at the start of the file.
//!
//! Writes go to a uniquely named temporary file that is fsynced and renamed
//! over the target, so a crash leaves either the old or the new value and
//! concurrent writers to one key never share a temporary file.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};

use super::{check_key, DurableStore, StoreFuture};
use crate::error::{Error, Result};

const VALUE_EXT: &str = "val";
const HASHED_EXT: &str = "hkv";
const TMP_EXT: &str = "tmp";

/// Longest hex-encoded key used directly as a file name. Leaves room for
/// the extension and temporary suffix within a 255-byte name.
const MAX_HEX_NAME: usize = 200;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Where a key lives on disk.
enum Slot {
    /// File name is the hex key; contents are the raw value.
    Plain(PathBuf),
    /// File name is the key digest; contents are the framed key then value.
    Hashed(PathBuf),
}

impl Slot {
    fn path(&self) -> &Path {
        match self {
            Slot::Plain(path) | Slot::Hashed(path) => path,
        }
    }
}

/// A [`DurableStore`] persisting values as files under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if necessary) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(FileStore { dir })
    }

    /// Root directory of the store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot(&self, key: &str) -> Slot {
        let encoded = hex::encode(key);
        if encoded.len() <= MAX_HEX_NAME {
            Slot::Plain(self.dir.join(format!("{}.{}", encoded, VALUE_EXT)))
        } else {
            let digest = Sha256::digest(key.as_bytes());
            Slot::Hashed(self.dir.join(format!("{}.{}", hex::encode(digest), HASHED_EXT)))
        }
    }

    fn key_from_file_name(name: &str) -> Option<String> {
        let stem = name.strip_suffix(&format!(".{}", VALUE_EXT))?;
        let bytes = hex::decode(stem).ok()?;
        String::from_utf8(bytes).ok()
    }

    fn tmp_path(target: &Path) -> PathBuf {
        let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let name = target.file_name().and_then(|name| name.to_str()).unwrap_or_default();
        target.with_file_name(format!("{}.{}-{}.{}", name, std::process::id(), n, TMP_EXT))
    }

    async fn write_atomic(target: &Path, contents: &[u8]) -> Result<()> {
        use tokio::io::AsyncWriteExt;

        let tmp = Self::tmp_path(target);
        let written = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(contents).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp, target).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn remove_file(path: &Path) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the key stored at the head of a hashed file.
    async fn hashed_key(path: &Path) -> Option<String> {
        let bytes = tokio::fs::read(path).await.ok()?;
        let (key, _) = unframe(&bytes)?;
        Some(key.to_string())
    }
}

/// Prefix `value` with the key and its little-endian `u32` length.
fn frame(key: &str, value: &[u8]) -> Result<Vec<u8>> {
    let len = u32::try_from(key.len()).map_err(|_| Error::InvalidKey(key.chars().take(32).collect()))?;
    let mut bytes = Vec::with_capacity(4 + key.len() + value.len());
    bytes.extend_from_slice(&len.to_le_bytes());
    bytes.extend_from_slice(key.as_bytes());
    bytes.extend_from_slice(value);
    Ok(bytes)
}

fn unframe(bytes: &[u8]) -> Option<(&str, &[u8])> {
    let (len, rest) = bytes.split_first_chunk::<4>()?;
    let len = usize::try_from(u32::from_le_bytes(*len)).ok()?;
    if rest.len() < len {
        return None;
    }
    let (key, value) = rest.split_at(len);
    Some((std::str::from_utf8(key).ok()?, value))
}

impl DurableStore for FileStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move {
            check_key(key)?;
            let slot = self.slot(key);
            let bytes = match tokio::fs::read(slot.path()).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            match slot {
                Slot::Plain(_) => Ok(Some(bytes)),
                Slot::Hashed(_) => match unframe(&bytes) {
                    Some((stored, value)) if stored == key => Ok(Some(value.to_vec())),
                    Some(_) => Ok(None),
                    None => Err(Error::CorruptedData { key: key.to_string(), reason: "missing key header".to_string() }),
                },
            }
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: Vec<u8>) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            check_key(key)?;
            match self.slot(key) {
                Slot::Plain(path) => Self::write_atomic(&path, &value).await,
                Slot::Hashed(path) => Self::write_atomic(&path, &frame(key, &value)?).await,
            }
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            check_key(key)?;
            Self::remove_file(self.slot(key).path()).await
        })
    }

    fn multi_remove<'a>(&'a self, keys: &'a [String]) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            for key in keys {
                check_key(key)?;
                Self::remove_file(self.slot(key).path()).await?;
            }
            Ok(())
        })
    }

    fn keys_with_prefix<'a>(&'a self, prefix: &'a str) -> StoreFuture<'a, Vec<String>> {
        Box::pin(async move {
            let mut keys = Vec::new();
            let mut entries = tokio::fs::read_dir(&self.dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let name = entry.file_name();
                let name = name.to_string_lossy();

                let key = if name.ends_with(&format!(".{}", HASHED_EXT)) {
                    Self::hashed_key(&path).await
                } else {
                    Self::key_from_file_name(&name)
                };
                let Some(key) = key else {
                    if !name.ends_with(&format!(".{}", TMP_EXT)) {
                        tracing::debug!(file = %name, "skipping file that does not hold a key");
                    }
                    continue;
                };
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
            keys.sort();
            Ok(keys)
        })
    }
}

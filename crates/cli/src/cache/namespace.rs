// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Prefix shared by every cache key in the durable store.
pub const KEY_PREFIX: &str = "cache:";

/// A logical cache. Keys are stored as `cache:<namespace>:<key>` so a
/// namespace can be cleared without touching the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    User,
    Gamification,
    Api,
    Temp,
}

impl Namespace {
    pub const ALL: [Namespace; 4] = [Namespace::User, Namespace::Gamification, Namespace::Api, Namespace::Temp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::User => "user",
            Namespace::Gamification => "gamification",
            Namespace::Api => "api",
            Namespace::Temp => "temp",
        }
    }

    /// Prefix of every key in this namespace.
    pub fn prefix(&self) -> String {
        format!("{}{}:", KEY_PREFIX, self.as_str())
    }

    /// Fully qualified key for `key` in this namespace.
    pub fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix(), key)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Namespace::User),
            "gamification" => Ok(Namespace::Gamification),
            "api" => Ok(Namespace::Api),
            "temp" => Ok(Namespace::Temp),
            _ => Err(Error::InvalidNamespace(s.to_string())),
        }
    }
}

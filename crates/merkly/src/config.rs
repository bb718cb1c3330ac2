//! Tree configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MerkleError, MerkleResult};
use crate::hash::HashAlgorithm;

/// Which leaf counts a tree accepts, and which proof builder it uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TreeLayout {
    /// Any positive leaf count; odd nodes are promoted
    #[default]
    General,
    /// Leaf count must be a power of two
    PowerOfTwo,
}

impl TreeLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            TreeLayout::General => "general",
            TreeLayout::PowerOfTwo => "power-of-two",
        }
    }

    /// Reject leaf counts this layout cannot build a tree from.
    pub fn check_leaf_count(&self, n_leaves: usize) -> MerkleResult<()> {
        match self {
            TreeLayout::PowerOfTwo if !n_leaves.is_power_of_two() => {
                Err(MerkleError::InvalidLeafSetSize { len: n_leaves })
            }
            TreeLayout::General if n_leaves == 0 => Err(MerkleError::EmptyTree),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for TreeLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TreeLayout {
    type Err = MerkleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(TreeLayout::General),
            "power-of-two" | "power_of_two" | "pow2" => Ok(TreeLayout::PowerOfTwo),
            _ => Err(MerkleError::InvalidConfig(format!("unknown tree layout: {}", s))),
        }
    }
}

/// Tree configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Leaf count policy
    pub layout: TreeLayout,

    /// Combiner used by [`MerkleTree::from_config`](crate::MerkleTree::from_config)
    pub hash: HashAlgorithm,
}

impl TreeConfig {
    pub const LAYOUT_ENV: &'static str = "MERKLY_TREE_LAYOUT";
    pub const HASH_ENV: &'static str = "MERKLY_HASH";

    pub fn new(layout: TreeLayout, hash: HashAlgorithm) -> Self {
        Self { layout, hash }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> MerkleResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> MerkleResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(layout) = lookup(Self::LAYOUT_ENV) {
            config.layout = layout.parse()?;
        }
        if let Some(hash) = lookup(Self::HASH_ENV) {
            config.hash = hash.parse()?;
        }

        Ok(config)
    }
}

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::currency::BASICALLY_INFINITE;

/// A named kind of holdable resource.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Asset(String);

impl Asset {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Asset {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Asset({})", self.0)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Quantities held per asset.
///
/// Transfers and burns carry an `Assets` value as their `returns`, but no
/// ledger operation applies it: inventories are part of the data model
/// only.
pub type Assets = BTreeMap<Asset, u64>;

/// Whether `assets` holds an effectively unlimited supply of `asset`.
pub fn is_unlimited(assets: &Assets, asset: &Asset) -> bool {
    assets
        .get(asset)
        .is_some_and(|quantity| *quantity >= BASICALLY_INFINITE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_threshold() {
        let hat = Asset::from("hat");
        let mut assets = Assets::new();
        assert!(!is_unlimited(&assets, &hat));

        assets.insert(hat.clone(), 3);
        assert!(!is_unlimited(&assets, &hat));

        assets.insert(hat.clone(), BASICALLY_INFINITE);
        assert!(is_unlimited(&assets, &hat));
    }
}

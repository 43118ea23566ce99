use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use simple_amm::Error;

use crate::asset::AssetId;
use crate::error::{LedgerError, Result};

/// Pool configuration, usually read from the `[pool]` table of a TOML file.
///
/// ```toml
/// asset_a = "USDC"
/// asset_b = "XLM"
/// account = "pool"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub asset_a: AssetId,
    pub asset_b: AssetId,
    /// Holder id the pool's reserves are kept under in the asset service.
    #[serde(default = "default_account")]
    pub account: String,
}

fn default_account() -> String {
    "amm-pool".to_string()
}

impl LedgerConfig {
    pub fn new(asset_a: impl Into<AssetId>, asset_b: impl Into<AssetId>) -> Result<Self> {
        let config = LedgerConfig {
            asset_a: asset_a.into(),
            asset_b: asset_b.into(),
            account: default_account(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: LedgerConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let input = fs::read_to_string(path).map_err(|source| LedgerError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> Result<()> {
        if self.asset_a.as_str().is_empty() || self.asset_b.as_str().is_empty() {
            return Err(LedgerError::Config("asset ids must not be empty".into()));
        }
        if self.account.is_empty() {
            return Err(LedgerError::Config("pool account must not be empty".into()));
        }
        if self.asset_a == self.asset_b {
            return Err(LedgerError::Pool(Error::IdenticalAssets));
        }
        if self.account == self.asset_a.as_str() || self.account == self.asset_b.as_str() {
            return Err(LedgerError::Config(format!(
                "pool account `{}` collides with an asset id",
                self.account
            )));
        }
        Ok(())
    }
}

// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use color_eyre::eyre::{eyre, Context, Result};
use color_eyre::Section;
use selfsend::FeeConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.json";
const DATA_DIR_NAME: &str = "selfsend";

/// Operator defaults, stored as JSON in the data dir. Command line flags override them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub min_delay_secs: u64,
    pub max_delay_secs: u64,
    /// `auto` or a fixed price in gwei.
    pub gas_price: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_delay_secs: 10,
            max_delay_secs: 3600,
            gas_price: "auto".to_string(),
        }
    }
}

impl Settings {
    /// `<data dir>/selfsend/settings.json`. The file itself may not exist yet.
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs_next::data_dir()
            .ok_or_else(|| eyre!("Failed to obtain data dir, your OS might not be supported."))?;
        Ok(dir.join(DATA_DIR_NAME).join(SETTINGS_FILE))
    }

    /// Reads `path`, which must exist. Without a path the default location is used and a
    /// missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::read(path),
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::read(&path)
                } else {
                    debug!("No settings file at {path:?}, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read settings file {path:?}"))?;
        let settings: Settings = serde_json::from_str(&text)
            .wrap_err_with(|| format!("Failed to parse settings file {path:?}"))
            .with_suggestion(|| {
                r#"expected e.g. {"min_delay_secs": 10, "max_delay_secs": 3600, "gas_price": "auto"}"#
            })?;
        parse_gas_price(&settings.gas_price)?;
        Ok(settings)
    }

    /// Writes the settings to `path`, creating its parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .wrap_err_with(|| format!("Failed to create settings dir {dir:?}"))
                .with_suggestion(|| "make sure you have the permissions to access the data dir")?;
        }
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).wrap_err_with(|| format!("Failed to write settings to {path:?}"))?;
        info!("Saved settings to {path:?}");
        Ok(())
    }
}

/// `auto` or a whole number of gwei.
pub fn parse_gas_price(value: &str) -> Result<FeeConfig> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("auto") {
        return Ok(FeeConfig::Auto);
    }
    let gwei: u64 = value
        .parse()
        .wrap_err_with(|| format!("Invalid gas price {value:?}"))
        .with_suggestion(|| "use \"auto\" or a whole number of gwei, e.g. 5")?;
    if gwei == 0 {
        return Err(eyre!("Gas price must be greater than zero"));
    }
    Ok(FeeConfig::fixed_gwei(gwei))
}

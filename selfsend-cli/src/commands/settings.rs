// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::access::settings::{parse_gas_price, Settings};
use color_eyre::eyre::{eyre, Result};
use selfsend::TimingConfig;

pub fn show() -> Result<()> {
    let path = Settings::default_path()?;
    let settings = Settings::load(None)?;
    println!("Settings file: {}", path.display());
    println!("min delay: {}s", settings.min_delay_secs);
    println!("max delay: {}s", settings.max_delay_secs);
    println!("gas price: {}", settings.gas_price);
    Ok(())
}

pub fn set(
    min_delay: Option<u64>,
    max_delay: Option<u64>,
    gas_price: Option<String>,
) -> Result<()> {
    if min_delay.is_none() && max_delay.is_none() && gas_price.is_none() {
        return Err(eyre!("Nothing to change, pass at least one setting"));
    }
    let path = Settings::default_path()?;
    let mut settings = Settings::load(None)?;
    if let Some(min_delay) = min_delay {
        settings.min_delay_secs = min_delay;
    }
    if let Some(max_delay) = max_delay {
        settings.max_delay_secs = max_delay;
    }
    if let Some(gas_price) = gas_price {
        parse_gas_price(&gas_price)?;
        settings.gas_price = gas_price;
    }
    TimingConfig::new(settings.min_delay_secs, settings.max_delay_secs)?;

    settings.save(&path)?;
    println!("Saved settings to {}", path.display());
    Ok(())
}

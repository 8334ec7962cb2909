// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use super::KeySourceArgs;
use crate::access::keys::load_credentials;
use color_eyre::Result;

pub fn list(keys: &KeySourceArgs) -> Result<()> {
    let credentials = load_credentials(
        keys.keys_file.as_deref(),
        keys.mnemonic.as_deref(),
        keys.mnemonic_count,
    )?;
    println!("{} accounts:", credentials.len());
    for (index, credential) in credentials.iter().enumerate() {
        println!("{:>4}  {}", index + 1, credential.account());
    }
    Ok(())
}

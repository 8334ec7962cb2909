// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use color_eyre::{Result, Section};
use prettytable::{Cell, Row, Table};
use selfsend::Network;

pub fn networks() {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Identifier"),
        Cell::new("Name"),
        Cell::new("Chain id"),
        Cell::new("Native"),
        Cell::new("RPC"),
    ]));
    for network in Network::BUILT_IN {
        table.add_row(Row::new(vec![
            Cell::new(network.identifier()),
            Cell::new(network.name()),
            Cell::new(&network.chain_id().to_string()),
            Cell::new(network.native_symbol()),
            Cell::new(network.rpc_url().as_str()),
        ]));
    }
    table.printstd();
}

pub fn tokens(network: &str) -> Result<()> {
    let network = Network::from_identifier(network)
        .with_suggestion(|| "run `selfsend networks` to list the built-in networks")?;
    let tokens = network.popular_tokens();
    if tokens.is_empty() {
        println!(
            "No well known tokens on {network}, pass a token contract address with --asset instead"
        );
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Symbol"),
        Cell::new("Name"),
        Cell::new("Decimals"),
        Cell::new("Contract"),
    ]));
    for token in tokens {
        table.add_row(Row::new(vec![
            Cell::new(token.symbol),
            Cell::new(token.name),
            Cell::new(&token.decimals.to_string()),
            Cell::new(&token.address.to_string()),
        ]));
    }
    table.printstd();
    Ok(())
}

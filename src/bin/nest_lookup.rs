// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lists the thermostats of a NEST account.
//!
//! Prints the serial, name and location of every thermostat so the serial
//! can be copied into the device configuration.
//!
//! ```text
//! nest-lookup joe@example.com
//! Password: ********
//! Serial: 09AA01AC  Name: Hallway  Location: Home
//! ```

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nest_thermostat::protocol::{ApiConfig, NestApi};
use nest_thermostat::session::{Credentials, SessionCache};

/// Looks up the serial numbers of the thermostats on a NEST account.
#[derive(Debug, Parser)]
#[command(name = "nest-lookup", version, about, long_about = None)]
struct Cli {
    /// Account user name (e-mail address)
    username: String,

    /// Account password; read from standard input when omitted
    password: Option<String>,

    /// Login endpoint
    #[arg(long, default_value = ApiConfig::DEFAULT_LOGIN_URL)]
    login_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let password = match cli.password {
        Some(password) => password,
        None => read_password()?,
    };
    let credentials = Credentials::new(cli.username, password);

    let client = ApiConfig::new()
        .with_login_url(cli.login_url)
        .with_timeout(Duration::from_secs(cli.timeout))
        .into_client()?;

    eprintln!("Logging in to NEST...");
    let session = SessionCache::new()
        .get_session(&client, &credentials)
        .await?;

    eprintln!("Collecting NEST thermostats...");
    let snapshot = client.fetch_snapshot(&session).await?;

    let serials = snapshot.serials();
    if serials.is_empty() {
        println!("No devices found.");
        return Ok(());
    }

    for serial in serials {
        let name = snapshot.name_of(serial).unwrap_or("-");
        let location = snapshot.location_of(serial).unwrap_or("-");
        println!("Serial: {serial}  Name: {name}  Location: {location}");
    }
    Ok(())
}

fn read_password() -> io::Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

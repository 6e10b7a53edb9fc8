//! Stage a VLAN over the CLI and apply it.
//!
//! Logs into a Comware switch over SSH, stages the VLAN commands, and runs
//! the batch the same way an automation module would, printing the JSON
//! run report.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example vlan -- --host 192.0.2.10 --user admin --password secret --vlan 10 --name servers
//! ```
//!
//! Add `--check` to only print what would be sent.

use std::env;
use std::time::Duration;

use comware::workflow::apply;
use comware::{CliSession, Device, Driver, DriverBuilder, RunOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug shows every staged and dispatched operation
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut driver = DriverBuilder::new(&args.host)
        .port(args.port)
        .username(&args.user)
        .password(&args.password)
        .timeout(Duration::from_secs(args.timeout))
        .build()?;
    driver.open().await?;

    let mut device = Device::open(CliSession::new(driver)).await?;
    if let Some(version) = &device.capabilities().await?.device_info.network_os_version {
        println!("Comware {}", version);
    }

    let mut commands = vec![format!("vlan {}", args.vlan)];
    if let Some(name) = &args.name {
        commands.push(format!("name {}", name));
    }
    device.stage_config(commands, "cli_config")?;
    device.stage_config(format!("display vlan {}", args.vlan), "cli_display")?;

    let options = RunOptions {
        check_mode: args.check,
        ..Default::default()
    };
    match apply(&mut device, options).await {
        Ok(result) => println!("{}", serde_json::to_string_pretty(&result)?),
        Err(failure) => {
            eprintln!("{}", serde_json::to_string_pretty(&failure)?);
            std::process::exit(1);
        }
    }

    Ok(())
}

struct Args {
    host: String,
    port: u16,
    user: String,
    password: String,
    vlan: u16,
    name: Option<String>,
    timeout: u64,
    check: bool,
}

impl Args {
    fn parse() -> Self {
        let mut args = Args {
            host: "localhost".to_string(),
            port: 22,
            user: env::var("USER").unwrap_or_else(|_| "admin".to_string()),
            password: String::new(),
            vlan: 10,
            name: None,
            timeout: 30,
            check: false,
        };

        let mut argv = env::args().skip(1);
        while let Some(flag) = argv.next() {
            match flag.as_str() {
                "--check" => args.check = true,
                "--help" => {
                    println!(
                        "usage: vlan --host HOST --user USER --password PASS [--port N] \
                         [--vlan ID] [--name NAME] [--timeout SECS] [--check]"
                    );
                    std::process::exit(0);
                }
                _ => {
                    let Some(value) = argv.next() else {
                        eprintln!("Missing value for {}", flag);
                        std::process::exit(2);
                    };
                    match flag.as_str() {
                        "--host" => args.host = value,
                        "--port" => args.port = value.parse().unwrap_or(22),
                        "--user" => args.user = value,
                        "--password" => args.password = value,
                        "--vlan" => args.vlan = value.parse().unwrap_or(10),
                        "--name" => args.name = Some(value),
                        "--timeout" => args.timeout = value.parse().unwrap_or(30),
                        _ => eprintln!("Unknown argument: {}", flag),
                    }
                }
            }
        }

        args
    }
}

//! Prints the poll signature an EA must present: lowercase hex HMAC-SHA256 of its id.
//!
//! Usage: ea-sign --ea-id ea1 [--secret <secret>]
//! The secret falls back to BRIDGE_BRIDGE__SECRET.

use ea_bridge::security::sign_ea_id;
use std::env;
use std::process;

struct Args {
    ea_id: Option<String>,
    secret: Option<String>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut ea_id = None;
        let mut secret = None;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--ea-id" | "-e" => {
                    if i + 1 < args.len() {
                        ea_id = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--secret" | "-s" => {
                    if i + 1 < args.len() {
                        secret = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }

        Self {
            ea_id,
            secret: secret.or_else(|| env::var("BRIDGE_BRIDGE__SECRET").ok()),
        }
    }
}

fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let Some(ea_id) = args.ea_id.filter(|id| !id.is_empty()) else {
        eprintln!("usage: ea-sign --ea-id <id> [--secret <secret>]");
        process::exit(2);
    };
    let Some(secret) = args.secret.filter(|s| !s.is_empty()) else {
        eprintln!("no secret: pass --secret or set BRIDGE_BRIDGE__SECRET");
        process::exit(2);
    };

    match sign_ea_id(&ea_id, secret.as_bytes()) {
        Some(signature) => println!("{}", signature),
        None => {
            eprintln!("failed to initialize HMAC");
            process::exit(1);
        }
    }
}

pub mod profile;
pub mod replay;
pub mod run;

use std::{error::Error, path::PathBuf};

use clap::{Parser, Subcommand};
use profile::{handle_profiles, ProfilesCommand};
use replay::handle_replay;
use run::{handle_run, RunArgs};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Emulate a tablet driven by pointer samples read from stdin
    Run(RunArgs),
    /// Replay a script of timed steps against an emulated tablet
    Replay {
        /// Path to the YAML replay script
        script: PathBuf,
        /// Tablet profile name or path, overrides the profile of the script
        #[arg(long)]
        profile: Option<String>,
    },
    /// Manage tablet profiles
    Profiles {
        #[command(subcommand)]
        cmd: ProfilesCommand,
    },
}

pub async fn main_cli(args: Args) -> Result<(), Box<dyn Error>> {
    match args.cmd {
        Commands::Run(run_args) => handle_run(run_args).await?,
        Commands::Replay { script, profile } => handle_replay(script, profile)?,
        Commands::Profiles { cmd } => handle_profiles(cmd)?,
    }

    Ok(())
}

/// Format bytes the way usbmon prints them
pub fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<String>>()
        .join(" ")
}

/// Parse a USB id given either in decimal or with a 0x prefix
pub fn parse_usb_id(value: &str) -> Result<u16, String> {
    let parsed = match value.strip_prefix("0x") {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| format!("invalid USB id '{value}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_hex() {
        assert_eq!(to_hex(&[0x02, 0xe1, 0x00]), "02 e1 00");
        assert_eq!(to_hex(&[]), "");
    }

    #[test]
    fn usb_ids() {
        assert_eq!(parse_usb_id("0x056a"), Ok(0x056a));
        assert_eq!(parse_usb_id("1386"), Ok(0x056a));
        assert!(parse_usb_id("0x10000").is_err());
        assert!(parse_usb_id("wacom").is_err());
    }
}

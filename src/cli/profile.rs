use std::error::Error;

use clap::Subcommand;
use tabled::settings::{Panel, Style};
use tabled::{Table, Tabled};

use crate::config::{path::get_profile_files, TabletProfile};

#[derive(Subcommand, Debug, Clone)]
pub enum ProfilesCommand {
    /// List built-in and installed tablet profiles
    List,
    /// Print a tablet profile as YAML
    Show {
        /// Profile name or path to a profile file
        name: String,
    },
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "USB Id")]
    usb_id: String,
    #[tabled(rename = "Layout")]
    layout: String,
    #[tabled(rename = "Resolution")]
    resolution: String,
    #[tabled(rename = "Proximity")]
    proximity: bool,
    #[tabled(rename = "Source")]
    source: String,
}

impl ProfileRow {
    fn new(profile: &TabletProfile, source: String) -> Self {
        Self {
            name: profile.name.clone(),
            product: profile.product.clone(),
            usb_id: format!("{:04x}:{:04x}", profile.vendor_id, profile.product_id),
            layout: profile.layout.to_string(),
            resolution: format!("{}x{}", profile.resolution_x, profile.resolution_y),
            proximity: profile.proximity,
            source,
        }
    }
}

pub fn handle_profiles(cmd: ProfilesCommand) -> Result<(), Box<dyn Error>> {
    match cmd {
        ProfilesCommand::List => {
            let mut rows: Vec<ProfileRow> = TabletProfile::builtin()
                .iter()
                .map(|profile| ProfileRow::new(profile, "built-in".to_string()))
                .collect();

            for path in get_profile_files() {
                match TabletProfile::from_yaml_file(&path) {
                    Ok(profile) => rows.push(ProfileRow::new(&profile, path.display().to_string())),
                    Err(e) => log::warn!("Skipping invalid profile {path:?}: {e}"),
                }
            }
            let count = rows.len();

            let mut table = Table::new(rows);
            table
                .with(Style::modern_rounded())
                .with(Panel::header("Tablet Profiles"));
            println!("{table}");
            println!("Found {count} profile(s)");
        }
        ProfilesCommand::Show { name } => {
            let profile = TabletProfile::load(name.as_str())?;
            print!("{}", serde_yaml::to_string(&profile)?);
        }
    }

    Ok(())
}

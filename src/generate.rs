use std::error::Error;
use std::fs::File;
use std::io::Write;

use schemars::schema_for;
use tabletemu::config::TabletProfile;

fn main() -> Result<(), Box<dyn Error>> {
    let tablet_profile_v1_schema = schema_for!(TabletProfile);
    let mut file = File::create("./rootfs/usr/share/tabletemu/schema/tablet_profile_v1.json")?;
    write!(
        file,
        "{}",
        serde_json::to_string_pretty(&tablet_profile_v1_schema)?
    )?;

    Ok(())
}

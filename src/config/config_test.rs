use std::{error::Error, path::PathBuf};

use crate::config::{LoadError, ProfileError, ReportLayout, TabletProfile};

const PROFILE_DIR: &str = "./rootfs/usr/share/tabletemu/profiles";

/// Every shipped profile file must match the built-in profile of the same name,
/// so that installing the YAML files never changes device behavior.
#[test]
fn shipped_profiles_match_builtin() -> Result<(), Box<dyn Error>> {
    for builtin in TabletProfile::builtin() {
        let path = PathBuf::from(PROFILE_DIR).join(format!("{}.yaml", builtin.name));
        println!("Checking profile {path:?}");
        let loaded = TabletProfile::from_yaml_file(&path)?;
        assert_eq!(loaded, builtin);
    }

    Ok(())
}

#[test]
fn builtin_profiles_are_valid() {
    for profile in TabletProfile::builtin() {
        assert_eq!(profile.validate(), Ok(()), "{} should be valid", profile.name);
    }
}

#[test]
fn load_resolves_builtin_names() -> Result<(), Box<dyn Error>> {
    let profile = TabletProfile::load("intuos5")?;
    assert_eq!(profile.resolution_x, 44704);
    assert_eq!(profile.resolution_y, 27940);
    assert!(profile.proximity);

    let err = TabletProfile::load("no-such-tablet").unwrap_err();
    assert!(matches!(err, LoadError::NotFound(_)));

    Ok(())
}

#[test]
fn input_max_defaults_when_omitted() -> Result<(), Box<dyn Error>> {
    let yaml = r#"
name: custom
manufacturer: Acme
product: Custom pen
vendor_id: 0x056a
product_id: 0x0001
bcd_device: 0x0100
layout: penabled
proximity: false
resolution_x: 1000
resolution_y: 500
timing:
  ping_interval_ms: 150
endpoint:
  pen: 1
  touch: 2
  max_packet_size: 9
  interval_ms: 8
"#;
    let profile = TabletProfile::from_yaml(yaml.to_string())?;
    assert_eq!(profile.input_max, 32767);
    assert_eq!(profile.layout, ReportLayout::Penabled);
    assert_eq!(profile.timing.leave_timeout(), None);

    Ok(())
}

#[test]
fn intuos_layout_requires_pressure() {
    let mut profile = TabletProfile::intuos5();
    profile.pressure = None;
    assert_eq!(
        profile.validate(),
        Err(ProfileError::MissingPressure(ReportLayout::Intuos))
    );
}

#[test]
fn penabled_layout_rejects_proximity() {
    let mut profile = TabletProfile::bamboo();
    profile.proximity = true;
    assert_eq!(
        profile.validate(),
        Err(ProfileError::ProximityUnsupported(ReportLayout::Penabled))
    );
}

#[test]
fn rejects_bad_ranges() {
    let mut profile = TabletProfile::intuos5();
    profile.resolution_y = 0;
    assert!(matches!(
        profile.validate(),
        Err(ProfileError::ZeroResolution { .. })
    ));

    let mut profile = TabletProfile::intuos5();
    if let Some(pressure) = profile.pressure.as_mut() {
        pressure.initial = 4096;
    }
    assert!(matches!(
        profile.validate(),
        Err(ProfileError::InvalidPressure { .. })
    ));

    let mut profile = TabletProfile::bamboo();
    profile.timing.ping_interval_ms = 0;
    assert_eq!(profile.validate(), Err(ProfileError::ZeroPingInterval));
}

#[test]
fn pressure_must_fit_report_field() {
    let mut profile = TabletProfile::intuos5();
    if let Some(pressure) = profile.pressure.as_mut() {
        pressure.max = 4095;
        pressure.initial = 4095;
    }
    assert_eq!(
        profile.validate(),
        Err(ProfileError::PressureOutOfRange {
            min: 128,
            max: 4095,
            layout: ReportLayout::Intuos,
            bits: 11,
        })
    );

    let mut profile = TabletProfile::intuos5();
    if let Some(pressure) = profile.pressure.as_mut() {
        pressure.min = -1;
    }
    assert!(matches!(
        profile.validate(),
        Err(ProfileError::PressureOutOfRange { min: -1, .. })
    ));
}

#[test]
fn proximity_requires_tool() {
    let mut profile = TabletProfile::intuos5();
    profile.tool = None;
    assert_eq!(profile.validate(), Err(ProfileError::MissingTool));

    let mut profile = TabletProfile::intuos5();
    profile.proximity = false;
    profile.tool = None;
    assert_eq!(profile.validate(), Ok(()));
}

#[test]
fn resolution_limit_follows_layout() {
    let mut profile = TabletProfile::intuos5();
    profile.resolution_x = 1 << 17;
    assert_eq!(profile.validate(), Ok(()));
    profile.resolution_x = (1 << 17) + 1;
    assert_eq!(
        profile.validate(),
        Err(ProfileError::ResolutionTooLarge {
            resolution: (1 << 17) + 1,
            layout: ReportLayout::Intuos,
            bits: 17,
        })
    );

    let mut profile = TabletProfile::bamboo();
    profile.resolution_x = 1 << 16;
    assert_eq!(profile.validate(), Ok(()));
    profile.resolution_x = 100_000;
    assert!(matches!(
        profile.validate(),
        Err(ProfileError::ResolutionTooLarge { bits: 16, .. })
    ));
}

#[test]
fn id_override() {
    let profile = TabletProfile::intuos5().with_ids(None, Some(0x0026));
    assert_eq!(profile.vendor_id, 0x056a);
    assert_eq!(profile.product_id, 0x0026);
}

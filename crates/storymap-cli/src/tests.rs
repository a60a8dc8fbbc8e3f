use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["storymap"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_config_command() {
    let cli = Cli::try_parse_from(["storymap", "config"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Config)));
}

#[test]
fn parses_geo_distance_coordinates() {
    let cli = Cli::try_parse_from([
        "storymap",
        "geo",
        "distance",
        "36.0563,129.3781",
        "35.9876, 129.5586",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Some(Commands::Geo {
            command: GeoCommands::Distance { from, to },
        }) => {
            assert_eq!(from, Coordinate::new(36.0563, 129.3781));
            assert_eq!(to, Coordinate::new(35.9876, 129.5586));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn geo_route_requires_two_points() {
    let result = Cli::try_parse_from(["storymap", "geo", "route", "36.0,129.3"]);
    assert!(result.is_err());
}

#[test]
fn geo_route_accepts_optimize_and_speed() {
    let cli = Cli::try_parse_from([
        "storymap",
        "geo",
        "route",
        "36.0,129.3",
        "36.1,129.4",
        "36.2,129.5",
        "--optimize",
        "--speed",
        "5",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Geo {
            command: GeoCommands::Route {
                ref points,
                optimize: true,
                speed: Some(s),
            }
        }) if points.len() == 3 && (s - 5.0).abs() < f64::EPSILON
    ));
}

#[test]
fn geo_tile_defaults_to_zoom_15() {
    let cli = Cli::try_parse_from(["storymap", "geo", "tile", "36.019,129.3435"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Geo {
            command: GeoCommands::Tile { zoom: 15, .. }
        })
    ));
}

#[test]
fn geo_rejects_out_of_range_coordinate() {
    let result = Cli::try_parse_from(["storymap", "geo", "tile", "91.0,129.0"]);
    assert!(result.is_err());
}

#[test]
fn parses_course_show_with_json() {
    let cli = Cli::try_parse_from(["storymap", "course", "show", "space-walk", "--json"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Course {
            command: CourseCommands::Show {
                ref id,
                path: None,
                json: true,
            }
        }) if id == "space-walk"
    ));
}

#[test]
fn parses_course_validate_with_path() {
    let cli = Cli::try_parse_from([
        "storymap",
        "course",
        "validate",
        "--path",
        "config/courses.yaml",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Course {
            command: CourseCommands::Validate { path: Some(ref p) }
        }) if p.ends_with("courses.yaml")
    ));
}

#[test]
fn parses_qr_stamp_with_ttl() {
    let cli = Cli::try_parse_from([
        "storymap",
        "qr",
        "stamp",
        "homigot",
        "stamp-homigot",
        "--ttl-minutes",
        "30",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Qr {
            command: QrCommands::Stamp {
                ref location,
                ref stamp,
                ttl_minutes: Some(30),
            }
        }) if location == "homigot" && stamp == "stamp-homigot"
    ));
}

#[test]
fn parses_qr_verify_with_position() {
    let cli = Cli::try_parse_from([
        "storymap",
        "qr",
        "verify",
        r#"{"type":"stamp","locationId":"homigot"}"#,
        "--course",
        "sea-walk",
        "--location",
        "homigot",
        "--position",
        "36.0766,129.5695",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Qr {
            command: QrCommands::Verify {
                position: Some(_),
                at: None,
                ..
            }
        })
    ));
}

#[test]
fn qr_verify_requires_course_and_location() {
    let result = Cli::try_parse_from(["storymap", "qr", "verify", "{}"]);
    assert!(result.is_err());
}

#[test]
fn parses_geocode_reverse() {
    let cli = Cli::try_parse_from(["storymap", "geocode", "reverse", "35.9876,129.5586"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Geocode {
            command: GeocodeCommands::Reverse { .. }
        })
    ));
}

#[test]
fn parse_coordinate_trims_whitespace() {
    let coord = parse_coordinate(" 36.019 , 129.3435 ").expect("valid coordinate");
    assert_eq!(coord, Coordinate::new(36.019, 129.3435));
}

#[test]
fn parse_coordinate_requires_comma() {
    let err = parse_coordinate("36.019 129.3435").unwrap_err();
    assert!(err.contains("lat,lng"));
}

#[test]
fn parse_coordinate_rejects_non_numeric() {
    let err = parse_coordinate("north,129.0").unwrap_err();
    assert!(err.contains("latitude"));
}

#[test]
fn ttl_minutes_within_range_is_accepted() {
    let ttl = qr::ttl_from_minutes(30).expect("valid ttl");
    assert_eq!(ttl.num_minutes(), 30);
}

#[test]
fn ttl_minutes_beyond_chrono_range_is_an_error() {
    let err = qr::ttl_from_minutes(1_000_000_000_000_000).unwrap_err();
    assert!(err.to_string().contains("too large"), "{err}");
}

#[test]
fn ttl_minutes_must_be_positive() {
    assert!(qr::ttl_from_minutes(0).is_err());
    assert!(qr::ttl_from_minutes(-10).is_err());
}

#[test]
fn help_is_rendered_by_the_parser_alone() {
    let err = Cli::try_parse_from(["storymap", "--help"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
}

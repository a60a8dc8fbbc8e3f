use clap::Subcommand;
use storymap_core::{AppConfig, Coordinate};
use storymap_map::KakaoLocalClient;

use crate::parse_coordinate;

#[derive(Debug, Subcommand)]
pub enum GeocodeCommands {
    /// Find coordinates for a Korean address
    Address { query: String },
    /// Find the address at a coordinate ("lat,lng")
    Reverse {
        #[arg(value_parser = parse_coordinate)]
        coord: Coordinate,
    },
}

fn client(config: &AppConfig) -> anyhow::Result<KakaoLocalClient> {
    let rest_key = config
        .kakao_rest_key
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("STORYMAP_KAKAO_REST_KEY is required for geocoding"))?;
    Ok(KakaoLocalClient::new(rest_key, config.geocode_timeout_secs)?)
}

pub(crate) async fn run(config: &AppConfig, command: GeocodeCommands) -> anyhow::Result<()> {
    let client = client(config)?;
    match command {
        GeocodeCommands::Address { query } => {
            let results = client.search_address(&query).await?;
            for result in &results {
                match &result.road_address {
                    Some(road) => println!("{}  {road} ({})", result.coordinate, result.address),
                    None => println!("{}  {}", result.coordinate, result.address),
                }
            }
        }
        GeocodeCommands::Reverse { coord } => {
            let address = client.coord_to_address(coord).await?;
            println!("{address}");
        }
    }
    Ok(())
}

use anyhow::{Context, Result, bail};
use zone_hunt_core::Coordinate;

/// Parse a `lat,lon` line as typed by a player.
pub fn parse_position(line: &str) -> Result<Coordinate> {
    let mut parts = line.split(',').map(str::trim);
    let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
        bail!("expected `lat,lon`, got {line:?}");
    };

    let lat: f64 = lat.parse().with_context(|| format!("invalid latitude {lat:?}"))?;
    let lon: f64 = lon.parse().with_context(|| format!("invalid longitude {lon:?}"))?;

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        bail!("coordinate out of range: {lat},{lon}");
    }

    Ok(Coordinate::new(lat, lon))
}

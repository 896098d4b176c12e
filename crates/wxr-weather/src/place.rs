use serde::{Deserialize, Serialize};

use crate::types::Coordinate;

/// A resolved, human-addressable location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: Option<String>,
    pub house_number: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    /// State or other first-level administrative area
    pub region: Option<String>,
    /// ISO 3166-1 alpha-2 country code
    pub country_code: Option<String>,
    pub postal_code: Option<String>,
    pub coordinate: Option<Coordinate>,
}

impl Place {
    /// Single-line postal address, e.g. "1600 Pennsylvania Ave, Washington, DC, US 20500".
    ///
    /// Absent or empty components are skipped. US state names are abbreviated.
    pub fn one_line_address(&self) -> String {
        let mut address = String::new();
        let mut add = |text: Option<&str>, with_comma: bool| {
            let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
                return;
            };
            if !address.is_empty() {
                if with_comma {
                    address.push(',');
                }
                address.push(' ');
            }
            address.push_str(text);
        };

        let region = self
            .region
            .as_deref()
            .map(|r| state_abbreviation(r).unwrap_or(r));

        add(self.house_number.as_deref(), true);
        add(self.street.as_deref(), false);
        add(self.city.as_deref(), true);
        add(region, true);
        add(self.country_code.as_deref(), true);
        add(self.postal_code.as_deref(), false);
        address
    }

    /// Short display name: the place name, else the city, else the full address
    pub fn short_name(&self) -> String {
        let present = |s: &&str| !s.trim().is_empty();
        self.name
            .as_deref()
            .filter(present)
            .or_else(|| self.city.as_deref().filter(present))
            .map(str::to_string)
            .unwrap_or_else(|| self.one_line_address())
    }
}

/// Postal code for a US state or DC name, case-insensitive
pub fn state_abbreviation(name: &str) -> Option<&'static str> {
    let code = match name.trim().to_lowercase().as_str() {
        "alabama" => "AL",
        "alaska" => "AK",
        "arizona" => "AZ",
        "arkansas" => "AR",
        "california" => "CA",
        "colorado" => "CO",
        "connecticut" => "CT",
        "delaware" => "DE",
        "district of columbia" => "DC",
        "florida" => "FL",
        "georgia" => "GA",
        "hawaii" => "HI",
        "idaho" => "ID",
        "illinois" => "IL",
        "indiana" => "IN",
        "iowa" => "IA",
        "kansas" => "KS",
        "kentucky" => "KY",
        "louisiana" => "LA",
        "maine" => "ME",
        "maryland" => "MD",
        "massachusetts" => "MA",
        "michigan" => "MI",
        "minnesota" => "MN",
        "mississippi" => "MS",
        "missouri" => "MO",
        "montana" => "MT",
        "nebraska" => "NE",
        "nevada" => "NV",
        "new hampshire" => "NH",
        "new jersey" => "NJ",
        "new mexico" => "NM",
        "new york" => "NY",
        "north carolina" => "NC",
        "north dakota" => "ND",
        "ohio" => "OH",
        "oklahoma" => "OK",
        "oregon" => "OR",
        "pennsylvania" => "PA",
        "rhode island" => "RI",
        "south carolina" => "SC",
        "south dakota" => "SD",
        "tennessee" => "TN",
        "texas" => "TX",
        "utah" => "UT",
        "vermont" => "VT",
        "virginia" => "VA",
        "washington" => "WA",
        "west virginia" => "WV",
        "wisconsin" => "WI",
        "wyoming" => "WY",
        _ => return None,
    };
    Some(code)
}

use serde::{Deserialize, Serialize, Serializer};

/// Address record returned by the postal-code resolution provider.
///
/// Unknown codes come back as `{"erro": true}`, which decodes to a record
/// with every field empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AddressResolution {
    #[serde(rename = "cep")]
    pub postal_code: String,
    #[serde(rename = "logradouro")]
    pub street: String,
    #[serde(rename = "bairro")]
    pub neighborhood: String,
    #[serde(rename = "localidade")]
    pub locality: String,
    #[serde(rename = "uf")]
    pub state: String,
}

impl AddressResolution {
    /// A resolution only counts when the provider echoed a postal code back.
    pub fn is_found(&self) -> bool {
        !self.postal_code.is_empty()
    }
}

/// Current conditions for a locality, as reported by the weather provider.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReading {
    pub location_name: String,
    pub temperature_celsius: f64,
}

/// Wire-facing answer of `POST /weather`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResponse {
    pub city: String,
    #[serde(serialize_with = "compact_number")]
    pub temp_c: f64,
    #[serde(serialize_with = "compact_number")]
    pub temp_f: f64,
    #[serde(serialize_with = "compact_number")]
    pub temp_k: f64,
}

impl WeatherResponse {
    pub fn from_reading(reading: WeatherReading) -> Self {
        let celsius = reading.temperature_celsius;
        Self {
            city: reading.location_name,
            temp_c: celsius,
            temp_f: celsius_to_fahrenheit(celsius),
            temp_k: celsius_to_kelvin(celsius),
        }
    }
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 1.8 + 32.0
}

pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + 273.15
}

/// Integral values are written as JSON integers (`25`, not `25.0`).
fn compact_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    // 2^53: beyond this not every integer is representable anyway
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_EXACT {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_for(celsius: f64) -> WeatherResponse {
        WeatherResponse::from_reading(WeatherReading {
            location_name: "São Paulo".into(),
            temperature_celsius: celsius,
        })
    }

    #[test]
    fn freezing_and_boiling_points() {
        let freezing = response_for(0.0);
        assert_eq!(freezing.temp_f, 32.0);
        assert_eq!(freezing.temp_k, 273.15);

        let boiling = response_for(100.0);
        assert_eq!(boiling.temp_f, 212.0);
        assert_eq!(boiling.temp_k, 373.15);
    }

    #[test]
    fn no_rounding_is_applied() {
        let r = response_for(21.3);
        assert_eq!(r.temp_f, 21.3 * 1.8 + 32.0);
        assert_eq!(r.temp_k, 21.3 + 273.15);
    }

    #[test]
    fn renders_integral_values_without_fraction() {
        let body = serde_json::to_string(&response_for(25.0)).unwrap();
        assert_eq!(
            body,
            r#"{"city":"São Paulo","temp_c":25,"temp_f":77,"temp_k":298.15}"#
        );
    }

    #[test]
    fn negative_and_fractional_values() {
        let body = serde_json::to_string(&response_for(-40.0)).unwrap();
        assert!(body.starts_with(r#"{"city":"São Paulo","temp_c":-40,"temp_f":-40,"temp_k":233.1"#));

        let body = serde_json::to_string(&response_for(0.5)).unwrap();
        assert!(body.contains(r#""temp_c":0.5"#));
    }

    #[test]
    fn decodes_its_own_rendering() {
        let original = response_for(17.8);
        let decoded: WeatherResponse =
            serde_json::from_str(&serde_json::to_string(&original).unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn resolution_error_payload_is_not_found() {
        let found: AddressResolution = serde_json::from_str(
            r#"{"cep":"01001-000","logradouro":"Praça da Sé","bairro":"Sé","localidade":"São Paulo","uf":"SP","ibge":"3550308"}"#,
        )
        .unwrap();
        assert!(found.is_found());
        assert_eq!(found.locality, "São Paulo");

        let missing: AddressResolution = serde_json::from_str(r#"{"erro": true}"#).unwrap();
        assert!(!missing.is_found());
    }
}

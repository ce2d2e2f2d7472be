//! Line profile and feed endpoint configuration.
//!
//! A [`LineProfile`] is stored as a JSON object on disk:
//! ```json
//! {
//!   "line_name": "S8",
//!   "reference": "Daglfing",
//!   "outbound_terminus": "8004168",
//!   "waypoints": [{ "name": "Flughafen", "x": 1312038.0, "y": 6165913.0 }],
//!   "inbound_minutes": { "Flughafen": 20 },
//!   "outbound_minutes": { "Flughafen": 20 },
//!   "inbound_excluded": ["Berg am Laim"],
//!   "outbound_shared_limit": 6
//! }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::corridor::{ApproachWindow, Corridor, CorridorError, Waypoint};
use crate::direction::DirectionClassifier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointDef {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

/// Everything that ties the pipeline to one line and one reference station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineProfile {
    pub line_name: String,
    pub reference: String,
    /// Route-identifier code of the outbound terminus.
    pub outbound_terminus: String,
    pub waypoints: Vec<WaypointDef>,
    pub inbound_minutes: HashMap<String, u32>,
    pub outbound_minutes: HashMap<String, u32>,
    #[serde(default)]
    pub inbound_excluded: Vec<String>,
    pub outbound_shared_limit: u32,
}

impl LineProfile {
    /// Loads a profile from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read line profile '{path}'"))?;
        let profile = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse line profile '{path}'"))?;
        Ok(profile)
    }

    /// Loads `path` if given, otherwise the built-in S8 profile.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::s8_daglfing()),
        }
    }

    /// S8 around Daglfing. Coordinates are EPSG:3857; inbound runs
    /// Flughafen → Daglfing → Herrsching, outbound the other way.
    pub fn s8_daglfing() -> Self {
        let waypoints = [
            ("Flughafen", 1312038.0, 6165913.0),
            ("Besucherpark", 1309570.0, 6165738.0),
            ("Hallbergmoos", 1303993.0, 6158387.0),
            ("Ismaning", 1300109.0, 6144523.0),
            ("Unterföhring", 1296567.0, 6138766.0),
            ("Johanneskirchen", 1296422.0, 6134937.0),
            ("Englschalking", 1296693.0, 6132938.0),
            ("Daglfing", 1296800.0, 6131703.0),
            ("Berg am Laim", 1295025.0, 6129373.0),
            ("Leuchtenbergring", 1293080.0, 6129221.0),
        ]
        .into_iter()
        .map(|(name, x, y)| WaypointDef {
            name: name.to_string(),
            x,
            y,
        })
        .collect();

        let table = |entries: &[(&str, u32)]| -> HashMap<String, u32> {
            entries
                .iter()
                .map(|(name, minutes)| (name.to_string(), *minutes))
                .collect()
        };

        Self {
            line_name: "S8".to_string(),
            reference: "Daglfing".to_string(),
            outbound_terminus: "8004168".to_string(),
            waypoints,
            inbound_minutes: table(&[
                ("Flughafen", 20),
                ("Besucherpark", 18),
                ("Hallbergmoos", 14),
                ("Ismaning", 10),
                ("Unterföhring", 6),
                ("Johanneskirchen", 4),
                ("Englschalking", 2),
                ("Daglfing", 0),
            ]),
            outbound_minutes: table(&[
                ("Leuchtenbergring", 4),
                ("Berg am Laim", 2),
                ("Daglfing", 0),
                ("Englschalking", 2),
                ("Johanneskirchen", 4),
                ("Unterföhring", 6),
                ("Ismaning", 10),
                ("Hallbergmoos", 14),
                ("Besucherpark", 18),
                ("Flughafen", 20),
            ]),
            inbound_excluded: vec!["Berg am Laim".to_string(), "Leuchtenbergring".to_string()],
            outbound_shared_limit: 6,
        }
    }

    /// Builds the validated waypoint table and ETA model.
    pub fn corridor(&self) -> Result<Corridor, CorridorError> {
        Corridor::new(
            self.reference.clone(),
            self.waypoints
                .iter()
                .map(|w| Waypoint::new(w.name.clone(), w.x, w.y))
                .collect(),
            self.inbound_minutes.clone(),
            self.outbound_minutes.clone(),
            ApproachWindow {
                inbound_excluded: self.inbound_excluded.clone(),
                outbound_shared_limit: self.outbound_shared_limit,
            },
        )
    }

    pub fn classifier(&self) -> DirectionClassifier {
        DirectionClassifier::new(self.outbound_terminus.clone())
    }
}

/// Connection settings for the realtime WebSocket feed.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub url: String,
    pub api_key: String,
    pub origin: String,
    /// Text commands sent right after the connection opens.
    pub commands: Vec<String>,
    /// How long to listen before tearing the subscription down.
    pub window: Duration,
    /// Upper bound on connect plus collection, measured from the start of
    /// the session. Must exceed `window`.
    pub hard_timeout: Duration,
}

impl FeedConfig {
    pub const DEFAULT_URL: &'static str = "wss://api.geops.io/realtime-ws/v1/";
    pub const DEFAULT_ORIGIN: &'static str = "https://s-bahn-muenchen-live.de";
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(10);
    pub const DEFAULT_HARD_TIMEOUT: Duration = Duration::from_secs(15);

    /// geOps subscription for the Munich S-Bahn network, limited to a
    /// bounding box around the monitored corridor.
    pub fn geops(api_key: impl Into<String>) -> Self {
        Self {
            url: Self::DEFAULT_URL.to_string(),
            api_key: api_key.into(),
            origin: Self::DEFAULT_ORIGIN.to_string(),
            commands: vec![
                "GET sbm_full".to_string(),
                "SUB sbm_full".to_string(),
                "BBOX 1268000 6110000 1350000 6200000 14".to_string(),
            ],
            window: Self::DEFAULT_WINDOW,
            hard_timeout: Self::DEFAULT_HARD_TIMEOUT,
        }
    }

    /// Rejects timings that leave no room to connect before the window.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.window.is_zero(), "collection window must be positive");
        ensure!(
            self.hard_timeout > self.window,
            "hard timeout ({}s) must be longer than the collection window ({}s)",
            self.hard_timeout.as_secs_f64(),
            self.window.as_secs_f64()
        );
        Ok(())
    }

    /// Endpoint URL with the API key appended as the `key` query parameter.
    pub fn endpoint(&self) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}key={}", self.url, separator, self.api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_builtin_profile_is_valid() {
        let profile = LineProfile::s8_daglfing();
        let corridor = profile.corridor().unwrap();
        assert_eq!(corridor.waypoints().len(), 10);
        assert_eq!(corridor.reference(), "Daglfing");
    }

    #[test]
    fn test_profile_json_roundtrip_through_file() {
        let path = temp_path("sbahn_eta_test_profile.json");
        let profile = LineProfile::s8_daglfing();
        fs::write(&path, serde_json::to_string_pretty(&profile).unwrap()).unwrap();

        let loaded = LineProfile::load(&path).unwrap();
        assert_eq!(loaded, profile);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = LineProfile::load("/definitely/not/here/profile.json");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_without_path() {
        let profile = LineProfile::load_or_default(None).unwrap();
        assert_eq!(profile.line_name, "S8");
    }

    #[test]
    fn test_minimal_profile_json() {
        let json = r#"{
            "line_name": "S2",
            "reference": "B",
            "outbound_terminus": "123",
            "waypoints": [{"name": "A", "x": 0.0, "y": 0.0}, {"name": "B", "x": 1.0, "y": 1.0}],
            "inbound_minutes": {"A": 3, "B": 0},
            "outbound_minutes": {"B": 0},
            "outbound_shared_limit": 0
        }"#;
        let profile: LineProfile = serde_json::from_str(json).unwrap();
        assert!(profile.inbound_excluded.is_empty());
        assert!(profile.corridor().is_ok());
    }

    #[test]
    fn test_endpoint_appends_key() {
        let config = FeedConfig::geops("abc");
        assert_eq!(
            config.endpoint(),
            "wss://api.geops.io/realtime-ws/v1/?key=abc"
        );

        let config = FeedConfig {
            url: "wss://example.test/ws?x=1".to_string(),
            ..FeedConfig::geops("abc")
        };
        assert_eq!(config.endpoint(), "wss://example.test/ws?x=1&key=abc");
    }

    #[test]
    fn test_default_timings_are_valid() {
        assert!(FeedConfig::geops("abc").validate().is_ok());
    }

    #[test]
    fn test_hard_timeout_must_exceed_window() {
        let equal = FeedConfig {
            window: Duration::from_secs(10),
            hard_timeout: Duration::from_secs(10),
            ..FeedConfig::geops("abc")
        };
        assert!(equal.validate().is_err());

        let shorter = FeedConfig {
            window: Duration::from_secs(10),
            hard_timeout: Duration::from_secs(5),
            ..FeedConfig::geops("abc")
        };
        let err = shorter.validate().unwrap_err();
        assert!(err.to_string().contains("hard timeout"));

        let zero_window = FeedConfig {
            window: Duration::ZERO,
            ..FeedConfig::geops("abc")
        };
        assert!(zero_window.validate().is_err());
    }
}

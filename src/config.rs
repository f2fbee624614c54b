use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Which `Detector` implementation the server evaluates frames with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    /// Placeholder that never detects anything.
    None,
    /// Trusts detections reported by the in-browser model, after filtering.
    Client,
    /// Always detects one can.
    Simulate,
}

impl FromStr for DetectorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "disabled" => Ok(DetectorKind::None),
            "client" => Ok(DetectorKind::Client),
            "simulate" => Ok(DetectorKind::Simulate),
            other => anyhow::bail!("unknown detector mode: {other}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    pub mode: DetectorKind,
    pub confidence_threshold: f32,
    pub classes: Vec<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            mode: DetectorKind::Client,
            confidence_threshold: 0.5,
            classes: vec!["can".into(), "bottle".into()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub detection: DetectionConfig,
    pub points_per_can: i64,
    pub admin_token: Option<String>,
    pub db_ping_timeout_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "canpoints".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "canpoints-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };

        let mut detection = DetectionConfig::default();
        if let Ok(mode) = std::env::var("DETECTOR_MODE") {
            detection.mode = mode.parse()?;
        }
        if let Ok(threshold) = std::env::var("DETECTION_CONFIDENCE_THRESHOLD") {
            detection.confidence_threshold = parse_threshold(&threshold)?;
        }
        if let Ok(classes) = std::env::var("DETECTION_CLASSES") {
            detection.classes = parse_classes(&classes);
        }

        let points_per_can = match std::env::var("POINTS_PER_CAN") {
            Ok(v) => parse_points(&v)?,
            Err(_) => 1,
        };

        let admin_token = std::env::var("ADMIN_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        let db_ping_timeout_ms = std::env::var("DB_PING_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(2000);

        Ok(Self {
            database_url,
            jwt,
            detection,
            points_per_can,
            admin_token,
            db_ping_timeout_ms,
        })
    }
}

fn parse_threshold(raw: &str) -> anyhow::Result<f32> {
    let value: f32 = raw
        .trim()
        .parse()
        .with_context(|| format!("invalid DETECTION_CONFIDENCE_THRESHOLD: {raw}"))?;
    anyhow::ensure!(
        (0.0..=1.0).contains(&value),
        "DETECTION_CONFIDENCE_THRESHOLD must be within [0, 1], got {value}"
    );
    Ok(value)
}

fn parse_classes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_points(raw: &str) -> anyhow::Result<i64> {
    let value: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("invalid POINTS_PER_CAN: {raw}"))?;
    anyhow::ensure!(value > 0, "POINTS_PER_CAN must be positive, got {value}");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detector_kind_parses_known_modes() {
        assert_eq!("none".parse::<DetectorKind>().unwrap(), DetectorKind::None);
        assert_eq!(" Client ".parse::<DetectorKind>().unwrap(), DetectorKind::Client);
        assert_eq!(
            "SIMULATE".parse::<DetectorKind>().unwrap(),
            DetectorKind::Simulate
        );
        assert!("yolo".parse::<DetectorKind>().is_err());
    }

    #[test]
    fn threshold_must_be_a_probability() {
        assert_eq!(parse_threshold("0.75").unwrap(), 0.75);
        assert!(parse_threshold("1.5").is_err());
        assert!(parse_threshold("-0.1").is_err());
        assert!(parse_threshold("high").is_err());
    }

    #[test]
    fn classes_are_normalized() {
        assert_eq!(
            parse_classes(" Can, bottle ,,CUP"),
            vec!["can".to_string(), "bottle".to_string(), "cup".to_string()]
        );
    }

    #[test]
    fn points_per_can_must_be_positive() {
        assert_eq!(parse_points("3").unwrap(), 3);
        assert!(parse_points("0").is_err());
        assert!(parse_points("-2").is_err());
    }
}

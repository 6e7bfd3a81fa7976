//! Core domain types shared across components.

use std::path::PathBuf;

use serde::Deserialize;

/// An immutable configuration record naming one upstream OSM extract.
///
/// # Invariants
/// - `name` is stable across runs and used to key the on-disk cache file
///   and the `--where` filter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Extract {
    /// Stable identifier, also used for `--where` filtering.
    pub name: String,
    /// Upstream URL for the PBF file.
    pub url: String,
}

impl Extract {
    /// The local cache file basename derived from the URL.
    ///
    /// # Examples
    /// ```
    /// use osmfleet::domain::model::Extract;
    ///
    /// let extract = Extract { name: "r1".into(), url: "http://x/region.osm.pbf".into() };
    /// assert_eq!(extract.cache_basename(), "region.osm.pbf");
    /// ```
    #[must_use]
    pub fn cache_basename(&self) -> &str {
        self.url.rsplit('/').next().unwrap_or(self.url.as_str())
    }

    /// The local cache path under `pbf_dir`.
    #[must_use]
    pub fn cache_path(&self, pbf_dir: &std::path::Path) -> PathBuf {
        pbf_dir.join(self.cache_basename())
    }
}

/// Lifecycle state of one managed database. See §3.4: total order of
/// progression INIT → PROVISIONING → PROVISIONED → HASMAPDATA, with
/// PROVISIONING → INIT as the sole regression path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbStatus {
    /// Not yet provisioned (also covers absent/unset status).
    Init,
    /// Provisioning is in progress; a crash-safe sentinel.
    Provisioning,
    /// Schema and extensions are present; no map data yet.
    Provisioned,
    /// At least one successful import and rotate has occurred.
    HasMapData,
}

impl DbStatus {
    /// Parse the orchestrator's opaque status string tag.
    ///
    /// Unrecognised or absent tags are treated as [`DbStatus::Init`].
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("PROVISIONING") => Self::Provisioning,
            Some("PROVISIONED") => Self::Provisioned,
            Some("HASMAPDATA") => Self::HasMapData,
            _ => Self::Init,
        }
    }

    /// Render as the orchestrator's opaque status string tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::Provisioning => "PROVISIONING",
            Self::Provisioned => "PROVISIONED",
            Self::HasMapData => "HASMAPDATA",
        }
    }

    /// Whether import/rotate may be attempted from this status (I3).
    #[must_use]
    pub const fn is_materialize_eligible(self) -> bool {
        matches!(self, Self::Provisioned | Self::HasMapData)
    }

    /// Whether this status counts as "ready" for deployment purposes (I4).
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::HasMapData)
    }
}

/// One logical OSM-schema database in the fleet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedDatabase {
    /// Stable identifier.
    pub name: String,
    /// Connection descriptor for the target database.
    pub dsn: String,
    /// Connection descriptor for the administrative database on the same
    /// host, derived by substituting the database name with the admin
    /// database name.
    pub dsn_init: String,
    /// Current lifecycle status as last observed from the registry.
    pub status: DbStatus,
}

/// An orchestrator-managed workload serving vector tiles from one
/// materialized database. Its only observable property is existence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileDeployment {
    /// The name of the managed database this deployment serves.
    pub database_name: String,
}

/// A single timed occurrence fed into the telemetry sink.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryEvent {
    /// The metric family key.
    pub event_name: String,
    /// Event start time, Unix seconds.
    pub start_time: f64,
    /// Event end time, Unix seconds.
    pub end_time: f64,
    /// Optional extra label pairs attached to the observation.
    pub extra_labels: Vec<(String, String)>,
}

impl TelemetryEvent {
    /// Duration in seconds, clamped to zero if the clock went backwards.
    #[must_use]
    pub fn duration_seconds(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_defaults_to_init() {
        assert_eq!(DbStatus::parse(None), DbStatus::Init);
        assert_eq!(DbStatus::parse(Some("garbage")), DbStatus::Init);
        assert_eq!(DbStatus::parse(Some("HASMAPDATA")), DbStatus::HasMapData);
    }

    #[test]
    fn status_roundtrips_through_as_str() {
        for status in [
            DbStatus::Init,
            DbStatus::Provisioning,
            DbStatus::Provisioned,
            DbStatus::HasMapData,
        ] {
            assert_eq!(DbStatus::parse(Some(status.as_str())), status);
        }
    }

    #[test]
    fn materialize_eligibility_excludes_init_and_provisioning() {
        assert!(!DbStatus::Init.is_materialize_eligible());
        assert!(!DbStatus::Provisioning.is_materialize_eligible());
        assert!(DbStatus::Provisioned.is_materialize_eligible());
        assert!(DbStatus::HasMapData.is_materialize_eligible());
    }

    #[test]
    fn only_hasmapdata_is_ready() {
        assert!(!DbStatus::Provisioned.is_ready());
        assert!(DbStatus::HasMapData.is_ready());
    }

    #[test]
    fn duration_clamps_to_zero_on_backwards_clock() {
        let event = TelemetryEvent {
            event_name: "fetch".into(),
            start_time: 10.0,
            end_time: 5.0,
            extra_labels: vec![],
        };
        assert_eq!(event.duration_seconds(), 0.0);
    }
}

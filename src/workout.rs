use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A point on the map, decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Parse `"LAT,LNG"`. Rejects anything non-finite.
    pub fn parse(s: &str) -> Option<Self> {
        let (lat, lng) = s.split_once(',')?;
        let lat = lat.trim().parse::<f64>().ok()?;
        let lng = lng.trim().parse::<f64>().ok()?;
        (lat.is_finite() && lng.is_finite()).then_some(Self { lat, lng })
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.lat, self.lng)
    }
}

/// The two activity kinds the tracker knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkoutKind {
    Running,
    Cycling,
}

impl WorkoutKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Cycling => "Cycling",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Running => "🏃",
            Self::Cycling => "🚴",
        }
    }

    /// The form field this kind needs on top of distance and duration.
    pub fn extra_field(self) -> &'static str {
        match self {
            Self::Running => "cadence",
            Self::Cycling => "elevation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" | "run" => Some(Self::Running),
            "cycling" | "ride" => Some(Self::Cycling),
            _ => None,
        }
    }
}

/// Kind-specific fields plus the metric derived once at creation.
///
/// The tag rides along in serialized form, so a reloaded history gets the
/// right variant back instead of a pile of look-alike records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WorkoutDetails {
    Running {
        cadence_spm: f64,
        pace_min_per_km: f64,
    },
    Cycling {
        elevation_gain_m: f64,
        speed_km_per_h: f64,
    },
}

impl WorkoutDetails {
    pub fn kind(&self) -> WorkoutKind {
        match self {
            Self::Running { .. } => WorkoutKind::Running,
            Self::Cycling { .. } => WorkoutKind::Cycling,
        }
    }
}

/// One recorded workout, pinned to the map position it was created at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub distance_km: f64,
    pub duration_min: f64,
    pub at: LatLng,
    #[serde(flatten)]
    pub details: WorkoutDetails,
}

impl Workout {
    /// Record a run. Pace is fixed here and never recomputed.
    pub fn running(distance_km: f64, duration_min: f64, at: LatLng, cadence_spm: f64) -> Self {
        Self::record(
            distance_km,
            duration_min,
            at,
            WorkoutDetails::Running {
                cadence_spm,
                pace_min_per_km: duration_min / distance_km,
            },
        )
    }

    /// Record a ride. Speed is fixed here and never recomputed.
    pub fn cycling(distance_km: f64, duration_min: f64, at: LatLng, elevation_gain_m: f64) -> Self {
        Self::record(
            distance_km,
            duration_min,
            at,
            WorkoutDetails::Cycling {
                elevation_gain_m,
                speed_km_per_h: distance_km / duration_min,
            },
        )
    }

    fn record(distance_km: f64, duration_min: f64, at: LatLng, details: WorkoutDetails) -> Self {
        let created_at = Utc::now();
        Self {
            id: id_from_millis(created_at.timestamp_millis()),
            created_at,
            distance_km,
            duration_min,
            at,
            details,
        }
    }

    pub fn kind(&self) -> WorkoutKind {
        self.details.kind()
    }

    pub fn pace_min_per_km(&self) -> Option<f64> {
        match self.details {
            WorkoutDetails::Running { pace_min_per_km, .. } => Some(pace_min_per_km),
            WorkoutDetails::Cycling { .. } => None,
        }
    }

    pub fn speed_km_per_h(&self) -> Option<f64> {
        match self.details {
            WorkoutDetails::Cycling { speed_km_per_h, .. } => Some(speed_km_per_h),
            WorkoutDetails::Running { .. } => None,
        }
    }

    /// Entry title, e.g. "Running on June 5".
    pub fn describe(&self) -> String {
        format!(
            "{} on {}",
            self.kind().label(),
            self.created_at.format("%B %-d")
        )
    }
}

/// Ids are the decimal tail of the creation timestamp. Two workouts created
/// within the same millisecond would collide; a single-user log never hits
/// that in practice.
fn id_from_millis(ms: i64) -> String {
    let digits = ms.to_string();
    let cut = digits.len().saturating_sub(10);
    digits[cut..].to_string()
}

/// Raw text of the workout form. Only the fields relevant to the selected
/// kind get read.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} has to be a number")]
    NotANumber { field: &'static str },
    #[error("{field} has to be a positive number")]
    NotPositive { field: &'static str },
}

/// The single validation gate in front of record creation: coerce the
/// required fields, reject anything non-finite or not strictly positive,
/// then build the record.
pub fn from_form(
    kind: WorkoutKind,
    at: LatLng,
    form: &FormFields,
) -> Result<Workout, ValidationError> {
    let distance = positive_number("distance", &form.distance)?;
    let duration = positive_number("duration", &form.duration)?;

    Ok(match kind {
        WorkoutKind::Running => {
            let cadence = positive_number("cadence", &form.cadence)?;
            Workout::running(distance, duration, at, cadence)
        }
        WorkoutKind::Cycling => {
            let elevation = positive_number("elevation", &form.elevation)?;
            Workout::cycling(distance, duration, at, elevation)
        }
    })
}

fn positive_number(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    let Ok(value) = raw.trim().parse::<f64>() else {
        return Err(ValidationError::NotANumber { field });
    };
    if !value.is_finite() {
        return Err(ValidationError::NotANumber { field });
    }
    if value <= 0.0 {
        return Err(ValidationError::NotPositive { field });
    }
    Ok(value)
}

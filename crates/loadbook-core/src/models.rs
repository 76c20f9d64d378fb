//! Record schema for a single load-development test.
//!
//! One `TestRecord` is persisted per test id. Every nested struct carries
//! `#[serde(default)]`, so a record written before a field existed (for
//! example `neck_turned`, `brass_sizing`, `bushing_size`, `shoulder_bump` or
//! `b2o_in`) loads with that field backfilled instead of failing. Leaves
//! that are blank, mistyped or out of range also fall back to their default.

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::codec::identifier::{decode_test_id, encode_test_id, IdentifierFields};
use crate::lenient;
use crate::store::components::ComponentLists;

// ---------------------------------------------------------------------------
// Schema defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_CHRONO_CSV: &str = "chrono.csv";
pub const DEFAULT_TARGET_PHOTO: &str = "target.jpg";
pub const DEFAULT_SHOTS: u32 = 5;

const MM_PER_INCH: f64 = 25.4;
const METRES_PER_YARD: f64 = 0.9144;

/// Today's local date as `YYYY-MM-DD`.
pub fn today_iso() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Group size in MOA from a linear group size and target distance.
///
/// Uses the shooter's approximation of 1 MOA = 1 inch per 100 yards and
/// rounds to two decimals. Returns 0.0 for non-positive inputs.
pub fn calculate_moa(group_size_mm: f64, distance_m: f64) -> f64 {
    if distance_m <= 0.0 || group_size_mm <= 0.0 {
        return 0.0;
    }
    let group_size_inches = group_size_mm / MM_PER_INCH;
    let distance_yards = distance_m / METRES_PER_YARD;
    let moa = group_size_inches / distance_yards * 100.0;
    (moa * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeckTurned {
    Yes,
    #[default]
    No,
}

impl NeckTurned {
    pub fn as_str(self) -> &'static str {
        match self {
            NeckTurned::Yes => "Yes",
            NeckTurned::No => "No",
        }
    }
}

/// Sky conditions recorded for a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weather {
    #[default]
    Clear,
    Overcast,
    Rain,
    Fog,
    Variable,
}

impl Weather {
    pub const ALL: [Weather; 5] = [
        Weather::Clear,
        Weather::Overcast,
        Weather::Rain,
        Weather::Fog,
        Weather::Variable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Weather::Clear => "Clear",
            Weather::Overcast => "Overcast",
            Weather::Rain => "Rain",
            Weather::Fog => "Fog",
            Weather::Variable => "Variable",
        }
    }

    pub fn parse(value: &str) -> Option<Weather> {
        Weather::ALL
            .into_iter()
            .find(|w| w.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

// ---------------------------------------------------------------------------
// Nested sections
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Platform {
    #[serde(deserialize_with = "lenient::text")]
    pub calibre: String,
    #[serde(deserialize_with = "lenient::text")]
    pub rifle: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub barrel_length_in: f64,
    #[serde(deserialize_with = "lenient::text")]
    pub twist_rate: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Case {
    #[serde(deserialize_with = "lenient::text")]
    pub brand: String,
    #[serde(deserialize_with = "lenient::text")]
    pub lot: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub neck_turned: NeckTurned,
    #[serde(deserialize_with = "lenient::text")]
    pub brass_sizing: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub bushing_size: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub shoulder_bump: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bullet {
    #[serde(deserialize_with = "lenient::text")]
    pub brand: String,
    #[serde(deserialize_with = "lenient::text")]
    pub model: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub weight_gr: f64,
    #[serde(deserialize_with = "lenient::text")]
    pub lot: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Powder {
    #[serde(deserialize_with = "lenient::text")]
    pub brand: String,
    #[serde(deserialize_with = "lenient::text")]
    pub model: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub charge_gr: f64,
    #[serde(deserialize_with = "lenient::text")]
    pub lot: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Primer {
    #[serde(deserialize_with = "lenient::text")]
    pub brand: String,
    #[serde(deserialize_with = "lenient::text")]
    pub model: String,
    #[serde(deserialize_with = "lenient::text")]
    pub lot: String,
}

/// Cartridge components plus the two loaded-round measurements.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ammo {
    #[serde(deserialize_with = "lenient::or_default")]
    pub case: Case,
    #[serde(deserialize_with = "lenient::or_default")]
    pub bullet: Bullet,
    #[serde(deserialize_with = "lenient::or_default")]
    pub powder: Powder,
    #[serde(deserialize_with = "lenient::or_default")]
    pub primer: Primer,
    #[serde(deserialize_with = "lenient::or_default")]
    pub coal_in: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub b2o_in: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
    #[serde(deserialize_with = "lenient::or_default")]
    pub temperature_c: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub humidity_percent: u8,
    #[serde(deserialize_with = "lenient::or_default")]
    pub pressure_hpa: u32,
    #[serde(deserialize_with = "lenient::or_default")]
    pub wind_speed_mps: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub wind_dir_deg: u16,
    #[serde(deserialize_with = "lenient::or_default")]
    pub weather: Weather,
}

/// Group measurements. Point-of-impact offsets are signed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    #[serde(deserialize_with = "lenient::or_default")]
    pub group_es_mm: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub group_es_moa: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub group_es_x_mm: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub group_es_y_mm: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub mean_radius_mm: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub poi_x_mm: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub poi_y_mm: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub shots: u32,
}

impl Default for Group {
    fn default() -> Self {
        Self {
            group_es_mm: 0.0,
            group_es_moa: 0.0,
            group_es_x_mm: 0.0,
            group_es_y_mm: 0.0,
            mean_radius_mm: 0.0,
            poi_x_mm: 0.0,
            poi_y_mm: 0.0,
            shots: DEFAULT_SHOTS,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Chrono {
    #[serde(deserialize_with = "lenient::or_default")]
    pub avg_velocity_fps: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub sd_fps: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub es_fps: f64,
}

/// Sibling attachments stored next to the record. Presence is advisory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Files {
    #[serde(deserialize_with = "lenient::text")]
    pub chrono_csv: String,
    #[serde(deserialize_with = "lenient::text")]
    pub target_photo: String,
}

impl Default for Files {
    fn default() -> Self {
        Self {
            chrono_csv: DEFAULT_CHRONO_CSV.to_string(),
            target_photo: DEFAULT_TARGET_PHOTO.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// TestRecord
// ---------------------------------------------------------------------------

/// The unit of persistence: everything recorded about one test.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestRecord {
    #[serde(deserialize_with = "lenient::text")]
    pub test_id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub date: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub distance_m: u32,
    #[serde(deserialize_with = "lenient::or_default")]
    pub platform: Platform,
    #[serde(deserialize_with = "lenient::or_default")]
    pub ammo: Ammo,
    #[serde(deserialize_with = "lenient::or_default")]
    pub environment: Environment,
    #[serde(deserialize_with = "lenient::or_default")]
    pub group: Group,
    #[serde(deserialize_with = "lenient::or_default")]
    pub chrono: Chrono,
    #[serde(deserialize_with = "lenient::or_default")]
    pub files: Files,
    #[serde(deserialize_with = "lenient::text")]
    pub notes: String,
}

impl Default for TestRecord {
    fn default() -> Self {
        Self::empty()
    }
}

impl TestRecord {
    /// A fully defaulted record dated today.
    pub fn empty() -> Self {
        Self {
            test_id: String::new(),
            date: today_iso(),
            distance_m: 0,
            platform: Platform::default(),
            ammo: Ammo::default(),
            environment: Environment::default(),
            group: Group::default(),
            chrono: Chrono::default(),
            files: Files::default(),
            notes: String::new(),
        }
    }

    /// Like [`TestRecord::empty`], with `brass_sizing` preset to the first
    /// configured option.
    pub fn empty_with_components(components: &ComponentLists) -> Self {
        let mut record = Self::empty();
        if let Some(sizing) = components.default_brass_sizing() {
            record.ammo.case.brass_sizing = sizing.to_string();
        }
        record
    }

    /// A defaulted record keyed by `test_id` and pre-filled from whatever the
    /// identifier encodes. Used when no stored record exists for the key.
    pub fn from_test_id(test_id: &str) -> Self {
        let mut record = Self::empty();
        record.test_id = test_id.to_string();
        record.apply_identifier_fields(&decode_test_id(test_id));
        record
    }

    /// The identifying fields the codec encodes.
    pub fn identifier_fields(&self) -> IdentifierFields {
        IdentifierFields {
            date: self.date.clone(),
            distance_m: self.distance_m,
            calibre: self.platform.calibre.clone(),
            rifle: self.platform.rifle.clone(),
            case_brand: self.ammo.case.brand.clone(),
            bullet_brand: self.ammo.bullet.brand.clone(),
            bullet_model: self.ammo.bullet.model.clone(),
            bullet_weight_gr: self.ammo.bullet.weight_gr,
            powder_brand: self.ammo.powder.brand.clone(),
            powder_model: self.ammo.powder.model.clone(),
            powder_charge_gr: self.ammo.powder.charge_gr,
            coal_in: self.ammo.coal_in,
            b2o_in: self.ammo.b2o_in,
            primer_brand: self.ammo.primer.brand.clone(),
            primer_model: self.ammo.primer.model.clone(),
        }
    }

    /// Copy decoded identifier fields into the record. An empty decoded date
    /// keeps the record's current date.
    pub fn apply_identifier_fields(&mut self, fields: &IdentifierFields) {
        if !fields.date.is_empty() {
            self.date = fields.date.clone();
        }
        self.distance_m = fields.distance_m;
        self.platform.calibre = fields.calibre.clone();
        self.platform.rifle = fields.rifle.clone();
        self.ammo.case.brand = fields.case_brand.clone();
        self.ammo.bullet.brand = fields.bullet_brand.clone();
        self.ammo.bullet.model = fields.bullet_model.clone();
        self.ammo.bullet.weight_gr = fields.bullet_weight_gr;
        self.ammo.powder.brand = fields.powder_brand.clone();
        self.ammo.powder.model = fields.powder_model.clone();
        self.ammo.powder.charge_gr = fields.powder_charge_gr;
        self.ammo.coal_in = fields.coal_in;
        self.ammo.b2o_in = fields.b2o_in;
        self.ammo.primer.brand = fields.primer_brand.clone();
        self.ammo.primer.model = fields.primer_model.clone();
    }

    /// Encode the identifying fields, store the result as `test_id`, and
    /// return it.
    pub fn assign_test_id(&mut self) -> &str {
        self.test_id = encode_test_id(&self.identifier_fields());
        &self.test_id
    }

    /// Recompute `group_es_moa` from `group_es_mm` and the distance.
    pub fn refresh_group_moa(&mut self) {
        self.group.group_es_moa = calculate_moa(self.group.group_es_mm, f64::from(self.distance_m));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record_defaults() {
        let record = TestRecord::empty();
        assert!(record.test_id.is_empty());
        assert_eq!(record.date, today_iso());
        assert_eq!(record.distance_m, 0);
        assert_eq!(record.environment.weather, Weather::Clear);
        assert_eq!(record.group.shots, 5);
        assert_eq!(record.files.chrono_csv, "chrono.csv");
        assert_eq!(record.files.target_photo, "target.jpg");
        assert_eq!(record.ammo.case.neck_turned, NeckTurned::No);
        assert_eq!(record.ammo.case.shoulder_bump, 0.0);
        assert_eq!(record.ammo.b2o_in, 0.0);
    }

    #[test]
    fn test_today_iso_shape() {
        let today = today_iso();
        assert_eq!(today.len(), 10);
        assert_eq!(&today[4..5], "-");
        assert_eq!(&today[7..8], "-");
    }

    #[test]
    fn test_backfills_fields_missing_from_older_records() {
        let yaml = "\
test_id: old
date: 2024-03-02
distance_m: 100
ammo:
  case:
    brand: Lapua
    lot: L1
  coal_in: 2.26
group:
  group_es_mm: 12.5
";
        let record: TestRecord = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(record.ammo.case.brand, "Lapua");
        assert_eq!(record.ammo.case.neck_turned, NeckTurned::No);
        assert_eq!(record.ammo.case.brass_sizing, "");
        assert_eq!(record.ammo.case.bushing_size, 0.0);
        assert_eq!(record.ammo.case.shoulder_bump, 0.0);
        assert_eq!(record.ammo.b2o_in, 0.0);
        assert_eq!(record.group.shots, 5);
        assert_eq!(record.files, Files::default());
    }

    #[test]
    fn test_weather_parse() {
        assert_eq!(Weather::parse("overcast"), Some(Weather::Overcast));
        assert_eq!(Weather::parse(" Fog "), Some(Weather::Fog));
        assert_eq!(Weather::parse("Hail"), None);
    }

    #[test]
    fn test_calculate_moa() {
        // 27.78 mm at 100 m is one inch per hundred yards.
        assert_eq!(calculate_moa(27.78, 100.0), 1.0);
        assert_eq!(calculate_moa(55.56, 100.0), 2.0);
        assert_eq!(calculate_moa(0.0, 100.0), 0.0);
        assert_eq!(calculate_moa(25.0, 0.0), 0.0);
        assert_eq!(calculate_moa(-4.0, 100.0), 0.0);
    }

    #[test]
    fn test_refresh_group_moa() {
        let mut record = TestRecord::empty();
        record.distance_m = 100;
        record.group.group_es_mm = 27.78;
        record.refresh_group_moa();
        assert_eq!(record.group.group_es_moa, 1.0);
    }

    #[test]
    fn test_assign_test_id_and_back() {
        let mut record = TestRecord::empty();
        record.date = "2025-06-01".to_string();
        record.distance_m = 100;
        record.platform.calibre = "223 Rem".to_string();
        record.platform.rifle = "Tikka T3x".to_string();
        record.ammo.case.brand = "Lapua".to_string();
        record.ammo.bullet.brand = "Hornady".to_string();
        record.ammo.bullet.model = "ELD-M".to_string();
        record.ammo.bullet.weight_gr = 75.0;
        record.ammo.powder.brand = "ADI".to_string();
        record.ammo.powder.model = "2208".to_string();
        record.ammo.powder.charge_gr = 23.5;
        record.ammo.coal_in = 2.26;
        record.ammo.b2o_in = 1.8;
        record.ammo.primer.brand = "CCI".to_string();
        record.ammo.primer.model = "BR4".to_string();

        let id = record.assign_test_id().to_string();
        assert_eq!(
            id,
            "2025-06-01__100m_223-Rem_Tikka-T3x_Lapua_Hornady_ELD-M_75gr_ADI_2208_23gr_2.260in_1.800in_CCI_BR4"
        );

        let prefilled = TestRecord::from_test_id(&id);
        assert_eq!(prefilled.test_id, id);
        assert_eq!(prefilled.date, "2025-06-01");
        assert_eq!(prefilled.platform.calibre, "223-Rem");
        assert_eq!(prefilled.ammo.powder.charge_gr, 23.0);
        assert_eq!(prefilled.ammo.b2o_in, 1.8);
        // Non-identifying fields stay at their defaults.
        assert_eq!(prefilled.group.shots, 5);
    }

    #[test]
    fn test_from_unparseable_id_keeps_defaults() {
        let record = TestRecord::from_test_id("scratch");
        assert_eq!(record.test_id, "scratch");
        assert_eq!(record.date, today_iso());
        assert_eq!(record.distance_m, 0);
        assert!(record.platform.calibre.is_empty());
    }

    #[test]
    fn test_empty_with_components_presets_brass_sizing() {
        let components = ComponentLists::stock();
        let record = TestRecord::empty_with_components(&components);
        assert_eq!(
            Some(record.ammo.case.brass_sizing.as_str()),
            components.default_brass_sizing()
        );
    }
}

//! Flat, single-level rows over nested test records for tabular filtering.

use indexmap::IndexMap;
use serde::Serialize;

use crate::errors::LoadbookResult;
use crate::models::TestRecord;

/// Column names of a [`FlatRow`], in output order.
pub const FLAT_COLUMNS: &[&str] = &[
    "test_id",
    "date",
    "distance_m",
    "calibre",
    "rifle",
    "barrel_length_in",
    "twist_rate",
    "case_brand",
    "case_lot",
    "neck_turned",
    "brass_sizing",
    "bushing_size",
    "shoulder_bump",
    "bullet_brand",
    "bullet_model",
    "bullet_weight_gr",
    "bullet_lot",
    "powder_brand",
    "powder_model",
    "powder_charge_gr",
    "powder_lot",
    "primer_brand",
    "primer_model",
    "primer_lot",
    "coal_in",
    "b2o_in",
    "temperature_c",
    "humidity_percent",
    "pressure_hpa",
    "wind_speed_mps",
    "wind_dir_deg",
    "weather",
    "shots",
    "group_es_mm",
    "group_es_moa",
    "group_es_x_mm",
    "group_es_y_mm",
    "mean_radius_mm",
    "poi_x_mm",
    "poi_y_mm",
    "avg_velocity_fps",
    "sd_fps",
    "es_fps",
    "chrono_csv",
    "target_photo",
    "notes",
];

/// A single cell of a flat row.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlatValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

/// One test as a single-level row. Field names match [`FLAT_COLUMNS`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlatRow {
    pub test_id: String,
    pub date: String,
    pub distance_m: u32,
    pub calibre: String,
    pub rifle: String,
    pub barrel_length_in: f64,
    pub twist_rate: String,
    pub case_brand: String,
    pub case_lot: String,
    pub neck_turned: String,
    pub brass_sizing: String,
    pub bushing_size: f64,
    pub shoulder_bump: f64,
    pub bullet_brand: String,
    pub bullet_model: String,
    pub bullet_weight_gr: f64,
    pub bullet_lot: String,
    pub powder_brand: String,
    pub powder_model: String,
    pub powder_charge_gr: f64,
    pub powder_lot: String,
    pub primer_brand: String,
    pub primer_model: String,
    pub primer_lot: String,
    pub coal_in: f64,
    pub b2o_in: f64,
    pub temperature_c: f64,
    pub humidity_percent: u8,
    pub pressure_hpa: u32,
    pub wind_speed_mps: f64,
    pub wind_dir_deg: u16,
    pub weather: String,
    pub shots: u32,
    pub group_es_mm: f64,
    pub group_es_moa: f64,
    pub group_es_x_mm: f64,
    pub group_es_y_mm: f64,
    pub mean_radius_mm: f64,
    pub poi_x_mm: f64,
    pub poi_y_mm: f64,
    pub avg_velocity_fps: f64,
    pub sd_fps: f64,
    pub es_fps: f64,
    pub chrono_csv: String,
    pub target_photo: String,
    pub notes: String,
}

impl FlatRow {
    /// Flatten `record`, keyed by `test_id` (the storage key, which wins over
    /// whatever the record itself carries).
    pub fn from_record(test_id: &str, record: &TestRecord) -> Self {
        let platform = &record.platform;
        let ammo = &record.ammo;
        let env = &record.environment;
        let group = &record.group;
        Self {
            test_id: test_id.to_string(),
            date: record.date.clone(),
            distance_m: record.distance_m,
            calibre: platform.calibre.clone(),
            rifle: platform.rifle.clone(),
            barrel_length_in: platform.barrel_length_in,
            twist_rate: platform.twist_rate.clone(),
            case_brand: ammo.case.brand.clone(),
            case_lot: ammo.case.lot.clone(),
            neck_turned: ammo.case.neck_turned.as_str().to_string(),
            brass_sizing: ammo.case.brass_sizing.clone(),
            bushing_size: ammo.case.bushing_size,
            shoulder_bump: ammo.case.shoulder_bump,
            bullet_brand: ammo.bullet.brand.clone(),
            bullet_model: ammo.bullet.model.clone(),
            bullet_weight_gr: ammo.bullet.weight_gr,
            bullet_lot: ammo.bullet.lot.clone(),
            powder_brand: ammo.powder.brand.clone(),
            powder_model: ammo.powder.model.clone(),
            powder_charge_gr: ammo.powder.charge_gr,
            powder_lot: ammo.powder.lot.clone(),
            primer_brand: ammo.primer.brand.clone(),
            primer_model: ammo.primer.model.clone(),
            primer_lot: ammo.primer.lot.clone(),
            coal_in: ammo.coal_in,
            b2o_in: ammo.b2o_in,
            temperature_c: env.temperature_c,
            humidity_percent: env.humidity_percent,
            pressure_hpa: env.pressure_hpa,
            wind_speed_mps: env.wind_speed_mps,
            wind_dir_deg: env.wind_dir_deg,
            weather: env.weather.as_str().to_string(),
            shots: group.shots,
            group_es_mm: group.group_es_mm,
            group_es_moa: group.group_es_moa,
            group_es_x_mm: group.group_es_x_mm,
            group_es_y_mm: group.group_es_y_mm,
            mean_radius_mm: group.mean_radius_mm,
            poi_x_mm: group.poi_x_mm,
            poi_y_mm: group.poi_y_mm,
            avg_velocity_fps: record.chrono.avg_velocity_fps,
            sd_fps: record.chrono.sd_fps,
            es_fps: record.chrono.es_fps,
            chrono_csv: record.files.chrono_csv.clone(),
            target_photo: record.files.target_photo.clone(),
            notes: record.notes.clone(),
        }
    }

    /// Column name to value, in [`FLAT_COLUMNS`] order.
    pub fn to_map(&self) -> IndexMap<&'static str, FlatValue> {
        use FlatValue::{Float, Integer, Text};

        let values = [
            Text(self.test_id.clone()),
            Text(self.date.clone()),
            Integer(i64::from(self.distance_m)),
            Text(self.calibre.clone()),
            Text(self.rifle.clone()),
            Float(self.barrel_length_in),
            Text(self.twist_rate.clone()),
            Text(self.case_brand.clone()),
            Text(self.case_lot.clone()),
            Text(self.neck_turned.clone()),
            Text(self.brass_sizing.clone()),
            Float(self.bushing_size),
            Float(self.shoulder_bump),
            Text(self.bullet_brand.clone()),
            Text(self.bullet_model.clone()),
            Float(self.bullet_weight_gr),
            Text(self.bullet_lot.clone()),
            Text(self.powder_brand.clone()),
            Text(self.powder_model.clone()),
            Float(self.powder_charge_gr),
            Text(self.powder_lot.clone()),
            Text(self.primer_brand.clone()),
            Text(self.primer_model.clone()),
            Text(self.primer_lot.clone()),
            Float(self.coal_in),
            Float(self.b2o_in),
            Float(self.temperature_c),
            Integer(i64::from(self.humidity_percent)),
            Integer(i64::from(self.pressure_hpa)),
            Float(self.wind_speed_mps),
            Integer(i64::from(self.wind_dir_deg)),
            Text(self.weather.clone()),
            Integer(i64::from(self.shots)),
            Float(self.group_es_mm),
            Float(self.group_es_moa),
            Float(self.group_es_x_mm),
            Float(self.group_es_y_mm),
            Float(self.mean_radius_mm),
            Float(self.poi_x_mm),
            Float(self.poi_y_mm),
            Float(self.avg_velocity_fps),
            Float(self.sd_fps),
            Float(self.es_fps),
            Text(self.chrono_csv.clone()),
            Text(self.target_photo.clone()),
            Text(self.notes.clone()),
        ];
        FLAT_COLUMNS.iter().copied().zip(values).collect()
    }
}

/// Rows as a JSON array of objects, for the dataframe layer.
pub fn rows_to_json(rows: &[FlatRow]) -> LoadbookResult<String> {
    Ok(serde_json::to_string(rows)?)
}

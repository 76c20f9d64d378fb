//! Row filtering and ordering for the analysis view.
//!
//! Every criterion is optional and an unset criterion matches every row.
//! Ranges are inclusive at both ends. Dates compare as ISO strings, which
//! orders correctly for `YYYY-MM-DD`.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use crate::analysis::flatten::FlatRow;
use crate::models::Weather;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowFilter {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub distance_m: Option<RangeInclusive<u32>>,
    pub temperature_c: Option<RangeInclusive<f64>>,
    pub wind_speed_mps: Option<RangeInclusive<f64>>,
    pub group_es_mm: Option<RangeInclusive<f64>>,
    pub avg_velocity_fps: Option<RangeInclusive<f64>>,

    pub calibre: Option<String>,
    pub rifle: Option<String>,
    pub twist_rate: Option<String>,
    pub case_brand: Option<String>,
    pub bullet_brand: Option<String>,
    pub bullet_model: Option<String>,
    pub bullet_weight_gr: Option<f64>,
    pub powder_brand: Option<String>,
    pub powder_model: Option<String>,
    pub primer_brand: Option<String>,
    pub primer_model: Option<String>,
    pub weather: Option<Weather>,
}

fn in_range<T: PartialOrd>(range: &Option<RangeInclusive<T>>, value: &T) -> bool {
    range.as_ref().map_or(true, |r| r.contains(value))
}

fn equals(selected: &Option<String>, value: &str) -> bool {
    selected.as_deref().map_or(true, |s| s == value)
}

impl RowFilter {
    /// Whether `row` satisfies every set criterion.
    pub fn matches(&self, row: &FlatRow) -> bool {
        if let Some(from) = &self.date_from {
            if row.date.as_str() < from.as_str() {
                return false;
            }
        }
        if let Some(to) = &self.date_to {
            if row.date.as_str() > to.as_str() {
                return false;
            }
        }

        in_range(&self.distance_m, &row.distance_m)
            && in_range(&self.temperature_c, &row.temperature_c)
            && in_range(&self.wind_speed_mps, &row.wind_speed_mps)
            && in_range(&self.group_es_mm, &row.group_es_mm)
            && in_range(&self.avg_velocity_fps, &row.avg_velocity_fps)
            && equals(&self.calibre, &row.calibre)
            && equals(&self.rifle, &row.rifle)
            && equals(&self.twist_rate, &row.twist_rate)
            && equals(&self.case_brand, &row.case_brand)
            && equals(&self.bullet_brand, &row.bullet_brand)
            && equals(&self.bullet_model, &row.bullet_model)
            && self
                .bullet_weight_gr
                .map_or(true, |w| w == row.bullet_weight_gr)
            && equals(&self.powder_brand, &row.powder_brand)
            && equals(&self.powder_model, &row.powder_model)
            && equals(&self.primer_brand, &row.primer_brand)
            && equals(&self.primer_model, &row.primer_model)
            && self.weather.map_or(true, |w| w.as_str() == row.weather)
    }

    /// Rows that match, in input order.
    pub fn apply<'a>(&self, rows: &'a [FlatRow]) -> Vec<&'a FlatRow> {
        rows.iter().filter(|row| self.matches(row)).collect()
    }
}

/// Stable sort by `date`, oldest first.
pub fn sort_by_date(rows: &mut [FlatRow]) {
    rows.sort_by(|a, b| a.date.cmp(&b.date));
}

/// Sorted distinct values of a text column, for populating selection lists.
/// Returns `None` for unknown or non-text columns.
pub fn distinct_text(rows: &[FlatRow], column: &str) -> Option<Vec<String>> {
    let pick: fn(&FlatRow) -> &str = match column {
        "calibre" => |r| r.calibre.as_str(),
        "rifle" => |r| r.rifle.as_str(),
        "twist_rate" => |r| r.twist_rate.as_str(),
        "case_brand" => |r| r.case_brand.as_str(),
        "bullet_brand" => |r| r.bullet_brand.as_str(),
        "bullet_model" => |r| r.bullet_model.as_str(),
        "powder_brand" => |r| r.powder_brand.as_str(),
        "powder_model" => |r| r.powder_model.as_str(),
        "primer_brand" => |r| r.primer_brand.as_str(),
        "primer_model" => |r| r.primer_model.as_str(),
        "weather" => |r| r.weather.as_str(),
        _ => return None,
    };
    let values: BTreeSet<&str> = rows.iter().map(pick).collect();
    Some(values.into_iter().map(str::to_string).collect())
}

/// Inclusive `(min, max)` of a numeric column over `rows`, skipping NaN.
/// `None` when there are no rows or the column is not numeric.
pub fn numeric_bounds(rows: &[FlatRow], column: &str) -> Option<(f64, f64)> {
    let pick: fn(&FlatRow) -> f64 = match column {
        "distance_m" => |r| f64::from(r.distance_m),
        "temperature_c" => |r| r.temperature_c,
        "wind_speed_mps" => |r| r.wind_speed_mps,
        "group_es_mm" => |r| r.group_es_mm,
        "avg_velocity_fps" => |r| r.avg_velocity_fps,
        "bullet_weight_gr" => |r| r.bullet_weight_gr,
        _ => return None,
    };
    rows.iter()
        .map(pick)
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        })
}

//! Component lists: the controlled vocabularies behind the entry form's
//! dropdowns, kept in a single YAML file mapping category to values.
//!
//! Lists are advisory. The identifier codec and the record store accept any
//! value; [`ComponentLists::unknown_components`] only reports what is not
//! listed.

use std::path::Path;

use indexmap::IndexMap;
use serde_yaml::Value;
use tracing::{info, warn};

use crate::errors::{LoadbookError, LoadbookResult};
use crate::models::TestRecord;
use crate::store::numbers::NumberFormat;

/// Categories understood by the admin tool, in display order.
pub const CATEGORIES: &[&str] = &[
    "calibre",
    "rifle",
    "case_brand",
    "powder_brand",
    "powder_model",
    "bullet_brand",
    "bullet_model",
    "primer_brand",
    "primer_model",
    "brass_sizing",
];

const STOCK_LISTS: &[(&str, &[&str])] = &[
    ("calibre", &["223", "308", "6.5CM"]),
    ("rifle", &["Tikka T3X"]),
    ("case_brand", &["Hornady", "Sako", "Lapua"]),
    ("powder_brand", &["ADI"]),
    ("powder_model", &["2208", "2206H"]),
    ("bullet_brand", &["Hornady", "Berger"]),
    ("bullet_model", &["ELD-M"]),
    ("primer_brand", &["CCI", "RWS"]),
    ("primer_model", &["BR-4", "4033"]),
    ("brass_sizing", &["Full Length", "Neck Only", "Body Only"]),
];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComponentLists {
    lists: IndexMap<String, Vec<String>>,
}

impl ComponentLists {
    /// The lists written when no file exists yet.
    pub fn stock() -> Self {
        let lists = STOCK_LISTS
            .iter()
            .map(|(category, values)| {
                (
                    category.to_string(),
                    values.iter().map(|v| v.to_string()).collect(),
                )
            })
            .collect();
        Self { lists }
    }

    /// Read the lists at `path`; `Ok(None)` if the file does not exist.
    pub fn load(path: &Path) -> LoadbookResult<Option<Self>> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Self::from_yaml_str(&content, path).map(Some)
    }

    /// Read the lists at `path`, writing and returning the stock lists if the
    /// file does not exist.
    pub fn load_or_init(path: &Path) -> LoadbookResult<Self> {
        if let Some(lists) = Self::load(path)? {
            return Ok(lists);
        }
        let stock = Self::stock();
        stock.save(path)?;
        info!("Created component lists at {}", path.display());
        Ok(stock)
    }

    pub fn save(&self, path: &Path) -> LoadbookResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let yaml = NumberFormat::default().to_yaml_string(&self.lists)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse list YAML. Scalars are kept as their text (`308` and `'308'`
    /// are the same entry); a category whose value is not a list reads as
    /// empty.
    fn from_yaml_str(content: &str, path: &Path) -> LoadbookResult<Self> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| LoadbookError::Malformed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let mapping = match value {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(m) => m,
            _ => {
                return Err(LoadbookError::Malformed {
                    path: path.to_path_buf(),
                    message: "expected a mapping of category to values".to_string(),
                })
            }
        };

        let mut lists = IndexMap::new();
        for (key, values) in mapping {
            let Some(category) = scalar_text(&key) else {
                warn!("Ignoring non-scalar component category in {}", path.display());
                continue;
            };
            let entries = match values {
                Value::Sequence(items) => items.iter().filter_map(scalar_text).collect(),
                Value::Null => Vec::new(),
                _ => {
                    warn!("Component category {category} is not a list; treating as empty");
                    Vec::new()
                }
            };
            lists.insert(category, entries);
        }
        Ok(Self { lists })
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.lists.keys().map(String::as_str)
    }

    /// Values for `category` in stored order; empty if the category is absent.
    pub fn values(&self, category: &str) -> &[String] {
        self.lists.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, category: &str, value: &str) -> bool {
        self.values(category).iter().any(|v| v == value)
    }

    /// Append `value` to `category`. Returns false if it was already listed
    /// or is blank.
    pub fn add(&mut self, category: &str, value: &str) -> bool {
        if value.trim().is_empty() || self.contains(category, value) {
            return false;
        }
        self.lists
            .entry(category.to_string())
            .or_default()
            .push(value.to_string());
        true
    }

    /// Replace `old` with `new` in place. Returns false if `old` is not
    /// listed, `new` is blank, or `new` is already present.
    pub fn rename(&mut self, category: &str, old: &str, new: &str) -> bool {
        if new.trim().is_empty() || old == new || self.contains(category, new) {
            return false;
        }
        let Some(values) = self.lists.get_mut(category) else {
            return false;
        };
        match values.iter_mut().find(|v| v.as_str() == old) {
            Some(slot) => {
                *slot = new.to_string();
                true
            }
            None => false,
        }
    }

    /// Remove `value` from `category`. Returns false if it was not listed.
    pub fn remove(&mut self, category: &str, value: &str) -> bool {
        let Some(values) = self.lists.get_mut(category) else {
            return false;
        };
        let before = values.len();
        values.retain(|v| v != value);
        values.len() != before
    }

    /// First brass-sizing option, used to preset new records.
    pub fn default_brass_sizing(&self) -> Option<&str> {
        self.values("brass_sizing").first().map(String::as_str)
    }

    /// Non-empty record values missing from their category's list, as
    /// `(category, value)` pairs in category order.
    pub fn unknown_components(&self, record: &TestRecord) -> Vec<(&'static str, String)> {
        let ammo = &record.ammo;
        let checks: [(&'static str, &str); 10] = [
            ("calibre", &record.platform.calibre),
            ("rifle", &record.platform.rifle),
            ("case_brand", &ammo.case.brand),
            ("powder_brand", &ammo.powder.brand),
            ("powder_model", &ammo.powder.model),
            ("bullet_brand", &ammo.bullet.brand),
            ("bullet_model", &ammo.bullet.model),
            ("primer_brand", &ammo.primer.brand),
            ("primer_model", &ammo.primer.model),
            ("brass_sizing", &ammo.case.brass_sizing),
        ];
        checks
            .into_iter()
            .filter(|(category, value)| !value.is_empty() && !self.contains(category, value))
            .map(|(category, value)| (category, value.to_string()))
            .collect()
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_stock_lists_cover_every_category() {
        let stock = ComponentLists::stock();
        let categories: Vec<&str> = stock.categories().collect();
        assert_eq!(categories, CATEGORIES);
        assert_eq!(stock.default_brass_sizing(), Some("Full Length"));
        assert!(stock.contains("calibre", "308"));
    }

    #[test]
    fn test_load_or_init_writes_stock_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Component_List.yaml");
        let lists = ComponentLists::load_or_init(&path).unwrap();
        assert!(path.exists());
        assert_eq!(lists, ComponentLists::stock());

        let reread = ComponentLists::load(&path).unwrap().unwrap();
        assert_eq!(reread, lists);
    }

    #[test]
    fn test_load_missing_is_none() {
        let tmp = TempDir::new().unwrap();
        assert!(ComponentLists::load(&tmp.path().join("absent.yaml"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_load_tolerates_loose_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("lists.yaml");
        std::fs::write(
            &path,
            "calibre:\n- 223\n- '308'\n- 6.5CM\nrifle:\nprimer_brand: CCI\n",
        )
        .unwrap();
        let lists = ComponentLists::load(&path).unwrap().unwrap();
        assert_eq!(lists.values("calibre"), ["223", "308", "6.5CM"]);
        assert!(lists.values("rifle").is_empty());
        assert!(lists.values("primer_brand").is_empty());
        assert!(lists.values("unknown").is_empty());
    }

    #[test]
    fn test_load_rejects_non_mapping() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("lists.yaml");
        std::fs::write(&path, "- just\n- a list\n").unwrap();
        assert!(matches!(
            ComponentLists::load(&path),
            Err(LoadbookError::Malformed { .. })
        ));
    }

    #[test]
    fn test_add_rename_remove() {
        let mut lists = ComponentLists::stock();
        assert!(lists.add("rifle", "Sako TRG"));
        assert!(!lists.add("rifle", "Sako TRG"));
        assert!(!lists.add("rifle", "  "));
        assert!(lists.add("chamber", "SAAMI"));
        assert_eq!(lists.values("chamber"), ["SAAMI"]);

        assert!(lists.rename("rifle", "Sako TRG", "Sako TRG 22"));
        assert!(!lists.rename("rifle", "missing", "x"));
        assert!(!lists.rename("rifle", "Tikka T3X", "Sako TRG 22"));
        assert_eq!(lists.values("rifle"), ["Tikka T3X", "Sako TRG 22"]);

        assert!(lists.remove("rifle", "Tikka T3X"));
        assert!(!lists.remove("rifle", "Tikka T3X"));
        assert!(!lists.remove("nope", "x"));
        assert_eq!(lists.values("rifle"), ["Sako TRG 22"]);
    }

    #[test]
    fn test_save_preserves_order_and_string_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("lists.yaml");
        let mut lists = ComponentLists::default();
        lists.add("calibre", "308");
        lists.add("calibre", "223");
        lists.save(&path).unwrap();
        let reread = ComponentLists::load(&path).unwrap().unwrap();
        assert_eq!(reread.values("calibre"), ["308", "223"]);

        let yaml = std::fs::read_to_string(&path).unwrap();
        assert!(yaml.contains("- '308'\n"), "{yaml}");
    }

    #[test]
    fn test_unknown_components() {
        let lists = ComponentLists::stock();
        let mut record = TestRecord::empty();
        record.platform.calibre = "308".to_string();
        record.platform.rifle = "Custom Rem 700".to_string();
        record.ammo.bullet.brand = "Berger".to_string();
        record.ammo.case.brass_sizing = "Full Length".to_string();
        record.ammo.primer.model = "205M".to_string();

        let unknown = lists.unknown_components(&record);
        assert_eq!(
            unknown,
            vec![
                ("rifle", "Custom Rem 700".to_string()),
                ("primer_model", "205M".to_string()),
            ]
        );
    }
}

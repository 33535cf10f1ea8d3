use serde::{Deserialize, Serialize};

/// One country's medal haul as delivered by the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalRecord {
    pub code: String,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub gold: u32,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub silver: u32,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub bronze: u32,
}

impl MedalRecord {
    pub fn new(code: impl Into<String>, gold: u32, silver: u32, bronze: u32) -> Self {
        Self {
            code: code.into(),
            gold,
            silver,
            bronze,
        }
    }

    /// `None` when the three counts do not fit in a `u32`.
    pub fn checked_total(&self) -> Option<u32> {
        self.gold.checked_add(self.silver)?.checked_add(self.bronze)
    }

    /// Saturates at `u32::MAX`.
    pub fn total(&self) -> u32 {
        self.gold
            .saturating_add(self.silver)
            .saturating_add(self.bronze)
    }

    pub fn count(&self, kind: MedalKind) -> u32 {
        match kind {
            MedalKind::Gold => self.gold,
            MedalKind::Silver => self.silver,
            MedalKind::Bronze => self.bronze,
        }
    }
}

/// A record placed in the Olympic standings.
///
/// `rank` comes from the Olympic ordering and stays fixed no matter how the
/// rows are later re-sorted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedMedalRecord {
    pub code: String,
    pub gold: u32,
    pub silver: u32,
    pub bronze: u32,
    pub total: u32,
    pub rank: usize,
}

impl RankedMedalRecord {
    pub fn count(&self, kind: MedalKind) -> u32 {
        match kind {
            MedalKind::Gold => self.gold,
            MedalKind::Silver => self.silver,
            MedalKind::Bronze => self.bronze,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MedalTotals {
    pub gold: u32,
    pub silver: u32,
    pub bronze: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MedalKind {
    Gold,
    Silver,
    Bronze,
}

impl MedalKind {
    /// Olympic tie-break cascade.
    pub const CASCADE: [MedalKind; 3] = [MedalKind::Gold, MedalKind::Silver, MedalKind::Bronze];

    pub fn label(self) -> &'static str {
        match self {
            MedalKind::Gold => "Gold",
            MedalKind::Silver => "Silver",
            MedalKind::Bronze => "Bronze",
        }
    }
}

// Missing or null counts read as zero and numeric strings are accepted.
// Anything else (negative, fractional, text) rejects the record.
fn count_or_zero<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(0),
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| D::Error::custom(format!("invalid medal count {n}"))),
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(0);
            }
            trimmed
                .parse::<u32>()
                .map_err(|_| D::Error::custom(format!("invalid medal count \"{s}\"")))
        }
        other => Err(D::Error::custom(format!("invalid medal count {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::MedalRecord;

    #[test]
    fn missing_and_null_counts_read_as_zero() {
        let rec: MedalRecord =
            serde_json::from_str(r#"{"code":"NOR","gold":3,"silver":null}"#).unwrap();
        assert_eq!(rec, MedalRecord::new("NOR", 3, 0, 0));
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let rec: MedalRecord =
            serde_json::from_str(r#"{"code":"ITA","gold":"2","silver":" 1 ","bronze":""}"#)
                .unwrap();
        assert_eq!(rec, MedalRecord::new("ITA", 2, 1, 0));
    }

    #[test]
    fn negative_and_fractional_counts_are_rejected() {
        assert!(serde_json::from_str::<MedalRecord>(r#"{"code":"X","gold":-1}"#).is_err());
        assert!(serde_json::from_str::<MedalRecord>(r#"{"code":"X","gold":1.5}"#).is_err());
        assert!(serde_json::from_str::<MedalRecord>(r#"{"code":"X","gold":"many"}"#).is_err());
    }
}

// Imports
use std::str::FromStr;

use indexmap::IndexMap;

pub type Float = f64;

/// Residue identifier to score mapping, iterates in insertion order.
///
/// Re-inserting an existing residue overwrites its score but keeps its first position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreMap(IndexMap<String, Float>);

impl ScoreMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous score if the residue was already present
    pub fn insert<S: Into<String>>(
        &mut self,
        residue: S,
        score: Float,
    ) -> Option<Float> {
        self.0.insert(residue.into(), score)
    }

    pub fn get(
        &self,
        residue: &str,
    ) -> Option<Float> {
        self.0.get(residue).copied()
    }

    pub fn contains_key(
        &self,
        residue: &str,
    ) -> bool {
        self.0.contains_key(residue)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Float)> + '_ {
        self.0.iter().map(|(residue, score)| (residue.as_str(), *score))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = Float> + '_ {
        self.0.values().copied()
    }

    /// Scores in insertion order, this is the order the clustering stage works with
    pub fn to_values(&self) -> Vec<Float> {
        self.values().collect()
    }
}

impl<S: Into<String>> FromIterator<(S, Float)> for ScoreMap {
    fn from_iter<I: IntoIterator<Item = (S, Float)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(residue, score)| (residue.into(), score)).collect())
    }
}

impl<S: Into<String>> Extend<(S, Float)> for ScoreMap {
    fn extend<I: IntoIterator<Item = (S, Float)>>(
        &mut self,
        iter: I,
    ) {
        self.0.extend(iter.into_iter().map(|(residue, score)| (residue.into(), score)));
    }
}

impl IntoIterator for ScoreMap {
    type IntoIter = indexmap::map::IntoIter<String, Float>;
    type Item = (String, Float);

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A score cell as found in the input, `NA` marks a residue without a score
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Datum {
    Score(Float),
    Missing,
}

impl Datum {
    pub const MISSING_SENTINEL: &str = "NA";
}

impl FromStr for Datum {
    type Err = std::num::ParseFloatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::MISSING_SENTINEL {
            return Ok(Self::Missing);
        }
        s.trim().parse::<Float>().map(Self::Score)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::assert_float_eq;

    #[test]
    fn insertion_order_test() {
        let map: ScoreMap = [("12", 0.3), ("3", -1.0), ("7", 2.5)].into_iter().collect();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["12", "3", "7"]);
        assert_eq!(map.to_values(), vec![0.3, -1.0, 2.5]);
    }

    #[test]
    fn reinsert_keeps_position_test() {
        let mut map: ScoreMap = [("1", 0.0), ("2", 1.0), ("3", 2.0)].into_iter().collect();
        assert_eq!(map.insert("1", 5.0), Some(0.0));
        assert_eq!(map.len(), 3);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["1", "2", "3"]);
        assert_float_eq!(map.get("1").unwrap(), 5.0);
        assert!(map.get("4").is_none());
    }

    #[test]
    fn duplicate_residue_test() {
        let map: ScoreMap = [("5", 1.0), ("6", 2.0), ("5", 3.0)].into_iter().collect();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["5", "6"]);
        assert_eq!(map.to_values(), vec![3.0, 2.0]);
    }

    #[test]
    fn datum_parse_test() {
        assert_eq!("NA".parse::<Datum>().unwrap(), Datum::Missing);
        assert_eq!(" 0.5".parse::<Datum>().unwrap(), Datum::Score(0.5));
        assert_eq!("-3".parse::<Datum>().unwrap(), Datum::Score(-3.0));
        assert!("na".parse::<Datum>().is_err());
        assert!("abc".parse::<Datum>().is_err());
    }
}

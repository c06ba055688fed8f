use std::collections::BTreeMap;

use crate::record::Record;

/// Collects records per publication year while the listing is processed.
#[derive(Debug, Default)]
pub struct YearAggregator {
    buckets: BTreeMap<u16, Vec<Record>>,
}

/// Records of one year, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearGroup {
    pub year: u16,
    pub records: Vec<Record>,
}

/// Frozen aggregation: years descending, records newest-first within a year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    pub years: Vec<YearGroup>,
}

impl YearAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: Record) {
        self.buckets.entry(record.year).or_default().push(record);
    }

    /// The listing arrives oldest-first, so each bucket is reversed here.
    pub fn finalize(self) -> Aggregation {
        let years = self
            .buckets
            .into_iter()
            .rev()
            .map(|(year, mut records)| {
                records.reverse();
                YearGroup { year, records }
            })
            .collect();
        Aggregation { years }
    }
}

impl Aggregation {
    pub fn total(&self) -> usize {
        self.years.iter().map(|g| g.records.len()).sum()
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.years.iter().flat_map(|g| g.records.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Links;

    fn rec(index: usize, year: u16) -> Record {
        Record {
            index,
            title: format!("Paper {}", index),
            authors: "Doe A".into(),
            venue: "Nature".into(),
            year,
            issue: "1:1".into(),
            links: Links::default(),
        }
    }

    fn shape(agg: &Aggregation) -> Vec<(u16, Vec<usize>)> {
        agg.years
            .iter()
            .map(|g| (g.year, g.records.iter().map(|r| r.index).collect()))
            .collect()
    }

    #[test]
    fn groups_by_year_newest_first() {
        let mut agg = YearAggregator::new();
        agg.add(rec(1, 2020));
        agg.add(rec(2, 2019));
        agg.add(rec(3, 2020));
        let out = agg.finalize();
        assert_eq!(shape(&out), vec![(2020, vec![3, 1]), (2019, vec![2])]);
        assert_eq!(out.total(), 3);
    }

    #[test]
    fn years_strictly_descending() {
        let mut agg = YearAggregator::new();
        for (i, y) in [1999, 2021, 2005, 2021, 2010, 1999].into_iter().enumerate() {
            agg.add(rec(i + 1, y));
        }
        let out = agg.finalize();
        let years: Vec<u16> = out.years.iter().map(|g| g.year).collect();
        assert!(years.windows(2).all(|w| w[0] > w[1]), "{:?}", years);
    }

    #[test]
    fn every_record_lands_in_exactly_one_bucket() {
        let mut agg = YearAggregator::new();
        for i in 1..=20 {
            agg.add(rec(i, 2000 + (i % 4) as u16));
        }
        let out = agg.finalize();
        let mut seen: Vec<usize> = out.records().map(|r| r.index).collect();
        seen.sort_unstable();
        assert_eq!(seen, (1..=20).collect::<Vec<_>>());
        assert!(out.records().all(|r| out
            .years
            .iter()
            .filter(|g| g.records.contains(r))
            .count()
            == 1));
    }

    #[test]
    fn empty_aggregation() {
        let out = YearAggregator::new().finalize();
        assert!(out.years.is_empty());
        assert_eq!(out.total(), 0);
    }
}

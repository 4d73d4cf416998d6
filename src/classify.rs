use crate::error::AnalysisError;
use crate::model::{Record, Segment, SegmentAggregate, Thresholds};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RankDirection {
    Top,
    Bottom,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RankKey {
    Efficiency,
    AbsoluteSpend,
}

impl RankKey {
    fn value(self, record: &Record) -> f64 {
        match self {
            Self::Efficiency => record.efficiency(),
            Self::AbsoluteSpend => record.absolute_spend,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<Record>,
    thresholds: Thresholds,
}

#[derive(Debug, Clone, Copy)]
pub struct ClassifiedRow<'a> {
    pub record: &'a Record,
    pub segment: Segment,
    pub efficiency: f64,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Result<Self, AnalysisError> {
        let thresholds = compute_thresholds(&records).ok_or(AnalysisError::EmptyDataset {
            rows_total: 0,
            rows_dropped: 0,
        })?;
        Ok(Self {
            records,
            thresholds,
        })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn segment_of(&self, record: &Record) -> Segment {
        classify(
            record.ad_spend_share,
            record.revenue_share,
            self.thresholds.median_ad_spend_share,
            self.thresholds.median_revenue_share,
        )
    }

    pub fn rows(&self) -> impl Iterator<Item = ClassifiedRow<'_>> + '_ {
        self.records.iter().map(|record| ClassifiedRow {
            record,
            segment: self.segment_of(record),
            efficiency: record.efficiency(),
        })
    }

    pub fn in_segment(&self, segment: Segment) -> impl Iterator<Item = &Record> + '_ {
        self.records
            .iter()
            .filter(move |record| self.segment_of(record) == segment)
    }

    pub fn segment_count(&self, segment: Segment) -> usize {
        self.in_segment(segment).count()
    }

    pub fn segment_total_spend(&self, segment: Segment) -> f64 {
        self.in_segment(segment)
            .map(|record| record.absolute_spend)
            .sum()
    }

    pub fn segment_total_ad_share(&self, segment: Segment) -> f64 {
        self.in_segment(segment)
            .map(|record| record.ad_spend_share)
            .sum()
    }

    pub fn segment_total_revenue_share(&self, segment: Segment) -> f64 {
        self.in_segment(segment)
            .map(|record| record.revenue_share)
            .sum()
    }

    pub fn segment_mean_poas(&self, segment: Segment) -> Option<f64> {
        mean(self.in_segment(segment).map(|record| record.poas))
    }

    pub fn aggregate(&self, segment: Segment) -> SegmentAggregate {
        SegmentAggregate {
            count: self.segment_count(segment),
            total_spend: self.segment_total_spend(segment),
            total_ad_share: self.segment_total_ad_share(segment),
            total_revenue_share: self.segment_total_revenue_share(segment),
            mean_poas: self.segment_mean_poas(segment),
        }
    }

    pub fn total_spend(&self) -> f64 {
        self.records.iter().map(|record| record.absolute_spend).sum()
    }

    pub fn mean_poas(&self) -> Option<f64> {
        mean(self.records.iter().map(|record| record.poas))
    }

    pub fn rank(&self, key: RankKey, n: usize, direction: RankDirection) -> Vec<&Record> {
        rank(self.records.iter(), key, n, direction)
    }
}

pub fn compute_thresholds(records: &[Record]) -> Option<Thresholds> {
    let median_ad_spend_share = median(records.iter().map(|record| record.ad_spend_share))?;
    let median_revenue_share = median(records.iter().map(|record| record.revenue_share))?;
    Some(Thresholds {
        median_ad_spend_share,
        median_revenue_share,
    })
}

pub fn classify(ad_spend_share: f64, revenue_share: f64, median_x: f64, median_y: f64) -> Segment {
    let high_spend = ad_spend_share >= median_x;
    let high_revenue = revenue_share >= median_y;

    match (high_spend, high_revenue) {
        (true, true) => Segment::CashCows,
        (false, true) => Segment::Stars,
        (false, false) => Segment::TestAndLearn,
        (true, false) => Segment::UrgentAction,
    }
}

/// Up to `n` records ordered by `key`; ties keep input order. Records with a
/// non-finite efficiency are left out. Spend is never filtered.
pub fn rank<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    key: RankKey,
    n: usize,
    direction: RankDirection,
) -> Vec<&'a Record> {
    let mut keyed: Vec<(f64, &Record)> = records
        .into_iter()
        .map(|record| (key.value(record), record))
        .filter(|(value, _)| key != RankKey::Efficiency || value.is_finite())
        .collect();

    match direction {
        RankDirection::Top => keyed.sort_by(|a, b| b.0.total_cmp(&a.0)),
        RankDirection::Bottom => keyed.sort_by(|a, b| a.0.total_cmp(&b.0)),
    }

    keyed.into_iter().take(n).map(|(_, record)| record).collect()
}

fn median(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut values: Vec<f64> = values.collect();
    if values.is_empty() {
        return None;
    }

    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0_usize), |(sum, count), value| {
        (sum + value, count + 1)
    });
    (count > 0).then(|| sum / count as f64)
}

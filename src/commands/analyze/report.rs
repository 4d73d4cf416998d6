use std::path::Path;

use crate::classify::{RankDirection, RankKey, rank};
use crate::model::{
    AnalysisReport, OverviewMetrics, RankedBrand, RowCounts, Segment, SegmentBrand, SegmentSummary,
};
use crate::table::PreparedAnalysis;

pub(super) fn build_report(
    analysis: &PreparedAnalysis,
    input_path: &Path,
    currency_symbol: &str,
    top_n: usize,
) -> AnalysisReport {
    let dataset = &analysis.dataset;

    AnalysisReport {
        input_path: input_path.display().to_string(),
        columns: analysis.mapping.clone(),
        currency_symbol: currency_symbol.to_string(),
        counts: row_counts(analysis),
        thresholds: dataset.thresholds(),
        overview: OverviewMetrics {
            total_brands: dataset.len(),
            total_spend: dataset.total_spend(),
            mean_poas: dataset.mean_poas(),
        },
        segments: Segment::DISPLAY_ORDER
            .into_iter()
            .map(|segment| segment_summary(analysis, segment))
            .collect(),
        top_efficient: ranked(analysis, top_n, RankDirection::Top),
        bottom_efficient: ranked(analysis, top_n, RankDirection::Bottom),
    }
}

pub(super) fn row_counts(analysis: &PreparedAnalysis) -> RowCounts {
    RowCounts {
        rows_total: analysis.rows_total,
        rows_kept: analysis.dataset.len(),
        rows_dropped: analysis.rows_dropped(),
    }
}

fn segment_summary(analysis: &PreparedAnalysis, segment: Segment) -> SegmentSummary {
    let dataset = &analysis.dataset;
    let aggregate = dataset.aggregate(segment);

    let members = rank(
        dataset.in_segment(segment),
        RankKey::AbsoluteSpend,
        usize::MAX,
        RankDirection::Top,
    );

    SegmentSummary {
        segment,
        label: segment.label().to_string(),
        description: segment.description().to_string(),
        urgency: segment.urgency().to_string(),
        action: segment.action().to_string(),
        color: segment.color().to_string(),
        share_of_brands_pct: aggregate.count as f64 / dataset.len() as f64 * 100.0,
        aggregate,
        brands: members
            .into_iter()
            .map(|record| SegmentBrand {
                label: record.label.clone(),
                absolute_spend: record.absolute_spend,
                poas: record.poas,
                ad_spend_share: record.ad_spend_share,
                revenue_share: record.revenue_share,
            })
            .collect(),
    }
}

fn ranked(analysis: &PreparedAnalysis, n: usize, direction: RankDirection) -> Vec<RankedBrand> {
    let dataset = &analysis.dataset;
    dataset
        .rank(RankKey::Efficiency, n, direction)
        .into_iter()
        .enumerate()
        .map(|(index, record)| RankedBrand {
            rank: index + 1,
            label: record.label.clone(),
            efficiency: record.efficiency(),
            poas: record.poas,
            segment: dataset.segment_of(record),
        })
        .collect()
}

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ParseWarning;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    Label,
    AdSpendShare,
    RevenueShare,
    AbsoluteSpend,
    Poas,
}

impl FieldRole {
    pub const ALL: [FieldRole; 5] = [
        FieldRole::Label,
        FieldRole::AdSpendShare,
        FieldRole::RevenueShare,
        FieldRole::AbsoluteSpend,
        FieldRole::Poas,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::AdSpendShare => "ad_spend_share",
            Self::RevenueShare => "revenue_share",
            Self::AbsoluteSpend => "absolute_spend",
            Self::Poas => "poas",
        }
    }
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub label: String,
    pub ad_spend_share: String,
    pub revenue_share: String,
    pub absolute_spend: String,
    pub poas: String,
}

impl ColumnMapping {
    pub fn column(&self, role: FieldRole) -> &str {
        match role {
            FieldRole::Label => &self.label,
            FieldRole::AdSpendShare => &self.ad_spend_share,
            FieldRole::RevenueShare => &self.revenue_share,
            FieldRole::AbsoluteSpend => &self.absolute_spend,
            FieldRole::Poas => &self.poas,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub source_row: usize,
    pub label: String,
    pub ad_spend_share: f64,
    pub revenue_share: f64,
    pub absolute_spend: f64,
    pub poas: f64,
}

impl Record {
    /// Revenue share per unit of ad-spend share. Non-finite when the ad share is 0.
    pub fn efficiency(&self) -> f64 {
        self.revenue_share / self.ad_spend_share
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Segment {
    CashCows,
    Stars,
    TestAndLearn,
    UrgentAction,
}

impl Segment {
    pub const DISPLAY_ORDER: [Segment; 4] = [
        Segment::Stars,
        Segment::CashCows,
        Segment::UrgentAction,
        Segment::TestAndLearn,
    ];

    pub fn quadrant(self) -> u8 {
        match self {
            Self::CashCows => 1,
            Self::Stars => 2,
            Self::TestAndLearn => 3,
            Self::UrgentAction => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::CashCows => "Q1: CASH COWS",
            Self::Stars => "Q2: STARS",
            Self::TestAndLearn => "Q3: TEST & LEARN",
            Self::UrgentAction => "Q4: URGENT ACTION",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::CashCows => "High Spend, High Revenue - Core Performers",
            Self::Stars => "Low Spend, High Revenue - Most Efficient",
            Self::TestAndLearn => "Low Spend, Low Revenue - Minor Players",
            Self::UrgentAction => "High Spend, Low Revenue - Underperformers",
        }
    }

    pub fn urgency(self) -> &'static str {
        match self {
            Self::CashCows => "MAINTAIN",
            Self::Stars => "SCALE UP",
            Self::TestAndLearn => "MONITOR",
            Self::UrgentAction => "OPTIMIZE/CUT",
        }
    }

    pub fn action(self) -> &'static str {
        match self {
            Self::CashCows => "Keep investing, these are your backbone brands",
            Self::Stars => "Increase investment immediately - huge opportunity!",
            Self::TestAndLearn => "Keep testing, decide to scale or cut based on trends",
            Self::UrgentAction => "Immediate review needed - optimize or reduce spend",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::CashCows => "#4575b4",
            Self::Stars => "#1a9850",
            Self::TestAndLearn => "#fee08b",
            Self::UrgentAction => "#d73027",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Thresholds {
    pub median_ad_spend_share: f64,
    pub median_revenue_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentAggregate {
    pub count: usize,
    pub total_spend: f64,
    pub total_ad_share: f64,
    pub total_revenue_share: f64,
    pub mean_poas: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewMetrics {
    pub total_brands: usize,
    pub total_spend: f64,
    pub mean_poas: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentBrand {
    pub label: String,
    pub absolute_spend: f64,
    pub poas: f64,
    pub ad_spend_share: f64,
    pub revenue_share: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentSummary {
    pub segment: Segment,
    pub label: String,
    pub description: String,
    pub urgency: String,
    pub action: String,
    pub color: String,
    pub share_of_brands_pct: f64,
    pub aggregate: SegmentAggregate,
    pub brands: Vec<SegmentBrand>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedBrand {
    pub rank: usize,
    pub label: String,
    pub efficiency: f64,
    pub poas: f64,
    pub segment: Segment,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowCounts {
    pub rows_total: usize,
    pub rows_kept: usize,
    pub rows_dropped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub input_path: String,
    pub columns: ColumnMapping,
    pub currency_symbol: String,
    pub counts: RowCounts,
    pub thresholds: Thresholds,
    pub overview: OverviewMetrics,
    pub segments: Vec<SegmentSummary>,
    pub top_efficient: Vec<RankedBrand>,
    pub bottom_efficient: Vec<RankedBrand>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisPaths {
    pub output_dir: String,
    pub records_csv_path: String,
    pub analysis_csv_path: String,
    pub chart_json_path: String,
    pub report_json_path: String,
    pub manifest_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub generated_at: String,
    pub command: String,
    pub input_path: String,
    pub input_sha256: String,
    pub columns: ColumnMapping,
    pub counts: RowCounts,
    pub thresholds: Thresholds,
    pub paths: AnalysisPaths,
    pub warnings: Vec<ParseWarning>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableInspection {
    pub input_path: String,
    pub input_sha256: String,
    pub row_count: usize,
    pub headers: Vec<String>,
    pub suggested_columns: ColumnMapping,
    pub currency_symbol: String,
}

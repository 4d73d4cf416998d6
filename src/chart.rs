use serde::Serialize;

use crate::classify::Dataset;
use crate::model::{ColumnMapping, Segment};

const FIG_WIDTH: u32 = 1800;
const FIG_HEIGHT: u32 = 1400;
const MAX_BUBBLE_PX: f64 = 100.0;
const MIN_BUBBLE_PX: f64 = 4.0;
const POAS_COLOR_MIN: f64 = 1.0;
const POAS_COLOR_MAX: f64 = 3.0;
const COLOR_STOPS: [(f64, &str); 4] = [
    (0.0, "#d73027"),
    (0.1, "#ffd34d"),
    (0.5, "#fff176"),
    (1.0, "#1a9850"),
];

#[derive(Debug, Clone, Serialize)]
pub struct ColorStop {
    pub position: f64,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BubblePoint {
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub color: f64,
    pub poas: f64,
    pub segment: Segment,
    pub hover: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BubbleChart {
    pub title: String,
    pub subtitle: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
    pub width: u32,
    pub height: u32,
    pub size_mode: String,
    pub size_ref: f64,
    pub size_min: f64,
    pub color_min: f64,
    pub color_max: f64,
    pub color_scale: Vec<ColorStop>,
    pub median_x: f64,
    pub median_y: f64,
    pub points: Vec<BubblePoint>,
}

pub fn bubble_chart(
    dataset: &Dataset,
    mapping: &ColumnMapping,
    currency_symbol: &str,
) -> BubbleChart {
    let max_spend = dataset
        .records()
        .iter()
        .map(|record| record.absolute_spend)
        .fold(f64::NEG_INFINITY, f64::max);
    let size_ref = if max_spend > 0.0 {
        2.0 * max_spend / (MAX_BUBBLE_PX * MAX_BUBBLE_PX)
    } else {
        1.0
    };

    let points = dataset
        .rows()
        .map(|row| {
            let record = row.record;
            BubblePoint {
                label: record.label.clone(),
                x: record.ad_spend_share,
                y: record.revenue_share,
                size: record.absolute_spend,
                color: record.poas.clamp(POAS_COLOR_MIN, POAS_COLOR_MAX),
                poas: record.poas,
                segment: row.segment,
                hover: format!(
                    "<b>{}</b><br>{}: {:.2}%<br>{}: {:.2}%<br>POAS: {:.2}<br>{}: {}{}",
                    record.label,
                    mapping.ad_spend_share,
                    record.ad_spend_share,
                    mapping.revenue_share,
                    record.revenue_share,
                    record.poas,
                    mapping.absolute_spend,
                    currency_symbol,
                    format_thousands(record.absolute_spend),
                ),
            }
        })
        .collect();

    let thresholds = dataset.thresholds();

    BubbleChart {
        title: "Bubble Chart: % of Ad Spend vs % of Revenue".to_string(),
        subtitle: "(Bubble SIZE = Absolute Ad Spend, COLOR = POAS)".to_string(),
        x_axis_title: "% of Ad Spend".to_string(),
        y_axis_title: "% of Revenue".to_string(),
        width: FIG_WIDTH,
        height: FIG_HEIGHT,
        size_mode: "area".to_string(),
        size_ref,
        size_min: MIN_BUBBLE_PX,
        color_min: POAS_COLOR_MIN,
        color_max: POAS_COLOR_MAX,
        color_scale: COLOR_STOPS
            .iter()
            .map(|(position, color)| ColorStop {
                position: *position,
                color: color.to_string(),
            })
            .collect(),
        median_x: thresholds.median_ad_spend_share,
        median_y: thresholds.median_revenue_share,
        points,
    }
}

pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rounded = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (index, digit) in rounded.chars().enumerate() {
        if index > 0 && (rounded.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if value < 0.0 && rounded != "0" {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;

    fn dataset() -> Dataset {
        let record = |label: &str, x: f64, y: f64, spend: f64, poas: f64| Record {
            source_row: 0,
            label: label.to_string(),
            ad_spend_share: x,
            revenue_share: y,
            absolute_spend: spend,
            poas,
        };
        Dataset::new(vec![
            record("A", 70.0, 80.0, 1000.0, 2.5),
            record("B", 20.0, 60.0, 200.0, 3.5),
            record("C", 10.0, 10.0, 50.0, 0.4),
        ])
        .expect("non-empty")
    }

    fn mapping() -> ColumnMapping {
        ColumnMapping {
            label: "Brand".to_string(),
            ad_spend_share: "% of Adspend".to_string(),
            revenue_share: "% Of Revenue".to_string(),
            absolute_spend: "€ Ads Spend".to_string(),
            poas: "POAS".to_string(),
        }
    }

    #[test]
    fn bubble_chart_scales_sizes_and_clips_colors() {
        let chart = bubble_chart(&dataset(), &mapping(), "€");
        assert_eq!(chart.size_ref, 0.2);
        let colors: Vec<f64> = chart.points.iter().map(|point| point.color).collect();
        assert_eq!(colors, vec![2.5, 3.0, 1.0]);
        assert_eq!(chart.points[1].poas, 3.5);
        assert_eq!(chart.points[0].segment, Segment::CashCows);
    }

    #[test]
    fn bubble_chart_hover_text_lists_all_fields() {
        let chart = bubble_chart(&dataset(), &mapping(), "€");
        assert_eq!(
            chart.points[0].hover,
            "<b>A</b><br>% of Adspend: 70.00%<br>% Of Revenue: 80.00%<br>POAS: 2.50<br>€ Ads Spend: €1,000"
        );
    }

    #[test]
    fn format_thousands_groups_digits() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.4), "999");
        assert_eq!(format_thousands(1234567.6), "1,234,568");
        assert_eq!(format_thousands(-12500.0), "-12,500");
    }
}

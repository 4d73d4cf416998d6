use crate::model::ColumnMapping;

const DEFAULT_LABEL: &str = "Brand";
const DEFAULT_AD_SPEND_SHARE: &str = "% of Adspend";
const DEFAULT_REVENUE_SHARE: &str = "% Of Revenue";
const DEFAULT_POAS: &str = "POAS";
const DEFAULT_ABSOLUTE_SPEND: &str = "€ Ads Spend";

const AD_WORDS: &[&str] = &["ads", "ad ", "advert"];
const SPEND_WORDS: &[&str] = &["spend", "cost", "expense"];

#[derive(Debug, Clone, Default)]
pub struct ColumnOverrides {
    pub label: Option<String>,
    pub ad_spend_share: Option<String>,
    pub revenue_share: Option<String>,
    pub absolute_spend: Option<String>,
    pub poas: Option<String>,
}

pub fn suggest_mapping(headers: &[String], overrides: &ColumnOverrides) -> Option<ColumnMapping> {
    let first = headers.first()?;
    let exact = |name: &str| {
        headers
            .iter()
            .find(|header| header.as_str() == name)
            .unwrap_or(first)
            .clone()
    };

    let absolute_spend = overrides.absolute_spend.clone().unwrap_or_else(|| {
        headers
            .iter()
            .find(|header| header.as_str() == DEFAULT_ABSOLUTE_SPEND)
            .or_else(|| headers.iter().find(|header| looks_like_absolute_spend(header)))
            .unwrap_or(first)
            .clone()
    });

    Some(ColumnMapping {
        label: overrides
            .label
            .clone()
            .unwrap_or_else(|| exact(DEFAULT_LABEL)),
        ad_spend_share: overrides
            .ad_spend_share
            .clone()
            .unwrap_or_else(|| exact(DEFAULT_AD_SPEND_SHARE)),
        revenue_share: overrides
            .revenue_share
            .clone()
            .unwrap_or_else(|| exact(DEFAULT_REVENUE_SHARE)),
        absolute_spend,
        poas: overrides
            .poas
            .clone()
            .unwrap_or_else(|| exact(DEFAULT_POAS)),
    })
}

fn looks_like_absolute_spend(header: &str) -> bool {
    let lower = header.to_lowercase();
    AD_WORDS.iter().any(|word| lower.contains(word))
        && SPEND_WORDS.iter().any(|word| lower.contains(word))
        && !header.contains('%')
        && !lower.contains("percent")
}

pub fn currency_symbol(spend_column: &str) -> &'static str {
    if spend_column.contains('€') || spend_column.to_lowercase().contains("eur") {
        "€"
    } else {
        "$"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn suggest_mapping_prefers_default_names() {
        let headers = headers(&["Brand", "% of Adspend", "% Of Revenue", "POAS", "€ Ads Spend"]);
        let mapping = suggest_mapping(&headers, &ColumnOverrides::default()).expect("headers");
        assert_eq!(mapping.label, "Brand");
        assert_eq!(mapping.ad_spend_share, "% of Adspend");
        assert_eq!(mapping.revenue_share, "% Of Revenue");
        assert_eq!(mapping.poas, "POAS");
        assert_eq!(mapping.absolute_spend, "€ Ads Spend");
    }

    #[test]
    fn suggest_mapping_finds_spend_column_by_keywords() {
        let headers = headers(&["Brand", "% Ads Spend", "Ad spend percent", "Total Ads Cost ($)"]);
        let mapping = suggest_mapping(&headers, &ColumnOverrides::default()).expect("headers");
        assert_eq!(mapping.absolute_spend, "Total Ads Cost ($)");
    }

    #[test]
    fn suggest_mapping_falls_back_to_first_header() {
        let headers = headers(&["Name", "Spend share"]);
        let mapping = suggest_mapping(&headers, &ColumnOverrides::default()).expect("headers");
        assert_eq!(mapping.ad_spend_share, "Name");
        assert_eq!(mapping.absolute_spend, "Name");
        assert!(suggest_mapping(&[], &ColumnOverrides::default()).is_none());
    }

    #[test]
    fn overrides_win_over_guesses() {
        let headers = headers(&["Brand", "POAS"]);
        let overrides = ColumnOverrides {
            poas: Some("Return".to_string()),
            ..ColumnOverrides::default()
        };
        let mapping = suggest_mapping(&headers, &overrides).expect("headers");
        assert_eq!(mapping.poas, "Return");
        assert_eq!(mapping.label, "Brand");
    }

    #[test]
    fn currency_symbol_detects_euro_columns() {
        assert_eq!(currency_symbol("€ Ads Spend"), "€");
        assert_eq!(currency_symbol("Spend (EUR)"), "€");
        assert_eq!(currency_symbol("Ads Spend USD"), "$");
    }
}

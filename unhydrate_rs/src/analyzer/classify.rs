use crate::types::{IndicatorSet, PageClassification};

/// Reduce a page's aggregated indicators to its class.
///
/// Precedence, first match wins:
/// 1. closure flag, or entry handlers/hooks/client directive → `Interactive`
/// 2. entry navigation usage → `RoutingOnly`
/// 3. otherwise → `PureStatic`
pub fn classify(indicators: &IndicatorSet) -> PageClassification {
    if indicators.has_client_components || indicators.has_interactivity() {
        PageClassification::Interactive
    } else if indicators.has_navigation_links {
        PageClassification::RoutingOnly
    } else {
        PageClassification::PureStatic
    }
}

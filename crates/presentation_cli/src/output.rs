//! Terminal rendering of candidates and routes

use domain::{LocationCandidate, Route};
use serde_json::json;

/// Numbered candidate list with headline and full address
pub fn format_candidates(candidates: &[LocationCandidate]) -> String {
    if candidates.is_empty() {
        return "No locations found.".to_string();
    }

    let mut out = String::new();
    for (i, candidate) in candidates.iter().enumerate() {
        out.push_str(&format!("{:>2}. {}\n", i + 1, candidate.short_name()));
        out.push_str(&format!("    {}\n", candidate.display_name));
        out.push_str(&format!("    ({})\n", candidate.coordinate));
    }
    out
}

/// Route summary followed by the step list
pub fn format_route(from: &str, to: &str, route: &Route) -> String {
    let mut out = format!("From: {from}\nTo:   {to}\n\n{}\n", route.format_summary());

    if !route.steps.is_empty() {
        out.push('\n');
        for (i, step) in route.steps.iter().enumerate() {
            out.push_str(&format!(
                "{:>3}. {} ({:.0} m)\n",
                i + 1,
                step.instruction,
                step.distance_meters
            ));
        }
    }
    out
}

/// Route as JSON, with display units alongside the raw values
pub fn route_json(from: &str, to: &str, route: &Route) -> serde_json::Value {
    json!({
        "from": from,
        "to": to,
        "distance_km": route.distance_km(),
        "eta_minutes": route.eta_minutes(),
        "route": route,
    })
}

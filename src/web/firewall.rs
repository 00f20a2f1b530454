use axum::http::{Method, Uri};

/// Prefix under which saved dashboards may be written.
pub const DASHBOARD_PREFIX: &str = "/es/kibana-int/dashboard/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Permit,
    Deny,
}

/// Decide whether a request to the `/es` surface may reach the search
/// engine. Only the query string is ignored; the path is matched as sent.
pub fn evaluate(method: &Method, uri: &Uri) -> Verdict {
    let path = uri.path();

    if has_dot_segment(path) {
        return Verdict::Deny;
    }

    let permitted = match *method {
        Method::GET => true,
        Method::POST => path.ends_with("_search"),
        Method::PUT => path.starts_with(DASHBOARD_PREFIX),
        _ => false,
    };

    if permitted {
        Verdict::Permit
    } else {
        Verdict::Deny
    }
}

// A dashboard PUT must not climb out of its prefix once the path is
// normalized on the way upstream. URL parsers resolve percent-encoded dots
// and backslashes the same way as the literal forms.
fn has_dot_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(is_dot_segment)
}

fn is_dot_segment(segment: &str) -> bool {
    matches!(
        segment.to_ascii_lowercase().as_str(),
        "." | "%2e" | ".." | ".%2e" | "%2e." | "%2e%2e"
    )
}

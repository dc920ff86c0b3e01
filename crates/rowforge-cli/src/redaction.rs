/// Query parameters whose values never reach a log line.
const SENSITIVE_PARAMS: [&str; 4] = ["password", "sslpassword", "passfile", "sslkey"];

/// Mask the password and secret query parameters of a connection URL.
///
/// Strings without a `scheme://` prefix are returned unchanged.
pub fn redact_connection_string(conn: &str) -> String {
    let Some(scheme_end) = conn.find("://") else {
        return conn.to_string();
    };
    let authority_start = scheme_end + 3;
    let rest = &conn[authority_start..];
    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());

    let mut redacted = conn[..authority_start].to_string();
    let authority = &rest[..authority_end];
    match authority.rfind('@') {
        Some(at_idx) => {
            let credentials = &authority[..at_idx];
            match credentials.find(':') {
                Some(colon_idx) => {
                    redacted.push_str(&credentials[..colon_idx]);
                    redacted.push_str(":***");
                }
                None => redacted.push_str(credentials),
            }
            redacted.push_str(&authority[at_idx..]);
        }
        None => redacted.push_str(authority),
    }

    let tail = &rest[authority_end..];
    match tail.split_once('?') {
        Some((path, query)) => {
            redacted.push_str(path);
            redacted.push('?');
            redacted.push_str(&redact_query_params(query));
        }
        None => redacted.push_str(tail),
    }
    redacted
}

fn redact_query_params(query: &str) -> String {
    query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if SENSITIVE_PARAMS.contains(&key.to_ascii_lowercase().as_str()) => {
                format!("{key}=***")
            }
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

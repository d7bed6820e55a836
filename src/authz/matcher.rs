use regex::Regex;

/// Anchored route-pattern match: `:param` segments match exactly one
/// non-separator path segment, `*` matches any remainder. Used both for the
/// policy table and for permission route patterns coming from the store.
pub fn matches(pattern: &str, path: &str) -> bool {
    match compile(pattern) {
        Some(re) => re.is_match(path),
        None => false,
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    let mut src = String::with_capacity(pattern.len() + 8);
    src.push('^');
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ':' => {
                let mut named = false;
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        chars.next();
                        named = true;
                    } else {
                        break;
                    }
                }
                if named {
                    src.push_str("[^/]+");
                } else {
                    // a bare ':' is just a literal
                    src.push_str(&regex::escape(":"));
                }
            }
            '*' => src.push_str(".*"),
            other => src.push_str(&regex::escape(&other.to_string())),
        }
    }
    src.push('$');
    Regex::new(&src).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_patterns_match_exactly() {
        assert!(matches("/user", "/user"));
        assert!(!matches("/user", "/user/"));
        assert!(!matches("/user", "/user/42"));
        assert!(!matches("/user", "/users"));
        assert!(!matches("/admin", "/administrator"));
    }

    #[test]
    fn param_matches_one_segment() {
        assert!(matches("/user/:id", "/user/42"));
        assert!(matches("/user/:id", "/user/info"));
        assert!(!matches("/user/:id", "/user"));
        assert!(!matches("/user/:id", "/user/42/detail"));
        assert!(!matches("/user/:id", "/user/"));
    }

    #[test]
    fn wildcard_matches_remainder() {
        assert!(matches("/files/*", "/files/a"));
        assert!(matches("/files/*", "/files/a/b/c"));
        assert!(!matches("/files/*", "/files"));
        assert!(matches("/*", "/anything/at/all"));
    }

    #[test]
    fn params_and_wildcards_compose() {
        assert!(matches("/orgs/:org/files/*", "/orgs/acme/files/x/y"));
        assert!(!matches("/orgs/:org/files/*", "/orgs/acme/nope/x"));
    }

    #[test]
    fn match_is_anchored_at_the_start() {
        assert!(!matches("/user", "/api/user"));
    }
}

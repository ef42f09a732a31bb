//! Common validation utilities.

use validator::ValidationError;

/// Maximum number of characters in a team name.
pub const MAX_TEAM_NAME_CHARS: usize = 15;

/// Rejects strings that are empty or whitespace only.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value cannot be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Canonical form of an email address used for lookups and invite matching.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalizes a batch of emails: trims, lower-cases, drops blanks and
/// collapses duplicates while keeping first-seen order.
pub fn normalize_email_list<I, S>(emails: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for email in emails {
        let normalized = normalize_email(email.as_ref());
        if normalized.is_empty() || out.contains(&normalized) {
            continue;
        }
        out.push(normalized);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Lunch is served").is_ok());
        assert!(validate_not_blank(" \t\n").is_err());
    }

    // Email tests
    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn test_normalize_email_list() {
        let list = normalize_email_list([
            "B@x.io",
            " a@x.io",
            "",
            "   ",
            "b@X.io",
            "c@x.io ",
        ]);
        assert_eq!(list, vec!["b@x.io", "a@x.io", "c@x.io"]);
    }

    #[test]
    fn test_normalize_email_list_generated() {
        let email: String = SafeEmail().fake();
        let shouted = email.to_uppercase();
        let list = normalize_email_list(vec![email.clone(), shouted]);
        assert_eq!(list, vec![email.to_lowercase()]);
    }

    #[test]
    fn test_normalize_email_list_empty() {
        let list = normalize_email_list(Vec::<String>::new());
        assert!(list.is_empty());
    }
}

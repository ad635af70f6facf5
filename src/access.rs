use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    Granted,
    Rejected,
    AlreadyAuthorized,
}

/// Shared-secret gate. Authorizations live for the process lifetime only.
#[derive(Debug)]
pub struct AccessGate {
    code: String,
    authorized: HashSet<String>,
}

impl AccessGate {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            authorized: HashSet::new(),
        }
    }

    pub fn check(&mut self, user_id: &str, attempt: &str) -> AccessOutcome {
        if self.authorized.contains(user_id) {
            return AccessOutcome::AlreadyAuthorized;
        }
        // Exact match: case and whitespace both count
        if attempt == self.code {
            self.authorized.insert(user_id.to_string());
            log::info!("Access granted to user {}", user_id);
            AccessOutcome::Granted
        } else {
            log::info!("Wrong access code from user {}", user_id);
            AccessOutcome::Rejected
        }
    }

    pub fn is_authorized(&self, user_id: &str) -> bool {
        self.authorized.contains(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_exact_code_is_accepted() {
        let mut gate = AccessGate::new("Secret1");
        for attempt in ["secret1", "SECRET1", " Secret1", "Secret1 ", "Secret1\n", "Secret", ""] {
            assert_eq!(gate.check("1", attempt), AccessOutcome::Rejected, "{:?}", attempt);
        }
        assert!(!gate.is_authorized("1"));

        assert_eq!(gate.check("1", "Secret1"), AccessOutcome::Granted);
        assert!(gate.is_authorized("1"));
    }

    #[test]
    fn authorized_users_get_a_no_op() {
        let mut gate = AccessGate::new("1234");
        assert_eq!(gate.check("7", "1234"), AccessOutcome::Granted);
        assert_eq!(gate.check("7", "1234"), AccessOutcome::AlreadyAuthorized);
        assert_eq!(gate.check("7", "wrong"), AccessOutcome::AlreadyAuthorized);
        assert!(gate.is_authorized("7"));
    }

    #[test]
    fn authorization_is_per_user() {
        let mut gate = AccessGate::new("1234");
        gate.check("1", "1234");
        assert!(gate.is_authorized("1"));
        assert!(!gate.is_authorized("2"));
        assert_eq!(gate.check("2", "0000"), AccessOutcome::Rejected);
    }
}

//! Account Context
//!
//! The account a descriptor targets when it omits one. Kept apart from the
//! account the credential authenticated as.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountContext {
    use_account_id: Option<String>,
    auth_account_id: Option<String>,
}

impl AccountContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context already pointing at an account
    pub fn with_account(account_id: &str) -> Self {
        Self {
            use_account_id: Some(account_id.to_string()),
            auth_account_id: None,
        }
    }

    /// Switch the implicit target account
    pub fn use_account(&mut self, account_id: &str) {
        self.use_account_id = Some(account_id.to_string());
    }

    pub fn use_account_id(&self) -> Option<&str> {
        self.use_account_id.as_deref()
    }

    pub fn auth_account_id(&self) -> Option<&str> {
        self.auth_account_id.as_deref()
    }

    /// Record a successful validation: both ids point at the authenticated account
    pub(crate) fn authenticated_as(&mut self, account_id: &str) {
        self.use_account_id = Some(account_id.to_string());
        self.auth_account_id = Some(account_id.to_string());
    }
}

/// Every Hugging Face access token starts with this.
pub const CREDENTIAL_PREFIX: &str = "hf_";
pub const CREDENTIAL_MIN_LEN_EXCLUSIVE: usize = 10;

/// Format check only; the endpoint is the real authority.
pub fn is_valid_credential(raw: &str) -> bool {
    raw.len() > CREDENTIAL_MIN_LEN_EXCLUSIVE && raw.starts_with(CREDENTIAL_PREFIX)
}

/// `hf_****abcd` for display and logs. Short input collapses to `****`.
pub fn mask_credential(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = raw.chars().collect();
    if chars.len() <= CREDENTIAL_PREFIX.len() + 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}****{}", CREDENTIAL_PREFIX, tail)
}

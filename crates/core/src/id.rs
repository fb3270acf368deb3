use uuid::Uuid;

/// Salt applied by [`string_to_uuid`] when the caller passes `None`.
pub const DEFAULT_UUID_SALT: &str = "powermemo_client";

/// Derive a stable user id from an arbitrary string.
///
/// Produces a name-based (v5) UUID in the DNS namespace over `s + salt`, so
/// the same input always maps to the same id across processes and clients.
pub fn string_to_uuid(s: &str, salt: Option<&str>) -> String {
    let salt = salt.unwrap_or(DEFAULT_UUID_SALT);
    let name = format!("{s}{salt}");
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, name.as_bytes()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_input_same_id() {
        assert_eq!(
            string_to_uuid("alice@example.com", None),
            string_to_uuid("alice@example.com", None)
        );
    }

    #[test]
    fn salt_changes_id() {
        assert_ne!(
            string_to_uuid("alice", None),
            string_to_uuid("alice", Some("other"))
        );
    }

    #[test]
    fn default_salt_is_applied() {
        assert_eq!(
            string_to_uuid("alice", None),
            string_to_uuid("alice", Some(DEFAULT_UUID_SALT))
        );
    }

    #[test]
    fn output_is_version_5() {
        let id: Uuid = string_to_uuid("bob", None).parse().unwrap();
        assert_eq!(id.get_version_num(), 5);
    }
}

pub mod blobs;
pub mod config;
pub mod context;
pub mod events;
pub mod insert;
pub mod ping;
pub mod profile;
pub mod users;

/// Read an argument that is either inline text or `@path` to a file.
pub fn read_text(input: &str) -> anyhow::Result<String> {
    match input.strip_prefix('@') {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => Ok(input.to_owned()),
    }
}

/// Parse an argument that is either inline JSON or `@path` to a JSON file.
pub fn parse_json_data(input: &str) -> anyhow::Result<serde_json::Value> {
    Ok(serde_json::from_str(&read_text(input)?)?)
}

/// Parse `KEY=VALUE`. The value is taken as JSON when it parses, else as a
/// plain string.
pub fn parse_field(s: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{s}`"))?;
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

//! Interactive input helpers.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};

/// Read one trimmed line from stdin after printing `label`.
pub fn line(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read from stdin")?;
    Ok(input.trim().to_string())
}

/// Like `line`, falling back to `default` on empty input.
pub fn line_or(label: &str, default: Option<&str>) -> Result<String> {
    let label = match default {
        Some(value) => format!("{} [{}]: ", label, value),
        None => format!("{}: ", label),
    };
    let input = line(&label)?;
    match (input.is_empty(), default) {
        (true, Some(value)) => Ok(value.to_string()),
        _ => Ok(input),
    }
}

/// Read a password without echo.
pub fn password(label: &str) -> Result<String> {
    rpassword::prompt_password(format!("{}: ", label)).context("Failed to read password")
}

/// Read a new password twice and require both to match.
pub fn new_password() -> Result<String> {
    let first = password("New password")?;
    if first.is_empty() {
        bail!("Password must not be empty");
    }
    let second = password("Repeat new password")?;
    if first != second {
        bail!("Passwords do not match");
    }
    Ok(first)
}

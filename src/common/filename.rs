use time::OffsetDateTime;
use time::macros::format_description;
use uuid::Uuid;

pub const VIDEO_EXTENSION: &str = "mp4";
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

const FALLBACK_STEM: &str = "meeting";

/// Lowercased ASCII stem built from a display name. Runs of whitespace and
/// hyphens collapse into one `_`, other punctuation is dropped.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_sep = true;
        }
    }

    if out.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        out
    }
}

/// `{stem}_{8 hex}_{YYYYMMDD_HHMMSS}.mp4`
pub fn generate(meeting_name: &str) -> String {
    generate_at(meeting_name, OffsetDateTime::now_utc())
}

pub fn generate_at(meeting_name: &str, at: OffsetDateTime) -> String {
    let short_id = Uuid::new_v4().as_simple().to_string()[..8].to_string();
    let timestamp = at
        .format(format_description!("[year][month][day]_[hour][minute][second]"))
        .unwrap_or_else(|_| at.unix_timestamp().to_string());

    format!(
        "{}_{}_{}.{}",
        sanitize(meeting_name),
        short_id,
        timestamp,
        VIDEO_EXTENSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn sanitizes_display_names() {
        assert_eq!(sanitize("Team Sync!"), "team_sync");
        assert_eq!(sanitize("  Weekly   1:1 -- Alice & Bob  "), "weekly_11_alice_bob");
        assert_eq!(sanitize("Q3-Planning"), "q3_planning");
        assert_eq!(sanitize("Réunion d'équipe"), "runion_dquipe");
        assert_eq!(sanitize("!!!"), "meeting");
        assert_eq!(sanitize(""), "meeting");
    }

    #[test]
    fn filename_has_expected_shape() {
        let name = generate_at("Team Sync!", datetime!(2024-03-05 14:07:09 UTC));

        let stem = name.strip_suffix(".mp4").expect("mp4 extension");
        assert!(stem.starts_with("team_sync_"));
        assert!(stem.ends_with("_20240305_140709"));

        let id = &stem["team_sync_".len()..stem.len() - "_20240305_140709".len()];
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        assert!(stem.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
    }

    #[test]
    fn suffix_differs_between_calls() {
        let at = datetime!(2024-03-05 14:07:09 UTC);
        assert_ne!(generate_at("standup", at), generate_at("standup", at));
    }
}

use translator_core::JobHandle;

/// Filesystem-safe name for a job's artifact: `translated_{task_id}.{pdf|md}`.
pub fn artifact_filename(job: &JobHandle, content_type: Option<&str>) -> String {
    let is_pdf = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/pdf"))
        .unwrap_or(false);
    let ext = if is_pdf { "pdf" } else { "md" };
    format!("translated_{}.{ext}", sanitize_id(job.as_str()))
}

fn sanitize_id(input: &str) -> String {
    let mut cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]).to_string();
    if cleaned.is_empty() {
        cleaned = "artifact".to_string();
    }
    if cleaned.chars().count() > 80 {
        cleaned = cleaned.chars().take(80).collect();
    }
    cleaned
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

#[cfg(test)]
mod tests {
    use super::artifact_filename;
    use translator_core::JobHandle;

    #[test]
    fn extension_follows_content_type() {
        let job = JobHandle::parse("1b2c-3d").unwrap();
        assert_eq!(
            artifact_filename(&job, Some("application/pdf")),
            "translated_1b2c-3d.pdf"
        );
        assert_eq!(
            artifact_filename(&job, Some("text/markdown; charset=utf-8")),
            "translated_1b2c-3d.md"
        );
        assert_eq!(artifact_filename(&job, None), "translated_1b2c-3d.md");
    }

    #[test]
    fn unsafe_characters_are_replaced() {
        let job = JobHandle::parse("a:b*c").unwrap();
        assert_eq!(artifact_filename(&job, None), "translated_a_b_c.md");

        let dots = JobHandle::parse("..").unwrap();
        assert_eq!(artifact_filename(&dots, None), "translated_artifact.md");
    }
}

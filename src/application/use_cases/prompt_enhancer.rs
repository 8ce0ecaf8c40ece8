/// Style directives placed in front of every description.
pub const POLICE_SKETCH_PREAMBLE: &str = "Create a detailed police sketch, black and white pencil drawing style, \
professional forensic artwork, realistic facial features, \
suitable for law enforcement identification purposes. \
Focus on clear, distinctive facial characteristics. \
Style: police composite sketch, hand-drawn appearance, \
high contrast, detailed shading.";

pub const SUBJECT_MARKER: &str = "Subject description: ";

/// Frames a witness description as a forensic sketch request.
///
/// Pure: the same input always yields the same output. It is applied once per
/// generation; the stored result keeps the raw description.
pub fn enhance(user_text: &str) -> String {
    format!("{} {}{}", POLICE_SKETCH_PREAMBLE, SUBJECT_MARKER, user_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enhance_ends_with_subject_description() {
        for prompt in ["male, 30s, scar", "", "  padded  ", "line\nbreak", "Ünïcødé 顔"] {
            let enhanced = enhance(prompt);
            assert!(enhanced.ends_with(&format!("Subject description: {}", prompt)));
        }
    }

    #[test]
    fn test_enhance_starts_with_preamble() {
        let enhanced = enhance("female, glasses");
        assert!(enhanced.starts_with(POLICE_SKETCH_PREAMBLE));
        for directive in ["police sketch", "black and white", "forensic", "high contrast"] {
            assert!(enhanced.contains(directive), "missing {}", directive);
        }
    }

    #[test]
    fn test_enhance_is_deterministic() {
        assert_eq!(enhance("same input"), enhance("same input"));
    }
}
